use rdf_hooks_model::{Term, Variable};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// An immutable set of variable bindings.
///
/// A variable is bound to at most one term. Solutions are shared behind an [Arc]; every operation
/// that adds bindings returns a new solution and leaves `self` untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Solution {
    /// Sorted by variable name.
    bindings: Arc<[(Variable, Term)]>,
}

impl Solution {
    /// Creates a solution without any bindings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a solution from a list of bindings.
    ///
    /// Returns `None` if a variable is bound twice to different terms.
    pub fn try_from_bindings(
        bindings: impl IntoIterator<Item = (Variable, Term)>,
    ) -> Option<Self> {
        Self::empty().extend(bindings)
    }

    fn position(&self, variable: &str) -> Result<usize, usize> {
        self.bindings
            .binary_search_by(|(candidate, _)| candidate.as_str().cmp(variable))
    }

    /// Returns the term bound to `variable`.
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.get_by_name(variable.as_str())
    }

    /// Returns the term bound to the variable with the given name.
    pub fn get_by_name(&self, variable: &str) -> Option<&Term> {
        self.position(variable)
            .ok()
            .map(|index| &self.bindings[index].1)
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.position(variable.as_str()).is_ok()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.bindings.iter().map(|(variable, term)| (variable, term))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.bindings.iter().map(|(variable, _)| variable)
    }

    /// Returns a new solution that additionally binds `variable` to `term`.
    ///
    /// Returns `None` if `variable` is already bound to a different term.
    pub fn with(&self, variable: Variable, term: Term) -> Option<Self> {
        match self.position(variable.as_str()) {
            Ok(index) => (self.bindings[index].1 == term).then(|| self.clone()),
            Err(index) => {
                let mut bindings = Vec::with_capacity(self.bindings.len() + 1);
                bindings.extend_from_slice(&self.bindings[..index]);
                bindings.push((variable, term));
                bindings.extend_from_slice(&self.bindings[index..]);
                Some(Self {
                    bindings: bindings.into(),
                })
            }
        }
    }

    /// Adds all `bindings` to the solution.
    ///
    /// Returns `None` if any binding conflicts with an existing one.
    pub fn extend(&self, bindings: impl IntoIterator<Item = (Variable, Term)>) -> Option<Self> {
        let mut result = self.bindings.to_vec();
        for (variable, term) in bindings {
            match result.binary_search_by(|(candidate, _)| candidate.as_str().cmp(variable.as_str()))
            {
                Ok(index) => {
                    if result[index].1 != term {
                        return None;
                    }
                }
                Err(index) => result.insert(index, (variable, term)),
            }
        }
        Some(Self {
            bindings: result.into(),
        })
    }

    /// Returns the union of both solutions if they are compatible.
    pub fn merge(&self, other: &Self) -> Option<Self> {
        if other.is_empty() {
            return Some(self.clone());
        }
        if self.is_empty() {
            return Some(other.clone());
        }
        self.extend(other.iter().map(|(v, t)| (v.clone(), t.clone())))
    }

    /// Returns whether all variables bound in both solutions have the same value.
    pub fn is_compatible(&self, other: &Self) -> bool {
        other
            .iter()
            .all(|(variable, term)| self.get(variable).map_or(true, |own| own == term))
    }

    /// Returns whether both solutions bind at least one common variable.
    pub fn shares_variable_with(&self, other: &Self) -> bool {
        other.variables().any(|variable| self.contains(variable))
    }

    /// Keeps only the bindings of `variables`.
    pub fn project(&self, variables: &[Variable]) -> Self {
        Self {
            bindings: self
                .bindings
                .iter()
                .filter(|(variable, _)| variables.contains(variable))
                .cloned()
                .collect(),
        }
    }

    /// Removes all bindings whose variable name satisfies `predicate`.
    pub fn without(&self, predicate: impl Fn(&Variable) -> bool) -> Self {
        if !self.bindings.iter().any(|(variable, _)| predicate(variable)) {
            return self.clone();
        }
        Self {
            bindings: self
                .bindings
                .iter()
                .filter(|(variable, _)| !predicate(variable))
                .cloned()
                .collect(),
        }
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (variable, term)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable} -> {term}")?;
        }
        f.write_str("}")
    }
}
