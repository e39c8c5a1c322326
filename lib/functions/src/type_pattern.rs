use crate::definition::{FunctionArgs, FunctionKind, FunctionOutput, OutputRow};
use crate::registry::RegisteredFunction;
use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::{blank_node_variable, EvalContext, SimpleEvaluator, Solution, SolutionIter};
use rdf_hooks_model::vocab::rdf;
use rdf_hooks_model::{Term, Value, Variable};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use std::iter::once;
use std::sync::Arc;
use tracing::{debug, warn};

/// Returns the term a pattern position stands for under `solution`, if it is bound.
pub(crate) fn resolve(pattern: &TermPattern, solution: &Solution) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        TermPattern::Variable(variable) => solution.get(variable).cloned(),
        TermPattern::BlankNode(node) => solution.get(&blank_node_variable(node)).cloned(),
    }
}

/// Returns whether `patterns` contain `?s rdf:type <class>` for the class of `function`.
pub(crate) fn matches(function: &RegisteredFunction, patterns: &[TriplePattern]) -> bool {
    type_subject(function, patterns).is_some()
}

fn type_subject<'a>(
    function: &RegisteredFunction,
    patterns: &'a [TriplePattern],
) -> Option<&'a TermPattern> {
    patterns
        .iter()
        .find(|pattern| {
            matches!(&pattern.predicate, NamedNodePattern::NamedNode(p) if p.as_ref() == rdf::TYPE)
                && matches!(&pattern.object, TermPattern::NamedNode(o) if o == function.iri())
        })
        .map(|pattern| &pattern.subject)
}

/// Evaluates a basic graph pattern that instantiates the class of a type pattern function.
///
/// The triples about the instance are split into inputs (parameter predicates), outputs
/// (other predicates of the namespace with a variable object) and constraints (other predicates
/// of the namespace with a constant object). The remaining triples are evaluated first and the
/// function is called once per solution. A failing call skips the solution.
pub(crate) fn evaluate(
    function: &Arc<RegisteredFunction>,
    evaluator: &SimpleEvaluator,
    patterns: &[TriplePattern],
    context: &EvalContext,
) -> Result<Option<SolutionIter>, QueryEvaluationError> {
    let Some(plan) = TypePatternPlan::try_new(function, patterns) else {
        return Ok(None);
    };
    debug!(
        function = %function.iri(),
        inputs = plan.inputs.len(),
        outputs = plan.outputs.len(),
        "Evaluating type pattern"
    );

    let bases = evaluator.evaluate_bgp(plan.other.clone(), context);
    let function = Arc::clone(function);
    Ok(Some(Box::new(bases.flat_map(
        move |base| -> SolutionIter {
            match base {
                Ok(base) => Box::new(plan.evaluate(&function, &base).into_iter().map(Ok)),
                Err(error) => Box::new(once(Err(error))),
            }
        },
    ))))
}

struct TypePatternPlan {
    subject: TermPattern,
    /// Parameter index and the object that provides it.
    inputs: Vec<(usize, TermPattern)>,
    /// Predicate IRI and the variable it binds.
    outputs: Vec<(String, Variable)>,
    /// Predicate IRI and the term the result field must equal.
    constraints: Vec<(String, Term)>,
    other: Vec<TriplePattern>,
}

impl TypePatternPlan {
    fn try_new(function: &RegisteredFunction, patterns: &[TriplePattern]) -> Option<Self> {
        let subject = type_subject(function, patterns)?.clone();
        let (ours, other): (Vec<_>, Vec<_>) = patterns
            .iter()
            .cloned()
            .partition(|pattern| pattern.subject == subject);

        let namespace = function.definition().namespace();
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut constraints = Vec::new();
        for pattern in ours {
            let NamedNodePattern::NamedNode(predicate) = &pattern.predicate else {
                continue;
            };
            if predicate.as_ref() == rdf::TYPE {
                continue;
            }
            if let Some(index) = function
                .parameter_predicates()
                .iter()
                .position(|parameter| parameter == predicate)
            {
                inputs.push((index, pattern.object));
            } else if predicate.as_str().starts_with(namespace) {
                let predicate = predicate.as_str().to_owned();
                match pattern.object {
                    TermPattern::Variable(variable) => outputs.push((predicate, variable)),
                    TermPattern::BlankNode(node) => {
                        outputs.push((predicate, blank_node_variable(&node)));
                    }
                    TermPattern::NamedNode(node) => constraints.push((predicate, node.into())),
                    TermPattern::Literal(literal) => {
                        constraints.push((predicate, literal.into()));
                    }
                }
            }
        }

        Some(Self {
            subject,
            inputs,
            outputs,
            constraints,
            other,
        })
    }

    fn evaluate(&self, function: &RegisteredFunction, base: &Solution) -> Vec<Solution> {
        let Some(args) = self.arguments(function, base) else {
            return Vec::new();
        };
        let rows = function
            .definition()
            .call(&args)
            .and_then(|output| output.check(function.output()))
            .and_then(FunctionOutput::into_rows);
        match rows {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|row| self.bind(function, base, row))
                .collect(),
            Err(error) => {
                warn!(
                    function = %function.iri(),
                    %error,
                    "Type pattern function failed, skipping the solution"
                );
                Vec::new()
            }
        }
    }

    /// Resolves the parameters under `base`. Returns `None` if a parameter without a default
    /// stays unbound.
    fn arguments(
        &self,
        function: &RegisteredFunction,
        base: &Solution,
    ) -> Option<FunctionArgs> {
        let signature = function.definition().signature()?;
        let mut values: Vec<Option<Value>> = vec![None; signature.parameters().len()];

        if let FunctionKind::TypePattern { use_subject: true } = function.kind() {
            let subject = resolve(&self.subject, base)?;
            *values.first_mut()? = Some(Value::from_term(subject));
        }
        for (index, object) in &self.inputs {
            if let Some(term) = resolve(object, base) {
                values[*index] = Some(Value::from_term(term));
            }
        }

        let values = values
            .into_iter()
            .zip(signature.parameters())
            .map(|(value, parameter)| value.or_else(|| parameter.default().cloned()))
            .collect::<Option<Vec<_>>>()?;
        signature.bind(values).ok()
    }

    fn bind(&self, function: &RegisteredFunction, base: &Solution, row: OutputRow) -> Option<Solution> {
        match row {
            OutputRow::Struct(fields) => {
                let mut bindings = Vec::new();
                for (name, value) in fields.fields() {
                    let predicate = function.definition().predicate_iri(name);
                    let term = value.clone().into_term();
                    let violated = self
                        .constraints
                        .iter()
                        .any(|(constrained, expected)| *constrained == predicate && *expected != term);
                    if violated {
                        return None;
                    }
                    bindings.extend(
                        self.outputs
                            .iter()
                            .filter(|(output, _)| *output == predicate)
                            .map(|(_, variable)| (variable.clone(), term.clone())),
                    );
                }
                base.extend(bindings)
            }
            OutputRow::Value(value) => match self.outputs.as_slice() {
                [(_, variable)] => base.with(variable.clone(), value.into_term()),
                _ => Some(base.clone()),
            },
        }
    }
}
