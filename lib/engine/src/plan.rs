use crate::solution::Solution;
use crate::sparql::error::QueryEvaluationError;
use rdf_hooks_model::{NamedNode, Term, Variable};
use spargebra::algebra::{
    AggregateExpression, Expression, Function, GraphPattern, OrderExpression,
    PropertyPathExpression,
};
use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};
use std::sync::Arc;

/// The algebra tree the evaluator walks.
///
/// It is compiled once per query from a [GraphPattern]. Children and expressions are shared
/// behind an [Arc] so lazily evaluated iterators can own the sub-plans they still need.
#[derive(Debug)]
pub enum AlgebraNode {
    /// A basic graph pattern.
    Bgp { patterns: Vec<TriplePattern> },
    /// A property path pattern.
    Path {
        subject: TermPattern,
        path: PropertyPathExpression,
        object: TermPattern,
    },
    Join {
        left: Arc<AlgebraNode>,
        right: Arc<AlgebraNode>,
    },
    LeftJoin {
        left: Arc<AlgebraNode>,
        right: Arc<AlgebraNode>,
        expression: Option<Arc<Expression>>,
    },
    Filter {
        expression: Arc<Expression>,
        inner: Arc<AlgebraNode>,
    },
    Union {
        left: Arc<AlgebraNode>,
        right: Arc<AlgebraNode>,
    },
    Graph {
        name: NamedNodePattern,
        inner: Arc<AlgebraNode>,
    },
    /// Binds `variable` to the value of `expression` (`BIND`).
    Extend {
        inner: Arc<AlgebraNode>,
        variable: Variable,
        expression: Arc<Expression>,
    },
    Minus {
        left: Arc<AlgebraNode>,
        right: Arc<AlgebraNode>,
    },
    /// Inline data. The rows are converted into solutions during compilation.
    Values {
        variables: Vec<Variable>,
        solutions: Arc<[Solution]>,
    },
    OrderBy {
        inner: Arc<AlgebraNode>,
        expression: Arc<[OrderExpression]>,
    },
    Project {
        inner: Arc<AlgebraNode>,
        variables: Arc<[Variable]>,
    },
    Distinct { inner: Arc<AlgebraNode> },
    Reduced { inner: Arc<AlgebraNode> },
    Slice {
        inner: Arc<AlgebraNode>,
        start: usize,
        length: Option<usize>,
    },
    Group {
        inner: Arc<AlgebraNode>,
        variables: Arc<[Variable]>,
        aggregates: Arc<[(Variable, AggregateExpression)]>,
    },
    Service {
        name: NamedNodePattern,
        inner: Arc<AlgebraNode>,
        silent: bool,
    },
}

impl AlgebraNode {
    /// Compiles a graph pattern into an algebra tree.
    pub fn compile(pattern: &GraphPattern) -> Result<Arc<Self>, QueryEvaluationError> {
        let node = match pattern {
            GraphPattern::Bgp { patterns } => Self::Bgp {
                patterns: patterns.clone(),
            },
            GraphPattern::Path {
                subject,
                path,
                object,
            } => Self::Path {
                subject: subject.clone(),
                path: path.clone(),
                object: object.clone(),
            },
            GraphPattern::Join { left, right } => Self::Join {
                left: Self::compile(left)?,
                right: Self::compile(right)?,
            },
            GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => Self::LeftJoin {
                left: Self::compile(left)?,
                right: Self::compile(right)?,
                expression: expression.clone().map(Arc::new),
            },
            GraphPattern::Filter { expr, inner } => Self::Filter {
                expression: Arc::new(expr.clone()),
                inner: Self::compile(inner)?,
            },
            GraphPattern::Union { left, right } => Self::Union {
                left: Self::compile(left)?,
                right: Self::compile(right)?,
            },
            GraphPattern::Graph { name, inner } => Self::Graph {
                name: name.clone(),
                inner: Self::compile(inner)?,
            },
            GraphPattern::Extend {
                inner,
                variable,
                expression,
            } => Self::Extend {
                inner: Self::compile(inner)?,
                variable: variable.clone(),
                expression: Arc::new(expression.clone()),
            },
            GraphPattern::Minus { left, right } => Self::Minus {
                left: Self::compile(left)?,
                right: Self::compile(right)?,
            },
            GraphPattern::Values {
                variables,
                bindings,
            } => Self::Values {
                variables: variables.clone(),
                solutions: bindings
                    .iter()
                    .map(|row| values_row_to_solution(variables, row))
                    .collect::<Result<Vec<_>, _>>()?
                    .into(),
            },
            GraphPattern::OrderBy { inner, expression } => Self::OrderBy {
                inner: Self::compile(inner)?,
                expression: expression.clone().into(),
            },
            GraphPattern::Project { inner, variables } => Self::Project {
                inner: Self::compile(inner)?,
                variables: variables.clone().into(),
            },
            GraphPattern::Distinct { inner } => Self::Distinct {
                inner: Self::compile(inner)?,
            },
            GraphPattern::Reduced { inner } => Self::Reduced {
                inner: Self::compile(inner)?,
            },
            GraphPattern::Slice {
                inner,
                start,
                length,
            } => Self::Slice {
                inner: Self::compile(inner)?,
                start: *start,
                length: *length,
            },
            GraphPattern::Group {
                inner,
                variables,
                aggregates,
            } => Self::Group {
                inner: Self::compile(inner)?,
                variables: variables.clone().into(),
                aggregates: aggregates.clone().into(),
            },
            GraphPattern::Service {
                name,
                inner,
                silent,
            } => Self::Service {
                name: name.clone(),
                inner: Self::compile(inner)?,
                silent: *silent,
            },
        };
        Ok(Arc::new(node))
    }

    /// A short name of the node kind, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bgp { .. } => "Bgp",
            Self::Path { .. } => "Path",
            Self::Join { .. } => "Join",
            Self::LeftJoin { .. } => "LeftJoin",
            Self::Filter { .. } => "Filter",
            Self::Union { .. } => "Union",
            Self::Graph { .. } => "Graph",
            Self::Extend { .. } => "Extend",
            Self::Minus { .. } => "Minus",
            Self::Values { .. } => "Values",
            Self::OrderBy { .. } => "OrderBy",
            Self::Project { .. } => "Project",
            Self::Distinct { .. } => "Distinct",
            Self::Reduced { .. } => "Reduced",
            Self::Slice { .. } => "Slice",
            Self::Group { .. } => "Group",
            Self::Service { .. } => "Service",
        }
    }

    /// Returns the direct children of this node.
    pub fn children(&self) -> Vec<&Arc<AlgebraNode>> {
        match self {
            Self::Bgp { .. } | Self::Path { .. } | Self::Values { .. } => Vec::new(),
            Self::Join { left, right }
            | Self::LeftJoin { left, right, .. }
            | Self::Union { left, right }
            | Self::Minus { left, right } => vec![left, right],
            Self::Filter { inner, .. }
            | Self::Graph { inner, .. }
            | Self::Extend { inner, .. }
            | Self::OrderBy { inner, .. }
            | Self::Project { inner, .. }
            | Self::Distinct { inner }
            | Self::Reduced { inner }
            | Self::Slice { inner, .. }
            | Self::Group { inner, .. }
            | Self::Service { inner, .. } => vec![inner],
        }
    }

    /// Returns whether this node or any of its descendants satisfies `predicate`.
    pub fn any(&self, predicate: &impl Fn(&AlgebraNode) -> bool) -> bool {
        predicate(self) || self.children().into_iter().any(|child| child.any(predicate))
    }
}

/// Returns the IRI and the arguments if `expression` calls a custom function.
pub fn custom_function_call(expression: &Expression) -> Option<(&NamedNode, &[Expression])> {
    match expression {
        Expression::FunctionCall(Function::Custom(iri), args) => Some((iri, args.as_slice())),
        _ => None,
    }
}

fn values_row_to_solution(
    variables: &[Variable],
    row: &[Option<GroundTerm>],
) -> Result<Solution, QueryEvaluationError> {
    let bindings = variables
        .iter()
        .zip(row)
        .filter_map(|(variable, value)| {
            value
                .as_ref()
                .map(|value| (variable.clone(), ground_term_to_term(value)))
        })
        .collect::<Vec<_>>();
    Solution::try_from_bindings(bindings).ok_or_else(|| {
        QueryEvaluationError::InternalError("A VALUES row binds a variable twice".to_owned())
    })
}

pub(crate) fn ground_term_to_term(term: &GroundTerm) -> Term {
    match term {
        GroundTerm::NamedNode(node) => node.clone().into(),
        GroundTerm::Literal(literal) => literal.clone().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spargebra::Query;

    fn compile(query: &str) -> Arc<AlgebraNode> {
        let Query::Select { pattern, .. } = Query::parse(query, None).unwrap() else {
            panic!("Expected a SELECT query");
        };
        AlgebraNode::compile(&pattern).unwrap()
    }

    #[test]
    fn compiles_extend_with_custom_call() {
        let node = compile(
            "SELECT * WHERE { BIND(<http://example.com/f>(\"a\", 1) AS ?x) }",
        );
        let found = node.any(&|node| match node {
            AlgebraNode::Extend { expression, .. } => custom_function_call(expression)
                .is_some_and(|(iri, args)| {
                    iri.as_str() == "http://example.com/f" && args.len() == 2
                }),
            _ => false,
        });
        assert!(found);
    }

    #[test]
    fn values_rows_become_solutions() {
        let node = compile("SELECT * WHERE { VALUES (?a ?b) { (1 UNDEF) (2 3) } }");
        let found = node.any(&|node| match node {
            AlgebraNode::Values { solutions, .. } => {
                solutions.len() == 2 && solutions[0].len() == 1 && solutions[1].len() == 2
            }
            _ => false,
        });
        assert!(found);
    }
}
