use crate::definition::{FunctionDefinition, FunctionKind, OutputShape};
use crate::error::RegistrationError;
use crate::examples::{example_query, example_title, ExampleQuery};
use crate::legacy::{LegacyDispatcher, LegacyFunction};
use crate::{extension, graph, predicate_pattern, pushdown, type_pattern};
use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::{
    custom_function_call, AlgebraNode, CustomEvaluator, EvalContext, SimpleEvaluator, SolutionIter,
};
use rdf_hooks_model::NamedNode;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// A function that passed the registration checks, together with the IRIs derived from it.
#[derive(Debug)]
pub struct RegisteredFunction {
    definition: FunctionDefinition,
    iri: NamedNode,
    graph_iri: Option<NamedNode>,
    parameter_predicates: Vec<NamedNode>,
}

impl RegisteredFunction {
    fn try_new(definition: FunctionDefinition) -> Result<Self, RegistrationError> {
        let name = definition.name().to_owned();
        let kind = definition.kind();
        let output = definition.signature().map(|signature| signature.output());

        let incompatible = |output| RegistrationError::IncompatibleOutput {
            name: name.clone(),
            kind,
            output,
        };
        let missing_signature = || RegistrationError::MissingSignature {
            name: name.clone(),
            kind,
        };
        match kind {
            FunctionKind::Extension => {
                if output == Some(OutputShape::Graph) {
                    return Err(incompatible(OutputShape::Graph));
                }
            }
            FunctionKind::Graph => match output {
                Some(OutputShape::Graph) | None => {}
                Some(output) => return Err(incompatible(output)),
            },
            FunctionKind::TypePattern { use_subject } => {
                let signature = definition.signature().ok_or_else(missing_signature)?;
                if signature.output() == OutputShape::Graph {
                    return Err(incompatible(OutputShape::Graph));
                }
                if use_subject && signature.parameters().is_empty() {
                    return Err(RegistrationError::MissingSubjectParameter { name });
                }
            }
            FunctionKind::PredicatePattern => {
                let signature = definition.signature().ok_or_else(missing_signature)?;
                if !matches!(signature.output(), OutputShape::Scalar | OutputShape::Multi) {
                    return Err(incompatible(signature.output()));
                }
                if signature.parameters().len() != 1 {
                    return Err(RegistrationError::PredicateArity {
                        name,
                        actual: signature.parameters().len(),
                    });
                }
            }
        }

        let iri = parse_iri(&name, definition.iri())?;
        let graph_iri = match kind {
            FunctionKind::Graph => Some(parse_iri(&name, definition.graph_iri())?),
            _ => None,
        };
        let parameter_predicates = match (kind, definition.signature()) {
            (FunctionKind::TypePattern { .. }, Some(signature)) => signature
                .parameters()
                .iter()
                .map(|parameter| parse_iri(&name, definition.predicate_iri(parameter.name())))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        Ok(Self {
            definition,
            iri,
            graph_iri,
            parameter_predicates,
        })
    }

    pub fn definition(&self) -> &FunctionDefinition {
        &self.definition
    }

    pub fn kind(&self) -> FunctionKind {
        self.definition.kind()
    }

    /// The IRI used in queries: the function IRI, the class IRI of a type pattern or the
    /// predicate IRI of a predicate pattern.
    pub fn iri(&self) -> &NamedNode {
        &self.iri
    }

    /// The temporary graph of a graph function.
    pub fn graph_iri(&self) -> Option<&NamedNode> {
        self.graph_iri.as_ref()
    }

    /// The input predicates of a type pattern, in parameter order.
    pub fn parameter_predicates(&self) -> &[NamedNode] {
        &self.parameter_predicates
    }

    /// The declared output shape, if the function has a signature.
    pub(crate) fn output(&self) -> Option<OutputShape> {
        self.definition
            .signature()
            .map(|signature| signature.output())
    }
}

fn parse_iri(name: &str, iri: String) -> Result<NamedNode, RegistrationError> {
    NamedNode::new(iri.as_str()).map_err(|error| RegistrationError::InvalidIri {
        name: name.to_owned(),
        iri,
        error,
    })
}

/// Holds the registered functions and dispatches algebra nodes to them.
///
/// The registry is built once, then shared read-only behind an [Arc]. It is itself a
/// [CustomEvaluator], so it can be passed to the query evaluation as is.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: Vec<Arc<RegisteredFunction>>,
    legacy: LegacyDispatcher,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function. Functions are tried in registration order.
    pub fn register(&mut self, definition: FunctionDefinition) -> Result<(), RegistrationError> {
        let function = RegisteredFunction::try_new(definition)?;
        self.ensure_unique(function.iri())?;
        debug!(
            function = %function.iri(),
            kind = %function.kind(),
            "Registered function"
        );
        self.functions.push(Arc::new(function));
        Ok(())
    }

    /// Adds a function of the legacy calling convention, see [LegacyFunction].
    pub fn register_legacy(
        &mut self,
        iri: impl Into<String>,
        function: impl LegacyFunction + 'static,
    ) -> Result<(), RegistrationError> {
        let iri = iri.into();
        let iri = parse_iri(&iri, iri.clone())?;
        self.ensure_unique(&iri)?;
        debug!(function = %iri, "Registered legacy function");
        self.legacy.insert(iri, Arc::new(function));
        Ok(())
    }

    fn ensure_unique(&self, iri: &NamedNode) -> Result<(), RegistrationError> {
        let taken = self.functions.iter().any(|function| function.iri() == iri)
            || self.legacy.contains(iri);
        if taken {
            Err(RegistrationError::AlreadyRegistered(iri.as_str().to_owned()))
        } else {
            Ok(())
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &RegisteredFunction> {
        self.functions.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.functions.len() + self.legacy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The IRIs callable from a `BIND` expression: extension, graph and legacy functions.
    pub fn extension_function_iris(&self) -> Vec<NamedNode> {
        self.functions
            .iter()
            .filter(|function| function.kind().is_extension())
            .map(|function| function.iri().clone())
            .chain(self.legacy.iris().cloned())
            .collect()
    }

    /// The example queries found in the documentation of the functions.
    pub fn example_queries(&self) -> Vec<ExampleQuery> {
        self.functions
            .iter()
            .filter_map(|function| {
                let definition = function.definition();
                Some(ExampleQuery {
                    title: example_title(definition.name()),
                    query: example_query(definition.documentation())?,
                })
            })
            .collect()
    }

    /// Evaluates `node` if a registered function recognizes it.
    ///
    /// `Extend` nodes are matched by the called IRI, `Bgp` nodes by the type and predicate
    /// patterns, and `Filter` nodes are pushed down if their inner plan contains a recognized
    /// node. All other nodes return `Ok(None)`.
    pub fn dispatch(
        &self,
        evaluator: &SimpleEvaluator,
        node: &Arc<AlgebraNode>,
        context: &EvalContext,
    ) -> Result<Option<SolutionIter>, QueryEvaluationError> {
        match node.as_ref() {
            AlgebraNode::Extend {
                inner,
                variable,
                expression,
            } => {
                let Some((iri, arguments)) = custom_function_call(expression) else {
                    return Ok(None);
                };
                let function = self
                    .functions
                    .iter()
                    .find(|function| function.kind().is_extension() && function.iri() == iri);
                if let Some(function) = function {
                    debug!(function = %iri, "Dispatching BIND to a registered function");
                    let call = extension::ExtendCall {
                        inner,
                        variable,
                        arguments,
                    };
                    return Ok(Some(match function.kind() {
                        FunctionKind::Graph => graph::evaluate(function, evaluator, &call, context),
                        _ => extension::evaluate(function, evaluator, &call, context),
                    }));
                }
                self.legacy.evaluate(evaluator, node, context)
            }
            AlgebraNode::Bgp { patterns } => {
                for function in &self.functions {
                    let solutions = match function.kind() {
                        FunctionKind::TypePattern { .. } => {
                            type_pattern::evaluate(function, evaluator, patterns, context)?
                        }
                        FunctionKind::PredicatePattern => {
                            predicate_pattern::evaluate(function, evaluator, patterns, context)?
                        }
                        FunctionKind::Extension | FunctionKind::Graph => None,
                    };
                    if solutions.is_some() {
                        return Ok(solutions);
                    }
                }
                Ok(None)
            }
            AlgebraNode::Filter { expression, inner } => {
                pushdown::evaluate(self, evaluator, expression, inner, context)
            }
            _ => Ok(None),
        }
    }

    /// Returns whether [Self::dispatch] would handle `node` through a registered function.
    pub fn recognizes(&self, node: &AlgebraNode) -> bool {
        match node {
            AlgebraNode::Extend { expression, .. } => {
                custom_function_call(expression).is_some_and(|(iri, _)| {
                    self.functions
                        .iter()
                        .any(|function| function.kind().is_extension() && function.iri() == iri)
                        || self.legacy.contains(iri)
                })
            }
            AlgebraNode::Bgp { patterns } => {
                self.functions.iter().any(|function| match function.kind() {
                    FunctionKind::TypePattern { .. } => type_pattern::matches(function, patterns),
                    FunctionKind::PredicatePattern => {
                        predicate_pattern::matches(function, patterns)
                    }
                    FunctionKind::Extension | FunctionKind::Graph => false,
                })
            }
            _ => false,
        }
    }
}

impl CustomEvaluator for FunctionRegistry {
    fn evaluate(
        &self,
        evaluator: &SimpleEvaluator,
        node: &Arc<AlgebraNode>,
        context: &EvalContext,
    ) -> Result<Option<SolutionIter>, QueryEvaluationError> {
        self.dispatch(evaluator, node, context)
    }
}

impl Debug for FunctionRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions)
            .field("legacy", &self.legacy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{FunctionArgs, FunctionOutput, Signature};
    use crate::error::FunctionError;
    use crate::legacy::LegacyCall;
    use spargebra::Query;

    fn noop(_: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
        Ok(FunctionOutput::scalar(1))
    }

    fn legacy_noop(call: LegacyCall<'_>) -> Result<LegacyCall<'_>, FunctionError> {
        Ok(call)
    }

    fn compile(query: &str) -> Arc<AlgebraNode> {
        let Query::Select { pattern, .. } = Query::parse(query, None).unwrap() else {
            panic!("Expected a SELECT query");
        };
        AlgebraNode::compile(&pattern).unwrap()
    }

    #[test]
    fn duplicate_iris_are_rejected() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(FunctionDefinition::extension("split", noop))
            .unwrap();
        assert!(matches!(
            registry.register(FunctionDefinition::extension("split", noop)),
            Err(RegistrationError::AlreadyRegistered(_))
        ));
        assert!(matches!(
            registry.register_legacy(format!("{}split", rdf_hooks_model::vocab::FUNC), legacy_noop),
            Err(RegistrationError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn invalid_iris_are_rejected() {
        let mut registry = FunctionRegistry::new();
        let result = registry
            .register(FunctionDefinition::extension("split", noop).with_namespace("not an iri "));
        assert!(matches!(result, Err(RegistrationError::InvalidIri { .. })));
    }

    #[test]
    fn pattern_functions_need_a_signature() {
        let mut registry = FunctionRegistry::new();
        assert!(matches!(
            registry.register(FunctionDefinition::type_pattern("splitter", noop)),
            Err(RegistrationError::MissingSignature { .. })
        ));
        assert!(matches!(
            registry.register(FunctionDefinition::predicate_pattern("same_as", noop)),
            Err(RegistrationError::MissingSignature { .. })
        ));
        assert!(matches!(
            registry.register(
                FunctionDefinition::predicate_pattern("same_as", noop).with_signature(
                    Signature::new(OutputShape::Multi)
                        .with_parameter("a")
                        .with_parameter("b")
                )
            ),
            Err(RegistrationError::PredicateArity { actual: 2, .. })
        ));
    }

    #[test]
    fn subject_type_patterns_need_a_parameter() {
        let mut registry = FunctionRegistry::new();
        let result = registry.register(
            FunctionDefinition::type_pattern("labeller", noop)
                .with_use_subject(true)
                .with_signature(Signature::new(OutputShape::Scalar)),
        );
        assert!(matches!(
            result,
            Err(RegistrationError::MissingSubjectParameter { name }) if name == "labeller"
        ));
        registry
            .register(
                FunctionDefinition::type_pattern("labeller", noop)
                    .with_use_subject(true)
                    .with_signature(Signature::new(OutputShape::Scalar).with_parameter("entity")),
            )
            .unwrap();
    }

    #[test]
    fn only_graph_functions_return_graphs() {
        let mut registry = FunctionRegistry::new();
        assert!(matches!(
            registry.register(
                FunctionDefinition::extension("a", noop)
                    .with_signature(Signature::new(OutputShape::Graph))
            ),
            Err(RegistrationError::IncompatibleOutput { .. })
        ));
        assert!(matches!(
            registry.register(
                FunctionDefinition::graph("b", noop)
                    .with_signature(Signature::new(OutputShape::Multi))
            ),
            Err(RegistrationError::IncompatibleOutput { .. })
        ));
        assert!(matches!(
            registry.register(
                FunctionDefinition::predicate_pattern("c", noop).with_signature(
                    Signature::new(OutputShape::Struct).with_parameter("input")
                )
            ),
            Err(RegistrationError::IncompatibleOutput { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn recognizes_registered_shapes_only() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(
                FunctionDefinition::extension("split", noop).with_namespace("urn:f:"),
            )
            .unwrap();
        registry
            .register(
                FunctionDefinition::predicate_pattern("identifier", noop)
                    .with_namespace("http://purl.org/dc/elements/1.1/")
                    .with_signature(Signature::new(OutputShape::Scalar).with_parameter("iri")),
            )
            .unwrap();

        let recognized = |query: &str| compile(query).any(&|node| registry.recognizes(node));
        assert!(recognized(
            "SELECT * WHERE { BIND(<urn:f:split>(\"a b\") AS ?x) }"
        ));
        assert!(!recognized(
            "SELECT * WHERE { BIND(<urn:f:other>(\"a b\") AS ?x) }"
        ));
        assert!(recognized(
            "SELECT * WHERE { ?s <http://purl.org/dc/elements/1.1/identifier> ?id }"
        ));
        assert!(!recognized("SELECT * WHERE { ?s ?p ?o }"));
    }

    #[test]
    fn lists_extension_iris_for_the_service_description() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(FunctionDefinition::extension("split", noop).with_namespace("urn:f:"))
            .unwrap();
        registry
            .register(
                FunctionDefinition::type_pattern("splitter", noop)
                    .with_namespace("urn:f:")
                    .with_signature(Signature::new(OutputShape::Scalar)),
            )
            .unwrap();
        registry
            .register_legacy("urn:f:custom_concat", legacy_noop)
            .unwrap();

        let iris = registry.extension_function_iris();
        assert_eq!(
            iris,
            vec![
                NamedNode::new_unchecked("urn:f:split"),
                NamedNode::new_unchecked("urn:f:custom_concat")
            ]
        );
        assert_eq!(registry.len(), 3);
    }
}
