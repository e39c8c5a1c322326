use crate::error::FunctionError;
use rdf_hooks_model::vocab::FUNC;
use rdf_hooks_model::{snake_to_camel, snake_to_pascal, Graph, Value};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// How the registry recognizes the algebra nodes a function handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// `BIND(<iri>(args...) AS ?x)`, binding scalar, list or struct results.
    Extension,
    /// `BIND(<iri>(args...) AS ?g)`, binding the IRI of a temporary graph holding the result.
    Graph,
    /// A virtual class: `?s a ns:ClassName ; ns:param ?in ; ns:field ?out`.
    ///
    /// With `use_subject`, the matched subject is passed as the first parameter.
    TypePattern { use_subject: bool },
    /// A virtual predicate: `?subject ns:functionName ?object`.
    PredicatePattern,
}

impl FunctionKind {
    /// Returns whether the function is called from a `BIND` expression.
    pub fn is_extension(self) -> bool {
        matches!(self, Self::Extension | Self::Graph)
    }
}

impl Display for FunctionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extension => f.write_str("extension"),
            Self::Graph => f.write_str("graph"),
            Self::TypePattern { .. } => f.write_str("type pattern"),
            Self::PredicatePattern => f.write_str("predicate pattern"),
        }
    }
}

/// The shape of the values a function returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputShape {
    Scalar,
    Multi,
    Struct,
    MultiStruct,
    Graph,
}

impl Display for OutputShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => f.write_str("scalar"),
            Self::Multi => f.write_str("multi-valued"),
            Self::Struct => f.write_str("struct"),
            Self::MultiStruct => f.write_str("multi-struct"),
            Self::Graph => f.write_str("graph"),
        }
    }
}

/// A declared parameter, optionally with a default value.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    name: String,
    default: Option<Value>,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// The declarative signature of a function: ordered parameters and the output shape.
///
/// ```
/// use rdf_hooks_functions::{OutputShape, Signature};
///
/// let signature = Signature::new(OutputShape::Multi)
///     .with_parameter("input_str")
///     .with_default("separator", " ");
/// assert_eq!(signature.parameters().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    parameters: Vec<Parameter>,
    output: OutputShape,
}

impl Signature {
    pub fn new(output: OutputShape) -> Self {
        Self {
            parameters: Vec::new(),
            output,
        }
    }

    /// Appends a required parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Appends a parameter that falls back to `default` when no value is given.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn output(&self) -> OutputShape {
        self.output
    }

    /// Binds positional values to the parameters, filling defaults for missing trailing ones.
    pub fn bind(&self, values: Vec<Value>) -> Result<FunctionArgs, FunctionError> {
        if values.len() > self.parameters.len() {
            return Err(FunctionError::TooManyArguments {
                expected: self.parameters.len(),
                actual: values.len(),
            });
        }

        let mut values = values;
        for parameter in &self.parameters[values.len()..] {
            match &parameter.default {
                Some(default) => values.push(default.clone()),
                None => return Err(FunctionError::MissingArgument(parameter.name.clone())),
            }
        }
        Ok(FunctionArgs {
            names: self.parameters.iter().map(|p| p.name.clone()).collect(),
            values,
        })
    }
}

/// The arguments a function is called with.
///
/// Values are in declaration order and can also be accessed by parameter name.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionArgs {
    names: Arc<[String]>,
    values: Vec<Value>,
}

impl FunctionArgs {
    /// Creates arguments without parameter names.
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            names: Vec::new().into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at `index`.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the value of the parameter `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|candidate| candidate == name)?;
        self.values.get(index)
    }

    /// Returns the value of the parameter `name` or a [FunctionError::MissingArgument].
    pub fn required(&self, name: &str) -> Result<&Value, FunctionError> {
        self.get(name)
            .ok_or_else(|| FunctionError::MissingArgument(name.to_owned()))
    }

    /// Returns the lexical form of the string-like parameter `name`.
    pub fn str(&self, name: &str) -> Result<&str, FunctionError> {
        let value = self.required(name)?;
        value.as_str().ok_or_else(|| FunctionError::InvalidArgument {
            name: name.to_owned(),
            value: value.to_string(),
        })
    }
}

/// An ordered list of named result fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructValue {
    fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(field, value)| (field == name).then_some(value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// What a function returns.
#[derive(Clone, Debug)]
pub enum FunctionOutput {
    Scalar(Value),
    Multi(Vec<Value>),
    Struct(StructValue),
    MultiStruct(Vec<StructValue>),
    Graph(Graph),
}

impl FunctionOutput {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn multi<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::Multi(values.into_iter().map(Into::into).collect())
    }

    pub fn shape(&self) -> OutputShape {
        match self {
            Self::Scalar(_) => OutputShape::Scalar,
            Self::Multi(_) => OutputShape::Multi,
            Self::Struct(_) => OutputShape::Struct,
            Self::MultiStruct(_) => OutputShape::MultiStruct,
            Self::Graph(_) => OutputShape::Graph,
        }
    }

    /// Checks the output against the declared shape, if any.
    pub fn check(self, expected: Option<OutputShape>) -> Result<Self, FunctionError> {
        match expected {
            Some(expected) if expected != self.shape() => Err(FunctionError::UnexpectedOutput {
                expected,
                actual: self.shape(),
            }),
            _ => Ok(self),
        }
    }

    /// Flattens the output into a list of rows. Graphs are rejected.
    pub fn into_rows(self) -> Result<Vec<OutputRow>, FunctionError> {
        Ok(match self {
            Self::Scalar(value) => vec![OutputRow::Value(value)],
            Self::Multi(values) => values.into_iter().map(OutputRow::Value).collect(),
            Self::Struct(fields) => vec![OutputRow::Struct(fields)],
            Self::MultiStruct(rows) => rows.into_iter().map(OutputRow::Struct).collect(),
            Self::Graph(_) => {
                return Err(FunctionError::UnexpectedOutput {
                    expected: OutputShape::MultiStruct,
                    actual: OutputShape::Graph,
                })
            }
        })
    }
}

impl From<Value> for FunctionOutput {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<StructValue> for FunctionOutput {
    fn from(value: StructValue) -> Self {
        Self::Struct(value)
    }
}

impl From<Graph> for FunctionOutput {
    fn from(value: Graph) -> Self {
        Self::Graph(value)
    }
}

/// A single element of a normalized [FunctionOutput].
#[derive(Clone, Debug, PartialEq)]
pub enum OutputRow {
    Value(Value),
    Struct(StructValue),
}

/// The callable behind a function definition.
pub trait CustomFunction: Send + Sync {
    fn call(&self, args: &FunctionArgs) -> Result<FunctionOutput, FunctionError>;
}

impl<F> CustomFunction for F
where
    F: Fn(&FunctionArgs) -> Result<FunctionOutput, FunctionError> + Send + Sync,
{
    fn call(&self, args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
        self(args)
    }
}

/// Everything the registry needs to know about a function.
///
/// ```
/// use rdf_hooks_functions::{FunctionDefinition, FunctionOutput, OutputShape, Signature};
///
/// let split = FunctionDefinition::extension("split", |args| {
///     let input = args.str("input_str")?;
///     Ok(FunctionOutput::multi(input.split(' ')))
/// })
/// .with_namespace("urn:sparql-function:")
/// .with_signature(Signature::new(OutputShape::Multi).with_parameter("input_str"));
/// assert_eq!(split.iri(), "urn:sparql-function:split");
/// ```
#[derive(Clone)]
pub struct FunctionDefinition {
    name: String,
    namespace: String,
    iri: Option<String>,
    kind: FunctionKind,
    signature: Option<Signature>,
    documentation: String,
    function: Arc<dyn CustomFunction>,
}

impl FunctionDefinition {
    /// Creates a definition in the default namespace.
    pub fn new<F>(kind: FunctionKind, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&FunctionArgs) -> Result<FunctionOutput, FunctionError> + Send + Sync + 'static,
    {
        Self::from_function(kind, name, Arc::new(function))
    }

    /// Creates a definition in the default namespace from any [CustomFunction].
    pub fn from_function(
        kind: FunctionKind,
        name: impl Into<String>,
        function: Arc<dyn CustomFunction>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: FUNC.to_owned(),
            iri: None,
            kind,
            signature: None,
            documentation: String::new(),
            function,
        }
    }

    pub fn extension<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&FunctionArgs) -> Result<FunctionOutput, FunctionError> + Send + Sync + 'static,
    {
        Self::new(FunctionKind::Extension, name, function)
    }

    pub fn graph<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&FunctionArgs) -> Result<FunctionOutput, FunctionError> + Send + Sync + 'static,
    {
        Self::new(FunctionKind::Graph, name, function)
    }

    pub fn type_pattern<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&FunctionArgs) -> Result<FunctionOutput, FunctionError> + Send + Sync + 'static,
    {
        Self::new(
            FunctionKind::TypePattern { use_subject: false },
            name,
            function,
        )
    }

    pub fn predicate_pattern<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&FunctionArgs) -> Result<FunctionOutput, FunctionError> + Send + Sync + 'static,
    {
        Self::new(FunctionKind::PredicatePattern, name, function)
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Uses `iri` instead of the IRI derived from the namespace and the name.
    #[must_use]
    pub fn with_iri(mut self, iri: impl Into<String>) -> Self {
        self.iri = Some(iri.into());
        self
    }

    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    #[must_use]
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    #[must_use]
    pub fn with_use_subject(mut self, use_subject: bool) -> Self {
        if let FunctionKind::TypePattern { .. } = self.kind {
            self.kind = FunctionKind::TypePattern { use_subject };
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The IRI the function is recognized by.
    ///
    /// Type patterns use the PascalCase class name, all other kinds the camelCase function name.
    pub fn iri(&self) -> String {
        if let Some(iri) = &self.iri {
            return iri.clone();
        }
        match self.kind {
            FunctionKind::TypePattern { .. } => {
                format!("{}{}", self.namespace, snake_to_pascal(&self.name))
            }
            _ => format!("{}{}", self.namespace, snake_to_camel(&self.name)),
        }
    }

    /// The IRI of the temporary graph a graph function fills.
    pub fn graph_iri(&self) -> String {
        format!("{}graph/{}", self.namespace, self.name)
    }

    /// The predicate IRI that carries the parameter or result field `name`.
    pub fn predicate_iri(&self, name: &str) -> String {
        format!("{}{}", self.namespace, snake_to_camel(name))
    }

    pub fn call(&self, args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
        self.function.call(args)
    }
}

impl Debug for FunctionDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("iri", &self.iri)
            .field("kind", &self.kind)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature() -> Signature {
        Signature::new(OutputShape::Multi)
            .with_parameter("input_str")
            .with_default("separator", " ")
    }

    #[test]
    fn defaults_fill_missing_trailing_arguments() {
        let args = signature().bind(vec![Value::from("a b")]).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args.str("input_str"), Ok("a b"));
        assert_eq!(args.get("separator"), Some(&Value::from(" ")));
    }

    #[test]
    fn binding_rejects_bad_arity() {
        assert_eq!(
            signature().bind(Vec::new()),
            Err(FunctionError::MissingArgument("input_str".to_owned()))
        );
        assert_eq!(
            signature().bind(vec![Value::from(1), Value::from(2), Value::from(3)]),
            Err(FunctionError::TooManyArguments {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn iris_follow_the_kind() {
        let noop = |_: &FunctionArgs| -> Result<FunctionOutput, FunctionError> {
            Ok(FunctionOutput::scalar(true))
        };
        let extension = FunctionDefinition::extension("split_index", noop);
        assert_eq!(extension.iri(), format!("{FUNC}splitIndex"));

        let type_pattern = FunctionDefinition::type_pattern("string_splitter", noop);
        assert_eq!(type_pattern.iri(), format!("{FUNC}StringSplitter"));
        assert_eq!(
            type_pattern.predicate_iri("split_string"),
            format!("{FUNC}splitString")
        );

        let graph = FunctionDefinition::graph("split_graph", noop).with_namespace("urn:f:");
        assert_eq!(graph.iri(), "urn:f:splitGraph");
        assert_eq!(graph.graph_iri(), "urn:f:graph/split_graph");

        let explicit = FunctionDefinition::extension("x", noop).with_iri("http://example.com/x");
        assert_eq!(explicit.iri(), "http://example.com/x");
    }

    #[test]
    fn outputs_are_checked_and_flattened() {
        let output = FunctionOutput::multi(["a", "b"]);
        assert!(matches!(
            output.clone().check(Some(OutputShape::Scalar)),
            Err(FunctionError::UnexpectedOutput { .. })
        ));
        assert_eq!(
            output.check(None).unwrap().into_rows().unwrap(),
            vec![
                OutputRow::Value(Value::from("a")),
                OutputRow::Value(Value::from("b"))
            ]
        );
        assert!(FunctionOutput::Graph(Graph::new()).into_rows().is_err());
    }
}
