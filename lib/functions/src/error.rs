use crate::definition::{FunctionKind, OutputShape};
use rdf_hooks_model::IriParseError;
use thiserror::Error;

/// An error returned by a registered function or while binding its arguments.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FunctionError {
    #[error("Expected at most {expected} arguments, got {actual}")]
    TooManyArguments { expected: usize, actual: usize },
    #[error("The required argument '{0}' is missing")]
    MissingArgument(String),
    #[error("The argument '{name}' has an unsupported value: {value}")]
    InvalidArgument { name: String, value: String },
    #[error("The function returned a {actual} result but declares {expected}")]
    UnexpectedOutput {
        expected: OutputShape,
        actual: OutputShape,
    },
    #[error("A struct result must have at least one field")]
    EmptyStruct,
    #[error("The result field '{0}' cannot be used as a variable name")]
    InvalidField(String),
    #[error("{0}")]
    Failed(String),
}

impl FunctionError {
    /// Creates a [FunctionError::Failed] from any message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// An error raised when a function definition is rejected by the registry.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("The IRI '{iri}' of the function '{name}' is invalid")]
    InvalidIri {
        name: String,
        iri: String,
        #[source]
        error: IriParseError,
    },
    #[error("A function is already registered for <{0}>")]
    AlreadyRegistered(String),
    #[error("The {kind} function '{name}' must declare a signature")]
    MissingSignature { name: String, kind: FunctionKind },
    #[error("The predicate function '{name}' must declare exactly one parameter, got {actual}")]
    PredicateArity { name: String, actual: usize },
    #[error("The type pattern '{name}' takes its subject as first parameter but declares none")]
    MissingSubjectParameter { name: String },
    #[error("The {kind} function '{name}' cannot declare a {output} output")]
    IncompatibleOutput {
        name: String,
        kind: FunctionKind,
        output: OutputShape,
    },
}
