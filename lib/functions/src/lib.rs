//! User-defined SPARQL functions.
//!
//! Functions are described by a [FunctionDefinition] and collected in a [FunctionRegistry]. The
//! registry implements [CustomEvaluator](rdf_hooks_engine::CustomEvaluator) and recognizes four
//! shapes in the algebra of a query:
//!
//! - extension functions called from `BIND(<iri>(args...) AS ?x)`,
//! - graph functions, also called from `BIND`, whose triples end up in a temporary named graph,
//! - type patterns, virtual classes queried with `?s a ns:ClassName ; ns:param ?in`,
//! - predicate patterns, virtual predicates queried with `?s ns:functionName ?o`.
//!
//! Equality filters on a variable are pushed into plans that contain one of these shapes.

mod definition;
mod error;
mod examples;
mod extension;
mod graph;
mod legacy;
mod predicate_pattern;
mod pushdown;
mod registry;
mod type_pattern;

pub use definition::{
    CustomFunction, FunctionArgs, FunctionDefinition, FunctionKind, FunctionOutput, OutputRow,
    OutputShape, Parameter, Signature, StructValue,
};
pub use error::{FunctionError, RegistrationError};
pub use examples::{example_query, example_title, ExampleQuery};
pub use legacy::{LegacyCall, LegacyFunction};
pub use registry::{FunctionRegistry, RegisteredFunction};
