mod case;
mod error;
mod value;
pub mod vocab;

pub use case::{snake_to_camel, snake_to_pascal};
pub use error::*;
pub use value::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Dataset, Graph, GraphName, GraphNameRef, IriParseError, Literal,
    LiteralRef, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef,
    Subject, SubjectRef, Term, TermRef, Triple, TripleRef, Variable, VariableNameParseError, VariableRef,
};
pub use oxsdatatypes::{DateTime, Decimal};
