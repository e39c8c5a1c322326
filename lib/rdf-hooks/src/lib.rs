#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

pub mod error;
pub mod store;

pub mod io {
    pub use oxrdfio::*;
}

pub mod model {
    pub use rdf_hooks_model::*;
}

pub mod sparql {
    pub use rdf_hooks_engine::sparql::*;
}

pub mod engine {
    pub use rdf_hooks_engine::{
        AlgebraNode, CustomEvaluator, EvalContext, MemoryQuadStorage, QuadStorage,
        SimpleEvaluator, Solution, SolutionIter,
    };
}

pub mod functions {
    pub use rdf_hooks_functions::*;
}
