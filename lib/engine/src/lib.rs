//! A small SPARQL evaluator over the [`spargebra`] algebra with per-node custom evaluation hooks.
//!
//! Queries are compiled into an [`AlgebraNode`] tree that a [`SimpleEvaluator`] walks
//! tuple-at-a-time. Every node is offered to the configured [`CustomEvaluator`]s before the
//! default evaluation runs.

pub mod error;
mod eval;
mod memory;
mod plan;
mod quad_storage;
pub mod results;
mod solution;
pub mod sparql;

pub use eval::{
    blank_node_variable, is_blank_node_variable, ActiveGraph, CustomEvaluator, EvalContext,
    SimpleEvaluator, SolutionIter, TemporaryGraphGuard, TemporaryGraphs,
    BLANK_NODE_VARIABLE_PREFIX,
};
pub use memory::MemoryQuadStorage;
pub use plan::{custom_function_call, AlgebraNode};
pub use quad_storage::QuadStorage;
pub use solution::Solution;
