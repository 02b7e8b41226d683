// Domain layer: procedure extraction, call graphs, impact tracing.

pub mod callgraph;
pub mod extract;
pub mod impact;
pub mod snapshot;
