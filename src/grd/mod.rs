//! Graph of Rule Dependencies and stratification (spec 4.8, 4.9).

mod graph;
mod stratify;

pub use graph::{build, Grd, GrdEdge, GrdMode};
pub use stratify::{stratify, Stratum, StratificationStrategy};
