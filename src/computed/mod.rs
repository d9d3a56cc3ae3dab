//! Computed predicates (spec 4.5): a `ReadableData` backend that
//! evaluates rather than stores — arithmetic/string functions, equality,
//! comparisons.

mod function;
mod source;

pub use function::ComputedFunction;
pub use source::ComputedSource;
