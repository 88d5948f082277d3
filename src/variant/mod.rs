//! Variant trees, their enumeration and parameter lookup.

pub mod builder;
pub mod enumerate;
pub mod params;
pub mod tree;

pub use builder::{build, build_from_str};
pub use enumerate::{Variant, VariantFilter, VariantIter, VariantScope, Variants};
pub use params::{ResolvedParams, RUN_LOOKUP};
pub use tree::{ParamMap, Scope, VariantTree};
