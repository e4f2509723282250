//! Port trait definitions (Hexagonal Architecture)
//!
//! - Sampler: the pluggable, potentially slow content-generation capability
//!
//! Adapters under `crate::adapters` implement these; services only see the trait.

pub mod sampler;

pub use sampler::Sampler;
