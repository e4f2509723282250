//! Domain layer for the Glimpse engine
//!
//! This module contains the core value objects, errors and the sampler port.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainResult, GlimpseError};
