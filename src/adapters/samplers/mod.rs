//! Sampler implementations.

pub mod heuristic;
pub mod mock;

pub use heuristic::HeuristicSampler;
pub use mock::{MockBehavior, MockResponse, MockSampler};
