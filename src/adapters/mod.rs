//! Adapters implementing domain ports.

pub mod samplers;
