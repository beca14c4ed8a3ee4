//! sahp-rs: Rust implementation of a multi-process self-attentive Hawkes
//! process (intensity, likelihood and loss computation)

pub mod sahp;

pub use sahp::settings::{settings, Settings};

/// Test utilities for backend-aware tensor construction
///
/// Provides helper functions for creating tensors that work with Burn 0.18's
/// Into<TensorData> trait bounds using Vec<T> + .as_slice() pattern.
pub mod test_utils;
