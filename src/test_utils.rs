// Test utilities for backend-aware tensor construction
//
// Helper functions for creating tensors that work with Burn 0.18's
// Into<TensorData> trait bounds. All functions use the Vec<T> +
// .as_slice() pattern to satisfy the API requirements.

use burn::tensor::{backend::Backend, Tensor};

/// Create f32 tensor from data slice with specified shape
pub fn tensor_from_f32_vec<B: Backend, const D: usize>(
    data: &[f32],
    shape: &[usize],
    device: &B::Device,
) -> Tensor<B, D> {
    let expected_size: usize = shape.iter().product();
    assert_eq!(
        data.len(),
        expected_size,
        "Data length {} doesn't match shape {:?} (expected {})",
        data.len(),
        shape,
        expected_size
    );

    let data_vec: Vec<f32> = data.to_vec();
    let flat_tensor = Tensor::<B, 1>::from_floats(data_vec.as_slice(), device);
    flat_tensor.reshape(burn::tensor::Shape::from(shape))
}

/// Create i64 tensor from data slice with specified shape
pub fn tensor_from_i64_vec<B: Backend, const D: usize>(
    data: &[i64],
    shape: &[usize],
    device: &B::Device,
) -> Tensor<B, D, burn::tensor::Int> {
    let expected_size: usize = shape.iter().product();
    assert_eq!(
        data.len(),
        expected_size,
        "Data length {} doesn't match shape {:?} (expected {})",
        data.len(),
        shape,
        expected_size
    );

    let data_vec: Vec<i64> = data.to_vec();
    let flat_tensor = Tensor::<B, 1, burn::tensor::Int>::from_ints(data_vec.as_slice(), device);
    flat_tensor.reshape(burn::tensor::Shape::from(shape))
}

/// Create bool tensor from data slice with specified shape
pub fn tensor_from_bool_vec<B: Backend, const D: usize>(
    data: &[bool],
    shape: &[usize],
    device: &B::Device,
) -> Tensor<B, D, burn::tensor::Bool> {
    let expected_size: usize = shape.iter().product();
    assert_eq!(
        data.len(),
        expected_size,
        "Data length {} doesn't match shape {:?} (expected {})",
        data.len(),
        shape,
        expected_size
    );

    let data_vec: Vec<bool> = data.to_vec();
    let flat_tensor = Tensor::<B, 1, burn::tensor::Bool>::from_data(
        burn::tensor::TensorData::new(data_vec, [expected_size]),
        device,
    );
    flat_tensor.reshape(burn::tensor::Shape::from(shape))
}
