use burn::{
    prelude::Bool,
    tensor::{backend::Backend, Int, Tensor},
};

/// Non-pad mask from raw event types
///
/// Event types are 1-based; 0 is the padding sentinel. The returned mask
/// is true at real events and false at padding.
pub fn non_pad_mask<B: Backend>(types: Tensor<B, 2, Int>) -> Tensor<B, 2, Bool> {
    types.greater_elem(0)
}

/// One-hot type mask of shape [batch, len, num_types]
///
/// Channel i is 1.0 where `types == i + 1`. Padding positions (type 0)
/// are all-zero across channels, so masked reductions drop them for free.
pub fn one_hot_type_mask<B: Backend>(
    types: Tensor<B, 2, Int>,
    num_types: usize,
) -> Tensor<B, 3> {
    if num_types == 0 {
        panic!("VALUE ERROR: one_hot_type_mask requires at least one event type");
    }

    let channels: Vec<Tensor<B, 3>> = (0..num_types)
        .map(|i| {
            types
                .clone()
                .equal_elem((i + 1) as i64)
                .float()
                .unsqueeze_dim::<3>(2)
        })
        .collect();

    Tensor::cat(channels, 2)
}
