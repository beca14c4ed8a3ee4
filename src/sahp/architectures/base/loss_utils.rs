use burn::{
    prelude::Bool,
    tensor::{activation, backend::Backend, ElementConversion, Int, Tensor},
};

/// Validate a tensor for NaN and Inf values
///
/// Panics with a descriptive message if the tensor contains NaN or Inf,
/// so numerical instabilities are caught where they appear instead of
/// propagating into the loss.
pub fn validate_finite<B: Backend, const D: usize>(tensor: &Tensor<B, D>, tensor_name: &str) {
    let tensor_data = tensor.to_data();
    if let Ok(slice) = tensor_data.as_slice::<f32>() {
        let nan_count = slice.iter().filter(|&&x| x.is_nan()).count();
        if nan_count > 0 {
            panic!(
                "NUMERICAL ERROR: {} contains {} NaN values. This indicates numerical instability in upstream computations.",
                tensor_name, nan_count
            );
        }
        let inf_count = slice.iter().filter(|&&x| x.is_infinite()).count();
        if inf_count > 0 {
            panic!(
                "NUMERICAL ERROR: {} contains {} infinite values. This may indicate exploding activations.",
                tensor_name, inf_count
            );
        }
    }
}

/// Unreduced cross-entropy with an ignore sentinel
///
/// Computes the per-position negative log-likelihood of `targets` under
/// `log_softmax(logits)`. Positions whose target equals `ignore_index`
/// get exactly 0 loss. Targets are sanitized on an internal copy; the
/// caller's tensor is not touched.
pub fn cross_entropy_with_ignore<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    ignore_index: i64,
) -> Tensor<B, 1> {
    let [batch, num_classes] = logits.dims();
    if targets.dims() != [batch] {
        panic!(
            "SHAPE ERROR: logits batch dimension {} must match targets batch dimension {}",
            batch,
            targets.dims()[0]
        );
    }
    if num_classes == 0 {
        panic!("SHAPE ERROR: logits must have at least one class dimension");
    }

    let ignore_mask = targets.clone().equal_elem(ignore_index);
    let non_pad = ignore_mask.clone().bool_not().float();

    // ignored entries are remapped to class 0 so gather stays in bounds;
    // their loss is zeroed below
    let clean_targets = targets.mask_fill(ignore_mask, 0);

    let log_probs = activation::log_softmax(logits, 1);
    let gathered = log_probs.gather(1, clean_targets.unsqueeze_dim::<2>(1));
    let nll = gathered.squeeze::<1>(1).neg();

    nll * non_pad
}

/// Label-smoothed classification loss
///
/// The smoothed target distribution gives the true class mass
/// `1 - eps` and spreads `eps / num_classes` uniformly over all classes,
/// so each row sums to exactly 1. The per-position loss is the negative
/// dot product with the log-softmax of the logits, zeroed at positions
/// whose target equals the ignore sentinel, and returned unsummed.
///
/// The caller's target tensor is never mutated; ignored entries are
/// remapped to class 0 on an internal copy only.
#[derive(Debug, Clone)]
pub struct LabelSmoothingLoss {
    eps: f32,
    num_classes: usize,
    ignore_index: i64,
}

impl LabelSmoothingLoss {
    pub fn new(label_smoothing: f32, num_classes: usize, ignore_index: i64) -> Self {
        if label_smoothing <= 0.0 || label_smoothing > 1.0 {
            panic!(
                "VALUE ERROR: label_smoothing must be in (0, 1], got {}",
                label_smoothing
            );
        }
        if num_classes < 2 {
            panic!(
                "VALUE ERROR: label smoothing needs at least 2 classes, got {}",
                num_classes
            );
        }

        Self {
            eps: label_smoothing,
            num_classes,
            ignore_index,
        }
    }

    /// Loss for one process of a validated configuration, with the
    /// shifted-padding sentinel -1 as ignore index
    pub fn from_config(config: &super::config::PointProcessConfig, process_idx: usize) -> Self {
        if process_idx >= config.num_types.len() {
            panic!(
                "VALUE ERROR: process index {} out of range, config has {} processes",
                process_idx,
                config.num_types.len()
            );
        }
        Self::new(config.label_smoothing, config.num_types[process_idx], -1)
    }

    pub fn ignore_index(&self) -> i64 {
        self.ignore_index
    }

    /// Per-position smoothed cross-entropy
    ///
    /// output: [batch, num_classes] class logits
    /// target: [batch] class indices, possibly containing the ignore sentinel
    pub fn forward<B: Backend>(
        &self,
        output: Tensor<B, 2>,
        target: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        let [batch, num_classes] = output.dims();
        if num_classes != self.num_classes {
            panic!(
                "SHAPE ERROR: logits have {} classes but loss was built for {}",
                num_classes, self.num_classes
            );
        }
        if target.dims() != [batch] {
            panic!(
                "SHAPE ERROR: logits batch dimension {} must match target batch dimension {}",
                batch,
                target.dims()[0]
            );
        }

        let ignore_mask = target.clone().equal_elem(self.ignore_index);
        let non_pad = ignore_mask.clone().bool_not().float();
        let clean_target = target.mask_fill(ignore_mask, 0);

        let channels: Vec<Tensor<B, 2>> = (0..self.num_classes)
            .map(|class| {
                clean_target
                    .clone()
                    .equal_elem(class as i64)
                    .float()
                    .unsqueeze_dim::<2>(1)
            })
            .collect();
        let one_hot = Tensor::cat(channels, 1);
        let smoothed = one_hot
            .mul_scalar(1.0 - self.eps)
            .add_scalar(self.eps / self.num_classes as f32);

        let log_prb = activation::log_softmax(output, 1);
        let loss = (smoothed * log_prb).sum_dim(1).squeeze::<1>(1).neg();

        loss * non_pad
    }
}

/// Loss function for the type-classification head
#[derive(Debug, Clone)]
pub enum TypeLossFn {
    /// Label-smoothed loss object
    LabelSmoothing(LabelSmoothingLoss),
    /// Plain unreduced cross-entropy with ignore-index -1
    CrossEntropy,
}

/// Event type prediction loss, cross entropy or label smoothing
///
/// The type at position t is predicted from the history before t, so truth
/// and prediction are shifted by one step: `truth = types[:, 1:] - 1`
/// maps wire type IDs 1..K onto classes 0..K-1 and turns padding (0) into
/// -1, which the loss functions ignore.
///
/// The correct-count is taken over ALL shifted positions, padding
/// included; a padded row's truth is -1 and can never match an arg-max
/// class, so accuracy on padded batches is deflated by construction.
/// The trimmed per-sequence truth/prediction lists (cut at the first -1)
/// are returned for downstream metric reporting.
///
/// Returns (summed loss, correct-count, flattened truth list, flattened
/// prediction list).
pub fn type_loss<B: Backend>(
    prediction: Tensor<B, 3>,
    types: Tensor<B, 2, Int>,
    loss_fn: &TypeLossFn,
) -> (Tensor<B, 1>, i64, Vec<i64>, Vec<i64>) {
    let [batch, len, num_classes] = prediction.dims();
    if types.dims() != [batch, len] {
        panic!(
            "SHAPE ERROR: types shape {:?} must match prediction leading dims [{}, {}]",
            types.dims(),
            batch,
            len
        );
    }
    if len < 2 {
        panic!(
            "SHAPE ERROR: type loss needs sequences of length >= 2, got {}",
            len
        );
    }
    validate_finite(&prediction, "type predictions");

    // convert [1,2,3] based types to [0,1,2]; padding events become -1
    let truth = types.slice([0..batch, 1..len]).sub_scalar(1);
    let prediction = prediction.slice([0..batch, 0..len - 1, 0..num_classes]);

    let pred_type = prediction.clone().argmax(2).squeeze::<2>(2);
    let correct_num: i64 = pred_type
        .clone()
        .equal(truth.clone())
        .int()
        .sum()
        .into_scalar()
        .elem();

    let truth_data = truth.to_data();
    let truth_slice = truth_data
        .as_slice::<i64>()
        .expect("Should convert truth tensor to i64 slice");
    let pred_data = pred_type.to_data();
    let pred_slice = pred_data
        .as_slice::<i64>()
        .expect("Should convert prediction tensor to i64 slice");

    let width = len - 1;
    let mut true_list = Vec::new();
    let mut pred_list = Vec::new();
    for row in 0..batch {
        let row_truth = &truth_slice[row * width..(row + 1) * width];
        let row_pred = &pred_slice[row * width..(row + 1) * width];
        let cut = row_truth
            .iter()
            .position(|&t| t == -1)
            .unwrap_or(width);
        true_list.extend_from_slice(&row_truth[..cut]);
        pred_list.extend_from_slice(&row_pred[..cut]);
    }

    let flat = batch * width;
    let flat_logits = prediction.reshape([flat, num_classes]);
    let flat_truth = truth.reshape([flat]);

    let per_position = match loss_fn {
        TypeLossFn::LabelSmoothing(smoothing) => smoothing.forward(flat_logits, flat_truth),
        TypeLossFn::CrossEntropy => cross_entropy_with_ignore(flat_logits, flat_truth, -1),
    };
    let loss = per_position.sum();

    (loss, correct_num, true_list, pred_list)
}

/// Time prediction loss
///
/// Squeezes the trailing singleton of the prediction and compares predicted
/// gaps `prediction[:, :-1]` against true inter-event gaps
/// `time[:, 1:] - time[:, :-1]`. Squared differences at padded gaps are
/// masked out, the same convention the event and compensator terms use.
/// Returns the summed squared error.
pub fn time_loss<B: Backend>(
    prediction: Tensor<B, 3>,
    event_time: Tensor<B, 2>,
    non_pad_mask: Tensor<B, 2, Bool>,
) -> Tensor<B, 1> {
    let [batch, len, trailing] = prediction.dims();
    if trailing != 1 {
        panic!(
            "SHAPE ERROR: time prediction must have a trailing singleton dimension, got {:?}",
            prediction.dims()
        );
    }
    if event_time.dims() != [batch, len] {
        panic!(
            "SHAPE ERROR: event times {:?} must match prediction leading dims [{}, {}]",
            event_time.dims(),
            batch,
            len
        );
    }
    if len < 2 {
        panic!(
            "SHAPE ERROR: time loss needs sequences of length >= 2, got {}",
            len
        );
    }

    let prediction = prediction.squeeze::<2>(2);

    let true_gap = event_time.clone().slice([0..batch, 1..len])
        - event_time.slice([0..batch, 0..len - 1]);
    let pred_gap = prediction.slice([0..batch, 0..len - 1]);

    let diff = (pred_gap - true_gap) * non_pad_mask.slice([0..batch, 1..len]).float();
    (diff.clone() * diff).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{tensor_from_bool_vec, tensor_from_f32_vec, tensor_from_i64_vec};
    use burn::backend::Autodiff;
    use burn::tensor::backend::Backend;
    use burn_ndarray::NdArray;

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_cross_entropy_ignores_sentinel() {
        let device = <TestBackend as Backend>::Device::default();

        let logits = tensor_from_f32_vec::<TestBackend, 2>(
            &[1.0, 2.0, 0.5, 0.8, 1.5, 2.1],
            &[2, 3],
            &device,
        );
        let targets = tensor_from_i64_vec::<TestBackend, 1>(&[1, -1], &[2], &device);

        let loss = cross_entropy_with_ignore(logits, targets, -1);
        let data = loss.to_data();
        let values = data.as_slice::<f32>().unwrap();
        assert!(values[0] > 0.0, "valid position should have positive loss");
        assert_eq!(values[1], 0.0, "ignored position should have exactly 0 loss");
    }

    #[test]
    fn test_label_smoothing_does_not_mutate_target() {
        let device = <TestBackend as Backend>::Device::default();
        let loss_fn = LabelSmoothingLoss::new(0.1, 3, -1);

        let logits =
            tensor_from_f32_vec::<TestBackend, 2>(&[1.0, 2.0, 0.5, 0.8, 1.5, 2.1], &[2, 3], &device);
        let targets = tensor_from_i64_vec::<TestBackend, 1>(&[2, -1], &[2], &device);

        let _ = loss_fn.forward(logits, targets.clone());

        let data = targets.to_data();
        assert_eq!(
            data.as_slice::<i64>().unwrap(),
            &[2, -1],
            "caller's target tensor must be unchanged"
        );
    }

    #[test]
    #[should_panic(expected = "VALUE ERROR: label_smoothing must be in (0, 1]")]
    fn test_label_smoothing_rejects_zero_eps() {
        LabelSmoothingLoss::new(0.0, 3, -1);
    }

    #[test]
    fn test_label_smoothing_from_config() {
        let config = crate::sahp::architectures::base::config::PointProcessConfig {
            d_model: 8,
            num_types: vec![3, 5],
            ..Default::default()
        };
        let loss_fn = LabelSmoothingLoss::from_config(&config, 1);
        assert_eq!(loss_fn.ignore_index(), -1);
    }

    #[test]
    fn test_time_loss_zero_for_exact_gaps() {
        let device = <TestBackend as Backend>::Device::default();

        let time = tensor_from_f32_vec::<TestBackend, 2>(&[0.0, 0.5, 2.0], &[1, 3], &device);
        // predicted gap at position t forecasts time[t+1] - time[t];
        // the last prediction is past the horizon and unused
        let prediction =
            tensor_from_f32_vec::<TestBackend, 3>(&[0.5, 1.5, 9.9], &[1, 3, 1], &device);
        let mask = tensor_from_bool_vec::<TestBackend, 2>(&[true, true, true], &[1, 3], &device);

        let loss = time_loss(prediction, time, mask);
        let value: f32 = loss.to_data().as_slice::<f32>().unwrap()[0];
        assert_eq!(value, 0.0, "exact gap prediction must give exactly 0 loss");
    }
}
