use burn::{
    prelude::Bool,
    tensor::{backend::Backend, Int, Tensor},
};
use rand::rngs::StdRng;

use super::intensity::{DeterministicRngContext, IntensityHead};
use super::masking;

/// Softplus with hard thresholding at pre-activation 20
///
/// Computes `log(1 + exp(beta * x)) / beta` with `beta * x` clamped above
/// at 20 so `exp` cannot overflow. `beta` has shape [1] (scalar) or
/// [last dim of x] and broadcasts over the trailing dimension; it must be
/// non-zero. The output is non-negative everywhere.
pub fn softplus<B: Backend>(x: Tensor<B, 3>, beta: Tensor<B, 1>) -> Tensor<B, 3> {
    let beta3 = beta.unsqueeze::<3>();
    let temp = (x * beta3.clone()).clamp_max(20.0);
    temp.exp().add_scalar(1.0).log().div(beta3)
}

/// Log-likelihood of events
///
/// Adds 1e-9 in case some events have 0 likelihood, and forces padded
/// positions to intensity 1.0 so their log-contribution is exactly 0.
/// Returns log(intensity) per position; the caller sums over time.
pub fn compute_event<B: Backend>(
    event: Tensor<B, 2>,
    non_pad_mask: Tensor<B, 2, Bool>,
) -> Tensor<B, 2> {
    if event.dims() != non_pad_mask.dims() {
        panic!(
            "SHAPE ERROR: intensity shape {:?} must match non-pad mask shape {:?}",
            event.dims(),
            non_pad_mask.dims()
        );
    }

    let event = event.add_scalar(1e-9);
    let event = event.mask_fill(non_pad_mask.bool_not(), 1.0);
    event.log()
}

/// Log-likelihood of non-events, using linear interpolation
///
/// Trapezoidal rule over consecutive inter-event intervals: each interval
/// contributes `0.5 * (t[i+1] - t[i]) * (lambda[i+1] + lambda[i])`, masked
/// by validity of the later endpoint. Deterministic.
pub fn compute_integral_biased<B: Backend>(
    all_lambda: Tensor<B, 2>,
    time: Tensor<B, 2>,
    non_pad_mask: Tensor<B, 2, Bool>,
) -> Tensor<B, 2> {
    let [batch, len] = time.dims();
    if all_lambda.dims() != [batch, len] {
        panic!(
            "SHAPE ERROR: intensity shape {:?} must match time shape {:?}",
            all_lambda.dims(),
            time.dims()
        );
    }
    if len < 2 {
        panic!("SHAPE ERROR: integral needs sequences of length >= 2, got {}", len);
    }

    let mask_tail = non_pad_mask.slice([0..batch, 1..len]).float();

    let diff_time = (time.clone().slice([0..batch, 1..len])
        - time.slice([0..batch, 0..len - 1]))
        * mask_tail.clone();
    let diff_lambda = (all_lambda.clone().slice([0..batch, 1..len])
        + all_lambda.slice([0..batch, 0..len - 1]))
        * mask_tail;

    (diff_lambda * diff_time).mul_scalar(0.5)
}

/// Log-likelihood of non-events, using Monte Carlo integration
///
/// For each inter-event interval, draws `head.mc_samples` uniform offsets
/// in [0, 1) from the injected RNG, scales them by the interval length and
/// by `1 / (t_start + 1)`, evaluates the process intensity at each draw
/// (projection reduced under the type mask, plus `alpha` times the sampled
/// offset, through softplus with `|beta|`), and averages. The result per
/// interval is an unbiased stochastic estimate of the compensator
/// contribution; a fixed seed makes it reproducible.
pub fn compute_integral_unbiased<B: Backend>(
    head: &IntensityHead<B>,
    process_idx: usize,
    data: Tensor<B, 3>,
    time: Tensor<B, 2>,
    non_pad_mask: Tensor<B, 2, Bool>,
    type_mask: Tensor<B, 3>,
    rng_ctx: &DeterministicRngContext<B>,
    rng: &mut StdRng,
) -> Tensor<B, 2> {
    if process_idx >= head.num_processes() {
        panic!(
            "VALUE ERROR: process index {} out of range, model has {} processes",
            process_idx,
            head.num_processes()
        );
    }
    let [batch, len] = time.dims();
    if len < 2 {
        panic!("SHAPE ERROR: integral needs sequences of length >= 2, got {}", len);
    }
    let num_types = head.num_types.0[process_idx];
    if type_mask.dims() != [batch, len, num_types] {
        panic!(
            "SHAPE ERROR: type mask shape {:?} must be [{}, {}, {}]",
            type_mask.dims(),
            batch,
            len,
            num_types
        );
    }
    let num_samples = head.mc_samples.0;

    let mask_tail = non_pad_mask.slice([0..batch, 1..len]).float();
    let diff_time = (time.clone().slice([0..batch, 1..len])
        - time.clone().slice([0..batch, 0..len - 1]))
        * mask_tail;

    let rand_offsets = rng_ctx.generate_uniform_tensor([batch, len - 1, num_samples], rng);
    let temp_time = diff_time.clone().unsqueeze_dim::<3>(2) * rand_offsets;
    let temp_time = temp_time.div(
        time.slice([0..batch, 0..len - 1])
            .add_scalar(1.0)
            .unsqueeze_dim::<3>(2),
    );

    let temp_hid = head.linear_list[process_idx].forward_3d(data);
    let temp_hid = (temp_hid.slice([0..batch, 1..len, 0..num_types])
        * type_mask.slice([0..batch, 1..len, 0..num_types]))
    .sum_dim(2);

    let alpha = head.alpha.val().unsqueeze::<3>();
    let all_lambda = softplus(temp_hid + temp_time * alpha, head.beta.val().abs());

    let all_lambda = all_lambda
        .sum_dim(2)
        .squeeze::<2>(2)
        .div_scalar(num_samples as f32);

    all_lambda * diff_time
}

/// Log-likelihood of one process's event sequence
///
/// Derives the non-pad and one-hot type masks from the raw types, turns
/// the hidden states into per-type intensities, and returns the per-sequence
/// event and non-event terms. The overall sequence log-likelihood is
/// `event_ll - non_event_ll`, left to the caller. The non-event term uses
/// the Monte Carlo integral; the trapezoidal variant exists for diagnostics
/// but is not invoked here.
pub fn log_likelihood<B: Backend>(
    head: &IntensityHead<B>,
    process_idx: usize,
    data: Tensor<B, 3>,
    time: Tensor<B, 2>,
    types: Tensor<B, 2, Int>,
    rng_ctx: &DeterministicRngContext<B>,
    rng: &mut StdRng,
) -> (Tensor<B, 1>, Tensor<B, 1>) {
    if process_idx >= head.num_processes() {
        panic!(
            "VALUE ERROR: process index {} out of range, model has {} processes",
            process_idx,
            head.num_processes()
        );
    }
    let [batch, len] = time.dims();
    if types.dims() != [batch, len] {
        panic!(
            "SHAPE ERROR: types shape {:?} must match time shape {:?}",
            types.dims(),
            time.dims()
        );
    }
    let [data_batch, data_len, _] = data.dims();
    if [data_batch, data_len] != [batch, len] {
        panic!(
            "SHAPE ERROR: hidden states {:?} must share leading dims with time {:?}",
            data.dims(),
            time.dims()
        );
    }

    let non_pad_mask = masking::non_pad_mask(types.clone());
    let num_types = head.num_types.0[process_idx];
    let type_mask = masking::one_hot_type_mask(types, num_types);

    let all_hid = head.linear_list[process_idx].forward_3d(data.clone());
    let all_lambda = softplus(all_hid, head.beta.val().abs());
    let type_lambda = (all_lambda * type_mask.clone()).sum_dim(2).squeeze::<2>(2);

    // event log-likelihood
    let event_ll = compute_event(type_lambda, non_pad_mask.clone());
    let event_ll = event_ll.sum_dim(1).squeeze::<1>(1);

    // non-event log-likelihood via Monte Carlo integration
    let non_event_ll = compute_integral_unbiased(
        head,
        process_idx,
        data,
        time,
        non_pad_mask,
        type_mask,
        rng_ctx,
        rng,
    );
    let non_event_ll = non_event_ll.sum_dim(1).squeeze::<1>(1);

    (event_ll, non_event_ll)
}
