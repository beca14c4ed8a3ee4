use burn::{
    module::{Ignored, Module, Param},
    tensor::{backend::Backend, Tensor},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use super::config::PointProcessConfig;

/// Deterministic linear layer wrapper that stores pre-initialized weights
///
/// Provides the same interface as burn::nn::Linear but with
/// deterministically initialized weights. Weights are stored as Param
/// tensors which are properly registered by the Module derive.
#[derive(Module, Debug)]
pub struct DeterministicLinear<B: Backend> {
    /// Weight matrix of shape [output_dim, input_dim]
    pub weight: Param<Tensor<B, 2>>,
    /// Optional bias vector of shape [output_dim]
    pub bias: Option<Param<Tensor<B, 1>>>,
}

impl<B: Backend> DeterministicLinear<B> {
    /// Create a new deterministic linear layer with pre-initialized weights
    pub fn new(weight: Tensor<B, 2>, bias: Option<Tensor<B, 1>>) -> Self {
        Self {
            weight: Param::from_tensor(weight),
            bias: bias.map(Param::from_tensor),
        }
    }

    /// Forward pass through the linear layer
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let output = input.matmul(self.weight.val().transpose());
        if let Some(ref bias) = self.bias {
            output.add(bias.val().unsqueeze())
        } else {
            output
        }
    }

    /// Forward pass for batch-first 3D tensors (applies linear to last dimension)
    pub fn forward_3d(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, len, input_dim] = input.dims();
        let output_dim = self.weight.val().dims()[0];

        let reshaped_input = input.reshape([batch * len, input_dim]);
        let output_2d = self.forward(reshaped_input);
        output_2d.reshape([batch, len, output_dim])
    }
}

/// Deterministic RNG context for reproducible computation
///
/// Seed offsets partition the randomness by concern:
/// - +100 series: parameter initialization (per-process projections)
/// - +1000 series: Monte Carlo sampling in the compensator integral
///
/// All random operations must use this context with an explicit seed and
/// pass `&mut StdRng` to ensure full reproducibility across backends.
/// Never use StdRng::from_entropy() or any global RNG source.
#[derive(Debug, Clone)]
pub struct DeterministicRngContext<B: Backend> {
    pub seed: u64,
    device: B::Device,
}

impl<B: Backend> DeterministicRngContext<B> {
    /// Create a new deterministic RNG context
    pub fn new(seed: u64, device: B::Device) -> Self {
        Self { seed, device }
    }

    /// Device this context creates tensors on
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Execute function with isolated deterministic RNG
    ///
    /// Creates a StdRng seeded from the provided seed or falls back to the
    /// context seed. Never uses StdRng::from_entropy().
    pub fn with_isolated_seed<F, R>(&self, seed: Option<u64>, f: F) -> R
    where
        F: FnOnce(&mut StdRng) -> R,
    {
        let effective_seed = seed.unwrap_or(self.seed);
        let mut rng = StdRng::seed_from_u64(effective_seed);
        f(&mut rng)
    }

    /// Create a deterministic linear layer with pre-initialized weights
    ///
    /// Weights use Xavier/Glorot initialization drawn from a StdRng seeded
    /// with the provided seed.
    pub fn create_deterministic_linear(
        &self,
        input_dim: usize,
        output_dim: usize,
        bias: bool,
        seed: u64,
    ) -> DeterministicLinear<B> {
        let mut rng = StdRng::seed_from_u64(seed);

        let std = (2.0 / (input_dim + output_dim) as f32).sqrt();
        let weight = self.generate_normal_tensor([output_dim, input_dim], &mut rng, 0.0, std);

        let bias_tensor = if bias {
            Some(self.generate_normal_tensor([output_dim], &mut rng, 0.0, 0.01))
        } else {
            None
        };

        DeterministicLinear::new(weight, bias_tensor)
    }

    /// Generate deterministic f32 tensor of normal draws using explicit RNG
    ///
    /// dtype: f32
    /// device: tensor will be created on the context's device
    pub fn generate_normal_tensor<const D: usize>(
        &self,
        shape: [usize; D],
        rng: &mut StdRng,
        mean: f32,
        std: f32,
    ) -> Tensor<B, D> {
        let normal = Normal::new(mean, std).unwrap();
        let total_elements: usize = shape.iter().product();
        let data: Vec<f32> = (0..total_elements).map(|_| normal.sample(rng)).collect();

        Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape(shape)
    }

    /// Generate deterministic uniform f32 tensor using explicit RNG
    ///
    /// dtype: f32, range: [0.0, 1.0)
    /// device: tensor will be created on the context's device
    pub fn generate_uniform_tensor<const D: usize>(
        &self,
        shape: [usize; D],
        rng: &mut StdRng,
    ) -> Tensor<B, D> {
        let total_elements: usize = shape.iter().product();
        let data: Vec<f32> = (0..total_elements).map(|_| rng.gen::<f32>()).collect();

        Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape(shape)
    }
}

/// Per-process intensity head of the point-process model
///
/// Holds one projection from the encoder's hidden dimension onto each
/// process's event types, plus the shared scalar intensity parameters.
/// The upstream sequence encoder is external; this head is everything the
/// likelihood computation needs to turn hidden states into intensities.
#[derive(Module, Debug)]
pub struct IntensityHead<B: Backend> {
    /// One (d_model -> num_types[p]) projection per process
    pub linear_list: Vec<DeterministicLinear<B>>,
    /// Drift applied to sampled inter-event offsets, shape [1]
    pub alpha: Param<Tensor<B, 1>>,
    /// Softplus sharpness, shape [1]; consumed through abs()
    pub beta: Param<Tensor<B, 1>>,
    /// Number of event types per process
    pub num_types: Ignored<Vec<usize>>,
    /// Monte Carlo draws per inter-event interval
    pub mc_samples: Ignored<usize>,
}

impl<B: Backend> IntensityHead<B> {
    /// Build the head from a validated configuration
    ///
    /// Parameter seeds are derived as `ctx.seed + 100 + process_idx` so
    /// that construction is bit-reproducible for a fixed context seed.
    pub fn new(config: &PointProcessConfig, rng_ctx: &DeterministicRngContext<B>) -> Self {
        config.validate();

        let linear_list = config
            .num_types
            .iter()
            .enumerate()
            .map(|(process_idx, &num_types)| {
                rng_ctx.create_deterministic_linear(
                    config.d_model,
                    num_types,
                    true,
                    rng_ctx.seed + 100 + process_idx as u64,
                )
            })
            .collect();

        let alpha = Tensor::<B, 1>::from_floats([config.alpha_init], rng_ctx.device());
        let beta = Tensor::<B, 1>::from_floats([config.beta_init], rng_ctx.device());

        Self {
            linear_list,
            alpha: Param::from_tensor(alpha),
            beta: Param::from_tensor(beta),
            num_types: Ignored(config.num_types.clone()),
            mc_samples: Ignored(config.mc_samples),
        }
    }

    pub fn num_processes(&self) -> usize {
        self.linear_list.len()
    }
}
