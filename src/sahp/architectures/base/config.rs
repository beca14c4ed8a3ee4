use serde::{Deserialize, Serialize};

/// Configuration for the multi-process point-process head
///
/// One model covers several event processes; each process has its own
/// projection from the shared hidden dimension onto its own set of event
/// types. `alpha` and `beta` are shared scalars: `alpha` is the drift
/// applied to sampled inter-event offsets during Monte Carlo integration,
/// `beta` the softplus sharpness (used through `abs()`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointProcessConfig {
    /// Hidden dimension of the upstream sequence encoder
    pub d_model: usize,

    /// Number of event types per process; one entry per process.
    /// Type IDs on the wire are 1-based, 0 is the padding sentinel.
    pub num_types: Vec<usize>,

    /// Initial value of the drift parameter alpha
    #[serde(default = "default_alpha_init")]
    pub alpha_init: f32,

    /// Initial value of the sharpness parameter beta
    #[serde(default = "default_beta_init")]
    pub beta_init: f32,

    /// Number of Monte Carlo draws per inter-event interval
    #[serde(default = "default_mc_samples")]
    pub mc_samples: usize,

    /// Label smoothing factor for the type-classification loss
    #[serde(default = "default_label_smoothing")]
    pub label_smoothing: f32,
}

fn default_alpha_init() -> f32 {
    -0.1
}

fn default_beta_init() -> f32 {
    1.0
}

fn default_mc_samples() -> usize {
    100
}

fn default_label_smoothing() -> f32 {
    0.1
}

impl Default for PointProcessConfig {
    fn default() -> Self {
        Self {
            d_model: 64,
            num_types: vec![1],
            alpha_init: default_alpha_init(),
            beta_init: default_beta_init(),
            mc_samples: default_mc_samples(),
            label_smoothing: default_label_smoothing(),
        }
    }
}

impl PointProcessConfig {
    /// Check the configuration invariants, panicking with a descriptive
    /// message on the first violation.
    pub fn validate(&self) {
        if self.d_model == 0 {
            panic!("VALUE ERROR: d_model must be positive, got 0");
        }
        if self.num_types.is_empty() {
            panic!("VALUE ERROR: num_types must name at least one process");
        }
        for (process_idx, &num_types) in self.num_types.iter().enumerate() {
            if num_types == 0 {
                panic!(
                    "VALUE ERROR: process {} must have at least one event type, got 0",
                    process_idx
                );
            }
        }
        if self.mc_samples == 0 {
            panic!("VALUE ERROR: mc_samples must be positive, got 0");
        }
        if self.beta_init == 0.0 {
            panic!("VALUE ERROR: beta_init must be non-zero");
        }
        if self.label_smoothing <= 0.0 || self.label_smoothing > 1.0 {
            panic!(
                "VALUE ERROR: label_smoothing must be in (0, 1], got {}",
                self.label_smoothing
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PointProcessConfig::default();
        config.validate();
        assert_eq!(config.mc_samples, 100);
        assert_eq!(config.beta_init, 1.0);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = PointProcessConfig {
            d_model: 32,
            num_types: vec![3, 5],
            ..Default::default()
        };

        let json = serde_json::to_string(&config).expect("Should serialize to JSON");
        let deserialized: PointProcessConfig =
            serde_json::from_str(&json).expect("Should deserialize from JSON");

        assert_eq!(deserialized.d_model, 32);
        assert_eq!(deserialized.num_types, vec![3, 5]);
        assert_eq!(deserialized.mc_samples, config.mc_samples);
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let json = r#"{"d_model": 16, "num_types": [4]}"#;
        let config: PointProcessConfig =
            serde_json::from_str(json).expect("Should deserialize from partial JSON");

        assert_eq!(config.alpha_init, -0.1);
        assert_eq!(config.beta_init, 1.0);
        assert_eq!(config.mc_samples, 100);
        assert_eq!(config.label_smoothing, 0.1);
    }

    #[test]
    #[should_panic(expected = "VALUE ERROR: mc_samples must be positive")]
    fn test_zero_mc_samples_rejected() {
        let config = PointProcessConfig {
            mc_samples: 0,
            ..Default::default()
        };
        config.validate();
    }

    #[test]
    #[should_panic(expected = "VALUE ERROR: num_types must name at least one process")]
    fn test_empty_process_list_rejected() {
        let config = PointProcessConfig {
            num_types: vec![],
            ..Default::default()
        };
        config.validate();
    }
}
