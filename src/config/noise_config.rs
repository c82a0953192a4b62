/// Parameters of the observation noise model attached to a tensor.
///
/// The configuration only describes the noise model. The runtime state
/// (the current precision) lives in [`Noise`](crate::data::Noise), which is
/// created from this when the data is initialized.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum NoiseConfig {
    /// Gaussian noise with a fixed precision.
    FixedGaussian { precision: f64 },

    /// Gaussian noise whose precision is re-estimated from the residuals after
    /// each update.
    ///
    /// `sn_init` and `sn_max` are signal-to-noise ratios. They are converted
    /// to precisions by dividing by the variance of the observed values.
    AdaptiveGaussian { sn_init: f64, sn_max: f64 },
}

impl NoiseConfig {
    /// Short human-readable name of the noise model.
    pub fn name(&self) -> &'static str {
        match self {
            NoiseConfig::FixedGaussian { .. } => "fixed",
            NoiseConfig::AdaptiveGaussian { .. } => "adaptive",
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig::FixedGaussian { precision: 5.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::NoiseConfig;

    #[test]
    fn test_default() {
        assert_eq!(
            NoiseConfig::default(),
            NoiseConfig::FixedGaussian { precision: 5.0 }
        );
        assert_eq!(NoiseConfig::default().name(), "fixed");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize() {
        let json = r#"{"kind": "adaptive_gaussian", "sn_init": 1.0, "sn_max": 10.0}"#;
        let config: NoiseConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            NoiseConfig::AdaptiveGaussian {
                sn_init: 1.0,
                sn_max: 10.0
            }
        );
    }
}
