use crate::config::NoiseConfig;

/// Runtime state of a Gaussian noise model.
///
/// The state is the current precision `alpha` of the observations, which
/// weights each observation's contribution to the latent-vector posteriors.
#[derive(Clone, Debug, PartialEq)]
pub struct Noise {
    config: NoiseConfig,
    alpha: f64,

    /// Upper bound for the precision of adaptive noise.
    alpha_max: f64,
}

impl Noise {
    pub fn new(config: NoiseConfig) -> Noise {
        let mut noise = Noise {
            config,
            alpha: f64::NAN,
            alpha_max: f64::INFINITY,
        };
        noise.init(1.0);
        noise
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Current precision.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Initialize the precision given the variance of the observed values.
    ///
    /// A variance which is not finite and positive is treated as 1.
    pub fn init(&mut self, var_total: f64) {
        let var_total = if var_total.is_finite() && var_total > 0. {
            var_total
        } else {
            1.0
        };
        match self.config {
            NoiseConfig::FixedGaussian { precision } => {
                self.alpha = precision;
            }
            NoiseConfig::AdaptiveGaussian { sn_init, sn_max } => {
                self.alpha = sn_init / var_total;
                self.alpha_max = sn_max / var_total;
            }
        }
    }

    /// Re-estimate the precision from the sum of squared residuals `sumsq`
    /// over `nobs` observations.
    pub fn update(&mut self, sumsq: f64, nobs: u64) {
        if let NoiseConfig::AdaptiveGaussian { .. } = self.config {
            if nobs == 0 {
                return;
            }
            let estimate = if sumsq > 0. {
                nobs as f64 / sumsq
            } else {
                f64::INFINITY
            };
            self.alpha = estimate.min(self.alpha_max);
        }
    }

    /// Short description of the current state.
    pub fn status(&self) -> String {
        match self.config {
            NoiseConfig::FixedGaussian { .. } => format!("Fixed: {:.2}", self.alpha),
            NoiseConfig::AdaptiveGaussian { .. } => {
                format!("Adaptive: {:.2} (max {:.2})", self.alpha, self.alpha_max)
            }
        }
    }
}
