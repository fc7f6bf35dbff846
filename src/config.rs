//! Loss configuration: normalization constant, sign, and JSON persistence.

use std::path::Path;

use anyhow::Context;
use burn::config::Config;

use crate::error::PsnrError;
use crate::loss::PsnrLoss;

/// Pixel value the legacy normalization divides by, whatever `pixel_max` says.
pub const LEGACY_PIXEL_MAX: f64 = 255.0;

/// Configuration for [`PsnrLoss`].
#[derive(Config, Debug)]
pub struct PsnrLossConfig {
    /// Maximum value of a pixel; signals are divided by it before the MSE.
    #[config(default = 255.0)]
    pub pixel_max: f64,
    /// Negate the score so it can be minimized as a training objective.
    #[config(default = false)]
    pub inverse: bool,
    /// Divide signals by 255.0 even when `pixel_max` differs.
    #[config(default = false)]
    pub legacy_normalization: bool,
}

impl PsnrLossConfig {
    /// The constant signals are divided by.
    pub fn normalizer(&self) -> f64 {
        if self.legacy_normalization {
            LEGACY_PIXEL_MAX
        } else {
            self.pixel_max
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.pixel_max.is_finite() || self.pixel_max <= 0.0 {
            return Err(PsnrError::InvalidConfig(format!(
                "pixel_max must be finite and positive, got {}",
                self.pixel_max
            )));
        }
        Ok(())
    }

    /// Initialize a [`PsnrLoss`] from this configuration.
    pub fn init(&self) -> crate::Result<PsnrLoss> {
        self.validate()?;
        Ok(PsnrLoss::new(self.normalizer(), self.inverse))
    }

    /// Load a configuration previously written with [`PsnrLossConfig::save_to`].
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config = Self::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e:?}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid loss configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as JSON.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.save(path)
            .with_context(|| format!("failed to write loss configuration to {}", path.display()))
    }
}
