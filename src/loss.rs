//! The PSNR loss: signal PSNR plus an optional label pseudo-PSNR.
//!
//! For a noisy/true signal pair scaled to `[0, 1]` by the configured
//! normalizer:
//!
//!   signal_psnr = 20 · log10(1 / MSE)      (100 when MSE = 0)
//!   label_psnr  = 20 · log10(1 / BCE)      (100 when BCE = 0 or no labels)
//!   score       = ±(signal_psnr + label_psnr)
//!
//! The score is negated when the loss is configured as `inverse`, so that it
//! can be minimized by an optimizer. All operations stay on the tensor graph,
//! so [`PsnrLoss::forward`] is differentiable on an autodiff backend except
//! where a term saturates.

use burn::prelude::*;
use serde::Serialize;

use crate::config::PsnrLossConfig;
use crate::error::{PsnrError, Result};
use crate::metrics;

/// Stateless PSNR scorer built from a [`PsnrLossConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsnrLoss {
    normalizer: f64,
    inverse: bool,
}

/// Every intermediate term of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PsnrBreakdown {
    /// Mean squared error of the normalized signals.
    pub mse: f64,
    /// Mean binary cross-entropy of the labels, 0 when none were given.
    pub bce: f64,
    /// Signal PSNR in decibels.
    pub signal_psnr: f64,
    /// Label pseudo-PSNR in decibels.
    pub label_psnr: f64,
    /// Final score, negated for an inverse loss.
    pub total: f64,
}

impl std::fmt::Display for PsnrBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  MSE:          {:.6e}", self.mse)?;
        writeln!(f, "  Signal PSNR:  {:.2} dB", self.signal_psnr)?;
        writeln!(f, "  BCE:          {:.6e}", self.bce)?;
        writeln!(f, "  Label PSNR:   {:.2} dB", self.label_psnr)?;
        write!(f, "  Total:        {:.2}", self.total)
    }
}

impl Default for PsnrLoss {
    fn default() -> Self {
        let config = PsnrLossConfig::new();
        Self::new(config.normalizer(), config.inverse)
    }
}

impl PsnrLoss {
    /// Human-readable metric name.
    pub const NAME: &'static str = "Peak Signal-to-Noise Ratio (PSNR)";

    pub(crate) fn new(normalizer: f64, inverse: bool) -> Self {
        Self { normalizer, inverse }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// The constant signals are divided by before the MSE.
    pub fn normalizer(&self) -> f64 {
        self.normalizer
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Score a signal pair and optional label pair, keeping the result on
    /// the tensor graph. Returns a tensor of shape `[1]`.
    ///
    /// Labels share the signals' rank here so a bare `None` type-checks; only
    /// element counts are compared. For labels of another rank, such as
    /// `[batch, 1]` discriminator outputs next to `[batch, C, H, W]` images,
    /// use [`forward_with_labels`](Self::forward_with_labels).
    pub fn forward<B: Backend, const D: usize>(
        &self,
        noisy_signal: Tensor<B, D>,
        true_signal: Tensor<B, D>,
        noisy_label: Option<Tensor<B, D>>,
        true_label: Option<Tensor<B, D>>,
    ) -> Result<Tensor<B, 1>> {
        self.compute(noisy_signal, true_signal, noisy_label, true_label)
            .map(|(score, _)| score)
    }

    /// [`forward`](Self::forward) with a label pair of any rank `L`.
    pub fn forward_with_labels<B: Backend, const D: usize, const L: usize>(
        &self,
        noisy_signal: Tensor<B, D>,
        true_signal: Tensor<B, D>,
        noisy_label: Tensor<B, L>,
        true_label: Tensor<B, L>,
    ) -> Result<Tensor<B, 1>> {
        self.compute(
            noisy_signal,
            true_signal,
            Some(noisy_label),
            Some(true_label),
        )
        .map(|(score, _)| score)
    }

    /// [`evaluate`](Self::evaluate) with a label pair of any rank `L`.
    pub fn evaluate_with_labels<B: Backend, const D: usize, const L: usize>(
        &self,
        noisy_signal: Tensor<B, D>,
        true_signal: Tensor<B, D>,
        noisy_label: Tensor<B, L>,
        true_label: Tensor<B, L>,
    ) -> Result<PsnrBreakdown> {
        self.compute(
            noisy_signal,
            true_signal,
            Some(noisy_label),
            Some(true_label),
        )
        .map(|(_, breakdown)| breakdown)
    }

    /// [`forward`](Self::forward) for integer signals such as raw 8-bit pixels.
    pub fn forward_pixels<B: Backend, const D: usize>(
        &self,
        noisy_signal: Tensor<B, D, Int>,
        true_signal: Tensor<B, D, Int>,
        noisy_label: Option<Tensor<B, D>>,
        true_label: Option<Tensor<B, D>>,
    ) -> Result<Tensor<B, 1>> {
        self.forward(
            noisy_signal.float(),
            true_signal.float(),
            noisy_label,
            true_label,
        )
    }

    /// Score as a plain float.
    pub fn score<B: Backend, const D: usize>(
        &self,
        noisy_signal: Tensor<B, D>,
        true_signal: Tensor<B, D>,
        noisy_label: Option<Tensor<B, D>>,
        true_label: Option<Tensor<B, D>>,
    ) -> Result<f64> {
        self.evaluate(noisy_signal, true_signal, noisy_label, true_label)
            .map(|breakdown| breakdown.total)
    }

    /// Score and report every intermediate term.
    pub fn evaluate<B: Backend, const D: usize>(
        &self,
        noisy_signal: Tensor<B, D>,
        true_signal: Tensor<B, D>,
        noisy_label: Option<Tensor<B, D>>,
        true_label: Option<Tensor<B, D>>,
    ) -> Result<PsnrBreakdown> {
        self.compute(noisy_signal, true_signal, noisy_label, true_label)
            .map(|(_, breakdown)| breakdown)
    }

    fn compute<B: Backend, const D: usize, const L: usize>(
        &self,
        noisy_signal: Tensor<B, D>,
        true_signal: Tensor<B, D>,
        noisy_label: Option<Tensor<B, L>>,
        true_label: Option<Tensor<B, L>>,
    ) -> Result<(Tensor<B, 1>, PsnrBreakdown)> {
        let labels = match (noisy_label, true_label) {
            (None, None) => None,
            (Some(noisy), Some(truth)) => Some((noisy, truth)),
            (Some(_), None) => return Err(PsnrError::MissingLabel { present: "noisy" }),
            (None, Some(_)) => return Err(PsnrError::MissingLabel { present: "true" }),
        };

        // Signal term
        let (noisy, truth) = metrics::flatten_pair("signal", noisy_signal, true_signal)?;
        let [len] = noisy.dims();
        if len == 0 {
            return Err(PsnrError::Empty { what: "signal" });
        }
        let device = noisy.device();
        let noisy = noisy.div_scalar(self.normalizer);
        let truth = truth.div_scalar(self.normalizer);
        let (signal_psnr, mse) = metrics::saturating_psnr(metrics::mse(noisy, truth));

        // Label term
        let bce = match labels {
            None => Tensor::zeros([1], &device),
            Some((noisy, truth)) => {
                let (noisy, truth) = metrics::flatten_pair("label", noisy, truth)?;
                let [len] = noisy.dims();
                if len == 0 {
                    return Err(PsnrError::Empty { what: "label" });
                }
                metrics::bce(noisy, truth)?
            }
        };
        let (label_psnr, bce) = metrics::saturating_psnr(bce);

        let signal_db: f64 = signal_psnr.clone().into_scalar().elem();
        let label_db: f64 = label_psnr.clone().into_scalar().elem();

        let mut score = signal_psnr + label_psnr;
        if self.inverse {
            score = score.neg();
        }
        let total: f64 = score.clone().into_scalar().elem();

        log::debug!(
            "{}: mse={mse:.6e} bce={bce:.6e} signal={signal_db:.3}dB label={label_db:.3}dB total={total:.3}",
            Self::NAME
        );

        let breakdown = PsnrBreakdown {
            mse,
            bce,
            signal_psnr: signal_db,
            label_psnr: label_db,
            total,
        };
        Ok((score, breakdown))
    }
}
