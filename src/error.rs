//! Error taxonomy for the PSNR loss.

use thiserror::Error;

/// Errors returned while scoring a pair of signals.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PsnrError {
    /// Two operands flatten to different element counts.
    #[error("{what} length mismatch: {left} vs {right} elements")]
    ShapeMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// Only one of `noisy_label` / `true_label` was supplied.
    #[error("labels must be supplied as a pair, got only the {present} label")]
    MissingLabel { present: &'static str },

    /// BCE is undefined for the given label values.
    #[error("label values outside the BCE domain: {0}")]
    Domain(String),

    /// Operands hold no elements, so their mean is undefined.
    #[error("{what} tensors are empty")]
    Empty { what: &'static str },

    /// Configuration values that cannot produce a meaningful score.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PsnrError>;
