//! Peak signal-to-noise ratio loss for Burn training loops.
//!
//! [`PsnrLoss`] scores a noisy signal against its ground truth, optionally
//! adding a pseudo-PSNR computed from the binary cross-entropy of a label
//! pair. Build one from a [`PsnrLossConfig`]:
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::prelude::*;
//! use psnr_loss::PsnrLossConfig;
//!
//! let device = Default::default();
//! let loss = PsnrLossConfig::new().init().unwrap();
//! let noisy = Tensor::<NdArray, 1>::from_floats([255.0], &device);
//! let truth = Tensor::<NdArray, 1>::from_floats([0.0], &device);
//! let score = loss.score(noisy, truth, None, None).unwrap();
//! assert!((score - 100.0).abs() < 1e-6);
//! ```

pub mod config;
pub mod error;
pub mod loss;
pub mod metrics;

pub use config::PsnrLossConfig;
pub use error::{PsnrError, Result};
pub use loss::{PsnrBreakdown, PsnrLoss};
