//! Tensor primitives behind the PSNR loss: flattening, MSE, BCE and the
//! saturating decibel conversion.

use burn::prelude::*;

use crate::error::{PsnrError, Result};

/// Value reported in place of an infinite PSNR when the error is exactly zero.
pub const PSNR_CAP: f64 = 100.0;

/// Lower bound of each log term of the BCE, so `0 · log(0)` is 0.
pub const BCE_LOG_FLOOR: f64 = -100.0;

/// `e^BCE_LOG_FLOOR`, the smallest argument the BCE takes a log of.
///
/// Clamping the argument rather than the result keeps the backward pass of
/// `log` finite at labels of exactly 0 or 1.
pub const BCE_LOG_ARG_FLOOR: f64 = 3.720_075_976_020_836e-44;

/// Flatten a tensor of any rank to 1-D.
pub fn flatten<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Tensor<B, 1> {
    let len = tensor.shape().num_elements();
    tensor.reshape([len])
}

/// Flatten two tensors and check that they hold the same number of elements.
pub fn flatten_pair<B: Backend, const D: usize>(
    what: &'static str,
    left: Tensor<B, D>,
    right: Tensor<B, D>,
) -> Result<(Tensor<B, 1>, Tensor<B, 1>)> {
    let left_len = left.shape().num_elements();
    let right_len = right.shape().num_elements();
    if left_len != right_len {
        return Err(PsnrError::ShapeMismatch {
            what,
            left: left_len,
            right: right_len,
        });
    }
    Ok((flatten(left), flatten(right)))
}

/// Mean squared error between two equal-length sequences, shape `[1]`.
pub fn mse<B: Backend>(a: Tensor<B, 1>, b: Tensor<B, 1>) -> Tensor<B, 1> {
    let diff = a - b;
    (diff.clone() * diff).mean()
}

/// Mean binary cross-entropy of `input` probabilities against `target`.
///
/// `-mean(t · log(x) + (1 - t) · log(1 - x))`, each log bounded below by
/// [`BCE_LOG_FLOOR`]. Inputs outside `[0, 1]` are a domain error; NaN inputs
/// surface as a non-finite result, which is also reported as a domain error.
pub fn bce<B: Backend>(input: Tensor<B, 1>, target: Tensor<B, 1>) -> Result<Tensor<B, 1>> {
    let lo: f64 = input.clone().min().into_scalar().elem();
    let hi: f64 = input.clone().max().into_scalar().elem();
    if lo < 0.0 || hi > 1.0 {
        return Err(PsnrError::Domain(format!(
            "noisy labels must lie in [0, 1], found range [{lo}, {hi}]"
        )));
    }

    let log_x = input.clone().clamp_min(BCE_LOG_ARG_FLOOR).log();
    let log_1mx = input
        .neg()
        .add_scalar(1.0)
        .clamp_min(BCE_LOG_ARG_FLOOR)
        .log();
    let one_minus_t = target.clone().neg().add_scalar(1.0);
    let loss = (target * log_x + one_minus_t * log_1mx).mean().neg();

    let value: f64 = loss.clone().into_scalar().elem();
    if !value.is_finite() {
        return Err(PsnrError::Domain(format!("binary cross-entropy is {value}")));
    }
    Ok(loss)
}

/// Convert an error term to decibels: `20 · log10(1 / err)`, or
/// [`PSNR_CAP`] when `err` is exactly zero.
///
/// Returns the tensor together with the error as a plain float.
pub fn saturating_psnr<B: Backend>(err: Tensor<B, 1>) -> (Tensor<B, 1>, f64) {
    let value: f64 = err.clone().into_scalar().elem();
    if value == 0.0 {
        log::trace!("error term is zero, PSNR saturates at {PSNR_CAP} dB");
        let device = err.device();
        return (Tensor::from_floats([PSNR_CAP as f32], &device), value);
    }
    let db = err
        .recip()
        .log()
        .mul_scalar(20.0 / std::f64::consts::LN_10);
    (db, value)
}

/// Plain-float PSNR for already reduced error terms.
pub fn psnr_from_error(err: f64) -> f64 {
    if err == 0.0 {
        PSNR_CAP
    } else {
        20.0 * (1.0 / err).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn floats(values: &[f32]) -> Tensor<TestBackend, 1> {
        Tensor::from_floats(values, &Default::default())
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f64 {
        t.into_scalar().elem()
    }

    #[test]
    fn flatten_any_rank() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 3>::zeros([2, 3, 4], &device);
        assert_eq!(flatten(t).dims(), [24]);
    }

    #[test]
    fn flatten_pair_accepts_different_shapes_with_same_length() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::zeros([2, 6], &device);
        let b = Tensor::<TestBackend, 2>::zeros([3, 4], &device);
        let (a, b) = flatten_pair("signal", a, b).unwrap();
        assert_eq!(a.dims(), [12]);
        assert_eq!(b.dims(), [12]);
    }

    #[test]
    fn flatten_pair_rejects_length_mismatch() {
        let err = flatten_pair("signal", floats(&[0.0; 4]), floats(&[0.0; 3])).unwrap_err();
        assert_eq!(
            err,
            PsnrError::ShapeMismatch {
                what: "signal",
                left: 4,
                right: 3
            }
        );
    }

    #[test]
    fn mse_values() {
        assert_eq!(scalar(mse(floats(&[1.0, 2.0]), floats(&[1.0, 2.0]))), 0.0);
        let value = scalar(mse(floats(&[1.0, 2.0]), floats(&[2.0, 2.0])));
        assert!((value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bce_of_identical_binary_labels_is_zero() {
        let labels = [0.0, 1.0, 1.0, 0.0];
        let value = scalar(bce(floats(&labels), floats(&labels)).unwrap());
        assert_eq!(value, 0.0);
    }

    #[test]
    fn bce_matches_closed_form() {
        // -mean(0.8·ln 0.6 + 0.2·ln 0.4, 0.1·ln 0.3 + 0.9·ln 0.7)
        let expected = -((0.8 * 0.6f64.ln() + 0.2 * 0.4f64.ln())
            + (0.1 * 0.3f64.ln() + 0.9 * 0.7f64.ln()))
            / 2.0;
        let value = scalar(bce(floats(&[0.6, 0.3]), floats(&[0.8, 0.1])).unwrap());
        assert!((value - expected).abs() < 1e-5, "{value} vs {expected}");
    }

    #[test]
    fn bce_is_asymmetric() {
        let a = floats(&[0.9, 0.2, 0.5]);
        let b = floats(&[0.6, 0.4, 0.1]);
        let ab = scalar(bce(a.clone(), b.clone()).unwrap());
        let ba = scalar(bce(b, a).unwrap());
        assert!((ab - ba).abs() > 1e-3, "{ab} vs {ba}");
    }

    #[test]
    fn bce_rejects_out_of_range_input() {
        let err = bce(floats(&[0.5, 1.5]), floats(&[0.0, 1.0])).unwrap_err();
        assert!(matches!(err, PsnrError::Domain(_)));
        let err = bce(floats(&[-0.1, 0.5]), floats(&[0.0, 1.0])).unwrap_err();
        assert!(matches!(err, PsnrError::Domain(_)));
    }

    #[test]
    fn bce_rejects_nan_input() {
        let err = bce(floats(&[f32::NAN, 0.5]), floats(&[0.0, 1.0])).unwrap_err();
        assert!(matches!(err, PsnrError::Domain(_)), "{err}");
    }

    #[test]
    fn bce_boundary_input_stays_near_log_floor() {
        // t = 1, x = 0: the single term is -log(floor) = 100.
        let value = scalar(bce(floats(&[0.0]), floats(&[1.0])).unwrap());
        assert!((value + BCE_LOG_FLOOR).abs() < 0.5, "{value}");
    }

    #[test]
    fn saturating_psnr_caps_at_zero_error() {
        let (db, err) = saturating_psnr(floats(&[0.0]));
        assert_eq!(err, 0.0);
        assert_eq!(scalar(db), PSNR_CAP);
    }

    #[test]
    fn saturating_psnr_in_decibels() {
        let (db, _) = saturating_psnr(floats(&[1.0]));
        assert!(scalar(db).abs() < 1e-6);
        let (db, _) = saturating_psnr(floats(&[0.01]));
        assert!((scalar(db) - 40.0).abs() < 1e-4);
        assert!((psnr_from_error(0.01) - 40.0).abs() < 1e-9);
        assert_eq!(psnr_from_error(0.0), PSNR_CAP);
    }
}
