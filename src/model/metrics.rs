//! Regression evaluation metrics

use serde::Serialize;

/// Held-out evaluation of the score model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

/// Coefficient of determination.
///
/// NaN for fewer than two samples. A constant target scores 1.0 when
/// predicted exactly, else 0.0.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    let n = y_true.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean = y_true.iter().sum::<f64>() / n as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return f64::NAN;
    }
    let mse = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    mse.sqrt()
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return f64::NAN;
    }
    y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum::<f64>() / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_prediction() {
        let y = [0.0, 1000.0, 1000.0];
        assert_eq!(r2_score(&y, &y), 1.0);
        assert_eq!(root_mean_squared_error(&y, &y), 0.0);
        assert_eq!(mean_absolute_error(&y, &y), 0.0);
    }

    #[test]
    fn test_known_values() {
        let y_true = [0.0, 1000.0];
        let y_pred = [100.0, 700.0];
        // ss_res = 10_000 + 90_000, ss_tot = 2 * 500^2
        assert!((r2_score(&y_true, &y_pred) - 0.8).abs() < 1e-12);
        assert!((root_mean_squared_error(&y_true, &y_pred) - 50_000f64.sqrt()).abs() < 1e-9);
        assert!((mean_absolute_error(&y_true, &y_pred) - 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_prediction_scores_zero() {
        let y_true = [0.0, 1000.0, 500.0];
        let y_pred = [500.0; 3];
        assert!(r2_score(&y_true, &y_pred).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(r2_score(&[1.0], &[1.0]).is_nan());
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[4.0, 5.0]), 0.0);
        assert!(root_mean_squared_error(&[], &[]).is_nan());
    }
}
