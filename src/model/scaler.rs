//! Feature standardization

use crate::error::{Error, Result};

/// Zero-mean, unit-variance scaler using the population standard deviation.
/// Constant columns are centred but not scaled.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and deviations from `rows`
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| Error::InsufficientData("cannot fit scaler on zero rows".into()))?;
        let width = first.len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(Error::Model("feature rows differ in width".into()));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = vec![0.0; width];
        for row in rows {
            for ((var, v), m) in variance.iter_mut().zip(row).zip(&mean) {
                *var += (v - m).powi(2);
            }
        }

        let scale = variance
            .into_iter()
            .map(|var| {
                let std = (var / n).sqrt();
                if std < 10.0 * f64::EPSILON {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    #[cfg(test)]
    pub(crate) fn mean(&self) -> &[f64] {
        &self.mean
    }

    #[cfg(test)]
    pub(crate) fn scale(&self) -> &[f64] {
        &self.scale
    }
}
