//! Ridge regression on standardized features
//!
//! Features are centered and scaled before fitting; the intercept is the
//! target mean and is not penalized. Constant columns keep a unit scale so
//! they center to zero and receive no weight.

use crate::error::{RankerError, Result};
use nalgebra::{DMatrix, DVector};

const MIN_SCALE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct RidgeRegression {
    means: Vec<f64>,
    scales: Vec<f64>,
    coefficients: Vec<f64>,
    intercept: f64,
    lambda: f64,
    samples: usize,
    training_rmse: f64,
}

impl RidgeRegression {
    /// Fit `targets ~ rows` with L2 penalty `lambda`
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], lambda: f64) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(RankerError::model_fit("no training rows"));
        }
        if n != targets.len() {
            return Err(RankerError::model_fit(format!(
                "{} feature rows but {} targets",
                n,
                targets.len()
            )));
        }
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(RankerError::model_fit(format!("invalid ridge lambda {}", lambda)));
        }
        let p = rows[0].len();
        if rows.iter().any(|r| r.len() != p) {
            return Err(RankerError::model_fit("feature rows have differing lengths"));
        }
        if rows.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(RankerError::model_fit("non-finite training value"));
        }

        let mut means = vec![0.0; p];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n as f64;
        }

        let mut scales = vec![0.0; p];
        for row in rows {
            for j in 0..p {
                let d = row[j] - means[j];
                scales[j] += d * d;
            }
        }
        for s in &mut scales {
            *s = (*s / n as f64).sqrt();
            if *s < MIN_SCALE {
                *s = 1.0;
            }
        }

        let intercept = targets.iter().sum::<f64>() / n as f64;
        let z = DMatrix::from_fn(n, p, |i, j| (rows[i][j] - means[j]) / scales[j]);
        let y = DVector::from_iterator(n, targets.iter().map(|t| t - intercept));

        let zt = z.transpose();
        let gram = &zt * &z + DMatrix::<f64>::identity(p, p) * lambda;
        let rhs = &zt * &y;

        let beta = match gram.clone().cholesky() {
            Some(chol) => chol.solve(&rhs),
            None => gram
                .lu()
                .solve(&rhs)
                .ok_or_else(|| RankerError::model_fit("singular normal equations"))?,
        };

        let mut model = Self {
            means,
            scales,
            coefficients: beta.iter().copied().collect(),
            intercept,
            lambda,
            samples: n,
            training_rmse: 0.0,
        };

        let sse: f64 = rows
            .iter()
            .zip(targets)
            .map(|(row, t)| {
                let e = model.predict(row) - t;
                e * e
            })
            .sum();
        model.training_rmse = (sse / n as f64).sqrt();
        Ok(model)
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(&self.means)
                .zip(&self.scales)
                .zip(&self.coefficients)
                .map(|(((x, m), s), b)| (x - m) / s * b)
                .sum::<f64>()
    }

    /// Predict with missing features imputed by their training mean
    pub fn predict_imputed(&self, row: &[Option<f64>]) -> f64 {
        let filled: Vec<f64> = row
            .iter()
            .zip(&self.means)
            .map(|(v, m)| v.filter(|x| x.is_finite()).unwrap_or(*m))
            .collect();
        self.predict(&filled)
    }

    pub fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Coefficients on the standardized scale
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn training_rmse(&self) -> f64 {
        self.training_rmse
    }
}
