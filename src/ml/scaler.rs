use crate::error::{AppError, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Fitted parameters of a standard scaler as stored in the artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalerParams {
    /// Per-feature mean learned at fit time
    pub mean: Vec<f64>,

    /// Per-feature scale (standard deviation) learned at fit time
    pub scale: Vec<f64>,
}

/// Standard scaler: `(x - mean) / scale` per feature
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Build a scaler from fitted parameters, rejecting shapes or scales
    /// that cannot come out of a fit.
    pub fn from_params(params: ScalerParams) -> std::result::Result<Self, String> {
        if params.mean.is_empty() {
            return Err("scaler has no features".to_string());
        }
        if params.mean.len() != params.scale.len() {
            return Err(format!(
                "scaler mean has {} entries but scale has {}",
                params.mean.len(),
                params.scale.len()
            ));
        }
        if let Some(i) = params.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("scaler mean[{}] is not finite", i));
        }
        if let Some(i) = params
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(format!("scaler scale[{}] must be finite and non-zero", i));
        }

        Ok(Self {
            mean: Array1::from_vec(params.mean),
            scale: Array1::from_vec(params.scale),
        })
    }

    /// Number of input features the scaler was fitted on
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn scale(&self) -> ArrayView1<'_, f64> {
        self.scale.view()
    }

    /// Normalize a raw feature vector
    pub fn transform(&self, values: &[f64]) -> Result<Array1<f64>> {
        if values.len() != self.n_features() {
            return Err(AppError::Internal(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                values.len()
            )));
        }

        let x = ArrayView1::from(values);
        Ok((&x - &self.mean) / &self.scale)
    }
}
