use crate::error::{AppError, Result};
use crate::metrics::INFERENCE_METRICS;
use crate::ml::features::{FeatureSpec, RangePolicy};
use crate::ml::models::{DiseaseId, PredictionVerdict, RiskLabel};
use crate::ml::registry::ModelRegistry;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Validates requests, applies the matching scaler and classifier, and
/// returns a verdict.
///
/// Holds no mutable state: a single instance can be shared across threads
/// and called concurrently.
#[derive(Debug, Clone)]
pub struct InferenceService {
    registry: Arc<ModelRegistry>,
    range_policy: RangePolicy,
    metrics_enabled: bool,
}

impl InferenceService {
    /// Create a service rejecting out-of-range inputs
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            range_policy: RangePolicy::Reject,
            metrics_enabled: true,
        }
    }

    pub fn with_range_policy(mut self, policy: RangePolicy) -> Self {
        self.range_policy = policy;
        self
    }

    /// Enable or disable Prometheus recording for this service
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn range_policy(&self) -> RangePolicy {
        self.range_policy
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    /// Input layout for `disease`
    pub fn spec_for(&self, disease: DiseaseId) -> Result<&FeatureSpec> {
        self.registry.spec_for(disease)
    }

    /// Predict the risk label of one request
    pub fn predict(&self, disease: DiseaseId, raw_values: &[f64]) -> Result<PredictionVerdict> {
        let started = Instant::now();
        let result = self.run(disease, raw_values);

        match &result {
            Ok(verdict) => debug!(
                disease = %disease,
                label = %verdict.label,
                raw_score = verdict.raw_score,
                "Prediction completed"
            ),
            Err(e) => debug!(disease = %disease, error = %e, "Prediction rejected"),
        }

        if self.metrics_enabled {
            record_metrics(disease, &result, started.elapsed().as_secs_f64());
        }

        result
    }

    /// Predict with the disease given as a string, as received from a
    /// presentation layer
    pub fn predict_named(&self, disease: &str, raw_values: &[f64]) -> Result<PredictionVerdict> {
        let disease: DiseaseId = disease.parse()?;
        self.predict(disease, raw_values)
    }

    /// Predict many requests for the same disease in parallel.
    ///
    /// Results are returned in input order; one bad row does not fail the
    /// others.
    pub fn predict_batch(
        &self,
        disease: DiseaseId,
        rows: &[Vec<f64>],
    ) -> Vec<Result<PredictionVerdict>> {
        rows.par_iter()
            .map(|row| self.predict(disease, row))
            .collect()
    }

    fn run(&self, disease: DiseaseId, raw_values: &[f64]) -> Result<PredictionVerdict> {
        let (spec, bundle) = self.registry.spec_and_bundle(disease)?;
        let checked = spec.validate(raw_values, self.range_policy)?;

        let scaled = bundle.scaler().transform(&checked)?;
        if let Some(idx) = scaled.iter().position(|x| !x.is_finite()) {
            return Err(scaled_out_of_range(spec, idx, checked[idx]));
        }

        let output = bundle.classifier().predict(scaled.view());
        let label = RiskLabel::from_class(output.class)?;
        if !output.score.is_finite() {
            // Finite inputs whose weighted sum overflows; blame the largest one
            let idx = scaled
                .iter()
                .enumerate()
                .fold(0, |best, (i, x)| if x.abs() > scaled[best].abs() { i } else { best });
            return Err(scaled_out_of_range(spec, idx, checked[idx]));
        }

        Ok(PredictionVerdict {
            disease,
            label,
            raw_score: output.score,
        })
    }
}

fn scaled_out_of_range(spec: &FeatureSpec, idx: usize, value: f64) -> AppError {
    let field = &spec.fields()[idx];
    AppError::OutOfRange {
        disease: spec.disease().to_string(),
        field: field.name.clone(),
        value,
        min: field.min,
        max: field.max,
    }
}

fn record_metrics(disease: DiseaseId, result: &Result<PredictionVerdict>, elapsed_secs: f64) {
    let key = disease.artifact_key();
    INFERENCE_METRICS
        .latency
        .with_label_values(&[key])
        .observe(elapsed_secs);

    match result {
        Ok(verdict) => INFERENCE_METRICS
            .predictions
            .with_label_values(&[key, label_key(verdict.label)])
            .inc(),
        Err(e) => INFERENCE_METRICS
            .errors
            .with_label_values(&[key, e.error_code()])
            .inc(),
    }
}

fn label_key(label: RiskLabel) -> &'static str {
    match label {
        RiskLabel::Positive => "positive",
        RiskLabel::Negative => "negative",
    }
}
