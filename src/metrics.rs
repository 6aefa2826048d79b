//! Prometheus metrics for the inference path

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

/// Inference metrics
pub struct InferenceMetrics {
    /// Verdicts returned, by disease and label
    pub predictions: CounterVec,

    /// Failed requests, by disease and error code
    pub errors: CounterVec,

    /// Time spent validating, scaling and classifying one request
    pub latency: HistogramVec,
}

lazy_static! {
    pub static ref INFERENCE_METRICS: InferenceMetrics = InferenceMetrics {
        predictions: register_counter_vec!(
            "risk_predictions_total",
            "Total number of prediction verdicts returned",
            &["disease", "label"]
        )
        .unwrap(),

        errors: register_counter_vec!(
            "risk_prediction_errors_total",
            "Total number of failed prediction requests",
            &["disease", "code"]
        )
        .unwrap(),

        latency: register_histogram_vec!(
            "risk_inference_duration_seconds",
            "Prediction latency in seconds",
            &["disease"],
            vec![0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05]
        )
        .unwrap(),
    };
}

/// Initialize inference metrics
pub fn init_inference_metrics() {
    lazy_static::initialize(&INFERENCE_METRICS);
}

/// Render all registered metrics in the Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_are_exported() {
        init_inference_metrics();
        INFERENCE_METRICS
            .predictions
            .with_label_values(&["diabetes", "positive"])
            .inc();
        INFERENCE_METRICS
            .latency
            .with_label_values(&["diabetes"])
            .observe(0.0002);

        let output = gather_metrics();
        assert!(output.contains("risk_predictions_total"));
        assert!(output.contains("risk_inference_duration_seconds"));
    }
}
