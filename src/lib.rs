//! Disease risk prediction core
//!
//! Loads one scaler/classifier bundle per supported disease from a single
//! artifact, validates raw feature vectors against each disease's input
//! layout and returns a binary risk verdict.

pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;

pub use error::{AppError, Result};
pub use ml::{
    DiseaseId, FeatureSpec, InferenceService, ModelRegistry, PredictionVerdict, RangePolicy,
    RiskLabel,
};
