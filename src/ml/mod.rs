//! Prediction core: model registry, input specs and inference dispatch
//!
//! This module provides:
//! - Loading scaler/classifier bundles per disease from one artifact
//! - Per-disease input layouts with bounds and defaults
//! - Categorical encoding for form-style inputs
//! - Validated, deterministic single and batch prediction

pub mod classifier;
pub mod encoding;
pub mod features;
pub mod models;
pub mod registry;
pub mod scaler;
pub mod service;

pub use classifier::{
    ClassOutput, Classifier, ClassifierParams, ForestParams, LinearParams, TreeNode, TreeParams,
};
pub use encoding::{FormInput, Sex, YesNo};
pub use features::{ChoiceOption, FeatureSpec, FieldDescriptor, FieldKind, RangePolicy};
pub use models::{
    ArtifactMetadata, BundleSummary, DiseaseId, ModelType, PredictionVerdict, RiskLabel,
};
pub use registry::{ArtifactFormat, ModelArtifact, ModelBundle, ModelRegistry, RegistryBuilder};
pub use scaler::{ScalerParams, StandardScaler};
pub use service::InferenceService;
