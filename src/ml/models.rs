use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Supported prediction targets
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseId {
    #[strum(serialize = "Diabetes")]
    Diabetes,
    #[strum(serialize = "Heart Disease")]
    HeartDisease,
    #[strum(serialize = "Kidney Disease")]
    KidneyDisease,
}

impl DiseaseId {
    /// Prefix of this disease's entries in the model artifact
    pub fn artifact_key(&self) -> &'static str {
        match self {
            DiseaseId::Diabetes => "diabetes",
            DiseaseId::HeartDisease => "heart",
            DiseaseId::KidneyDisease => "kidney",
        }
    }

    /// All diseases in declaration order
    pub fn all() -> Vec<DiseaseId> {
        DiseaseId::iter().collect()
    }
}

impl FromStr for DiseaseId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "diabetes" => Ok(DiseaseId::Diabetes),
            "heart" | "heart disease" | "heartdisease" => Ok(DiseaseId::HeartDisease),
            "kidney" | "kidney disease" | "kidneydisease" => Ok(DiseaseId::KidneyDisease),
            _ => Err(AppError::UnknownDisease(s.to_string())),
        }
    }
}

/// Binary risk label produced by a classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Positive,
    Negative,
}

impl RiskLabel {
    /// Map a raw class index to a label. Anything other than 0 or 1 is a
    /// classifier bug and is reported instead of being coerced.
    pub fn from_class(class: u8) -> Result<Self> {
        match class {
            1 => Ok(RiskLabel::Positive),
            0 => Ok(RiskLabel::Negative),
            other => Err(AppError::Internal(format!(
                "classifier produced unmapped class {}",
                other
            ))),
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, RiskLabel::Positive)
    }
}

/// Result of a single prediction call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionVerdict {
    /// Disease the verdict refers to
    pub disease: DiseaseId,

    /// Predicted label
    pub label: RiskLabel,

    /// Classifier score backing the label (probability, decision value or
    /// positive leaf fraction depending on the model type)
    pub raw_score: f64,
}

/// Classifier family stored in a bundle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Logistic regression
    LogisticRegression,

    /// Linear support vector machine
    LinearSvm,

    /// Single decision tree
    DecisionTree,

    /// Random forest
    RandomForest,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::LogisticRegression => write!(f, "Logistic Regression"),
            ModelType::LinearSvm => write!(f, "Linear Support Vector Machine"),
            ModelType::DecisionTree => write!(f, "Decision Tree"),
            ModelType::RandomForest => write!(f, "Random Forest"),
        }
    }
}

/// Optional provenance block carried by a model artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtifactMetadata {
    /// Artifact version label
    #[serde(default)]
    pub version: Option<String>,

    /// When the models were fitted
    #[serde(default)]
    pub trained_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
}

/// Per-disease summary reported by the registry
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BundleSummary {
    pub disease: DiseaseId,
    pub model_type: ModelType,
    pub n_features: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disease_parsing_aliases() {
        assert_eq!("Diabetes".parse::<DiseaseId>().unwrap(), DiseaseId::Diabetes);
        assert_eq!("heart".parse::<DiseaseId>().unwrap(), DiseaseId::HeartDisease);
        assert_eq!(
            "Heart Disease".parse::<DiseaseId>().unwrap(),
            DiseaseId::HeartDisease
        );
        assert_eq!(
            "kidney_disease".parse::<DiseaseId>().unwrap(),
            DiseaseId::KidneyDisease
        );
    }

    #[test]
    fn test_unknown_disease() {
        let err = "Unknown".parse::<DiseaseId>().unwrap_err();
        assert!(matches!(err, AppError::UnknownDisease(ref s) if s == "Unknown"));
    }

    #[test]
    fn test_display_and_keys() {
        assert_eq!(DiseaseId::HeartDisease.to_string(), "Heart Disease");
        assert_eq!(DiseaseId::KidneyDisease.artifact_key(), "kidney");
        assert_eq!(DiseaseId::all().len(), 3);
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(RiskLabel::from_class(1).unwrap(), RiskLabel::Positive);
        assert_eq!(RiskLabel::from_class(0).unwrap(), RiskLabel::Negative);
        assert!(RiskLabel::from_class(2).is_err());
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(ModelType::LogisticRegression.to_string(), "Logistic Regression");
        assert_eq!(ModelType::RandomForest.to_string(), "Random Forest");
    }
}
