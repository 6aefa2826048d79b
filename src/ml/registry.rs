use crate::error::{AppError, Result};
use crate::ml::classifier::{ClassOutput, Classifier, ClassifierParams};
use crate::ml::features::FeatureSpec;
use crate::ml::models::{ArtifactMetadata, BundleSummary, DiseaseId};
use crate::ml::scaler::{ScalerParams, StandardScaler};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

const IN_MEMORY_SOURCE: &str = "<in-memory>";

/// On-disk encoding of a model artifact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    Json,
    Yaml,
    Bincode,
}

impl ArtifactFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ArtifactFormat::Json),
            "yaml" | "yml" => Some(ArtifactFormat::Yaml),
            "bin" | "bincode" => Some(ArtifactFormat::Bincode),
            _ => None,
        }
    }
}

/// Serialized set of scalers and classifiers, one pair per disease.
///
/// Entries are optional at the serde level so that a missing entry is
/// reported by name instead of as a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifact {
    #[serde(default)]
    pub metadata: Option<ArtifactMetadata>,
    #[serde(default)]
    pub diabetes_scaler: Option<ScalerParams>,
    #[serde(default)]
    pub diabetes_model: Option<ClassifierParams>,
    #[serde(default)]
    pub heart_scaler: Option<ScalerParams>,
    #[serde(default)]
    pub heart_model: Option<ClassifierParams>,
    #[serde(default)]
    pub kidney_scaler: Option<ScalerParams>,
    #[serde(default)]
    pub kidney_model: Option<ClassifierParams>,
}

impl ModelArtifact {
    /// Read and decode an artifact file
    pub fn read(path: &Path, format: Option<ArtifactFormat>) -> Result<Self> {
        let format = format
            .or_else(|| ArtifactFormat::from_path(path))
            .ok_or_else(|| AppError::load(path, "cannot infer artifact format from file extension"))?;

        let bytes = std::fs::read(path).map_err(|e| AppError::load(path, e.to_string()))?;
        let decoded = match format {
            ArtifactFormat::Json => serde_json::from_slice(&bytes).map_err(AppError::from),
            ArtifactFormat::Yaml => serde_yaml::from_slice(&bytes).map_err(AppError::from),
            ArtifactFormat::Bincode => bincode::deserialize(&bytes).map_err(AppError::from),
        };

        decoded.map_err(|e| AppError::load(path, format!("corrupt artifact: {}", e)))
    }

    /// Encode and write the artifact
    pub fn write(&self, path: &Path, format: ArtifactFormat) -> Result<()> {
        let bytes = match format {
            ArtifactFormat::Json => serde_json::to_vec_pretty(self)?,
            ArtifactFormat::Yaml => serde_yaml::to_string(self)?.into_bytes(),
            ArtifactFormat::Bincode => bincode::serialize(self)?,
        };
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn scaler(&self, disease: DiseaseId) -> Option<&ScalerParams> {
        match disease {
            DiseaseId::Diabetes => self.diabetes_scaler.as_ref(),
            DiseaseId::HeartDisease => self.heart_scaler.as_ref(),
            DiseaseId::KidneyDisease => self.kidney_scaler.as_ref(),
        }
    }

    fn model(&self, disease: DiseaseId) -> Option<&ClassifierParams> {
        match disease {
            DiseaseId::Diabetes => self.diabetes_model.as_ref(),
            DiseaseId::HeartDisease => self.heart_model.as_ref(),
            DiseaseId::KidneyDisease => self.kidney_model.as_ref(),
        }
    }

    /// Set the scaler/model pair of one disease
    pub fn set_bundle(&mut self, disease: DiseaseId, scaler: ScalerParams, model: ClassifierParams) {
        match disease {
            DiseaseId::Diabetes => {
                self.diabetes_scaler = Some(scaler);
                self.diabetes_model = Some(model);
            }
            DiseaseId::HeartDisease => {
                self.heart_scaler = Some(scaler);
                self.heart_model = Some(model);
            }
            DiseaseId::KidneyDisease => {
                self.kidney_scaler = Some(scaler);
                self.kidney_model = Some(model);
            }
        }
    }
}

/// Fitted scaler and classifier for one disease
#[derive(Debug)]
pub struct ModelBundle {
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
}

impl ModelBundle {
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    /// Scale `values` and run the classifier on the result
    pub fn evaluate(&self, values: &[f64]) -> Result<ClassOutput> {
        let scaled = self.scaler.transform(values)?;
        Ok(self.classifier.predict(scaled.view()))
    }
}

/// Spec and bundle registered for one disease
#[derive(Debug)]
struct RegistryEntry {
    spec: FeatureSpec,
    bundle: ModelBundle,
}

impl RegistryEntry {
    fn assemble(
        disease: DiseaseId,
        scaler: ScalerParams,
        model: ClassifierParams,
    ) -> std::result::Result<Self, String> {
        let key = disease.artifact_key();
        let scaler = StandardScaler::from_params(scaler).map_err(|e| format!("{}_scaler: {}", key, e))?;
        let width = scaler.n_features();
        let classifier = model.build(width).map_err(|e| format!("{}_model: {}", key, e))?;

        let spec = match FeatureSpec::static_for(disease) {
            Some(spec) if spec.len() != width => {
                return Err(format!(
                    "{}_scaler was fitted on {} features but the {} form has {} fields",
                    key,
                    width,
                    disease,
                    spec.len()
                ));
            }
            Some(spec) => spec,
            None => FeatureSpec::kidney(width),
        };

        Ok(Self {
            spec,
            bundle: ModelBundle { scaler, classifier },
        })
    }
}

/// Immutable lookup table of model bundles keyed by disease.
///
/// Built once at startup and shared by reference; nothing is mutated
/// after construction.
#[derive(Debug)]
pub struct ModelRegistry {
    entries: HashMap<DiseaseId, RegistryEntry>,
    source: PathBuf,
    metadata: ArtifactMetadata,
}

impl ModelRegistry {
    /// Load every disease bundle from an artifact file, inferring the format
    /// from the extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_format(path, None)
    }

    pub fn load_with_format(path: impl AsRef<Path>, format: Option<ArtifactFormat>) -> Result<Self> {
        let path = path.as_ref();
        let started = Instant::now();
        info!("Loading model artifact from {}", path.display());

        let artifact = ModelArtifact::read(path, format)?;
        let registry = Self::from_artifact(artifact, path)?;

        info!(
            "✅ Loaded {} model bundles in {:.1}ms",
            registry.entries.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(registry)
    }

    /// Build a registry from a decoded artifact. All three diseases are
    /// required.
    pub fn from_artifact(artifact: ModelArtifact, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let mut entries = HashMap::new();

        for disease in DiseaseId::all() {
            let key = disease.artifact_key();
            let scaler = artifact
                .scaler(disease)
                .cloned()
                .ok_or_else(|| AppError::load(&source, format!("missing entry `{}_scaler`", key)))?;
            let model = artifact
                .model(disease)
                .cloned()
                .ok_or_else(|| AppError::load(&source, format!("missing entry `{}_model`", key)))?;

            let entry =
                RegistryEntry::assemble(disease, scaler, model).map_err(|e| AppError::load(&source, e))?;
            info!(
                disease = %disease,
                model_type = %entry.bundle.classifier.model_type(),
                n_features = entry.bundle.n_features(),
                "Registered model bundle"
            );
            entries.insert(disease, entry);
        }

        Ok(Self {
            entries,
            source,
            metadata: artifact.metadata.unwrap_or_default(),
        })
    }

    /// Start a registry assembled in code instead of from a file
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    fn entry(&self, disease: DiseaseId) -> Result<&RegistryEntry> {
        self.entries
            .get(&disease)
            .ok_or_else(|| AppError::UnknownDisease(disease.to_string()))
    }

    /// Bundle registered for `disease`
    pub fn get(&self, disease: DiseaseId) -> Result<&ModelBundle> {
        self.entry(disease).map(|e| &e.bundle)
    }

    /// Input layout for `disease`; the kidney width was fixed at load time
    pub fn spec_for(&self, disease: DiseaseId) -> Result<&FeatureSpec> {
        self.entry(disease).map(|e| &e.spec)
    }

    pub(crate) fn spec_and_bundle(&self, disease: DiseaseId) -> Result<(&FeatureSpec, &ModelBundle)> {
        self.entry(disease).map(|e| (&e.spec, &e.bundle))
    }

    /// Registered diseases in declaration order
    pub fn diseases(&self) -> Vec<DiseaseId> {
        let mut diseases: Vec<DiseaseId> = self.entries.keys().copied().collect();
        diseases.sort();
        diseases
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn summary(&self) -> Vec<BundleSummary> {
        self.diseases()
            .into_iter()
            .filter_map(|disease| {
                self.entries.get(&disease).map(|e| BundleSummary {
                    disease,
                    model_type: e.bundle.classifier.model_type(),
                    n_features: e.bundle.n_features(),
                })
            })
            .collect()
    }
}

/// Builder for registries assembled in code. Unlike `load`, a partial set of
/// diseases is allowed.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: HashMap<DiseaseId, RegistryEntry>,
    metadata: ArtifactMetadata,
}

impl RegistryBuilder {
    pub fn register(
        mut self,
        disease: DiseaseId,
        scaler: ScalerParams,
        model: ClassifierParams,
    ) -> Result<Self> {
        let entry = RegistryEntry::assemble(disease, scaler, model)
            .map_err(|e| AppError::load(IN_MEMORY_SOURCE, e))?;
        debug!(disease = %disease, "Registered in-memory model bundle");
        self.entries.insert(disease, entry);
        Ok(self)
    }

    pub fn with_metadata(mut self, metadata: ArtifactMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            entries: self.entries,
            source: PathBuf::from(IN_MEMORY_SOURCE),
            metadata: self.metadata,
        }
    }
}
