/// Integration tests for artifact loading
///
/// Covers every on-disk format plus the load failures a deployment can hit:
/// missing file, corrupt content, missing entries and mismatched widths.

use disease_risk_predictor::{
    ml::{
        ArtifactFormat, ClassifierParams, DiseaseId, LinearParams, ModelArtifact, ModelRegistry,
        ModelType, ScalerParams,
    },
    AppError,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/all_disease_models.json")
}

fn fixture_artifact() -> ModelArtifact {
    ModelArtifact::read(&fixture_path(), None).expect("fixture should decode")
}

fn assert_load_error(err: AppError, path: &Path, needle: &str) {
    match err {
        AppError::Load { path: p, reason } => {
            assert_eq!(p, path);
            assert!(reason.contains(needle), "reason `{}` lacks `{}`", reason, needle);
        }
        other => panic!("expected Load error, got {:?}", other),
    }
}

#[test]
fn test_fixture_summary_and_metadata() {
    let registry = ModelRegistry::load(fixture_path()).unwrap();

    assert_eq!(registry.len(), 3);
    assert_eq!(
        registry.diseases(),
        vec![DiseaseId::Diabetes, DiseaseId::HeartDisease, DiseaseId::KidneyDisease]
    );
    assert_eq!(registry.source(), fixture_path().as_path());
    assert_eq!(registry.metadata().version.as_deref(), Some("2024.1"));
    assert!(registry.metadata().trained_at.is_some());

    let summary = registry.summary();
    let types: Vec<_> = summary.iter().map(|s| (s.disease, s.model_type, s.n_features)).collect();
    assert_eq!(
        types,
        vec![
            (DiseaseId::Diabetes, ModelType::LogisticRegression, 8),
            (DiseaseId::HeartDisease, ModelType::RandomForest, 13),
            (DiseaseId::KidneyDisease, ModelType::LinearSvm, 24),
        ]
    );
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    let err = ModelRegistry::load(&path).unwrap_err();
    assert_eq!(err.error_code(), "LOAD_ERROR");
    assert!(!err.is_recoverable());
    assert_load_error(err, &path, "");
}

#[test]
fn test_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models.json");
    std::fs::write(&path, b"{ \"diabetes_scaler\": [1, 2").unwrap();

    let err = ModelRegistry::load(&path).unwrap_err();
    assert_load_error(err, &path, "corrupt artifact");
}

#[test]
fn test_unknown_extension_needs_explicit_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models.pkl");
    std::fs::copy(fixture_path(), &path).unwrap();

    let err = ModelRegistry::load(&path).unwrap_err();
    assert_load_error(err, &path, "format");

    let registry = ModelRegistry::load_with_format(&path, Some(ArtifactFormat::Json)).unwrap();
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_missing_kidney_entry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models.json");
    let mut artifact = fixture_artifact();
    artifact.kidney_scaler = None;
    artifact.write(&path, ArtifactFormat::Json).unwrap();

    let err = ModelRegistry::load(&path).unwrap_err();
    assert_load_error(err, &path, "kidney_scaler");
}

#[test]
fn test_scaler_model_width_disagreement() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models.json");
    let mut artifact = fixture_artifact();
    artifact.diabetes_model = Some(ClassifierParams::LogisticRegression(LinearParams {
        coefficients: vec![0.5; 7],
        intercept: 0.0,
    }));
    artifact.write(&path, ArtifactFormat::Json).unwrap();

    let err = ModelRegistry::load(&path).unwrap_err();
    assert_load_error(err, &path, "diabetes_model");
}

#[test]
fn test_diabetes_scaler_must_match_form() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models.json");
    let mut artifact = fixture_artifact();
    artifact.set_bundle(
        DiseaseId::Diabetes,
        ScalerParams {
            mean: vec![0.0; 9],
            scale: vec![1.0; 9],
        },
        ClassifierParams::LinearSvm(LinearParams {
            coefficients: vec![0.1; 9],
            intercept: 0.0,
        }),
    );
    artifact.write(&path, ArtifactFormat::Json).unwrap();

    let err = ModelRegistry::load(&path).unwrap_err();
    assert_load_error(err, &path, "diabetes_scaler");
}

#[test]
fn test_yaml_and_bincode_artifacts_load_identically() {
    let dir = TempDir::new().unwrap();
    let artifact = fixture_artifact();
    let reference = ModelRegistry::load(fixture_path()).unwrap();
    let request = [6.0, 200.0, 80.0, 35.0, 200.0, 45.0, 1.2, 60.0];
    let expected = reference
        .get(DiseaseId::Diabetes)
        .unwrap()
        .evaluate(&request)
        .unwrap();

    for (name, format) in [("models.yaml", ArtifactFormat::Yaml), ("models.bin", ArtifactFormat::Bincode)] {
        let path = dir.path().join(name);
        artifact.write(&path, format).unwrap();

        assert_eq!(ModelArtifact::read(&path, None).unwrap(), artifact);

        let registry = ModelRegistry::load(&path).unwrap();
        assert_eq!(registry.summary(), reference.summary());
        assert_eq!(registry.metadata(), reference.metadata());
        let output = registry
            .get(DiseaseId::Diabetes)
            .unwrap()
            .evaluate(&request)
            .unwrap();
        assert_eq!(output, expected);
    }
}
