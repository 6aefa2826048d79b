use crate::error::{AppError, Result};
use crate::ml::models::DiseaseId;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do with a value outside a field's declared bounds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// Fail the request with `OutOfRange`
    #[default]
    Reject,

    /// Clamp the value to the nearest bound
    Clamp,
}

/// Named value of a categorical field and the code the model was trained on
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChoiceOption {
    pub label: String,
    pub code: f64,
}

impl ChoiceOption {
    fn new(label: impl Into<String>, code: f64) -> Self {
        Self {
            label: label.into(),
            code,
        }
    }

    fn numeric(codes: &[i32]) -> Vec<ChoiceOption> {
        codes
            .iter()
            .map(|&c| ChoiceOption::new(c.to_string(), f64::from(c)))
            .collect()
    }
}

/// Numeric kind of an input field
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Real,
    Categorical { options: Vec<ChoiceOption> },
}

/// Description of one positional input field
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldDescriptor {
    /// Machine key (snake_case)
    pub key: String,

    /// Display name
    pub name: String,

    pub kind: FieldKind,

    /// Inclusive lower bound, if any
    pub min: Option<f64>,

    /// Inclusive upper bound, if any
    pub max: Option<f64>,

    pub default: f64,
}

impl FieldDescriptor {
    fn integer(key: &str, name: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            kind: FieldKind::Integer,
            min: Some(min),
            max: Some(max),
            default,
        }
    }

    fn real(key: &str, name: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            kind: FieldKind::Real,
            min: Some(min),
            max: Some(max),
            default,
        }
    }

    fn unbounded(key: String, name: String, default: f64) -> Self {
        Self {
            key,
            name,
            kind: FieldKind::Real,
            min: None,
            max: None,
            default,
        }
    }

    fn categorical(key: &str, name: &str, options: Vec<ChoiceOption>, default: f64) -> Self {
        let min = options.iter().map(|o| o.code).fold(f64::INFINITY, f64::min);
        let max = options.iter().map(|o| o.code).fold(f64::NEG_INFINITY, f64::max);
        Self {
            key: key.to_string(),
            name: name.to_string(),
            kind: FieldKind::Categorical { options },
            min: Some(min),
            max: Some(max),
            default,
        }
    }

    /// Options of a categorical field, empty for numeric fields
    pub fn options(&self) -> &[ChoiceOption] {
        match &self.kind {
            FieldKind::Categorical { options } => options,
            _ => &[],
        }
    }

    fn out_of_range(&self, disease: DiseaseId, value: f64) -> AppError {
        AppError::OutOfRange {
            disease: disease.to_string(),
            field: self.name.clone(),
            value,
            min: self.min,
            max: self.max,
        }
    }

    /// Check one value against this field's domain.
    ///
    /// Returns the value to feed the scaler, which differs from the input
    /// only when `policy` is `Clamp`.
    pub fn check(&self, disease: DiseaseId, value: f64, policy: RangePolicy) -> Result<f64> {
        if !value.is_finite() {
            return Err(self.out_of_range(disease, value));
        }

        if let FieldKind::Categorical { options } = &self.kind {
            return if options.iter().any(|o| o.code == value) {
                Ok(value)
            } else {
                Err(self.out_of_range(disease, value))
            };
        }

        // Fractional counts are never clamped into whole ones
        if matches!(self.kind, FieldKind::Integer) && value.fract() != 0.0 {
            return Err(self.out_of_range(disease, value));
        }

        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        if !below && !above {
            return Ok(value);
        }

        match policy {
            RangePolicy::Reject => Err(self.out_of_range(disease, value)),
            RangePolicy::Clamp => {
                let clamped = match (below, self.min, self.max) {
                    (true, Some(min), _) => min,
                    (_, _, Some(max)) => max,
                    _ => value,
                };
                warn!(
                    disease = %disease,
                    field = %self.name,
                    value,
                    clamped,
                    "Clamped out-of-range input"
                );
                Ok(clamped)
            }
        }
    }
}

/// Ordered input layout expected by one disease's scaler/model pair
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureSpec {
    disease: DiseaseId,
    fields: Vec<FieldDescriptor>,
}

impl FeatureSpec {
    /// Static spec for diseases with a fixed layout; `None` for
    /// KidneyDisease, whose width comes from the fitted scaler.
    pub fn static_for(disease: DiseaseId) -> Option<FeatureSpec> {
        match disease {
            DiseaseId::Diabetes => Some(Self::diabetes()),
            DiseaseId::HeartDisease => Some(Self::heart_disease()),
            DiseaseId::KidneyDisease => None,
        }
    }

    pub fn diabetes() -> FeatureSpec {
        FeatureSpec {
            disease: DiseaseId::Diabetes,
            fields: vec![
                FieldDescriptor::integer("pregnancies", "Pregnancies", 0.0, 20.0, 0.0),
                FieldDescriptor::integer("glucose", "Glucose", 0.0, 300.0, 120.0),
                FieldDescriptor::integer("blood_pressure", "Blood Pressure", 0.0, 200.0, 70.0),
                FieldDescriptor::integer("skin_thickness", "Skin Thickness", 0.0, 100.0, 20.0),
                FieldDescriptor::integer("insulin", "Insulin", 0.0, 900.0, 80.0),
                FieldDescriptor::real("bmi", "BMI", 0.0, 100.0, 25.0),
                FieldDescriptor::real(
                    "diabetes_pedigree_function",
                    "Diabetes Pedigree Function",
                    0.0,
                    5.0,
                    0.5,
                ),
                FieldDescriptor::integer("age", "Age", 0.0, 120.0, 30.0),
            ],
        }
    }

    pub fn heart_disease() -> FeatureSpec {
        use crate::ml::encoding::{Sex, YesNo};

        FeatureSpec {
            disease: DiseaseId::HeartDisease,
            fields: vec![
                FieldDescriptor::integer("age", "Age", 0.0, 120.0, 50.0),
                FieldDescriptor::categorical("sex", "Sex", Sex::options(), Sex::Male.code()),
                FieldDescriptor::categorical(
                    "chest_pain_type",
                    "Chest Pain Type",
                    ChoiceOption::numeric(&[0, 1, 2, 3]),
                    0.0,
                ),
                FieldDescriptor::integer("resting_bp", "Resting BP", 0.0, 250.0, 120.0),
                FieldDescriptor::integer("cholesterol", "Cholesterol", 0.0, 600.0, 200.0),
                FieldDescriptor::categorical(
                    "fasting_blood_sugar",
                    "Fasting Blood Sugar > 120",
                    YesNo::options(),
                    YesNo::Yes.code(),
                ),
                FieldDescriptor::categorical(
                    "resting_ecg",
                    "Resting ECG",
                    ChoiceOption::numeric(&[0, 1, 2]),
                    0.0,
                ),
                FieldDescriptor::integer("max_heart_rate", "Max Heart Rate", 0.0, 250.0, 150.0),
                FieldDescriptor::categorical(
                    "exercise_induced_angina",
                    "Exercise Induced Angina",
                    YesNo::options(),
                    YesNo::Yes.code(),
                ),
                FieldDescriptor::real("oldpeak", "Oldpeak", 0.0, 10.0, 1.0),
                FieldDescriptor::categorical("slope", "Slope", ChoiceOption::numeric(&[0, 1, 2]), 0.0),
                FieldDescriptor::categorical(
                    "major_vessels",
                    "Major Vessels",
                    ChoiceOption::numeric(&[0, 1, 2, 3]),
                    0.0,
                ),
                FieldDescriptor::categorical(
                    "thalassemia",
                    "Thalassemia",
                    ChoiceOption::numeric(&[1, 2, 3]),
                    1.0,
                ),
            ],
        }
    }

    /// Kidney layout of `n_features` unbounded real fields
    pub fn kidney(n_features: usize) -> FeatureSpec {
        let fields = (1..=n_features)
            .map(|i| FieldDescriptor::unbounded(format!("feature_{}", i), format!("Feature {}", i), 0.0))
            .collect();

        FeatureSpec {
            disease: DiseaseId::KidneyDisease,
            fields,
        }
    }

    pub fn disease(&self) -> DiseaseId {
        self.disease
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Find a field by machine key or display name (case-insensitive)
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        let wanted = name.trim();
        self.fields.iter().enumerate().find(|(_, f)| {
            f.key.eq_ignore_ascii_case(wanted) || f.name.eq_ignore_ascii_case(wanted)
        })
    }

    /// Default value of every field, in order
    pub fn defaults(&self) -> Vec<f64> {
        self.fields.iter().map(|f| f.default).collect()
    }

    /// Validate a raw request against this spec.
    ///
    /// Fails with `ShapeMismatch` on a length mismatch and with `OutOfRange`
    /// on the first field violating its domain.
    pub fn validate(&self, values: &[f64], policy: RangePolicy) -> Result<Vec<f64>> {
        if values.len() != self.fields.len() {
            return Err(AppError::ShapeMismatch {
                disease: self.disease.to_string(),
                expected: self.fields.len(),
                got: values.len(),
            });
        }

        self.fields
            .iter()
            .zip(values)
            .map(|(field, &value)| field.check(self.disease, value, policy))
            .collect()
    }
}
