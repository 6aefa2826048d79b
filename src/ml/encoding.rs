//! Categorical encoding applied before values reach `predict`.
//!
//! The codes below are the ones the bundled models were trained with:
//! `Male = 1`, `Female = 0`, `Yes = 1`, `No = 0`. Changing them silently
//! corrupts predictions, so they live in one place.

use crate::error::{AppError, Result};
use crate::ml::features::{ChoiceOption, FeatureSpec, FieldKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn code(&self) -> f64 {
        match self {
            Sex::Male => 1.0,
            Sex::Female => 0.0,
        }
    }

    pub(crate) fn options() -> Vec<ChoiceOption> {
        vec![
            ChoiceOption {
                label: "Male".to_string(),
                code: Sex::Male.code(),
            },
            ChoiceOption {
                label: "Female".to_string(),
                code: Sex::Female.code(),
            },
        ]
    }
}

impl FromStr for Sex {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(AppError::Validation(format!("unknown sex '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn code(&self) -> f64 {
        match self {
            YesNo::Yes => 1.0,
            YesNo::No => 0.0,
        }
    }

    pub(crate) fn options() -> Vec<ChoiceOption> {
        vec![
            ChoiceOption {
                label: "Yes".to_string(),
                code: YesNo::Yes.code(),
            },
            ChoiceOption {
                label: "No".to_string(),
                code: YesNo::No.code(),
            },
        ]
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

impl FromStr for YesNo {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(YesNo::Yes),
            "no" | "n" | "false" => Ok(YesNo::No),
            _ => Err(AppError::Validation(format!("expected yes/no, got '{}'", s))),
        }
    }
}

/// Assembles a positional request from named form entries.
///
/// Unspecified fields take their spec default. Categorical fields accept
/// either an option label (`Male`, `Yes`) or the numeric code; other fields
/// accept numbers. Domain checks are left to `predict`.
#[derive(Debug, Clone)]
pub struct FormInput<'a> {
    spec: &'a FeatureSpec,
    values: Vec<f64>,
}

impl<'a> FormInput<'a> {
    pub fn new(spec: &'a FeatureSpec) -> Self {
        Self {
            spec,
            values: spec.defaults(),
        }
    }

    /// Set a field from its textual form value
    pub fn set(&mut self, field: &str, raw: &str) -> Result<&mut Self> {
        let spec = self.spec;
        let (idx, descriptor) = spec.field(field).ok_or_else(|| {
            AppError::Validation(format!(
                "{} has no field named '{}'",
                spec.disease(),
                field
            ))
        })?;

        let raw = raw.trim();
        let value = match &descriptor.kind {
            FieldKind::Categorical { options } => match parse_choice(options, raw) {
                Some(code) => code,
                None => parse_number(&descriptor.name, raw)?,
            },
            FieldKind::Integer | FieldKind::Real => parse_number(&descriptor.name, raw)?,
        };

        self.values[idx] = value;
        Ok(self)
    }

    /// Set a field from a `name=value` pair
    pub fn set_pair(&mut self, pair: &str) -> Result<&mut Self> {
        let (name, raw) = pair.split_once('=').ok_or_else(|| {
            AppError::Validation(format!("expected name=value, got '{}'", pair))
        })?;
        self.set(name, raw)
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Resolve a categorical label, including the `Sex` and `YesNo` spellings
fn parse_choice(options: &[ChoiceOption], raw: &str) -> Option<f64> {
    if let Some(option) = options.iter().find(|o| o.label.eq_ignore_ascii_case(raw)) {
        return Some(option.code);
    }

    if options == Sex::options().as_slice() {
        raw.parse::<Sex>().ok().map(|sex| sex.code())
    } else if options == YesNo::options().as_slice() {
        raw.parse::<YesNo>().ok().map(|answer| answer.code())
    } else {
        None
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| AppError::Validation(format!("field '{}' expects a number, got '{}'", field, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_encoding() {
        assert_eq!(Sex::Male.code(), 1.0);
        assert_eq!(Sex::Female.code(), 0.0);
        assert_eq!("Male".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert!("other".parse::<Sex>().is_err());
    }

    #[test]
    fn test_yes_no_encoding() {
        assert_eq!(YesNo::Yes.code(), 1.0);
        assert_eq!(YesNo::No.code(), 0.0);
        assert_eq!(YesNo::from(false), YesNo::No);
        assert_eq!("YES".parse::<YesNo>().unwrap(), YesNo::Yes);
    }

    #[test]
    fn test_form_encodes_heart_labels() {
        let spec = FeatureSpec::heart_disease();
        let mut form = FormInput::new(&spec);
        form.set("sex", "Female")
            .unwrap()
            .set("Fasting Blood Sugar > 120", "No")
            .unwrap()
            .set_pair("exercise_induced_angina=no")
            .unwrap()
            .set_pair("age=63")
            .unwrap();

        let values = form.into_values();
        assert_eq!(values[0], 63.0);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[5], 0.0);
        assert_eq!(values[8], 0.0);
        // untouched fields keep their defaults
        assert_eq!(values[7], 150.0);
    }

    #[test]
    fn test_form_male_maps_to_one() {
        let spec = FeatureSpec::heart_disease();
        let mut form = FormInput::new(&spec);
        form.set("sex", "Female").unwrap().set("sex", "Male").unwrap();
        assert_eq!(form.into_values()[1], 1.0);
    }

    #[test]
    fn test_form_accepts_short_spellings() {
        let spec = FeatureSpec::heart_disease();
        let mut form = FormInput::new(&spec);
        form.set_pair("sex=f")
            .unwrap()
            .set_pair("fasting_blood_sugar=false")
            .unwrap()
            .set_pair("exercise_induced_angina=n")
            .unwrap();
        let values = form.into_values();
        assert_eq!(values[1], 0.0);
        assert_eq!(values[5], 0.0);
        assert_eq!(values[8], 0.0);

        let mut form = FormInput::new(&spec);
        form.set("sex", "m").unwrap().set("fasting_blood_sugar", "y").unwrap();
        let values = form.into_values();
        assert_eq!(values[1], 1.0);
        assert_eq!(values[5], 1.0);

        // Aliases stay scoped to their own fields
        let mut form = FormInput::new(&spec);
        assert!(form.set("sex", "yes").is_err());
        assert!(form.set("slope", "m").is_err());
    }

    #[test]
    fn test_form_accepts_numeric_codes() {
        let spec = FeatureSpec::heart_disease();
        let mut form = FormInput::new(&spec);
        form.set("chest_pain_type", "2").unwrap();
        assert_eq!(form.into_values()[2], 2.0);
    }

    #[test]
    fn test_form_rejects_unknown_field_and_label() {
        let spec = FeatureSpec::heart_disease();
        let mut form = FormInput::new(&spec);
        assert!(matches!(form.set("weight", "80"), Err(AppError::Validation(_))));
        assert!(matches!(form.set("sex", "unknown"), Err(AppError::Validation(_))));
        assert!(matches!(form.set_pair("age"), Err(AppError::Validation(_))));
    }
}
