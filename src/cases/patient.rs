//! Patient demographics

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PcgError, Result};

/// Oldest accepted age in years
pub const MAX_AGE: u8 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        })
    }
}

impl FromStr for Gender {
    type Err = PcgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            _ => Err(PcgError::InvalidPatient {
                reason: format!("unknown gender '{}'", s),
            }),
        }
    }
}

/// Demographics attached to a saved case
///
/// `bmi` is derived: it is recomputed by the height/weight setters and on
/// deserialization, and is `None` whenever the height is not positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatientFields")]
pub struct PatientRecord {
    name: String,
    age: u8,
    gender: Gender,
    height_cm: f64,
    weight_kg: f64,
    phone: String,
    bmi: Option<f64>,
}

/// Stored shape; any persisted `bmi` is ignored and recomputed, and the
/// age limit applies to loaded records as it does to new ones
#[derive(Deserialize)]
struct PatientFields {
    name: String,
    age: u8,
    gender: Gender,
    height_cm: f64,
    weight_kg: f64,
    #[serde(default)]
    phone: String,
}

impl TryFrom<PatientFields> for PatientRecord {
    type Error = PcgError;

    fn try_from(fields: PatientFields) -> Result<Self> {
        Self::new(
            fields.name,
            u32::from(fields.age),
            fields.gender,
            fields.height_cm,
            fields.weight_kg,
            fields.phone,
        )
    }
}

impl PatientRecord {
    /// Create a record, rejecting ages outside 0..=120
    pub fn new(
        name: impl Into<String>,
        age: u32,
        gender: Gender,
        height_cm: f64,
        weight_kg: f64,
        phone: impl Into<String>,
    ) -> Result<Self> {
        if age > MAX_AGE as u32 {
            return Err(PcgError::InvalidPatient {
                reason: format!("age {} is outside 0..={}", age, MAX_AGE),
            });
        }
        let mut record = Self {
            name: name.into(),
            age: age as u8,
            gender,
            height_cm,
            weight_kg,
            phone: phone.into(),
            bmi: None,
        };
        record.recompute_bmi();
        Ok(record)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Body-mass index, `None` when the height is not positive
    pub fn bmi(&self) -> Option<f64> {
        self.bmi
    }

    pub fn set_height_cm(&mut self, height_cm: f64) {
        self.height_cm = height_cm;
        self.recompute_bmi();
    }

    pub fn set_weight_kg(&mut self, weight_kg: f64) {
        self.weight_kg = weight_kg;
        self.recompute_bmi();
    }

    fn recompute_bmi(&mut self) {
        self.bmi = body_mass_index(self.height_cm, self.weight_kg);
    }
}

/// weight / (height in metres)^2
pub fn body_mass_index(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if height_cm > 0.0 {
        let height_m = height_cm / 100.0;
        Some(weight_kg / (height_m * height_m))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn patient() -> PatientRecord {
        PatientRecord::new("Ada", 30, Gender::Female, 170.0, 65.0, "555-0100").unwrap()
    }

    #[test]
    fn test_bmi_computed_on_creation() {
        assert_relative_eq!(patient().bmi().unwrap(), 65.0 / (1.7 * 1.7), epsilon = 1e-9);
    }

    #[test]
    fn test_bmi_follows_setters() {
        let mut record = patient();
        record.set_weight_kg(80.0);
        assert_relative_eq!(record.bmi().unwrap(), 80.0 / (1.7 * 1.7), epsilon = 1e-9);
        record.set_height_cm(200.0);
        assert_relative_eq!(record.bmi().unwrap(), 20.0, epsilon = 1e-9);
        record.set_height_cm(0.0);
        assert!(record.bmi().is_none());
    }

    #[test]
    fn test_age_limit() {
        assert!(PatientRecord::new("Old", 120, Gender::Other, 160.0, 50.0, "").is_ok());
        assert!(PatientRecord::new("Older", 121, Gender::Other, 160.0, 50.0, "").is_err());
    }

    #[test]
    fn test_gender_parsing() {
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("M".parse::<Gender>().unwrap(), Gender::Male);
        assert!("x".parse::<Gender>().is_err());
    }

    #[test]
    fn test_stored_bmi_is_recomputed() {
        let json = r#"{"name":"Bo","age":40,"gender":"Male","height_cm":180.0,"weight_kg":81.0,"phone":"","bmi":1.0}"#;
        let record: PatientRecord = serde_json::from_str(json).unwrap();
        assert_relative_eq!(record.bmi().unwrap(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stored_age_over_limit_is_rejected() {
        let json = r#"{"name":"Cy","age":200,"gender":"Other","height_cm":170.0,"weight_kg":70.0,"phone":""}"#;
        let err = serde_json::from_str::<PatientRecord>(json).unwrap_err();
        assert!(err.to_string().contains("age 200"));

        let at_limit = json.replace("200", "120");
        assert_eq!(serde_json::from_str::<PatientRecord>(&at_limit).unwrap().age(), 120);
    }

    #[test]
    fn test_json_round_trip() {
        let record = patient();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"bmi\""));
        let back: PatientRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
