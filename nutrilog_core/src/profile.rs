//! User profile onboarding and persistence.
//!
//! The profile is a singleton record stored under its own key
//! (`profile.json`). It is validated once at onboarding and replaced
//! wholesale on edit.

use crate::energy::compute_bmr;
use crate::{snapshot, Error, Gender, Result, UserProfile};
use std::path::Path;

impl UserProfile {
    /// Build a profile from validated metrics, deriving the BMR
    pub fn new(height_cm: f64, weight_kg: f64, age_years: u32, gender: Gender) -> Result<Self> {
        if !height_cm.is_finite() || height_cm <= 0.0 {
            return Err(Error::Validation(format!(
                "height must be a positive number of cm, got {}",
                height_cm
            )));
        }
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(Error::Validation(format!(
                "weight must be a positive number of kg, got {}",
                weight_kg
            )));
        }
        if age_years == 0 {
            return Err(Error::Validation("age must be at least 1 year".into()));
        }

        Ok(Self {
            height: height_cm,
            weight: weight_kg,
            age: age_years,
            gender,
            bmr: compute_bmr(weight_kg, height_cm, age_years, gender),
        })
    }

    /// Build a profile from raw onboarding input
    ///
    /// Empty or non-numeric fields are rejected; nothing is created.
    pub fn parse(height: &str, weight: &str, age: &str, gender: &str) -> Result<Self> {
        let height_cm = parse_field::<f64>("height", height)?;
        let weight_kg = parse_field::<f64>("weight", weight)?;
        let age_years = parse_field::<u32>("age", age)?;
        let gender = gender.parse::<Gender>()?;
        Self::new(height_cm, weight_kg, age_years, gender)
    }

    /// Load the profile
    ///
    /// Returns `None` if no profile has been saved, which means onboarding
    /// is required. An unreadable profile is logged and treated the same way.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match snapshot::read_locked(path) {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                tracing::info!("No profile found at {:?}", path);
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!("Unable to read profile {:?}: {}. Onboarding required.", path, e);
                return Ok(None);
            }
        };

        match serde_json::from_str::<UserProfile>(&contents) {
            Ok(profile) => {
                tracing::debug!("Loaded profile from {:?}", path);
                Ok(Some(profile))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse profile {:?}: {}. Onboarding required.",
                    path,
                    e
                );
                Ok(None)
            }
        }
    }

    /// Save the profile, replacing any previous one
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string(self)?;
        snapshot::write_atomic(path, &contents)?;
        tracing::info!("Saved profile (BMR {} kcal) to {:?}", self.bmr, path);
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} is required", name)));
    }
    trimmed
        .parse::<T>()
        .map_err(|_| Error::Validation(format!("{} must be a number, got '{}'", name, trimmed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_bmr() {
        let profile = UserProfile::new(175.0, 70.0, 30, Gender::Male).unwrap();
        assert_eq!(profile.bmr, 1649);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            UserProfile::parse("", "70", "30", "male"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            UserProfile::parse("tall", "70", "30", "male"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            UserProfile::parse("175", "0", "30", "male"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            UserProfile::parse("175", "70", "0", "female"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            UserProfile::parse("175", "70", "30", "robot"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_parse_accepts_decimal_metrics() {
        let profile = UserProfile::parse(" 162.5 ", "58.2", "41", "F").unwrap();
        assert_eq!(profile.gender, Gender::Female);
        assert_eq!(profile.height, 162.5);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");

        let profile = UserProfile::new(175.0, 70.0, 30, Gender::Female).unwrap();
        profile.save(&path).unwrap();

        let loaded = UserProfile::load(&path).unwrap();
        assert_eq!(loaded, Some(profile));
    }

    #[test]
    fn test_load_missing_requires_onboarding() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");

        assert!(UserProfile::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupted_requires_onboarding() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        assert!(UserProfile::load(&path).unwrap().is_none());
    }
}
