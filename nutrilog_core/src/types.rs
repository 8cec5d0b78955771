//! Core domain types for the NutriLog journal.
//!
//! This module defines the fundamental types used throughout the system:
//! - The user profile (body metrics and cached BMR)
//! - Nutrition, meal and exercise values extracted from a journal entry
//! - Daily logs, the unit of storage
//! - The structured analysis returned by the extraction service
//!
//! Field names serialize in camelCase so persisted snapshots share one
//! shape with the extraction service's JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Profile Types
// ============================================================================

/// Biological sex used by the Mifflin-St Jeor equation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

impl FromStr for Gender {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(crate::Error::Validation(format!(
                "unknown gender '{}', expected male or female",
                other
            ))),
        }
    }
}

/// The single user's body metrics.
///
/// Built through [`UserProfile::new`] so `bmr` always matches the other
/// fields. Edits replace the whole profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Height in cm
    pub height: f64,
    /// Weight in kg
    pub weight: f64,
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    /// Basal metabolic rate in kcal/day
    pub bmr: i64,
}

// ============================================================================
// Nutrition and Activity Types
// ============================================================================

/// Nutrient totals for a meal or a whole day
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NutritionData {
    /// kcal
    pub calories: f64,
    /// g
    pub protein: f64,
    /// g
    pub fat: f64,
    /// g
    pub carbs: f64,
    /// g
    pub fiber: f64,
    /// mg
    pub sodium: f64,
}

/// A single activity and its estimated energy cost
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    pub description: String,
    pub calories_burned: f64,
}

/// One meal slot of the day (breakfast, lunch, snack, ...)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MealEntry {
    /// Free-text label such as "breakfast"
    #[serde(rename = "type")]
    pub meal_type: String,
    /// Description of the food eaten
    pub items: String,
    pub nutrition: NutritionData,
}

// ============================================================================
// Log Types
// ============================================================================

/// A day's ingested journal entry.
///
/// `total_burned` and `net_calories` are frozen at ingestion using the
/// profile's BMR at that moment; they are never recomputed on read.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    /// Time-ordered identifier (UUIDv7)
    pub id: Uuid,
    /// Natural key; the store keeps one log per date
    pub date: NaiveDate,
    /// The entry exactly as the user wrote it
    pub raw_text: String,
    pub intake: NutritionData,
    #[serde(default)]
    pub meals: Vec<MealEntry>,
    pub exercise: Vec<ExerciseEntry>,
    /// Exercise burn plus BMR, kcal
    pub total_burned: f64,
    /// Intake minus total burned, kcal
    pub net_calories: f64,
    pub notes: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl DailyLog {
    /// Calories burned through exercise alone
    pub fn exercise_burned(&self) -> f64 {
        self.exercise.iter().map(|e| e.calories_burned).sum()
    }
}

// ============================================================================
// Extraction Types
// ============================================================================

/// Structured result of analyzing a journal entry.
///
/// Every field is required; a response missing any of them is malformed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub date: NaiveDate,
    pub intake: NutritionData,
    pub meals: Vec<MealEntry>,
    pub exercises: Vec<ExerciseEntry>,
    pub notes: String,
    pub suggestions: Vec<String>,
}
