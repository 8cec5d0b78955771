//! Journal entry extraction through a hosted LLM.
//!
//! The [`Extractor`] trait is the seam the rest of the crate depends on;
//! [`GeminiClient`] implements it against the Generative Language REST API
//! with a JSON response schema requiring every [`AnalysisResult`] field.

use crate::config::ExtractionConfig;
use crate::AnalysisResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

/// Why an extraction produced no analysis
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("API key not configured (set {0})")]
    MissingApiKey(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("The model returned no result")]
    NoResult,

    #[error("Malformed analysis: {0}")]
    Malformed(String),
}

/// User-facing category of an extraction failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The service answered but nothing usable came back
    Parse,
    /// The call itself didn't complete
    Transport,
}

impl ExtractionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractionError::NoResult | ExtractionError::Malformed(_) => FailureKind::Parse,
            ExtractionError::MissingApiKey(_)
            | ExtractionError::Request(_)
            | ExtractionError::Api { .. } => FailureKind::Transport,
        }
    }

    /// Message shown to the user; the entry is kept for a retry either way
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            FailureKind::Parse => "Could not parse the entry. Please add more detail and try again.",
            FailureKind::Transport => "Analysis failed. Check your network connection and API key.",
        }
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Turns a free-text journal entry into structured nutrition data
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Analyze `raw_text`; `today` resolves relative dates like "yesterday"
    async fn extract(
        &self,
        raw_text: &str,
        today: NaiveDate,
    ) -> Result<AnalysisResult, ExtractionError>;
}

// ---------------------------------------------------------------------------
// Gemini API Types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Gemini Client
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client, reading the API key from the configured env var
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ExtractionError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            &config.api_base,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn new(
        api_base: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Send the prompt and return the model's raw text output
    async fn generate(&self, prompt: String) -> Result<String, ExtractionError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: analysis_schema(),
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|resp| resp.error.message)
                .unwrap_or(body);
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractionError::Request(format!("unexpected response body: {}", e)))?;

        parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text.filter(|t| !t.trim().is_empty()))
            .ok_or(ExtractionError::NoResult)
    }
}

#[async_trait]
impl Extractor for GeminiClient {
    async fn extract(
        &self,
        raw_text: &str,
        today: NaiveDate,
    ) -> Result<AnalysisResult, ExtractionError> {
        tracing::info!("Requesting analysis from {}", self.model);
        let text = self.generate(build_prompt(raw_text, today)).await?;
        let result = parse_analysis(&text)?;
        tracing::info!(
            "Analysis for {}: {} kcal in, {} exercises",
            result.date,
            result.intake.calories,
            result.exercises.len()
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Prompt and Schema
// ---------------------------------------------------------------------------

fn build_prompt(raw_text: &str, today: NaiveDate) -> String {
    format!(
        r#"You are an expert nutritionist and fitness tracker.
Analyze the following journal entry, which describes one day of eating and exercise.

Current date: {today}

Tasks:
1. Extract the date of the entry as YYYY-MM-DD. Resolve "today" and "yesterday" against the current date.
2. For each meal (breakfast, lunch, dinner, snacks), identify the food items and estimate
   calories, protein, fat, carbs, fiber and sodium for that meal. Sum them into the daily `intake`.
3. For each exercise, estimate the calories burned.
4. Summarize mood, body state or other remarks as `notes`.
5. Give 3-5 specific, actionable suggestions based on the day's nutrient balance.

Respond in the same language as the entry.

Journal entry:
"""
{raw_text}
"""
"#
    )
}

fn nutrition_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "calories": { "type": "NUMBER", "description": "Calories in kcal" },
            "protein": { "type": "NUMBER", "description": "Protein in grams" },
            "fat": { "type": "NUMBER", "description": "Fat in grams" },
            "carbs": { "type": "NUMBER", "description": "Carbohydrates in grams" },
            "fiber": { "type": "NUMBER", "description": "Fiber in grams" },
            "sodium": { "type": "NUMBER", "description": "Sodium in mg" }
        },
        "required": ["calories", "protein", "fat", "carbs", "fiber", "sodium"]
    })
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "date": {
                "type": "STRING",
                "description": "Date of the entry in YYYY-MM-DD format"
            },
            "intake": nutrition_schema(),
            "meals": {
                "type": "ARRAY",
                "description": "Nutrition broken down by meal",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": { "type": "STRING", "description": "Meal type, e.g. breakfast" },
                        "items": { "type": "STRING", "description": "Food items in this meal" },
                        "nutrition": nutrition_schema()
                    },
                    "required": ["type", "items", "nutrition"]
                }
            },
            "exercises": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING" },
                        "caloriesBurned": { "type": "NUMBER", "description": "Estimated kcal burned" }
                    },
                    "required": ["description", "caloriesBurned"]
                }
            },
            "notes": { "type": "STRING" },
            "suggestions": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": ["date", "intake", "meals", "exercises", "notes", "suggestions"]
    })
}

// ---------------------------------------------------------------------------
// Response Parsing
// ---------------------------------------------------------------------------

/// Decode the model's text into an analysis
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, ExtractionError> {
    let json = json_body(text)?;
    serde_json::from_str(json).map_err(|e| ExtractionError::Malformed(format!("{}: {}", e, json)))
}

/// The JSON object in a response
///
/// `responseMimeType` asks for bare JSON; a single surrounding code fence
/// is still stripped.
fn json_body(text: &str) -> Result<&str, ExtractionError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    if body.starts_with('{') {
        Ok(body)
    } else {
        Err(ExtractionError::Malformed("response is not a JSON object".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
