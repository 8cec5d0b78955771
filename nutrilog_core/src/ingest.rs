//! Turning an analysis into a stored daily log.
//!
//! Burn and net totals are computed here, once, from the profile's current
//! BMR. Later profile edits do not touch logs that already exist.

use crate::extract::Extractor;
use crate::store::{LoadOutcome, LogSink, LogStore};
use crate::{AnalysisResult, DailyLog, Result, UserProfile};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Build a daily log, freezing burn and net calories
pub fn build_daily_log(
    result: AnalysisResult,
    raw_text: &str,
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> DailyLog {
    let exercise_burn: f64 = result.exercises.iter().map(|e| e.calories_burned).sum();
    let total_burned = exercise_burn + profile.bmr as f64;
    let net_calories = result.intake.calories - total_burned;

    DailyLog {
        id: Uuid::now_v7(),
        date: result.date,
        raw_text: raw_text.to_string(),
        intake: result.intake,
        meals: result.meals,
        exercise: result.exercises,
        total_burned,
        net_calories,
        notes: result.notes,
        suggestions: result.suggestions,
        timestamp: now,
    }
}

/// Store an already-extracted analysis
///
/// The reload, upsert and persist run under the sink's write lock, so logs
/// written by other processes while the analysis was running are kept.
pub fn ingest_analysis<S: LogSink>(
    store: &mut LogStore<S>,
    profile: &UserProfile,
    raw_text: &str,
    result: AnalysisResult,
) -> Result<DailyLog> {
    let log = build_daily_log(result, raw_text, profile, Utc::now());
    tracing::info!(
        "Ingesting log for {}: {} kcal in, {} kcal burned, net {}",
        log.date,
        log.intake.calories,
        log.total_burned,
        log.net_calories
    );
    if let LoadOutcome::Recovered { reason } = store.merge_and_persist(log.clone())? {
        tracing::warn!("Saved logs were corrupt before ingest: {}", reason);
    }
    Ok(log)
}

/// Extract a journal entry and store the result
///
/// Extraction failures surface as [`crate::Error::Extraction`]; the store
/// is left untouched.
pub async fn analyze_and_ingest<E, S>(
    extractor: &E,
    store: &mut LogStore<S>,
    profile: &UserProfile,
    raw_text: &str,
    today: NaiveDate,
) -> Result<DailyLog>
where
    E: Extractor + ?Sized,
    S: LogSink,
{
    let result = extractor.extract(raw_text, today).await?;
    ingest_analysis(store, profile, raw_text, result)
}
