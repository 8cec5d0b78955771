//! CSV export of the log history.
//!
//! One row per day, oldest first, for use in spreadsheets.

use crate::{DailyLog, Result};
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    date: String,
    calories: f64,
    protein: f64,
    fat: f64,
    carbs: f64,
    fiber: f64,
    sodium: f64,
    exercise_burned: f64,
    total_burned: f64,
    net_calories: f64,
    exercise: String,
    notes: &'a str,
}

impl<'a> From<&'a DailyLog> for CsvRow<'a> {
    fn from(log: &'a DailyLog) -> Self {
        CsvRow {
            date: log.date.to_string(),
            calories: log.intake.calories,
            protein: log.intake.protein,
            fat: log.intake.fat,
            carbs: log.intake.carbs,
            fiber: log.intake.fiber,
            sodium: log.intake.sodium,
            exercise_burned: log.exercise_burned(),
            total_burned: log.total_burned,
            net_calories: log.net_calories,
            exercise: log
                .exercise
                .iter()
                .map(|e| e.description.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            notes: &log.notes,
        }
    }
}

/// Write all logs to a CSV file, replacing it
///
/// Returns the number of rows written.
pub fn export_csv(logs: &[DailyLog], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut ordered: Vec<&DailyLog> = logs.iter().collect();
    ordered.sort_by_key(|log| log.date);

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for log in &ordered {
        writer.serialize(CsvRow::from(*log))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} logs to {:?}", ordered.len(), path);
    Ok(ordered.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::make_log;

    #[test]
    fn test_export_writes_rows_oldest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("logs.csv");

        let logs = vec![
            make_log("2024-01-02", 2100.0, 1900.0),
            make_log("2024-01-01", 1800.0, 1900.0),
        ];

        let count = export_csv(&logs, &path).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "date");
        assert!(headers.iter().any(|h| h == "net_calories"));

        let dates: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);
    }

    #[test]
    fn test_export_empty_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.csv");

        assert_eq!(export_csv(&[], &path).unwrap(), 0);
        assert!(path.exists());
    }
}
