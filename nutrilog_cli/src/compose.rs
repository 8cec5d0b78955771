//! Composing journal entries: the template, reading input, and keeping a
//! draft around when analysis fails.

use nutrilog_core::{Error, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Example entry showing the shape the analysis works best with
pub const TEMPLATE: &str = "\
Date: Dec 4
Wake time: 7:00
Exercise: 30 min walk

Breakfast: 200ml milk, 2 boiled eggs, 1 slice of bread
Snack (morning): none
Lunch: tomato beef spaghetti, one plate
Snack (afternoon): 1 orange
Dinner:

Body / notes: normal";

const DRAFT_FILE: &str = "draft.txt";

pub fn draft_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DRAFT_FILE)
}

/// Read the entry from a file, or stdin, falling back to a saved draft
pub fn read_entry(file: Option<&Path>, data_dir: &Path) -> Result<String> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    if !text.trim().is_empty() {
        return Ok(text);
    }

    let draft = draft_path(data_dir);
    if draft.exists() {
        let saved = std::fs::read_to_string(&draft)?;
        if !saved.trim().is_empty() {
            tracing::info!("Using saved draft {:?}", draft);
            return Ok(saved);
        }
    }

    Err(Error::Other("Journal entry is empty".into()))
}

/// Keep the entry so a failed analysis can be retried
pub fn save_draft(data_dir: &Path, text: &str) -> Result<PathBuf> {
    let path = draft_path(data_dir);
    nutrilog_core::snapshot::write_atomic(&path, text)?;
    Ok(path)
}

pub fn clear_draft(data_dir: &Path) -> Result<()> {
    let path = draft_path(data_dir);
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    Ok(())
}
