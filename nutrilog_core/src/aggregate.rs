//! Rolling statistics over a trailing window of distinct dates.
//!
//! The window is counted in calendar dates, not log entries. All functions
//! here are pure and recompute from the slice they are given.

use crate::energy::projected_weight_change_kg;
use crate::DailyLog;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

/// Aggregate statistics for a window of logs
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    /// Number of logs in the window
    pub days: usize,
    /// Sum of net calories, kcal
    pub total_net: f64,
    /// Projected body-mass change in kg (unrounded)
    pub weight_change_kg: f64,
    /// Average intake, kcal
    pub avg_calories: i64,
    /// Average total burn (BMR + exercise), kcal
    pub avg_burn: i64,
    /// Average net balance, kcal
    pub avg_net: i64,
}

/// Direction of the energy balance over a window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Deficit,
    Surplus,
}

impl Stats {
    pub fn trend(&self) -> Trend {
        if self.weight_change_kg < 0.0 {
            Trend::Deficit
        } else {
            Trend::Surplus
        }
    }
}

/// One point of the intake/burn/net history chart
#[derive(Clone, Debug, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub intake: f64,
    pub burn: f64,
    pub net: f64,
}

/// Logs whose date is among the `window_size` most recent distinct dates
///
/// Preserves the input order. A window larger than the history simply
/// selects everything.
pub fn recent_window(logs: &[DailyLog], window_size: usize) -> Vec<&DailyLog> {
    let dates: BTreeSet<NaiveDate> = logs.iter().map(|log| log.date).collect();
    let selected: HashSet<NaiveDate> = dates.into_iter().rev().take(window_size).collect();

    logs.iter()
        .filter(|log| selected.contains(&log.date))
        .collect()
}

/// Compute window statistics, `None` when the window holds no logs
pub fn aggregate(logs: &[DailyLog], window_size: usize) -> Option<Stats> {
    let window = recent_window(logs, window_size);
    if window.is_empty() {
        return None;
    }

    let count = window.len() as f64;
    let total_net: f64 = window.iter().map(|log| log.net_calories).sum();
    let total_intake: f64 = window.iter().map(|log| log.intake.calories).sum();
    let total_burn: f64 = window.iter().map(|log| log.total_burned).sum();

    Some(Stats {
        days: window.len(),
        total_net,
        weight_change_kg: projected_weight_change_kg(total_net),
        avg_calories: (total_intake / count).round() as i64,
        avg_burn: (total_burn / count).round() as i64,
        avg_net: (total_net / count).round() as i64,
    })
}

/// Chart series for the window, oldest date first
pub fn daily_series(logs: &[DailyLog], window_size: usize) -> Vec<DailyPoint> {
    let mut points: Vec<DailyPoint> = recent_window(logs, window_size)
        .into_iter()
        .map(|log| DailyPoint {
            date: log.date,
            intake: log.intake.calories,
            burn: log.total_burned,
            net: log.net_calories,
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}
