//! Read model handed to the renderer.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::derive::{classify_motivation, daily_tip, derive_status, Adherence};
use super::Tracker;
use crate::models::time_format::hhmm;
use crate::models::{DoseStatus, HistoryRecord, MedicationEntry, MedicationForm, Motivation};

/// One line of today's schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRow {
    pub id: String,
    pub name: String,
    pub form: MedicationForm,
    pub form_label: &'static str,
    pub icon: &'static str,
    pub dosage: Option<String>,
    #[serde(with = "hhmm")]
    pub scheduled_time: NaiveTime,
    pub taken: bool,
    pub status: DoseStatus,
    pub status_label: &'static str,
}

impl ScheduleRow {
    fn new(entry: &MedicationEntry, now: NaiveTime) -> Self {
        let status = derive_status(entry, now);
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            form: entry.form,
            form_label: entry.form.label(),
            icon: entry.form.icon(),
            dosage: entry.dosage.clone(),
            scheduled_time: entry.scheduled_time,
            taken: entry.taken,
            status,
            status_label: status.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current: u32,
    pub best: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotivationView {
    pub tier: Motivation,
    pub headline: &'static str,
}

/// A history record with its form icon resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRow {
    #[serde(flatten)]
    pub record: HistoryRecord,
    pub icon: &'static str,
}

/// The most recent history records, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub records: Vec<HistoryRow>,
    /// Total number of records in the session.
    pub total: usize,
    /// Whether older records were left out.
    pub truncated: bool,
}

/// Everything the page needs to draw itself.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub date: NaiveDate,
    pub schedule: Vec<ScheduleRow>,
    pub adherence: Adherence,
    pub streaks: StreakSummary,
    /// Present only while the motivation panel is visible.
    pub motivation: Option<MotivationView>,
    pub history: HistoryView,
    pub tip: &'static str,
}

impl Tracker {
    /// Bounded history log, newest first.
    pub fn recent_history(&self, limit: usize) -> HistoryView {
        let history = &self.state().history;
        let records = history
            .iter()
            .rev()
            .take(limit)
            .map(|record| HistoryRow {
                record: record.clone(),
                icon: record.form.icon(),
            })
            .collect();
        HistoryView {
            records,
            total: history.len(),
            truncated: history.len() > limit,
        }
    }

    pub const fn streaks(&self) -> StreakSummary {
        StreakSummary {
            current: self.state().current_streak,
            best: self.state().best_streak,
        }
    }

    /// Derive the full dashboard at the clock's current time.
    pub fn view(&self, history_limit: usize) -> DashboardView {
        let now = self.clock().now();
        let state = self.state();
        let adherence = self.adherence();

        let motivation = state.motivation_visible.then(|| {
            let tier = classify_motivation(adherence.percentage);
            MotivationView {
                tier,
                headline: tier.headline(),
            }
        });

        DashboardView {
            date: now.date(),
            schedule: state
                .medications
                .iter()
                .map(|m| ScheduleRow::new(m, now.time()))
                .collect(),
            adherence,
            streaks: self.streaks(),
            motivation,
            history: self.recent_history(history_limit),
            tip: daily_tip(now.date()),
        }
    }
}
