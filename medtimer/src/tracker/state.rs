//! Session state and the operations that mutate it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::derive::{compute_adherence, Adherence, STREAK_THRESHOLD};
use super::{Clock, Notice, TrackerError, Transition};
use crate::models::{HistoryRecord, MedicationEntry, NewMedication};

/// Generate a UUIDv7 (time-ordered, globally unique).
fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Everything one session knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Today's schedule in insertion order.
    pub medications: Vec<MedicationEntry>,
    /// Taken doses in the order they were taken. Only `clear_all` shrinks it.
    pub history: Vec<HistoryRecord>,
    /// Consecutive days that closed at or above the streak threshold.
    pub current_streak: u32,
    /// Highest `current_streak` ever reached.
    pub best_streak: u32,
    /// Whether the motivation panel is shown.
    #[serde(default)]
    pub motivation_visible: bool,
}

/// Owns a `SessionState` and the clock used to timestamp it.
pub struct Tracker {
    state: SessionState,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker").field("state", &self.state).finish_non_exhaustive()
    }
}

impl Tracker {
    /// Start an empty session.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_state(SessionState::default(), clock)
    }

    /// Resume from an existing state (e.g. a restored snapshot).
    pub fn with_state(state: SessionState, clock: Arc<dyn Clock>) -> Self {
        Self { state, clock }
    }

    /// Read-only view of the current state.
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn position(&self, id: &str) -> Result<usize, TrackerError> {
        self.state
            .medications
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    /// Append a medication to today's schedule.
    pub fn add(&mut self, new: NewMedication) -> Result<Transition, TrackerError> {
        let name = new.name.trim();
        if name.is_empty() {
            debug!("Rejected medication with empty name");
            return Err(TrackerError::EmptyName);
        }

        let dosage = new
            .dosage
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        let entry = MedicationEntry::new(generate_id(), name.to_string(), new.form, new.time, dosage);
        let notice = Notice::success(format!(
            "Added {} at {}",
            entry.name,
            entry.scheduled_time.format("%I:%M %p")
        ));
        info!(id = %entry.id, name = %entry.name, form = %entry.form, "Medication added");
        self.state.medications.push(entry);

        Ok(Transition::changed(notice))
    }

    /// Mark a dose taken and log it. Repeating the call on a taken entry does nothing.
    pub fn mark_taken(&mut self, id: &str) -> Result<Transition, TrackerError> {
        let index = self.position(id)?;
        let now = self.clock.now();
        let entry = &mut self.state.medications[index];

        if entry.taken {
            return Ok(Transition::unchanged(Notice::info(format!(
                "{} is already marked taken",
                entry.name
            ))));
        }

        entry.taken = true;
        let record = HistoryRecord::capture(entry, now);
        let notice = Notice::success(format!("Marked {} as taken", entry.name));
        info!(id, name = %entry.name, "Dose marked taken");
        self.state.history.push(record);

        Ok(Transition::changed(notice))
    }

    /// Remove an entry. Its history, if any, stays.
    pub fn delete(&mut self, id: &str) -> Result<Transition, TrackerError> {
        let index = self.position(id)?;
        let entry = self.state.medications.remove(index);
        info!(id, name = %entry.name, "Medication deleted");

        Ok(Transition::changed(Notice::success(format!(
            "Removed {}",
            entry.name
        ))))
    }

    /// Current adherence, recomputed from the schedule.
    pub fn adherence(&self) -> Adherence {
        compute_adherence(&self.state.medications)
    }

    /// Close out the day: settle the streak and reset every dose to untaken.
    pub fn start_new_day(&mut self) -> Result<Transition, TrackerError> {
        if self.state.medications.is_empty() {
            return Err(TrackerError::NoMedications);
        }

        let adherence = self.adherence();
        let state = &mut self.state;
        if adherence.percentage >= STREAK_THRESHOLD {
            state.current_streak += 1;
            state.best_streak = state.best_streak.max(state.current_streak);
        } else {
            state.current_streak = 0;
        }

        for medication in &mut state.medications {
            medication.taken = false;
        }
        state.motivation_visible = false;

        info!(
            adherence = adherence.percentage,
            current_streak = state.current_streak,
            best_streak = state.best_streak,
            "New day started"
        );

        Ok(Transition::changed(Notice::success(
            "New day started! All medications reset.",
        )))
    }

    /// Wipe everything. Always succeeds.
    pub fn clear_all(&mut self) -> Transition {
        self.state = SessionState::default();
        info!("All data cleared");
        Transition::changed(Notice::warning("All data cleared!"))
    }

    /// Show or hide the motivation panel.
    pub fn toggle_motivation(&mut self) -> Transition {
        self.state.motivation_visible = !self.state.motivation_visible;
        let message = if self.state.motivation_visible {
            "Motivation shown"
        } else {
            "Motivation hidden"
        };
        Transition::changed(Notice::info(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MedicationForm;
    use crate::tracker::{FixedClock, NoticeLevel};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(12, 34, 56)
            .unwrap()
    }

    fn tracker() -> Tracker {
        Tracker::new(Arc::new(FixedClock::new(noon())))
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn add(tracker: &mut Tracker, name: &str) -> String {
        tracker
            .add(NewMedication::new(name, MedicationForm::Pill, time(8, 0)))
            .unwrap();
        tracker.state().medications.last().unwrap().id.clone()
    }

    #[test]
    fn test_add_scenario() {
        let mut t = tracker();
        let transition = t
            .add(NewMedication::new("Aspirin", MedicationForm::Pill, time(8, 0)).with_dosage("100mg"))
            .unwrap();

        assert!(transition.changed);
        assert_eq!(transition.notice.level, NoticeLevel::Success);
        assert_eq!(transition.notice.message, "Added Aspirin at 08:00 AM");

        let meds = &t.state().medications;
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].name, "Aspirin");
        assert_eq!(meds[0].scheduled_time, time(8, 0));
        assert_eq!(meds[0].form, MedicationForm::Pill);
        assert_eq!(meds[0].dosage.as_deref(), Some("100mg"));
        assert!(!meds[0].taken);
    }

    #[test]
    fn test_add_keeps_insertion_order_and_duplicates() {
        let mut t = tracker();
        for name in ["B", "A", "B", "C"] {
            add(&mut t, name);
        }
        let names: Vec<_> = t.state().medications.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "B", "C"]);
    }

    #[test]
    fn test_add_rejects_blank_names() {
        let mut t = tracker();
        add(&mut t, "Keep");

        for blank in ["", "   ", "\t\n"] {
            let err = t
                .add(NewMedication::new(blank, MedicationForm::Syrup, time(9, 0)))
                .unwrap_err();
            assert_eq!(err, TrackerError::EmptyName);
            assert_eq!(err.notice().level, NoticeLevel::Warning);
        }
        assert_eq!(t.state().medications.len(), 1);
    }

    #[test]
    fn test_add_normalizes_name_and_dosage() {
        let mut t = tracker();
        t.add(NewMedication::new("  Ibuprofen ", MedicationForm::Capsule, time(7, 5)).with_dosage("  "))
            .unwrap();
        let entry = &t.state().medications[0];
        assert_eq!(entry.name, "Ibuprofen");
        assert_eq!(entry.dosage, None);
    }

    #[test]
    fn test_mark_taken_records_history() {
        let mut t = tracker();
        t.add(NewMedication::new("Aspirin", MedicationForm::Pill, time(8, 0)).with_dosage("100mg"))
            .unwrap();
        let id = t.state().medications[0].id.clone();

        let transition = t.mark_taken(&id).unwrap();
        assert!(transition.changed);

        let state = t.state();
        assert!(state.medications[0].taken);
        assert_eq!(state.history.len(), 1);
        let record = &state.history[0];
        assert_eq!(record.medicine_name, "Aspirin");
        assert_eq!(record.scheduled, time(8, 0));
        assert_eq!(record.dosage, "100mg");
        assert_eq!(record.form, MedicationForm::Pill);
        assert_eq!(record.date, noon().date());
        assert_eq!(record.taken_at, noon().time());
    }

    #[test]
    fn test_mark_taken_twice_is_noop() {
        let mut t = tracker();
        let id = add(&mut t, "Aspirin");
        t.mark_taken(&id).unwrap();

        let again = t.mark_taken(&id).unwrap();
        assert!(!again.changed);
        assert_eq!(again.notice.level, NoticeLevel::Info);
        assert_eq!(t.state().history.len(), 1);
    }

    #[test]
    fn test_unknown_id_leaves_state_alone() {
        let mut t = tracker();
        add(&mut t, "Aspirin");
        let before = t.state().clone();

        assert_eq!(
            t.mark_taken("nope").unwrap_err(),
            TrackerError::NotFound("nope".to_string())
        );
        assert!(matches!(t.delete("nope"), Err(TrackerError::NotFound(_))));
        assert_eq!(t.state(), &before);
    }

    #[test]
    fn test_delete_keeps_history_and_other_ids() {
        let mut t = tracker();
        let first = add(&mut t, "First");
        let second = add(&mut t, "Second");
        t.mark_taken(&first).unwrap();

        t.delete(&first).unwrap();

        assert_eq!(t.state().medications.len(), 1);
        assert_eq!(t.state().history.len(), 1);
        // The surviving entry is still addressable by the id it had before.
        t.mark_taken(&second).unwrap();
        let survivor = &t.state().medications[0];
        assert_eq!(survivor.id, second);
        assert!(survivor.taken);
    }

    #[test]
    fn test_adherence_scenario() {
        let mut t = tracker();
        let id = add(&mut t, "One");
        add(&mut t, "Two");
        t.mark_taken(&id).unwrap();

        let adherence = t.adherence();
        assert_eq!(adherence.taken_count, 1);
        assert_eq!(adherence.total, 2);
        assert!((adherence.percentage - 50.0).abs() < 1e-9);
        assert_eq!(
            super::super::derive::classify_motivation(adherence.percentage),
            crate::models::Motivation::Good
        );
    }

    #[test]
    fn test_new_day_requires_medications() {
        let mut t = tracker();
        t.state.current_streak = 2;
        let err = t.start_new_day().unwrap_err();
        assert_eq!(err, TrackerError::NoMedications);
        assert_eq!(err.notice().message, "Add some medicines first!");
        assert_eq!(t.state().current_streak, 2);
    }

    #[test]
    fn test_new_day_extends_streak_at_threshold() {
        let mut t = tracker();
        let ids: Vec<_> = (0..5).map(|i| add(&mut t, &format!("Med {i}"))).collect();
        for id in &ids[..4] {
            t.mark_taken(id).unwrap();
        }
        t.state.current_streak = 2;
        t.state.best_streak = 2;
        t.state.motivation_visible = true;
        let history_len = t.state().history.len();

        t.start_new_day().unwrap();

        let state = t.state();
        assert_eq!(state.current_streak, 3);
        assert_eq!(state.best_streak, 3);
        assert!(state.medications.iter().all(|m| !m.taken));
        assert_eq!(state.history.len(), history_len);
        assert!(!state.motivation_visible);
    }

    #[test]
    fn test_new_day_does_not_lower_best_streak() {
        let mut t = tracker();
        let id = add(&mut t, "Only");
        t.mark_taken(&id).unwrap();
        t.state.current_streak = 1;
        t.state.best_streak = 7;

        t.start_new_day().unwrap();

        assert_eq!(t.state().current_streak, 2);
        assert_eq!(t.state().best_streak, 7);
    }

    #[test]
    fn test_new_day_below_threshold_resets_streak() {
        let mut t = tracker();
        let id = add(&mut t, "One");
        add(&mut t, "Two");
        t.mark_taken(&id).unwrap();
        t.state.current_streak = 3;
        t.state.best_streak = 5;

        t.start_new_day().unwrap();

        assert_eq!(t.state().current_streak, 0);
        assert_eq!(t.state().best_streak, 5);
        assert_eq!(t.state().history.len(), 1);
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let mut t = tracker();
        let id = add(&mut t, "One");
        t.mark_taken(&id).unwrap();
        t.state.current_streak = 4;
        t.state.best_streak = 9;
        t.toggle_motivation();

        let transition = t.clear_all();

        assert!(transition.changed);
        assert_eq!(transition.notice.level, NoticeLevel::Warning);
        assert_eq!(t.state(), &SessionState::default());
    }

    #[test]
    fn test_toggle_motivation_flips() {
        let mut t = tracker();
        assert!(!t.state().motivation_visible);
        t.toggle_motivation();
        assert!(t.state().motivation_visible);
        t.toggle_motivation();
        assert!(!t.state().motivation_visible);
    }
}
