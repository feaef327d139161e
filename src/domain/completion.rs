/// HabitCompletion entity for tracking habit completions
///
/// This module defines the record of a habit on a specific day: whether it
/// was completed, plus an optional amount and notes.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::domain::{CompletionId, DomainError, HabitId};

/// How far back a completion may be logged
pub const MAX_BACKFILL_DAYS: i64 = 365;

/// A habit's record for one calendar day
///
/// There is at most one record per habit and day. Completing the same day
/// again updates this record in place instead of adding another one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletion {
    /// Unique identifier for this record
    pub id: CompletionId,
    /// Which habit this record is for
    pub habit_id: HabitId,
    /// Which day this record is for
    pub date: NaiveDate,
    /// Whether the habit counts as done on this day
    pub completed: bool,
    /// Amount achieved, for numeric goals
    pub value: Option<f64>,
    /// User's notes about this day
    pub notes: Option<String>,
    /// When this record was last written
    pub logged_at: DateTime<Utc>,
}

impl HabitCompletion {
    /// Create a completed record for `date` with validation
    pub fn new(
        habit_id: HabitId,
        date: NaiveDate,
        value: Option<f64>,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        Self::validate_date(&date)?;
        Self::validate_value(&value)?;
        Self::validate_notes(&notes)?;

        Ok(Self {
            id: CompletionId::new(),
            habit_id,
            date,
            completed: true,
            value,
            notes,
            logged_at: Utc::now(),
        })
    }

    /// Re-complete an existing day in place
    ///
    /// A new value or note replaces the old one; omitted ones are kept.
    pub fn mark_completed(&mut self, value: Option<f64>, notes: Option<String>) -> Result<(), DomainError> {
        Self::validate_value(&value)?;
        Self::validate_notes(&notes)?;

        self.completed = true;
        if value.is_some() {
            self.value = value;
        }
        if notes.is_some() {
            self.notes = notes;
        }
        self.logged_at = Utc::now();
        Ok(())
    }

    /// Flag the day as not done, keeping its value and notes
    pub fn mark_uncompleted(&mut self) {
        self.completed = false;
        self.logged_at = Utc::now();
    }

    /// Check if this record has notes
    pub fn has_notes(&self) -> bool {
        self.notes.as_ref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Completion dates may not be in the future or more than a year back
    fn validate_date(date: &NaiveDate) -> Result<(), DomainError> {
        let today = Utc::now().date_naive();

        if *date > today {
            return Err(DomainError::InvalidDate(
                "Cannot complete habits for future dates".to_string()
            ));
        }

        let earliest = today - chrono::Duration::days(MAX_BACKFILL_DAYS);
        if *date < earliest {
            return Err(DomainError::InvalidDate(
                "Cannot complete habits more than 1 year in the past".to_string()
            ));
        }

        Ok(())
    }

    fn validate_value(value: &Option<f64>) -> Result<(), DomainError> {
        if let Some(val) = value {
            if !val.is_finite() || *val < 0.0 {
                return Err(DomainError::InvalidValue {
                    message: "Value must be a non-negative number".to_string()
                });
            }
            if *val > 100_000.0 {
                return Err(DomainError::InvalidValue {
                    message: "Value cannot exceed 100000".to_string()
                });
            }
        }
        Ok(())
    }

    fn validate_notes(notes: &Option<String>) -> Result<(), DomainError> {
        if let Some(note_text) = notes {
            if note_text.len() > 500 {
                return Err(DomainError::InvalidValue {
                    message: "Notes cannot be longer than 500 characters".to_string()
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_valid_completion() {
        let habit_id = HabitId::new();
        let today = Utc::now().date_naive();

        let completion = HabitCompletion::new(
            habit_id.clone(),
            today,
            Some(6.0),
            Some("Felt great today!".to_string()),
        )
        .unwrap();

        assert_eq!(completion.habit_id, habit_id);
        assert_eq!(completion.date, today);
        assert!(completion.completed);
        assert_eq!(completion.value, Some(6.0));
        assert!(completion.has_notes());
    }

    #[test]
    fn test_future_and_ancient_dates_invalid() {
        let today = Utc::now().date_naive();

        let future = HabitCompletion::new(HabitId::new(), today + chrono::Duration::days(1), None, None);
        assert!(matches!(future, Err(DomainError::InvalidDate(_))));

        let ancient = HabitCompletion::new(HabitId::new(), today - chrono::Duration::days(400), None, None);
        assert!(matches!(ancient, Err(DomainError::InvalidDate(_))));
    }

    #[test]
    fn test_mark_completed_keeps_omitted_fields() {
        let today = Utc::now().date_naive();
        let mut completion = HabitCompletion::new(HabitId::new(), today, Some(3.0), Some("first".to_string())).unwrap();
        completion.mark_uncompleted();
        assert!(!completion.completed);

        completion.mark_completed(None, None).unwrap();
        assert!(completion.completed);
        assert_eq!(completion.value, Some(3.0));
        assert_eq!(completion.notes.as_deref(), Some("first"));

        completion.mark_completed(Some(5.0), None).unwrap();
        assert_eq!(completion.value, Some(5.0));
        assert!(completion.mark_completed(Some(-1.0), None).is_err());
    }
}
