/// Habit entity and related functionality
///
/// This module defines the core Habit struct that represents something a
/// user wants to do regularly, along with its validation rules.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::domain::{Category, DomainError, Frequency, GoalType, HabitId, UserId};

/// A habit represents something the user wants to do regularly
///
/// Completion history is kept separately as `HabitCompletion` records, one
/// per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Owning user
    pub user_id: UserId,
    /// Display name (e.g., "Morning Run", "Read for 30min")
    pub name: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// Category for organization (health, fitness, etc.)
    pub category: Category,
    /// How often this habit should be performed
    pub frequency: Frequency,
    /// Boolean completion or numeric daily target
    pub goal: GoalType,
    /// First day the habit counts toward completion rates
    pub start_date: NaiveDate,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// Whether this habit is currently active (can be paused)
    pub is_active: bool,
}

/// Optional changes to an existing habit
#[derive(Debug, Default, Clone)]
pub struct HabitUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub category: Option<Category>,
    pub frequency: Option<Frequency>,
    pub goal: Option<GoalType>,
    pub is_active: Option<bool>,
}

impl Habit {
    /// Create a new habit with validation
    ///
    /// The start date defaults to the creation day.
    pub fn new(
        user_id: UserId,
        name: String,
        description: Option<String>,
        category: Category,
        frequency: Frequency,
        goal: GoalType,
    ) -> Result<Self, DomainError> {
        let name = name.trim().to_string();
        Self::validate_name(&name)?;
        Self::validate_description(&description)?;
        frequency.validate()?;
        goal.validate()?;

        let created_at = Utc::now();
        Ok(Self {
            id: HabitId::new(),
            user_id,
            name,
            description,
            category,
            frequency,
            goal,
            start_date: created_at.date_naive(),
            created_at,
            is_active: true,
        })
    }

    /// Backdate (or postpone) the day the habit starts counting
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    /// Update the habit's properties with validation
    ///
    /// Every new value is validated before any field is modified.
    pub fn update(&mut self, changes: HabitUpdate) -> Result<(), DomainError> {
        let name = changes.name.map(|n| n.trim().to_string());
        if let Some(ref new_name) = name {
            Self::validate_name(new_name)?;
        }
        if let Some(ref new_desc) = changes.description {
            Self::validate_description(new_desc)?;
        }
        if let Some(ref new_freq) = changes.frequency {
            new_freq.validate()?;
        }
        if let Some(ref new_goal) = changes.goal {
            new_goal.validate()?;
        }

        if let Some(new_name) = name {
            self.name = new_name;
        }
        if let Some(new_description) = changes.description {
            self.description = new_description;
        }
        if let Some(new_category) = changes.category {
            self.category = new_category;
        }
        if let Some(new_frequency) = changes.frequency {
            self.frequency = new_frequency;
        }
        if let Some(new_goal) = changes.goal {
            self.goal = new_goal;
        }
        if let Some(new_is_active) = changes.is_active {
            self.is_active = new_is_active;
        }

        Ok(())
    }

    /// Whether the habit should be done on `date`
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.is_active && date >= self.start_date && self.frequency.is_scheduled_for_date(date)
    }

    /// Get a display string for a numeric target (e.g., "8 glasses")
    pub fn target_display(&self) -> Option<String> {
        match &self.goal {
            GoalType::Numeric { target, unit: Some(unit) } => Some(format!("{} {}", target, unit)),
            GoalType::Numeric { target, unit: None } => Some(target.to_string()),
            GoalType::Boolean => None,
        }
    }

    fn validate_name(name: &str) -> Result<(), DomainError> {
        if name.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string()
            ));
        }

        if name.len() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string()
            ));
        }

        Ok(())
    }

    fn validate_description(description: &Option<String>) -> Result<(), DomainError> {
        if let Some(desc) = description {
            if desc.len() > 500 {
                return Err(DomainError::Validation {
                    message: "Description cannot be longer than 500 characters".to_string()
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn water_habit() -> Habit {
        Habit::new(
            UserId::new(),
            "  Drink Water ".to_string(),
            Some("Stay hydrated".to_string()),
            Category::Health,
            Frequency::Daily,
            GoalType::Numeric { target: 8.0, unit: Some("glasses".to_string()) },
        )
        .unwrap()
    }

    #[test]
    fn test_create_valid_habit() {
        let habit = water_habit();

        assert_eq!(habit.name, "Drink Water");
        assert_eq!(habit.category, Category::Health);
        assert!(habit.is_active);
        assert_eq!(habit.start_date, habit.created_at.date_naive());
        assert_eq!(habit.target_display(), Some("8 glasses".to_string()));
    }

    #[test]
    fn test_invalid_habit_name() {
        let result = Habit::new(
            UserId::new(),
            "   ".to_string(),
            None,
            Category::Health,
            Frequency::Daily,
            GoalType::Boolean,
        );

        assert!(matches!(result, Err(DomainError::InvalidHabitName(_))));
    }

    #[test]
    fn test_update_rejects_invalid_frequency_without_partial_changes() {
        let mut habit = water_habit();
        let changes = HabitUpdate {
            name: Some("Hydrate".to_string()),
            frequency: Some(Frequency::TimesPerWeek(9)),
            ..Default::default()
        };

        assert!(habit.update(changes).is_err());
        assert_eq!(habit.name, "Drink Water");
    }

    #[test]
    fn test_is_due_on_respects_start_and_schedule() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let habit = Habit::new(
            UserId::new(),
            "Gym".to_string(),
            None,
            Category::Fitness,
            Frequency::SpecificDays(vec![Weekday::Mon, Weekday::Wed]),
            GoalType::Boolean,
        )
        .unwrap()
        .with_start_date(monday);

        assert!(habit.is_due_on(monday));
        assert!(!habit.is_due_on(monday.succ_opt().unwrap()));
        assert!(!habit.is_due_on(monday.pred_opt().unwrap()));
    }
}
