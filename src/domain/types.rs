/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier types plus Category, Frequency, GoalType
/// and WorkoutStatus, which are shared by users, habits and workouts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, Weekday, Datelike};
use uuid::Uuid;

use crate::domain::DomainError;

/// Declares a UUID-backed identifier type
///
/// Each entity gets its own wrapper so a habit ID can't be passed where a
/// workout ID is expected.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from its string form (database or request input)
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a user account
    UserId
);

uuid_id!(
    /// Unique identifier for a habit
    HabitId
);

uuid_id!(
    /// Unique identifier for a single day's completion record
    CompletionId
);

uuid_id!(
    /// Unique identifier for a workout
    WorkoutId
);

/// Categories for organizing habits into different life areas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Sleep, diet, hydration
    Health,
    /// Training and movement habits
    Fitness,
    /// Work habits and focus routines
    Productivity,
    /// Meditation, reflection, gratitude practices
    Mindfulness,
    /// Reading, courses, skill building
    Learning,
    /// Relationship and communication habits
    Social,
    /// Money management
    Finance,
    /// Personal growth and self-care
    Personal,
    /// User-defined category with custom name
    Custom(String),
}

impl Category {
    /// Stable text form used for storage and filtering
    pub fn as_key(&self) -> String {
        match self {
            Category::Health => "health".to_string(),
            Category::Fitness => "fitness".to_string(),
            Category::Productivity => "productivity".to_string(),
            Category::Mindfulness => "mindfulness".to_string(),
            Category::Learning => "learning".to_string(),
            Category::Social => "social".to_string(),
            Category::Finance => "finance".to_string(),
            Category::Personal => "personal".to_string(),
            Category::Custom(name) => format!("custom:{}", name),
        }
    }

    /// Get the display name for this category
    pub fn display_name(&self) -> &str {
        match self {
            Category::Health => "Health",
            Category::Fitness => "Fitness",
            Category::Productivity => "Productivity",
            Category::Mindfulness => "Mindfulness",
            Category::Learning => "Learning",
            Category::Social => "Social",
            Category::Finance => "Finance",
            Category::Personal => "Personal",
            Category::Custom(name) => name,
        }
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(name) = trimmed.strip_prefix("custom:") {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::Validation {
                    message: "Custom category name cannot be empty".to_string(),
                });
            }
            return Ok(Category::Custom(name.to_string()));
        }

        match trimmed.to_lowercase().as_str() {
            "health" => Ok(Category::Health),
            "fitness" => Ok(Category::Fitness),
            "productivity" => Ok(Category::Productivity),
            "mindfulness" => Ok(Category::Mindfulness),
            "learning" => Ok(Category::Learning),
            "social" => Ok(Category::Social),
            "finance" => Ok(Category::Finance),
            "personal" => Ok(Category::Personal),
            _ => Err(DomainError::Validation {
                message: format!(
                    "Invalid category '{}'. Valid options: health, fitness, productivity, mindfulness, learning, social, finance, personal, or custom:name",
                    s
                ),
            }),
        }
    }
}

/// How often a habit should be performed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Every single day
    Daily,
    /// Specific days of the week (e.g., Monday, Wednesday, Friday)
    SpecificDays(Vec<Weekday>),
    /// A number of completions per week (1-7), on any days
    TimesPerWeek(u8),
}

impl Frequency {
    /// Validate that a frequency value is reasonable
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Frequency::TimesPerWeek(times) => {
                if *times == 0 || *times > 7 {
                    return Err(DomainError::InvalidFrequency(
                        format!("Times per week must be 1-7, got {}", times)
                    ));
                }
            }
            Frequency::SpecificDays(days) => {
                if days.is_empty() {
                    return Err(DomainError::InvalidFrequency(
                        "Specific-days frequency must name at least one day".to_string()
                    ));
                }
                if days.len() > 7 {
                    return Err(DomainError::InvalidFrequency(
                        "Specific-days frequency cannot have more than 7 days".to_string()
                    ));
                }
            }
            Frequency::Daily => {}
        }
        Ok(())
    }

    /// Check if this frequency expects the habit to be done on a given date
    ///
    /// Times-per-week habits can be done on any day, so every day counts.
    pub fn is_scheduled_for_date(&self, date: NaiveDate) -> bool {
        match self {
            Frequency::Daily | Frequency::TimesPerWeek(_) => true,
            Frequency::SpecificDays(days) => days.contains(&date.weekday()),
        }
    }

    /// Short human-readable description, e.g. "3x per week"
    pub fn describe(&self) -> String {
        match self {
            Frequency::Daily => "daily".to_string(),
            Frequency::TimesPerWeek(n) => format!("{}x per week", n),
            Frequency::SpecificDays(days) => {
                let names: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                format!("on {}", names.join(", "))
            }
        }
    }
}

impl FromStr for Frequency {
    type Err = DomainError;

    /// Parse `daily`, `weekly:<n>` or `days:mon,wed,fri`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();

        let frequency = if lowered == "daily" {
            Frequency::Daily
        } else if let Some(times) = lowered.strip_prefix("weekly:") {
            let times: u8 = times.trim().parse().map_err(|_| {
                DomainError::InvalidFrequency(format!("Invalid times per week '{}'", times))
            })?;
            Frequency::TimesPerWeek(times)
        } else if let Some(days) = lowered.strip_prefix("days:") {
            let mut parsed = Vec::new();
            for day in days.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                let weekday: Weekday = day.parse().map_err(|_| {
                    DomainError::InvalidFrequency(format!("Invalid weekday '{}'", day))
                })?;
                if !parsed.contains(&weekday) {
                    parsed.push(weekday);
                }
            }
            Frequency::SpecificDays(parsed)
        } else {
            return Err(DomainError::InvalidFrequency(format!(
                "Invalid frequency '{}'. Valid options: daily, weekly:<1-7>, days:<mon,tue,...>",
                s
            )));
        };

        frequency.validate()?;
        Ok(frequency)
    }
}

/// What counts as doing the habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalType {
    /// Done or not done
    Boolean,
    /// A numeric amount per day, e.g. 8 glasses of water
    Numeric { target: f64, unit: Option<String> },
}

impl GoalType {
    /// Validate numeric targets and units
    pub fn validate(&self) -> Result<(), DomainError> {
        if let GoalType::Numeric { target, unit } = self {
            if !target.is_finite() || *target <= 0.0 {
                return Err(DomainError::InvalidValue {
                    message: "Target value must be greater than 0".to_string()
                });
            }
            if *target > 100_000.0 {
                return Err(DomainError::InvalidValue {
                    message: "Target value cannot exceed 100000".to_string()
                });
            }
            if let Some(unit) = unit {
                let trimmed = unit.trim();
                if trimmed.is_empty() || trimmed.len() > 20 {
                    return Err(DomainError::InvalidValue {
                        message: "Unit must be 1-20 characters when specified".to_string()
                    });
                }
            }
        }
        Ok(())
    }
}

/// Lifecycle of a workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    Planned,
    Active,
    Paused,
    Completed,
}

impl WorkoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutStatus::Planned => "planned",
            WorkoutStatus::Active => "active",
            WorkoutStatus::Paused => "paused",
            WorkoutStatus::Completed => "completed",
        }
    }

    /// Active and paused workouts are "in progress"; a user may only have one
    pub fn is_in_progress(&self) -> bool {
        matches!(self, WorkoutStatus::Active | WorkoutStatus::Paused)
    }
}

impl fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planned" => Ok(WorkoutStatus::Planned),
            "active" => Ok(WorkoutStatus::Active),
            "paused" => Ok(WorkoutStatus::Paused),
            "completed" => Ok(WorkoutStatus::Completed),
            other => Err(DomainError::Validation {
                message: format!("Unknown workout status '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frequencies() {
        assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("weekly:3".parse::<Frequency>().unwrap(), Frequency::TimesPerWeek(3));
        assert_eq!(
            "days:mon, wed,fri,mon".parse::<Frequency>().unwrap(),
            Frequency::SpecificDays(vec![Weekday::Mon, Weekday::Wed, Weekday::Fri])
        );
        assert!("weekly:0".parse::<Frequency>().is_err());
        assert!("weekly:8".parse::<Frequency>().is_err());
        assert!("days:".parse::<Frequency>().is_err());
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_specific_days_schedule() {
        let freq = Frequency::SpecificDays(vec![Weekday::Mon, Weekday::Thu]);
        // 2024-01-01 was a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(freq.is_scheduled_for_date(monday));
        assert!(!freq.is_scheduled_for_date(monday.succ_opt().unwrap()));
        assert!(Frequency::TimesPerWeek(2).is_scheduled_for_date(monday));
    }

    #[test]
    fn test_category_round_trip_through_key() {
        for category in [Category::Fitness, Category::Custom("Music".to_string())] {
            assert_eq!(category.as_key().parse::<Category>().unwrap(), category);
        }
        assert!("custom:".parse::<Category>().is_err());
        assert!("gardening".parse::<Category>().is_err());
    }

    #[test]
    fn test_numeric_goal_validation() {
        assert!(GoalType::Boolean.validate().is_ok());
        assert!(GoalType::Numeric { target: 8.0, unit: Some("glasses".to_string()) }.validate().is_ok());
        assert!(GoalType::Numeric { target: 0.0, unit: None }.validate().is_err());
        assert!(GoalType::Numeric { target: 5.0, unit: Some("  ".to_string()) }.validate().is_err());
    }

    #[test]
    fn test_ids_parse_their_display_form() {
        let id = WorkoutId::new();
        assert_eq!(WorkoutId::from_string(&id.to_string()).unwrap(), id);
        assert!(HabitId::from_string("not-a-uuid").is_err());
    }
}
