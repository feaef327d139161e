/// User accounts that own habits and workouts

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{DomainError, UserId};

/// Units a user records set weights in
pub const WEIGHT_UNITS: [&str; 2] = ["kg", "lb"];

/// A user profile
///
/// Every habit and workout belongs to exactly one user. Credentials are not
/// stored here; callers identify themselves by user ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique login-style handle
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    /// "kg" or "lb"
    pub weight_unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user may change
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub weight_unit: Option<String>,
}

impl User {
    /// Create a new user with validation
    pub fn new(
        username: String,
        display_name: Option<String>,
        email: Option<String>,
        weight_unit: Option<String>,
    ) -> Result<Self, DomainError> {
        let username = username.trim().to_string();
        Self::validate_username(&username)?;

        let display_name = display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.clone());
        Self::validate_display_name(&display_name)?;

        let email = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        Self::validate_email(&email)?;

        let weight_unit = weight_unit.unwrap_or_else(|| "kg".to_string()).trim().to_lowercase();
        Self::validate_weight_unit(&weight_unit)?;

        let now = Utc::now();
        Ok(Self {
            id: UserId::new(),
            username,
            display_name,
            email,
            weight_unit,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply profile changes, validating all of them before touching any field
    pub fn update(&mut self, changes: UserUpdate) -> Result<(), DomainError> {
        let display_name = changes.display_name.map(|n| n.trim().to_string());
        if let Some(ref name) = display_name {
            Self::validate_display_name(name)?;
        }

        let email = changes.email.map(|e| e.trim().to_string());
        if let Some(ref email) = email {
            if !email.is_empty() {
                Self::validate_email(&Some(email.clone()))?;
            }
        }

        let weight_unit = changes.weight_unit.map(|u| u.trim().to_lowercase());
        if let Some(ref unit) = weight_unit {
            Self::validate_weight_unit(unit)?;
        }

        if let Some(name) = display_name {
            self.display_name = name;
        }
        if let Some(email) = email {
            // An empty string clears the email
            self.email = if email.is_empty() { None } else { Some(email) };
        }
        if let Some(unit) = weight_unit {
            self.weight_unit = unit;
        }
        self.updated_at = Utc::now();

        Ok(())
    }

    fn validate_username(username: &str) -> Result<(), DomainError> {
        if username.len() < 3 || username.len() > 30 {
            return Err(DomainError::Validation {
                message: "Username must be 3-30 characters".to_string(),
            });
        }
        if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DomainError::Validation {
                message: "Username may only contain letters, digits and underscores".to_string(),
            });
        }
        Ok(())
    }

    fn validate_display_name(name: &str) -> Result<(), DomainError> {
        if name.is_empty() || name.len() > 100 {
            return Err(DomainError::Validation {
                message: "Display name must be 1-100 characters".to_string(),
            });
        }
        Ok(())
    }

    fn validate_email(email: &Option<String>) -> Result<(), DomainError> {
        if let Some(email) = email {
            let valid = match email.split_once('@') {
                Some((local, domain)) => !local.is_empty() && domain.contains('.'),
                None => false,
            };
            if !valid || email.len() > 254 {
                return Err(DomainError::Validation {
                    message: format!("Invalid email address '{}'", email),
                });
            }
        }
        Ok(())
    }

    fn validate_weight_unit(unit: &str) -> Result<(), DomainError> {
        if !WEIGHT_UNITS.contains(&unit) {
            return Err(DomainError::Validation {
                message: format!("Weight unit must be one of {:?}", WEIGHT_UNITS),
            });
        }
        Ok(())
    }
}
