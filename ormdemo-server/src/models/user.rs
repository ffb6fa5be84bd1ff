//! User input validation

use super::ValidationError;

/// Maximum length for user names
const MAX_NAME_LEN: usize = 128;

/// Accepted age range (inclusive)
const MIN_AGE: i32 = 0;
const MAX_AGE: i32 = 150;

/// Validated user name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    /// Create a new user name.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 128 characters
    ///
    /// # Example
    /// ```
    /// use ormdemo_server::models::UserName;
    ///
    /// assert!(UserName::new("Alice").is_ok());
    /// assert!(UserName::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }

        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validated age in years
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age(i32);

impl Age {
    pub fn new(years: i32) -> Result<Self, ValidationError> {
        if !(MIN_AGE..=MAX_AGE).contains(&years) {
            return Err(Self::range_error());
        }
        Ok(Self(years))
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// Error for an age outside the accepted range
    pub fn range_error() -> ValidationError {
        ValidationError::OutOfRange {
            field: "age",
            min: MIN_AGE as i64,
            max: MAX_AGE as i64,
        }
    }
}

/// Amount a bulk increment adds to ages; negative decrements.
///
/// Bounded by the width of the age range, so `age + step` cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeStep(i32);

impl AgeStep {
    pub fn new(by: i32) -> Result<Self, ValidationError> {
        let span = MAX_AGE - MIN_AGE;
        if !(-span..=span).contains(&by) {
            return Err(ValidationError::OutOfRange {
                field: "by",
                min: -(span as i64),
                max: span as i64,
            });
        }
        Ok(Self(by))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

/// A user ready to insert
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: UserName,
    pub age: Age,
    /// Existing file to link as the user's head picture
    pub head_id: Option<i32>,
}

impl NewUser {
    pub fn new(name: &str, age: i32, head_id: Option<i32>) -> Result<Self, ValidationError> {
        if let Some(id) = head_id {
            if id <= 0 {
                return Err(ValidationError::OutOfRange {
                    field: "head_id",
                    min: 1,
                    max: i32::MAX as i64,
                });
            }
        }

        Ok(Self {
            name: UserName::new(name)?,
            age: Age::new(age)?,
            head_id,
        })
    }
}

/// Partial update of a user's own columns
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<UserName>,
    pub age: Option<Age>,
}

impl UserChanges {
    /// Validate the provided fields. At least one must be present.
    pub fn new(name: Option<&str>, age: Option<i32>) -> Result<Self, ValidationError> {
        let changes = Self {
            name: name.map(UserName::new).transpose()?,
            age: age.map(Age::new).transpose()?,
        };

        if changes.is_empty() {
            return Err(ValidationError::NothingToUpdate);
        }

        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none()
    }
}
