//! Stored file validation
//!
//! A stored filename is a single path segment: it is substituted directly
//! into the public file URL.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for stored and original filenames
const MAX_FILENAME_LEN: usize = 255;

/// Starts with alphanumeric, then alphanumerics, dots, hyphens, underscores
static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("invalid filename regex")
});

/// Validated stored filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filename(String);

impl Filename {
    /// Create a stored filename.
    ///
    /// # Example
    /// ```
    /// use ormdemo_server::models::Filename;
    ///
    /// assert!(Filename::new("123.png").is_ok());
    /// assert!(Filename::new("../etc/passwd").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "filename" });
        }

        if s.len() > MAX_FILENAME_LEN {
            return Err(ValidationError::TooLong {
                field: "filename",
                max: MAX_FILENAME_LEN,
            });
        }

        if !FILENAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "filename",
                reason: "must be a single path segment of letters, digits, '.', '-' or '_'",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Filename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A file record ready to insert
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Name the file was uploaded with
    pub originname: String,
    /// Name the file is stored under
    pub filename: Filename,
    /// Size in bytes
    pub size: i32,
}

impl NewFile {
    pub fn new(originname: &str, filename: &str, size: i32) -> Result<Self, ValidationError> {
        let originname = originname.trim();
        if originname.is_empty() {
            return Err(ValidationError::Empty { field: "originname" });
        }
        if originname.chars().count() > MAX_FILENAME_LEN {
            return Err(ValidationError::TooLong {
                field: "originname",
                max: MAX_FILENAME_LEN,
            });
        }

        if size < 0 {
            return Err(ValidationError::OutOfRange {
                field: "size",
                min: 0,
                max: i32::MAX as i64,
            });
        }

        Ok(Self {
            originname: originname.to_owned(),
            filename: Filename::new(filename)?,
            size,
        })
    }
}
