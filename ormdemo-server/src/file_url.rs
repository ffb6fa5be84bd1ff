//! Computed `url` field for stored files
//!
//! The URL is derived from the stored filename after a file query runs.
//! It must stay synchronous: it is computed inline while results are
//! materialized.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::repos::File;

/// Public host that serves stored files
pub const FILE_URL_BASE: &str = "http://www.xxx.com";

/// Derive the public URL of a stored file.
///
/// ```
/// use ormdemo_server::file_url::compute_url;
///
/// assert_eq!(compute_url("123.png"), "http://www.xxx.com/123.png");
/// ```
pub fn compute_url(filename: &str) -> String {
    format!("{}/{}", FILE_URL_BASE, filename)
}

/// File record with its computed URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileWithUrl {
    pub id: i32,
    pub originname: String,
    pub filename: String,
    pub size: i32,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
    pub url: String,
}

impl From<File> for FileWithUrl {
    fn from(f: File) -> Self {
        let url = compute_url(&f.filename);
        Self {
            id: f.id,
            originname: f.originname,
            filename: f.filename,
            size: f.size,
            created_time: f.created_time,
            updated_time: f.updated_time,
            url,
        }
    }
}
