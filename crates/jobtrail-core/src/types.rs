//! Shared types used across jobtrail.
//!
//! Newtypes here give the site identifiers, storage keys and record
//! timestamps a single validated representation.

use crate::error::JobtrailError;
use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for job-listing site identifiers with validation.
///
/// Site IDs are lowercase alphanumeric with hyphens, 2-32 characters
/// (`linkedin`, `xing`, `stepstone`, `indeed`). They serialize as plain
/// strings so they can key a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteId(String);

impl SiteId {
    /// Create a new `SiteId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self, JobtrailError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), JobtrailError> {
        static SITE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = SITE_REGEX
            .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,30}[a-z0-9]$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(JobtrailError::Validation(format!(
                "invalid site ID: must be 2-32 lowercase alphanumeric characters or hyphens, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SiteId {
    type Error = JobtrailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SiteId> for String {
    fn from(id: SiteId) -> Self {
        id.0
    }
}

impl std::str::FromStr for SiteId {
    type Err = JobtrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Canonical storage key of a job record: `job_<site-local id>`.
///
/// The key depends on the site-local identifier only, so the same identifier
/// surfaced by two sites addresses one record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobKey(String);

impl JobKey {
    /// Prefix shared by every job record key.
    pub const PREFIX: &'static str = "job_";

    /// Derive the key for a site-local identifier.
    ///
    /// # Errors
    /// Returns error if the identifier is empty after trimming.
    pub fn from_local_id(local_id: &str) -> Result<Self, JobtrailError> {
        let local_id = local_id.trim();
        if local_id.is_empty() {
            return Err(JobtrailError::Validation(
                "job key requires a non-empty local id".to_string(),
            ));
        }
        Ok(Self(format!("{}{local_id}", Self::PREFIX)))
    }

    /// Parse a raw stored key, checking the `job_` prefix.
    ///
    /// # Errors
    /// Returns error if the prefix is missing or nothing follows it.
    pub fn parse(raw: &str) -> Result<Self, JobtrailError> {
        match raw.strip_prefix(Self::PREFIX) {
            Some(rest) if !rest.is_empty() => Ok(Self(raw.to_string())),
            _ => Err(JobtrailError::Validation(format!(
                "invalid job key: expected '{}<id>', got '{raw}'",
                Self::PREFIX
            ))),
        }
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The site-local identifier this key was derived from.
    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.0[Self::PREFIX.len()..]
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for JobKey {
    type Error = JobtrailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<JobKey> for String {
    fn from(key: JobKey) -> Self {
        key.0
    }
}

/// Timestamp wrapper with millisecond persistence.
///
/// Serializes as milliseconds since the Unix epoch, the representation
/// records carry in their `savedAt` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(#[serde(with = "chrono::serde::ts_milliseconds")] DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Create a timestamp from milliseconds since the Unix epoch.
    ///
    /// # Errors
    /// Returns error if the value is out of chrono's representable range.
    pub fn from_millis(millis: i64) -> Result<Self, JobtrailError> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(Self)
            .ok_or_else(|| JobtrailError::Validation(format!("invalid timestamp millis: {millis}")))
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get milliseconds since Unix epoch.
    #[must_use]
    pub fn millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
