//! The durable job record and its merge rule.

use jobtrail_core::{SiteId, Timestamp};
use jobtrail_sites::JobDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Merged, multi-site view of one job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Title from the most recent capture
    #[serde(default)]
    pub title: String,
    /// Company from the most recent capture
    #[serde(default)]
    pub company: String,
    /// Location from the most recent capture
    #[serde(default)]
    pub location: String,
    /// Site-local identifier per site that surfaced the job
    #[serde(default)]
    pub occurrences: BTreeMap<SiteId, String>,
    /// Time of the last write
    #[serde(rename = "savedAt")]
    pub saved_at: Timestamp,
}

impl JobRecord {
    /// Whether `site` has an occurrence on this record.
    #[must_use]
    pub fn seen_on(&self, site: &SiteId) -> bool {
        self.occurrences.contains_key(site)
    }

    /// Whether any site has an occurrence on this record.
    #[must_use]
    pub fn has_occurrences(&self) -> bool {
        !self.occurrences.is_empty()
    }

    /// Sites that surfaced this job, in name order.
    pub fn sites(&self) -> impl Iterator<Item = &SiteId> {
        self.occurrences.keys()
    }

    /// Record `site`'s sighting of this job.
    ///
    /// The occurrence for `site` is added or overwritten; other sites are kept.
    /// Non-empty descriptor fields replace the stored text.
    pub fn record_sighting(&mut self, descriptor: &JobDescriptor, local_id: &str, now: Timestamp) {
        self.occurrences
            .insert(descriptor.site.clone(), local_id.to_string());

        for (field, value) in [
            (&mut self.title, &descriptor.title),
            (&mut self.company, &descriptor.company),
            (&mut self.location, &descriptor.location),
        ] {
            if !value.is_empty() {
                field.clone_from(value);
            }
        }

        self.saved_at = now;
    }
}

/// Value stored under a job key: `{"job": JobRecord}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredJob {
    /// The record
    pub job: JobRecord,
}

impl StoredJob {
    /// Merge a sighting into an optional existing entry.
    ///
    /// Creates the record when `existing` is `None`.
    #[must_use]
    pub fn merge(
        existing: Option<Self>,
        descriptor: &JobDescriptor,
        local_id: &str,
        now: Timestamp,
    ) -> Self {
        let mut job = existing.map_or_else(
            || JobRecord {
                title: String::new(),
                company: String::new(),
                location: String::new(),
                occurrences: BTreeMap::new(),
                saved_at: now,
            },
            |entry| entry.job,
        );
        job.record_sighting(descriptor, local_id, now);
        Self { job }
    }
}
