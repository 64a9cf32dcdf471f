use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use aws_sdk_s3::primitives::DateTime as SmithyDateTime;
use aws_sdk_s3::types::{DeleteMarkerEntry, Object, ObjectVersion};
use aws_smithy_types_convert::date_time::DateTimeExt;
use chrono::{DateTime, Utc};
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

use crate::types::error::S3cleanerError;

pub mod error;
pub mod token;

/// One entry of a bucket inventory.
///
/// Records are immutable once built. A record without `version_id` is the
/// current, unversioned object and is never flagged as the latest version.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    key: String,
    last_modified: DateTime<Utc>,
    version_id: Option<String>,
    is_latest_version: bool,
    is_delete_marker: bool,
    size: i64,
}

impl ObjectRecord {
    /// A current object as returned by a plain (non-versioned) listing.
    pub fn current(key: impl Into<String>, last_modified: DateTime<Utc>, size: i64) -> Result<Self> {
        Self::build(key.into(), last_modified, None, false, false, size)
    }

    /// One version of a key as returned by a version listing.
    ///
    /// `is_latest` is the service's own marker. An empty `version_id`
    /// yields a current-object record.
    pub fn version(
        key: impl Into<String>,
        version_id: impl Into<String>,
        is_latest: bool,
        last_modified: DateTime<Utc>,
        size: i64,
    ) -> Result<Self> {
        Self::build(
            key.into(),
            last_modified,
            Some(version_id.into()),
            is_latest,
            false,
            size,
        )
    }

    /// A delete marker as returned by a version listing.
    pub fn delete_marker(
        key: impl Into<String>,
        version_id: impl Into<String>,
        is_latest: bool,
        last_modified: DateTime<Utc>,
    ) -> Result<Self> {
        Self::build(
            key.into(),
            last_modified,
            Some(version_id.into()),
            is_latest,
            true,
            0,
        )
    }

    fn build(
        key: String,
        last_modified: DateTime<Utc>,
        version_id: Option<String>,
        is_latest: bool,
        is_delete_marker: bool,
        size: i64,
    ) -> Result<Self> {
        if key.is_empty() {
            return Err(anyhow!("object key must not be empty."));
        }

        let version_id = version_id.filter(|v| !v.is_empty());
        let is_latest_version = version_id.is_some() && is_latest;
        let is_delete_marker = version_id.is_some() && is_delete_marker;

        Ok(Self {
            key,
            last_modified,
            version_id,
            is_latest_version,
            is_delete_marker,
            size,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn last_modified(&self) -> &DateTime<Utc> {
        &self.last_modified
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    pub fn is_latest_version(&self) -> bool {
        self.is_latest_version
    }

    pub fn is_delete_marker(&self) -> bool {
        self.is_delete_marker
    }

    pub fn size(&self) -> i64 {
        self.size
    }
}

fn to_chrono(last_modified: Option<&SmithyDateTime>) -> DateTime<Utc> {
    last_modified
        .and_then(|t| t.to_chrono_utc().ok())
        .unwrap_or_default()
}

impl TryFrom<&Object> for ObjectRecord {
    type Error = anyhow::Error;

    fn try_from(object: &Object) -> Result<Self> {
        ObjectRecord::current(
            object.key().unwrap_or_default(),
            to_chrono(object.last_modified()),
            object.size().unwrap_or(0),
        )
    }
}

impl TryFrom<&ObjectVersion> for ObjectRecord {
    type Error = anyhow::Error;

    fn try_from(version: &ObjectVersion) -> Result<Self> {
        ObjectRecord::version(
            version.key().unwrap_or_default(),
            version.version_id().unwrap_or_default(),
            version.is_latest().unwrap_or(false),
            to_chrono(version.last_modified()),
            version.size().unwrap_or(0),
        )
    }
}

impl TryFrom<&DeleteMarkerEntry> for ObjectRecord {
    type Error = anyhow::Error;

    fn try_from(marker: &DeleteMarkerEntry) -> Result<Self> {
        ObjectRecord::delete_marker(
            marker.key().unwrap_or_default(),
            marker.version_id().unwrap_or_default(),
            marker.is_latest().unwrap_or(false),
            to_chrono(marker.last_modified()),
        )
    }
}

/// Cursor for the next listing page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageToken {
    /// ListObjectsV2 continuation token.
    Continuation(String),
    /// ListObjectVersions key / version-id marker pair.
    VersionMarker {
        key_marker: String,
        version_id_marker: Option<String>,
    },
}

/// One page of a listing. `next` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub records: Vec<ObjectRecord>,
    pub next: Option<PageToken>,
}

/// What the service reported for a single successful delete request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteObjectResult {
    /// The request produced a delete marker instead of removing data.
    pub delete_marker_created: bool,
    /// Version id the service returned (the new marker's id for unversioned deletes).
    pub version_id: Option<String>,
}

/// Per-item result of a deletion batch, in the same position as its input.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionOutcome {
    pub key: String,
    pub version_id: Option<String>,
    pub succeeded: bool,
    pub error: Option<S3cleanerError>,
    pub delete_marker_created: bool,
    pub already_absent: bool,
}

impl DeletionOutcome {
    pub fn deleted(record: &ObjectRecord, result: &DeleteObjectResult) -> Self {
        Self {
            key: record.key().to_string(),
            version_id: record.version_id().map(|v| v.to_string()),
            succeeded: true,
            error: None,
            delete_marker_created: result.delete_marker_created,
            already_absent: false,
        }
    }

    pub fn already_absent(record: &ObjectRecord) -> Self {
        Self {
            key: record.key().to_string(),
            version_id: record.version_id().map(|v| v.to_string()),
            succeeded: true,
            error: None,
            delete_marker_created: false,
            already_absent: true,
        }
    }

    pub fn failed(record: &ObjectRecord, error: S3cleanerError) -> Self {
        Self {
            key: record.key().to_string(),
            version_id: record.version_id().map(|v| v.to_string()),
            succeeded: false,
            error: Some(error),
            delete_marker_created: false,
            already_absent: false,
        }
    }
}

/// AWS configuration file locations.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigLocation {
    pub aws_config_file: Option<PathBuf>,
    pub aws_shared_credentials_file: Option<PathBuf>,
}

/// How the connection obtains its credentials.
#[derive(Debug, Clone)]
pub enum S3Credentials {
    Profile(String),
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

impl S3Credentials {
    /// An empty profile name means the ambient credential chain.
    pub fn from_profile(profile: &str) -> Self {
        if profile.is_empty() {
            S3Credentials::FromEnvironment
        } else {
            S3Credentials::Profile(profile.to_string())
        }
    }
}

/// AWS access key pair, cleared from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys = f.debug_struct("AccessKeys");
        let session_token = self
            .session_token
            .as_ref()
            .map_or("None", |_| "** redacted **");
        keys.field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &session_token);
        keys.finish()
    }
}
