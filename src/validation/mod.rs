//! Input validation for incoming impressions.
//!
//! Every field that crosses the HTTP trust boundary is checked here, before
//! either store is touched. All failures are collected so the caller can
//! fix the whole request in one round trip.

use std::fmt;

use serde::Serialize;

use crate::model::{parse_timestamp, Impression, ImpressionRequest, ARCHIVE_KEY_SUFFIX};

/// Length limits for validated fields.
pub mod limits {
    /// S3 object keys are capped at 1024 bytes; the archive key adds `.json`.
    pub const MAX_IMPRESSION_ID_BYTES: usize = 1024 - super::ARCHIVE_KEY_SUFFIX.len();
    /// Upper bound on campaign id length.
    pub const MAX_CAMPAIGN_ID_BYTES: usize = 1024;
}

/// Field names as they appear on the wire.
pub mod fields {
    pub const IMPRESSION_ID: &str = "impressionId";
    pub const CAMPAIGN_ID: &str = "campaignId";
    pub const TIMESTAMP: &str = "timestamp";
}

/// Error constants for validation failures.
pub mod errmsg {
    pub const REQUIRED: &str = "field is required";
    pub const BLANK: &str = "field cannot be blank";
    pub const TOO_LONG: &str = "field exceeds maximum length";
    pub const TIMESTAMP_INVALID: &str =
        "timestamp must be an ISO-8601 date-time with a timezone offset";
}

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// One or more invalid fields. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Names of the offending fields, in check order.
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid impression: ")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Check a required identifier, returning it when usable.
    fn identifier(
        &mut self,
        field: &'static str,
        value: Option<String>,
        max_bytes: usize,
    ) -> Option<String> {
        let Some(value) = value else {
            self.push(field, errmsg::REQUIRED);
            return None;
        };
        if value.trim().is_empty() {
            self.push(field, errmsg::BLANK);
            return None;
        }
        if value.len() > max_bytes {
            self.push(
                field,
                format!("{} (max: {}, got: {})", errmsg::TOO_LONG, max_bytes, value.len()),
            );
            return None;
        }
        Some(value)
    }
}

/// Validate an impression request.
///
/// Rules:
/// - `impressionId` and `campaignId` must be present and not blank
/// - `impressionId` must fit in an S3 key once `.json` is appended
/// - `timestamp` must be present and parse as RFC 3339 with an offset
/// - `location` is unconstrained and may be absent
pub fn validate_impression(request: ImpressionRequest) -> Result<Impression, ValidationErrors> {
    let mut collector = Collector::default();

    let impression_id = collector.identifier(
        fields::IMPRESSION_ID,
        request.impression_id,
        limits::MAX_IMPRESSION_ID_BYTES,
    );
    let campaign_id = collector.identifier(
        fields::CAMPAIGN_ID,
        request.campaign_id,
        limits::MAX_CAMPAIGN_ID_BYTES,
    );

    let timestamp = match request.timestamp {
        None => {
            collector.push(fields::TIMESTAMP, errmsg::REQUIRED);
            None
        }
        Some(raw) if raw.trim().is_empty() => {
            collector.push(fields::TIMESTAMP, errmsg::BLANK);
            None
        }
        Some(raw) => match parse_timestamp(&raw) {
            Ok(ts) => Some(ts),
            Err(e) => {
                collector.push(fields::TIMESTAMP, format!("{}: {}", errmsg::TIMESTAMP_INVALID, e));
                None
            }
        },
    };

    match (impression_id, campaign_id, timestamp) {
        (Some(impression_id), Some(campaign_id), Some(timestamp)) => Ok(Impression {
            impression_id,
            campaign_id,
            timestamp,
            location: request.location,
        }),
        _ => Err(ValidationErrors {
            errors: collector.errors,
        }),
    }
}
