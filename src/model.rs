//! Impression data model.
//!
//! `ImpressionRequest` is the unvalidated shape received at the HTTP
//! boundary. `Impression` is what survives validation and is written to
//! both stores.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationErrors};

/// Placeholder returned for impressions stored without a location.
pub const DEFAULT_LOCATION: &str = "N/A";

/// File extension appended to the impression id to form the archive key.
pub const ARCHIVE_KEY_SUFFIX: &str = ".json";

/// A validated ad impression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impression {
    pub impression_id: String,
    pub campaign_id: String,
    #[serde(with = "rfc3339")]
    pub timestamp: DateTime<FixedOffset>,
    pub location: Option<String>,
}

impl Impression {
    /// Object key under which the archived copy is stored.
    pub fn archive_key(&self) -> String {
        format!("{}{}", self.impression_id, ARCHIVE_KEY_SUFFIX)
    }

    /// Location, or `None` if absent or empty.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.is_empty())
    }

    /// Fill a missing or empty location with [`DEFAULT_LOCATION`].
    ///
    /// Only applied on the read path. Stored records keep the field absent.
    pub fn with_default_location(mut self) -> Self {
        if self.location().is_none() {
            self.location = Some(DEFAULT_LOCATION.to_string());
        }
        self
    }

    /// Serialize the archive body: a flat JSON object with PascalCase keys.
    pub fn to_archive_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&ArchiveDocument {
            impression_id: &self.impression_id,
            campaign_id: &self.campaign_id,
            timestamp: format_timestamp(&self.timestamp),
            location: self.location.as_deref(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ArchiveDocument<'a> {
    impression_id: &'a str,
    campaign_id: &'a str,
    timestamp: String,
    location: Option<&'a str>,
}

/// Impression as received from a caller, before validation.
///
/// Every field is optional so that missing fields are reported as
/// validation failures rather than body decoding failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpressionRequest {
    #[serde(default, alias = "ImpressionId", alias = "impression_id")]
    pub impression_id: Option<String>,
    #[serde(default, alias = "CampaignId", alias = "campaign_id")]
    pub campaign_id: Option<String>,
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "Location")]
    pub location: Option<String>,
}

impl ImpressionRequest {
    /// Validate all fields, returning every problem found.
    pub fn validate(self) -> Result<Impression, ValidationErrors> {
        validation::validate_impression(self)
    }
}

impl From<&Impression> for ImpressionRequest {
    fn from(impression: &Impression) -> Self {
        Self {
            impression_id: Some(impression.impression_id.clone()),
            campaign_id: Some(impression.campaign_id.clone()),
            timestamp: Some(format_timestamp(&impression.timestamp)),
            location: impression.location.clone(),
        }
    }
}

/// Render a timestamp as RFC 3339. UTC is written with a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 / ISO-8601 timestamp carrying an offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim())
}

mod rfc3339 {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impression(location: Option<&str>) -> Impression {
        Impression {
            impression_id: "imp-1".to_string(),
            campaign_id: "camp-9".to_string(),
            timestamp: parse_timestamp("2024-01-01T00:00:00Z").unwrap(),
            location: location.map(String::from),
        }
    }

    #[test]
    fn test_archive_key_appends_json_suffix() {
        assert_eq!(impression(None).archive_key(), "imp-1.json");
    }

    #[test]
    fn test_utc_timestamp_formats_with_zulu() {
        let ts = parse_timestamp("2024-01-01T00:00:00+00:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_offset_timestamp_keeps_offset() {
        let ts = parse_timestamp("2024-06-30T18:45:12.250-05:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-06-30T18:45:12.250-05:00");
    }

    #[test]
    fn test_default_location_fills_absent_and_empty() {
        assert_eq!(
            impression(None).with_default_location().location.as_deref(),
            Some(DEFAULT_LOCATION)
        );
        assert_eq!(
            impression(Some("")).with_default_location().location.as_deref(),
            Some(DEFAULT_LOCATION)
        );
        assert_eq!(
            impression(Some("Chicago")).with_default_location().location.as_deref(),
            Some("Chicago")
        );
    }

    #[test]
    fn test_archive_json_uses_pascal_case_keys() {
        let body = impression(Some("Chicago")).to_archive_json().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["ImpressionId"], "imp-1");
        assert_eq!(value["CampaignId"], "camp-9");
        assert_eq!(value["Timestamp"], "2024-01-01T00:00:00Z");
        assert_eq!(value["Location"], "Chicago");
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_archive_json_writes_null_for_missing_location() {
        let body = impression(None).to_archive_json().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value["Location"].is_null());
    }

    #[test]
    fn test_impression_json_is_camel_case() {
        let value = serde_json::to_value(impression(Some("Austin"))).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "impressionId": "imp-1",
                "campaignId": "camp-9",
                "timestamp": "2024-01-01T00:00:00Z",
                "location": "Austin",
            })
        );
    }

    #[test]
    fn test_request_accepts_pascal_case_aliases() {
        let request: ImpressionRequest = serde_json::from_str(
            r#"{"ImpressionId":"a","CampaignId":"b","Timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(request.impression_id.as_deref(), Some("a"));
        assert_eq!(request.campaign_id.as_deref(), Some("b"));
        assert!(request.location.is_none());
    }

    #[test]
    fn test_request_from_impression_round_trips_through_validation() {
        let original = impression(Some("Denver"));
        let validated = ImpressionRequest::from(&original).validate().unwrap();
        assert_eq!(validated, original);
    }
}
