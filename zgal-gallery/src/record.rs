//! Record model for entries returned by the remote content API
//!
//! Only `id` is required. Every other field may be absent or null and the
//! accessors degrade to empty strings, `None`, or an empty keyword list.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Custom metadata key holding the decimal latitude list
pub const LATITUDE_KEY: &str = "dwc:decimalLatitude";

/// Custom metadata key holding the decimal longitude list
pub const LONGITUDE_KEY: &str = "dwc:decimalLongitude";

/// Fallback title for records without one
pub const UNTITLED: &str = "Untitled";

/// Record identifier, numeric or string on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawRecordId", into = "String")]
pub struct RecordId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecordId {
    Number(u64),
    Text(String),
}

impl From<RawRecordId> for RecordId {
    fn from(raw: RawRecordId) -> Self {
        match raw {
            RawRecordId::Number(n) => RecordId(n.to_string()),
            RawRecordId::Text(s) => RecordId(s),
        }
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        RecordId(n.to_string())
    }
}

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One photo entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<RecordFile>>,
    #[serde(default)]
    pub metadata: Option<RecordMetadata>,
    #[serde(default)]
    pub stats: Option<RecordStats>,
}

/// File descriptor; the first file's key names the image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFile {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creators: Option<Vec<Creator>>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub custom: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Creator {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordStats {
    #[serde(default)]
    pub views: Option<u64>,
}

/// Decimal-degree position of a photo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Record {
    /// Key of the first file, empty when the record has no files
    pub fn first_file_key(&self) -> &str {
        self.files
            .as_ref()
            .and_then(|files| files.first())
            .and_then(|file| file.key.as_deref())
            .unwrap_or("")
    }

    /// Title, "Untitled" when absent or empty
    pub fn title(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.title.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED)
    }

    /// Creator names joined with ", ", empty when there are none
    pub fn authors(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|m| m.creators.as_ref())
            .map(|creators| {
                creators
                    .iter()
                    .filter_map(|c| c.name.as_deref())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    pub fn publication_date(&self) -> Option<NaiveDate> {
        self.metadata
            .as_ref()
            .and_then(|m| m.publication_date.as_deref())
            .and_then(parse_publication_date)
    }

    pub fn year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.publication_date().map(|d| d.year())
    }

    /// Raw keyword list in record order (duplicates kept)
    pub fn keywords(&self) -> &[String] {
        self.metadata
            .as_ref()
            .and_then(|m| m.keywords.as_deref())
            .unwrap_or(&[])
    }

    /// Position, present only when both coordinates exist and are non-zero/non-empty
    pub fn coordinates(&self) -> Option<Coordinates> {
        let custom = self.metadata.as_ref()?.custom.as_ref()?;
        let latitude = first_coordinate(custom.get(LATITUDE_KEY)?)?;
        let longitude = first_coordinate(custom.get(LONGITUDE_KEY)?)?;
        Some(Coordinates {
            latitude,
            longitude,
        })
    }

    /// View count, 0 when stats are missing
    pub fn views(&self) -> u64 {
        self.stats.as_ref().and_then(|s| s.views).unwrap_or(0)
    }

    /// Resolver link for the DOI
    pub fn doi_url(&self) -> Option<String> {
        self.doi
            .as_deref()
            .filter(|doi| !doi.trim().is_empty())
            .map(|doi| format!("https://www.doi.org/{}", doi.trim()))
    }
}

/// IIIF image URL for a record file at a given width
///
/// # Examples
///
/// ```
/// use zgal_gallery::record::image_url;
///
/// assert_eq!(
///     image_url("https://zenodo.org/api/iiif/", "123", "cows.jpg", 500),
///     "https://zenodo.org/api/iiif/record:123:cows.jpg/full/500,/0/default.png",
/// );
/// ```
pub fn image_url(iiif_base: &str, id: &str, filename: &str, width: u32) -> String {
    format!(
        "{}/record:{}:{}/full/{},/0/default.png",
        iiif_base.trim_end_matches('/'),
        id,
        filename,
        width
    )
}

/// Parse a publication date in any of the shapes the API produces
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, `YYYY-MM` and bare `YYYY`.
pub fn parse_publication_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return Some(date);
    }
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = raw.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

/// First element of a coordinate list, dropping zero numbers and empty strings
fn first_coordinate(value: &Value) -> Option<f64> {
    match value.as_array()?.first()? {
        Value::Number(n) => n.as_f64().filter(|f| *f != 0.0),
        Value::String(s) if !s.is_empty() => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
