//! Document information metadata.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Information dictionary keys that hold dates.
pub const DATE_KEYS: [&str; 2] = ["creationDate", "modDate"];

/// Keys every extracted document carries, in output order.
pub const STANDARD_KEYS: [&str; 11] = [
    "format",
    "title",
    "author",
    "subject",
    "keywords",
    "creator",
    "producer",
    "creationDate",
    "modDate",
    "trapped",
    "encryption",
];

/// String-valued document metadata, insertion ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMetadata {
    entries: IndexMap<String, String>,
}

impl FileMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata with every standard key present and empty.
    pub fn with_standard_keys() -> Self {
        let mut metadata = Self::new();
        for key in STANDARD_KEYS {
            metadata.insert(key, "");
        }
        metadata
    }

    /// Set a value, replacing any previous value for the key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite the date keys into `YYYY-MM-DD HH:MM:SS`.
    ///
    /// Empty values are left alone. On the first malformed date the raw
    /// value stays in place and the error is returned; the caller decides
    /// whether that is fatal.
    pub fn normalize_dates(&mut self) -> Result<()> {
        let mut first_error = None;
        for key in DATE_KEYS {
            let Some(raw) = self.get(key).filter(|v| !v.is_empty()) else {
                continue;
            };
            match normalize_pdf_date(raw) {
                Ok(normalized) => self.insert(key, normalized),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Copy every entry into a JSON object, overwriting existing keys.
    pub fn merge_into(&self, object: &mut Map<String, Value>) {
        for (key, value) in self.iter() {
            object.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FileMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// Convert a PDF date (`D:YYYYMMDDHHmmSS...`) into `YYYY-MM-DD HH:MM:SS`.
///
/// Fields are read by position from the raw string, so the `D:` prefix is
/// expected; anything after the seconds (timezone) is ignored.
pub fn normalize_pdf_date(raw: &str) -> Result<String> {
    let field = |range: std::ops::Range<usize>, name: &str| -> Result<u32> {
        let digits = raw
            .get(range)
            .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| Error::MalformedDate {
                raw: raw.to_string(),
                reason: format!("{} is missing or not numeric", name),
            })?;
        digits.parse().map_err(|_| Error::MalformedDate {
            raw: raw.to_string(),
            reason: format!("{} is not a number", name),
        })
    };

    let year = field(2..6, "year")?;
    let month = field(6..8, "month")?;
    let day = field(8..10, "day")?;
    let hour = field(10..12, "hour")?;
    let minute = field(12..14, "minute")?;
    let second = field(14..16, "second")?;

    let datetime = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| Error::MalformedDate {
            raw: raw.to_string(),
            reason: "date is out of calendar range".to_string(),
        })?;

    Ok(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}
