use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The reserved provenance tag carried by synthetic (demonstration) records.
pub const SYNTHETIC_SOURCE_TAG: &str = "demo";

/// Provenance tag of a record.
///
/// Only the exact tag `"demo"` marks a record as synthetic. Any other value,
/// including differently cased variants, is genuine data and is kept verbatim
/// in [`RecordSource::Other`] so it serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordSource {
    /// Synthetic showcase data from the static catalog
    Demo,
    /// Bulk-imported data (directory scrapes, partner feeds)
    Imported,
    /// Entered by hand through the application
    Manual,
    /// Any other provenance string
    Other(String),
}

impl RecordSource {
    /// The tag as persisted.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Demo => SYNTHETIC_SOURCE_TAG,
            Self::Imported => "imported",
            Self::Manual => "manual",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Whether this tag denotes synthetic data.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Demo)
    }
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            SYNTHETIC_SOURCE_TAG => Self::Demo,
            "imported" => Self::Imported,
            "manual" => Self::Manual,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<&str> for RecordSource {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(source) => source,
            Err(never) => match never {},
        }
    }
}

impl Serialize for RecordSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(RecordSource::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_demo_tag_is_synthetic() {
        assert!(RecordSource::from("demo").is_synthetic());
        assert!(!RecordSource::from("Demo").is_synthetic());
        assert!(!RecordSource::from("demo ").is_synthetic());
        assert!(!RecordSource::from("imported").is_synthetic());
        assert_eq!(RecordSource::from("Demo"), RecordSource::Other("Demo".into()));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&RecordSource::Other("partner-x".into())).unwrap();
        assert_eq!(json, "\"partner-x\"");
        let back: RecordSource = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(back, RecordSource::Manual);
    }
}
