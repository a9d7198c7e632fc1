//! Shared data model for decoded tracker telemetry.
//!
//! A [`Record`] is one decoded AVL entry: device identity, timestamp,
//! optional position and an ordered map of named parameter values. Records
//! are produced by the protocol decoders and handed downstream as-is; they
//! are never mutated after decoding.

use std::fmt::{
    self,
    Display,
};

use chrono::{
    DateTime,
    Utc,
};

/// Transport a record arrived over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Transport {
    #[cfg_attr(feature = "serde", serde(rename = "TCP"))]
    Tcp,
    #[cfg_attr(feature = "serde", serde(rename = "UDP"))]
    Udp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "TCP",
            Transport::Udp => "UDP",
        }
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A WGS-84 position.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
}

/// A decoded parameter value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(value) => write!(f, "{value}"),
            AttributeValue::Float(value) => write!(f, "{value}"),
            AttributeValue::Text(value) => f.write_str(value),
            AttributeValue::Boolean(value) => write!(f, "{value}"),
        }
    }
}

/// One named parameter of a [`Record`]. The name lives in the
/// [`AttributeMap`] key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attribute {
    pub value: AttributeValue,
    pub timestamp: DateTime<Utc>,
}

/// Insertion-ordered map of attribute name to [`Attribute`].
///
/// Keys are unique; inserting an existing key overwrites the attribute but
/// keeps the key's original position. Record decoding produces at most a
/// few dozen entries, so lookup is a linear scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, Attribute)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        let name = name.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            *existing = attribute;
        }
        else {
            self.entries.push((name, attribute));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, attribute)| attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.entries
            .iter()
            .map(|(name, attribute)| (name.as_str(), attribute))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Attribute)> {
        self.entries
            .iter_mut()
            .map(|(name, attribute)| (name.as_str(), attribute))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AttributeMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, attribute) in &self.entries {
            map.serialize_entry(name, attribute)?;
        }
        map.end()
    }
}

/// One decoded AVL entry.
///
/// Provenance fields (`codec_name`, `protocol_id`, `transport`) are fixed
/// by the frame-level decoder before any codec parser runs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Record {
    pub imei: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub location: Option<Position>,
    pub valid: bool,
    pub attributes: AttributeMap,
    /// Only meaningful for the GH3000 codec: which optional location
    /// sub-fields and IO size groups are present.
    pub global_mask: u8,
    pub codec_name: &'static str,
    pub protocol_id: &'static str,
    pub transport: Transport,
}

impl Record {
    pub fn new(codec_name: &'static str, protocol_id: &'static str, transport: Transport) -> Self {
        Self {
            imei: None,
            timestamp: DateTime::UNIX_EPOCH,
            location: None,
            valid: true,
            attributes: AttributeMap::new(),
            global_mask: 0,
            codec_name,
            protocol_id,
            transport,
        }
    }

    /// Forces every attribute timestamp to the record timestamp, so a
    /// record's attributes are always internally time-consistent no matter
    /// what timestamp they were first created with during location
    /// decoding.
    pub fn align_attribute_timestamps(&mut self) {
        let timestamp = self.timestamp;
        for (_, attribute) in self.attributes.iter_mut() {
            attribute.timestamp = timestamp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(value: i64, millis: i64) -> Attribute {
        Attribute {
            value: AttributeValue::Integer(value),
            timestamp: DateTime::from_timestamp_millis(millis).unwrap(),
        }
    }

    #[test]
    fn insert_overwrites_and_keeps_position() {
        let mut map = AttributeMap::new();
        map.insert("speed", attribute(10, 0));
        map.insert("altitude", attribute(50, 0));
        map.insert("speed", attribute(20, 0));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("speed"), Some(&attribute(20, 0)));
        let names: Vec<&str> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["speed", "altitude"]);
    }

    #[test]
    fn align_attribute_timestamps_overwrites_all() {
        let mut record = Record::new("codec_8", "teltonika:tcp:avl", Transport::Tcp);
        record.timestamp = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        record.attributes.insert("priority", attribute(1, 12345));
        record.attributes.insert("speed", attribute(60, 67890));

        record.align_attribute_timestamps();

        for (_, attribute) in record.attributes.iter() {
            assert_eq!(attribute.timestamp, record.timestamp);
        }
    }

    #[test]
    fn transport_renders_uppercase() {
        assert_eq!(Transport::Tcp.to_string(), "TCP");
        assert_eq!(Transport::Udp.to_string(), "UDP");
    }
}
