// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Attribute keys as reported by the credential store.
pub const ATTR_SERVICE: &str = "svce";
pub const ATTR_SERVER: &str = "srvr";
pub const ATTR_ACCOUNT: &str = "acct";
pub const ATTR_ACCESS_GROUP: &str = "agrp";
pub const ATTR_DATA: &str = "v_Data";
pub const ATTR_LABEL: &str = "labl";
pub const ATTR_CREATED: &str = "cdat";
pub const ATTR_MODIFIED: &str = "mdat";
pub const ATTR_CLASS: &str = "class";

pub const UNKNOWN_SERVICE: &str = "unknown-service";
pub const UNKNOWN_SERVER: &str = "unknown-server";
pub const UNKNOWN_GROUP: &str = "unknown-group";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    Generic,
    Internet,
}

impl RecordClass {
    /// Attribute that holds the record title for this class.
    pub fn title_attribute(self) -> &'static str {
        match self {
            RecordClass::Generic => ATTR_SERVICE,
            RecordClass::Internet => ATTR_SERVER,
        }
    }

    pub fn title_sentinel(self) -> &'static str {
        match self {
            RecordClass::Generic => UNKNOWN_SERVICE,
            RecordClass::Internet => UNKNOWN_SERVER,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::Generic => f.write_str("generic"),
            RecordClass::Internet => f.write_str("internet"),
        }
    }
}

impl FromStr for RecordClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "genp" => Ok(RecordClass::Generic),
            "internet" | "inet" => Ok(RecordClass::Internet),
            other => Err(format!("unknown record class '{}', expected generic or internet", other)),
        }
    }
}

/// A typed value as returned by the credential store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Data(Vec<u8>),
    Integer(i64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl AttributeValue {
    /// Text view of the value when it is text, or data that decodes as UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::Data(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

// Best-effort display form; never fails.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Data(bytes) => write!(f, "<{}>", crate::hex_codec::encode(bytes)),
            AttributeValue::Integer(n) => write!(f, "{}", n),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Date(d) => {
                f.write_str(&d.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Data(bytes)
    }
}

/// The untyped attribute bag for one stored record.
pub type RawAttributes = BTreeMap<String, AttributeValue>;

/// Natural key used to address a record in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    pub class: RecordClass,
    pub title: String,
    pub account: String,
    pub access_group: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' (account '{}', group '{}')", self.class, self.title, self.account, self.access_group)
    }
}

/// Read-time projection of one store record. Rebuilt on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub record_class: RecordClass,
    pub title: String,
    pub account: String,
    pub access_group: String,
    pub payload: Vec<u8>,
    pub is_text_representable: bool,
    pub attributes: BTreeMap<String, String>,
}

impl CredentialRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            class: self.record_class,
            title: self.title.clone(),
            account: self.account.clone(),
            access_group: self.access_group.clone(),
        }
    }

    pub fn payload_text(&self) -> Option<&str> {
        if self.is_text_representable {
            std::str::from_utf8(&self.payload).ok()
        } else {
            None
        }
    }
}
