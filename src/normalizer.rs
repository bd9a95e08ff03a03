// src/normalizer.rs
use crate::models::{
    AttributeValue, CredentialRecord, RawAttributes, RecordClass, RecordKey, ATTR_ACCESS_GROUP,
    ATTR_ACCOUNT, ATTR_DATA, UNKNOWN_GROUP,
};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Projects a raw attribute bag into a `CredentialRecord`.
///
/// Never fails: missing or oddly typed attributes fall back to sentinels,
/// empty strings or empty payloads so that every store record can be shown.
pub fn normalize(raw: &RawAttributes, record_class: RecordClass) -> CredentialRecord {
    let attributes = stringify_all(raw);
    let RecordKey { title, account, access_group, .. } = record_key(raw, record_class);

    let payload = raw.get(ATTR_DATA).map(payload_bytes).unwrap_or_default();
    let is_text_representable = std::str::from_utf8(&payload).is_ok();

    CredentialRecord {
        id: Uuid::new_v4(),
        record_class,
        title,
        account,
        access_group,
        payload,
        is_text_representable,
        attributes,
    }
}

/// Natural key of a raw attribute bag, with the same fallbacks `normalize`
/// applies. Stores address records by this projection.
pub fn record_key(raw: &RawAttributes, record_class: RecordClass) -> RecordKey {
    let account = raw.get(ATTR_ACCOUNT).map(text_or_display).unwrap_or_default();

    let access_group = raw
        .get(ATTR_ACCESS_GROUP)
        .map(text_or_display)
        .unwrap_or_else(|| UNKNOWN_GROUP.to_string());

    let title = raw
        .get(record_class.title_attribute())
        .map(text_or_display)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| record_class.title_sentinel().to_string());

    RecordKey { class: record_class, title, account, access_group }
}

/// Display map holding every key of the bag.
pub fn stringify_all(raw: &RawAttributes) -> BTreeMap<String, String> {
    raw.iter().map(|(key, value)| (key.clone(), value.to_string())).collect()
}

fn text_or_display(value: &AttributeValue) -> String {
    match value.as_text() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

fn payload_bytes(value: &AttributeValue) -> Vec<u8> {
    match value {
        AttributeValue::Data(bytes) => bytes.clone(),
        AttributeValue::Text(text) => text.as_bytes().to_vec(),
        other => other.to_string().into_bytes(),
    }
}
