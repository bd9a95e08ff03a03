// src/store.rs
use crate::error::{StoreError, StoreResult};
use crate::gateway::{group_matches, CredentialStoreGateway};
use crate::normalizer::record_key;
use crate::models::{
    AttributeValue, RawAttributes, RecordClass, RecordKey, ATTR_ACCESS_GROUP, ATTR_ACCOUNT, ATTR_CLASS,
    ATTR_CREATED, ATTR_DATA, ATTR_LABEL, ATTR_MODIFIED,
};
use chrono::Utc;
use log;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StoredItem {
    pub class: RecordClass,
    pub attributes: RawAttributes,
}

impl StoredItem {
    fn key(&self) -> RecordKey {
        record_key(&self.attributes, self.class)
    }

    fn matches_key(&self, key: &RecordKey) -> bool {
        self.key() == *key
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct StoredCredentials {
    pub items: Vec<StoredItem>,
}

enum Backing {
    #[cfg(test)]
    Memory(Vec<StoredItem>),
    File(PathBuf),
}

/// In-process credential store. The file backend re-reads its file on every
/// call and rewrites it after every mutation.
pub struct LocalCredentialStore {
    backing: Backing,
    entitlements: Vec<String>,
}

impl LocalCredentialStore {
    #[cfg(test)]
    pub fn in_memory(entitlements: Vec<String>) -> Self {
        LocalCredentialStore { backing: Backing::Memory(Vec::new()), entitlements }
    }

    pub fn open(path: impl Into<PathBuf>, entitlements: Vec<String>) -> Self {
        let path = path.into();
        log::info!("Using credential store file {:?}", path);
        LocalCredentialStore { backing: Backing::File(path), entitlements }
    }

    fn is_entitled(&self, access_group: &str) -> bool {
        self.entitlements.iter().any(|pattern| group_matches(pattern, access_group))
    }

    fn check_entitled(&self, access_group: &str) -> StoreResult<()> {
        if self.is_entitled(access_group) {
            Ok(())
        } else {
            log::warn!("Access group '{}' is not in the entitlement list", access_group);
            Err(StoreError::Denied(access_group.to_string()))
        }
    }

    fn load_items(&self) -> StoreResult<Vec<StoredItem>> {
        match &self.backing {
            #[cfg(test)]
            Backing::Memory(items) => Ok(items.clone()),
            Backing::File(path) => load_store(path).map(|stored| stored.items),
        }
    }

    fn save_items(&mut self, items: Vec<StoredItem>) -> StoreResult<()> {
        match &mut self.backing {
            #[cfg(test)]
            Backing::Memory(slot) => {
                *slot = items;
                Ok(())
            }
            Backing::File(path) => save_store(&StoredCredentials { items }, path),
        }
    }
}

impl CredentialStoreGateway for LocalCredentialStore {
    fn query(&self, access_group: &str) -> StoreResult<Vec<(RawAttributes, RecordClass)>> {
        self.check_entitled(access_group)?;
        let items = self.load_items().map_err(|e| {
            log::error!("Credential store query for '{}' failed: {}", access_group, e);
            StoreError::QueryFailed(e.to_string())
        })?;
        let results: Vec<_> = items
            .into_iter()
            .filter(|item| group_matches(access_group, &item.key().access_group))
            .map(|item| (item.attributes, item.class))
            .collect();
        log::debug!("Query for '{}' returned {} records", access_group, results.len());
        Ok(results)
    }

    fn insert(&mut self, key: &RecordKey, payload: &[u8]) -> StoreResult<()> {
        self.check_entitled(&key.access_group)?;
        let mut items = self.load_items()?;
        if items.iter().any(|item| item.matches_key(key)) {
            log::warn!("Insert rejected, {} already exists", key);
            return Err(StoreError::AlreadyExists);
        }

        let now = AttributeValue::Date(Utc::now());
        let mut attributes = RawAttributes::new();
        attributes.insert(ATTR_CLASS.to_string(), AttributeValue::Text(key.class.to_string()));
        attributes.insert(key.class.title_attribute().to_string(), AttributeValue::Text(key.title.clone()));
        attributes.insert(ATTR_LABEL.to_string(), AttributeValue::Text(key.title.clone()));
        attributes.insert(ATTR_ACCOUNT.to_string(), AttributeValue::Text(key.account.clone()));
        attributes.insert(ATTR_ACCESS_GROUP.to_string(), AttributeValue::Text(key.access_group.clone()));
        attributes.insert(ATTR_DATA.to_string(), AttributeValue::Data(payload.to_vec()));
        attributes.insert(ATTR_CREATED.to_string(), now.clone());
        attributes.insert(ATTR_MODIFIED.to_string(), now);

        items.push(StoredItem { class: key.class, attributes });
        self.save_items(items)?;
        log::info!("Inserted {}", key);
        Ok(())
    }

    fn update(&mut self, key: &RecordKey, new_payload: &[u8]) -> StoreResult<()> {
        self.check_entitled(&key.access_group)?;
        let mut items = self.load_items()?;
        let item = items.iter_mut().find(|item| item.matches_key(key)).ok_or_else(|| {
            log::warn!("Update target {} not found", key);
            StoreError::NotFound
        })?;
        item.attributes.insert(ATTR_DATA.to_string(), AttributeValue::Data(new_payload.to_vec()));
        item.attributes.insert(ATTR_MODIFIED.to_string(), AttributeValue::Date(Utc::now()));
        self.save_items(items)?;
        log::info!("Updated payload of {}", key);
        Ok(())
    }

    fn delete(&mut self, key: &RecordKey) -> StoreResult<()> {
        let mut items = self.load_items()?;
        let before = items.len();
        items.retain(|item| !item.matches_key(key));
        if items.len() == before {
            log::warn!("Delete target {} not found", key);
            return Err(StoreError::NotFound);
        }
        self.save_items(items)?;
        log::info!("Deleted {}", key);
        Ok(())
    }
}

/// Writes the credential file, creating its parent directory if needed.
pub fn save_store(stored: &StoredCredentials, filepath: &Path) -> StoreResult<()> {
    log::debug!("Attempting to save store to {:?}", filepath);
    if let Some(parent_dir) = filepath.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir).map_err(|e| {
                log::error!("Failed to create store directory {:?}: {:?}", parent_dir, e);
                StoreError::Io(e)
            })?;
        }
    }

    let serialized_data = bincode::serialize(stored).map_err(|e| {
        let msg = format!("Bincode serialization failed: {}", e);
        log::error!("save_store: {}", msg);
        StoreError::Serialization(msg)
    })?;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(filepath)
        .map_err(|e| {
            log::error!("Failed to open file {:?} for writing: {:?}", filepath, e);
            StoreError::Io(e)
        })?;
    file.write_all(&serialized_data).map_err(|e| {
        log::error!("Failed to write store data to {:?}: {:?}", filepath, e);
        e
    })?;

    log::debug!("Credential store saved to {:?} ({} items)", filepath, stored.items.len());
    Ok(())
}

/// Reads the credential file. A missing file is an empty store.
pub fn load_store(filepath: &Path) -> StoreResult<StoredCredentials> {
    let contents = match fs::read(filepath) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("Store file {:?} does not exist yet, treating as empty", filepath);
            return Ok(StoredCredentials::default());
        }
        Err(e) => {
            log::error!("Failed to read store file {:?}: {:?}", filepath, e);
            return Err(StoreError::Io(e));
        }
    };

    if contents.is_empty() {
        return Ok(StoredCredentials::default());
    }

    bincode::deserialize(&contents).map_err(|e| {
        let msg = format!("Bincode deserialization failed: {}", e);
        log::error!("load_store: {}", msg);
        StoreError::Deserialization(msg)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ATTR_SERVICE, UNKNOWN_GROUP};
    use tempfile::tempdir;

    fn all_groups() -> Vec<String> {
        vec!["*".to_string()]
    }

    fn key(class: RecordClass, title: &str, account: &str, group: &str) -> RecordKey {
        RecordKey {
            class,
            title: title.to_string(),
            account: account.to_string(),
            access_group: group.to_string(),
        }
    }

    #[test]
    fn test_insert_and_query_both_classes() {
        let mut store = LocalCredentialStore::in_memory(all_groups());
        store.insert(&key(RecordClass::Generic, "svc", "u1", "TEAM.app"), b"one").unwrap();
        store.insert(&key(RecordClass::Internet, "example.com", "u2", "TEAM.app"), b"two").unwrap();
        store.insert(&key(RecordClass::Generic, "svc", "u1", "OTHER.app"), b"three").unwrap();

        let results = store.query("TEAM.app").unwrap();
        assert_eq!(results.len(), 2);
        let (internet, class) = results.iter().find(|(_, c)| *c == RecordClass::Internet).unwrap();
        assert_eq!(*class, RecordClass::Internet);
        assert_eq!(internet.get("srvr"), Some(&AttributeValue::Text("example.com".to_string())));
        assert!(internet.contains_key(ATTR_CREATED));

        assert_eq!(store.query("TEAM.*").unwrap().len(), 2);
        assert_eq!(store.query("*").unwrap().len(), 3);
        assert!(store.query("NOBODY").unwrap().is_empty());
    }

    #[test]
    fn test_insert_duplicate_is_rejected() {
        let mut store = LocalCredentialStore::in_memory(all_groups());
        let k = key(RecordClass::Generic, "svc", "u1", "G");
        store.insert(&k, b"a").unwrap();
        assert!(matches!(store.insert(&k, b"b"), Err(StoreError::AlreadyExists)));
        // Same title under the other class is a different record.
        store.insert(&key(RecordClass::Internet, "svc", "u1", "G"), b"c").unwrap();
    }

    #[test]
    fn test_update_and_delete_outcomes() {
        let mut store = LocalCredentialStore::in_memory(all_groups());
        let k = key(RecordClass::Generic, "svc", "", "G");
        assert!(matches!(store.update(&k, b"x"), Err(StoreError::NotFound)));
        store.insert(&k, b"x").unwrap();
        store.update(&k, b"y").unwrap();
        let (attrs, _) = store.query("G").unwrap().remove(0);
        assert_eq!(attrs.get(ATTR_DATA), Some(&AttributeValue::Data(b"y".to_vec())));

        store.delete(&k).unwrap();
        assert!(matches!(store.delete(&k), Err(StoreError::NotFound)));
        assert!(store.query("G").unwrap().is_empty());
    }

    #[test]
    fn test_entitlements_deny_other_groups() {
        let mut store = LocalCredentialStore::in_memory(vec!["TEAM.*".to_string()]);
        let denied = key(RecordClass::Generic, "svc", "u", "OTHER.app");
        assert!(matches!(store.insert(&denied, b"x"), Err(StoreError::Denied(_))));
        assert!(matches!(store.update(&denied, b"x"), Err(StoreError::Denied(_))));
        assert!(matches!(store.query("OTHER.app"), Err(StoreError::Denied(_))));
        store.insert(&key(RecordClass::Generic, "svc", "u", "TEAM.app"), b"x").unwrap();
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.bin");
        let k = key(RecordClass::Generic, "svc", "u1", "G");
        {
            let mut store = LocalCredentialStore::open(&path, all_groups());
            assert!(store.query("G").unwrap().is_empty());
            store.insert(&k, &[0xff, 0x00]).unwrap();
        }
        assert!(path.exists());

        let reopened = LocalCredentialStore::open(&path, all_groups());
        let results = reopened.query("G").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.get(ATTR_DATA), Some(&AttributeValue::Data(vec![0xff, 0x00])));
    }

    #[test]
    fn test_corrupt_file_reports_query_failed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.bin");
        fs::write(&path, b"\xff\xff\xff\xff\xff\xff\xff\xffgarbage").unwrap();
        let store = LocalCredentialStore::open(&path, all_groups());
        match store.query("G") {
            Err(StoreError::QueryFailed(_)) => {}
            other => panic!("Expected QueryFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let loaded = load_store(&dir.path().join("absent.bin")).unwrap();
        assert!(loaded.items.is_empty());
    }

    #[test]
    fn test_update_restamps_modification_date() {
        let mut store = LocalCredentialStore::in_memory(all_groups());
        let k = key(RecordClass::Generic, "svc", "u1", "G");
        store.insert(&k, b"old").unwrap();
        let (before, _) = store.query("G").unwrap().remove(0);
        assert_eq!(before.get(ATTR_CREATED), before.get(ATTR_MODIFIED));

        std::thread::sleep(std::time::Duration::from_millis(5));
        store.update(&k, b"new").unwrap();
        let (after, _) = store.query("G").unwrap().remove(0);
        assert_eq!(after.get(ATTR_CREATED), before.get(ATTR_CREATED));
        assert_ne!(after.get(ATTR_MODIFIED), before.get(ATTR_MODIFIED));
        match (before.get(ATTR_MODIFIED), after.get(ATTR_MODIFIED)) {
            (Some(AttributeValue::Date(old)), Some(AttributeValue::Date(new))) => assert!(new > old),
            other => panic!("Expected modification dates, got {:?}", other),
        }
    }

    #[test]
    fn test_records_without_group_or_text_account_are_addressable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.bin");
        let mut bare = RawAttributes::new();
        bare.insert(ATTR_SERVICE.to_string(), AttributeValue::Text("svc".to_string()));
        bare.insert(ATTR_ACCOUNT.to_string(), AttributeValue::Integer(42));
        bare.insert(ATTR_DATA.to_string(), AttributeValue::Data(b"x".to_vec()));
        let stored = StoredCredentials { items: vec![StoredItem { class: RecordClass::Generic, attributes: bare }] };
        save_store(&stored, &path).unwrap();

        let mut store = LocalCredentialStore::open(&path, all_groups());
        let (attrs, class) = store.query(UNKNOWN_GROUP).unwrap().remove(0);
        let listed = record_key(&attrs, class);
        assert_eq!(listed, key(RecordClass::Generic, "svc", "42", UNKNOWN_GROUP));

        store.update(&listed, b"y").unwrap();
        store.delete(&listed).unwrap();
        assert!(load_store(&path).unwrap().items.is_empty());
    }
}
