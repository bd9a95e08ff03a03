// src/inspector.rs
use crate::editor::PayloadEditor;
use crate::error::{InspectorError, InspectorResult, StoreError};
use crate::gateway::CredentialStoreGateway;
use crate::models::{CredentialRecord, RecordClass, RecordKey};
use crate::normalizer::normalize;
use log;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The access group is empty; nothing was queried.
    NoGroupSelected,
    Loaded(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// The store no longer had the record.
    AlreadyGone,
}

struct EditSession {
    record_id: Uuid,
    editor: PayloadEditor,
}

/// Holds the current record list and at most one open edit session.
pub struct Inspector<G: CredentialStoreGateway> {
    gateway: G,
    records: Vec<CredentialRecord>,
    edit: Option<EditSession>,
}

impl<G: CredentialStoreGateway> Inspector<G> {
    pub fn new(gateway: G) -> Self {
        Inspector { gateway, records: Vec::new(), edit: None }
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub fn record(&self, id: Uuid) -> Option<&CredentialRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn find_by_key(&self, class: Option<RecordClass>, title: &str, account: Option<&str>) -> Vec<&CredentialRecord> {
        self.records
            .iter()
            .filter(|r| class.map_or(true, |c| r.record_class == c))
            .filter(|r| r.title == title)
            .filter(|r| account.map_or(true, |a| r.account == a))
            .collect()
    }

    /// Replaces the record list with a fresh projection of the store.
    pub fn refresh(&mut self, access_group: &str) -> InspectorResult<QueryOutcome> {
        if access_group.is_empty() {
            log::info!("No access group selected, skipping query");
            self.records.clear();
            return Ok(QueryOutcome::NoGroupSelected);
        }

        let raw_records = match self.gateway.query(access_group) {
            Ok(raw_records) => raw_records,
            Err(e) => {
                self.records.clear();
                return Err(e.into());
            }
        };
        self.records = raw_records
            .iter()
            .map(|(attributes, class)| normalize(attributes, *class))
            .collect();
        log::info!("Loaded {} records for access group '{}'", self.records.len(), access_group);
        Ok(QueryOutcome::Loaded(self.records.len()))
    }

    pub fn add(
        &mut self,
        access_group: &str,
        class: RecordClass,
        title: &str,
        account: &str,
        payload: &[u8],
    ) -> InspectorResult<()> {
        if access_group.is_empty() {
            return Err(InspectorError::NoAccessGroup);
        }
        if title.is_empty() {
            return Err(InspectorError::EmptyTitle);
        }
        let key = RecordKey {
            class,
            title: title.to_string(),
            account: account.to_string(),
            access_group: access_group.to_string(),
        };
        self.gateway.insert(&key, payload)?;
        self.refresh(access_group)?;
        Ok(())
    }

    /// Opens the edit session; reach the editor through `editor_mut`.
    pub fn begin_edit(&mut self, id: Uuid) -> InspectorResult<()> {
        if self.edit.is_some() {
            return Err(InspectorError::EditInProgress);
        }
        let record = self.record(id).ok_or(InspectorError::RecordNotFound(id))?;
        let editor = PayloadEditor::from_record(record);
        log::debug!("Opened edit session for {}", record.key());
        self.edit = Some(EditSession { record_id: id, editor });
        Ok(())
    }

    pub fn editor(&self) -> Option<&PayloadEditor> {
        self.edit.as_ref().map(|s| &s.editor)
    }

    pub fn editor_mut(&mut self) -> Option<&mut PayloadEditor> {
        self.edit.as_mut().map(|s| &mut s.editor)
    }

    pub fn cancel_edit(&mut self) {
        if self.edit.take().is_some() {
            log::debug!("Edit session cancelled");
        }
    }

    /// Writes the edited payload back. The session stays open when the
    /// buffer cannot be committed or the store denies the write. Once the
    /// write is applied, a failing re-query is logged and leaves the list empty.
    pub fn save_edit(&mut self, access_group: &str) -> InspectorResult<MutationOutcome> {
        let session = self.edit.as_ref().ok_or(InspectorError::NoEditSession)?;
        let payload = session.editor.commit()?;
        let record_id = session.record_id;
        let key = self.record(record_id).ok_or(InspectorError::RecordNotFound(record_id))?.key();

        match self.gateway.update(&key, &payload) {
            Ok(()) => {
                self.edit = None;
                if let Err(e) = self.refresh(access_group) {
                    log::warn!("Saved {} but re-query failed: {}", key, e);
                }
                Ok(MutationOutcome::Applied)
            }
            Err(StoreError::NotFound) => {
                log::info!("{} vanished before save, dropping it from the list", key);
                self.edit = None;
                self.records.retain(|r| r.id != record_id);
                Ok(MutationOutcome::AlreadyGone)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a record and drops it from the local list.
    pub fn delete(&mut self, id: Uuid) -> InspectorResult<MutationOutcome> {
        let key = self.record(id).ok_or(InspectorError::RecordNotFound(id))?.key();
        let outcome = match self.gateway.delete(&key) {
            Ok(()) => MutationOutcome::Applied,
            Err(StoreError::NotFound) => MutationOutcome::AlreadyGone,
            Err(e) => return Err(e.into()),
        };
        self.records.retain(|r| r.id != id);
        if self.edit.as_ref().map_or(false, |s| s.record_id == id) {
            self.edit = None;
        }
        Ok(outcome)
    }
}
