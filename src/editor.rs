// src/editor.rs
use crate::error::CommitError;
use crate::hex_codec;
use crate::models::CredentialRecord;

/// Shown in place of the payload when hex input cannot be viewed as text.
pub const UNDECODABLE_PLACEHOLDER: &str =
    "<payload is not valid hex-encoded UTF-8 text; switch back to hex to edit it>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Text,
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Already in the requested mode; nothing changed.
    Unchanged,
    Switched,
    /// Hex could not be shown as text. The placeholder is displayed and the
    /// user is expected to switch back.
    Failed,
}

/// Editable textual view of one record's payload.
#[derive(Debug, Clone)]
pub struct PayloadEditor {
    buffer: String,
    mode: EditMode,
    // Hex buffer kept while the placeholder is displayed.
    stashed_hex: Option<String>,
}

impl PayloadEditor {
    pub fn from_record(record: &CredentialRecord) -> Self {
        match record.payload_text() {
            Some(text) => Self::new(text.to_string(), EditMode::Text),
            None => Self::new(hex_codec::encode(&record.payload), EditMode::Hex),
        }
    }

    pub fn new(buffer: String, mode: EditMode) -> Self {
        PayloadEditor { buffer, mode, stashed_hex: None }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// True while the placeholder stands in for undecodable hex.
    pub fn is_showing_placeholder(&self) -> bool {
        self.stashed_hex.is_some()
    }

    /// Replaces the buffer with user input.
    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.stashed_hex = None;
    }

    pub fn switch_mode(&mut self, new_mode: EditMode) -> SwitchOutcome {
        if new_mode == self.mode {
            return SwitchOutcome::Unchanged;
        }
        let outcome = match new_mode {
            EditMode::Hex => self.text_to_hex(),
            EditMode::Text => self.hex_to_text(),
        };
        self.mode = new_mode;
        outcome
    }

    fn text_to_hex(&mut self) -> SwitchOutcome {
        self.buffer = match self.stashed_hex.take() {
            Some(hex) => hex,
            None => hex_codec::encode(self.buffer.as_bytes()),
        };
        SwitchOutcome::Switched
    }

    fn hex_to_text(&mut self) -> SwitchOutcome {
        let decoded = hex_codec::decode(&self.buffer)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok());
        match decoded {
            Some(text) => {
                self.buffer = text;
                SwitchOutcome::Switched
            }
            None => {
                let hex = std::mem::replace(&mut self.buffer, UNDECODABLE_PLACEHOLDER.to_string());
                self.stashed_hex = Some(hex);
                SwitchOutcome::Failed
            }
        }
    }

    /// Bytes to write back to the store.
    pub fn commit(&self) -> Result<Vec<u8>, CommitError> {
        if self.is_showing_placeholder() {
            return Err(CommitError::UndecodedPayload);
        }
        match self.mode {
            EditMode::Text => Ok(self.buffer.as_bytes().to_vec()),
            EditMode::Hex => Ok(hex_codec::decode(&self.buffer)?),
        }
    }
}
