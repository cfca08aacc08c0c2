use std::path::{Path, PathBuf};

use mashup_contracts::assets::{ImageAsset, SlotRole};
use tracing::{debug, warn};

use crate::ingest::{ingest, SelectedFile};
use crate::view::{SlotView, UPLOAD_HINT};

/// Mirrors a file input element: picking the file it already holds fires no
/// change, so the value has to be reset before the same file can be picked
/// again.
#[derive(Debug, Default, Clone)]
pub struct FilePicker {
    value: Option<PathBuf>,
}

impl FilePicker {
    pub fn choose(&mut self, file: &SelectedFile) -> Option<SelectedFile> {
        if self.value.as_deref() == Some(file.path.as_path()) {
            return None;
        }
        self.value = Some(file.path.clone());
        Some(file.clone())
    }

    pub fn reset(&mut self) {
        self.value = None;
    }

    pub fn value(&self) -> Option<&Path> {
        self.value.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange {
    /// The picker ignored the gesture.
    Unchanged,
    Populated,
    Cleared,
}

#[derive(Debug, Clone)]
pub struct UploadSlot {
    role: SlotRole,
    asset: Option<ImageAsset>,
    picker: FilePicker,
}

impl UploadSlot {
    pub fn new(role: SlotRole) -> Self {
        Self {
            role,
            asset: None,
            picker: FilePicker::default(),
        }
    }

    pub fn role(&self) -> SlotRole {
        self.role
    }

    pub fn asset(&self) -> Option<&ImageAsset> {
        self.asset.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.asset.is_some()
    }

    pub fn picker(&self) -> &FilePicker {
        &self.picker
    }

    /// A failed read leaves the slot empty with a reset picker, as if nothing
    /// had been chosen; the failure is only logged.
    pub fn select(&mut self, file: &SelectedFile) -> SlotChange {
        let Some(chosen) = self.picker.choose(file) else {
            debug!(
                slot = %self.role,
                path = %file.path.display(),
                "picker ignored repeat selection"
            );
            return SlotChange::Unchanged;
        };
        match ingest(&chosen) {
            Ok(asset) => {
                debug!(
                    slot = %self.role,
                    mime = asset.mime_type(),
                    bytes = asset.byte_len(),
                    "image ingested"
                );
                self.asset = Some(asset);
                SlotChange::Populated
            }
            Err(err) => {
                warn!(slot = %self.role, error = %err, "error processing file");
                self.asset = None;
                self.picker.reset();
                SlotChange::Cleared
            }
        }
    }

    pub fn remove(&mut self) -> SlotChange {
        self.asset = None;
        self.picker.reset();
        SlotChange::Cleared
    }

    pub fn render(&self) -> SlotView {
        let title = self.role.title();
        match &self.asset {
            None => SlotView::Empty {
                role: self.role,
                title,
                hint: UPLOAD_HINT,
            },
            Some(asset) => SlotView::Populated {
                role: self.role,
                title,
                preview_data_url: asset.data_url().to_string(),
                mime_type: asset.mime_type().to_string(),
                byte_len: asset.byte_len(),
                remove_label: format!("Remove {title} image"),
            },
        }
    }
}
