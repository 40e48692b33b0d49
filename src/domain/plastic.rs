//! Plastic (filament spool) entity.

use super::patch::{self, double_option};
use super::{PlasticId, PrinterId};
use crate::framework::{Resource, StoreError};
use serde::{Deserialize, Serialize};

/// A filament spool with a finite remaining length.
///
/// A spool is installed in at most one printer at a time; `is_installed`
/// and `printer_id` form the back half of that cross-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plastic {
    pub id: PlasticId,
    pub material: String,
    pub color: String,
    pub length: f64,
    #[serde(default)]
    pub is_installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printer_id: Option<PrinterId>,
}

impl Plastic {
    /// True when the spool is loaded into a printer other than `printer_id`.
    pub fn is_installed_elsewhere(&self, printer_id: PrinterId) -> bool {
        self.is_installed && self.printer_id != Some(printer_id)
    }
}

/// Payload for adding a spool to the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlastic {
    pub material: String,
    pub color: String,
    pub length: f64,
    #[serde(default)]
    pub is_installed: bool,
}

impl NewPlastic {
    pub fn new(material: impl Into<String>, color: impl Into<String>, length: f64) -> Self {
        Self {
            material: material.into(),
            color: color.into(),
            length,
            is_installed: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlasticPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_installed: Option<bool>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub printer_id: Option<Option<PrinterId>>,
}

impl PlasticPatch {
    /// Marks the spool as loaded into `printer_id`.
    pub fn installed_in(printer_id: PrinterId) -> Self {
        Self {
            is_installed: Some(true),
            printer_id: Some(Some(printer_id)),
            ..Default::default()
        }
    }

    /// Clears the installed flag and the back-reference.
    pub fn released() -> Self {
        Self {
            is_installed: Some(false),
            printer_id: Some(None),
            ..Default::default()
        }
    }

    /// Restores the fields the orchestration service may touch.
    pub fn restoring(plastic: &Plastic) -> Self {
        Self {
            length: Some(plastic.length),
            is_installed: Some(plastic.is_installed),
            printer_id: Some(plastic.printer_id),
            ..Default::default()
        }
    }
}

impl Resource for Plastic {
    const COLLECTION: &'static str = "plastics";
    type Id = PlasticId;
    type Draft = NewPlastic;
    type Patch = PlasticPatch;

    fn id(&self) -> PlasticId {
        self.id
    }

    fn validate_draft(draft: &NewPlastic) -> Result<(), StoreError> {
        patch::require_text("material", &draft.material)
            .and_then(|_| patch::require_text("color", &draft.color))
            .and_then(|_| patch::require_non_negative("length", draft.length))
            .map_err(StoreError::Invalid)
    }

    fn from_draft(id: PlasticId, draft: NewPlastic) -> Self {
        Self {
            id,
            material: draft.material,
            color: draft.color,
            length: draft.length,
            is_installed: draft.is_installed,
            printer_id: None,
        }
    }

    fn apply_patch(&mut self, update: PlasticPatch) -> Result<(), StoreError> {
        if let Some(material) = &update.material {
            patch::require_text("material", material).map_err(StoreError::Invalid)?;
        }
        if let Some(color) = &update.color {
            patch::require_text("color", color).map_err(StoreError::Invalid)?;
        }
        if let Some(length) = update.length {
            patch::require_non_negative("length", length).map_err(StoreError::Invalid)?;
        }

        if let Some(material) = update.material {
            self.material = material;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(length) = update.length {
            self.length = length;
        }
        if let Some(is_installed) = update.is_installed {
            self.is_installed = is_installed;
        }
        patch::apply(&mut self.printer_id, update.printer_id);
        Ok(())
    }
}
