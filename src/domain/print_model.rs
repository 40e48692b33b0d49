//! Print model entity (a sliced object waiting to be printed).

use super::patch::{self, double_option};
use super::{ModelId, PrinterId};
use crate::framework::{Resource, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    #[default]
    Created,
    Printing,
    Completed,
}

impl Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ModelStatus::Created => "created",
            ModelStatus::Printing => "printing",
            ModelStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// A model assigned (or assignable) to a printer.
///
/// `status == Printing` covers both the active job and models waiting in a
/// printer's queue; the printer's `current_model_id` tells them apart.
/// `queued_at` is stamped when a printer accepts the model and orders the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintModel {
    pub id: ModelId,
    pub name: String,
    pub creation_date: DateTime<Utc>,
    pub perimeter_length: f64,
    #[serde(default)]
    pub status: ModelStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plastic_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printer_id: Option<PrinterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_at: Option<DateTime<Utc>>,
}

impl PrintModel {
    /// True when the model is printing or queued on `printer_id`.
    pub fn is_assigned_to(&self, printer_id: PrinterId) -> bool {
        self.status == ModelStatus::Printing && self.printer_id == Some(printer_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrintModel {
    pub name: String,
    pub creation_date: DateTime<Utc>,
    pub perimeter_length: f64,
    #[serde(default)]
    pub status: ModelStatus,
}

impl NewPrintModel {
    /// A freshly created model, stamped with the current time.
    pub fn new(name: impl Into<String>, perimeter_length: f64) -> Self {
        Self {
            name: name.into(),
            creation_date: Utc::now(),
            perimeter_length,
            status: ModelStatus::Created,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perimeter_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ModelStatus>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub plastic_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub printer_id: Option<Option<PrinterId>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub queued_at: Option<Option<DateTime<Utc>>>,
}

impl ModelPatch {
    /// Back to `created`, detached from any printer.
    pub fn released() -> Self {
        Self {
            status: Some(ModelStatus::Created),
            printer_id: Some(None),
            queued_at: Some(None),
            ..Default::default()
        }
    }

    pub fn restoring(model: &PrintModel) -> Self {
        Self {
            status: Some(model.status),
            plastic_color: Some(model.plastic_color.clone()),
            printer_id: Some(model.printer_id),
            queued_at: Some(model.queued_at),
            ..Default::default()
        }
    }
}

impl Resource for PrintModel {
    const COLLECTION: &'static str = "models";
    type Id = ModelId;
    type Draft = NewPrintModel;
    type Patch = ModelPatch;

    fn id(&self) -> ModelId {
        self.id
    }

    fn validate_draft(draft: &NewPrintModel) -> Result<(), StoreError> {
        patch::require_text("name", &draft.name)
            .and_then(|_| patch::require_positive("perimeterLength", draft.perimeter_length))
            .map_err(StoreError::Invalid)
    }

    fn from_draft(id: ModelId, draft: NewPrintModel) -> Self {
        Self {
            id,
            name: draft.name,
            creation_date: draft.creation_date,
            perimeter_length: draft.perimeter_length,
            status: draft.status,
            plastic_color: None,
            printer_id: None,
            queued_at: None,
        }
    }

    fn apply_patch(&mut self, update: ModelPatch) -> Result<(), StoreError> {
        if let Some(name) = &update.name {
            patch::require_text("name", name).map_err(StoreError::Invalid)?;
        }
        if let Some(perimeter_length) = update.perimeter_length {
            patch::require_positive("perimeterLength", perimeter_length)
                .map_err(StoreError::Invalid)?;
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(perimeter_length) = update.perimeter_length {
            self.perimeter_length = perimeter_length;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        patch::apply(&mut self.plastic_color, update.plastic_color);
        patch::apply(&mut self.printer_id, update.printer_id);
        patch::apply(&mut self.queued_at, update.queued_at);
        Ok(())
    }
}
