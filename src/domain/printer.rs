//! Printer entity.
//!
//! [`Printer`] implements [`Resource`], so it can live in a
//! [`CollectionActor`](crate::framework::CollectionActor) or a REST collection.
//!
//! - Creation parameters: [`NewPrinter`]
//! - Update parameters: [`PrinterPatch`]

use super::patch::{self, double_option};
use super::{ModelId, PlasticId, PrinterId};
use crate::framework::{Resource, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Lifecycle status of a printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterStatus {
    #[default]
    Idle,
    Printing,
    Error,
}

impl Display for PrinterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PrinterStatus::Idle => "idle",
            PrinterStatus::Printing => "printing",
            PrinterStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// A 3D printer in the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Printer {
    pub id: PrinterId,
    pub brand: String,
    pub article_number: String,
    pub print_speed: u32,
    #[serde(default)]
    pub status: PrinterStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plastic_id: Option<PlasticId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_model_id: Option<ModelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printing_progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Printer {
    pub fn is_printing(&self) -> bool {
        self.status == PrinterStatus::Printing
    }
}

/// Payload for registering a new printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrinter {
    pub brand: String,
    pub article_number: String,
    pub print_speed: u32,
    #[serde(default)]
    pub status: PrinterStatus,
}

impl NewPrinter {
    /// An idle printer with nothing installed.
    pub fn new(brand: impl Into<String>, article_number: impl Into<String>, print_speed: u32) -> Self {
        Self {
            brand: brand.into(),
            article_number: article_number.into(),
            print_speed,
            status: PrinterStatus::Idle,
        }
    }
}

/// Partial update for a printer. Nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PrinterStatus>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub plastic_id: Option<Option<PlasticId>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub current_model_id: Option<Option<ModelId>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub printing_progress: Option<Option<u8>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<Option<String>>,
}

impl PrinterPatch {
    /// Restores every field the orchestration service may touch to `printer`'s values.
    pub fn restoring(printer: &Printer) -> Self {
        Self {
            status: Some(printer.status),
            plastic_id: Some(printer.plastic_id),
            current_model_id: Some(printer.current_model_id),
            printing_progress: Some(printer.printing_progress),
            error_message: Some(printer.error_message.clone()),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(brand) = &self.brand {
            patch::require_text("brand", brand)?;
        }
        if let Some(article_number) = &self.article_number {
            patch::require_text("articleNumber", article_number)?;
        }
        if self.print_speed == Some(0) {
            return Err("printSpeed must be greater than zero".to_string());
        }
        if let Some(Some(progress)) = self.printing_progress {
            if progress > 100 {
                return Err(format!("printingProgress must be within 0..=100, got {progress}"));
            }
        }
        Ok(())
    }
}

impl Resource for Printer {
    const COLLECTION: &'static str = "printers";
    type Id = PrinterId;
    type Draft = NewPrinter;
    type Patch = PrinterPatch;

    fn id(&self) -> PrinterId {
        self.id
    }

    fn validate_draft(draft: &NewPrinter) -> Result<(), StoreError> {
        patch::require_text("brand", &draft.brand)
            .and_then(|_| patch::require_text("articleNumber", &draft.article_number))
            .and_then(|_| {
                if draft.print_speed == 0 {
                    Err("printSpeed must be greater than zero".to_string())
                } else {
                    Ok(())
                }
            })
            .map_err(StoreError::Invalid)
    }

    fn from_draft(id: PrinterId, draft: NewPrinter) -> Self {
        Self {
            id,
            brand: draft.brand,
            article_number: draft.article_number,
            print_speed: draft.print_speed,
            status: draft.status,
            plastic_id: None,
            current_model_id: None,
            printing_progress: None,
            error_message: None,
        }
    }

    /// # Fields Updated
    /// Any field present in the patch; nullable fields are cleared by `Some(None)`.
    fn apply_patch(&mut self, update: PrinterPatch) -> Result<(), StoreError> {
        update.validate().map_err(StoreError::Invalid)?;
        if let Some(brand) = update.brand {
            self.brand = brand;
        }
        if let Some(article_number) = update.article_number {
            self.article_number = article_number;
        }
        if let Some(print_speed) = update.print_speed {
            self.print_speed = print_speed;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        patch::apply(&mut self.plastic_id, update.plastic_id);
        patch::apply(&mut self.current_model_id, update.current_model_id);
        patch::apply(&mut self.printing_progress, update.printing_progress);
        patch::apply(&mut self.error_message, update.error_message);
        Ok(())
    }
}
