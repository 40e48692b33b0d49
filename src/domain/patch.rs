//! Serde helpers for nullable patch fields.
//!
//! A patch field of type `Option<Option<T>>` has three states:
//! absent (`None`, leave unchanged), `Some(None)` (clear, sent as `null`)
//! and `Some(Some(v))` (set).

use serde::{Deserialize, Deserializer};

/// Deserializes a present field (including `null`) as `Some(..)`.
///
/// Combine with `#[serde(default)]` so an absent field stays `None`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Applies a nullable patch field to its target.
pub(crate) fn apply<T>(target: &mut Option<T>, field: Option<Option<T>>) {
    if let Some(value) = field {
        *target = value;
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be blank"))
    } else {
        Ok(())
    }
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{field} must be a non-negative number, got {value}"))
    }
}

pub(crate) fn require_positive(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{field} must be a positive number, got {value}"))
    }
}
