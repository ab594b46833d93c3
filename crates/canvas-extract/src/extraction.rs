//! The extraction result type.

use crate::classify::InputMode;
use crate::patterns::{Field, RawMatch};
use crate::scan::ClassBlock;
use indexmap::IndexMap;

/// Everything read from one input, before defaults are applied.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtractionResult {
    /// The detected input shape.
    pub mode: InputMode,
    /// One entry per field of the mode's rule set; misses are `None`.
    pub fields: IndexMap<Field, Option<RawMatch>>,
    /// Class blocks found in component source. Always empty for markup pairs.
    pub classes: Vec<ClassBlock>,
}

impl ExtractionResult {
    /// Returns the match for a field, if the field was found.
    pub fn get(&self, field: Field) -> Option<&RawMatch> {
        self.fields.get(&field).and_then(Option::as_ref)
    }

    /// Returns the matched text for a field.
    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).map(|m| m.text.as_str())
    }

    /// Returns a positive integer field (`Width`, `Height`).
    pub fn dimension(&self, field: Field) -> Option<u32> {
        self.text(field)
            .and_then(|text| text.parse().ok())
            .filter(|&value| value > 0)
    }

    /// Fields that did not match anything, in report order.
    pub fn unresolved(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields
            .iter()
            .filter(|(_, found)| found.is_none())
            .map(|(field, _)| *field)
    }
}
