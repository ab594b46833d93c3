//! The conversion pipeline.

use crate::descriptor::{ComponentDescriptor, OutputArtifacts};
use crate::fallback::{resolve_descriptor, FallbackMode};
use crate::rewrite::rewrite_classes;
use crate::template::{generate, TemplateOptions};
use canvas_extract::{extract, ExtractError, ExtractionResult};
use thiserror::Error;

/// Options for a conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// What to emit when no class is found.
    pub fallback: FallbackMode,
    /// Generation options.
    pub template: TemplateOptions,
}

/// Everything produced by one conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// The two generated documents.
    pub artifacts: OutputArtifacts,
    /// The resolved descriptor the documents were generated from.
    pub descriptor: ComponentDescriptor,
    /// Raw extraction, kept for diagnostics.
    pub extraction: ExtractionResult,
}

/// Conversion failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("input is empty: paste a component or a markup document first")]
    EmptyInput,
}

impl From<ExtractError> for ConvertError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::EmptyInput => ConvertError::EmptyInput,
        }
    }
}

/// Converts one source text into a markup document and a script document.
///
/// Any non-empty input succeeds: whatever cannot be extracted is defaulted.
/// The result depends only on `source` and `options`.
pub fn convert(source: &str, options: &ConvertOptions) -> Result<ConvertResult, ConvertError> {
    let extraction = extract(source)?;

    let procedures = if extraction.mode.rewrites_classes() {
        rewrite_classes(&extraction.classes)
    } else {
        Vec::new()
    };

    let descriptor = resolve_descriptor(&extraction, procedures, options.fallback);
    let artifacts = generate(&descriptor, &options.template);

    tracing::trace!(
        markup = %artifacts.markup_file_name,
        script = %artifacts.script_file_name,
        "generated documents"
    );

    Ok(ConvertResult {
        artifacts,
        descriptor,
        extraction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_error() {
        let err = convert("   ", &ConvertOptions::default()).unwrap_err();
        assert_eq!(err, ConvertError::EmptyInput);
        assert_eq!(
            err.to_string(),
            "input is empty: paste a component or a markup document first"
        );
    }

    #[test]
    fn test_markup_input_uses_fallback() {
        let source = "<!DOCTYPE html>\n<title>Demo</title>\n<script src=\"demo.js\"></script>";
        let result = convert(source, &ConvertOptions::default()).unwrap();
        assert_eq!(result.descriptor.name, "Demo");
        assert_eq!(result.descriptor.procedures.len(), 3);
        assert_eq!(result.descriptor.procedures[0].owner, "Demo");
    }
}
