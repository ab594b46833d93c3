//! Field extraction for canvas animation components.
//!
//! This crate reads loosely structured source text and pulls out what is
//! needed to rebuild the animation as a standalone page:
//! - Input classification (component source vs. markup+script pair)
//! - Per-field pattern matching (name, canvas size, background, script file)
//! - Class-block scanning (constructor, property initializers, methods)
//!
//! Extraction is best effort. Misses are reported as `None`, never as errors;
//! the only failure is empty input.
//!
//! # Example
//!
//! ```
//! use canvas_extract::{extract, Field, InputMode};
//!
//! let source = r#"
//! const Spinner = () => {
//!     canvas.width = 400;
//!     class Dot { draw(ctx) { ctx.fill(); } }
//! };
//! "#;
//!
//! let result = extract(source).unwrap();
//! assert_eq!(result.mode, InputMode::DialectSource);
//! assert_eq!(result.text(Field::Name), Some("Spinner"));
//! assert_eq!(result.dimension(Field::Width), Some(400));
//! assert_eq!(result.classes[0].name, "Dot");
//! ```

mod classify;
mod error;
mod extraction;
mod patterns;
mod scan;

pub use classify::{classify, InputMode};
pub use error::ExtractError;
pub use extraction::ExtractionResult;
pub use patterns::{accept_color, extract_field, Field, RawMatch};
pub use scan::{
    literal_ranges, matching_delimiter, scan_classes, ClassBlock, FieldInitializer, MemberKind,
    MethodBlock,
};
pub use text_size::{TextRange, TextSize};

/// Classifies the input and runs every extraction rule for its shape.
///
/// Returns [`ExtractError::EmptyInput`] for empty or whitespace-only input.
pub fn extract(source: &str) -> Result<ExtractionResult, ExtractError> {
    if source.trim().is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let mode = classify(source);
    tracing::debug!(%mode, len = source.len(), "classified input");

    let fields = Field::for_mode(mode)
        .iter()
        .map(|&field| (field, extract_field(source, mode, field)))
        .collect();

    let classes = if mode.rewrites_classes() {
        scan_classes(source)
    } else {
        Vec::new()
    };

    Ok(ExtractionResult {
        mode,
        fields,
        classes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_empty() {
        assert_eq!(extract("").unwrap_err(), ExtractError::EmptyInput);
        assert_eq!(extract("  \n\t ").unwrap_err(), ExtractError::EmptyInput);
    }

    #[test]
    fn test_extract_unstructured() {
        let result = extract("x").unwrap();
        assert_eq!(result.mode, InputMode::DialectSource);
        assert_eq!(result.fields.len(), 4);
        assert_eq!(result.unresolved().count(), 4);
        assert!(result.classes.is_empty());
    }

    #[test]
    fn test_markup_skips_class_scan() {
        let source = "<!DOCTYPE html><script>class Foo { draw() {} }</script>";
        let result = extract(source).unwrap();
        assert_eq!(result.mode, InputMode::MarkupPair);
        assert!(result.classes.is_empty());
        assert_eq!(result.fields.len(), 6);
    }

    #[test]
    fn test_field_order_is_stable() {
        let result = extract("canvas.height = 10;").unwrap();
        let keys: Vec<_> = result.fields.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                Field::Name,
                Field::Width,
                Field::Height,
                Field::BackgroundColor
            ]
        );
        assert_eq!(result.dimension(Field::Height), Some(10));
        assert_eq!(
            result.unresolved().collect::<Vec<_>>(),
            vec![Field::Name, Field::Width, Field::BackgroundColor]
        );
    }
}
