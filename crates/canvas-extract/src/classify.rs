//! Input shape detection.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static CANVAS_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<canvas\b").expect("canvas tag pattern is valid"));
static EXTERNAL_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<script\b[^>]*\bsrc\s*="#).expect("script tag pattern is valid")
});

/// The shape of a conversion input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum InputMode {
    /// A markup document that already references an external script.
    MarkupPair,
    /// A component-dialect snippet (React-style component, plain classes, ...).
    DialectSource,
}

impl InputMode {
    /// Whether the class rewriter runs for this mode.
    pub fn rewrites_classes(self) -> bool {
        matches!(self, Self::DialectSource)
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkupPair => f.write_str("markup+script"),
            Self::DialectSource => f.write_str("component source"),
        }
    }
}

/// Classifies raw input text.
///
/// Input is a markup pair when it opens with a doctype or `<html>` root, or
/// when it carries both a `<canvas>` element and an external `<script src>`
/// reference. Everything else is treated as component source.
pub fn classify(source: &str) -> InputMode {
    let head = source.trim_start();
    if starts_with_ignore_case(head, "<!doctype") || starts_with_ignore_case(head, "<html") {
        return InputMode::MarkupPair;
    }

    if CANVAS_TAG.is_match(source) && EXTERNAL_SCRIPT.is_match(source) {
        return InputMode::MarkupPair;
    }

    InputMode::DialectSource
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
