//! Field extraction rules.
//!
//! Every field has an ordered list of candidate patterns. Candidates are tried
//! in order against the whole input; within a candidate, occurrences are
//! scanned front to back and the first capture the candidate accepts wins.
//! Nothing here evaluates the input, it is text matching only.

use crate::classify::InputMode;
use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;
use text_size::{TextRange, TextSize};

/// A descriptor field that can be read from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Field {
    Name,
    Width,
    Height,
    BackgroundColor,
    ScriptFileName,
    CanvasId,
}

impl Field {
    /// The fields looked up for an input of the given shape, in report order.
    pub fn for_mode(mode: InputMode) -> &'static [Field] {
        match mode {
            InputMode::DialectSource => &[
                Field::Name,
                Field::Width,
                Field::Height,
                Field::BackgroundColor,
            ],
            InputMode::MarkupPair => &[
                Field::Name,
                Field::Width,
                Field::Height,
                Field::BackgroundColor,
                Field::ScriptFileName,
                Field::CanvasId,
            ],
        }
    }

    /// The camelCase key used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Width => "width",
            Field::Height => "height",
            Field::BackgroundColor => "backgroundColor",
            Field::ScriptFileName => "scriptFileName",
            Field::CanvasId => "canvasId",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured value together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RawMatch {
    /// The accepted capture, trimmed.
    pub text: String,
    /// Byte range of the capture in the input.
    pub range: TextRange,
    /// Identifier of the candidate pattern that produced the capture.
    pub pattern: &'static str,
}

/// One candidate pattern for a field.
struct Candidate {
    id: &'static str,
    regex: Regex,
    accept: fn(&str) -> Option<String>,
}

impl Candidate {
    fn new(id: &'static str, pattern: &str, accept: fn(&str) -> Option<String>) -> Self {
        Self {
            id,
            regex: Regex::new(pattern).expect("candidate patterns are valid regexes"),
            accept,
        }
    }
}

const QUOTED_OR_CSS_VALUE: &str =
    r#"(?:'([^'\n]*)'|"([^"\n]*)"|((?:[^;,}'"\n()]|\([^)\n]*\))+))"#;

static NAME_DIALECT: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![
        Candidate::new(
            "function-declaration",
            r"\bfunction\s+([A-Z][\w$]*)\s*(?:<[^>(]*>)?\s*\(",
            accept_identifier,
        ),
        Candidate::new(
            "const-function",
            r"\b(?:const|let|var)\s+([A-Z][\w$]*)\s*(?::[^=;]+)?=\s*(?:async\s+)?(?:function\b|\([^()]*\)\s*(?::[^=;{]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
            accept_identifier,
        ),
        Candidate::new(
            "class-declaration",
            r"\bclass\s+([A-Za-z_$][\w$]*)",
            accept_identifier,
        ),
    ]
});

static NAME_MARKUP: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![Candidate::new(
        "document-title",
        r"(?is)<title\b[^>]*>([^<]*)</title>",
        accept_title,
    )]
});

static WIDTH_DIALECT: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![
        Candidate::new(
            "canvas-width-assignment",
            r"\bcanvas\.width\s*=\s*(\d+)\b",
            accept_dimension,
        ),
        Candidate::new(
            "canvas-ref-width-assignment",
            r"\b[\w$]*[cC]anvas[\w$]*(?:\.current)?\.width\s*=\s*(\d+)\b",
            accept_dimension,
        ),
    ]
});

static HEIGHT_DIALECT: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![
        Candidate::new(
            "canvas-height-assignment",
            r"\bcanvas\.height\s*=\s*(\d+)\b",
            accept_dimension,
        ),
        Candidate::new(
            "canvas-ref-height-assignment",
            r"\b[\w$]*[cC]anvas[\w$]*(?:\.current)?\.height\s*=\s*(\d+)\b",
            accept_dimension,
        ),
    ]
});

static WIDTH_MARKUP: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![Candidate::new(
        "canvas-width-attribute",
        r#"(?is)<canvas\b[^>]*?\swidth\s*=\s*["']?(\d+)"#,
        accept_dimension,
    )]
});

static HEIGHT_MARKUP: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![Candidate::new(
        "canvas-height-attribute",
        r#"(?is)<canvas\b[^>]*?\sheight\s*=\s*["']?(\d+)"#,
        accept_dimension,
    )]
});

static BACKGROUND: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![
        Candidate::new(
            "style-background",
            &format!(r"\bbackground\s*:\s*{QUOTED_OR_CSS_VALUE}"),
            accept_color,
        ),
        Candidate::new(
            "fill-style",
            r#"\bfillStyle\s*=\s*(?:'([^'\n]*)'|"([^"\n]*)"|`([^`\n]*)`)"#,
            accept_color,
        ),
        Candidate::new(
            "background-color",
            &format!(r"\bbackground(?:-c|C)olor\s*:\s*{QUOTED_OR_CSS_VALUE}"),
            accept_color,
        ),
    ]
});

static SCRIPT_FILE: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![Candidate::new(
        "external-script",
        r#"(?is)<script\b[^>]*?\ssrc\s*=\s*["']([^"']+)["']"#,
        accept_non_empty,
    )]
});

static CANVAS_ID: LazyLock<Vec<Candidate>> = LazyLock::new(|| {
    vec![Candidate::new(
        "canvas-id-attribute",
        r#"(?is)<canvas\b[^>]*?\sid\s*=\s*["']([^"']+)["']"#,
        accept_element_id,
    )]
});

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("hex color pattern is valid")
});
static FUNCTIONAL_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:rgba?|hsla?)\(\s*[0-9.%,\s/deg+-]+\)$")
        .expect("functional color pattern is valid")
});

/// CSS keywords that are accepted by `background` but are not colors.
const NON_COLOR_KEYWORDS: &[&str] = &[
    "none", "inherit", "initial", "unset", "revert", "auto", "url", "linear", "radial",
];

/// Extracts a single field from the input.
pub fn extract_field(source: &str, mode: InputMode, field: Field) -> Option<RawMatch> {
    let found = match (field, mode) {
        (Field::Name, InputMode::DialectSource) => first_match(source, NAME_DIALECT.iter()),
        (Field::Name, InputMode::MarkupPair) => {
            first_match(source, NAME_MARKUP.iter().chain(NAME_DIALECT.iter()))
        }
        (Field::Width, InputMode::DialectSource) => first_match(source, WIDTH_DIALECT.iter()),
        (Field::Width, InputMode::MarkupPair) => {
            first_match(source, WIDTH_MARKUP.iter().chain(WIDTH_DIALECT.iter()))
        }
        (Field::Height, InputMode::DialectSource) => first_match(source, HEIGHT_DIALECT.iter()),
        (Field::Height, InputMode::MarkupPair) => {
            first_match(source, HEIGHT_MARKUP.iter().chain(HEIGHT_DIALECT.iter()))
        }
        (Field::BackgroundColor, _) => first_match(source, BACKGROUND.iter()),
        (Field::ScriptFileName, InputMode::MarkupPair) => first_match(source, SCRIPT_FILE.iter()),
        (Field::CanvasId, InputMode::MarkupPair) => first_match(source, CANVAS_ID.iter()),
        (Field::ScriptFileName | Field::CanvasId, InputMode::DialectSource) => None,
    };

    match &found {
        Some(m) => tracing::debug!(%field, pattern = m.pattern, value = %m.text, "field matched"),
        None => tracing::debug!(%field, "no candidate matched"),
    }
    found
}

fn first_match<'a>(
    source: &str,
    candidates: impl Iterator<Item = &'a Candidate>,
) -> Option<RawMatch> {
    for candidate in candidates {
        for caps in candidate.regex.captures_iter(source) {
            let Some(group) = first_group(&caps) else {
                continue;
            };
            if let Some(text) = (candidate.accept)(group.as_str()) {
                return Some(RawMatch {
                    text,
                    range: TextRange::new(
                        TextSize::from(group.start() as u32),
                        TextSize::from(group.end() as u32),
                    ),
                    pattern: candidate.id,
                });
            }
        }
    }
    None
}

/// Returns the first capture group that took part in the match.
fn first_group<'h>(caps: &Captures<'h>) -> Option<regex::Match<'h>> {
    caps.iter().skip(1).flatten().next()
}

fn accept_identifier(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

fn accept_title(raw: &str) -> Option<String> {
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    title
        .chars()
        .any(|c| c.is_alphanumeric())
        .then_some(title)
}

fn accept_dimension(raw: &str) -> Option<String> {
    let value: u32 = raw.trim().parse().ok()?;
    (value > 0).then(|| value.to_string())
}

fn accept_non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

fn accept_element_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty() && !raw.contains(char::is_whitespace)).then(|| raw.to_string())
}

/// Accepts hex, functional (`rgb()`, `hsla()`, ...) and named color literals.
pub fn accept_color(raw: &str) -> Option<String> {
    let raw = raw.trim().trim_end_matches("!important").trim();
    if raw.is_empty() {
        return None;
    }

    if HEX_COLOR.is_match(raw) || FUNCTIONAL_COLOR.is_match(raw) {
        return Some(raw.to_string());
    }

    let is_named = raw.chars().all(|c| c.is_ascii_alphabetic())
        && !NON_COLOR_KEYWORDS
            .iter()
            .any(|keyword| raw.eq_ignore_ascii_case(keyword));
    is_named.then(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect(source: &str, field: Field) -> Option<String> {
        extract_field(source, InputMode::DialectSource, field).map(|m| m.text)
    }

    fn markup(source: &str, field: Field) -> Option<String> {
        extract_field(source, InputMode::MarkupPair, field).map(|m| m.text)
    }

    #[test]
    fn test_name_prefers_function_declaration() {
        let source = "class Helper {}\nexport default function Spinner() {}";
        assert_eq!(dialect(source, Field::Name).as_deref(), Some("Spinner"));
    }

    #[test]
    fn test_name_from_arrow_component() {
        let source = "class RibbonStrip {}\nconst DramaticRibbonFold = () => {\n  function animate() {}\n};";
        assert_eq!(
            dialect(source, Field::Name).as_deref(),
            Some("DramaticRibbonFold")
        );
    }

    #[test]
    fn test_name_from_typed_arrow_component() {
        let source = "const Waves: React.FC<Props> = ({ speed }) => null;";
        assert_eq!(dialect(source, Field::Name).as_deref(), Some("Waves"));
    }

    #[test]
    fn test_name_ignores_lowercase_helpers() {
        let source = "function animate() {}\nclass Foo {}";
        assert_eq!(dialect(source, Field::Name).as_deref(), Some("Foo"));
    }

    #[test]
    fn test_name_class_is_not_class_name_attribute() {
        let source = r#"<div className="wrapper"></div>"#;
        assert_eq!(dialect(source, Field::Name), None);
    }

    #[test]
    fn test_markup_title_wins() {
        let source = "<html><head><title>\n  Ribbon Fold\n</title></head></html>";
        assert_eq!(markup(source, Field::Name).as_deref(), Some("Ribbon Fold"));
    }

    #[test]
    fn test_dimensions_from_assignment() {
        let source = "canvas.width = 800;\ncanvas.height = 600;";
        assert_eq!(dialect(source, Field::Width).as_deref(), Some("800"));
        assert_eq!(dialect(source, Field::Height).as_deref(), Some("600"));
    }

    #[test]
    fn test_dimensions_from_ref_assignment() {
        let source = "canvasRef.current.width = 320;";
        assert_eq!(dialect(source, Field::Width).as_deref(), Some("320"));
        assert_eq!(dialect(source, Field::Height), None);
    }

    #[test]
    fn test_dimension_zero_is_a_miss() {
        assert_eq!(dialect("canvas.width = 0;", Field::Width), None);
        assert_eq!(dialect("canvas.width = 99999999999;", Field::Width), None);
    }

    #[test]
    fn test_dimension_expression_is_a_miss() {
        assert_eq!(dialect("canvas.width = window.innerWidth;", Field::Width), None);
    }

    #[test]
    fn test_markup_dimensions_from_attributes() {
        let source = r#"<canvas id="c" width="640" height='480'></canvas>"#;
        assert_eq!(markup(source, Field::Width).as_deref(), Some("640"));
        assert_eq!(markup(source, Field::Height).as_deref(), Some("480"));
    }

    #[test]
    fn test_markup_style_width_is_not_an_attribute() {
        let source = r#"<canvas style="width: 100px"></canvas>"#;
        assert_eq!(markup(source, Field::Width), None);
    }

    #[test]
    fn test_background_priority() {
        let source = "ctx.fillStyle = '#000000';\nstyle={{ background: '#112233' }}";
        assert_eq!(
            dialect(source, Field::BackgroundColor).as_deref(),
            Some("#112233")
        );
    }

    #[test]
    fn test_fill_style_skips_concatenated_strings() {
        let source = "ctx.fillStyle = 'rgba(0, 0, 0, ' + opacity + ')';\nctx.fillStyle = '#F0EEE6';";
        assert_eq!(
            dialect(source, Field::BackgroundColor).as_deref(),
            Some("#F0EEE6")
        );
    }

    #[test]
    fn test_background_color_declaration() {
        assert_eq!(
            dialect("body { background-color: rgb(10, 20, 30); }", Field::BackgroundColor)
                .as_deref(),
            Some("rgb(10, 20, 30)")
        );
        assert_eq!(
            dialect("style={{ backgroundColor: 'navy' }}", Field::BackgroundColor).as_deref(),
            Some("navy")
        );
    }

    #[test]
    fn test_background_keyword_is_not_a_color() {
        assert_eq!(dialect("background: none;", Field::BackgroundColor), None);
    }

    #[test]
    fn test_script_file_and_canvas_id_only_for_markup() {
        let source = r#"<canvas id="ribbonCanvas"></canvas><script src="ribbon-animation.js"></script>"#;
        assert_eq!(
            markup(source, Field::ScriptFileName).as_deref(),
            Some("ribbon-animation.js")
        );
        assert_eq!(markup(source, Field::CanvasId).as_deref(), Some("ribbonCanvas"));
        assert_eq!(dialect(source, Field::ScriptFileName), None);
        assert_eq!(dialect(source, Field::CanvasId), None);
    }

    #[test]
    fn test_match_range_points_at_capture() {
        let source = "canvas.width = 800;";
        let found = extract_field(source, InputMode::DialectSource, Field::Width).unwrap();
        assert_eq!(&source[found.range], "800");
        assert_eq!(found.pattern, "canvas-width-assignment");
    }

    #[test]
    fn test_accept_color() {
        assert_eq!(accept_color(" #abc ").as_deref(), Some("#abc"));
        assert_eq!(accept_color("#abcd").as_deref(), Some("#abcd"));
        assert_eq!(accept_color("#12345"), None);
        assert_eq!(
            accept_color("hsla(120, 50%, 50%, 0.3)").as_deref(),
            Some("hsla(120, 50%, 50%, 0.3)")
        );
        assert_eq!(accept_color("rgba(0, 0, 0, "), None);
        assert_eq!(accept_color("${color}"), None);
        assert_eq!(accept_color("white !important").as_deref(), Some("white"));
    }
}
