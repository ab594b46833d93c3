//! Defaults for everything extraction could not resolve.

use crate::descriptor::{sanitize_identifier, ComponentDescriptor, ProcedureDefinition};
use canvas_extract::{ExtractionResult, Field};

/// Component name used when none can be extracted.
pub const DEFAULT_NAME: &str = "RibbonAnimation";
/// Canvas width and height used when none can be extracted.
pub const DEFAULT_DIMENSION: u32 = 550;
/// Background color used when none can be extracted.
pub const DEFAULT_BACKGROUND: &str = "#F0EEE6";
/// Canvas element id used when the input does not name one.
pub const DEFAULT_CANVAS_ID: &str = "animationCanvas";

/// What to emit when the input has no usable class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FallbackMode {
    /// An initializer plus empty `update` / `draw`: valid, draws nothing.
    #[default]
    Inert,
    /// A segment ribbon animation, so the page shows something.
    Synthesized,
}

/// Builds a complete descriptor from an extraction and rewritten procedures.
///
/// Every field missing from the extraction gets its default, and an empty
/// procedure list is replaced according to `mode`.
pub fn resolve_descriptor(
    extraction: &ExtractionResult,
    procedures: Vec<ProcedureDefinition>,
    mode: FallbackMode,
) -> ComponentDescriptor {
    let name = extraction
        .text(Field::Name)
        .and_then(sanitize_identifier)
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let procedures = if procedures.is_empty() {
        tracing::debug!(?mode, "no class found, using fallback procedures");
        fallback_procedures(&name, mode)
    } else {
        procedures
    };

    let descriptor = ComponentDescriptor {
        canvas_width: extraction
            .dimension(Field::Width)
            .unwrap_or(DEFAULT_DIMENSION),
        canvas_height: extraction
            .dimension(Field::Height)
            .unwrap_or(DEFAULT_DIMENSION),
        background_color: extraction
            .text(Field::BackgroundColor)
            .unwrap_or(DEFAULT_BACKGROUND)
            .to_string(),
        canvas_id: extraction
            .text(Field::CanvasId)
            .unwrap_or(DEFAULT_CANVAS_ID)
            .to_string(),
        script_reference: extraction.text(Field::ScriptFileName).map(str::to_string),
        name,
        procedures,
    };

    for field in extraction.unresolved() {
        tracing::debug!(%field, "field unresolved, default applied");
    }
    descriptor
}

/// Procedures emitted when no class was found.
pub fn fallback_procedures(owner: &str, mode: FallbackMode) -> Vec<ProcedureDefinition> {
    match mode {
        FallbackMode::Inert => vec![
            ProcedureDefinition::constructor(owner, Vec::new(), ""),
            ProcedureDefinition::method(owner, "update", vec!["time".to_string()], ""),
            ProcedureDefinition::method(owner, "draw", vec!["ctx".to_string()], ""),
        ],
        FallbackMode::Synthesized => vec![
            ProcedureDefinition::constructor(owner, Vec::new(), RIBBON_CONSTRUCTOR),
            ProcedureDefinition::method(owner, "initialize", Vec::new(), RIBBON_INITIALIZE),
            ProcedureDefinition::method(owner, "update", vec!["time".to_string()], RIBBON_UPDATE),
            ProcedureDefinition::method(owner, "draw", vec!["ctx".to_string()], RIBBON_DRAW),
        ],
    }
}

const RIBBON_CONSTRUCTOR: &str = "\
this.segments = [];
this.segmentCount = 30;
this.width = 100;
this.initialize();";

const RIBBON_INITIALIZE: &str = "\
for (var i = 0; i < this.segmentCount; i++) {
    this.segments.push({ x: 0, y: 0, angle: 0, width: this.width, depth: 0 });
}";

const RIBBON_UPDATE: &str = "\
var centerX = canvas.width / 2;
var centerY = canvas.height / 2;

for (var i = 0; i < this.segments.length; i++) {
    var t = i / (this.segments.length - 1);
    var segment = this.segments[i];

    var smoothTime = time * 0.25;
    var baseAngle = t * Math.PI * 6 + smoothTime;
    var foldPhase = Math.sin(smoothTime * 0.01 + t * Math.PI * 4);
    var heightPhase = Math.cos(smoothTime * 0.00375 + t * Math.PI * 3);

    var radius = 120 + foldPhase * 60;
    segment.x = centerX + Math.cos(baseAngle) * radius;
    segment.y = centerY + Math.sin(baseAngle) * radius + heightPhase * 30;
    segment.angle = baseAngle + foldPhase * Math.PI * 0.5;
    segment.width = this.width * (1 + foldPhase * 0.3);
    segment.depth = Math.sin(baseAngle + time * 0.15);
}";

const RIBBON_DRAW: &str = "\
ctx.lineWidth = 1.5;

for (var i = 0; i < this.segments.length - 1; i++) {
    var current = this.segments[i];
    var next = this.segments[i + 1];
    var opacity = 0.6 + (current.depth + 1) * 0.2;

    ctx.beginPath();
    ctx.moveTo(current.x - Math.sin(current.angle) * current.width / 2,
        current.y + Math.cos(current.angle) * current.width / 2);
    ctx.lineTo(next.x - Math.sin(next.angle) * next.width / 2,
        next.y + Math.cos(next.angle) * next.width / 2);
    ctx.moveTo(current.x + Math.sin(current.angle) * current.width / 2,
        current.y - Math.cos(current.angle) * current.width / 2);
    ctx.lineTo(next.x + Math.sin(next.angle) * next.width / 2,
        next.y - Math.cos(next.angle) * next.width / 2);
    ctx.strokeStyle = 'rgba(40, 40, 40, ' + opacity + ')';
    ctx.stroke();
}";
