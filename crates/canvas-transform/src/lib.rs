//! Standalone page generation for canvas animation components.
//!
//! This crate turns the output of `canvas-extract` into two documents:
//! a markup page hosting a `<canvas>` element, and a browser script that
//! recreates the animation without any framework.
//!
//! The pipeline is:
//! 1. Extract fields and class blocks from the source
//! 2. Rewrite each class into constructor and prototype procedures
//! 3. Resolve a descriptor, defaulting whatever was not found
//! 4. Render both documents from the descriptor
//!
//! # Example
//!
//! ```
//! use canvas_transform::{convert, ConvertOptions};
//!
//! let source = "const Foo = () => { class Dot { draw(ctx) { ctx.fill(); } } };";
//! let result = convert(source, &ConvertOptions::default()).unwrap();
//!
//! assert_eq!(result.artifacts.markup_file_name, "foo.html");
//! assert!(result.artifacts.script_text.contains("Dot.prototype.draw = function(ctx) {"));
//! ```

mod descriptor;
mod fallback;
mod rewrite;
mod template;
mod transform;

pub use descriptor::{
    sanitize_identifier, ComponentDescriptor, OutputArtifacts, ProcedureDefinition, ProcedureKind,
};
pub use fallback::{
    fallback_procedures, resolve_descriptor, FallbackMode, DEFAULT_BACKGROUND, DEFAULT_CANVAS_ID,
    DEFAULT_DIMENSION, DEFAULT_NAME,
};
pub use rewrite::{parameter_texts, rewrite_body, rewrite_class, rewrite_classes};
pub use template::{generate, render_markup, render_script, TemplateOptions, TIME_STEP};
pub use transform::{convert, ConvertError, ConvertOptions, ConvertResult};

/// A complete component source for trying the converter out.
pub const SAMPLE_COMPONENT: &str = include_str!("../samples/dramatic_ribbon_fold.tsx");
