//! Output formatting.

use crate::cli::OutputFormat;
use crate::orchestrator::FileOutcome;
use canvas_extract::{Field, InputMode, TextSize};
use canvas_transform::{ComponentDescriptor, ConvertResult, OutputArtifacts};
use serde::Serialize;

/// One input as reported in JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedConversion<'a> {
    pub input: &'a str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentSummary<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<&'a OutputArtifacts>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub written: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldReport>,
}

/// The descriptor without procedure bodies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSummary<'a> {
    pub name: &'a str,
    pub mode: InputMode,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background_color: &'a str,
    pub canvas_id: &'a str,
    pub owners: Vec<&'a str>,
    pub procedure_count: usize,
}

impl<'a> ComponentSummary<'a> {
    fn new(result: &'a ConvertResult) -> Self {
        let descriptor = &result.descriptor;
        Self {
            name: &descriptor.name,
            mode: result.extraction.mode,
            canvas_width: descriptor.canvas_width,
            canvas_height: descriptor.canvas_height,
            background_color: &descriptor.background_color,
            canvas_id: &descriptor.canvas_id,
            owners: descriptor.owners(),
            procedure_count: descriptor.procedures.len(),
        }
    }
}

/// Where a resolved field value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub field: Field,
    pub value: String,
    /// The raw captured text, when a pattern matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
    /// Pattern identifier, or `default`.
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// A position in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// Byte offset.
    pub offset: u32,
}

impl Position {
    /// Computes the line and column of a byte offset.
    pub fn at(source: &str, offset: TextSize) -> Self {
        let offset_usize = usize::from(offset).min(source.len());
        let before = source.get(..offset_usize).unwrap_or("");
        let line = before.matches('\n').count() as u32 + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() as u32 + 1;
        Self {
            line,
            column,
            offset: u32::from(offset),
        }
    }
}

/// Lists every extracted field with its resolved value and origin.
pub fn explain_fields(result: &ConvertResult, source: &str) -> Vec<FieldReport> {
    result
        .extraction
        .fields
        .iter()
        .map(|(&field, raw)| FieldReport {
            field,
            value: resolved_value(&result.descriptor, field),
            matched: raw.as_ref().map(|m| m.text.clone()),
            origin: raw
                .as_ref()
                .map_or_else(|| "default".to_string(), |m| m.pattern.to_string()),
            position: raw
                .as_ref()
                .map(|m| Position::at(source, m.range.start())),
        })
        .collect()
}

fn resolved_value(descriptor: &ComponentDescriptor, field: Field) -> String {
    match field {
        Field::Name => descriptor.name.clone(),
        Field::Width => descriptor.canvas_width.to_string(),
        Field::Height => descriptor.canvas_height.to_string(),
        Field::BackgroundColor => descriptor.background_color.clone(),
        Field::ScriptFileName => descriptor
            .script_reference
            .clone()
            .unwrap_or_else(|| descriptor.script_file_name()),
        Field::CanvasId => descriptor.canvas_id.clone(),
    }
}

/// Formats conversion outcomes for output.
pub struct Formatter {
    format: OutputFormat,
    explain: bool,
    documents: bool,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            explain: false,
            documents: false,
        }
    }

    /// Includes per-field origins.
    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    /// Includes the generated documents in human and JSON output.
    pub fn with_documents(mut self, documents: bool) -> Self {
        self.documents = documents;
        self
    }

    /// Formats all outcomes.
    pub fn format(&self, outcomes: &[FileOutcome]) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(outcomes),
            OutputFormat::Json => self.format_json(outcomes),
            OutputFormat::Machine => self.format_machine(outcomes),
        }
    }

    /// Formats as human-readable output.
    fn format_human(&self, outcomes: &[FileOutcome]) -> String {
        let mut output = String::new();

        for outcome in outcomes {
            output.push_str(&format!("{}\n", outcome.label));
            let result = match &outcome.result {
                Ok(result) => result,
                Err(err) => {
                    output.push_str(&format!("  Error: {}\n", err));
                    for path in &outcome.written {
                        output.push_str(&format!("  wrote {}\n", path));
                    }
                    output.push('\n');
                    continue;
                }
            };

            let descriptor = &result.descriptor;
            let artifacts = &result.artifacts;
            output.push_str(&format!(
                "  {} -> {}, {}\n",
                result.extraction.mode, artifacts.markup_file_name, artifacts.script_file_name
            ));
            output.push_str(&format!(
                "  canvas {}x{}, background {}, {} {} ({})\n",
                descriptor.canvas_width,
                descriptor.canvas_height,
                descriptor.background_color,
                descriptor.procedures.len(),
                if descriptor.procedures.len() == 1 {
                    "procedure"
                } else {
                    "procedures"
                },
                descriptor.owners().join(", ")
            ));
            for path in &outcome.written {
                output.push_str(&format!("  wrote {}\n", path));
            }

            if self.explain {
                for report in explain_fields(result, &outcome.source) {
                    let origin = match report.position {
                        Some(pos) => {
                            format!("{}:{} {}", pos.line, pos.column, report.origin)
                        }
                        None => report.origin.clone(),
                    };
                    output.push_str(&format!(
                        "  {:<18}{:<24}{}\n",
                        report.field.as_str(),
                        report.value,
                        origin
                    ));
                }
            }

            if self.documents {
                output.push_str(&format!(
                    "\n--- {} ---\n{}",
                    artifacts.markup_file_name, artifacts.markup_text
                ));
                output.push_str(&format!(
                    "\n--- {} ---\n{}",
                    artifacts.script_file_name, artifacts.script_text
                ));
            }
            output.push('\n');
        }

        output
    }

    /// Formats as JSON output.
    fn format_json(&self, outcomes: &[FileOutcome]) -> String {
        let formatted = self.format_json_outcomes(outcomes);
        let mut output = serde_json::to_string_pretty(&formatted).unwrap_or_default();
        output.push('\n');
        output
    }

    /// Formats outcomes into JSON-ready structs.
    pub fn format_json_outcomes<'a>(
        &self,
        outcomes: &'a [FileOutcome],
    ) -> Vec<FormattedConversion<'a>> {
        outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(result) => FormattedConversion {
                    input: &outcome.label,
                    status: "converted",
                    error: None,
                    component: Some(ComponentSummary::new(result)),
                    artifacts: self.documents.then_some(&result.artifacts),
                    written: outcome.written.iter().map(|p| p.to_string()).collect(),
                    fields: if self.explain {
                        explain_fields(result, &outcome.source)
                    } else {
                        Vec::new()
                    },
                },
                Err(err) => FormattedConversion {
                    input: &outcome.label,
                    status: "failed",
                    error: Some(err.to_string()),
                    component: None,
                    artifacts: None,
                    written: outcome.written.iter().map(|p| p.to_string()).collect(),
                    fields: Vec::new(),
                },
            })
            .collect()
    }

    /// Formats as machine-readable output: one tab-separated record per input.
    fn format_machine(&self, outcomes: &[FileOutcome]) -> String {
        let mut output = String::new();

        for outcome in outcomes {
            match &outcome.result {
                Ok(result) => {
                    let descriptor = &result.descriptor;
                    output.push_str(&format!(
                        "OK\t{}\t{}\t{}\t{}x{}\t{}\t{}\n",
                        outcome.label,
                        result.artifacts.markup_file_name,
                        result.artifacts.script_file_name,
                        descriptor.canvas_width,
                        descriptor.canvas_height,
                        descriptor.background_color,
                        descriptor.procedures.len()
                    ));
                }
                Err(err) => {
                    output.push_str(&format!("FAILED\t{}\t{}\n", outcome.label, err));
                }
            }
        }

        output
    }
}

/// Summary of a conversion run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Number of inputs converted.
    pub converted: usize,
    /// Number of inputs that failed.
    pub failed: usize,
}

impl ConversionSummary {
    /// Counts outcomes.
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        Self {
            converted: outcomes.len() - failed,
            failed,
        }
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        let input_word = if self.converted == 1 {
            "input"
        } else {
            "inputs"
        };

        format!(
            "====================================\nstandalone-canvas converted {} {}, {} failed",
            self.converted, input_word, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::OrchestratorError;
    use canvas_transform::{convert, ConvertError, ConvertOptions};
    use pretty_assertions::assert_eq;

    const FOO: &str = "class Foo {\n  draw(ctx) { ctx.fill(); }\n}\ncanvas.width = 320;\n";

    fn converted(source: &str) -> FileOutcome {
        FileOutcome {
            label: "Foo.jsx".to_string(),
            source: source.to_string(),
            result: Ok(convert(source, &ConvertOptions::default()).unwrap()),
            written: Vec::new(),
        }
    }

    fn failed() -> FileOutcome {
        FileOutcome {
            label: "Empty.jsx".to_string(),
            source: String::new(),
            result: Err(OrchestratorError::Convert(ConvertError::EmptyInput)),
            written: Vec::new(),
        }
    }

    #[test]
    fn test_position_at() {
        let source = "ab\ncdé\nf";
        assert_eq!(
            Position::at(source, TextSize::from(0)),
            Position { line: 1, column: 1, offset: 0 }
        );
        assert_eq!(
            Position::at(source, TextSize::from(4)),
            Position { line: 2, column: 2, offset: 4 }
        );
        assert_eq!(
            Position::at(source, TextSize::from(8)),
            Position { line: 3, column: 1, offset: 8 }
        );
    }

    #[test]
    fn test_explain_fields() {
        let outcome = converted(FOO);
        let Ok(result) = &outcome.result else {
            unreachable!()
        };
        let reports = explain_fields(result, FOO);

        let width = reports.iter().find(|r| r.field == Field::Width).unwrap();
        assert_eq!(width.value, "320");
        assert_eq!(width.origin, "canvas-width-assignment");
        assert_eq!(width.position.map(|p| (p.line, p.column)), Some((4, 16)));

        let background = reports
            .iter()
            .find(|r| r.field == Field::BackgroundColor)
            .unwrap();
        assert_eq!(background.value, "#F0EEE6");
        assert_eq!(background.origin, "default");
        assert_eq!(background.position, None);
    }

    #[test]
    fn test_format_human() {
        let formatter = Formatter::new(OutputFormat::Human).with_explain(true);
        let output = formatter.format(&[converted(FOO), failed()]);

        assert!(output.contains("Foo.jsx\n  component source -> foo.html, foo.js\n"));
        assert!(output.contains("  canvas 320x550, background #F0EEE6, 2 procedures (Foo)\n"));
        assert!(output.contains("4:16 canvas-width-assignment"));
        assert!(output.contains("Empty.jsx\n  Error: input is empty"));
        assert!(!output.contains("--- foo.html ---"));
    }

    #[test]
    fn test_format_human_with_documents() {
        let formatter = Formatter::new(OutputFormat::Human).with_documents(true);
        let output = formatter.format(&[converted(FOO)]);
        assert!(output.contains("\n--- foo.html ---\n<!DOCTYPE html>"));
        assert!(output.contains("\n--- foo.js ---\n// Foo"));
    }

    #[test]
    fn test_format_json() {
        let formatter = Formatter::new(OutputFormat::Json);
        let output = formatter.format(&[converted(FOO), failed()]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value[0]["status"], "converted");
        assert_eq!(value[0]["component"]["name"], "Foo");
        assert_eq!(value[0]["component"]["canvasWidth"], 320);
        assert_eq!(value[0]["component"]["mode"], "dialectSource");
        assert!(value[0].get("artifacts").is_none());
        assert_eq!(value[1]["status"], "failed");
        assert!(value[1]["error"].as_str().unwrap().starts_with("input is empty"));
    }

    #[test]
    fn test_format_machine() {
        let formatter = Formatter::new(OutputFormat::Machine);
        let output = formatter.format(&[converted(FOO), failed()]);
        assert_eq!(
            output,
            "OK\tFoo.jsx\tfoo.html\tfoo.js\t320x550\t#F0EEE6\t2\n\
             FAILED\tEmpty.jsx\tinput is empty: paste a component or a markup document first\n"
        );
    }

    #[test]
    fn test_format_machine_keeps_spaced_colors_in_one_field() {
        let source = "body { background-color: rgb(10, 20, 30); }\nclass Foo { draw(ctx) {} }";
        let output = Formatter::new(OutputFormat::Machine).format(&[converted(source)]);
        let fields: Vec<&str> = output.trim_end().split('\t').collect();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[5], "rgb(10, 20, 30)");
    }

    #[test]
    fn test_failed_outcome_lists_written_files() {
        let mut outcome = failed();
        outcome.written = vec!["out/foo.html".into()];

        let human = Formatter::new(OutputFormat::Human).format(std::slice::from_ref(&outcome));
        assert!(human.contains("  Error: input is empty"));
        assert!(human.contains("  wrote out/foo.html\n"));

        let json = Formatter::new(OutputFormat::Json).format(&[outcome]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["status"], "failed");
        assert_eq!(value[0]["written"][0], "out/foo.html");
    }

    #[test]
    fn test_summary() {
        let summary = ConversionSummary::from_outcomes(&[converted(FOO), failed()]);
        assert_eq!(
            summary,
            ConversionSummary {
                converted: 1,
                failed: 1
            }
        );
        let output = summary.format();
        assert!(output.contains("converted 1 input, 1 failed"));
    }
}
