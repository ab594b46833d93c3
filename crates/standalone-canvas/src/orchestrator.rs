//! Main orchestration logic.

use crate::cli::Args;
use crate::config::{ConfigError, ProjectConfig};
use crate::output::{ConversionSummary, Formatter};
use camino::{Utf8Path, Utf8PathBuf};
use canvas_transform::{
    convert, ConvertError, ConvertOptions, ConvertResult, TemplateOptions, SAMPLE_COMPONENT,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use thiserror::Error;
use walkdir::WalkDir;

/// Directories never searched for inputs.
const DEFAULT_IGNORES: &[&str] = &["**/node_modules/**", "**/dist/**", "**/target/**"];

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Failed to read an input.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a generated file.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Unreadable or malformed config file.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The input converted to nothing.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Nothing to convert.
    #[error("no inputs: pass files or directories, --stdin, or --sample")]
    NoInputs,
}

/// Where one input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(Utf8PathBuf),
    Stdin(String),
    Sample,
}

impl InputSource {
    /// Name shown in reports.
    pub fn label(&self) -> String {
        match self {
            InputSource::File(path) => path.to_string(),
            InputSource::Stdin(_) => "<stdin>".to_string(),
            InputSource::Sample => "<sample>".to_string(),
        }
    }

    fn read(&self) -> Result<String, OrchestratorError> {
        match self {
            InputSource::File(path) => {
                fs::read_to_string(path).map_err(|source| OrchestratorError::ReadFailed {
                    path: path.to_string(),
                    source,
                })
            }
            InputSource::Stdin(text) => Ok(text.clone()),
            InputSource::Sample => Ok(SAMPLE_COMPONENT.to_string()),
        }
    }
}

/// Effective settings after merging config and flags.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub convert: ConvertOptions,
    pub out_dir: Option<Utf8PathBuf>,
    pub ignore: Vec<String>,
    pub extensions: Vec<String>,
    pub explain: bool,
}

impl Settings {
    /// Merges the config file with command-line flags; flags win.
    pub fn resolve(args: &Args, config: ProjectConfig) -> Self {
        let extensions = config.file_extensions();
        let fallback = args
            .fallback
            .map(Into::into)
            .or(config.fallback)
            .unwrap_or_default();
        let url_overrides = args.url_overrides || config.url_overrides.unwrap_or(false);

        let mut ignore = config.ignore;
        ignore.extend(args.ignore.iter().cloned());

        Self {
            convert: ConvertOptions {
                fallback,
                template: TemplateOptions { url_overrides },
            },
            out_dir: args.out_dir.clone().or(config.out_dir),
            ignore,
            extensions,
            explain: args.explain,
        }
    }
}

/// Result of converting one input.
#[derive(Debug)]
pub struct FileOutcome {
    pub label: String,
    /// The input text, kept for line and column reporting.
    pub source: String,
    pub result: Result<ConvertResult, OrchestratorError>,
    /// Files written for this input.
    pub written: Vec<Utf8PathBuf>,
}

/// Runs the conversion for the parsed command line.
pub fn run(args: Args) -> Result<ConversionSummary, OrchestratorError> {
    let cwd = std::env::current_dir()
        .ok()
        .and_then(|p| Utf8PathBuf::try_from(p).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."));

    let config = ProjectConfig::load(args.config.as_deref(), &cwd)?;
    let settings = Settings::resolve(&args, config);

    let mut sources: Vec<InputSource> = collect_files(&args.inputs, &settings)?
        .into_iter()
        .map(InputSource::File)
        .collect();
    if args.stdin {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|source| OrchestratorError::ReadFailed {
                path: "<stdin>".to_string(),
                source,
            })?;
        sources.push(InputSource::Stdin(text));
    }
    if args.sample {
        sources.push(InputSource::Sample);
    }
    if sources.is_empty() {
        return Err(OrchestratorError::NoInputs);
    }

    let outcomes = convert_all(&sources, &settings);
    let formatter = Formatter::new(args.output)
        .with_explain(settings.explain)
        .with_documents(settings.out_dir.is_none());
    print!("{}", formatter.format(&outcomes));

    let summary = ConversionSummary::from_outcomes(&outcomes);
    if matches!(args.output, crate::cli::OutputFormat::Human) {
        println!("{}", summary.format());
    }
    Ok(summary)
}

/// Converts every input in parallel, then writes results in input order.
pub fn convert_all(sources: &[InputSource], settings: &Settings) -> Vec<FileOutcome> {
    let mut outcomes: Vec<FileOutcome> = sources
        .par_iter()
        .map(|input| {
            let label = input.label();
            let (source, result) = match input.read() {
                Ok(source) => {
                    let result: Result<ConvertResult, OrchestratorError> =
                        convert(&source, &settings.convert).map_err(Into::into);
                    (source, result)
                }
                Err(err) => (String::new(), Err(err)),
            };
            if let Err(err) = &result {
                tracing::warn!(input = %label, "{err}");
            }
            FileOutcome {
                label,
                source,
                result,
                written: Vec::new(),
            }
        })
        .collect();

    if let Some(out_dir) = &settings.out_dir {
        let mut taken: HashSet<String> = HashSet::new();
        for outcome in &mut outcomes {
            let Ok(converted) = &outcome.result else {
                continue;
            };
            let artifacts = &converted.artifacts;
            if !taken.insert(artifacts.markup_file_name.clone()) {
                tracing::warn!(
                    input = %outcome.label,
                    file = %artifacts.markup_file_name,
                    "output name already used by an earlier input, overwriting"
                );
            }
            let mut written = Vec::new();
            let result =
                write_artifacts(out_dir, &artifacts.markup_file_name, &artifacts.markup_text)
                    .and_then(|markup| {
                        written.push(markup);
                        write_artifacts(
                            out_dir,
                            &artifacts.script_file_name,
                            &artifacts.script_text,
                        )
                    })
                    .map(|script| written.push(script));
            outcome.written = written;
            if let Err(err) = result {
                outcome.result = Err(err);
            }
        }
    }

    outcomes
}

fn write_artifacts(
    out_dir: &Utf8Path,
    file_name: &str,
    text: &str,
) -> Result<Utf8PathBuf, OrchestratorError> {
    fs::create_dir_all(out_dir).map_err(|source| OrchestratorError::WriteFailed {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let path = out_dir.join(file_name);
    fs::write(&path, text).map_err(|source| OrchestratorError::WriteFailed {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(%path, "wrote file");
    Ok(path)
}

/// Expands the positional inputs into a sorted list of files.
///
/// Files named directly are always kept. Directories are walked for the
/// configured extensions, skipping ignored paths.
pub fn collect_files(
    inputs: &[Utf8PathBuf],
    settings: &Settings,
) -> Result<Vec<Utf8PathBuf>, OrchestratorError> {
    let ignore_set = build_ignore_set(&settings.ignore)?;
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found: Vec<Utf8PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
            .filter(|p| {
                p.extension().is_some_and(|ext| {
                    settings
                        .extensions
                        .iter()
                        .any(|e| e.eq_ignore_ascii_case(ext))
                })
            })
            .filter(|p| {
                let relative = p.strip_prefix(input).unwrap_or(p);
                !ignore_set.is_match(relative.as_str())
            })
            .collect();
        found.sort();
        tracing::debug!(dir = %input, count = found.len(), "collected inputs");
        files.extend(found);
    }

    Ok(files)
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    for pattern in DEFAULT_IGNORES {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use canvas_transform::FallbackMode;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    fn touch(path: &Utf8Path, text: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "standalone-canvas",
            "--fallback",
            "inert",
            "--out-dir",
            "cli-out",
            "--ignore",
            "b/**",
        ]);
        let config = ProjectConfig {
            fallback: Some(FallbackMode::Synthesized),
            url_overrides: Some(true),
            out_dir: Some(Utf8PathBuf::from("config-out")),
            ignore: vec!["a/**".to_string()],
            extensions: None,
        };

        let settings = Settings::resolve(&args, config);
        assert_eq!(settings.convert.fallback, FallbackMode::Inert);
        assert!(settings.convert.template.url_overrides);
        assert_eq!(settings.out_dir, Some(Utf8PathBuf::from("cli-out")));
        assert_eq!(settings.ignore, vec!["a/**", "b/**"]);
    }

    #[test]
    fn test_config_applies_without_flags() {
        let args = Args::parse_from(["standalone-canvas"]);
        let config = ProjectConfig {
            fallback: Some(FallbackMode::Synthesized),
            ..Default::default()
        };
        let settings = Settings::resolve(&args, config);
        assert_eq!(settings.convert.fallback, FallbackMode::Synthesized);
        assert!(!settings.convert.template.url_overrides);
        assert_eq!(settings.out_dir, None);
    }

    #[test]
    fn test_collect_files_walks_and_ignores() {
        let (_dir, root) = temp_root();
        touch(&root.join("src/Ribbon.tsx"), "class A {}");
        touch(&root.join("src/page.html"), "<html></html>");
        touch(&root.join("src/readme.md"), "# notes");
        touch(&root.join("node_modules/pkg/index.js"), "x");
        touch(&root.join("drafts/Old.jsx"), "x");

        let settings = Settings {
            ignore: vec!["drafts/**".to_string()],
            extensions: ProjectConfig::default().file_extensions(),
            ..Default::default()
        };
        let files = collect_files(&[root.clone()], &settings).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().as_str().to_string())
            .collect();
        assert_eq!(relative, vec!["src/Ribbon.tsx", "src/page.html"]);
    }

    #[test]
    fn test_invalid_glob() {
        let settings = Settings {
            ignore: vec!["[".to_string()],
            ..Default::default()
        };
        let (_dir, root) = temp_root();
        assert!(matches!(
            collect_files(&[root], &settings),
            Err(OrchestratorError::InvalidGlob(_))
        ));
    }

    #[test]
    fn test_convert_all_writes_files() {
        let (_dir, root) = temp_root();
        let input = root.join("Foo.jsx");
        touch(&input, "class Foo { draw(ctx) { ctx.fill(); } }");
        let empty = root.join("Empty.jsx");
        touch(&empty, "   \n");

        let settings = Settings {
            out_dir: Some(root.join("out")),
            ..Default::default()
        };
        let outcomes = convert_all(
            &[InputSource::File(input), InputSource::File(empty)],
            &settings,
        );

        assert!(outcomes[0].result.is_ok());
        assert_eq!(
            outcomes[0].written,
            vec![root.join("out/foo.html"), root.join("out/foo.js")]
        );
        let script = fs::read_to_string(root.join("out/foo.js")).unwrap();
        assert!(script.contains("Foo.prototype.draw = function(ctx) {"));

        assert!(matches!(
            outcomes[1].result,
            Err(OrchestratorError::Convert(ConvertError::EmptyInput))
        ));
        assert!(outcomes[1].written.is_empty());
    }

    #[test]
    fn test_partial_write_keeps_written_markup() {
        let (_dir, root) = temp_root();
        let input = root.join("Foo.jsx");
        touch(&input, "class Foo { draw(ctx) { ctx.fill(); } }");
        let out_dir = root.join("out");
        fs::create_dir_all(out_dir.join("foo.js")).unwrap();

        let settings = Settings {
            out_dir: Some(out_dir.clone()),
            ..Default::default()
        };
        let outcomes = convert_all(&[InputSource::File(input)], &settings);

        assert!(matches!(
            outcomes[0].result,
            Err(OrchestratorError::WriteFailed { .. })
        ));
        assert_eq!(outcomes[0].written, vec![out_dir.join("foo.html")]);
        assert!(out_dir.join("foo.html").is_file());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let (_dir, root) = temp_root();
        let outcomes = convert_all(
            &[InputSource::File(root.join("missing.tsx")), InputSource::Sample],
            &Settings::default(),
        );
        assert!(matches!(
            outcomes[0].result,
            Err(OrchestratorError::ReadFailed { .. })
        ));
        assert!(outcomes[1].result.is_ok());
        assert_eq!(outcomes[1].label, "<sample>");
    }
}
