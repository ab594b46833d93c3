//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use canvas_transform::FallbackMode;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "standalone-canvas.json";

/// Input extensions searched for when walking directories.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jsx", "tsx", "js", "ts", "html"];

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

/// Project configuration, `standalone-canvas.json`.
///
/// Every key is optional. Command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Fallback used when an input has no class.
    pub fallback: Option<FallbackMode>,
    /// Emit the runtime `bg` / `transparent` URL overrides.
    pub url_overrides: Option<bool>,
    /// Directory generated files are written to.
    pub out_dir: Option<Utf8PathBuf>,
    /// Extra ignore globs.
    pub ignore: Vec<String>,
    /// File extensions to search for, with or without the leading dot.
    pub extensions: Option<Vec<String>>,
}

impl ProjectConfig {
    /// Loads the explicit config file, or `standalone-canvas.json` in `cwd`
    /// when it exists.
    ///
    /// An explicit path must exist; the implicit one is optional.
    pub fn load(explicit: Option<&Utf8Path>, cwd: &Utf8Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let implicit = cwd.join(CONFIG_FILE_NAME);
                if !implicit.is_file() {
                    return Ok(Self::default());
                }
                implicit
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(%path, ?config, "loaded config");
        Ok(config)
    }

    /// Parses config text. Comments are allowed.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&strip_comments(text))
    }

    /// File extensions to search for, without leading dots.
    pub fn file_extensions(&self) -> Vec<String> {
        match &self.extensions {
            Some(extensions) if !extensions.is_empty() => extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            _ => DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

/// Removes `//` and `/* */` comments outside of string literals.
fn strip_comments(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                out.push(c);
                while let Some(s) = chars.next() {
                    out.push(s);
                    match s {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}
