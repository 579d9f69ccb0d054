//! Configuration for the formgrid engine.
//!
//! The config file is KDL. Every node is optional and falls back to its
//! default, so an empty file is a valid configuration:
//!
//! ```kdl
//! container {
//!     columns 4
//!     rows 4
//! }
//!
//! placeholder {
//!     text "        .        "
//! }
//!
//! preview {
//!     tab-label "tab 1"
//!     border-width 2
//! }
//! ```

use std::path::Path;

use miette::{Context, IntoDiagnostic};

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Config {
    #[knuffel(child, default)]
    pub container: Container,
    #[knuffel(child, default)]
    pub placeholder: Placeholder,
    #[knuffel(child, default)]
    pub preview: Preview,
}

/// Defaults for newly created grid containers.
#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Container {
    /// Grid columns of a fresh grid container.
    #[knuffel(child, unwrap(argument), default = Self::default().columns)]
    pub columns: u32,
    /// Grid rows of a fresh grid container.
    #[knuffel(child, unwrap(argument), default = Self::default().rows)]
    pub rows: u32,
}

/// Appearance of the placeholder occupants that mark empty cells.
#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Placeholder {
    /// Text shown by a placeholder.
    #[knuffel(child, unwrap(argument), default = Self::default().text)]
    pub text: String,
}

/// Appearance of the drag preview.
#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Preview {
    /// Label of the first preview tab of a tabbed container.
    #[knuffel(child, unwrap(argument), default = Self::default().tab_label)]
    pub tab_label: String,
    /// Outline width marking a preview container.
    #[knuffel(child, unwrap(argument), default = Self::default().border_width)]
    pub border_width: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container: Container::default(),
            placeholder: Placeholder::default(),
            preview: Preview::default(),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 4,
        }
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            text: String::from("        .        "),
        }
    }
}

impl Default for Preview {
    fn default() -> Self {
        Self {
            tab_label: String::from("tab 1"),
            border_width: 2,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("error reading {path:?}"))?;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("config.kdl");
        let config = Self::parse(filename, &contents)?;

        tracing::debug!("loaded config from {path:?}");
        Ok(config)
    }

    pub fn parse(filename: &str, text: &str) -> Result<Self, knuffel::Error> {
        knuffel::parse(filename, text)
    }
}
