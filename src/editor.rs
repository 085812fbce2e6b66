//! The source editor facade.
//!
//! Rendering (highlighting, line numbers, themes) belongs to whatever widget
//! the host embeds. This module only owns what the playground needs from it:
//! the widget configuration and the current source text.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{PlaygroundError, Result};

/// Program placed in the editor when it is first shown.
pub const DEFAULT_SNIPPET: &str = "print('Hello world')";

/// Syntax mode the widget highlights with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMode {
    pub name: String,
    pub version: u32,
    /// Flag unterminated single-line strings as errors.
    pub single_line_string_errors: bool,
}

impl Default for LanguageMode {
    fn default() -> Self {
        Self {
            name: "python".to_string(),
            version: 3,
            single_line_string_errors: false,
        }
    }
}

/// Widget options passed through to the host editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub language: LanguageMode,
    pub theme: String,
    pub show_line_numbers: bool,
    pub indent_width: u32,
    pub highlight_matching_brackets: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            language: LanguageMode::default(),
            theme: "dracula".to_string(),
            show_line_numbers: true,
            indent_width: 4,
            highlight_matching_brackets: true,
        }
    }
}

impl EditorConfig {
    /// Create a new builder for EditorConfig.
    pub fn builder() -> EditorConfigBuilder {
        EditorConfigBuilder::default()
    }
}

/// Builder for creating EditorConfig instances.
#[derive(Debug, Clone, Default)]
pub struct EditorConfigBuilder {
    language: Option<LanguageMode>,
    theme: Option<String>,
    show_line_numbers: Option<bool>,
    indent_width: Option<u32>,
    highlight_matching_brackets: Option<bool>,
}

impl EditorConfigBuilder {
    /// Set the highlighting mode.
    pub fn language(mut self, language: LanguageMode) -> Self {
        self.language = Some(language);
        self
    }

    /// Set the visual theme name.
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    /// Show or hide the line-number gutter.
    pub fn show_line_numbers(mut self, show: bool) -> Self {
        self.show_line_numbers = Some(show);
        self
    }

    /// Set the number of columns per indent level.
    pub fn indent_width(mut self, width: u32) -> Self {
        self.indent_width = Some(width);
        self
    }

    /// Highlight the bracket matching the one under the cursor.
    pub fn highlight_matching_brackets(mut self, highlight: bool) -> Self {
        self.highlight_matching_brackets = Some(highlight);
        self
    }

    /// Build the EditorConfig.
    pub fn build(self) -> Result<EditorConfig> {
        let default = EditorConfig::default();
        let config = EditorConfig {
            language: self.language.unwrap_or(default.language),
            theme: self.theme.unwrap_or(default.theme),
            show_line_numbers: self.show_line_numbers.unwrap_or(default.show_line_numbers),
            indent_width: self.indent_width.unwrap_or(default.indent_width),
            highlight_matching_brackets: self
                .highlight_matching_brackets
                .unwrap_or(default.highlight_matching_brackets),
        };
        if config.indent_width == 0 {
            return Err(PlaygroundError::Config("indent width must be non-zero".into()));
        }
        Ok(config)
    }
}

/// Handle to the editable source surface.
///
/// Clones share the same buffer, so the host can keep one handle for user
/// edits while the evaluation session reads through another.
#[derive(Debug, Clone)]
pub struct Editor {
    anchor: Arc<str>,
    config: Arc<EditorConfig>,
    source: Arc<RwLock<String>>,
}

impl Editor {
    /// Mount the editor on `anchor` and seed it with [`DEFAULT_SNIPPET`].
    pub fn initialize(anchor: impl Into<String>, config: EditorConfig) -> Self {
        let anchor: String = anchor.into();
        tracing::debug!(anchor = %anchor, theme = %config.theme, "editor mounted");

        let editor = Self {
            anchor: anchor.into(),
            config: Arc::new(config),
            source: Arc::new(RwLock::new(String::new())),
        };
        editor.set_text(DEFAULT_SNIPPET);
        editor
    }

    /// The current source, verbatim.
    pub fn text(&self) -> String {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the whole source.
    pub fn set_text(&self, text: impl Into<String>) {
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = text.into();
    }

    /// Name of the element the editor is mounted on.
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
}
