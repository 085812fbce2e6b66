//! The append-only log shown beside the editor.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Marker echoed before each submitted source.
pub const PROMPT: &str = ">>> ";

/// Transcript text while the runtime loads.
pub const INITIALIZING_MESSAGE: &str = "Initializing...\n";

/// Line appended after the version banner once the runtime is usable.
pub const READY_MESSAGE: &str = "Python Ready !";

/// What a submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    /// Captured stdout of a successful run.
    Output(String),
    /// Error text shown in place of output.
    Error(String),
}

impl EntryBody {
    pub fn text(&self) -> &str {
        match self {
            EntryBody::Output(text) | EntryBody::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EntryBody::Error(_))
    }
}

/// One evaluated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub source: String,
    pub body: EntryBody,
}

impl Entry {
    pub fn output(source: impl Into<String>, stdout: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            body: EntryBody::Output(stdout.into()),
        }
    }

    pub fn error(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            body: EntryBody::Error(text.into()),
        }
    }
}

/// Renders as the prompt-prefixed source, the body, then a blank separator.
///
/// A non-empty body that does not end in a newline gets one, so every block
/// is closed by the separator line whether it holds output or an error.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body.text();
        write!(f, "{PROMPT}{}\n{body}", self.source)?;
        if !body.is_empty() && !body.ends_with('\n') {
            f.write_str("\n")?;
        }
        f.write_str("\n")
    }
}

/// Shared transcript buffer.
///
/// Clones observe the same text. Entries are only ever appended; the only
/// way to drop them is [`Transcript::reset`].
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    text: Arc<RwLock<String>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered entry.
    pub fn append(&self, entry: &Entry) {
        use fmt::Write;

        let mut text = self.text.write().unwrap_or_else(PoisonError::into_inner);
        // Writing into a String cannot fail.
        let _ = write!(text, "{entry}");
    }

    /// Snapshot of the whole transcript.
    pub fn text(&self) -> String {
        self.text
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear everything.
    pub fn reset(&self) {
        self.text
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.text.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Swap in a status banner; used only by session initialization.
    pub(crate) fn replace(&self, banner: impl Into<String>) {
        *self.text.write().unwrap_or_else(PoisonError::into_inner) = banner.into();
    }
}
