//! Line protocol decoder.
//!
//! The watcher writes one `flags:id:path` line per event and an empty line
//! after each batch. [`BatchParser`] is fed those lines one at a time and
//! hands back a completed batch whenever it sees the empty terminator.

use serde::{Deserialize, Serialize};

use crate::events::{Change, EventRecord, FlagValue, OutputMode};

/// Error type for a single undecodable line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// The line has fewer than two `:` separators.
    #[error("Expected flags:id:path, found {0} field(s)")]
    MissingFields(usize),
    /// The flags field is not a 32-bit decimal integer.
    #[error("Invalid flags field: {0:?}")]
    InvalidFlags(String),
    /// The id field is not a 64-bit decimal integer.
    #[error("Invalid event id field: {0:?}")]
    InvalidId(String),
}

/// How the numeric `flags` and `id` fields are decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberParsing {
    /// Leading decimal digits are used; anything unparseable becomes zero.
    #[default]
    Permissive,
    /// The whole field must be a decimal integer or the line is rejected.
    Strict,
}

/// A classified line before numeric decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLine<'a> {
    /// Empty line closing the current batch.
    Terminator,
    /// An event line split into its three fields.
    Event {
        flags: &'a str,
        id: &'a str,
        path: &'a str,
    },
}

/// Classify a newline-stripped line.
///
/// Only the first two `:` split fields; the path keeps any further colons.
///
/// # Errors
///
/// Returns `LineError::MissingFields` if a non-empty line has fewer than two
/// separators.
pub fn classify(line: &str) -> Result<RawLine<'_>, LineError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return Ok(RawLine::Terminator);
    }

    let mut fields = line.splitn(3, ':');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(flags), Some(id), Some(path)) => Ok(RawLine::Event { flags, id, path }),
        (_, Some(_), None) => Err(LineError::MissingFields(2)),
        _ => Err(LineError::MissingFields(1)),
    }
}

/// The leading decimal digits of a field, ignoring what follows.
fn leading_digits(field: &str) -> &str {
    let field = field.trim_start();
    let field = field.strip_prefix('+').unwrap_or(field);
    let end = field
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(field.len());
    &field[..end]
}

impl NumberParsing {
    fn flags(self, field: &str) -> Result<FlagValue, LineError> {
        let raw = match self {
            // Masks wider than 32 bits keep their low 32 bits.
            Self::Permissive => leading_digits(field).bytes().fold(0u32, |acc, digit| {
                acc.wrapping_mul(10).wrapping_add(u32::from(digit - b'0'))
            }),
            Self::Strict => field
                .parse::<u32>()
                .map_err(|_| LineError::InvalidFlags(field.to_string()))?,
        };
        Ok(FlagValue::new(raw))
    }

    fn id(self, field: &str) -> Result<u64, LineError> {
        match self {
            Self::Permissive => Ok(leading_digits(field).parse().unwrap_or(0)),
            Self::Strict => field
                .parse::<u64>()
                .map_err(|_| LineError::InvalidId(field.to_string())),
        }
    }
}

/// Accumulates event lines into terminator-bounded batches.
#[derive(Debug, Clone, Default)]
pub struct BatchParser {
    mode: OutputMode,
    numbers: NumberParsing,
    current: Vec<Change>,
}

impl BatchParser {
    /// Create a parser producing changes in the given shape.
    #[must_use]
    pub fn new(mode: OutputMode, numbers: NumberParsing) -> Self {
        Self {
            mode,
            numbers,
            current: Vec::new(),
        }
    }

    /// Feed one newline-stripped line.
    ///
    /// Returns the completed batch when `line` is a terminator. An empty
    /// batch is still returned for back-to-back terminators.
    ///
    /// # Errors
    ///
    /// Returns a `LineError` if the line cannot be decoded. The line is
    /// skipped and the pending batch is left as it was.
    pub fn push_line(&mut self, line: &str) -> Result<Option<Vec<Change>>, LineError> {
        match classify(line)? {
            RawLine::Terminator => Ok(Some(std::mem::take(&mut self.current))),
            RawLine::Event { flags, id, path } => {
                let change = self.decode(flags, id, path)?;
                self.current.push(change);
                Ok(None)
            }
        }
    }

    /// Changes accumulated since the last terminator.
    #[must_use]
    pub fn pending(&self) -> &[Change] {
        &self.current
    }

    /// Discard the unterminated tail, returning how many changes it held.
    #[must_use]
    pub fn finish(self) -> usize {
        self.current.len()
    }

    fn decode(&self, flags: &str, id: &str, path: &str) -> Result<Change, LineError> {
        match self.mode {
            // Numeric fields are discarded unread in plain mode.
            OutputMode::Plain => Ok(Change::Path(path.to_string())),
            OutputMode::Augmented => Ok(Change::Event(EventRecord {
                flags: self.numbers.flags(flags)?,
                id: self.numbers.id(id)?,
                path: path.to_string(),
            })),
        }
    }
}
