//! Streaming response decoding
//!
//! The generation service answers with newline-delimited JSON, one record per
//! token batch. [`StreamChunks`] decodes those records lazily from any
//! [`BufRead`], and [`collect_answer`] folds them into the final text.

use std::io::BufRead;

use serde::Deserialize;

use crate::{Error, Result};

/// One decoded record of the response stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamChunk {
    /// Text fragment, absent on some bookkeeping records
    #[serde(default)]
    pub response: Option<String>,

    /// Set on the final record
    #[serde(default)]
    pub done: bool,

    /// In-band failure reported by the service
    #[serde(default)]
    pub error: Option<String>,
}

impl StreamChunk {
    /// Text fragment carried by this record, empty if none
    #[must_use]
    pub fn fragment(&self) -> &str {
        self.response.as_deref().unwrap_or_default()
    }
}

/// Lazy decoder over an NDJSON body
///
/// Blank lines are skipped. Each remaining line must decode as one
/// [`StreamChunk`]; a line that doesn't yields [`Error::MalformedRecord`].
pub struct StreamChunks<R> {
    lines: std::io::Lines<R>,
}

impl<R: BufRead> StreamChunks<R> {
    /// Wrap a buffered reader
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for StreamChunks<R> {
    type Item = Result<StreamChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::Io(e))),
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            tracing::trace!(line, "parsing stream chunk");

            return Some(
                serde_json::from_str(line)
                    .map_err(|e| Error::MalformedRecord(format!("{e}: {line}"))),
            );
        }
    }
}

/// Concatenate fragments in arrival order until a record reports `done`
///
/// Records after the first `done = true` are never read. A stream that ends
/// without `done` yields whatever was accumulated. Any decode error, or a
/// record carrying an `error` field, aborts the whole answer.
///
/// # Errors
///
/// Returns the first decode, I/O, or in-band error encountered
pub fn collect_answer<I>(chunks: I) -> Result<String>
where
    I: IntoIterator<Item = Result<StreamChunk>>,
{
    let mut answer = String::new();
    let mut records = 0usize;

    for chunk in chunks {
        let chunk = chunk?;
        records += 1;

        if let Some(message) = chunk.error {
            return Err(Error::Generation(message));
        }

        answer.push_str(chunk.fragment());

        if chunk.done {
            tracing::debug!(records, chars = answer.len(), "stream complete");
            return Ok(answer);
        }
    }

    tracing::debug!(
        records,
        chars = answer.len(),
        "stream ended without completion record"
    );
    Ok(answer)
}
