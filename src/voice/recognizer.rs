//! Speech recognizer interface

use std::path::Path;

use crate::{Error, Result};

/// Incremental recognizer fed one frame at a time
pub trait Recognizer {
    /// Feed one frame; returns `true` once the recognizer has reached an
    /// utterance boundary
    ///
    /// # Errors
    ///
    /// Returns error if the engine rejects the frame or decoding fails
    fn accept_frame(&mut self, frame: &[i16]) -> Result<bool>;

    /// Text of the utterance that was just finalized, trimmed
    fn text(&mut self) -> String;
}

/// Produces fresh recognizers from a loaded model
pub trait RecognizerFactory {
    /// Recognizer type
    type Recognizer: Recognizer;

    /// Create a recognizer with clean decoding state
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot allocate a recognizer
    fn recognizer(&self) -> Result<Self::Recognizer>;
}

/// Check that a model directory exists before handing it to the engine
///
/// # Errors
///
/// Returns `Error::ModelNotFound` naming the path if it is not a directory
pub fn check_model_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    Err(Error::ModelNotFound(format!(
        "{} (download a Vosk model from https://alphacephei.com/vosk/models and unpack it there)",
        path.display()
    )))
}
