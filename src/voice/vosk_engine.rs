//! Offline speech recognition backed by Vosk

use std::path::Path;

use super::recognizer::{Recognizer, RecognizerFactory, check_model_dir};
use crate::{Error, Result};

/// A Vosk acoustic model loaded from disk
pub struct SpeechModel {
    model: vosk::Model,
    sample_rate: u32,
}

impl SpeechModel {
    /// Load the model directory at `path`
    ///
    /// # Errors
    ///
    /// Returns `Error::ModelNotFound` if the directory is missing and
    /// `Error::Stt` if Vosk cannot load it
    pub fn load(path: &Path, sample_rate: u32) -> Result<Self> {
        check_model_dir(path)?;

        let model = vosk::Model::new(path.to_string_lossy()).ok_or_else(|| {
            Error::Stt(format!("failed to load Vosk model from {}", path.display()))
        })?;

        tracing::info!(path = %path.display(), sample_rate, "speech model loaded");

        Ok(Self { model, sample_rate })
    }
}

impl RecognizerFactory for SpeechModel {
    type Recognizer = VoskRecognizer;

    fn recognizer(&self) -> Result<VoskRecognizer> {
        #[allow(clippy::cast_precision_loss)]
        let rate = self.sample_rate as f32;

        let mut inner = vosk::Recognizer::new(&self.model, rate)
            .ok_or_else(|| Error::Stt("failed to create Vosk recognizer".to_string()))?;

        // Single best hypothesis is enough for conversation
        inner.set_max_alternatives(0);
        inner.set_words(false);

        Ok(VoskRecognizer { inner })
    }
}

/// Recognizer state for one utterance search
pub struct VoskRecognizer {
    inner: vosk::Recognizer,
}

impl Recognizer for VoskRecognizer {
    fn accept_frame(&mut self, frame: &[i16]) -> Result<bool> {
        let state = self
            .inner
            .accept_waveform(frame)
            .map_err(|e| Error::Stt(format!("{e:?}")))?;

        match state {
            vosk::DecodingState::Finalized => Ok(true),
            vosk::DecodingState::Running => Ok(false),
            vosk::DecodingState::Failed => Err(Error::Stt("decoding failed".to_string())),
        }
    }

    fn text(&mut self) -> String {
        self.inner
            .result()
            .single()
            .map(|result| result.text.trim().to_string())
            .unwrap_or_default()
    }
}
