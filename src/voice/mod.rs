//! Voice processing module
//!
//! Handles audio capture, speech recognition, and speech output.

mod capture;
mod frames;
mod recognizer;
mod speech;
mod transcript;
#[cfg(feature = "vosk")]
mod vosk_engine;

pub use capture::{AudioInput, FrameSource, Microphone, MicrophoneStream};
pub use frames::FrameAssembler;
pub use recognizer::{Recognizer, RecognizerFactory, check_model_dir};
pub use speech::{CommandSpeaker, SpeechSink};
pub use transcript::{FRAME_WAIT, TranscriptSource, Transcriber};
#[cfg(feature = "vosk")]
pub use vosk_engine::{SpeechModel, VoskRecognizer};
