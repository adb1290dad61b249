//! Parley - Hands-free voice chat with a local language model
//!
//! This library provides the pieces of the parley conversation loop:
//! - Speech capture and offline recognition (cpal, Vosk)
//! - Streaming answer generation over an Ollama-style HTTP API
//! - Spoken replies through an external synthesizer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      Session                         │
//! │   listen ──▶ ask ──▶ speak ──▶ listen ──▶ ...        │
//! └────────┬──────────────┬───────────────┬─────────────┘
//!          │              │               │
//! ┌────────▼───────┐ ┌────▼──────────┐ ┌──▼──────────────┐
//! │  Transcriber   │ │ GenerateClient│ │ CommandSpeaker  │
//! │  mic + Vosk    │ │ NDJSON stream │ │ say / espeak-ng │
//! └────────────────┘ └───────────────┘ └─────────────────┘
//! ```
//!
//! Every stage sits behind a trait ([`voice::TranscriptSource`],
//! [`llm::AnswerFetcher`], [`voice::SpeechSink`]) so the loop can be
//! driven by stubs. The Vosk-backed recognizer is behind the `vosk` feature.

pub mod config;
pub mod error;
pub mod llm;
pub mod session;
pub mod shutdown;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{ConsoleObserver, Session, SessionObserver, SessionState};
pub use shutdown::ShutdownSignal;
