//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use parley::config::GenerationConfig;
use parley::llm::AnswerFetcher;
use parley::voice::{SpeechSink, TranscriptSource};
use parley::{Error, Result, SessionObserver, ShutdownSignal};

/// Join records into a newline-delimited JSON body
#[must_use]
pub fn ndjson(records: &[serde_json::Value]) -> String {
    records
        .iter()
        .map(|record| format!("{record}\n"))
        .collect()
}

/// Generation config pointing at a mock server
#[must_use]
pub fn generation_config(base_url: &str) -> GenerationConfig {
    GenerationConfig {
        endpoint: format!("{base_url}/api/generate"),
        model: "llama2:latest".to_string(),
        ..GenerationConfig::default()
    }
}

/// Yields scripted utterances, then requests a stop
pub struct ScriptedSource {
    utterances: VecDeque<String>,
    shutdown: ShutdownSignal,
}

impl ScriptedSource {
    pub fn new(utterances: &[&str], shutdown: ShutdownSignal) -> Self {
        Self {
            utterances: utterances.iter().map(ToString::to_string).collect(),
            shutdown,
        }
    }
}

impl TranscriptSource for ScriptedSource {
    fn next_utterance(&mut self) -> Result<String> {
        if let Some(next) = self.utterances.pop_front() {
            return Ok(next);
        }
        self.shutdown.request();
        Err(Error::Interrupted)
    }
}

/// Answers every prompt with the same text, remembering the prompts
#[derive(Clone, Default)]
pub struct FixedFetcher {
    answer: String,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl FixedFetcher {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Arc::default(),
        }
    }
}

impl AnswerFetcher for FixedFetcher {
    fn fetch_answer(&mut self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer.clone()
    }
}

/// Records everything it is asked to say
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub spoken: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingSink {
    /// A sink whose synthesizer cannot be started
    pub fn broken() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl SpeechSink for RecordingSink {
    fn speak(&mut self, text: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Tts("synthesizer missing".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// One observed stage output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Listening,
    Utterance(String),
    Answer(String),
}

/// Records stage outputs in order
#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub events: Arc<Mutex<Vec<Event>>>,
}

impl SessionObserver for RecordingObserver {
    fn listening(&mut self) {
        self.events.lock().unwrap().push(Event::Listening);
    }

    fn utterance(&mut self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Utterance(text.to_string()));
    }

    fn answer(&mut self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Answer(text.to_string()));
    }
}
