//! The conversation loop: listen, ask, speak, repeat

use crate::llm::AnswerFetcher;
use crate::shutdown::ShutdownSignal;
use crate::voice::{SpeechSink, TranscriptSource};
use crate::{Error, Result};

/// Receives each stage's output as the session runs
pub trait SessionObserver {
    /// About to capture the next utterance
    fn listening(&mut self) {}

    /// An utterance was transcribed
    fn utterance(&mut self, text: &str);

    /// An answer is about to be spoken
    fn answer(&mut self, text: &str);
}

/// Prints the conversation to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn listening(&mut self) {
        println!("Listening... Speak now.");
    }

    fn utterance(&mut self, text: &str) {
        println!("User: {text}");
    }

    fn answer(&mut self, text: &str) {
        println!("Agent: {text}");
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Cycling through listen, ask, speak
    Running,
    /// Terminal; reached on a stop request or a fatal error
    Stopped,
}

/// Owns the three stages and drives them in order
pub struct Session<T, F, S, O> {
    source: T,
    fetcher: F,
    sink: S,
    observer: O,
    shutdown: ShutdownSignal,
    state: SessionState,
    cycles: u64,
}

impl<T, F, S, O> Session<T, F, S, O>
where
    T: TranscriptSource,
    F: AnswerFetcher,
    S: SpeechSink,
    O: SessionObserver,
{
    /// Assemble a session from its stages
    #[must_use]
    pub const fn new(
        source: T,
        fetcher: F,
        sink: S,
        observer: O,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            source,
            fetcher,
            sink,
            observer,
            shutdown,
            state: SessionState::Running,
            cycles: 0,
        }
    }

    /// Run until a stop is requested
    ///
    /// A stop request, whether seen between cycles or while listening, ends
    /// the session with `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the first capture, recognition, or synthesis fault; the
    /// session is stopped either way
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("session started");

        let outcome = loop {
            if self.shutdown.is_requested() {
                break Ok(());
            }

            match self.run_cycle() {
                Ok(()) => {}
                Err(e) if e.is_interrupt() => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.state = SessionState::Stopped;

        match &outcome {
            Ok(()) => tracing::info!(cycles = self.cycles, "session stopped"),
            Err(e) => tracing::error!(error = %e, cycles = self.cycles, "session failed"),
        }

        outcome
    }

    /// Run one listen, ask, speak cycle
    ///
    /// # Errors
    ///
    /// Returns error if listening or speaking fails; fetch problems are
    /// spoken instead. Returns `Error::Interrupted` if a stop was requested
    /// while the answer was being fetched
    pub fn run_cycle(&mut self) -> Result<()> {
        self.observer.listening();

        let utterance = self.source.next_utterance()?;
        tracing::debug!(utterance = %utterance, "heard");
        self.observer.utterance(&utterance);

        let answer = self.fetcher.fetch_answer(&utterance);
        if self.shutdown.is_requested() {
            tracing::debug!("stop requested while fetching, answer dropped");
            return Err(Error::Interrupted);
        }
        self.observer.answer(&answer);

        self.sink.speak(&answer)?;
        self.cycles += 1;

        Ok(())
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Completed cycles so far
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }
}

#[cfg(feature = "vosk")]
pub use live::{VoiceSession, voice_session};

#[cfg(feature = "vosk")]
mod live {
    use super::{ConsoleObserver, Session};
    use crate::config::Config;
    use crate::llm::GenerateClient;
    use crate::shutdown::ShutdownSignal;
    use crate::voice::{CommandSpeaker, Microphone, SpeechModel, Transcriber};
    use crate::Result;

    /// A session wired to the microphone, Vosk, the generate API, and the
    /// configured synthesizer
    pub type VoiceSession = Session<
        Transcriber<Microphone, SpeechModel>,
        GenerateClient,
        CommandSpeaker,
        ConsoleObserver,
    >;

    /// Load the model and open the devices for a live session
    ///
    /// # Errors
    ///
    /// Returns error if the model is missing, no input device is usable, or
    /// the HTTP client cannot be built
    pub fn voice_session(config: &Config, shutdown: ShutdownSignal) -> Result<VoiceSession> {
        let model = SpeechModel::load(&config.recognizer.model_path, config.audio.sample_rate)?;
        let microphone = Microphone::new(&config.audio)?;
        let fetcher = GenerateClient::new(&config.generation)?;
        let speaker = CommandSpeaker::new(&config.speech);

        Ok(Session::new(
            Transcriber::new(microphone, model, shutdown.clone()),
            fetcher,
            speaker,
            ConsoleObserver,
            shutdown,
        ))
    }
}
