//! Configuration management for parley

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

use file::ParleyConfigFile;

/// Default Vosk model directory
pub const DEFAULT_MODEL_PATH: &str = "models/vosk-model-small-en-us";

/// Default streaming generate endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";

/// Default generation model
pub const DEFAULT_LLM_MODEL: &str = "llama2:latest";

/// Default capture sample rate (16kHz for speech)
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Default samples per recognizer frame
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Largest accepted frame, in samples
pub const MAX_BUFFER_SIZE: usize = 1 << 20;

/// Default whole-request timeout; generation can be slow on CPU-only hosts
const DEFAULT_TIMEOUT_SECS: u64 = 300;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// parley configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Speech recognition configuration
    pub recognizer: RecognizerConfig,

    /// Microphone capture configuration
    pub audio: AudioConfig,

    /// Generation service configuration
    pub generation: GenerationConfig,

    /// Speech synthesis configuration
    pub speech: SpeechConfig,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// Directory holding the Vosk model
    pub model_path: PathBuf,
}

/// Microphone capture configuration
#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,

    /// Samples per frame handed to the recognizer
    pub buffer_size: usize,
}

/// Generation service configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Streaming generate endpoint
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Whole-request timeout, including reading the stream
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Synthesizer program
    pub command: String,

    /// Arguments placed before the text
    pub args: Vec<String>,
}

/// Values given on the command line; these win over every other source
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model_path: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub llm_model: Option<String>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            command: default_speech_command().to_string(),
            args: Vec::new(),
        }
    }
}

/// Platform synthesizer: `say` ships with macOS, `espeak-ng` with most Linux distros
const fn default_speech_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak-ng"
    }
}

impl Config {
    /// Load configuration from environment, config file and defaults
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolve configuration with priority overrides > env > toml > default
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn from_sources<F>(fc: ParleyConfigFile, env: F, overrides: &Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = overrides
            .model_path
            .clone()
            .or_else(|| env("PARLEY_MODEL_PATH").map(PathBuf::from))
            .or_else(|| fc.recognizer.model_path.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let audio = AudioConfig {
            sample_rate: parse_env(&env, "PARLEY_SAMPLE_RATE")?
                .or(fc.audio.sample_rate)
                .unwrap_or(DEFAULT_SAMPLE_RATE),
            buffer_size: parse_env(&env, "PARLEY_BUFFER_SIZE")?
                .or(fc.audio.buffer_size)
                .unwrap_or(DEFAULT_BUFFER_SIZE),
        };

        let generation = GenerationConfig {
            endpoint: overrides
                .endpoint
                .clone()
                .or_else(|| env("PARLEY_ENDPOINT"))
                .or_else(|| env("OLLAMA_API_URL"))
                .or(fc.generation.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: overrides
                .llm_model
                .clone()
                .or_else(|| env("PARLEY_LLM_MODEL"))
                .or_else(|| env("OLLAMA_MODEL"))
                .or(fc.generation.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            timeout: Duration::from_secs(
                parse_env(&env, "PARLEY_TIMEOUT_SECS")?
                    .or(fc.generation.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            connect_timeout: Duration::from_secs(
                fc.generation
                    .connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
        };

        let speech = SpeechConfig {
            command: env("PARLEY_TTS_COMMAND")
                .or(fc.speech.command)
                .unwrap_or_else(|| default_speech_command().to_string()),
            args: fc.speech.args.unwrap_or_default(),
        };

        let config = Self {
            recognizer: RecognizerConfig { model_path },
            audio,
            generation,
            speech,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise fail deep inside a stage
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate must be positive".to_string()));
        }
        if self.audio.buffer_size == 0 {
            return Err(Error::Config("audio.buffer_size must be positive".to_string()));
        }
        if self.audio.buffer_size > MAX_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "audio.buffer_size must be at most {MAX_BUFFER_SIZE} samples"
            )));
        }
        if self.generation.endpoint.trim().is_empty() {
            return Err(Error::Config("generation.endpoint is empty".to_string()));
        }
        if self.generation.model.trim().is_empty() {
            return Err(Error::Config("generation.model is empty".to_string()));
        }
        if self.speech.command.trim().is_empty() {
            return Err(Error::Config("speech.command is empty".to_string()));
        }
        Ok(())
    }
}

/// Parse a numeric env var, rejecting garbage instead of silently ignoring it
fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("{key} is not a valid number: {raw}")))
        })
        .transpose()
}
