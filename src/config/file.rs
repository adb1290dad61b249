//! TOML configuration file loading
//!
//! Supports `~/.config/parley/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ParleyConfigFile {
    /// Speech recognition configuration
    #[serde(default)]
    pub recognizer: RecognizerFileConfig,

    /// Microphone capture configuration
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Generation service configuration
    #[serde(default)]
    pub generation: GenerationFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,
}

/// Speech recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecognizerFileConfig {
    /// Directory holding the Vosk model
    pub model_path: Option<String>,
}

/// Microphone capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    /// Capture sample rate in Hz
    pub sample_rate: Option<u32>,

    /// Samples per frame handed to the recognizer
    pub buffer_size: Option<usize>,
}

/// Generation service configuration
#[derive(Debug, Default, Deserialize)]
pub struct GenerationFileConfig {
    /// Streaming generate endpoint (e.g. `http://localhost:11434/api/generate`)
    pub endpoint: Option<String>,

    /// Model identifier (e.g. "llama2:latest")
    pub model: Option<String>,

    /// Whole-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Connect timeout in seconds
    pub connect_timeout_secs: Option<u64>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Synthesizer program (e.g. "espeak-ng")
    pub command: Option<String>,

    /// Arguments placed before the text
    pub args: Option<Vec<String>>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ParleyConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ParleyConfigFile {
    config_file_path().map_or_else(ParleyConfigFile::default, |path| load_config_file_from(&path))
}

/// Load a config file at `path`, falling back to defaults
///
/// A missing file is silent; an unreadable or invalid one is logged.
pub fn load_config_file_from(path: &Path) -> ParleyConfigFile {
    if !path.exists() {
        return ParleyConfigFile::default();
    }

    match read_config_file(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ParleyConfigFile::default()
        }
    }
}

/// Read and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<ParleyConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/parley/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("parley").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[generation]\nmodel = \"mistral\"\n\n[audio]\nbuffer_size = 2048"
        )
        .unwrap();

        let fc = read_config_file(file.path()).unwrap();
        assert_eq!(fc.generation.model.as_deref(), Some("mistral"));
        assert_eq!(fc.generation.endpoint, None);
        assert_eq!(fc.audio.buffer_size, Some(2048));
        assert_eq!(fc.audio.sample_rate, None);
        assert!(fc.speech.command.is_none());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generation\nmodel = ").unwrap();

        assert!(matches!(
            read_config_file(file.path()),
            Err(crate::Error::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_config_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is [not toml").unwrap();

        let fc = load_config_file_from(file.path());
        assert!(fc.generation.model.is_none());
        assert!(fc.generation.endpoint.is_none());
        assert!(fc.audio.buffer_size.is_none());
        assert!(fc.speech.command.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let fc = load_config_file_from(&dir.path().join("config.toml"));
        assert!(fc.recognizer.model_path.is_none());
        assert!(fc.generation.model.is_none());
    }

    #[test]
    fn test_valid_file_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[speech]\ncommand = \"say\"\nargs = [\"-r\", \"180\"]").unwrap();

        let fc = load_config_file_from(file.path());
        assert_eq!(fc.speech.command.as_deref(), Some("say"));
        assert_eq!(fc.speech.args, Some(vec!["-r".to_string(), "180".to_string()]));
    }
}
