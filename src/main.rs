use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::config::Overrides;
use parley::llm::{AnswerFetcher, GenerateClient};
use parley::voice::{
    AudioInput, CommandSpeaker, FRAME_WAIT, FrameSource, Microphone, SpeechSink,
};
use parley::{Config, ShutdownSignal};

/// Parley - Talk to a local language model, hands-free
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Directory holding the Vosk speech model
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Streaming generate endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Language model to ask (e.g., "llama2:latest")
    #[arg(short, long)]
    model: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Ask the language model one question and print the answer
    Ask {
        /// Question to send
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "info,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "fatal");
            eprintln!("An error occurred: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        model_path: cli.model_path,
        endpoint: cli.endpoint,
        llm_model: cli.model,
    };

    let config = Config::load(&overrides)?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::TestMic { duration }) => test_mic(config, duration).await,
        Some(Command::TestTts { text }) => test_tts(&config, text).await,
        Some(Command::Ask { prompt }) => ask(config, prompt).await,
        None => converse(config).await,
    }
}

/// Run the conversation loop until interrupted
async fn converse(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        model = %config.generation.model,
        endpoint = %config.generation.endpoint,
        recognizer = %config.recognizer.model_path.display(),
        "starting parley"
    );

    let shutdown = ShutdownSignal::new();
    watch_interrupts(shutdown.clone());

    // Capture streams aren't Send; build and run the session on one thread
    tokio::task::spawn_blocking(move || run_session(&config, &shutdown)).await??;

    println!("\nExiting. Bye!");
    Ok(())
}

#[cfg(feature = "vosk")]
fn run_session(config: &Config, shutdown: &ShutdownSignal) -> parley::Result<()> {
    let mut session = parley::session::voice_session(config, shutdown.clone())?;
    session.run()
}

#[cfg(not(feature = "vosk"))]
fn run_session(config: &Config, _shutdown: &ShutdownSignal) -> parley::Result<()> {
    parley::voice::check_model_dir(&config.recognizer.model_path)?;
    Err(parley::Error::Stt(
        "built without speech recognition; rebuild with `--features vosk`".to_string(),
    ))
}

/// Flag the session to stop on the first Ctrl-C; exit at once on the second
fn watch_interrupts(shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            return;
        }
        tracing::info!("interrupt received, finishing current step");
        shutdown.request();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted again, exiting now");
            std::process::exit(130);
        }
    });
}

/// Test microphone input
async fn test_mic(config: Config, duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let shutdown = ShutdownSignal::new();
    watch_interrupts(shutdown.clone());

    tokio::task::spawn_blocking(move || {
        meter(&config, Duration::from_secs(duration), &shutdown)
    })
    .await??;

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Print one level line per captured frame
fn meter(config: &Config, duration: Duration, shutdown: &ShutdownSignal) -> parley::Result<()> {
    let microphone = Microphone::new(&config.audio)?;
    println!(
        "Sample rate: {} Hz, {} samples per frame",
        microphone.sample_rate(),
        config.audio.buffer_size
    );
    println!("---");

    let mut frames = microphone.open()?;
    let start = Instant::now();

    while start.elapsed() < duration && !shutdown.is_requested() {
        let Some(frame) = frames.next_frame(FRAME_WAIT)? else {
            continue;
        };

        let energy = calculate_rms(&frame);
        let peak = frame.iter().copied().map(i16::unsigned_abs).max().unwrap_or(0);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:5.2}s] RMS: {energy:.4} | Peak: {peak:5} | [{meter}]",
            start.elapsed().as_secs_f32()
        );
    }

    Ok(())
}

/// Calculate RMS energy of PCM16 samples, scaled to [0, 1]
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples
        .iter()
        .map(|&s| {
            let s = f32::from(s) / 32768.0;
            s * s
        })
        .sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test TTS output through the configured synthesizer
async fn test_tts(config: &Config, text: String) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let mut speaker = CommandSpeaker::new(&config.speech);
    println!("Speaking with {}...", speaker.command());

    tokio::task::spawn_blocking(move || speaker.speak(&text)).await??;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

/// Send one prompt to the generation service
async fn ask(config: Config, prompt: String) -> anyhow::Result<()> {
    let answer = tokio::task::spawn_blocking(move || {
        let mut client = GenerateClient::new(&config.generation)?;
        Ok::<_, parley::Error>(client.fetch_answer(&prompt))
    })
    .await??;

    println!("Agent: {answer}");
    Ok(())
}
