//! Audio capture from microphone

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use super::frames::FrameAssembler;
use crate::config::AudioConfig;
use crate::{Error, Result};

/// Source of fixed-size PCM16 frames
pub trait FrameSource {
    /// Wait up to `timeout` for the next frame
    ///
    /// Returns `Ok(None)` when no complete frame arrived in time.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying stream has failed
    fn next_frame(&mut self, timeout: Duration) -> Result<Option<Vec<i16>>>;
}

/// Something that can open a capture stream
///
/// Dropping the returned source must release the device.
pub trait AudioInput {
    /// Open stream type
    type Frames: FrameSource;

    /// Start capturing
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened
    fn open(&self) -> Result<Self::Frames>;
}

/// The default input device, configured for speech capture
pub struct Microphone {
    device: Device,
    config: StreamConfig,
    frame_len: usize,
}

impl Microphone {
    /// Locate the default input device and a config at the requested rate
    ///
    /// Prefers a mono config; falls back to any channel count and keeps only
    /// the first channel.
    ///
    /// # Errors
    ///
    /// Returns error if no input device or no suitable config exists
    pub fn new(audio: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let rate = SampleRate(audio.sample_rate);
        let supports_rate = |c: &cpal::SupportedStreamConfigRange| {
            c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
        };

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| c.channels() == 1 && supports_rate(c))
            .or_else(|| {
                // Fallback: multichannel, downmixed in the callback
                device
                    .supported_input_configs()
                    .ok()?
                    .find(&supports_rate)
            })
            .ok_or_else(|| {
                Error::Audio(format!(
                    "no input config supports {} Hz",
                    audio.sample_rate
                ))
            })?;

        let config = supported_config.with_sample_rate(rate).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = audio.sample_rate,
            channels = config.channels,
            frame_len = audio.buffer_size,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            frame_len: audio.buffer_size,
        })
    }

    /// Get the sample rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }
}

impl AudioInput for Microphone {
    type Frames = MicrophoneStream;

    fn open(&self) -> Result<MicrophoneStream> {
        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        let channels = usize::from(self.config.channels.max(1));

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Receiver gone means the stream is being torn down
                    let _ = tx.send(to_pcm16(data, channels));
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        tracing::debug!("audio capture started");

        Ok(MicrophoneStream {
            _stream: stream,
            samples: rx,
            frames: FrameAssembler::new(self.frame_len),
        })
    }
}

/// A live capture stream; dropping it closes the device
pub struct MicrophoneStream {
    _stream: Stream,
    samples: Receiver<Vec<i16>>,
    frames: FrameAssembler,
}

impl FrameSource for MicrophoneStream {
    fn next_frame(&mut self, timeout: Duration) -> Result<Option<Vec<i16>>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(frame) = self.frames.pop() {
                return Ok(Some(frame));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            match self.samples.recv_timeout(remaining) {
                Ok(chunk) => self.frames.push(&chunk),
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Audio("capture stream closed".to_string()));
                }
            }
        }
    }
}

impl Drop for MicrophoneStream {
    fn drop(&mut self) {
        tracing::debug!(discarded = self.frames.pending(), "audio capture stopped");
    }
}

/// Convert interleaved f32 [-1.0, 1.0] frames to mono i16, keeping channel 0
#[allow(clippy::cast_possible_truncation)]
fn to_pcm16(data: &[f32], channels: usize) -> Vec<i16> {
    data.chunks(channels)
        .map(|frame| (frame[0] * 32767.0).clamp(-32768.0, 32767.0) as i16)
        .collect()
}
