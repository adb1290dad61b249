//! Turning live audio into finalized utterances

use std::time::Duration;

use super::capture::{AudioInput, FrameSource};
use super::recognizer::{Recognizer, RecognizerFactory};
use crate::shutdown::ShutdownSignal;
use crate::{Error, Result};

/// Upper bound on a single frame wait, so a stop request is noticed promptly
pub const FRAME_WAIT: Duration = Duration::from_millis(100);

/// Produces one utterance per call
pub trait TranscriptSource {
    /// Block until the speaker finishes a non-empty utterance
    ///
    /// # Errors
    ///
    /// Returns `Error::Interrupted` if a stop was requested while waiting,
    /// or any capture or recognition fault
    fn next_utterance(&mut self) -> Result<String>;
}

/// Feeds microphone frames to a recognizer until it finalizes some text
pub struct Transcriber<A, M> {
    input: A,
    model: M,
    shutdown: ShutdownSignal,
}

impl<A, M> Transcriber<A, M>
where
    A: AudioInput,
    M: RecognizerFactory,
{
    /// Create a transcriber over an audio input and a loaded model
    #[must_use]
    pub const fn new(input: A, model: M, shutdown: ShutdownSignal) -> Self {
        Self {
            input,
            model,
            shutdown,
        }
    }
}

impl<A, M> TranscriptSource for Transcriber<A, M>
where
    A: AudioInput,
    M: RecognizerFactory,
{
    fn next_utterance(&mut self) -> Result<String> {
        let mut recognizer = self.model.recognizer()?;
        // Stream lives for this call only; dropping it closes the device
        let mut frames = self.input.open()?;
        let mut discarded = 0_usize;

        loop {
            if self.shutdown.is_requested() {
                tracing::debug!("stop requested while listening");
                return Err(Error::Interrupted);
            }

            let Some(frame) = frames.next_frame(FRAME_WAIT)? else {
                continue;
            };

            if !recognizer.accept_frame(&frame)? {
                continue;
            }

            let text = recognizer.text();
            if text.is_empty() {
                discarded += 1;
                tracing::trace!(discarded, "empty utterance discarded");
                continue;
            }

            tracing::debug!(chars = text.len(), discarded, "utterance finalized");
            return Ok(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    /// Scripted recognizer outcome for one frame
    #[derive(Clone)]
    enum Step {
        Partial,
        Final(&'static str),
        Fail,
    }

    struct ScriptedRecognizer {
        steps: Rc<RefCell<VecDeque<Step>>>,
        last: String,
    }

    impl Recognizer for ScriptedRecognizer {
        fn accept_frame(&mut self, _frame: &[i16]) -> Result<bool> {
            match self.steps.borrow_mut().pop_front() {
                Some(Step::Partial) | None => Ok(false),
                Some(Step::Final(text)) => {
                    self.last = text.to_string();
                    Ok(true)
                }
                Some(Step::Fail) => Err(Error::Stt("decoding failed".to_string())),
            }
        }

        fn text(&mut self) -> String {
            std::mem::take(&mut self.last)
        }
    }

    struct ScriptedModel {
        steps: Rc<RefCell<VecDeque<Step>>>,
    }

    impl RecognizerFactory for ScriptedModel {
        type Recognizer = ScriptedRecognizer;

        fn recognizer(&self) -> Result<ScriptedRecognizer> {
            Ok(ScriptedRecognizer {
                steps: Rc::clone(&self.steps),
                last: String::new(),
            })
        }
    }

    /// Hands out a fixed number of frames, then asks the session to stop
    struct FakeFrames {
        remaining: usize,
        shutdown: ShutdownSignal,
        opened: Rc<RefCell<usize>>,
    }

    impl FrameSource for FakeFrames {
        fn next_frame(&mut self, _timeout: Duration) -> Result<Option<Vec<i16>>> {
            if self.remaining == 0 {
                self.shutdown.request();
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(vec![0; 4]))
        }
    }

    impl Drop for FakeFrames {
        fn drop(&mut self) {
            *self.opened.borrow_mut() -= 1;
        }
    }

    struct FakeInput {
        frames: usize,
        shutdown: ShutdownSignal,
        opened: Rc<RefCell<usize>>,
    }

    impl AudioInput for FakeInput {
        type Frames = FakeFrames;

        fn open(&self) -> Result<FakeFrames> {
            *self.opened.borrow_mut() += 1;
            Ok(FakeFrames {
                remaining: self.frames,
                shutdown: self.shutdown.clone(),
                opened: Rc::clone(&self.opened),
            })
        }
    }

    fn transcriber(
        steps: &[Step],
        frames: usize,
    ) -> (Transcriber<FakeInput, ScriptedModel>, Rc<RefCell<usize>>) {
        let shutdown = ShutdownSignal::new();
        let opened = Rc::new(RefCell::new(0));
        let input = FakeInput {
            frames,
            shutdown: shutdown.clone(),
            opened: Rc::clone(&opened),
        };
        let model = ScriptedModel {
            steps: Rc::new(RefCell::new(steps.iter().cloned().collect())),
        };
        (Transcriber::new(input, model, shutdown), opened)
    }

    #[test]
    fn test_returns_first_finalized_text() {
        let (mut source, _) = transcriber(
            &[Step::Partial, Step::Partial, Step::Final("hello there")],
            10,
        );
        assert_eq!(source.next_utterance().unwrap(), "hello there");
    }

    #[test]
    fn test_empty_finalizations_skipped() {
        let (mut source, _) = transcriber(
            &[Step::Final(""), Step::Partial, Step::Final(""), Step::Final("hello")],
            10,
        );
        assert_eq!(source.next_utterance().unwrap(), "hello");
    }

    #[test]
    fn test_never_returns_empty() {
        // Only silence, then the input runs dry and requests a stop
        let (mut source, _) = transcriber(&[Step::Final(""), Step::Final("")], 5);
        assert!(matches!(source.next_utterance(), Err(Error::Interrupted)));
    }

    #[test]
    fn test_stop_requested_before_listening() {
        let (mut source, _) = transcriber(&[Step::Final("hello")], 10);
        source.shutdown.request();
        assert!(matches!(source.next_utterance(), Err(Error::Interrupted)));
    }

    #[test]
    fn test_recognizer_fault_propagates() {
        let (mut source, _) = transcriber(&[Step::Partial, Step::Fail], 10);
        assert!(matches!(source.next_utterance(), Err(Error::Stt(_))));
    }

    #[test]
    fn test_stream_released_after_each_utterance() {
        let (mut source, opened) =
            transcriber(&[Step::Final("one"), Step::Final("two")], 10);

        assert_eq!(source.next_utterance().unwrap(), "one");
        assert_eq!(*opened.borrow(), 0);
        assert_eq!(source.next_utterance().unwrap(), "two");
        assert_eq!(*opened.borrow(), 0);
    }
}
