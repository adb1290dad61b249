//! Fixed-size frame assembly
//!
//! Capture callbacks hand over whatever the driver had buffered. The
//! recognizer is fed in frames of exactly `frame_len` samples.

/// Re-chunks a sample stream into equal frames
#[derive(Debug)]
pub struct FrameAssembler {
    frame_len: usize,
    pending: Vec<i16>,
}

impl FrameAssembler {
    /// Create an assembler emitting frames of `frame_len` samples
    ///
    /// A zero length is treated as one sample per frame.
    #[must_use]
    pub fn new(frame_len: usize) -> Self {
        let frame_len = frame_len.max(1);
        Self {
            frame_len,
            pending: Vec::with_capacity(frame_len * 2),
        }
    }

    /// Append captured samples
    pub fn push(&mut self, samples: &[i16]) {
        self.pending.extend_from_slice(samples);
    }

    /// Take the next complete frame, if one is buffered
    pub fn pop(&mut self) -> Option<Vec<i16>> {
        if self.pending.len() < self.frame_len {
            return None;
        }
        let rest = self.pending.split_off(self.frame_len);
        Some(std::mem::replace(&mut self.pending, rest))
    }

    /// Samples waiting for a full frame
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Frame length in samples
    #[must_use]
    pub const fn frame_len(&self) -> usize {
        self.frame_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_only_full_frames() {
        let mut frames = FrameAssembler::new(4);
        frames.push(&[1, 2, 3]);
        assert!(frames.pop().is_none());

        frames.push(&[4, 5]);
        assert_eq!(frames.pop(), Some(vec![1, 2, 3, 4]));
        assert!(frames.pop().is_none());
        assert_eq!(frames.pending(), 1);
    }

    #[test]
    fn test_large_push_splits_in_order() {
        let mut frames = FrameAssembler::new(3);
        frames.push(&[1, 2, 3, 4, 5, 6, 7]);

        assert_eq!(frames.pop(), Some(vec![1, 2, 3]));
        assert_eq!(frames.pop(), Some(vec![4, 5, 6]));
        assert!(frames.pop().is_none());

        frames.push(&[8, 9]);
        assert_eq!(frames.pop(), Some(vec![7, 8, 9]));
    }

    #[test]
    fn test_zero_length_clamped() {
        let mut frames = FrameAssembler::new(0);
        assert_eq!(frames.frame_len(), 1);
        frames.push(&[42]);
        assert_eq!(frames.pop(), Some(vec![42]));
    }
}
