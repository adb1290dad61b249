//! Answer generation
//!
//! Sends each utterance to a streaming text-generation service and assembles
//! the reply from its token stream.

mod client;
mod stream;

pub use client::{AnswerFetcher, FETCH_ERROR_PREFIX, GenerateClient, NO_ANSWER, answer_or_report};
pub use stream::{StreamChunk, StreamChunks, collect_answer};
