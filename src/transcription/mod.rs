//! Transcription module for Svar.
//!
//! Audio attachments are turned into text with OpenAI Whisper before they are
//! handed to the agent.

mod whisper;

pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Plain-text transcript of an audio file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    /// Full transcribed text.
    pub text: String,
    /// Detected language, when reported.
    pub language: Option<String>,
    /// Audio duration in seconds.
    pub duration_seconds: f64,
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}
