//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript};
use crate::error::{Result, SvarError};
use crate::openai::map_api_error;
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a transcriber using an existing client.
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| SvarError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(map_api_error)?;

        let language = Some(response.language).filter(|l| !l.is_empty());

        debug!("Transcribed {:.0}s of audio", response.duration);
        Ok(Transcript {
            text: response.text.trim().to_string(),
            language,
            duration_seconds: response.duration as f64,
        })
    }
}
