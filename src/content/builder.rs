//! Assembles the multimodal user message for a question.

use super::attachment::{image_mime_type, MediaKind};
use super::urls::UrlDetector;
use crate::error::{Result, SvarError};
use crate::scoring::Question;
use crate::transcription::Transcriber;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Maximum characters of a text attachment inlined into the prompt.
const MAX_INLINE_TEXT_CHARS: usize = 20_000;

/// A single piece of the user message.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Base64 `data:` URL of an image.
    ImageDataUrl(String),
}

/// Everything the agent receives for one question.
#[derive(Debug, Clone)]
pub struct QuestionContent {
    pub task_id: String,
    /// Message parts, question text first.
    pub parts: Vec<ContentPart>,
    /// URLs detected in the question text.
    pub urls: Vec<String>,
    /// Local path of the attachment, if any.
    pub attachment: Option<PathBuf>,
}

impl QuestionContent {
    /// Concatenated text parts, used for logging and text-only fallbacks.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::ImageDataUrl(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Whether any part carries an image.
    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, ContentPart::ImageDataUrl(_)))
    }
}

/// Builds [`QuestionContent`] from a question and its downloaded attachment.
pub struct ContentBuilder {
    detector: UrlDetector,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl ContentBuilder {
    /// Create a builder. Without a transcriber, audio attachments are described but not transcribed.
    pub fn new(transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self {
            detector: UrlDetector::new(),
            transcriber,
        }
    }

    /// Build the message parts for a question.
    ///
    /// Attachment problems are reported to the model as a note instead of failing the question.
    #[instrument(skip(self, question), fields(task_id = %question.task_id))]
    pub async fn build(&self, question: &Question, attachment: Option<&Path>) -> QuestionContent {
        let mut parts = vec![ContentPart::Text(question.question.clone())];

        if let Some(path) = attachment {
            let part = match self.attachment_part(path).await {
                Ok(part) => part,
                Err(e) => {
                    warn!("Could not process attachment {}: {}", path.display(), e);
                    ContentPart::Text(format!(
                        "An attachment named {} belongs to this question but could not be read ({}).",
                        file_name(path),
                        e
                    ))
                }
            };
            parts.push(part);
        } else if question.has_attachment() {
            parts.push(ContentPart::Text(format!(
                "An attachment named {} belongs to this question but is not available.",
                question.file_name
            )));
        }

        let urls = self.detector.extract_urls(&question.question);
        if !urls.is_empty() {
            let listing = urls
                .iter()
                .map(|u| format!("- {}", u))
                .collect::<Vec<_>>()
                .join("\n");
            parts.push(ContentPart::Text(format!(
                "The question references these URLs. Use the url_content tool to read them:\n{}",
                listing
            )));
        }

        debug!("Built {} content parts", parts.len());
        QuestionContent {
            task_id: question.task_id.clone(),
            parts,
            urls,
            attachment: attachment.map(Path::to_path_buf),
        }
    }

    async fn attachment_part(&self, path: &Path) -> Result<ContentPart> {
        let name = file_name(path);

        match MediaKind::from_file_name(&name) {
            MediaKind::Image => {
                let bytes = tokio::fs::read(path).await?;
                Ok(ContentPart::ImageDataUrl(format!(
                    "data:{};base64,{}",
                    image_mime_type(&name),
                    STANDARD.encode(bytes)
                )))
            }
            MediaKind::Audio => {
                let transcriber = self.transcriber.as_ref().ok_or_else(|| {
                    SvarError::Attachment("no transcriber configured for audio".to_string())
                })?;
                let transcript = transcriber.transcribe(path).await?;
                Ok(ContentPart::Text(format!(
                    "Transcript of the attached audio file {}:\n{}",
                    name, transcript.text
                )))
            }
            MediaKind::Text => {
                let bytes = tokio::fs::read(path).await?;
                let text = String::from_utf8_lossy(&bytes);
                let (inlined, truncated) = truncate_chars(&text, MAX_INLINE_TEXT_CHARS);
                let note = if truncated { " (truncated)" } else { "" };
                Ok(ContentPart::Text(format!(
                    "Contents of the attached file {}{}:\n```\n{}\n```",
                    name, note, inlined
                )))
            }
            MediaKind::Video | MediaKind::Other => {
                let size = tokio::fs::metadata(path).await?.len();
                Ok(ContentPart::Text(format!(
                    "A {} byte attachment named {} is stored at {}. Its contents cannot be shown directly.",
                    size,
                    name,
                    path.display()
                )))
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Truncate to at most `max` characters, reporting whether anything was cut.
pub(crate) fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::Transcript;
    use async_trait::async_trait;

    struct FakeTranscriber;

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Transcript> {
            Ok(Transcript {
                text: "Add two cups of flour.".to_string(),
                language: Some("english".to_string()),
                duration_seconds: 3.0,
            })
        }
    }

    fn question_with_file(file_name: &str) -> Question {
        let mut q = Question::new("task-1", "What does the attachment say?");
        q.file_name = file_name.to_string();
        q
    }

    #[tokio::test]
    async fn test_text_only_question() {
        let builder = ContentBuilder::new(None);
        let content = builder
            .build(&Question::new("t", "What is the capital of France?"), None)
            .await;
        assert_eq!(
            content.parts,
            vec![ContentPart::Text("What is the capital of France?".to_string())]
        );
        assert!(content.urls.is_empty());
    }

    #[tokio::test]
    async fn test_image_attachment_becomes_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let builder = ContentBuilder::new(None);
        let content = builder
            .build(&question_with_file("board.png"), Some(&path))
            .await;

        assert!(content.has_image());
        match &content.parts[1] {
            ContentPart::ImageDataUrl(url) => assert_eq!(url, "data:image/png;base64,iVBORw=="),
            other => panic!("Expected image part, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_audio_attachment_is_transcribed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe.mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let builder = ContentBuilder::new(Some(Arc::new(FakeTranscriber)));
        let content = builder
            .build(&question_with_file("recipe.mp3"), Some(&path))
            .await;

        assert!(content.text().contains("Add two cups of flour."));
    }

    #[tokio::test]
    async fn test_audio_without_transcriber_degrades_to_note() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe.mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let builder = ContentBuilder::new(None);
        let content = builder
            .build(&question_with_file("recipe.mp3"), Some(&path))
            .await;

        assert_eq!(content.parts.len(), 2);
        assert!(content.text().contains("could not be read"));
    }

    #[tokio::test]
    async fn test_text_attachment_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.py");
        std::fs::write(&path, "print(6 * 7)").unwrap();

        let builder = ContentBuilder::new(None);
        let content = builder
            .build(&question_with_file("code.py"), Some(&path))
            .await;

        assert!(content.text().contains("print(6 * 7)"));
        assert_eq!(content.attachment.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_missing_attachment_and_urls() {
        let builder = ContentBuilder::new(None);
        let mut q = question_with_file("sales.xlsx");
        q.question = "Compare with https://example.com/report".to_string();

        let content = builder.build(&q, None).await;
        assert_eq!(content.urls, vec!["https://example.com/report"]);
        let text = content.text();
        assert!(text.contains("sales.xlsx"));
        assert!(text.contains("url_content"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("abc", 3), ("abc", false));
    }
}
