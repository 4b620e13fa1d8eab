//! Multimodal question content.
//!
//! Turns a question and its attachment into the parts of the agent's user message:
//! images are inlined as `data:` URLs, audio is transcribed, text files are inlined
//! and URLs found in the question are listed for the `url_content` tool.

mod attachment;
mod builder;
mod urls;

pub use attachment::{image_mime_type, MediaKind};
pub use builder::{ContentBuilder, ContentPart, QuestionContent};
pub(crate) use builder::truncate_chars;
pub use urls::UrlDetector;
