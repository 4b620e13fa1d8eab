//! Svar - a research agent for benchmark questions
//!
//! A CLI tool and small HTTP service that answers GAIA-style questions with a
//! tool-using LLM agent and submits the answers to a scoring API.
//!
//! The name "Svar" is the Norwegian word for "answer."
//!
//! # Overview
//!
//! Svar allows you to:
//! - Fetch questions and their attached files from the scoring API
//! - Turn images, audio and text attachments into a multimodal prompt
//! - Answer with an agent that searches the web, Wikipedia and arXiv and does math
//! - Normalise replies into exact-match answers and submit them for scoring
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `scoring` - Scoring API client
//! - `dataset` - Local copy of the question set
//! - `content` - Multimodal question content (attachments, URLs)
//! - `transcription` - Speech-to-text for audio attachments
//! - `research` - Wikipedia, arXiv and web lookups
//! - `math` - Calculator and equation solver
//! - `agent` - Tool-calling agent loop
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use svar::config::Settings;
//! use svar::orchestrator::Orchestrator;
//! use svar::scoring::Question;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let question = Question::new("local", "What is the capital of Norway?");
//!     let record = orchestrator.answer(&question).await;
//!     println!("{}", record.submitted_answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod content;
pub mod dataset;
pub mod error;
pub mod math;
pub mod openai;
pub mod orchestrator;
pub mod research;
pub mod scoring;
pub mod transcription;

pub use error::{Result, SvarError};
