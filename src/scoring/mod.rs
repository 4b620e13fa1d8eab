//! Client and data models for the course scoring service.
//!
//! The service hands out benchmark questions, serves their attached files and
//! scores submitted answers by exact match.

mod client;
mod models;

pub use client::{validate_task_id, ScoringClient};
pub use models::{AnswerPayload, Question, Submission, SubmissionResult};
