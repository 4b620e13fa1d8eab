//! HTTP API server for running the agent as a service.
//!
//! Provides endpoints to answer single questions and to run (and submit)
//! the full question set from the scoring API.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{AnswerRecord, Orchestrator};
use crate::scoring::{validate_task_id, Question, SubmissionResult};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::Answer, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Svar API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("Run (and submit)", "POST /run");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/run", post(run))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    task_id: String,
    answer: String,
    iterations: usize,
    tool_calls: usize,
    forced_final: bool,
}

#[derive(Deserialize, Default)]
struct RunRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    submit: bool,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct RunResponse {
    answers: Vec<AnswerRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submission: Option<SubmissionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submission_error: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.orchestrator.model_name(),
    }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    if req.question.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "question must not be empty");
    }

    let task_id = req.task_id.unwrap_or_else(|| "local".to_string());
    if let Err(e) = validate_task_id(&task_id) {
        return error_response(StatusCode::BAD_REQUEST, e);
    }

    let mut question = Question::new(task_id, req.question);
    question.file_name = req.file_name.unwrap_or_default();

    let record = state.orchestrator.answer(&question).await;
    if let Some(error) = record.error {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, error);
    }

    Json(AskResponse {
        task_id: record.task_id,
        answer: record.submitted_answer,
        iterations: record.iterations,
        tool_calls: record.tool_calls,
        forced_final: record.forced_final,
    })
    .into_response()
}

async fn run(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    let req: RunRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RunRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
        }
    };
    let orchestrator = &state.orchestrator;

    let questions = match orchestrator.scoring().fetch_questions().await {
        Ok(questions) => questions,
        Err(e) => return error_response(StatusCode::BAD_GATEWAY, e),
    };
    let questions: Vec<Question> = questions
        .into_iter()
        .take(req.limit.unwrap_or(usize::MAX))
        .collect();

    info!("Running {} questions", questions.len());
    let answers = orchestrator.answer_all(&questions).await;

    if let Err(e) = orchestrator.save_run(&answers) {
        warn!("Failed to save run: {}", e);
    }

    let (submission, submission_error) = if req.submit {
        match orchestrator
            .submit(req.username.as_deref(), None, &answers)
            .await
        {
            Ok(result) => (Some(result), None),
            Err(e) => (None, Some(e.to_string())),
        }
    } else {
        (None, None)
    };

    Json(RunResponse {
        answers,
        submission,
        submission_error,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, ChatModel, ModelTurn, ToolContext};
    use crate::config::{Prompts, ToolSettings};
    use crate::content::ContentBuilder;
    use crate::error::Result;
    use crate::research::ResearchClient;
    use crate::scoring::ScoringClient;
    use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionTool};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedModel;

    #[async_trait]
    impl ChatModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _messages: &[ChatCompletionRequestMessage],
            _tools: Option<&[ChatCompletionTool]>,
        ) -> Result<ModelTurn> {
            Ok(ModelTurn {
                content: Some("FINAL ANSWER: **right**".to_string()),
                tool_calls: Vec::new(),
            })
        }
    }

    async fn spawn_server(scoring_url: &str, data_dir: &std::path::Path) -> String {
        let mut settings = Settings::default();
        settings.general.data_dir = data_dir.to_string_lossy().to_string();

        let research = ResearchClient::with_http_client(reqwest::Client::new(), ToolSettings::default());
        let agent = Agent::new(
            Arc::new(FixedModel),
            ToolContext::new(Arc::new(research)),
            Prompts::default(),
        );
        let orchestrator = Orchestrator::with_components(
            settings,
            ScoringClient::with_http_client(reqwest::Client::new(), scoring_url),
            ContentBuilder::new(None),
            agent,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(orchestrator)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health_and_ask() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server("http://127.0.0.1:9", dir.path()).await;
        let http = reqwest::Client::new();

        let health: Value = http
            .get(format!("{}/health", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health, json!({"status": "ok", "model": "fixed"}));

        let answer: Value = http
            .post(format!("{}/ask", base))
            .json(&json!({"question": "Opposite of left?"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(answer["answer"], "right");
        assert_eq!(answer["iterations"], 1);

        let status = http
            .post(format!("{}/ask", base))
            .json(&json!({"question": "  "}))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);

        let status = http
            .post(format!("{}/ask", base))
            .json(&json!({
                "question": "What does the file say?",
                "task_id": "../private",
                "file_name": "config.toml"
            }))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_without_submit() {
        let scoring = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"task_id": "a", "question": "First?", "Level": "1", "file_name": ""},
                {"task_id": "b", "question": "Second?", "Level": "1", "file_name": ""}
            ])))
            .mount(&scoring)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(&scoring.uri(), dir.path()).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{}/run", base))
            .json(&json!({"limit": 1}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let answers = body["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0]["task_id"], "a");
        assert_eq!(answers[0]["submitted_answer"], "right");
        assert!(body.get("submission").is_none());
        assert!(dir.path().join("runs").exists());
    }

    #[tokio::test]
    async fn test_run_reports_submission_error() {
        let scoring = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"task_id": "a", "question": "First?", "Level": "1", "file_name": ""}
            ])))
            .mount(&scoring)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(&scoring.uri(), dir.path()).await;
        let http = reqwest::Client::new();

        let body: Value = http
            .post(format!("{}/run", base))
            .json(&json!({"submit": true, "username": "alice"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["answers"][0]["submitted_answer"], "right");
        assert!(body.get("submission").is_none());
        assert!(body["submission_error"].as_str().unwrap().contains("agent code"));

        let response = http.post(format!("{}/run", base)).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }
}
