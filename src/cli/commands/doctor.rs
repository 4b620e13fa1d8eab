//! Doctor command - verify configuration and connectivity.

use crate::cli::Output;
use crate::config::Settings;
use crate::openai::is_api_key_configured;
use crate::scoring::ScoringClient;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Svar Doctor");
    println!();
    println!("Checking configuration and connectivity...\n");

    let mut checks = Vec::new();

    println!("{}", style("LLM").bold());
    let llm_checks = vec![check_api_key(settings), check_model(settings)];
    for check in &llm_checks {
        check.print();
    }
    checks.extend(llm_checks);

    println!();

    println!("{}", style("Scoring API").bold());
    let scoring_checks = vec![
        check_scoring_api(settings).await,
        check_submission_identity(settings),
    ];
    for check in &scoring_checks {
        check.print();
    }
    checks.extend(scoring_checks);

    println!();

    println!("{}", style("Local Data").bold());
    let data_checks = check_data(settings);
    for check in &data_checks {
        check.print();
    }
    checks.extend(data_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Svar.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Svar is ready to use.");
    }

    Ok(())
}

fn check_api_key(settings: &Settings) -> CheckResult {
    let name = settings.llm.api_key_env.as_str();
    if !is_api_key_configured(&settings.llm) {
        return CheckResult::error(
            name,
            "not set",
            &format!("Set with: export {}='...'", name),
        );
    }

    let key = std::env::var(name).unwrap_or_default();
    CheckResult::ok(name, &format!("configured ({})", mask_key(&key)))
}

fn check_model(settings: &Settings) -> CheckResult {
    let endpoint = settings
        .llm
        .api_base
        .as_deref()
        .unwrap_or("https://api.openai.com/v1");
    CheckResult::ok("Model", &format!("{} via {}", settings.llm.model, endpoint))
}

async fn check_scoring_api(settings: &Settings) -> CheckResult {
    let client = match ScoringClient::new(&settings.scoring) {
        Ok(client) => client,
        Err(e) => return CheckResult::error("Questions", &e.to_string(), "Check scoring.base_url"),
    };

    match client.fetch_questions().await {
        Ok(questions) => CheckResult::ok(
            "Questions",
            &format!("{} available at {}", questions.len(), client.base_url()),
        ),
        Err(e) => CheckResult::warning(
            "Questions",
            &format!("unreachable ({})", e),
            "Check scoring.base_url or SVAR_API_BASE_URL",
        ),
    }
}

fn check_submission_identity(settings: &Settings) -> CheckResult {
    match (&settings.scoring.username, &settings.scoring.agent_code) {
        (Some(user), Some(code)) => {
            CheckResult::ok("Submission", &format!("as {} ({})", user, code))
        }
        (None, _) => CheckResult::warning(
            "Submission",
            "no username",
            "Set HF_USERNAME or scoring.username, or pass --username",
        ),
        (Some(_), None) => CheckResult::warning(
            "Submission",
            "no agent code URL",
            "Set SPACE_ID or scoring.agent_code",
        ),
    }
}

fn check_data(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &data_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let questions = settings.questions_path();
    if questions.exists() {
        results.push(CheckResult::ok("Questions file", &questions.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Questions file",
            "not downloaded",
            "Download with: svar fetch",
        ));
    }

    results
}

fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: svar config edit",
        )
    }
}

/// Show only the start and end of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-proj-abcdefghijklmnop"), "sk-proj...mnop");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn test_submission_identity() {
        let mut settings = Settings::default();
        assert_eq!(check_submission_identity(&settings).status, CheckStatus::Warning);
        settings.scoring.username = Some("alice".to_string());
        settings.scoring.agent_code = Some("https://example.com/code".to_string());
        assert_eq!(check_submission_identity(&settings).status, CheckStatus::Ok);
    }
}
