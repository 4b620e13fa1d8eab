//! Prompt templates for Svar.
//!
//! Prompts can be customized by placing an `agent.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts driving the question-answering agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// Planning and tool-usage instructions.
    pub system: String,
    /// Exact-match formatting rules appended to the system prompt.
    pub answer_format: String,
    /// Sent when the iteration budget is spent and an answer is required.
    pub finalize: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a careful research assistant answering benchmark questions that have a single, exactly-matched answer.

Work through every task in this order:
1. Facts given: list what the question and any attachment already tell you.
2. Facts needed: list what still has to be looked up or computed.
3. Plan: decide which tools answer each missing fact.
4. Execute: call the tools. Never guess a fact you can look up.
5. Review: check the result against the exact wording of the question.
6. Final answer: reply in the format the question asks for.

Tools:
- web_search for current facts and anything not on Wikipedia
- url_content to read a specific page the question links to; do not rely on titles or descriptions alone
- search_wikipedia for encyclopedic facts, discographies, lists and dates
- search_arxiv for academic papers
- calculate for arithmetic and scientific expressions
- solve_equation for equations in one variable
- reverse_text when a question reads backwards; reverse it first, then answer the decoded question
- sort_items whenever the answer must be alphabetized or ordered

Attachments are included in the question: images are attached directly, audio arrives as a transcript and text files are inlined.

Example:
Question: What is the capital of France?
Thought: a quick search confirms this.
Action: web_search(query="capital of France")
FINAL ANSWER: Paris

Always end your reply with a line of the form:
FINAL ANSWER: <answer>"#
                .to_string(),

            answer_format: r#"Answer formatting rules:
- YOUR FINAL ANSWER is a number OR as few words as possible OR a comma separated list of numbers and/or strings.
- No explanations, steps, labels or extra text after FINAL ANSWER.
- Numbers: no thousands separators, no units such as $ or % unless asked, digits rather than words unless asked.
- Currency answers use the currency symbol, for example $40.00.
- Strings: no articles, no abbreviations (for example for cities), digits written in plain text unless asked.
- Lists: apply the rules above to each element, separate elements with ", " and never wrap the list in [] or {}.
- No leading or trailing spaces, quotes or symbols that are not part of the answer.
{{extra_rules}}"#
                .to_string(),

            finalize: r#"You have used all available tool calls. Based only on the information gathered so far, give your best answer now.
End with a line of the form:
FINAL ANSWER: <answer>"#
                .to_string(),
        }
    }
}

impl AgentPrompts {
    /// The full system prompt: planning instructions followed by formatting rules.
    pub fn full_system(&self, variables: &HashMap<String, String>) -> String {
        let mut vars = HashMap::from([("extra_rules".to_string(), String::new())]);
        vars.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));

        let system = Prompts::render(&self.system, &vars);
        let format = Prompts::render(&self.answer_format, &vars);
        format!("{}\n\n{}", system.trim_end(), format.trim_end())
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// System prompt with custom variables applied.
    pub fn agent_system(&self) -> String {
        self.agent.full_system(&self.variables)
    }

    /// Finalization prompt with custom variables applied.
    pub fn agent_finalize(&self) -> String {
        Self::render(&self.agent.finalize, &self.variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        let system = prompts.agent_system();
        assert!(system.contains("FINAL ANSWER:"));
        assert!(system.contains("reverse_text"));
        assert!(system.contains("Answer formatting rules"));
        // Unset placeholder renders to nothing
        assert!(!system.contains("{{extra_rules}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_custom_variables_fill_extra_rules() {
        let vars = HashMap::from([(
            "extra_rules".to_string(),
            "- Round to two decimals.".to_string(),
        )]);
        let prompts = Prompts::load(None, Some(&vars)).unwrap();
        assert!(prompts.agent_system().ends_with("- Round to two decimals."));
    }

    #[test]
    fn test_load_custom_agent_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("agent.toml"),
            "system = \"Custom system\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.agent.system, "Custom system");
        // Fields missing from the file keep their defaults
        assert!(prompts.agent.answer_format.contains("comma separated list"));
    }
}
