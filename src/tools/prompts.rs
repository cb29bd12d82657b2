//! Prompt and session tools.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;

use super::empty_schema;
use crate::error::ToolError;
use crate::params::{non_empty, parse};
use crate::prompts;
use crate::sessions::DEFAULT_SESSION;
use crate::traits::{Tool, ToolContext, ToolOutput};

fn default_session() -> String {
    DEFAULT_SESSION.to_string()
}

#[derive(Deserialize)]
struct InjectParams {
    prompt_name: String,
    #[serde(default = "default_session")]
    session_id: String,
}

#[derive(Deserialize)]
struct PromptParams {
    prompt_name: String,
}

#[derive(Deserialize)]
struct SessionParams {
    #[serde(default = "default_session")]
    session_id: String,
}

fn prompt_names() -> Vec<&'static str> {
    prompts::PROMPTS.iter().map(|p| p.name).collect()
}

fn lookup(name: &str) -> Result<&'static prompts::Prompt, ToolError> {
    prompts::find(name).ok_or_else(|| {
        ToolError::NotFound(format!(
            "prompt '{}' (available: {})",
            name,
            prompt_names().join(", ")
        ))
    })
}

pub struct InjectPromptTool;

impl Tool for InjectPromptTool {
    fn name(&self) -> &str {
        "inject_prompt"
    }

    fn description(&self) -> &str {
        "Inject a named rules prompt into a session and return its text"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt_name": { "type": "string", "enum": prompt_names() },
                "session_id": { "type": "string", "default": DEFAULT_SESSION }
            },
            "required": ["prompt_name"]
        })
    }

    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: InjectParams = parse(params)?;
        let prompt = lookup(non_empty("prompt_name", &p.prompt_name)?)?;
        let session = non_empty("session_id", &p.session_id)?;

        let added = ctx.sessions().inject(session, prompt.name);
        tracing::debug!(session, prompt = prompt.name, added, "prompt injected");
        let status = if added { "Injected" } else { "Already injected" };
        Ok(ToolOutput::text(format!(
            "✅ {} prompt '{}' into session '{}'.\n\n{}",
            status, prompt.name, session, prompt.content
        )))
    }
}

pub struct ListPromptsTool;

impl Tool for ListPromptsTool {
    fn name(&self) -> &str {
        "list_prompts"
    }

    fn description(&self) -> &str {
        "List the prompts available for injection"
    }

    fn parameters_schema(&self) -> Value {
        empty_schema()
    }

    fn execute(&self, _params: Value, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let mut out = format!("# Prompts ({})\n\n", prompts::PROMPTS.len());
        for p in prompts::PROMPTS {
            let _ = writeln!(out, "- {}: {}", p.name, p.description);
        }
        Ok(ToolOutput::text(out))
    }
}

pub struct GetPromptTool;

impl Tool for GetPromptTool {
    fn name(&self) -> &str {
        "get_prompt"
    }

    fn description(&self) -> &str {
        "Show the text of a prompt without injecting it"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt_name": { "type": "string", "enum": prompt_names() }
            },
            "required": ["prompt_name"]
        })
    }

    fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: PromptParams = parse(params)?;
        let prompt = lookup(non_empty("prompt_name", &p.prompt_name)?)?;
        Ok(ToolOutput::text(format!("# {}\n\n{}", prompt.name, prompt.content)))
    }
}

pub struct GetSessionContextTool;

impl Tool for GetSessionContextTool {
    fn name(&self) -> &str {
        "get_session_context"
    }

    fn description(&self) -> &str {
        "Show which prompts have been injected into a session"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": { "type": "string", "default": DEFAULT_SESSION }
            }
        })
    }

    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: SessionParams = parse(params)?;
        let id = non_empty("session_id", &p.session_id)?;
        let session = ctx.sessions().get_or_create(id);

        let mut out = format!(
            "Session: {}\nCreated: {}\n",
            session.id,
            session.created_at.to_rfc3339()
        );
        if session.injected_prompts.is_empty() {
            out.push_str("Injected prompts: none\n");
        } else {
            let _ = writeln!(out, "Injected prompts: {}", session.injected_prompts.join(", "));
            for name in &session.injected_prompts {
                if let Some(p) = prompts::find(name) {
                    let _ = write!(out, "\n## {}\n\n{}", p.name, p.content);
                }
            }
        }
        Ok(ToolOutput::text(out))
    }
}
