//! Built-in tool handlers.
//!
//! | Tool | Module |
//! |------|--------|
//! | `list_components`, `component_docs` | [`components`] |
//! | `read_file` | [`read_file`] |
//! | `search`, `examples`, `list_howto`, `search_howto` | [`search`] |
//! | `pattern` | [`pattern`] |
//! | `inject_prompt`, `list_prompts`, `get_prompt`, `get_session_context` | [`prompts`] |

pub mod components;
pub mod pattern;
pub mod prompts;
pub mod read_file;
pub mod search;

use serde_json::{json, Value};

use crate::traits::ToolRegistry;

pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(Box::new(components::ListComponentsTool));
    registry.register(Box::new(components::ComponentDocsTool));
    registry.register(Box::new(read_file::ReadFileTool));
    registry.register(Box::new(search::SearchTool));
    registry.register(Box::new(search::ExamplesTool));
    registry.register(Box::new(search::ListHowtoTool));
    registry.register(Box::new(search::SearchHowtoTool));
    registry.register(Box::new(pattern::PatternTool));
    registry.register(Box::new(prompts::InjectPromptTool));
    registry.register(Box::new(prompts::ListPromptsTool));
    registry.register(Box::new(prompts::GetPromptTool));
    registry.register(Box::new(prompts::GetSessionContextTool));
}

/// Schema for tools without arguments.
pub(crate) fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Schema with a single required string argument.
pub(crate) fn single_string_schema(name: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            name: { "type": "string", "description": description }
        },
        "required": [name]
    })
}
