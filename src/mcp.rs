//! MCP JSON-RPC protocol bridge.
//!
//! * **Tools** from the [`ToolRegistry`] are exposed via `list_tools` /
//!   `call_tool`. Calls run on the blocking pool through
//!   [`ToolRegistry::call`], so analytics and failure classification are
//!   identical to the REST surface.
//! * **Prompts** from the static catalogue are exposed via `list_prompts` /
//!   `get_prompt`.
//!
//! The same bridge serves stdio ([`serve_stdio`]) and the streamable HTTP
//! endpoint mounted by [`crate::server`].

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};

use crate::prompts;
use crate::traits::{ToolContext, ToolRegistry};

/// Each MCP session receives a clone of this struct; all sessions share
/// one registry and one context.
#[derive(Clone)]
pub struct McpBridge {
    tools: Arc<ToolRegistry>,
    ctx: ToolContext,
}

impl McpBridge {
    pub fn new(tools: Arc<ToolRegistry>, ctx: ToolContext) -> Self {
        Self { tools, ctx }
    }

    fn to_mcp_tool(tool: &dyn crate::traits::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> = match tool.parameters_schema() {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    fn to_mcp_prompt(prompt: &prompts::Prompt) -> Prompt {
        Prompt {
            name: prompt.name.to_string(),
            title: None,
            description: Some(prompt.description.to_string()),
            arguments: None,
            icons: None,
            meta: None,
        }
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "xmlui-mcp".to_string(),
                title: Some("XMLUI MCP".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "XMLUI documentation assistant. Start with list_components or search; \
                 read a component's reference with component_docs before using it; \
                 use search_howto for task questions and examples for markup. \
                 Cite only the documentation URLs these tools return. \
                 Call inject_prompt with xmlui_rules at the start of a session."
                    .to_string(),
            ),
        }
    }

    // ── Tools ────────────────────────────────────────────────────────────

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if self.tools.find(&request.name).is_none() {
            return Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            ));
        }

        let name = request.name.to_string();
        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let tools = self.tools.clone();
        let ctx = self.ctx.clone();
        let tool_name = name.clone();
        let outcome = tokio::task::spawn_blocking(move || tools.call(&tool_name, params, &ctx))
            .await
            .map_err(|e| McpError::new(ErrorCode::INTERNAL_ERROR, format!("{}: {}", name, e), None))?;

        match outcome {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!("{}: {}", name, e))])),
        }
    }

    // ── Prompts ──────────────────────────────────────────────────────────

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        let prompts: Vec<Prompt> = prompts::PROMPTS.iter().map(Self::to_mcp_prompt).collect();
        std::future::ready(Ok(ListPromptsResult::with_all_items(prompts)))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let prompt = prompts::find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::INVALID_PARAMS,
                format!("no prompt named: {}", request.name),
                None,
            )
        })?;

        Ok(GetPromptResult {
            description: Some(prompt.description.to_string()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, prompt.content)],
        })
    }
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn serve_stdio(tools: Arc<ToolRegistry>, ctx: ToolContext) -> anyhow::Result<()> {
    tracing::info!(tools = tools.len(), "serving MCP over stdio");
    let service = McpBridge::new(tools, ctx).serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    tracing::info!("stdio client disconnected");
    Ok(())
}
