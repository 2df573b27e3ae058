//! rmcp `ServerHandler` over the core tool registry

use std::sync::Arc;

use ollama_mcp_core::tools::{SERVER_NAME, SERVER_VERSION};
use ollama_mcp_core::{ToolError, ToolInfo, ToolRegistry, ToolResponse};
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData, RoleServer, ServerHandler,
};
use serde_json::Value;

const INSTRUCTIONS: &str = "Tools backed by a local Ollama server. Conversational and step tools \
return a continuation_id in their status block; pass it back to continue the same conversation.";

/// MCP server exposing the registry's tools
#[derive(Clone)]
pub struct OllamaMcpServer {
    registry: Arc<ToolRegistry>,
}

impl OllamaMcpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Tool descriptors advertised in `tools/list`
    pub fn descriptors(&self) -> Vec<Tool> {
        self.registry.list_tools().iter().map(to_mcp_tool).collect()
    }

    /// Route one `tools/call` to the registry
    ///
    /// Unknown or disabled tools are protocol errors; every other failure
    /// is reported inside the result with `isError: true`.
    pub async fn dispatch(&self, name: &str, arguments: Option<JsonObject>) -> Result<CallToolResult, ErrorData> {
        let arguments = arguments.map(Value::Object).unwrap_or(Value::Null);
        match self.registry.call_tool(name, arguments).await {
            Ok(response) => Ok(to_call_result(response)),
            Err(ToolError::UnknownTool(name)) => Err(ErrorData::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            )),
            Err(e) => Err(ErrorData::internal_error(e.to_string(), None)),
        }
    }
}

fn to_mcp_tool(info: &ToolInfo) -> Tool {
    let schema = match &info.input_schema {
        Value::Object(map) => map.clone(),
        _ => JsonObject::new(),
    };
    Tool::new(info.name.clone(), info.description.clone(), Arc::new(schema))
}

fn to_call_result(response: ToolResponse) -> CallToolResult {
    let is_error = response.is_error();
    let content: Vec<Content> = response
        .content
        .into_iter()
        .map(|block| Content::text(block.as_text().to_string()))
        .collect();
    if is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for OllamaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                title: Some("Ollama MCP".to_string()),
                version: SERVER_VERSION.to_string(),
                website_url: None,
                icons: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.descriptors()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.dispatch(&request.name, request.arguments).await
    }
}
