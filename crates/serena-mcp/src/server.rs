use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, McpRequest, McpResponse,
    ServerCapabilities, ServerInfo, ToolContent, ToolInfo, ToolsCapability,
};
use crate::transport::stdio::StdioTransport;
use anyhow::Result;
use serde_json::json;
use serena_config::ConfigService;
use serena_core::{wrap_envelope, SessionState, ToolCallKind, ToolCallRecord, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct SerenaMcpServer {
    tools: Arc<ToolRegistry>,
    config_service: Arc<ConfigService>,
    session: Arc<SessionState>,
}

impl SerenaMcpServer {
    pub fn new(tools: ToolRegistry, config_service: Arc<ConfigService>) -> Self {
        Self {
            tools: Arc::new(tools),
            config_service,
            session: Arc::new(SessionState::new()),
        }
    }

    /// Tool names enabled for the active context/project, or `None` if
    /// the contexts/projects are misconfigured and every registered
    /// tool should be exposed (fails open rather than hiding the whole
    /// registry on a config error).
    fn active_tool_names(&self) -> Option<Vec<String>> {
        self.config_service.get_active_tools().ok()
    }

    fn tool_call_kind(tool: &dyn serena_core::Tool) -> ToolCallKind {
        if tool.can_edit() {
            ToolCallKind::Edit
        } else if tool.tags().iter().any(|t| t == "memory") {
            ToolCallKind::Memory
        } else if tool.tags().iter().any(|t| t == "search") {
            ToolCallKind::Search
        } else {
            ToolCallKind::Read
        }
    }

    fn affected_file(arguments: &serde_json::Value) -> Option<String> {
        arguments
            .get("relative_path")
            .or_else(|| arguments.get("path"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub async fn serve_stdio(self) -> Result<()> {
        info!("Starting Serena MCP server on stdio");
        let transport = StdioTransport::new();

        loop {
            match transport.receive().await {
                Ok(Some(request)) => {
                    debug!("Received request: {:?}", request.method);
                    let response = self.handle_request(request).await;
                    transport.send(&response).await?;
                }
                Ok(None) => {
                    info!("Client disconnected");
                    break;
                }
                Err(e) => {
                    error!("Error receiving request: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id).await,
            "tools/list" => self.handle_list_tools(request.id).await,
            "tools/call" => {
                self.handle_call_tool(request.id, request.params.unwrap_or(json!({})))
                    .await
            }
            "ping" => McpResponse::success(request.id, json!({})),
            method => {
                warn!("Unknown method: {}", method);
                McpResponse::error(request.id, -32601, format!("Method not found: {}", method))
            }
        }
    }

    async fn handle_initialize(&self, id: Option<i64>) -> McpResponse {
        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "serena-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => {
                error!("Failed to serialize initialize result: {}", e);
                McpResponse::error(id, -32603, "Internal error")
            }
        }
    }

    async fn handle_list_tools(&self, id: Option<i64>) -> McpResponse {
        let active = self.active_tool_names();

        let tools: Vec<ToolInfo> = self
            .tools
            .list_tools()
            .iter()
            .filter(|tool| {
                active
                    .as_ref()
                    .map(|names| names.iter().any(|n| n == tool.name()))
                    .unwrap_or(true)
            })
            .map(|tool| {
                let schema = tool.parameters_schema();
                ToolInfo {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    input_schema: schema,
                }
            })
            .collect();

        McpResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_call_tool(
        &self,
        id: Option<i64>,
        params: serde_json::Value,
    ) -> McpResponse {
        let call_params: CallToolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to parse call tool params: {}", e);
                return McpResponse::error(id, -32602, "Invalid params");
            }
        };

        debug!("Calling tool: {}", call_params.name);

        if let Some(active) = self.active_tool_names() {
            if !active.iter().any(|n| n == &call_params.name) {
                warn!("Tool disabled in active context: {}", call_params.name);
                let call_result = CallToolResult {
                    content: vec![ToolContent::Text {
                        text: format!(
                            "Error: tool '{}' is disabled in the active context",
                            call_params.name
                        ),
                    }],
                    is_error: Some(true),
                };
                return match serde_json::to_value(call_result) {
                    Ok(value) => McpResponse::success(id, value),
                    Err(e) => {
                        error!("Failed to serialize disabled-tool result: {}", e);
                        McpResponse::error(id, -32603, "Internal error")
                    }
                };
            }
        }

        match self.tools.get_tool(&call_params.name) {
            Some(tool) => {
                let kind = Self::tool_call_kind(tool.as_ref());
                let affected_file = Self::affected_file(&call_params.arguments);

                match tool.execute(call_params.arguments.clone()).await {
                    Ok(result) => {
                        self.session.record(ToolCallRecord::new(
                            call_params.name.clone(),
                            kind,
                            affected_file,
                        ));

                        let envelope = match wrap_envelope(
                            tool.as_ref(),
                            &call_params.arguments,
                            result,
                            &self.session,
                        ) {
                            Ok(value) => value,
                            Err(e) => {
                                let call_result = CallToolResult {
                                    content: vec![ToolContent::Text {
                                        text: format!("Error: {}", e),
                                    }],
                                    is_error: Some(true),
                                };
                                return match serde_json::to_value(call_result) {
                                    Ok(value) => McpResponse::success(id, value),
                                    Err(e) => {
                                        error!("Failed to serialize truncation error: {}", e);
                                        McpResponse::error(id, -32603, "Internal error")
                                    }
                                };
                            }
                        };

                        let result_str = match serde_json::to_string_pretty(&envelope) {
                            Ok(s) => s,
                            Err(e) => {
                                error!("Failed to serialize tool result: {}", e);
                                return McpResponse::error(id, -32603, "Internal error");
                            }
                        };

                        let call_result = CallToolResult {
                            content: vec![ToolContent::Text { text: result_str }],
                            is_error: Some(false),
                        };

                        match serde_json::to_value(call_result) {
                            Ok(value) => McpResponse::success(id, value),
                            Err(e) => {
                                error!("Failed to serialize call result: {}", e);
                                McpResponse::error(id, -32603, "Internal error")
                            }
                        }
                    }
                    Err(e) => {
                        error!("Tool execution failed: {}", e);
                        let call_result = CallToolResult {
                            content: vec![ToolContent::Text {
                                text: format!("Error: {}", e),
                            }],
                            is_error: Some(true),
                        };

                        match serde_json::to_value(call_result) {
                            Ok(value) => McpResponse::success(id, value),
                            Err(e) => {
                                error!("Failed to serialize error result: {}", e);
                                McpResponse::error(id, -32603, "Internal error")
                            }
                        }
                    }
                }
            }
            None => {
                warn!("Tool not found: {}", call_params.name);
                McpResponse::error(id, -32602, format!("Tool not found: {}", call_params.name))
            }
        }
    }
}
