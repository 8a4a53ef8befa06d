use crate::app::App;
use crate::errors::{ErrorCode, McpError};
use crate::managers::Dispatcher;
use crate::mcp::catalog::{
    tool_by_name, tool_catalog, validate_tool_args, CALL_SERVICE_TOOL, LIST_SERVICES_TOOL,
    RELOAD_SERVICES_TOOL,
};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, ToolCallParams};
use crate::services::logger::Logger;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "restmcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn text_content(payload: &Value, is_error: bool) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string()),
        }],
        "isError": is_error,
    })
}

/// JSON-RPC front of the dispatcher: one request per line in, one response per
/// line out.
#[derive(Clone)]
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
    logger: Logger,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, logger: Logger) -> Self {
        Self {
            dispatcher,
            logger: logger.child("mcp"),
        }
    }

    pub fn from_app(app: &App) -> Self {
        Self::new(app.dispatcher.clone(), app.logger.clone())
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        json!({ "tools": tool_catalog() })
    }

    async fn handle_tools_call(
        &self,
        name: &str,
        raw_args: Option<Value>,
    ) -> Result<Value, McpError> {
        if tool_by_name(name).is_none() {
            return Err(McpError::invalid_params(format!("Unknown tool: {}", name)));
        }
        let args = match raw_args {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value,
        };
        validate_tool_args(name, &args)?;

        match name {
            LIST_SERVICES_TOOL => {
                let services = self.dispatcher.list_services();
                Ok(text_content(&json!({ "services": services }), false))
            }
            CALL_SERVICE_TOOL => {
                let service_name = args
                    .get("service_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let arguments = args
                    .get("arguments")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                let result = self.dispatcher.invoke(service_name, &arguments).await;
                Ok(text_content(&result.to_value(), !result.ok))
            }
            RELOAD_SERVICES_TOOL => {
                let count = self.dispatcher.reload()?;
                let source = self
                    .dispatcher
                    .source()
                    .map(|path| path.display().to_string());
                Ok(text_content(
                    &json!({ "reloaded": true, "services": count, "source": source }),
                    false,
                ))
            }
            _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.method.starts_with("notifications/") && request.id.is_none() {
            return None;
        }
        let id = request.id?;
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize()),
            "ping" | "notifications/initialized" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.handle_tools_list()),
            "tools/call" => {
                let params: ToolCallParams = match serde_json::from_value(request.params) {
                    Ok(params) => params,
                    Err(err) => {
                        return Some(JsonRpcResponse::from_error(
                            id,
                            McpError::invalid_params(format!("Invalid tools/call params: {}", err)),
                        ))
                    }
                };
                if params.name.trim().is_empty() {
                    JsonRpcResponse::from_error(id, McpError::invalid_params("Missing tool name"))
                } else {
                    match self.handle_tools_call(&params.name, params.arguments).await {
                        Ok(result) => JsonRpcResponse::success(id, result),
                        Err(err) => {
                            self.logger.warn(
                                "Tool call rejected",
                                Some(&json!({ "tool": params.name, "error": err.message })),
                            );
                            JsonRpcResponse::from_error(id, err)
                        }
                    }
                }
            }
            _ => JsonRpcResponse::from_error(
                id,
                McpError::new(ErrorCode::MethodNotFound, "Method not found"),
            ),
        };
        Some(response)
    }

    /// Handles one raw input line. `None` means nothing should be written back.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        let parsed: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::from_error(
                    Value::Null,
                    McpError::new(ErrorCode::ParseError, "Parse error"),
                ))
            }
        };
        match serde_json::from_value::<JsonRpcRequest>(parsed) {
            Ok(request) => self.handle_request(request).await,
            Err(_) => Some(JsonRpcResponse::from_error(
                Value::Null,
                McpError::new(ErrorCode::InvalidRequest, "Invalid request"),
            )),
        }
    }

    /// Reads requests until the input closes. Each line is handled on its own
    /// task so a slow backend call does not hold up the requests behind it;
    /// responses funnel through one channel into the single writer.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut tx = Some(tx);
        self.logger.info("MCP server ready", None);

        loop {
            tokio::select! {
                line = lines.next_line(), if tx.is_some() => match line? {
                    Some(line) => {
                        if let Some(tx) = &tx {
                            self.spawn_line(line, tx.clone());
                        }
                    }
                    None => {
                        self.logger.info("Input closed, draining pending calls", None);
                        tx = None;
                    }
                },
                response = rx.recv() => match response {
                    Some(response) => write_response(&mut writer, &response).await?,
                    None => break,
                },
            }
        }

        self.logger.info("Shutting down", None);
        Ok(())
    }

    fn spawn_line(&self, line: String, tx: mpsc::UnboundedSender<JsonRpcResponse>) {
        let server = self.clone();
        tokio::spawn(async move {
            if let Some(response) = server.handle_line(&line).await {
                let _ = tx.send(response);
            }
        });
    }

    pub async fn run_stdio(&self) -> std::io::Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_string(response).unwrap_or_default();
    writer.write_all(payload.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

pub async fn run_stdio(app: &App) -> std::io::Result<()> {
    McpServer::from_app(app).run_stdio().await
}
