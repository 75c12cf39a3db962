use crate::handlers;
use compass_core::config::Config;
use compass_core::error::CompassError;
use compass_core::paths;
use compass_core::registry::{RegistryEntry, SymbolLoader, ToolContext, ToolRegistry};
use compass_core::schema;
use compass_core::store::GraphStore;
use compass_core::value::{is_error_result, serialize};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::Path;

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ToolContent {
    r#type: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct ToolCallResult {
    content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    is_error: bool,
}

// Protocol error codes for the dispatch taxonomy. ToolNotFound reuses the
// JSON-RPC "method not found" code; the other two are implementation-defined.
const CODE_TOOL_NOT_FOUND: i32 = -32601;
const CODE_IMPORT_FAILURE: i32 = -32001;
const CODE_INVOCATION_FAULT: i32 = -32002;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One externally visible tool. Built once at startup from a registry entry
/// and its parameter metadata; immutable for the life of the process.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// The request/response composition root. Owns the startup-built catalog,
/// the registry with its resolution cache, and the context handed to
/// handlers. One request at a time: the transport is strictly sequential.
pub struct Dispatcher {
    catalog: Vec<CatalogEntry>,
    registry: ToolRegistry,
    ctx: ToolContext,
    server_name: String,
}

impl Dispatcher {
    pub fn new(
        entries: Vec<RegistryEntry>,
        loader: Box<dyn SymbolLoader>,
        ctx: ToolContext,
        server_name: impl Into<String>,
    ) -> compass_core::Result<Self> {
        let registry = ToolRegistry::new(entries, loader)?;
        let catalog = registry
            .entries()
            .filter(|e| !e.internal)
            .map(|e| CatalogEntry {
                name: e.name.clone(),
                description: e.description.clone(),
                input_schema: schema::input_schema(&e.params),
            })
            .collect();
        Ok(Self {
            catalog,
            registry,
            ctx,
            server_name: server_name.into(),
        })
    }

    /// Production composition: tool metadata from the store, handlers from
    /// the built-in loader table.
    pub fn from_root(root: &Path) -> compass_core::Result<Self> {
        let config = Config::load(root)?;
        let store = GraphStore::open(&paths::graph_db_path(root))?;
        let entries = store.load_tool_entries()?;
        Self::new(
            entries,
            Box::new(handlers::builtin_loader()),
            ToolContext::new(root),
            config.server_name,
        )
    }

    pub fn list_tools(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Resolve, invoke, serialize. Domain failures come back as content;
    /// only the dispatch taxonomy (not-found / import / fault) becomes a
    /// protocol-level error.
    fn call_tool(&mut self, name: &str, args: &Value) -> Result<ToolCallResult, JsonRpcError> {
        let handler = self
            .registry
            .resolve(name)
            .map_err(|e| protocol_error(&e))?;

        let outcome = handler(&self.ctx, args).map_err(|e| JsonRpcError {
            code: CODE_INVOCATION_FAULT,
            message: format!("tool '{name}' failed: {e}"),
        })?;

        let json = outcome.to_json();
        Ok(ToolCallResult {
            content: vec![ToolContent {
                r#type: "text",
                text: serialize(&outcome),
            }],
            is_error: is_error_result(&json),
        })
    }

    pub fn handle_request(&mut self, req: &JsonRpcRequest) -> JsonRpcResponse {
        match req.method.as_str() {
            "initialize" => respond(
                req,
                serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": self.server_name,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),

            "tools/list" => respond(
                req,
                serde_json::json!({ "tools": self.catalog }),
            ),

            "tools/call" => {
                let params = match &req.params {
                    Some(p) => p,
                    None => return respond_err(req, -32602, "missing params".to_string()),
                };
                let tool_name = match params["name"].as_str() {
                    Some(n) => n,
                    None => {
                        return respond_err(
                            req,
                            -32602,
                            "missing tool name in params".to_string(),
                        );
                    }
                };
                let args = params.get("arguments").cloned().unwrap_or(Value::Null);

                match self.call_tool(tool_name, &args) {
                    Ok(result) => respond(
                        req,
                        serde_json::to_value(&result)
                            .unwrap_or_else(|e| serde_json::json!({"error": e.to_string()})),
                    ),
                    Err(error) => JsonRpcResponse {
                        jsonrpc: "2.0",
                        id: req.id.clone(),
                        result: None,
                        error: Some(error),
                    },
                }
            }

            other => respond_err(req, -32601, format!("method not found: {other}")),
        }
    }
}

fn protocol_error(err: &CompassError) -> JsonRpcError {
    let code = match err {
        CompassError::ToolNotFound(_) => CODE_TOOL_NOT_FOUND,
        CompassError::ImportFailure { .. } => CODE_IMPORT_FAILURE,
        _ => CODE_INVOCATION_FAULT,
    };
    JsonRpcError {
        code,
        message: err.to_string(),
    }
}

fn respond(req: &JsonRpcRequest, result: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id: req.id.clone(),
        result: Some(result),
        error: None,
    }
}

fn respond_err(req: &JsonRpcRequest, code: i32, message: String) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id: req.id.clone(),
        result: None,
        error: Some(JsonRpcError { code, message }),
    }
}

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

pub fn run(root: &Path) -> anyhow::Result<()> {
    let mut dispatcher = Dispatcher::from_root(root)?;
    tracing::info!(
        tools = dispatcher.list_tools().len(),
        "compass MCP server ready"
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let raw: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let resp = JsonRpcResponse {
                    jsonrpc: "2.0",
                    id: None,
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32700,
                        message: format!("parse error: {e}"),
                    }),
                };
                let mut out = stdout.lock();
                serde_json::to_writer(&mut out, &resp)?;
                writeln!(out)?;
                continue;
            }
        };

        // Notifications have no "id" key — do not respond
        if !raw
            .as_object()
            .map(|o| o.contains_key("id"))
            .unwrap_or(false)
        {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                let resp = JsonRpcResponse {
                    jsonrpc: "2.0",
                    id: None,
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32600,
                        message: format!("invalid request: {e}"),
                    }),
                };
                let mut out = stdout.lock();
                serde_json::to_writer(&mut out, &resp)?;
                writeln!(out)?;
                continue;
            }
        };

        let response = dispatcher.handle_request(&request);
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &response)?;
        writeln!(out)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
