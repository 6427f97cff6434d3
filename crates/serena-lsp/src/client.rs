//! Generic LSP client implementation
//!
//! Provides a robust LSP client that handles JSON-RPC communication with language servers
//! over stdio. Based on the existing serena_core LSP client implementation.

use anyhow::{Context, Result};
use dashmap::DashMap;
use lsp_types::{
    notification::Notification, request::Request, ClientCapabilities, DocumentSymbolClientCapabilities,
    InitializeParams, InitializeResult, InitializedParams, TextDocumentClientCapabilities, TraceValue,
    Uri,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    process::Stdio,
    sync::{
        atomic::{AtomicBool, AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    process::{Child, Command},
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error, warn};

/// Default per-request timeout used when a caller does not supply one
/// via [`LspClient::new_with_timeout`] (spec §4.1).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(240);

/// JSON-RPC request message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Value,
    id: i64,
}

/// JSON-RPC notification message (no response expected)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JsonRpcNotification {
    jsonrpc: String,
    method: String,
    params: Value,
}

/// JSON-RPC response message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<i64>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

/// LSP client that communicates with a language server via stdio
pub struct LspClient {
    /// Behind a mutex so `shutdown()` can take `&self`: the client is
    /// shared as `Arc<LspClient>` between the `LanguageServerManager`
    /// and the `LspClientAdapter` SLS façade, and neither owns it
    /// exclusively.
    child: tokio::sync::Mutex<Option<Child>>,
    request_id: AtomicI64,
    sender: mpsc::Sender<String>,
    pending_requests: Arc<DashMap<i64, oneshot::Sender<Result<Value>>>>,
    /// Set by the reader task on stdout EOF or reader error. Once true
    /// the transport is `terminated` (§4.1/4.3 state machine) and never
    /// recovers; a fresh `LspClient` is required.
    terminated: Arc<AtomicBool>,
    /// Per-request timeout. §4.1: every outbound request has a finite
    /// timeout, enforced in `send_request`/`send_typed_notification`.
    request_timeout: Duration,
    _listener_task: JoinHandle<()>,
}

impl Drop for LspClient {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.child.try_lock() {
            if let Some(mut child) = guard.take() {
                let _ = child.start_kill();
            }
        }
    }
}

impl LspClient {
    /// Create a new LSP client with the default per-request timeout.
    ///
    /// # Arguments
    /// * `command` - The command to execute (e.g., "rust-analyzer")
    /// * `args` - Command-line arguments for the language server
    pub async fn new(command: String, args: Vec<String>) -> Result<Self> {
        Self::new_with_timeout(command, args, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Create a new LSP client, spawning the language server child
    /// process and imposing `request_timeout` on every request sent
    /// through it.
    ///
    /// A zero timeout is the misconfigured-backend failure mode §4.1
    /// calls out explicitly: the transport refuses to start rather than
    /// allow an unbounded wait.
    pub async fn new_with_timeout(
        command: String,
        args: Vec<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        if request_timeout.is_zero() {
            return Err(serena_core::LspError::MissingTimeout(command).into());
        }

        let mut child = Command::new(&command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn language server")?;

        let stdin = child.stdin.take().context("Failed to open stdin")?;
        let stdout = child.stdout.take().context("Failed to open stdout")?;
        let stderr = child.stderr.take().context("Failed to open stderr")?;

        // Channel to send raw strings to stdin writer task
        let (tx, mut rx) = mpsc::channel::<String>(32);

        // Writer Task - sends messages to language server stdin
        let mut writer_stdin = stdin;
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let content_length = msg.len();
                let full_msg = format!("Content-Length: {}\r\n\r\n{}", content_length, msg);
                if let Err(e) = writer_stdin.write_all(full_msg.as_bytes()).await {
                    error!("Failed to write to LSP stdin: {}", e);
                    break;
                }
                if let Err(e) = writer_stdin.flush().await {
                    error!("Failed to flush LSP stdin: {}", e);
                    break;
                }
            }
        });

        // Stderr Logger Task - logs language server stderr output
        let reader_stderr = BufReader::new(stderr);
        tokio::spawn(async move {
            let mut lines = reader_stderr.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!("[LSP STDERR] {}", line);
            }
        });

        let pending_requests: Arc<DashMap<i64, oneshot::Sender<Result<Value>>>> = Arc::new(DashMap::new());
        let pending_requests_clone = pending_requests.clone();
        let terminated = Arc::new(AtomicBool::new(false));
        let terminated_clone = terminated.clone();

        // Reader Task - receives messages from language server stdout
        let listener_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            'read_loop: loop {
                // Read headers
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line).await {
                        Ok(0) => break 'read_loop, // EOF
                        Ok(_) => {
                            if line.trim().is_empty() {
                                // End of headers
                                break;
                            }
                            if line.starts_with("Content-Length: ") {
                                if let Ok(len) = line.trim()["Content-Length: ".len()..].parse::<usize>() {
                                    content_length = len;
                                }
                            }
                        }
                        Err(e) => {
                            error!("Error reading LSP header: {}", e);
                            break 'read_loop;
                        }
                    }
                }

                if content_length == 0 {
                    continue;
                }

                // Read body
                let mut body_buf = vec![0u8; content_length];
                if let Err(e) = reader.read_exact(&mut body_buf).await {
                    error!("Error reading LSP body: {}", e);
                    break 'read_loop;
                }

                let body_str = String::from_utf8_lossy(&body_buf);
                debug!("Received LSP message: {}", body_str);

                // Parse JSON
                if let Ok(resp) = serde_json::from_str::<JsonRpcResponse>(&body_str) {
                    if let Some(id) = resp.id {
                        if let Some((_, tx)) = pending_requests_clone.remove(&id) {
                            if let Some(error) = resp.error {
                                let _ = tx.send(Err(anyhow::anyhow!("LSP Error {}: {}", error.code, error.message)));
                            } else {
                                let _ = tx.send(Ok(resp.result.unwrap_or(Value::Null)));
                            }
                        }
                    } else {
                        // Server-to-client notification or request
                        debug!("Received server notification/request");
                    }
                } else if let Ok(notif) = serde_json::from_str::<JsonRpcNotification>(&body_str) {
                    debug!("Received notification: {}", notif.method);
                }
            }

            // Child stdout EOF or a read failure: the transport is now
            // `terminated` (§4.1). Every pending slot completes with
            // `TerminatedError` rather than hanging until its own
            // timeout elapses.
            terminated_clone.store(true, Ordering::SeqCst);
            let pending_ids: Vec<i64> = pending_requests_clone.iter().map(|e| *e.key()).collect();
            for id in pending_ids {
                if let Some((_, tx)) = pending_requests_clone.remove(&id) {
                    let _ = tx.send(Err(serena_core::LspError::Terminated.into()));
                }
            }
        });

        Ok(Self {
            child: tokio::sync::Mutex::new(Some(child)),
            request_id: AtomicI64::new(1),
            sender: tx,
            terminated,
            request_timeout,
            pending_requests,
            _listener_task: listener_task,
        })
    }

    /// Send a typed LSP request and wait for the response
    ///
    /// # Type Parameters
    /// * `R` - The LSP request type (e.g., `GotoDefinition`, `DocumentSymbol`)
    ///
    /// # Arguments
    /// * `params` - Request parameters
    ///
    /// # Returns
    /// The typed response for the request
    pub async fn send_request<R>(&self, params: R::Params) -> Result<R::Result>
    where
        R: Request,
    {
        if self.is_terminated() {
            return Err(serena_core::LspError::Terminated.into());
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let params_json = serde_json::to_value(params)?;

        let req = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: R::METHOD.to_string(),
            params: params_json,
            id,
        };

        let req_str = serde_json::to_string(&req)?;

        let (tx, rx) = oneshot::channel();
        self.pending_requests.insert(id, tx);

        self.sender
            .send(req_str)
            .await
            .context("Failed to send request")?;

        // §4.1: the caller blocks until either a response arrives, the
        // timeout elapses (slot stays registered; a late response is
        // dropped when it finds the receiver gone), or the child
        // terminates (the reader task completes every pending slot with
        // `Terminated` itself).
        let response_value = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(recv_result) => recv_result.context("Sender dropped before response")??,
            Err(_elapsed) => {
                return Err(serena_core::LspError::Timeout(self.request_timeout.as_millis() as u64).into());
            }
        };

        let result = serde_json::from_value(response_value)?;
        Ok(result)
    }

    /// Whether the child process has terminated (stdout EOF or a read
    /// failure was observed). Once true this never reverts; callers
    /// must construct a fresh `LspClient`.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// The per-request timeout this client enforces.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Send a typed LSP notification (no response expected)
    ///
    /// # Type Parameters
    /// * `N` - The LSP notification type (e.g., `DidOpenTextDocument`)
    ///
    /// # Arguments
    /// * `params` - Notification parameters
    pub async fn send_notification<N>(&self, params: N::Params) -> Result<()>
    where
        N: Notification,
    {
        let params_json = serde_json::to_value(params)?;
        let notif = JsonRpcNotification {
            jsonrpc: "2.0".to_string(),
            method: N::METHOD.to_string(),
            params: params_json,
        };
        let notif_str = serde_json::to_string(&notif)?;
        self.sender
            .send(notif_str)
            .await
            .context("Failed to send notification")?;
        Ok(())
    }

    /// Initialize the language server
    ///
    /// This must be called before sending any other requests. It sends the
    /// `initialize` request followed by the `initialized` notification.
    ///
    /// # Arguments
    /// * `root_uri` - The root URI of the workspace
    ///
    /// # Returns
    /// The server's initialization result containing capabilities
    pub async fn initialize(&self, root_uri: Uri) -> Result<InitializeResult> {
        let capabilities = ClientCapabilities {
            text_document: Some(TextDocumentClientCapabilities {
                document_symbol: Some(DocumentSymbolClientCapabilities {
                    hierarchical_document_symbol_support: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let params = InitializeParams {
            process_id: Some(std::process::id()),
            root_uri: Some(root_uri.clone()),
            capabilities,
            trace: Some(TraceValue::Off),
            ..Default::default()
        };

        let result = self.send_request::<lsp_types::request::Initialize>(params).await?;

        self.send_notification::<lsp_types::notification::Initialized>(InitializedParams {})
            .await?;

        Ok(result)
    }

    /// Shutdown the language server gracefully (§4.1's `shutdown()`:
    /// LSP `shutdown`+`exit`, a bounded grace period, then force-kill).
    pub async fn shutdown(&self) -> Result<()> {
        // Send shutdown request (best-effort: a server that's already
        // gone will fail this and we fall straight through to the kill).
        let _ = self
            .send_request::<lsp_types::request::Shutdown>(())
            .await;
        let _ = self
            .send_notification::<lsp_types::notification::Exit>(())
            .await;

        // Wait a bit for graceful shutdown
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Kill the process if still running
        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            let _ = child.kill().await;
        }

        Ok(())
    }
}

/// The Solid Language Server façade (spec §4.3): wraps one shared
/// [`LspClient`] and presents the uniform [`serena_core::LanguageServer`]
/// surface that the symbol tools are written against. Holding `Arc<LspClient>`
/// rather than owning the transport outright is what lets
/// `LanguageServerManager` and one-or-more `LspClientAdapter`s (one per
/// required language) share a single child process instead of each
/// spawning its own.
pub struct LspClientAdapter {
    client: Arc<LspClient>,
    language_id: String,
    initialized: AtomicBool,
    /// Document versions for open files, per LSP's `didChange` versioning
    /// requirement. Incremented on every `did_change`.
    doc_versions: DashMap<String, i32>,
}

impl LspClientAdapter {
    pub fn new(client: Arc<LspClient>, language_id: String) -> Self {
        Self {
            client,
            language_id,
            initialized: AtomicBool::new(false),
            doc_versions: DashMap::new(),
        }
    }

    /// Access the underlying shared transport, e.g. so a caller can check
    /// [`LspClient::is_terminated`] without going through the trait.
    pub fn client(&self) -> &Arc<LspClient> {
        &self.client
    }

    fn nested_to_symbol_info(symbol: lsp_types::DocumentSymbol, uri: &lsp_types::Uri) -> serena_core::SymbolInfo {
        let location = serena_core::Location {
            uri: uri.to_string(),
            range: symbol.range.into(),
        };
        let mut info = serena_core::SymbolInfo::new(symbol.name, symbol.kind.into(), location);
        if let Some(detail) = symbol.detail {
            info = info.with_detail(detail);
        }
        if let Some(children) = symbol.children {
            let children = children
                .into_iter()
                .map(|child| Self::nested_to_symbol_info(child, uri))
                .collect();
            info = info.with_children(children);
        }
        info
    }

    fn flat_to_symbol_info(symbol: lsp_types::SymbolInformation) -> serena_core::SymbolInfo {
        let mut info =
            serena_core::SymbolInfo::new(symbol.name, symbol.kind.into(), symbol.location.into());
        if let Some(container) = symbol.container_name {
            info = info.with_container_name(container);
        }
        info
    }
}

#[async_trait::async_trait]
impl serena_core::LanguageServer for LspClientAdapter {
    async fn initialize(
        &mut self,
        params: InitializeParams,
    ) -> std::result::Result<lsp_types::ServerCapabilities, serena_core::LspError> {
        let root_uri = params
            .root_uri
            .ok_or_else(|| serena_core::LspError::InitializationError("missing root_uri".into()))?;
        let result = self
            .client
            .initialize(root_uri)
            .await
            .map_err(|e| serena_core::LspError::InitializationError(e.to_string()))?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(result.capabilities)
    }

    async fn shutdown(&mut self) -> std::result::Result<(), serena_core::LspError> {
        self.initialized.store(false, Ordering::SeqCst);
        self.client
            .shutdown()
            .await
            .map_err(|e| serena_core::LspError::ShutdownError(e.to_string()))
    }

    async fn document_symbols(
        &self,
        document: lsp_types::TextDocumentIdentifier,
    ) -> std::result::Result<Vec<serena_core::SymbolInfo>, serena_core::LspError> {
        let uri = document.uri.clone();
        let params = lsp_types::DocumentSymbolParams {
            text_document: document,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };

        // A late/absent response is recoverable (§4.3): an empty tree,
        // not a hard failure, since the caller can still fall back to
        // the filesystem body fast path for anything it already knows
        // the range of.
        let response = match self
            .client
            .send_request::<lsp_types::request::DocumentSymbolRequest>(params)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("document_symbols request failed, returning empty tree: {}", e);
                return Ok(Vec::new());
            }
        };

        let symbols = match response {
            Some(lsp_types::DocumentSymbolResponse::Nested(symbols)) => symbols
                .into_iter()
                .map(|s| Self::nested_to_symbol_info(s, &uri))
                .collect(),
            Some(lsp_types::DocumentSymbolResponse::Flat(symbols)) => {
                symbols.into_iter().map(Self::flat_to_symbol_info).collect()
            }
            None => Vec::new(),
        };
        Ok(symbols)
    }

    async fn find_references(
        &self,
        params: lsp_types::TextDocumentPositionParams,
    ) -> std::result::Result<Vec<lsp_types::Location>, serena_core::LspError> {
        let params = lsp_types::ReferenceParams {
            text_document_position: params,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: lsp_types::ReferenceContext {
                include_declaration: true,
            },
        };
        let response = self
            .client
            .send_request::<lsp_types::request::References>(params)
            .await
            .map_err(|e| serena_core::LspError::RequestFailed(e.to_string()))?;
        Ok(response.unwrap_or_default())
    }

    async fn rename(
        &self,
        params: lsp_types::RenameParams,
    ) -> std::result::Result<lsp_types::WorkspaceEdit, serena_core::LspError> {
        let response = self
            .client
            .send_request::<lsp_types::request::Rename>(params)
            .await
            .map_err(|e| serena_core::LspError::RequestFailed(e.to_string()))?;
        response.ok_or_else(|| serena_core::LspError::RequestFailed("server returned no edit".into()))
    }

    async fn goto_definition(
        &self,
        params: lsp_types::TextDocumentPositionParams,
    ) -> std::result::Result<lsp_types::GotoDefinitionResponse, serena_core::LspError> {
        let params = lsp_types::GotoDefinitionParams {
            text_document_position_params: params,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let response = self
            .client
            .send_request::<lsp_types::request::GotoDefinition>(params)
            .await
            .map_err(|e| serena_core::LspError::RequestFailed(e.to_string()))?;
        response.ok_or_else(|| serena_core::LspError::SymbolNotFound("no definition found".into()))
    }

    async fn did_open(
        &self,
        uri: String,
        language_id: String,
        text: String,
    ) -> std::result::Result<(), serena_core::LspError> {
        let parsed_uri: lsp_types::Uri = uri
            .parse()
            .map_err(|_| serena_core::LspError::InvalidUri(uri.clone()))?;
        self.doc_versions.insert(uri.clone(), 0);
        let params = lsp_types::DidOpenTextDocumentParams {
            text_document: lsp_types::TextDocumentItem {
                uri: parsed_uri,
                language_id,
                version: 0,
                text,
            },
        };
        self.client
            .send_notification::<lsp_types::notification::DidOpenTextDocument>(params)
            .await
            .map_err(|e| serena_core::LspError::NotificationFailed(e.to_string()))
    }

    async fn did_close(&self, uri: String) -> std::result::Result<(), serena_core::LspError> {
        let parsed_uri: lsp_types::Uri = uri
            .parse()
            .map_err(|_| serena_core::LspError::InvalidUri(uri.clone()))?;
        self.doc_versions.remove(&uri);
        let params = lsp_types::DidCloseTextDocumentParams {
            text_document: lsp_types::TextDocumentIdentifier { uri: parsed_uri },
        };
        self.client
            .send_notification::<lsp_types::notification::DidCloseTextDocument>(params)
            .await
            .map_err(|e| serena_core::LspError::NotificationFailed(e.to_string()))
    }

    async fn did_change(&self, uri: String, text: String) -> std::result::Result<(), serena_core::LspError> {
        let parsed_uri: lsp_types::Uri = uri
            .parse()
            .map_err(|_| serena_core::LspError::InvalidUri(uri.clone()))?;
        let version = {
            let mut entry = self.doc_versions.entry(uri.clone()).or_insert(0);
            *entry += 1;
            *entry
        };
        let params = lsp_types::DidChangeTextDocumentParams {
            text_document: lsp_types::VersionedTextDocumentIdentifier {
                uri: parsed_uri,
                version,
            },
            content_changes: vec![lsp_types::TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text,
            }],
        };
        self.client
            .send_notification::<lsp_types::notification::DidChangeTextDocument>(params)
            .await
            .map_err(|e| serena_core::LspError::NotificationFailed(e.to_string()))
    }

    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn is_running(&self) -> bool {
        !self.client.is_terminated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonrpc_request_serialization() {
        let req = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "initialize".to_string(),
            params: serde_json::json!({}),
            id: 1,
        };

        let serialized = serde_json::to_string(&req).unwrap();
        assert!(serialized.contains("\"method\":\"initialize\""));
        assert!(serialized.contains("\"id\":1"));
    }

    #[test]
    fn test_jsonrpc_response_deserialization() {
        // Test with non-null result
        let json = r#"{"jsonrpc":"2.0","id":1,"result":{"success":true}}"#;
        let resp: JsonRpcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id, Some(1));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());

        // Test with null result
        let json_null = r#"{"jsonrpc":"2.0","id":2,"result":null}"#;
        let resp_null: JsonRpcResponse = serde_json::from_str(json_null).unwrap();
        assert_eq!(resp_null.id, Some(2));
        // Note: serde deserializes null as None for Option<Value>
        assert!(resp_null.result.is_none() || resp_null.result == Some(Value::Null));
        assert!(resp_null.error.is_none());
    }
}
