//! Symbol operation tools for Serena MCP server
//!
//! These tools wrap the LSP client to provide semantic code navigation
//! and editing capabilities, layered with the name-path matching, scope
//! filtering, output-format, and depth rules of the symbol model and the
//! content-hash cache in front of read-only queries.

use async_trait::async_trait;
use globset::Glob;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use serena_core::{
    enumerate_scope_files as core_enumerate_scope_files, scope_metadata, LanguageServer, Range,
    SerenaError, SymbolInfo, Tool, ToolError, ToolResult,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheKey, SymbolCache};

/// Depth beyond which `find_symbol`/`get_symbols_overview` refuse the
/// request rather than silently capping it (§4.4).
const MAX_DEPTH: u64 = 5;

/// Cap on files walked for a scope-wide symbol search, bounding
/// worst-case cost on very large trees.
const MAX_SCOPE_FILES: usize = 5000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Truncate output to specified max characters
fn truncate_output(text: String, max_chars: i32) -> String {
    if max_chars < 0 {
        text
    } else {
        let max = max_chars as usize;
        if text.len() > max {
            format!("{}... (truncated)", &text[..max])
        } else {
            text
        }
    }
}

/// Default value for max_answer_chars
fn default_max_chars() -> i32 {
    -1
}

fn default_response_format() -> String {
    "diff".to_string()
}

fn default_search_scope() -> String {
    "all".to_string()
}

/// A unified diff of `old` vs `new`, labeled with `path` on both sides.
fn unified_diff(old: &str, new: &str, path: &str) -> String {
    let diff = similar::TextDiff::from_lines(old, new);
    diff.unified_diff()
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

/// Shape the response of a mutating editor tool per `response_format`
/// (§4.6): `diff` (default), `summary`, or `full`.
fn edit_response(
    response_format: &str,
    message: &str,
    diff: &str,
    full_content: &str,
    invalidated: usize,
) -> Value {
    let mut obj = json!({
        "status": "success",
        "message": message,
        "_cache_invalidated": invalidated,
    });
    let body = match response_format {
        "full" => json!(full_content),
        "summary" => json!(message),
        _ => json!(diff),
    };
    obj["response_format"] = json!(if matches!(response_format, "full" | "summary") {
        response_format
    } else {
        "diff"
    });
    obj["content"] = body;
    obj
}

/// Name-path matching mode (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    Exact,
    Substring,
    Glob,
    RegexMode,
}

impl MatchMode {
    fn parse(raw: Option<&str>, legacy_substring: bool) -> Result<Self, SerenaError> {
        match raw {
            Some("exact") => Ok(Self::Exact),
            Some("substring") => Ok(Self::Substring),
            Some("glob") => Ok(Self::Glob),
            Some("regex") => Ok(Self::RegexMode),
            Some(other) => Err(SerenaError::InvalidParameter(format!(
                "unknown match_mode '{other}'; expected exact, substring, glob, or regex"
            ))),
            None if legacy_substring => Ok(Self::Substring),
            None => Ok(Self::Exact),
        }
    }
}

/// Compiles the final name-path segment of a query once, then matches
/// candidate symbol names against it.
struct NameMatcher {
    mode: MatchMode,
    literal: String,
    regex: Option<Regex>,
    glob: Option<globset::GlobMatcher>,
}

impl NameMatcher {
    fn new(mode: MatchMode, query_final: &str) -> Result<Self, SerenaError> {
        let regex = if mode == MatchMode::RegexMode {
            Some(Regex::new(query_final).map_err(|e| {
                SerenaError::Tool(ToolError::InvalidPattern(format!(
                    "invalid regex '{query_final}': {e}"
                )))
            })?)
        } else {
            None
        };
        let glob = if mode == MatchMode::Glob {
            Some(
                Glob::new(query_final)
                    .map_err(|e| {
                        SerenaError::Tool(ToolError::InvalidPattern(format!(
                            "invalid glob '{query_final}': {e}"
                        )))
                    })?
                    .compile_matcher(),
            )
        } else {
            None
        };
        Ok(Self {
            mode,
            literal: query_final.to_string(),
            regex,
            glob,
        })
    }

    fn is_match(&self, candidate: &str) -> bool {
        match self.mode {
            MatchMode::Exact => candidate == self.literal,
            MatchMode::Substring => candidate.contains(&self.literal),
            MatchMode::Glob => self.glob.as_ref().is_some_and(|g| g.is_match(candidate)),
            MatchMode::RegexMode => self.regex.as_ref().is_some_and(|r| r.is_match(candidate)),
        }
    }
}

/// Output shape for a matched symbol (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Metadata,
    Signature,
    Body,
}

impl OutputFormat {
    fn parse(raw: Option<&str>, legacy_include_body: bool) -> Result<Self, SerenaError> {
        match raw {
            Some("metadata") => Ok(Self::Metadata),
            Some("signature") => Ok(Self::Signature),
            Some("body") => Ok(Self::Body),
            Some(other) => Err(SerenaError::InvalidParameter(format!(
                "unknown output_format '{other}'; expected metadata, signature, or body"
            ))),
            None if legacy_include_body => Ok(Self::Body),
            None => Ok(Self::Metadata),
        }
    }
}

fn validate_depth(depth: u64) -> Result<u64, SerenaError> {
    if depth > MAX_DEPTH {
        Err(SerenaError::Tool(ToolError::DepthExceeded {
            requested: depth as usize,
            cap: MAX_DEPTH as usize,
        }))
    } else {
        Ok(depth)
    }
}

/// `symbol_id = "{name_path}:{relative_path}:{start_line}"` (§3), using
/// the 1-based line numbering the rest of this file already displays to
/// callers.
fn symbol_id(name_path: &str, relative_path: &str, start_line_zero_based: u32) -> String {
    format!("{name_path}:{relative_path}:{}", start_line_zero_based + 1)
}

fn parse_symbol_id(id: &str) -> Option<(String, String, u32)> {
    let last_colon = id.rfind(':')?;
    let start_line: u32 = id[last_colon + 1..].parse().ok()?;
    let rest = &id[..last_colon];
    let prev_colon = rest.rfind(':')?;
    let relative_path = rest[prev_colon + 1..].to_string();
    let name_path = rest[..prev_colon].to_string();
    Some((name_path, relative_path, start_line))
}

/// Flattens a document-symbol tree into `(name_path, &SymbolInfo)` pairs,
/// building each name path from the root down (§3: "slash-separated
/// hierarchical identifier of enclosing named symbols").
fn flatten<'a>(symbols: &'a [SymbolInfo], parent_path: &str, out: &mut Vec<(String, &'a SymbolInfo)>) {
    for s in symbols {
        let name_path = if parent_path.is_empty() {
            s.name.clone()
        } else {
            format!("{parent_path}/{}", s.name)
        };
        out.push((name_path.clone(), s));
        if !s.children.is_empty() {
            flatten(&s.children, &name_path, out);
        }
    }
}

/// Does `name_path` satisfy a (possibly multi-segment) query? All but
/// the final segment of the query must equal the corresponding ancestor
/// names exactly; the final segment is matched per `matcher` (§4.4).
fn name_path_matches(name_path: &str, query_parts: &[&str], matcher: &NameMatcher) -> bool {
    let candidate_parts: Vec<&str> = name_path.split('/').collect();
    if query_parts.is_empty() || query_parts.len() > candidate_parts.len() {
        return false;
    }
    let n = query_parts.len();
    let ancestor_candidate = &candidate_parts[candidate_parts.len() - n..candidate_parts.len() - 1];
    let ancestor_query = &query_parts[..n - 1];
    if ancestor_candidate != ancestor_query {
        return false;
    }
    matcher.is_match(candidate_parts[candidate_parts.len() - 1])
}

fn split_query(name_path_pattern: &str) -> Vec<&str> {
    name_path_pattern
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

fn extract_body(file_lines: &[&str], range: &Range) -> String {
    let start = range.start.line as usize;
    let end = (range.end.line as usize + 1).min(file_lines.len());
    if start >= file_lines.len() {
        return String::new();
    }
    file_lines[start..end].join("\n")
}

fn leading_indent(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

/// A naive cyclomatic-complexity-ish count: branching keywords and
/// short-circuit operators in the symbol's body, language-agnostic.
fn complexity_score(body: &str) -> usize {
    const KEYWORDS: &[&str] = &[
        "if ", "if(", "else if", "elif", "for ", "for(", "while ", "while(", "match ", "case ",
        "catch ", "except ", "&&", "||",
    ];
    KEYWORDS.iter().map(|kw| body.matches(kw).count()).sum::<usize>() + 1
}

/// Contiguous comment lines immediately preceding `start_line`, in file
/// order (a cheap, language-agnostic docstring heuristic).
fn leading_docstring(file_lines: &[&str], start_line: usize) -> Option<String> {
    let is_comment = |l: &str| {
        let t = l.trim_start();
        t.starts_with("///")
            || t.starts_with("//!")
            || t.starts_with("//")
            || t.starts_with('#')
            || t.starts_with('*')
            || t.starts_with("\"\"\"")
    };
    let mut lines = Vec::new();
    let mut i = start_line;
    while i > 0 && is_comment(file_lines[i - 1]) {
        i -= 1;
    }
    for line in &file_lines[i..start_line] {
        lines.push(line.trim().to_string());
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Serializes one matched symbol per `output_format`, recursing into
/// children up to `depth_remaining` levels.
fn symbol_entry(
    name_path: &str,
    relative_path: &str,
    symbol: &SymbolInfo,
    output_format: OutputFormat,
    file_lines: &[&str],
    depth_remaining: u64,
) -> Value {
    let range = &symbol.location.range;
    let mut entry = json!({
        "name": symbol.name,
        "kind": format!("{:?}", symbol.kind),
        "name_path": name_path,
        "relative_path": relative_path,
        "line": range.start.line + 1,
        "character": range.start.character,
        "end_line": range.end.line + 1,
        "symbol_id": symbol_id(name_path, relative_path, range.start.line),
    });

    match output_format {
        OutputFormat::Metadata => {}
        OutputFormat::Signature => {
            let start = range.start.line as usize;
            let signature = file_lines.get(start).map(|l| l.trim().to_string());
            entry["signature"] = json!(signature);
            entry["docstring"] = json!(leading_docstring(file_lines, start));
            entry["complexity"] = json!(complexity_score(&extract_body(file_lines, range)));
        }
        OutputFormat::Body => {
            entry["body"] = json!(extract_body(file_lines, range));
        }
    }

    if depth_remaining > 0 && !symbol.children.is_empty() {
        let children: Vec<Value> = symbol
            .children
            .iter()
            .map(|child| {
                let child_path = format!("{name_path}/{}", child.name);
                symbol_entry(
                    &child_path,
                    relative_path,
                    child,
                    output_format,
                    file_lines,
                    depth_remaining - 1,
                )
            })
            .collect();
        entry["children"] = json!(children);
    }

    entry
}

/// Enumerate candidate files under `root` for a scope-wide symbol
/// search (§4.4/§6 scope semantics, shared with pattern search and
/// directory listing).
fn enumerate_scope_files(root: &Path, scope: &str) -> Result<Vec<PathBuf>, SerenaError> {
    core_enumerate_scope_files(root, scope, MAX_SCOPE_FILES)
}

// ============================================================================
// get_symbols_overview Tool
// ============================================================================

/// Tool for getting a high-level overview of code symbols in a file
pub struct GetSymbolsOverviewTool {
    project_root: PathBuf,
    lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
    cache: Arc<SymbolCache>,
}

#[derive(Debug, Deserialize)]
struct GetSymbolsOverviewParams {
    relative_path: String,
    #[serde(default)]
    depth: u64,
    #[serde(default = "default_max_chars")]
    max_answer_chars: i32,
}

impl GetSymbolsOverviewTool {
    /// Create a new GetSymbolsOverviewTool
    pub fn new(
        project_root: impl Into<PathBuf>,
        lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
        cache: Arc<SymbolCache>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            lsp_client,
            cache,
        }
    }
}

#[async_trait]
impl Tool for GetSymbolsOverviewTool {
    fn name(&self) -> &str {
        "get_symbols_overview"
    }

    fn description(&self) -> &str {
        "Get a high-level overview of code symbols in a file. Returns top-level symbols \
        (classes, functions, etc.) with optional depth for children."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relative_path": {
                    "type": "string",
                    "description": "The relative path to the file to analyze"
                },
                "depth": {
                    "type": "integer",
                    "description": "Depth of descendants to retrieve (0 = top-level only, capped at 5)",
                    "default": 0
                },
                "max_answer_chars": {
                    "type": "integer",
                    "description": "Maximum characters to return. -1 for unlimited",
                    "default": -1
                }
            },
            "required": ["relative_path"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: GetSymbolsOverviewParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;
        let depth = validate_depth(params.depth)?;

        let file_path = self.project_root.join(&params.relative_path);
        let content = std::fs::read_to_string(&file_path).map_err(SerenaError::Io)?;

        let fingerprint = format!("get_symbols_overview:depth={depth}");
        let cache_key = CacheKey::new(params.relative_path.clone(), fingerprint);

        let (entries, cache_hit) = match self.cache.get(&cache_key, &content) {
            Some(cached) => (cached, true),
            None => {
                let uri = format!("file://{}", file_path.display());
                let client = self.lsp_client.read().await;
                let text_document = lsp_types::TextDocumentIdentifier {
                    uri: uri
                        .parse::<lsp_types::Uri>()
                        .map_err(|e| SerenaError::InvalidParameter(format!("Invalid URI: {}", e)))?,
                };
                let symbols = client.document_symbols(text_document).await.map_err(|e| {
                    SerenaError::Tool(ToolError::ExecutionFailed(format!(
                        "LSP document symbols failed: {}",
                        e
                    )))
                })?;
                drop(client);

                let file_lines: Vec<&str> = content.lines().collect();
                let entries: Vec<Value> = symbols
                    .iter()
                    .map(|s| {
                        symbol_entry(
                            &s.name,
                            &params.relative_path,
                            s,
                            OutputFormat::Metadata,
                            &file_lines,
                            depth,
                        )
                    })
                    .collect();
                let value = json!(entries);
                self.cache.put(cache_key, &content, value.clone());
                (value, false)
            }
        };

        let json_result = serde_json::to_string_pretty(&entries)
            .map_err(|e| SerenaError::InvalidParameter(format!("Serialization failed: {}", e)))?;
        let final_result = truncate_output(json_result, params.max_answer_chars);

        Ok(ToolResult::success(json!({
            "symbols": serde_json::from_str::<Value>(&final_result).unwrap_or(json!([])),
            "_cache": { "hit": cache_hit },
        })))
    }

    fn tags(&self) -> Vec<String> {
        vec!["symbol".to_string(), "read".to_string(), "lsp".to_string()]
    }

    fn narrowing_suggestions(&self) -> Vec<String> {
        vec![
            "set depth=0 for symbol_only instead of recursive".to_string(),
            "split the file or request output_format=\"metadata\" only".to_string(),
        ]
    }
}

// ============================================================================
// find_symbol Tool
// ============================================================================

/// Tool for finding symbols matching a name path pattern
pub struct FindSymbolTool {
    project_root: PathBuf,
    lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
    cache: Arc<SymbolCache>,
}

#[derive(Debug, Deserialize)]
struct FindSymbolParams {
    #[serde(alias = "name_path")]
    name_path_pattern: String,
    #[serde(default)]
    relative_path: Option<String>,
    #[serde(default)]
    depth: u64,
    #[serde(default)]
    include_body: bool,
    #[serde(default)]
    output_format: Option<String>,
    #[serde(default)]
    substring_matching: bool,
    #[serde(default)]
    match_mode: Option<String>,
    #[serde(default = "default_search_scope")]
    search_scope: String,
    #[serde(default)]
    include_kinds: Option<Vec<String>>,
    #[serde(default = "default_max_chars")]
    max_answer_chars: i32,
}

impl FindSymbolTool {
    /// Create a new FindSymbolTool
    pub fn new(
        project_root: impl Into<PathBuf>,
        lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
        cache: Arc<SymbolCache>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            lsp_client,
            cache,
        }
    }

    /// Find matches within a single already-read file, using the cache
    /// when the file's content hash hasn't changed since the last call
    /// with the same fingerprint.
    async fn matches_in_file(
        &self,
        relative_path: &str,
        query_parts: &[&str],
        matcher: &NameMatcher,
        output_format: OutputFormat,
        depth: u64,
        fingerprint: &str,
    ) -> Result<(Vec<Value>, bool), SerenaError> {
        let file_path = self.project_root.join(relative_path);
        let content = match std::fs::read_to_string(&file_path) {
            Ok(c) => c,
            Err(_) => return Ok((Vec::new(), false)),
        };

        let cache_key = CacheKey::new(relative_path.to_string(), fingerprint.to_string());
        if let Some(cached) = self.cache.get(&cache_key, &content) {
            let entries: Vec<Value> = serde_json::from_value(cached).unwrap_or_default();
            return Ok((entries, true));
        }

        let uri = format!("file://{}", file_path.display());
        let client = self.lsp_client.read().await;
        let text_document = lsp_types::TextDocumentIdentifier {
            uri: uri
                .parse::<lsp_types::Uri>()
                .map_err(|e| SerenaError::InvalidParameter(format!("Invalid URI: {}", e)))?,
        };
        let symbols = client.document_symbols(text_document).await.map_err(|e| {
            SerenaError::Tool(ToolError::ExecutionFailed(format!(
                "LSP document symbols failed: {}",
                e
            )))
        })?;
        drop(client);

        let mut flat = Vec::new();
        flatten(&symbols, "", &mut flat);

        let file_lines: Vec<&str> = content.lines().collect();
        let entries: Vec<Value> = flat
            .into_iter()
            .filter(|(name_path, _)| name_path_matches(name_path, query_parts, matcher))
            .map(|(name_path, symbol)| {
                symbol_entry(&name_path, relative_path, symbol, output_format, &file_lines, depth)
            })
            .collect();

        self.cache.put(cache_key, &content, json!(entries));
        Ok((entries, false))
    }
}

#[async_trait]
impl Tool for FindSymbolTool {
    fn name(&self) -> &str {
        "find_symbol"
    }

    fn description(&self) -> &str {
        "Find symbols matching a name path pattern. Supports simple names, relative paths \
        (Class/method), and absolute paths (/Class/method), with configurable match mode, \
        search scope, output format, and descendant depth."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name_path_pattern": {
                    "type": "string",
                    "description": "The name path pattern to search for (e.g., 'method', 'Class/method')"
                },
                "relative_path": {
                    "type": "string",
                    "description": "Optional file to restrict the search to; omit to search the whole search_scope"
                },
                "depth": {
                    "type": "integer",
                    "description": "Depth of descendants to retrieve (0=symbol_only, 1=with_children, up to 5=recursive)",
                    "default": 0
                },
                "include_body": {
                    "type": "boolean",
                    "description": "Legacy alias for output_format=\"body\"",
                    "default": false
                },
                "output_format": {
                    "type": "string",
                    "enum": ["metadata", "signature", "body"],
                    "description": "Shape of each matched symbol"
                },
                "substring_matching": {
                    "type": "boolean",
                    "description": "Legacy alias for match_mode=\"substring\"",
                    "default": false
                },
                "match_mode": {
                    "type": "string",
                    "enum": ["exact", "substring", "glob", "regex"],
                    "description": "How the final name-path segment is matched"
                },
                "search_scope": {
                    "type": "string",
                    "enum": ["all", "source"],
                    "description": "Files considered when relative_path is absent",
                    "default": "all"
                },
                "include_kinds": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Restrict results to these LSP symbol kinds"
                },
                "max_answer_chars": {
                    "type": "integer",
                    "description": "Maximum characters to return. -1 for unlimited",
                    "default": -1
                }
            },
            "required": ["name_path_pattern"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: FindSymbolParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;

        let depth = validate_depth(params.depth)?;
        let output_format = OutputFormat::parse(params.output_format.as_deref(), params.include_body)?;
        let query_parts = split_query(&params.name_path_pattern);
        if query_parts.is_empty() {
            return Err(SerenaError::InvalidParameter(
                "name_path_pattern must not be empty".to_string(),
            ));
        }
        let mode = MatchMode::parse(params.match_mode.as_deref(), params.substring_matching)?;
        let matcher = NameMatcher::new(mode, query_parts[query_parts.len() - 1])?;

        let fingerprint = format!(
            "find_symbol:{:?}:{}:{:?}:{}",
            mode, params.name_path_pattern, output_format, depth
        );

        debug!("Finding symbol: {}", params.name_path_pattern);

        let mut results = Vec::new();
        let mut any_cache_hit = false;

        let files: Vec<String> = if let Some(ref rel_path) = params.relative_path {
            vec![rel_path.clone()]
        } else {
            enumerate_scope_files(&self.project_root, &params.search_scope)?
                .into_iter()
                .filter_map(|p| {
                    p.strip_prefix(&self.project_root)
                        .ok()
                        .map(|r| r.to_string_lossy().replace('\\', "/"))
                })
                .collect()
        };

        for rel_path in &files {
            let (mut entries, hit) = self
                .matches_in_file(rel_path, &query_parts, &matcher, output_format, depth, &fingerprint)
                .await?;
            any_cache_hit |= hit;
            results.append(&mut entries);
        }

        if let Some(kinds) = &params.include_kinds {
            let allowed: Vec<String> = kinds.iter().map(|k| k.to_lowercase()).collect();
            results.retain(|entry| {
                entry
                    .get("kind")
                    .and_then(|k| k.as_str())
                    .map(|k| allowed.contains(&k.to_lowercase()))
                    .unwrap_or(false)
            });
        }

        let json_result = serde_json::to_string_pretty(&results)
            .map_err(|e| SerenaError::InvalidParameter(format!("Serialization failed: {}", e)))?;
        let final_result = truncate_output(json_result, params.max_answer_chars);

        let mut response = json!({
            "matches": serde_json::from_str::<Value>(&final_result).unwrap_or(json!([])),
            "count": results.len(),
            "_cache": { "hit": any_cache_hit },
        });
        if params.relative_path.is_none() {
            response["_scope"] = scope_metadata(&params.search_scope);
        }

        Ok(ToolResult::success(response))
    }

    fn tags(&self) -> Vec<String> {
        vec![
            "symbol".to_string(),
            "search".to_string(),
            "lsp".to_string(),
        ]
    }

    fn narrowing_suggestions(&self) -> Vec<String> {
        vec![
            "pass relative_path to scope the search to one file".to_string(),
            "set depth=0 for symbol_only instead of recursive".to_string(),
            "use match_mode=\"exact\" instead of \"substring\" or \"regex\"".to_string(),
            "use search_scope=\"source\" to drop vendor/generated paths".to_string(),
        ]
    }
}

// ============================================================================
// get_symbol_body Tool
// ============================================================================

/// Tool for retrieving the source body of one or more symbols by
/// `symbol_id` (§3, §8 property 2).
pub struct GetSymbolBodyTool {
    project_root: PathBuf,
    lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
}

#[derive(Debug, Deserialize)]
struct GetSymbolBodyParams {
    #[serde(default)]
    symbol_id: Option<String>,
    #[serde(default)]
    symbol_ids: Option<Vec<String>>,
}

impl GetSymbolBodyTool {
    pub fn new(project_root: impl Into<PathBuf>, lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>) -> Self {
        Self {
            project_root: project_root.into(),
            lsp_client,
        }
    }

    /// Re-derives the symbol's current range by re-running the name-path
    /// search against the live file, rather than trusting the line
    /// number embedded in `symbol_id` (a stale id surfaces as
    /// `NotFoundError`, not a silently wrong body).
    async fn resolve_one(&self, id: &str) -> Result<Value, SerenaError> {
        let (name_path, relative_path, _start_line) = parse_symbol_id(id)
            .ok_or_else(|| SerenaError::InvalidParameter(format!("malformed symbol_id: {id}")))?;

        let file_path = self.project_root.join(&relative_path);
        let content = std::fs::read_to_string(&file_path).map_err(SerenaError::Io)?;
        let uri = format!("file://{}", file_path.display());

        let client = self.lsp_client.read().await;
        let text_document = lsp_types::TextDocumentIdentifier {
            uri: uri
                .parse::<lsp_types::Uri>()
                .map_err(|e| SerenaError::InvalidParameter(format!("Invalid URI: {}", e)))?,
        };
        let symbols = client.document_symbols(text_document).await.map_err(|e| {
            SerenaError::Tool(ToolError::ExecutionFailed(format!(
                "LSP document symbols failed: {}",
                e
            )))
        })?;
        drop(client);

        let mut flat = Vec::new();
        flatten(&symbols, "", &mut flat);
        let (_, symbol) = flat
            .into_iter()
            .find(|(np, _)| np == &name_path)
            .ok_or_else(|| SerenaError::NotFound(format!("symbol not found for id: {id}")))?;

        let file_lines: Vec<&str> = content.lines().collect();
        let body = extract_body(&file_lines, &symbol.location.range);
        Ok(json!({
            "symbol_id": symbol_id(&name_path, &relative_path, symbol.location.range.start.line),
            "body": body,
        }))
    }
}

#[async_trait]
impl Tool for GetSymbolBodyTool {
    fn name(&self) -> &str {
        "get_symbol_body"
    }

    fn description(&self) -> &str {
        "Retrieve the source text of one or more symbols, addressed by the stable symbol_id \
        returned from find_symbol (name_path:relative_path:start_line)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol_id": {
                    "type": "string",
                    "description": "A single symbol_id to resolve"
                },
                "symbol_ids": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Multiple symbol_ids to resolve in one call"
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: GetSymbolBodyParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;

        let mut ids: Vec<String> = params.symbol_ids.unwrap_or_default();
        if let Some(single) = params.symbol_id {
            ids.push(single);
        }
        if ids.is_empty() {
            return Err(SerenaError::InvalidParameter(
                "either symbol_id or symbol_ids is required".to_string(),
            ));
        }

        if ids.len() == 1 {
            let resolved = self.resolve_one(&ids[0]).await?;
            return Ok(ToolResult::success(resolved));
        }

        let mut bodies = serde_json::Map::new();
        for id in &ids {
            let resolved = self.resolve_one(id).await?;
            bodies.insert(id.clone(), resolved["body"].clone());
        }
        Ok(ToolResult::success(json!({ "bodies": bodies })))
    }

    fn tags(&self) -> Vec<String> {
        vec!["symbol".to_string(), "read".to_string(), "lsp".to_string()]
    }
}

// ============================================================================
// find_referencing_symbols Tool
// ============================================================================

/// Tool for finding all references to a symbol
pub struct FindReferencingSymbolsTool {
    project_root: PathBuf,
    lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
}

#[derive(Debug, Deserialize)]
struct FindReferencingSymbolsParams {
    name_path: String,
    relative_path: String,
    #[serde(default = "default_max_chars")]
    max_answer_chars: i32,
}

impl FindReferencingSymbolsTool {
    /// Create a new FindReferencingSymbolsTool
    pub fn new(
        project_root: impl Into<PathBuf>,
        lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            lsp_client,
        }
    }
}

#[async_trait]
impl Tool for FindReferencingSymbolsTool {
    fn name(&self) -> &str {
        "find_referencing_symbols"
    }

    fn description(&self) -> &str {
        "Find all references to a symbol at the given location."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name_path": {
                    "type": "string",
                    "description": "Name path of the symbol to find references for"
                },
                "relative_path": {
                    "type": "string",
                    "description": "The relative path to the file containing the symbol"
                },
                "max_answer_chars": {
                    "type": "integer",
                    "description": "Maximum characters to return. -1 for unlimited",
                    "default": -1
                }
            },
            "required": ["name_path", "relative_path"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: FindReferencingSymbolsParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;

        let file_path = self.project_root.join(&params.relative_path);
        let uri = format!("file://{}", file_path.display());

        debug!(
            "Finding references for {} in {}",
            params.name_path, params.relative_path
        );

        let client = self.lsp_client.read().await;

        let text_document = lsp_types::TextDocumentIdentifier {
            uri: uri
                .parse::<lsp_types::Uri>()
                .map_err(|e| SerenaError::InvalidParameter(format!("Invalid URI: {}", e)))?,
        };

        let symbols = client.document_symbols(text_document.clone()).await.map_err(|e| {
            SerenaError::Tool(ToolError::ExecutionFailed(format!(
                "LSP document symbols failed: {}",
                e
            )))
        })?;

        let mut flat = Vec::new();
        flatten(&symbols, "", &mut flat);
        let query_parts = split_query(&params.name_path);
        let target_final = query_parts.last().copied().unwrap_or(&params.name_path);
        let matcher = NameMatcher::new(MatchMode::Exact, target_final)?;

        let (_, target_symbol) = flat
            .into_iter()
            .find(|(np, _)| name_path_matches(np, &query_parts, &matcher))
            .ok_or_else(|| SerenaError::NotFound(format!("Symbol not found: {}", params.name_path)))?;

        let position = target_symbol.location.range.start.into();

        let text_doc_pos = lsp_types::TextDocumentPositionParams {
            text_document,
            position,
        };

        let references = client.find_references(text_doc_pos).await.map_err(|e| {
            SerenaError::Tool(ToolError::ExecutionFailed(format!(
                "LSP find references failed: {}",
                e
            )))
        })?;

        let mut results = Vec::new();
        for loc in references {
            let uri_str = loc.uri.to_string();
            let path_str = uri_str.strip_prefix("file://").unwrap_or(&uri_str);
            let path = PathBuf::from(path_str);

            let rel_path = path
                .strip_prefix(&self.project_root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            let (context, usage_pattern) = if let Ok(content) = std::fs::read_to_string(&path) {
                let lines: Vec<&str> = content.lines().collect();
                let line_num = loc.range.start.line as usize;
                let start = line_num.saturating_sub(1);
                let end = (line_num + 2).min(lines.len());
                let context = lines[start..end]
                    .iter()
                    .enumerate()
                    .map(|(i, l)| format!("{}: {}", start + i + 1, l))
                    .collect::<Vec<_>>()
                    .join("\n");
                let usage_pattern = lines.get(line_num).map(|l| l.trim().to_string()).unwrap_or_default();
                (context, usage_pattern)
            } else {
                (String::new(), String::new())
            };

            results.push(json!({
                "target_symbol_id": symbol_id(
                    target_final,
                    &params.relative_path,
                    target_symbol.location.range.start.line
                ),
                "path": rel_path,
                "line": loc.range.start.line + 1,
                "character": loc.range.start.character,
                "usage_pattern": usage_pattern,
                "context": context
            }));
        }

        let json_result = serde_json::to_string_pretty(&results)
            .map_err(|e| SerenaError::InvalidParameter(format!("Serialization failed: {}", e)))?;

        let final_result = truncate_output(json_result, params.max_answer_chars);

        Ok(ToolResult::success(json!({
            "references": serde_json::from_str::<Value>(&final_result).unwrap_or(json!([])),
            "count": results.len()
        })))
    }

    fn tags(&self) -> Vec<String> {
        vec![
            "symbol".to_string(),
            "references".to_string(),
            "lsp".to_string(),
        ]
    }
}

// ============================================================================
// replace_symbol_body Tool
// ============================================================================

/// Tool for replacing the body of a symbol
pub struct ReplaceSymbolBodyTool {
    project_root: PathBuf,
    lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
    cache: Arc<SymbolCache>,
}

#[derive(Debug, Deserialize)]
struct ReplaceSymbolBodyParams {
    name_path: String,
    relative_path: String,
    #[serde(alias = "new_body")]
    body: String,
    #[serde(default = "default_response_format")]
    response_format: String,
}

impl ReplaceSymbolBodyTool {
    /// Create a new ReplaceSymbolBodyTool
    pub fn new(
        project_root: impl Into<PathBuf>,
        lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
        cache: Arc<SymbolCache>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            lsp_client,
            cache,
        }
    }
}

#[async_trait]
impl Tool for ReplaceSymbolBodyTool {
    fn name(&self) -> &str {
        "replace_symbol_body"
    }

    fn description(&self) -> &str {
        "Replace the entire body of a symbol with new content."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name_path": {
                    "type": "string",
                    "description": "Name path of the symbol to replace"
                },
                "relative_path": {
                    "type": "string",
                    "description": "The relative path to the file containing the symbol"
                },
                "new_body": {
                    "type": "string",
                    "description": "The new body content for the symbol (alias: body)"
                },
                "response_format": {
                    "type": "string",
                    "enum": ["diff", "summary", "full"],
                    "description": "Shape of the returned edit response",
                    "default": "diff"
                }
            },
            "required": ["name_path", "relative_path", "new_body"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: ReplaceSymbolBodyParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;

        let file_path = self.project_root.join(&params.relative_path);
        let uri = format!("file://{}", file_path.display());

        debug!(
            "Replacing symbol {} in {}",
            params.name_path, params.relative_path
        );

        let client = self.lsp_client.read().await;

        let text_document = lsp_types::TextDocumentIdentifier {
            uri: uri
                .parse::<lsp_types::Uri>()
                .map_err(|e| SerenaError::InvalidParameter(format!("Invalid URI: {}", e)))?,
        };

        let symbols = client.document_symbols(text_document).await.map_err(|e| {
            SerenaError::Tool(ToolError::ExecutionFailed(format!(
                "LSP document symbols failed: {}",
                e
            )))
        })?;
        drop(client);

        let range = resolve_symbol_range(&symbols, &params.name_path)?;

        let original_content = std::fs::read_to_string(&file_path).map_err(SerenaError::Io)?;
        let lines: Vec<&str> = original_content.lines().collect();

        let start_line = range.start.line as usize;
        let indent = lines.get(start_line).map(|line| leading_indent(line)).unwrap_or_default();
        let body = if params.body.starts_with(&indent) || indent.is_empty() {
            params.body.clone()
        } else {
            format!("{indent}{}", params.body)
        };

        let mut new_content = String::new();
        for line in &lines[..start_line] {
            new_content.push_str(line);
            new_content.push('\n');
        }
        new_content.push_str(&body);
        if !body.ends_with('\n') {
            new_content.push('\n');
        }
        let end_line = (range.end.line as usize + 1).min(lines.len());
        for line in &lines[end_line..] {
            new_content.push_str(line);
            new_content.push('\n');
        }

        serena_config::atomic_write(&file_path, new_content.as_bytes()).map_err(SerenaError::Io)?;

        let invalidated = self.cache.invalidate_file(&params.relative_path);
        let diff = unified_diff(&original_content, &new_content, &params.relative_path);

        Ok(ToolResult::success(edit_response(
            &params.response_format,
            &format!(
                "Successfully replaced symbol '{}' in {}",
                params.name_path, params.relative_path
            ),
            &diff,
            &new_content,
            invalidated,
        )))
    }

    fn can_edit(&self) -> bool {
        true
    }

    fn tags(&self) -> Vec<String> {
        vec![
            "symbol".to_string(),
            "edit".to_string(),
            "lsp".to_string(),
        ]
    }
}

fn resolve_symbol_range(symbols: &[SymbolInfo], name_path: &str) -> Result<Range, SerenaError> {
    let mut flat = Vec::new();
    flatten(symbols, "", &mut flat);
    let query_parts = split_query(name_path);
    let final_segment = query_parts.last().copied().unwrap_or(name_path);
    let matcher = NameMatcher::new(MatchMode::Exact, final_segment)?;
    flat.into_iter()
        .find(|(np, _)| name_path_matches(np, &query_parts, &matcher))
        .map(|(_, s)| s.location.range)
        .ok_or_else(|| SerenaError::NotFound(format!("Symbol not found: {}", name_path)))
}

// ============================================================================
// regex_replace Tool
// ============================================================================

/// Tool for applying a language-agnostic regex substitution to a file
/// (§4.6).
pub struct RegexReplaceTool {
    project_root: PathBuf,
    cache: Arc<SymbolCache>,
}

#[derive(Debug, Deserialize)]
struct RegexReplaceParams {
    relative_path: String,
    pattern: String,
    replacement: String,
    #[serde(default)]
    allow_multiple: bool,
    #[serde(default = "default_response_format")]
    response_format: String,
}

impl RegexReplaceTool {
    pub fn new(project_root: impl Into<PathBuf>, cache: Arc<SymbolCache>) -> Self {
        Self {
            project_root: project_root.into(),
            cache,
        }
    }
}

#[async_trait]
impl Tool for RegexReplaceTool {
    fn name(&self) -> &str {
        "regex_replace"
    }

    fn description(&self) -> &str {
        "Apply a regex substitution to a file. Fails if the pattern matches more than once \
        unless allow_multiple is set."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relative_path": {
                    "type": "string",
                    "description": "The relative path to the file to edit"
                },
                "pattern": {
                    "type": "string",
                    "description": "The regular expression to match"
                },
                "replacement": {
                    "type": "string",
                    "description": "The replacement text (supports $1-style capture references)"
                },
                "allow_multiple": {
                    "type": "boolean",
                    "description": "Allow replacing more than one match",
                    "default": false
                },
                "response_format": {
                    "type": "string",
                    "enum": ["diff", "summary", "full"],
                    "description": "Shape of the returned edit response",
                    "default": "diff"
                }
            },
            "required": ["relative_path", "pattern", "replacement"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: RegexReplaceParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;

        let file_path = self.project_root.join(&params.relative_path);
        let original_content = std::fs::read_to_string(&file_path).map_err(SerenaError::Io)?;

        let regex = Regex::new(&params.pattern).map_err(|e| {
            SerenaError::Tool(ToolError::InvalidPattern(format!(
                "invalid regex '{}': {e}",
                params.pattern
            )))
        })?;

        let match_count = regex.find_iter(&original_content).count();
        if match_count == 0 {
            return Err(SerenaError::NotFound(format!(
                "pattern '{}' did not match in {}",
                params.pattern, params.relative_path
            )));
        }
        if match_count > 1 && !params.allow_multiple {
            return Err(SerenaError::InvalidParameter(format!(
                "pattern '{}' matches {match_count} times in {}; set allow_multiple=true to \
                replace all, or narrow the pattern",
                params.pattern, params.relative_path
            )));
        }

        let new_content = regex
            .replace_all(&original_content, params.replacement.as_str())
            .to_string();

        serena_config::atomic_write(&file_path, new_content.as_bytes()).map_err(SerenaError::Io)?;

        let invalidated = self.cache.invalidate_file(&params.relative_path);
        let diff = unified_diff(&original_content, &new_content, &params.relative_path);

        Ok(ToolResult::success(edit_response(
            &params.response_format,
            &format!(
                "Replaced {match_count} match(es) of '{}' in {}",
                params.pattern, params.relative_path
            ),
            &diff,
            &new_content,
            invalidated,
        )))
    }

    fn can_edit(&self) -> bool {
        true
    }

    fn tags(&self) -> Vec<String> {
        vec!["edit".to_string(), "regex".to_string()]
    }

    fn narrowing_suggestions(&self) -> Vec<String> {
        vec![
            "narrow the pattern so it matches exactly one location".to_string(),
            "set allow_multiple=true to replace every match".to_string(),
        ]
    }
}

// ============================================================================
// insert_after_symbol Tool
// ============================================================================

/// Tool for inserting content after a symbol
pub struct InsertAfterSymbolTool {
    project_root: PathBuf,
    lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
    cache: Arc<SymbolCache>,
}

#[derive(Debug, Deserialize)]
struct InsertAfterSymbolParams {
    name_path: String,
    relative_path: String,
    #[serde(alias = "content")]
    new_text: String,
    #[serde(default = "default_response_format")]
    response_format: String,
}

impl InsertAfterSymbolTool {
    /// Create a new InsertAfterSymbolTool
    pub fn new(
        project_root: impl Into<PathBuf>,
        lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
        cache: Arc<SymbolCache>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            lsp_client,
            cache,
        }
    }
}

#[async_trait]
impl Tool for InsertAfterSymbolTool {
    fn name(&self) -> &str {
        "insert_after_symbol"
    }

    fn description(&self) -> &str {
        "Insert content after a symbol (function, class, method, etc.). \
        The content will be inserted starting on the line after the symbol ends."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name_path": {
                    "type": "string",
                    "description": "Name path of the symbol to insert after"
                },
                "relative_path": {
                    "type": "string",
                    "description": "The relative path to the file containing the symbol"
                },
                "new_text": {
                    "type": "string",
                    "description": "The content to insert after the symbol"
                },
                "response_format": {
                    "type": "string",
                    "enum": ["diff", "summary", "full"],
                    "default": "diff"
                }
            },
            "required": ["name_path", "relative_path", "new_text"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: InsertAfterSymbolParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;

        let file_path = self.project_root.join(&params.relative_path);
        let uri = format!("file://{}", file_path.display());

        debug!(
            "Inserting after symbol {} in {}",
            params.name_path, params.relative_path
        );

        let client = self.lsp_client.read().await;
        let text_document = lsp_types::TextDocumentIdentifier {
            uri: uri
                .parse::<lsp_types::Uri>()
                .map_err(|e| SerenaError::InvalidParameter(format!("Invalid URI: {}", e)))?,
        };
        let symbols = client.document_symbols(text_document).await.map_err(|e| {
            SerenaError::Tool(ToolError::ExecutionFailed(format!(
                "LSP document symbols failed: {}",
                e
            )))
        })?;
        drop(client);

        let range = resolve_symbol_range(&symbols, &params.name_path)?;
        let original_content = std::fs::read_to_string(&file_path).map_err(SerenaError::Io)?;
        let lines: Vec<&str> = original_content.lines().collect();

        let insert_line = (range.end.line as usize + 1).min(lines.len());

        let mut new_content = String::new();
        for line in &lines[..insert_line] {
            new_content.push_str(line);
            new_content.push('\n');
        }
        if !params.new_text.starts_with('\n') {
            new_content.push('\n');
        }
        new_content.push_str(&params.new_text);
        if !params.new_text.ends_with('\n') {
            new_content.push('\n');
        }
        for line in &lines[insert_line..] {
            new_content.push_str(line);
            new_content.push('\n');
        }

        serena_config::atomic_write(&file_path, new_content.as_bytes()).map_err(SerenaError::Io)?;

        let invalidated = self.cache.invalidate_file(&params.relative_path);
        let diff = unified_diff(&original_content, &new_content, &params.relative_path);

        Ok(ToolResult::success(edit_response(
            &params.response_format,
            &format!(
                "Inserted content after symbol '{}' in {}",
                params.name_path, params.relative_path
            ),
            &diff,
            &new_content,
            invalidated,
        )))
    }

    fn can_edit(&self) -> bool {
        true
    }

    fn tags(&self) -> Vec<String> {
        vec![
            "symbol".to_string(),
            "edit".to_string(),
            "insert".to_string(),
            "lsp".to_string(),
        ]
    }
}

// ============================================================================
// insert_before_symbol Tool
// ============================================================================

/// Tool for inserting content before a symbol
pub struct InsertBeforeSymbolTool {
    project_root: PathBuf,
    lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
    cache: Arc<SymbolCache>,
}

#[derive(Debug, Deserialize)]
struct InsertBeforeSymbolParams {
    name_path: String,
    relative_path: String,
    #[serde(alias = "content")]
    new_text: String,
    #[serde(default = "default_response_format")]
    response_format: String,
}

impl InsertBeforeSymbolTool {
    /// Create a new InsertBeforeSymbolTool
    pub fn new(
        project_root: impl Into<PathBuf>,
        lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
        cache: Arc<SymbolCache>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            lsp_client,
            cache,
        }
    }
}

#[async_trait]
impl Tool for InsertBeforeSymbolTool {
    fn name(&self) -> &str {
        "insert_before_symbol"
    }

    fn description(&self) -> &str {
        "Insert content before a symbol (function, class, method, etc.). \
        The content will be inserted starting on the line before the symbol begins."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name_path": {
                    "type": "string",
                    "description": "Name path of the symbol to insert before"
                },
                "relative_path": {
                    "type": "string",
                    "description": "The relative path to the file containing the symbol"
                },
                "new_text": {
                    "type": "string",
                    "description": "The content to insert before the symbol"
                },
                "response_format": {
                    "type": "string",
                    "enum": ["diff", "summary", "full"],
                    "default": "diff"
                }
            },
            "required": ["name_path", "relative_path", "new_text"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: InsertBeforeSymbolParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;

        let file_path = self.project_root.join(&params.relative_path);
        let uri = format!("file://{}", file_path.display());

        debug!(
            "Inserting before symbol {} in {}",
            params.name_path, params.relative_path
        );

        let client = self.lsp_client.read().await;
        let text_document = lsp_types::TextDocumentIdentifier {
            uri: uri
                .parse::<lsp_types::Uri>()
                .map_err(|e| SerenaError::InvalidParameter(format!("Invalid URI: {}", e)))?,
        };
        let symbols = client.document_symbols(text_document).await.map_err(|e| {
            SerenaError::Tool(ToolError::ExecutionFailed(format!(
                "LSP document symbols failed: {}",
                e
            )))
        })?;
        drop(client);

        let range = resolve_symbol_range(&symbols, &params.name_path)?;
        let original_content = std::fs::read_to_string(&file_path).map_err(SerenaError::Io)?;
        let lines: Vec<&str> = original_content.lines().collect();

        let insert_line = range.start.line as usize;

        let mut new_content = String::new();
        for line in &lines[..insert_line] {
            new_content.push_str(line);
            new_content.push('\n');
        }
        new_content.push_str(&params.new_text);
        if !params.new_text.ends_with('\n') {
            new_content.push('\n');
        }
        for line in &lines[insert_line..] {
            new_content.push_str(line);
            new_content.push('\n');
        }

        serena_config::atomic_write(&file_path, new_content.as_bytes()).map_err(SerenaError::Io)?;

        let invalidated = self.cache.invalidate_file(&params.relative_path);
        let diff = unified_diff(&original_content, &new_content, &params.relative_path);

        Ok(ToolResult::success(edit_response(
            &params.response_format,
            &format!(
                "Inserted content before symbol '{}' in {}",
                params.name_path, params.relative_path
            ),
            &diff,
            &new_content,
            invalidated,
        )))
    }

    fn can_edit(&self) -> bool {
        true
    }

    fn tags(&self) -> Vec<String> {
        vec![
            "symbol".to_string(),
            "edit".to_string(),
            "insert".to_string(),
            "lsp".to_string(),
        ]
    }
}

// ============================================================================
// Symbol Tools Factory
// ============================================================================

/// Create all symbol operation tools
///
/// These tools require an LSP client for semantic code operations and
/// share one Symbol Cache so edits made through one tool invalidate
/// reads made through another (§4.5).
///
/// # Arguments
/// * `project_root` - The root path of the project
/// * `lsp_client` - Shared LSP client for language server communication
/// * `cache` - Shared symbol cache, persisted across SLS restarts
///
/// # Returns
/// Vector of all symbol tools wrapped in Arc for shared ownership
pub fn create_symbol_tools(
    project_root: impl Into<PathBuf> + Clone,
    lsp_client: Arc<RwLock<Box<dyn LanguageServer>>>,
    cache: Arc<SymbolCache>,
) -> Vec<Arc<dyn Tool>> {
    let root: PathBuf = project_root.into();
    vec![
        Arc::new(GetSymbolsOverviewTool::new(root.clone(), lsp_client.clone(), cache.clone())),
        Arc::new(FindSymbolTool::new(root.clone(), lsp_client.clone(), cache.clone())),
        Arc::new(GetSymbolBodyTool::new(root.clone(), lsp_client.clone())),
        Arc::new(FindReferencingSymbolsTool::new(root.clone(), lsp_client.clone())),
        Arc::new(ReplaceSymbolBodyTool::new(root.clone(), lsp_client.clone(), cache.clone())),
        Arc::new(RegexReplaceTool::new(root.clone(), cache.clone())),
        Arc::new(InsertAfterSymbolTool::new(root.clone(), lsp_client.clone(), cache.clone())),
        Arc::new(InsertBeforeSymbolTool::new(root, lsp_client, cache)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_output() {
        let text = "Hello, World!".to_string();
        assert_eq!(truncate_output(text.clone(), -1), text);
        assert_eq!(truncate_output(text.clone(), 5), "Hello... (truncated)");
        assert_eq!(truncate_output(text.clone(), 100), text);
    }

    #[test]
    fn match_mode_defaults_to_exact() {
        let mode = MatchMode::parse(None, false).unwrap();
        assert_eq!(mode, MatchMode::Exact);
    }

    #[test]
    fn legacy_substring_matching_maps_to_substring_mode() {
        let mode = MatchMode::parse(None, true).unwrap();
        assert_eq!(mode, MatchMode::Substring);
    }

    #[test]
    fn unknown_match_mode_is_rejected() {
        assert!(MatchMode::parse(Some("fuzzy"), false).is_err());
    }

    #[test]
    fn name_path_exact_requires_full_parent_chain() {
        let matcher = NameMatcher::new(MatchMode::Exact, "method").unwrap();
        assert!(name_path_matches("User/method", &["User", "method"], &matcher));
        assert!(!name_path_matches("Admin/method", &["User", "method"], &matcher));
        assert!(name_path_matches("Outer/User/method", &["User", "method"], &matcher));
    }

    #[test]
    fn name_path_substring_only_applies_to_final_segment() {
        let matcher = NameMatcher::new(MatchMode::Substring, "eth").unwrap();
        assert!(name_path_matches("User/method", &["method"], &matcher));
        assert!(!name_path_matches("User/other", &["method"], &matcher));
    }

    #[test]
    fn name_path_glob_matches_wildcard() {
        let matcher = NameMatcher::new(MatchMode::Glob, "User*Service").unwrap();
        assert!(name_path_matches("UserAuthService", &["User*Service"], &matcher));
        assert!(name_path_matches("UserService", &["User*Service"], &matcher));
        assert!(!name_path_matches("OtherService", &["User*Service"], &matcher));
    }

    #[test]
    fn name_path_regex_matches_pattern() {
        let matcher = NameMatcher::new(MatchMode::RegexMode, "User[A-Z][a-z]+Service").unwrap();
        assert!(name_path_matches("UserAuthService", &["User[A-Z][a-z]+Service"], &matcher));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        assert!(NameMatcher::new(MatchMode::RegexMode, "(unclosed").is_err());
    }

    #[test]
    fn depth_over_cap_is_rejected() {
        assert!(validate_depth(MAX_DEPTH).is_ok());
        assert!(validate_depth(MAX_DEPTH + 1).is_err());
    }

    #[test]
    fn symbol_id_round_trips() {
        let id = symbol_id("User/login", "m.py", 4);
        assert_eq!(id, "User/login:m.py:5");
        assert_eq!(
            parse_symbol_id(&id),
            Some(("User/login".to_string(), "m.py".to_string(), 5))
        );
    }

    #[test]
    fn scope_metadata_lists_excluded_categories_for_source() {
        let meta = scope_metadata("source");
        assert!(meta["excluded_categories"].as_array().unwrap().contains(&json!("vendor")));
        assert_eq!(meta["rerun_hint"], json!("pass search_scope=\"all\" to include excluded/vendor paths"));
    }

    #[test]
    fn scope_metadata_for_all_has_no_exclusions() {
        let meta = scope_metadata("all");
        assert!(meta.get("excluded_categories").is_none());
    }
}
