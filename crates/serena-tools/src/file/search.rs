use async_trait::async_trait;
use globset::{Glob, GlobMatcher};
use rayon::prelude::*;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serena_core::{enumerate_scope_files, scope_metadata, SerenaError, Tool, ToolResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// Cap on files walked for a single pattern search, bounding worst-case
/// cost on very large trees (mirrors the symbol-search scope cap).
const MAX_SCOPE_FILES: usize = 5000;

/// How many matches a `summary` result shows inline before pointing at
/// `result_format="detailed"`.
const SUMMARY_PREVIEW_LEN: usize = 10;

/// Language-agnostic regex search across the project tree, respecting
/// VCS ignores and the fixed `source` scope exclusions.
pub struct SearchFilesTool {
    project_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SearchForPatternParams {
    pattern: String,
    #[serde(default)]
    relative_path: Option<String>,
    #[serde(default = "default_search_scope")]
    search_scope: String,
    #[serde(default)]
    include_glob: Option<String>,
    #[serde(default)]
    exclude_glob: Option<String>,
    #[serde(default)]
    case_insensitive: Option<bool>,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    context_lines: Option<usize>,
    #[serde(default = "default_result_format")]
    result_format: String,
}

fn default_search_scope() -> String {
    "all".to_string()
}

fn default_result_format() -> String {
    "summary".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct FileMatch {
    path: String,
    line_number: usize,
    line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_before: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_after: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct FileMatchCount {
    path: String,
    count: usize,
}

struct SearchResult {
    matches: Vec<FileMatch>,
    total_matches: usize,
    truncated: bool,
}

impl SearchFilesTool {
    /// Create a new SearchFilesTool with the given project root
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    async fn search_impl(
        &self,
        params: &SearchForPatternParams,
    ) -> Result<SearchResult, SerenaError> {
        let regex = RegexBuilder::new(&params.pattern)
            .case_insensitive(params.case_insensitive.unwrap_or(false))
            .build()
            .map_err(|e| SerenaError::InvalidParameter(format!("Invalid regex pattern: {}", e)))?;

        debug!(
            "Searching scope {:?} with pattern: {}",
            params.search_scope, params.pattern
        );

        let scope_files =
            enumerate_scope_files(&self.project_root, &params.search_scope, MAX_SCOPE_FILES)?;

        let narrow_root = params
            .relative_path
            .as_ref()
            .map(|p| self.project_root.join(p));

        let include_matcher = params
            .include_glob
            .as_ref()
            .and_then(|p| create_glob_matcher(p));
        let exclude_matcher = params
            .exclude_glob
            .as_ref()
            .and_then(|p| create_glob_matcher(p));

        let file_paths: Vec<PathBuf> = scope_files
            .into_iter()
            .filter(|path| match &narrow_root {
                Some(root) => path.starts_with(root),
                None => true,
            })
            .filter(|path| {
                let include_ok = match &include_matcher {
                    Some(matcher) => matches_glob(path, matcher),
                    None => true,
                };
                let exclude_ok = match &exclude_matcher {
                    Some(matcher) => !matches_glob(path, matcher),
                    None => true,
                };
                include_ok && exclude_ok
            })
            .collect();

        debug!("Found {} files to search", file_paths.len());

        let max_results = params.max_results.unwrap_or(1000);
        let context_lines = params.context_lines.unwrap_or(0);

        let total_count = AtomicUsize::new(0);
        let stop_flag = AtomicBool::new(false);
        let project_root = &self.project_root;

        let all_matches: Vec<FileMatch> = file_paths
            .par_iter()
            .flat_map(|file_path| {
                if stop_flag.load(Ordering::Relaxed) {
                    return Vec::new();
                }

                let matches = search_file(
                    file_path,
                    project_root,
                    &regex,
                    context_lines,
                    &total_count,
                );

                if total_count.load(Ordering::Relaxed) >= max_results * 2 {
                    stop_flag.store(true, Ordering::Relaxed);
                }

                matches
            })
            .collect();

        let total = total_count.load(Ordering::Relaxed);

        let mut sorted_matches = all_matches;
        sorted_matches
            .sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.line_number.cmp(&b.line_number)));

        let truncated = sorted_matches.len() > max_results;
        sorted_matches.truncate(max_results);

        Ok(SearchResult {
            matches: sorted_matches,
            total_matches: total,
            truncated,
        })
    }
}

/// Create a compiled glob matcher for efficient repeated matching
fn create_glob_matcher(pattern: &str) -> Option<GlobMatcher> {
    Glob::new(pattern).ok().map(|g| g.compile_matcher())
}

/// Check if path matches using a pre-compiled matcher
fn matches_glob(path: &Path, matcher: &GlobMatcher) -> bool {
    matcher.is_match(path)
}

/// Search a single file for regex matches (called in parallel by rayon)
fn search_file(
    file_path: &Path,
    project_root: &Path,
    regex: &regex::Regex,
    context_lines: usize,
    total_count: &AtomicUsize,
) -> Vec<FileMatch> {
    let mut matches = Vec::new();

    if let Ok(content) = std::fs::read_to_string(file_path) {
        let lines: Vec<&str> = content.lines().collect();

        let relative_path = file_path
            .strip_prefix(project_root)
            .unwrap_or(file_path)
            .to_string_lossy()
            .replace('\\', "/");

        for (idx, line) in lines.iter().enumerate() {
            if regex.is_match(line) {
                total_count.fetch_add(1, Ordering::Relaxed);

                let context_before = if context_lines > 0 {
                    let start = idx.saturating_sub(context_lines);
                    Some(lines[start..idx].iter().map(|s| s.to_string()).collect())
                } else {
                    None
                };

                let context_after = if context_lines > 0 {
                    let end = (idx + 1 + context_lines).min(lines.len());
                    Some(lines[idx + 1..end].iter().map(|s| s.to_string()).collect())
                } else {
                    None
                };

                matches.push(FileMatch {
                    path: relative_path.clone(),
                    line_number: idx + 1, // 1-based line numbers
                    line: line.to_string(),
                    context_before,
                    context_after,
                });
            }
        }
    }

    matches
}

/// Group matches by file, sorted by path, for the `summary` format.
fn counts_by_file(matches: &[FileMatch]) -> Vec<FileMatchCount> {
    let mut counts: Vec<FileMatchCount> = Vec::new();
    for m in matches {
        match counts.iter_mut().find(|c| c.path == m.path) {
            Some(c) => c.count += 1,
            None => counts.push(FileMatchCount {
                path: m.path.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| a.path.cmp(&b.path));
    counts
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_for_pattern"
    }

    fn description(&self) -> &str {
        "Search for a regex pattern across the project. Respects VCS ignores and, with \
        search_scope=\"source\", a fixed list of generated/vendor directories. \
        result_format=\"summary\" (default) returns per-file match counts and a short \
        preview; result_format=\"detailed\" returns every match."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to search for"
                },
                "relative_path": {
                    "type": "string",
                    "description": "Optional relative file or directory to restrict the search to; omit to search the whole search_scope"
                },
                "search_scope": {
                    "type": "string",
                    "enum": ["all", "source"],
                    "description": "\"all\" walks every file; \"source\" additionally drops VCS-ignored and generated/vendor paths (default: all)"
                },
                "include_glob": {
                    "type": "string",
                    "description": "Optional glob pattern to include files (e.g., '*.rs')"
                },
                "exclude_glob": {
                    "type": "string",
                    "description": "Optional glob pattern to exclude files (e.g., '*.test.rs')"
                },
                "case_insensitive": {
                    "type": "boolean",
                    "description": "Whether to perform case-insensitive search (default: false)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return in detailed mode (default: 1000)"
                },
                "context_lines": {
                    "type": "integer",
                    "description": "Number of context lines to include before/after each match (default: 0)"
                },
                "result_format": {
                    "type": "string",
                    "enum": ["summary", "detailed"],
                    "description": "\"summary\" (default) returns per-file counts plus a short preview; \"detailed\" returns every match"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, SerenaError> {
        let params: SearchForPatternParams = serde_json::from_value(params)
            .map_err(|e| SerenaError::InvalidParameter(e.to_string()))?;

        if params.result_format != "summary" && params.result_format != "detailed" {
            return Err(SerenaError::InvalidParameter(format!(
                "unknown result_format '{}'; expected 'summary' or 'detailed'",
                params.result_format
            )));
        }

        let result = self.search_impl(&params).await?;

        let mut response = if params.result_format == "detailed" {
            json!({
                "matches": result.matches,
                "total_matches": result.total_matches,
                "truncated": result.truncated,
            })
        } else {
            let counts = counts_by_file(&result.matches);
            let preview: Vec<_> = result.matches.iter().take(SUMMARY_PREVIEW_LEN).collect();
            json!({
                "file_counts": counts,
                "total_matches": result.total_matches,
                "files_matched": counts.len(),
                "preview": preview,
                "truncated": result.truncated || result.matches.len() > SUMMARY_PREVIEW_LEN,
                "expansion_hint": "pass result_format=\"detailed\" for the full match list",
            })
        };
        response["_scope"] = scope_metadata(&params.search_scope);

        let message = if result.truncated {
            format!(
                "Found {} matches (showing first {})",
                result.total_matches,
                result.matches.len()
            )
        } else {
            format!("Found {} matches", result.total_matches)
        };

        Ok(ToolResult::success_with_message(response, message))
    }

    fn can_edit(&self) -> bool {
        false
    }

    fn requires_project(&self) -> bool {
        true
    }

    fn tags(&self) -> Vec<String> {
        vec!["file".to_string(), "search".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs::write;

    #[tokio::test]
    async fn test_basic_search_detailed() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path().join("file1.txt"),
            "Hello World\nGoodbye World",
        )
        .await
        .unwrap();
        write(
            temp_dir.path().join("file2.txt"),
            "Hello Rust\nGoodbye Rust",
        )
        .await
        .unwrap();

        let tool = SearchFilesTool::new(temp_dir.path());

        let params = json!({
            "pattern": "Hello",
            "result_format": "detailed"
        });

        let result = tool.execute(params).await.unwrap();
        let data = result.data.unwrap();

        assert_eq!(data["total_matches"], json!(2));
        assert_eq!(data["matches"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_summary_groups_by_file_with_preview() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path().join("file1.txt"),
            "TODO a\nTODO b\nTODO c",
        )
        .await
        .unwrap();
        write(temp_dir.path().join("file2.txt"), "TODO d").await.unwrap();

        let tool = SearchFilesTool::new(temp_dir.path());
        let params = json!({ "pattern": "TODO" });

        let result = tool.execute(params).await.unwrap();
        let data = result.data.unwrap();

        assert_eq!(data["total_matches"], json!(4));
        assert_eq!(data["files_matched"], json!(2));
        let counts = data["file_counts"].as_array().unwrap();
        assert_eq!(counts.len(), 2);
        assert!(data["expansion_hint"]
            .as_str()
            .unwrap()
            .contains("detailed"));
    }

    #[tokio::test]
    async fn test_case_insensitive_search() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path().join("test.txt"), "hello\nHELLO\nHeLLo")
            .await
            .unwrap();

        let tool = SearchFilesTool::new(temp_dir.path());

        let params = json!({
            "pattern": "hello",
            "case_insensitive": true,
            "result_format": "detailed"
        });

        let result = tool.execute(params).await.unwrap();
        let data = result.data.unwrap();

        assert_eq!(data["total_matches"], json!(3));
    }

    #[tokio::test]
    async fn test_context_lines() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path().join("test.txt"),
            "Line 1\nLine 2\nTarget\nLine 4\nLine 5",
        )
        .await
        .unwrap();

        let tool = SearchFilesTool::new(temp_dir.path());

        let params = json!({
            "pattern": "Target",
            "context_lines": 1,
            "result_format": "detailed"
        });

        let result = tool.execute(params).await.unwrap();
        let data = result.data.unwrap();
        let matches = data["matches"].as_array().unwrap();

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m["context_before"].as_array().unwrap().len(), 1);
        assert_eq!(m["context_after"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_source_scope_reports_exclusion_metadata() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path().join("main.rs"), "TODO fixme").await.unwrap();

        let tool = SearchFilesTool::new(temp_dir.path());
        let params = json!({ "pattern": "TODO", "search_scope": "source" });

        let result = tool.execute(params).await.unwrap();
        let data = result.data.unwrap();

        assert_eq!(data["_scope"]["scope"], json!("source"));
        assert!(data["_scope"]["excluded_categories"]
            .as_array()
            .unwrap()
            .contains(&json!("vendor")));
    }

    #[tokio::test]
    async fn test_unknown_result_format_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path().join("main.rs"), "TODO fixme").await.unwrap();

        let tool = SearchFilesTool::new(temp_dir.path());
        let params = json!({ "pattern": "TODO", "result_format": "verbose" });

        assert!(tool.execute(params).await.is_err());
    }
}
