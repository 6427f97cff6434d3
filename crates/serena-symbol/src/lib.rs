//! Symbol operation tools for Serena MCP server
//!
//! These tools wrap the LSP client to provide semantic code navigation
//! and editing capabilities.

pub mod cache;
pub mod tools;

pub use cache::{CacheKey, SymbolCache, SymbolCacheStats};
pub use tools::{
    create_symbol_tools, FindReferencingSymbolsTool, FindSymbolTool, GetSymbolBodyTool,
    GetSymbolsOverviewTool, InsertAfterSymbolTool, InsertBeforeSymbolTool, RegexReplaceTool,
    ReplaceSymbolBodyTool,
};
