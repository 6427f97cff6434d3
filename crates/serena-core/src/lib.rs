pub mod dispatch;
pub mod error;
pub mod registry;
pub mod scope;
pub mod session;
pub mod traits;
pub mod types;

// Test utilities (available in tests and with test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export error types
pub use error::{ConfigError, LspError, SerenaError, ToolError};

// Re-export core types
pub use types::{Location, Position, Range, SymbolInfo, SymbolKind, ToolResult, ToolStatus};

// Re-export traits
pub use traits::{LanguageServer, MemoryStorage, Tool};

// Re-export registry
pub use registry::{ToolRegistry, ToolRegistryBuilder};

// Re-export scope helpers
pub use scope::{enumerate_scope_files, is_excluded_source_path, scope_metadata, SOURCE_SCOPE_EXCLUDED};

// Re-export dispatch/session
pub use dispatch::{estimate_tokens, wrap_envelope};
pub use session::{Phase, PhaseDecision, SessionState, ToolCallKind, ToolCallRecord};
