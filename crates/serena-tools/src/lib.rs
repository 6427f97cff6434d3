pub mod editor;
pub mod factory;
pub mod file;

pub use factory::{build_core_registry, create_core_tools, ToolFactory};
pub use serena_core::{SerenaError, Tool, ToolRegistry, ToolRegistryBuilder, ToolResult, ToolStatus};

// Re-export commonly used file tools
pub use file::{
    CreateTextFileTool, FindFileTool, ListDirectoryTool, ReadFileTool, ReplaceContentTool,
    SearchFilesTool,
};

// Re-export editor tools
pub use editor::{DeleteLinesTool, InsertAtLineTool, ReplaceLinesTool};

// Re-export async_trait for users implementing tools
pub use async_trait::async_trait;
