pub mod lsp;
pub mod storage;
pub mod tool;

pub use lsp::LanguageServer;
pub use storage::MemoryStorage;
pub use tool::Tool;
