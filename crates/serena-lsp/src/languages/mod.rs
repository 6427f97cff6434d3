//! Language Backend Registry (spec §4.2).
//!
//! A pure lookup from a language tag to the descriptor needed to launch
//! and talk to its backend: command, arguments, per-request timeout, and
//! the `supports_lsp` predicate that lets plain-text languages (markdown,
//! yaml, toml) skip the Solid Language Server entirely.

use serena_config::Language;
use std::time::Duration;

/// Default per-request timeout imposed when a backend descriptor does
/// not set its own (spec §4.1: "if the backend factory does not set
/// one, a default is imposed, e.g. 240s").
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(240);

/// Configuration for a language server, i.e. a `BackendDescriptor`.
#[derive(Debug, Clone)]
pub struct LanguageServerConfig {
    /// Command to execute the language server
    pub command: String,

    /// Command-line arguments
    pub args: Vec<String>,

    /// File extensions this language server handles
    pub file_extensions: Vec<&'static str>,

    /// Per-request timeout. A transport that receives a zero timeout
    /// refuses to start (§4.1's required "no timeout" failure mode)
    /// rather than silently waiting forever.
    pub request_timeout: Duration,

    /// Whether this language is actually backed by an LSP server. False
    /// for plain-text languages, which causes the SLS to be skipped
    /// entirely rather than spawning a backend that doesn't exist.
    pub supports_lsp: bool,
}

impl LanguageServerConfig {
    fn lsp(command: &str, args: Vec<&str>, file_extensions: Vec<&'static str>) -> Self {
        Self {
            command: command.to_string(),
            args: args.into_iter().map(String::from).collect(),
            file_extensions,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            supports_lsp: true,
        }
    }

    fn plain_text(file_extensions: Vec<&'static str>) -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            file_extensions,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            supports_lsp: false,
        }
    }
}

/// Get the language server configuration for a specific language
///
/// # Arguments
/// * `language` - The programming language
///
/// # Returns
/// The language server configuration, or an error if the language is not supported
pub fn get_config(language: Language) -> anyhow::Result<LanguageServerConfig> {
    let config = match language {
        Language::Rust => LanguageServerConfig::lsp("rust-analyzer", vec![], vec!["rs"]),

        Language::Python => LanguageServerConfig::lsp(
            "pyright-langserver",
            vec!["--stdio"],
            vec!["py", "pyw", "pyi"],
        ),

        Language::TypeScript | Language::JavaScript => LanguageServerConfig::lsp(
            "typescript-language-server",
            vec!["--stdio"],
            vec!["ts", "tsx", "js", "jsx", "mjs", "cjs"],
        ),

        Language::Go => LanguageServerConfig::lsp("gopls", vec![], vec!["go"]),

        Language::Java => LanguageServerConfig::lsp("jdtls", vec![], vec!["java"]),

        Language::CSharp => LanguageServerConfig::lsp("csharp-ls", vec![], vec!["cs", "csx"]),

        Language::Ruby => LanguageServerConfig::lsp("ruby-lsp", vec![], vec!["rb", "rake"]),

        Language::RubySolargraph => {
            LanguageServerConfig::lsp("solargraph", vec!["stdio"], vec!["rb", "rake"])
        }

        Language::PHP => {
            LanguageServerConfig::lsp("intelephense", vec!["--stdio"], vec!["php", "phtml"])
        }

        Language::Perl => LanguageServerConfig::lsp("pls", vec![], vec!["pl", "pm"]),

        Language::PowerShell => LanguageServerConfig::lsp(
            "pwsh",
            vec![
                "-NoLogo",
                "-NoProfile",
                "-Command",
                "PowerShellEditorServices",
            ],
            vec!["ps1", "psm1", "psd1"],
        ),

        Language::Elixir => LanguageServerConfig::lsp("elixir-ls", vec![], vec!["ex", "exs"]),

        Language::Terraform => {
            LanguageServerConfig::lsp("terraform-ls", vec!["serve"], vec!["tf", "tfvars"])
        }

        Language::Clojure => LanguageServerConfig::lsp(
            "clojure-lsp",
            vec![],
            vec!["clj", "cljs", "cljc", "edn"],
        ),

        Language::Swift => LanguageServerConfig::lsp("sourcekit-lsp", vec![], vec!["swift"]),

        Language::Bash => {
            LanguageServerConfig::lsp("bash-language-server", vec!["start"], vec!["sh", "bash"])
        }

        Language::Vue => {
            LanguageServerConfig::lsp("vue-language-server", vec!["--stdio"], vec!["vue"])
        }

        Language::Cpp => LanguageServerConfig::lsp(
            "clangd",
            vec![],
            vec!["cpp", "cc", "cxx", "hpp", "hxx", "h++"],
        ),

        Language::C => LanguageServerConfig::lsp("clangd", vec![], vec!["c", "h"]),

        Language::Kotlin => {
            LanguageServerConfig::lsp("kotlin-language-server", vec![], vec!["kt", "kts"])
        }

        Language::Scala => LanguageServerConfig::lsp("metals", vec![], vec!["scala", "sc"]),

        Language::Haskell => LanguageServerConfig::lsp(
            "haskell-language-server-wrapper",
            vec!["--lsp"],
            vec!["hs", "lhs"],
        ),

        Language::Erlang => LanguageServerConfig::lsp("erlang_ls", vec![], vec!["erl", "hrl"]),

        Language::FSharp => LanguageServerConfig::lsp(
            "fsautocomplete",
            vec!["--background-service-enabled"],
            vec!["fs", "fsi", "fsx"],
        ),

        Language::Lua => LanguageServerConfig::lsp("lua-language-server", vec![], vec!["lua"]),

        Language::R => LanguageServerConfig::lsp(
            "R",
            vec!["--slave", "-e", "languageserver::run()"],
            vec!["r", "R"],
        ),

        Language::Julia => LanguageServerConfig::lsp(
            "julia",
            vec![
                "--startup-file=no",
                "--history-file=no",
                "-e",
                "using LanguageServer; runserver()",
            ],
            vec!["jl"],
        ),

        Language::Dart => {
            LanguageServerConfig::lsp("dart", vec!["language-server"], vec!["dart"])
        }

        Language::Groovy => LanguageServerConfig::lsp(
            "groovy-language-server",
            vec![],
            vec!["groovy", "gradle"],
        ),

        Language::Zig => LanguageServerConfig::lsp("zls", vec![], vec!["zig"]),

        Language::YAML => {
            LanguageServerConfig::lsp("yaml-language-server", vec!["--stdio"], vec!["yaml", "yml"])
        }

        Language::TOML => {
            LanguageServerConfig::lsp("taplo", vec!["lsp", "stdio"], vec!["toml"])
        }

        // Markdown has no executable semantics to navigate; it is the
        // spec's worked example of a `supports_lsp = false` language, so
        // the SLS is skipped entirely rather than spawning `marksman`.
        Language::Markdown => LanguageServerConfig::plain_text(vec!["md", "markdown"]),

        _ => {
            return Err(anyhow::anyhow!(
                "Language server configuration not available for {:?}",
                language
            ));
        }
    };

    Ok(config)
}

/// Get the language for a file based on its extension
///
/// # Arguments
/// * `file_path` - Path to the file
///
/// # Returns
/// The detected language, or `None` if the extension is not recognized
pub fn detect_language(file_path: &str) -> Option<Language> {
    let extension = std::path::Path::new(file_path).extension()?.to_str()?;

    Language::from_extension(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_config() {
        let config = get_config(Language::Rust).unwrap();
        assert_eq!(config.command, "rust-analyzer");
        assert!(config.file_extensions.contains(&"rs"));
    }

    #[test]
    fn test_python_config() {
        let config = get_config(Language::Python).unwrap();
        assert_eq!(config.command, "pyright-langserver");
        assert!(config.file_extensions.contains(&"py"));
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("test.rs"), Some(Language::Rust));
        assert_eq!(detect_language("test.py"), Some(Language::Python));
        assert_eq!(detect_language("test.ts"), Some(Language::TypeScript));
        assert_eq!(detect_language("test.go"), Some(Language::Go));
        assert_eq!(detect_language("test.unknown"), None);
    }

    #[test]
    fn test_typescript_javascript_share_config() {
        let ts_config = get_config(Language::TypeScript).unwrap();
        let js_config = get_config(Language::JavaScript).unwrap();
        assert_eq!(ts_config.command, js_config.command);
    }
}
