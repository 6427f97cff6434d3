use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use serena_config::{
    create_config_tools, loader::ConfigLoader, ConfigService, Language, ProjectConfig, SerenaConfig,
};
use serena_core::{LanguageServer, ToolRegistry, ToolRegistryBuilder};
use serena_lsp::{create_lsp_tools, LanguageServerManager, LspClientAdapter};
use serena_mcp::SerenaMcpServer;
use serena_memory::{create_memory_tools, MemoryManager};
use serena_symbol::{create_symbol_tools, SymbolCache};
use serena_tools::ToolFactory;

/// Main application structure that manages the Serena lifecycle
pub struct App {
    /// MCP server instance (consumed when starting)
    mcp_server: Option<SerenaMcpServer>,

    /// LSP manager for language servers
    lsp_manager: Arc<LanguageServerManager>,

    /// Memory manager for project knowledge persistence
    memory_manager: Arc<MemoryManager>,

    /// Configuration service
    config_service: Arc<ConfigService>,

    /// Tool registry
    tool_registry: Arc<ToolRegistry>,

    /// Symbol read-result cache, shared across every project activation
    /// so that re-activating the same project doesn't start cold.
    symbol_cache: Arc<SymbolCache>,

    /// Application configuration
    config: Arc<RwLock<SerenaConfig>>,

    /// Active project configuration
    project_config: Arc<RwLock<Option<ProjectConfig>>>,

    /// Configuration loader
    config_loader: ConfigLoader,
}

impl App {
    // ==================== Accessors ====================
    // These make the stored managers accessible for external use

    /// Get a reference to the memory manager
    pub fn memory_manager(&self) -> &Arc<MemoryManager> {
        &self.memory_manager
    }

    /// Get a reference to the config service
    pub fn config_service(&self) -> &Arc<ConfigService> {
        &self.config_service
    }

    /// Get a reference to the config loader
    pub fn config_loader(&self) -> &ConfigLoader {
        &self.config_loader
    }

    /// Get a reference to the LSP manager
    pub fn lsp_manager(&self) -> &Arc<LanguageServerManager> {
        &self.lsp_manager
    }

    /// Get a reference to the tool registry
    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }
}

impl App {
    /// Create a new App instance
    pub async fn new(config_path: Option<PathBuf>, project_path: Option<PathBuf>) -> Result<Self> {
        info!("Initializing Serena application");

        // Initialize configuration loader
        let config_loader = ConfigLoader::new();

        // Load configuration
        let config = Self::load_config(&config_loader, config_path).await?;
        let config = Arc::new(RwLock::new(config));

        // Determine root path for LSP manager and tools
        let root_path = project_path
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        // Initialize managers
        debug!("Initializing managers with project root: {}", root_path.display());

        // LSP manager for language servers
        let lsp_manager = Arc::new(LanguageServerManager::new(root_path.clone()));

        // Memory manager for project knowledge persistence
        let memory_manager = Arc::new(
            MemoryManager::new(&root_path)
                .context("Failed to initialize memory manager")?
        );

        // Configuration service
        let config_service = Arc::new(ConfigService::new());

        // Symbol cache shared by every language activation for this project
        let symbol_cache = Arc::new(SymbolCache::new());

        // Build comprehensive tool registry
        debug!("Building tool registry with all tool factories");
        let tool_factory = ToolFactory::new(&root_path);

        let tool_registry = Arc::new(
            ToolRegistryBuilder::new()
                // Core tools: file and line-editor operations (9 tools)
                .add_tools(tool_factory.core_tools())
                // Memory tools (6 tools)
                .add_tools(create_memory_tools(Arc::clone(&memory_manager)))
                // Config tools (6 tools)
                .add_tools(create_config_tools(Arc::clone(&config_service)))
                // LSP management tools (4 tools)
                .add_tools(create_lsp_tools(Arc::clone(&lsp_manager)))
                // Note: Symbol tools (7) require an active LSP client and are added
                // dynamically when a project is activated with language support
                .build()
        );
        info!("Registered {} tools in registry", tool_registry.len());

        // Initialize MCP server with tool registry
        debug!("Initializing MCP server");
        let mcp_server = Some(SerenaMcpServer::new(
            (*tool_registry).clone(),
            Arc::clone(&config_service),
        ));

        // Load project if specified
        let project_config = if let Some(project_path) = project_path {
            info!("Loading project from: {}", project_path.display());
            let proj_config = Self::load_project_config(&project_path)?;
            Arc::new(RwLock::new(Some(proj_config)))
        } else {
            Arc::new(RwLock::new(None))
        };

        info!("Serena application initialized successfully");

        Ok(Self {
            mcp_server,
            lsp_manager,
            memory_manager,
            config_service,
            tool_registry,
            symbol_cache,
            config,
            project_config,
            config_loader,
        })
    }

    /// Load configuration from file or use defaults
    async fn load_config(
        loader: &ConfigLoader,
        config_path: Option<PathBuf>,
    ) -> Result<SerenaConfig> {
        if let Some(path) = config_path {
            info!("Loading configuration from: {}", path.display());
            loader
                .load_from_file(&path)
                .context("Failed to load configuration file")
        } else {
            info!("Loading configuration from default locations");
            loader.load().context("Failed to load configuration")
        }
    }

    /// Load project configuration from the centralized store (spec
    /// §4.8 step 2 / §4.9): `project.yml` lives under
    /// `~/.serena/projects/{id}/`, never inside the project root. If
    /// the centralized directory was deleted externally, regenerate
    /// `project.yml` from current defaults and persist it before
    /// proceeding.
    fn load_project_config(project_path: &PathBuf) -> Result<ProjectConfig> {
        let config_path = serena_config::project_dir(project_path).join("project.yml");

        if config_path.exists() {
            info!("Found centralized project config: {}", config_path.display());
            let content = std::fs::read_to_string(&config_path)?;
            let mut config: ProjectConfig = serde_yaml::from_str(&content)?;
            config.root = project_path.clone();
            Ok(config)
        } else {
            info!("No centralized project config found, regenerating defaults");
            let project_name = project_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unnamed")
                .to_string();

            let mut config = ProjectConfig::new(project_name, project_path.clone());

            // Try to detect languages
            if let Err(e) = config.detect_languages() {
                warn!("Failed to detect languages: {}", e);
            }

            Self::save_project_config(&config)?;
            Ok(config)
        }
    }

    /// Persist `project.yml` into `~/.serena/projects/{id}/`, the only
    /// location project state is ever written (spec §4.9: no in-project
    /// writes, atomic write-temp-then-rename).
    fn save_project_config(config: &ProjectConfig) -> Result<()> {
        let config_path = serena_config::project_dir(&config.root).join("project.yml");
        let yaml = serde_yaml::to_string(config).context("Failed to serialize project config")?;
        serena_config::atomic_write(&config_path, yaml.as_bytes())
            .context("Failed to write project.yml to centralized store")?;
        Ok(())
    }

    /// Set the operating mode
    pub fn set_mode(&mut self, mode: &str) -> Result<()> {
        info!("Setting mode to: {}", mode);
        self.config_service
            .switch_modes(vec![mode.to_string()])
            .context("Failed to switch mode")?;
        Ok(())
    }

    /// Set the context
    pub fn set_context(&mut self, context: &str) -> Result<()> {
        info!("Setting context to: {}", context);
        self.config_service
            .switch_context(context)
            .context("Failed to switch context")?;
        Ok(())
    }

    /// Run the MCP server using stdio transport
    pub async fn run_stdio(mut self) -> Result<()> {
        info!("Running MCP server on stdio transport");

        let server = self
            .mcp_server
            .take()
            .ok_or_else(|| anyhow::anyhow!("MCP server already consumed"))?;

        server.serve_stdio().await
    }

    /// Run the MCP server using HTTP transport
    pub async fn run_http(mut self, port: u16) -> Result<()> {
        use serena_web::{WebServer, WebServerConfig};
        use std::net::SocketAddr;

        info!("Running MCP server on HTTP transport (port {})", port);

        let server = self
            .mcp_server
            .take()
            .ok_or_else(|| anyhow::anyhow!("MCP server already consumed"))?;

        // Configure the web server
        let config = WebServerConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            enable_cors: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        };

        let web_server = WebServer::with_config(Arc::new(server), config);

        info!("Starting HTTP MCP server on port {}", port);
        web_server.serve().await
    }

    /// Run the MCP server using SSE transport
    pub async fn run_sse(mut self, port: u16) -> Result<()> {
        use serena_web::{WebServer, WebServerConfig};
        use std::net::SocketAddr;

        info!("Running MCP server on SSE transport (port {})", port);

        let server = self
            .mcp_server
            .take()
            .ok_or_else(|| anyhow::anyhow!("MCP server already consumed"))?;

        // Configure the web server (SSE uses the same web server infrastructure)
        let config = WebServerConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            enable_cors: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        };

        let web_server = WebServer::with_config(Arc::new(server), config);

        info!("Starting SSE MCP server on port {}", port);
        info!("SSE events available at http://0.0.0.0:{}/mcp/events", port);
        web_server.serve().await
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> SerenaConfig {
        self.config.read().await.clone()
    }

    /// Update the configuration
    pub async fn update_config(&self, config: SerenaConfig) -> Result<()> {
        let mut cfg = self.config.write().await;
        *cfg = config;
        Ok(())
    }

    /// Get the current project configuration
    pub async fn get_project_config(&self) -> Option<ProjectConfig> {
        self.project_config.read().await.clone()
    }

    /// Activate a project
    ///
    /// Only one project is active per session (spec §4.8): re-activation
    /// fully shuts down the previously active project's SLS(es) and
    /// symbol tools before standing up the new one.
    pub async fn activate_project(&self, project_path: PathBuf) -> Result<()> {
        if self.get_project_config().await.is_some() {
            info!("Deactivating previous project before activating a new one");
            self.deactivate_project().await?;
        }

        info!("Activating project: {}", project_path.display());

        let proj_config = Self::load_project_config(&project_path)?;

        // Keep ConfigService's project list/active-project tracking (used
        // by the list_projects/switch_modes/get_active_tools tools) in
        // sync with the project this App instance actually activates.
        if let Err(e) = self
            .config_service
            .activate_project(&project_path.to_string_lossy())
        {
            warn!("Failed to register project with config service: {}", e);
        }

        // Start LSP servers for detected languages and wire symbol tools
        for language in &proj_config.languages {
            match self.activate_language_support(&project_path, *language).await {
                Ok(tool_count) => {
                    info!(
                        "Activated {} with {} symbol tools",
                        language.display_name(),
                        tool_count
                    );
                }
                Err(e) => {
                    warn!(
                        "Failed to activate language support for {}: {}",
                        language.display_name(),
                        e
                    );
                }
            }
        }

        let mut project = self.project_config.write().await;
        *project = Some(proj_config);

        Ok(())
    }

    /// Activate language support for a specific language (spec §4.8 step
    /// 4): starts the language server if needed and registers the symbol
    /// tools dynamically, sharing one LSP client per language rather
    /// than spawning a second transport for the SLS adapter.
    async fn activate_language_support(
        &self,
        project_path: &PathBuf,
        language: Language,
    ) -> Result<usize> {
        let config = serena_lsp::get_config(language)?;
        if !config.supports_lsp {
            debug!(
                "{:?} has no LSP backend; skipping SLS entirely",
                language
            );
            return Ok(0);
        }

        info!("Activating language support for: {:?}", language);

        // Start (or reuse) the language server; the manager owns the one
        // transport and the adapter below shares it via `Arc`.
        self.lsp_manager.start_server(language).await?;
        let client = self
            .lsp_manager
            .get_server(language)
            .ok_or_else(|| anyhow::anyhow!("Failed to get LSP client for {:?}", language))?;

        let adapter = LspClientAdapter::new(client, language.display_name().to_string());

        // Wrap in Arc<RwLock<Box<dyn LanguageServer>>> as expected by symbol tools
        // Symbol tools expect tokio::sync::RwLock
        let lsp_client: Arc<tokio::sync::RwLock<Box<dyn LanguageServer>>> =
            Arc::new(tokio::sync::RwLock::new(Box::new(adapter)));

        // Create symbol tools with the LSP client, sharing this App's symbol cache
        let symbol_tools =
            create_symbol_tools(project_path.clone(), lsp_client, Arc::clone(&self.symbol_cache));

        // Register the symbol tools dynamically
        let tool_count = self.tool_registry.extend(symbol_tools);

        info!("Registered {} symbol tools for {:?}", tool_count, language);
        Ok(tool_count)
    }

    /// Deactivate the current project
    pub async fn deactivate_project(&self) -> Result<()> {
        info!("Deactivating current project");

        // Remove symbol tools (they have a common prefix pattern)
        let removed = self.tool_registry.remove_by_prefix("get_symbols_overview");
        let removed = removed + self.tool_registry.remove_by_prefix("find_symbol");
        let removed = removed + self.tool_registry.remove_by_prefix("get_symbol_body");
        let removed = removed + self.tool_registry.remove_by_prefix("find_referencing_symbols");
        let removed = removed + self.tool_registry.remove_by_prefix("replace_symbol_body");
        let removed = removed + self.tool_registry.remove_by_prefix("regex_replace");
        let removed = removed + self.tool_registry.remove_by_prefix("insert_after_symbol");
        let removed = removed + self.tool_registry.remove_by_prefix("insert_before_symbol");

        if removed > 0 {
            info!("Removed {} symbol tools", removed);
        }

        // The cache is keyed by relative_path and survives across
        // activations; the next activate_project re-populates it lazily
        // rather than needing an eager warm-up.

        // Stop all LSP servers
        self.lsp_manager.stop_all_servers().await;

        self.config_service.deactivate_project();

        let mut project = self.project_config.write().await;
        *project = None;

        Ok(())
    }

    /// Shutdown the application gracefully
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down Serena application");

        // Persist the active project's config to the centralized store
        // before tearing down, in case activation mutated it (e.g.
        // language auto-detection) since it was last saved.
        if let Some(proj_config) = self.get_project_config().await {
            if let Err(e) = Self::save_project_config(&proj_config) {
                warn!("Failed to save project config on shutdown: {}", e);
            }
        }

        // Shutdown all LSP servers
        self.lsp_manager.stop_all_servers().await;

        info!("Serena application shutdown complete");
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        debug!("App instance dropped");
    }
}
