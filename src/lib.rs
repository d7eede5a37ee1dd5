// Core modules
mod claude_settings;
mod codex_config;
mod config;
mod error;
mod mcp_catalog;
mod services;
mod settings;

// CLI module
pub mod cli;

// Public exports
pub use claude_settings::{
    backup_claude_settings, clear_claude_api, configure_claude_api, get_claude_settings_path,
    ClaudeAuthKind,
};
pub use codex_config::{
    env_key_for, parse_codex_config, provider_id_from_name, read_codex_auth, read_codex_config,
    render_codex_config, update_codex_auth, write_codex_auth, write_codex_config, CodexConfig,
    CodexMcpService, CodexPaths, CodexProvider, WireApi, LEGACY_MCP_MARKER, MANAGED_MARKER,
    OPENAI_API_KEY,
};
pub use config::{get_claude_config_dir, get_home_dir};
pub use error::AppError;
pub use mcp_catalog::{
    find_mcp_service, get_mcp_command, get_mcp_services, platform_command, McpCatalogEntry,
    Platform,
};
pub use services::{
    check_tool, compare_versions, find_cli_tool, get_cli_tools, run_update_sweep,
    AddProviderOutcome, ApiMode, BackupInfo, BackupService, CliTool, CodexMcpMerge,
    CodexProviderService, DeleteProvidersOutcome, EditProviderOutcome, McpConfigureOutcome,
    McpRemoveOutcome, NpmToolUpdater, ProviderInput, ProviderListing, ProviderPatch,
    SwitchOutcome, ToolUpdater, UpdateSummary, VersionCheck, VersionStatus,
};
pub use settings::{get_settings, update_settings, CodeToolType, ZcfSettings};
