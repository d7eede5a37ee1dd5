pub mod backup;
pub mod codex_mcp;
pub mod codex_provider;
pub mod tools;

pub use backup::{BackupInfo, BackupService};
pub use codex_mcp::{CodexMcpMerge, McpConfigureOutcome, McpRemoveOutcome};
pub use codex_provider::{
    AddProviderOutcome, ApiMode, CodexProviderService, DeleteProvidersOutcome,
    EditProviderOutcome, ProviderInput, ProviderListing, ProviderPatch, SwitchOutcome,
};
pub use tools::{
    check_tool, compare_versions, find_cli_tool, get_cli_tools, run_update_sweep, CliTool,
    NpmToolUpdater, ToolUpdater, UpdateSummary, VersionCheck, VersionStatus,
};
