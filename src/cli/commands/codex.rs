use clap::Subcommand;
use std::collections::HashMap;
use std::path::Path;

use crate::cli::i18n::texts;
use crate::cli::interactive::utils::{prompt_cancelled, prompt_secret};
use crate::cli::ui::{create_table, highlight, info, mask_secret, success, warning};
use crate::codex_config::{
    provider_id_from_name, read_codex_auth, read_codex_config, CodexPaths, CodexProvider, WireApi,
};
use crate::error::AppError;
use crate::mcp_catalog::{find_mcp_service, get_mcp_services, Platform};
use crate::services::{
    BackupService, CodexMcpMerge, CodexProviderService, McpConfigureOutcome, ProviderPatch,
};

#[derive(Subcommand)]
pub enum CodexCommand {
    /// Show the active provider, providers and MCP services
    Show,
    /// Configure the API: official login or custom providers (interactive)
    Api {
        /// Switch to the official login without prompting
        #[arg(long)]
        official: bool,
    },
    /// Manage model providers
    #[command(subcommand)]
    Provider(ProviderCommand),
    /// Manage MCP services
    #[command(subcommand)]
    Mcp(McpCommand),
    /// Back up the whole Codex directory now
    Backup,
    /// List existing backups
    Backups,
}

#[derive(Subcommand)]
pub enum ProviderCommand {
    /// List providers
    List,
    /// Add a provider
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// API base URL
        #[arg(long)]
        base_url: String,
        /// Provider ID (derived from the name when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Wire protocol: responses or chat
        #[arg(long, default_value = "responses")]
        wire_api: WireApi,
        /// API key (prompted when omitted)
        #[arg(long)]
        api_key: Option<String>,
        /// Make it the default provider
        #[arg(long)]
        default: bool,
    },
    /// Edit a provider
    Edit {
        /// Provider ID to edit
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        wire_api: Option<WireApi>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Delete providers
    Delete {
        /// Provider IDs to delete
        #[arg(required = true)]
        ids: Vec<String>,
        /// Skip confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Switch the active provider
    Switch {
        /// Provider ID to switch to
        id: String,
    },
    /// Switch to the official login (keeps providers)
    Official,
}

#[derive(Subcommand)]
pub enum McpCommand {
    /// List available MCP services and whether they are configured
    List,
    /// Add or update MCP services (existing services are never removed)
    Add {
        /// MCP service IDs from the catalog
        #[arg(required = true)]
        ids: Vec<String>,
        /// API key for a service, as ID=KEY (e.g. exa=xxx)
        #[arg(long = "key", value_name = "ID=KEY")]
        keys: Vec<String>,
    },
    /// Remove MCP services
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Skip confirmation
        #[arg(long, short)]
        yes: bool,
    },
}

pub fn execute(cmd: CodexCommand, paths: &CodexPaths) -> Result<(), AppError> {
    match cmd {
        CodexCommand::Show => show_config(paths),
        CodexCommand::Api { official } => {
            if official {
                switch_official(paths)
            } else {
                crate::cli::interactive::codex::configure_api_interactive(paths)
            }
        }
        CodexCommand::Provider(cmd) => execute_provider(cmd, paths),
        CodexCommand::Mcp(cmd) => execute_mcp(cmd, paths),
        CodexCommand::Backup => backup_now(paths),
        CodexCommand::Backups => list_backups(paths),
    }
}

fn execute_provider(cmd: ProviderCommand, paths: &CodexPaths) -> Result<(), AppError> {
    match cmd {
        ProviderCommand::List => list_providers(paths),
        ProviderCommand::Add {
            name,
            base_url,
            id,
            wire_api,
            api_key,
            default,
        } => {
            let id = id.unwrap_or_else(|| provider_id_from_name(&name));
            let api_key = match api_key {
                Some(key) => key,
                None => prompt_secret(texts::prompt_api_key(), None)?.unwrap_or_default(),
            };
            let provider = CodexProvider::new(id, name, base_url, wire_api);
            let outcome =
                CodexProviderService::add_provider_to_existing(paths, provider, &api_key, default)?;
            println!("{}", success(&texts::provider_added(&outcome.added_provider.id)));
            print_backup_message(outcome.backup_path.as_deref());
            Ok(())
        }
        ProviderCommand::Edit {
            id,
            name,
            base_url,
            wire_api,
            api_key,
        } => {
            let patch = ProviderPatch {
                name,
                base_url,
                wire_api,
                api_key,
            };
            if patch.is_empty() {
                println!("{}", info(texts::nothing_to_change()));
                return Ok(());
            }
            let outcome = CodexProviderService::edit_existing_provider(paths, &id, patch)?;
            println!("{}", success(&texts::provider_updated(&outcome.updated_provider.id)));
            print_backup_message(outcome.backup_path.as_deref());
            Ok(())
        }
        ProviderCommand::Delete { ids, yes } => {
            if !yes && !confirm(&texts::confirm_delete_providers(&ids.join(", ")))? {
                println!("{}", info(texts::cancelled()));
                return Ok(());
            }
            delete_providers(paths, &ids)
        }
        ProviderCommand::Switch { id } => {
            let outcome = CodexProviderService::switch_codex_provider(paths, &id)?;
            println!("{}", success(&texts::switched_to_provider(&id)));
            print_backup_message(outcome.backup_path.as_deref());
            Ok(())
        }
        ProviderCommand::Official => switch_official(paths),
    }
}

fn execute_mcp(cmd: McpCommand, paths: &CodexPaths) -> Result<(), AppError> {
    match cmd {
        McpCommand::List => list_mcp_catalog(paths),
        McpCommand::Add { ids, keys } => {
            let keys = parse_key_args(&keys)?;
            let outcome = CodexMcpMerge::configure_codex_mcp(
                paths,
                &ids,
                Platform::current(),
                |entry, exists| {
                    if let Some(key) = keys.get(entry.id) {
                        return Ok(Some(key.clone()));
                    }
                    let env = entry.api_key_env.unwrap_or_default();
                    let help = exists.then(texts::keep_current_hint);
                    prompt_secret(&texts::mcp_key_prompt(entry.name, env), help)
                },
            )?;
            print_mcp_outcome(&outcome);
            Ok(())
        }
        McpCommand::Remove { ids, yes } => {
            if !yes && !confirm(&texts::confirm_remove_mcp(&ids.join(", ")))? {
                println!("{}", info(texts::cancelled()));
                return Ok(());
            }
            remove_mcp(paths, &ids)
        }
    }
}

fn parse_key_args(raw: &[String]) -> Result<HashMap<String, String>, AppError> {
    raw.iter()
        .map(|pair| {
            let (id, key) = pair.split_once('=').ok_or_else(|| {
                AppError::InvalidInput(format!("--key expects ID=KEY, got '{pair}'"))
            })?;
            if find_mcp_service(id.trim()).is_none() {
                return Err(AppError::McpServiceNotFound(id.trim().to_string()));
            }
            Ok((id.trim().to_string(), key.trim().to_string()))
        })
        .collect()
}

fn confirm(message: &str) -> Result<bool, AppError> {
    inquire::Confirm::new(message)
        .with_default(false)
        .prompt()
        .map_err(prompt_cancelled)
}

pub(crate) fn print_backup_message(path: Option<&Path>) {
    let message = BackupService::get_backup_message(path);
    if !message.is_empty() {
        println!("{}", info(&message));
    }
}

pub(crate) fn print_mcp_outcome(outcome: &McpConfigureOutcome) {
    if !outcome.added.is_empty() {
        println!("{}", success(&texts::mcp_added(&outcome.added.join(", "))));
    }
    if !outcome.updated.is_empty() {
        println!("{}", success(&texts::mcp_updated(&outcome.updated.join(", "))));
    }
    if !outcome.skipped.is_empty() {
        println!("{}", warning(&texts::mcp_skipped(&outcome.skipped.join(", "))));
    }
    if !outcome.changed() {
        println!("{}", info(texts::nothing_to_change()));
    }
    print_backup_message(outcome.backup_path.as_deref());
}

pub(crate) fn show_config(paths: &CodexPaths) -> Result<(), AppError> {
    let config = read_codex_config(paths)?;

    println!("\n{}", highlight(texts::codex_config_title()));
    println!("{}", "═".repeat(60));
    println!(
        "  {}: {}",
        texts::config_file_label(),
        paths.config_path().display()
    );
    let active = match config.active_provider() {
        Some(id) => highlight(id),
        None => texts::official_login_active(config.model_provider.as_deref()),
    };
    println!("  {}: {}", texts::active_provider_label(), active);
    println!(
        "  {}: {}",
        texts::model_label(),
        config.model.as_deref().unwrap_or(texts::none())
    );

    println!("\n{}", highlight(texts::providers_label()));
    print_provider_table(paths)?;

    println!("\n{}", highlight(texts::mcp_services_label()));
    if config.mcp_services.is_empty() {
        println!("{}", info(texts::no_mcp_services()));
    } else {
        let mut table = create_table();
        table.set_header(vec!["ID", texts::header_command()]);
        for service in &config.mcp_services {
            let mut command = vec![service.command.clone()];
            command.extend(service.args.clone().unwrap_or_default());
            table.add_row(vec![service.id.clone(), command.join(" ")]);
        }
        println!("{}", table);
    }
    Ok(())
}

pub(crate) fn print_provider_table(paths: &CodexPaths) -> Result<(), AppError> {
    let listing = CodexProviderService::list_codex_providers(paths)?;
    if listing.providers.is_empty() {
        println!("{}", info(texts::no_providers()));
        return Ok(());
    }

    let active = (!listing.commented)
        .then_some(listing.model_provider.as_deref())
        .flatten();
    let auth = read_codex_auth(paths)?;
    let mut table = create_table();
    table.set_header(vec![
        "",
        "ID",
        texts::header_name(),
        "Base URL",
        "wire_api",
        "env_key",
        "API Key",
    ]);
    for provider in &listing.providers {
        let marker = if active == Some(provider.id.as_str()) { "✓" } else { "" };
        let key = auth
            .get(&provider.env_key)
            .and_then(|v| v.as_str())
            .map(mask_secret)
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            marker.to_string(),
            provider.id.clone(),
            provider.name.clone(),
            provider.base_url.clone(),
            provider.wire_api.to_string(),
            provider.env_key.clone(),
            key,
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn list_providers(paths: &CodexPaths) -> Result<(), AppError> {
    print_provider_table(paths)?;
    let listing = CodexProviderService::list_codex_providers(paths)?;
    let current = if listing.commented {
        texts::official_login_active(listing.model_provider.as_deref())
    } else {
        listing
            .model_provider
            .unwrap_or_else(|| texts::none().to_string())
    };
    println!("{} {}: {}", info("→"), texts::active_provider_label(), highlight(&current));
    Ok(())
}

pub(crate) fn delete_providers(paths: &CodexPaths, ids: &[String]) -> Result<(), AppError> {
    let outcome = CodexProviderService::delete_providers(paths, ids)?;
    println!("{}", success(&texts::providers_deleted(&outcome.deleted.join(", "))));
    match outcome.new_default_provider.as_deref() {
        Some(id) => println!("{}", info(&texts::new_default_provider(id))),
        None => {
            if read_codex_config(paths)?.model_provider.is_none() {
                println!("{}", info(texts::default_provider_cleared()));
            }
        }
    }
    print_backup_message(outcome.backup_path.as_deref());
    Ok(())
}

pub(crate) fn switch_official(paths: &CodexPaths) -> Result<(), AppError> {
    let outcome = CodexProviderService::switch_to_official_login(paths)?;
    println!("{}", success(texts::switched_to_official()));
    print_backup_message(outcome.backup_path.as_deref());
    Ok(())
}

pub(crate) fn remove_mcp(paths: &CodexPaths, ids: &[String]) -> Result<(), AppError> {
    let outcome = CodexMcpMerge::remove_codex_mcp_services(paths, ids)?;
    println!("{}", success(&texts::mcp_removed(&outcome.removed.join(", "))));
    print_backup_message(outcome.backup_path.as_deref());
    Ok(())
}

fn list_mcp_catalog(paths: &CodexPaths) -> Result<(), AppError> {
    let config = read_codex_config(paths)?;
    let mut table = create_table();
    table.set_header(vec![
        "ID",
        texts::header_name(),
        texts::header_description(),
        texts::header_status(),
    ]);
    for entry in get_mcp_services() {
        let status = if config.find_mcp_service(entry.id).is_some() {
            texts::mcp_configured()
        } else {
            ""
        };
        table.add_row(vec![entry.id, entry.name, entry.description(), status]);
    }
    println!("{}", table);
    Ok(())
}

pub(crate) fn backup_now(paths: &CodexPaths) -> Result<(), AppError> {
    match BackupService::backup_codex_complete(paths)? {
        Some(path) => print_backup_message(Some(&path)),
        None => println!("{}", info(texts::backup_skipped_missing_dir())),
    }
    Ok(())
}

pub(crate) fn list_backups(paths: &CodexPaths) -> Result<(), AppError> {
    let backups = BackupService::list_codex_backups(paths)?;
    if backups.is_empty() {
        println!("{}", info(texts::no_backups()));
        return Ok(());
    }
    let mut table = create_table();
    table.set_header(vec![texts::header_time(), texts::header_path()]);
    for backup in &backups {
        table.add_row(vec![backup.timestamp.clone(), backup.path.display().to_string()]);
    }
    println!("{}", table);
    Ok(())
}
