use std::fmt;

use crate::cli::commands::codex::{
    delete_providers, print_backup_message, print_mcp_outcome, print_provider_table, remove_mcp,
    switch_official,
};
use crate::cli::i18n::texts;
use crate::cli::ui::{info, success};
use crate::codex_config::{
    provider_id_from_name, read_codex_config, CodexPaths, CodexProvider, WireApi,
};
use crate::error::AppError;
use crate::mcp_catalog::{get_mcp_services, McpCatalogEntry, Platform};
use crate::services::{
    ApiMode, CodexMcpMerge, CodexProviderService, ProviderInput, ProviderPatch,
};

use super::utils::{
    prompt_confirm, prompt_multi_select, prompt_required, prompt_secret, prompt_select,
};

/// 菜单中的供应商选项；`id == None` 表示官方登录
struct ProviderChoice {
    id: Option<String>,
    label: String,
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn provider_choices(providers: &[CodexProvider], active: Option<&str>) -> Vec<ProviderChoice> {
    providers
        .iter()
        .map(|p| {
            let marker = if active == Some(p.id.as_str()) { "* " } else { "  " };
            ProviderChoice {
                id: Some(p.id.clone()),
                label: format!("{marker}{} ({}) - {}", p.name, p.id, p.base_url),
            }
        })
        .collect()
}

struct McpChoice(&'static McpCatalogEntry);

impl fmt::Display for McpChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.0.name, self.0.description())
    }
}

fn prompt_wire_api(default: WireApi) -> Result<Option<WireApi>, AppError> {
    let mut options = vec![WireApi::Responses, WireApi::Chat];
    if default == WireApi::Chat {
        options.reverse();
    }
    prompt_select(texts::prompt_wire_api(), options)
}

/// 交互式采集一个新供应商；Esc 返回 `None`
fn prompt_new_provider() -> Result<Option<ProviderInput>, AppError> {
    let name = prompt_required(texts::prompt_provider_name(), None)?;
    let id = prompt_required(texts::prompt_provider_id(), Some(&provider_id_from_name(&name)))?;
    let base_url = prompt_required(texts::prompt_base_url(), None)?;
    let Some(wire_api) = prompt_wire_api(WireApi::Responses)? else {
        return Ok(None);
    };
    let api_key = prompt_secret(texts::prompt_api_key(), None)?.unwrap_or_default();

    Ok(Some(ProviderInput {
        provider: CodexProvider::new(id, name, base_url, wire_api),
        api_key,
    }))
}

pub fn configure_api_interactive(paths: &CodexPaths) -> Result<(), AppError> {
    let options = vec![texts::official_login_choice(), texts::api_mode_custom()];
    let Some(choice) = prompt_select(texts::api_mode_prompt(), options)? else {
        return Ok(());
    };
    if choice == texts::official_login_choice() {
        return switch_official(paths);
    }

    let mut inputs: Vec<ProviderInput> = Vec::new();
    loop {
        let Some(input) = prompt_new_provider()? else {
            break;
        };
        inputs.retain(|i| i.provider.id != input.provider.id);
        inputs.push(input);
        if prompt_confirm(texts::add_another_provider(), false)? != Some(true) {
            break;
        }
    }
    if inputs.is_empty() {
        println!("{}", info(texts::cancelled()));
        return Ok(());
    }

    let default_provider = if inputs.len() == 1 {
        inputs[0].provider.id.clone()
    } else {
        let ids: Vec<String> = inputs.iter().map(|i| i.provider.id.clone()).collect();
        let Some(id) = prompt_select(texts::select_default_provider(), ids)? else {
            return Ok(());
        };
        id
    };

    let outcome = CodexProviderService::configure_codex_api(
        paths,
        ApiMode::Custom {
            providers: inputs,
            default_provider: default_provider.clone(),
        },
    )?;
    println!("{}", success(&texts::codex_api_configured(&default_provider)));
    print_backup_message(outcome.backup_path.as_deref());
    Ok(())
}

pub fn switch_provider_interactive(paths: &CodexPaths) -> Result<(), AppError> {
    let listing = CodexProviderService::list_codex_providers(paths)?;
    let active = (!listing.commented)
        .then_some(listing.model_provider.as_deref())
        .flatten();

    let mut choices = provider_choices(&listing.providers, active);
    choices.push(ProviderChoice {
        id: None,
        label: texts::official_login_choice().to_string(),
    });

    let Some(choice) = prompt_select(texts::select_provider(), choices)? else {
        return Ok(());
    };
    match choice.id {
        Some(id) => {
            let outcome = CodexProviderService::switch_codex_provider(paths, &id)?;
            println!("{}", success(&texts::switched_to_provider(&id)));
            print_backup_message(outcome.backup_path.as_deref());
            Ok(())
        }
        None => switch_official(paths),
    }
}

pub fn add_provider_interactive(paths: &CodexPaths) -> Result<(), AppError> {
    let Some(input) = prompt_new_provider()? else {
        return Ok(());
    };
    let set_as_default = prompt_confirm(texts::confirm_set_default(), true)?.unwrap_or(false);

    let outcome = CodexProviderService::add_provider_to_existing(
        paths,
        input.provider,
        &input.api_key,
        set_as_default,
    )?;
    println!("{}", success(&texts::provider_added(&outcome.added_provider.id)));
    print_backup_message(outcome.backup_path.as_deref());
    Ok(())
}

pub fn edit_provider_interactive(paths: &CodexPaths) -> Result<(), AppError> {
    let listing = CodexProviderService::list_codex_providers(paths)?;
    if listing.providers.is_empty() {
        println!("{}", info(texts::no_providers()));
        return Ok(());
    }

    let choices = provider_choices(&listing.providers, listing.model_provider.as_deref());
    let Some(ProviderChoice { id: Some(id), .. }) =
        prompt_select(texts::select_provider(), choices)?
    else {
        return Ok(());
    };
    let Some(current) = listing.providers.iter().find(|p| p.id == id) else {
        return Err(AppError::ProviderNotFound(id));
    };

    let name = prompt_required(texts::prompt_provider_name(), Some(&current.name))?;
    let base_url = prompt_required(texts::prompt_base_url(), Some(&current.base_url))?;
    let Some(wire_api) = prompt_wire_api(current.wire_api)? else {
        return Ok(());
    };
    let api_key = prompt_secret(texts::prompt_api_key(), Some(texts::keep_current_hint()))?;

    let patch = ProviderPatch {
        name: (name != current.name).then_some(name),
        base_url: (base_url != current.base_url).then_some(base_url),
        wire_api: (wire_api != current.wire_api).then_some(wire_api),
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

pub fn delete_providers_interactive(paths: &CodexPaths) -> Result<(), AppError> {
    print_provider_table(paths)?;
    let listing = CodexProviderService::list_codex_providers(paths)?;
    if listing.providers.is_empty() {
        return Ok(());
    }

    let ids: Vec<String> = listing.providers.iter().map(|p| p.id.clone()).collect();
    let Some(selected) = prompt_multi_select(texts::select_providers_to_delete(), ids, &[])? else {
        return Ok(());
    };
    if selected.is_empty() {
        return Ok(());
    }
    if prompt_confirm(&texts::confirm_delete_providers(&selected.join(", ")), false)?
        != Some(true)
    {
        println!("{}", info(texts::cancelled()));
        return Ok(());
    }
    delete_providers(paths, &selected)
}

pub fn configure_mcp_interactive(paths: &CodexPaths) -> Result<(), AppError> {
    let config = read_codex_config(paths)?;
    let entries: Vec<McpChoice> = get_mcp_services().iter().map(McpChoice).collect();
    let defaults: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| config.find_mcp_service(e.0.id).is_some())
        .map(|(i, _)| i)
        .collect();

    let Some(selected) = prompt_multi_select(texts::select_mcp_services(), entries, &defaults)?
    else {
        return Ok(());
    };
    let ids: Vec<String> = selected.iter().map(|c| c.0.id.to_string()).collect();
    if ids.is_empty() {
        println!("{}", info(texts::nothing_to_change()));
        return Ok(());
    }

    let outcome =
        CodexMcpMerge::configure_codex_mcp(paths, &ids, Platform::current(), |entry, exists| {
            let env = entry.api_key_env.unwrap_or_default();
            let help = exists.then(texts::keep_current_hint);
            prompt_secret(&texts::mcp_key_prompt(entry.name, env), help)
        })?;
    print_mcp_outcome(&outcome);
    Ok(())
}

pub fn remove_mcp_interactive(paths: &CodexPaths) -> Result<(), AppError> {
    let config = read_codex_config(paths)?;
    if config.mcp_services.is_empty() {
        println!("{}", info(texts::no_mcp_services()));
        return Ok(());
    }

    let ids: Vec<String> = config.mcp_services.iter().map(|s| s.id.clone()).collect();
    let Some(selected) = prompt_multi_select(texts::select_mcp_to_remove(), ids, &[])? else {
        return Ok(());
    };
    if selected.is_empty() {
        return Ok(());
    }
    if prompt_confirm(&texts::confirm_remove_mcp(&selected.join(", ")), false)? != Some(true) {
        println!("{}", info(texts::cancelled()));
        return Ok(());
    }
    remove_mcp(paths, &selected)
}

