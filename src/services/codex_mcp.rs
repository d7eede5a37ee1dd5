use std::path::PathBuf;

use crate::codex_config::{read_codex_config, write_codex_config, CodexMcpService, CodexPaths};
use crate::error::AppError;
use crate::mcp_catalog::{find_mcp_service, platform_command, McpCatalogEntry, Platform};
use crate::services::backup::BackupService;

#[derive(Debug, Clone, Default)]
pub struct McpConfigureOutcome {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    /// 需要 API key 但未提供，未写入
    pub skipped: Vec<String>,
    pub backup_path: Option<PathBuf>,
}

impl McpConfigureOutcome {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct McpRemoveOutcome {
    pub removed: Vec<String>,
    pub backup_path: Option<PathBuf>,
}

/// MCP 服务合并：只新增或更新所选服务，从不因「未选中」而删除已有条目。
///
/// MCP 的 API key 直接写入服务的 `env`（子进程启动环境），不会进入
/// `auth.json`；后者只保存供应商的出站鉴权 key。
pub struct CodexMcpMerge;

impl CodexMcpMerge {
    /// `key_source(entry, exists)` 返回用户输入的 key；`None` 或空串表示未提供
    pub fn configure_codex_mcp<F>(
        paths: &CodexPaths,
        selection: &[String],
        platform: Platform,
        mut key_source: F,
    ) -> Result<McpConfigureOutcome, AppError>
    where
        F: FnMut(&McpCatalogEntry, bool) -> Result<Option<String>, AppError>,
    {
        let mut config = read_codex_config(paths)?;

        let mut entries: Vec<&'static McpCatalogEntry> = Vec::new();
        for id in selection {
            let entry =
                find_mcp_service(id).ok_or_else(|| AppError::McpServiceNotFound(id.clone()))?;
            if !entries.iter().any(|e| e.id == entry.id) {
                entries.push(entry);
            }
        }

        let mut outcome = McpConfigureOutcome::default();
        let mut pending: Vec<CodexMcpService> = Vec::new();

        for entry in entries {
            let existing = config.find_mcp_service(entry.id).cloned();
            let api_key = if entry.requires_api_key {
                key_source(entry, existing.is_some())?
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
            } else {
                None
            };

            match existing {
                Some(service) => {
                    if let Some(updated) = update_existing(service, entry, api_key, platform) {
                        outcome.updated.push(entry.id.to_string());
                        pending.push(updated);
                    }
                }
                None => {
                    if entry.requires_api_key && api_key.is_none() {
                        log::warn!("MCP 服务 {} 需要 API key，未提供，已跳过", entry.id);
                        outcome.skipped.push(entry.id.to_string());
                        continue;
                    }
                    outcome.added.push(entry.id.to_string());
                    pending.push(build_service(entry, api_key, platform));
                }
            }
        }

        if !outcome.changed() {
            return Ok(outcome);
        }

        outcome.backup_path = BackupService::backup_codex_complete(paths)?;
        for service in pending {
            config.upsert_mcp_service(service);
        }
        write_codex_config(paths, &config)?;

        log::info!(
            "MCP 配置完成：新增 {:?}，更新 {:?}，跳过 {:?}",
            outcome.added,
            outcome.updated,
            outcome.skipped
        );
        Ok(outcome)
    }

    /// 显式删除 MCP 服务
    pub fn remove_codex_mcp_services(
        paths: &CodexPaths,
        ids: &[String],
    ) -> Result<McpRemoveOutcome, AppError> {
        if ids.is_empty() {
            return Err(AppError::InvalidInput("未选择要删除的 MCP 服务".into()));
        }
        let mut config = read_codex_config(paths)?;
        if let Some(missing) = ids.iter().find(|id| config.find_mcp_service(id).is_none()) {
            return Err(AppError::McpServiceNotFound(missing.clone()));
        }

        let backup_path = BackupService::backup_codex_complete(paths)?;
        config.mcp_services.retain(|s| !ids.contains(&s.id));
        write_codex_config(paths, &config)?;

        Ok(McpRemoveOutcome {
            removed: ids.to_vec(),
            backup_path,
        })
    }
}

fn build_service(
    entry: &McpCatalogEntry,
    api_key: Option<String>,
    platform: Platform,
) -> CodexMcpService {
    let args: Vec<String> = entry.args.iter().map(|a| a.to_string()).collect();
    let (command, args) = platform_command(platform, entry.command, &args);

    let mut env = entry.default_env();
    if let (Some(var), Some(key)) = (entry.api_key_env, api_key) {
        env.get_or_insert_with(Default::default)
            .insert(var.to_string(), key);
    }

    CodexMcpService {
        id: entry.id.to_string(),
        command,
        args: Some(args),
        env,
        startup_timeout_ms: entry.startup_timeout_ms,
        extra: toml::Table::new(),
    }
}

/// 已存在的服务只在有新值时才改动；返回 `None` 表示无需写入
fn update_existing(
    mut service: CodexMcpService,
    entry: &McpCatalogEntry,
    api_key: Option<String>,
    platform: Platform,
) -> Option<CodexMcpService> {
    let original = service.clone();

    if let (Some(var), Some(key)) = (entry.api_key_env, api_key) {
        service
            .env
            .get_or_insert_with(Default::default)
            .insert(var.to_string(), key);
    }

    if platform.is_windows() && service.command == "npx" {
        let args = service.args.clone().unwrap_or_default();
        let (command, args) = platform_command(platform, &service.command, &args);
        service.command = command;
        service.args = Some(args);
    }

    (service != original).then_some(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp_catalog::find_mcp_service;

    #[test]
    fn build_service_injects_key_into_env() {
        let entry = find_mcp_service("exa").expect("exa entry");
        let service = build_service(entry, Some("secret".into()), Platform::Linux);
        assert_eq!(service.command, "npx");
        assert_eq!(
            service.env.as_ref().and_then(|e| e.get("EXA_API_KEY")).map(String::as_str),
            Some("secret")
        );
    }

    #[test]
    fn build_service_keeps_catalog_env_defaults() {
        let entry = find_mcp_service("open-websearch").expect("entry");
        let service = build_service(entry, None, Platform::Windows);
        assert_eq!(service.command, "cmd");
        assert_eq!(service.args.as_ref().map(|a| a[0].as_str()), Some("/c"));
        assert_eq!(
            service.env.as_ref().and_then(|e| e.get("MODE")).map(String::as_str),
            Some("stdio")
        );
    }

    #[test]
    fn existing_service_without_new_values_is_untouched() {
        let entry = find_mcp_service("context7").expect("entry");
        let service = CodexMcpService {
            id: "context7".into(),
            command: "npx".into(),
            args: Some(vec!["-y".into(), "custom".into()]),
            env: None,
            startup_timeout_ms: Some(99),
            extra: toml::Table::new(),
        };
        assert!(update_existing(service, entry, None, Platform::MacOs).is_none());
    }
}
