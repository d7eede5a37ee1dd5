use std::path::PathBuf;

use crate::codex_config::{
    env_key_for, read_codex_auth, read_codex_config, update_codex_auth, write_codex_config,
    CodexConfig, CodexPaths, CodexProvider, WireApi, OPENAI_API_KEY,
};
use crate::error::AppError;
use crate::services::backup::BackupService;

/// 编辑供应商时可选更新的字段
#[derive(Debug, Clone, Default)]
pub struct ProviderPatch {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub wire_api: Option<WireApi>,
    pub api_key: Option<String>,
}

impl ProviderPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.base_url.is_none()
            && self.wire_api.is_none()
            && self.api_key.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AddProviderOutcome {
    pub added_provider: CodexProvider,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct EditProviderOutcome {
    pub updated_provider: CodexProvider,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DeleteProvidersOutcome {
    pub deleted: Vec<String>,
    /// 删除了当前供应商时重新选出的默认供应商
    pub new_default_provider: Option<String>,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SwitchOutcome {
    pub active: Option<String>,
    pub backup_path: Option<PathBuf>,
}

/// 一个待写入的供应商及其 API key
#[derive(Debug, Clone)]
pub struct ProviderInput {
    pub provider: CodexProvider,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub enum ApiMode {
    /// 使用 Codex 官方登录：注释掉 `model_provider`
    Official,
    Custom {
        providers: Vec<ProviderInput>,
        default_provider: String,
    },
}

#[derive(Debug, Clone)]
pub struct ProviderListing {
    pub providers: Vec<CodexProvider>,
    pub model_provider: Option<String>,
    pub commented: bool,
}

/// Codex 供应商的增删改与切换。每个操作独立完成「读取 -> 校验 -> 备份 -> 写入」。
pub struct CodexProviderService;

impl CodexProviderService {
    pub fn list_codex_providers(paths: &CodexPaths) -> Result<ProviderListing, AppError> {
        let config = read_codex_config(paths)?;
        Ok(ProviderListing {
            commented: config.model_provider_commented == Some(true),
            model_provider: config.model_provider,
            providers: config.providers,
        })
    }

    pub fn add_provider_to_existing(
        paths: &CodexPaths,
        mut provider: CodexProvider,
        api_key: &str,
        set_as_default: bool,
    ) -> Result<AddProviderOutcome, AppError> {
        fill_env_key(&mut provider);
        validate_provider(&provider)?;
        let mut config = read_codex_config(paths)?;
        if config.find_provider(&provider.id).is_some() {
            return Err(AppError::ProviderExists(provider.id));
        }

        let backup_path = BackupService::backup_codex_complete(paths)?;

        config.providers.push(provider.clone());
        config.managed = true;
        if set_as_default || config.model_provider.is_none() {
            config.set_active_provider(Some(provider.id.clone()));
        }

        write_api_keys(paths, &config, &[(&provider, api_key)])?;
        write_codex_config(paths, &config)?;

        log::info!("已添加 Codex 供应商 {}", provider.id);
        Ok(AddProviderOutcome {
            added_provider: provider,
            backup_path,
        })
    }

    pub fn edit_existing_provider(
        paths: &CodexPaths,
        id: &str,
        patch: ProviderPatch,
    ) -> Result<EditProviderOutcome, AppError> {
        let mut config = read_codex_config(paths)?;
        let Some(existing) = config.find_provider(id) else {
            return Err(AppError::ProviderNotFound(id.to_string()));
        };

        let mut updated = existing.clone();
        if let Some(name) = patch.name.filter(|n| !n.trim().is_empty()) {
            updated.name = name.trim().to_string();
        }
        if let Some(base_url) = patch.base_url.filter(|u| !u.trim().is_empty()) {
            updated.base_url = base_url.trim().to_string();
        }
        if let Some(wire_api) = patch.wire_api {
            updated.wire_api = wire_api;
        }
        let api_key = patch.api_key.filter(|k| !k.trim().is_empty());
        // 手写的供应商可能没有 env_key；只有写入 key 时才需要
        if api_key.is_some() {
            fill_env_key(&mut updated);
        }
        validate_provider(&updated)?;

        let backup_path = BackupService::backup_codex_complete(paths)?;

        config.upsert_provider(updated.clone());
        config.managed = true;
        if let Some(api_key) = api_key.as_deref() {
            write_api_keys(paths, &config, &[(&updated, api_key)])?;
        }
        write_codex_config(paths, &config)?;

        log::info!("已更新 Codex 供应商 {id}");
        Ok(EditProviderOutcome {
            updated_provider: updated,
            backup_path,
        })
    }

    pub fn delete_providers(
        paths: &CodexPaths,
        ids: &[String],
    ) -> Result<DeleteProvidersOutcome, AppError> {
        if ids.is_empty() {
            return Err(AppError::InvalidInput("未选择要删除的供应商".into()));
        }
        let mut config = read_codex_config(paths)?;
        if let Some(missing) = ids.iter().find(|id| config.find_provider(id).is_none()) {
            return Err(AppError::ProviderNotFound(missing.clone()));
        }

        let backup_path = BackupService::backup_codex_complete(paths)?;

        config.providers.retain(|p| !ids.contains(&p.id));
        let mut new_default_provider = None;
        let active_deleted = config
            .model_provider
            .as_ref()
            .is_some_and(|current| ids.contains(current));
        if active_deleted {
            let replacement = config.providers.first().map(|p| p.id.clone());
            if replacement.is_some() {
                // 保留「官方登录」的注释状态，只替换 ID
                config.model_provider = replacement.clone();
            } else {
                config.set_active_provider(None);
            }
            new_default_provider = replacement;
        }
        write_codex_config(paths, &config)?;

        if let Some(new_default) = new_default_provider.as_deref() {
            if config.active_provider() == Some(new_default) {
                sync_openai_key(paths, &config, new_default)?;
            }
        }

        log::info!("已删除 Codex 供应商: {}", ids.join(", "));
        Ok(DeleteProvidersOutcome {
            deleted: ids.to_vec(),
            new_default_provider,
            backup_path,
        })
    }

    /// 切换到指定供应商，并把其 key 同步为 `OPENAI_API_KEY`
    pub fn switch_codex_provider(paths: &CodexPaths, id: &str) -> Result<SwitchOutcome, AppError> {
        let mut config = read_codex_config(paths)?;
        if config.find_provider(id).is_none() {
            return Err(AppError::ProviderNotFound(id.to_string()));
        }

        let backup_path = BackupService::backup_codex_config(paths)?;
        config.set_active_provider(Some(id.to_string()));
        write_codex_config(paths, &config)?;
        sync_openai_key(paths, &config, id)?;

        Ok(SwitchOutcome {
            active: Some(id.to_string()),
            backup_path,
        })
    }

    /// 切回官方登录：保留供应商 ID 但以注释形式写出
    pub fn switch_to_official_login(paths: &CodexPaths) -> Result<SwitchOutcome, AppError> {
        let mut config = read_codex_config(paths)?;
        let backup_path = BackupService::backup_codex_config(paths)?;

        if config.model_provider.is_some() {
            config.model_provider_commented = Some(true);
        }
        write_codex_config(paths, &config)?;
        update_codex_auth(paths, &[(OPENAI_API_KEY, None)])?;

        Ok(SwitchOutcome {
            active: None,
            backup_path,
        })
    }

    /// API 配置入口：官方登录，或批量写入自定义供应商并设置默认值
    pub fn configure_codex_api(
        paths: &CodexPaths,
        mode: ApiMode,
    ) -> Result<SwitchOutcome, AppError> {
        let (mut providers, default_provider) = match mode {
            ApiMode::Official => return Self::switch_to_official_login(paths),
            ApiMode::Custom {
                providers,
                default_provider,
            } => (providers, default_provider),
        };

        if providers.is_empty() {
            return Err(AppError::InvalidInput("至少需要一个供应商".into()));
        }
        for input in &mut providers {
            fill_env_key(&mut input.provider);
            validate_provider(&input.provider)?;
        }

        let mut config = read_codex_config(paths)?;
        let known = |id: &str| {
            providers.iter().any(|p| p.provider.id == id) || config.find_provider(id).is_some()
        };
        if !known(&default_provider) {
            return Err(AppError::ProviderNotFound(default_provider));
        }

        let backup_path = BackupService::backup_codex_complete(paths)?;

        for input in &providers {
            config.upsert_provider(input.provider.clone());
        }
        config.managed = true;
        config.set_active_provider(Some(default_provider.clone()));

        let keys: Vec<(&CodexProvider, &str)> = providers
            .iter()
            .map(|p| (&p.provider, p.api_key.as_str()))
            .collect();
        write_api_keys(paths, &config, &keys)?;
        write_codex_config(paths, &config)?;

        Ok(SwitchOutcome {
            active: Some(default_provider),
            backup_path,
        })
    }
}

fn fill_env_key(provider: &mut CodexProvider) {
    if provider.env_key.trim().is_empty() {
        provider.env_key = env_key_for(&provider.id);
    }
}

fn validate_provider(provider: &CodexProvider) -> Result<(), AppError> {
    if provider.id.trim().is_empty() {
        return Err(AppError::InvalidInput("供应商 ID 不能为空".into()));
    }
    if provider.base_url.trim().is_empty() {
        return Err(AppError::InvalidInput(format!(
            "供应商 {} 缺少 base_url",
            provider.id
        )));
    }
    Ok(())
}

/// 把 key 写到 `auth.json[env_key]`；若该供应商正在生效，同时写入 `OPENAI_API_KEY`
fn write_api_keys(
    paths: &CodexPaths,
    config: &CodexConfig,
    keys: &[(&CodexProvider, &str)],
) -> Result<(), AppError> {
    let mut entries: Vec<(&str, Option<&str>)> = Vec::new();
    for (provider, key) in keys {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        entries.push((provider.env_key.as_str(), Some(key)));
        if config.active_provider() == Some(provider.id.as_str())
            && provider.env_key != OPENAI_API_KEY
        {
            entries.push((OPENAI_API_KEY, Some(key)));
        }
    }
    update_codex_auth(paths, &entries)
}

fn sync_openai_key(paths: &CodexPaths, config: &CodexConfig, id: &str) -> Result<(), AppError> {
    let Some(provider) = config.find_provider(id) else {
        return Ok(());
    };
    if provider.env_key == OPENAI_API_KEY {
        return Ok(());
    }
    let auth = read_codex_auth(paths)?;
    let Some(key) = auth.get(&provider.env_key).and_then(|v| v.as_str()) else {
        log::debug!("auth.json 中没有 {}，跳过 OPENAI_API_KEY 同步", provider.env_key);
        return Ok(());
    };
    let key = key.to_string();
    update_codex_auth(paths, &[(OPENAI_API_KEY, Some(key.as_str()))])
}
