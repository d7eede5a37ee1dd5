use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use crate::config::{copy_file, ensure_dir, read_json_file, write_json_file};
use crate::error::AppError;
use crate::services::backup::BackupService;

pub const ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_AUTH_TOKEN: &str = "ANTHROPIC_AUTH_TOKEN";

/// Claude Code 的鉴权方式：`x-api-key` 或 `Authorization: Bearer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClaudeAuthKind {
    ApiKey,
    AuthToken,
}

impl ClaudeAuthKind {
    pub fn env_var(&self) -> &'static str {
        match self {
            ClaudeAuthKind::ApiKey => ANTHROPIC_API_KEY,
            ClaudeAuthKind::AuthToken => ANTHROPIC_AUTH_TOKEN,
        }
    }

    fn other(&self) -> &'static str {
        match self {
            ClaudeAuthKind::ApiKey => ANTHROPIC_AUTH_TOKEN,
            ClaudeAuthKind::AuthToken => ANTHROPIC_API_KEY,
        }
    }
}

pub fn get_claude_settings_path(dir: &Path) -> PathBuf {
    dir.join("settings.json")
}

fn read_settings(path: &Path) -> Result<Value, AppError> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let value: Value = read_json_file(path)?;
    if !value.is_object() {
        return Err(AppError::Config(format!(
            "{} 根必须是 JSON 对象",
            path.display()
        )));
    }
    Ok(value)
}

fn env_object(root: &mut Value) -> Result<&mut Map<String, Value>, AppError> {
    let obj = root
        .as_object_mut()
        .ok_or_else(|| AppError::Config("settings.json 根必须是对象".into()))?;
    let env = obj.entry("env").or_insert_with(|| json!({}));
    if !env.is_object() {
        *env = json!({});
    }
    env.as_object_mut()
        .ok_or_else(|| AppError::Config("settings.json env 必须是对象".into()))
}

/// 备份到 `<claude>/backup/backup_<ts>/settings.json`；文件不存在时返回 `None`
pub fn backup_claude_settings(dir: &Path) -> Result<Option<PathBuf>, AppError> {
    let source = get_claude_settings_path(dir);
    if !source.is_file() {
        return Ok(None);
    }
    let backup_dir = dir
        .join("backup")
        .join(format!("backup_{}", BackupService::timestamp()));
    ensure_dir(&backup_dir)?;
    let target = backup_dir.join("settings.json");
    copy_file(&source, &target)?;
    Ok(Some(target))
}

/// 写入 `env.ANTHROPIC_BASE_URL` 与 key，其它字段保持不变。
/// 两种鉴权变量互斥，写入一种时会移除另一种。
pub fn configure_claude_api(
    dir: &Path,
    base_url: Option<&str>,
    key: &str,
    auth_kind: ClaudeAuthKind,
) -> Result<Option<PathBuf>, AppError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::InvalidInput("API key 不能为空".into()));
    }

    let path = get_claude_settings_path(dir);
    let mut root = read_settings(&path)?;
    let backup = backup_claude_settings(dir)?;

    let env = env_object(&mut root)?;
    match base_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            env.insert(ANTHROPIC_BASE_URL.into(), Value::String(url.to_string()));
        }
        None => {
            env.remove(ANTHROPIC_BASE_URL);
        }
    }
    env.insert(auth_kind.env_var().into(), Value::String(key.to_string()));
    env.remove(auth_kind.other());

    write_json_file(&path, &root)?;
    log::info!("已更新 Claude Code API 配置: {}", path.display());
    Ok(backup)
}

/// 移除 API 相关的 env 项；没有改动时不写文件，返回 `false`
pub fn clear_claude_api(dir: &Path) -> Result<bool, AppError> {
    let path = get_claude_settings_path(dir);
    if !path.exists() {
        return Ok(false);
    }
    let mut root = read_settings(&path)?;
    let Some(env) = root.get_mut("env").and_then(Value::as_object_mut) else {
        return Ok(false);
    };

    let mut removed = false;
    for key in [ANTHROPIC_BASE_URL, ANTHROPIC_API_KEY, ANTHROPIC_AUTH_TOKEN] {
        removed |= env.remove(key).is_some();
    }
    if !removed {
        return Ok(false);
    }

    backup_claude_settings(dir)?;
    write_json_file(&path, &root)?;
    Ok(true)
}
