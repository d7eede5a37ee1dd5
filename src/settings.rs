use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};

use crate::config::{atomic_write, expand_home, get_zcf_config_dir};
use crate::error::AppError;

/// 当前正在管理的代码工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CodeToolType {
    #[default]
    #[serde(rename = "claude-code")]
    ClaudeCode,
    #[serde(rename = "codex")]
    Codex,
}

impl std::fmt::Display for CodeToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeToolType::ClaudeCode => f.write_str("Claude Code"),
            CodeToolType::Codex => f.write_str("Codex"),
        }
    }
}

/// ZCF 设置，持久化在 `~/.ufomiao/zcf/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZcfSettings {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_lang: Option<String>,
    #[serde(default)]
    pub code_tool_type: CodeToolType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codex_config_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_check: Option<String>,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for ZcfSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            preferred_lang: None,
            code_tool_type: CodeToolType::default(),
            codex_config_dir: None,
            last_update_check: None,
        }
    }
}

impl ZcfSettings {
    fn settings_path() -> Option<PathBuf> {
        get_zcf_config_dir().ok().map(|dir| dir.join("config.toml"))
    }

    fn normalize(&mut self) {
        self.codex_config_dir = self
            .codex_config_dir
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        self.preferred_lang = self
            .preferred_lang
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| matches!(*s, "en" | "zh-CN"))
            .map(|s| s.to_string());
    }

    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        match toml::from_str::<ZcfSettings>(&content) {
            Ok(mut settings) => {
                settings.normalize();
                settings
            }
            Err(err) => {
                log::warn!(
                    "解析 ZCF 设置失败，将使用默认设置。路径: {}, 错误: {}",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), AppError> {
        let mut normalized = self.clone();
        normalized.normalize();
        let path = Self::settings_path()
            .ok_or_else(|| AppError::Config("无法确定 ZCF 设置路径".into()))?;

        let text = toml::to_string_pretty(&normalized)?;
        atomic_write(&path, text.as_bytes())
    }
}

fn settings_store() -> &'static RwLock<ZcfSettings> {
    static STORE: OnceLock<RwLock<ZcfSettings>> = OnceLock::new();
    STORE.get_or_init(|| RwLock::new(ZcfSettings::load()))
}

pub fn get_settings() -> ZcfSettings {
    settings_store().read().expect("读取设置锁失败").clone()
}

pub fn update_settings(mut new_settings: ZcfSettings) -> Result<(), AppError> {
    new_settings.normalize();
    new_settings.save()?;

    let mut guard = settings_store().write().expect("写入设置锁失败");
    *guard = new_settings;
    Ok(())
}

pub fn get_codex_override_dir() -> Option<PathBuf> {
    let settings = settings_store().read().ok()?;
    settings
        .codex_config_dir
        .as_deref()
        .map(expand_home)
}

pub fn set_code_tool_type(tool: CodeToolType) -> Result<(), AppError> {
    let mut settings = get_settings();
    if settings.code_tool_type == tool {
        return Ok(());
    }
    settings.code_tool_type = tool;
    update_settings(settings)
}

pub fn record_update_check() -> Result<(), AppError> {
    let mut settings = get_settings();
    settings.last_update_check = Some(chrono::Local::now().to_rfc3339());
    update_settings(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_with_defaults_and_normalization() {
        let mut settings: ZcfSettings = toml::from_str(
            r#"
preferred_lang = "fr"
code_tool_type = "codex"
codex_config_dir = "   "
"#,
        )
        .expect("parse settings");
        settings.normalize();

        assert_eq!(settings.code_tool_type, CodeToolType::Codex);
        assert!(settings.preferred_lang.is_none());
        assert!(settings.codex_config_dir.is_none());
        assert_eq!(settings.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = ZcfSettings {
            preferred_lang: Some("zh-CN".into()),
            code_tool_type: CodeToolType::Codex,
            ..ZcfSettings::default()
        };
        let text = toml::to_string_pretty(&settings).expect("serialize");
        assert!(text.contains("code_tool_type = \"codex\""));

        let back: ZcfSettings = toml::from_str(&text).expect("parse back");
        assert_eq!(back.preferred_lang.as_deref(), Some("zh-CN"));
        assert_eq!(back.code_tool_type, CodeToolType::Codex);
    }
}
