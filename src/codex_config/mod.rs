//! Codex CLI configuration: `config.toml` model, parser/renderer and the
//! `auth.json` credential store.

mod model;
mod parser;
mod render;
mod scan;

pub use model::{
    env_key_for, provider_id_from_name, CodexConfig, CodexMcpService, CodexProvider, WireApi,
    LEGACY_MCP_MARKER, MANAGED_MARKER, OPENAI_API_KEY,
};
pub use parser::parse_codex_config;
pub use render::render_codex_config;

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::config::{get_home_dir, read_json_file, read_text_file, write_json_file, write_text_file};
use crate::error::AppError;

/// Codex 配置目录下的各个文件位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodexPaths {
    dir: PathBuf,
}

impl CodexPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 解析顺序：ZCF 设置中的覆盖目录 -> `$CODEX_HOME` -> `~/.codex`
    pub fn detect() -> Result<Self, AppError> {
        if let Some(dir) = crate::settings::get_codex_override_dir() {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = std::env::var_os("CODEX_HOME").filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        Ok(Self::new(get_home_dir()?.join(".codex")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.toml")
    }

    pub fn auth_path(&self) -> PathBuf {
        self.dir.join("auth.json")
    }

    pub fn agents_path(&self) -> PathBuf {
        self.dir.join("AGENTS.md")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.dir.join("prompts")
    }

    pub fn backup_root(&self) -> PathBuf {
        self.dir.join("backup")
    }
}

/// 读取并解析 `config.toml`；文件不存在时返回空模型
pub fn read_codex_config(paths: &CodexPaths) -> Result<CodexConfig, AppError> {
    let path = paths.config_path();
    let Some(text) = read_text_file(&path)? else {
        return Ok(CodexConfig::default());
    };
    parse_codex_config(&text).map_err(|e| AppError::toml(&path, e))
}

/// 渲染并原子写入 `config.toml`
pub fn write_codex_config(paths: &CodexPaths, config: &CodexConfig) -> Result<(), AppError> {
    let path = paths.config_path();
    let text = render_codex_config(config);
    write_text_file(&path, &text)?;
    log::debug!("已写入 Codex 配置: {}", path.display());
    Ok(())
}

pub fn read_codex_auth(paths: &CodexPaths) -> Result<Map<String, Value>, AppError> {
    let path = paths.auth_path();
    if !path.exists() {
        return Ok(Map::new());
    }
    match read_json_file::<Value>(&path)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Config(format!(
            "{} 根必须是 JSON 对象",
            path.display()
        ))),
    }
}

pub fn write_codex_auth(paths: &CodexPaths, auth: &Map<String, Value>) -> Result<(), AppError> {
    write_json_file(&paths.auth_path(), auth)
}

/// 更新 `auth.json` 中的若干键，其它键保持不变；`None` 写入 JSON null
pub fn update_codex_auth(
    paths: &CodexPaths,
    entries: &[(&str, Option<&str>)],
) -> Result<(), AppError> {
    if entries.is_empty() {
        return Ok(());
    }
    let mut auth = read_codex_auth(paths)?;
    for (key, value) in entries {
        let value = value.map_or(Value::Null, |v| Value::String(v.to_string()));
        auth.insert((*key).to_string(), value);
    }
    write_codex_auth(paths, &auth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_files_read_as_empty() {
        let dir = TempDir::new().expect("temp dir");
        let paths = CodexPaths::new(dir.path().join(".codex"));
        assert_eq!(read_codex_config(&paths).expect("config"), CodexConfig::default());
        assert!(read_codex_auth(&paths).expect("auth").is_empty());
    }

    #[test]
    fn update_auth_preserves_other_keys() {
        let dir = TempDir::new().expect("temp dir");
        let paths = CodexPaths::new(dir.path());
        std::fs::write(
            paths.auth_path(),
            r#"{"tokens": {"id": "t"}, "OPENAI_API_KEY": "old"}"#,
        )
        .expect("seed auth");

        update_codex_auth(&paths, &[("PACKY_API_KEY", Some("k1")), (OPENAI_API_KEY, None)])
            .expect("update auth");

        let auth = read_codex_auth(&paths).expect("read auth");
        assert_eq!(auth["PACKY_API_KEY"], Value::String("k1".into()));
        assert_eq!(auth[OPENAI_API_KEY], Value::Null);
        assert!(auth.contains_key("tokens"));
    }

    #[test]
    fn invalid_config_reports_path() {
        let dir = TempDir::new().expect("temp dir");
        let paths = CodexPaths::new(dir.path());
        std::fs::write(paths.config_path(), "model = \"oops\n").expect("seed config");

        let err = read_codex_config(&paths).expect_err("should fail");
        assert!(matches!(err, AppError::Toml { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
