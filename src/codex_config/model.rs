use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// ZCF 写入 `config.toml` 时使用的托管标记
pub const MANAGED_MARKER: &str = "# --- model provider added by ZCF ---";

/// 旧版本写在 MCP 段落前的标记，解析时一并吸收，不再输出
pub const LEGACY_MCP_MARKER: &str = "# --- MCP servers added by ZCF ---";

/// Codex 官方登录使用的 key 名
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireApi {
    #[default]
    Responses,
    Chat,
}

impl WireApi {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireApi::Responses => "responses",
            WireApi::Chat => "chat",
        }
    }
}

impl fmt::Display for WireApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireApi {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "responses" => Ok(WireApi::Responses),
            "chat" => Ok(WireApi::Chat),
            other => Err(AppError::InvalidInput(format!(
                "wire_api 必须是 'responses' 或 'chat'，实际为 '{other}'"
            ))),
        }
    }
}

/// `[model_providers.<id>]`
#[derive(Debug, Clone, PartialEq)]
pub struct CodexProvider {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub wire_api: WireApi,
    pub env_key: String,
    pub requires_openai_auth: Option<bool>,
    /// 未建模的其它键（如 `query_params`），原样保留
    pub extra: toml::Table,
}

impl CodexProvider {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
        wire_api: WireApi,
    ) -> Self {
        let id = id.into();
        let env_key = env_key_for(&id);
        Self {
            id,
            name: name.into(),
            base_url: base_url.into(),
            wire_api,
            env_key,
            requires_openai_auth: None,
            extra: toml::Table::new(),
        }
    }
}

/// `[mcp_servers.<id>]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodexMcpService {
    pub id: String,
    pub command: String,
    pub args: Option<Vec<String>>,
    pub env: Option<IndexMap<String, String>>,
    pub startup_timeout_ms: Option<u64>,
    pub extra: toml::Table,
}

/// `config.toml` 的结构化视图；每次操作都从磁盘重新解析，不做缓存
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodexConfig {
    pub model: Option<String>,
    pub model_provider: Option<String>,
    /// `Some(true)` 表示 `model_provider` 只以注释形式存在（已知但停用）
    pub model_provider_commented: Option<bool>,
    pub providers: Vec<CodexProvider>,
    pub mcp_services: Vec<CodexMcpService>,
    pub managed: bool,
    pub other_config: Vec<String>,
}

impl CodexConfig {
    pub fn find_provider(&self, id: &str) -> Option<&CodexProvider> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn find_provider_mut(&mut self, id: &str) -> Option<&mut CodexProvider> {
        self.providers.iter_mut().find(|p| p.id == id)
    }

    pub fn find_mcp_service(&self, id: &str) -> Option<&CodexMcpService> {
        self.mcp_services.iter().find(|s| s.id == id)
    }

    /// 当前生效（非注释）的供应商 ID
    pub fn active_provider(&self) -> Option<&str> {
        if self.model_provider_commented == Some(true) {
            return None;
        }
        self.model_provider.as_deref()
    }

    /// 插入或按 ID 覆盖（保持原有位置）
    pub fn upsert_provider(&mut self, provider: CodexProvider) {
        match self.find_provider_mut(&provider.id) {
            Some(existing) => *existing = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn upsert_mcp_service(&mut self, service: CodexMcpService) {
        match self.mcp_services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => *existing = service,
            None => self.mcp_services.push(service),
        }
    }

    pub fn set_active_provider(&mut self, id: Option<String>) {
        self.model_provider_commented = None;
        self.model_provider = id;
    }
}

/// 由供应商 ID 推导 API key 的环境变量名，如 `my-proxy` -> `MY_PROXY_API_KEY`
pub fn env_key_for(id: &str) -> String {
    let slug: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_API_KEY", slug.trim_matches('_'))
}

/// 由显示名称生成供应商 ID
pub fn provider_id_from_name(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut last_dash = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash && !id.is_empty() {
            id.push('-');
            last_dash = true;
        }
    }
    id.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_key_is_derived_from_id() {
        assert_eq!(env_key_for("my-proxy"), "MY_PROXY_API_KEY");
        assert_eq!(env_key_for("packycode"), "PACKYCODE_API_KEY");
    }

    #[test]
    fn provider_id_slugifies_display_name() {
        assert_eq!(provider_id_from_name("  My Proxy (CN) "), "my-proxy-cn");
        assert_eq!(provider_id_from_name("GPT-4"), "gpt-4");
        assert_eq!(provider_id_from_name("中文"), "");
    }

    #[test]
    fn wire_api_parses_case_insensitively() {
        assert_eq!("Chat".parse::<WireApi>().expect("chat"), WireApi::Chat);
        assert!("grpc".parse::<WireApi>().is_err());
    }

    #[test]
    fn commented_provider_is_not_active() {
        let config = CodexConfig {
            model_provider: Some("a".into()),
            model_provider_commented: Some(true),
            ..CodexConfig::default()
        };
        assert_eq!(config.active_provider(), None);
    }
}
