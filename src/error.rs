use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(String),
    #[error("无效输入: {0}")]
    InvalidInput(String),
    #[error("IO 错误: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON 解析错误: {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON 序列化失败: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("TOML 解析错误: {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("TOML 序列化失败: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
    #[error("Provider already exists: {0}")]
    ProviderExists(String),
    #[error("MCP service not found: {0}")]
    McpServiceNotFound(String),
    #[error("{0}")]
    Message(String),
}

impl AppError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn toml(path: impl AsRef<Path>, source: toml::de::Error) -> Self {
        Self::Toml {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// 用户可纠正的业务错误（不存在 / 重复），在任何写入之前返回
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotFound(_)
                | Self::ProviderExists(_)
                | Self::McpServiceNotFound(_)
                | Self::InvalidInput(_)
        )
    }
}
