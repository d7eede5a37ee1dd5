use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::AppError;

const HTTP_REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("zcf/", env!("CARGO_PKG_VERSION"));

/// npmmirror 优先（国内更快），失败后回退官方源
const REGISTRIES: [&str; 2] = ["https://registry.npmmirror.com", "https://registry.npmjs.org"];

/// 通过 npm 全局安装的周边工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CliTool {
    pub id: &'static str,
    pub label: &'static str,
    pub npm_package: &'static str,
}

const CLI_TOOLS: &[CliTool] = &[
    CliTool {
        id: "claude",
        label: "Claude Code",
        npm_package: "@anthropic-ai/claude-code",
    },
    CliTool {
        id: "codex",
        label: "Codex",
        npm_package: "@openai/codex",
    },
    CliTool {
        id: "ccr",
        label: "CCR",
        npm_package: "@musistudio/claude-code-router",
    },
    CliTool {
        id: "ccline",
        label: "CCometixLine",
        npm_package: "@cometix/ccline",
    },
    CliTool {
        id: "ccusage",
        label: "ccusage",
        npm_package: "ccusage",
    },
];

pub fn get_cli_tools() -> &'static [CliTool] {
    CLI_TOOLS
}

pub fn find_cli_tool(id: &str) -> Option<&'static CliTool> {
    CLI_TOOLS
        .iter()
        .find(|t| t.id == id || t.label.eq_ignore_ascii_case(id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Latest,
    Upgradable,
    NotInstalled,
    FetchFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionCheck {
    pub tool: CliTool,
    pub current: Option<String>,
    pub latest: Option<String>,
    pub status: VersionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 版本查询与安装的抽象，便于在测试中替换 npm
pub trait ToolUpdater {
    fn installed_version(&self, tool: &CliTool) -> Result<Option<String>, AppError>;
    fn latest_version(&self, tool: &CliTool) -> Result<String, AppError>;
    fn install_latest(&self, tool: &CliTool) -> Result<(), AppError>;
}

/// 比较两个版本号；非 semver 格式时按数字段逐个比较
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let clean = |v: &str| v.trim().trim_start_matches('v').to_string();
    match (
        semver::Version::parse(&clean(a)),
        semver::Version::parse(&clean(b)),
    ) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => {
            let parse = |v: &str| -> Vec<u64> {
                clean(v)
                    .split(['.', '-'])
                    .map_while(|s| s.parse::<u64>().ok())
                    .collect()
            };
            let (a, b) = (parse(a), parse(b));
            (0..3)
                .map(|i| {
                    a.get(i)
                        .copied()
                        .unwrap_or(0)
                        .cmp(&b.get(i).copied().unwrap_or(0))
                })
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }
    }
}

pub fn check_tool(tool: &CliTool, updater: &dyn ToolUpdater) -> VersionCheck {
    let current = match updater.installed_version(tool) {
        Ok(v) => v,
        Err(e) => {
            return VersionCheck {
                tool: *tool,
                current: None,
                latest: None,
                status: VersionStatus::FetchFailed,
                error: Some(e.to_string()),
            }
        }
    };

    let (latest, error) = match updater.latest_version(tool) {
        Ok(v) => (Some(v), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let status = match (&current, &latest) {
        (None, _) => VersionStatus::NotInstalled,
        (Some(_), None) => VersionStatus::FetchFailed,
        (Some(curr), Some(lat)) if compare_versions(curr, lat).is_lt() => VersionStatus::Upgradable,
        (Some(_), Some(_)) => VersionStatus::Latest,
    };

    VersionCheck {
        tool: *tool,
        current,
        latest,
        status,
        error,
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSummary {
    pub updated: Vec<String>,
    pub up_to_date: Vec<String>,
    pub not_installed: Vec<String>,
    /// 可升级但用户拒绝
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// 依次检查并升级工具。单个工具失败只记录在 `failed` 中，不影响其余工具。
pub fn run_update_sweep<F>(
    tools: &[CliTool],
    updater: &dyn ToolUpdater,
    mut confirm: F,
) -> UpdateSummary
where
    F: FnMut(&VersionCheck) -> bool,
{
    let mut summary = UpdateSummary::default();

    for tool in tools {
        let check = check_tool(tool, updater);
        let id = tool.id.to_string();
        match check.status {
            VersionStatus::NotInstalled => summary.not_installed.push(id),
            VersionStatus::Latest => summary.up_to_date.push(id),
            VersionStatus::FetchFailed => {
                let reason = check.error.unwrap_or_else(|| "unknown error".to_string());
                log::warn!("{} 版本检查失败: {reason}", tool.label);
                summary.failed.push((id, reason));
            }
            VersionStatus::Upgradable => {
                if !confirm(&check) {
                    summary.skipped.push(id);
                    continue;
                }
                match updater.install_latest(tool) {
                    Ok(()) => summary.updated.push(id),
                    Err(e) => {
                        log::warn!("{} 升级失败: {e}", tool.label);
                        summary.failed.push((id, e.to_string()));
                    }
                }
            }
        }
    }

    summary
}

/// 基于 npm 的实现：`npm ls -g` 读取已安装版本，registry HTTP API 查询最新版本
pub struct NpmToolUpdater {
    npm: PathBuf,
    globals: OnceLock<HashMap<String, String>>,
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
}

impl NpmToolUpdater {
    pub fn new() -> Result<Self, AppError> {
        // Windows 上 npm 是 npm.cmd，交给 which 解析
        let npm = which::which("npm").map_err(|_| {
            AppError::Message("npm not found in PATH; install Node.js first".into())
        })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AppError::Message(format!("Failed to create runtime: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Message(format!("Failed to initialize HTTP client: {e}")))?;
        Ok(Self {
            npm,
            globals: OnceLock::new(),
            runtime,
            client,
        })
    }

    fn globals(&self) -> &HashMap<String, String> {
        self.globals.get_or_init(|| read_npm_globals(&self.npm))
    }

    async fn fetch_registry_version(&self, registry: &str, package: &str) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct LatestManifest {
            version: String,
        }

        let url = format!("{registry}/{}/latest", package.replace('/', "%2F"));
        let manifest = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| AppError::Message(format!("Failed to query {url}: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Message(format!("Registry returned error: {e}")))?
            .json::<LatestManifest>()
            .await
            .map_err(|e| AppError::Message(format!("Failed to parse registry response: {e}")))?;
        Ok(manifest.version)
    }
}

impl ToolUpdater for NpmToolUpdater {
    fn installed_version(&self, tool: &CliTool) -> Result<Option<String>, AppError> {
        Ok(self.globals().get(tool.npm_package).cloned())
    }

    fn latest_version(&self, tool: &CliTool) -> Result<String, AppError> {
        for registry in REGISTRIES {
            match self
                .runtime
                .block_on(self.fetch_registry_version(registry, tool.npm_package))
            {
                Ok(version) => return Ok(version),
                Err(e) => log::debug!("{registry} 查询失败: {e}"),
            }
        }
        npm_view_latest(&self.npm, tool.npm_package)
    }

    fn install_latest(&self, tool: &CliTool) -> Result<(), AppError> {
        let pkg = format!("{}@latest", tool.npm_package);
        for registry in REGISTRIES {
            let status = Command::new(&self.npm)
                .args(["i", "-g", &pkg, "--registry", registry])
                .status();
            match status {
                Ok(s) if s.success() => return Ok(()),
                Ok(s) => log::warn!("npm i -g {pkg} ({registry}) 退出码 {s}"),
                Err(e) => log::warn!("无法执行 npm: {e}"),
            }
        }
        Err(AppError::Message(format!(
            "Failed to upgrade {} (all registries failed)",
            tool.label
        )))
    }
}

fn read_npm_globals(npm: &Path) -> HashMap<String, String> {
    #[derive(Deserialize)]
    struct NpmLsOutput {
        dependencies: Option<HashMap<String, NpmPackageInfo>>,
    }

    #[derive(Deserialize)]
    struct NpmPackageInfo {
        version: Option<String>,
    }

    let output = match Command::new(npm)
        .args(["ls", "-g", "--depth=0", "--json"])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            log::warn!("npm ls 执行失败: {e}");
            return HashMap::new();
        }
    };

    // npm ls 在存在无效依赖时退出码非 0，但 stdout 仍是完整 JSON
    let stdout = String::from_utf8_lossy(&output.stdout);
    match serde_json::from_str::<NpmLsOutput>(&stdout) {
        Ok(parsed) => parsed
            .dependencies
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, info)| info.version.map(|v| (name, v)))
            .collect(),
        Err(e) => {
            log::warn!("解析 npm ls 输出失败: {e}");
            HashMap::new()
        }
    }
}

fn npm_view_latest(npm: &Path, package: &str) -> Result<String, AppError> {
    for registry in REGISTRIES {
        let Ok(output) = Command::new(npm)
            .args(["view", package, "version", "--registry", registry])
            .output()
        else {
            continue;
        };
        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !version.is_empty() {
                return Ok(version);
            }
        }
    }
    Err(AppError::Message(format!(
        "Failed to fetch latest version of {package}"
    )))
}
