use indexmap::IndexMap;

/// 运行平台，决定 MCP 启动命令的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

/// 内置 MCP 服务定义
#[derive(Debug, Clone, PartialEq)]
pub struct McpCatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description_en: &'static str,
    pub description_zh: &'static str,
    pub command: &'static str,
    pub args: &'static [&'static str],
    pub env: &'static [(&'static str, &'static str)],
    pub requires_api_key: bool,
    /// 需要 key 时写入 `env` 的变量名
    pub api_key_env: Option<&'static str>,
    pub startup_timeout_ms: Option<u64>,
}

impl McpCatalogEntry {
    pub fn description(&self) -> &'static str {
        crate::t!(self.description_en, self.description_zh)
    }

    pub fn default_env(&self) -> Option<IndexMap<String, String>> {
        if self.env.is_empty() {
            return None;
        }
        Some(
            self.env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

const MCP_SERVICES: &[McpCatalogEntry] = &[
    McpCatalogEntry {
        id: "context7",
        name: "Context7",
        description_en: "Up-to-date library documentation and code examples",
        description_zh: "查询最新的库文档和代码示例",
        command: "npx",
        args: &["-y", "@upstash/context7-mcp@latest"],
        env: &[],
        requires_api_key: false,
        api_key_env: None,
        startup_timeout_ms: None,
    },
    McpCatalogEntry {
        id: "open-websearch",
        name: "open-websearch",
        description_en: "Web search via DuckDuckGo, Bing and Brave, no API key needed",
        description_zh: "使用 DuckDuckGo、Bing 和 Brave 进行网页搜索，无需 API key",
        command: "npx",
        args: &["-y", "open-websearch@latest"],
        env: &[
            ("MODE", "stdio"),
            ("DEFAULT_SEARCH_ENGINE", "duckduckgo"),
            ("ALLOWED_SEARCH_ENGINES", "duckduckgo,bing,brave"),
        ],
        requires_api_key: false,
        api_key_env: None,
        startup_timeout_ms: None,
    },
    McpCatalogEntry {
        id: "mcp-deepwiki",
        name: "DeepWiki",
        description_en: "Query DeepWiki documentation of GitHub repositories",
        description_zh: "查询 GitHub 仓库的 DeepWiki 文档",
        command: "npx",
        args: &["-y", "mcp-deepwiki@latest"],
        env: &[],
        requires_api_key: false,
        api_key_env: None,
        startup_timeout_ms: None,
    },
    McpCatalogEntry {
        id: "Playwright",
        name: "Playwright",
        description_en: "Browser automation and testing",
        description_zh: "浏览器自动化与测试",
        command: "npx",
        args: &["-y", "@playwright/mcp@latest"],
        env: &[],
        requires_api_key: false,
        api_key_env: None,
        startup_timeout_ms: None,
    },
    McpCatalogEntry {
        id: "exa",
        name: "Exa AI Search",
        description_en: "Web search powered by Exa AI (requires an API key)",
        description_zh: "基于 Exa AI 的网页搜索（需要 API key）",
        command: "npx",
        args: &["-y", "exa-mcp-server"],
        env: &[],
        requires_api_key: true,
        api_key_env: Some("EXA_API_KEY"),
        startup_timeout_ms: None,
    },
    McpCatalogEntry {
        id: "serena",
        name: "Serena",
        description_en: "Semantic code retrieval and editing for the IDE assistant",
        description_zh: "面向 IDE 助手的语义代码检索与编辑",
        command: "uvx",
        args: &[
            "--from",
            "git+https://github.com/oraios/serena",
            "serena",
            "start-mcp-server",
            "--context",
            "codex",
        ],
        env: &[],
        requires_api_key: false,
        api_key_env: None,
        startup_timeout_ms: Some(60_000),
    },
    McpCatalogEntry {
        id: "spec-workflow",
        name: "Spec Workflow",
        description_en: "Structured spec-driven development workflow",
        description_zh: "结构化的规格驱动开发工作流",
        command: "npx",
        args: &["-y", "@pimzino/spec-workflow-mcp@latest"],
        env: &[],
        requires_api_key: false,
        api_key_env: None,
        startup_timeout_ms: None,
    },
];

pub fn get_mcp_services() -> &'static [McpCatalogEntry] {
    MCP_SERVICES
}

pub fn find_mcp_service(id: &str) -> Option<&'static McpCatalogEntry> {
    MCP_SERVICES.iter().find(|s| s.id == id)
}

/// `npx` 在 Windows 上需要经由 `cmd /c` 调用
pub fn get_mcp_command(platform: Platform) -> Vec<&'static str> {
    if platform.is_windows() {
        vec!["cmd", "/c", "npx"]
    } else {
        vec!["npx"]
    }
}

/// 按平台改写 `npx` 启动命令，返回 `(command, args)`
pub fn platform_command(platform: Platform, command: &str, args: &[String]) -> (String, Vec<String>) {
    if command != "npx" || !platform.is_windows() {
        return (command.to_string(), args.to_vec());
    }
    let mut parts = get_mcp_command(platform).into_iter().map(str::to_string);
    let program = parts.next().unwrap_or_else(|| command.to_string());
    let mut rewritten: Vec<String> = parts.collect();
    rewritten.extend(args.iter().cloned());
    (program, rewritten)
}
