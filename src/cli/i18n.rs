use crate::settings::{get_settings, update_settings};
use std::sync::OnceLock;
use std::sync::RwLock;

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh-CN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Chinese => "简体中文",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code.to_lowercase().as_str() {
            "zh" | "zh-cn" | "zh_cn" | "chinese" => Language::Chinese,
            _ => Language::English,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Global language state
fn language_store() -> &'static RwLock<Language> {
    static STORE: OnceLock<RwLock<Language>> = OnceLock::new();
    STORE.get_or_init(|| {
        let lang = if cfg!(test) {
            // Keep unit tests deterministic and avoid reading real user settings.
            Language::English
        } else {
            get_settings()
                .preferred_lang
                .as_deref()
                .map(Language::from_code)
                .unwrap_or(Language::English)
        };
        RwLock::new(lang)
    })
}

/// Get current language
pub fn current_language() -> Language {
    *language_store().read().expect("Failed to read language")
}

/// Set current language and persist
pub fn set_language(lang: Language) -> Result<(), crate::error::AppError> {
    {
        let mut guard = language_store().write().expect("Failed to write language");
        *guard = lang;
    }

    let mut settings = get_settings();
    settings.preferred_lang = Some(lang.code().to_string());
    update_settings(settings)
}

/// Check if current language is Chinese
pub fn is_chinese() -> bool {
    current_language() == Language::Chinese
}

/// Get localized text based on current language
#[macro_export]
macro_rules! t {
    ($en:expr, $zh:expr) => {
        if $crate::cli::i18n::is_chinese() {
            $zh
        } else {
            $en
        }
    };
}

pub use t;

pub mod texts {
    use super::is_chinese;

    // ============================================
    // COMMON UI ELEMENTS (通用界面元素)
    // ============================================

    pub fn welcome_title() -> &'static str {
        if is_chinese() {
            "    🚀 ZCF 零配置代码流"
        } else {
            "    🚀 ZCF - Zero-Config Code Flow"
        }
    }

    pub fn code_tool_label() -> &'static str {
        if is_chinese() {
            "代码工具"
        } else {
            "Code tool"
        }
    }

    pub fn goodbye() -> &'static str {
        if is_chinese() {
            "👋 再见！"
        } else {
            "👋 Goodbye!"
        }
    }

    pub fn error_prefix() -> &'static str {
        if is_chinese() {
            "错误"
        } else {
            "Error"
        }
    }

    pub fn choose_action() -> &'static str {
        if is_chinese() {
            "请选择操作："
        } else {
            "Choose an action:"
        }
    }

    pub fn main_menu_prompt(tool: &str) -> String {
        if is_chinese() {
            format!("请选择功能 (当前: {})", tool)
        } else {
            format!("What would you like to do? (Current: {})", tool)
        }
    }

    pub fn press_enter() -> &'static str {
        if is_chinese() {
            "按 Enter 继续..."
        } else {
            "Press Enter to continue..."
        }
    }

    pub fn cancelled() -> &'static str {
        if is_chinese() {
            "已取消"
        } else {
            "Cancelled"
        }
    }

    pub fn none() -> &'static str {
        if is_chinese() {
            "无"
        } else {
            "none"
        }
    }

    // ============================================
    // MAIN MENU (主菜单)
    // ============================================

    pub fn menu_codex_api() -> &'static str {
        if is_chinese() {
            "配置 API（官方登录 / 自定义供应商）"
        } else {
            "Configure API (official login / custom providers)"
        }
    }

    pub fn menu_switch_provider() -> &'static str {
        if is_chinese() {
            "切换供应商"
        } else {
            "Switch provider"
        }
    }

    pub fn menu_add_provider() -> &'static str {
        if is_chinese() {
            "添加供应商"
        } else {
            "Add provider"
        }
    }

    pub fn menu_edit_provider() -> &'static str {
        if is_chinese() {
            "编辑供应商"
        } else {
            "Edit provider"
        }
    }

    pub fn menu_delete_providers() -> &'static str {
        if is_chinese() {
            "删除供应商"
        } else {
            "Delete providers"
        }
    }

    pub fn menu_configure_mcp() -> &'static str {
        if is_chinese() {
            "配置 MCP 服务"
        } else {
            "Configure MCP services"
        }
    }

    pub fn menu_remove_mcp() -> &'static str {
        if is_chinese() {
            "移除 MCP 服务"
        } else {
            "Remove MCP services"
        }
    }

    pub fn menu_show_config() -> &'static str {
        if is_chinese() {
            "查看当前配置"
        } else {
            "View current configuration"
        }
    }

    pub fn menu_backup() -> &'static str {
        if is_chinese() {
            "立即备份 Codex 配置"
        } else {
            "Back up Codex configuration now"
        }
    }

    pub fn menu_list_backups() -> &'static str {
        if is_chinese() {
            "查看备份列表"
        } else {
            "List backups"
        }
    }

    pub fn menu_claude_api() -> &'static str {
        if is_chinese() {
            "配置 Claude Code API"
        } else {
            "Configure Claude Code API"
        }
    }

    pub fn menu_claude_clear_api() -> &'static str {
        if is_chinese() {
            "清除 Claude Code API 配置"
        } else {
            "Clear Claude Code API configuration"
        }
    }

    pub fn menu_check_updates() -> &'static str {
        if is_chinese() {
            "检查工具更新"
        } else {
            "Check tool updates"
        }
    }

    pub fn menu_switch_tool() -> &'static str {
        if is_chinese() {
            "切换代码工具"
        } else {
            "Switch code tool"
        }
    }

    pub fn menu_language() -> &'static str {
        if is_chinese() {
            "切换语言 / Change language"
        } else {
            "Change language / 切换语言"
        }
    }

    pub fn menu_exit() -> &'static str {
        if is_chinese() {
            "退出"
        } else {
            "Exit"
        }
    }

    // ============================================
    // CODEX CONFIG VIEW (Codex 配置展示)
    // ============================================

    pub fn codex_config_title() -> &'static str {
        if is_chinese() {
            "Codex 配置"
        } else {
            "Codex Configuration"
        }
    }

    pub fn config_file_label() -> &'static str {
        if is_chinese() {
            "配置文件"
        } else {
            "Config file"
        }
    }

    pub fn active_provider_label() -> &'static str {
        if is_chinese() {
            "当前供应商"
        } else {
            "Active provider"
        }
    }

    pub fn model_label() -> &'static str {
        if is_chinese() {
            "模型"
        } else {
            "Model"
        }
    }

    pub fn official_login_active(kept: Option<&str>) -> String {
        match (is_chinese(), kept) {
            (true, Some(id)) => format!("官方登录（已保留供应商 {}）", id),
            (true, None) => "官方登录".to_string(),
            (false, Some(id)) => format!("official login (provider {} kept)", id),
            (false, None) => "official login".to_string(),
        }
    }

    pub fn providers_label() -> &'static str {
        if is_chinese() {
            "供应商"
        } else {
            "Providers"
        }
    }

    pub fn mcp_services_label() -> &'static str {
        if is_chinese() {
            "MCP 服务"
        } else {
            "MCP services"
        }
    }

    pub fn no_providers() -> &'static str {
        if is_chinese() {
            "尚未配置任何供应商"
        } else {
            "No providers configured"
        }
    }

    pub fn no_mcp_services() -> &'static str {
        if is_chinese() {
            "尚未配置任何 MCP 服务"
        } else {
            "No MCP services configured"
        }
    }

    pub fn header_name() -> &'static str {
        if is_chinese() {
            "名称"
        } else {
            "Name"
        }
    }

    pub fn header_command() -> &'static str {
        if is_chinese() {
            "命令"
        } else {
            "Command"
        }
    }

    pub fn header_description() -> &'static str {
        if is_chinese() {
            "说明"
        } else {
            "Description"
        }
    }

    pub fn header_status() -> &'static str {
        if is_chinese() {
            "状态"
        } else {
            "Status"
        }
    }

    pub fn header_path() -> &'static str {
        if is_chinese() {
            "路径"
        } else {
            "Path"
        }
    }

    pub fn header_time() -> &'static str {
        if is_chinese() {
            "时间"
        } else {
            "Time"
        }
    }

    // ============================================
    // PROVIDER MANAGEMENT (供应商管理)
    // ============================================

    pub fn prompt_provider_name() -> &'static str {
        if is_chinese() {
            "供应商名称："
        } else {
            "Provider name:"
        }
    }

    pub fn prompt_provider_id() -> &'static str {
        if is_chinese() {
            "供应商 ID："
        } else {
            "Provider ID:"
        }
    }

    pub fn prompt_base_url() -> &'static str {
        if is_chinese() {
            "API 地址 (base_url)："
        } else {
            "API base URL:"
        }
    }

    pub fn prompt_wire_api() -> &'static str {
        if is_chinese() {
            "协议类型 (wire_api)："
        } else {
            "Wire protocol (wire_api):"
        }
    }

    pub fn prompt_api_key() -> &'static str {
        if is_chinese() {
            "API Key："
        } else {
            "API key:"
        }
    }

    pub fn keep_current_hint() -> &'static str {
        if is_chinese() {
            "留空则保持不变"
        } else {
            "Leave empty to keep the current value"
        }
    }

    pub fn confirm_set_default() -> &'static str {
        if is_chinese() {
            "设为默认供应商？"
        } else {
            "Set as default provider?"
        }
    }

    pub fn select_provider() -> &'static str {
        if is_chinese() {
            "选择供应商："
        } else {
            "Select a provider:"
        }
    }

    pub fn official_login_choice() -> &'static str {
        if is_chinese() {
            "官方登录（不使用自定义供应商）"
        } else {
            "Official login (no custom provider)"
        }
    }

    pub fn select_providers_to_delete() -> &'static str {
        if is_chinese() {
            "选择要删除的供应商（空格选择）："
        } else {
            "Select providers to delete (space to toggle):"
        }
    }

    pub fn confirm_delete_providers(ids: &str) -> String {
        if is_chinese() {
            format!("确认删除供应商 {}？", ids)
        } else {
            format!("Delete providers {}?", ids)
        }
    }

    pub fn provider_added(id: &str) -> String {
        if is_chinese() {
            format!("✓ 已添加供应商 '{}'", id)
        } else {
            format!("✓ Added provider '{}'", id)
        }
    }

    pub fn provider_updated(id: &str) -> String {
        if is_chinese() {
            format!("✓ 已更新供应商 '{}'", id)
        } else {
            format!("✓ Updated provider '{}'", id)
        }
    }

    pub fn providers_deleted(ids: &str) -> String {
        if is_chinese() {
            format!("✓ 已删除供应商: {}", ids)
        } else {
            format!("✓ Deleted providers: {}", ids)
        }
    }

    pub fn new_default_provider(id: &str) -> String {
        if is_chinese() {
            format!("默认供应商已切换为 '{}'", id)
        } else {
            format!("Default provider is now '{}'", id)
        }
    }

    pub fn default_provider_cleared() -> &'static str {
        if is_chinese() {
            "已无剩余供应商，默认供应商已清空"
        } else {
            "No providers left; default provider cleared"
        }
    }

    pub fn switched_to_provider(id: &str) -> String {
        if is_chinese() {
            format!("✓ 已切换到供应商 '{}'", id)
        } else {
            format!("✓ Switched to provider '{}'", id)
        }
    }

    pub fn switched_to_official() -> &'static str {
        if is_chinese() {
            "✓ 已切换到官方登录"
        } else {
            "✓ Switched to official login"
        }
    }

    pub fn api_mode_prompt() -> &'static str {
        if is_chinese() {
            "选择 API 认证方式："
        } else {
            "Choose how Codex authenticates:"
        }
    }

    pub fn api_mode_custom() -> &'static str {
        if is_chinese() {
            "自定义 API 供应商"
        } else {
            "Custom API providers"
        }
    }

    pub fn add_another_provider() -> &'static str {
        if is_chinese() {
            "继续添加供应商？"
        } else {
            "Add another provider?"
        }
    }

    pub fn select_default_provider() -> &'static str {
        if is_chinese() {
            "选择默认供应商："
        } else {
            "Select the default provider:"
        }
    }

    pub fn codex_api_configured(id: &str) -> String {
        if is_chinese() {
            format!("✓ Codex API 配置完成，默认供应商: {}", id)
        } else {
            format!("✓ Codex API configured, default provider: {}", id)
        }
    }

    pub fn nothing_to_change() -> &'static str {
        if is_chinese() {
            "没有需要修改的内容"
        } else {
            "Nothing to change"
        }
    }

    // ============================================
    // MCP SERVICES (MCP 服务)
    // ============================================

    pub fn select_mcp_services() -> &'static str {
        if is_chinese() {
            "选择要配置的 MCP 服务（空格选择）："
        } else {
            "Select MCP services to configure (space to toggle):"
        }
    }

    pub fn select_mcp_to_remove() -> &'static str {
        if is_chinese() {
            "选择要移除的 MCP 服务（空格选择）："
        } else {
            "Select MCP services to remove (space to toggle):"
        }
    }

    pub fn confirm_remove_mcp(ids: &str) -> String {
        if is_chinese() {
            format!("确认移除 MCP 服务 {}？", ids)
        } else {
            format!("Remove MCP services {}?", ids)
        }
    }

    pub fn mcp_key_prompt(name: &str, env: &str) -> String {
        if is_chinese() {
            format!("{} 的 API Key ({})：", name, env)
        } else {
            format!("API key for {} ({}):", name, env)
        }
    }

    pub fn mcp_configured() -> &'static str {
        if is_chinese() {
            "已配置"
        } else {
            "configured"
        }
    }

    pub fn mcp_added(ids: &str) -> String {
        if is_chinese() {
            format!("✓ 已添加 MCP 服务: {}", ids)
        } else {
            format!("✓ Added MCP services: {}", ids)
        }
    }

    pub fn mcp_updated(ids: &str) -> String {
        if is_chinese() {
            format!("✓ 已更新 MCP 服务: {}", ids)
        } else {
            format!("✓ Updated MCP services: {}", ids)
        }
    }

    pub fn mcp_skipped(ids: &str) -> String {
        if is_chinese() {
            format!("⚠ 缺少 API Key，已跳过: {}", ids)
        } else {
            format!("⚠ Skipped (API key required): {}", ids)
        }
    }

    pub fn mcp_removed(ids: &str) -> String {
        if is_chinese() {
            format!("✓ 已移除 MCP 服务: {}", ids)
        } else {
            format!("✓ Removed MCP services: {}", ids)
        }
    }

    // ============================================
    // BACKUP (备份)
    // ============================================

    pub fn backup_created(path: &str) -> String {
        if is_chinese() {
            format!("✔ 已备份到: {}", path)
        } else {
            format!("✔ Backup created: {}", path)
        }
    }

    pub fn backup_skipped_missing_dir() -> &'static str {
        if is_chinese() {
            "Codex 配置目录不存在，无需备份"
        } else {
            "Codex config directory does not exist; nothing to back up"
        }
    }

    pub fn no_backups() -> &'static str {
        if is_chinese() {
            "暂无备份"
        } else {
            "No backups yet"
        }
    }

    // ============================================
    // CLAUDE CODE API (Claude Code API 配置)
    // ============================================

    pub fn prompt_claude_base_url() -> &'static str {
        if is_chinese() {
            "API 地址（留空使用官方地址）："
        } else {
            "API base URL (empty for the official endpoint):"
        }
    }

    pub fn select_auth_kind() -> &'static str {
        if is_chinese() {
            "选择认证方式："
        } else {
            "Select the authentication type:"
        }
    }

    pub fn auth_kind_api_key() -> &'static str {
        if is_chinese() {
            "API Key (ANTHROPIC_API_KEY)"
        } else {
            "API key (ANTHROPIC_API_KEY)"
        }
    }

    pub fn auth_kind_auth_token() -> &'static str {
        if is_chinese() {
            "认证令牌 (ANTHROPIC_AUTH_TOKEN)"
        } else {
            "Auth token (ANTHROPIC_AUTH_TOKEN)"
        }
    }

    pub fn claude_api_configured(path: &str) -> String {
        if is_chinese() {
            format!("✓ 已写入 Claude Code API 配置: {}", path)
        } else {
            format!("✓ Claude Code API configuration written to {}", path)
        }
    }

    pub fn claude_api_cleared() -> &'static str {
        if is_chinese() {
            "✓ 已清除 Claude Code API 配置"
        } else {
            "✓ Claude Code API configuration cleared"
        }
    }

    pub fn claude_api_not_configured() -> &'static str {
        if is_chinese() {
            "没有需要清除的 API 配置"
        } else {
            "No API configuration to clear"
        }
    }

    // ============================================
    // TOOL UPDATES (工具更新)
    // ============================================

    pub fn update_check_title() -> &'static str {
        if is_chinese() {
            "工具版本检查"
        } else {
            "Tool Version Check"
        }
    }

    pub fn checking_progress_template() -> &'static str {
        if is_chinese() {
            "{spinner:.cyan} [{pos}/{len}] 正在检查 {msg}..."
        } else {
            "{spinner:.cyan} [{pos}/{len}] Checking {msg}..."
        }
    }

    pub fn header_tool() -> &'static str {
        if is_chinese() {
            "工具"
        } else {
            "Tool"
        }
    }

    pub fn header_current() -> &'static str {
        if is_chinese() {
            "当前版本"
        } else {
            "Current"
        }
    }

    pub fn header_latest() -> &'static str {
        if is_chinese() {
            "最新版本"
        } else {
            "Latest"
        }
    }

    pub fn status_latest() -> &'static str {
        if is_chinese() {
            "最新"
        } else {
            "up to date"
        }
    }

    pub fn status_upgradable() -> &'static str {
        if is_chinese() {
            "可升级"
        } else {
            "upgradable"
        }
    }

    pub fn status_not_installed() -> &'static str {
        if is_chinese() {
            "未安装"
        } else {
            "not installed"
        }
    }

    pub fn status_fetch_failed() -> &'static str {
        if is_chinese() {
            "获取失败"
        } else {
            "fetch failed"
        }
    }

    pub fn confirm_upgrade(label: &str, current: &str, latest: &str) -> String {
        if is_chinese() {
            format!("升级 {} ({} → {})？", label, current, latest)
        } else {
            format!("Upgrade {} ({} → {})?", label, current, latest)
        }
    }

    pub fn tools_updated(ids: &str) -> String {
        if is_chinese() {
            format!("✓ 已升级: {}", ids)
        } else {
            format!("✓ Updated: {}", ids)
        }
    }

    pub fn tools_skipped(ids: &str) -> String {
        if is_chinese() {
            format!("已跳过: {}", ids)
        } else {
            format!("Skipped: {}", ids)
        }
    }

    pub fn tool_failed(id: &str, reason: &str) -> String {
        if is_chinese() {
            format!("✗ {} 失败: {}", id, reason)
        } else {
            format!("✗ {} failed: {}", id, reason)
        }
    }

    pub fn all_tools_up_to_date() -> &'static str {
        if is_chinese() {
            "✓ 所有已安装的工具均为最新版本"
        } else {
            "✓ All installed tools are up to date"
        }
    }

    pub fn unknown_tool(id: &str, available: &str) -> String {
        if is_chinese() {
            format!("未知工具 '{}'，可选: {}", id, available)
        } else {
            format!("Unknown tool '{}'. Available: {}", id, available)
        }
    }

    // ============================================
    // SETTINGS (设置)
    // ============================================

    pub fn select_code_tool() -> &'static str {
        if is_chinese() {
            "选择要管理的代码工具："
        } else {
            "Select the code tool to manage:"
        }
    }

    pub fn code_tool_switched(tool: &str) -> String {
        if is_chinese() {
            format!("✓ 已切换到 {}", tool)
        } else {
            format!("✓ Switched to {}", tool)
        }
    }

    pub fn select_language() -> &'static str {
        if is_chinese() {
            "选择界面语言："
        } else {
            "Select display language:"
        }
    }

    pub fn language_changed() -> &'static str {
        if is_chinese() {
            "✓ 语言已切换为简体中文"
        } else {
            "✓ Language switched to English"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip() {
        for lang in [Language::English, Language::Chinese] {
            assert_eq!(Language::from_code(lang.code()), lang);
        }
        assert_eq!(Language::from_code("fr"), Language::English);
    }

    #[test]
    fn unit_tests_default_to_english() {
        assert_eq!(current_language(), Language::English);
        assert!(texts::backup_created("/x").contains("Backup created"));
    }
}
