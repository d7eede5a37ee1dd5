mod claude;
pub(crate) mod codex;
mod settings;
pub(crate) mod utils;

use std::path::Path;

use crate::cli::commands;
use crate::cli::i18n::texts;
use crate::cli::ui::{apply_theme, error, highlight, info, success, warning};
use crate::codex_config::CodexPaths;
use crate::error::AppError;
use crate::settings::{get_settings, CodeToolType};

use utils::{pause, prompt_select};

pub fn run(codex_paths: &CodexPaths, claude_dir: &Path) -> Result<(), AppError> {
    let mut tool = get_settings().code_tool_type;
    apply_theme();

    print_welcome(tool);

    loop {
        let Some(choice) = show_main_menu(tool)? else {
            println!("\n{}", success(texts::goodbye()));
            break;
        };

        let result = match choice {
            MainMenuChoice::CodexApi => codex::configure_api_interactive(codex_paths),
            MainMenuChoice::SwitchProvider => codex::switch_provider_interactive(codex_paths),
            MainMenuChoice::AddProvider => codex::add_provider_interactive(codex_paths),
            MainMenuChoice::EditProvider => codex::edit_provider_interactive(codex_paths),
            MainMenuChoice::DeleteProviders => codex::delete_providers_interactive(codex_paths),
            MainMenuChoice::ConfigureMcp => codex::configure_mcp_interactive(codex_paths),
            MainMenuChoice::RemoveMcp => codex::remove_mcp_interactive(codex_paths),
            MainMenuChoice::ShowConfig => commands::codex::show_config(codex_paths),
            MainMenuChoice::Backup => commands::codex::backup_now(codex_paths),
            MainMenuChoice::ListBackups => commands::codex::list_backups(codex_paths),
            MainMenuChoice::ClaudeApi => claude::configure_api_interactive(claude_dir),
            MainMenuChoice::ClaudeClearApi => commands::claude::clear_api(claude_dir),
            MainMenuChoice::CheckUpdates => commands::check::check_updates(None, false),
            MainMenuChoice::SwitchTool => match settings::switch_code_tool_interactive() {
                Ok(Some(new_tool)) => {
                    tool = new_tool;
                    print_welcome(tool);
                    continue;
                }
                Ok(None) => continue,
                Err(e) => Err(e),
            },
            MainMenuChoice::Language => settings::change_language_interactive(),
            MainMenuChoice::Exit => {
                println!("\n{}", success(texts::goodbye()));
                break;
            }
        };

        match result {
            Err(e) if e.is_user_error() => println!("\n{}", warning(&e.to_string())),
            Err(e) => println!("\n{}", error(&format!("{}: {}", texts::error_prefix(), e))),
            Ok(()) => {}
        }
        pause();
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainMenuChoice {
    CodexApi,
    SwitchProvider,
    AddProvider,
    EditProvider,
    DeleteProviders,
    ConfigureMcp,
    RemoveMcp,
    ShowConfig,
    Backup,
    ListBackups,
    ClaudeApi,
    ClaudeClearApi,
    CheckUpdates,
    SwitchTool,
    Language,
    Exit,
}

impl std::fmt::Display for MainMenuChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::CodexApi => texts::menu_codex_api(),
            Self::SwitchProvider => texts::menu_switch_provider(),
            Self::AddProvider => texts::menu_add_provider(),
            Self::EditProvider => texts::menu_edit_provider(),
            Self::DeleteProviders => texts::menu_delete_providers(),
            Self::ConfigureMcp => texts::menu_configure_mcp(),
            Self::RemoveMcp => texts::menu_remove_mcp(),
            Self::ShowConfig => texts::menu_show_config(),
            Self::Backup => texts::menu_backup(),
            Self::ListBackups => texts::menu_list_backups(),
            Self::ClaudeApi => texts::menu_claude_api(),
            Self::ClaudeClearApi => texts::menu_claude_clear_api(),
            Self::CheckUpdates => texts::menu_check_updates(),
            Self::SwitchTool => texts::menu_switch_tool(),
            Self::Language => texts::menu_language(),
            Self::Exit => texts::menu_exit(),
        };
        write!(f, "{}", text)
    }
}

fn menu_for(tool: CodeToolType) -> Vec<MainMenuChoice> {
    let mut choices = match tool {
        CodeToolType::Codex => vec![
            MainMenuChoice::CodexApi,
            MainMenuChoice::SwitchProvider,
            MainMenuChoice::AddProvider,
            MainMenuChoice::EditProvider,
            MainMenuChoice::DeleteProviders,
            MainMenuChoice::ConfigureMcp,
            MainMenuChoice::RemoveMcp,
            MainMenuChoice::ShowConfig,
            MainMenuChoice::Backup,
            MainMenuChoice::ListBackups,
        ],
        CodeToolType::ClaudeCode => vec![MainMenuChoice::ClaudeApi, MainMenuChoice::ClaudeClearApi],
    };
    choices.extend([
        MainMenuChoice::CheckUpdates,
        MainMenuChoice::SwitchTool,
        MainMenuChoice::Language,
        MainMenuChoice::Exit,
    ]);
    choices
}

fn print_welcome(tool: CodeToolType) {
    println!("\n{}", "═".repeat(60));
    println!("{}", highlight(texts::welcome_title()));
    println!("{}", "═".repeat(60));
    println!(
        "{} {}: {}",
        info("🛠"),
        texts::code_tool_label(),
        highlight(&tool.to_string())
    );
    println!("{}", "─".repeat(60));
    println!();
}

fn show_main_menu(tool: CodeToolType) -> Result<Option<MainMenuChoice>, AppError> {
    prompt_select(&texts::main_menu_prompt(&tool.to_string()), menu_for(tool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codex_menu_exposes_provider_and_mcp_actions() {
        let menu = menu_for(CodeToolType::Codex);
        assert!(menu.contains(&MainMenuChoice::SwitchProvider));
        assert!(menu.contains(&MainMenuChoice::ConfigureMcp));
        assert!(!menu.contains(&MainMenuChoice::ClaudeApi));
        assert_eq!(menu.last(), Some(&MainMenuChoice::Exit));
    }

    #[test]
    fn claude_menu_hides_codex_actions() {
        let menu = menu_for(CodeToolType::ClaudeCode);
        assert!(menu.contains(&MainMenuChoice::ClaudeApi));
        assert!(!menu.contains(&MainMenuChoice::CodexApi));
    }
}
