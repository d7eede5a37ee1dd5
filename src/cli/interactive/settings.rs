use crate::cli::i18n::{set_language, texts, Language};
use crate::cli::ui::{apply_theme, success};
use crate::error::AppError;
use crate::settings::{set_code_tool_type, CodeToolType};

use super::utils::prompt_select;

pub fn change_language_interactive() -> Result<(), AppError> {
    let languages = vec![Language::English, Language::Chinese];

    let Some(selected) = prompt_select(texts::select_language(), languages)? else {
        return Ok(());
    };

    set_language(selected)?;
    println!("\n{}", success(texts::language_changed()));
    Ok(())
}

/// 返回切换后的代码工具；取消时返回 `None`
pub fn switch_code_tool_interactive() -> Result<Option<CodeToolType>, AppError> {
    let tools = vec![CodeToolType::ClaudeCode, CodeToolType::Codex];

    let Some(tool) = prompt_select(texts::select_code_tool(), tools)? else {
        return Ok(None);
    };

    set_code_tool_type(tool)?;
    apply_theme();
    println!("\n{}", success(&texts::code_tool_switched(&tool.to_string())));
    Ok(Some(tool))
}
