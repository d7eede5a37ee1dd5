use inquire::error::InquireError;
use inquire::{Password, PasswordDisplayMode, Text};
use std::io::{self, Write};

use crate::cli::i18n::texts;
use crate::error::AppError;

pub fn pause() {
    print!("{}", texts::press_enter());
    let _ = io::stdout().flush();
    let mut input = String::new();
    let _ = io::stdin().read_line(&mut input);
}

pub fn prompt_cancelled(err: InquireError) -> AppError {
    log::debug!("prompt aborted: {err}");
    AppError::Message(texts::cancelled().to_string())
}

/// 必填文本输入
pub fn prompt_required(message: &str, default: Option<&str>) -> Result<String, AppError> {
    let mut prompt = Text::new(message).with_validator(|input: &str| {
        if input.trim().is_empty() {
            Ok(inquire::validator::Validation::Invalid(
                crate::t!("Value is required", "不能为空").into(),
            ))
        } else {
            Ok(inquire::validator::Validation::Valid)
        }
    });
    if let Some(default) = default {
        prompt = prompt.with_default(default);
    }
    prompt
        .prompt()
        .map(|v| v.trim().to_string())
        .map_err(prompt_cancelled)
}

/// 可留空的文本输入，空值返回 `None`
pub fn prompt_optional(message: &str, help: Option<&str>) -> Result<Option<String>, AppError> {
    let mut prompt = Text::new(message);
    if let Some(help) = help {
        prompt = prompt.with_help_message(help);
    }
    let value = prompt.prompt().map_err(prompt_cancelled)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// 密钥输入（掩码显示，无需二次确认），空值返回 `None`
pub fn prompt_secret(message: &str, help: Option<&str>) -> Result<Option<String>, AppError> {
    let mut prompt = Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    if let Some(help) = help {
        prompt = prompt.with_help_message(help);
    }
    let value = prompt.prompt().map_err(prompt_cancelled)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// 单选；按 Esc 返回 `None`
pub fn prompt_select<T: std::fmt::Display>(
    message: &str,
    options: Vec<T>,
) -> Result<Option<T>, AppError> {
    match inquire::Select::new(message, options).prompt() {
        Ok(choice) => Ok(Some(choice)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(prompt_cancelled(e)),
    }
}

/// 多选；按 Esc 返回 `None`
pub fn prompt_multi_select<T: std::fmt::Display>(
    message: &str,
    options: Vec<T>,
    defaults: &[usize],
) -> Result<Option<Vec<T>>, AppError> {
    match inquire::MultiSelect::new(message, options)
        .with_default(defaults)
        .prompt()
    {
        Ok(choices) => Ok(Some(choices)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(prompt_cancelled(e)),
    }
}

pub fn prompt_confirm(message: &str, default: bool) -> Result<Option<bool>, AppError> {
    match inquire::Confirm::new(message).with_default(default).prompt() {
        Ok(answer) => Ok(Some(answer)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(prompt_cancelled(e)),
    }
}
