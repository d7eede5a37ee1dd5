use clap::Subcommand;
use std::path::Path;

use crate::claude_settings::{
    clear_claude_api, configure_claude_api, get_claude_settings_path, ClaudeAuthKind,
};
use crate::cli::i18n::texts;
use crate::cli::interactive::utils::prompt_secret;
use crate::cli::ui::{info, success};
use crate::error::AppError;

#[derive(Subcommand)]
pub enum ClaudeCommand {
    /// Write the API base URL and key into Claude Code settings.json
    Api {
        /// API base URL (omit for the official endpoint)
        #[arg(long)]
        base_url: Option<String>,
        /// API key or auth token (prompted when omitted)
        #[arg(long)]
        key: Option<String>,
        /// Which environment variable carries the key
        #[arg(long, value_enum, default_value = "api-key")]
        auth: ClaudeAuthKind,
    },
    /// Remove API settings from Claude Code settings.json
    ClearApi,
}

pub fn execute(cmd: ClaudeCommand, dir: &Path) -> Result<(), AppError> {
    match cmd {
        ClaudeCommand::Api {
            base_url,
            key,
            auth,
        } => {
            let key = match key {
                Some(key) => key,
                None => prompt_secret(texts::prompt_api_key(), None)?.unwrap_or_default(),
            };
            apply_api(dir, base_url.as_deref(), &key, auth)
        }
        ClaudeCommand::ClearApi => clear_api(dir),
    }
}

pub(crate) fn apply_api(
    dir: &Path,
    base_url: Option<&str>,
    key: &str,
    auth: ClaudeAuthKind,
) -> Result<(), AppError> {
    let backup = configure_claude_api(dir, base_url, key, auth)?;
    let path = get_claude_settings_path(dir);
    println!(
        "{}",
        success(&texts::claude_api_configured(&path.display().to_string()))
    );
    if let Some(backup) = backup {
        println!("{}", info(&texts::backup_created(&backup.display().to_string())));
    }
    Ok(())
}

pub(crate) fn clear_api(dir: &Path) -> Result<(), AppError> {
    if clear_claude_api(dir)? {
        println!("{}", success(texts::claude_api_cleared()));
    } else {
        println!("{}", info(texts::claude_api_not_configured()));
    }
    Ok(())
}
