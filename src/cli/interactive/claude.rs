use std::fmt;
use std::path::Path;

use crate::claude_settings::ClaudeAuthKind;
use crate::cli::commands::claude::apply_api;
use crate::cli::i18n::texts;
use crate::error::AppError;

use super::utils::{prompt_optional, prompt_secret, prompt_select};

struct AuthChoice(ClaudeAuthKind);

impl fmt::Display for AuthChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ClaudeAuthKind::ApiKey => f.write_str(texts::auth_kind_api_key()),
            ClaudeAuthKind::AuthToken => f.write_str(texts::auth_kind_auth_token()),
        }
    }
}

pub fn configure_api_interactive(dir: &Path) -> Result<(), AppError> {
    let base_url = prompt_optional(texts::prompt_claude_base_url(), None)?;
    let choices = vec![
        AuthChoice(ClaudeAuthKind::AuthToken),
        AuthChoice(ClaudeAuthKind::ApiKey),
    ];
    let Some(AuthChoice(auth)) = prompt_select(texts::select_auth_kind(), choices)? else {
        return Ok(());
    };
    let Some(key) = prompt_secret(texts::prompt_api_key(), None)? else {
        return Ok(());
    };
    apply_api(dir, base_url.as_deref(), &key, auth)
}
