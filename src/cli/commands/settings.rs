use crate::cli::i18n::{set_language, texts, Language};
use crate::cli::ui::success;
use crate::error::AppError;

pub fn set_lang(lang: Language) -> Result<(), AppError> {
    set_language(lang)?;
    println!("{}", success(texts::language_changed()));
    Ok(())
}
