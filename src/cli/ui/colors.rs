use colored::{Color, Colorize};
use inquire::set_global_render_config;
use inquire::ui::{Color as InquireColor, RenderConfig, StyleSheet, Styled};

use crate::settings::{get_settings, CodeToolType};

/// 每个代码工具的强调色：菜单（inquire）与普通输出（colored）各一份
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Accent {
    prompt: InquireColor,
    text: Color,
}

fn accent(tool: CodeToolType) -> Accent {
    match tool {
        CodeToolType::Codex => Accent {
            prompt: InquireColor::LightGreen,
            text: Color::BrightGreen,
        },
        CodeToolType::ClaudeCode => Accent {
            prompt: InquireColor::LightCyan,
            text: Color::BrightCyan,
        },
    }
}

fn menu_render_config(tool: CodeToolType) -> RenderConfig<'static> {
    let color = accent(tool).prompt;
    let styled = StyleSheet::new().with_fg(color);
    RenderConfig::default_colored()
        .with_prompt_prefix(Styled::new("?").with_fg(color))
        .with_answered_prompt_prefix(Styled::new(">").with_fg(color))
        .with_highlighted_option_prefix(Styled::new(">").with_fg(color))
        .with_selected_checkbox(Styled::new("[x]").with_fg(color))
        .with_selected_option(Some(styled))
        .with_help_message(styled)
        .with_answer(styled)
}

/// 按设置里当前管理的代码工具刷新菜单配色；切换工具后需再次调用
pub fn apply_theme() {
    if std::env::var_os("NO_COLOR").is_some() {
        set_global_render_config(RenderConfig::empty());
        return;
    }
    set_global_render_config(menu_render_config(get_settings().code_tool_type));
}

pub fn success(text: &str) -> String {
    text.green().to_string()
}

pub fn error(text: &str) -> String {
    text.red().to_string()
}

pub fn warning(text: &str) -> String {
    text.yellow().to_string()
}

pub fn info(text: &str) -> String {
    text.cyan().to_string()
}

pub fn highlight(text: &str) -> String {
    highlight_for(get_settings().code_tool_type, text)
}

fn highlight_for(tool: CodeToolType, text: &str) -> String {
    text.color(accent(tool).text).bold().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct ForceColor;

    impl ForceColor {
        fn on() -> Self {
            colored::control::set_override(true);
            Self
        }
    }

    impl Drop for ForceColor {
        fn drop(&mut self) {
            colored::control::unset_override();
        }
    }

    #[test]
    #[serial]
    fn highlight_uses_the_tool_accent() {
        let _color = ForceColor::on();

        assert_eq!(
            highlight_for(CodeToolType::Codex, "x"),
            "x".color(Color::BrightGreen).bold().to_string()
        );
        assert_eq!(
            highlight_for(CodeToolType::ClaudeCode, "x"),
            "x".color(Color::BrightCyan).bold().to_string()
        );
    }

    #[test]
    fn menu_prefix_follows_tool() {
        let codex = menu_render_config(CodeToolType::Codex);
        assert_eq!(codex.prompt_prefix.style.fg, Some(InquireColor::LightGreen));

        let claude = menu_render_config(CodeToolType::ClaudeCode);
        assert_eq!(
            claude.highlighted_option_prefix.style.fg,
            Some(InquireColor::LightCyan)
        );
    }
}
