use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

pub mod commands;
pub mod i18n;
pub mod interactive;
pub mod ui;

#[derive(Parser)]
#[command(
    name = "zcf",
    version,
    about = "Zero-Config Code Flow for Claude Code & Codex",
    long_about = "Configure API providers, MCP services and backups for Claude Code and Codex, and keep the surrounding CLI tools up to date.\n\nRun without arguments to enter interactive mode."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Codex configuration directory (overrides settings and $CODEX_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    pub codex_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage Codex providers, MCP services and backups
    #[command(subcommand)]
    Codex(commands::codex::CodexCommand),

    /// Configure the Claude Code API
    #[command(subcommand)]
    Claude(commands::claude::ClaudeCommand),

    /// Check and upgrade Claude Code, Codex and related CLI tools
    #[command(alias = "update")]
    CheckUpdates {
        /// Only check this tool (claude, codex, ccr, ccline, ccusage)
        tool: Option<String>,

        /// Upgrade without asking for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Set the display language
    Lang {
        #[arg(value_enum)]
        lang: LangArg,
    },

    /// Enter interactive mode
    #[command(alias = "menu")]
    Interactive,

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LangArg {
    #[value(name = "en")]
    En,
    #[value(name = "zh-CN", alias = "zh")]
    ZhCn,
}

impl From<LangArg> for i18n::Language {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => i18n::Language::English,
            LangArg::ZhCn => i18n::Language::Chinese,
        }
    }
}

/// Generate shell completions
pub fn generate_completions(shell: Shell) {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_codex_commands() {
        let cli = Cli::try_parse_from(["zcf", "codex", "provider", "switch", "packy"])
            .expect("parse");
        assert!(matches!(cli.command, Some(Commands::Codex(_))));

        let cli = Cli::try_parse_from(["zcf", "lang", "zh-CN"]).expect("parse lang");
        assert!(matches!(
            cli.command,
            Some(Commands::Lang {
                lang: LangArg::ZhCn
            })
        ));
    }
}
