use clap::Parser;
use std::process;
use zcf_lib::cli::{Cli, Commands};
use zcf_lib::{get_claude_config_dir, AppError, CodexPaths};

fn main() {
    // 解析命令行参数
    let cli = Cli::parse();

    // 默认只显示错误日志，避免干扰菜单和命令输出
    let log_level = if cli.verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let codex_paths = match cli.codex_dir {
        Some(dir) => CodexPaths::new(dir),
        None => CodexPaths::detect()?,
    };
    log::debug!("Codex 配置目录: {}", codex_paths.dir().display());

    match cli.command {
        // Default to interactive mode if no command is provided
        None | Some(Commands::Interactive) => {
            let claude_dir = get_claude_config_dir()?;
            zcf_lib::cli::interactive::run(&codex_paths, &claude_dir)
        }
        Some(Commands::Codex(cmd)) => zcf_lib::cli::commands::codex::execute(cmd, &codex_paths),
        Some(Commands::Claude(cmd)) => {
            let claude_dir = get_claude_config_dir()?;
            zcf_lib::cli::commands::claude::execute(cmd, &claude_dir)
        }
        Some(Commands::CheckUpdates { tool, yes }) => {
            zcf_lib::cli::commands::check::check_updates(tool.as_deref(), yes)
        }
        Some(Commands::Lang { lang }) => zcf_lib::cli::commands::settings::set_lang(lang.into()),
        Some(Commands::Completions { shell }) => {
            zcf_lib::cli::generate_completions(shell);
            Ok(())
        }
    }
}
