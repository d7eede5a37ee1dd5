use crate::cli::i18n::texts;
use crate::cli::ui::{create_table, error, highlight, info, success, warning};
use crate::error::AppError;
use crate::services::{
    check_tool, find_cli_tool, get_cli_tools, run_update_sweep, CliTool, NpmToolUpdater,
    ToolUpdater, UpdateSummary, VersionCheck, VersionStatus,
};

fn status_display(status: VersionStatus) -> &'static str {
    match status {
        VersionStatus::Latest => texts::status_latest(),
        VersionStatus::Upgradable => texts::status_upgradable(),
        VersionStatus::NotInstalled => texts::status_not_installed(),
        VersionStatus::FetchFailed => texts::status_fetch_failed(),
    }
}

fn select_tools(tool_id: Option<&str>) -> Result<Vec<CliTool>, AppError> {
    match tool_id {
        None => Ok(get_cli_tools().to_vec()),
        Some(id) => {
            let tool = find_cli_tool(id).ok_or_else(|| {
                let available: Vec<_> = get_cli_tools().iter().map(|t| t.id).collect();
                AppError::InvalidInput(texts::unknown_tool(id, &available.join(", ")))
            })?;
            Ok(vec![*tool])
        }
    }
}

/// 检查版本并按需升级。`yes` 为真时不再逐个确认。
pub fn check_updates(tool_id: Option<&str>, yes: bool) -> Result<(), AppError> {
    let tools = select_tools(tool_id)?;
    let updater = NpmToolUpdater::new()?;

    println!("\n{}", highlight(texts::update_check_title()));
    println!("{}", "═".repeat(60));

    let checks = collect_checks(&tools, &updater);
    print_checks(&checks);

    let upgradable: Vec<CliTool> = checks
        .iter()
        .filter(|c| c.status == VersionStatus::Upgradable)
        .map(|c| c.tool)
        .collect();

    if let Err(e) = crate::settings::record_update_check() {
        log::warn!("记录更新检查时间失败: {e}");
    }

    if upgradable.is_empty() {
        if checks.iter().all(|c| c.status != VersionStatus::FetchFailed) {
            println!("{}", success(texts::all_tools_up_to_date()));
        }
        return Ok(());
    }

    println!();
    let summary = run_update_sweep(&upgradable, &updater, |check| {
        if yes {
            return true;
        }
        let message = texts::confirm_upgrade(
            check.tool.label,
            check.current.as_deref().unwrap_or("-"),
            check.latest.as_deref().unwrap_or("-"),
        );
        match inquire::Confirm::new(&message).with_default(true).prompt() {
            Ok(answer) => answer,
            Err(e) => {
                log::debug!("upgrade prompt aborted: {e}");
                false
            }
        }
    });
    print_summary(&summary);
    Ok(())
}

fn collect_checks(tools: &[CliTool], updater: &dyn ToolUpdater) -> Vec<VersionCheck> {
    let pb = indicatif::ProgressBar::new(tools.len() as u64);
    if let Ok(style) =
        indicatif::ProgressStyle::default_bar().template(texts::checking_progress_template())
    {
        pb.set_style(style);
    }

    let mut checks = Vec::with_capacity(tools.len());
    for tool in tools {
        pb.set_message(tool.label);
        checks.push(check_tool(tool, updater));
        pb.inc(1);
    }
    pb.finish_and_clear();
    checks
}

fn print_checks(checks: &[VersionCheck]) {
    let mut table = create_table();
    table.set_header(vec![
        texts::header_tool(),
        texts::header_current(),
        texts::header_latest(),
        texts::header_status(),
    ]);
    for check in checks {
        table.add_row(vec![
            check.tool.label,
            check.current.as_deref().unwrap_or("-"),
            check.latest.as_deref().unwrap_or("-"),
            status_display(check.status),
        ]);
    }
    println!("{}", table);

    for check in checks {
        if let Some(err) = &check.error {
            println!("{}", error(&texts::tool_failed(check.tool.label, err)));
        }
    }
}

fn print_summary(summary: &UpdateSummary) {
    println!();
    if !summary.updated.is_empty() {
        println!("{}", success(&texts::tools_updated(&summary.updated.join(", "))));
    }
    if !summary.skipped.is_empty() {
        println!("{}", info(&texts::tools_skipped(&summary.skipped.join(", "))));
    }
    for (id, reason) in &summary.failed {
        println!("{}", warning(&texts::tool_failed(id, reason)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_tools_rejects_unknown_ids() {
        assert_eq!(select_tools(None).expect("all").len(), get_cli_tools().len());
        assert_eq!(select_tools(Some("codex")).expect("codex")[0].id, "codex");
        assert!(matches!(
            select_tools(Some("gemini")),
            Err(AppError::InvalidInput(_))
        ));
    }
}
