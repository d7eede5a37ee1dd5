use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::i18n::texts;
use crate::codex_config::CodexPaths;
use crate::config::{copy_dir_filtered, copy_file, ensure_dir};
use crate::error::AppError;

const BACKUP_DIR_PREFIX: &str = "backup_";

/// 备份信息
#[derive(Debug, Clone)]
pub struct BackupInfo {
    /// 备份目录名（`backup_<timestamp>`）
    pub id: String,
    pub path: PathBuf,
    pub timestamp: String,
}

/// Codex 配置备份。所有写操作之前调用；备份失败会直接返回错误，调用方应中止写入。
pub struct BackupService;

impl BackupService {
    /// `YYYY-MM-DD_HH-mm-ss`（本地时间）
    pub fn timestamp() -> String {
        Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
    }

    /// 创建 `<codex>/backup/backup_<timestamp>`，已存在时直接返回
    pub fn create_backup_directory(paths: &CodexPaths, timestamp: &str) -> Result<PathBuf, AppError> {
        let dir = paths
            .backup_root()
            .join(format!("{BACKUP_DIR_PREFIX}{timestamp}"));
        ensure_dir(&dir)?;
        Ok(dir)
    }

    /// 为一次备份分配新目录；同一秒内已有备份时追加 `_1`、`_2`… 后缀，不覆盖旧快照
    fn new_backup_directory(paths: &CodexPaths) -> Result<PathBuf, AppError> {
        let timestamp = Self::timestamp();
        let root = paths.backup_root();
        let mut dir = root.join(format!("{BACKUP_DIR_PREFIX}{timestamp}"));
        let mut suffix = 1u32;
        while dir.exists() {
            dir = root.join(format!("{BACKUP_DIR_PREFIX}{timestamp}_{suffix}"));
            suffix += 1;
        }
        ensure_dir(&dir)?;
        Ok(dir)
    }

    /// 完整备份 Codex 目录（排除 `backup/` 自身）。目录不存在时返回 `None` 且不做任何写入。
    pub fn backup_codex_files(paths: &CodexPaths) -> Result<Option<PathBuf>, AppError> {
        if !paths.dir().exists() {
            return Ok(None);
        }

        let backup_dir = Self::new_backup_directory(paths)?;
        copy_dir_filtered(paths.dir(), &backup_dir, &|relative: &Path| {
            !relative.starts_with("backup")
        })?;

        log::info!("已备份 Codex 配置目录到 {}", backup_dir.display());
        Ok(Some(backup_dir))
    }

    pub fn backup_codex_complete(paths: &CodexPaths) -> Result<Option<PathBuf>, AppError> {
        Self::backup_codex_files(paths)
    }

    /// 仅备份 `config.toml`
    pub fn backup_codex_config(paths: &CodexPaths) -> Result<Option<PathBuf>, AppError> {
        Self::backup_single(paths, &paths.config_path(), "config.toml")
    }

    /// 仅备份 `AGENTS.md`
    pub fn backup_codex_agents(paths: &CodexPaths) -> Result<Option<PathBuf>, AppError> {
        Self::backup_single(paths, &paths.agents_path(), "AGENTS.md")
    }

    /// 仅备份 `prompts/` 目录
    pub fn backup_codex_prompts(paths: &CodexPaths) -> Result<Option<PathBuf>, AppError> {
        let source = paths.prompts_dir();
        if !source.is_dir() {
            return Ok(None);
        }
        let backup_dir = Self::new_backup_directory(paths)?;
        let target = backup_dir.join("prompts");
        copy_dir_filtered(&source, &target, &|_: &Path| true)?;
        Ok(Some(target))
    }

    fn backup_single(
        paths: &CodexPaths,
        source: &Path,
        file_name: &str,
    ) -> Result<Option<PathBuf>, AppError> {
        if !source.is_file() {
            return Ok(None);
        }
        let backup_dir = Self::new_backup_directory(paths)?;
        let target = backup_dir.join(file_name);
        copy_file(source, &target)?;
        Ok(Some(target))
    }

    /// 无备份时返回空字符串
    pub fn get_backup_message(path: Option<&Path>) -> String {
        match path {
            Some(path) => texts::backup_created(&path.display().to_string()),
            None => String::new(),
        }
    }

    /// 列出已有备份（最新的在前）
    pub fn list_codex_backups(paths: &CodexPaths) -> Result<Vec<BackupInfo>, AppError> {
        let root = paths.backup_root();
        if !root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&root).map_err(|e| AppError::io(&root, e))?;
        let mut backups: Vec<BackupInfo> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let id = entry.file_name().to_str()?.to_string();
                let timestamp = id.strip_prefix(BACKUP_DIR_PREFIX)?.to_string();
                Some(BackupInfo {
                    id,
                    path: entry.path(),
                    timestamp,
                })
            })
            .collect();

        backups.sort_by(|a, b| order_key(&b.timestamp).cmp(&order_key(&a.timestamp)));
        Ok(backups)
    }
}

/// `2025-01-01_00-00-00_2` -> (`2025-01-01_00-00-00`, 2)
fn order_key(timestamp: &str) -> (&str, u32) {
    match timestamp.rsplit_once('_') {
        Some((base, suffix)) => match suffix.parse() {
            Ok(n) => (base, n),
            Err(_) => (timestamp, 0),
        },
        None => (timestamp, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn timestamp_has_expected_shape() {
        let ts = BackupService::timestamp();
        assert_eq!(ts.len(), "2025-01-02_03-04-05".len());
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "_");
    }

    #[test]
    fn create_backup_directory_is_idempotent() {
        let dir = TempDir::new().expect("temp dir");
        let paths = CodexPaths::new(dir.path());
        let first = BackupService::create_backup_directory(&paths, "2025-01-01_00-00-00")
            .expect("first");
        let second = BackupService::create_backup_directory(&paths, "2025-01-01_00-00-00")
            .expect("second");
        assert_eq!(first, second);
        assert!(first.ends_with("backup/backup_2025-01-01_00-00-00"));
    }

    #[test]
    fn backup_message_is_empty_without_path() {
        assert_eq!(BackupService::get_backup_message(None), "");
        let message = BackupService::get_backup_message(Some(Path::new("/tmp/backup_x")));
        assert!(message.contains("/tmp/backup_x"));
    }

    #[test]
    fn list_backups_sorts_newest_first() {
        let dir = TempDir::new().expect("temp dir");
        let paths = CodexPaths::new(dir.path());
        for ts in ["2025-01-01_00-00-00", "2025-03-01_00-00-00", "2025-02-01_00-00-00"] {
            BackupService::create_backup_directory(&paths, ts).expect("create");
        }
        fs::create_dir_all(paths.backup_root().join("unrelated")).expect("mkdir");

        let backups = BackupService::list_codex_backups(&paths).expect("list");
        let ids: Vec<_> = backups.iter().map(|b| b.timestamp.as_str()).collect();
        assert_eq!(
            ids,
            vec!["2025-03-01_00-00-00", "2025-02-01_00-00-00", "2025-01-01_00-00-00"]
        );
    }

    #[test]
    fn same_second_suffixes_sort_numerically() {
        let dir = TempDir::new().expect("temp dir");
        let paths = CodexPaths::new(dir.path());
        for ts in ["2025-01-01_00-00-00", "2025-01-01_00-00-00_2", "2025-01-01_00-00-00_10"] {
            BackupService::create_backup_directory(&paths, ts).expect("create");
        }

        let backups = BackupService::list_codex_backups(&paths).expect("list");
        let ids: Vec<_> = backups.iter().map(|b| b.timestamp.as_str()).collect();
        assert_eq!(
            ids,
            vec!["2025-01-01_00-00-00_10", "2025-01-01_00-00-00_2", "2025-01-01_00-00-00"]
        );
    }

    #[test]
    fn back_to_back_backups_keep_both_snapshots() {
        let dir = TempDir::new().expect("temp dir");
        let paths = CodexPaths::new(dir.path());
        fs::write(paths.config_path(), "model = \"first\"\n").expect("seed");

        let first = BackupService::backup_codex_complete(&paths)
            .expect("backup")
            .expect("first backup");
        fs::write(paths.config_path(), "model = \"second\"\n").expect("rewrite");
        let second = BackupService::backup_codex_complete(&paths)
            .expect("backup")
            .expect("second backup");

        assert_ne!(first, second);
        assert_eq!(
            fs::read_to_string(first.join("config.toml")).expect("read first"),
            "model = \"first\"\n"
        );
        assert_eq!(
            fs::read_to_string(second.join("config.toml")).expect("read second"),
            "model = \"second\"\n"
        );
    }
}
