use std::fs;
use std::path::PathBuf;

use zcf_lib::BackupService;

mod support;
use support::{list_files, CodexHome};

#[test]
fn missing_codex_dir_yields_none_and_creates_nothing() {
    let home = CodexHome::missing();

    assert_eq!(BackupService::backup_codex_complete(&home.paths).expect("backup"), None);
    assert_eq!(BackupService::backup_codex_config(&home.paths).expect("backup"), None);
    assert!(!home.paths.dir().exists());
    assert!(BackupService::list_codex_backups(&home.paths).expect("list").is_empty());
}

#[test]
fn complete_backup_copies_everything_except_previous_backups() {
    let home = CodexHome::with_config("model = \"o3\"\n");
    fs::write(home.paths.auth_path(), "{}").expect("seed auth");
    fs::write(home.paths.agents_path(), "# agents").expect("seed agents");
    fs::create_dir_all(home.paths.prompts_dir()).expect("mkdir prompts");
    fs::write(home.paths.prompts_dir().join("review.md"), "review").expect("seed prompt");

    let old = home.paths.backup_root().join("backup_2020-01-01_00-00-00");
    fs::create_dir_all(&old).expect("mkdir old backup");
    fs::write(old.join("config.toml"), "old").expect("seed old backup");

    let backup = BackupService::backup_codex_complete(&home.paths)
        .expect("backup")
        .expect("backup created");

    assert!(backup.starts_with(home.paths.backup_root()));
    let copied = list_files(&backup);
    assert_eq!(
        copied,
        vec![
            PathBuf::from("AGENTS.md"),
            PathBuf::from("auth.json"),
            PathBuf::from("config.toml"),
            PathBuf::from("prompts").join("review.md"),
        ]
    );
    assert_eq!(
        fs::read_to_string(backup.join("config.toml")).expect("read copy"),
        "model = \"o3\"\n"
    );

    let listed = BackupService::list_codex_backups(&home.paths).expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].id, "backup_2020-01-01_00-00-00");
}

#[test]
fn single_file_backups_skip_missing_sources() {
    let home = CodexHome::new();

    assert_eq!(BackupService::backup_codex_config(&home.paths).expect("config"), None);
    assert_eq!(BackupService::backup_codex_agents(&home.paths).expect("agents"), None);
    assert_eq!(BackupService::backup_codex_prompts(&home.paths).expect("prompts"), None);
    assert!(home.backups().is_empty());
}

#[test]
fn single_file_backups_copy_only_their_target() {
    let home = CodexHome::with_config("model = \"o3\"\n");
    fs::write(home.paths.agents_path(), "# agents").expect("seed agents");

    let config_copy = BackupService::backup_codex_config(&home.paths)
        .expect("backup")
        .expect("config copied");
    assert!(config_copy.ends_with("config.toml"));

    let agents_copy = BackupService::backup_codex_agents(&home.paths)
        .expect("backup")
        .expect("agents copied");
    assert_eq!(fs::read_to_string(agents_copy).expect("read"), "# agents");

    let backup_dir = config_copy.parent().expect("backup dir");
    assert!(!backup_dir.join("auth.json").exists());
}
