#![allow(dead_code)]

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use zcf_lib::CodexPaths;

/// 临时的 Codex 配置目录，测试结束自动清理
pub struct CodexHome {
    _root: TempDir,
    pub paths: CodexPaths,
}

impl CodexHome {
    /// 已存在但为空的 `.codex` 目录
    pub fn new() -> Self {
        let home = Self::missing();
        fs::create_dir_all(home.paths.dir()).expect("create codex dir");
        home
    }

    /// 尚未创建的 `.codex` 目录
    pub fn missing() -> Self {
        let root = TempDir::new().expect("create temp dir");
        let paths = CodexPaths::new(root.path().join(".codex"));
        Self { _root: root, paths }
    }

    pub fn with_config(text: &str) -> Self {
        let home = Self::new();
        home.write_config(text);
        home
    }

    pub fn write_config(&self, text: &str) {
        fs::write(self.paths.config_path(), text).expect("seed config.toml");
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.paths.config_path()).expect("read config.toml")
    }

    pub fn write_auth(&self, value: &Value) {
        let text = serde_json::to_string_pretty(value).expect("serialize auth");
        fs::write(self.paths.auth_path(), text).expect("seed auth.json");
    }

    pub fn read_auth(&self) -> Value {
        let text = fs::read_to_string(self.paths.auth_path()).expect("read auth.json");
        serde_json::from_str(&text).expect("parse auth.json")
    }

    pub fn backups(&self) -> Vec<PathBuf> {
        let root = self.paths.backup_root();
        if !root.exists() {
            return Vec::new();
        }
        let mut dirs: Vec<PathBuf> = fs::read_dir(root)
            .expect("read backup root")
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        dirs.sort();
        dirs
    }
}

/// 目录下所有文件的相对路径（排序后），用于断言「没有写入」
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_path_buf());
            }
        }
    }

    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}
