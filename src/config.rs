use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 获取用户主目录
pub fn get_home_dir() -> Result<PathBuf, AppError> {
    dirs::home_dir().ok_or_else(|| AppError::Config("无法获取用户主目录".into()))
}

/// 获取 Claude Code 配置目录（优先 `CLAUDE_CONFIG_DIR`）
pub fn get_claude_config_dir() -> Result<PathBuf, AppError> {
    if let Some(dir) = std::env::var_os("CLAUDE_CONFIG_DIR").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    Ok(get_home_dir()?.join(".claude"))
}

/// 获取 ZCF 自身配置目录 `~/.ufomiao/zcf`
pub fn get_zcf_config_dir() -> Result<PathBuf, AppError> {
    Ok(get_home_dir()?.join(".ufomiao").join("zcf"))
}

/// 展开 `~` / `~/` 前缀
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(stripped) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if let Some(stripped) = raw.strip_prefix("~\\") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    PathBuf::from(raw)
}

pub fn ensure_dir(path: &Path) -> Result<(), AppError> {
    fs::create_dir_all(path).map_err(|e| AppError::io(path, e))
}

/// 原子写入：先写同目录临时文件，再 rename 覆盖目标
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| AppError::Config(format!("无效的路径: {}", path.display())))?;
    ensure_dir(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| AppError::io(parent, e))?;
    tmp.write_all(data).map_err(|e| AppError::io(tmp.path(), e))?;
    tmp.flush().map_err(|e| AppError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| AppError::io(path, e.error))?;
    Ok(())
}

pub fn read_text_file(path: &Path) -> Result<Option<String>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| AppError::io(path, e))
}

pub fn write_text_file(path: &Path, content: &str) -> Result<(), AppError> {
    atomic_write(path, content.as_bytes())
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let content = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| AppError::json(path, e))
}

pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| AppError::JsonSerialize { source: e })?;
    atomic_write(path, json.as_bytes())
}

pub fn copy_file(src: &Path, dst: &Path) -> Result<(), AppError> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).map_err(|e| AppError::io(src, e))?;
    Ok(())
}

/// 递归复制目录，`filter` 接收相对 `src` 的路径，返回 false 的条目（及其子树）被跳过
pub fn copy_dir_filtered<F>(src: &Path, dst: &Path, filter: &F) -> Result<(), AppError>
where
    F: Fn(&Path) -> bool,
{
    copy_dir_inner(src, src, dst, filter)
}

fn copy_dir_inner<F>(root: &Path, src: &Path, dst: &Path, filter: &F) -> Result<(), AppError>
where
    F: Fn(&Path) -> bool,
{
    ensure_dir(dst)?;
    let entries = fs::read_dir(src).map_err(|e| AppError::io(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| AppError::io(src, e))?;
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if !filter(relative) {
            log::debug!("跳过备份条目: {}", path.display());
            continue;
        }

        let target = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| AppError::io(&path, e))?;
        if file_type.is_dir() {
            copy_dir_inner(root, &path, &target, filter)?;
        } else {
            copy_file(&path, &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("file.txt");

        atomic_write(&path, b"first").expect("first write");
        atomic_write(&path, b"second").expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read back"), "second");
    }

    #[test]
    fn copy_dir_filtered_skips_rejected_subtrees() {
        let dir = TempDir::new().expect("temp dir");
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("keep")).expect("mkdir keep");
        fs::create_dir_all(src.join("skip")).expect("mkdir skip");
        fs::write(src.join("keep").join("a.txt"), "a").expect("write a");
        fs::write(src.join("skip").join("b.txt"), "b").expect("write b");
        fs::write(src.join("root.txt"), "r").expect("write root");

        let dst = dir.path().join("dst");
        copy_dir_filtered(&src, &dst, &|rel: &Path| !rel.starts_with("skip"))
            .expect("copy dir");

        assert!(dst.join("keep").join("a.txt").exists());
        assert!(dst.join("root.txt").exists());
        assert!(!dst.join("skip").exists());
    }

    #[test]
    fn read_text_file_returns_none_for_missing() {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join("missing.toml");
        assert!(read_text_file(&missing).expect("read").is_none());
    }
}
