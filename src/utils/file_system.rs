//! 文件系统操作工具
//!
//! 提供跨平台的数据目录、日志目录访问

use std::path::PathBuf;

/// 获取数据目录路径（跨平台）
///
/// - macOS: ~/Library/Application Support/care-octopus
/// - Windows: %APPDATA%/care-octopus
/// - Linux: ~/.local/share/care-octopus
pub fn get_data_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Application Support/care-octopus")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("care-octopus")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/care-octopus")
    }
}

/// 获取日志目录路径（跨平台）
///
/// - macOS: ~/Library/Logs/care-octopus
/// - Windows: %APPDATA%/care-octopus/logs
/// - Linux: ~/.local/share/care-octopus/logs
pub fn get_log_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Logs/care-octopus")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("care-octopus").join("logs")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/care-octopus/logs")
    }
}
