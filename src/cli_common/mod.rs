//! Общий модуль для CLI
//!
//! Содержит функциональность, общую для всех подкоманд:
//! - Инициализация логирования
//! - Цветные статусные строки
//! - Форматирование вывода

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::core::StatusLevel;

pub mod args;
pub mod output;

pub use args::{CommonArgs, OutputArgs};
pub use output::{OutputFormat, OutputWriter};

/// Инициализирует логирование: INFO, либо DEBUG в режиме verbose
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    init_with_level(level)
}

/// Минимальное логирование для тихого режима (только WARN и ERROR)
pub fn init_minimal_logging() -> Result<()> {
    init_with_level(tracing::Level::WARN)
}

fn init_with_level(level: tracing::Level) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}

pub fn print_success(message: &str) {
    println!("{} {}", "✅".green(), message.green());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ️".blue(), message);
}

/// Печатает сообщение в стиле, соответствующем уровню
pub fn print_status(level: StatusLevel, message: &str) {
    match level {
        StatusLevel::Success => print_success(message),
        StatusLevel::Info => print_info(message),
        StatusLevel::Warning => print_warning(message),
        StatusLevel::Error => print_error(message),
    }
}

/// Проверяет, что путь существует
pub fn validate_path(path: &Path, description: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "{} does not exist: {}",
            description,
            path.display()
        ));
    }
    Ok(())
}

/// Форматирует размер файла
pub fn format_file_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Разбирает значение флага вида yes/no
pub fn parse_bool_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("expected true/false, got '{}'", other)),
    }
}
