//! Модуль для форматирования и вывода результатов

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// Формат вывода результатов
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Writer для вывода результатов
pub struct OutputWriter {
    writer: Box<dyn Write>,
    format: OutputFormat,
    pretty: bool,
}

impl OutputWriter {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(Box::new(io::stdout()), format)
    }

    pub fn new(writer: Box<dyn Write>, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            pretty: false,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Записывает объект как JSON независимо от формата
    pub fn write_object<T: Serialize>(&mut self, obj: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(obj)?
        } else {
            serde_json::to_string(obj)?
        };
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    pub fn write_header(&mut self, header: &str) -> Result<()> {
        writeln!(self.writer, "\n{}", header.bold().blue())?;
        writeln!(self.writer, "{}", "=".repeat(header.chars().count()).blue())?;
        Ok(())
    }

    /// Записывает таблицу; ширина колонок считается в символах
    pub fn write_table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
        let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let render = |cells: Vec<String>| -> String {
            cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let width = widths.get(i).copied().unwrap_or(0);
                    let pad = width.saturating_sub(cell.chars().count());
                    format!("{}{}", cell, " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" │ ")
        };

        let header_line = render(headers.iter().map(|h| h.to_string()).collect());
        writeln!(self.writer, "{}", header_line.bold())?;

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        writeln!(self.writer, "{}", separator)?;

        for row in rows {
            writeln!(self.writer, "{}", render(row.clone()))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
