//! Общие аргументы командной строки

use clap::Args;
use std::path::PathBuf;

use super::output::OutputFormat;

/// Общие аргументы для всех команд
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Аргументы для работы с выводом
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Pretty print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl CommonArgs {
    /// Определяет уровень логирования на основе флагов
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    pub fn should_print(&self) -> bool {
        !self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        output: OutputArgs,
    }

    #[test]
    fn test_log_level_from_flags() {
        let cli = TestCli::parse_from(["test", "--quiet"]);
        assert_eq!(cli.common.log_level(), tracing::Level::ERROR);
        assert!(!cli.common.should_print());

        let cli = TestCli::parse_from(["test", "-v", "--format", "json"]);
        assert_eq!(cli.common.log_level(), tracing::Level::DEBUG);
        assert_eq!(cli.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(TestCli::try_parse_from(["test", "-q", "-v"]).is_err());
    }
}
