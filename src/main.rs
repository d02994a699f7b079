/*!
# csv-utf8sig CLI

Re-encode CSV files as UTF-8 with a byte-order mark so Excel shows
non-ASCII text correctly, and manage the download-observer settings.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use csv_utf8sig::cli_common::{
    self, init_logging, init_minimal_logging, parse_bool_flag, print_error, print_info,
    print_status, print_success, print_warning, CommonArgs, OutputArgs, OutputFormat, OutputWriter,
};
use csv_utf8sig::config::{default_settings_path, Settings, SettingsPatch};
use csv_utf8sig::convert::{
    inspect_file, is_csv_name, DirectorySink, DownloadSink, EncodingClass, InspectReport,
    MemorySink,
};
use csv_utf8sig::downloads::{parse_whitelist_text, DownloadDecision, DownloadItem, RecentDownloadStore};
use csv_utf8sig::service::{ConversionService, Notification, Request, Response};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const RECENT_FILE: &str = "recent.json";

#[derive(Parser)]
#[command(
    name = "csv-utf8sig",
    version = env!("CARGO_PKG_VERSION"),
    about = "Convert CSV files to UTF-8 with BOM (UTF-8-sig) for Excel"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert CSV files (the most recent download when no file is given)
    Convert {
        /// CSV files to convert
        files: Vec<PathBuf>,

        /// Directory for converted files (defaults to each input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Only report what would be converted
        #[arg(long)]
        dry_run: bool,
    },

    /// Report the encoding of CSV files without converting them
    Check {
        /// CSV file or directory
        path: PathBuf,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Report a finished download to the observer
    DownloadCompleted {
        /// Full path of the downloaded file
        file: String,

        /// Page the download was started from
        #[arg(long)]
        url: Option<String>,

        /// MIME type reported for the download
        #[arg(long)]
        mime: Option<String>,
    },

    /// Inspect or clear the recent download slot
    Recent {
        #[command(subcommand)]
        command: RecentCommands,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print current settings
    Show {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Change individual flags
    Set {
        #[arg(long, value_parser = parse_bool_flag)]
        auto_notify: Option<bool>,

        #[arg(long, value_parser = parse_bool_flag)]
        show_notifications: Option<bool>,

        #[arg(long, value_parser = parse_bool_flag)]
        include_subdomains: Option<bool>,
    },

    /// Replace the origin whitelist from a file, one host per line ("-" reads stdin)
    Whitelist {
        source: String,
    },

    /// Restore default settings
    Reset,
}

#[derive(Subcommand)]
enum RecentCommands {
    Show,
    Clear,
}

/// Resolved file locations for this run
struct Paths {
    settings: PathBuf,
    recent: PathBuf,
}

impl Paths {
    fn resolve(common: &CommonArgs) -> Result<Self> {
        let settings = match &common.config {
            Some(path) => path.clone(),
            None => default_settings_path()?,
        };
        let recent = settings
            .parent()
            .map(|dir| dir.join(RECENT_FILE))
            .unwrap_or_else(|| PathBuf::from(RECENT_FILE));
        Ok(Self { settings, recent })
    }

    fn open_service<S: DownloadSink>(&self, sink: S) -> Result<ConversionService<S>> {
        let settings = Settings::load_or_default(&self.settings)?;
        Ok(self.service(settings, sink))
    }

    fn service<S: DownloadSink>(&self, settings: Settings, sink: S) -> ConversionService<S> {
        ConversionService::new(settings, RecentDownloadStore::new(&self.recent), sink)
            .with_settings_path(&self.settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.common.quiet {
        init_minimal_logging()?;
    } else {
        init_logging(cli.common.verbose)?;
    }
    tracing::debug!("Log level {:?}", cli.common.log_level());

    let paths = Paths::resolve(&cli.common)?;
    let ok = match cli.command {
        Commands::Convert {
            files,
            output_dir,
            dry_run,
        } => convert_command(&paths, &cli.common, files, output_dir, dry_run)?,
        Commands::Check {
            path,
            recursive,
            output,
        } => check_command(&path, recursive, &output)?,
        Commands::Settings { command } => settings_command(&paths, command)?,
        Commands::DownloadCompleted { file, url, mime } => {
            download_completed_command(&paths, file, url, mime)?
        }
        Commands::Recent { command } => recent_command(&paths, command)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn convert_command(
    paths: &Paths,
    common: &CommonArgs,
    files: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<bool> {
    if files.is_empty() {
        return convert_recent(paths, common, output_dir, dry_run);
    }

    let settings = Settings::load_or_default(&paths.settings)?;
    let progress = (files.len() > 1 && common.should_print()).then(|| {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(bar_style) = ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
            pb.set_style(bar_style);
        }
        pb
    });

    let mut failures = 0;
    for file in &files {
        if let Some(pb) = &progress {
            pb.set_message(file.display().to_string());
        }

        let result = if dry_run {
            dry_run_file(file).map(|report| (report.class.needs_conversion(), describe_dry_run(&report)))
        } else {
            let dir = output_dir
                .clone()
                .unwrap_or_else(|| parent_dir(file));
            let mut service = paths.service(settings.clone(), DirectorySink::new(dir));
            match service.handle(Request::ConvertFile { path: file.clone() }) {
                Response::Converted {
                    report,
                    notification,
                } => {
                    if let Some(notification) = notification {
                        above_progress(&progress, || show_notification(&notification));
                    }
                    Ok((report.is_converted(), report.message()))
                }
                Response::Error { message, .. } => Err(anyhow::anyhow!(message)),
                other => Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
            }
        };

        match result {
            Ok(_) if !common.should_print() => {}
            Ok((true, line)) => above_progress(&progress, || print_success(&line)),
            Ok((false, line)) => above_progress(&progress, || print_info(&line)),
            Err(e) => {
                failures += 1;
                above_progress(&progress, || {
                    print_error(&format!("{}: {:#}", file.display(), e))
                });
            }
        }

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    if files.len() > 1 && common.should_print() {
        println!(
            "{} file(s) processed, {} failed",
            style(files.len()).bold(),
            style(failures).red()
        );
    }
    Ok(failures == 0)
}

/// Print without tearing an active progress bar
fn above_progress(progress: &Option<ProgressBar>, print: impl FnOnce()) {
    match progress {
        Some(pb) => pb.suspend(print),
        None => print(),
    }
}

fn convert_recent(
    paths: &Paths,
    common: &CommonArgs,
    output_dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<bool> {
    let store = RecentDownloadStore::new(&paths.recent);
    let Some(recent) = store.get_recent(chrono::Utc::now())? else {
        print_warning("No recent CSV download. Pass the files to convert explicitly.");
        return Ok(false);
    };

    if common.should_print() {
        print_info(&format!("Using recent download: {}", recent.filename));
    }
    if dry_run {
        let report = dry_run_file(&recent.full_path)?;
        print_info(&describe_dry_run(&report));
        return Ok(true);
    }

    let dir = output_dir.unwrap_or_else(|| parent_dir(&recent.full_path));
    let mut service = paths.open_service(DirectorySink::new(dir))?;
    match service.handle(Request::ConvertRecent) {
        Response::Converted {
            report,
            notification,
        } => {
            print_status(report.level(), &report.message());
            if let Some(notification) = notification {
                show_notification(&notification);
            }
            Ok(true)
        }
        Response::Error { message, level } => {
            print_status(level, &message);
            Ok(false)
        }
        other => Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
    }
}

fn dry_run_file(path: &Path) -> Result<InspectReport> {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    if !is_csv_name(&name) {
        return Err(anyhow::anyhow!("Only CSV files are supported: {}", name));
    }
    inspect_file(path).map_err(anyhow::Error::from)
}

fn describe_dry_run(report: &InspectReport) -> String {
    match &report.output_name {
        Some(output) => format!(
            "{} ({}) would be converted to {}",
            report.path.display(),
            report.class,
            output
        ),
        None => format!("{} is already UTF-8-sig", report.path.display()),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn show_notification(notification: &Notification) {
    println!(
        "🔔 {} {}",
        style(&notification.title).bold(),
        notification.message
    );
}

fn check_command(path: &Path, recursive: bool, output: &OutputArgs) -> Result<bool> {
    cli_common::validate_path(path, "Input path")?;

    let files: Vec<PathBuf> = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        let walker = if recursive {
            WalkDir::new(path)
        } else {
            WalkDir::new(path).max_depth(1)
        };
        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            if entry.file_type().is_file() && is_csv_name(&entry.file_name().to_string_lossy()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        files
    };

    let mut reports = Vec::new();
    let mut failures = 0;
    for file in &files {
        match inspect_file(file) {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                print_error(&e.to_string());
            }
        }
    }

    let mut writer = OutputWriter::stdout(output.format).with_pretty(output.pretty);
    match writer.format() {
        OutputFormat::Json => writer.write_object(&reports)?,
        OutputFormat::Human => {
            if reports.is_empty() {
                print_warning(&format!("No CSV files found in {}", path.display()));
            } else {
                let rows: Vec<Vec<String>> = reports
                    .iter()
                    .map(|r| {
                        vec![
                            r.path.display().to_string(),
                            r.class.to_string(),
                            cli_common::format_file_size(r.size),
                            r.output_name.clone().unwrap_or_else(|| "-".to_string()),
                        ]
                    })
                    .collect();
                writer.write_table(&["File", "Encoding", "Size", "Output"], &rows)?;

                let count = |class: EncodingClass| reports.iter().filter(|r| r.class == class).count();
                writer.write_line(&format!(
                    "\n{} already marked, {} UTF-8, {} undecodable",
                    style(count(EncodingClass::AlreadyMarked)).green(),
                    style(count(EncodingClass::ValidUtf8)).yellow(),
                    style(count(EncodingClass::Undecodable)).red()
                ))?;
            }
        }
    }
    writer.flush()?;

    Ok(failures == 0)
}

fn settings_command(paths: &Paths, command: SettingsCommands) -> Result<bool> {
    let mut service = paths.open_service(MemorySink::new())?;

    let patch = match command {
        SettingsCommands::Show { output } => {
            let mut writer = OutputWriter::stdout(output.format).with_pretty(output.pretty);
            let settings = service.settings().clone();
            match writer.format() {
                OutputFormat::Json => writer.write_object(&settings)?,
                OutputFormat::Human => {
                    writer.write_header("Settings")?;
                    writer.write_line(&format!("File: {}", paths.settings.display()))?;
                    writer.write_line(&format!("auto_notify:        {}", settings.auto_notify))?;
                    writer.write_line(&format!("show_notifications: {}", settings.show_notifications))?;
                    writer.write_line(&format!("include_subdomains: {}", settings.include_subdomains))?;
                    if settings.whitelist_urls.is_empty() {
                        writer.write_line("whitelist:          (empty, all origins allowed)")?;
                    } else {
                        writer.write_line("whitelist:")?;
                        for entry in &settings.whitelist_urls {
                            writer.write_line(&format!("  • {}", entry))?;
                        }
                    }
                }
            }
            writer.flush()?;
            return Ok(true);
        }
        SettingsCommands::Set {
            auto_notify,
            show_notifications,
            include_subdomains,
        } => SettingsPatch {
            auto_notify,
            show_notifications,
            include_subdomains,
            whitelist_urls: None,
        },
        SettingsCommands::Whitelist { source } => {
            let text = if source == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read whitelist from stdin")?;
                buf
            } else {
                std::fs::read_to_string(&source)
                    .with_context(|| format!("Failed to read whitelist from {}", source))?
            };
            SettingsPatch {
                whitelist_urls: Some(parse_whitelist_text(&text)),
                ..Default::default()
            }
        }
        SettingsCommands::Reset => {
            let defaults = Settings::default();
            SettingsPatch {
                auto_notify: Some(defaults.auto_notify),
                show_notifications: Some(defaults.show_notifications),
                whitelist_urls: Some(defaults.whitelist_urls),
                include_subdomains: Some(defaults.include_subdomains),
            }
        }
    };

    if patch.is_empty() {
        print_warning("Nothing to change");
        return Ok(true);
    }

    match service.handle(Request::UpdateSettings { settings: patch }) {
        Response::Success => {
            print_success(&format!("Settings saved to {}", paths.settings.display()));
            Ok(true)
        }
        Response::Error { message, level } => {
            print_status(level, &message);
            Ok(false)
        }
        other => Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
    }
}

fn download_completed_command(
    paths: &Paths,
    file: String,
    url: Option<String>,
    mime: Option<String>,
) -> Result<bool> {
    let mut service = paths.open_service(MemorySink::new())?;
    let item = DownloadItem {
        filename: file,
        mime,
        url,
    };

    match service.handle(Request::DownloadCompleted { item }) {
        Response::Decision {
            decision: DownloadDecision::Offer { download },
        } => {
            print_info(&format!(
                "CSV download detected: {}. Run `csv-utf8sig convert` within 5 minutes to convert it.",
                style(&download.filename).bold()
            ));
            Ok(true)
        }
        Response::Decision {
            decision: DownloadDecision::Ignored { reason },
        } => {
            tracing::info!("Download ignored: {}", reason);
            Ok(true)
        }
        Response::Error { message, level } => {
            print_status(level, &message);
            Ok(false)
        }
        other => Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
    }
}

fn recent_command(paths: &Paths, command: RecentCommands) -> Result<bool> {
    let mut service = paths.open_service(MemorySink::new())?;
    let request = match command {
        RecentCommands::Show => Request::GetRecentDownload,
        RecentCommands::Clear => Request::ClearRecentDownload,
    };

    match service.handle(request) {
        Response::RecentDownload { download: Some(d) } => {
            print_info(&format!(
                "{} ({}) downloaded at {}",
                style(&d.filename).bold(),
                d.full_path.display(),
                d.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            Ok(true)
        }
        Response::RecentDownload { download: None } => {
            print_info("No recent CSV download");
            Ok(true)
        }
        Response::Success => {
            print_success("Recent download cleared");
            Ok(true)
        }
        Response::Error { message, level } => {
            print_status(level, &message);
            Ok(false)
        }
        other => Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
    }
}
