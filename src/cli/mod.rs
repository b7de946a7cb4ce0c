//! # CLI Module
//!
//! Command-line interface for the photo porter.
//!
//! ## Usage
//! ```bash
//! # Copy a card into the library, organized by year and month
//! photo-porter transfer --source /Volumes/CARD --target ~/Pictures/Library
//!
//! # See where everything would go without copying
//! photo-porter transfer --source /Volumes/CARD --dry-run
//!
//! # Organize by camera and rename with a per-folder counter
//! photo-porter transfer -s /Volumes/CARD -t ~/Pictures/Library \
//!     --template "{camera}/{year}" --rename "{date}_{counter}"
//!
//! # Check a template before using it
//! photo-porter validate-template "{year}/{month}/{day}"
//!
//! # Past transfers
//! photo-porter history list
//! ```

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_porter::core::classify::{
    validate_template, ClassificationPreview, ClassifyConfig, TemplateValidation, UNKNOWN,
};
use photo_porter::core::history::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore, TransferRecord};
use photo_porter::core::rename::{NameContext, RenameConfig};
use photo_porter::core::scanner::{ScanConfig, ScanResult};
use photo_porter::core::session::Session;
use photo_porter::core::transfer::{FileOutcome, TransferResult, TransferStatus};
use photo_porter::error::{PhotoPorterError, Result};
use photo_porter::events::{DedupEvent, Event, EventChannel, ScanEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// Folders shown in the classification preview
const PREVIEW_FOLDERS: usize = 10;

/// Photo Porter - Copy photos into an organized library
#[derive(Parser, Debug)]
#[command(name = "photo-porter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a source folder and copy its photos into the target library
    Transfer {
        /// Folder or card to read photos from
        #[arg(short, long)]
        source: PathBuf,

        /// Library folder to copy into
        #[arg(short, long, required_unless_present = "dry_run")]
        target: Option<PathBuf>,

        /// Folder template, e.g. "{year}/{month}" or "{camera}/{year}"
        #[arg(long, default_value = "{year}/{month}")]
        template: String,

        /// Folder for photos whose metadata cannot fill the template
        #[arg(long, default_value = UNKNOWN)]
        fallback: String,

        /// Copy photos even when identical content is already in the library
        #[arg(long)]
        no_skip_duplicates: bool,

        /// Scan and preview only; nothing is copied
        #[arg(long)]
        dry_run: bool,

        /// File name template, e.g. "{date}_{counter}"
        #[arg(long)]
        rename: Option<String>,

        /// First counter value in each folder
        #[arg(long, default_value = "1")]
        counter_start: u32,

        /// Zero-padded width of the counter
        #[arg(long, default_value = "4")]
        counter_digits: u32,

        /// Include hidden files and folders
        #[arg(long)]
        include_hidden: bool,

        /// History database path
        #[arg(long)]
        history_db: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Check a folder template and show an example
    ValidateTemplate {
        /// Folder template to check
        template: String,

        /// Also check a file name template
        #[arg(long)]
        rename: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show or manage past transfers
    History {
        #[command(subcommand)]
        action: HistoryAction,

        /// History database path
        #[arg(long, global = true)]
        history_db: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List past transfers, newest first
    List {
        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Delete one record
    Delete {
        /// Record id
        id: String,
    },
    /// Delete every record
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Settings for one `transfer` invocation
struct TransferArgs {
    source: PathBuf,
    target: Option<PathBuf>,
    classify: ClassifyConfig,
    skip_duplicates: bool,
    dry_run: bool,
    rename: RenameConfig,
    include_hidden: bool,
    history_db: Option<PathBuf>,
    output: OutputFormat,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    photo_porter::init_tracing(level);

    match cli.command {
        Commands::Transfer {
            source,
            target,
            template,
            fallback,
            no_skip_duplicates,
            dry_run,
            rename,
            counter_start,
            counter_digits,
            include_hidden,
            history_db,
            output,
        } => run_transfer(TransferArgs {
            source,
            target,
            classify: ClassifyConfig {
                template,
                fallback_folder: fallback,
            },
            skip_duplicates: !no_skip_duplicates,
            dry_run,
            rename: rename_config(rename, counter_start, counter_digits),
            include_hidden,
            history_db,
            output,
        }),
        Commands::ValidateTemplate {
            template,
            rename,
            output,
        } => run_validate(&template, rename, output),
        Commands::History { action, history_db } => run_history(action, history_db),
    }
}

fn rename_config(template: Option<String>, counter_start: u32, counter_digits: u32) -> RenameConfig {
    match template {
        Some(template) => RenameConfig {
            enabled: true,
            template,
            counter_start,
            counter_digits,
        },
        None => RenameConfig {
            counter_start,
            counter_digits,
            ..RenameConfig::default()
        },
    }
}

fn run_transfer(args: TransferArgs) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Photo Porter").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    args.classify.validate().map_err(PhotoPorterError::Config)?;
    let validation = validate_template(&args.classify.template);
    if !validation.valid {
        return Err(PhotoPorterError::Config(format!(
            "invalid folder template '{}': {}",
            args.classify.template,
            validation.warnings.join("; ")
        )));
    }
    if args.rename.enabled {
        // Structural problems only; overflow depends on the scan
        let problems = args.rename.validate(None);
        if !problems.is_empty() {
            return Err(PhotoPorterError::Config(format!(
                "invalid rename template '{}': {}",
                args.rename.template,
                problems.join("; ")
            )));
        }
    }

    // A dry run never touches the history database
    let store: Arc<dyn HistoryStore> = if args.dry_run {
        Arc::new(InMemoryHistoryStore::new())
    } else {
        Arc::new(SqliteHistoryStore::open(&history_path(args.history_db.clone()))?)
    };

    let (sender, receiver) = EventChannel::default_bounded();
    let session = Session::builder()
        .scan_config(ScanConfig {
            include_hidden: args.include_hidden,
            ..ScanConfig::default()
        })
        .history_store(store)
        .events(sender)
        .build();

    let progress = pretty.then(|| {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    });

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = &progress_clone else { continue };
            match event {
                Event::Scan(ScanEvent::Started { source }) => {
                    pb.set_message(format!("Scanning {}", source.display()));
                }
                Event::Scan(ScanEvent::Progress(p)) => {
                    pb.set_message(format!(
                        "Scanning: {} photos, {}",
                        p.photos_found,
                        format_bytes(p.bytes_found)
                    ));
                    pb.tick();
                }
                Event::Dedup(DedupEvent::Started { candidates }) => {
                    pb.set_message(format!("Checking {} possible duplicates", candidates));
                }
                Event::Dedup(DedupEvent::Warning { path, message }) => {
                    pb.println(format!(
                        "  {} {}: {}",
                        style("!").yellow(),
                        path.display(),
                        message
                    ));
                }
                Event::Transfer(p) => {
                    pb.set_length(p.total as u64);
                    pb.set_position(p.current as u64);
                    pb.set_message(p.current_file.clone());
                    if p.status.is_terminal() {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    let outcome = scan_and_transfer(&session, &args);

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    // The session holds the last sender; dropping it ends the event thread
    drop(session);
    event_thread.join().ok();

    let (scan, preview, rename_warnings, result) = outcome?;

    match args.output {
        OutputFormat::Pretty => {
            print_pretty_scan(&term, &scan, &preview);
            for warning in &rename_warnings {
                term.write_line(&format!("  {} {}", style("!").yellow(), warning))
                    .ok();
            }
            match &result {
                Some(result) => print_pretty_transfer(&term, result, args.target.as_deref()),
                None => {
                    term.write_line(&format!(
                        "{}",
                        style("Dry run: no files were copied.").dim()
                    ))
                    .ok();
                }
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "dry_run": args.dry_run,
            "scan": {
                "source_dir": scan.source_dir,
                "total_files": scan.total_files,
                "total_size": scan.total_size,
                "duplicates": scan.duplicate_count(),
                "skipped": scan.skipped,
                "warnings": scan.warnings,
            },
            "preview": preview,
            "rename_warnings": rename_warnings,
            "transfer": result,
        }))?,
    }

    Ok(())
}

type TransferOutcome = (
    Arc<ScanResult>,
    Vec<ClassificationPreview>,
    Vec<String>,
    Option<TransferResult>,
);

fn scan_and_transfer(session: &Session, args: &TransferArgs) -> Result<TransferOutcome> {
    let scan = session.scan(&args.source, args.classify.clone())?;
    let preview = session.preview()?;
    let rename_warnings = if args.rename.enabled {
        args.rename.validate(Some(scan.max_files_per_folder()))
    } else {
        Vec::new()
    };

    let result = match (&args.target, args.dry_run) {
        (Some(target), false) => Some(session.start_transfer(
            target.clone(),
            args.skip_duplicates,
            args.rename.clone(),
        )?),
        _ => None,
    };

    Ok((scan, preview, rename_warnings, result))
}

fn run_validate(template: &str, rename: Option<String>, output: OutputFormat) -> Result<()> {
    let folder = validate_template(template);
    let rename = rename.map(|template| {
        let config = RenameConfig {
            enabled: true,
            template,
            ..RenameConfig::default()
        };
        let date_time = NaiveDate::from_ymd_opt(2024, 3, 15).and_then(|d| d.and_hms_opt(14, 30, 45));
        let example = config.file_name(
            &NameContext {
                original_name: "IMG_0001.JPG",
                date_time: date_time.as_ref(),
                camera: Some("X-T5"),
                make: Some("FUJIFILM"),
            },
            config.counter_start,
        );
        (config.validate(None), example)
    });

    match output {
        OutputFormat::Pretty => {
            let term = Term::stdout();
            let mark = |ok: bool| {
                if ok {
                    style("✓").green().bold()
                } else {
                    style("✗").red().bold()
                }
            };
            term.write_line(&format!(
                "{} {} -> {}",
                mark(folder.valid),
                style(template).bold(),
                style(&folder.example).cyan()
            ))
            .ok();
            for warning in &folder.warnings {
                term.write_line(&format!("  {} {}", style("!").yellow(), warning))
                    .ok();
            }
            if let Some((warnings, example)) = &rename {
                term.write_line(&format!(
                    "{} file name -> {}",
                    mark(warnings.is_empty()),
                    style(example).cyan()
                ))
                .ok();
                for warning in warnings {
                    term.write_line(&format!("  {} {}", style("!").yellow(), warning))
                        .ok();
                }
            }
            term.write_line(&format!(
                "{} {}",
                style("Tokens:").dim(),
                style(token_list(&folder)).dim()
            ))
            .ok();
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "folder": folder,
            "rename": rename.as_ref().map(|(warnings, example)| serde_json::json!({
                "valid": warnings.is_empty(),
                "example": example,
                "warnings": warnings,
            })),
        }))?,
    }

    let rename_valid = rename.map_or(true, |(warnings, _)| warnings.is_empty());
    if folder.valid && rename_valid {
        Ok(())
    } else {
        Err(PhotoPorterError::Config("template is not valid".to_string()))
    }
}

fn run_history(action: HistoryAction, history_db: Option<PathBuf>) -> Result<()> {
    let store = SqliteHistoryStore::open(&history_path(history_db))?;
    let term = Term::stdout();

    match action {
        HistoryAction::List { output } => {
            let records = store.list()?;
            match output {
                OutputFormat::Pretty => print_pretty_history(&term, &records),
                OutputFormat::Json => print_json(&records)?,
            }
        }
        HistoryAction::Delete { id } => {
            if store.delete(&id)? {
                term.write_line(&format!("{} Deleted {}", style("✓").green().bold(), id))
                    .ok();
            } else {
                return Err(PhotoPorterError::Config(format!("no history record with id {}", id)));
            }
        }
        HistoryAction::Clear => {
            let removed = store.clear()?;
            term.write_line(&format!(
                "{} Removed {} records",
                style("✓").green().bold(),
                removed
            ))
            .ok();
        }
    }

    Ok(())
}

fn history_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photo-porter")
            .join("history.db")
    })
}

fn print_pretty_scan(term: &Term, scan: &ScanResult, preview: &[ClassificationPreview]) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} photos, {}",
        style(scan.total_files).cyan(),
        format_bytes(scan.total_size)
    ))
    .ok();
    if scan.duplicate_count() > 0 {
        term.write_line(&format!(
            "  {} duplicates in the source (copied once)",
            style(scan.duplicate_count()).yellow()
        ))
        .ok();
    }
    if !scan.skipped.is_empty() {
        term.write_line(&format!(
            "  {} entries skipped",
            style(scan.skipped.len()).dim()
        ))
        .ok();
    }
    term.write_line("").ok();

    if preview.is_empty() {
        term.write_line("  No photos found.").ok();
        term.write_line("").ok();
        return;
    }

    term.write_line(&format!("{}", style("Folders:").bold().underlined()))
        .ok();
    for folder in preview.iter().take(PREVIEW_FOLDERS) {
        term.write_line(&format!(
            "  {} {}",
            style(format!("{:>6}", folder.file_count)).cyan(),
            folder.folder
        ))
        .ok();
    }
    if preview.len() > PREVIEW_FOLDERS {
        term.write_line(&format!(
            "  {}",
            style(format!("... and {} more folders", preview.len() - PREVIEW_FOLDERS)).dim()
        ))
        .ok();
    }
    term.write_line("").ok();
}

fn print_pretty_transfer(term: &Term, result: &TransferResult, target: Option<&Path>) {
    let (mark, headline) = match result.status {
        TransferStatus::Cancelled => (style("■").yellow().bold(), "Transfer Cancelled"),
        _ if result.error_count > 0 => (style("!").yellow().bold(), "Transfer Finished With Errors"),
        _ => (style("✓").green().bold(), "Transfer Complete"),
    };
    term.write_line(&format!("{} {}", mark, headline)).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} copied ({}) in {:.1}s",
        style(result.success_count).green(),
        format_bytes(result.bytes_transferred),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} skipped as duplicates",
        style(result.skip_count).cyan()
    ))
    .ok();
    if result.error_count > 0 {
        term.write_line(&format!("  {} failed", style(result.error_count).red()))
            .ok();
        for file in &result.files {
            if let FileOutcome::Failed(reason) = &file.outcome {
                term.write_line(&format!(
                    "    {} {}: {}",
                    style("✗").red(),
                    file.source.display(),
                    reason
                ))
                .ok();
            }
        }
    }
    if let Some(target) = target {
        term.write_line(&format!("  into {}", style(target.display()).dim()))
            .ok();
    }
    term.write_line("").ok();
}

fn print_pretty_history(term: &Term, records: &[TransferRecord]) {
    if records.is_empty() {
        term.write_line("No transfers recorded yet.").ok();
        return;
    }

    for record in records {
        term.write_line(&format!(
            "{} {} {}",
            style(record.timestamp.format("%Y-%m-%d %H:%M")).bold(),
            style(record.status.as_str()).cyan(),
            style(&record.id).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} -> {}",
            record.source_dir.display(),
            record.target_dir.display()
        ))
        .ok();
        term.write_line(&format!(
            "  {} of {} copied, {} skipped, {} failed, {} ({})",
            record.success_count,
            record.total_files,
            record.skip_count,
            record.error_count,
            format_bytes(record.total_size),
            record.template
        ))
        .ok();
    }
}

/// Supported tokens as written in a template, already braced
fn token_list(validation: &TemplateValidation) -> String {
    validation.supported_tokens.join(" ")
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_list_shows_each_token_once_braced() {
        let list = token_list(&validate_template("{year}"));
        assert!(list.starts_with("{year} "));
        assert!(!list.contains("{{"));
        assert!(!list.contains("}}"));
    }

    #[test]
    fn format_bytes_picks_a_unit() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
