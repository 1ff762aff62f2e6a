//! Command line interface.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use msgtriage::analysis::risk::{Risk, RiskCatalog};
use msgtriage::batch::{discover_inputs, load_message, run_scan, ScanSummary};
use msgtriage::config::{cache_dir, load_config, Config};
use msgtriage::container::{join_path, CfbContainer, ContainerRead};
use msgtriage::model::{properties, Message};
use msgtriage::parser::header::decode_encoded_words;
use msgtriage::sink::{JsonlSink, MessageRecord, MessageSink, SqliteSink};

#[derive(Parser)]
#[command(
    name = "msgtriage",
    version,
    about = "Triage Outlook .msg files: extract, score, persist"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan .msg files or directories into a database
    Scan {
        /// Files or directories to scan
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// SQLite database path (defaults to the configured one)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Write JSON Lines to this file instead of SQLite
        #[arg(long, conflicts_with = "db")]
        jsonl: Option<PathBuf>,
        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the extracted fields and verdicts of one file
    Inspect {
        file: PathBuf,
        /// Also list every stream with its property name
        #[arg(long)]
        streams: bool,
        /// Print the full record as JSON
        #[arg(long, conflicts_with = "streams")]
        json: bool,
    },
    /// Save the attachments of one file to a directory
    Attachments {
        file: PathBuf,
        /// Destination directory
        #[arg(short, long, default_value = "attachments")]
        output: PathBuf,
        /// Save only attachments classified risky
        #[arg(long)]
        risky_only: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Generate the man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config();
    let _guard = init_logging(&config, cli.verbose)?;

    match cli.command {
        Command::Scan {
            inputs,
            db,
            jsonl,
            quiet,
            json,
        } => scan(&config, &inputs, db, jsonl, quiet, json),
        Command::Inspect { file, streams, json } => inspect(&config, &file, streams, json),
        Command::Attachments {
            file,
            output,
            risky_only,
        } => save_attachments(&config, &file, &output, risky_only),
        Command::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "msgtriage",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        Command::Manpage => {
            let man = clap_mangen::Man::new(Cli::command());
            let mut buffer = Vec::new();
            man.render(&mut buffer)?;
            std::io::stdout().write_all(&buffer)?;
            Ok(())
        }
    }
}

/// Stderr logging at the configured level plus a daily rolling file in the
/// cache directory. The returned guard must stay alive for the file layer
/// to flush.
fn init_logging(
    config: &Config,
    verbose: u8,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("msgtriage={level}")));

    let log_dir = cache_dir(config);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(&log_dir, "msgtriage.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .try_init()?;
    Ok(guard)
}

fn scan(
    config: &Config,
    inputs: &[PathBuf],
    db: Option<PathBuf>,
    jsonl: Option<PathBuf>,
    quiet: bool,
    json: bool,
) -> anyhow::Result<()> {
    let files = discover_inputs(inputs)?;
    if files.is_empty() {
        println!("No .msg files to scan");
        return Ok(());
    }

    let mut sink: Box<dyn MessageSink> = match &jsonl {
        Some(path) => Box::new(JsonlSink::create(path)?),
        None => {
            let path = db.unwrap_or_else(|| config.database.path.clone());
            Box::new(SqliteSink::open(&path)?)
        }
    };

    let bar = if quiet {
        None
    } else {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    };
    let report = |done: u64, _total: u64| {
        if let Some(bar) = &bar {
            bar.set_position(done);
        }
    };

    let summary = run_scan(&files, config, sink.as_mut(), Some(&report))?;
    sink.flush()?;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    if !summary.failed.is_empty() {
        anyhow::bail!("{} of {} files failed", summary.failed.len(), files.len());
    }
    Ok(())
}

fn print_summary(summary: &ScanSummary) {
    println!(
        "Stored {} messages from {} files: {} attachments ({} risky, {} unknown, {})",
        summary.messages,
        summary.scanned,
        summary.attachments,
        summary.risky_attachments,
        summary.unknown_risk_attachments,
        format_size(summary.attachment_bytes, BINARY),
    );
    println!(
        "Verdicts: {} internal, {} SPF failures, {} sender mismatches, {} multi-sender headers",
        summary.internal_messages,
        summary.spf_failures,
        summary.from_mismatches,
        summary.multi_sender_headers,
    );
    for failure in &summary.failed {
        println!("  failed {}: {}", failure.path.display(), failure.error);
    }
}

fn inspect(config: &Config, file: &Path, streams: bool, json: bool) -> anyhow::Result<()> {
    let message = load_message(file, config)?;
    if json {
        let record = MessageRecord::from_message(&message)?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }
    print_message(&message, 0)?;

    if streams {
        println!();
        println!("Streams:");
        let container = CfbContainer::open(file)?;
        for path in container.list_streams(&[]) {
            let name = join_path(&path);
            let label = path
                .last()
                .and_then(|leaf| properties::stream_code(leaf))
                .and_then(properties::property_name);
            match label {
                Some(label) => println!("  {name}  ({label})"),
                None => println!("  {name}"),
            }
        }
    }
    Ok(())
}

fn print_message(message: &Message, depth: usize) -> anyhow::Result<()> {
    let pad = "  ".repeat(depth);
    if depth > 0 {
        println!("{pad}Embedded message ({})", join_path(message.prefix()));
    }
    print_field(&pad, "Subject", message.subject()?);
    print_field(&pad, "From", message.sender()?);
    print_field(&pad, "To", message.to()?);
    print_field(&pad, "Cc", message.cc()?);
    if let Some(raw) = message.date_raw()? {
        match message.date() {
            Ok(Some(date)) => println!("{pad}Date: {raw} ({})", date.to_rfc3339()),
            _ => println!("{pad}Date: {raw} (unparseable)"),
        }
    }
    if let Some(internal) = message.internal_mail() {
        println!("{pad}Internal: {internal}");
    }
    if let Some(pass) = message.spf_pass() {
        println!("{pad}SPF pass: {pass}");
    }
    if let Some(count) = message.distinct_senders_in_header() {
        println!("{pad}Distinct senders in header: {count}");
    }
    if let Some(mismatch) = message.from_mismatch_header() {
        println!("{pad}Sender mismatch: {mismatch}");
    }
    if let Some(urls) = message.urls()? {
        for url in urls {
            println!("{pad}URL: {url}");
        }
    }
    for attachment in message.attachments()? {
        println!(
            "{pad}Attachment: {} ({}, {})",
            attachment.save_name(),
            format_size(attachment.data().len() as u64, BINARY),
            attachment.risk(),
        );
    }
    for nested in message.messages()? {
        print_message(nested, depth + 1)?;
    }
    Ok(())
}

fn print_field(pad: &str, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("{pad}{label}: {}", decode_encoded_words(value));
    }
}

fn save_attachments(
    config: &Config,
    file: &Path,
    output: &Path,
    risky_only: bool,
) -> anyhow::Result<()> {
    let catalog = RiskCatalog::new(&config.attachments.extra_risky_extensions);
    let message = Message::open(file, catalog)?;
    let saved = save_tree(&message, output, risky_only)?;
    println!("Saved {saved} attachment(s) to {}", output.display());
    Ok(())
}

fn save_tree(message: &Message, dir: &Path, risky_only: bool) -> anyhow::Result<u64> {
    let mut saved = 0;
    for attachment in message.attachments()? {
        if risky_only && attachment.risk() != Risk::Risky {
            continue;
        }
        let dest = attachment.save_to(dir)?;
        println!("  {}", dest.display());
        saved += 1;
    }
    for (index, nested) in message.messages()?.iter().enumerate() {
        saved += save_tree(nested, &dir.join(format!("nested-{index}")), risky_only)?;
    }
    Ok(saved)
}
