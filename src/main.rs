use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use avtrdb_reader::{
    Container, DatabaseSnapshot, DecodeOptions, FeedReader, FeedReport, FeedSource, KeySchedule,
    LegacyText, Platform, Result, SnapshotQuery, SourceFeed, refresh,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avtrdb-reader", version, about = "Decode and merge avatar catalog feeds")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the header of a PAS container file
    Inspect { file: PathBuf },

    /// Decode a single feed file and print a summary
    Decode {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = FormatArg::Container)]
        format: FormatArg,
        #[arg(long, value_enum, default_value_t = PlatformArg::Pc)]
        platform: PlatformArg,
        #[arg(long, value_enum, default_value_t = ScheduleArg::Simple)]
        schedule: ScheduleArg,
        /// Decode identifiers only, as for an auxiliary feed
        #[arg(long)]
        ids_only: bool,
        /// Number of sample entries to print
        #[arg(long, default_value_t = 10)]
        sample: usize,
    },

    /// Build a merged snapshot from per-platform feed files
    Refresh {
        #[arg(long, value_enum, default_value_t = FormatArg::Container)]
        format: FormatArg,
        #[arg(long, value_enum, default_value_t = ScheduleArg::Simple)]
        schedule: ScheduleArg,
        /// Primary PC feed
        #[arg(long)]
        pc: Option<PathBuf>,
        /// Primary Quest feed
        #[arg(long)]
        quest: Option<PathBuf>,
        /// Primary iOS feed
        #[arg(long)]
        ios: Option<PathBuf>,
        /// Id-only Quest feed
        #[arg(long)]
        aux_quest: Option<PathBuf>,
        /// Id-only iOS feed
        #[arg(long)]
        aux_ios: Option<PathBuf>,
        /// Write the snapshot as JSON to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Filter a saved snapshot
    Search {
        snapshot: PathBuf,
        /// Substring of name or description
        #[arg(long)]
        text: Option<String>,
        /// Substring of author
        #[arg(long)]
        author: Option<String>,
        /// Keep records available on any of these platforms
        #[arg(long, value_enum)]
        platform: Vec<PlatformArg>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Legacy,
    Container,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Pc,
    Quest,
    Ios,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Pc => Platform::Pc,
            PlatformArg::Quest => Platform::Quest,
            PlatformArg::Ios => Platform::Ios,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ScheduleArg {
    Simple,
    Feedback,
}

impl From<ScheduleArg> for KeySchedule {
    fn from(arg: ScheduleArg) -> Self {
        match arg {
            ScheduleArg::Simple => KeySchedule::Simple,
            ScheduleArg::Feedback => KeySchedule::Feedback,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Inspect { file } => inspect(&file),
        Command::Decode {
            file,
            format,
            platform,
            schedule,
            ids_only,
            sample,
        } => {
            let options = DecodeOptions::default().with_key_schedule(schedule.into());
            decode(&file, format, platform.into(), options, ids_only, sample)
        }
        Command::Refresh {
            format,
            schedule,
            pc,
            quest,
            ios,
            aux_quest,
            aux_ios,
            out,
        } => {
            let options = DecodeOptions::default().with_key_schedule(schedule.into());
            let mut sources = Vec::new();
            for (platform, path) in [(Platform::Pc, pc), (Platform::Quest, quest), (Platform::Ios, ios)] {
                if let Some(path) = path {
                    sources.push(FeedSource::primary(platform, load_feed(&path, format)?));
                }
            }
            for (platform, path) in [(Platform::Quest, aux_quest), (Platform::Ios, aux_ios)] {
                if let Some(path) = path {
                    sources.push(FeedSource::auxiliary(platform, load_feed(&path, format)?));
                }
            }
            refresh_snapshot(&sources, &options, out.as_deref())
        }
        Command::Search {
            snapshot,
            text,
            author,
            platform,
            limit,
        } => {
            let mut query = SnapshotQuery::new();
            if let Some(text) = &text {
                query = query.with_text(text);
            }
            if let Some(author) = &author {
                query = query.with_author(author);
            }
            for p in platform {
                query = query.with_platform(p.into());
            }
            search(&snapshot, &query, limit)
        }
    }
}

fn load_feed(path: &Path, format: FormatArg) -> Result<SourceFeed> {
    let bytes = std::fs::read(path)?;
    Ok(match format {
        FormatArg::Legacy => SourceFeed::LegacyText(bytes),
        FormatArg::Container => SourceFeed::Container(bytes),
    })
}

fn inspect(file: &Path) -> Result<()> {
    let reader = FeedReader::<Container>::open(file, Platform::Pc, DecodeOptions::default())?;
    let header = reader.header()?;

    println!("Container: {}", file.display());
    println!("{}", "=".repeat(60));
    println!("  Platform tag: {:#04x}", header.platform_tag);
    println!("  Format version: {}", header.format_version);
    println!("  Last update: {}", header.last_update);
    println!(
        "  Declared: {} avatars, {} authors",
        header.declared_avatar_count, header.declared_author_count
    );
    println!(
        "  In file: {} avatars, {} authors",
        header.file_avatar_count, header.file_author_count
    );
    println!("  Flag width: {} bytes", header.flag_width);
    println!("  Dynamic key: {}", hex::encode(header.dynamic_key));
    Ok(())
}

fn decode(
    file: &Path,
    format: FormatArg,
    platform: Platform,
    options: DecodeOptions,
    ids_only: bool,
    sample: usize,
) -> Result<()> {
    println!("Reading feed file: {}", file.display());
    println!("{}", "=".repeat(60));

    if ids_only {
        let decoded = match format {
            FormatArg::Legacy => FeedReader::<LegacyText>::open(file, platform, options)?.identifiers()?,
            FormatArg::Container => FeedReader::<Container>::open(file, platform, options)?.identifiers()?,
        };
        println!("\nTotal identifiers: {}", decoded.ids.len());
        for (i, id) in decoded.ids.iter().take(sample).enumerate() {
            println!("  {}. {}", i + 1, id);
        }
        return Ok(());
    }

    let feed = match format {
        FormatArg::Legacy => FeedReader::<LegacyText>::open(file, platform, options)?.decode()?,
        FormatArg::Container => FeedReader::<Container>::open(file, platform, options)?.decode()?,
    };

    if let Some(header) = &feed.header {
        println!("  Last update: {}", header.last_update);
    }
    println!("  Records: {}", feed.records.len());
    println!("  Inconsistencies: {}", feed.inconsistencies.len());
    for inconsistency in &feed.inconsistencies {
        println!("    - {}", inconsistency);
    }

    println!("\nSample Records (first {}):", sample);
    for (i, record) in feed.records.iter().take(sample).enumerate() {
        println!("  {}. [{}] {} by {}", i + 1, record.id, record.name, record.author);
    }
    if feed.records.len() > sample {
        println!("  ... and {} more", feed.records.len() - sample);
    }
    Ok(())
}

fn refresh_snapshot(sources: &[FeedSource], options: &DecodeOptions, out: Option<&Path>) -> Result<()> {
    let outcome = refresh(sources, options);

    println!("Refresh Summary:");
    println!("{}", "=".repeat(60));
    for report in &outcome.reports {
        match report {
            FeedReport::Merged(r) => println!(
                "  {} (primary): {} new, {} tagged, {} already tagged",
                r.platform, r.inserted, r.tagged, r.already_tagged
            ),
            FeedReport::Marked(r) => println!(
                "  {} (auxiliary): {} marked, {} not found in main list",
                r.platform,
                r.marked(),
                r.not_found.len()
            ),
        }
    }
    for failure in &outcome.failures {
        println!("  {} ({}): FAILED: {}", failure.platform, failure.role, failure.error);
    }
    println!("  Inconsistencies: {}", outcome.inconsistencies.len());
    println!("\nTotal unique avatars: {}", outcome.snapshot.len());
    if let Some(date) = outcome.snapshot.last_update() {
        println!("Last update: {}", date);
    }

    if let Some(path) = out {
        let writer = BufWriter::new(File::create(path)?);
        outcome.snapshot.write_json(writer)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn search(snapshot_path: &Path, query: &SnapshotQuery, limit: usize) -> Result<()> {
    let snapshot = DatabaseSnapshot::read_json(BufReader::new(File::open(snapshot_path)?))?;
    let matches: Vec<_> = snapshot.search_newest_first(query).collect();

    println!("{} of {} avatars match", matches.len(), snapshot.len());
    for record in matches.iter().take(limit) {
        let platforms: Vec<&str> = record.platforms.iter().map(Platform::as_str).collect();
        println!(
            "  {} | {} | {} | {}",
            record.id,
            platforms.join(","),
            record.name,
            record.author
        );
    }
    Ok(())
}
