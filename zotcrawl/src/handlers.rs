use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use url::Url;
use zotcrawl_core::data::{PageStore, SqlitePageStore};
use zotcrawl_core::fetchlog::{FetchLog, FetchLogWriter};
use zotcrawl_core::lexicon::{DEFAULT_STOP_WORDS, StopWords, WordList};
use zotcrawl_core::report::{
    ReportFormat, ReportOptions, gather_report_data, generate_json_report, generate_text_report,
    save_report,
};
use zotcrawl_scanner::{FilterVerdict, ScopePolicy};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/zotcrawl/";
pub const DEFAULT_DB_PATH: &str = "~/.config/zotcrawl/pages.db";
pub const DEFAULT_LOG_PATH: &str = "~/.config/zotcrawl/logs/worker.log";
pub const DEFAULT_STOP_WORDS_PATH: &str = "~/.config/zotcrawl/stop_words.txt";
pub const DEFAULT_DICTIONARY_PATH: &str = "/usr/share/dict/words";

/// Seeds used when neither `--url` nor `--hosts-file` is given.
pub const DEFAULT_SEEDS: &[&str] = &[
    "https://www.ics.uci.edu",
    "https://www.cs.uci.edu",
    "https://www.informatics.uci.edu",
    "https://www.stat.uci.edu",
];

// Re-export crawl types and functions from zotcrawl-core
pub use zotcrawl_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path, generate_crawl_report,
};

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

// Helper functions for crawl handler

/// Load seeds from a file, the `--url` arguments, or the defaults
pub fn load_urls_from_source(urls: &[Url], hosts_file: Option<&PathBuf>) -> Result<Vec<String>> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if !urls.is_empty() {
        Ok(urls.iter().map(|u| u.as_str().to_string()).collect())
    } else {
        Ok(DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("https://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn arg_path(args: &ArgMatches, id: &str, fallback: &str) -> PathBuf {
    expand_path(
        args.get_one::<String>(id)
            .map(String::as_str)
            .unwrap_or(fallback),
    )
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  ZOTCRAWL INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_dir = arg_path(args, "PATH", DEFAULT_CONFIG_DIR);
    let force = args.get_flag("force");
    let stop_words_path = config_dir.join("stop_words.txt");
    let db_path = config_dir.join("pages.db");
    let log_dir = config_dir.join("logs");

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    if (stop_words_path.exists() || SqlitePageStore::exists(&db_path)) && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("An existing installation was found:");
        for existing in [&stop_words_path, &db_path] {
            if existing.exists() {
                println!(
                    "  {} {}",
                    "•".yellow(),
                    existing.display().to_string().bright_white()
                );
            }
        }
        println!();
        println!("{}", "This operation will overwrite existing files.".yellow());

        let response = print_prompt("Do you want to continue? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    create_configuration_assets(&config_dir, &log_dir, &stop_words_path)?;

    if SqlitePageStore::exists(&db_path) {
        println!("{} Deleting existing page database", "→".yellow().bold());
        SqlitePageStore::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
    }

    println!("{} Creating page database...", "→".blue());
    SqlitePageStore::new(&db_path)
        .with_context(|| format!("Failed to create page database at {}", db_path.display()))?;

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Config directory: {}",
        "✓".green().bold(),
        config_dir.display().to_string().bright_white()
    );
    println!(
        "{} Page database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!(
        "{} Stop words: {}",
        "✓".green().bold(),
        stop_words_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

fn create_configuration_assets(config_dir: &Path, log_dir: &Path, stop_words_path: &Path) -> Result<()> {
    println!("{} Creating directory structure...", "→".blue());

    for dir in [config_dir, log_dir] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        println!("  {} {}", "✓".green(), dir.display().to_string().bright_white());
    }

    println!("{} Installing default stop-word list...", "→".blue());
    fs::write(stop_words_path, DEFAULT_STOP_WORDS)
        .with_context(|| format!("Failed to write {}", stop_words_path.display()))?;
    println!(
        "  {} {} ({} entries)",
        "✓".green().bold(),
        stop_words_path.display().to_string().bright_white(),
        DEFAULT_STOP_WORDS.lines().count().to_string().cyan()
    );
    println!();
    Ok(())
}

pub async fn handle_crawl(sub_matches: &ArgMatches) -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let urls: Vec<Url> = sub_matches
        .get_many::<Url>("url")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&10);
    let max_depth = *sub_matches.get_one::<usize>("max-depth").unwrap_or(&3);
    let max_pages = sub_matches.get_one::<usize>("max-pages").copied();
    let minimum_words = *sub_matches
        .get_one::<usize>("min-words")
        .unwrap_or(&zotcrawl_scanner::DEFAULT_MINIMUM_WORDS);
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&30);
    let db_path = arg_path(sub_matches, "db", DEFAULT_DB_PATH);
    let log_path = arg_path(sub_matches, "log", DEFAULT_LOG_PATH);

    let seeds = load_urls_from_source(&urls, hosts_file)?;

    println!("\n🕷️  Crawling from {} seed(s)", seeds.len());
    println!("Workers: {}", threads);
    println!("Max depth: {}", max_depth);
    if let Some(max_pages) = max_pages {
        println!("Page budget: {}", max_pages);
    }
    println!("Page database: {}", db_path.display());
    println!("Fetch log: {}\n", log_path.display());

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store: Arc<dyn PageStore> = Arc::new(
        SqlitePageStore::new(&db_path)
            .with_context(|| format!("Failed to open page database {}", db_path.display()))?,
    );
    let log = Arc::new(
        FetchLogWriter::open(&log_path)
            .with_context(|| format!("Failed to open fetch log {}", log_path.display()))?,
    );

    info!(
        "Writing pages to {} and fetch log to {}",
        db_path.display(),
        log_path.display()
    );
    let options = CrawlOptions {
        seeds,
        threads,
        max_depth,
        max_pages,
        minimum_words,
        timeout,
        policy: ScopePolicy::uci(),
        show_progress_bars: true,
    };

    let progress_callback: CrawlProgressCallback = Arc::new(|msg: String| {
        println!("{}", msg);
    });

    let summary = execute_crawl(options, store, log, Some(progress_callback))
        .await
        .context("Crawl failed")?;

    println!("\n{} Crawl complete!\n", "✓".green().bold());
    print!("{}", generate_crawl_report(&summary));
    Ok(())
}

/// Colored label for a filter verdict
pub fn format_verdict(verdict: FilterVerdict) -> String {
    match verdict {
        FilterVerdict::Admit => verdict.as_str().green().bold().to_string(),
        FilterVerdict::RejectTrap | FilterVerdict::RejectExtension => {
            verdict.as_str().yellow().to_string()
        }
        FilterVerdict::RejectScheme | FilterVerdict::RejectDomain => {
            verdict.as_str().red().to_string()
        }
    }
}

pub fn handle_check(args: &ArgMatches) -> Result<()> {
    let policy = ScopePolicy::uci();
    for raw in args.get_many::<String>("URL").into_iter().flatten() {
        let verdict = policy.classify_str(raw);
        println!("{:<18} {}", format_verdict(verdict), raw);
    }
    Ok(())
}

pub fn handle_report(args: &ArgMatches) -> Result<()> {
    let db_path = arg_path(args, "db", DEFAULT_DB_PATH);
    let log_path = arg_path(args, "log", DEFAULT_LOG_PATH);
    let stop_words_path = arg_path(args, "stop-words", DEFAULT_STOP_WORDS_PATH);
    let dictionary_path = arg_path(args, "dictionary", DEFAULT_DICTIONARY_PATH);
    let format_str = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let format = ReportFormat::from_str(format_str)
        .with_context(|| format!("Unsupported report format '{}'", format_str))?;

    let options = ReportOptions {
        top_words: args
            .get_one::<usize>("top")
            .copied()
            .unwrap_or(zotcrawl_core::report::DEFAULT_TOP_WORDS),
        parent_domain: args
            .get_one::<String>("parent-domain")
            .cloned()
            .unwrap_or_else(|| zotcrawl_core::report::DEFAULT_PARENT_DOMAIN.to_string()),
    };

    let log = FetchLog::open(&log_path)?;
    let store = SqlitePageStore::open_existing(&db_path)?;
    let stop_words = StopWords::load(&stop_words_path)?;
    let lexicon = WordList::load(&dictionary_path)?;

    let data = gather_report_data(&log, &store, &lexicon, &stop_words, &options)?;
    let content = match format {
        ReportFormat::Text => generate_text_report(&data),
        ReportFormat::Json => generate_json_report(&data)?,
    };

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}
