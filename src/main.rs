// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand, Args};
use clap_complete::{generate, Shell};

use cineseed::app_config::{self, Config, SeedStep};
use cineseed::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for SeedStep to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSeedStep {
    Vocabulary,
    Genres,
    Movies,
    Subtitles,
}

impl From<CliSeedStep> for SeedStep {
    fn from(cli_step: CliSeedStep) -> Self {
        match cli_step {
            CliSeedStep::Vocabulary => SeedStep::Vocabulary,
            CliSeedStep::Genres => SeedStep::Genres,
            CliSeedStep::Movies => SeedStep::Movies,
            CliSeedStep::Subtitles => SeedStep::Subtitles,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed vocabulary, genres, movies and subtitles
    Seed(SeedArgs),

    /// Print row counts of the seeded database
    Stats,

    /// Generate shell completions for cineseed
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct SeedArgs {
    /// Run only these steps (comma separated); all steps by default
    #[arg(long, value_enum, value_delimiter = ',')]
    only: Vec<CliSeedStep>,

    /// OpenSubtitles API key
    #[arg(long, env = "OPENSUBTITLES_API_KEY", hide_env_values = true)]
    opensubtitles_api_key: Option<String>,

    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    tmdb_api_key: Option<String>,

    /// Directory holding the vocabulary word lists
    #[arg(long, value_name = "DIR")]
    vocabulary_dir: Option<PathBuf>,

    /// Number of movies to fetch from TMDB
    #[arg(long)]
    movie_count: Option<usize>,
}

/// cineseed - seed a movie-subtitle vocabulary learning database
#[derive(Parser, Debug)]
#[command(name = "cineseed")]
#[command(version)]
#[command(about = "Seeds vocabulary, movies and subtitle scripts for a language learning app")]
#[command(long_about = "cineseed loads vocabulary word lists, fetches movie metadata from TMDB and
subtitles from OpenSubtitles, classifies every caption by vocabulary difficulty
and stores everything in a SQLite database. Re-running skips stored records.

EXAMPLES:
    cineseed seed                                  # Run every step
    cineseed seed --only vocabulary,genres         # Local steps only, no API keys needed
    cineseed seed --only subtitles                 # Fetch scripts for stored movies
    cineseed --database seed.db stats              # Row counts per table
    cineseed completions bash > cineseed.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. API keys can also be provided through the
    OPENSUBTITLES_API_KEY and TMDB_API_KEY environment variables.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: PathBuf,

    /// SQLite database path (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Label and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (label, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, label, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is applied with set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "cineseed", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    if let Some(database) = &cli.database {
        config.database_path = Some(database.clone());
    }

    match cli.command {
        Commands::Seed(args) => run_seed(config, args).await,
        Commands::Stats => run_stats(config).await,
        Commands::Completions { .. } => Ok(()),
    }
}

async fn run_seed(mut config: Config, args: SeedArgs) -> Result<()> {
    // Override config with CLI options if provided
    if let Some(api_key) = args.opensubtitles_api_key {
        config.subtitles.api_key = api_key;
    }
    if let Some(api_key) = args.tmdb_api_key {
        config.movies.api_key = api_key;
    }
    if let Some(directory) = args.vocabulary_dir {
        config.vocabulary.directory = directory;
    }
    if let Some(movie_count) = args.movie_count {
        config.movies.movie_count = movie_count;
    }

    let steps: Vec<SeedStep> = if args.only.is_empty() {
        SeedStep::ORDER.to_vec()
    } else {
        args.only.into_iter().map(SeedStep::from).collect()
    };

    let controller = Controller::with_config(config)
        .context("Failed to open the seed database")?;
    let report = controller.seed(&steps).await?;

    info!("{}", report);

    if report.is_success() {
        Ok(())
    } else {
        Err(anyhow!("{} seed step(s) failed", report.failures.len()))
    }
}

async fn run_stats(config: Config) -> Result<()> {
    let controller = Controller::with_config(config)
        .context("Failed to open the seed database")?;
    let stats = controller.stats().await?;
    println!("{}", stats);
    Ok(())
}
