// stockscope CLI - branch inventory search
// Rebuild the snapshot from branch exports, then query it.

mod exit_codes;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use stockscope_config::{ConfigError, Settings, SourceConfig, CONFIG_ENV};
use stockscope_engine::{
    build, DetailOutcome, Filters, IngestError, SearchEngine, SearchIssue, SearchOptions, SortKey,
};
use stockscope_io::{collect_inputs, read_meta, write_snapshot, SqliteStore};

use exit_codes::{
    EXIT_BUILD_NO_DATA, EXIT_BUILD_NO_SOURCES, EXIT_BUILD_WRITE, EXIT_CONFIG, EXIT_ERROR,
    EXIT_FILTERED_OUT, EXIT_SUCCESS, EXIT_UNAVAILABLE, EXIT_UNKNOWN_CODE, EXIT_USAGE,
};

/// Environment variable holding the log filter (`warn` when unset).
const LOG_ENV: &str = "SSCOPE_LOG";

#[derive(Parser)]
#[command(name = "sscope")]
#[command(about = "Search product stock across every branch")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/stockscope/stockscope.toml)
    #[arg(long, global = true, env = CONFIG_ENV, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Snapshot database, overriding the settings file
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Print one JSON value on stdout instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the inventory snapshot from branch exports
    #[command(after_help = "\
Examples:
  sscope build                                  # sources from the settings file
  sscope build --workbook clasificacion.xlsx    # one sheet per branch, 'Class(HI)'...
  sscope build --csv HI=hi.csv --csv EX=ex.csv --header-row 8")]
    Build {
        /// Branch CSV export, as BRANCH=PATH (repeatable)
        #[arg(long = "csv", value_name = "BRANCH=PATH", value_parser = parse_csv_source)]
        csv: Vec<SourceConfig>,

        /// Workbook whose prefixed sheets are branch tables (repeatable)
        #[arg(long = "workbook", value_name = "PATH")]
        workbooks: Vec<PathBuf>,

        /// Zero-based header row for every source given here
        #[arg(long, value_name = "N")]
        header_row: Option<usize>,
    },

    /// Find products by code, description, auxiliary code or classification
    #[command(after_help = "\
Examples:
  sscope search martillo truper
  sscope search tinaco --branch HI --branch EX --in-stock
  sscope search foco --sort stock-desc --json")]
    Search {
        /// Query words; every word must match
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, value_enum, default_value = "description")]
        sort: SortArg,

        /// Maximum number of results (default from settings)
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Mark the query in descriptions with <mark>...</mark>
        #[arg(long)]
        highlight: bool,
    },

    /// Per-branch stock for one product code
    Detail {
        code: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show when the snapshot was built and what went into it
    Info,

    /// Settings file helpers
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Restrict to a branch (repeatable)
    #[arg(long = "branch", short = 'b', value_name = "BRANCH")]
    branches: Vec<String>,

    /// Only products with stock > 0 in a selected branch
    #[arg(long)]
    in_stock: bool,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the settings file location
    Path,
    /// Write a starter settings file
    Init,
    /// Print the effective settings as TOML
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Description,
    StockAsc,
    StockDesc,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Description => SortKey::Description,
            SortArg::StockAsc => SortKey::StockAsc,
            SortArg::StockDesc => SortKey::StockDesc,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("SSCOPE_GIT_HASH"),
        ")\ntarget: ",
        env!("SSCOPE_TARGET"),
    )
}

fn parse_csv_source(arg: &str) -> Result<SourceConfig, String> {
    let (branch, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected BRANCH=PATH, got '{arg}'"))?;
    let (branch, path) = (branch.trim(), path.trim());
    if branch.is_empty() || path.is_empty() {
        return Err(format!("expected BRANCH=PATH, got '{arg}'"));
    }
    Ok(SourceConfig {
        path: PathBuf::from(path),
        branch: Some(branch.to_string()),
        sheet: None,
        header_row: None,
    })
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config(cmd) => cmd_config(cmd, cli.config.as_deref()),
        Commands::Build {
            csv,
            workbooks,
            header_row,
        } => load_settings(cli.config.as_deref(), cli.database)
            .and_then(|settings| cmd_build(settings, csv, workbooks, header_row, cli.json)),
        Commands::Search {
            query,
            filters,
            sort,
            limit,
            highlight,
        } => load_settings(cli.config.as_deref(), cli.database).and_then(|settings| {
            cmd_search(&settings, &query.join(" "), filters, sort, limit, highlight, cli.json)
        }),
        Commands::Detail { code, filters } => load_settings(cli.config.as_deref(), cli.database)
            .and_then(|settings| cmd_detail(&settings, &code, filters, cli.json)),
        Commands::Info => {
            load_settings(cli.config.as_deref(), cli.database).and_then(|settings| cmd_info(&settings, cli.json))
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn load_settings(path: Option<&Path>, database: Option<PathBuf>) -> Result<Settings, CliError> {
    let mut settings = Settings::load(path).map_err(CliError::config)?;
    if let Some(db) = database {
        settings.database = db;
    }
    tracing::debug!(database = %settings.database.display(), "settings loaded");
    Ok(settings)
}

// ============================================================================
// build
// ============================================================================

fn cmd_build(
    mut settings: Settings,
    csv: Vec<SourceConfig>,
    workbooks: Vec<PathBuf>,
    header_row: Option<usize>,
    json: bool,
) -> Result<(), CliError> {
    // Sources on the command line replace the configured ones
    if !csv.is_empty() || !workbooks.is_empty() {
        settings.ingest.sources = csv
            .into_iter()
            .chain(workbooks.into_iter().map(|path| SourceConfig {
                path,
                branch: None,
                sheet: None,
                header_row: None,
            }))
            .map(|source| SourceConfig {
                header_row: header_row.or(source.header_row),
                ..source
            })
            .collect();
        settings.validate().map_err(CliError::config)?;
    }
    if settings.ingest.sources.is_empty() {
        return Err(CliError {
            code: EXIT_BUILD_NO_SOURCES,
            message: "no branch sources to read".into(),
            hint: Some(format!(
                "pass --csv BRANCH=PATH or --workbook PATH, or add [[ingest.sources]] to {}",
                Settings::config_path_display()
            )),
        });
    }

    let inputs = collect_inputs(&settings);
    let out = build(inputs, &settings.ingest.columns, &settings.branches).map_err(CliError::ingest)?;
    let meta = write_snapshot(&settings.database, &out.records, &settings.branches, &out.report)
        .map_err(|e| CliError {
            code: EXIT_BUILD_WRITE,
            message: e.to_string(),
            hint: Some("the previous snapshot, if any, was left in place".into()),
        })?;

    if json {
        render::json(&meta).map_err(CliError::stdout)
    } else {
        render::build_text(&out.report, &settings.database.display().to_string());
        Ok(())
    }
}

// ============================================================================
// search / detail
// ============================================================================

fn engine(settings: &Settings, limit: Option<usize>) -> Result<SearchEngine<SqliteStore>, CliError> {
    let options = SearchOptions {
        limit: limit.unwrap_or(settings.search.limit),
        min_query_len: settings.search.min_query_len,
    };
    if options.limit == 0 {
        return Err(CliError::args("--limit must be at least 1"));
    }
    Ok(SearchEngine::new(
        SqliteStore::new(&settings.database),
        settings.branches.clone(),
        options,
    ))
}

fn filters(args: FilterArgs, sort: SortKey) -> Filters {
    let mut filters = Filters::default().in_branches(args.branches).sorted_by(sort);
    if args.in_stock {
        filters = filters.only_in_stock();
    }
    filters
}

fn cmd_search(
    settings: &Settings,
    query: &str,
    filter_args: FilterArgs,
    sort: SortArg,
    limit: Option<usize>,
    highlight: bool,
    json: bool,
) -> Result<(), CliError> {
    let engine = engine(settings, limit)?;
    let results = engine.search(query, &filters(filter_args, sort.into()));

    if json {
        render::search_json(&results, highlight).map_err(CliError::stdout)?;
    }
    match &results.issue {
        Some(SearchIssue::BadRequest { reason }) => Err(CliError::args(reason.clone())),
        Some(SearchIssue::Unavailable { message }) => Err(CliError::unavailable(message, settings)),
        None => {
            if !json {
                render::search_text(&results, highlight, engine.options().limit);
            }
            Ok(())
        }
    }
}

fn cmd_detail(settings: &Settings, code: &str, filter_args: FilterArgs, json: bool) -> Result<(), CliError> {
    let engine = engine(settings, None)?;
    let outcome = engine.detail(code, &filters(filter_args, SortKey::default()));

    if json {
        render::json(&outcome).map_err(CliError::stdout)?;
    }
    match outcome {
        DetailOutcome::Found(detail) => {
            if !json {
                render::detail_text(&detail);
            }
            Ok(())
        }
        DetailOutcome::UnknownCode => Err(CliError {
            code: EXIT_UNKNOWN_CODE,
            message: format!("no product with code '{}'", code.trim()),
            hint: Some("codes are exact; use `sscope search` to find one".into()),
        }),
        DetailOutcome::FilteredOut => Err(CliError {
            code: EXIT_FILTERED_OUT,
            message: format!("product '{}' is excluded by the active filters", code.trim()),
            hint: Some("drop --branch/--in-stock to see every branch".into()),
        }),
        DetailOutcome::BadRequest { reason } => Err(CliError::args(reason)),
        DetailOutcome::Unavailable { message } => Err(CliError::unavailable(&message, settings)),
    }
}

// ============================================================================
// info / config
// ============================================================================

fn cmd_info(settings: &Settings, json: bool) -> Result<(), CliError> {
    let meta = read_meta(&settings.database).map_err(|e| CliError::unavailable(&e.to_string(), settings))?;
    if json {
        render::json(&meta).map_err(CliError::stdout)
    } else {
        render::info_text(&meta, &settings.database.display().to_string());
        Ok(())
    }
}

fn cmd_config(cmd: ConfigCommands, explicit: Option<&Path>) -> Result<(), CliError> {
    let path = explicit.map(Path::to_path_buf).unwrap_or_else(Settings::config_path);
    match cmd {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Init => {
            Settings::write_default_file(&path).map_err(CliError::config)?;
            println!("wrote {}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let settings = Settings::load(explicit).map_err(CliError::config)?;
            let text = toml::to_string_pretty(&settings).map_err(|e| CliError::eval(e.to_string()))?;
            print!("{text}");
            Ok(())
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn eval(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::NotFound(_) => Some("run `sscope config init` to create one".to_string()),
            ConfigError::Parse(_) | ConfigError::Validation(_) => {
                Some("check the file, or `sscope config show` for the effective values".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }

    pub fn ingest(err: IngestError) -> Self {
        let mut message = err.to_string();
        if let IngestError::NoBranchesRead { skipped } = &err {
            for s in skipped {
                message.push_str(&format!("\n  {} ({}): {}", s.branch, s.origin, s.reason));
            }
        }
        Self {
            code: EXIT_BUILD_NO_DATA,
            message,
            hint: Some("the previous snapshot, if any, was left in place".into()),
        }
    }

    pub fn unavailable(message: &str, settings: &Settings) -> Self {
        Self {
            code: EXIT_UNAVAILABLE,
            message: format!("inventory unavailable: {message}"),
            hint: (!settings.database.exists())
                .then(|| format!("no snapshot at {}; run `sscope build` first", settings.database.display())),
        }
    }

    pub fn stdout(err: std::io::Error) -> Self {
        Self { code: EXIT_ERROR, message: format!("cannot write output: {err}"), hint: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_source_argument() {
        let s = parse_csv_source("HI=data/hi.csv").unwrap();
        assert_eq!(s.branch.as_deref(), Some("HI"));
        assert_eq!(s.path, PathBuf::from("data/hi.csv"));
        assert!(parse_csv_source("hi.csv").is_err());
        assert!(parse_csv_source("=hi.csv").is_err());
        assert!(parse_csv_source("HI=").is_err());
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
