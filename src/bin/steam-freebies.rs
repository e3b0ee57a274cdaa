//! CLI for watching the Steam store for temporarily free games.

use core::time::Duration;
use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use steam_freebies::client::{
    DEFAULT_COUNTRY, DEFAULT_DETAILS_URL, DEFAULT_LANGUAGE, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SPECIALS_URL,
};
use steam_freebies::clock::Clock;
use steam_freebies::config::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_ITEM_DELAY, DEFAULT_RETRY_DELAY, MonitorConfig,
};
use steam_freebies::models::{AppId, DiscoveredGame};
use steam_freebies::monitor::{CycleReport, Inspection, Monitor};
use steam_freebies::storage::{DEFAULT_DATA_FILE, Storage};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Default log file, next to the discoveries file.
const DEFAULT_LOG_FILE: &str = "steam_freebies.log";

/// Watch the Steam store for paid games discounted to free.
#[derive(Debug, Parser)]
#[command(name = "steam-freebies", version, about)]
struct Cli {
    /// Monitor settings.
    #[command(flatten)]
    settings: Settings,
    /// File that receives a copy of every log line.
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
    /// Subcommand to execute (default: `run`).
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Poll the store until Ctrl-C.
    Run,
    /// Run a single cycle and print what was found.
    Once,
    /// Check one app and print why it does or does not qualify.
    Check {
        /// Store application id.
        app_id: AppId,
    },
    /// List every recorded game.
    List,
}

/// Flags and environment variables mapping onto [`MonitorConfig`].
#[derive(Debug, Args)]
struct Settings {
    /// Specials listing endpoint.
    #[arg(long, global = true, env = "STEAM_FREEBIES_SPECIALS_URL", default_value = DEFAULT_SPECIALS_URL)]
    specials_url: String,
    /// App details endpoint.
    #[arg(long, global = true, env = "STEAM_FREEBIES_DETAILS_URL", default_value = DEFAULT_DETAILS_URL)]
    details_url: String,
    /// Discoveries file.
    #[arg(long, global = true, value_name = "FILE", env = "STEAM_FREEBIES_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    data_file: PathBuf,
    /// Store country code used for prices.
    #[arg(long, global = true, default_value = DEFAULT_COUNTRY)]
    country: String,
    /// Store language used for names.
    #[arg(long, global = true, default_value = DEFAULT_LANGUAGE)]
    language: String,
    /// Seconds between two cycles.
    #[arg(long, global = true, default_value_t = DEFAULT_CHECK_INTERVAL.as_secs())]
    interval_secs: u64,
    /// Seconds to pause after each details request.
    #[arg(long, global = true, default_value_t = DEFAULT_ITEM_DELAY.as_secs())]
    item_delay_secs: u64,
    /// Seconds to wait after a cycle that failed unexpectedly.
    #[arg(long, global = true, default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    retry_delay_secs: u64,
    /// Per-request HTTP timeout in seconds.
    #[arg(long, global = true, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

impl Settings {
    /// Converts the parsed flags into a monitor configuration.
    fn into_config(self) -> MonitorConfig {
        MonitorConfig::new()
            .specials_url(self.specials_url)
            .details_url(self.details_url)
            .data_file(self.data_file)
            .country(self.country)
            .language(self.language)
            .check_interval(Duration::from_secs(self.interval_secs))
            .item_delay(Duration::from_secs(self.item_delay_secs))
            .retry_delay(Duration::from_secs(self.retry_delay_secs))
            .request_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Installs the global subscriber: `RUST_LOG`-filtered, to stdout and to
/// `log_file` (appended, without colors).
fn init_tracing(log_file: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

/// Runs the CLI, returning an appropriate exit code.
async fn run() -> io::Result<ExitCode> {
    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(err) = init_tracing(&cli.log_file) {
        writeln!(
            io::stderr().lock(),
            "{} cannot open log file {}: {err}",
            "error:".red().bold(),
            cli.log_file.display()
        )?;
        return Ok(ExitCode::FAILURE);
    }

    let monitor = match Monitor::from_config(cli.settings.into_config()) {
        Ok(monitor) => monitor,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to build monitor: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    dispatch(&monitor, cli.command.unwrap_or(Command::Run)).await
}

/// Dispatches to the appropriate subcommand handler.
async fn dispatch<S: Storage, C: Clock>(
    monitor: &Monitor<S, C>,
    command: Command,
) -> io::Result<ExitCode> {
    match command {
        Command::Run => cmd_run(monitor).await,
        Command::Once => cmd_once(monitor).await,
        Command::Check { app_id } => cmd_check(monitor, app_id).await,
        Command::List => cmd_list(monitor).await,
    }
}

/// Executes the `run` subcommand: polls until Ctrl-C.
async fn cmd_run<S: Storage, C: Clock>(monitor: &Monitor<S, C>) -> io::Result<ExitCode> {
    writeln!(
        io::stdout().lock(),
        "{} checking every {}s, press Ctrl-C to stop",
        "steam-freebies".green().bold(),
        monitor.config().check_interval.as_secs()
    )?;
    monitor.run_forever().await;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `once` subcommand: one cycle, then a summary.
async fn cmd_once<S: Storage, C: Clock>(monitor: &Monitor<S, C>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Checking specials...");
    let report = monitor.run_cycle().await;
    spinner.finish_and_clear();
    print_cycle_report(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `check` subcommand: inspects one app.
async fn cmd_check<S: Storage, C: Clock>(
    monitor: &Monitor<S, C>,
    app_id: AppId,
) -> io::Result<ExitCode> {
    let spinner = make_spinner("Fetching app details...");
    match monitor.inspect(app_id).await {
        Ok(inspection) => {
            spinner.finish_and_clear();
            print_inspection(app_id, &inspection)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            spinner.finish_and_clear();
            writeln!(
                io::stderr().lock(),
                "{} failed to check app {app_id}: {err}",
                "error:".red().bold()
            )?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `list` subcommand: prints all recorded games.
async fn cmd_list<S: Storage, C: Clock>(monitor: &Monitor<S, C>) -> io::Result<ExitCode> {
    match monitor.discoveries().await {
        Ok(games) => {
            print_games_table("Recorded Games", &games)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to read discoveries: {err}",
                "error:".red().bold()
            )?;
            Ok(ExitCode::FAILURE)
        }
    }
}

// ── Output formatting ────────────────────────────────────────────────

/// Prints the counters of a cycle and the games it recorded.
fn print_cycle_report(report: &CycleReport) -> io::Result<()> {
    {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", "Cycle finished".green().bold())?;
        writeln!(out)?;
        writeln!(out, "  {} {}", "Listed:".bold(), report.listed)?;
        writeln!(out, "  {} {}", "Inspected:".bold(), report.inspected)?;
        if !report.failed.is_empty() {
            let ids: Vec<String> = report.failed.iter().map(ToString::to_string).collect();
            writeln!(out, "  {} {}", "Failed:".red().bold(), ids.join(", "))?;
        }
        writeln!(out)?;
    }
    print_games_table("New Free Games", &report.discovered)
}

/// Prints the outcome of inspecting one app.
fn print_inspection(app_id: AppId, inspection: &Inspection) -> io::Result<()> {
    let mut out = io::stdout().lock();
    match *inspection {
        Inspection::Discovered(ref game) => writeln!(
            out,
            "{} {} (was {}, free until {}), recorded",
            "FREE".green().bold(),
            game.name.bold(),
            game.original_price,
            game.end_date
        ),
        Inspection::AlreadyRecorded => writeln!(
            out,
            "{} app {app_id} is free and already recorded",
            "FREE".green().bold()
        ),
        Inspection::NotQualifying(reason) => {
            writeln!(out, "{} app {app_id}: {reason}", "skip".yellow().bold())
        }
    }
}

/// Prints games in a table.
fn print_games_table(title: &str, games: &[DiscoveredGame]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if games.is_empty() {
        writeln!(out, "{}", "No games found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("App ID").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Was").fg(Color::Cyan),
        Cell::new("Free Until").fg(Color::Cyan),
        Cell::new("Found").fg(Color::Cyan),
    ]);

    for game in games {
        _ = table.add_row(vec![
            Cell::new(game.id),
            Cell::new(&game.name),
            Cell::new(&game.original_price).fg(Color::Red),
            Cell::new(&game.end_date),
            Cell::new(&game.found_date).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        title.green().bold(),
        format_args!("({})", games.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            // If stderr itself failed, nothing more can be reported.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use steam_freebies::clock::SystemClock;
    use steam_freebies::monitor::SkipReason;
    use steam_freebies::storage::InMemoryStorage;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Creates a test record.
    fn test_game(id: u32, name: &str) -> DiscoveredGame {
        DiscoveredGame {
            id: AppId::new(id),
            name: name.to_owned(),
            found_date: "2024-03-01 12:00:00".to_owned(),
            original_price: "$9.99".to_owned(),
            end_date: "Unknown".to_owned(),
        }
    }

    /// Creates a monitor against `server` with no courtesy delay.
    fn mock_monitor(
        server: &MockServer,
        storage: InMemoryStorage,
    ) -> Monitor<InMemoryStorage, SystemClock> {
        let config = MonitorConfig::new()
            .specials_url(format!("{}/api/featuredcategories", server.uri()))
            .details_url(format!("{}/api/appdetails", server.uri()))
            .item_delay(Duration::ZERO);
        Monitor::builder()
            .config(config)
            .storage(storage)
            .clock(SystemClock)
            .build()
            .unwrap()
    }

    /// Mounts a listing with one free and one discounted app.
    async fn mount_store(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/featuredcategories"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"specials": {"items": [{"id": 10}, {"id": 20}]}}"#,
            ))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/appdetails"))
            .and(wiremock::matchers::query_param("appids", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"10": {"success": true, "data": {"name": "Game A", "is_free": false,
                    "price_overview": {"initial": 999, "discount_percent": 100,
                    "initial_formatted": "$9.99"}}}}"#,
            ))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/appdetails"))
            .and(wiremock::matchers::query_param("appids", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"20": {"success": true, "data": {"name": "Game B", "is_free": false,
                    "price_overview": {"initial": 1999, "discount_percent": 50}}}}"#,
            ))
            .mount(server)
            .await;
    }

    // ── CLI parsing tests ────────────────────────────────────────────

    #[test]
    fn cli_defaults_match_monitor_defaults() {
        let cli = Cli::try_parse_from(["steam-freebies"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_file, PathBuf::from("steam_freebies.log"));
        assert_eq!(cli.settings.into_config(), MonitorConfig::default());
    }

    #[test]
    fn cli_parses_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "steam-freebies",
            "once",
            "--interval-secs",
            "60",
            "--item-delay-secs",
            "0",
            "--data-file",
            "/tmp/free.json",
            "--country",
            "de",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Once)));
        let config = cli.settings.into_config();
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert_eq!(config.item_delay, Duration::ZERO);
        assert_eq!(config.data_file, PathBuf::from("/tmp/free.json"));
        assert_eq!(config.country, "de");
    }

    #[test]
    fn cli_parses_check_app_id() {
        let cli = Cli::try_parse_from(["steam-freebies", "check", "440"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Check { app_id }) if app_id == AppId::new(440)
        ));
    }

    #[test]
    fn cli_rejects_non_numeric_app_id() {
        assert!(Cli::try_parse_from(["steam-freebies", "check", "tf2"]).is_err());
    }

    // ── Output tests ─────────────────────────────────────────────────

    #[test]
    fn print_games_table_empty() {
        assert!(print_games_table("Recorded Games", &[]).is_ok());
    }

    #[test]
    fn print_games_table_with_data() {
        let games = vec![test_game(10, "Game A"), test_game(20, "Ведьмак")];
        assert!(print_games_table("Recorded Games", &games).is_ok());
    }

    #[test]
    fn print_cycle_report_with_failures() {
        let report = CycleReport {
            listed: 3,
            inspected: 2,
            discovered: vec![test_game(10, "Game A")],
            failed: vec![AppId::new(30)],
        };
        assert!(print_cycle_report(&report).is_ok());
    }

    #[test]
    fn print_inspection_all_outcomes() {
        let id = AppId::new(10);
        assert!(print_inspection(id, &Inspection::Discovered(test_game(10, "Game A"))).is_ok());
        assert!(print_inspection(id, &Inspection::AlreadyRecorded).is_ok());
        assert!(
            print_inspection(id, &Inspection::NotQualifying(SkipReason::NotDiscounted)).is_ok()
        );
    }

    #[test]
    fn make_spinner_creates_spinner() {
        let spinner = make_spinner("Testing...");
        spinner.finish_and_clear();
    }

    // ── cmd_* tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn cmd_once_records_free_game() {
        let server = MockServer::start().await;
        mount_store(&server).await;
        let monitor = mock_monitor(&server, InMemoryStorage::new());

        let code = cmd_once(&monitor).await.unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        let games = monitor.storage().snapshot().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "Game A");
    }

    #[tokio::test]
    async fn cmd_check_reports_outcome() {
        let server = MockServer::start().await;
        mount_store(&server).await;
        let monitor = mock_monitor(&server, InMemoryStorage::new());

        assert_eq!(
            cmd_check(&monitor, AppId::new(20)).await.unwrap(),
            ExitCode::SUCCESS
        );
        assert!(monitor.storage().snapshot().unwrap().is_empty());
        assert_eq!(
            cmd_check(&monitor, AppId::new(10)).await.unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(monitor.storage().snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cmd_check_http_failure_exits_nonzero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let monitor = mock_monitor(&server, InMemoryStorage::new());

        let code = cmd_check(&monitor, AppId::new(10)).await.unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn cmd_list_prints_recorded_games() {
        let server = MockServer::start().await;
        let storage = InMemoryStorage::with_games(vec![test_game(10, "Game A")]);
        let monitor = mock_monitor(&server, storage);

        assert_eq!(cmd_list(&monitor).await.unwrap(), ExitCode::SUCCESS);
    }

    #[tokio::test]
    async fn dispatch_list() {
        let server = MockServer::start().await;
        let monitor = mock_monitor(&server, InMemoryStorage::new());
        let code = dispatch(&monitor, Command::List).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
