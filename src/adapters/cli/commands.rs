//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the catalyst trading pipeline.

use clap::{Parser, Subcommand};
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::adapters::broker_http::{BrokerHttpClient, BrokerHttpConfig};
use crate::adapters::market_http::{MarketDataHttpClient, MarketDataHttpConfig};
use crate::adapters::news_http::{NewsHttpClient, NewsHttpConfig};
use crate::adapters::sim::{PaperBroker, SimMarketData, SimNewsFeed};
use crate::application::{
    HealthMonitor, Orchestrator, OrchestratorConfig, ScheduleConfig, Scheduler,
};
use crate::catalyst::{CatalystScorer, ScorerConfig};
use crate::config::{load_config, Config};
use crate::domain::cycle::CycleMode;
use crate::domain::news::CatalystSummary;
use crate::engine::{
    EngineConfig, ExecutionEngine, OutcomeCollector, PositionMonitor,
};
use crate::domain::risk::RiskLimits;
use crate::patterns::detector::{DetectorConfig, PatternDetector};
use crate::ports::broker::BrokerPort;
use crate::ports::market_data::MarketDataPort;
use crate::ports::news::NewsFeedPort;
use crate::scanner::{Scanner, ScannerConfig};
use crate::storage::snapshot::SNAPSHOT_FILE;
use crate::storage::{MemoryStore, Store, TradeSnapshot};
use crate::strategy::{GeneratorConfig, SignalGenerator};

/// Catalyst-driven equity trading pipeline
#[derive(Parser, Debug)]
#[command(
    name = "catalyst-pipeline",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Catalyst-driven equity trading pipeline",
    long_about = "Scores news catalysts, aligns them with candlestick patterns and \
                  technical indicators, and executes risk-managed trades on a \
                  session-aware schedule."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the scheduled trading loop
    Run(RunCmd),

    /// Run a single pipeline cycle and exit
    Cycle(CycleCmd),

    /// Scan the universe and print the top candidates
    Scan(ScanCmd),

    /// Show open positions and recent performance
    Status(StatusCmd),
}

/// Start the scheduled trading loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Run against simulated market data and a paper broker
    #[arg(short, long)]
    pub paper: bool,

    /// Seed for the simulated feeds (paper mode only)
    #[arg(long, value_name = "SEED", default_value = "42")]
    pub seed: u64,
}

/// Run one cycle
#[derive(Parser, Debug)]
pub struct CycleCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Run against simulated market data and a paper broker
    #[arg(short, long)]
    pub paper: bool,

    /// Seed for the simulated feeds (paper mode only)
    #[arg(long, value_name = "SEED", default_value = "42")]
    pub seed: u64,

    /// Cycle mode (aggressive, normal, light)
    #[arg(short, long, value_name = "MODE", default_value = "normal")]
    pub mode: String,
}

/// Scan for candidates
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Run against simulated market data
    #[arg(short, long)]
    pub paper: bool,

    /// Seed for the simulated feeds (paper mode only)
    #[arg(long, value_name = "SEED", default_value = "42")]
    pub seed: u64,
}

/// Show status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    // Initialize logging based on flags
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Cycle(cmd) => cycle_command(cmd).await,
        Command::Scan(cmd) => scan_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

/// Everything a command needs, wired against one set of ports.
struct Pipeline {
    orchestrator: Orchestrator,
    scheduler: Scheduler,
    monitor: PositionMonitor,
    health: HealthMonitor,
    engine: ExecutionEngine,
    outcomes: OutcomeCollector,
}

fn load_pipeline_config(path: &Path, paper: bool) -> Result<Config> {
    if paper && !path.exists() {
        tracing::info!(path = %path.display(), "no config file found, paper mode uses defaults");
        return Ok(Config::default());
    }
    load_config(path).with_context(|| format!("failed to load config from {}", path.display()))
}

fn build_ports(
    config: &Config,
    paper: bool,
    seed: u64,
) -> Result<(Arc<dyn MarketDataPort>, Arc<dyn NewsFeedPort>, Arc<dyn BrokerPort>)> {
    if paper {
        let sim = Arc::new(SimMarketData::new(seed));
        let broker = PaperBroker::new(100_000.0).with_market_data(sim.clone());
        let news = SimNewsFeed::new(seed, config.schedule.utc_offset_hours);
        return Ok((sim, Arc::new(news), Arc::new(broker)));
    }

    let market_data = MarketDataHttpClient::new(MarketDataHttpConfig {
        base_url: config.market_data.api_url.clone(),
        api_key: config.market_data.get_api_key(),
        timeout: Duration::from_secs(config.market_data.timeout_seconds),
    })
    .context("failed to create market data client")?;

    let news = NewsHttpClient::new(NewsHttpConfig {
        base_url: config.news.api_url.clone(),
        api_key: config.news.get_api_key(),
        timeout: Duration::from_secs(config.news.timeout_seconds),
        utc_offset_hours: config.schedule.utc_offset_hours,
    })
    .context("failed to create news client")?;

    let broker = BrokerHttpClient::new(BrokerHttpConfig {
        base_url: config.broker.api_url.clone(),
        api_key: config.broker.get_api_key(),
        timeout: Duration::from_secs(config.broker.timeout_seconds),
    })
    .context("failed to create broker client")?;

    Ok((Arc::new(market_data), Arc::new(news), Arc::new(broker)))
}

fn build_pipeline(config: &Config, paper: bool, seed: u64) -> Result<Pipeline> {
    let (market_data, news, broker) = build_ports(config, paper, seed)?;
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    let snapshot_dir = match config.storage.data_dir.as_str() {
        "" => None,
        dir => Some(PathBuf::from(dir)),
    };
    let engine = ExecutionEngine::new(
        broker.clone(),
        store.clone(),
        EngineConfig {
            limits: RiskLimits::from(config),
            snapshot_dir,
        },
    );

    let orchestrator = Orchestrator::new(
        news.clone(),
        CatalystScorer::new(ScorerConfig::default()),
        Scanner::new(ScannerConfig::from(config), market_data.clone()),
        PatternDetector::new(DetectorConfig::default()),
        SignalGenerator::new(GeneratorConfig::from(config)),
        engine.clone(),
        store.clone(),
        OrchestratorConfig::from(config),
    );

    let scheduler = Scheduler::new(orchestrator.clone(), ScheduleConfig::from(config));
    let monitor = PositionMonitor::new(engine.clone(), market_data.clone());
    let health = HealthMonitor::new(market_data.clone(), news.clone(), broker);
    let outcomes = OutcomeCollector::new(store);

    Ok(Pipeline {
        orchestrator,
        scheduler,
        monitor,
        health,
        engine,
        outcomes,
    })
}

fn parse_mode(mode: &str) -> Result<CycleMode> {
    match mode {
        "aggressive" => Ok(CycleMode::Aggressive),
        "normal" => Ok(CycleMode::Normal),
        "light" => Ok(CycleMode::Light),
        other => bail!("unknown cycle mode '{}', expected aggressive, normal or light", other),
    }
}

/// Handle run command
async fn run_command(cmd: RunCmd) -> Result<()> {
    let config = load_pipeline_config(&cmd.config, cmd.paper)?;
    let pipeline = build_pipeline(&config, cmd.paper, cmd.seed)?;

    if cmd.paper {
        tracing::warn!("PAPER TRADING MODE - simulated feeds and broker");
    }

    let recovered = pipeline.engine.recover().await?;
    if recovered > 0 {
        tracing::info!(trades = recovered, "recovered open trades from snapshot");
    }

    let scheduler = pipeline.scheduler.clone();
    let monitor = pipeline.monitor.clone();
    let health = pipeline.health.clone();
    let scheduler_task = tokio::spawn(async move { scheduler.run().await });
    let monitor_task = tokio::spawn(async move { monitor.run().await });
    let health_task = tokio::spawn(async move { health.run().await });

    tracing::info!("pipeline started, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown signal received");

    pipeline.scheduler.stop().await;
    pipeline.monitor.stop().await;
    pipeline.health.stop().await;
    let _ = tokio::join!(scheduler_task, monitor_task, health_task);

    // Flatten whatever is still open before exiting
    pipeline.orchestrator.end_of_day().await;
    pipeline.outcomes.log_review(1).await?;

    tracing::info!("pipeline stopped");
    Ok(())
}

/// Handle cycle command
async fn cycle_command(cmd: CycleCmd) -> Result<()> {
    let mode = parse_mode(&cmd.mode)?;
    let config = load_pipeline_config(&cmd.config, cmd.paper)?;
    let pipeline = build_pipeline(&config, cmd.paper, cmd.seed)?;

    let cycle = pipeline.orchestrator.run_cycle(mode).await?;

    println!("Cycle {} ({:?}) - {:?}", cycle.id, cycle.mode, cycle.status);
    println!("  Catalysts:  {}", cycle.catalysts_found);
    println!("  Candidates: {}", cycle.candidates_selected);
    println!("  Patterns:   {}", cycle.patterns_detected);
    println!("  Signals:    {}", cycle.signals_generated);
    println!("  Trades:     {}", cycle.trades_executed);
    for record in &cycle.stages {
        println!("  [{:?}] {} items in {}ms", record.stage, record.items, record.duration_ms);
    }
    if let Some(ref failure) = cycle.failure {
        println!("  Failed: {}", failure);
    }

    for trade in pipeline.engine.open_trades().await {
        println!(
            "  Open: {} {:?} {} @ {:.2} (stop {:.2}, targets {:.2}/{:.2})",
            trade.symbol,
            trade.side,
            trade.quantity,
            trade.entry_price,
            trade.stop_loss,
            trade.target_1,
            trade.target_2
        );
    }

    Ok(())
}

/// Handle scan command
async fn scan_command(cmd: ScanCmd) -> Result<()> {
    let config = load_pipeline_config(&cmd.config, cmd.paper)?;
    let (market_data, news, _broker) = build_ports(&config, cmd.paper, cmd.seed)?;

    let scorer = CatalystScorer::new(ScorerConfig::default());
    let scanner = Scanner::new(ScannerConfig::from(&config), market_data);

    let now = Utc::now();
    let mut catalysts: HashMap<String, CatalystSummary> = HashMap::new();
    for symbol in config.universe() {
        let items = match news.recent_news(&symbol, config.news.window_hours).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "news fetch failed, skipping");
                continue;
            }
        };
        let summary = scorer.score(&symbol, &items, now);
        if !summary.is_quiet() {
            catalysts.insert(symbol, summary);
        }
    }

    if catalysts.is_empty() {
        println!("No active catalysts in the universe.");
        return Ok(());
    }

    let candidates = scanner.scan(&catalysts).await?;
    if candidates.is_empty() {
        println!("Catalysts found, but no symbol passed the technical filters.");
        return Ok(());
    }

    println!("{:<8} {:>8} {:>10} {:>8}  {}", "SYMBOL", "SCORE", "PRICE", "RSI", "TOP HEADLINE");
    for candidate in &candidates {
        println!(
            "{:<8} {:>8.1} {:>10.2} {:>8.1}  {}",
            candidate.symbol,
            candidate.combined_score,
            candidate.last_price,
            candidate.indicators.rsi.unwrap_or(f64::NAN),
            candidate.catalyst.top_headline.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

/// Handle status command
async fn status_command(cmd: StatusCmd) -> Result<()> {
    let config = load_pipeline_config(&cmd.config, true)?;

    let snapshot_path = Path::new(&config.storage.data_dir).join(SNAPSHOT_FILE);
    let snapshot = TradeSnapshot::load(&snapshot_path)?;

    match cmd.format.as_str() {
        "json" => {
            let open = snapshot.map(|s| s.open_trades).unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&open)?);
        }
        _ => match snapshot {
            Some(snapshot) if !snapshot.open_trades.is_empty() => {
                println!("Open trades (snapshot from {}):", snapshot.saved_at);
                for trade in &snapshot.open_trades {
                    println!(
                        "  {} {:?} {} @ {:.2}  stop {:.2}  last {:.2}",
                        trade.symbol,
                        trade.side,
                        trade.quantity,
                        trade.entry_price,
                        trade.stop_loss,
                        trade.last_price
                    );
                }
            }
            _ => {
                println!("No open trades on record at {}", snapshot_path.display());
            }
        },
    }

    Ok(())
}
