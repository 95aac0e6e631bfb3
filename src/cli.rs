//! CLI definition and dispatch.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::adapters::csv_history_adapter::CsvHistoryAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_trade_store::SqliteTradeStore;
use crate::adapters::upstox_adapter::UpstoxAdapter;
use crate::adapters::web::{AppState, build_router};
use crate::domain::backtest::{BacktestParams, run_backtest};
use crate::domain::error::VolguardError;
use crate::domain::garch::forecast_annualized;
use crate::domain::strategy::StrategyKind;
use crate::domain::volatility::{HvPeriod, hv_report};
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;

#[derive(Parser, Debug)]
#[command(name = "volguard", about = "Options volatility analysis and trade execution backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print a GARCH(1,1) volatility forecast from the history CSV
    Garch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = 7)]
        horizon: usize,
    },
    /// Print historical volatility from the history CSV
    Hv {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value = "all")]
        period: String,
    },
    /// Run a simulated strategy backtest over the history CSV
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: String,
        #[arg(short, long, default_value_t = 50)]
        quantity: i64,
        #[arg(short, long, default_value_t = 30)]
        period: i64,
    },
    /// Output an argon2 hash for an API token
    HashToken,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Garch { config, horizon } => run_garch(&config, horizon),
        Command::Hv { config, period } => run_hv(&config, &period),
        Command::Backtest {
            config,
            strategy,
            quantity,
            period,
        } => run_backtest_cmd(&config, &strategy, quantity, period),
        Command::HashToken => run_hash_token(),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = VolguardError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_closes(config: &dyn ConfigPort) -> Result<Vec<crate::domain::series::DailyClose>, ExitCode> {
    let history = CsvHistoryAdapter::from_config(config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    history.daily_closes().map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    use std::net::SocketAddr;

    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let trade_store = match SqliteTradeStore::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let history = match CsvHistoryAdapter::from_config(&config) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let broker = UpstoxAdapter::from_config(&config);

    let addr: SocketAddr = match config
        .get_string("server", "listen")
        .unwrap_or_else(|| "127.0.0.1:3000".to_string())
        .parse()
    {
        Ok(a) => a,
        Err(_) => {
            let err = VolguardError::ConfigInvalid {
                section: "server".into(),
                key: "listen".into(),
                reason: "expected host:port".into(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    eprintln!("Starting API server on {addr}");

    let state = AppState::new(
        Arc::new(broker),
        Arc::new(history),
        Arc::new(trade_store),
        Arc::new(config),
    );
    let router = build_router(state);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let served = runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await
    });

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: server failed: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_garch(config_path: &PathBuf, horizon: usize) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let closes = match load_closes(&config) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match forecast_annualized(&closes, horizon) {
        Ok(points) => {
            eprintln!("GARCH(1,1) {horizon}-day volatility forecast:");
            for point in &points {
                println!("{}  {:.2}%", point.date, point.forecast_volatility);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_hv(config_path: &PathBuf, period: &str) -> ExitCode {
    let Some(periods) = HvPeriod::parse_selection(period) else {
        eprintln!("error: invalid period {period:?}, choose from 7d, 30d, 1y, all");
        return ExitCode::from(4);
    };

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let closes = match load_closes(&config) {
        Ok(c) => c,
        Err(code) => return code,
    };

    for (label, value) in hv_report(&closes, &periods) {
        println!("{label}: {value:.2}%");
    }
    ExitCode::SUCCESS
}

fn run_backtest_cmd(config_path: &PathBuf, strategy: &str, quantity: i64, period: i64) -> ExitCode {
    let kind: StrategyKind = match strategy.parse() {
        Ok(k) => k,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let closes = match load_closes(&config) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let report = match run_backtest(
        &closes,
        &BacktestParams {
            strategy: kind,
            quantity,
            period_days: period,
        },
    ) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\n=== Backtest Results ({kind}, {period} days) ===");
    eprintln!("Total P&L:      {:.2}", report.total_pnl);
    eprintln!("Win Rate:       {:.1}%", report.win_rate * 100.0);
    eprintln!("Avg P&L/Trade:  {:.2}", report.avg_pnl_per_trade);
    eprintln!("Max Drawdown:   {:.2}", report.max_drawdown);
    eprintln!("Days Simulated: {}", report.pnl_history.len());
    ExitCode::SUCCESS
}

fn run_hash_token() -> ExitCode {
    use argon2::{
        Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString,
    };
    use rand::rngs::OsRng;
    use std::io::{self, BufRead};

    eprintln!("Enter API token to hash:");
    let stdin = io::stdin();
    let token = match stdin.lock().lines().next() {
        Some(Ok(line)) => line,
        _ => {
            eprintln!("error: failed to read token from stdin");
            return ExitCode::from(1);
        }
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    match argon2.hash_password(token.as_bytes(), &salt) {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to hash token: {e}");
            ExitCode::from(1)
        }
    }
}
