use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use smc_scraper::{MessUser, Portal, ReportQuery, TerminalPrompt};

#[derive(Parser)]
#[command(name = "smc")]
#[command(about = "Non-interactive access to the SMC canteen portal", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        default_value = "https://newsmerp.iiserkol.ac.in",
        global = true,
        help = "Base URL of the portal"
    )]
    base_url: String,

    #[arg(
        long,
        default_value = ".",
        global = true,
        help = "Directory holding cookie caches and saved reports"
    )]
    data_dir: PathBuf,

    #[arg(help = "Username to authenticate with")]
    username: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get transactions for a roll number and save them as an HTML table
    #[command(name = "userreport")]
    UserReport {
        #[arg(help = "Roll number to fetch the ministatement for")]
        rollnumber: String,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "First day of the statement (default: 2000-02-03)",
            value_parser = parse_date,
        )]
        from: Option<NaiveDate>,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Last day of the statement (default: 2050-02-03)",
            value_parser = parse_date,
        )]
        to: Option<NaiveDate>,
    },
    /// Log out of the portal and remove the cookie file
    Logout,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let query = match &cli.command {
        Commands::UserReport {
            rollnumber,
            from,
            to,
        } => Some(
            ReportQuery::new(rollnumber.as_str())
                .with_range(*from, *to)
                .unwrap_or_else(|e| {
                    log::error!("Invalid args: {e}");
                    process::exit(1);
                }),
        ),
        Commands::Logout => None,
    };

    let portal = Portal::new(&cli.base_url).unwrap_or_else(|e| {
        log::error!("Invalid base URL '{}': {}", cli.base_url, e);
        process::exit(1);
    });

    let mut user =
        MessUser::with_portal(&cli.username, portal, &cli.data_dir).unwrap_or_else(|e| {
            log::error!("Error creating session: {}", e);
            process::exit(1);
        });

    if let Err(e) = user.login(&TerminalPrompt).await {
        log::error!("Error logging in as {}: {}", cli.username, e);
        process::exit(1);
    }

    match query {
        Some(query) => {
            if let Err(e) = user.user_report(&query).await {
                log::error!("Error fetching user report: {}", e);
                process::exit(1);
            }
        }
        None => {
            if let Err(e) = user.logout().await {
                log::error!("Error logging out: {}", e);
                process::exit(1);
            }
        }
    }
}
