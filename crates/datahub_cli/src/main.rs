//! datahub command-line entry point.
//!
//! Usage:
//!   datahub serve --db datahub.sqlite3 --port 5000
//!   datahub init-db --db datahub.sqlite3
//!   datahub ping

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use datahub_api::AppState;
use datahub_core::db::migrations::current_version;
use datahub_core::db::open_db;
use datahub_core::{core_version, default_log_level, init_logging, ping};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "datahub", version)]
#[command(about = "Soft-delete aware record store over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Create or migrate the database file and print its schema version
    InitDb(DbArgs),
    /// Print core health and version
    Ping,
}

#[derive(Args, Debug)]
struct DbArgs {
    /// SQLite database file
    #[arg(long, default_value = "datahub.sqlite3")]
    db: PathBuf,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    store: DbArgs,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// trace|debug|info|warn|error
    #[arg(long, default_value = default_log_level())]
    log_level: String,

    /// Absolute log directory (defaults to ./logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args),
        Command::InitDb(args) => init_db(&args.db),
        Command::Ping => {
            println!("datahub ping={} version={}", ping(), core_version());
            Ok(())
        }
    }
}

fn serve(args: ServeArgs) -> Result<()> {
    let log_dir = resolve_log_dir(args.log_dir)?;
    init_logging(&args.log_level, &log_dir.to_string_lossy()).map_err(|err| anyhow!(err))?;

    let conn = open_db(&args.store.db)
        .with_context(|| format!("failed to open database `{}`", args.store.db.display()))?;
    datahub_core::SqliteEntityRepository::try_new(&conn)
        .context("database is not ready for record access")?;

    let addr = format!("{}:{}", args.host, args.port);
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind `{addr}`"))?;
        info!(
            "event=server_start module=cli status=ok addr={} db={}",
            addr,
            args.store.db.display()
        );
        println!("datahub listening on http://{addr}");
        datahub_api::serve(listener, AppState::new(conn))
            .await
            .context("HTTP server failed")
    })
}

fn init_db(path: &Path) -> Result<()> {
    let conn = open_db(path)
        .with_context(|| format!("failed to open database `{}`", path.display()))?;
    let version = current_version(&conn).context("failed to read schema version")?;
    println!("datahub database {} schema_version={}", path.display(), version);
    Ok(())
}

fn resolve_log_dir(log_dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match log_dir {
        Some(dir) => dir,
        None => std::env::current_dir()
            .context("failed to resolve current directory")?
            .join("logs"),
    };
    if dir.is_absolute() {
        return Ok(dir);
    }
    Ok(std::env::current_dir()
        .context("failed to resolve current directory")?
        .join(dir))
}
