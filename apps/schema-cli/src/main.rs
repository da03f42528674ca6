use clap::{Parser, ValueEnum};
use db_pool::{ConnectionPool, DatabaseLocation, RuntimeEnv};
use habits_backend::config::db::pool_config_for;
use habits_backend::infra::schema::{ensure_schema, list_tables, reset_schema, TABLES};
use tracing::{error, info};

#[derive(Clone, Copy, ValueEnum)]
enum Env {
    Prod,
    Dev,
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum Command {
    /// Create missing tables and indexes
    Init,
    /// Drop every table and recreate the schema
    Reset,
    /// List which tables exist
    Status,
}

#[derive(Parser)]
#[command(name = "schema")]
#[command(about = "Habits database schema tool")]
struct Args {
    #[arg(value_enum)]
    command: Command,

    /// Runtime environment
    #[arg(short, long, value_enum, default_value = "dev")]
    env: Env,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_env_filter("schema=info,db_pool=info,sqlx=warn")
        .init();

    let args = Args::parse();

    let env = match args.env {
        Env::Prod => RuntimeEnv::Prod,
        Env::Dev => RuntimeEnv::Dev,
        Env::Test => RuntimeEnv::Test,
    };

    let config = match pool_config_for(env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid database configuration: {e}");
            std::process::exit(2);
        }
    };

    // Every CLI run would get a fresh in-memory database
    if config.location == DatabaseLocation::Memory {
        eprintln!("HABITS_DB_PATH must point at a database file for schema operations.");
        std::process::exit(2);
    }

    let pool = match ConnectionPool::new(config) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Invalid database configuration: {e}");
            std::process::exit(2);
        }
    };

    let outcome = run(&pool, args.command).await;
    if let Err(e) = pool.shutdown().await {
        error!(error = %e, "schema=shutdown_failed");
    }
    if let Err(e) = outcome {
        eprintln!("Schema command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(pool: &ConnectionPool, command: Command) -> Result<(), db_pool::DbError> {
    match command {
        Command::Init => {
            ensure_schema(pool).await?;
            info!("schema=ready");
        }
        Command::Reset => {
            reset_schema(pool).await?;
            info!("schema=reset");
        }
        Command::Status => {
            let present = list_tables(pool).await?;
            for table in TABLES {
                let state = if present.iter().any(|t| t == table) {
                    "present"
                } else {
                    "missing"
                };
                println!("{table:<12} {state}");
            }
        }
    }
    Ok(())
}
