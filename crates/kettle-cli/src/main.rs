mod config;
mod log_cmd;
mod plan_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use kettle_db::models::OutcomeFilter;
use kettle_db::pool;

#[derive(Parser)]
#[command(name = "kettle", about = "Workout plan parser, generator and validator")]
struct Cli {
    /// Database URL (overrides KETTLE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Upper bound on a model-backed command, in seconds
    #[arg(long, global = true, default_value_t = 120)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a kettle config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/kettle")]
        db_url: String,
        /// Model API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Generation model to pin (automatic selection when omitted)
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the kettle database (requires config file or env vars)
    DbInit,
    /// Expand gym shorthand in a workout text
    Normalize {
        /// Workout text (`-` or omitted reads stdin)
        text: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Detect the workout format and notation of a text
    Detect {
        /// Workout text (`-` or omitted reads stdin)
        text: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Parse a free-form workout into a structured weekly plan
    Parse {
        /// Workout text (`-` reads stdin)
        text: Option<String>,
        /// Attach a file (PDF, image, text); repeatable
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Give the model a thinking budget for hard layouts
        #[arg(long)]
        thinking: bool,
        #[command(flatten)]
        validation: ValidationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate a weekly plan for a training profile
    Generate {
        #[command(flatten)]
        profile: ProfileArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// Pin the generation model (overrides KETTLE_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
    /// Validate a plan JSON file (exits 1 when invalid)
    Validate {
        /// Path to the plan JSON file
        file: PathBuf,
        #[command(flatten)]
        validation: ValidationArgs,
        #[arg(long)]
        json: bool,
    },
    /// Show recent generation cycles from the audit log
    Log {
        /// Only cycles for this profile key
        #[arg(long)]
        profile: Option<String>,
        /// all, succeeded or failed
        #[arg(long, default_value = "all")]
        outcome: OutcomeFilter,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        /// Success-rate window in days (all time when omitted)
        #[arg(long)]
        since_days: Option<i64>,
    },
    /// Serve the plan tools over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Context the validator checks a plan against.
#[derive(Args, Debug, Default)]
pub struct ValidationArgs {
    /// Sport the plan must serve (library priorities apply)
    #[arg(long)]
    pub sport: Option<String>,
    /// Priority exercise the plan must include one of; repeatable
    #[arg(long)]
    pub priority: Vec<String>,
    /// Required number of training days
    #[arg(long)]
    pub frequency: Option<String>,
    /// Session length in minutes (30, 45, 60 or 75)
    #[arg(long)]
    pub session_length: Option<String>,
}

/// Training profile for `kettle generate`.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Primary goal (strength, hypertrophy, fat_loss, endurance, health, ...)
    #[arg(long)]
    pub goal: String,
    /// beginner, intermediate or advanced
    #[arg(long, default_value = "beginner")]
    pub experience: String,
    /// Training days per week
    #[arg(long, default_value_t = 3)]
    pub frequency: u8,
    #[arg(long)]
    pub sex: Option<String>,
    /// Equipment access (full_gym, home, bodyweight, ...)
    #[arg(long)]
    pub equipment: Option<String>,
    /// Pain point to program around (knee, back, shoulder); repeatable
    #[arg(long)]
    pub pain: Vec<String>,
    #[arg(long)]
    pub sport: Option<String>,
    /// Session length in minutes (30, 45, 60 or 75)
    #[arg(long)]
    pub session_length: Option<String>,
    /// Free-form notes passed to the generator
    #[arg(long)]
    pub notes: Option<String>,
    /// User identifier recorded in the audit log
    #[arg(long)]
    pub user_id: Option<String>,
    /// Do not write the cycle to the audit log
    #[arg(long)]
    pub no_audit: bool,
}

/// Where an accepted plan goes.
#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Print the plan as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
    /// Also write the plan JSON to this path
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Execute the `kettle init` command: write config file.
fn cmd_init(
    db_url: &str,
    api_key: Option<String>,
    model: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        model: config::ModelSection {
            api_key,
            model: model.clone(),
            ..Default::default()
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if has_key {
        println!("  model.api_key = (set)");
    }
    if let Some(model) = model {
        println!("  model.model = {model}");
    }
    println!();
    println!("Next: run `kettle db-init` to create and migrate the audit database.");

    Ok(())
}

/// Execute the `kettle db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let db_config = config::resolve_db(cli_db_url);

    println!("Initializing kettle database at {}...", db_config.redacted_url());

    if pool::ensure_database_exists(&db_config).await? {
        println!("  created database");
    }
    let db_pool = pool::create_pool(&db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let status = pool::database_status(&db_pool).await?;
    println!("Database ready.");
    println!("  migrations applied: {}", status.applied_migrations);
    println!("  generation_log: {} rows", status.generation_log_rows);
    if let Some(latest) = status.latest_entry {
        println!("  latest cycle: {}", latest.format("%Y-%m-%d %H:%M:%S"));
    }

    db_pool.close().await;

    println!("kettle db-init complete.");
    Ok(())
}

/// Run a model-backed command under the global timeout.
async fn with_timeout<F>(secs: u64, fut: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = anyhow::Result<()>>,
{
    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .with_context(|| format!("timed out after {secs}s"))?
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            model,
            force,
        } => {
            cmd_init(&db_url, api_key, model, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Normalize { text, json } => {
            plan_cmds::cmd_normalize(text.as_deref(), json)?;
        }
        Commands::Detect { text, json } => {
            plan_cmds::cmd_detect(text.as_deref(), json)?;
        }
        Commands::Parse {
            text,
            files,
            thinking,
            validation,
            output,
        } => {
            with_timeout(
                cli.timeout,
                plan_cmds::cmd_parse(text.as_deref(), &files, thinking, &validation, &output),
            )
            .await?;
        }
        Commands::Generate {
            profile,
            output,
            model,
        } => {
            with_timeout(
                cli.timeout,
                plan_cmds::cmd_generate(
                    cli.database_url.as_deref(),
                    model.as_deref(),
                    &profile,
                    &output,
                ),
            )
            .await?;
        }
        Commands::Validate {
            file,
            validation,
            json,
        } => {
            if !plan_cmds::cmd_validate(&file, &validation, json)? {
                std::process::exit(1);
            }
        }
        Commands::Log {
            profile,
            outcome,
            limit,
            since_days,
        } => {
            let db_config = config::resolve_db(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&db_config).await?;
            let result =
                log_cmd::run_log(&db_pool, profile.as_deref(), outcome, limit, since_days).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let db_config = config::resolve_db(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&db_config).await?;
            let result = serve_cmd::run_serve(db_pool.clone(), &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
