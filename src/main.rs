//! docsweep CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use docsweep::{
    commands::{
        cmd_delete_direct, cmd_delete_interactive, cmd_list_documents, cmd_plan, cmd_status,
        describe_target, print_documents, print_plan, print_report, print_status, read_document_id,
        DeletionOutcome,
    },
    config::{load_env_file, Config},
    error::Result,
    plan::{PlanVariant, Planner},
    store::Store,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docsweep")]
#[command(version, about = "Delete documents and everything derived from them from a LightRAG store", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Cascade variant (overrides the config file)
    #[arg(long, value_enum, global = true)]
    variant: Option<PlanVariant>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List document ids in the catalog
    List {
        /// Output only document IDs (one per line, for scripting)
        #[arg(long)]
        ids_only: bool,
    },

    /// Delete a document and all related data
    ///
    /// Without flags, lists the catalog and asks which document to delete.
    Delete {
        /// Delete this id directly, without listing or confirmation
        #[arg(long, conflicts_with = "direct")]
        id: Option<String>,

        /// Read the id to delete from stdin, without listing or confirmation
        #[arg(long)]
        direct: bool,
    },

    /// Show the deletion plan for an id without touching the store
    Plan {
        /// Document ID
        doc_id: String,
    },

    /// Show store status
    Status,

    /// Print the effective configuration
    Config {
        /// Save it to the config path. Connection fields that match their
        /// PG* environment default are left out of the file
        #[arg(long)]
        write: bool,
    },

    /// Create empty LightRAG tables in the configured store
    Init,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Read before logging and config so RUST_LOG and PG* from .env apply
    let env_file = load_env_file(None);

    // Logs go to stderr so stdout stays clean for listings and JSON
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let (plain, json) = if cli.json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };
    tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(filter)
        .init();

    env_file?;

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "docsweep", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(variant) = cli.variant {
        config.cascade.variant = variant;
    }

    // Commands that never open the store
    match &cli.command {
        Commands::Plan { doc_id } => {
            let plan = cmd_plan(&config.planner()?, doc_id);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan, config.database.dialect())?;
            }
            return Ok(());
        }
        Commands::Config { write } => {
            if *write {
                config.save()?;
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("# {}", config.paths.config_file.display());
                println!("# store: {}", describe_target(&config));
                print!("{}", toml::to_string_pretty(&config)?);
            }
            return Ok(());
        }
        _ => {}
    }

    let planner = config.planner()?;
    let mut store = Store::connect(&config).await?;
    let result = run_store_command(&cli, &config, &planner, &mut store).await;
    let failed = store.close_after(result).await?;

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Run a command that needs the store. Returns whether a deletion failed.
async fn run_store_command(
    cli: &Cli,
    config: &Config,
    planner: &Planner,
    store: &mut Store,
) -> Result<bool> {
    match &cli.command {
        Commands::List { ids_only } => {
            let ids = cmd_list_documents(store).await?;

            if *ids_only {
                for id in &ids {
                    println!("{}", id);
                }
            } else if cli.json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                print_documents(&ids)?;
            }
        }

        Commands::Delete { id, direct } => {
            // With --json the conversation moves to stderr
            let mut out: Box<dyn Write> = if cli.json {
                Box::new(std::io::stderr())
            } else {
                Box::new(std::io::stdout())
            };
            let mut input = std::io::stdin().lock();

            let outcome = match id {
                Some(id) => cmd_delete_direct(store, planner, id, out.as_mut()).await?,
                None if *direct => {
                    let id = read_document_id(&mut input, out.as_mut())?;
                    cmd_delete_direct(store, planner, &id, out.as_mut()).await?
                }
                None => cmd_delete_interactive(store, planner, &mut input, out.as_mut()).await?,
            };
            out.flush()?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if let (true, DeletionOutcome::Deleted { report }) = (cli.verbose, &outcome) {
                print_report(report);
            }
            return Ok(outcome.is_failure());
        }

        Commands::Status => {
            let status = cmd_status(config, store).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Init => {
            store.init_schema().await?;
            if cli.json {
                println!(r#"{{"status": "ok", "message": "Schema initialized"}}"#);
            } else {
                println!("✓ LightRAG tables created");
            }
        }

        Commands::Plan { .. } | Commands::Config { .. } | Commands::Completions { .. } => {
            unreachable!()
        }
    }

    Ok(false)
}
