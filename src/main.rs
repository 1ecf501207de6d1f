mod chaos;
mod config;
mod db;
mod fake;
mod models;
mod reader;
mod sample;
mod seed;
mod writer;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::Config;
use db::Database;

const DEFAULT_COMPANIES: u64 = 20_000;
const DEFAULT_JOBS: u64 = 1_000_000;
const DEFAULT_VIEWS: u64 = 50_000_000;
const DEFAULT_APPLICATIONS: u64 = 5_000_000;
const DEFAULT_COMPANY_CHUNK: usize = 10_000;
const DEFAULT_JOB_CHUNK: usize = 10_000;
const DEFAULT_VIEW_CHUNK: usize = 50_000;
const DEFAULT_APPLICATION_BATCH: usize = 20_000;
const DEFAULT_HISTORY_BATCH: usize = 50_000;

#[derive(Parser)]
#[command(name = "jobseed")]
#[command(about = "Seed a job-board database at scale, corrupt it on purpose, check its health")]
struct Cli {
    /// Database file (defaults to JOBSEED_DB, then the platform data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema
    Init,

    /// Generate data. Re-running a phase duplicates rows; truncate the
    /// target tables first if you need a clean slate.
    Seed {
        #[command(subcommand)]
        command: SeedCommands,
    },

    /// Corrupt a sampled slice of the data for quality-check drills
    Chaos {
        /// Print the mutation counts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report jobs whose last_updated precedes posted_at
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SeedCommands {
    /// Companies (no prerequisites)
    Companies {
        #[arg(short, long, default_value_t = DEFAULT_COMPANIES)]
        count: u64,

        #[arg(long, default_value_t = DEFAULT_COMPANY_CHUNK)]
        chunk_size: usize,
    },

    /// Jobs (requires companies)
    Jobs {
        #[arg(short, long, default_value_t = DEFAULT_JOBS)]
        count: u64,

        #[arg(long, default_value_t = DEFAULT_JOB_CHUNK)]
        chunk_size: usize,
    },

    /// Views with popularity skew (requires jobs)
    Views {
        #[arg(short, long, default_value_t = DEFAULT_VIEWS)]
        count: u64,

        #[arg(long, default_value_t = DEFAULT_VIEW_CHUNK)]
        chunk_size: usize,
    },

    /// Applications derived from a sample of views (requires views)
    Applications {
        #[arg(short, long, default_value_t = DEFAULT_APPLICATIONS)]
        target: u64,

        #[arg(long, default_value_t = DEFAULT_APPLICATION_BATCH)]
        batch_size: usize,
    },

    /// Status history for every job (requires jobs)
    History {
        #[arg(long, default_value_t = DEFAULT_HISTORY_BATCH)]
        batch_size: usize,
    },

    /// All five phases in order, with the default volumes
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.db);
    let mut db = Database::open(&config)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Seed { command } => {
            db.ensure_initialized()?;
            run_seed(&mut db, command)?;
        }

        Commands::Chaos { json } => {
            db.ensure_initialized()?;
            println!("Applying chaos...");
            let report = chaos::apply_chaos(&mut db)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("  jobs backdated:      {}", report.jobs_backdated);
                println!("  jobs blanked:        {}", report.jobs_blanked);
                println!("  views duplicated:    {}", report.views_duplicated);
                println!("  applications unset:  {}", report.applications_unset);
            }
        }

        Commands::Check { json } => {
            db.ensure_initialized()?;
            let result = db.check_invalid_dates()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Data quality check: {}", result.check_name);
                println!("Problematic rows: {}", result.problem_count);
                if result.samples.is_empty() {
                    println!("No issues detected.");
                } else {
                    println!("Sample invalid records:");
                    for row in &result.samples {
                        println!(
                            "- job_id={}, posted_at={}, last_updated={}",
                            row.job_id, row.posted_at, row.last_updated
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn run_seed(db: &mut Database, command: SeedCommands) -> Result<()> {
    match command {
        SeedCommands::Companies { count, chunk_size } => {
            println!("Generating {} companies...", count);
            let written = seed::seed_companies(db, count, chunk_size)?;
            println!("Done. {} companies added.", written);
        }

        SeedCommands::Jobs { count, chunk_size } => {
            println!("Generating {} jobs...", count);
            let written = seed::seed_jobs(db, count, chunk_size)?;
            println!("Done. {} jobs added.", written);
        }

        SeedCommands::Views { count, chunk_size } => {
            println!("Generating {} views...", count);
            let written = seed::seed_views(db, count, chunk_size)?;
            println!("Done. {} views added.", written);
        }

        SeedCommands::Applications { target, batch_size } => {
            println!("Generating applications from viewed jobs (target {})...", target);
            let written = seed::seed_applications(db, target, batch_size)?;
            println!("Done. {} applications added.", written);
        }

        SeedCommands::History { batch_size } => {
            println!("Generating status history for all jobs...");
            let stats = seed::seed_history(db, batch_size)?;
            println!(
                "Done. {} history events across {} jobs ({:.2} per job).",
                stats.events,
                stats.jobs,
                stats.events as f64 / stats.jobs.max(1) as f64
            );
        }

        SeedCommands::All => {
            run_seed(
                db,
                SeedCommands::Companies {
                    count: DEFAULT_COMPANIES,
                    chunk_size: DEFAULT_COMPANY_CHUNK,
                },
            )?;
            run_seed(
                db,
                SeedCommands::Jobs {
                    count: DEFAULT_JOBS,
                    chunk_size: DEFAULT_JOB_CHUNK,
                },
            )?;
            run_seed(
                db,
                SeedCommands::Views {
                    count: DEFAULT_VIEWS,
                    chunk_size: DEFAULT_VIEW_CHUNK,
                },
            )?;
            run_seed(
                db,
                SeedCommands::Applications {
                    target: DEFAULT_APPLICATIONS,
                    batch_size: DEFAULT_APPLICATION_BATCH,
                },
            )?;
            run_seed(
                db,
                SeedCommands::History {
                    batch_size: DEFAULT_HISTORY_BATCH,
                },
            )?;
        }
    }

    Ok(())
}
