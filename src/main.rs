mod cli;
mod config;
mod db;
mod models;
mod seed;
mod store;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::parse::RecordArgs;
use config::{config_path, generate_config, read_config, Backend, Config};
use store::RecordStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage job posting records", long_about = None)]
struct Cli {
    /// Config file, defaults to config.toml in the data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,
    #[arg(long, global = true)]
    sheet: Option<String>,
    /// Work on a temporary copy of the database
    #[arg(long, global = true)]
    scratch: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    List {
        #[arg(long)]
        json: bool,
    },
    Count,
    Show {
        index: usize,
        #[arg(long)]
        json: bool,
    },
    Add {
        #[arg(long)]
        job_id: String,
        #[command(flatten)]
        fields: RecordArgs,
    },
    Update {
        job_id: String,
        #[command(flatten)]
        fields: RecordArgs,
    },
    Delete {
        #[arg(required_unless_present = "index", conflicts_with = "index")]
        job_id: Option<String>,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Import rows from a workbook, skipping job ids already present
    Seed {
        source: PathBuf,
    },
    Export {
        output: PathBuf,
        #[arg(long)]
        force: bool,
    },
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Command line flags take precedence over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(workbook) = &self.workbook {
            config.workbook = workbook.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.sheet = sheet.clone();
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "jobinfo=debug" } else { "jobinfo=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

fn run(mut cli: Cli) -> anyhow::Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config_path()?,
    };
    let command = cli.command.take().unwrap_or(Commands::List { json: false });
    // Everything except init-config works on the configured store
    let open = || -> anyhow::Result<(Config, Box<dyn RecordStore>)> {
        let config = cli.apply(read_config(&path)?);
        let store = cli::open_store(&config, cli.scratch)?;
        Ok((config, store))
    };

    match command {
        Commands::InitConfig { force } => {
            generate_config(&path, force)?;
            println!("Config written to {}", path.display());
        }
        Commands::List { json } => cli::list(&*open()?.1, json)?,
        Commands::Count => cli::count(&*open()?.1)?,
        Commands::Show { index, json } => cli::show(&*open()?.1, index, json)?,
        Commands::Add { job_id, fields } => {
            cli::add(open()?.1.as_mut(), fields.into_record(job_id))?
        }
        Commands::Update { job_id, fields } => cli::update(open()?.1.as_mut(), job_id, fields)?,
        Commands::Delete { job_id, index } => cli::delete(open()?.1.as_mut(), job_id, index)?,
        Commands::Seed { source } => {
            let (config, mut store) = open()?;
            cli::seed(store.as_mut(), &source, &config.sheet)?
        }
        Commands::Export { output, force } => {
            let (config, store) = open()?;
            cli::export(&*store, &output, &config.sheet, force)?
        }
    }

    Ok(())
}
