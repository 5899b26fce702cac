//! sheet2lua CLI
//!
//! Converts the workbooks listed in the table registry into Lua tables for the game
//! client and server.
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use sheet2lua::Audience;
use sheet2lua::BatchExporter;
use sheet2lua::BatchReport;
use sheet2lua::Destination;
use sheet2lua::ExportSettings;
use sheet2lua::OutputProfile;
use sheet2lua::TableFilter;
use sheet2lua::TableRegistry;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing::warn;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// Convert game-design workbooks into Lua tables
#[derive(Parser)]
#[command(name = "sheet2lua")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the workbooks
    #[arg(short = 'e', long = "excel", default_value = "./excel")]
    excel_dir: PathBuf,

    /// Output directory for client tables
    #[arg(short = 'c', long = "client", default_value = "./client")]
    client_dir: PathBuf,

    /// Output directory for server tables
    #[arg(short = 's', long = "server", default_value = "./server")]
    server_dir: PathBuf,

    /// Table registry listing the `Servers` and `Clients` workbooks
    #[arg(long, default_value = "./config.json")]
    config: PathBuf,

    /// Lua dialect of the generated tables
    #[arg(long, value_enum, default_value = "flat")]
    profile: ProfileArg,

    /// Workbook extension looked up for each table
    #[arg(long, default_value = "xlsx")]
    extension: String,

    /// Worker threads for batch conversion (defaults to the number of CPUs)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Only convert tables matching one of these glob patterns
    #[arg(short, long)]
    filter: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert client tables, then server tables
    All,

    /// Convert server tables
    Server,

    /// Convert client tables
    Client,

    /// Convert every registered table with all columns into both output directories
    Shared,

    /// Convert a single registered table
    Table {
        /// Table name without extension (case-sensitive)
        name: String,

        /// Runtime to convert for; `all` converts for the client and then the server
        #[arg(short, long, value_enum, default_value = "all")]
        audience: AudienceArg,
    },

    /// Print the registered table names
    List {
        #[arg(short, long, value_enum, default_value = "all")]
        audience: AudienceArg,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ProfileArg {
    /// `[key] = {name=value}` with client/server column tags
    Flat,
    /// `[key] = {["name"] = value}` without column tags
    Quoted,
}

impl From<ProfileArg> for OutputProfile {
    fn from(profile: ProfileArg) -> Self {
        match profile {
            ProfileArg::Flat => OutputProfile::Flat,
            ProfileArg::Quoted => OutputProfile::Quoted,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum AudienceArg {
    All,
    Client,
    Server,
}

impl From<AudienceArg> for Audience {
    fn from(audience: AudienceArg) -> Self {
        match audience {
            AudienceArg::All => Audience::All,
            AudienceArg::Client => Audience::Client,
            AudienceArg::Server => Audience::Server,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(log_level.into()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Install logger failed")?;

    let registry = TableRegistry::load(&cli.config).context("Load table registry failed")?;
    let filter = TableFilter::new(&cli.filter)?;
    let settings = ExportSettings {
        source_dir: cli.excel_dir,
        client_dir: cli.client_dir,
        server_dir: cli.server_dir,
        profile: cli.profile.into(),
        workbook_extension: cli.extension,
        threads: cli.threads,
    };

    let source = settings.source();
    let exporter = BatchExporter::new(&source, settings.profile, settings.threads).context("Create thread pool failed")?;

    let report = match cli.command {
        Commands::All => {
            let mut report = export(&settings, &exporter, &registry, &filter, Audience::Client);
            report.merge(export(&settings, &exporter, &registry, &filter, Audience::Server));
            report
        }
        Commands::Client => export(&settings, &exporter, &registry, &filter, Audience::Client),
        Commands::Server => export(&settings, &exporter, &registry, &filter, Audience::Server),
        Commands::Shared => export(&settings, &exporter, &registry, &filter, Audience::All),
        Commands::Table { name, audience } => {
            if !registry.contains(&name, audience.into()) {
                bail!(
                    "Unknown table '{name}' for the {} audience in '{}', run `sheet2lua list` to see registered tables",
                    Audience::from(audience),
                    cli.config.display()
                );
            }
            let audiences = match audience {
                AudienceArg::All => vec![Audience::Client, Audience::Server],
                other => vec![other.into()],
            };
            let mut report = BatchReport::default();
            for audience in audiences {
                let writer = settings.writer(Destination::for_audience(audience));
                report.merge(exporter.export(&[name.as_str()], audience, &writer));
            }
            report
        }
        Commands::List { audience } => {
            for table in filter.apply(registry.tables(audience.into())) {
                println!("{table}");
            }
            return Ok(ExitCode::SUCCESS);
        }
    };

    if report.is_success() {
        info!(tables = report.total(), "All tables converted");
        Ok(ExitCode::SUCCESS)
    } else {
        let failed: Vec<&str> = report.failed.iter().map(|failure| failure.table.as_str()).collect();
        warn!(failed = ?failed, tables = report.total(), "Some tables failed");
        Ok(ExitCode::FAILURE)
    }
}

/// Converts the registered tables of one audience into its output directories.
fn export(
    settings: &ExportSettings,
    exporter: &BatchExporter<'_>,
    registry: &TableRegistry,
    filter: &TableFilter,
    audience: Audience,
) -> BatchReport {
    let tables = filter.apply(registry.tables(audience));
    let writer = settings.writer(Destination::for_audience(audience));
    info!(audience = %audience, dirs = ?writer.dirs(), "Converting {} tables", tables.len());
    exporter.export(&tables, audience, &writer)
}
