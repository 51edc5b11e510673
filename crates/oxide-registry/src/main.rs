//! oxide-registry CLI
//!
//! Command-line tool for rendering and running registry-derived queries.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_query::{
    Dialect, GenericDialect, MySqlDialect, PostgresDialect, Query, SqlServerDialect,
    SqliteDialect,
};
use oxide_registry::prelude::*;

/// Registry-driven SQL for Rust.
#[derive(Parser)]
#[command(name = "oxide-registry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Registry file (JSON).
    #[arg(short, long, env = "OXIDE_REGISTRY")]
    registry: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statement derived from the registry.
    Render {
        /// SQL dialect to render for.
        #[arg(short, long, value_enum, default_value_t = DialectKind::Generic)]
        dialect: DialectKind,

        #[command(flatten)]
        selection: Selection,
    },

    /// Run the derived read against a SQLite database and print JSON.
    Query {
        /// Database URL (SQLite path or connection string).
        #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
        database: String,

        /// Replacement for the `#__` table prefix token.
        #[arg(short, long, default_value = "")]
        table_prefix: String,

        #[command(flatten)]
        selection: Selection,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectKind {
    Generic,
    Mysql,
    Postgres,
    Sqlite,
    Sqlserver,
}

/// Runtime overrides applied to the loaded registry.
#[derive(Args)]
struct Selection {
    /// Primary key value to select.
    #[arg(long)]
    id: Option<i64>,

    /// Name key value to select.
    #[arg(long)]
    name: Option<String>,

    /// Rows to skip in list reads.
    #[arg(long)]
    offset: Option<u64>,

    /// Rows to return in list reads.
    #[arg(long)]
    count: Option<u64>,
}

impl Selection {
    fn apply(&self, registry: &mut ModelRegistry) {
        if self.id.is_some() {
            registry.primary_key_value = self.id;
        }
        if self.name.is_some() {
            registry.name_key_value.clone_from(&self.name);
        }
        if self.offset.is_some() || self.count.is_some() {
            let offset = self.offset.unwrap_or_else(|| registry.model_offset());
            let count = self.count.unwrap_or_else(|| registry.model_count());
            if !registry.set_pagination(offset, count) {
                info!(
                    query_object = %registry.query_object(),
                    "Paging only applies to list reads, ignoring"
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut registry = ModelRegistry::from_json_file(&cli.registry)?;
    info!(
        registry = %cli.registry.display(),
        table = %registry.table_name,
        "Loaded registry"
    );

    match cli.command {
        Commands::Render { dialect, selection } => {
            selection.apply(&mut registry);
            let sql = match dialect {
                DialectKind::Generic => render(&mut registry, GenericDialect::new())?,
                DialectKind::Mysql => render(&mut registry, MySqlDialect::new())?,
                DialectKind::Postgres => render(&mut registry, PostgresDialect::new())?,
                DialectKind::Sqlite => render(&mut registry, SqliteDialect::new())?,
                DialectKind::Sqlserver => render(&mut registry, SqlServerDialect::new())?,
            };
            println!("{sql}");
        }

        Commands::Query {
            database,
            table_prefix,
            selection,
        } => {
            selection.apply(&mut registry);
            info!("Connecting to database: {}", database);
            let adapter = SqliteAdapter::connect(&database)
                .await?
                .with_table_prefix(&table_prefix);

            let query = Query::with_dialect(SqliteDialect::new());
            let mut controller = Controller::new(registry, query, adapter);
            let result = controller.read().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn render<D: Dialect + Clone>(registry: &mut ModelRegistry, dialect: D) -> Result<String> {
    let mut query = Query::with_dialect(dialect);
    derive_query(registry, &mut query)?;
    Ok(query.render_sql()?)
}
