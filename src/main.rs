mod commands;
mod logging;

use clap::Parser;
use color_eyre::Result;
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use commands::{to_filters, Command};
use rowcache::config::Config;
use rowcache::db::{GenericDatabase, Limit};
use rowcache::model::{Items, RowKind, TableKind};

#[derive(Parser, Debug)]
#[command(name = "rowcache")]
#[command(about = "Query a PostgreSQL schema through cached row and table records")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rowcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Log filter, e.g. "debug" (RUST_LOG takes precedence)
  #[arg(long)]
  log_level: Option<String>,

  /// Write logs to this file instead of stderr
  #[arg(long)]
  log_file: Option<PathBuf>,

  /// Print rows as JSON
  #[arg(long)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let level = args
    .log_level
    .clone()
    .or_else(|| config.log_level.clone())
    .unwrap_or_else(|| "warn".to_string());
  let _guard = logging::init_tracing(&level, args.log_file.as_deref())?;

  let cache = Arc::new(config.cache.build());
  let mut db = GenericDatabase::connect(config.db_config())
    .await
    .with_cache(cache);
  if !db.is_connected() {
    warn!(host = %db.config().host, "no database connection; reads will come back empty");
  }

  run(&mut db, args.command, args.json).await
}

async fn run(db: &mut GenericDatabase, command: Command, json: bool) -> Result<()> {
  match command {
    Command::Tables => {
      for table in db.get_tables().await? {
        println!("{}", table);
      }
    }
    Command::SchemaExists => match db.schema_exists().await? {
      Some(exists) => println!("{}", exists),
      None => println!("unknown (not connected)"),
    },
    Command::CreateSchema => {
      db.create_schema().await?;
      info!(schema = db.schema(), "schema created");
    }
    Command::Get { table, filters } => {
      let (row_kind, _) = adhoc_kinds(&table);
      match db.get_item(row_kind, None, &to_filters(&filters)).await? {
        Some(row) => print_record(&row, json)?,
        None => eprintln!("no matching row in {}", table),
      }
    }
    Command::List { table, filters } => {
      let (_, table_kind) = adhoc_kinds(&table);
      let items = db
        .get_items(table_kind, Items::default(), &to_filters(&filters))
        .await?;
      match items {
        Items::Table(t) => print_record(&t, json)?,
        Items::Rows(rows) if json => println!("{}", serde_json::to_string_pretty(&rows)?),
        Items::Rows(rows) => {
          for row in rows {
            println!("{}", row);
          }
        }
      }
    }
    Command::Delete {
      table,
      filters,
      limit,
      offset,
    } => {
      let (row_kind, _) = adhoc_kinds(&table);
      let limit = match (limit, offset) {
        (Some(count), Some(offset)) => Some(Limit::Range { offset, count }),
        (Some(count), None) => Some(Limit::Count(count)),
        (None, _) => None,
      };
      db.remove_rows(row_kind, limit, &to_filters(&filters))
        .await?;
    }
    Command::Drop { table } => {
      db.drop_table(table.as_str()).await?;
    }
  }

  info!(stats = %db.cache().stats(), "done");
  Ok(())
}

/// Kinds for a table named on the command line. Its rows take their columns
/// from the result description.
fn adhoc_kinds(table: &str) -> (&'static RowKind, &'static TableKind) {
  // Kinds are process-lifetime declarations; one leak per invocation.
  let name: &'static str = Box::leak(table.to_string().into_boxed_str());
  let row_kind: &'static RowKind = Box::leak(Box::new(RowKind::untyped(name, Some(name))));
  let table_kind: &'static TableKind = Box::leak(Box::new(TableKind::new(name, None, row_kind)));
  (row_kind, table_kind)
}

fn print_record<T: Serialize + Display>(record: &T, json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(record)?);
  } else {
    print!("{}", record);
  }
  Ok(())
}
