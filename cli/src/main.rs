use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info};

use food_waste_core::schema::table_schema;
use food_waste_core::{
    Database, EntityKind, Fields, Filter, QueryCatalog, Record, StoreConfig, StoreError, Value,
};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Food Waste Hub - surplus food listings, claims and reports")]
struct Args {
    /// Config file path
    #[clap(short, long, env = "FOOD_HUB_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[clap(long, env = "FOOD_HUB_DB")]
    db: Option<PathBuf>,

    /// Directory holding the CSV mirrors
    #[clap(long, env = "FOOD_HUB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory holding seed files, if not the mirrors themselves
    #[clap(long, env = "FOOD_HUB_SEED_DIR")]
    seed_dir: Option<PathBuf>,

    /// Mirror field delimiter
    #[clap(long, env = "FOOD_HUB_DELIMITER")]
    delimiter: Option<char>,

    /// Log level used when RUST_LOG is unset
    #[clap(long, env = "FOOD_HUB_LOG_LEVEL")]
    log_level: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a record from COLUMN=VALUE pairs
    Add {
        entity: EntityKind,
        fields: Vec<String>,
    },
    /// Overwrite fields of a record
    Update {
        entity: EntityKind,
        id: i64,
        fields: Vec<String>,
    },
    /// Delete a record
    Delete { entity: EntityKind, id: i64 },
    /// List records, optionally filtered by COLUMN=VALUE pairs
    List {
        entity: EntityKind,
        filters: Vec<String>,
    },
    /// Show the most recently created record
    Latest { entity: EntityKind },
    /// Show the identifier the next record will get
    NextId { entity: EntityKind },
    /// Claim lifecycle
    Claim {
        #[clap(subcommand)]
        action: ClaimAction,
    },
    /// Query catalog
    Query {
        #[clap(subcommand)]
        action: QueryAction,
    },
    /// Rewrite an entity's mirror from its table
    Resync { entity: EntityKind },
}

#[derive(Subcommand, Debug)]
enum ClaimAction {
    /// Claim a food listing for a receiver
    Submit { food_id: i64, receiver_id: i64 },
    /// Mark a claim completed
    Complete { id: i64 },
    /// Cancel a claim
    Cancel { id: i64 },
    /// List pending claims
    Pending,
}

#[derive(Subcommand, Debug)]
enum QueryAction {
    /// List catalog questions and reports
    List,
    /// Run a question by number
    Run {
        number: u32,
        /// City for the question that takes one
        #[clap(long)]
        city: Option<String>,
        /// Run a report instead of a question
        #[clap(long)]
        report: bool,
    },
    /// Write a question's or report's result to a CSV file
    Export {
        number: u32,
        #[clap(long)]
        out: PathBuf,
        #[clap(long)]
        city: Option<String>,
        #[clap(long)]
        report: bool,
    },
}

fn load_config(args: &Args) -> Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::new(),
    };

    // Override config with command-line arguments
    if let Some(db) = &args.db {
        config.database_path = db.clone();
    }
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(seed_dir) = &args.seed_dir {
        config.seed_dir = Some(seed_dir.clone());
    }
    if let Some(delimiter) = args.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(log_level) = &args.log_level {
        config.log_level = log_level.clone();
    }
    Ok(config)
}

/// Parse COLUMN=VALUE pairs using the entity's column types
fn parse_pairs(kind: EntityKind, pairs: &[String]) -> Result<Vec<(String, Value)>> {
    let schema = table_schema(kind);
    pairs
        .iter()
        .map(|pair| {
            let (column, raw) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected COLUMN=VALUE, got {:?}", pair))?;
            let column = column.trim().to_string();
            let value = match schema.column_type(&column) {
                _ if raw.trim().is_empty() => Value::Null,
                Some(column_type) => column_type.parse(raw)?,
                None => Value::from(raw),
            };
            Ok((column, value))
        })
        .collect()
}

fn format_record(record: &Record) -> String {
    record
        .values
        .iter()
        .map(|(column, value)| format!("{}={}", column, value))
        .collect::<Vec<_>>()
        .join("  ")
}

fn print_records(records: &[Record]) {
    for record in records {
        println!("{}", format_record(record));
    }
    println!("({} rows)", records.len());
}

fn run(db: &Database, command: Command) -> Result<()> {
    match command {
        Command::Add { entity, fields } => {
            let fields: Fields = parse_pairs(entity, &fields)?.into_iter().collect();
            let id = db.store(entity).create(&fields)?;
            println!("Created {} {}", entity, id);
        }
        Command::Update { entity, id, fields } => {
            let fields: Fields = parse_pairs(entity, &fields)?.into_iter().collect();
            db.store(entity).update(id, &fields)?;
            println!("Updated {} {}", entity, id);
        }
        Command::Delete { entity, id } => {
            db.store(entity).delete(id)?;
            println!("Deleted {} {}", entity, id);
        }
        Command::List { entity, filters } => {
            let filter: Filter = parse_pairs(entity, &filters)?;
            print_records(&db.store(entity).list(&filter)?);
        }
        Command::Latest { entity } => match db.store(entity).latest()? {
            Some(record) => println!("{}", format_record(&record)),
            None => println!("No {} records", entity),
        },
        Command::NextId { entity } => println!("{}", db.store(entity).next_id()?),
        Command::Claim { action } => run_claim(db, action)?,
        Command::Query { action } => run_query(db, action)?,
        Command::Resync { entity } => {
            let rows = db.store(entity).resync_mirror()?;
            println!("Wrote {} {} rows to {}", rows, entity, db.config().mirror_path(entity).display());
        }
    }
    Ok(())
}

fn run_claim(db: &Database, action: ClaimAction) -> Result<()> {
    let claims = db.claims();
    match action {
        ClaimAction::Submit { food_id, receiver_id } => {
            let id = claims.submit(food_id, receiver_id)?;
            println!("Claim {} submitted", id);
        }
        ClaimAction::Complete { id } => {
            let claim = claims.complete(id)?;
            println!("Claim {} is {}", claim.id, claim.status);
        }
        ClaimAction::Cancel { id } => {
            let claim = claims.cancel(id)?;
            println!("Claim {} is {}", claim.id, claim.status);
        }
        ClaimAction::Pending => {
            let pending = claims.pending()?;
            for claim in &pending {
                println!(
                    "Claim_ID={}  Food_ID={}  Receiver_ID={}  Timestamp={}",
                    claim.id, claim.food_id, claim.receiver_id, claim.timestamp
                );
            }
            println!("({} pending)", pending.len());
        }
    }
    Ok(())
}

fn catalog_entry(number: u32, report: bool) -> Result<&'static food_waste_core::CatalogEntry> {
    let entry = if report {
        QueryCatalog::report(number)
    } else {
        QueryCatalog::find(number)
    };
    entry.ok_or_else(|| {
        StoreError::Query(format!(
            "no {} numbered {}",
            if report { "report" } else { "query" },
            number
        ))
        .into()
    })
}

fn run_query(db: &Database, action: QueryAction) -> Result<()> {
    match action {
        QueryAction::List => {
            for entry in QueryCatalog::entries() {
                println!("{:>2}. {}", entry.number, entry.label);
            }
            println!();
            for entry in QueryCatalog::reports() {
                println!("R{}. {}", entry.number, entry.label);
            }
            println!();
            println!("Cities: {}", db.cities()?.join(", "));
        }
        QueryAction::Run { number, city, report } => {
            let entry = catalog_entry(number, report)?;
            let result = QueryCatalog::execute(db.connection(), entry, city.as_deref())?;
            println!("{}", entry.label);
            print!("{}", result.to_csv()?);
            info!("{} rows in {} ms", result.len(), result.elapsed_ms);
        }
        QueryAction::Export { number, out, city, report } => {
            let entry = catalog_entry(number, report)?;
            let result = QueryCatalog::execute(db.connection(), entry, city.as_deref())?;
            std::fs::write(&out, result.to_csv()?)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {} rows to {}", result.len(), out.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, &config.log_level),
    );
    debug!("Using database {}", config.database_path.display());

    let result = Database::open(config)
        .map_err(anyhow::Error::from)
        .and_then(|db| run(&db, args.command));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<StoreError>() {
                Some(store_error) => {
                    error!("{} ({})", store_error, store_error.kind());
                    eprintln!("{}", store_error.user_message());
                }
                None => eprintln!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_pairs_uses_column_types() {
        let pairs = vec![
            "Food_Name=Bread".to_string(),
            "Quantity=12".to_string(),
            "Location=".to_string(),
        ];
        let parsed = parse_pairs(EntityKind::FoodListing, &pairs).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("Food_Name".to_string(), Value::from("Bread")),
                ("Quantity".to_string(), Value::Integer(12)),
                ("Location".to_string(), Value::Null),
            ]
        );

        assert!(parse_pairs(EntityKind::FoodListing, &["Quantity=lots".to_string()]).is_err());
        assert!(parse_pairs(EntityKind::Provider, &["Name".to_string()]).is_err());
    }

    #[test]
    fn test_arguments_override_config() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("hub.db");
        let args = Args::parse_from([
            "food-hub",
            "--db",
            db.to_str().unwrap(),
            "--delimiter",
            ";",
            "next-id",
            "providers",
        ]);

        let config = load_config(&args).unwrap();
        assert_eq!(config.database_path, db);
        assert_eq!(config.delimiter, ';');
        assert!(matches!(args.command, Command::NextId { entity: EntityKind::Provider }));
    }

    #[test]
    fn test_run_add_and_claim() {
        let dir = tempdir().unwrap();
        let db = Database::open(StoreConfig::testing(dir.path())).unwrap();

        let provider = [
            "Name=Acme Foods",
            "Type=Restaurant",
            "Address=1 Main St",
            "City=Springfield",
            "Contact=555-0100",
        ];
        run(&db, Command::Add {
            entity: EntityKind::Provider,
            fields: provider.iter().map(|s| s.to_string()).collect(),
        })
        .unwrap();

        let err = run(&db, Command::Add {
            entity: EntityKind::Provider,
            fields: provider.iter().map(|s| s.to_string()).collect(),
        })
        .unwrap_err();
        let store_error = err.downcast_ref::<StoreError>().unwrap();
        assert_eq!(store_error.user_message(), "Contact must be unique. This record already exists.");

        let out = dir.path().join("report.csv");
        run(&db, Command::Query {
            action: QueryAction::Export { number: 3, out: out.clone(), city: Some("Springfield".into()), report: false },
        })
        .unwrap();
        let csv = std::fs::read_to_string(out).unwrap();
        assert!(csv.starts_with("Name,Type,Address,Contact\n"));
    }
}
