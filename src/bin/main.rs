//! SUMARiS extraction CLI
//!
//! Usage:
//!   sumaris-extract formats
//!   sumaris-extract render <format> <sheet> [--dialect <dialect>] [--filter <json>] [--check]
//!   sumaris-extract run <format> --db <file.sqlite> [--filter <json>] [--sheet <sheet>] [--keep]
//!   sumaris-extract save <format> --db <file.sqlite> --label <label> [--filter <json>]
//!
//! Examples:
//!   sumaris-extract render program ST --dialect oracle --check
//!   sumaris-extract run vessel --db sumaris.db --filter '{"criteria":[{"name":"VESSEL_ID","operator":"IN","values":["1","2"]}]}'
//!   sumaris-extract save program --db sumaris.db --label SIH_2021

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use sumaris_extraction::config::{LogFormat, LoggingSettings, Settings};
use sumaris_extraction::database::SqliteDatabase;
use sumaris_extraction::extraction::{
    DaoRuntime, DomainFilter, ExtractionFormat, ExtractionService, Filter, TableNamingStrategy,
    TemplateRepository,
};
use sumaris_extraction::reader::{Page, TableRows};
use sumaris_extraction::sql::{validate_sql, Dialect};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sumaris-extract")]
#[command(about = "SUMARiS extraction engine - materialize, read and save data extractions")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $SUMARIS_CONFIG, ./sumaris.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List extraction formats and their sheets
    Formats,

    /// Print the SQL of one sheet, with placeholder table names
    Render {
        /// Extraction format (program, strat, vessel)
        format: String,

        /// Sheet name (PR, ST, SM, VE, VF, VR)
        sheet: String,

        /// SQL dialect to generate
        #[arg(short, long, default_value = "postgres")]
        dialect: DialectArg,

        /// Filter as JSON
        #[arg(short, long)]
        filter: Option<String>,

        /// Syntax-check the rendered SQL
        #[arg(long)]
        check: bool,
    },

    /// Run an extraction against a SQLite database and print its sheets
    Run {
        /// Extraction format (program, strat, vessel)
        format: String,

        /// SQLite database file
        #[arg(long)]
        db: PathBuf,

        /// Filter as JSON
        #[arg(short, long)]
        filter: Option<String>,

        /// Only run up to, and print, this sheet
        #[arg(short, long)]
        sheet: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Rows per sheet (0 prints every row)
        #[arg(long, default_value_t = 100)]
        size: u64,

        /// Keep the extraction tables
        #[arg(long)]
        keep: bool,
    },

    /// Run an extraction and keep its tables as a product
    Save {
        /// Extraction format (program, strat, vessel)
        format: String,

        /// SQLite database file
        #[arg(long)]
        db: PathBuf,

        /// Product label
        #[arg(short, long)]
        label: String,

        /// Filter as JSON
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Oracle,
    Hsqldb,
    Sqlite,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Oracle => Dialect::Oracle,
            DialectArg::Hsqldb => Dialect::HsqlDb,
            DialectArg::Sqlite => Dialect::Sqlite,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings.logging);

    match cli.command {
        Commands::Formats => cmd_formats(),
        Commands::Render {
            format,
            sheet,
            dialect,
            filter,
            check,
        } => cmd_render(&format, &sheet, dialect.into(), filter.as_deref(), check),
        Commands::Run {
            format,
            db,
            filter,
            sheet,
            offset,
            size,
            keep,
        } => cmd_run(
            settings,
            &format,
            db,
            filter.as_deref(),
            sheet,
            Page::new(offset, size),
            keep,
        ),
        Commands::Save {
            format,
            db,
            label,
            filter,
        } => cmd_save(settings, &format, db, &label, filter.as_deref()),
    }
}

fn init_tracing(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

fn cmd_formats() -> ExitCode {
    for format in ExtractionFormat::all() {
        println!("{} (v{})", format, format.version());
        for sheet in format.sheets() {
            match sheet.depends_on {
                Some(upstream) => println!("  {} <- {}", sheet.name, upstream),
                None => println!("  {}", sheet.name),
            }
        }
    }
    ExitCode::SUCCESS
}

fn cmd_render(
    format: &str,
    sheet: &str,
    dialect: Dialect,
    filter: Option<&str>,
    check: bool,
) -> ExitCode {
    let format = match parse_format(format) {
        Some(format) => format,
        None => return ExitCode::FAILURE,
    };
    let Some(sheet_spec) = format.sheet(sheet) else {
        eprintln!("Unknown sheet '{}' for {}", sheet, format);
        return ExitCode::FAILURE;
    };
    let filter = match parse_filter(filter) {
        Some(filter) => filter,
        None => return ExitCode::FAILURE,
    };
    let domain = match DomainFilter::translate(format, &filter) {
        Ok(domain) => domain,
        Err(e) => {
            eprintln!("Invalid filter: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Rendering never touches the database.
    let db = match SqliteDatabase::open_in_memory() {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let runtime = DaoRuntime::new(
        db.clone(),
        db,
        Arc::new(TemplateRepository::builtin(dialect)),
        TableNamingStrategy::default(),
    );
    let context = runtime.create_context(format, &filter);

    let sql = runtime.render_step(&context, sheet_spec).and_then(|mut query| {
        domain.apply(&mut query);
        Ok(query.to_sql()?)
    });

    match sql {
        Ok(sql) => {
            println!("{}", sql);
            if check {
                if let Err(e) = validate_sql(&sql, dialect) {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
                eprintln!("SQL is valid");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Render error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(
    settings: Settings,
    format: &str,
    db: PathBuf,
    filter: Option<&str>,
    sheet: Option<String>,
    page: Page,
    keep: bool,
) -> ExitCode {
    let Some(format) = parse_format(format) else {
        return ExitCode::FAILURE;
    };
    let Some(mut filter) = parse_filter(filter) else {
        return ExitCode::FAILURE;
    };
    if let Some(sheet) = &sheet {
        filter = filter.sheet(sheet.as_str()).preview(true);
    }
    let Some(service) = open_service(settings, &db) else {
        return ExitCode::FAILURE;
    };

    let context = match service.execute(format, &filter) {
        Ok(context) => context,
        Err(e) if e.is_no_data() => {
            eprintln!("{}", e);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Extraction error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut status = ExitCode::SUCCESS;
    for table in context.sheets() {
        if sheet
            .as_deref()
            .is_some_and(|s| !s.eq_ignore_ascii_case(&table.sheet_name))
        {
            continue;
        }
        match service.read_sheet(&context, &table.sheet_name, &page) {
            Ok(rows) => print_sheet(&table.sheet_name, &rows),
            Err(e) => {
                eprintln!("Error reading sheet {}: {}", table.sheet_name, e);
                status = ExitCode::FAILURE;
            }
        }
    }

    if keep {
        eprintln!("Kept tables: {}", context.table_names().join(", "));
    } else {
        service.clean(&context);
    }
    status
}

fn cmd_save(
    settings: Settings,
    format: &str,
    db: PathBuf,
    label: &str,
    filter: Option<&str>,
) -> ExitCode {
    let Some(format) = parse_format(format) else {
        return ExitCode::FAILURE;
    };
    let Some(filter) = parse_filter(filter) else {
        return ExitCode::FAILURE;
    };
    let Some(service) = open_service(settings, &db) else {
        return ExitCode::FAILURE;
    };

    match service.save_product(format, &filter, label) {
        Ok(product) => {
            for table in &product.tables {
                println!("{}\t{}", table.sheet_name, table.table_name);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Save error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_service(mut settings: Settings, db: &Path) -> Option<ExtractionService> {
    // The bundled backend is SQLite, whatever the configured dialect.
    settings.database.dialect = "sqlite".to_string();

    let mut database = match SqliteDatabase::open(db) {
        Ok(database) => database,
        Err(e) => {
            eprintln!("Error opening '{}': {}", db.display(), e);
            return None;
        }
    };
    if let Some(timeout) = settings.database.query_timeout() {
        database = database.with_timeout(timeout);
    }
    let database = Arc::new(database);

    match ExtractionService::new(&settings, database.clone(), database) {
        Ok(service) => Some(service),
        Err(e) => {
            eprintln!("Invalid settings: {}", e);
            None
        }
    }
}

fn parse_format(format: &str) -> Option<ExtractionFormat> {
    match format.parse() {
        Ok(format) => Some(format),
        Err(e) => {
            eprintln!("{}", e);
            None
        }
    }
}

fn parse_filter(filter: Option<&str>) -> Option<Filter> {
    match filter {
        None => Some(Filter::default()),
        Some(json) => match serde_json::from_str(json) {
            Ok(filter) => Some(filter),
            Err(e) => {
                eprintln!("Invalid filter JSON: {}", e);
                None
            }
        },
    }
}

fn print_sheet(sheet: &str, rows: &TableRows) {
    println!("# {} ({} rows)", sheet, rows.total);
    println!("{}", rows.column_names().join("\t"));
    for row in &rows.rows {
        let cells: Vec<&str> = row.iter().map(|v| v.as_deref().unwrap_or("")).collect();
        println!("{}", cells.join("\t"));
    }
    println!();
}
