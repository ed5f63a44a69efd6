//! CLI host for scanning Parquet files as one relational table.

mod error;
mod filter;
mod query;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use parquet_vtab_core::LogicalTable;
use parquet_vtab_core::table::split_module_args;
use snafu::{OptionExt, ResultExt};
use tabled::{builder::Builder, settings::Style};

use crate::{
    error::{CliResult, OpenTableSnafu, UnknownColumnSnafu, WriteOutputSnafu},
    filter::parse_filters,
    query::{OutputFormat, ScanOpts, run_scan, write_scan_result},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Table,
    Csv,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(v: OutputFormatArg) -> Self {
        match v {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Args)]
struct TableSource {
    /// Parquet files, scanned in the order given
    files: Vec<PathBuf>,

    /// Comma-separated quoted paths, e.g. "'a.parquet', 'b.parquet'"
    #[arg(long = "module-args")]
    module_args: Option<String>,

    /// Table name reported in logs and errors
    #[arg(long, default_value = "parquet")]
    name: String,
}

impl TableSource {
    fn paths(&self) -> Vec<PathBuf> {
        let extra = self
            .module_args
            .as_deref()
            .map(split_module_args)
            .unwrap_or_default();
        self.files
            .iter()
            .cloned()
            .chain(extra.into_iter().map(PathBuf::from))
            .collect()
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the derived columns and the CREATE TABLE statement
    Schema {
        #[command(flatten)]
        source: TableSource,
    },

    /// Scan the table, optionally filtered
    Scan {
        #[command(flatten)]
        source: TableSource,

        /// Repeatable `column OP value` filter; all filters must hold
        #[arg(long = "where")]
        filters: Vec<String>,

        /// Comma-separated column names (default: all data columns)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Print at most this many rows (all matching rows are still counted)
        #[arg(long)]
        max_rows: Option<usize>,

        #[arg(long, value_enum, default_value_t = OutputFormatArg::Table)]
        format: OutputFormatArg,

        /// Print scan and pruning statistics after the rows
        #[arg(long, default_value_t = false)]
        stats: bool,
    },
}

#[derive(Debug, Parser)]
#[command(name = "pqvtab", version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

fn open_table(source: &TableSource) -> CliResult<LogicalTable> {
    let paths = source.paths();
    let files = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    LogicalTable::open(source.name.as_str(), &paths).context(OpenTableSnafu { files })
}

fn cmd_schema(source: TableSource) -> CliResult<()> {
    let table = open_table(&source)?;

    let mut builder = Builder::default();
    builder.push_record(["#", "name", "type", "physical"]);
    for (i, col) in table.columns().iter().enumerate() {
        let physical = col
            .physical
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        builder.push_record([
            i.to_string(),
            col.name.clone(),
            col.sql_type.to_string(),
            physical,
        ]);
    }
    let mut rendered = builder.build();
    rendered.with(Style::rounded());

    println!("{rendered}");
    println!("{}", table.create_statement());
    println!(
        "files: {}, row_groups: {}, rows: {}",
        table.file_paths().count(),
        table.num_row_groups(),
        table.num_rows()
    );
    Ok(())
}

struct ScanArgs {
    source: TableSource,
    filters: Vec<String>,
    columns: Vec<String>,
    max_rows: Option<usize>,
    format: OutputFormatArg,
    stats: bool,
}

fn resolve_columns(table: &LogicalTable, names: &[String]) -> CliResult<Vec<usize>> {
    if names.is_empty() {
        return Ok((0..table.num_user_columns()).collect());
    }
    names
        .iter()
        .map(|name| {
            let name = name.trim();
            table
                .column_index(name)
                .context(UnknownColumnSnafu { name })
        })
        .collect()
}

fn cmd_scan(args: ScanArgs) -> CliResult<()> {
    let table = open_table(&args.source)?;
    let constraints = parse_filters(&table, &args.filters)?;
    for c in &constraints {
        debug!("constraint: {c}");
    }

    let opts = ScanOpts {
        columns: resolve_columns(&table, &args.columns)?,
        max_rows: args.max_rows,
        format: args.format.into(),
        stats: args.stats,
    };

    let res = run_scan(&table, constraints, &opts)?;
    let mut stdout = std::io::stdout().lock();
    write_scan_result(&res, &opts, &mut stdout)?;
    std::io::Write::flush(&mut stdout).context(WriteOutputSnafu)?;
    Ok(())
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Schema { source } => cmd_schema(source),

        Command::Scan {
            source,
            filters,
            columns,
            max_rows,
            format,
            stats,
        } => cmd_scan(ScanArgs {
            source,
            filters,
            columns,
            max_rows,
            format,
            stats,
        }),
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
