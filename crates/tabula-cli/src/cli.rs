use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tabula_frame::{expr, Column, NullPolicy, Selector, Table};
use tabula_io::{glimpse, print, read_path, CsvOptions, GlimpseOptions, PrintOptions};

use crate::logger;

#[derive(Debug, Parser)]
#[command(name = "tabula", about = "Load, inspect and reshape delimited tables.")]
pub struct Args {
    /// Log more (repeatable: -v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One line per column: kind and leading values.
    Glimpse {
        #[command(flatten)]
        input: InputArgs,

        /// Line width.
        #[arg(long, default_value_t = GlimpseOptions::default().width)]
        width: usize,
    },
    /// Print the table.
    Print {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print a column selection.
    ///
    /// Terms are column names, `starts_with:P`, `ends_with:S`, `contains:C`, `matches:REGEX`
    /// or `FROM..TO`; a leading `-` drops the matching columns instead.
    Select {
        #[command(flatten)]
        input: InputArgs,

        #[arg(allow_hyphen_values = true, value_name = "TERM")]
        terms: Vec<String>,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Row counts per combination of the given columns.
    Count {
        #[command(flatten)]
        input: InputArgs,

        #[arg(value_name = "COLUMN")]
        columns: Vec<String>,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// First row of each distinct combination of the given columns (all when none given).
    Distinct {
        #[command(flatten)]
        input: InputArgs,

        #[arg(value_name = "COLUMN")]
        columns: Vec<String>,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Build a small in-memory table and run a select / group / summarize pipeline on it.
    Demo,
}

#[derive(Debug, clap::Args)]
struct InputArgs {
    /// Delimited file (`.tsv`, `.tab` and `.txt` default to tab-separated).
    path: PathBuf,

    /// Field delimiter: one ASCII character, or `tab`.
    #[arg(short, long)]
    delimiter: Option<String>,

    /// The first record is data; columns are named Column1, Column2, ...
    #[arg(long)]
    no_header: bool,

    /// Field text read as null (repeatable; replaces the default "" and "NA").
    #[arg(long = "null", value_name = "TOKEN")]
    null_tokens: Vec<String>,

    /// Infer column kinds from the first N rows only.
    #[arg(long, value_name = "N")]
    sample_rows: Option<usize>,
}

impl InputArgs {
    fn options(&self) -> Result<CsvOptions> {
        let mut options = CsvOptions::for_path(&self.path);
        if let Some(delimiter) = self.delimiter.as_deref() {
            options.delimiter = parse_delimiter(delimiter)?;
        }
        options.has_header = !self.no_header;
        if !self.null_tokens.is_empty() {
            options.null_tokens = self.null_tokens.clone();
        }
        options.sample_rows = self.sample_rows;
        Ok(options)
    }

    fn load(&self) -> Result<Table> {
        let options = self.options()?;
        let table = read_path(&self.path, &options)
            .with_context(|| format!("read {}", self.path.display()))?;
        log::info!(
            "loaded {} ({} rows x {} columns)",
            self.path.display(),
            table.nrow(),
            table.ncol()
        );
        Ok(table)
    }
}

#[derive(Debug, clap::Args)]
struct ViewArgs {
    /// Rows to print before summarizing the rest.
    #[arg(long, default_value_t = PrintOptions::default().max_rows)]
    rows: usize,
}

impl ViewArgs {
    fn options(&self) -> PrintOptions {
        PrintOptions {
            max_rows: self.rows,
            ..PrintOptions::default()
        }
    }
}

fn parse_delimiter(text: &str) -> Result<u8> {
    match text {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match text.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => bail!("invalid --delimiter '{text}' (expected one ASCII character or `tab`)"),
        },
    }
}

/// Parse one `select` term.
pub fn parse_selector(term: &str) -> Result<Selector> {
    let (negated, body) = match term.strip_prefix('-') {
        Some(rest) if !rest.is_empty() => (true, rest),
        _ => (false, term),
    };
    let selector = if let Some(prefix) = body.strip_prefix("starts_with:") {
        Selector::starts_with(prefix)
    } else if let Some(suffix) = body.strip_prefix("ends_with:") {
        Selector::ends_with(suffix)
    } else if let Some(needle) = body.strip_prefix("contains:") {
        Selector::contains(needle)
    } else if let Some(pattern) = body.strip_prefix("matches:") {
        Selector::matches(pattern).with_context(|| format!("selector '{term}'"))?
    } else if let Some((from, to)) = body.split_once("..") {
        Selector::range(from, to)
    } else {
        Selector::name(body)
    };
    Ok(if negated { -selector } else { selector })
}

/// The people table the `demo` pipeline starts from.
pub fn demo_table() -> Result<Table> {
    Ok(Table::new(vec![
        Column::strings("first_name", [Some("Max"), Some("Franz"), Some("Horst")]),
        Column::strings("last_name", [Some("Doe"), Some("Smith"), Some("Keanes")]),
        Column::ints("age", [Some(23i64), Some(23), Some(12)]),
        Column::ints("weight", [Some(55i64), Some(88), Some(82)]),
    ])?)
}

fn demo(out: &mut impl Write) -> Result<()> {
    let options = PrintOptions::default();
    let people = demo_table()?;
    out.write_all(print(&people, &options).as_bytes())?;

    let names = people.select(&[-Selector::name("weight"), -Selector::name("age")])?;
    writeln!(out)?;
    out.write_all(print(&names, &options).as_bytes())?;

    let by_age = people
        .group_by(&["age"])?
        .summarize("mean_weight", |ctx| {
            Ok(ctx.col("weight")?.mean(NullPolicy::Exclude)?.into())
        })?;
    writeln!(out)?;
    out.write_all(print(&by_age, &options).as_bytes())?;

    let heavy = people
        .mutate_many(&[expr("kg_per_year", |ctx| {
            Ok(ctx.col("weight")?.div(ctx.col("age")?)?.into())
        })])?
        .filter(|ctx| Ok(ctx.col("kg_per_year")?.gt(3.0)))?;
    writeln!(out)?;
    out.write_all(print(&heavy, &options).as_bytes())?;
    Ok(())
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    logger::init(logger::level_for(args.verbose, args.quiet));
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    run_with_args(args, &mut handle)
}

/// Execute a parsed command line, writing tables to `out`.
pub fn run_with_args(args: Args, out: &mut impl Write) -> Result<()> {
    match args.command {
        Command::Glimpse { input, width } => {
            let table = input.load()?;
            out.write_all(glimpse(&table, &GlimpseOptions { width }).as_bytes())?;
        }
        Command::Print { input, view } => {
            let table = input.load()?;
            out.write_all(print(&table, &view.options()).as_bytes())?;
        }
        Command::Select { input, terms, view } => {
            let selectors = terms
                .iter()
                .map(|t| parse_selector(t))
                .collect::<Result<Vec<_>>>()?;
            let table = input.load()?.select(&selectors)?;
            out.write_all(print(&table, &view.options()).as_bytes())?;
        }
        Command::Count {
            input,
            columns,
            view,
        } => {
            let table = input.load()?.count(&columns)?;
            out.write_all(print(&table, &view.options()).as_bytes())?;
        }
        Command::Distinct {
            input,
            columns,
            view,
        } => {
            let table = input.load()?.distinct(&columns)?;
            out.write_all(print(&table, &view.options()).as_bytes())?;
        }
        Command::Demo => demo(out)?,
    }
    out.flush()?;
    Ok(())
}
