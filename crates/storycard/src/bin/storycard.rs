use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use storycard::{CardConfig, CardEngine, Command, InvocationContext, Notice, SelectedRows};
use storycard_workbook::{CsvAdapter, JsonAdapter, SaveDestination};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storycard", version, about = "Turn backlog rows into printable story cards")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Create one card per backlog row.
    Create(WorkbookArgs),
    /// Create cards for the selected backlog rows only.
    CreateSelected(SelectionArgs),
}

#[derive(Args, Debug)]
struct WorkbookArgs {
    /// JSON workbook to read.
    #[arg(long)]
    workbook: PathBuf,

    /// YAML card configuration; stock layout when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replace the backlog sheet's contents with this CSV file first.
    #[arg(long = "backlog-csv")]
    backlog_csv: Option<PathBuf>,

    /// Where to write the result; defaults to the input workbook.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SelectionArgs {
    #[command(flatten)]
    workbook: WorkbookArgs,

    /// Sheet the user has active; the backlog sheet when omitted.
    #[arg(long = "active-sheet")]
    active_sheet: Option<String>,

    /// Selected rows as `<start>:<end>` or `<start>`.
    #[arg(long, value_parser = parse_rows)]
    rows: Option<SelectedRows>,
}

fn parse_rows(s: &str) -> Result<SelectedRows, String> {
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid row `{part}`: {e}"))
    };
    let (start, end) = match s.split_once(':') {
        Some((start, end)) => (parse(start)?, parse(end)?),
        None => {
            let row = parse(s)?;
            (row, row)
        }
    };
    if start == 0 || end < start {
        return Err(format!("invalid row range `{s}`"));
    }
    Ok(SelectedRows {
        start_row: start,
        row_count: end - start + 1,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<CardConfig> {
    let Some(path) = path else {
        return Ok(CardConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    CardConfig::from_yaml_reader(file).with_context(|| format!("parsing {}", path.display()))
}

fn run(args: &WorkbookArgs, command: Command, selection: Option<&SelectionArgs>) -> Result<Notice> {
    let config = load_config(args.config.as_ref())?;
    let engine = CardEngine::new(config).context("invalid card configuration")?;
    let context = match selection {
        Some(sel) => InvocationContext {
            active_sheet: Some(
                sel.active_sheet
                    .clone()
                    .unwrap_or_else(|| engine.config().backlog_sheet.clone()),
            ),
            selection: sel.rows,
        },
        None => InvocationContext::default(),
    };

    let mut workbook = JsonAdapter::open_path(&args.workbook)
        .and_then(|adapter| adapter.workbook())
        .with_context(|| format!("loading {}", args.workbook.display()))?;

    if let Some(csv) = &args.backlog_csv {
        let backlog = &engine.config().backlog_sheet;
        CsvAdapter::open_path(csv)
            .and_then(|adapter| adapter.load_into(&mut workbook, backlog))
            .with_context(|| format!("importing {}", csv.display()))?;
    }

    let notice = engine.invoke(&mut workbook, command, &context)?;

    let output = args.output.as_ref().unwrap_or(&args.workbook);
    JsonAdapter::from_workbook(&workbook)
        .save_to(SaveDestination::Path(output))
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(notice)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let notice = match &cli.command {
        CliCommand::Create(args) => run(args, Command::CreateFromBacklog, None)?,
        CliCommand::CreateSelected(sel) => {
            run(&sel.workbook, Command::CreateFromSelection, Some(sel))?
        }
    };
    println!("{notice}");
    Ok(())
}
