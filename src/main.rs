use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use taxdash::config::DashboardConfig;
use taxdash::dashboard;
use taxdash::filter::{self, DimensionFilter, Selection};
use taxdash::notify::LogNotifier;

#[derive(Parser, Debug)]
#[command(name = "taxdash")]
#[command(about = "Aggregate a tax recovery spreadsheet and render its dashboard charts", long_about = None)]
struct Args {
    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Spreadsheet path or URL (overrides the config file)
    #[arg(long)]
    spreadsheet: Option<String>,

    /// Base year selection: "all" or a single year such as 2021
    #[arg(long, default_value = "all")]
    year: String,

    /// Tax type selection: "all" or a single name such as COFINS
    #[arg(long, default_value = "all")]
    tax: String,

    /// Directory the rendered charts are written to
    #[arg(long, default_value = "charts")]
    out: PathBuf,

    /// Print the available filter values and exit
    #[arg(long)]
    list_filters: bool,

    /// Compute metrics and figures without writing chart files
    #[arg(long)]
    no_render: bool,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => match &args.spreadsheet {
            Some(handle) => DashboardConfig::for_spreadsheet(handle),
            None => bail!("Either --config or --spreadsheet is required"),
        },
    };
    if let Some(handle) = &args.spreadsheet {
        config.spreadsheet = handle.clone();
    }

    if args.list_filters {
        let frame = dashboard::load_spreadsheet(&config)?;
        for column in [&config.schema.year, &config.schema.tax] {
            println!("{}:", column);
            for value in filter::distinct_values(&frame, column) {
                println!("  {}", value);
            }
        }
        return Ok(());
    }

    let filters = vec![
        DimensionFilter::new(&config.schema.year, selection(&args.year)),
        DimensionFilter::new(&config.schema.tax, selection(&args.tax)),
    ];

    let out_dir = if args.no_render {
        None
    } else {
        Some(args.out.as_path())
    };
    let notifier = LogNotifier;
    let summary = dashboard::run(&config, &filters, out_dir, &notifier)?;

    match &config.company {
        Some(company) => println!("Dashboard de Recuperação Tributária - {}", company),
        None => println!("Dashboard de Recuperação Tributária"),
    }
    let table = dashboard::format_table(&summary.frame, &config.schema);
    if !table.is_empty() {
        println!("{}", table);
        println!();
    }
    for aggregate in &summary.aggregates {
        println!(
            "{}: {}",
            aggregate.label,
            dashboard::format_brl(aggregate.value)
        );
    }
    println!(
        "Panels built: {}, skipped: {}",
        summary.built.len(),
        summary.skipped.len()
    );
    for path in &summary.written {
        println!("Wrote {}", path.display());
    }
    if !summary.schema_ok {
        eprintln!("Warning: the spreadsheet does not match the expected columns");
    }

    Ok(())
}

/// "all" (or the sheet's own "Todos") selects everything; any other
/// value narrows the dimension to rows matching it.
fn selection(arg: &str) -> Selection {
    if arg.eq_ignore_ascii_case("all") || arg.eq_ignore_ascii_case("todos") {
        Selection::All
    } else {
        Selection::Only(arg.to_string())
    }
}
