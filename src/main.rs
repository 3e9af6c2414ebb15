// Entry point and high-level CLI flow.
//
// Both CSV tables are loaded once through a `CachedLoader` that lives for the
// whole run. With `--year` the dashboard is rendered once and the process
// exits; otherwise an interactive menu lets the user change the year and
// season selection and re-renders on demand.
mod error;
mod filter;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use clap::Parser;
use filter::Selection;
use loader::{CachedLoader, SourcePaths};
use reports::DashboardView;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use types::{Datasets, Season};

#[derive(Parser)]
#[command(name = "bike_dashboard", about = "Bike sharing usage dashboard")]
struct Cli {
    /// Daily table (one row per date)
    #[arg(long, default_value = "day.csv")]
    day: PathBuf,
    /// Hourly table (one row per date and hour)
    #[arg(long, default_value = "hour.csv")]
    hour: PathBuf,
    /// Render the dashboard for this year and exit
    #[arg(long)]
    year: Option<i32>,
    /// Comma-separated seasons, e.g. "spring,fall" (default: all present)
    #[arg(long)]
    seasons: Option<String>,
    /// Also write the dashboard views as CSV/JSON into this directory
    #[arg(long)]
    export: Option<PathBuf>,
}

/// Read a single line of input after printing `prompt`.
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn show(view: &DashboardView) {
    println!("{}", output::render_dashboard(view));
}

fn export(dir: &Path, view: &DashboardView) {
    match output::export_dashboard(dir, view) {
        Ok(files) => {
            for f in &files {
                log::info!("Wrote {}", f.display());
            }
            println!("Outputs saved to {}\n", dir.display());
        }
        Err(e) => {
            log::error!("Export to {} failed: {e}", dir.display());
            eprintln!("Write error: {e}\n");
        }
    }
}

/// Resolve the initial selection from the command line, falling back to the
/// first year and every season present in the data.
fn initial_selection(cli: &Cli, data: &Datasets) -> Result<Selection, error::SelectionError> {
    let year = match cli.year {
        Some(y) => filter::validate_year(&data.daily, y)?,
        None => filter::available_years(&data.daily).first().copied().unwrap_or_default(),
    };
    let seasons = match &cli.seasons {
        Some(list) => Selection::parse_seasons(list)?,
        None => filter::available_seasons(&data.daily).into_iter().collect(),
    };
    Ok(Selection::new(year, seasons))
}

fn prompt_year(data: &Datasets, selection: &mut Selection) {
    let years = filter::available_years(&data.daily);
    let listed: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    println!("Available years: {}", listed.join(", "));
    let Some(input) = read_line("Select year: ") else {
        return;
    };
    match input.parse::<i32>() {
        Ok(y) => match filter::validate_year(&data.daily, y) {
            Ok(y) => {
                selection.year = y;
                log::debug!("Year set to {y}");
            }
            Err(e) => println!("{e}\n"),
        },
        Err(_) => println!("Invalid year `{input}`.\n"),
    }
}

fn prompt_seasons(data: &Datasets, selection: &mut Selection) {
    let present: Vec<&str> = filter::available_seasons(&data.daily)
        .into_iter()
        .map(Season::label)
        .collect();
    println!("Available seasons: {}", present.join(", "));
    println!("Enter a comma-separated list, or `all`.");
    let Some(input) = read_line("Select seasons: ") else {
        return;
    };
    if input.eq_ignore_ascii_case("all") {
        selection.seasons = filter::available_seasons(&data.daily).into_iter().collect();
        return;
    }
    match Selection::parse_seasons(&input) {
        Ok(seasons) => {
            selection.seasons = seasons;
            log::debug!("Seasons set to {}", selection.seasons_label());
        }
        Err(e) => println!("{e}\n"),
    }
}

fn run_interactive(data: &Datasets, mut selection: Selection, export_dir: &Path) {
    loop {
        println!("Bike Sharing Dashboard");
        println!("[1] Select year (current: {})", selection.year);
        println!("[2] Select seasons (current: {})", selection.seasons_label());
        println!("[3] Show dashboard");
        println!("[4] Export dashboard to {}", export_dir.display());
        println!("[0] Exit\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => prompt_year(data, &mut selection),
            "2" => prompt_seasons(data, &mut selection),
            "3" => show(&DashboardView::compute(data, &selection)),
            "4" => export(export_dir, &DashboardView::compute(data, &selection)),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-4.\n"),
        }
    }
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let loader = CachedLoader::new(SourcePaths {
        daily: cli.day.clone(),
        hourly: cli.hour.clone(),
    });
    let data = match loader.get() {
        Ok(data) => data,
        Err(e) => {
            log::error!("Startup failed: {e}");
            eprintln!("Failed to load data: {e}");
            return ExitCode::from(2);
        }
    };

    let selection = match initial_selection(&cli, &data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    if cli.year.is_some() {
        let view = DashboardView::compute(&data, &selection);
        show(&view);
        if let Some(dir) = &cli.export {
            export(dir, &view);
        }
        return ExitCode::SUCCESS;
    }

    let export_dir = cli.export.clone().unwrap_or_else(|| PathBuf::from("dashboard_export"));
    run_interactive(&data, selection, &export_dir);
    ExitCode::SUCCESS
}
