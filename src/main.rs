use std::fs::File;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use intersection_reservation::domain::simulator::admission::TickReport;
use intersection_reservation::domain::utils::id::Vin;
use intersection_reservation::{generate_scenario, logger};

#[derive(Parser)]
#[command(name = "intersection_reservation")]
#[command(about = "Batch admission of vehicles into a tile-reserved intersection")]
struct Cli {
    /// Scenario JSON file
    #[arg(long)]
    scenario: String,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "200")]
    ticks: u32,

    /// Time delta per tick in seconds, defaults to the scenario's timeStep
    #[arg(long)]
    delta: Option<f64>,

    /// Write the reservation history as CSV to this file
    #[arg(long)]
    stats: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init();

    let mut simulator = generate_scenario(&cli.scenario).with_context(|| format!("failed to load scenario '{}'", cli.scenario))?;

    let delta = cli.delta.unwrap_or_else(|| simulator.time_step());
    anyhow::ensure!(delta > 0.0 && delta.is_finite(), "tick delta must be positive, got {}", delta);

    println!("Running {} ticks of {}s, {} proposals pending.", cli.ticks, delta, simulator.queue().len());

    let mut totals = TickReport::default();
    for _ in 0..cli.ticks {
        let report = simulator.tick(delta);
        if !report.is_quiet() {
            print_report(&report);
        }

        totals.confirmed.extend(report.confirmed);
        totals.rejected.extend(report.rejected);
        totals.expired.extend(report.expired);
    }

    println!();
    println!("{}", "Summary".bold());
    println!("  confirmed: {}", totals.confirmed.len().to_string().green());
    println!("  rejections: {}", totals.rejected.len().to_string().yellow());
    println!("  expired: {}", totals.expired.len().to_string().red());
    println!("  still pending: {}", simulator.queue().len());
    println!("  reserved cells: {}", simulator.manager().grid().reservation_count());

    if let Some(path) = &cli.stats {
        let file = File::create(path).with_context(|| format!("failed to create '{}'", path))?;
        simulator.manager().stat_collector().write_csv(file)?;
        println!("  history written to {}", path);
    }

    Ok(())
}

fn print_report(report: &TickReport) {
    let vins = |list: &[Vin]| list.iter().map(|vin| vin.to_string()).collect::<Vec<_>>().join(", ");

    println!(
        "[{:>7.2}] {} [{}]  {} [{}]  {} [{}]",
        report.time,
        "confirmed".green(),
        vins(&report.confirmed),
        "rejected".yellow(),
        vins(&report.rejected),
        "expired".red(),
        vins(&report.expired)
    );
}
