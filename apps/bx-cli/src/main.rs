use bx_box::VertexFields;
use bx_sim::{Scenario, SimError, SimResult};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bx-cli")]
#[command(about = "Two-phase two-component column simulations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a scenario file without running it
    Check {
        /// Path to the scenario YAML file
        scenario: PathBuf,
    },
    /// Run a scenario and write the final vertex fields
    Run {
        /// Path to the scenario YAML file
        scenario: PathBuf,
        /// Override the end time in seconds
        #[arg(long)]
        t_end: Option<f64>,
        /// Write the fields as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print the fields as JSON to stdout
        #[arg(long)]
        json: bool,
    },
    /// Run a scenario and export one primary variable of one vertex over time
    Series {
        /// Path to the scenario YAML file
        scenario: PathBuf,
        /// Vertex index
        vertex: usize,
        /// Primary variable index (0 = pW, 1 = Sn or X, 2 = T if non-isothermal)
        #[arg(long, default_value_t = 0)]
        var: usize,
        /// Output CSV file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> SimResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { scenario } => cmd_check(&scenario),
        Commands::Run {
            scenario,
            t_end,
            csv,
            json,
        } => cmd_run(&scenario, t_end, csv.as_deref(), json),
        Commands::Series {
            scenario,
            vertex,
            var,
            output,
        } => cmd_series(&scenario, vertex, var, output.as_deref()),
    }
}

fn cmd_check(path: &Path) -> SimResult<()> {
    let scenario = Scenario::from_path(path)?;
    scenario.validate()?;
    let sim = scenario.build()?;
    println!(
        "✓ {}: {} vertices, {} primary variables, t_end = {} s",
        scenario.name,
        sim.num_vertices(),
        sim.num_primary_vars(),
        scenario.sim.t_end
    );
    Ok(())
}

fn open_output(output: Option<&Path>) -> SimResult<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

fn cmd_run(path: &Path, t_end: Option<f64>, csv: Option<&Path>, json: bool) -> SimResult<()> {
    let mut scenario = Scenario::from_path(path)?;
    if let Some(t_end) = t_end {
        scenario.sim.t_end = t_end;
    }
    let mut sim = scenario.build()?;
    let record = sim.run(&scenario.sim)?;
    eprintln!(
        "✓ {} finished at t = {} s ({} newton iterations, {} cutbacks, {} switching iterations)",
        scenario.name,
        sim.time(),
        record.newton_iterations,
        record.cutback_retries,
        record.switches
    );

    let fields = sim.fields()?;
    if let Some(path) = csv {
        let mut out = BufWriter::new(File::create(path)?);
        fields.write_csv(&mut out)?;
        out.flush()?;
        eprintln!("✓ Wrote {} vertices to {}", fields.len(), path.display());
    }
    if json {
        write_json(&fields)?;
    } else if csv.is_none() {
        fields.write_csv(io::stdout().lock())?;
    }
    Ok(())
}

fn write_json(fields: &VertexFields) -> SimResult<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, fields).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

fn cmd_series(path: &Path, vertex: usize, var: usize, output: Option<&Path>) -> SimResult<()> {
    let scenario = Scenario::from_path(path)?;
    let mut sim = scenario.build()?;
    if vertex >= sim.num_vertices() || var >= sim.num_primary_vars() {
        return Err(SimError::InvalidArg {
            what: "vertex or variable index out of range",
        });
    }
    let record = sim.run(&scenario.sim)?;

    let mut out = open_output(output)?;
    writeln!(out, "time_s,value")?;
    for (t, x) in record.t.iter().zip(&record.x) {
        writeln!(out, "{},{}", t, x[vertex][var])?;
    }
    out.flush()?;
    if let Some(path) = output {
        eprintln!("✓ Exported {} data points to {}", record.t.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(name)
    }

    fn csv_column(text: &str, name: &str) -> Vec<f64> {
        let mut lines = text.lines();
        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        let idx = header.iter().position(|h| *h == name).unwrap();
        lines
            .map(|line| line.split(',').nth(idx).unwrap().parse().unwrap())
            .collect()
    }

    #[test]
    fn run_heat_column_writes_temperatures() {
        let csv = std::env::temp_dir().join(format!("bx-cli-heat-{}.csv", std::process::id()));
        cmd_run(&scenario_path("heat_column.yaml"), Some(5.0e4), Some(&csv), false).unwrap();
        let text = std::fs::read_to_string(&csv).unwrap();
        std::fs::remove_file(&csv).unwrap();

        let t = csv_column(&text, "T");
        assert_eq!(t.len(), 6);
        assert_eq!(t[0], 300.0);
        assert!(t[1] > 280.0 && t[1] < 300.0);
        assert!(t.iter().all(|&v| (280.0 - 1e-9..=300.0).contains(&v)));
        assert!(csv_column(&text, "Sn").iter().all(|&s| s == 0.0));
    }

    #[test]
    fn check_accepts_bundled_scenarios() {
        cmd_check(&scenario_path("gas_injection.yaml")).unwrap();
        cmd_check(&scenario_path("heat_column.yaml")).unwrap();
    }

    #[test]
    fn series_rejects_temperature_of_isothermal_run() {
        let err = cmd_series(&scenario_path("gas_injection.yaml"), 0, 2, None).unwrap_err();
        assert!(matches!(err, SimError::InvalidArg { .. }));
    }
}
