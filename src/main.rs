//! Traffic simulator entry point: CLI parsing, scenario loading and output.

use std::path::Path;
use std::process;

use urban_traffic_sim::config::ScenarioConfig;
use urban_traffic_sim::io::export::{export_ticks_csv, export_vehicles_csv};
use urban_traffic_sim::runner::{RunOutput, compare_signal_modes, run_scenario};
use urban_traffic_sim::sim::signal::SignalMode;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    signal_mode: Option<SignalMode>,
    telemetry_out: Option<String>,
    vehicles_out: Option<String>,
    compare: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
    #[cfg(feature = "tui")]
    tui: bool,
}

fn print_help() {
    eprintln!("urban-traffic-sim: grid traffic simulator with adaptive signal control");
    eprintln!();
    eprintln!("Usage: urban-traffic-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>          Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>            Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>               Override random seed");
    eprintln!("  --signal-mode <mode>       Override signal control (fixed, adaptive)");
    eprintln!("  --telemetry-out <path>     Export per-tick records to CSV");
    eprintln!("  --vehicles-out <path>      Export per-vehicle summaries to CSV");
    eprintln!("  --compare                  Run fixed and adaptive control on the same demand");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                    Start REST API server after simulation");
        eprintln!("  --port <u16>               API server port (default: 3000)");
    }
    #[cfg(feature = "tui")]
    eprintln!("  --tui                      Step the simulation live in the terminal");
    eprintln!("  --help                     Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following flag `args[*i]`, exiting when it is missing.
fn flag_value<'a>(args: &'a [String], i: &mut usize, what: &str) -> &'a str {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i) {
        Some(v) => v,
        None => {
            eprintln!("error: {flag} requires {what}");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        signal_mode: None,
        telemetry_out: None,
        vehicles_out: None,
        compare: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
        #[cfg(feature = "tui")]
        tui: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path = Some(flag_value(&args, &mut i, "a path argument").to_string());
            }
            "--preset" => {
                cli.preset = Some(flag_value(&args, &mut i, "a name argument").to_string());
            }
            "--seed" => {
                let raw = flag_value(&args, &mut i, "a u64 argument");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--signal-mode" => {
                cli.signal_mode = match flag_value(&args, &mut i, "fixed or adaptive") {
                    "fixed" => Some(SignalMode::Fixed),
                    "adaptive" => Some(SignalMode::Adaptive),
                    other => {
                        eprintln!("error: --signal-mode value \"{other}\" must be fixed or adaptive");
                        process::exit(1);
                    }
                };
            }
            "--telemetry-out" => {
                cli.telemetry_out = Some(flag_value(&args, &mut i, "a path argument").to_string());
            }
            "--vehicles-out" => {
                cli.vehicles_out = Some(flag_value(&args, &mut i, "a path argument").to_string());
            }
            "--compare" => cli.compare = true,
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                let raw = flag_value(&args, &mut i, "a u16 argument");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
            #[cfg(feature = "tui")]
            "--tui" => cli.tui = true,
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Resolves `--scenario`, then `--preset`, then the baseline default, and
/// applies the command-line overrides.
fn load_scenario(cli: &CliArgs) -> ScenarioConfig {
    let loaded = if let Some(ref path) = cli.scenario_path {
        ScenarioConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(mode) = cli.signal_mode {
        scenario.signals.mode = mode;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    scenario
}

fn write_exports(cli: &CliArgs, out: &RunOutput) {
    if let Some(ref path) = cli.telemetry_out {
        let grid_size = out.config.network.grid_size;
        if let Err(e) = export_ticks_csv(&out.records, grid_size, Path::new(path)) {
            eprintln!("error: failed to write telemetry CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
    if let Some(ref path) = cli.vehicles_out {
        if let Err(e) = export_vehicles_csv(&out.vehicles, Path::new(path)) {
            eprintln!("error: failed to write vehicle CSV: {e}");
            process::exit(1);
        }
        eprintln!("Vehicle summaries written to {path}");
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = parse_args();
    let scenario = load_scenario(&cli);

    #[cfg(feature = "tui")]
    if cli.tui {
        let label = cli
            .preset
            .clone()
            .or_else(|| cli.scenario_path.clone())
            .unwrap_or_else(|| "baseline".to_string());
        urban_traffic_sim::tui::run(scenario, &label);
        return;
    }

    if cli.compare {
        match compare_signal_modes(&scenario) {
            Ok(cmp) => println!("{cmp}"),
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let out = run_scenario(&scenario).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    println!("{}", out.report);
    write_exports(&cli, &out);

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        use urban_traffic_sim::api::{AppState, serve};

        let state = Arc::new(AppState::from(out));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
