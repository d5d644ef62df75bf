use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use convsolve_core::ploss::PulsedLoss;
use convsolve_core::resistor::closest_resistance;
use convsolve_core::units::{DutyCycle, Inductance, Resistance};
use convsolve_core::{
    Assignment, CcmModel, ConverterParams, DcmDutyModel, DcmModel, Quantities, Quantity, SolveOutcome, Solver,
    SolverConfig, TopoMode,
};
use convsolve_dsl::solve_text_with;
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Battery-monitor divider: two thresholds around a comparator reference.
const DIVIDER: [&str; 2] = [
    "VBATT_L = VREF/(R10 + R11)*(R10 + R11 + R9)",
    "VBATT_H = VREF/R11*(R10 + R11 + R9)",
];

#[derive(Parser, Debug)]
#[command(name = "convsolve", version, about = "Equation solver and buck-boost converter calculator")]
struct Cli {
    /// Log more: -v for info, -vv for debug. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Time budget for each solve, in milliseconds
    #[arg(long, default_value_t = 2000, global = true)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Operating point and conduction losses of a buck-boost stage
    Design(DesignArgs),
    /// Resistor divider for two battery thresholds, snapped to standard values
    Divider(DividerArgs),
    /// Solve equations given on the command line
    Solve(SolveArgs),
}

#[derive(Args, Debug)]
struct DesignArgs {
    /// Switching frequency, Hz
    #[arg(long, default_value_t = 250e3)]
    fsw: f64,
    #[arg(long, default_value_t = 11.0)]
    vin: f64,
    #[arg(long, default_value_t = 20.0)]
    vout: f64,
    #[arg(long, default_value_t = 5.0)]
    iout: f64,
    /// Inductance, µH
    #[arg(long = "inductance-uh", default_value_t = 10.0)]
    inductance_uh: f64,
    /// Inductor DC resistance, Ω
    #[arg(long, default_value_t = 0.014)]
    dcr: f64,
    /// Switch on-resistance, Ω
    #[arg(long, default_value_t = 0.015)]
    rds_on: f64,
    /// Also size the inductance for DCM at this duty cycle
    #[arg(long)]
    duty: Option<f64>,
}

#[derive(Args, Debug)]
struct DividerArgs {
    #[arg(long, default_value_t = 2.7)]
    vbatt_h: f64,
    #[arg(long, default_value_t = 2.2)]
    vbatt_l: f64,
    #[arg(long, default_value_t = 300e3)]
    r11: f64,
    #[arg(long, default_value_t = 1.205)]
    vref: f64,
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Equation such as "vin*ton = vout*toff"; repeat for a system
    #[arg(long = "eq", required = true)]
    equations: Vec<String>,
    /// Known quantity as name=value
    #[arg(long, value_parser = parse_known)]
    known: Vec<(String, f64)>,
    /// Quantity to solve for
    #[arg(long)]
    unknown: Vec<String>,
    /// Prefer roots where every unknown is positive
    #[arg(long)]
    positive: bool,
}

fn parse_known(arg: &str) -> Result<(String, f64), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{arg}`"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for `{}`: {e}", name.trim()))?;
    Ok((name.trim().to_string(), value))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let solver = Solver::new(SolverConfig {
        timeout: Duration::from_millis(cli.timeout_ms),
        ..SolverConfig::default()
    });
    match &cli.command {
        Command::Design(args) => design(args, &solver),
        Command::Divider(args) => divider(args, &solver),
        Command::Solve(args) => solve(args, &solver),
    }
}

fn design(args: &DesignArgs, solver: &Solver) -> Result<()> {
    let params = ConverterParams::new(args.fsw, args.vin, args.vout, args.iout).into_diagnostic()?;
    let inductance = Inductance::from_micro(args.inductance_uh).into_diagnostic()?;

    let ccm = CcmModel::new(params, inductance)
        .with_solver(solver.clone())
        .calculate()
        .into_diagnostic()
        .wrap_err("CCM analysis failed")?;
    println!("== CCM, L = {} uH ==\n{ccm}", args.inductance_uh);

    let period = params.period();
    let ton = ccm.duty * period;
    let copper = PulsedLoss::new(
        ccm.peak_current,
        ccm.valley_current(),
        ton,
        period - ton,
        period,
        Resistance::new(args.dcr).into_diagnostic()?,
    )
    .into_diagnostic()?;
    let switch = PulsedLoss::new(
        ccm.peak_current,
        ccm.valley_current(),
        ton,
        0.0,
        period,
        Resistance::new(args.rds_on).into_diagnostic()?,
    )
    .into_diagnostic()?;
    println!("inductor copper loss: {copper}");
    println!("switch conduction loss: {switch}");

    if ccm.mode == TopoMode::Dcm {
        info!("ripple reaches the peak current, running the DCM model");
        let dcm = DcmModel::new(params, inductance)
            .with_solver(solver.clone())
            .calculate()
            .into_diagnostic()
            .wrap_err("DCM analysis failed")?;
        println!("\n== DCM, L = {} uH ==\n{dcm}", args.inductance_uh);
    }

    if let Some(duty) = args.duty {
        let duty = DutyCycle::new(duty).into_diagnostic()?;
        let point = DcmDutyModel::new(params, duty)
            .with_solver(solver.clone())
            .calculate()
            .into_diagnostic()
            .wrap_err("DCM sizing failed")?;
        println!("\n== DCM at fixed duty ==\n{point}");
    }
    Ok(())
}

fn divider(args: &DividerArgs, solver: &Solver) -> Result<()> {
    let quantities = Quantities::new()
        .known("VBATT_H", args.vbatt_h)
        .known("VBATT_L", args.vbatt_l)
        .known("R11", args.r11)
        .known("VREF", args.vref)
        .unknown("R9")
        .unknown("R10");
    let positive = |a: &Assignment| a.iter().all(|(_, v)| v > 0.0);
    let solution = solve_text_with(solver, DIVIDER.as_slice(), &quantities, Some(&positive))?
        .solution()
        .ok_or_else(|| miette!("divider has nothing to solve"))?;
    let r9 = solution.get("R9").ok_or_else(|| miette!("no value for R9"))?;
    let r10 = solution.get("R10").ok_or_else(|| miette!("no value for R10"))?;
    if !solution.is_plausible() {
        println!("warning: thresholds need a negative resistor ({solution})");
    }
    println!("R9 = {r9:.0} Ω, R10 = {r10:.0} Ω, R11 = {:.0} Ω", args.r11);
    println!("divider current: {:.3} uA", args.vbatt_h / (r9 + r10 + args.r11) * 1e6);

    let (r9, r10, r11) = (closest_resistance(r9), closest_resistance(r10), closest_resistance(args.r11));
    println!("standard values: R9 = {r9} Ω, R10 = {r10} Ω, R11 = {r11} Ω");

    let snapped = Quantities::new()
        .known("R9", r9)
        .known("R10", r10)
        .known("R11", r11)
        .known("VREF", args.vref)
        .unknown("VBATT_H")
        .unknown("VBATT_L");
    let check = solve_text_with(solver, DIVIDER.as_slice(), &snapped, None)?
        .solution()
        .ok_or_else(|| miette!("threshold check has nothing to solve"))?;
    let high = check.get("VBATT_H").ok_or_else(|| miette!("no value for VBATT_H"))?;
    let low = check.get("VBATT_L").ok_or_else(|| miette!("no value for VBATT_L"))?;
    println!("thresholds with standard values: VBATT_H = {high:.4} V, VBATT_L = {low:.4} V");
    Ok(())
}

fn solve(args: &SolveArgs, solver: &Solver) -> Result<()> {
    let mut quantities = Quantities::new();
    for (name, value) in &args.known {
        quantities.set(name.clone(), Quantity::Known(*value));
    }
    for name in &args.unknown {
        quantities.set(name.clone(), Quantity::Unknown);
    }

    let positive = |a: &Assignment| a.iter().all(|(_, v)| v > 0.0);
    let plausible: Option<&dyn Fn(&Assignment) -> bool> = match args.positive {
        true => Some(&positive),
        false => None,
    };
    match solve_text_with(solver, args.equations.as_slice(), &quantities, plausible)? {
        SolveOutcome::Solved(solution) => {
            for (name, value) in solution.values().iter() {
                println!("{name} = {value}");
            }
            if !solution.is_plausible() {
                println!("warning: no root has every unknown positive");
            }
            if solution.candidates().len() > 1 {
                println!("other roots:");
                for candidate in solution.candidates().iter().filter(|c| *c != solution.values()) {
                    println!("  {candidate}");
                }
            }
        }
        SolveOutcome::NothingToSolve => println!("nothing to solve: every quantity is known"),
    }
    Ok(())
}
