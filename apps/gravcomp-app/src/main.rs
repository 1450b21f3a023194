//! Gravity compensation CLI.
//!
//! Provides two modes of operation:
//! - `run`: Load a controller against in-process joints, tick it at a fixed
//!   rate and print the effort commands it produced
//! - `info`: Print the kinematic tree and mass summary of a URDF

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use gravcomp_controllers::ControllerManager;
use gravcomp_controllers::gravity_compensation::{
    DEFAULT_DESCRIPTION_PARAM, DESCRIPTION_PARAM_KEY, JOINTS_KEY, TYPE_NAME,
};
use gravcomp_controllers::manager::TYPE_KEY;
use gravcomp_core::config::resolve_key;
use gravcomp_core::prelude::*;
use gravcomp_dynamics::{DynamicsModel, ModelLoader, Skeleton, UrdfModelLoader};
use gravcomp_hardware::RobotHardware;
use gravcomp_urdf::{PackageResourceRetriever, parse_file};

type AppResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Gravity compensation for effort-controlled arms.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a controller against simulated joints and print its commands.
    Run(RunArgs),

    /// Print the structure of a URDF.
    Info {
        /// URDF file to inspect.
        #[arg(short, long)]
        urdf: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// TOML parameter file. Tables become namespaces; `[loop]` configures
    /// the tick loop.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URDF file stored under the controller's description key.
    #[arg(short, long)]
    urdf: Option<PathBuf>,

    /// Controller name, i.e. its parameter namespace.
    #[arg(long, default_value = "gravity_compensation")]
    controller: String,

    /// Controlled joints, overriding the configured list.
    #[arg(short, long, value_delimiter = ',')]
    joints: Vec<String>,

    /// Number of ticks to run.
    #[arg(short = 'n', long)]
    ticks: Option<u64>,

    /// Tick rate in Hz.
    #[arg(short, long)]
    rate: Option<f64>,

    /// Hold the tick rate against the wall clock.
    #[arg(long)]
    realtime: bool,

    /// Sensed joint position, as `name=value`. Repeatable.
    #[arg(short, long = "position", value_parser = parse_position)]
    positions: Vec<(String, f64)>,
}

fn parse_position(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid position for '{name}': {e}"))?;
    Ok((name.trim().to_owned(), value))
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_params(args: &RunArgs) -> Result<ParamStore, Box<dyn Error>> {
    let mut params = match &args.config {
        Some(path) => ParamStore::from_file(path)?,
        None => ParamStore::new(),
    };

    let ns = args.controller.as_str();
    let description_key = params
        .scope(ns)
        .get_str_or(DESCRIPTION_PARAM_KEY, DEFAULT_DESCRIPTION_PARAM)
        .to_owned();
    if let Some(path) = &args.urdf {
        let xml = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        params.set(&resolve_key(ns, &description_key), xml);
    }
    if !args.joints.is_empty() {
        let joints = args.joints.iter().cloned().map(ParamValue::String).collect();
        params.set(&resolve_key(ns, JOINTS_KEY), ParamValue::List(joints));
    }
    if !params.scope(ns).has(TYPE_KEY) {
        params.set(&resolve_key(ns, TYPE_KEY), TYPE_NAME);
    }
    Ok(params)
}

fn loop_config(args: &RunArgs, params: &ParamStore) -> Result<LoopConfig, ConfigError> {
    let mut config = LoopConfig::from_params(&params.scope("loop"))?;
    if let Some(ticks) = args.ticks {
        config.ticks = ticks;
    }
    if let Some(rate) = args.rate {
        config.rate_hz = rate;
    }
    config.realtime |= args.realtime;
    config.validate()?;
    Ok(config)
}

/// Every DOF of the described robot gets a joint with both state and effort
/// interfaces.
fn simulated_hardware(description: &str) -> Result<(RobotHardware, Skeleton), Box<dyn Error>> {
    let skeleton = UrdfModelLoader::new().load(description, &PackageResourceRetriever::from_env())?;
    let hw = RobotHardware::with_joints(&skeleton.dof_names())?;
    Ok((hw, skeleton))
}

fn run(args: &RunArgs) -> AppResult {
    let params = load_params(args)?;
    let config = loop_config(args, &params)?;
    let ns = args.controller.as_str();

    let scoped = params.scope(ns);
    let description_key = scoped.get_str_or(DESCRIPTION_PARAM_KEY, DEFAULT_DESCRIPTION_PARAM);
    let description = scoped.get_str(description_key).ok_or_else(|| {
        format!(
            "no robot description under '{}'",
            resolve_key(ns, description_key)
        )
    })?;

    let (hw, skeleton) = simulated_hardware(description)?;
    for (name, position) in &args.positions {
        hw.set_joint_state(name, *position, 0.0)?;
    }
    info!(
        robot = skeleton.name(),
        dofs = skeleton.num_dofs(),
        "simulated hardware ready"
    );

    let mut manager = ControllerManager::default();
    manager.load_controller(ns, &hw, &params)?;

    let mut clock = LoopClock::new(Duration::from_secs_f64(config.period_secs()));
    let started = Instant::now();
    manager.starting(clock.time());
    for _ in 0..config.ticks {
        let (time, period) = clock.tick();
        manager.update(time, period);
        if config.realtime {
            let deadline = started + time.to_duration();
            if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }
    manager.stopping(clock.time());
    debug!(ticks = clock.ticks(), elapsed = ?started.elapsed(), "loop finished");

    println!(
        "{} ticks at {} Hz (t = {})",
        clock.ticks(),
        config.rate_hz,
        clock.time()
    );
    println!();
    println!("{:<20} {:>12} {:>12}", "joint", "position", "command");
    for name in skeleton.dof_names() {
        let position = hw.slot(name).map_or(0.0, |slot| slot.position());
        let command = hw.command(name).unwrap_or(0.0);
        println!("{name:<20} {position:>12.4} {command:>12.4}");
    }
    Ok(())
}

fn run_info(path: &Path) -> AppResult {
    let model = parse_file(path)?;
    let skeleton = Skeleton::from_model(&model)?;

    println!("robot: {}", model.name);
    println!("root link: {}", model.root_link);
    println!(
        "links: {}, joints: {}, dofs: {}",
        model.links.len(),
        model.joints.len(),
        skeleton.num_dofs()
    );
    println!("total mass: {:.3} kg", skeleton.total_mass());
    println!();
    println!("dofs (solve order):");
    for name in skeleton.dof_names() {
        let joint = model.joint(name)?;
        let limits = match (joint.limits.lower, joint.limits.upper) {
            (Some(lower), Some(upper)) => format!("[{lower:.3}, {upper:.3}]"),
            _ => "unbounded".to_owned(),
        };
        println!(
            "  {name:<20} {:<10} {} -> {}  limits {limits}  effort {:.1}",
            joint.joint_type.as_str(),
            joint.parent,
            joint.child,
            joint.limits.effort
        );
    }

    let meshes = model.mesh_filenames();
    if !meshes.is_empty() {
        println!();
        println!("meshes:");
        for mesh in meshes {
            println!("  {mesh}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> AppResult {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(&args),
        Commands::Info { urdf } => run_info(&urdf),
    }
}
