//! Main robot executable entry point.
//!
//! # Architecture
//!
//! The executable builds the robot on simulated hardware and runs it through the selected mode
//! sequence:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the robot (modules, subsystems, gamepad processing)
//!     - Start the background tasks (sensors, history, match time)
//!     - Run each mode until its time is up:
//!         - Autonomous: the drive forward routine
//!         - Teleoperated: the driver and operator gamepad tasks
//!     - Stop every task and leave the mechanisms stopped

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use std::sync::Arc;
use std::thread;
use structopt::StructOpt;

use hw_if::{
    ds::RobotMode,
    net::{zmq, NetParams, TmPublisher},
    prefs::MapPreferences,
    sim::{MemTelemetry, SimDriverStation},
    telemetry::TelemetrySink,
};
use robot_lib::{
    chassis::VisionUpdate,
    modes::mode_signal,
    params::{DriveParams, RobotExecParams, RobotParams, ShooterParams},
    ophmi::OphmiParams,
    prefs::Preferences,
    robot::{Robot, RobotHardware},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::secs_to_duration,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Power Knights 2016 robot executable
#[derive(Debug, StructOpt)]
#[structopt(name = "robot_exec")]
struct Cli {
    /// Minimum log level (info, debug or trace)
    #[structopt(short, long, default_value = "info")]
    log_level: LevelFilter,

    #[structopt(subcommand)]
    mode: RunMode,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The mode sequence to run.
#[derive(Debug, Clone, Copy, StructOpt)]
enum RunMode {
    /// Run teleop for the given number of seconds.
    #[structopt(name = "teleop")]
    Teleop { duration_s: f64 },

    /// Run autonomous for the given number of seconds.
    #[structopt(name = "auto")]
    Auto { duration_s: f64 },

    /// Run a full match, autonomous then teleop, each for its match period.
    #[structopt(name = "match")]
    Match,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let cli = Cli::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("robot_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(cli.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Power Knights 2016 Robot Executable\n");
    info!("Running on: {}", host::platform_desc());
    info!("Session directory: {:?}\n", session.root);

    // ---- LOAD PARAMETERS ----

    let params = RobotParams {
        exec: util::params::load::<RobotExecParams>("robot_exec.toml")
            .wrap_err("Could not load exec params")?,
        shooter: util::params::load::<ShooterParams>("shooter.toml")
            .wrap_err("Could not load shooter params")?,
        drive: util::params::load::<DriveParams>("drive.toml")
            .wrap_err("Could not load drive params")?,
        ophmi: util::params::load::<OphmiParams>("ophmi.toml")
            .wrap_err("Could not load ophmi params")?,
    };

    let prefs: MapPreferences =
        util::params::load("prefs.toml").wrap_err("Could not load preferences")?;
    let prefs = Preferences::new(Arc::new(prefs));

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    info!("Parameters loaded");

    // ---- INITIALISE TELEMETRY ----

    let zmq_ctx = zmq::Context::new();

    let tm: Arc<dyn TelemetrySink> = if net_params.publish_tm {
        let publisher = TmPublisher::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise the TmPublisher")?;
        info!("Publishing telemetry on {}", net_params.tm_endpoint);
        Arc::new(publisher)
    } else {
        info!("Telemetry publishing disabled");
        Arc::new(MemTelemetry::new())
    };

    // ---- BUILD THE ROBOT ----

    let ds = Arc::new(SimDriverStation::new());
    let hw = RobotHardware::simulated(ds.clone(), &params.shooter);

    let sim_distance = params.exec.sim_tower_distance_ft;
    let match_time = params.exec.match_time;

    let mut robot = Robot::new(hw, params, prefs, tm);

    robot.chassis().update_vision(VisionUpdate {
        valid: sim_distance > 0.0,
        angle_deg: 0.0,
        distance_ft: sim_distance,
    });

    robot
        .start_background(Some(&session))
        .wrap_err("Failed to start the background tasks")?;

    info!("Robot initialised\n");

    // ---- RUN ----

    let run_result = match cli.mode {
        RunMode::Teleop { duration_s } => {
            run_mode(&mut robot, &ds, RobotMode::Teleoperated, duration_s)
        }
        RunMode::Auto { duration_s } => {
            run_mode(&mut robot, &ds, RobotMode::Autonomous, duration_s)
        }
        RunMode::Match => run_mode(
            &mut robot,
            &ds,
            RobotMode::Autonomous,
            match_time.autonomous_s,
        )
        .and_then(|_| {
            run_mode(
                &mut robot,
                &ds,
                RobotMode::Teleoperated,
                match_time.match_s,
            )
        }),
    };

    // ---- SHUTDOWN ----

    // Always shut down, even if a mode failed
    let shutdown_result = robot.shutdown().wrap_err("Failed to shut the robot down");

    run_result?;
    shutdown_result?;

    info!("End of execution");

    Ok(())
}

/// Run one mode on the simulated driver station for `duration_s` seconds.
fn run_mode(
    robot: &mut Robot,
    ds: &SimDriverStation,
    mode: RobotMode,
    duration_s: f64,
) -> Result<(), Report> {
    info!("---- {:?} for {:.1} s ----", mode, duration_s);

    ds.set_mode(mode, true);

    let (ender, mut signal) = mode_signal();
    let duration = secs_to_duration(duration_s);
    let timer = thread::Builder::new()
        .name("ModeTimer".into())
        .spawn(move || {
            thread::sleep(duration);
            ender.end();
        })
        .wrap_err("Failed to start the mode timer")?;

    let result = match mode {
        RobotMode::Autonomous => robot.autonomous(&mut signal),
        RobotMode::Teleoperated => robot.teleop(&mut signal),
        _ => {
            warn!("Nothing to run in {:?}", mode);
            Ok(())
        }
    };

    timer
        .join()
        .map_err(|_| eyre!("The mode timer thread panicked"))?;

    ds.set_mode(RobotMode::Disabled, false);

    result.wrap_err_with(|| format!("{:?} mode failed", mode))
}
