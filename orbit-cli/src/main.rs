//! orbit - a generative Euclidean step sequencer that plays over MIDI.

mod demo;
mod display;

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use orbit_core::config::Config;
use orbit_core::output::{self, LogSink, MidiOutputSink};
use orbit_core::{snapshot, Engine, NoteSink};
use orbit_types::{EngineCommand, EngineFeedback, SequencerId};

/// orbit - generative Euclidean sequencer
#[derive(Parser, Debug)]
#[command(name = "orbit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Polyrhythmic Euclidean step sequencer with MIDI output", long_about = None)]
struct Args {
    /// Tempo in BPM (overrides the config file)
    #[arg(long)]
    bpm: Option<f64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long, value_name = "SECONDS")]
    seconds: Option<f64>,

    /// MIDI output port, by index or name fragment
    #[arg(long, value_name = "PORT")]
    midi_port: Option<String>,

    /// List MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Log notes instead of sending them to a MIDI port
    #[arg(long)]
    no_midi: bool,

    /// Seed for the random stepping modes and patterns
    #[arg(long)]
    seed: Option<u64>,

    /// Config file to use instead of the one in the user config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Load this session instead of the built-in demo
    #[arg(long, value_name = "FILE")]
    session: Option<PathBuf>,

    /// Save the session here on exit
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log to stderr instead of the log file
    #[arg(long)]
    stderr: bool,
}

fn init_logging(verbose: bool, stderr: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    if stderr {
        if let Err(e) = TermLogger::init(
            log_level,
            simplelog::Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ) {
            eprintln!("could not initialize logger: {}", e);
        }
        return;
    }

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orbit")
        .join("orbit.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create("/tmp/orbit.log")) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("could not create log file: {}", e);
            return;
        }
    };

    if let Err(e) = WriteLogger::init(log_level, simplelog::Config::default(), log_file) {
        eprintln!("could not initialize logger: {}", e);
    }

    log::info!("orbit starting (log level: {:?})", log_level);
}

fn open_sink(args: &Args, config: &Config) -> Box<dyn NoteSink> {
    if args.no_midi {
        return Box::new(LogSink);
    }
    let port = args.midi_port.as_deref().or(config.midi_port());
    match MidiOutputSink::open(port) {
        Ok(sink) => {
            println!("MIDI out: {}", sink.name());
            Box::new(sink)
        }
        Err(e) => {
            log::warn!(target: "midi", "MIDI output unavailable: {}", e);
            eprintln!("MIDI output unavailable ({}), logging notes instead", e);
            Box::new(LogSink)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.stderr);

    if args.list_ports {
        let ports = output::list_output_ports().context("listing MIDI ports")?;
        if ports.is_empty() {
            println!("no MIDI output ports");
        }
        for port in ports {
            println!("{:>3}  {}", port.index, port.name);
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load(),
    };

    let mut engine = Engine::from_config(&config);
    if let Some(seed) = args.seed {
        engine.reseed(seed);
    }
    let mut sink = open_sink(&args, &config);

    match &args.session {
        Some(path) => {
            let session = snapshot::load(path)
                .with_context(|| format!("loading session {}", path.display()))?;
            engine.restore(session)?;
        }
        None => demo::build(&mut engine, sink.as_mut())?,
    }
    if let Some(bpm) = args.bpm {
        engine.apply(EngineCommand::SetTempo(bpm), 0.0, sink.as_mut())?;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .context("installing Ctrl-C handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))
        .context("installing SIGTERM handler")?;

    run(&mut engine, sink.as_mut(), &args, &config, &shutdown);

    engine.stop(sink.as_mut());
    engine.panic(sink.as_mut());

    if let Some(path) = &args.save {
        snapshot::save(path, &engine.snapshot())
            .with_context(|| format!("saving session {}", path.display()))?;
        println!("saved session to {}", path.display());
    }
    log::info!("orbit exiting");
    Ok(())
}

/// Frame loop: tick the engine at the configured rate until told to stop.
fn run(
    engine: &mut Engine,
    sink: &mut dyn NoteSink,
    args: &Args,
    config: &Config,
    shutdown: &AtomicBool,
) {
    let frame = Duration::from_secs_f64(1.0 / config.frame_rate() as f64);
    // the demo LFO drives the first sequencer's velocity
    let lead = engine
        .sequencers()
        .first()
        .map(|s| s.id())
        .unwrap_or(SequencerId::new(0));

    println!(
        "{} sequencers at {:.1} BPM, Ctrl-C to stop",
        engine.sequencers().len(),
        engine.transport().bpm()
    );

    let started = Instant::now();
    engine.start(0.0);
    while !shutdown.load(Ordering::Relaxed) {
        let now = started.elapsed().as_secs_f64();
        if args.seconds.is_some_and(|limit| now >= limit) {
            break;
        }

        let mut beat = false;
        for feedback in engine.tick(now, sink) {
            match feedback {
                EngineFeedback::StepAdvanced { .. } => beat = true,
                EngineFeedback::ParameterChanged { target, value } => {
                    if let Some(command) = demo::parameter_command(engine, lead, target, value) {
                        engine.queue(command);
                    }
                }
                _ => {}
            }
        }
        if beat {
            for seq in engine.sequencers() {
                println!("{}", display::pattern_row(seq));
            }
            println!();
        }

        std::thread::sleep(frame);
    }
}
