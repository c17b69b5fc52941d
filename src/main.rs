use log::{error, info, trace, LevelFilter};
use phichart::utils::frame_stats::FrameStats;
use phichart::{config, AudioTimeSource, Chart, RenderList, RenderSink, Session};
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

const TICK_HZ: f64 = 60.0;

/// Stands in for an audio device: a clock that advances exactly one tick per frame.
struct SimulatedAudio {
    time: f64,
}

impl AudioTimeSource for SimulatedAudio {
    fn current_audio_time_seconds(&self) -> f64 {
        self.time
    }
}

/// Logs draw lists instead of rendering them.
#[derive(Default)]
struct LogSink {
    objects_submitted: u64,
}

impl RenderSink for LogSink {
    fn submit(&mut self, list: &RenderList) -> Result<(), Box<dyn Error>> {
        self.objects_submitted += list.len() as u64;
        trace!("Submitted {} draw objects.", list.len());
        Ok(())
    }
}

struct Args {
    chart: PathBuf,
    config: Option<PathBuf>,
    dump: bool,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut positional = Vec::new();
    let mut dump = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dump" => dump = true,
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    let mut positional = positional.into_iter();
    let Some(chart) = positional.next() else {
        return Err("usage: phichart <chart.json> [config.ini] [--dump]".into());
    };
    Ok(Args { chart, config: positional.next(), dump })
}

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info) // Default level
        .filter_module("phichart::game::parsing", LevelFilter::Debug)
        .filter_module("phichart::game::scheduler", LevelFilter::Info)
        .init();

    info!("phichart starting...");

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            error!("{}", e);
            return Err(e);
        }
    };

    config::load(args.config.as_deref());
    let cfg = config::get();

    let json = std::fs::read_to_string(&args.chart)?;
    let chart = match Chart::from_json_str(&json) {
        Ok(chart) => chart,
        Err(e) => {
            error!("Failed to load chart {}: {}", args.chart.display(), e);
            return Err(e.into());
        }
    };

    let mut session = Session::new(chart, &cfg);
    let mut audio = SimulatedAudio { time: session.clock().time() };
    let mut sink = LogSink::default();
    let mut stats = FrameStats::new();
    let end = session.duration_seconds();
    let dt = 1.0 / TICK_HZ;

    while session.clock().time() < end {
        let started = Instant::now();
        let snapshot = session.frame(&mut sink)?;
        if args.dump {
            println!("{}", serde_json::to_string(snapshot)?);
        }
        if let Some(ticks) = stats.record(started.elapsed()) {
            info!("Ticks/s: {}", ticks);
        }

        audio.time += dt;
        let clock = session.clock_mut();
        clock.advance(dt);
        clock.sync_to(&audio);
    }

    info!(
        "Playback finished: {} frames, {} draw objects, worst frame {:.3}ms.",
        stats.total_frames(),
        sink.objects_submitted,
        stats.worst_frame().as_secs_f64() * 1000.0
    );
    Ok(())
}
