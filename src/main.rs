use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use stereo_quad::cli::CliOverrides;
use stereo_quad::config::EngineConfig;
use stereo_quad::input::InputSnapshot;
use stereo_quad::surface::Eye;
use stereo_quad::Engine;

/// One recorded frame of controller input.
#[derive(Debug, Deserialize)]
struct TraceFrame {
    dt: f32,
    #[serde(flatten)]
    input: InputSnapshot,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            log::error!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(cli) {
        log::error!("Replay failed: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: CliOverrides) -> Result<()> {
    let mut config = match cli.config.as_ref() {
        Some(path) => EngineConfig::load_or_default(path),
        None => EngineConfig::default(),
    };
    let overrides = cli.config_overrides();
    if !overrides.is_empty() {
        log::info!("[cli] Overriding {}", overrides.applied_fields().join(", "));
        config.apply_overrides(&overrides);
    }
    let trace_path = cli.trace.as_ref().ok_or_else(|| anyhow!("--trace <file> is required"))?;
    let frames = load_trace(trace_path)?;

    let mut engine = Engine::init(config);
    let report = engine.load_report();
    log::info!(
        "[profiles] {} loaded, {} seeded, {} skipped{}",
        report.loaded,
        report.seeded_from_defaults,
        report.skipped.len(),
        if report.synthesized_default { ", default synthesised" } else { "" }
    );

    for (index, frame) in frames.iter().enumerate() {
        engine.tick(&frame.input, frame.dt);
        for record in engine.drain_status() {
            log::info!("[frame {index}] {record}");
        }
    }

    for eye in Eye::BOTH {
        let transform = engine.rig().transform(eye);
        log::info!(
            "{} quad: position={:?} rotation={:?} scale={:?}",
            eye.label(),
            transform.position,
            transform.rotation,
            transform.scale
        );
    }
    let final_status = engine.shutdown();
    log::info!("Final status: {final_status}");
    Ok(())
}

fn load_trace(path: &Path) -> Result<Vec<TraceFrame>> {
    let bytes = fs::read(path).with_context(|| format!("Reading input trace {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Parsing input trace {}", path.display()))
}
