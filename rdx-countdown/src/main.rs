use anyhow::{Context, Result};
use countdown::prelude::*;
use countdown::{ENGINE_NAME, VERSION};
use std::path::PathBuf;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load the configuration: an optional TOML path, then COUNTDOWN_* overrides.
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = TimerConfig::load(path.as_deref()).context("failed to load timer config")?;
    info!("{} v{} starting with {:?}", ENGINE_NAME, VERSION, config);

    // 3. Create the timer and wire up listeners and milestones.
    let mut timer = Timer::from_config(&config);
    timer.on_event(|event| match event {
        TimerEvent::Tick(_) => {}
        other => info!("[EVENT] => {:?}", other),
    });
    register_demo_milestones(&mut timer)?;

    // 4. Drive the timer from a fixed-rate host loop until it completes.
    let tick = config.resolution.tick_interval();
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = ticker.tick().await;
    timer.start();

    loop {
        tokio::select! {
            now = ticker.tick() => {
                let delta = now.duration_since(last).as_secs_f64();
                last = now;
                timer.update(delta);
                if !timer.is_running() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received.");
                timer.stop();
                break;
            }
        }
    }

    info!(
        complete = timer.is_complete(),
        remaining = timer.remaining(),
        "{} has shut down.",
        ENGINE_NAME
    );
    Ok(())
}

/// Registers a handful of milestones that demonstrate each trigger kind.
fn register_demo_milestones(timer: &mut Timer) -> Result<()> {
    let duration = timer.duration();

    timer.on_progress(0.5, |timer| {
        info!("[MILESTONE] => Halfway there, {:.2}s elapsed.", timer.elapsed());
    })?;

    timer.add_range_milestone(
        TimeType::TimeRemaining,
        duration.min(5.0),
        1.0,
        1.0,
        |timer| info!("[COUNTDOWN] => {:.0}", timer.remaining()),
        true,
    )?;

    timer.on_time_elapsed(0.0, |timer| {
        // Milestones may register further milestones from inside a callback.
        let quarter = timer.duration() * 0.25;
        if let Err(error) = timer.on_time_elapsed(quarter, |timer| {
            info!("[MILESTONE] => A quarter done at {:.2}s.", timer.elapsed());
        }) {
            tracing::warn!(%error, "could not add follow-up milestone");
        }
    })?;

    Ok(())
}
