use crate::{configs::ClockAppConfig, data_collection::TickLog, view::ClockView};
use agentic_clock::{
    clock::{
        ClockSample, DisplayCell, PeriodicDisplayController, SimulatedTimeSource, Subscriber,
        TimeSource,
    },
    lifecycle::{self, LifecycleSink, LogSink},
};
use chrono::Utc;
use log::*;
use std::{future, sync::Arc, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};

mod configs;
mod data_collection;
mod view;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ClockAppConfig::new()?;
    let sink = LogSink::new("clock");
    match &config.clock.simulation {
        Some(simulation) => {
            info!("Using simulated clock: {simulation:?}");
            let source = SimulatedTimeSource::from_config(Utc::now(), simulation)?;
            run(&config, PeriodicDisplayController::new(source), &sink).await
        }
        None => run(&config, PeriodicDisplayController::with_system_clock(), &sink).await,
    }
}

async fn run<S: TimeSource>(
    config: &ClockAppConfig,
    controller: PeriodicDisplayController<S>,
    sink: &dyn LifecycleSink,
) -> anyhow::Result<()> {
    let interval = config.clock.tick_interval();
    let display = Arc::new(DisplayCell::new());
    let mut samples = display.watch();
    let mut view = ClockView::new(Utc::now());

    lifecycle::on_appear(sink, &config.launch_message);
    let cell = Arc::clone(&display);
    let handle = controller.start(interval, move |sample: ClockSample| cell.on_tick(sample))?;

    // Lateness is measured against the controller's own start reading so a
    // simulated source is compared with itself. The first tick is a full
    // interval away, so subscribing now misses nothing.
    let tick_log = config
        .output_filepath
        .as_ref()
        .map(|_| Arc::new(TickLog::new(handle.started_at(), interval)));
    if let Some(tick_log) = &tick_log {
        let subscriber: Arc<dyn Subscriber> = tick_log.clone();
        controller.subscribe(&subscriber);
    }
    println!("{}", view.render());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let deadline = async {
        match config.run_for_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing clock view");
                break;
            }
            _ = &mut deadline => {
                info!("Run time elapsed, closing clock view");
                break;
            }
            changed = samples.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = *samples.borrow_and_update();
                if let Some(sample) = latest {
                    debug!("Tick {sample}");
                    view.set_time(sample);
                    println!("{}", view.render());
                }
            }
            line = lines.next_line(), if input_open => match line {
                Ok(Some(text)) => {
                    view.set_text(text);
                    println!("{}", view.render());
                }
                Ok(None) => {
                    debug!("stdin closed, text input disabled");
                    input_open = false;
                }
                Err(e) => {
                    warn!("Failed to read input: {e}");
                    input_open = false;
                }
            },
        }
    }

    drop(handle);
    if let Some(tick_log) = &tick_log {
        info!("Clock finished: recorded {} ticks", tick_log.tick_count());
    }
    save_results(config, tick_log.as_deref());
    Ok(())
}

fn save_results(config: &ClockAppConfig, tick_log: Option<&TickLog>) {
    if let (Some(path), Some(tick_log)) = (&config.output_filepath, tick_log) {
        match tick_log.to_csv(path) {
            Ok(()) => info!("Exported tick log to {path}"),
            Err(e) => warn!("Failed to export tick log: {e}"),
        }
    }
    if let Some(path) = &config.summary_filepath {
        if let Err(e) = data_collection::save_summary(config, path) {
            warn!("Failed to save summary: {e}");
        }
    }
}
