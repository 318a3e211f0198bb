use serde::Serialize;
use tracing::{debug, info};

use crate::error::SimError;
use crate::stats::MetricsCollector;
use crate::world::World;

/// When an external driver should stop ticking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunLimit {
    pub max_steps: u64,
    pub stop_on_extinction: bool,
}

impl RunLimit {
    pub fn steps(max_steps: u64) -> Self {
        Self {
            max_steps,
            stop_on_extinction: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    StepLimit,
    Extinction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Ticks executed by this call.
    pub ticks: u64,
    pub stop: StopReason,
}

/// No herbivores and no predators are left.
pub fn is_extinct(world: &World) -> bool {
    !world.has_animals()
}

/// Tick `world` until `limit` says stop, sampling before the first tick and
/// after every tick.
pub fn run(
    world: &mut World,
    metrics: &mut MetricsCollector,
    limit: RunLimit,
) -> Result<RunOutcome, SimError> {
    metrics.sample(world);
    let mut ticks = 0;
    let stop = loop {
        if limit.stop_on_extinction && is_extinct(world) {
            break StopReason::Extinction;
        }
        if ticks >= limit.max_steps {
            break StopReason::StepLimit;
        }
        let report = world.tick()?;
        ticks += 1;
        let sample = metrics.sample(world);
        debug!(
            tick = report.tick,
            plants = sample.plants,
            herbivores = sample.herbivores,
            predators = sample.predators,
            "sampled"
        );
    };
    info!(ticks, ?stop, "run finished");
    Ok(RunOutcome { ticks, stop })
}
