//! Per-tick population metrics and rolling buffers for live display.
use serde::Serialize;

use crate::entity::Kind;
use crate::world::World;

/// Ring buffer that stores the last N samples of a metric.
pub struct RingBuffer {
    data: Vec<f64>,
    head: usize,
    len: usize,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity],
            head: 0,
            len: 0,
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Return samples in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let start = if self.len < self.capacity {
            0
        } else {
            self.head
        };
        (0..self.len).map(move |i| self.data[(start + i) % self.capacity])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mean of the buffered samples, 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        self.iter().sum::<f64>() / self.len as f64
    }

    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }

    pub fn last(&self) -> Option<f64> {
        if self.len == 0 {
            None
        } else {
            let idx = (self.head + self.capacity - 1) % self.capacity;
            Some(self.data[idx])
        }
    }
}

/// One sample of the world, taken between ticks.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TickMetrics {
    pub tick: u64,
    pub plants: usize,
    pub mature_plants: usize,
    pub herbivores: usize,
    pub predators: usize,
    pub herbivore_health: f64,
    pub predator_health: f64,
    pub herbivore_reserve_gini: f64,
    /// Births during the tick that produced this sample.
    pub births: usize,
    pub deaths: usize,
}

/// Averages over the most recent window of samples.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WindowSummary {
    pub samples: usize,
    pub plants: f64,
    pub herbivores: f64,
    pub predators: f64,
    pub herbivore_health: f64,
    pub predator_health: f64,
    /// Totals, not means.
    pub births: f64,
    pub deaths: f64,
}

/// Gini coefficient of `values`; 0.0 for no values or a zero total.
pub fn gini(values: &[u32]) -> f64 {
    let total: u64 = values.iter().map(|&v| u64::from(v)).sum();
    if values.is_empty() || total == 0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len() as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &v)| (n - i as f64) * f64::from(v))
        .sum();
    let b = weighted / (n * total as f64);
    1.0 + 1.0 / n - 2.0 * b
}

/// Full history plus bounded buffers of the headline series.
pub struct MetricsCollector {
    history: Vec<TickMetrics>,
    pub plants: RingBuffer,
    pub herbivores: RingBuffer,
    pub predators: RingBuffer,
    pub herbivore_health: RingBuffer,
    pub predator_health: RingBuffer,
    pub births: RingBuffer,
    pub deaths: RingBuffer,
}

impl MetricsCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: Vec::new(),
            plants: RingBuffer::new(capacity),
            herbivores: RingBuffer::new(capacity),
            predators: RingBuffer::new(capacity),
            herbivore_health: RingBuffer::new(capacity),
            predator_health: RingBuffer::new(capacity),
            births: RingBuffer::new(capacity),
            deaths: RingBuffer::new(capacity),
        }
    }

    /// Record the current state of `world`.
    pub fn sample(&mut self, world: &World) -> TickMetrics {
        let (births, deaths) = world
            .last_report()
            .map_or((0, 0), |r| (r.ledger.total_births(), r.ledger.total_deaths()));
        let metrics = TickMetrics {
            tick: world.tick_count(),
            plants: world.population_count(Kind::Plant),
            mature_plants: world.mature_plant_count(),
            herbivores: world.population_count(Kind::Herbivore),
            predators: world.population_count(Kind::Predator),
            herbivore_health: world.average_health(Kind::Herbivore),
            predator_health: world.average_health(Kind::Predator),
            herbivore_reserve_gini: gini(&world.herbivore_reserves()),
            births,
            deaths,
        };

        self.plants.push(metrics.plants as f64);
        self.herbivores.push(metrics.herbivores as f64);
        self.predators.push(metrics.predators as f64);
        self.herbivore_health.push(metrics.herbivore_health);
        self.predator_health.push(metrics.predator_health);
        self.births.push(metrics.births as f64);
        self.deaths.push(metrics.deaths as f64);
        self.history.push(metrics.clone());
        metrics
    }

    /// Rolling view over the last `capacity` samples.
    pub fn window(&self) -> WindowSummary {
        WindowSummary {
            samples: self.plants.len(),
            plants: self.plants.mean(),
            herbivores: self.herbivores.mean(),
            predators: self.predators.mean(),
            herbivore_health: self.herbivore_health.mean(),
            predator_health: self.predator_health.mean(),
            births: self.births.sum(),
            deaths: self.deaths.sum(),
        }
    }

    pub fn history(&self) -> &[TickMetrics] {
        &self.history
    }

    pub fn latest(&self) -> Option<&TickMetrics> {
        self.history.last()
    }

    /// Population of `kind` at every sample, oldest first.
    pub fn population_series(&self, kind: Kind) -> Vec<usize> {
        self.history
            .iter()
            .map(|m| match kind {
                Kind::Plant => m.plants,
                Kind::Herbivore => m.herbivores,
                Kind::Predator => m.predators,
                Kind::Terrain => 0,
            })
            .collect()
    }
}
