use ::rand::Rng;
use noise::{Fbm, NoiseFn, Perlin};
use serde::Serialize;

use crate::config::{AltitudeSource, MapConfig};
use crate::entity::Position;
use crate::grid::EdgePolicy;

/// Static ground truth for one grid position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TerrainCell {
    pub position: Position,
    pub altitude: f64,
}

impl TerrainCell {
    /// Water blocks plant cuttings.
    pub fn is_water(&self) -> bool {
        self.altitude <= 0.0
    }
}

/// Exactly one `TerrainCell` per grid position, row-major.
pub struct TerrainMap {
    pub width: usize,
    pub height: usize,
    cells: Vec<TerrainCell>,
}

impl TerrainMap {
    /// Sample a raw altitude field, blur it, and freeze it into cells.
    pub fn generate(
        width: usize,
        height: usize,
        edges: EdgePolicy,
        map: &MapConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let mut field = match map.source {
            AltitudeSource::Uniform => (0..width * height)
                .map(|_| rng.gen_range(map.altitude_min..=map.altitude_max))
                .collect(),
            AltitudeSource::Fractal => fractal_field(width, height, map, rng.gen()),
        };

        for _ in 0..map.smoothing_passes {
            field = smooth(&field, width, height, edges);
        }

        let cells = field
            .into_iter()
            .enumerate()
            .map(|(i, altitude)| TerrainCell {
                position: Position::new(i % width, i / width),
                altitude,
            })
            .collect();

        Self {
            width,
            height,
            cells,
        }
    }

    /// Uniform altitude everywhere.
    pub fn flat(width: usize, height: usize, altitude: f64) -> Self {
        let cells = (0..width * height)
            .map(|i| TerrainCell {
                position: Position::new(i % width, i / width),
                altitude,
            })
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn get(&self, pos: Position) -> Option<&TerrainCell> {
        if pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        self.cells.get(pos.y * self.width + pos.x)
    }

    /// Out-of-grid positions count as water.
    pub fn is_land(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(|cell| !cell.is_water())
    }

    pub fn cells(&self) -> &[TerrainCell] {
        &self.cells
    }

    pub fn water_fraction(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        let water = self.cells.iter().filter(|c| c.is_water()).count();
        water as f64 / self.cells.len() as f64
    }
}

fn fractal_field(width: usize, height: usize, map: &MapConfig, seed: u32) -> Vec<f64> {
    let fbm: Fbm<Perlin> = Fbm::new(seed);
    let span = map.altitude_max - map.altitude_min;
    let mut field = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let nx = x as f64 / width as f64 * 4.0;
            let ny = y as f64 / height as f64 * 4.0;
            // fBm output is roughly [-1, 1]
            let unit = (fbm.get([nx, ny]).clamp(-1.0, 1.0) + 1.0) * 0.5;
            field.push(map.altitude_min + unit * span);
        }
    }
    field
}

/// One 3x3 box-blur pass. Bounded edges average over fewer cells.
fn smooth(field: &[f64], width: usize, height: usize, edges: EdgePolicy) -> Vec<f64> {
    let mut out = Vec::with_capacity(field.len());
    for y in 0..height {
        for x in 0..width {
            let neighbors = edges.neighborhood(Position::new(x, y), true, width, height);
            let sum: f64 = neighbors.iter().map(|p| field[p.y * width + p.x]).sum();
            out.push(sum / neighbors.len() as f64);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn roughness(map: &TerrainMap) -> f64 {
        let mut total = 0.0;
        for y in 0..map.height {
            for x in 0..map.width - 1 {
                let a = map.get(Position::new(x, y)).unwrap().altitude;
                let b = map.get(Position::new(x + 1, y)).unwrap().altitude;
                total += (a - b).abs();
            }
        }
        total
    }

    #[test]
    fn one_cell_per_position_in_row_major_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let map = TerrainMap::generate(6, 4, EdgePolicy::Wrap, &MapConfig::default(), &mut rng);
        assert_eq!(map.cells().len(), 24);
        for (i, cell) in map.cells().iter().enumerate() {
            assert_eq!(cell.position, Position::new(i % 6, i / 6));
        }
    }

    #[test]
    fn altitudes_stay_inside_configured_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for source in [AltitudeSource::Uniform, AltitudeSource::Fractal] {
            let config = MapConfig {
                source,
                ..MapConfig::default()
            };
            let map = TerrainMap::generate(16, 16, EdgePolicy::Bounded, &config, &mut rng);
            assert!(map
                .cells()
                .iter()
                .all(|c| (config.altitude_min..=config.altitude_max).contains(&c.altitude)));
        }
    }

    #[test]
    fn smoothing_reduces_neighbor_differences() {
        let raw = MapConfig {
            smoothing_passes: 0,
            ..MapConfig::default()
        };
        let smoothed = MapConfig {
            smoothing_passes: 3,
            ..MapConfig::default()
        };
        let a = TerrainMap::generate(
            20,
            20,
            EdgePolicy::Wrap,
            &raw,
            &mut ChaCha8Rng::seed_from_u64(9),
        );
        let b = TerrainMap::generate(
            20,
            20,
            EdgePolicy::Wrap,
            &smoothed,
            &mut ChaCha8Rng::seed_from_u64(9),
        );
        assert!(roughness(&b) < roughness(&a) * 0.5);
    }

    #[test]
    fn water_is_altitude_at_or_below_zero() {
        let map = TerrainMap::flat(3, 3, 0.0);
        assert!(map.cells().iter().all(TerrainCell::is_water));
        assert!(!map.is_land(Position::new(1, 1)));
        assert_eq!(map.water_fraction(), 1.0);

        let land = TerrainMap::generate(
            5,
            5,
            EdgePolicy::Wrap,
            &MapConfig::all_land(),
            &mut ChaCha8Rng::seed_from_u64(4),
        );
        assert_eq!(land.water_fraction(), 0.0);
        assert!(!land.is_land(Position::new(5, 0)));
    }
}
