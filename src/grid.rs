use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Position};
use crate::error::InvariantViolation;

/// What happens to neighbor offsets that fall off the edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Toroidal: offsets wrap to the opposite edge.
    #[default]
    Wrap,
    /// Bounded: off-grid offsets are dropped.
    Bounded,
}

impl EdgePolicy {
    /// Map a signed coordinate onto a `width` x `height` grid.
    pub fn resolve(self, x: i64, y: i64, width: usize, height: usize) -> Option<Position> {
        let (w, h) = (width as i64, height as i64);
        match self {
            EdgePolicy::Wrap => Some(Position::new(
                x.rem_euclid(w) as usize,
                y.rem_euclid(h) as usize,
            )),
            EdgePolicy::Bounded => {
                if x < 0 || y < 0 || x >= w || y >= h {
                    None
                } else {
                    Some(Position::new(x as usize, y as usize))
                }
            }
        }
    }

    /// Moore neighborhood of `pos` under this policy, see
    /// [`SpatialGrid::moore_neighborhood`].
    pub fn neighborhood(
        self,
        pos: Position,
        include_center: bool,
        width: usize,
        height: usize,
    ) -> Vec<Position> {
        let (cx, cy) = (pos.x as i64, pos.y as i64);
        OFFSETS
            .iter()
            .filter(|&&(dx, dy)| include_center || (dx, dy) != (0, 0))
            .filter_map(|&(dx, dy)| self.resolve(cx + dx, cy + dy, width, height))
            .collect()
    }
}

/// Moore-neighborhood offsets in row-major order, center included.
const OFFSETS: [(i64, i64); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Multi-occupancy cell grid.
///
/// `locations` maps an id to its cell and its slot inside that cell, so
/// place, remove and move are O(1). Removal swaps the last occupant into the
/// freed slot; cell order is deterministic but not arrival order.
pub struct SpatialGrid {
    pub width: usize,
    pub height: usize,
    pub edges: EdgePolicy,
    cells: Vec<Vec<EntityId>>,
    locations: HashMap<EntityId, (Position, usize)>,
}

impl SpatialGrid {
    pub fn new(width: usize, height: usize, edges: EdgePolicy) -> Self {
        let cells = (0..width * height).map(|_| Vec::with_capacity(4)).collect();
        Self {
            width,
            height,
            edges,
            cells,
            locations: HashMap::new(),
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn cell_index(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }

    pub fn place(&mut self, id: EntityId, pos: Position) -> Result<(), InvariantViolation> {
        if !self.in_bounds(pos) {
            return Err(InvariantViolation::OutOfBounds { id, position: pos });
        }
        if self.locations.contains_key(&id) {
            return Err(InvariantViolation::AlreadyPlaced(id));
        }
        let idx = self.cell_index(pos);
        let slot = self.cells[idx].len();
        self.cells[idx].push(id);
        self.locations.insert(id, (pos, slot));
        Ok(())
    }

    /// Take `id` off the grid. Returns where it was, or `None` if absent.
    pub fn remove(&mut self, id: EntityId) -> Option<Position> {
        let (pos, slot) = self.locations.remove(&id)?;
        let idx = self.cell_index(pos);
        let cell = &mut self.cells[idx];
        cell.swap_remove(slot);
        if let Some(&moved) = cell.get(slot) {
            if let Some(entry) = self.locations.get_mut(&moved) {
                entry.1 = slot;
            }
        }
        Some(pos)
    }

    /// Relocate `id` in one step; it joins the back of the target cell.
    pub fn move_to(&mut self, id: EntityId, to: Position) -> Result<(), InvariantViolation> {
        if !self.in_bounds(to) {
            return Err(InvariantViolation::OutOfBounds { id, position: to });
        }
        if !self.locations.contains_key(&id) {
            return Err(InvariantViolation::NotPlaced(id));
        }
        self.remove(id);
        self.place(id, to)
    }

    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.locations.get(&id).map(|&(pos, _)| pos)
    }

    /// Owned copy of a cell's occupants, safe to hold across grid mutation.
    pub fn contents_at(&self, pos: Position) -> Vec<EntityId> {
        if !self.in_bounds(pos) {
            return Vec::new();
        }
        self.cells[self.cell_index(pos)].clone()
    }

    pub fn occupancy(&self, pos: Position) -> usize {
        if !self.in_bounds(pos) {
            return 0;
        }
        self.cells[self.cell_index(pos)].len()
    }

    /// Number of placed entities.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// The 8 surrounding cells (9 with `include_center`).
    ///
    /// Under `Wrap` every offset is kept, so grids narrower than 3 yield
    /// repeated positions. Under `Bounded` off-grid offsets are skipped.
    pub fn moore_neighborhood(&self, pos: Position, include_center: bool) -> Vec<Position> {
        self.edges
            .neighborhood(pos, include_center, self.width, self.height)
    }
}
