//! Static and moving obstacle state.

use indexmap::IndexSet;
use warren_core::{Cell, LevelConfig, MovingObstacle, Position};

/// Obstacle time advanced per tick at unit speed scale.
pub const OBSTACLE_DT: f32 = 0.1;

#[derive(Clone, Debug)]
struct Mover {
    obstacle: MovingObstacle,
    t: f32,
    position: Position,
}

impl Mover {
    fn new(obstacle: MovingObstacle) -> Self {
        let mut m = Self {
            obstacle,
            t: 0.0,
            position: Position::default(),
        };
        m.place();
        m
    }

    fn place(&mut self) {
        let progress = (((self.t + self.obstacle.phase) * self.obstacle.speed).sin() + 1.0) / 2.0;
        self.position = self.obstacle.position_at(progress);
    }
}

/// All obstacles of a level, with moving obstacles at their current
/// positions.
#[derive(Clone, Debug)]
pub struct ObstacleField {
    grid_size: u32,
    statics: IndexSet<Cell>,
    movers: Vec<Mover>,
}

impl ObstacleField {
    /// Build the field for `level`, movers at time zero.
    pub fn new(level: &LevelConfig) -> Self {
        Self {
            grid_size: level.grid_size,
            statics: level.static_obstacles.iter().copied().collect(),
            movers: level
                .moving_obstacles
                .iter()
                .cloned()
                .map(Mover::new)
                .collect(),
        }
    }

    /// Return every mover to time zero.
    pub fn reset(&mut self) {
        for m in &mut self.movers {
            m.t = 0.0;
            m.place();
        }
    }

    /// Advance every mover by one tick, scaled by `speed_scale`.
    pub fn advance(&mut self, speed_scale: f32) {
        for m in &mut self.movers {
            m.t += OBSTACLE_DT * speed_scale;
            m.place();
        }
    }

    /// Grid side length.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Whether `cell` is a static obstacle.
    pub fn is_static(&self, cell: Cell) -> bool {
        self.statics.contains(&cell)
    }

    /// Whether `cell` is a static obstacle or a mover's current cell.
    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.is_static(cell) || self.movers.iter().any(|m| m.position.cell() == cell)
    }

    /// Whether `cell` is outside the grid or blocked.
    pub fn is_wall_or_blocked(&self, cell: Cell) -> bool {
        !cell.in_bounds(self.grid_size) || self.is_blocked(cell)
    }

    /// Static obstacle cells in level order.
    pub fn statics(&self) -> impl Iterator<Item = Cell> + '_ {
        self.statics.iter().copied()
    }

    /// Movers as `(id, position)` in level order.
    pub fn movers(&self) -> impl Iterator<Item = (&str, Position)> + '_ {
        self.movers.iter().map(|m| (m.obstacle.id.as_str(), m.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> LevelConfig {
        LevelConfig::new(25)
            .with_start(Cell::new(0, 0))
            .with_obstacle(Cell::new(3, 3))
            .with_moving(MovingObstacle::patrol(
                "p",
                Cell::new(8, 5),
                Cell::new(16, 5),
                2.0,
                0.0,
            ))
    }

    #[test]
    fn mover_starts_mid_path_at_zero_phase() {
        let field = ObstacleField::new(&level());
        let (_, pos) = field.movers().next().unwrap();
        assert_eq!(pos, Position::new(12.0, 5.0));
        assert!(field.is_blocked(Cell::new(12, 5)));
    }

    #[test]
    fn mover_follows_sine_progress() {
        let mut field = ObstacleField::new(&level());
        field.advance(1.0);
        let (_, pos) = field.movers().next().unwrap();
        let progress = ((0.1f32 * 2.0).sin() + 1.0) / 2.0;
        assert!((pos.x - (8.0 + 8.0 * progress)).abs() < 1e-5);
        field.reset();
        assert_eq!(field.movers().next().unwrap().1, Position::new(12.0, 5.0));
    }

    #[test]
    fn walls_count_as_blocked() {
        let field = ObstacleField::new(&level());
        assert!(field.is_wall_or_blocked(Cell::new(-1, 0)));
        assert!(field.is_wall_or_blocked(Cell::new(3, 3)));
        assert!(!field.is_wall_or_blocked(Cell::new(4, 4)));
    }
}
