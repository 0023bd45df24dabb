use crate::board::{Board, Position};
use crate::deadsquares::DeadSquares;

pub const DEFAULT_DEAD_SQUARE_PENALTY: f64 = 300.0;
pub const DEFAULT_WALL_PENALTY: f64 = 10.0;

/// Trait for estimating the remaining path cost of a board.
pub trait Heuristic {
    /// Non-negative estimate of the cost still needed to place every box.
    fn estimate(&self, board: &Board, dead: &DeadSquares) -> f64;
}

/// Scores the search with zero everywhere (uniform-cost search).
pub struct NullHeuristic;

impl NullHeuristic {
    pub fn new() -> Self {
        NullHeuristic
    }
}

impl Default for NullHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic for NullHeuristic {
    fn estimate(&self, _board: &Board, _dead: &DeadSquares) -> f64 {
        0.0
    }
}

/// Tuning knobs for [`GoalDistanceHeuristic`].
///
/// The defaults were tuned empirically. A dead-square penalty overestimates
/// on purpose, which trades optimality for pruning hopeless branches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicConfig {
    /// Added for every misplaced box on a dead square, instead of its
    /// distance. `None` scores dead boxes by distance like any other box.
    pub dead_square_penalty: Option<f64>,
    /// Added for every wall on the straight row/column run between a box
    /// and a goal.
    pub wall_penalty: f64,
}

impl HeuristicConfig {
    /// A configuration that never overestimates: plain nearest-goal
    /// Manhattan distance.
    pub fn admissible() -> Self {
        HeuristicConfig {
            dead_square_penalty: None,
            wall_penalty: 0.0,
        }
    }

    /// Penalties must be finite and non-negative so estimates stay
    /// non-negative.
    pub fn is_valid(&self) -> bool {
        let valid = |penalty: f64| penalty.is_finite() && penalty >= 0.0;
        valid(self.wall_penalty) && self.dead_square_penalty.is_none_or(valid)
    }
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        HeuristicConfig {
            dead_square_penalty: Some(DEFAULT_DEAD_SQUARE_PENALTY),
            wall_penalty: DEFAULT_WALL_PENALTY,
        }
    }
}

/// Sum over boxes of the distance to the nearest goal.
///
/// Boxes and goals are matched loosely: every box picks its own nearest goal
/// even if another box picked the same one.
pub struct GoalDistanceHeuristic {
    goals: Vec<Position>,
    config: HeuristicConfig,
}

impl GoalDistanceHeuristic {
    /// Goals never move, so they are collected once from the initial board.
    pub fn new(board: &Board, config: HeuristicConfig) -> Self {
        assert!(config.is_valid(), "invalid heuristic config: {:?}", config);
        GoalDistanceHeuristic {
            goals: board.goal_positions().collect(),
            config,
        }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Manhattan distance, inflated for walls on the box's row between the
    /// two columns and on the box's column between the two rows.
    fn distance(&self, board: &Board, from: Position, to: Position) -> f64 {
        let (x, y) = (from.0, from.1);
        let mut distance = (x.abs_diff(to.0) as u32 + y.abs_diff(to.1) as u32) as f64;

        if self.config.wall_penalty > 0.0 {
            for px in x.min(to.0) + 1..x.max(to.0) {
                if board.tile(Position(px, y)).is_wall() {
                    distance += self.config.wall_penalty;
                }
            }
            for py in y.min(to.1) + 1..y.max(to.1) {
                if board.tile(Position(x, py)).is_wall() {
                    distance += self.config.wall_penalty;
                }
            }
        }

        distance
    }
}

impl Heuristic for GoalDistanceHeuristic {
    fn estimate(&self, board: &Board, dead: &DeadSquares) -> f64 {
        let mut total = 0.0;

        for pos in board.box_positions() {
            // Any goal will do; identity only matters for victory
            if board.tile(pos).is_goal() {
                continue;
            }

            if let Some(penalty) = self.config.dead_square_penalty {
                if dead.is_dead(pos) {
                    total += penalty;
                    continue;
                }
            }

            let nearest = self
                .goals
                .iter()
                .map(|&goal| self.distance(board, pos, goal))
                .reduce(f64::min);

            // No goal at all: the box still needs at least one push
            total += nearest.unwrap_or(1.0);
        }

        total
    }
}
