//! A Sokoban solver: best-first search over player moves and pushes, guided
//! by a goal-distance estimate and a static dead-square analysis.

pub mod action;
pub mod board;
pub mod deadsquares;
pub mod heuristic;
pub mod levels;
pub mod pqueue;
pub mod solver;
pub mod tile;
pub mod zobrist;

pub use action::{Action, CostModel, ReplayError, replay};
pub use board::{Board, BoardError, Direction, Position};
pub use deadsquares::DeadSquares;
pub use heuristic::{GoalDistanceHeuristic, Heuristic, HeuristicConfig, NullHeuristic};
pub use solver::{Solution, SolveResult, Solver, SolverConfig, solve};
pub use tile::Tile;
