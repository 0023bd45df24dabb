use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fnv::FnvHashMap;
use log::{debug, trace};

use crate::action::{Action, CostModel};
use crate::board::{Board, Direction};
use crate::deadsquares::DeadSquares;
use crate::heuristic::{GoalDistanceHeuristic, Heuristic, HeuristicConfig};
use crate::pqueue::PriorityQueue;
use crate::zobrist::Zobrist;

pub const DEFAULT_MAX_EXPANSIONS: usize = 5_000_000;

/// Index of a node in the search arena.
pub type NodeId = usize;

struct Node {
    /// Taken when the node is expanded; only the frontier keeps boards.
    board: Option<Board>,
    cost: f64,
    parent: Option<NodeId>,
    action: Option<Action>,
}

/// A plan that takes the initial board to a solved one.
#[derive(Debug, Clone)]
pub struct Solution {
    pub actions: Vec<Action>,
    pub goal_state: Board,
    pub cost: f64,
}

impl Solution {
    /// The plan as bare directions, for a game loop that decides by itself
    /// whether a step walks or pushes.
    pub fn directions(&self) -> Vec<Direction> {
        self.actions.iter().map(|action| action.direction()).collect()
    }

    pub fn push_count(&self) -> usize {
        self.actions.iter().filter(|action| action.is_push()).count()
    }

    /// LURD string of the plan.
    pub fn lurd(&self) -> String {
        self.actions.iter().map(|action| action.to_char()).collect()
    }
}

#[derive(Debug, Clone)]
pub enum SolveResult {
    Solved(Solution),
    /// Stopped by the expansion cap or by an interrupt.
    Cutoff,
    /// Every reachable state was explored without reaching the goal.
    Impossible,
}

impl SolveResult {
    pub fn into_solution(self) -> Option<Solution> {
        match self {
            SolveResult::Solved(solution) => Some(solution),
            SolveResult::Cutoff | SolveResult::Impossible => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub costs: CostModel,
    /// Give up after this many expansions. `None` searches until the
    /// frontier is exhausted.
    pub max_expansions: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            costs: CostModel::default(),
            max_expansions: Some(DEFAULT_MAX_EXPANSIONS),
        }
    }
}

/// Hook called once per expanded node.
pub trait Tracer {
    fn trace(
        &self,
        board: &Board,
        nodes_expanded: usize,
        f_cost: f64,
        g_cost: f64,
        action: Option<Action>,
    );
}

/// Best-first (A*) search over moves and pushes.
pub struct Solver<H: Heuristic> {
    heuristic: H,
    config: SolverConfig,
    zobrist: Zobrist,
    interrupt: Option<Arc<AtomicBool>>,
    tracer: Option<Box<dyn Tracer>>,
    nodes_expanded: usize,
    nodes_generated: usize,
}

impl<H: Heuristic> Solver<H> {
    pub fn new(heuristic: H, config: SolverConfig) -> Self {
        assert!(
            config.costs.is_valid(),
            "invalid action costs: {:?}",
            config.costs
        );
        Solver {
            heuristic,
            config,
            zobrist: Zobrist::new(),
            interrupt: None,
            tracer: None,
            nodes_expanded: 0,
            nodes_generated: 0,
        }
    }

    /// Stop the search at the next expansion once `flag` is raised.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracer = Some(tracer);
    }

    pub fn nodes_expanded(&self) -> usize {
        self.nodes_expanded
    }

    pub fn nodes_generated(&self) -> usize {
        self.nodes_generated
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Search for a plan from `board`. `dead` must have been detected on the
    /// same level layout.
    pub fn solve(&mut self, board: &Board, dead: &DeadSquares) -> SolveResult {
        assert!(
            dead.width() == board.width() && dead.height() == board.height(),
            "dead squares computed for a different board"
        );

        self.nodes_expanded = 0;
        self.nodes_generated = 0;

        let costs = self.config.costs;
        let mut nodes: Vec<Node> = Vec::new();
        let mut visited: FnvHashMap<u64, f64> = FnvHashMap::default();
        let mut frontier = PriorityQueue::new();

        debug!(
            "Searching {}x{} board with {} boxes ({} placed), {} dead squares",
            board.width(),
            board.height(),
            board.box_count(),
            board.boxes_in_place(),
            dead.count()
        );

        let root = board.clone();
        let root_estimate = self.heuristic.estimate(&root, dead);
        visited.insert(root.state_hash(&self.zobrist), 0.0);
        nodes.push(Node {
            board: Some(root),
            cost: 0.0,
            parent: None,
            action: None,
        });
        frontier.push(root_estimate, 0);

        while let Some(id) = frontier.pop_min() {
            let (state, g_cost) = {
                let node = &mut nodes[id];
                (node.board.take(), node.cost)
            };
            let Some(state) = state else {
                continue;
            };

            // A cheaper path to the same state was found after this entry
            let hash = state.state_hash(&self.zobrist);
            if visited.get(&hash).is_some_and(|&best| g_cost > best) {
                continue;
            }

            if state.is_victory() {
                return SolveResult::Solved(self.finish(&nodes, id, state, g_cost));
            }

            if self
                .config
                .max_expansions
                .is_some_and(|max| self.nodes_expanded >= max)
            {
                debug!("Expansion cap reached after {} nodes", self.nodes_expanded);
                return SolveResult::Cutoff;
            }
            if self.interrupted() {
                debug!("Interrupted after {} expansions", self.nodes_expanded);
                return SolveResult::Cutoff;
            }

            self.nodes_expanded += 1;
            if let Some(tracer) = &self.tracer {
                let f_cost = g_cost + self.heuristic.estimate(&state, dead);
                tracer.trace(&state, self.nodes_expanded, f_cost, g_cost, nodes[id].action);
            }
            trace!(
                "expand #{} g={:.1} frontier={}",
                self.nodes_expanded,
                g_cost,
                frontier.len()
            );

            for action in Action::legal_actions(&state) {
                let mut next = state.clone();
                action.perform(&mut next);
                let cost = g_cost + action.cost(&costs);

                let next_hash = next.state_hash(&self.zobrist);
                if visited.get(&next_hash).is_some_and(|&best| best <= cost) {
                    continue;
                }
                visited.insert(next_hash, cost);
                self.nodes_generated += 1;

                let next_id = nodes.len();
                if next.is_victory() {
                    nodes.push(Node {
                        board: None,
                        cost,
                        parent: Some(id),
                        action: Some(action),
                    });
                    return SolveResult::Solved(self.finish(&nodes, next_id, next, cost));
                }

                let estimate = self.heuristic.estimate(&next, dead);
                nodes.push(Node {
                    board: Some(next),
                    cost,
                    parent: Some(id),
                    action: Some(action),
                });
                frontier.push(cost + estimate, next_id);
            }
        }

        debug!(
            "Frontier exhausted after {} expansions, {} states seen",
            self.nodes_expanded,
            visited.len()
        );
        SolveResult::Impossible
    }

    fn finish(&self, nodes: &[Node], goal: NodeId, goal_state: Board, cost: f64) -> Solution {
        let mut actions = Vec::new();
        let mut current = goal;
        while let Some(parent) = nodes[current].parent {
            // Every non-root node records the action that produced it
            if let Some(action) = nodes[current].action {
                actions.push(action);
            }
            current = parent;
        }
        actions.reverse();

        debug!(
            "Solved: {} actions, cost {:.1}, {} expanded, {} generated",
            actions.len(),
            cost,
            self.nodes_expanded,
            self.nodes_generated
        );

        Solution {
            actions,
            goal_state,
            cost,
        }
    }
}

/// Solve a board with the default heuristic and limits. Returns the plan as
/// directions, or None if no plan was found.
pub fn solve(board: &Board) -> Option<Vec<Direction>> {
    let dead = DeadSquares::detect(board);
    let heuristic = GoalDistanceHeuristic::new(board, HeuristicConfig::default());
    let mut solver = Solver::new(heuristic, SolverConfig::default());
    solver
        .solve(board, &dead)
        .into_solution()
        .map(|solution| solution.directions())
}
