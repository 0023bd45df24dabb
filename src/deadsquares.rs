use std::collections::VecDeque;
use std::fmt;

use crate::board::{ALL_DIRECTIONS, Board, Position};

/// Cells from which a box can never be pushed onto any goal.
///
/// Depends only on walls and goals, so it is computed once per level and
/// shared read-only by every heuristic evaluation of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadSquares {
    width: usize,
    height: usize,
    dead: Vec<bool>,
    walls: Vec<bool>,
}

impl DeadSquares {
    /// Reverse reachability from the goals: a cell is live if a box on it
    /// can be pulled there from a live cell with the puller standing on a
    /// non-wall cell behind it. Every non-wall cell left unmarked is dead.
    pub fn detect(board: &Board) -> Self {
        let width = board.width();
        let height = board.height();
        let mut live = vec![false; width * height];
        let mut queue = VecDeque::new();

        for pos in board.goal_positions() {
            live[board.index(pos)] = true;
            queue.push_back(pos);
        }

        while let Some(box_pos) = queue.pop_front() {
            for dir in ALL_DIRECTIONS {
                // Box came from one step back, pushed by a player two steps back
                let Some(prev_box) = board.step_back(box_pos, dir) else {
                    continue;
                };
                let Some(player) = board.step_back(prev_box, dir) else {
                    continue;
                };

                let idx = board.index(prev_box);
                if !board.tile(prev_box).is_wall() && !board.tile(player).is_wall() && !live[idx] {
                    live[idx] = true;
                    queue.push_back(prev_box);
                }
            }
        }

        let dead = board
            .positions()
            .map(|pos| !board.tile(pos).is_wall() && !live[board.index(pos)])
            .collect();
        let walls = board.positions().map(|pos| board.tile(pos).is_wall()).collect();

        DeadSquares {
            width,
            height,
            dead,
            walls,
        }
    }

    pub fn is_dead(&self, pos: Position) -> bool {
        let (x, y) = (pos.0 as usize, pos.1 as usize);
        assert!(
            x < self.width && y < self.height,
            "position {} out of bounds",
            pos
        );
        self.dead[y * self.width + x]
    }

    pub fn count(&self) -> usize {
        self.dead.iter().filter(|&&dead| dead).count()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl fmt::Display for DeadSquares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (dead, walls) in self.dead.chunks(self.width).zip(self.walls.chunks(self.width)) {
            let line: String = dead
                .iter()
                .zip(walls)
                .map(|(&dead, &wall)| match (wall, dead) {
                    (true, _) => '#',
                    (false, true) => 'x',
                    (false, false) => '.',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
