use arrayvec::ArrayVec;
use std::error::Error;
use std::fmt;

use crate::board::{Board, Direction};

/// A primitive player action. Actions are plain values shared by every
/// search node; legality and effect are pure functions of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Move(Direction),
    Push(Direction),
}

pub const ALL_ACTIONS: [Action; 8] = [
    Action::Move(Direction::Up),
    Action::Move(Direction::Down),
    Action::Move(Direction::Left),
    Action::Move(Direction::Right),
    Action::Push(Direction::Up),
    Action::Push(Direction::Down),
    Action::Push(Direction::Left),
    Action::Push(Direction::Right),
];

/// Path cost of each action kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub move_cost: f64,
    pub push_cost: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        // Pushes cost slightly more so the search avoids needless pushing
        CostModel {
            move_cost: 1.0,
            push_cost: 1.1,
        }
    }
}

impl CostModel {
    /// Both costs must be finite and positive for path costs to grow along
    /// every path.
    pub fn is_valid(&self) -> bool {
        [self.move_cost, self.push_cost]
            .iter()
            .all(|&cost| cost.is_finite() && cost > 0.0)
    }
}

impl Action {
    pub fn direction(&self) -> Direction {
        match self {
            Action::Move(dir) | Action::Push(dir) => *dir,
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Action::Push(_))
    }

    pub fn cost(&self, costs: &CostModel) -> f64 {
        match self {
            Action::Move(_) => costs.move_cost,
            Action::Push(_) => costs.push_cost,
        }
    }

    /// LURD notation: lowercase for moves, uppercase for pushes.
    pub fn to_char(&self) -> char {
        match self {
            Action::Move(dir) => dir.to_char(),
            Action::Push(dir) => dir.to_char().to_ascii_uppercase(),
        }
    }

    /// Returns true if the action can be applied to the board.
    ///
    /// Panics if the board does not hold the player where it claims to.
    pub fn is_possible(&self, board: &Board) -> bool {
        let player = board.player();
        assert!(
            board.tile(player).is_player(),
            "Malformed board: player flag missing at {}",
            player
        );

        match self {
            Action::Move(dir) => match board.step(player, *dir) {
                Some(dest) => board.tile(dest).is_free(),
                None => false,
            },
            Action::Push(dir) => {
                let Some(box_pos) = board.step(player, *dir) else {
                    return false;
                };
                if !board.tile(box_pos).is_box() {
                    return false;
                }
                match board.step(box_pos, *dir) {
                    Some(dest) => board.tile(dest).is_free(),
                    None => false,
                }
            }
        }
    }

    /// Apply the action to the board.
    /// Panics if the action is not possible.
    pub fn perform(&self, board: &mut Board) {
        assert!(self.is_possible(board), "Illegal action: {}", self);

        let player = board.player();
        match self {
            Action::Move(dir) => {
                // Checked by is_possible
                let dest = board.step(player, *dir).unwrap();
                board.move_player(dest);
            }
            Action::Push(dir) => {
                let box_pos = board.step(player, *dir).unwrap();
                let dest = board.step(box_pos, *dir).unwrap();
                board.move_box(box_pos, dest);
                board.move_player(box_pos);
            }
        }
    }

    /// Reverse a previous `perform` of this action: step back for a move,
    /// pull the box back for a push.
    /// Panics if the reverse is not possible.
    pub fn undo(&self, board: &mut Board) {
        let player = board.player();
        let dir = self.direction();
        let prev = board
            .step_back(player, dir)
            .filter(|&pos| board.tile(pos).is_free());
        let Some(prev) = prev else {
            panic!("Cannot undo {}: no free cell behind the player", self);
        };

        match self {
            Action::Move(_) => board.move_player(prev),
            Action::Push(_) => {
                let box_pos = board.step(player, dir);
                let Some(box_pos) = box_pos.filter(|&pos| board.tile(pos).is_box()) else {
                    panic!("Cannot undo {}: no box in front of the player", self);
                };
                board.move_player(prev);
                board.move_box(box_pos, player);
            }
        }
    }

    /// All actions applicable to the board, moves first.
    pub fn legal_actions(board: &Board) -> ArrayVec<Action, 8> {
        ALL_ACTIONS
            .iter()
            .copied()
            .filter(|action| action.is_possible(board))
            .collect()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move(dir) => write!(f, "Move {}", dir),
            Action::Push(dir) => write!(f, "Push {}", dir),
        }
    }
}

/// Error returned when a direction sequence cannot be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    IllegalStep { index: usize, direction: Direction },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::IllegalStep { index, direction } => {
                write!(f, "Step {} ({}) is blocked", index + 1, direction)
            }
        }
    }
}

impl Error for ReplayError {}

/// Replay plain directions the way a game loop would: push when a box is in
/// the way and can move, otherwise walk. Returns the final board.
pub fn replay(board: &Board, directions: &[Direction]) -> Result<Board, ReplayError> {
    let mut board = board.clone();
    for (index, &direction) in directions.iter().enumerate() {
        let push = Action::Push(direction);
        let walk = Action::Move(direction);
        if push.is_possible(&board) {
            push.perform(&mut board);
        } else if walk.is_possible(&board) {
            walk.perform(&mut board);
        } else {
            return Err(ReplayError::IllegalStep { index, direction });
        }
    }
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ALL_DIRECTIONS, Position};

    #[test]
    fn test_move_basic() {
        let mut board = Board::from_text("#####\n#@  #\n#####").unwrap();
        let action = Action::Move(Direction::Right);
        assert!(action.is_possible(&board));
        action.perform(&mut board);
        assert_eq!(board.player(), Position(2, 1));
        assert!(board.tile(Position(2, 1)).is_player());
        assert!(board.tile(Position(1, 1)).is_free());
    }

    #[test]
    fn test_move_blocked() {
        let board = Board::from_text("#####\n#@$ #\n#####").unwrap();
        assert!(!Action::Move(Direction::Left).is_possible(&board));
        assert!(!Action::Move(Direction::Up).is_possible(&board));
        // Box in the way
        assert!(!Action::Move(Direction::Right).is_possible(&board));
    }

    #[test]
    fn test_move_off_grid() {
        let board = Board::from_text("@ ").unwrap();
        assert!(!Action::Move(Direction::Left).is_possible(&board));
        assert!(!Action::Move(Direction::Up).is_possible(&board));
        assert!(Action::Move(Direction::Right).is_possible(&board));
        assert!(!Action::Push(Direction::Left).is_possible(&board));
    }

    #[test]
    fn test_push_floor_to_goal() {
        let mut board = Board::from_text("#####\n#@$.#\n#####").unwrap();
        assert_eq!(board.boxes_in_place(), 0);

        let push = Action::Push(Direction::Right);
        assert!(push.is_possible(&board));
        push.perform(&mut board);

        assert!(board.tile(Position(3, 1)).is_box_in_place());
        assert!(!board.tile(Position(2, 1)).is_box());
        assert_eq!(board.player(), Position(2, 1));
        assert_eq!(board.boxes_in_place(), 1);
        assert!(board.is_victory());
    }

    #[test]
    fn test_push_goal_to_floor() {
        let mut board = Board::from_text("######\n#@*  #\n######").unwrap();
        assert!(board.is_victory());

        Action::Push(Direction::Right).perform(&mut board);

        assert!(board.tile(Position(2, 1)).is_goal());
        assert!(board.tile(Position(2, 1)).is_player());
        assert!(board.tile(Position(3, 1)).is_box());
        assert_eq!(board.boxes_in_place(), 0);
        assert!(!board.is_victory());
    }

    #[test]
    fn test_push_goal_to_goal() {
        let mut board = Board::from_text("######\n#@*.$#\n######").unwrap();
        assert_eq!(board.boxes_in_place(), 1);

        Action::Push(Direction::Right).perform(&mut board);

        assert!(board.tile(Position(3, 1)).is_box_in_place());
        assert_eq!(board.boxes_in_place(), 1);
    }

    #[test]
    fn test_push_all_directions() {
        let tests = vec![
            (Direction::Right, "####\n#@$ #\n# . #\n####", Position(3, 1)),
            (Direction::Down, "#####\n# @ #\n# $ #\n# . #\n#####", Position(2, 3)),
            (Direction::Left, "####\n# $@#\n# . #\n####", Position(1, 1)),
            (Direction::Up, "#####\n# . #\n# $ #\n# @ #\n#####", Position(2, 1)),
        ];

        for (direction, input, expected_box) in tests {
            let mut board = Board::from_text(input).unwrap();
            Action::Push(direction).perform(&mut board);
            assert!(
                board.tile(expected_box).is_box(),
                "Failed for {:?}",
                direction
            );
        }
    }

    #[test]
    fn test_push_blocked() {
        let wall = Board::from_text("#####\n#@$##\n#.  #\n#####").unwrap();
        assert!(!Action::Push(Direction::Right).is_possible(&wall));

        let two_boxes = Board::from_text("#######\n#@$$ ..#\n#######").unwrap();
        assert!(!Action::Push(Direction::Right).is_possible(&two_boxes));

        // Nothing to push
        let empty = Board::from_text("#####\n#@ .#\n#####").unwrap();
        assert!(!Action::Push(Direction::Right).is_possible(&empty));
    }

    #[test]
    #[should_panic(expected = "Illegal action")]
    fn test_perform_illegal() {
        let mut board = Board::from_text("#####\n#@$##\n#.  #\n#####").unwrap();
        Action::Push(Direction::Right).perform(&mut board);
    }

    #[test]
    fn test_undo_round_trip() {
        let input = "#######\n\
                     #     #\n\
                     #  $  #\n\
                     # $@$ #\n\
                     #  $  #\n\
                     #.... #\n\
                     #######";
        let original = Board::from_text(input).unwrap();

        for action in ALL_ACTIONS {
            let mut board = original.clone();
            if !action.is_possible(&board) {
                continue;
            }
            action.perform(&mut board);
            assert_ne!(board, original, "{} had no effect", action);
            action.undo(&mut board);
            assert_eq!(board, original, "Failed for {}", action);
        }
    }

    #[test]
    fn test_undo_push_restores_goal_count() {
        let original = Board::from_text("#####\n#@$.#\n#####").unwrap();
        let mut board = original.clone();
        let push = Action::Push(Direction::Right);
        push.perform(&mut board);
        assert!(board.is_victory());
        push.undo(&mut board);
        assert_eq!(board, original);
        assert_eq!(board.boxes_in_place(), 0);
    }

    #[test]
    #[should_panic(expected = "Cannot undo")]
    fn test_undo_without_room() {
        let mut board = Board::from_text("####\n#@ #\n####").unwrap();
        Action::Move(Direction::Right).undo(&mut board);
    }

    #[test]
    fn test_legal_actions_order() {
        let board = Board::from_text("######\n#    #\n# @$ #\n#   .#\n######").unwrap();
        let actions = Action::legal_actions(&board);
        assert_eq!(
            actions.as_slice(),
            &[
                Action::Move(Direction::Up),
                Action::Move(Direction::Down),
                Action::Move(Direction::Left),
                Action::Push(Direction::Right),
            ]
        );
    }

    #[test]
    fn test_costs() {
        let costs = CostModel::default();
        for dir in ALL_DIRECTIONS {
            assert_eq!(Action::Move(dir).cost(&costs), 1.0);
            assert_eq!(Action::Push(dir).cost(&costs), 1.1);
        }
        assert_eq!(Action::Push(Direction::Left).to_char(), 'L');
        assert_eq!(Action::Move(Direction::Up).to_char(), 'u');
    }

    #[test]
    fn test_replay() {
        let board = Board::from_text("######\n#@ $.#\n######").unwrap();
        let end = replay(&board, &[Direction::Right, Direction::Right]).unwrap();
        assert!(end.is_victory());
        assert_eq!(end.player(), Position(3, 1));
    }

    #[test]
    fn test_replay_blocked() {
        let board = Board::from_text("######\n#@ $.#\n######").unwrap();
        let err = replay(&board, &[Direction::Right, Direction::Up]).unwrap_err();
        assert_eq!(
            err,
            ReplayError::IllegalStep {
                index: 1,
                direction: Direction::Up
            }
        );
    }

    #[test]
    fn test_cost_model_validity() {
        assert!(CostModel::default().is_valid());
        let nan_push = CostModel {
            push_cost: f64::NAN,
            ..CostModel::default()
        };
        assert!(!nan_push.is_valid());
        let free_move = CostModel {
            move_cost: 0.0,
            ..CostModel::default()
        };
        assert!(!free_move.is_valid());
    }
}
