use std::cell::Cell;
use std::error::Error;
use std::fmt;

use crate::tile::Tile;
use crate::zobrist::Zobrist;

pub const MAX_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(pub u8, pub u8);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    pub fn delta(&self) -> (i8, i8) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Single-letter LURD notation (lowercase).
    pub fn to_char(&self) -> char {
        match self {
            Direction::Up => 'u',
            Direction::Down => 'd',
            Direction::Left => 'l',
            Direction::Right => 'r',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

/// Error type for board construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    Empty,
    TooLarge { width: usize, height: usize },
    TileCount { expected: usize, actual: usize },
    InvalidCharacter { ch: char, x: usize, y: usize },
    MalformedTile { x: usize, y: usize },
    NoPlayer,
    MultiplePlayers,
    PlayerBlocked(Position),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::Empty => write!(f, "Empty board"),
            BoardError::TooLarge { width, height } => write!(
                f,
                "Board size {}x{} exceeds maximum size {}x{}",
                width, height, MAX_SIZE, MAX_SIZE
            ),
            BoardError::TileCount { expected, actual } => {
                write!(f, "Expected {} tiles, got {}", expected, actual)
            }
            BoardError::InvalidCharacter { ch, x, y } => {
                write!(f, "Invalid character '{}' at position ({}, {})", ch, x, y)
            }
            BoardError::MalformedTile { x, y } => {
                write!(f, "Malformed tile at position ({}, {})", x, y)
            }
            BoardError::NoPlayer => write!(f, "No player found on board"),
            BoardError::MultiplePlayers => write!(f, "Multiple players found"),
            BoardError::PlayerBlocked(pos) => {
                write!(f, "Player position {} is out of bounds or blocked", pos)
            }
        }
    }
}

impl Error for BoardError {}

/// A Sokoban position: the grid, the player and box bookkeeping.
///
/// Tiles live in one row-major buffer so that cloning a board is a single
/// contiguous copy. Every search node owns its own board; boards are only
/// mutated through actions.
#[derive(Clone)]
pub struct Board {
    tiles: Vec<Tile>,
    width: u8,
    height: u8,
    player: Position,
    box_count: u16,
    boxes_in_place: u16,
    hash: Cell<Option<u64>>,
}

impl Board {
    /// Build a board from a row-major grid of tiles and a player position.
    ///
    /// The player flag is placed on `player`; no other tile may carry it.
    pub fn new(
        width: usize,
        height: usize,
        tiles: Vec<Tile>,
        player: Position,
    ) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::Empty);
        }
        if width > MAX_SIZE || height > MAX_SIZE {
            return Err(BoardError::TooLarge { width, height });
        }
        if tiles.len() != width * height {
            return Err(BoardError::TileCount {
                expected: width * height,
                actual: tiles.len(),
            });
        }

        let mut tiles = tiles;
        let mut box_count = 0u16;
        let mut boxes_in_place = 0u16;

        for (i, tile) in tiles.iter_mut().enumerate() {
            let (x, y) = (i % width, i / width);
            if !tile.is_well_formed() {
                return Err(BoardError::MalformedTile { x, y });
            }
            if tile.is_player() {
                if (x, y) != (player.0 as usize, player.1 as usize) {
                    return Err(BoardError::MultiplePlayers);
                }
                *tile = tile.without_occupant();
            }
            if tile.is_box() {
                box_count += 1;
                if tile.is_box_in_place() {
                    boxes_in_place += 1;
                }
            }
        }

        let (px, py) = (player.0 as usize, player.1 as usize);
        if px >= width || py >= height || !tiles[py * width + px].is_free() {
            return Err(BoardError::PlayerBlocked(player));
        }
        tiles[py * width + px] = tiles[py * width + px].with_player();

        Ok(Board {
            tiles,
            width: width as u8,
            height: height as u8,
            player,
            box_count,
            boxes_in_place,
            hash: Cell::new(None),
        })
    }

    /// Parse a Sokoban board from text format.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - ` `, `-` or `_` = Floor (empty space)
    /// - `.` = Goal (target location for boxes)
    /// - `$` = Box
    /// - `@` = Player
    /// - `*` = Box on goal
    /// - `+` = Player on goal
    ///
    /// Short lines are padded with floor.
    pub fn from_text(text: &str) -> Result<Self, BoardError> {
        let lines: Vec<&str> = text.lines().collect();

        if lines.is_empty() {
            return Err(BoardError::Empty);
        }

        let height = lines.len();
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        if width > MAX_SIZE || height > MAX_SIZE {
            return Err(BoardError::TooLarge { width, height });
        }

        let mut tiles = vec![Tile::FLOOR; width * height];
        let mut player = None;

        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                let tile = Tile::from_char(ch).ok_or(BoardError::InvalidCharacter { ch, x, y })?;
                if tile.is_player() {
                    if player.is_some() {
                        return Err(BoardError::MultiplePlayers);
                    }
                    player = Some(Position(x as u8, y as u8));
                }
                tiles[y * width + x] = tile;
            }
        }

        let player = player.ok_or(BoardError::NoPlayer)?;
        Self::new(width, height, tiles, player)
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn box_count(&self) -> usize {
        self.box_count as usize
    }

    pub fn boxes_in_place(&self) -> usize {
        self.boxes_in_place as usize
    }

    /// Row-major index of an in-bounds position.
    pub fn index(&self, pos: Position) -> usize {
        assert!(
            pos.0 < self.width && pos.1 < self.height,
            "position {} out of bounds",
            pos
        );
        pos.1 as usize * self.width as usize + pos.0 as usize
    }

    pub fn tile(&self, pos: Position) -> Tile {
        self.tiles[self.index(pos)]
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Move from `pos` one step in the given direction.
    /// Returns None if the step leaves the board.
    pub fn step(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        let x = pos.0 as i32 + dx as i32;
        let y = pos.1 as i32 + dy as i32;
        if self.in_bounds(x, y) {
            Some(Position(x as u8, y as u8))
        } else {
            None
        }
    }

    /// Move from `pos` one step against the given direction.
    pub fn step_back(&self, pos: Position, dir: Direction) -> Option<Position> {
        self.step(pos, dir.reverse())
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position(x, y)))
    }

    pub fn box_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(move |&pos| self.tile(pos).is_box())
    }

    pub fn goal_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(move |&pos| self.tile(pos).is_goal())
    }

    /// Check if all boxes are placed (win condition)
    pub fn is_victory(&self) -> bool {
        self.boxes_in_place == self.box_count
    }

    /// Relocate the player to an adjacent free tile.
    pub(crate) fn move_player(&mut self, to: Position) {
        let from = self.player;
        let from_idx = self.index(from);
        let to_idx = self.index(to);
        assert!(
            self.tiles[to_idx].is_free(),
            "Cannot move player to {}: destination blocked",
            to
        );
        self.tiles[from_idx] = self.tiles[from_idx].without_occupant();
        self.tiles[to_idx] = self.tiles[to_idx].with_player();
        self.player = to;
        self.invalidate_hash();
    }

    /// Relocate a box to a free tile, keeping the in-place count current.
    pub(crate) fn move_box(&mut self, from: Position, to: Position) {
        let from_idx = self.index(from);
        let to_idx = self.index(to);
        let source = self.tiles[from_idx];
        assert!(source.is_box(), "No box at {}", from);
        assert!(
            self.tiles[to_idx].is_free(),
            "Cannot push box to {}: destination blocked",
            to
        );

        if source.is_box_in_place() {
            self.boxes_in_place -= 1;
        }
        let dest = self.tiles[to_idx].with_box_from(source);
        if dest.is_box_in_place() {
            self.boxes_in_place += 1;
        }

        self.tiles[from_idx] = source.without_occupant();
        self.tiles[to_idx] = dest;
        self.invalidate_hash();
    }

    /// Zobrist hash of the state, computed on first use and cached until the
    /// board is next mutated.
    pub fn state_hash(&self, zobrist: &Zobrist) -> u64 {
        if let Some(hash) = self.hash.get() {
            return hash;
        }
        let hash = zobrist.compute_hash(self);
        self.hash.set(Some(hash));
        hash
    }

    pub fn invalidate_hash(&self) {
        self.hash.set(None);
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.player == other.player
            && self.box_count == other.box_count
            && self.boxes_in_place == other.boxes_in_place
            && self.tiles == other.tiles
    }
}

impl Eq for Board {}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Board {}x{} player={} boxes={}/{}",
            self.width, self.height, self.player, self.boxes_in_place, self.box_count
        )?;
        write!(f, "{}", self)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            let line: String = (0..self.width)
                .map(|x| self.tile(Position(x, y)).to_char())
                .collect();
            // Trim trailing spaces to match original input format
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_board() {
        let input = "####\n\
                     # .#\n\
                     #  ###\n\
                     #*@  #\n\
                     #  $ #\n\
                     #  ###\n\
                     ####";
        let board = Board::from_text(input).unwrap();

        assert_eq!(board.width(), 6);
        assert_eq!(board.height(), 7);
        assert_eq!(board.player(), Position(2, 3));
        assert_eq!(board.box_count(), 2);
        assert_eq!(board.boxes_in_place(), 1);
        assert!(!board.is_victory());
    }

    #[test]
    fn test_no_player() {
        let input = "####\n\
                     #  #\n\
                     ####";
        assert_eq!(Board::from_text(input).unwrap_err(), BoardError::NoPlayer);
    }

    #[test]
    fn test_multiple_players() {
        let input = "####\n\
                     #@@#\n\
                     ####";
        assert_eq!(
            Board::from_text(input).unwrap_err(),
            BoardError::MultiplePlayers
        );
    }

    #[test]
    fn test_invalid_character() {
        let input = "####\n\
                     #@x#\n\
                     ####";
        assert_eq!(
            Board::from_text(input).unwrap_err(),
            BoardError::InvalidCharacter { ch: 'x', x: 2, y: 1 }
        );
    }

    #[test]
    fn test_player_on_goal() {
        let input = "####\n\
                     #$+ #\n\
                     #$. #\n\
                     ####";
        let board = Board::from_text(input).unwrap();
        assert_eq!(board.player(), Position(2, 1));
        assert!(board.tile(Position(2, 1)).is_goal());
        assert!(board.tile(Position(2, 1)).is_player());
    }

    #[test]
    fn test_display() {
        let input = "####\n\
                     # .#\n\
                     #  ###\n\
                     #*@  #\n\
                     #  $ #\n\
                     #  ###\n\
                     ####";
        let board = Board::from_text(input).unwrap();
        let output = board.to_string();
        assert_eq!(output.trim(), input);
    }

    #[test]
    fn test_zero_boxes_is_victory() {
        let board = Board::from_text("#####\n#@ .#\n#####").unwrap();
        assert_eq!(board.box_count(), 0);
        assert!(board.is_victory());
    }

    #[test]
    fn test_unbalanced_boxes_and_goals() {
        // More goals than boxes is fine as long as every box is placed
        let board = Board::from_text("#####\n#*@.#\n#####").unwrap();
        assert!(board.is_victory());

        let board = Board::from_text("#####\n#$@.#\n#####").unwrap();
        assert!(!board.is_victory());
    }

    #[test]
    fn test_new_from_tiles() {
        let tiles = vec![
            Tile::WALL,
            Tile::numbered_goal(1),
            Tile::numbered_box(2),
            Tile::FLOOR,
            Tile::WALL,
        ];
        let board = Board::new(5, 1, tiles, Position(3, 0)).unwrap();
        assert_eq!(board.player(), Position(3, 0));
        assert!(board.tile(Position(3, 0)).is_player());
        assert_eq!(board.box_count(), 1);
        assert_eq!(board.boxes_in_place(), 0);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(
            Board::new(2, 2, vec![Tile::FLOOR; 3], Position(0, 0)).unwrap_err(),
            BoardError::TileCount {
                expected: 4,
                actual: 3
            }
        );
        assert_eq!(
            Board::new(2, 1, vec![Tile::WALL, Tile::FLOOR], Position(0, 0)).unwrap_err(),
            BoardError::PlayerBlocked(Position(0, 0))
        );
        assert_eq!(
            Board::new(2, 1, vec![Tile::FLOOR, Tile::FLOOR], Position(5, 0)).unwrap_err(),
            BoardError::PlayerBlocked(Position(5, 0))
        );
        assert_eq!(
            Board::new(2, 1, vec![Tile::PLAYER, Tile::FLOOR], Position(1, 0)).unwrap_err(),
            BoardError::MultiplePlayers
        );
        assert_eq!(
            Board::new(0, 0, vec![], Position(0, 0)).unwrap_err(),
            BoardError::Empty
        );
    }

    #[test]
    fn test_too_large() {
        let row = "#".repeat(MAX_SIZE + 1);
        let input = format!("{}\n#@#", row);
        assert!(matches!(
            Board::from_text(&input),
            Err(BoardError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_step_bounds() {
        let board = Board::from_text("###\n#@#\n###").unwrap();
        assert_eq!(board.step(Position(0, 0), Direction::Up), None);
        assert_eq!(board.step(Position(0, 0), Direction::Left), None);
        assert_eq!(
            board.step(Position(1, 1), Direction::Down),
            Some(Position(1, 2))
        );
        assert_eq!(board.step(Position(2, 2), Direction::Right), None);
        assert_eq!(
            board.step_back(Position(1, 1), Direction::Right),
            Some(Position(0, 1))
        );
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_tile_out_of_bounds() {
        let board = Board::from_text("###\n#@#\n###").unwrap();
        board.tile(Position(3, 0));
    }

    #[test]
    fn test_clone_is_independent() {
        let board = Board::from_text("#####\n#@$.#\n#####").unwrap();
        let mut clone = board.clone();
        clone.move_box(Position(2, 1), Position(3, 1));
        clone.move_player(Position(2, 1));

        assert!(clone.is_victory());
        assert!(!board.is_victory());
        assert_eq!(board.player(), Position(1, 1));
        assert!(board.tile(Position(2, 1)).is_box());
        assert_ne!(board, clone);
    }

    #[test]
    fn test_box_and_goal_positions() {
        let board = Board::from_text("######\n#@$.*#\n######").unwrap();
        let boxes: Vec<_> = board.box_positions().collect();
        let goals: Vec<_> = board.goal_positions().collect();
        assert_eq!(boxes, vec![Position(2, 1), Position(4, 1)]);
        assert_eq!(goals, vec![Position(3, 1), Position(4, 1)]);
    }

    #[test]
    fn test_hash_cache_invalidated_on_mutation() {
        let zobrist = Zobrist::new();
        let board = Board::from_text("######\n#@$ .#\n######").unwrap();
        let before = board.state_hash(&zobrist);
        assert_eq!(board.state_hash(&zobrist), before);

        let mut moved = board.clone();
        moved.move_box(Position(2, 1), Position(3, 1));
        moved.move_player(Position(2, 1));
        assert_ne!(moved.state_hash(&zobrist), before);
        assert_eq!(moved.state_hash(&zobrist), zobrist.compute_hash(&moved));
    }
}
