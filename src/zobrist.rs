use crate::{
    board::{Board, MAX_SIZE, Position},
    tile::MAX_BOX_NUM,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Zobrist hash for board states
pub struct Zobrist {
    /// One table per box number (0 = anonymous box).
    box_hashes: Vec<[[u64; MAX_SIZE]; MAX_SIZE]>,
    player_hashes: [[u64; MAX_SIZE]; MAX_SIZE],
}

impl Zobrist {
    pub fn new() -> Self {
        // Use a seeded PRNG for reproducible Zobrist hashes
        let mut rng = ChaCha8Rng::seed_from_u64(0x123456789abcdef0);

        let mut box_hashes = Vec::with_capacity(MAX_BOX_NUM as usize + 1);
        for _ in 0..=MAX_BOX_NUM {
            let mut table = [[0u64; MAX_SIZE]; MAX_SIZE];
            for row in table.iter_mut() {
                for cell in row.iter_mut() {
                    *cell = rng.next_u64();
                }
            }
            box_hashes.push(table);
        }

        let mut player_hashes = [[0u64; MAX_SIZE]; MAX_SIZE];
        for row in player_hashes.iter_mut() {
            for cell in row.iter_mut() {
                *cell = rng.next_u64();
            }
        }

        Zobrist {
            box_hashes,
            player_hashes,
        }
    }

    /// Get hash value for a box with the given number at a specific position
    pub fn box_hash(&self, pos: Position, box_num: u8) -> u64 {
        self.box_hashes[box_num as usize][pos.1 as usize][pos.0 as usize]
    }

    /// Get hash value for player position
    pub fn player_hash(&self, pos: Position) -> u64 {
        self.player_hashes[pos.1 as usize][pos.0 as usize]
    }

    /// Compute hash for all boxes on a board
    pub fn compute_boxes_hash(&self, board: &Board) -> u64 {
        let mut boxes_hash = 0u64;
        for pos in board.box_positions() {
            boxes_hash ^= self.box_hash(pos, board.tile(pos).box_num());
        }
        boxes_hash
    }

    /// Compute the hash for a board state (boxes hash XOR player position hash)
    pub fn compute_hash(&self, board: &Board) -> u64 {
        self.compute_boxes_hash(board) ^ self.player_hash(board.player())
    }
}

impl Default for Zobrist {
    fn default() -> Self {
        Self::new()
    }
}
