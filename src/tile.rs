use std::fmt;

/// Highest box number a tile can carry. Box number 0 means "some box" with
/// no particular identity.
pub const MAX_BOX_NUM: u8 = 6;

const SPACE_FREE: u16 = 1 << 0;
const SPACE_WALL: u16 = 1 << 1;
const ENTITY_PLAYER: u16 = 1 << 2;
const ENTITY_BOX: u16 = 1 << 3;
const BOX_NUM_SHIFT: u16 = 4;
const BOX_NUM_MASK: u16 = 0b111 << BOX_NUM_SHIFT;
const PLACE_ANY_BOX: u16 = 1 << 7;
const PLACE_SPECIFIC_BOX: u16 = 1 << 8;
const PLACE_NUM_SHIFT: u16 = 9;
const PLACE_NUM_MASK: u16 = 0b111 << PLACE_NUM_SHIFT;

const ENTITY_MASK: u16 = ENTITY_PLAYER | ENTITY_BOX | BOX_NUM_MASK;
const PLACE_MASK: u16 = PLACE_ANY_BOX | PLACE_SPECIFIC_BOX | PLACE_NUM_MASK;

/// Flags for a single board cell.
///
/// A tile combines exactly one space flag (free or wall), at most one
/// occupant (player or box, optionally numbered) and an optional goal
/// marking (for any box, or for one box number).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile(u16);

impl Tile {
    pub const FLOOR: Tile = Tile(SPACE_FREE);
    pub const WALL: Tile = Tile(SPACE_WALL);
    pub const GOAL: Tile = Tile(SPACE_FREE | PLACE_ANY_BOX);
    pub const BOX: Tile = Tile(SPACE_FREE | ENTITY_BOX);
    pub const BOX_ON_GOAL: Tile = Tile(SPACE_FREE | ENTITY_BOX | PLACE_ANY_BOX);
    pub const PLAYER: Tile = Tile(SPACE_FREE | ENTITY_PLAYER);
    pub const PLAYER_ON_GOAL: Tile = Tile(SPACE_FREE | ENTITY_PLAYER | PLACE_ANY_BOX);

    /// A floor tile holding box number `num` (1..=6).
    pub fn numbered_box(num: u8) -> Tile {
        assert!(
            (1..=MAX_BOX_NUM).contains(&num),
            "box number must be in 1..={}",
            MAX_BOX_NUM
        );
        Tile(SPACE_FREE | ENTITY_BOX | ((num as u16) << BOX_NUM_SHIFT))
    }

    /// A floor tile marked as the goal of box number `num` (1..=6).
    pub fn numbered_goal(num: u8) -> Tile {
        assert!(
            (1..=MAX_BOX_NUM).contains(&num),
            "goal number must be in 1..={}",
            MAX_BOX_NUM
        );
        Tile(SPACE_FREE | PLACE_SPECIFIC_BOX | ((num as u16) << PLACE_NUM_SHIFT))
    }

    pub fn is_wall(self) -> bool {
        self.0 & SPACE_WALL != 0
    }

    /// Walkable floor with no occupant.
    pub fn is_free(self) -> bool {
        self.0 & SPACE_FREE != 0 && self.0 & ENTITY_MASK == 0
    }

    pub fn is_player(self) -> bool {
        self.0 & ENTITY_PLAYER != 0
    }

    pub fn is_box(self) -> bool {
        self.0 & ENTITY_BOX != 0
    }

    /// Box number of the occupant, 0 for an anonymous box. Only meaningful
    /// when [`Tile::is_box`] holds.
    pub fn box_num(self) -> u8 {
        ((self.0 & BOX_NUM_MASK) >> BOX_NUM_SHIFT) as u8
    }

    /// True if this cell is a goal for some box, regardless of identity.
    pub fn is_goal(self) -> bool {
        self.0 & (PLACE_ANY_BOX | PLACE_SPECIFIC_BOX) != 0
    }

    /// Goal number, 0 for a goal that accepts any box.
    pub fn goal_num(self) -> u8 {
        ((self.0 & PLACE_NUM_MASK) >> PLACE_NUM_SHIFT) as u8
    }

    /// True if a box numbered `box_num` counts as placed on this cell.
    pub fn accepts(self, box_num: u8) -> bool {
        if self.0 & PLACE_ANY_BOX != 0 {
            return true;
        }
        self.0 & PLACE_SPECIFIC_BOX != 0 && (box_num == 0 || box_num == self.goal_num())
    }

    /// True if the cell holds a box sitting on a goal that accepts it.
    pub fn is_box_in_place(self) -> bool {
        self.is_box() && self.accepts(self.box_num())
    }

    /// The same tile with its occupant removed.
    pub fn without_occupant(self) -> Tile {
        Tile(self.0 & !ENTITY_MASK)
    }

    /// The same tile with the player added.
    pub fn with_player(self) -> Tile {
        debug_assert!(self.is_free(), "player placed on an occupied tile");
        Tile(self.0 | ENTITY_PLAYER)
    }

    /// The same tile with the occupant of `other` (a box tile) added.
    pub fn with_box_from(self, other: Tile) -> Tile {
        debug_assert!(self.is_free(), "box placed on an occupied tile");
        Tile(self.0 | (other.0 & (ENTITY_BOX | BOX_NUM_MASK)))
    }

    /// Checks the invariants of a single tile: exactly one space flag, walls
    /// carry nothing else, at most one occupant and at most one goal kind.
    pub fn is_well_formed(self) -> bool {
        let free = self.0 & SPACE_FREE != 0;
        let wall = self.0 & SPACE_WALL != 0;
        if free == wall {
            return false;
        }
        if wall {
            return self.0 & (ENTITY_MASK | PLACE_MASK) == 0;
        }
        if self.is_player() && self.is_box() {
            return false;
        }
        if !self.is_box() && self.0 & BOX_NUM_MASK != 0 {
            return false;
        }
        if self.0 & PLACE_ANY_BOX != 0 && self.0 & PLACE_SPECIFIC_BOX != 0 {
            return false;
        }
        if self.0 & PLACE_SPECIFIC_BOX != 0 {
            return (1..=MAX_BOX_NUM).contains(&self.goal_num());
        }
        self.0 & PLACE_NUM_MASK == 0
    }

    /// XSB character for the tile. Numbered boxes and goals have no XSB
    /// glyph and render as plain boxes and goals.
    pub fn to_char(self) -> char {
        if self.is_wall() {
            '#'
        } else if self.is_player() {
            if self.is_goal() { '+' } else { '@' }
        } else if self.is_box() {
            if self.is_goal() { '*' } else { '$' }
        } else if self.is_goal() {
            '.'
        } else {
            ' '
        }
    }

    /// Parse a single XSB character.
    pub fn from_char(ch: char) -> Option<Tile> {
        match ch {
            '#' => Some(Tile::WALL),
            ' ' | '-' | '_' => Some(Tile::FLOOR),
            '.' => Some(Tile::GOAL),
            '$' => Some(Tile::BOX),
            '*' => Some(Tile::BOX_ON_GOAL),
            '@' => Some(Tile::PLAYER),
            '+' => Some(Tile::PLAYER_ON_GOAL),
            _ => None,
        }
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile({:?}", self.to_char())?;
        if self.is_box() && self.box_num() != 0 {
            write!(f, ", box #{}", self.box_num())?;
        }
        if self.goal_num() != 0 {
            write!(f, ", goal #{}", self.goal_num())?;
        }
        write!(f, ")")
    }
}
