use std::fmt;
use std::str::FromStr;
use bitvec::{prelude::*, slice::IterOnes};
use lazy_static::lazy_static;
use serde::ser::{Serialize, Serializer};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use crate::error::GameError;

pub const FILES: usize = 8;
pub const RANKS: usize = 8;
const B: usize = FILES * RANKS;
pub type BitBoard = BitArr!(for B, in u64, Lsb0);
// bit index = rank * 8 + file, so a1 is bit 0 and h8 is bit 63

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Square(u8);

impl Square {
    pub fn new(file: usize, rank: usize) -> Self {
        debug_assert!(file < FILES && rank < RANKS);
        Square((rank * FILES + file) as u8)
    }

    pub fn from_index(idx: usize) -> Self {
        debug_assert!(idx < B);
        Square(idx as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn file(self) -> usize {
        self.index() % FILES
    }

    pub fn rank(self) -> usize {
        self.index() / FILES
    }

    /// The square `df` files and `dr` ranks away, if it is still on the board.
    pub fn offset(self, df: i32, dr: i32) -> Option<Square> {
        let file = self.file() as i32 + df;
        let rank = self.rank() as i32 + dr;
        if (0..FILES as i32).contains(&file) && (0..RANKS as i32).contains(&rank) {
            Some(Square::new(file as usize, rank as usize))
        } else {
            None
        }
    }

    /// Light and dark squares, as 0 or 1.
    pub fn shade(self) -> usize {
        (self.file() + self.rank()) % 2
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file() as u8) as char, self.rank() + 1)
    }
}

impl FromStr for Square {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [file @ b'a'..=b'h', rank @ b'1'..=b'8'] => {
                Ok(Square::new((file - b'a') as usize, (rank - b'1') as usize))
            }
            _ => Err(GameError::InvalidSquare(s.to_string())),
        }
    }
}

impl Serialize for Square {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.collect_str(self)
    }
}

struct SquareVisitor;
impl<'de> Visitor<'de> for SquareVisitor {
    type Value = Square;
    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a square in algebraic notation such as \"e4\"")
    }
    fn visit_str<E>(self, value: &str) -> Result<Square, E> where E: de::Error {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        deserializer.deserialize_str(SquareVisitor)
    }
}

pub trait BitArr2D {
    fn empty() -> Self;
    fn set_square(&mut self, square: Square, value: bool);
    type IterSquares<'a>: Iterator<Item=Square> + 'a where Self: 'a;
    fn iter_squares(&'_ self) -> Self::IterSquares<'_>;
}

impl BitArr2D for BitBoard {
    fn empty() -> Self {
        bitarr!(u64, Lsb0; 0; B)
    }

    fn set_square(&mut self, square: Square, value: bool) {
        self.set(square.index(), value);
    }

    type IterSquares<'a> = std::iter::Map<IterOnes<'a, u64, Lsb0>, fn(usize) -> Square>;

    fn iter_squares(&'_ self) -> Self::IterSquares<'_> {
        self.iter_ones().map(Square::from_index as fn(usize) -> Square)
    }
}

const KNIGHT_STEPS: [(i32, i32); 8] = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_STEPS: [(i32, i32); 8] = [(0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1)];
pub const ROOK_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
pub const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];
pub const QUEEN_DIRECTIONS: [(i32, i32); 8] = [(0, 1), (1, 0), (0, -1), (-1, 0), (1, 1), (1, -1), (-1, -1), (-1, 1)];

fn step_attacks(steps: &[(i32, i32)]) -> Vec<BitBoard> {
    (0..B).map(|idx| {
        let from = Square::from_index(idx);
        let mut attacks = BitBoard::empty();
        for &(df, dr) in steps {
            if let Some(to) = from.offset(df, dr) {
                attacks.set_square(to, true);
            }
        }
        attacks
    }).collect()
}

lazy_static! {
    pub static ref KNIGHT_ATTACKS: Vec<BitBoard> = step_attacks(&KNIGHT_STEPS);
    pub static ref KING_ATTACKS: Vec<BitBoard> = step_attacks(&KING_STEPS);
}
