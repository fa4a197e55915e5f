use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::{GameError, GameResult};
use crate::square::{
    BitArr2D, BitBoard, Square, FILES, RANKS,
    BISHOP_DIRECTIONS, KING_ATTACKS, KNIGHT_ATTACKS, QUEEN_DIRECTIONS, ROOK_DIRECTIONS,
};

pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// +1 for White, -1 for Black.
    pub fn pawn_direction(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn back_rank(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => RANKS - 1,
        }
    }

    pub fn pawn_rank(self) -> usize {
        match self {
            Color::White => 1,
            Color::Black => RANKS - 2,
        }
    }

    fn fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "p")]
    Pawn,
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "k")]
    King,
}

const PROMOTIONS: [PieceKind; 4] = [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];
const BACK_RANK: [PieceKind; FILES] = [
    PieceKind::Rook, PieceKind::Knight, PieceKind::Bishop, PieceKind::Queen,
    PieceKind::King, PieceKind::Bishop, PieceKind::Knight, PieceKind::Rook,
];

impl PieceKind {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    fn from_fen_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        PieceKind::from_char(c).map(|kind| Piece::new(kind, color))
    }

    fn fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.to_char().to_ascii_uppercase(),
            Color::Black => self.kind.to_char(),
        }
    }
}

/// Castling is the king's two-square move; en passant is a pawn's diagonal
/// move onto the en-passant target square.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to, promotion: None }
    }

    pub fn promoting(from: Square, to: Square, kind: PieceKind) -> Self {
        Self { from, to, promotion: Some(kind) }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.to_char())?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    const WHITE_KINGSIDE: u8 = 1;
    const WHITE_QUEENSIDE: u8 = 2;
    const BLACK_KINGSIDE: u8 = 4;
    const BLACK_QUEENSIDE: u8 = 8;
    const ALL: CastlingRights = CastlingRights(15);

    fn kingside(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    fn queenside(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    fn has(self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    fn remove(&mut self, mask: u8) {
        self.0 &= !mask;
    }

    /// Rights that are lost once anything moves from or onto `square`.
    fn lost_at(square: Square) -> u8 {
        match (square.file(), square.rank()) {
            (0, 0) => Self::WHITE_QUEENSIDE,
            (7, 0) => Self::WHITE_KINGSIDE,
            (4, 0) => Self::WHITE_KINGSIDE | Self::WHITE_QUEENSIDE,
            (0, 7) => Self::BLACK_QUEENSIDE,
            (7, 7) => Self::BLACK_KINGSIDE,
            (4, 7) => Self::BLACK_KINGSIDE | Self::BLACK_QUEENSIDE,
            _ => 0,
        }
    }

    fn to_fen(self) -> String {
        let fen: String = [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ].iter().filter(|(mask, _)| self.has(*mask)).map(|(_, c)| *c).collect();
        if fen.is_empty() { "-".to_string() } else { fen }
    }

    fn from_fen(field: &str) -> GameResult<Self> {
        let mut rights = CastlingRights(0);
        if field == "-" {
            return Ok(rights);
        }
        for c in field.chars() {
            rights.0 |= match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => return Err(GameError::invalid_fen(format!("bad castling field {:?}", field))),
            };
        }
        Ok(rights)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    Checkmate { winner: Color },
    Draw(DrawReason),
}

impl Outcome {
    pub fn winner(self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } => Some(winner),
            Outcome::Draw(_) => None,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Outcome::Checkmate { .. } => "checkmate",
            Outcome::Draw(DrawReason::Stalemate) => "stalemate",
            Outcome::Draw(DrawReason::InsufficientMaterial) => "insufficient_material",
            Outcome::Draw(DrawReason::FiftyMoveRule) => "fifty_move_rule",
            Outcome::Draw(DrawReason::ThreefoldRepetition) => "threefold_repetition",
        }
    }
}

/// Everything `apply` changed, so that `undo` can restore the exact prior board.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Undo {
    mv: Move,
    moved: Piece,
    captured: Option<(Square, Piece)>,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
}

/// The part of a position that decides repetitions.
#[derive(Clone, PartialEq, Eq, Debug)]
struct PositionKey {
    squares: [Option<Piece>; FILES * RANKS],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Board {
    squares: [Option<Piece>; FILES * RANKS],
    color_squares: [BitBoard; 2],
    pub side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<PositionKey>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        let mut board = Self::empty();
        for (file, kind) in BACK_RANK.iter().enumerate() {
            for color in [Color::White, Color::Black] {
                board.place_piece(Square::new(file, color.back_rank()), Piece::new(*kind, color));
                board.place_piece(Square::new(file, color.pawn_rank()), Piece::new(PieceKind::Pawn, color));
            }
        }
        board.castling = CastlingRights::ALL;
        board
    }

    fn empty() -> Self {
        Self {
            squares: [None; FILES * RANKS],
            color_squares: [BitBoard::empty(); 2],
            side_to_move: Color::White,
            castling: CastlingRights::default(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> GameResult<Self> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(GameError::invalid_fen(format!("expected 4 to 6 fields, got {}", fields.len())));
        }
        let mut board = Self::empty();

        let rows: Vec<&str> = fields[0].split('/').collect();
        if rows.len() != RANKS {
            return Err(GameError::invalid_fen(format!("expected {} ranks, got {}", RANKS, rows.len())));
        }
        for (row, text) in rows.iter().enumerate() {
            let rank = RANKS - 1 - row;
            let mut file = 0;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| GameError::invalid_fen(format!("bad piece {:?}", c)))?;
                    if file >= FILES {
                        return Err(GameError::invalid_fen(format!("rank {} is too long", rank + 1)));
                    }
                    board.place_piece(Square::new(file, rank), piece);
                    file += 1;
                }
            }
            if file != FILES {
                return Err(GameError::invalid_fen(format!("rank {} has {} files", rank + 1, file)));
            }
        }
        for color in [Color::White, Color::Black] {
            if board.king_square(color).is_none() {
                return Err(GameError::invalid_fen(format!("{:?} has no king", color)));
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(GameError::invalid_fen(format!("bad side to move {:?}", other))),
        };
        board.castling = CastlingRights::from_fen(fields[2])?;
        board.en_passant = match fields[3] {
            "-" => None,
            square => Some(square.parse().map_err(|_| GameError::invalid_fen(format!("bad en passant square {:?}", square)))?),
        };
        if let Some(clock) = fields.get(4) {
            board.halfmove_clock = clock.parse().map_err(|_| GameError::invalid_fen("bad halfmove clock"))?;
        }
        if let Some(number) = fields.get(5) {
            board.fullmove_number = number.parse().map_err(|_| GameError::invalid_fen("bad fullmove number"))?;
        }
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..RANKS).rev() {
            let mut empty = 0;
            for file in 0..FILES {
                match self.squares[Square::new(file, rank).index()] {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }
        let en_passant = self.en_passant.map_or_else(|| "-".to_string(), |sq| sq.to_string());
        format!(
            "{} {} {} {} {} {}",
            placement,
            self.side_to_move.fen_char(),
            self.castling.to_fen(),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number,
        )
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    /// Every occupied square with its piece, in ascending square order.
    pub fn pieces(&'_ self) -> impl Iterator<Item=(Square, Piece)> + '_ {
        self.squares.iter().enumerate()
            .filter_map(|(idx, piece)| piece.map(|piece| (Square::from_index(idx), piece)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.color_squares[color.index()].iter_squares()
            .find(|sq| matches!(self.piece_at(*sq), Some(p) if p.kind == PieceKind::King))
    }

    fn place_piece(&mut self, square: Square, piece: Piece) {
        self.squares[square.index()] = Some(piece);
        self.color_squares[piece.color.index()].set_square(square, true);
    }

    fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let piece = self.squares[square.index()].take();
        if let Some(p) = piece {
            self.color_squares[p.color.index()].set_square(square, false);
        }
        piece
    }

    fn key(&self) -> PositionKey {
        PositionKey {
            squares: self.squares,
            side_to_move: self.side_to_move,
            castling: self.castling,
            en_passant: self.capturable_en_passant(),
        }
    }

    /// The en-passant square, only while a pawn of the side to move stands
    /// next to the pawn that just pushed.
    fn capturable_en_passant(&self) -> Option<Square> {
        let target = self.en_passant?;
        let us = self.side_to_move;
        let pawn = Some(Piece::new(PieceKind::Pawn, us));
        [-1, 1].into_iter()
            .filter_map(|df| target.offset(df, -us.pawn_direction()))
            .any(|from| self.piece_at(from) == pawn)
            .then_some(target)
    }

    pub fn is_check(&self) -> bool {
        self.king_square(self.side_to_move)
            .map_or(false, |king| is_attacked(&self.squares, king, self.side_to_move.opposite()))
    }

    /// Legal moves for the side to move, in generation order: pieces by
    /// ascending square, then per piece pushes/captures or ascending targets.
    pub fn legal_moves(&self) -> Vec<Move> {
        let us = self.side_to_move;
        let mut moves = Vec::with_capacity(48);
        for from in self.color_squares[us.index()].iter_squares() {
            let Some(piece) = self.piece_at(from) else { continue };
            match piece.kind {
                PieceKind::Pawn => self.pawn_moves(from, us, &mut moves),
                PieceKind::Knight => self.step_moves(from, &KNIGHT_ATTACKS[from.index()], us, &mut moves),
                PieceKind::Bishop => self.slide_moves(from, &BISHOP_DIRECTIONS, us, &mut moves),
                PieceKind::Rook => self.slide_moves(from, &ROOK_DIRECTIONS, us, &mut moves),
                PieceKind::Queen => self.slide_moves(from, &QUEEN_DIRECTIONS, us, &mut moves),
                PieceKind::King => {
                    self.step_moves(from, &KING_ATTACKS[from.index()], us, &mut moves);
                    self.castle_moves(from, us, &mut moves);
                }
            }
        }
        moves.retain(|mv| self.keeps_king_safe(*mv));
        moves
    }

    fn pawn_moves(&self, from: Square, us: Color, moves: &mut Vec<Move>) {
        let dir = us.pawn_direction();
        if let Some(one) = from.offset(0, dir) {
            if self.piece_at(one).is_none() {
                push_pawn_move(from, one, us, moves);
                if from.rank() == us.pawn_rank() {
                    if let Some(two) = one.offset(0, dir) {
                        if self.piece_at(two).is_none() {
                            moves.push(Move::new(from, two));
                        }
                    }
                }
            }
        }
        for df in [-1, 1] {
            if let Some(to) = from.offset(df, dir) {
                match self.piece_at(to) {
                    Some(target) if target.color != us => push_pawn_move(from, to, us, moves),
                    None if self.en_passant == Some(to) => moves.push(Move::new(from, to)),
                    _ => {}
                }
            }
        }
    }

    fn step_moves(&self, from: Square, targets: &BitBoard, us: Color, moves: &mut Vec<Move>) {
        let reachable = *targets & !self.color_squares[us.index()];
        moves.extend(reachable.iter_squares().map(|to| Move::new(from, to)));
    }

    fn slide_moves(&self, from: Square, directions: &[(i32, i32)], us: Color, moves: &mut Vec<Move>) {
        for &(df, dr) in directions {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                match self.piece_at(to) {
                    None => moves.push(Move::new(from, to)),
                    Some(piece) => {
                        if piece.color != us {
                            moves.push(Move::new(from, to));
                        }
                        break;
                    }
                }
                current = to;
            }
        }
    }

    fn castle_moves(&self, king: Square, us: Color, moves: &mut Vec<Move>) {
        let rank = us.back_rank();
        let them = us.opposite();
        if king != Square::new(4, rank) || is_attacked(&self.squares, king, them) {
            return;
        }
        let rook = Some(Piece::new(PieceKind::Rook, us));
        let empty = |file: usize| self.piece_at(Square::new(file, rank)).is_none();
        let safe = |file: usize| !is_attacked(&self.squares, Square::new(file, rank), them);

        if self.castling.has(CastlingRights::kingside(us))
            && self.piece_at(Square::new(7, rank)) == rook
            && empty(5) && empty(6) && safe(5) && safe(6) {
            moves.push(Move::new(king, Square::new(6, rank)));
        }
        if self.castling.has(CastlingRights::queenside(us))
            && self.piece_at(Square::new(0, rank)) == rook
            && empty(1) && empty(2) && empty(3) && safe(2) && safe(3) {
            moves.push(Move::new(king, Square::new(2, rank)));
        }
    }

    /// Plays `mv` on a scratch copy of the squares and checks the mover's king.
    fn keeps_king_safe(&self, mv: Move) -> bool {
        let mut squares = self.squares;
        let Some(moved) = squares[mv.from.index()].take() else { return false };
        if let Some(captured) = self.en_passant_victim(mv, moved) {
            squares[captured.index()] = None;
        }
        squares[mv.to.index()] = Some(moved);
        let king = if moved.kind == PieceKind::King { Some(mv.to) } else { self.king_square(moved.color) };
        king.map_or(true, |king| !is_attacked(&squares, king, moved.color.opposite()))
    }

    /// The square of the pawn taken en passant, if `mv` is such a capture.
    fn en_passant_victim(&self, mv: Move, moved: Piece) -> Option<Square> {
        let is_en_passant = moved.kind == PieceKind::Pawn
            && self.en_passant == Some(mv.to)
            && mv.from.file() != mv.to.file()
            && self.piece_at(mv.to).is_none();
        is_en_passant.then(|| Square::new(mv.to.file(), mv.from.rank()))
    }

    /// Plays a move that must come from `legal_moves`. The returned token
    /// restores the board through `undo`.
    pub fn apply(&mut self, mv: Move) -> Undo {
        let moved = self.piece_at(mv.from).expect("apply called with a move from an empty square");
        self.history.push(self.key());

        let captured_square = self.en_passant_victim(mv, moved)
            .or_else(|| self.piece_at(mv.to).map(|_| mv.to));
        let captured = captured_square.and_then(|sq| self.remove_piece(sq).map(|piece| (sq, piece)));
        let undo = Undo {
            mv,
            moved,
            captured,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
        };

        self.remove_piece(mv.from);
        let landed = mv.promotion.map_or(moved, |kind| Piece::new(kind, moved.color));
        self.place_piece(mv.to, landed);

        if let Some((rook_from, rook_to)) = castling_rook(mv, moved) {
            if let Some(rook) = self.remove_piece(rook_from) {
                self.place_piece(rook_to, rook);
            }
        }

        let double_push = moved.kind == PieceKind::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2;
        self.en_passant = double_push.then(|| Square::new(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2));
        self.castling.remove(CastlingRights::lost_at(mv.from) | CastlingRights::lost_at(mv.to));
        if moved.kind == PieceKind::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if moved.color == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = moved.color.opposite();
        undo
    }

    pub fn undo(&mut self, undo: Undo) {
        let Undo { mv, moved, captured, castling, en_passant, halfmove_clock } = undo;
        self.side_to_move = moved.color;
        if moved.color == Color::Black {
            self.fullmove_number -= 1;
        }
        self.castling = castling;
        self.en_passant = en_passant;
        self.halfmove_clock = halfmove_clock;

        if let Some((rook_from, rook_to)) = castling_rook(mv, moved) {
            if let Some(rook) = self.remove_piece(rook_to) {
                self.place_piece(rook_from, rook);
            }
        }
        self.remove_piece(mv.to);
        self.place_piece(mv.from, moved);
        if let Some((square, piece)) = captured {
            self.place_piece(square, piece);
        }
        self.history.pop();
    }

    /// Applies `mv` only if it is legal here.
    pub fn make_move(&mut self, mv: Move) -> GameResult<Undo> {
        if self.legal_moves().contains(&mv) {
            Ok(self.apply(mv))
        } else {
            Err(GameError::IllegalMove(mv.to_string()))
        }
    }

    /// Checkmate or stalemate when the side to move has no legal moves,
    /// otherwise any draw by rule.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.legal_moves().is_empty() {
            return Some(if self.is_check() {
                Outcome::Checkmate { winner: self.side_to_move.opposite() }
            } else {
                Outcome::Draw(DrawReason::Stalemate)
            });
        }
        self.draw_by_rule().map(Outcome::Draw)
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// Draws that do not depend on the side to move running out of moves.
    pub fn draw_by_rule(&self) -> Option<DrawReason> {
        if self.halfmove_clock >= 100 {
            Some(DrawReason::FiftyMoveRule)
        } else if self.is_insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else if self.is_threefold_repetition() {
            Some(DrawReason::ThreefoldRepetition)
        } else {
            None
        }
    }

    fn is_insufficient_material(&self) -> bool {
        let mut minors = Vec::new();
        for (square, piece) in self.pieces() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((piece.kind, square.shade())),
                _ => return false,
            }
        }
        match minors.as_slice() {
            [] | [_] => true,
            [(_, shade), ..] => minors.iter().all(|(kind, s)| *kind == PieceKind::Bishop && s == shade),
        }
    }

    fn is_threefold_repetition(&self) -> bool {
        // positions before the last pawn move or capture can never recur
        let window = (self.halfmove_clock as usize).min(self.history.len());
        let current = self.key();
        let earlier = self.history[self.history.len() - window..].iter()
            .filter(|key| **key == current)
            .count();
        earlier >= 2
    }
}

fn push_pawn_move(from: Square, to: Square, us: Color, moves: &mut Vec<Move>) {
    if to.rank() == us.opposite().back_rank() {
        moves.extend(PROMOTIONS.iter().map(|kind| Move::promoting(from, to, *kind)));
    } else {
        moves.push(Move::new(from, to));
    }
}

fn castling_rook(mv: Move, moved: Piece) -> Option<(Square, Square)> {
    if moved.kind != PieceKind::King || mv.from.file().abs_diff(mv.to.file()) != 2 {
        return None;
    }
    let rank = mv.from.rank();
    if mv.to.file() == 6 {
        Some((Square::new(7, rank), Square::new(5, rank)))
    } else {
        Some((Square::new(0, rank), Square::new(3, rank)))
    }
}

fn first_piece_along(squares: &[Option<Piece>; FILES * RANKS], from: Square, (df, dr): (i32, i32)) -> Option<Piece> {
    let mut current = from;
    while let Some(next) = current.offset(df, dr) {
        if let Some(piece) = squares[next.index()] {
            return Some(piece);
        }
        current = next;
    }
    None
}

/// Whether any piece of `by` attacks `target` on the given squares.
fn is_attacked(squares: &[Option<Piece>; FILES * RANKS], target: Square, by: Color) -> bool {
    let holds = |sq: Square, kinds: &[PieceKind]| {
        matches!(squares[sq.index()], Some(p) if p.color == by && kinds.contains(&p.kind))
    };
    let pawn_from = -by.pawn_direction();
    if [-1, 1].iter().any(|df| target.offset(*df, pawn_from).map_or(false, |sq| holds(sq, &[PieceKind::Pawn]))) {
        return true;
    }
    if KNIGHT_ATTACKS[target.index()].iter_squares().any(|sq| holds(sq, &[PieceKind::Knight])) {
        return true;
    }
    if KING_ATTACKS[target.index()].iter_squares().any(|sq| holds(sq, &[PieceKind::King])) {
        return true;
    }
    let attacks_along = |directions: &[(i32, i32)], kinds: &[PieceKind]| {
        directions.iter().any(|dir| {
            matches!(first_piece_along(squares, target, *dir), Some(p) if p.color == by && kinds.contains(&p.kind))
        })
    };
    attacks_along(&ROOK_DIRECTIONS, &[PieceKind::Rook, PieceKind::Queen])
        || attacks_along(&BISHOP_DIRECTIONS, &[PieceKind::Bishop, PieceKind::Queen])
}
