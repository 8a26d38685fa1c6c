use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    castling::{CastlingRight, CastlingRule, CastlingSide},
    coordinates::{File, Rank, Square},
    eval::SquareControl,
    fen::{self, Fen, FenError, START_FEN},
    piece::{Color, Piece, PieceType},
    position::{OccupancyFilter, Position},
    r#move::{CheckMarker, Disambiguation, MoveCategory, MoveDescriptor},
    san::{self, NotationError},
};

/// Errors returned by the board for input it cannot even consider as a move.
///
/// Well-formed moves that break the rules are not errors: `play` returns `Ok(false)` for them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoardError {
    #[error(transparent)]
    Notation(#[from] NotationError),

    /// No piece of the named kind matches the origin hint of the move.
    #[error("No {color} {piece_type} can play {san}")]
    NoMatchingPiece { color: Color, piece_type: PieceType, san: String },

    #[error("Invalid long algebraic move: {0}")]
    InvalidLan(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error(transparent)]
    Fen(#[from] FenError),
}

/// A capture, as pushed on the capture stack of the capturing side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub piece: Piece,
    pub from: Square,
    pub captured: Piece,
    pub square: Square,
}

/// One applied half-move.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub from: Square,
    pub descriptor: MoveDescriptor,
    /// The move as recorded in the movetext.
    pub san: String,
    pub castling_before: CastlingRight,
    pub en_passant_before: Option<Square>,
    pub halfmove_clock_before: u16,
    pub fullmove_number_before: u16,
    /// The FEN of the position after the move.
    pub fen: String,
}

/// What `legal_sqs` reports about a piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalSquares {
    pub color: Color,
    pub piece_type: PieceType,
    pub squares: Vec<Square>,
    pub en_passant: Option<Square>,
}

/// A move the board accepted, ready to be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MovePlan {
    from: Square,
    to: Square,
    captured: Option<(Square, Piece)>,
    placed: Piece,
    castle: Option<CastlingSide>,
}

/// A chess game in progress.
///
/// The board owns the placement, the side to move, the castling ability, the en passant target,
/// the capture stacks and the history. It only changes through [`Board::play`],
/// [`Board::play_lan`] and [`Board::undo`]; a rejected move leaves it exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    position: Position,
    turn: Color,
    castling: CastlingRight,
    rule: CastlingRule,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
    start_fullmove: u16,
    captures: [Vec<Capture>; Color::COUNT],
    history: Vec<HistoryEntry>,
    control: SquareControl,
}

//======================================================================================================================
// Construction
//======================================================================================================================

impl Board {
    /// Creates a board with the standard starting position, White to move.
    pub fn new() -> Self {
        Self::from_fen(START_FEN).expect("This can not fail because START_FEN is always successfully parsed.")
    }

    /// Creates a board from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let fen = fen::parse(fen)?;
        Self::from_parts(fen)
    }

    /// Creates a board from a list of pieces.
    ///
    /// Rooks standing on their castling origin get the matching castling role, whatever role they
    /// were given.
    ///
    /// # Errors
    /// `InvalidPosition` if two pieces share a square or a side does not have exactly one king.
    pub fn from_pieces(pieces: &[(Square, Piece)], castling: CastlingRight, turn: Color) -> Result<Self, BoardError> {
        let mut position = Position::new();
        for (square, piece) in pieces {
            if position.piece_at(*square).is_some() {
                return Err(BoardError::InvalidPosition(format!("two pieces on {square}")));
            }
            position.put_piece(*piece, *square);
        }

        Self::from_parts(Fen { position, turn, castling, en_passant: None, halfmove_clock: 0, fullmove_number: 1 })
    }

    fn from_parts(fen: Fen) -> Result<Self, BoardError> {
        let rule = CastlingRule::standard();
        let mut position = fen.position;

        for color in Color::ALL {
            let kings = position.occupied((color, PieceType::King)).popcnt();
            if kings != 1 {
                return Err(BoardError::InvalidPosition(format!("{color} has {kings} kings")));
            }

            for side in CastlingSide::ALL {
                let origin = rule.squares(color, side).rook_from;
                if position.piece_at(origin).is_some_and(|piece| piece.is(color, PieceType::Rook)) {
                    position.remove_piece(origin);
                    position.put_piece(Piece::rook(color, side.rook_type()), origin);
                }
            }
        }

        // A side whose king left its origin has nothing to castle with.
        let mut castling = fen.castling;
        for color in Color::ALL {
            if position.piece_at(rule.king_from(color)) != Some(Piece::King(color)) {
                castling.revoke(color, &CastlingSide::ALL);
            }
            for side in CastlingSide::ALL {
                let origin = rule.squares(color, side).rook_from;
                if position.piece_at(origin) != Some(Piece::rook(color, side.rook_type())) {
                    castling.revoke(color, &[side]);
                }
            }
        }

        Ok(Board {
            control: SquareControl::evaluate(&position),
            position,
            turn: fen.turn,
            castling,
            rule,
            en_passant: fen.en_passant,
            halfmove_clock: fen.halfmove_clock,
            fullmove_number: fen.fullmove_number,
            start_fullmove: fen.fullmove_number,
            captures: [Vec::new(), Vec::new()],
            history: Vec::new(),
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

//======================================================================================================================
// Accessors
//======================================================================================================================

impl Board {
    /// Returns the side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn castling_ability(&self) -> CastlingRight {
        self.castling
    }

    pub fn castling_rule(&self) -> &CastlingRule {
        &self.rule
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Returns the captures made by `color`, oldest first.
    pub fn captures(&self, color: Color) -> &[Capture] {
        &self.captures[usize::from(color)]
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.piece_at(square)
    }

    /// Returns the pieces of `color` with their squares.
    pub fn pieces(&self, color: Color) -> Vec<(Square, Piece)> {
        self.position.pieces(color).collect()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Returns the square-control views of the current position.
    pub fn square_control(&self) -> &SquareControl {
        &self.control
    }

    /// Returns the FEN of the current position.
    pub fn to_fen(&self) -> String {
        fen::write(&Fen {
            position: self.position,
            turn: self.turn,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        })
    }

    /// Returns the moves played so far as numbered movetext, such as `1.e4 e5 2.Nf3`.
    pub fn movetext(&self) -> String {
        let mut parts = Vec::with_capacity(self.history.len());
        let mut number = self.start_fullmove;
        for (index, entry) in self.history.iter().enumerate() {
            match entry.descriptor.color {
                Color::White => parts.push(format!("{number}.{}", entry.san)),
                Color::Black if index == 0 => parts.push(format!("{number}...{}", entry.san)),
                Color::Black => parts.push(entry.san.clone()),
            }
            if entry.descriptor.color == Color::Black {
                number += 1;
            }
        }
        parts.join(" ")
    }

    /// Returns the squares of the pieces giving check to the side to move.
    pub fn checking_pieces(&self) -> Vec<Square> {
        match self.position.king_square(self.turn) {
            Some(king) => self.position.attacks_to(king, self.turn.opposite()).squares(),
            None => Vec::new(),
        }
    }

    /// Returns the board as an 8x8 array of cells such as `" P "` or `" . "`.
    ///
    /// The first row is rank 8 and the first column is file a, unless `flip` is set, in which case
    /// the board is seen from Black's side.
    pub fn to_ascii_array(&self, flip: bool) -> Vec<Vec<String>> {
        let mut ranks = Rank::ALL.to_vec();
        let mut files = File::ALL.to_vec();
        if flip {
            files.reverse();
        } else {
            ranks.reverse();
        }

        ranks
            .iter()
            .map(|rank| {
                files
                    .iter()
                    .map(|file| match self.position.piece_at(Square::new(*file, *rank)) {
                        Some(piece) => format!(" {} ", char::from(piece)),
                        None => " . ".to_string(),
                    })
                    .collect()
            })
            .collect()
    }

    /// Returns [`Board::to_ascii_array`] as text, one line per rank.
    pub fn to_ascii_string(&self, flip: bool) -> String {
        self.to_ascii_array(flip).iter().map(|row| row.concat() + "\n").collect()
    }
}

//======================================================================================================================
// Move resolution
//======================================================================================================================

impl Board {
    /// Returns whether the king of `color` is safe once `plan` is applied to a copy of the placement.
    fn leaves_king_safe(&self, plan: &MovePlan, color: Color) -> bool {
        let mut trial = self.position;
        self.apply(&mut trial, plan);
        trial.king_square(color).is_some_and(|king| !trial.is_attacked(king, color.opposite()))
    }

    fn apply(&self, position: &mut Position, plan: &MovePlan) {
        match plan.castle {
            Some(side) => {
                let squares = self.rule.squares(plan.placed.color(), side);
                let king = position.remove_piece(squares.king_from);
                let rook = position.remove_piece(squares.rook_from);
                if let Some(king) = king {
                    position.put_piece(king, squares.king_to);
                }
                if let Some(rook) = rook {
                    position.put_piece(rook, squares.rook_to);
                }
            }
            None => {
                if let Some((square, _)) = plan.captured {
                    position.remove_piece(square);
                }
                position.remove_piece(plan.from);
                position.put_piece(plan.placed, plan.to);
            }
        }
    }

    /// Builds the plan of the piece on `from` moving to `to`, without checking the safety of its
    /// king. Returns `None` if the piece cannot make that move.
    fn plan_for(&self, from: Square, to: Square, promotion: Option<PieceType>) -> Option<MovePlan> {
        let piece = self.position.piece_at(from)?;
        let color = piece.color();

        if !self.position.reachable(from, self.en_passant).contains(to) {
            return None;
        }

        let captured = match self.position.piece_at(to) {
            Some(target) if target.color() == color || target.piece_type() == PieceType::King => return None,
            Some(target) => Some((to, target)),
            None if piece.piece_type() == PieceType::Pawn && from.file() != to.file() => {
                // En passant: the captured pawn stands behind the target square.
                let square = to.backward(color).ok()?;
                let target =
                    self.position.piece_at(square).filter(|target| target.is(color.opposite(), PieceType::Pawn))?;
                Some((square, target))
            }
            None => None,
        };

        let last_rank = Rank::R8.relative_to_color(color);
        let placed = match (piece.piece_type(), promotion) {
            (PieceType::Pawn, Some(promotion))
                if to.rank() == last_rank && PieceType::PROMOTIONS.contains(&promotion) =>
            {
                Piece::new(color, promotion)
            }
            (PieceType::Pawn, None) if to.rank() != last_rank => piece,
            (PieceType::Pawn, _) => return None,
            (_, Some(_)) => return None,
            (_, None) => piece,
        };

        Some(MovePlan { from, to, captured, placed, castle: None })
    }

    /// Builds the plan of `color` castling on `side`, if castling is allowed right now.
    fn plan_castle(&self, color: Color, side: CastlingSide) -> Option<MovePlan> {
        if !self.castling.can_castle(color, side) {
            return None;
        }

        let squares = self.rule.squares(color, side);
        if self.position.piece_at(squares.king_from) != Some(Piece::King(color))
            || self.position.piece_at(squares.rook_from) != Some(Piece::rook(color, side.rook_type()))
        {
            return None;
        }

        if self.position.occupied(OccupancyFilter::All).intersects(self.rule.path(color, side)) {
            return None;
        }

        // The king may not castle out of, through or into check.
        for square in self.rule.king_walk(color, side) {
            let step = MovePlan {
                from: squares.king_from,
                to: square,
                captured: None,
                placed: Piece::King(color),
                castle: None,
            };
            if !self.leaves_king_safe(&step, color) {
                return None;
            }
        }

        Some(MovePlan {
            from: squares.king_from,
            to: squares.king_to,
            captured: None,
            placed: Piece::King(color),
            castle: Some(side),
        })
    }

    /// Decides which piece a descriptor moves.
    ///
    /// # Returns
    /// * `Ok(Some(plan))` - Exactly one piece can legally make the move
    /// * `Ok(None)` - The move is out of turn, illegal or ambiguous
    /// * `Err(BoardError::NoMatchingPiece)` - No piece of that kind matches the origin hint
    fn resolve(&self, descriptor: &MoveDescriptor) -> Result<Option<MovePlan>, BoardError> {
        let color = descriptor.color;
        if color != self.turn {
            debug!(%descriptor, "rejected: {color} is not to move");
            return Ok(None);
        }

        if let Some(side) = descriptor.castling_side() {
            let plan = self.plan_castle(color, side);
            if plan.is_none() {
                debug!(%descriptor, "rejected: castling is not allowed");
            }
            return Ok(plan);
        }

        match self.position.piece_at(descriptor.to) {
            Some(target) if target.piece_type() == PieceType::King => {
                debug!(%descriptor, "rejected: kings are never captured");
                return Ok(None);
            }
            Some(_) if !descriptor.capture => {
                debug!(%descriptor, "rejected: destination is occupied");
                return Ok(None);
            }
            None if descriptor.capture
                && !(descriptor.piece_type == PieceType::Pawn && self.en_passant == Some(descriptor.to)) =>
            {
                debug!(%descriptor, "rejected: nothing to capture");
                return Ok(None);
            }
            _ => {}
        }

        let candidates: Vec<Square> = self
            .position
            .occupied((color, descriptor.piece_type))
            .into_iter()
            .filter(|square| descriptor.hint.matches(*square))
            .collect();
        if candidates.is_empty() {
            return Err(BoardError::NoMatchingPiece {
                color,
                piece_type: descriptor.piece_type,
                san: descriptor.to_string(),
            });
        }

        let legal: Vec<MovePlan> = candidates
            .into_iter()
            // A pawn only changes file when it captures.
            .filter(|from| {
                descriptor.piece_type != PieceType::Pawn || (from.file() != descriptor.to.file()) == descriptor.capture
            })
            .filter_map(|from| self.plan_for(from, descriptor.to, descriptor.promotion))
            .filter(|plan| self.leaves_king_safe(plan, color))
            .collect();

        match legal.as_slice() {
            [plan] => Ok(Some(*plan)),
            [] => {
                debug!(%descriptor, "rejected: no piece can legally make the move");
                Ok(None)
            }
            _ => {
                debug!(%descriptor, candidates = legal.len(), "rejected: ambiguous move");
                Ok(None)
            }
        }
    }

    /// Returns whether the side to move has no legal move at all.
    fn is_trapped(&self) -> bool {
        let color = self.turn;
        let has_move = self.position.pieces(color).any(|(from, piece)| {
            let promotion = (piece.piece_type() == PieceType::Pawn).then_some(PieceType::Queen);
            self.position.reachable(from, self.en_passant).into_iter().any(|to| {
                self.plan_for(from, to, promotion)
                    .or_else(|| self.plan_for(from, to, None))
                    .is_some_and(|plan| self.leaves_king_safe(&plan, color))
            })
        });

        !has_move && CastlingSide::ALL.iter().all(|side| self.plan_castle(color, *side).is_none())
    }
}

//======================================================================================================================
// Playing and undoing moves
//======================================================================================================================

impl Board {
    /// Plays a move written in standard algebraic notation.
    ///
    /// # Parameters
    /// * `color` - The side making the move
    /// * `san` - The move, such as "e4", "Nbd2", "exd6", "a8=Q" or "O-O"
    ///
    /// # Returns
    /// * `Ok(true)` - The move was legal and has been played
    /// * `Ok(false)` - The move is out of turn, ambiguous, illegal or leaves the king in check; the board
    ///   is unchanged
    ///
    /// # Errors
    /// * `Notation` - If the token is not a well-formed move
    /// * `NoMatchingPiece` - If no piece of the named kind matches the origin hint
    pub fn play(&mut self, color: Color, san: &str) -> Result<bool, BoardError> {
        let descriptor = san::parse(color, san, &self.rule)?;
        match self.resolve(&descriptor)? {
            Some(plan) => {
                self.commit(plan, descriptor, san.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Plays a move written in long algebraic notation, such as "e2e4", "e7e8q" or "e1g1".
    ///
    /// The move is recorded in the history in standard algebraic notation.
    pub fn play_lan(&mut self, color: Color, lan: &str) -> Result<bool, BoardError> {
        let (from, to, promotion) = san::parse_lan(lan).map_err(|_| BoardError::InvalidLan(lan.to_string()))?;

        let piece = match self.position.piece_at(from) {
            Some(piece) if piece.color() == color => piece,
            _ => return Err(BoardError::InvalidLan(lan.to_string())),
        };

        let descriptor = self.descriptor_for(piece, from, to, promotion);
        let Some(plan) = self.resolve(&descriptor)? else {
            return Ok(false);
        };

        let recorded = MoveDescriptor { hint: self.minimal_hint(&plan, &descriptor), ..descriptor };
        self.commit(plan, recorded, String::new());

        let check = if self.is_mate() {
            CheckMarker::Mate
        } else if self.is_check() {
            CheckMarker::Check
        } else {
            CheckMarker::None
        };
        if let Some(entry) = self.history.last_mut() {
            entry.descriptor.check = check;
            entry.san = entry.descriptor.to_string();
        }
        Ok(true)
    }

    /// Builds the descriptor of a move given by its origin, fully disambiguated by square.
    fn descriptor_for(&self, piece: Piece, from: Square, to: Square, promotion: Option<PieceType>) -> MoveDescriptor {
        let color = piece.color();
        let piece_type = piece.piece_type();

        let castle = CastlingSide::ALL.into_iter().find(|side| {
            let squares = self.rule.squares(color, *side);
            piece_type == PieceType::King && squares.king_from == from && squares.king_to == to
        });
        if let Some(side) = castle {
            return MoveDescriptor {
                color,
                piece_type,
                hint: Disambiguation::None,
                to,
                capture: false,
                category: match side {
                    CastlingSide::Kingside => MoveCategory::CastleShort,
                    CastlingSide::Queenside => MoveCategory::CastleLong,
                },
                promotion: None,
                check: CheckMarker::None,
            };
        }

        let capture = self.position.piece_at(to).is_some()
            || (piece_type == PieceType::Pawn && from.file() != to.file());
        MoveDescriptor {
            color,
            piece_type,
            hint: Disambiguation::Square(from),
            to,
            capture,
            category: MoveDescriptor::categorize(piece_type, capture, promotion),
            promotion,
            check: CheckMarker::None,
        }
    }

    /// Returns the shortest origin hint that tells the moving piece apart from the other pieces of
    /// its kind that could legally move to the same square.
    fn minimal_hint(&self, plan: &MovePlan, descriptor: &MoveDescriptor) -> Disambiguation {
        if descriptor.castling_side().is_some() {
            return Disambiguation::None;
        }
        if descriptor.piece_type == PieceType::Pawn {
            return match descriptor.capture {
                true => Disambiguation::File(plan.from.file()),
                false => Disambiguation::None,
            };
        }

        let rivals: Vec<Square> = self
            .position
            .occupied((descriptor.color, descriptor.piece_type))
            .into_iter()
            .filter(|square| *square != plan.from)
            .filter(|square| {
                self.plan_for(*square, plan.to, None)
                    .is_some_and(|rival| self.leaves_king_safe(&rival, descriptor.color))
            })
            .collect();

        if rivals.is_empty() {
            Disambiguation::None
        } else if rivals.iter().all(|square| square.file() != plan.from.file()) {
            Disambiguation::File(plan.from.file())
        } else if rivals.iter().all(|square| square.rank() != plan.from.rank()) {
            Disambiguation::Rank(plan.from.rank())
        } else {
            Disambiguation::Square(plan.from)
        }
    }

    fn commit(&mut self, plan: MovePlan, descriptor: MoveDescriptor, san: String) {
        let color = descriptor.color;
        let castling_before = self.castling;
        let en_passant_before = self.en_passant;
        let halfmove_clock_before = self.halfmove_clock;
        let fullmove_number_before = self.fullmove_number;
        let moving = self.position.piece_at(plan.from).unwrap_or(plan.placed);

        if let Some((square, captured)) = plan.captured {
            self.captures[usize::from(color)].push(Capture { piece: moving, from: plan.from, captured, square });

            let opponent = color.opposite();
            let origin_of = self.rule.side_of_rook_origin(opponent, square);
            if let Some(side) = origin_of.filter(|side| captured.rook_type() == Some(side.rook_type())) {
                self.castling.revoke(opponent, &[side]);
            }
        }

        let mut position = self.position;
        self.apply(&mut position, &plan);
        self.position = position;

        match moving {
            Piece::King(_) => self.castling.revoke(color, &CastlingSide::ALL),
            Piece::Rook(_, rook_type) => {
                if let Some(side) = CastlingSide::of_rook(rook_type) {
                    self.castling.revoke(color, &[side]);
                }
            }
            _ => {}
        }

        let is_pawn = moving.piece_type() == PieceType::Pawn;
        let distance = (u8::from(plan.to.rank()) as i8 - u8::from(plan.from.rank()) as i8).abs();
        self.en_passant = if is_pawn && distance == 2 { plan.from.forward(color).ok() } else { None };

        self.halfmove_clock =
            if is_pawn || plan.captured.is_some() { 0 } else { self.halfmove_clock.saturating_add(1) };
        if color == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.turn = color.opposite();
        self.control = SquareControl::evaluate(&self.position);

        trace!(%descriptor, from = %plan.from, "move committed");
        let fen = self.to_fen();
        self.history.push(HistoryEntry {
            from: plan.from,
            descriptor,
            san,
            castling_before,
            en_passant_before,
            halfmove_clock_before,
            fullmove_number_before,
            fen,
        });
    }

    /// Takes back the last move. Does nothing when no move was played.
    pub fn undo(&mut self) {
        let Some(entry) = self.history.pop() else {
            return;
        };
        let color = entry.descriptor.color;
        let to = entry.descriptor.to;

        match entry.descriptor.castling_side() {
            Some(side) => {
                let squares = self.rule.squares(color, side);
                let king = self.position.remove_piece(squares.king_to);
                let rook = self.position.remove_piece(squares.rook_to);
                if let Some(king) = king {
                    self.position.put_piece(king, squares.king_from);
                }
                if let Some(rook) = rook {
                    self.position.put_piece(rook, squares.rook_from);
                }
            }
            None => {
                if let Some(piece) = self.position.remove_piece(to) {
                    let original = match entry.descriptor.promotion {
                        Some(_) => Piece::Pawn(color),
                        None => piece,
                    };
                    self.position.put_piece(original, entry.from);
                }
                if entry.descriptor.capture {
                    if let Some(capture) = self.captures[usize::from(color)].pop() {
                        self.position.put_piece(capture.captured, capture.square);
                    }
                }
            }
        }

        self.castling = entry.castling_before;
        self.en_passant = entry.en_passant_before;
        self.halfmove_clock = entry.halfmove_clock_before;
        self.fullmove_number = entry.fullmove_number_before;
        self.turn = color;
        self.control = SquareControl::evaluate(&self.position);
        trace!(descriptor = %entry.descriptor, "move undone");
    }
}

//======================================================================================================================
// Game state queries
//======================================================================================================================

impl Board {
    /// Returns whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.position
            .king_square(self.turn)
            .is_some_and(|king| self.control.pressure(self.turn.opposite()).contains(king))
    }

    /// Returns whether the side to move is checkmated.
    pub fn is_mate(&self) -> bool {
        self.is_check() && self.is_trapped()
    }

    /// Returns whether the side to move is stalemated.
    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.is_trapped()
    }

    /// Returns the squares the piece on `square` can legally move to.
    ///
    /// A destination is legal when the move to it, written in one of its notation forms (plain,
    /// capture, or disambiguated by file, rank or square), would be accepted by [`Board::play`].
    /// Pieces of the side not to move have no legal squares. The king lists its castling
    /// destinations. Returns `None` for an empty square.
    pub fn legal_sqs(&self, square: Square) -> Option<LegalSquares> {
        let piece = self.position.piece_at(square)?;
        let color = piece.color();
        let piece_type = piece.piece_type();

        let last_rank = Rank::R8.relative_to_color(color);
        let mut squares: Vec<Square> = self
            .position
            .reachable(square, self.en_passant)
            .into_iter()
            .filter(|to| {
                let promotion = (piece_type == PieceType::Pawn && to.rank() == last_rank).then_some(PieceType::Queen);
                let hints: &[Disambiguation] = match piece_type {
                    PieceType::Pawn => &[Disambiguation::None, Disambiguation::File(square.file())],
                    PieceType::King => &[Disambiguation::None],
                    _ => &[
                        Disambiguation::None,
                        Disambiguation::File(square.file()),
                        Disambiguation::Rank(square.rank()),
                        Disambiguation::Square(square),
                    ],
                };

                hints.iter().any(|hint| {
                    [true, false].into_iter().any(|capture| {
                        let descriptor = MoveDescriptor {
                            color,
                            piece_type,
                            hint: *hint,
                            to: *to,
                            capture,
                            category: MoveDescriptor::categorize(piece_type, capture, promotion),
                            promotion,
                            check: CheckMarker::None,
                        };
                        matches!(self.resolve(&descriptor), Ok(Some(plan)) if plan.from == square)
                    })
                })
            })
            .collect();

        if piece_type == PieceType::King && color == self.turn {
            for side in CastlingSide::ALL {
                if self.plan_castle(color, side).is_some() {
                    squares.push(self.rule.squares(color, side).king_to);
                }
            }
        }
        squares.sort();

        let en_passant = match (piece_type, self.en_passant) {
            (PieceType::Pawn, Some(target)) if squares.contains(&target) && self.piece_at(target).is_none() => {
                Some(target)
            }
            _ => None,
        };

        Some(LegalSquares { color, piece_type, squares, en_passant })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(board: &mut Board, moves: &[&str]) {
        for (index, san) in moves.iter().enumerate() {
            let color = if index % 2 == 0 { Color::White } else { Color::Black };
            assert_eq!(board.play(color, san), Ok(true), "{san} should be legal");
        }
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_new_board() {
            let board = Board::new();
            assert_eq!(board.turn(), Color::White);
            assert_eq!(board.castling_ability(), CastlingRight::all());
            assert_eq!(board.pieces(Color::White).len(), 16);
            assert_eq!(board.pieces(Color::Black).len(), 16);
            assert_eq!(
                board.piece_at(Square::H1),
                Some(Piece::rook(Color::White, crate::piece::RookType::CastleShort))
            );
            assert_eq!(board.piece_at(Square::A8), Some(Piece::rook(Color::Black, crate::piece::RookType::CastleLong)));
            assert_eq!(board.to_fen(), START_FEN);
            assert!(board.history().is_empty());
        }

        #[test]
        fn test_from_pieces_requires_one_king_per_side() {
            let pieces = [(Square::E1, Piece::King(Color::White))];
            assert!(matches!(
                Board::from_pieces(&pieces, CastlingRight::empty(), Color::White),
                Err(BoardError::InvalidPosition(_))
            ));

            let pieces = [(Square::E1, Piece::King(Color::White)), (Square::E1, Piece::King(Color::Black))];
            assert!(matches!(
                Board::from_pieces(&pieces, CastlingRight::empty(), Color::White),
                Err(BoardError::InvalidPosition(_))
            ));
        }

        #[test]
        fn test_from_pieces_drops_unusable_castling_flags() {
            let pieces = [
                (Square::E1, Piece::King(Color::White)),
                (Square::H1, Piece::new(Color::White, PieceType::Rook)),
                (Square::E8, Piece::King(Color::Black)),
            ];
            let board = Board::from_pieces(&pieces, CastlingRight::all(), Color::White).unwrap();
            assert_eq!(board.castling_ability(), CastlingRight::WHITE_KINGSIDE);
        }

        #[test]
        fn test_from_fen_rejects_bad_fen() {
            assert!(matches!(Board::from_fen("not a fen"), Err(BoardError::Fen(_))));
        }
    }

    mod play_tests {
        use super::*;

        #[test]
        fn test_play_alternates_turns() {
            let mut board = Board::new();
            assert_eq!(board.play(Color::White, "e4"), Ok(true));
            assert_eq!(board.turn(), Color::Black);
            assert_eq!(board.play(Color::White, "d4"), Ok(false));
            assert_eq!(board.turn(), Color::Black);
            assert_eq!(board.play(Color::Black, "e5"), Ok(true));
            assert_eq!(board.turn(), Color::White);
        }

        #[test]
        fn test_malformed_notation_is_an_error() {
            let mut board = Board::new();
            assert!(matches!(board.play(Color::White, "e9"), Err(BoardError::Notation(_))));
            assert!(matches!(board.play(Color::White, "foo"), Err(BoardError::Notation(_))));
        }

        #[test]
        fn test_no_matching_piece_is_an_error() {
            let mut board = Board::new();
            assert!(matches!(board.play(Color::White, "Nd5"), Ok(false)));
            assert!(matches!(board.play(Color::White, "Ncd3"), Err(BoardError::NoMatchingPiece { .. })));
        }

        #[test]
        fn test_rejected_move_leaves_board_unchanged() {
            let mut board = Board::new();
            play_all(&mut board, &["e4", "e5"]);
            let before = board.clone();
            for san in ["Ke3", "Nxe5", "Bxa6", "Qh6", "e5", "O-O"] {
                assert_eq!(board.play(Color::White, san), Ok(false), "{san} should be rejected");
                assert_eq!(board, before);
            }
        }

        #[test]
        fn test_capture_flag_must_match_target() {
            let mut board = Board::new();
            play_all(&mut board, &["e4", "d5"]);
            assert_eq!(board.play(Color::White, "exd5"), Ok(true));
            let captures = board.captures(Color::White);
            assert_eq!(captures.len(), 1);
            assert_eq!(captures[0].captured, Piece::Pawn(Color::Black));
            assert_eq!(captures[0].square, Square::D5);
            assert_eq!(captures[0].from, Square::E4);
        }

        #[test]
        fn test_capture_onto_an_empty_square_is_rejected() {
            let mut board = Board::new();
            let before = board.clone();
            assert_eq!(board.play(Color::White, "Nxf3"), Ok(false));
            assert_eq!(board, before);

            play_all(&mut board, &["e4", "a6", "e5", "a5"]);
            let before = board.clone();
            assert_eq!(board.en_passant(), None);
            assert_eq!(board.play(Color::White, "exd6"), Ok(false));
            assert_eq!(board, before);
        }

        #[test]
        fn test_move_counters_saturate() {
            let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 65535").unwrap();
            assert_eq!(board.play(Color::Black, "Kd8"), Ok(true));
            assert_eq!(board.to_fen(), "3k4/8/8/8/8/8/8/4K3 w - - 1 65535");
            board.undo();
            assert_eq!(board.to_fen(), "4k3/8/8/8/8/8/8/4K3 b - - 0 65535");

            let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 65535 1").unwrap();
            assert_eq!(board.play(Color::White, "Kd1"), Ok(true));
            assert_eq!(board.to_fen(), "4k3/8/8/8/8/8/8/3K4 b - - 65535 1");
        }

        #[test]
        fn test_history_records_fen_after_move() {
            let mut board = Board::new();
            play_all(&mut board, &["e4"]);
            let entry = &board.history()[0];
            assert_eq!(entry.from, Square::E2);
            assert_eq!(entry.san, "e4");
            assert_eq!(entry.castling_before, CastlingRight::all());
            assert_eq!(entry.fen, "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        }

        #[test]
        fn test_movetext() {
            let mut board = Board::new();
            play_all(&mut board, &["e4", "e5", "Nf3"]);
            assert_eq!(board.movetext(), "1.e4 e5 2.Nf3");
        }

        #[test]
        fn test_movetext_starting_with_black() {
            let mut board = Board::from_fen("4k3/4p3/8/8/8/8/4P3/4K3 b - - 0 7").unwrap();
            assert_eq!(board.play(Color::Black, "e5"), Ok(true));
            assert_eq!(board.play(Color::White, "e4"), Ok(true));
            assert_eq!(board.movetext(), "7...e5 8.e4");
        }
    }

    mod lan_tests {
        use super::*;

        #[test]
        fn test_play_lan_records_san() {
            let mut board = Board::new();
            assert_eq!(board.play_lan(Color::White, "e2e4"), Ok(true));
            assert_eq!(board.play_lan(Color::Black, "e7e5"), Ok(true));
            assert_eq!(board.play_lan(Color::White, "g1f3"), Ok(true));
            assert_eq!(board.movetext(), "1.e4 e5 2.Nf3");
        }

        #[test]
        fn test_play_lan_castles_and_marks_check() {
            let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
            assert_eq!(board.play_lan(Color::White, "e1g1"), Ok(true));
            assert_eq!(board.history()[0].san, "O-O");

            let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
            assert_eq!(board.play_lan(Color::White, "a1a8"), Ok(true));
            assert_eq!(board.history()[0].san, "Ra8+");
        }

        #[test]
        fn test_play_lan_disambiguates() {
            let mut board = Board::from_fen("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1").unwrap();
            assert_eq!(board.play_lan(Color::White, "b1d2"), Ok(true));
            assert_eq!(board.history()[0].san, "Nbd2");
        }

        #[test]
        fn test_play_lan_errors() {
            let mut board = Board::new();
            assert!(matches!(board.play_lan(Color::White, "e2"), Err(BoardError::InvalidLan(_))));
            assert!(matches!(board.play_lan(Color::White, "e4e5"), Err(BoardError::InvalidLan(_))));
            assert_eq!(board.play_lan(Color::White, "e2e5"), Ok(false));
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_legal_sqs_of_knight() {
            let board = Board::new();
            let legal = board.legal_sqs(Square::G1).unwrap();
            assert_eq!(legal.color, Color::White);
            assert_eq!(legal.piece_type, PieceType::Knight);
            assert_eq!(legal.squares, vec![Square::F3, Square::H3]);
            assert_eq!(legal.en_passant, None);
            assert_eq!(board.legal_sqs(Square::E4), None);
        }

        #[test]
        fn test_legal_sqs_of_side_not_to_move_is_empty() {
            let board = Board::new();
            assert!(board.legal_sqs(Square::G8).unwrap().squares.is_empty());
        }

        #[test]
        fn test_legal_sqs_reports_en_passant() {
            let mut board = Board::new();
            play_all(&mut board, &["e4", "a6", "e5", "d5"]);
            let legal = board.legal_sqs(Square::E5).unwrap();
            assert_eq!(legal.squares, vec![Square::D6, Square::E6]);
            assert_eq!(legal.en_passant, Some(Square::D6));
        }

        #[test]
        fn test_legal_sqs_respects_pins() {
            let board = Board::from_fen("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
            assert!(board.legal_sqs(Square::E2).unwrap().squares.is_empty());
        }

        #[test]
        fn test_checking_pieces() {
            let board = Board::from_fen("4k3/8/8/8/1b6/8/8/4K2r w - - 0 1").unwrap();
            assert!(board.is_check());
            assert_eq!(board.checking_pieces(), vec![Square::H1, Square::B4]);
        }

        #[test]
        fn test_ascii_rendering() {
            let board = Board::new();
            let array = board.to_ascii_array(false);
            assert_eq!(array.len(), 8);
            assert_eq!(array[0][0], " r ");
            assert_eq!(array[7][4], " K ");
            assert_eq!(array[4][4], " . ");

            let flipped = board.to_ascii_array(true);
            assert_eq!(flipped[0][0], " R ");
            assert_eq!(flipped[0][3], " K ");

            let text = board.to_ascii_string(false);
            assert_eq!(text.lines().next(), Some(" r  n  b  q  k  b  n  r "));
            assert_eq!(text.lines().count(), 8);
        }
    }
}
