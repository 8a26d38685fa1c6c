use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::{
    castling::{CastlingRule, CastlingSide},
    coordinates::{CoordinatesError, File, Rank, Square},
    piece::{Color, PieceType},
    r#move::{CheckMarker, Disambiguation, MoveCategory, MoveDescriptor},
};

//======================================================================================================================
// Error handling
//======================================================================================================================

/// Represents errors that can occur when parsing move notation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotationError {
    /// The token does not have the shape of any move.
    #[error("Invalid notation: {0}")]
    InvalidNotation(String),

    /// A pawn reaches the last rank without saying what it becomes.
    #[error("Missing promotion piece: {0}")]
    MissingPromotion(String),

    /// A promotion is written for a pawn that does not reach the last rank.
    #[error("Unexpected promotion: {0}")]
    UnexpectedPromotion(String),

    #[error("Invalid square: {0}")]
    InvalidSquare(#[from] CoordinatesError),
}

//======================================================================================================================
// Patterns
//======================================================================================================================

static CASTLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:O-O-O|0-0-0|O-O|0-0)(?P<check>[+#])?$").expect("The regex should be valid"));

static PAWN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<from>[a-h])x)?(?P<to>[a-h][1-8])(?:=(?P<promotion>[NBRQ]))?(?P<check>[+#])?$")
        .expect("The regex should be valid")
});

static PIECE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<piece>[NBRQK])(?P<hint>[a-h]?[1-8]?)(?P<capture>x)?(?P<to>[a-h][1-8])(?P<check>[+#])?$")
        .expect("The regex should be valid")
});

static LAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<from>[a-h][1-8])(?P<to>[a-h][1-8])(?P<promotion>[nbrqNBRQ])?$")
        .expect("The regex should be valid")
});

//======================================================================================================================
// Parsing
//======================================================================================================================

fn check_marker(text: Option<regex::Match>) -> CheckMarker {
    match text.map(|m| m.as_str()) {
        Some("+") => CheckMarker::Check,
        Some("#") => CheckMarker::Mate,
        _ => CheckMarker::None,
    }
}

fn parse_hint(hint: &str) -> Result<Disambiguation, NotationError> {
    let mut chars = hint.chars();
    Ok(match (chars.next(), chars.next()) {
        (None, _) => Disambiguation::None,
        (Some(c), None) if c.is_ascii_digit() => Disambiguation::Rank(Rank::try_from(c)?),
        (Some(c), None) => Disambiguation::File(File::try_from(c)?),
        (Some(_), Some(_)) => Disambiguation::Square(Square::try_from(hint)?),
    })
}

fn parse_castle(color: Color, token: &str, rule: &CastlingRule) -> Option<MoveDescriptor> {
    let captures = CASTLE.captures(token)?;
    let (side, category) = if token.starts_with("O-O-O") || token.starts_with("0-0-0") {
        (CastlingSide::Queenside, MoveCategory::CastleLong)
    } else {
        (CastlingSide::Kingside, MoveCategory::CastleShort)
    };

    Some(MoveDescriptor {
        color,
        piece_type: PieceType::King,
        hint: Disambiguation::None,
        to: rule.squares(color, side).king_to,
        capture: false,
        category,
        promotion: None,
        check: check_marker(captures.name("check")),
    })
}

fn parse_pawn(color: Color, token: &str) -> Result<Option<MoveDescriptor>, NotationError> {
    let Some(captures) = PAWN.captures(token) else {
        return Ok(None);
    };

    let to = Square::try_from(&captures["to"])?;
    let hint = match captures.name("from") {
        Some(from) => {
            let file = File::try_from(from.as_str().chars().next().unwrap_or_default())?;
            // A pawn only captures on a neighbouring file.
            if (u8::from(file) as i8 - u8::from(to.file()) as i8).abs() != 1 {
                return Err(NotationError::InvalidNotation(token.to_string()));
            }
            Disambiguation::File(file)
        }
        None => Disambiguation::None,
    };

    let promotion = captures
        .name("promotion")
        .map(|m| PieceType::try_from(m.as_str().chars().next().unwrap_or_default()))
        .transpose()
        .map_err(|_| NotationError::InvalidNotation(token.to_string()))?;
    let last_rank = Rank::R8.relative_to_color(color);
    match (to.rank() == last_rank, promotion) {
        (true, None) => return Err(NotationError::MissingPromotion(token.to_string())),
        (false, Some(_)) => return Err(NotationError::UnexpectedPromotion(token.to_string())),
        _ => {}
    }

    let capture = hint != Disambiguation::None;
    Ok(Some(MoveDescriptor {
        color,
        piece_type: PieceType::Pawn,
        hint,
        to,
        capture,
        category: MoveDescriptor::categorize(PieceType::Pawn, capture, promotion),
        promotion,
        check: check_marker(captures.name("check")),
    }))
}

fn parse_piece(color: Color, token: &str) -> Result<Option<MoveDescriptor>, NotationError> {
    let Some(captures) = PIECE.captures(token) else {
        return Ok(None);
    };

    let piece_type = PieceType::try_from(captures["piece"].chars().next().unwrap_or_default())
        .map_err(|_| NotationError::InvalidNotation(token.to_string()))?;
    let hint = parse_hint(&captures["hint"])?;
    if piece_type == PieceType::King && hint != Disambiguation::None {
        return Err(NotationError::InvalidNotation(token.to_string()));
    }
    let capture = captures.name("capture").is_some();

    Ok(Some(MoveDescriptor {
        color,
        piece_type,
        hint,
        to: Square::try_from(&captures["to"])?,
        capture,
        category: MoveDescriptor::categorize(piece_type, capture, None),
        promotion: None,
        check: check_marker(captures.name("check")),
    }))
}

/// Parses a move written in standard algebraic notation.
///
/// The resolver only checks the shape of the token. Whether a piece can actually make the move is
/// for the board to decide.
///
/// # Parameters
/// * `color` - The color of the side making the move
/// * `token` - The move, such as "e4", "Nbd2", "exd6", "a8=Q", "O-O-O" or "Qxf7#"
/// * `rule` - The castling rule table, used to find the destination of the king when castling
///
/// # Returns
/// * `Ok(MoveDescriptor)` - The structured description of the move
/// * `Err(NotationError)` - If the token is not a well-formed move
pub fn parse(color: Color, token: &str, rule: &CastlingRule) -> Result<MoveDescriptor, NotationError> {
    if let Some(descriptor) = parse_castle(color, token, rule) {
        return Ok(descriptor);
    }
    if let Some(descriptor) = parse_pawn(color, token)? {
        return Ok(descriptor);
    }
    if let Some(descriptor) = parse_piece(color, token)? {
        return Ok(descriptor);
    }
    Err(NotationError::InvalidNotation(token.to_string()))
}

/// Parses a move in long algebraic (coordinate) notation, such as "e2e4" or "e7e8q".
///
/// # Returns
/// The origin, the destination and the promotion piece type if any.
pub fn parse_lan(token: &str) -> Result<(Square, Square, Option<PieceType>), NotationError> {
    let captures = LAN.captures(token).ok_or_else(|| NotationError::InvalidNotation(token.to_string()))?;

    let from = Square::try_from(&captures["from"])?;
    let to = Square::try_from(&captures["to"])?;
    let promotion = captures
        .name("promotion")
        .map(|m| PieceType::try_from(m.as_str().chars().next().unwrap_or_default()))
        .transpose()
        .map_err(|_| NotationError::InvalidNotation(token.to_string()))?;

    Ok((from, to, promotion))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn san(color: Color, token: &str) -> Result<MoveDescriptor, NotationError> {
        parse(color, token, &CastlingRule::standard())
    }

    #[test]
    fn test_parse_pawn_moves() {
        let e4 = san(Color::White, "e4").unwrap();
        assert_eq!(e4.piece_type, PieceType::Pawn);
        assert_eq!(e4.to, Square::E4);
        assert_eq!(e4.category, MoveCategory::Pawn);
        assert_eq!(e4.hint, Disambiguation::None);
        assert!(!e4.capture);

        let exd6 = san(Color::White, "exd6").unwrap();
        assert_eq!(exd6.hint, Disambiguation::File(File::E));
        assert_eq!(exd6.category, MoveCategory::PawnCaptures);
        assert!(exd6.capture);
    }

    #[test]
    fn test_parse_promotions() {
        let a8 = san(Color::White, "a8=Q").unwrap();
        assert_eq!(a8.promotion, Some(PieceType::Queen));
        assert_eq!(a8.category, MoveCategory::PawnPromotes);

        let bxa1 = san(Color::Black, "bxa1=N+").unwrap();
        assert_eq!(bxa1.promotion, Some(PieceType::Knight));
        assert_eq!(bxa1.category, MoveCategory::PawnCapturesAndPromotes);
        assert_eq!(bxa1.check, CheckMarker::Check);

        assert_eq!(san(Color::White, "a8"), Err(NotationError::MissingPromotion("a8".to_string())));
        assert_eq!(san(Color::White, "a6=Q"), Err(NotationError::UnexpectedPromotion("a6=Q".to_string())));
        assert!(san(Color::White, "a8=K").is_err());
    }

    #[test]
    fn test_parse_piece_moves() {
        let nf3 = san(Color::White, "Nf3").unwrap();
        assert_eq!(nf3.piece_type, PieceType::Knight);
        assert_eq!(nf3.category, MoveCategory::Piece);

        let rook = san(Color::Black, "R1xa3").unwrap();
        assert_eq!(rook.hint, Disambiguation::Rank(Rank::R1));
        assert_eq!(rook.category, MoveCategory::PieceCaptures);

        let queen = san(Color::White, "Qh4xe1#").unwrap();
        assert_eq!(queen.hint, Disambiguation::Square(Square::H4));
        assert_eq!(queen.to, Square::E1);
        assert_eq!(queen.check, CheckMarker::Mate);

        let king = san(Color::White, "Kxe2").unwrap();
        assert_eq!(king.category, MoveCategory::KingCaptures);
    }

    #[test]
    fn test_parse_castling() {
        let short = san(Color::White, "O-O").unwrap();
        assert_eq!(short.category, MoveCategory::CastleShort);
        assert_eq!(short.to, Square::G1);
        assert_eq!(short.castling_side(), Some(CastlingSide::Kingside));

        let long = san(Color::Black, "0-0-0+").unwrap();
        assert_eq!(long.category, MoveCategory::CastleLong);
        assert_eq!(long.to, Square::C8);
        assert_eq!(long.check, CheckMarker::Check);
    }

    #[test]
    fn test_parse_invalid_tokens() {
        for token in ["", "e9", "Ze4", "exe5", "axc3", "Kde2", "O-O-O-O", "e4 ", "Nf3!!", "1-0"] {
            assert!(san(Color::White, token).is_err(), "{token} should be rejected");
        }
    }

    #[test]
    fn test_display_round_trip() {
        for token in ["e4", "exd6", "Nbd2", "R1a3", "Qh4xe1#", "a8=Q+", "O-O", "O-O-O"] {
            assert_eq!(san(Color::White, token).unwrap().to_string(), token);
        }
    }

    #[test]
    fn test_parse_lan() {
        assert_eq!(parse_lan("e2e4"), Ok((Square::E2, Square::E4, None)));
        assert_eq!(parse_lan("e7e8q"), Ok((Square::E7, Square::E8, Some(PieceType::Queen))));
        assert!(parse_lan("e2e9").is_err());
        assert!(parse_lan("e2").is_err());
        assert!(parse_lan("e7e8k").is_err());
    }
}
