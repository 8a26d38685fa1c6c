pub mod attacks;
pub mod bitboard;
pub mod board;
pub mod castling;
pub mod config;
pub mod coordinates;
pub mod eval;
pub mod fen;
pub mod r#move;
pub mod movetext;
pub mod pgn;
pub mod piece;
pub mod position;
pub mod san;
