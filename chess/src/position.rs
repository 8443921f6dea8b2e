//! Immutable position wrapper around cozy-chess.
//!
//! Every mutation returns a fresh `Position`; callers that need history keep
//! their own ordered list of `MoveRecord`s and replay it from the initial
//! position. Replay from the immutable record list is the correctness anchor
//! for undo, so nothing here carries hidden incremental state.

use cozy_chess::{Board, File, GameStatus, Move, Piece, Rank, Square};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::pgn::san::format_san;
use crate::types::PieceColor;
use crate::uci_move::format_coordinate_move;

/// A board configuration. Cheap to clone, compared by FEN equality.
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
}

/// The outcome of one successfully applied move. Immutable once created.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    pub mv: Move,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub san: String,
    pub fen_after: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error("Illegal move: {0}")]
    Illegal(String),
    #[error(transparent)]
    Fen(#[from] FenError),
}

impl Position {
    /// The standard starting position.
    pub fn standard() -> Self {
        Self {
            board: Board::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self {
            board: parse_fen(fen)?,
        })
    }

    pub fn to_fen(&self) -> String {
        format_fen(&self.board)
    }

    pub(crate) fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.board.side_to_move().into()
    }

    pub fn is_occupied(&self, sq: Square) -> bool {
        self.board.piece_on(sq).is_some()
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }

    /// All legal moves in this position.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    /// Destination squares a piece on `from` may move to. Castling moves are
    /// reported as the king's destination (g1/c1), not cozy-chess's
    /// king-takes-rook target, since these squares feed click highlights.
    pub fn legal_targets(&self, from: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = self
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.from == from)
            .map(|mv| {
                if self.is_castling(mv) {
                    let file = if mv.to.file() > mv.from.file() {
                        File::G
                    } else {
                        File::C
                    };
                    Square::new(file, mv.from.rank())
                } else {
                    mv.to
                }
            })
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    /// Apply a move given as origin/destination squares, the way a board UI
    /// reports it. Castling may arrive in king-moves-two-squares form (e1g1);
    /// a pawn reaching the last rank promotes to `promotion`, defaulting to a
    /// queen. Returns the successor position and the move record, or leaves
    /// the position untouched on an illegal move.
    pub fn apply(
        &self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<(Position, MoveRecord), MoveError> {
        let legal = self.legal_moves();
        let mut candidate = self.normalize_castling(
            Move {
                from,
                to,
                promotion: None,
            },
            &legal,
        );

        if self.board.piece_on(candidate.from) == Some(Piece::Pawn)
            && is_last_rank(candidate.to, self.board.side_to_move())
        {
            candidate.promotion = Some(promotion.unwrap_or(Piece::Queen));
        }

        if !legal.contains(&candidate) {
            return Err(MoveError::Illegal(format_coordinate_move(candidate)));
        }

        Ok(self.play_legal(candidate))
    }

    /// Apply an exact legal move (cozy-chess representation).
    pub fn apply_move(&self, mv: Move) -> Result<(Position, MoveRecord), MoveError> {
        if !self.legal_moves().contains(&mv) {
            return Err(MoveError::Illegal(format_coordinate_move(mv)));
        }
        Ok(self.play_legal(mv))
    }

    /// Replay a prefix of recorded moves from this position.
    pub fn replay(&self, records: &[MoveRecord]) -> Result<Position, MoveError> {
        let mut position = self.clone();
        for record in records {
            let (next, _) = position.apply_move(record.mv)?;
            position = next;
        }
        Ok(position)
    }

    fn play_legal(&self, mv: Move) -> (Position, MoveRecord) {
        // Legality is established by the caller.
        let piece = self
            .board
            .piece_on(mv.from)
            .unwrap_or(Piece::Pawn);
        let san = format_san(&self.board, mv);
        let captured = self.captured_by(mv, piece);

        let mut board = self.board.clone();
        board.play_unchecked(mv);
        let next = Position { board };
        let fen_after = next.to_fen();

        let record = MoveRecord {
            mv,
            from: mv.from,
            to: mv.to,
            piece,
            captured,
            promotion: mv.promotion,
            san,
            fen_after,
        };
        (next, record)
    }

    fn captured_by(&self, mv: Move, piece: Piece) -> Option<Piece> {
        if self.is_castling(mv) {
            return None;
        }
        match self.board.piece_on(mv.to) {
            Some(target) => Some(target),
            // A pawn landing diagonally on an empty square captures en passant.
            None if piece == Piece::Pawn && mv.from.file() != mv.to.file() => Some(Piece::Pawn),
            None => None,
        }
    }

    /// cozy-chess encodes castling as king-takes-own-rook.
    fn is_castling(&self, mv: Move) -> bool {
        self.board.piece_on(mv.from) == Some(Piece::King)
            && self.board.color_on(mv.to) == Some(self.board.side_to_move())
    }

    /// Convert king-moves-two-squares castling coordinates (e1g1, e1c1) to
    /// the king-takes-rook form, when that conversion yields a legal move.
    fn normalize_castling(&self, mv: Move, legal: &[Move]) -> Move {
        let on_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
        if !on_back_rank
            || mv.from.file() != File::E
            || self.board.piece_on(mv.from) != Some(Piece::King)
        {
            return mv;
        }

        let rook_file = match mv.to.file() {
            File::G => File::H,
            File::C => File::A,
            _ => return mv,
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if legal.contains(&converted) {
            converted
        } else {
            mv
        }
    }
}

fn is_last_rank(sq: Square, side: cozy_chess::Color) -> bool {
    match side {
        cozy_chess::Color::White => sq.rank() == Rank::Eighth,
        cozy_chess::Color::Black => sq.rank() == Rank::First,
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.to_fen() == other.to_fen()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::standard()
    }
}
