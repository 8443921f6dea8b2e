use cozy_chess::Board;

/// Parse a FEN string into a board.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    fen.trim()
        .parse()
        .map_err(|_| FenError::InvalidFormat(fen.to_string()))
}

/// Format a board as its canonical FEN string.
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN: {0}")]
    InvalidFormat(String),
}
