pub mod board_display;
pub mod converters;
pub mod fen;
pub mod pgn;
pub mod position;
pub mod types;
pub mod uci_move;

pub use board_display::{DisplayBoard, DisplayBoardError};
pub use converters::{format_piece, format_square, parse_square};
pub use pgn::{parse_pgn, PgnError, PgnGame, PgnHeaders};
pub use position::{MoveError, MoveRecord, Position};
pub use types::{PieceColor, PieceKind};
pub use uci_move::{format_coordinate_move, parse_coordinate_move, CoordinateMoveError};
