//! Board-wide constants: file/rank masks, start-position boards, castling
//! squares and paths, display tables.

/// Number of players.
pub const PLAYER_CNT: usize = 2;
/// Number of piece types, including the `None` sentinel.
pub const PIECE_TYPE_CNT: usize = 7;
/// Number of player/piece combinations a nibble can encode.
pub const PIECE_CNT: usize = 16;
/// Number of squares.
pub const SQ_CNT: usize = 64;
/// Number of files.
pub const FILE_CNT: usize = 8;
/// Number of ranks.
pub const RANK_CNT: usize = 8;
/// Castling sides per player.
pub const CASTLING_SIDES: usize = 2;
/// Number of distinct castling-rights combinations for both players.
pub const ALL_CASTLING_RIGHTS: usize = 16;

/// Bit representation of file A.
pub const FILE_A: u64 = 0x0101_0101_0101_0101;
/// Bit representation of file B.
pub const FILE_B: u64 = FILE_A << 1;
/// Bit representation of file C.
pub const FILE_C: u64 = FILE_A << 2;
/// Bit representation of file D.
pub const FILE_D: u64 = FILE_A << 3;
/// Bit representation of file E.
pub const FILE_E: u64 = FILE_A << 4;
/// Bit representation of file F.
pub const FILE_F: u64 = FILE_A << 5;
/// Bit representation of file G.
pub const FILE_G: u64 = FILE_A << 6;
/// Bit representation of file H.
pub const FILE_H: u64 = FILE_A << 7;

/// Bit representation of rank 1.
pub const RANK_1: u64 = 0x0000_0000_0000_00FF;
/// Bit representation of rank 2.
pub const RANK_2: u64 = RANK_1 << 8;
/// Bit representation of rank 3.
pub const RANK_3: u64 = RANK_1 << 16;
/// Bit representation of rank 4.
pub const RANK_4: u64 = RANK_1 << 24;
/// Bit representation of rank 5.
pub const RANK_5: u64 = RANK_1 << 32;
/// Bit representation of rank 6.
pub const RANK_6: u64 = RANK_1 << 40;
/// Bit representation of rank 7.
pub const RANK_7: u64 = RANK_1 << 48;
/// Bit representation of rank 8.
pub const RANK_8: u64 = RANK_1 << 56;

/// All dark squares.
pub const DARK_SQUARES: u64 = 0xAA55_AA55_AA55_AA55;
/// All light squares.
pub const LIGHT_SQUARES: u64 = !DARK_SQUARES;

/// File masks indexed A..H.
pub static FILE_BB: [u64; FILE_CNT] = [
    FILE_A, FILE_B, FILE_C, FILE_D, FILE_E, FILE_F, FILE_G, FILE_H,
];

/// Rank masks indexed 1..8.
pub static RANK_BB: [u64; RANK_CNT] = [
    RANK_1, RANK_2, RANK_3, RANK_4, RANK_5, RANK_6, RANK_7, RANK_8,
];

/// North on the board (rank increases).
pub const NORTH: i8 = 8;
/// South on the board.
pub const SOUTH: i8 = -8;
/// East on the board (file increases).
pub const EAST: i8 = 1;
/// West on the board.
pub const WEST: i8 = -1;
/// Diagonal directions.
pub const NORTH_EAST: i8 = 9;
pub const NORTH_WEST: i8 = 7;
pub const SOUTH_EAST: i8 = -7;
pub const SOUTH_WEST: i8 = -9;

/// White pieces at the start position.
pub const START_WHITE_OCC: u64 = RANK_1 | RANK_2;
/// Black pieces at the start position.
pub const START_BLACK_OCC: u64 = RANK_7 | RANK_8;
/// All pieces at the start position.
pub const START_OCC_ALL: u64 = START_WHITE_OCC | START_BLACK_OCC;

pub const START_W_PAWN: u64 = RANK_2;
pub const START_W_KNIGHT: u64 = 0b0100_0010;
pub const START_W_BISHOP: u64 = 0b0010_0100;
pub const START_W_ROOK: u64 = 0b1000_0001;
pub const START_W_QUEEN: u64 = 0b0000_1000;
pub const START_W_KING: u64 = 0b0001_0000;

pub const START_B_PAWN: u64 = RANK_7;
pub const START_B_KNIGHT: u64 = START_W_KNIGHT << 56;
pub const START_B_BISHOP: u64 = START_W_BISHOP << 56;
pub const START_B_ROOK: u64 = START_W_ROOK << 56;
pub const START_B_QUEEN: u64 = START_W_QUEEN << 56;
pub const START_B_KING: u64 = START_W_KING << 56;

/// Starting square of the white king.
pub const WHITE_KING_START: u8 = 4;
/// Starting square of the black king.
pub const BLACK_KING_START: u8 = 60;
/// Starting square of the white king-side rook.
pub const ROOK_WHITE_KSIDE_START: u8 = 7;
/// Starting square of the white queen-side rook.
pub const ROOK_WHITE_QSIDE_START: u8 = 0;
/// Starting square of the black king-side rook.
pub const ROOK_BLACK_KSIDE_START: u8 = 63;
/// Starting square of the black queen-side rook.
pub const ROOK_BLACK_QSIDE_START: u8 = 56;

/// Castling-rights bit for white king-side.
pub const C_WHITE_K_MASK: u8 = 0b0000_1000;
/// Castling-rights bit for white queen-side.
pub const C_WHITE_Q_MASK: u8 = 0b0000_0100;
/// Castling-rights bit for black king-side.
pub const C_BLACK_K_MASK: u8 = 0b0000_0010;
/// Castling-rights bit for black queen-side.
pub const C_BLACK_Q_MASK: u8 = 0b0000_0001;

/// Squares that must be empty for a white king-side castle (f1, g1).
pub const CASTLING_PATH_WHITE_K_SIDE: u64 = (1 << 5) | (1 << 6);
/// Squares that must be empty for a white queen-side castle (b1, c1, d1).
pub const CASTLING_PATH_WHITE_Q_SIDE: u64 = (1 << 1) | (1 << 2) | (1 << 3);
/// Squares that must be empty for a black king-side castle (f8, g8).
pub const CASTLING_PATH_BLACK_K_SIDE: u64 = CASTLING_PATH_WHITE_K_SIDE << 56;
/// Squares that must be empty for a black queen-side castle (b8, c8, d8).
pub const CASTLING_PATH_BLACK_Q_SIDE: u64 = CASTLING_PATH_WHITE_Q_SIDE << 56;

/// Empty-square castling paths indexed [player][side], king side first.
pub static CASTLING_PATH: [[u64; CASTLING_SIDES]; PLAYER_CNT] = [
    [CASTLING_PATH_WHITE_K_SIDE, CASTLING_PATH_WHITE_Q_SIDE],
    [CASTLING_PATH_BLACK_K_SIDE, CASTLING_PATH_BLACK_Q_SIDE],
];

/// Rook start squares indexed [player][side], king side first.
pub static CASTLING_ROOK_START: [[u8; CASTLING_SIDES]; PLAYER_CNT] = [
    [ROOK_WHITE_KSIDE_START, ROOK_WHITE_QSIDE_START],
    [ROOK_BLACK_KSIDE_START, ROOK_BLACK_QSIDE_START],
];

/// Square index to string name.
///
/// # Examples
///
/// ```
/// use sable::core::masks::SQ_DISPLAY;
///
/// assert_eq!(SQ_DISPLAY[0], "a1");
/// assert_eq!(SQ_DISPLAY[63], "h8");
/// ```
pub static SQ_DISPLAY: [&str; SQ_CNT] = [
    "a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1", "a2", "b2", "c2", "d2", "e2", "f2", "g2", "h2",
    "a3", "b3", "c3", "d3", "e3", "f3", "g3", "h3", "a4", "b4", "c4", "d4", "e4", "f4", "g4", "h4",
    "a5", "b5", "c5", "d5", "e5", "f5", "g5", "h5", "a6", "b6", "c6", "d6", "e6", "f6", "g6", "h6",
    "a7", "b7", "c7", "d7", "e7", "f7", "g7", "h7", "a8", "b8", "c8", "d8", "e8", "f8", "g8", "h8",
];

/// File index to character.
pub static FILE_DISPLAYS: [char; FILE_CNT] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// Rank index to character.
pub static RANK_DISPLAYS: [char; RANK_CNT] = ['1', '2', '3', '4', '5', '6', '7', '8'];
