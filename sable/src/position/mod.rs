//! The [`Position`]: the full state of a chess game, mutated exclusively by
//! make/unmake and queried by move generation and the search.
//!
//! The position keeps a dual representation: one bitboard per player/piece
//! pair (plus derived occupancy boards) and a 64-entry square-to-piece
//! array. Both are updated together by every mutation; `is_okay` checks
//! they agree in debug builds.
//!
//! Undo works through an explicit snapshot stack. `make_move` pushes the
//! irreversible parts of the state (castling, en-passant, clock, captured
//! piece, check set, hash keys) and mutates in place; `unmake_move` pops
//! the snapshot and replays the piece movement backwards, restoring the
//! position bit-for-bit.

pub mod castling;
pub mod fen;
pub mod movegen;
pub mod perft;
pub mod san;
pub mod state;

use std::fmt;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::move_list::MoveList;
use crate::core::piece_move::{Move, MoveKind};
use crate::core::sq::{NO_SQ, SQ};
use crate::core::{CastleSide, Piece, PieceType, Player, ALL_PIECE_TYPES};
use crate::lookup;

use self::castling::Castling;
use self::state::StateSnapshot;

pub use self::fen::FenError;
pub use self::san::MoveParseError;

/// The state of a chess game.
#[derive(Clone)]
pub struct Position {
    turn: Player,
    piece_bb: [[BitBoard; PIECE_TYPE_CNT]; PLAYER_CNT],
    occ: [BitBoard; PLAYER_CNT],
    occ_all: BitBoard,
    board: [Piece; SQ_CNT],

    castling: Castling,
    ep_square: SQ,
    rule_50: u16,
    half_moves: u16,
    ply: u16,
    key: u64,
    pawn_key: u64,
    checkers: BitBoard,

    history: Vec<Move>,
    undo_stack: Vec<StateSnapshot>,
}

impl Position {
    /// An empty board with White to move. Pieces are placed by the FEN
    /// parser; an empty position is not itself playable.
    pub(crate) fn blank() -> Position {
        lookup::init_lookups();
        Position {
            turn: Player::White,
            piece_bb: [[BitBoard::EMPTY; PIECE_TYPE_CNT]; PLAYER_CNT],
            occ: [BitBoard::EMPTY; PLAYER_CNT],
            occ_all: BitBoard::EMPTY,
            board: [Piece::None; SQ_CNT],
            castling: Castling::empty(),
            ep_square: NO_SQ,
            rule_50: 0,
            half_moves: 0,
            ply: 0,
            key: 0,
            pawn_key: 0,
            checkers: BitBoard::EMPTY,
            history: Vec::new(),
            undo_stack: Vec::new(),
        }
    }

    /// The standard starting position.
    pub fn start_pos() -> Position {
        Position::from_fen(fen::START_POS_FEN).expect("start position FEN is valid")
    }

    // ------- accessors -------

    /// The side to move.
    #[inline(always)]
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// The Zobrist key of the position.
    #[inline(always)]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// The pawn-and-king Zobrist key.
    #[inline(always)]
    pub fn pawn_key(&self) -> u64 {
        self.pawn_key
    }

    /// The piece standing on `sq`, `Piece::None` if empty.
    #[inline(always)]
    pub fn piece_at(&self, sq: SQ) -> Piece {
        debug_assert!(sq.is_okay());
        self.board[sq.0 as usize]
    }

    /// Bitboard of one player's pieces of one type.
    #[inline(always)]
    pub fn piece_bb(&self, player: Player, pt: PieceType) -> BitBoard {
        debug_assert!(pt.is_some());
        self.piece_bb[player as usize][pt as usize]
    }

    /// Bitboard of both players' pieces of one type.
    #[inline(always)]
    pub fn piece_bb_both(&self, pt: PieceType) -> BitBoard {
        self.piece_bb(Player::White, pt) | self.piece_bb(Player::Black, pt)
    }

    /// All occupied squares.
    #[inline(always)]
    pub fn occupied(&self) -> BitBoard {
        self.occ_all
    }

    /// Squares occupied by one player.
    #[inline(always)]
    pub fn occupied_player(&self, player: Player) -> BitBoard {
        self.occ[player as usize]
    }

    /// The king square of a player.
    #[inline(always)]
    pub fn king_sq(&self, player: Player) -> SQ {
        self.piece_bb(player, PieceType::K).to_sq()
    }

    /// Rooks and queens of a player.
    #[inline(always)]
    pub fn straight_sliders(&self, player: Player) -> BitBoard {
        self.piece_bb(player, PieceType::R) | self.piece_bb(player, PieceType::Q)
    }

    /// Bishops and queens of a player.
    #[inline(always)]
    pub fn diagonal_sliders(&self, player: Player) -> BitBoard {
        self.piece_bb(player, PieceType::B) | self.piece_bb(player, PieceType::Q)
    }

    /// The en-passant target square, `NO_SQ` when unavailable.
    #[inline(always)]
    pub fn ep_square(&self) -> SQ {
        self.ep_square
    }

    /// Current castling rights.
    #[inline(always)]
    pub fn castling(&self) -> Castling {
        self.castling
    }

    /// The halfmove clock (plies since the last pawn move or capture).
    #[inline(always)]
    pub fn rule_50(&self) -> u16 {
        self.rule_50
    }

    /// Total plies played since the game began.
    #[inline(always)]
    pub fn half_moves(&self) -> u16 {
        self.half_moves
    }

    /// Plies played since this `Position` value was created.
    #[inline(always)]
    pub fn ply(&self) -> u16 {
        self.ply
    }

    /// Pieces currently giving check to the side to move.
    #[inline(always)]
    pub fn checkers(&self) -> BitBoard {
        self.checkers
    }

    /// True if the side to move is in check.
    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.checkers.is_not_empty()
    }

    /// The last move made, if any. `None` after a null move as well.
    #[inline]
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().copied().filter(|m| !m.is_null())
    }

    /// Non-pawn, non-king material of `player`, in centipawns. Zero means
    /// the player has only king and pawns left (the zugzwang-prone shape
    /// null-move pruning must avoid).
    pub fn non_pawn_material(&self, player: Player) -> i32 {
        let mut total = 0;
        for pt in [PieceType::N, PieceType::B, PieceType::R, PieceType::Q] {
            total += self.piece_bb(player, pt).count_bits() as i32 * pt.value();
        }
        total
    }

    // ------- attacks -------

    /// Every piece of either color attacking `sq` under the given
    /// occupancy. Slider attacks respect blockers in `occupied`.
    pub fn attackers_to(&self, sq: SQ, occupied: BitBoard) -> BitBoard {
        (lookup::pawn_attacks_from(sq, Player::Black) & self.piece_bb(Player::White, PieceType::P))
            | (lookup::pawn_attacks_from(sq, Player::White)
                & self.piece_bb(Player::Black, PieceType::P))
            | (lookup::knight_moves(sq) & self.piece_bb_both(PieceType::N))
            | (lookup::king_moves(sq) & self.piece_bb_both(PieceType::K))
            | (lookup::rook_moves(occupied, sq)
                & (self.straight_sliders(Player::White) | self.straight_sliders(Player::Black)))
            | (lookup::bishop_moves(occupied, sq)
                & (self.diagonal_sliders(Player::White) | self.diagonal_sliders(Player::Black)))
    }

    /// True if `player`'s king square is attacked by the opponent.
    #[inline]
    pub fn king_attacked(&self, player: Player) -> bool {
        (self.attackers_to(self.king_sq(player), self.occ_all)
            & self.occupied_player(player.other()))
        .is_not_empty()
    }

    /// Pieces blocking a slider attack on `s`, plus the sliders doing the
    /// pinning. A blocker may belong to either player.
    fn slider_blockers(&self, sliders: BitBoard, s: SQ) -> (BitBoard, BitBoard) {
        let mut blockers = BitBoard::EMPTY;
        let mut pinners = BitBoard::EMPTY;

        let mut snipers: BitBoard = sliders
            & ((lookup::rook_moves(BitBoard::EMPTY, s)
                & (self.piece_bb_both(PieceType::R) | self.piece_bb_both(PieceType::Q)))
                | (lookup::bishop_moves(BitBoard::EMPTY, s)
                    & (self.piece_bb_both(PieceType::B) | self.piece_bb_both(PieceType::Q))));

        while let Some(sniper_sq) = snipers.pop_some_lsb() {
            let b = lookup::between_bb(s, sniper_sq) & self.occ_all;
            if b.is_not_empty() && !b.more_than_one() {
                blockers |= b;
                let s_player = self.piece_at(s).player();
                if (b & self.occupied_player(s_player)).is_not_empty() {
                    pinners |= sniper_sq.to_bb();
                }
            }
        }
        (blockers, pinners)
    }

    /// Pieces of `player` pinned to their own king.
    pub fn pinned_pieces(&self, player: Player) -> BitBoard {
        let (blockers, _) = self.slider_blockers(
            self.occupied_player(player.other()),
            self.king_sq(player),
        );
        blockers & self.occupied_player(player)
    }

    // ------- move generation -------

    /// Every legal move for the side to move.
    pub fn legal_moves(&self) -> MoveList {
        let mut list = MoveList::default();
        let mut pseudo = MoveList::default();
        movegen::generate_pseudo_legal(self, &mut pseudo);
        for m in pseudo.iter() {
            if self.legal_move(*m) {
                list.push(*m);
            }
        }
        list
    }

    /// Every pseudo-legal move for the side to move: correct piece
    /// movement, but a move may still leave the own king in check.
    pub fn pseudo_legal_moves(&self) -> MoveList {
        let mut list = MoveList::default();
        movegen::generate_pseudo_legal(self, &mut list);
        list
    }

    /// Tests a pseudo-legal move (one produced by this position's
    /// generator) for full legality: the own king must not be left in
    /// check.
    pub fn legal_move(&self, m: Move) -> bool {
        let us = self.turn;
        let them = us.other();
        let from = m.from();
        let to = m.to();
        let ksq = self.king_sq(us);

        if m.kind() == MoveKind::EnPassant {
            // Remove both pawns from the occupancy and look for a discovered
            // slider attack on the king, which also covers the rank-pin.
            let victim = SQ((to.0 as i8 - us.pawn_push()) as u8);
            let occ = (self.occ_all ^ from.to_bb() ^ victim.to_bb()) | to.to_bb();
            return (lookup::rook_moves(occ, ksq) & self.straight_sliders(them)).is_empty()
                && (lookup::bishop_moves(occ, ksq) & self.diagonal_sliders(them)).is_empty();
        }

        if m.moved_piece().type_of() == PieceType::K {
            // Castling transit squares were tested during generation. For
            // other king moves the king must step off any attack ray, so it
            // is removed from the occupancy before the attack test.
            return m.is_castle()
                || (self.attackers_to(to, self.occ_all ^ from.to_bb())
                    & self.occupied_player(them))
                .is_empty();
        }

        // A non-king move is legal if the piece is not pinned, or moves
        // along the pin line. When in check, the generator only emits
        // blocking and capturing candidates, so this test is sufficient.
        (self.pinned_pieces(us) & from.to_bb()).is_empty() || lookup::aligned(from, to, ksq)
    }

    /// True if the side to move has been checkmated.
    pub fn checkmate(&self) -> bool {
        self.in_check() && self.legal_moves().is_empty()
    }

    /// True if the side to move has no legal move but is not in check.
    pub fn stalemate(&self) -> bool {
        !self.in_check() && self.legal_moves().is_empty()
    }

    // ------- draws -------

    /// Fifty-move rule: one hundred plies without a pawn move or capture.
    #[inline]
    pub fn fifty_move_rule(&self) -> bool {
        self.rule_50 >= 100
    }

    /// Number of earlier positions in the game history with the same
    /// Zobrist key, scanning back only to the last irreversible move.
    pub fn repetitions(&self) -> u32 {
        let mut count = 0;
        let mut i = self.undo_stack.len();
        while i > 0 {
            i -= 1;
            let m = self.history[i];
            if m.is_null()
                || m.is_capture()
                || m.is_castle()
                || m.moved_piece().type_of() == PieceType::P
            {
                break;
            }
            if self.undo_stack[i].key == self.key {
                count += 1;
            }
        }
        count
    }

    /// Draw by threefold repetition: this position occurred at least twice
    /// before.
    #[inline]
    pub fn threefold_repetition(&self) -> bool {
        self.repetitions() >= 2
    }

    /// Draw by insufficient material: bare kings, a lone minor, or bishops
    /// that all stand on squares of one color.
    pub fn insufficient_material(&self) -> bool {
        if (self.piece_bb_both(PieceType::P)
            | self.piece_bb_both(PieceType::R)
            | self.piece_bb_both(PieceType::Q))
        .is_not_empty()
        {
            return false;
        }
        let knights = self.piece_bb_both(PieceType::N);
        let bishops = self.piece_bb_both(PieceType::B);
        let minors = (knights | bishops).count_bits();
        if minors <= 1 {
            return true;
        }
        knights.is_empty()
            && ((bishops & BitBoard::DARK_SQUARES).is_empty()
                || (bishops & BitBoard::LIGHT_SQUARES).is_empty())
    }

    // ------- piece movement primitives -------

    #[inline]
    fn put_piece(&mut self, piece: Piece, sq: SQ) {
        debug_assert!(self.piece_at(sq).is_none());
        let bb = sq.to_bb();
        let player = piece.player();
        self.occ_all |= bb;
        self.occ[player as usize] |= bb;
        self.piece_bb[player as usize][piece.type_of() as usize] |= bb;
        self.board[sq.0 as usize] = piece;
    }

    #[inline]
    fn remove_piece(&mut self, piece: Piece, sq: SQ) {
        debug_assert_eq!(self.piece_at(sq), piece);
        let bb = sq.to_bb();
        let player = piece.player();
        self.occ_all ^= bb;
        self.occ[player as usize] ^= bb;
        self.piece_bb[player as usize][piece.type_of() as usize] ^= bb;
        self.board[sq.0 as usize] = Piece::None;
    }

    #[inline]
    fn shift_piece(&mut self, piece: Piece, from: SQ, to: SQ) {
        debug_assert_ne!(from, to);
        debug_assert_eq!(self.piece_at(from), piece);
        debug_assert!(self.piece_at(to).is_none());
        let comb = from.to_bb() | to.to_bb();
        let player = piece.player();
        self.occ_all ^= comb;
        self.occ[player as usize] ^= comb;
        self.piece_bb[player as usize][piece.type_of() as usize] ^= comb;
        self.board[from.0 as usize] = Piece::None;
        self.board[to.0 as usize] = piece;
    }

    /// King and rook destinations for a castle of `player` on `side`:
    /// `(king_to, rook_from, rook_to)`.
    #[inline]
    pub fn castle_squares(player: Player, side: CastleSide) -> (SQ, SQ, SQ) {
        let (k_to, r_from, r_to) = match side {
            CastleSide::King => (SQ::G1, SQ::H1, SQ::F1),
            CastleSide::Queen => (SQ::C1, SQ::A1, SQ::D1),
        };
        (
            player.relative_square(k_to),
            player.relative_square(r_from),
            player.relative_square(r_to),
        )
    }

    // ------- make / unmake -------

    /// Makes a move. The move must be legal for this position; debug
    /// builds verify the structural invariants afterwards, release builds
    /// leave violations undefined.
    pub fn make_move(&mut self, m: Move) {
        debug_assert!(!m.is_null());
        debug_assert_ne!(m.from(), m.to());

        self.undo_stack.push(StateSnapshot {
            castling: self.castling,
            ep_square: self.ep_square,
            rule_50: self.rule_50,
            captured: m.captured_piece(),
            checkers: self.checkers,
            key: self.key,
            pawn_key: self.pawn_key,
        });
        self.history.push(m);

        let us = self.turn;
        let them = us.other();
        let from = m.from();
        let to = m.to();
        let moved = m.moved_piece();
        let captured = m.captured_piece();

        debug_assert_eq!(self.piece_at(from), moved);
        debug_assert_eq!(moved.player(), us);

        self.key ^= lookup::z_side();

        if self.ep_square != NO_SQ {
            self.key ^= lookup::z_ep(self.ep_square);
            self.ep_square = NO_SQ;
        }

        match m.kind() {
            MoveKind::ShortCastle | MoveKind::LongCastle => {
                let side = if m.kind() == MoveKind::ShortCastle {
                    CastleSide::King
                } else {
                    CastleSide::Queen
                };
                let (k_to, r_from, r_to) = Position::castle_squares(us, side);
                debug_assert_eq!(to, k_to);
                let rook = Piece::make(us, PieceType::R);
                self.shift_piece(moved, from, to);
                self.shift_piece(rook, r_from, r_to);
                self.key ^= lookup::z_piece(from, moved) ^ lookup::z_piece(to, moved);
                self.key ^= lookup::z_piece(r_from, rook) ^ lookup::z_piece(r_to, rook);
                self.pawn_key ^= lookup::z_piece(from, moved) ^ lookup::z_piece(to, moved);
            }
            MoveKind::EnPassant => {
                let victim_sq = SQ((to.0 as i8 - us.pawn_push()) as u8);
                let victim = Piece::make(them, PieceType::P);
                debug_assert_eq!(self.piece_at(victim_sq), victim);
                self.remove_piece(victim, victim_sq);
                self.shift_piece(moved, from, to);
                self.key ^= lookup::z_piece(victim_sq, victim);
                self.key ^= lookup::z_piece(from, moved) ^ lookup::z_piece(to, moved);
                self.pawn_key ^= lookup::z_piece(victim_sq, victim);
                self.pawn_key ^= lookup::z_piece(from, moved) ^ lookup::z_piece(to, moved);
            }
            MoveKind::Normal => {
                if captured.is_some() {
                    self.remove_piece(captured, to);
                    self.key ^= lookup::z_piece(to, captured);
                    if matches!(captured.type_of(), PieceType::P) {
                        self.pawn_key ^= lookup::z_piece(to, captured);
                    }
                }
                self.shift_piece(moved, from, to);
                self.key ^= lookup::z_piece(from, moved) ^ lookup::z_piece(to, moved);
                if matches!(moved.type_of(), PieceType::P | PieceType::K) {
                    self.pawn_key ^=
                        lookup::z_piece(from, moved) ^ lookup::z_piece(to, moved);
                }
                // A double pawn push opens an en-passant chance.
                if moved.type_of() == PieceType::P && from.file() == to.file() {
                    let dist = lookup::distance(from, to);
                    if dist == 2 {
                        self.ep_square = SQ((from.0 + to.0) / 2);
                        self.key ^= lookup::z_ep(self.ep_square);
                    }
                }
            }
            _ => {
                // Promotion, capturing or not.
                debug_assert!(m.is_promotion());
                debug_assert_eq!(moved.type_of(), PieceType::P);
                if captured.is_some() {
                    self.remove_piece(captured, to);
                    self.key ^= lookup::z_piece(to, captured);
                }
                let promo = Piece::make(us, m.promotion_piece());
                self.remove_piece(moved, from);
                self.put_piece(promo, to);
                self.key ^= lookup::z_piece(from, moved) ^ lookup::z_piece(to, promo);
                self.pawn_key ^= lookup::z_piece(from, moved);
            }
        }

        if !self.castling.is_empty() {
            let removed = self.castling.update(from, to);
            if removed != 0 {
                self.key ^= lookup::z_castle(removed);
            }
        }

        if moved.type_of() == PieceType::P || captured.is_some() {
            self.rule_50 = 0;
        } else {
            self.rule_50 += 1;
        }

        self.half_moves += 1;
        self.ply += 1;
        self.turn = them;
        self.checkers =
            self.attackers_to(self.king_sq(them), self.occ_all) & self.occupied_player(us);

        debug_assert!(self.is_okay().is_ok(), "{:?}", self.is_okay());
    }

    /// Undoes the most recent `make_move`. The position afterwards is
    /// bit-identical to the one before the paired make.
    ///
    /// # Panics
    ///
    /// Panics if there is no move to undo or the last action was a null
    /// move.
    pub fn unmake_move(&mut self) {
        let m = self.history.pop().expect("no move to unmake");
        assert!(!m.is_null(), "last action was a null move");
        let snap = self.undo_stack.pop().expect("undo stack empty");

        self.turn = self.turn.other();
        let us = self.turn;
        let them = us.other();
        let from = m.from();
        let to = m.to();
        let moved = m.moved_piece();
        let captured = m.captured_piece();

        match m.kind() {
            MoveKind::ShortCastle | MoveKind::LongCastle => {
                let side = if m.kind() == MoveKind::ShortCastle {
                    CastleSide::King
                } else {
                    CastleSide::Queen
                };
                let (k_to, r_from, r_to) = Position::castle_squares(us, side);
                let rook = Piece::make(us, PieceType::R);
                self.shift_piece(rook, r_to, r_from);
                self.shift_piece(moved, k_to, from);
            }
            MoveKind::EnPassant => {
                let victim_sq = SQ((to.0 as i8 - us.pawn_push()) as u8);
                self.shift_piece(moved, to, from);
                self.put_piece(Piece::make(them, PieceType::P), victim_sq);
            }
            MoveKind::Normal => {
                self.shift_piece(moved, to, from);
                if captured.is_some() {
                    self.put_piece(captured, to);
                }
            }
            _ => {
                let promo = Piece::make(us, m.promotion_piece());
                self.remove_piece(promo, to);
                self.put_piece(moved, from);
                if captured.is_some() {
                    self.put_piece(captured, to);
                }
            }
        }

        self.castling = snap.castling;
        self.ep_square = snap.ep_square;
        self.rule_50 = snap.rule_50;
        self.checkers = snap.checkers;
        self.key = snap.key;
        self.pawn_key = snap.pawn_key;
        self.half_moves -= 1;
        self.ply -= 1;

        debug_assert!(self.is_okay().is_ok());
    }

    /// Makes a null move: flips the side to move and clears the en-passant
    /// right without touching any piece. Used by null-move pruning.
    ///
    /// # Panics
    ///
    /// Panics if the side to move is in check; a null move is meaningless
    /// there.
    pub fn make_null_move(&mut self) {
        assert!(!self.in_check(), "null move while in check");

        self.undo_stack.push(StateSnapshot {
            castling: self.castling,
            ep_square: self.ep_square,
            rule_50: self.rule_50,
            captured: Piece::None,
            checkers: self.checkers,
            key: self.key,
            pawn_key: self.pawn_key,
        });
        self.history.push(Move::null());

        self.key ^= lookup::z_side();
        if self.ep_square != NO_SQ {
            self.key ^= lookup::z_ep(self.ep_square);
            self.ep_square = NO_SQ;
        }
        self.rule_50 += 1;
        self.half_moves += 1;
        self.ply += 1;
        self.turn = self.turn.other();
        // In a legal position the side not on move is never in check, so
        // the new mover starts with an empty checker set.
        self.checkers = BitBoard::EMPTY;
    }

    /// Undoes a null move.
    ///
    /// # Panics
    ///
    /// Panics if the last action was not a null move.
    pub fn unmake_null_move(&mut self) {
        let m = self.history.pop().expect("no move to unmake");
        assert!(m.is_null(), "last action was a real move");
        let snap = self.undo_stack.pop().expect("undo stack empty");

        self.turn = self.turn.other();
        self.castling = snap.castling;
        self.ep_square = snap.ep_square;
        self.rule_50 = snap.rule_50;
        self.checkers = snap.checkers;
        self.key = snap.key;
        self.pawn_key = snap.pawn_key;
        self.half_moves -= 1;
        self.ply -= 1;
    }

    // ------- static exchange evaluation -------

    /// Static exchange evaluation of a move: the material balance of the
    /// best capture sequence on the destination square, in centipawns from
    /// the mover's point of view. Castling always scores zero.
    pub fn see(&self, m: Move) -> i32 {
        if m.is_castle() {
            return 0;
        }

        let to = m.to();
        let mut gain = [0i32; 32];
        let mut depth: usize = 0;
        let mut side = self.turn;
        let mut from_bb = m.from().to_bb();
        let mut occupied = self.occ_all;
        let mut attacker_value = m.moved_piece().type_of().value();

        gain[0] = if m.is_en_passant() {
            let victim_sq = SQ((to.0 as i8 - side.pawn_push()) as u8);
            occupied ^= victim_sq.to_bb();
            PieceType::P.value()
        } else {
            m.captured_piece().type_of().value()
        };

        loop {
            depth += 1;
            side = side.other();
            gain[depth] = attacker_value - gain[depth - 1];
            if (-gain[depth - 1]).max(gain[depth]) < 0 {
                break;
            }
            occupied ^= from_bb;
            let attackers = self.attackers_to(to, occupied) & occupied;
            let mine = attackers & self.occupied_player(side);
            match self.least_valuable(mine) {
                Some((sq, pt)) => {
                    from_bb = sq.to_bb();
                    attacker_value = pt.value();
                }
                None => break,
            }
            if depth == 31 {
                break;
            }
        }

        while depth > 1 {
            depth -= 1;
            gain[depth - 1] = -((-gain[depth - 1]).max(gain[depth]));
        }
        gain[0]
    }

    /// The least valuable piece of a set, with its square.
    fn least_valuable(&self, set: BitBoard) -> Option<(SQ, PieceType)> {
        if set.is_empty() {
            return None;
        }
        for pt in ALL_PIECE_TYPES {
            let mut found = BitBoard::EMPTY;
            for player in [Player::White, Player::Black] {
                found |= self.piece_bb(player, pt) & set;
            }
            if found.is_not_empty() {
                return Some((found.bit_scan_forward(), pt));
            }
        }
        None
    }

    // ------- consistency -------

    /// Structural invariant check: the bitboards and the square array must
    /// agree, the occupancy unions must hold, and each side must have
    /// exactly one king. Used by debug assertions after every mutation.
    pub fn is_okay(&self) -> Result<(), &'static str> {
        let mut white = BitBoard::EMPTY;
        let mut black = BitBoard::EMPTY;
        for pt in ALL_PIECE_TYPES {
            white |= self.piece_bb(Player::White, pt);
            black |= self.piece_bb(Player::Black, pt);
        }
        if white != self.occ[Player::White as usize] {
            return Err("white occupancy out of sync");
        }
        if black != self.occ[Player::Black as usize] {
            return Err("black occupancy out of sync");
        }
        if (white | black) != self.occ_all {
            return Err("total occupancy out of sync");
        }
        if (white & black).is_not_empty() {
            return Err("players overlap");
        }
        for sq in 0..SQ_CNT as u8 {
            let piece = self.board[sq as usize];
            let bb = SQ(sq).to_bb();
            if piece.is_none() {
                if (bb & self.occ_all).is_not_empty() {
                    return Err("square array says empty, bitboards disagree");
                }
            } else if (self.piece_bb(piece.player(), piece.type_of()) & bb).is_empty() {
                return Err("square array piece missing from its bitboard");
            }
        }
        if self.piece_bb(Player::White, PieceType::K).count_bits() != 1
            || self.piece_bb(Player::Black, PieceType::K).count_bits() != 1
        {
            return Err("king count is not one");
        }
        if self.history.len() != self.undo_stack.len() {
            return Err("history and undo stack lengths differ");
        }
        Ok(())
    }

    /// Recomputes both Zobrist keys from scratch. The incremental keys in
    /// `make_move` must always equal this fold; the property tests check
    /// exactly that.
    pub fn rehash(&self) -> (u64, u64) {
        let mut key = 0u64;
        let mut pawn_key = 0u64;
        let mut occ = self.occ_all;
        while let Some(sq) = occ.pop_some_lsb() {
            let piece = self.piece_at(sq);
            let z = lookup::z_piece(sq, piece);
            key ^= z;
            if matches!(piece.type_of(), PieceType::P | PieceType::K) {
                pawn_key ^= z;
            }
        }
        if self.ep_square != NO_SQ {
            key ^= lookup::z_ep(self.ep_square);
        }
        key ^= lookup::z_castle(self.castling.bits());
        if self.turn == Player::Black {
            key ^= lookup::z_side();
        }
        (key, pawn_key)
    }

    /// Sets both keys from a full rehash. Used at construction.
    pub(crate) fn set_keys(&mut self) {
        let (key, pawn_key) = self.rehash();
        self.key = key;
        self.pawn_key = pawn_key;
    }

    /// Recomputes the checker set. Used at construction.
    pub(crate) fn set_checkers(&mut self) {
        self.checkers = self.attackers_to(self.king_sq(self.turn), self.occ_all)
            & self.occupied_player(self.turn.other());
    }

    pub(crate) fn place_for_setup(&mut self, piece: Piece, sq: SQ) {
        self.put_piece(piece, sq);
    }

    pub(crate) fn setup_state(
        &mut self,
        turn: Player,
        castling: Castling,
        ep_square: SQ,
        rule_50: u16,
        half_moves: u16,
    ) {
        self.turn = turn;
        self.castling = castling;
        self.ep_square = ep_square;
        self.rule_50 = rule_50;
        self.half_moves = half_moves;
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} |", rank + 1)?;
            for file in 0..8 {
                let piece = self.board[rank * 8 + file];
                if piece.is_some() {
                    write!(f, " {}", piece.character())?;
                } else {
                    write!(f, " .")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "   ----------------")?;
        writeln!(f, "    a b c d e f g h")?;
        writeln!(f, "{} to move    {}", self.turn, self.fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Position({})", self.fen())
    }
}

impl PartialEq for Position {
    /// Board-state equality: piece placement, side to move, castling,
    /// en-passant and clocks. Histories are not compared.
    fn eq(&self, other: &Position) -> bool {
        self.turn == other.turn
            && self.board[..] == other.board[..]
            && self.castling == other.castling
            && self.ep_square == other.ep_square
            && self.rule_50 == other.rule_50
            && self.key == other.key
            && self.pawn_key == other.pawn_key
            && self.checkers == other.checkers
    }
}
