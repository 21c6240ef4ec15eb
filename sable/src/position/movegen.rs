//! Pseudo-legal move generation. The public entry point fills a list with
//! every move that obeys piece movement rules for the side to move; the
//! caller filters the result through `Position::legal_move` to reject moves
//! that leave the own king in check.
//!
//! When the side to move is in check, only evasion candidates are emitted:
//! king steps off the attack rays, and (for single checks) captures of the
//! checker or interpositions on the check line.

use crate::core::bitboard::BitBoard;
use crate::core::move_list::MoveList;
use crate::core::piece_move::{Move, MoveKind};
use crate::core::sq::{NO_SQ, SQ};
use crate::core::{CastleSide, Piece, PieceType, Player, Rank};
use crate::lookup;

use super::Position;

/// Fills `list` with pseudo-legal moves for the side to move.
pub(crate) fn generate_pseudo_legal(pos: &Position, list: &mut MoveList) {
    if pos.in_check() {
        generate_evasions(pos, list);
    } else {
        let target = !pos.occupied_player(pos.turn());
        generate_pawn_moves(pos, target, list);
        generate_piece_moves(pos, target, list);
        generate_king_moves(pos, target, list);
        generate_castling(pos, list);
    }
}

/// Evasion candidates while in check.
fn generate_evasions(pos: &Position, list: &mut MoveList) {
    debug_assert!(pos.in_check());
    let us = pos.turn();
    let ksq = pos.king_sq(us);
    let king = pos.piece_at(ksq);

    // Squares behind the king on a slider's ray are not real escapes; mask
    // the extended rays of every checking slider out of the king's moves.
    let mut slider_rays = BitBoard::EMPTY;
    let mut sliders = pos.checkers()
        & !(pos.piece_bb_both(PieceType::P) | pos.piece_bb_both(PieceType::N));
    while let Some((check_sq, check_bb)) = sliders.pop_some_lsb_and_bit() {
        slider_rays |= lookup::line_bb(check_sq, ksq) ^ check_bb;
    }

    let king_targets = lookup::king_moves(ksq) & !slider_rays & !pos.occupied_player(us);
    for to in king_targets {
        list.push(Move::make(
            ksq,
            to,
            king,
            pos.piece_at(to),
            MoveKind::Normal,
        ));
    }

    // With two checkers only the king can move.
    if pos.checkers().more_than_one() {
        return;
    }

    let checker_sq = pos.checkers().bit_scan_forward();
    let target = lookup::between_bb(checker_sq, ksq) | checker_sq.to_bb();
    generate_pawn_moves(pos, target, list);
    generate_piece_moves(pos, target, list);
}

/// Knight, bishop, rook and queen moves into `target`.
fn generate_piece_moves(pos: &Position, target: BitBoard, list: &mut MoveList) {
    let us = pos.turn();
    let occ = pos.occupied();

    for pt in [PieceType::N, PieceType::B, PieceType::R, PieceType::Q] {
        let piece = Piece::make(us, pt);
        let mut movers = pos.piece_bb(us, pt);
        while let Some(from) = movers.pop_some_lsb() {
            let attacks = match pt {
                PieceType::N => lookup::knight_moves(from),
                PieceType::B => lookup::bishop_moves(occ, from),
                PieceType::R => lookup::rook_moves(occ, from),
                _ => lookup::queen_moves(occ, from),
            };
            let mut dests = attacks & target & !pos.occupied_player(us);
            while let Some(to) = dests.pop_some_lsb() {
                list.push(Move::make(from, to, piece, pos.piece_at(to), MoveKind::Normal));
            }
        }
    }
}

/// Plain king moves into `target` (castling handled separately).
fn generate_king_moves(pos: &Position, target: BitBoard, list: &mut MoveList) {
    let us = pos.turn();
    let ksq = pos.king_sq(us);
    let king = pos.piece_at(ksq);
    let mut dests = lookup::king_moves(ksq) & target & !pos.occupied_player(us);
    while let Some(to) = dests.pop_some_lsb() {
        list.push(Move::make(ksq, to, king, pos.piece_at(to), MoveKind::Normal));
    }
}

/// Castling moves. Requires the right to exist, the rook on its start
/// square, the path between king and rook empty, and every square the king
/// crosses (including the destination) free of enemy attack.
fn generate_castling(pos: &Position, list: &mut MoveList) {
    debug_assert!(!pos.in_check());
    let us = pos.turn();
    let them = us.other();
    let ksq = pos.king_sq(us);
    let king = pos.piece_at(ksq);
    let occ = pos.occupied();

    for side in [CastleSide::King, CastleSide::Queen] {
        if !pos.castling().has(us, side) {
            continue;
        }
        let (k_to, r_from, _r_to) = Position::castle_squares(us, side);
        if pos.piece_at(r_from) != Piece::make(us, PieceType::R) {
            continue;
        }
        let path = BitBoard(crate::core::masks::CASTLING_PATH[us as usize][side as usize]);
        if (path & occ).is_not_empty() {
            continue;
        }
        // King transit squares: everything between the start and end
        // squares of the king, end inclusive, must be safe.
        let mut transit = lookup::between_bb(ksq, k_to) | k_to.to_bb();
        let mut safe = true;
        while let Some(sq) = transit.pop_some_lsb() {
            if (pos.attackers_to(sq, occ) & pos.occupied_player(them)).is_not_empty() {
                safe = false;
                break;
            }
        }
        if safe {
            let kind = match side {
                CastleSide::King => MoveKind::ShortCastle,
                CastleSide::Queen => MoveKind::LongCastle,
            };
            list.push(Move::make(ksq, k_to, king, Piece::None, kind));
        }
    }
}

/// Pawn pushes, captures, promotions and en-passant into `target`.
fn generate_pawn_moves(pos: &Position, target: BitBoard, list: &mut MoveList) {
    let us = pos.turn();
    let them = us.other();
    let pawn = Piece::make(us, PieceType::P);
    let pawns = pos.piece_bb(us, PieceType::P);
    let empty = !pos.occupied();
    let enemies = pos.occupied_player(them);

    let (last_rank, third_rank): (BitBoard, BitBoard) = match us {
        Player::White => (BitBoard::RANK_8, BitBoard::RANK_3),
        Player::Black => (BitBoard::RANK_1, BitBoard::RANK_6),
    };
    let promoting = pawns & pre_promotion_rank(us);
    let quiet_pawns = pawns & !pre_promotion_rank(us);

    let up = |bb: BitBoard| -> BitBoard {
        match us {
            Player::White => bb.shift_north(),
            Player::Black => bb.shift_south(),
        }
    };
    let up_west = |bb: BitBoard| -> BitBoard {
        match us {
            Player::White => bb.shift_north_west(),
            Player::Black => bb.shift_south_west(),
        }
    };
    let up_east = |bb: BitBoard| -> BitBoard {
        match us {
            Player::White => bb.shift_north_east(),
            Player::Black => bb.shift_south_east(),
        }
    };
    let push = us.pawn_push();

    // Single and double pushes.
    let mut push_one = up(quiet_pawns) & empty;
    let mut push_two = up(push_one & third_rank) & empty & target;
    push_one &= target;
    while let Some(to) = push_one.pop_some_lsb() {
        let from = SQ((to.0 as i8 - push) as u8);
        list.push(Move::make_quiet(from, to, pawn));
    }
    while let Some(to) = push_two.pop_some_lsb() {
        let from = SQ((to.0 as i8 - 2 * push) as u8);
        list.push(Move::make_quiet(from, to, pawn));
    }

    // Ordinary captures.
    let mut cap_west = up_west(quiet_pawns) & enemies & target;
    let mut cap_east = up_east(quiet_pawns) & enemies & target;
    let west_delta: i8 = match us {
        Player::White => 7,
        Player::Black => -9,
    };
    let east_delta: i8 = match us {
        Player::White => 9,
        Player::Black => -7,
    };
    while let Some(to) = cap_west.pop_some_lsb() {
        let from = SQ((to.0 as i8 - west_delta) as u8);
        list.push(Move::make_capture(from, to, pawn, pos.piece_at(to)));
    }
    while let Some(to) = cap_east.pop_some_lsb() {
        let from = SQ((to.0 as i8 - east_delta) as u8);
        list.push(Move::make_capture(from, to, pawn, pos.piece_at(to)));
    }

    // Promotions, pushing and capturing.
    if promoting.is_not_empty() {
        let mut promo_push = up(promoting) & empty & target & last_rank;
        while let Some(to) = promo_push.pop_some_lsb() {
            let from = SQ((to.0 as i8 - push) as u8);
            push_promotions(list, from, to, pawn, Piece::None);
        }
        let mut promo_west = up_west(promoting) & enemies & target & last_rank;
        while let Some(to) = promo_west.pop_some_lsb() {
            let from = SQ((to.0 as i8 - west_delta) as u8);
            push_promotions(list, from, to, pawn, pos.piece_at(to));
        }
        let mut promo_east = up_east(promoting) & enemies & target & last_rank;
        while let Some(to) = promo_east.pop_some_lsb() {
            let from = SQ((to.0 as i8 - east_delta) as u8);
            push_promotions(list, from, to, pawn, pos.piece_at(to));
        }
    }

    // En passant. While evading a check, the capture is a candidate when
    // the victim is the checker or the landing square blocks the line; the
    // legality filter settles the rest.
    if pos.ep_square() != NO_SQ {
        let ep_sq = pos.ep_square();
        debug_assert_eq!(ep_sq.rank(), us.relative_rank(Rank::R6));
        let victim_sq = SQ((ep_sq.0 as i8 - push) as u8);
        if target.is_not_empty()
            && (target & (victim_sq.to_bb() | ep_sq.to_bb())).is_empty()
            && pos.in_check()
        {
            return;
        }
        let mut capturers = quiet_pawns & lookup::pawn_attacks_from(ep_sq, them);
        while let Some(from) = capturers.pop_some_lsb() {
            list.push(Move::make(
                from,
                ep_sq,
                pawn,
                Piece::make(them, PieceType::P),
                MoveKind::EnPassant,
            ));
        }
    }
}

/// The rank a pawn stands on just before promoting.
fn pre_promotion_rank(us: Player) -> BitBoard {
    match us {
        Player::White => BitBoard::RANK_7,
        Player::Black => BitBoard::RANK_2,
    }
}

/// Emits all four promotion choices for one pawn move.
fn push_promotions(list: &mut MoveList, from: SQ, to: SQ, pawn: Piece, captured: Piece) {
    for kind in [
        MoveKind::PromoteQ,
        MoveKind::PromoteR,
        MoveKind::PromoteB,
        MoveKind::PromoteN,
    ] {
        list.push(Move::make(from, to, pawn, captured, kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_pos_counts() {
        let pos = Position::start_pos();
        assert_eq!(pos.legal_moves().len(), 20);
        assert_eq!(pos.pseudo_legal_moves().len(), 20);
    }

    #[test]
    fn legal_is_subset_of_pseudo() {
        let pos =
            Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let legal = pos.legal_moves();
        let pseudo = pos.pseudo_legal_moves();
        assert!(legal.len() <= pseudo.len());
        for m in legal.iter() {
            assert!(pseudo.contains(*m));
        }
    }

    #[test]
    fn double_check_only_king_moves() {
        // Rook on e8 and bishop on h4 both give check.
        let pos = Position::from_fen("4r2k/8/8/8/7b/8/8/4K3 w - - 0 1").unwrap();
        assert!(pos.in_check());
        assert!(pos.checkers().more_than_one());
        let moves = pos.legal_moves();
        assert!(!moves.is_empty());
        for m in moves.iter() {
            assert_eq!(m.moved_piece().type_of(), PieceType::K);
        }
    }

    #[test]
    fn castle_through_check_rejected() {
        // Black rook on f8 attacks f1: white may not castle short.
        let pos = Position::from_fen("5r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = pos.legal_moves();
        assert!(!moves.iter().any(|m| m.kind() == MoveKind::ShortCastle));
        assert!(moves.iter().any(|m| m.kind() == MoveKind::LongCastle));
    }

    #[test]
    fn ep_discovered_check_rejected() {
        // After the en-passant capture both pawns leave the fifth rank and
        // the rook on h5 would hit the king on a5.
        let pos = Position::from_fen("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2").unwrap();
        let moves = pos.legal_moves();
        assert!(!moves.iter().any(|m| m.kind() == MoveKind::EnPassant));
    }

    #[test]
    fn promotions_come_in_four() {
        let pos = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let moves = pos.legal_moves();
        let promos = moves.iter().filter(|m| m.is_promotion()).count();
        assert_eq!(promos, 4);
    }
}
