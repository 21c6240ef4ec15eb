//! Perft: exhaustive move-path enumeration used to validate the move
//! generator against known node counts.

use rayon::prelude::*;

use super::Position;

/// Node counts per move category, for the deeper diagnostics.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerftNodes {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
}

/// Number of leaf nodes reachable in `depth` plies.
pub fn perft(pos: &Position, depth: u16) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut pos = pos.clone();
    inner_perft(&mut pos, depth)
}

fn inner_perft(pos: &mut Position, depth: u16) -> u64 {
    let moves = pos.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut count = 0;
    for m in moves.iter() {
        pos.make_move(*m);
        count += inner_perft(pos, depth - 1);
        pos.unmake_move();
    }
    count
}

/// Leaf counts per root move, the classic "divide" debugging view.
pub fn perft_divide(pos: &Position, depth: u16) -> Vec<(String, u64)> {
    let mut pos = pos.clone();
    let moves = pos.legal_moves();
    let mut out = Vec::with_capacity(moves.len());
    for m in moves.iter() {
        pos.make_move(*m);
        let nodes = if depth <= 1 {
            1
        } else {
            inner_perft(&mut pos, depth - 1)
        };
        pos.unmake_move();
        out.push((m.to_uci(), nodes));
    }
    out
}

/// Perft with the root moves searched in parallel.
pub fn perft_parallel(pos: &Position, depth: u16) -> u64 {
    if depth <= 2 {
        return perft(pos, depth);
    }
    let moves = pos.legal_moves();
    moves
        .to_vec()
        .par_iter()
        .map(|m| {
            let mut child = pos.clone();
            child.make_move(*m);
            inner_perft(&mut child, depth - 1)
        })
        .sum()
}

/// Leaf-node counts broken down by move category.
pub fn perft_all(pos: &Position, depth: u16) -> PerftNodes {
    let mut counts = PerftNodes::default();
    let mut pos = pos.clone();
    inner_perft_all(&mut pos, depth, &mut counts);
    counts
}

fn inner_perft_all(pos: &mut Position, depth: u16, counts: &mut PerftNodes) {
    if depth == 0 {
        counts.nodes += 1;
        return;
    }
    for m in pos.legal_moves().iter() {
        if depth == 1 {
            counts.nodes += 1;
            if m.is_capture() {
                counts.captures += 1;
            }
            if m.is_en_passant() {
                counts.en_passant += 1;
            }
            if m.is_castle() {
                counts.castles += 1;
            }
            if m.is_promotion() {
                counts.promotions += 1;
            }
            pos.make_move(*m);
            if pos.in_check() {
                counts.checks += 1;
            }
            pos.unmake_move();
        } else {
            pos.make_move(*m);
            inner_perft_all(pos, depth - 1, counts);
            pos.unmake_move();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_pos_shallow() {
        let pos = Position::start_pos();
        assert_eq!(perft(&pos, 1), 20);
        assert_eq!(perft(&pos, 2), 400);
        assert_eq!(perft(&pos, 3), 8_902);
    }

    #[test]
    fn divide_sums_to_perft() {
        let pos = Position::start_pos();
        let total: u64 = perft_divide(&pos, 3).iter().map(|(_, n)| n).sum();
        assert_eq!(total, perft(&pos, 3));
    }

    #[test]
    fn parallel_agrees() {
        let pos = Position::start_pos();
        assert_eq!(perft_parallel(&pos, 4), perft(&pos, 4));
    }

    #[test]
    fn all_counts_start() {
        let pos = Position::start_pos();
        let counts = perft_all(&pos, 3);
        assert_eq!(counts.nodes, 8_902);
        assert_eq!(counts.captures, 34);
        assert_eq!(counts.en_passant, 0);
        assert_eq!(counts.checks, 12);
    }
}
