//! Diamond search, a faster path behind the same per-block contract.
//!
//! Starts at the zero displacement, walks a large diamond until no
//! neighbour improves, then refines with a small diamond. Candidates
//! obey the same window and in-frame rule as full search. The result is
//! a local optimum; full search stays the reference.

use super::cost::BlockCost;
use super::full_search::{full_search, BlockMatch, Candidates};
use crate::capture::Frame;

const LARGE_DIAMOND: [(i32, i32); 8] = [
    (0, -2),
    (-1, -1),
    (1, -1),
    (-2, 0),
    (2, 0),
    (-1, 1),
    (1, 1),
    (0, 2),
];

const SMALL_DIAMOND: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Diamond search for the block at `(x, y)` of `target`.
///
/// Blocks whose zero displacement is not a valid candidate (truncated
/// edge blocks) are handed to [`full_search`].
///
/// # Panics
///
/// Panics if `(x, y)` is not inside `target`.
pub fn diamond_search(
    reference: &Frame,
    target: &Frame,
    x: u32,
    y: u32,
    block_size: u32,
    search_range: i32,
    cost: &dyn BlockCost,
) -> BlockMatch {
    let mut candidates = Candidates::new(reference, target, cost, x, y, block_size);
    if !candidates.offer(0, 0) {
        return full_search(reference, target, x, y, block_size, search_range, cost);
    }

    for pattern in [&LARGE_DIAMOND[..], &SMALL_DIAMOND[..]] {
        loop {
            let (_, cx, cy) = match candidates.best {
                Some(best) => best,
                None => break,
            };
            let mut improved = false;
            for &(px, py) in pattern {
                let (nx, ny) = (cx + px, cy + py);
                if nx.abs() > search_range || ny.abs() > search_range {
                    continue;
                }
                improved |= candidates.offer(nx, ny);
            }
            if !improved {
                break;
            }
        }
    }

    candidates.finish()
}
