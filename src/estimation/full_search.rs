//! Exhaustive block matching.
//!
//! For one block, every displacement in the `(2r + 1)^2` window is
//! visited in ascending `(dy, dx)` order. A candidate counts only if the
//! full `block_size × block_size` reference block stays inside the frame;
//! the first strictly lowest cost wins, so ties go to the candidate
//! visited earlier.

use super::cost::BlockCost;
use super::field::MotionVector;
use crate::capture::Frame;

/// Outcome of searching a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMatch {
    /// Chosen displacement.
    pub vector: MotionVector,
    /// Cost of the chosen displacement, `None` if no candidate was valid.
    pub cost: Option<u64>,
    /// Displacements considered, valid or not.
    pub visited: u64,
    /// Displacements whose reference block was inside the frame.
    pub evaluated: u64,
}

impl BlockMatch {
    /// True if the block fell back to the zero vector for lack of candidates.
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.cost.is_none()
    }
}

/// Running best candidate, shared by the search strategies.
pub(crate) struct Candidates<'a> {
    reference: &'a Frame,
    target: &'a Frame,
    cost: &'a dyn BlockCost,
    x: u32,
    y: u32,
    block_size: u32,
    extent: (u32, u32),
    pub(crate) best: Option<(u64, i32, i32)>,
    pub(crate) visited: u64,
    pub(crate) evaluated: u64,
}

impl<'a> Candidates<'a> {
    pub(crate) fn new(
        reference: &'a Frame,
        target: &'a Frame,
        cost: &'a dyn BlockCost,
        x: u32,
        y: u32,
        block_size: u32,
    ) -> Self {
        assert!(
            x < target.width() && y < target.height(),
            "block origin ({}, {}) outside {}x{} target",
            x,
            y,
            target.width(),
            target.height()
        );
        Self {
            reference,
            target,
            cost,
            x,
            y,
            block_size,
            extent: target.tile_extent(x, y, block_size),
            best: None,
            visited: 0,
            evaluated: 0,
        }
    }

    /// Cost of displacement `(dx, dy)`, or `None` if the candidate leaves the frame.
    pub(crate) fn cost_at(&mut self, dx: i32, dy: i32) -> Option<u64> {
        self.visited += 1;
        let ref_x = self.x as i64 + dx as i64;
        let ref_y = self.y as i64 + dy as i64;
        if !self.reference.contains_block(ref_x, ref_y, self.block_size) {
            return None;
        }
        self.evaluated += 1;

        // A truncated target block is compared with the matching top-left
        // portion of the full-size candidate.
        let (w, h) = self.extent;
        let candidate = self.reference.block(ref_x as u32, ref_y as u32, w, h);
        let current = self.target.block(self.x, self.y, w, h);
        Some(self.cost.cost(&candidate, &current))
    }

    /// Evaluates `(dx, dy)` and keeps it if strictly better. Returns true on improvement.
    pub(crate) fn offer(&mut self, dx: i32, dy: i32) -> bool {
        match self.cost_at(dx, dy) {
            Some(cost) if self.best.map_or(true, |(best, _, _)| cost < best) => {
                self.best = Some((cost, dx, dy));
                true
            }
            _ => false,
        }
    }

    pub(crate) fn finish(self) -> BlockMatch {
        let (cost, dx, dy) = match self.best {
            Some((cost, dx, dy)) => (Some(cost), dx, dy),
            None => (None, 0, 0),
        };
        BlockMatch {
            vector: MotionVector::new(self.x, self.y, dx, dy),
            cost,
            visited: self.visited,
            evaluated: self.evaluated,
        }
    }
}

/// Searches the whole window for the block at `(x, y)` of `target`.
///
/// The block size is not checked against the frame: a block that can
/// never fit simply has no valid candidate and gets the zero vector.
///
/// # Panics
///
/// Panics if `(x, y)` is not inside `target`.
pub fn full_search(
    reference: &Frame,
    target: &Frame,
    x: u32,
    y: u32,
    block_size: u32,
    search_range: i32,
    cost: &dyn BlockCost,
) -> BlockMatch {
    let mut candidates = Candidates::new(reference, target, cost, x, y, block_size);

    for dy in -search_range..=search_range {
        for dx in -search_range..=search_range {
            candidates.offer(dx, dy);
        }
    }

    candidates.finish()
}
