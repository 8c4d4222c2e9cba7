use std::collections::VecDeque;
use std::fmt;

use crate::block::{combine_inserts, combine_removes, Block, InstructionKind};

/// An ordered edit program over an implicit byte-indexed text.
///
/// Blocks are appended through the operation-specific entry points
/// ([`insert`](Expression::insert), [`remove`](Expression::remove),
/// [`replace`](Expression::replace)); each append immediately runs the
/// rewrite rules for the current optimization level, so the stored
/// sequence always satisfies that level's invariant:
///
/// - **0** — append-only, order preserved exactly as received.
/// - **1** — the sequence partitions into the INSERT run, then the
///   REMOVE run, then the REPLACE run, each sorted by start, with
///   positions adjusted so the reordered program means the same thing.
/// - **2** — level 1, plus an INSERT landing exactly where a prior
///   REMOVE begins collapses to a REPLACE over their overlap, and a
///   REMOVE overlapping a prior INSERT cancels the overlap from both.
/// - **3** — level 2, plus a later REPLACE at the same start that
///   covers an earlier one entirely drops the earlier.
///
/// Applying the stored sequence to any text produces the same final
/// bytes as applying the appended instructions in arrival order.
#[derive(Clone)]
pub struct Expression {
    blocks: VecDeque<Block>,
    optimization_level: u8,
}

impl Expression {
    /// Creates an empty expression at optimization level 0.
    pub fn new() -> Self {
        Self {
            blocks: VecDeque::new(),
            optimization_level: 0,
        }
    }

    /// Creates an empty expression at the given optimization level.
    pub fn with_level(level: u8) -> Self {
        Self {
            blocks: VecDeque::new(),
            optimization_level: level,
        }
    }

    /// Number of instructions currently stored.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn optimization_level(&self) -> u8 {
        self.optimization_level
    }

    /// Iterates the stored instruction sequence in execution order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Changes the optimization level.
    ///
    /// Levels above 3 behave as 3. If the expression is non-empty the
    /// whole sequence is re-evaluated: the blocks are snapshotted,
    /// cleared, and re-inserted one by one through the
    /// level-appropriate paths, so the new level's invariant holds
    /// before this returns. Setting the same level twice is a no-op in
    /// effect (re-evaluating an already-normalized sequence reproduces
    /// it).
    pub fn set_optimization_level(&mut self, level: u8) {
        self.optimization_level = level;
        if !self.blocks.is_empty() {
            self.re_evaluate();
        }
    }

    fn re_evaluate(&mut self) {
        let snapshot: Vec<Block> = self.blocks.drain(..).collect();
        for block in snapshot {
            self.append(block);
        }
    }

    /// Appends a block through the entry point matching its kind.
    pub fn append(&mut self, block: Block) {
        match block.kind() {
            InstructionKind::Insert => self.insert(block),
            InstructionKind::Remove => self.remove(block),
            InstructionKind::Replace => self.replace(block),
        }
    }

    // ========================================================================
    // INSERT path
    // ========================================================================

    /// Appends an INSERT, merging it into the INSERT run.
    ///
    /// At level 2+ the incoming insert is first tested against the
    /// REMOVE run for an exact positional coincidence (which collapses
    /// the pair into a REPLACE). The survivor is then hoisted past the
    /// REMOVE and REPLACE runs into its sorted place among the
    /// inserts, shifting positions so the reordered program is
    /// equivalent.
    pub fn insert(&mut self, mut block: Block) {
        block.set_kind(InstructionKind::Insert);
        if block.is_empty() {
            return;
        }
        if self.optimization_level == 0 {
            self.blocks.push_back(block);
            return;
        }

        if self.optimization_level >= 2 {
            match self.collapse_remove_coincidence(block) {
                Some(rest) => block = rest,
                None => return,
            }
        }

        // Hoist the insert past the REPLACE and REMOVE runs. The
        // incoming block's coordinates are progressively translated
        // into the frame that precedes each remove it passes.
        let mut removes: VecDeque<Block> = VecDeque::new();
        let mut replaces: VecDeque<Block> = VecDeque::new();
        loop {
            let Some(kind) = self.blocks.back().map(Block::kind) else {
                break;
            };
            if kind == InstructionKind::Insert {
                break;
            }
            let mut last = self.blocks.pop_back().expect("tail exists");
            match kind {
                InstructionKind::Remove => {
                    if last.start() < block.start() {
                        // The remove contracts text below the insert
                        // point; executing the insert first means it
                        // must target the pre-removal coordinates.
                        block.shift_right(last.size());
                    } else {
                        last.shift_right(block.size());
                    }
                    removes.push_front(last);
                }
                InstructionKind::Replace => {
                    let overlap = last.overlap(&block);
                    if !overlap.is_empty() {
                        // The insertion lands inside the replaced
                        // range: split at the insertion point. Both
                        // halves survive, the right half displaced by
                        // the inserted bytes.
                        let mut pre = last.clone();
                        let mut post = last;
                        pre.remove(overlap.start, pre.end());
                        if overlap.start != post.start() {
                            post.remove(post.start(), overlap.start - 1);
                        }
                        if !post.is_empty() {
                            post.shift_right(block.size());
                            replaces.push_front(post);
                        }
                        if !pre.is_empty() {
                            replaces.push_front(pre);
                        }
                    } else if last.start() >= block.start() {
                        last.shift_right(block.size());
                        replaces.push_front(last);
                    } else {
                        replaces.push_front(last);
                    }
                }
                InstructionKind::Insert => unreachable!("loop breaks on INSERT"),
            }
        }

        // Walk into the INSERT run far enough to keep it sorted.
        let mut inserts_after: VecDeque<Block> = VecDeque::new();
        loop {
            let Some(last) = self.blocks.back() else { break };
            if last.kind() != InstructionKind::Insert {
                break;
            }
            if last.start() > block.start() {
                let mut last = self.blocks.pop_back().expect("tail exists");
                last.shift_right(block.size());
                inserts_after.push_front(last);
                continue;
            }
            if last.start() < block.start() {
                // The incoming insert lands strictly inside an earlier
                // one: fold it in.
                let merged = combine_inserts(last, &block);
                if !merged.is_empty() {
                    self.blocks.pop_back();
                    block = merged;
                    continue;
                }
            }
            break;
        }

        self.blocks.push_back(block);
        self.blocks.extend(inserts_after);
        self.blocks.extend(removes);
        self.blocks.extend(replaces);
    }

    /// Collapses an exact INSERT/REMOVE positional coincidence into a
    /// REPLACE.
    ///
    /// Walks the tail toward the INSERT run looking for a REMOVE whose
    /// start equals the incoming insert's effective position (its
    /// start translated past the intervening removes). On a hit, the
    /// overlap of the two becomes a REPLACE refilling the removed
    /// bytes with the inserted ones; both originals are trimmed by the
    /// overlap and the blocks pulled past on the way are re-attached
    /// with their positions adjusted for the refilled region.
    ///
    /// Returns the surviving insert for the caller to integrate, or
    /// `None` when the insert was consumed entirely.
    fn collapse_remove_coincidence(&mut self, mut block: Block) -> Option<Block> {
        let mut removes: VecDeque<Block> = VecDeque::new();
        let mut replaces: VecDeque<Block> = VecDeque::new();
        let mut left_shift: u64 = 0;

        loop {
            let Some(kind) = self.blocks.back().map(Block::kind) else {
                break;
            };
            if kind == InstructionKind::Insert {
                break;
            }
            let mut last = self.blocks.pop_back().expect("tail exists");
            match kind {
                InstructionKind::Replace => replaces.push_front(last),
                InstructionKind::Remove => {
                    // Only an exact coincidence is redundant.
                    if last.start() == block.start() + left_shift {
                        let overlap = last
                            .overlap_range(block.start() + left_shift, block.end() + left_shift);
                        let overlap_len = overlap.len();

                        let mut replacement = block.clone();
                        replacement.remove(overlap.end - left_shift + 1, block.end());
                        replacement.set_kind(InstructionKind::Replace);

                        let original_start = block.start();

                        last.remove(overlap.start, overlap.end);
                        block.remove(overlap.start - left_shift, overlap.end - left_shift);

                        if !last.is_empty() {
                            self.blocks.push_back(last);
                        }

                        // Re-attach the pulled blocks. Everything at or
                        // past the coincidence point moves right by the
                        // refilled length.
                        for mut b in removes.drain(..) {
                            if b.start() >= original_start + left_shift {
                                b.shift_right(overlap_len);
                            } else {
                                left_shift = left_shift.saturating_sub(b.size());
                            }
                            self.blocks.push_back(b);
                        }
                        let point = original_start + left_shift;
                        for mut b in replaces.drain(..) {
                            if b.start() >= point {
                                b.shift_right(overlap_len);
                                self.blocks.push_back(b);
                            } else if b.end() >= point {
                                // Straddles the point: only the right
                                // half is displaced.
                                let mut right = b.clone();
                                b.remove(point, b.end());
                                right.remove(right.start(), point - 1);
                                right.shift_right(overlap_len);
                                if !b.is_empty() {
                                    self.blocks.push_back(b);
                                }
                                if !right.is_empty() {
                                    self.blocks.push_back(right);
                                }
                            } else {
                                self.blocks.push_back(b);
                            }
                        }

                        self.blocks.push_back(replacement);

                        if block.is_empty() {
                            return None;
                        }
                        return Some(block);
                    } else if last.start() < block.start() + left_shift {
                        left_shift += last.size();
                    }
                    removes.push_front(last);
                }
                InstructionKind::Insert => unreachable!("loop breaks on INSERT"),
            }
        }

        // No coincidence: restore the tail untouched.
        self.blocks.extend(removes);
        self.blocks.extend(replaces);
        Some(block)
    }

    // ========================================================================
    // REMOVE path
    // ========================================================================

    /// Appends a REMOVE, merging it into the REMOVE run.
    ///
    /// At level 2+ the incoming remove is first cancelled against any
    /// prior INSERTs whose ranges it covers (text inserted and then
    /// removed never needs to exist). The survivor is then hoisted
    /// past the REPLACE run, splitting any replace it guts, and merged
    /// into the REMOVE run, combining with abutting removes.
    pub fn remove(&mut self, mut block: Block) {
        block.set_kind(InstructionKind::Remove);
        if block.is_empty() {
            return;
        }
        if self.optimization_level == 0 {
            self.blocks.push_back(block);
            return;
        }

        // Remove pieces whose coordinates pre-date a cancelled insert;
        // they re-enter through the front door at the end.
        let mut deferred: Vec<Block> = Vec::new();

        let mut survivor = if self.optimization_level >= 2 {
            self.cancel_insert_overlaps(block, &mut deferred)
        } else {
            Some(block)
        };

        if let Some(mut block) = survivor.take() {
            // Peel the REPLACE run, dropping any replaced bytes the
            // removal destroys.
            let mut replaces: VecDeque<Block> = VecDeque::new();
            loop {
                let Some(last) = self.blocks.back() else { break };
                if last.kind() != InstructionKind::Replace {
                    break;
                }
                let mut last = self.blocks.pop_back().expect("tail exists");
                let overlap = last.overlap(&block);
                if !overlap.is_empty() {
                    let mut pre = last.clone();
                    let mut post = last;
                    pre.remove(overlap.start, pre.end());
                    post.remove(post.start(), overlap.end);
                    if !post.is_empty() {
                        post.shift_left(block.size());
                        replaces.push_front(post);
                    }
                    if !pre.is_empty() {
                        replaces.push_front(pre);
                    }
                } else if last.start() >= block.start() {
                    last.shift_left(block.size());
                    replaces.push_front(last);
                } else {
                    replaces.push_front(last);
                }
            }

            // Merge into the REMOVE run.
            let mut removes_before: VecDeque<Block> = VecDeque::new();
            let mut removes_after: VecDeque<Block> = VecDeque::new();
            loop {
                let Some(last) = self.blocks.back() else { break };
                if last.kind() != InstructionKind::Remove {
                    break;
                }
                let last = self.blocks.pop_back().expect("tail exists");
                let merged = combine_removes(&last, &block);
                if !merged.is_empty() {
                    block = merged;
                    continue;
                }
                if last.start() < block.start() {
                    removes_before.push_front(last);
                } else {
                    // Disjoint above the incoming: the removal
                    // contracts the text beneath it.
                    let mut last = last;
                    last.shift_left(block.size());
                    // Shifting can bring the tail flush against the
                    // incoming's end; merge rather than store the pair.
                    let merged = combine_removes(&block, &last);
                    if !merged.is_empty() {
                        block = merged;
                    } else {
                        removes_after.push_front(last);
                    }
                }
            }

            self.blocks.extend(removes_before);
            self.blocks.push_back(block);
            self.blocks.extend(removes_after);
            self.blocks.extend(replaces);
        }

        for piece in deferred {
            self.remove(piece);
        }
    }

    /// Cancels the incoming remove against prior inserts it covers.
    ///
    /// Walks the whole tail, pulling blocks aside and tracking how the
    /// intervening removes (`contraction`) and inserts (`expansion`)
    /// translate the incoming range into each earlier block's
    /// coordinate frame. Where the translated range overlaps an
    /// insert, the overlap is cut from both: the insert keeps its
    /// flanks, the remove keeps its flanks, and every block pulled
    /// earlier whose position sits at or past the cancelled region
    /// slides left by the cancelled length.
    ///
    /// The remove flank *below* the overlap pre-dates the insert, so
    /// it cannot continue this walk; it is pushed to `deferred` for
    /// re-processing once the sequence is whole again. The flank above
    /// continues as the incoming. Returns the surviving remove, or
    /// `None` when it was cancelled entirely.
    fn cancel_insert_overlaps(
        &mut self,
        mut block: Block,
        deferred: &mut Vec<Block>,
    ) -> Option<Block> {
        // Stash entries carry the accumulator values at pull time so a
        // later cancellation can be mapped into each block's own frame.
        let mut inserts: VecDeque<(Block, u64, u64)> = VecDeque::new();
        let mut removes: VecDeque<(Block, u64, u64)> = VecDeque::new();
        let mut replaces: VecDeque<(Block, u64, u64)> = VecDeque::new();
        let mut contraction: u64 = 0;
        let mut expansion: u64 = 0;
        let mut alive = true;

        while let Some(mut last) = self.blocks.pop_back() {
            match last.kind() {
                InstructionKind::Replace => {
                    replaces.push_front((last, contraction, expansion));
                }
                InstructionKind::Remove => {
                    let entry = (contraction, expansion);
                    if last.start() + expansion < block.start() + contraction {
                        contraction += last.size();
                    }
                    removes.push_front((last, entry.0, entry.1));
                }
                InstructionKind::Insert => {
                    let s = last.start();
                    let e = last.end();
                    let overlaps = s + expansion <= block.end() + contraction
                        && e + expansion >= block.start() + contraction;
                    if !overlaps {
                        let entry = (contraction, expansion);
                        if s + expansion < block.start() + contraction {
                            expansion += last.size();
                        }
                        inserts.push_front((last, entry.0, entry.1));
                        continue;
                    }

                    // Overlap bounds in the insert's frame.
                    let o_start = if block.start() + contraction >= expansion {
                        s.max(block.start() + contraction - expansion)
                    } else {
                        s
                    };
                    let o_end = e.min(block.end() + contraction - expansion);
                    let cancelled = o_end - o_start + 1;

                    // Remove flanks, in the incoming's own frame.
                    let below = if o_start + expansion > block.start() + contraction {
                        Some(Block::with_range(
                            block.start(),
                            o_start + expansion - contraction - 1,
                        ))
                    } else {
                        None
                    };
                    let above = if o_end + expansion < block.end() + contraction {
                        Some(Block::with_range(
                            o_end + expansion - contraction + 1,
                            block.end(),
                        ))
                    } else {
                        None
                    };

                    // Cut the overlap out of the insert.
                    last.remove(o_start, o_end);
                    if !last.is_empty() && o_start == s {
                        last.shift_left(cancelled);
                    }

                    // The cancelled bytes never exist now: everything
                    // pulled earlier that sat at or past them slides
                    // left.
                    for (b, ls, rs) in inserts
                        .iter_mut()
                        .chain(removes.iter_mut())
                        .chain(replaces.iter_mut())
                    {
                        if b.start() + (contraction - *ls) >= o_start + (expansion - *rs) {
                            b.shift_left(cancelled);
                        }
                    }

                    if let Some(mut piece) = below {
                        piece.set_kind(InstructionKind::Remove);
                        deferred.push(piece);
                    }

                    if !last.is_empty() {
                        let entry = (contraction, expansion);
                        expansion += last.size();
                        inserts.push_front((last, entry.0, entry.1));
                    }

                    match above {
                        Some(mut piece) => {
                            piece.set_kind(InstructionKind::Remove);
                            piece.shift_left(cancelled);
                            block = piece;
                        }
                        None => {
                            alive = false;
                            break;
                        }
                    }
                }
            }
        }

        self.blocks.extend(inserts.into_iter().map(|(b, _, _)| b));
        self.blocks.extend(removes.into_iter().map(|(b, _, _)| b));
        self.blocks.extend(replaces.into_iter().map(|(b, _, _)| b));

        if alive {
            Some(block)
        } else {
            None
        }
    }

    // ========================================================================
    // REPLACE path
    // ========================================================================

    /// Appends a REPLACE.
    ///
    /// No cross-block rewriting happens on this path; the incoming
    /// block is slotted into the REPLACE run, reordered past earlier
    /// replaces only where the two are disjoint (overlapping replaces
    /// must keep their execution order). At level 3 an earlier replace
    /// at the same start whose range the newcomer covers entirely is
    /// dropped.
    pub fn replace(&mut self, mut block: Block) {
        block.set_kind(InstructionKind::Replace);
        if block.is_empty() {
            return;
        }
        if self.optimization_level == 0 {
            self.blocks.push_back(block);
            return;
        }

        let mut after: VecDeque<Block> = VecDeque::new();
        loop {
            let Some(last) = self.blocks.back() else { break };
            if last.kind() != InstructionKind::Replace {
                break;
            }
            if self.optimization_level >= 3
                && last.start() == block.start()
                && last.end() <= block.end()
            {
                // The newcomer overwrites everything the earlier
                // replace wrote.
                self.blocks.pop_back();
                continue;
            }
            if last.overlap(&block).is_empty() && last.start() > block.start() {
                let last = self.blocks.pop_back().expect("tail exists");
                after.push_front(last);
                continue;
            }
            break;
        }
        self.blocks.push_back(block);
        self.blocks.extend(after);
    }

    /// Renders the expression as instruction text, one instruction per
    /// line.
    pub fn to_instructions(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            out.push_str(&block.to_instruction());
            out.push('\n');
        }
        out
    }
}

impl Default for Expression {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_instructions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(expr: &mut Expression, start: u64, bytes: &str) {
        expr.insert(Block::with_bytes(start, bytes.as_bytes().to_vec()));
    }

    fn remove(expr: &mut Expression, start: u64, end: u64) {
        expr.remove(Block::with_range(start, end));
    }

    fn replace(expr: &mut Expression, start: u64, bytes: &str) {
        expr.replace(Block::with_bytes(start, bytes.as_bytes().to_vec()));
    }

    fn rendered(expr: &Expression) -> Vec<String> {
        expr.blocks().map(Block::to_instruction).collect()
    }

    #[test]
    fn test_level_0_preserves_order() {
        let mut expr = Expression::new();
        insert(&mut expr, 0, "hello world");
        remove(&mut expr, 0, 4);
        insert(&mut expr, 0, "goodbye");
        assert_eq!(
            rendered(&expr),
            vec!["INSERT 0 hello world", "REMOVE 0 4", "INSERT 0 goodbye"]
        );
    }

    #[test]
    fn test_empty_blocks_are_discarded() {
        for level in 0..=3 {
            let mut expr = Expression::with_level(level);
            expr.insert(Block::new());
            expr.remove(Block::new());
            expr.replace(Block::new());
            assert!(expr.is_empty());
        }
    }

    #[test]
    fn test_insert_sort() {
        // Inserting earlier in the text displaces a later insert.
        let mut expr = Expression::with_level(1);
        insert(&mut expr, 5, "xyz");
        insert(&mut expr, 3, "ab");
        assert_eq!(rendered(&expr), vec!["INSERT 3 ab", "INSERT 7 xyz"]);
    }

    #[test]
    fn test_insert_merge_interior() {
        let mut expr = Expression::with_level(1);
        insert(&mut expr, 0, "hello world");
        insert(&mut expr, 5, "goodbye");
        assert_eq!(rendered(&expr), vec!["INSERT 0 hellogoodbye world"]);
    }

    #[test]
    fn test_inserts_at_same_start_keep_arrival_order() {
        let mut expr = Expression::with_level(1);
        insert(&mut expr, 0, "abc");
        insert(&mut expr, 0, "xy");
        assert_eq!(rendered(&expr), vec!["INSERT 0 abc", "INSERT 0 xy"]);
    }

    #[test]
    fn test_remove_combine() {
        let mut expr = Expression::with_level(1);
        remove(&mut expr, 0, 3);
        remove(&mut expr, 0, 2);
        assert_eq!(rendered(&expr), vec!["REMOVE 0 6"]);
    }

    #[test]
    fn test_remove_reorder_disjoint() {
        let mut expr = Expression::with_level(1);
        remove(&mut expr, 10, 11);
        remove(&mut expr, 5, 6);
        assert_eq!(rendered(&expr), vec!["REMOVE 5 6", "REMOVE 8 9"]);
    }

    #[test]
    fn test_remove_splits_replace() {
        let mut expr = Expression::with_level(1);
        replace(&mut expr, 5, "abcd");
        remove(&mut expr, 6, 7);
        assert_eq!(
            rendered(&expr),
            vec!["REMOVE 6 7", "REPLACE 5 a", "REPLACE 6 d"]
        );
    }

    #[test]
    fn test_insert_shifts_pending_remove() {
        let mut expr = Expression::with_level(1);
        insert(&mut expr, 0, "hello world");
        remove(&mut expr, 0, 4);
        insert(&mut expr, 0, "goodbye");
        assert_eq!(
            rendered(&expr),
            vec![
                "INSERT 0 hello world",
                "INSERT 0 goodbye",
                "REMOVE 7 11",
            ]
        );
    }

    #[test]
    fn test_full_cancellation() {
        let mut expr = Expression::with_level(2);
        insert(&mut expr, 0, "hello");
        remove(&mut expr, 0, 4);
        assert!(expr.is_empty());
    }

    #[test]
    fn test_partial_cancellation_keeps_flanks() {
        let mut expr = Expression::with_level(2);
        insert(&mut expr, 5, "abcd");
        remove(&mut expr, 6, 7);
        assert_eq!(rendered(&expr), vec!["INSERT 5 ad"]);
    }

    #[test]
    fn test_coincident_remove_insert_collapse_to_replace() {
        let mut expr = Expression::with_level(2);
        remove(&mut expr, 5, 9);
        insert(&mut expr, 5, "abc");
        assert_eq!(rendered(&expr), vec!["REMOVE 8 9", "REPLACE 5 abc"]);
    }

    #[test]
    fn test_coincident_collapse_with_insert_remainder() {
        let mut expr = Expression::with_level(2);
        remove(&mut expr, 5, 6);
        insert(&mut expr, 5, "abcd");
        assert_eq!(rendered(&expr), vec!["INSERT 7 cd", "REPLACE 5 ab"]);
    }

    #[test]
    fn test_level_partitioning() {
        let mut expr = Expression::with_level(1);
        replace(&mut expr, 20, "zz");
        insert(&mut expr, 0, "abc");
        remove(&mut expr, 10, 12);
        insert(&mut expr, 4, "d");
        remove(&mut expr, 0, 1);
        replace(&mut expr, 30, "yy");

        let kinds: Vec<InstructionKind> = expr.blocks().map(Block::kind).collect();
        let first_remove = kinds
            .iter()
            .position(|&k| k == InstructionKind::Remove)
            .unwrap();
        let first_replace = kinds
            .iter()
            .position(|&k| k == InstructionKind::Replace)
            .unwrap();
        assert!(kinds[..first_remove]
            .iter()
            .all(|&k| k == InstructionKind::Insert));
        assert!(kinds[first_remove..first_replace]
            .iter()
            .all(|&k| k == InstructionKind::Remove));
        assert!(kinds[first_replace..]
            .iter()
            .all(|&k| k == InstructionKind::Replace));
    }

    #[test]
    fn test_set_level_is_idempotent() {
        let mut expr = Expression::new();
        insert(&mut expr, 0, "hello world");
        remove(&mut expr, 0, 4);
        insert(&mut expr, 0, "goodbye");

        expr.set_optimization_level(2);
        let once = rendered(&expr);
        expr.set_optimization_level(2);
        assert_eq!(rendered(&expr), once);
    }

    #[test]
    fn test_raising_level_reoptimizes() {
        let mut expr = Expression::new();
        insert(&mut expr, 0, "hello");
        remove(&mut expr, 0, 4);
        assert_eq!(expr.len(), 2);

        expr.set_optimization_level(2);
        assert!(expr.is_empty());
    }

    #[test]
    fn test_levels_above_three_behave_as_three() {
        let mut a = Expression::with_level(3);
        let mut b = Expression::with_level(200);
        for expr in [&mut a, &mut b] {
            insert(expr, 0, "hello world");
            remove(expr, 0, 4);
            replace(expr, 1, "abc");
            replace(expr, 1, "wxyz");
        }
        assert_eq!(rendered(&a), rendered(&b));
    }

    #[test]
    fn test_dominated_replace_dropped_at_level_3() {
        let mut expr = Expression::with_level(3);
        replace(&mut expr, 8, "abcde");
        replace(&mut expr, 8, "buddy");
        assert_eq!(rendered(&expr), vec!["REPLACE 8 buddy"]);

        // Level 2 keeps both, in arrival order.
        let mut expr = Expression::with_level(2);
        replace(&mut expr, 8, "abcde");
        replace(&mut expr, 8, "buddy");
        assert_eq!(rendered(&expr), vec!["REPLACE 8 abcde", "REPLACE 8 buddy"]);
    }

    #[test]
    fn test_shorter_replace_not_dominated() {
        let mut expr = Expression::with_level(3);
        replace(&mut expr, 8, "abcde");
        replace(&mut expr, 8, "hi");
        assert_eq!(rendered(&expr), vec!["REPLACE 8 abcde", "REPLACE 8 hi"]);
    }

    #[test]
    fn test_disjoint_replaces_sorted() {
        let mut expr = Expression::with_level(1);
        replace(&mut expr, 8, "xx");
        replace(&mut expr, 2, "yy");
        assert_eq!(rendered(&expr), vec!["REPLACE 2 yy", "REPLACE 8 xx"]);
    }

    #[test]
    fn test_display_renders_instruction_lines() {
        let mut expr = Expression::new();
        insert(&mut expr, 0, "hi");
        remove(&mut expr, 3, 4);
        assert_eq!(expr.to_string(), "INSERT 0 hi\nREMOVE 3 4\n");
    }
}
