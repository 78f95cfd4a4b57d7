//! Per-thread count of full grid traversals
//!
//! Every engine entry point that visits all pixels of a grid or mask records
//! one traversal here. Pure relabeling operations record none, which is what
//! tests check.

use std::cell::Cell;

thread_local! {
    static TRAVERSALS: Cell<u64> = const { Cell::new(0) };
}

pub(crate) fn record() {
    TRAVERSALS.with(|c| c.set(c.get() + 1));
}

/// Traversals recorded on the current thread since it started
pub fn grid_traversals() -> u64 {
    TRAVERSALS.with(Cell::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_increments() {
        let before = grid_traversals();
        record();
        record();
        assert_eq!(grid_traversals(), before + 2);
    }
}
