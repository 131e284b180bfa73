//! Resumable batch jobs.
//!
//! Large drains (jackpot payouts, queued mints, trait-supply rebuild) never
//! run to completion in one call. Each job holds a durable cursor and
//! processes at most `budget` items per step; a crash between steps resumes
//! from the cursor with no item paid twice and none skipped.

use crate::error::EngineError;
use pyre_types::{TraitSupply, TRAIT_COUNT};

/// Durable position of a resumable job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
}

impl Cursor {
    pub fn position(&self) -> usize {
        self.position
    }

    /// Claim up to `budget` items from a job of `len` items. Returns the
    /// half-open range to process; empty when the budget is zero or the job
    /// is done. A cursor past `len` means state was corrupted elsewhere.
    pub fn claim(&mut self, len: usize, budget: usize) -> Result<(usize, usize), EngineError> {
        if self.position > len {
            return Err(EngineError::InvariantViolation("batch cursor out of bounds"));
        }
        let start = self.position;
        let end = len.min(start.saturating_add(budget));
        self.position = end;
        Ok((start, end))
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

/// An append-only work queue drained in bounded batches.
///
/// Items stay in place while the cursor walks forward, so a resumed drain
/// sees exactly the items it has not yet processed.
#[derive(Clone, Debug)]
pub struct BatchQueue<T> {
    items: Vec<T>,
    cursor: Cursor,
}

impl<T> Default for BatchQueue<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: Cursor::default(),
        }
    }
}

impl<T> BatchQueue<T> {
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Items not yet claimed by a drain step.
    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor.position()
    }

    pub fn is_drained(&self) -> bool {
        self.remaining() == 0
    }

    /// Claim the next batch of at most `budget` items. With a zero budget
    /// this is a safe no-op returning an empty slice.
    pub fn take_batch(&mut self, budget: usize) -> Result<&[T], EngineError> {
        let (start, end) = self.cursor.claim(self.items.len(), budget)?;
        Ok(&self.items[start..end])
    }

    /// Discard processed items once the drain finished.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor.reset();
    }
}

/// Resumable rebuild of the per-trait supply table at round open.
#[derive(Clone, Debug, Default)]
pub struct SupplyRebuild {
    cursor: Cursor,
}

impl SupplyRebuild {
    pub fn is_finished(&self) -> bool {
        self.cursor.position() == TRAIT_COUNT
    }

    /// Trait slots refreshed so far.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Rebuild up to `budget` trait slots. Returns `true` once every slot is
    /// refreshed; a zero budget makes no progress and is safe to repeat.
    pub fn step(
        &mut self,
        supplies: &mut [TraitSupply; TRAIT_COUNT],
        start_supply: u32,
        budget: usize,
    ) -> Result<bool, EngineError> {
        let (from, to) = self.cursor.claim(TRAIT_COUNT, budget)?;
        for slot in &mut supplies[from..to] {
            *slot = TraitSupply::fresh(start_supply);
        }
        Ok(self.is_finished())
    }

    pub fn restart(&mut self) {
        self.cursor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_a_noop() {
        let mut queue: BatchQueue<u32> = BatchQueue::default();
        queue.push(1);
        queue.push(2);
        let before = queue.remaining();
        assert!(queue.take_batch(0).expect("claim").is_empty());
        assert_eq!(queue.remaining(), before);
    }

    #[test]
    fn drain_in_uneven_batches_covers_every_item_once() {
        let mut queue: BatchQueue<u32> = BatchQueue::default();
        for i in 0..10 {
            queue.push(i);
        }
        let mut seen = Vec::new();
        for budget in [3, 0, 4, 5] {
            seen.extend_from_slice(queue.take_batch(budget).expect("claim"));
        }
        assert!(queue.is_drained());
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        // Further claims yield nothing.
        assert!(queue.take_batch(8).expect("claim").is_empty());
    }

    #[test]
    fn clear_resets_for_the_next_round() {
        let mut queue: BatchQueue<u32> = BatchQueue::default();
        queue.push(7);
        queue.take_batch(1).expect("claim");
        queue.clear();
        queue.push(8);
        assert_eq!(queue.take_batch(1).expect("claim"), &[8]);
    }

    #[test]
    fn corrupted_cursor_is_fatal() {
        let mut cursor = Cursor::default();
        cursor.claim(10, 10).expect("claim");
        assert!(matches!(
            cursor.claim(5, 1),
            Err(EngineError::InvariantViolation(_))
        ));
    }

    #[test]
    fn supply_rebuild_resumes_across_steps() {
        let mut supplies = [TraitSupply::fresh(1); TRAIT_COUNT];
        for slot in supplies.iter_mut() {
            slot.remaining = 0;
        }
        let mut job = SupplyRebuild::default();
        assert!(!job.step(&mut supplies, 64, 100).expect("step"));
        assert!(!job.step(&mut supplies, 64, 0).expect("step"));
        assert!(!job.step(&mut supplies, 64, 100).expect("step"));
        assert!(job.step(&mut supplies, 64, 100).expect("step"));
        assert!(job.is_finished());
        assert!(supplies.iter().all(|s| s.remaining == 64 && s.start_remaining == 64));
        // Finished job tolerates further steps.
        assert!(job.step(&mut supplies, 64, 10).expect("step"));
    }
}
