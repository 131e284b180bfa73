//! Randomness lifecycle and entropy derivation.
//!
//! The engine never generates randomness. An external provider fulfills one
//! outstanding request at a time; the fulfilled word is consumed exactly once
//! per jackpot. The round trip is a callback matched by request id, so a
//! late or duplicate fulfillment for a stale request is a no-op.
//!
//! ## Sub-entropy derivation
//!
//! A single 32-byte word seeds many independent draws. Each draw derives its
//! own sub-entropy with domain-separated SHA-256:
//! ```text
//! sub[i] = sha256(word || salt || i || "pyre-draw")
//! ```
//! Any party with the word can reproduce every outcome.

use crate::error::EngineError;
use commonware_cryptography::sha256::Sha256;
use commonware_cryptography::Hasher;
use tracing::debug;

/// Length of a randomness word in bytes.
pub const WORD_LEN: usize = 32;

/// A 32-byte randomness word as supplied by the provider.
pub type Word = [u8; WORD_LEN];

/// State of the single outstanding randomness request.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Pending { request_id: u64, issued_at_ms: u64 },
    Fulfilled { word: Word },
}

/// Tracks one outstanding randomness request at a time.
#[derive(Clone, Debug)]
pub struct RandomnessLifecycle {
    state: Lifecycle,
    next_request_id: u64,
}

impl Default for RandomnessLifecycle {
    fn default() -> Self {
        Self {
            state: Lifecycle::Idle,
            next_request_id: 1,
        }
    }
}

impl RandomnessLifecycle {
    /// Issue a new request. Fails if one is already pending or a fulfilled
    /// word is waiting to be consumed.
    pub fn request_next(&mut self, now_ms: u64) -> Result<u64, EngineError> {
        match self.state {
            Lifecycle::Idle => {
                let request_id = self.next_request_id;
                self.next_request_id += 1;
                self.state = Lifecycle::Pending {
                    request_id,
                    issued_at_ms: now_ms,
                };
                Ok(request_id)
            }
            _ => Err(EngineError::RequestPending),
        }
    }

    /// Accept a fulfillment. Returns `false` (no state change) unless the id
    /// matches the live pending request.
    pub fn on_fulfilled(&mut self, request_id: u64, word: Word) -> bool {
        match self.state {
            Lifecycle::Pending {
                request_id: live, ..
            } if live == request_id => {
                self.state = Lifecycle::Fulfilled { word };
                true
            }
            _ => {
                debug!(request_id, "ignoring stale or mismatched fulfillment");
                false
            }
        }
    }

    /// Consume the fulfilled word, transitioning back to idle.
    pub fn consume(&mut self) -> Result<Word, EngineError> {
        match self.state {
            Lifecycle::Fulfilled { word } => {
                self.state = Lifecycle::Idle;
                Ok(word)
            }
            _ => Err(EngineError::RandomnessNotReady),
        }
    }

    /// Whether a request is outstanding (pending or fulfilled-unconsumed).
    pub fn is_busy(&self) -> bool {
        !matches!(self.state, Lifecycle::Idle)
    }

    /// Whether a request is pending fulfillment.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, Lifecycle::Pending { .. })
    }

    /// Whether a fulfilled word is waiting to be consumed.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self.state, Lifecycle::Fulfilled { .. })
    }

    /// Whether the pending request has waited longer than `threshold_ms`.
    pub fn is_stalled(&self, now_ms: u64, threshold_ms: u64) -> bool {
        match self.state {
            Lifecycle::Pending { issued_at_ms, .. } => {
                now_ms.saturating_sub(issued_at_ms) > threshold_ms
            }
            _ => false,
        }
    }

    /// Abandon a stalled request and issue a fresh one under a new id.
    ///
    /// The stale id is never reused, so its fulfillment (if it ever arrives)
    /// is dropped by the id-match rule. Fails with [`EngineError::NotStalled`]
    /// unless the stall predicate holds.
    pub fn recover_stalled(
        &mut self,
        now_ms: u64,
        threshold_ms: u64,
    ) -> Result<u64, EngineError> {
        if !self.is_stalled(now_ms, threshold_ms) {
            return Err(EngineError::NotStalled);
        }
        self.state = Lifecycle::Idle;
        self.request_next(now_ms)
    }
}

/// Deterministic entropy derived from a randomness word.
///
/// Cheap to copy; every derivation is a fresh domain-separated hash of the
/// parent, so draws never correlate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entropy(Word);

impl Entropy {
    pub fn new(word: Word) -> Self {
        Self(word)
    }

    /// Derive an independent sub-entropy for `(salt, index)`.
    pub fn derive(&self, salt: u64, index: u64) -> Entropy {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hasher.update(&salt.to_be_bytes());
        hasher.update(&index.to_be_bytes());
        hasher.update(b"pyre-draw");
        Entropy(hasher.finalize().0)
    }

    /// The first eight bytes as a big-endian integer.
    pub fn as_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(bytes)
    }

    /// Uniform index below `len`. `len` must be non-zero; callers check for
    /// empty collections first.
    pub fn index_below(&self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.as_u64() % len as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(fill: u8) -> Word {
        [fill; WORD_LEN]
    }

    #[test]
    fn request_fulfill_consume_cycle() {
        let mut rng = RandomnessLifecycle::default();
        assert!(!rng.is_busy());

        let id = rng.request_next(100).expect("first request");
        assert!(rng.is_pending());
        assert!(rng.on_fulfilled(id, word(7)));
        assert!(rng.is_fulfilled());
        assert_eq!(rng.consume().expect("consume"), word(7));
        assert!(!rng.is_busy());
    }

    #[test]
    fn second_request_rejected_while_pending() {
        let mut rng = RandomnessLifecycle::default();
        let id = rng.request_next(0).expect("first request");
        assert_eq!(rng.request_next(1), Err(EngineError::RequestPending));
        // The live request is untouched.
        assert!(rng.on_fulfilled(id, word(1)));
    }

    #[test]
    fn second_request_rejected_while_fulfilled() {
        let mut rng = RandomnessLifecycle::default();
        let id = rng.request_next(0).expect("request");
        assert!(rng.on_fulfilled(id, word(1)));
        assert_eq!(rng.request_next(1), Err(EngineError::RequestPending));
    }

    #[test]
    fn mismatched_fulfillment_is_noop() {
        let mut rng = RandomnessLifecycle::default();
        let id = rng.request_next(0).expect("request");
        assert!(!rng.on_fulfilled(id + 1, word(9)));
        assert!(rng.is_pending());
        // The matching fulfillment still lands afterwards.
        assert!(rng.on_fulfilled(id, word(3)));
        assert_eq!(rng.consume().expect("consume"), word(3));
    }

    #[test]
    fn duplicate_fulfillment_is_noop() {
        let mut rng = RandomnessLifecycle::default();
        let id = rng.request_next(0).expect("request");
        assert!(rng.on_fulfilled(id, word(3)));
        assert!(!rng.on_fulfilled(id, word(4)));
        assert_eq!(rng.consume().expect("consume"), word(3));
    }

    #[test]
    fn consume_without_fulfillment_fails() {
        let mut rng = RandomnessLifecycle::default();
        assert_eq!(rng.consume(), Err(EngineError::RandomnessNotReady));
        rng.request_next(0).expect("request");
        assert_eq!(rng.consume(), Err(EngineError::RandomnessNotReady));
    }

    #[test]
    fn stall_detection() {
        let mut rng = RandomnessLifecycle::default();
        assert!(!rng.is_stalled(1_000_000, 10));

        rng.request_next(1_000).expect("request");
        assert!(!rng.is_stalled(1_500, 1_000));
        assert!(!rng.is_stalled(2_000, 1_000)); // exactly at threshold
        assert!(rng.is_stalled(2_001, 1_000));
    }

    #[test]
    fn recovery_issues_fresh_id_and_drops_stale_fulfillment() {
        let mut rng = RandomnessLifecycle::default();
        let stale = rng.request_next(0).expect("request");
        assert_eq!(
            rng.recover_stalled(500, 1_000),
            Err(EngineError::NotStalled)
        );

        let fresh = rng.recover_stalled(2_000, 1_000).expect("recover");
        assert_ne!(fresh, stale);
        // The abandoned request's word no longer lands.
        assert!(!rng.on_fulfilled(stale, word(1)));
        assert!(rng.on_fulfilled(fresh, word(2)));
        assert_eq!(rng.consume().expect("consume"), word(2));
    }

    #[test]
    fn derivation_is_deterministic_and_salt_sensitive() {
        let entropy = Entropy::new(word(5));
        assert_eq!(entropy.derive(1, 0), entropy.derive(1, 0));
        assert_ne!(entropy.derive(1, 0), entropy.derive(1, 1));
        assert_ne!(entropy.derive(1, 0), entropy.derive(2, 0));
        assert_ne!(entropy.derive(1, 0).0, entropy.0);
    }

    #[test]
    fn derived_indexes_cover_the_range() {
        let entropy = Entropy::new(word(9));
        let mut seen = [false; 7];
        for i in 0..200 {
            seen[entropy.derive(0, i).index_below(7)] = true;
        }
        assert!(seen.iter().all(|&hit| hit), "all residues should appear");
    }
}
