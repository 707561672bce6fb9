//! Batch schedule construction for drivers.
//!
//! The core only consumes an ordered sequence of party identities; this
//! module builds that sequence from per-party attempt counts, with an
//! optional seeded shuffle so any run can be replayed exactly. The PRNG
//! never reaches the core.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::party::Party;

/// What a batch does when an attempt comes back blocked.
///
/// Two historical drivers disagreed here: one halted the whole batch on the
/// first block, the other kept going and counted blocks per party. Both
/// behaviors are kept, selected explicitly per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPolicy {
    /// Halt at the first blocked attempt; the rest of the schedule is not
    /// attempted and not counted.
    StopOnBlock,
    /// Record the block and keep attempting the rest of the schedule.
    #[default]
    ContinueAndCount,
}

/// One batch of attempts: per-party counts plus scheduling options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub a: u32,
    #[serde(default)]
    pub b: u32,
    #[serde(default)]
    pub c: u32,
    /// Interleave the attempts pseudo-randomly instead of running each
    /// party's block back to back.
    #[serde(default)]
    pub shuffle: bool,
    /// Shuffle seed. Absent means "draw one"; the seed actually used is
    /// echoed back in the run report either way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub on_block: BlockPolicy,
}

impl BatchRequest {
    pub fn total_attempts(&self) -> usize {
        self.a as usize + self.b as usize + self.c as usize
    }
}

/// Expand a batch request into the ordered attempt sequence.
///
/// Unshuffled order is all of `A`, then `B`, then `C`. With `shuffle` set,
/// a Fisher-Yates pass driven by a ChaCha generator seeded from `seed`
/// permutes the sequence; identical seeds produce identical schedules.
pub fn build_schedule(request: &BatchRequest, seed: u64) -> Vec<Party> {
    let mut schedule = Vec::with_capacity(request.total_attempts());
    schedule.extend(std::iter::repeat(Party::A).take(request.a as usize));
    schedule.extend(std::iter::repeat(Party::B).take(request.b as usize));
    schedule.extend(std::iter::repeat(Party::C).take(request.c as usize));

    if request.shuffle {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        schedule.shuffle(&mut rng);
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(schedule: &[Party]) -> (usize, usize, usize) {
        let count = |p| schedule.iter().filter(|&&q| q == p).count();
        (count(Party::A), count(Party::B), count(Party::C))
    }

    #[test]
    fn unshuffled_schedule_keeps_party_blocks_in_order() {
        let request = BatchRequest {
            a: 2,
            b: 1,
            c: 1,
            shuffle: false,
            seed: None,
            on_block: BlockPolicy::default(),
        };

        assert_eq!(
            build_schedule(&request, 0),
            vec![Party::A, Party::A, Party::B, Party::C]
        );
    }

    #[test]
    fn shuffle_is_a_permutation_and_seed_deterministic() {
        let request = BatchRequest {
            a: 20,
            b: 10,
            c: 5,
            shuffle: true,
            seed: Some(42),
            on_block: BlockPolicy::default(),
        };

        let first = build_schedule(&request, 42);
        let second = build_schedule(&request, 42);
        assert_eq!(first, second);
        assert_eq!(counts(&first), (20, 10, 5));

        let other_seed = build_schedule(&request, 43);
        assert_eq!(counts(&other_seed), (20, 10, 5));
    }

    #[test]
    fn block_policy_wire_names() {
        assert_eq!(
            serde_json::to_value(BlockPolicy::StopOnBlock).unwrap(),
            "stop_on_block"
        );
        assert_eq!(
            serde_json::from_str::<BlockPolicy>("\"continue_and_count\"").unwrap(),
            BlockPolicy::ContinueAndCount
        );
    }

    #[test]
    fn batch_request_fields_default_to_empty_batch() {
        let request: BatchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.total_attempts(), 0);
        assert!(!request.shuffle);
        assert_eq!(request.on_block, BlockPolicy::ContinueAndCount);
        assert!(request.seed.is_none());
    }
}
