//! Core allocation state machine for one pad line.
//!
//! A session owns the position ledger, the per-party frontiers, the
//! party-to-role mapping, and the repositioning policy for a single line of
//! `capacity` pads. Every operation is synchronous and completes without
//! blocking; drivers serialize access per session.

use std::collections::HashSet;

use crate::party::{Party, Role, RoleAssignment};
use crate::stats::{PartyCounts, SessionStats};

/// Construction failure for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("pad capacity must be positive, got {0}")]
    InvalidCapacity(i64),
    #[error("safety margin must be non-negative, got {0}")]
    InvalidMargin(i64),
}

/// Consumed span of the current middle-grower, inclusive on both ends.
///
/// Zero-width (`left == right`) until the middle has grown in both
/// directions; re-seeded zero-width at a fresh midpoint on every role swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MiddleInterval {
    pub left: i64,
    pub right: i64,
}

/// Driver-facing view of one party's position state.
///
/// End-growers expose a scalar frontier (the virtual sentinel before their
/// first issuance), the middle-grower its boundary interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum PartyStateView {
    Frontier(i64),
    Interval([i64; 2]),
}

/// Per-party ledger entry.
#[derive(Debug, Clone, Copy)]
struct PartyLedger {
    /// Last issued position, or the virtual sentinel before first issuance.
    /// Overwritten with an inherited boundary on role swaps.
    frontier: i64,
    has_sent: bool,
    issued: u64,
}

/// One allocation session over the pad range `[1, capacity]`.
#[derive(Debug)]
pub struct PadSession {
    capacity: i64,
    margin: i64,
    roles: RoleAssignment,
    ledgers: [PartyLedger; 3],
    middle: MiddleInterval,
    used: HashSet<i64>,
}

impl PadSession {
    /// Create a session with `capacity` pads and safety margin `margin`.
    ///
    /// Initial roles are fixed: `A` grows from the left (virtual frontier
    /// `0`), `B` from the right (virtual frontier `capacity + 1`), `C` from
    /// the middle (zero-width interval at `capacity / 2`).
    pub fn new(capacity: i64, margin: i64) -> Result<Self, SessionError> {
        if capacity <= 0 {
            return Err(SessionError::InvalidCapacity(capacity));
        }
        if margin < 0 {
            return Err(SessionError::InvalidMargin(margin));
        }

        let midpoint = capacity / 2;
        let mut ledgers = [PartyLedger {
            frontier: 0,
            has_sent: false,
            issued: 0,
        }; 3];
        ledgers[Party::B.idx()].frontier = capacity + 1;
        ledgers[Party::C.idx()].frontier = midpoint;

        Ok(Self {
            capacity,
            margin,
            roles: RoleAssignment {
                left: Party::A,
                middle: Party::C,
                right: Party::B,
            },
            ledgers,
            middle: MiddleInterval {
                left: midpoint,
                right: midpoint,
            },
            used: HashSet::new(),
        })
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub fn margin(&self) -> i64 {
        self.margin
    }

    pub fn roles(&self) -> RoleAssignment {
        self.roles
    }

    pub fn role_of(&self, party: Party) -> Role {
        self.roles.role_of(party)
    }

    /// Number of pads issued so far.
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Whether `position` has already been issued.
    pub fn is_used(&self, position: i64) -> bool {
        self.used.contains(&position)
    }

    /// True once `party` has issued at least once, or immediately after it
    /// was re-seeded as the middle-grower by a swap (it is then treated as
    /// already active).
    pub fn has_sent(&self, party: Party) -> bool {
        self.ledger(party).has_sent
    }

    /// Current middle-grower interval.
    pub fn middle_interval(&self) -> MiddleInterval {
        self.middle
    }

    fn ledger(&self, party: Party) -> &PartyLedger {
        &self.ledgers[party.idx()]
    }

    fn ledger_mut(&mut self, party: Party) -> &mut PartyLedger {
        &mut self.ledgers[party.idx()]
    }

    /// The position `party` would attempt next. Pure; does not mutate.
    ///
    /// Depends on the party's current role, not its identity: end-growers
    /// step one past their frontier, the middle-grower squeezes its own
    /// unissued seed point first and otherwise grows toward the larger of
    /// the two gaps separating it from the end frontiers (ties grow right).
    pub fn next_candidate(&self, party: Party) -> i64 {
        match self.role_of(party) {
            Role::LeftGrower => self.ledger(party).frontier + 1,
            Role::RightGrower => self.ledger(party).frontier - 1,
            Role::MiddleGrower => {
                let MiddleInterval { left, right } = self.middle;
                if left == right && !self.used.contains(&left) {
                    return left;
                }

                let left_gap = left - self.ledger(self.roles.left).frontier - 1;
                let right_gap = self.ledger(self.roles.right).frontier - right - 1;
                if left_gap > right_gap {
                    left - 1
                } else {
                    right + 1
                }
            }
        }
    }

    /// Whether `party` could safely be issued `position` right now.
    ///
    /// Re-derived from live state on every call: any other party's issuance
    /// or a role swap changes the exclusion zones. Parties that have never
    /// issued still project a zone from their virtual sentinel.
    pub fn is_safe(&self, party: Party, position: i64) -> bool {
        if position < 1 || position > self.capacity {
            return false;
        }
        if self.used.contains(&position) {
            return false;
        }

        for other in Party::ALL {
            if other == party {
                continue;
            }
            let clear = match self.role_of(other) {
                Role::MiddleGrower => {
                    (position - self.middle.left).abs() > self.margin
                        && (position - self.middle.right).abs() > self.margin
                }
                Role::LeftGrower | Role::RightGrower => {
                    (position - self.ledger(other).frontier).abs() > self.margin
                }
            };
            if !clear {
                return false;
            }
        }
        true
    }

    /// Whether `party`'s next candidate would pass the safety check.
    pub fn can_send(&self, party: Party) -> bool {
        self.is_safe(party, self.next_candidate(party))
    }

    /// Issue the next pad for `party`, or `None` if it is blocked.
    ///
    /// Blocked is the routine outcome, not an error: the caller retries
    /// later or drives a different party. The candidate is recomputed and
    /// re-validated here regardless of any preceding `can_send` probe.
    pub fn try_send(&mut self, party: Party) -> Option<i64> {
        let candidate = self.next_candidate(party);
        if !self.is_safe(party, candidate) {
            return None;
        }

        self.used.insert(candidate);
        let is_middle = self.role_of(party) == Role::MiddleGrower;
        let ledger = self.ledger_mut(party);
        ledger.frontier = candidate;
        ledger.has_sent = true;
        ledger.issued += 1;

        if is_middle {
            if candidate < self.middle.left {
                self.middle.left = candidate;
            }
            if candidate > self.middle.right {
                self.middle.right = candidate;
            }
        }

        self.reposition();
        Some(candidate)
    }

    /// Swap roles when an end frontier has converged on the middle interval.
    ///
    /// Contact is detected at distance `margin + 1`, one step before the
    /// safety check would block outright, and only acted on when the
    /// opposite gap leaves more than `2 * margin` free slots to re-seed a
    /// middle-grower in. The outgoing middle inherits its far boundary as
    /// its new frontier without reissuing that position. At most one swap
    /// per issuance; the left-middle contact is checked first.
    fn reposition(&mut self) -> bool {
        let left_frontier = self.ledger(self.roles.left).frontier;
        let right_frontier = self.ledger(self.roles.right).frontier;
        let MiddleInterval {
            left: mid_left,
            right: mid_right,
        } = self.middle;
        let threshold = self.margin + 1;

        if (mid_left - left_frontier).abs() <= threshold {
            let opposite_gap = right_frontier - mid_right;
            if opposite_gap > self.margin * 2 {
                let seed = (mid_right + right_frontier) / 2;
                let old_left = self.roles.left;
                let old_middle = self.roles.middle;

                self.ledger_mut(old_middle).frontier = mid_right;
                self.roles.left = old_middle;
                self.roles.middle = old_left;

                let ledger = self.ledger_mut(old_left);
                ledger.frontier = seed;
                ledger.has_sent = true;
                self.middle = MiddleInterval {
                    left: seed,
                    right: seed,
                };

                tracing::debug!(
                    new_left = %old_middle,
                    new_middle = %old_left,
                    seed,
                    "left contact: middle duty relocated into right gap"
                );
                return true;
            }
        }

        if (right_frontier - mid_right).abs() <= threshold {
            let opposite_gap = mid_left - left_frontier;
            if opposite_gap > self.margin * 2 {
                let seed = (left_frontier + mid_left) / 2;
                let old_right = self.roles.right;
                let old_middle = self.roles.middle;

                self.ledger_mut(old_middle).frontier = mid_left;
                self.roles.right = old_middle;
                self.roles.middle = old_right;

                let ledger = self.ledger_mut(old_right);
                ledger.frontier = seed;
                ledger.has_sent = true;
                self.middle = MiddleInterval {
                    left: seed,
                    right: seed,
                };

                tracing::debug!(
                    new_right = %old_middle,
                    new_middle = %old_right,
                    seed,
                    "right contact: middle duty relocated into left gap"
                );
                return true;
            }
        }

        false
    }

    /// Driver-facing view of `party`'s current position state.
    pub fn party_state(&self, party: Party) -> PartyStateView {
        match self.role_of(party) {
            Role::MiddleGrower => {
                PartyStateView::Interval([self.middle.left, self.middle.right])
            }
            Role::LeftGrower | Role::RightGrower => {
                PartyStateView::Frontier(self.ledger(party).frontier)
            }
        }
    }

    /// Cumulative statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let used = self.used.len() as i64;
        let wasted = self.capacity - used;
        SessionStats {
            capacity: self.capacity,
            used,
            wasted,
            waste_pct: (wasted as f64 / self.capacity as f64) * 100.0,
            sent: PartyCounts {
                a: self.ledger(Party::A).issued,
                b: self.ledger(Party::B).issued,
                c: self.ledger(Party::C).issued,
            },
        }
    }
}
