//! Batch execution against a single session.

use serde::Serialize;

use crate::party::{Party, RoleAssignment};
use crate::schedule::{BatchRequest, BlockPolicy, build_schedule};
use crate::session::{PadSession, PartyStateView};
use crate::stats::{PartyCounts, SessionStats};

/// Outcome of one attempt within a batch.
///
/// Role assignment and position state are captured on success only, after
/// the issuance (and any repositioning it triggered) committed.
#[derive(Debug, Clone, Serialize)]
pub struct StepTrace {
    pub party: Party,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<RoleAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PartyStateView>,
}

/// Full result of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepTrace>,
    pub attempted: PartyCounts,
    pub blocked: PartyCounts,
    /// Seed the schedule was (or would have been) shuffled with; replaying
    /// the same request with this seed reproduces the run exactly.
    pub seed: u64,
    /// True when a `stop_on_block` batch halted before its schedule ran out.
    pub halted_early: bool,
    /// True when no party could send at the end of the batch.
    pub deadlocked: bool,
    pub stats: SessionStats,
}

/// Execute one batch against `session`.
///
/// Blocked attempts are routine: depending on the request's block policy
/// they either end the batch or are counted and skipped past. Deadlock is a
/// driver-level observation: all three parties blocked simultaneously.
pub fn run_batch(session: &mut PadSession, request: &BatchRequest) -> RunReport {
    let seed = request.seed.unwrap_or_else(rand::random);
    let schedule = build_schedule(request, seed);

    let mut steps = Vec::with_capacity(schedule.len());
    let mut attempted = PartyCounts::default();
    let mut blocked = PartyCounts::default();
    let mut halted_early = false;

    for party in schedule {
        attempted.add(party, 1);
        match session.try_send(party) {
            Some(pad) => {
                steps.push(StepTrace {
                    party,
                    success: true,
                    pad: Some(pad),
                    roles: Some(session.roles()),
                    state: Some(session.party_state(party)),
                });
            }
            None => {
                blocked.add(party, 1);
                steps.push(StepTrace {
                    party,
                    success: false,
                    pad: None,
                    roles: None,
                    state: None,
                });
                if request.on_block == BlockPolicy::StopOnBlock {
                    halted_early = true;
                    break;
                }
            }
        }
    }

    let deadlocked = Party::ALL.iter().all(|p| !session.can_send(*p));
    let stats = session.stats();
    tracing::debug!(
        attempts = attempted.total(),
        issued = stats.used,
        blocked = blocked.total(),
        deadlocked,
        "batch complete"
    );

    RunReport {
        steps,
        attempted,
        blocked,
        seed,
        halted_early,
        deadlocked,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(a: u32, b: u32, c: u32) -> BatchRequest {
        BatchRequest {
            a,
            b,
            c,
            shuffle: false,
            seed: None,
            on_block: BlockPolicy::default(),
        }
    }

    #[test]
    fn successful_batch_traces_pads_roles_and_state() {
        let mut session = PadSession::new(10, 1).unwrap();
        let report = run_batch(&mut session, &request(1, 1, 1));

        let pads: Vec<_> = report.steps.iter().map(|s| s.pad).collect();
        assert_eq!(pads, vec![Some(1), Some(10), Some(5)]);
        assert!(report.steps.iter().all(|s| s.success));
        assert!(report.steps.iter().all(|s| s.roles.is_some()));
        assert_eq!(
            report.steps[0].state,
            Some(PartyStateView::Frontier(1))
        );
        assert_eq!(
            report.steps[2].state,
            Some(PartyStateView::Interval([5, 5]))
        );

        assert_eq!(report.blocked.total(), 0);
        assert!(!report.halted_early);
        assert!(!report.deadlocked);
        assert_eq!(report.stats.used, 3);
    }

    #[test]
    fn continue_policy_counts_blocks_and_flags_deadlock() {
        // capacity 10, margin 5 deadlocks before any issuance.
        let mut session = PadSession::new(10, 5).unwrap();
        let report = run_batch(&mut session, &request(1, 1, 1));

        assert_eq!(report.steps.len(), 3);
        assert!(report.steps.iter().all(|s| !s.success));
        assert_eq!(report.blocked, PartyCounts { a: 1, b: 1, c: 1 });
        assert_eq!(report.attempted.total(), 3);
        assert!(report.deadlocked);
        assert!(!report.halted_early);
        assert_eq!(report.stats.used, 0);
    }

    #[test]
    fn stop_on_block_halts_the_schedule() {
        let mut session = PadSession::new(10, 5).unwrap();
        let mut req = request(2, 2, 2);
        req.on_block = BlockPolicy::StopOnBlock;

        let report = run_batch(&mut session, &req);

        assert_eq!(report.steps.len(), 1);
        assert!(report.halted_early);
        assert_eq!(report.attempted, PartyCounts { a: 1, b: 0, c: 0 });
        assert_eq!(report.blocked, PartyCounts { a: 1, b: 0, c: 0 });
    }

    #[test]
    fn shuffled_batch_replays_from_reported_seed() {
        let run = |seed: Option<u64>| {
            let mut session = PadSession::new(40, 1).unwrap();
            let req = BatchRequest {
                a: 8,
                b: 8,
                c: 8,
                shuffle: true,
                seed,
                on_block: BlockPolicy::default(),
            };
            run_batch(&mut session, &req)
        };

        let first = run(Some(7));
        let replay = run(Some(first.seed));

        assert_eq!(first.seed, 7);
        let pads = |r: &RunReport| -> Vec<Option<i64>> {
            r.steps.iter().map(|s| s.pad).collect()
        };
        assert_eq!(pads(&first), pads(&replay));
        assert_eq!(first.stats, replay.stats);
    }

    #[test]
    fn report_serializes_without_null_fields_on_blocked_steps() {
        let mut session = PadSession::new(10, 5).unwrap();
        let report = run_batch(&mut session, &request(1, 0, 0));

        let value = serde_json::to_value(&report).unwrap();
        let step = &value["steps"][0];
        assert_eq!(step["party"], "A");
        assert_eq!(step["success"], false);
        assert!(step.get("pad").is_none());
        assert!(step.get("roles").is_none());
    }
}
