//! Session statistics types.

use serde::{Deserialize, Serialize};

use crate::party::Party;

/// One counter per party, serialized under the bare party labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyCounts {
    #[serde(rename = "A")]
    pub a: u64,
    #[serde(rename = "B")]
    pub b: u64,
    #[serde(rename = "C")]
    pub c: u64,
}

impl PartyCounts {
    pub fn get(&self, party: Party) -> u64 {
        match party {
            Party::A => self.a,
            Party::B => self.b,
            Party::C => self.c,
        }
    }

    pub fn add(&mut self, party: Party, amount: u64) {
        match party {
            Party::A => self.a += amount,
            Party::B => self.b += amount,
            Party::C => self.c += amount,
        }
    }

    pub fn total(&self) -> u64 {
        self.a + self.b + self.c
    }
}

/// Cumulative session statistics.
///
/// `waste_pct` is serialized as `efficiency`: the historical wire format
/// reported the waste percentage under that name, and existing callers
/// depend on it. The Rust-side name says what the number actually is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub capacity: i64,
    pub used: i64,
    pub wasted: i64,
    #[serde(rename = "efficiency")]
    pub waste_pct: f64,
    pub sent: PartyCounts,
}
