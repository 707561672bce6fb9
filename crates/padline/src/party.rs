//! Party identities and dynamic role assignment.

use serde::{Deserialize, Serialize};

/// Fixed identity of one of the three requesters.
///
/// Identities never change over a session; the role a party plays does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    A,
    B,
    C,
}

impl Party {
    /// All parties, in canonical order.
    pub const ALL: [Party; 3] = [Party::A, Party::B, Party::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Party::A => "A",
            Party::B => "B",
            Party::C => "C",
        }
    }

    pub(crate) fn idx(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Growth role a party currently holds.
///
/// Exactly one party holds each role at any time. The mapping mutates when
/// the repositioning policy swaps the middle-grower with a converging
/// neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Consumes from the low end upward.
    LeftGrower,
    /// Consumes from the midpoint outward in both directions.
    MiddleGrower,
    /// Consumes from the high end downward.
    RightGrower,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::LeftGrower => "left_grower",
            Role::MiddleGrower => "middle_grower",
            Role::RightGrower => "right_grower",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current party-to-role mapping.
///
/// Invariant: `left`, `middle`, and `right` are always three distinct
/// parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub left: Party,
    pub middle: Party,
    pub right: Party,
}

impl RoleAssignment {
    /// Role currently held by `party`.
    pub fn role_of(&self, party: Party) -> Role {
        if party == self.left {
            Role::LeftGrower
        } else if party == self.middle {
            Role::MiddleGrower
        } else {
            Role::RightGrower
        }
    }

    /// Party currently holding `role`.
    pub fn party_for(&self, role: Role) -> Party {
        match role {
            Role::LeftGrower => self.left,
            Role::MiddleGrower => self.middle,
            Role::RightGrower => self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_serializes_as_bare_label() {
        assert_eq!(serde_json::to_value(Party::A).unwrap(), "A");
        assert_eq!(serde_json::from_str::<Party>("\"C\"").unwrap(), Party::C);
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(Role::MiddleGrower).unwrap(),
            "middle_grower"
        );
    }

    #[test]
    fn role_assignment_maps_both_directions() {
        let roles = RoleAssignment {
            left: Party::A,
            middle: Party::C,
            right: Party::B,
        };

        assert_eq!(roles.role_of(Party::A), Role::LeftGrower);
        assert_eq!(roles.role_of(Party::C), Role::MiddleGrower);
        assert_eq!(roles.role_of(Party::B), Role::RightGrower);

        for role in [Role::LeftGrower, Role::MiddleGrower, Role::RightGrower] {
            assert_eq!(roles.role_of(roles.party_for(role)), role);
        }
    }
}
