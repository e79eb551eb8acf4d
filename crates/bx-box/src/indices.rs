//! Index conventions and the discrete phase state.

use crate::error::BoxError;
use serde::{Deserialize, Serialize};

/// Number of fluid phases.
pub const NUM_PHASES: usize = 2;
/// Number of components.
pub const NUM_COMPONENTS: usize = 2;

/// Wetting pressure in the primary variable vector.
pub const PW_IDX: usize = 0;
/// Phase-state dependent second primary variable.
pub const SWITCH_IDX: usize = 1;

/// Mass balance of the wetting component.
pub const CONTI_W_EQ: usize = 0;
/// Mass balance of the nonwetting component.
pub const CONTI_N_EQ: usize = 1;

pub const W_PHASE: usize = 0;
pub const N_PHASE: usize = 1;

pub const W_COMP: usize = 0;
pub const N_COMP: usize = 1;

/// Phases present at a vertex.
///
/// The integer tags match the ones written to the field output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    NonwettingOnly,
    WettingOnly,
    #[default]
    BothPhases,
}

impl PhaseState {
    pub fn tag(self) -> i32 {
        match self {
            PhaseState::NonwettingOnly => 0,
            PhaseState::WettingOnly => 1,
            PhaseState::BothPhases => 2,
        }
    }
}

impl TryFrom<i32> for PhaseState {
    type Error = BoxError;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(PhaseState::NonwettingOnly),
            1 => Ok(PhaseState::WettingOnly),
            2 => Ok(PhaseState::BothPhases),
            _ => Err(BoxError::InvalidPhaseState { tag }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for state in [
            PhaseState::NonwettingOnly,
            PhaseState::WettingOnly,
            PhaseState::BothPhases,
        ] {
            assert_eq!(PhaseState::try_from(state.tag()).unwrap(), state);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = PhaseState::try_from(3).unwrap_err();
        assert!(matches!(err, BoxError::InvalidPhaseState { tag: 3 }));
        assert!(PhaseState::try_from(-1).is_err());
    }
}
