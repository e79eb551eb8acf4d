//! Per-vertex phase state with an accepted (previous) and a trial (current)
//! copy.
//!
//! Only the switch controller changes the current copy. Vertices touched
//! since the last commit are tracked, so `commit` and `rollback` cost is
//! proportional to the number of switched vertices rather than the mesh size.

use crate::error::{BoxResult, check_index};
use crate::indices::PhaseState;
use crate::problem::BoxProblem;

#[derive(Clone, Debug, PartialEq)]
pub struct PhaseStateStore {
    current: Vec<PhaseState>,
    previous: Vec<PhaseState>,
    dirty: Vec<usize>,
    is_dirty: Vec<bool>,
    switched: bool,
}

impl PhaseStateStore {
    pub fn new(initial: Vec<PhaseState>) -> Self {
        let n = initial.len();
        Self {
            previous: initial.clone(),
            current: initial,
            dirty: Vec::new(),
            is_dirty: vec![false; n],
            switched: false,
        }
    }

    /// Initialize every vertex from the problem's initial phase state.
    pub fn from_problem<P: BoxProblem<D>, const D: usize>(problem: &P) -> Self {
        let states = (0..problem.num_vertices())
            .map(|v| problem.initial_phase_state(v, &problem.vertex_position(v)))
            .collect();
        Self::new(states)
    }

    /// Build from raw integer tags, e.g. a previously exported field.
    pub fn from_tags(tags: &[i32]) -> BoxResult<Self> {
        let states = tags
            .iter()
            .map(|&t| PhaseState::try_from(t))
            .collect::<BoxResult<Vec<_>>>()?;
        Ok(Self::new(states))
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn current(&self, vertex: usize) -> PhaseState {
        self.current[vertex]
    }

    pub fn previous(&self, vertex: usize) -> PhaseState {
        self.previous[vertex]
    }

    pub fn current_states(&self) -> &[PhaseState] {
        &self.current
    }

    pub fn tags(&self) -> Vec<i32> {
        self.current.iter().map(|s| s.tag()).collect()
    }

    pub(crate) fn set_current(&mut self, vertex: usize, state: PhaseState) -> BoxResult<()> {
        check_index("vertex", vertex, self.current.len())?;
        if self.current[vertex] == state {
            return Ok(());
        }
        self.current[vertex] = state;
        if !self.is_dirty[vertex] {
            self.is_dirty[vertex] = true;
            self.dirty.push(vertex);
        }
        Ok(())
    }

    /// True if a primary variable switch happened since the flag was last
    /// cleared.
    pub fn switched(&self) -> bool {
        self.switched
    }

    pub fn set_switched(&mut self, yesno: bool) {
        self.switched = yesno;
    }

    /// Accept the current phase state after a successful step.
    pub fn commit(&mut self) {
        for v in self.dirty.drain(..) {
            self.previous[v] = self.current[v];
            self.is_dirty[v] = false;
        }
        self.switched = false;
    }

    /// Return to the last accepted phase state after a failed step.
    pub fn rollback(&mut self) {
        for v in self.dirty.drain(..) {
            self.current[v] = self.previous[v];
            self.is_dirty[v] = false;
        }
        self.switched = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;

    fn store() -> PhaseStateStore {
        PhaseStateStore::new(vec![
            PhaseState::BothPhases,
            PhaseState::WettingOnly,
            PhaseState::NonwettingOnly,
        ])
    }

    #[test]
    fn commit_accepts_switches() {
        let mut s = store();
        s.set_current(1, PhaseState::BothPhases).unwrap();
        s.set_switched(true);
        assert_eq!(s.previous(1), PhaseState::WettingOnly);

        s.commit();
        assert_eq!(s.previous(1), PhaseState::BothPhases);
        assert!(!s.switched());

        let snapshot = s.clone();
        s.commit();
        assert_eq!(s, snapshot);
    }

    #[test]
    fn rollback_restores_last_commit() {
        let mut s = store();
        s.set_current(0, PhaseState::WettingOnly).unwrap();
        s.commit();
        let committed = s.clone();

        s.set_current(0, PhaseState::BothPhases).unwrap();
        s.set_current(2, PhaseState::BothPhases).unwrap();
        s.set_switched(true);
        s.rollback();
        assert_eq!(s, committed);
        assert!(!s.switched());

        // rolling back right after a commit changes nothing
        s.rollback();
        assert_eq!(s, committed);
    }

    #[test]
    fn from_tags_rejects_unknown() {
        let s = PhaseStateStore::from_tags(&[0, 1, 2]).unwrap();
        assert_eq!(s.tags(), vec![0, 1, 2]);
        let err = PhaseStateStore::from_tags(&[0, 5]).unwrap_err();
        assert!(matches!(err, BoxError::InvalidPhaseState { tag: 5 }));
    }

    #[test]
    fn set_out_of_range_fails() {
        let mut s = store();
        assert!(s.set_current(3, PhaseState::BothPhases).is_err());
    }
}
