//! Primary variable switch.
//!
//! After every update of the global solution each vertex is checked for
//! phase appearance or disappearance. A switch changes the vertex's phase
//! state and resets its second primary variable to a value just inside the
//! valid range of the new state.
//!
//! | from | trigger | to | new switch variable |
//! |---|---|---|---|
//! | `NonwettingOnly` | `X^w_n > X^w_n,max (1 + tol_a)` | `BothPhases` | `1 - tol_a` |
//! | `WettingOnly` | `X^a_w > X^a_w,max (1 + tol_a)` | `BothPhases` | `tol_a` |
//! | `BothPhases` | `S_n < -tol_d` | `WettingOnly` | `X^a_w,max` |
//! | `BothPhases` | `S_w < -tol_d` | `NonwettingOnly` | `X^w_n,max` |

use crate::config::SwitchTolerances;
use crate::energy::EnergyModel;
use crate::error::{BoxError, BoxResult};
use crate::indices::{PW_IDX, PhaseState, SWITCH_IDX};
use crate::phase_store::PhaseStateStore;
use crate::problem::BoxProblem;
use bx_core::VertexId;
use bx_material::MaterialSet;
use rayon::prelude::*;
use std::fmt;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    WettingAppears,
    NonwettingAppears,
    WettingDisappears,
    NonwettingDisappears,
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseEvent::WettingAppears => "wetting phase appears",
            PhaseEvent::NonwettingAppears => "nonwetting phase appears",
            PhaseEvent::WettingDisappears => "wetting phase disappears",
            PhaseEvent::NonwettingDisappears => "nonwetting phase disappears",
        };
        f.write_str(s)
    }
}

/// A switch decided for one vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Switch {
    pub event: PhaseEvent,
    pub state: PhaseState,
    /// New value of the second primary variable.
    pub value: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwitchController {
    tolerances: SwitchTolerances,
}

impl SwitchController {
    pub fn new(tolerances: SwitchTolerances) -> Self {
        Self { tolerances }
    }

    /// Decide whether the vertex with primary variables `sol` must switch.
    ///
    /// Errors with [`BoxError::AmbiguousSwitch`] if more than one trigger
    /// fires.
    pub fn primary_var_switch(
        &self,
        vertex: usize,
        state: PhaseState,
        sol: &[f64],
        pos: &[f64],
        laws: &MaterialSet<'_>,
        temperature: f64,
    ) -> BoxResult<Option<Switch>> {
        let SwitchTolerances {
            appearance,
            disappearance,
        } = self.tolerances;
        let x = sol[SWITCH_IDX];
        let sat_w = match state {
            PhaseState::BothPhases => 1.0 - x,
            PhaseState::WettingOnly => 1.0,
            PhaseState::NonwettingOnly => 0.0,
        };
        let p_n = sol[PW_IDX] + laws.law.pc(sat_w, pos)?;

        let switch = match state {
            PhaseState::NonwettingOnly => {
                let bound = laws.solubility.x_wn(p_n, temperature)?;
                (x > bound * (1.0 + appearance)).then_some(Switch {
                    event: PhaseEvent::WettingAppears,
                    state: PhaseState::BothPhases,
                    value: 1.0 - appearance,
                })
            }
            PhaseState::WettingOnly => {
                let bound = laws.solubility.x_aw(p_n, temperature)?;
                (x > bound * (1.0 + appearance)).then_some(Switch {
                    event: PhaseEvent::NonwettingAppears,
                    state: PhaseState::BothPhases,
                    value: appearance,
                })
            }
            PhaseState::BothPhases => {
                let sat_n = 1.0 - sat_w;
                let nonwetting_gone = if sat_n < -disappearance {
                    Some(Switch {
                        event: PhaseEvent::NonwettingDisappears,
                        state: PhaseState::WettingOnly,
                        value: laws.solubility.x_aw(p_n, temperature)?,
                    })
                } else {
                    None
                };
                let wetting_gone = if sat_w < -disappearance {
                    Some(Switch {
                        event: PhaseEvent::WettingDisappears,
                        state: PhaseState::NonwettingOnly,
                        value: laws.solubility.x_wn(p_n, temperature)?,
                    })
                } else {
                    None
                };
                match (nonwetting_gone, wetting_gone) {
                    (Some(_), Some(_)) => {
                        return Err(BoxError::AmbiguousSwitch {
                            vertex: VertexId::from_index(vertex),
                            state,
                        });
                    }
                    (one, None) | (None, one) => one,
                }
            }
        };
        Ok(switch)
    }

    /// Check every vertex and apply the switches to `store` and `solution`.
    ///
    /// Decisions are taken in parallel from the unmodified state and applied
    /// afterwards, so the pass is complete before this returns. Returns
    /// true if any vertex switched; the store's switched flag is raised in
    /// that case.
    pub fn run_switch_pass<P, E, const D: usize, const N: usize>(
        &self,
        problem: &P,
        energy: &E,
        store: &mut PhaseStateStore,
        solution: &mut [[f64; N]],
    ) -> BoxResult<bool>
    where
        P: BoxProblem<D>,
        E: EnergyModel<D, N>,
    {
        if solution.len() != store.len() {
            return Err(BoxError::InvalidArg {
                what: "solution length does not match the phase state store",
            });
        }
        let frozen: &PhaseStateStore = store;
        let decisions = solution
            .par_iter()
            .enumerate()
            .map(|(v, sol)| -> BoxResult<_> {
                let pos = problem.vertex_position(v);
                let switch = self.primary_var_switch(
                    v,
                    frozen.current(v),
                    sol,
                    pos.as_slice(),
                    &problem.materials(),
                    energy.temperature(sol),
                )?;
                Ok(switch.map(|s| (v, s)))
            })
            .collect::<BoxResult<Vec<_>>>()?;

        let mut switched = false;
        for (v, s) in decisions.into_iter().flatten() {
            let pos = problem.vertex_position(v);
            info!(vertex = v, position = ?pos.as_slice(), "{}", s.event);
            store.set_current(v, s.state)?;
            solution[v][SWITCH_IDX] = s.value;
            switched = true;
        }
        if switched {
            store.set_switched(true);
        }
        Ok(switched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::Isothermal;
    use crate::testing::{TestProblem, X_AW, X_WN};

    fn decide(state: PhaseState, sol: [f64; 2]) -> BoxResult<Option<Switch>> {
        let problem = TestProblem::line(1);
        SwitchController::default().primary_var_switch(
            0,
            state,
            &sol,
            &[0.0],
            &problem.materials(),
            283.15,
        )
    }

    #[test]
    fn wetting_phase_appears() {
        let s = decide(PhaseState::NonwettingOnly, [1e5, X_WN * (1.0 + 3e-5)])
            .unwrap()
            .unwrap();
        assert_eq!(s.state, PhaseState::BothPhases);
        assert_eq!(s.event, PhaseEvent::WettingAppears);
        assert_eq!(s.value, 1.0 - 2e-5);

        // within tolerance nothing happens
        assert!(decide(PhaseState::NonwettingOnly, [1e5, X_WN * (1.0 + 1e-5)])
            .unwrap()
            .is_none());
    }

    #[test]
    fn nonwetting_phase_appears() {
        let s = decide(PhaseState::WettingOnly, [1e5, X_AW * 1.001])
            .unwrap()
            .unwrap();
        assert_eq!(s.state, PhaseState::BothPhases);
        assert_eq!(s.value, 2e-5);
    }

    #[test]
    fn phases_disappear() {
        let s = decide(PhaseState::BothPhases, [1e5, -2e-5]).unwrap().unwrap();
        assert_eq!(s.event, PhaseEvent::NonwettingDisappears);
        assert_eq!(s.state, PhaseState::WettingOnly);
        assert_eq!(s.value, X_AW);

        let s = decide(PhaseState::BothPhases, [1e5, 1.0 + 2e-5]).unwrap().unwrap();
        assert_eq!(s.event, PhaseEvent::WettingDisappears);
        assert_eq!(s.state, PhaseState::NonwettingOnly);
        assert_eq!(s.value, X_WN);

        assert!(decide(PhaseState::BothPhases, [1e5, -5e-6]).unwrap().is_none());
        assert!(decide(PhaseState::BothPhases, [1e5, 0.5]).unwrap().is_none());
    }

    #[test]
    fn conflicting_triggers_are_fatal() {
        // tolerances loose enough that both saturations count as negative
        let ctrl = SwitchController::new(SwitchTolerances {
            appearance: 2e-5,
            disappearance: -0.6,
        });
        let problem = TestProblem::line(1);
        let err = ctrl
            .primary_var_switch(4, PhaseState::BothPhases, &[1e5, 0.5], &[0.0], &problem.materials(), 283.15)
            .unwrap_err();
        assert!(matches!(
            err,
            BoxError::AmbiguousSwitch {
                state: PhaseState::BothPhases,
                ..
            }
        ));
    }

    #[test]
    fn pass_updates_store_and_solution() {
        let mut problem = TestProblem::line(3);
        problem.states = vec![
            PhaseState::NonwettingOnly,
            PhaseState::BothPhases,
            PhaseState::BothPhases,
        ];
        let mut store = PhaseStateStore::from_problem(&problem);
        let mut solution = [
            [1e5, X_WN * (1.0 + 3e-5)],
            [1e5, 0.4],
            [1e5, -1e-3],
        ];
        let ctrl = SwitchController::default();
        let energy = Isothermal::default();

        let switched = ctrl
            .run_switch_pass(&problem, &energy, &mut store, &mut solution)
            .unwrap();
        assert!(switched);
        assert!(store.switched());
        assert_eq!(store.current(0), PhaseState::BothPhases);
        assert_eq!(store.current(1), PhaseState::BothPhases);
        assert_eq!(store.current(2), PhaseState::WettingOnly);
        assert_eq!(solution[0][1], 1.0 - 2e-5);
        assert_eq!(solution[1][1], 0.4);
        assert_eq!(solution[2][1], X_AW);
        // previous level untouched until commit
        assert_eq!(store.previous(0), PhaseState::NonwettingOnly);

        // a second pass on the switched state is quiet
        let again = ctrl
            .run_switch_pass(&problem, &energy, &mut store, &mut solution)
            .unwrap();
        assert!(!again);

        store.rollback();
        assert_eq!(store.current(2), PhaseState::BothPhases);
        assert!(!store.switched());
    }
}
