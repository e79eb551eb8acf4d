//! Implicit time stepping with Newton iterations and phase switching.

use crate::error::{SimError, SimResult};
use crate::options::{NewtonOptions, SimOptions};
use bx_box::{
    BoxConfig, BoxError, BoxProblem, CellGeometry, EnergyModel, LocalJacobian, PhaseStateStore,
    SwitchController, VertexFields,
};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Outcome of one accepted time step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    pub dt: f64,
    pub iterations: usize,
    /// Number of Newton iterations in which a vertex switched.
    pub switches: usize,
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<const N: usize> {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// Solution snapshots
    pub x: Vec<Vec<[f64; N]>>,
    /// Failed attempts that were retried with a smaller step
    pub cutback_retries: usize,
    pub newton_iterations: usize,
    pub switches: usize,
}

/// Owns the global solution and the phase state of a problem.
pub struct Simulator<P, E, const D: usize, const N: usize> {
    problem: P,
    energy: E,
    config: BoxConfig,
    cells: Vec<CellGeometry<D>>,
    store: PhaseStateStore,
    switch: SwitchController,
    dirichlet: Vec<Option<[f64; N]>>,
    solution: Vec<[f64; N]>,
    time: f64,
}

impl<P, E, const D: usize, const N: usize> Simulator<P, E, D, N>
where
    P: BoxProblem<D>,
    E: EnergyModel<D, N>,
{
    pub fn new(
        problem: P,
        energy: E,
        config: BoxConfig,
        cells: Vec<CellGeometry<D>>,
        initial: Vec<[f64; N]>,
    ) -> SimResult<Self> {
        config.validate()?;
        let n = problem.num_vertices();
        if initial.len() != n {
            return Err(SimError::InvalidArg {
                what: "initial solution does not match the vertex count",
            });
        }
        for cell in &cells {
            cell.validate()?;
            if cell.vertices.iter().any(|&v| v >= n) {
                return Err(SimError::InvalidArg {
                    what: "cell refers to an unknown vertex",
                });
            }
        }
        let store = PhaseStateStore::from_problem(&problem);
        Ok(Self {
            switch: SwitchController::new(config.switch),
            problem,
            energy,
            config,
            cells,
            store,
            dirichlet: vec![None; n],
            solution: initial,
            time: 0.0,
        })
    }

    /// Fix all primary variables of `vertex`.
    pub fn set_dirichlet(&mut self, vertex: usize, values: [f64; N]) -> SimResult<()> {
        let slot = self.dirichlet.get_mut(vertex).ok_or(SimError::InvalidArg {
            what: "dirichlet vertex out of range",
        })?;
        *slot = Some(values);
        self.solution[vertex] = values;
        Ok(())
    }

    pub fn solution(&self) -> &[[f64; N]] {
        &self.solution
    }

    pub fn phase_states(&self) -> &PhaseStateStore {
        &self.store
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Diagnostic fields of the current solution.
    pub fn fields(&self) -> SimResult<VertexFields> {
        Ok(VertexFields::collect(
            &self.problem,
            &self.energy,
            &self.store,
            &self.solution,
        )?)
    }

    /// Global residual and Jacobian at `cur`.
    ///
    /// Cells are assembled in parallel into local blocks that are then
    /// added up serially.
    fn assemble(
        &self,
        cur: &[[f64; N]],
        prev: &[[f64; N]],
        dt: f64,
        epsilon: f64,
    ) -> SimResult<(DVector<f64>, DMatrix<f64>)> {
        let blocks = self
            .cells
            .par_iter()
            .map(|cell| -> Result<_, BoxError> {
                let mut local =
                    LocalJacobian::new(&self.problem, &self.energy, &self.store, &self.config)?;
                local.set_params(cell, cur, prev)?;
                let (res, jac) = local.assemble_jacobian(dt, epsilon)?;
                Ok((cell, res, jac))
            })
            .collect::<Result<Vec<_>, BoxError>>()?;

        let n = cur.len() * N;
        let mut residual = DVector::zeros(n);
        let mut jacobian = DMatrix::zeros(n, n);
        for (cell, res, jac) in blocks {
            let dof = |node: usize, comp: usize| cell.vertices[node] * N + comp;
            for (node, r) in res.iter().enumerate() {
                for eq in 0..N {
                    residual[dof(node, eq)] += r[eq];
                }
            }
            let nodes = cell.num_nodes();
            for row in 0..nodes * N {
                for col in 0..nodes * N {
                    jacobian[(dof(row / N, row % N), dof(col / N, col % N))] += jac[(row, col)];
                }
            }
        }

        for (v, fixed) in self.dirichlet.iter().enumerate() {
            if let Some(values) = fixed {
                for eq in 0..N {
                    let row = v * N + eq;
                    jacobian.row_mut(row).fill(0.0);
                    jacobian[(row, row)] = 1.0;
                    residual[row] = cur[v][eq] - values[eq];
                }
            }
        }
        Ok((residual, jacobian))
    }

    /// Newton iterations for one time step, on a copy of the solution.
    fn newton(&mut self, dt: f64, opts: &NewtonOptions) -> SimResult<(Vec<[f64; N]>, StepReport)> {
        let prev = self.solution.clone();
        let mut cur = prev.clone();
        let mut switches = 0;

        for iter in 1..=opts.max_iterations {
            let (residual, jacobian) = self.assemble(&cur, &prev, dt, opts.epsilon)?;
            let res_norm = self.weighted_norm(&residual, |e, i| e.eq_weight(i));
            if !res_norm.is_finite() {
                return Err(SimError::ConvergenceFailed {
                    what: "non-finite residual".to_string(),
                });
            }

            let delta = jacobian
                .lu()
                .solve(&(-residual))
                .ok_or_else(|| SimError::ConvergenceFailed {
                    what: "singular Jacobian".to_string(),
                })?;
            for (v, x) in cur.iter_mut().enumerate() {
                for (k, value) in x.iter_mut().enumerate() {
                    *value += delta[v * N + k];
                }
            }
            let update = self.weighted_norm(&delta, |e, i| e.primary_var_weight(i));

            let switched =
                self.switch
                    .run_switch_pass(&self.problem, &self.energy, &mut self.store, &mut cur)?;
            if switched {
                switches += 1;
            }
            debug!(iter, residual = res_norm, update, switched, "newton iteration");

            if !switched && update < opts.tolerance {
                let report = StepReport {
                    dt,
                    iterations: iter,
                    switches,
                };
                return Ok((cur, report));
            }
        }

        Err(SimError::ConvergenceFailed {
            what: format!("no convergence in {} iterations", opts.max_iterations),
        })
    }

    fn weighted_norm(&self, v: &DVector<f64>, weight: impl Fn(&E, usize) -> f64) -> f64 {
        v.iter()
            .enumerate()
            .map(|(i, x)| (x * weight(&self.energy, i % N)).abs())
            .fold(0.0, f64::max)
    }

    /// Advance by `dt`. A failed step leaves the solution and the accepted
    /// phase state unchanged.
    pub fn step(&mut self, dt: f64, opts: &NewtonOptions) -> SimResult<StepReport> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        match self.newton(dt, opts) {
            Ok((solution, report)) => {
                self.solution = solution;
                self.store.commit();
                self.time += dt;
                Ok(report)
            }
            Err(e) => {
                self.store.rollback();
                Err(e)
            }
        }
    }

    /// Advance to the absolute time `opts.t_end`, cutting the time step
    /// back on failure.
    pub fn run(&mut self, opts: &SimOptions) -> SimResult<SimRecord<N>> {
        opts.validate()?;
        let mut record = SimRecord {
            t: vec![self.time],
            x: vec![self.solution.clone()],
            cutback_retries: 0,
            newton_iterations: 0,
            switches: 0,
        };

        let t_end = opts.t_end;
        let mut dt = opts.dt;
        let mut steps = 0;
        while t_end - self.time > 1e-12 * t_end.abs().max(1.0) && steps < opts.max_steps {
            let mut attempt = dt.min(t_end - self.time);
            let mut retries = 0;
            let report = loop {
                match self.step(attempt, &opts.newton) {
                    Ok(report) => break report,
                    Err(e) if e.is_retryable() && retries < opts.max_retries => {
                        retries += 1;
                        record.cutback_retries += 1;
                        attempt *= opts.cutback_factor;
                        warn!(time = self.time, dt = attempt, error = %e, "cutting back time step");
                        if attempt < opts.min_dt {
                            return Err(SimError::TimeStepTooSmall { dt: attempt });
                        }
                    }
                    Err(e) => return Err(e),
                }
            };

            steps += 1;
            record.newton_iterations += report.iterations;
            record.switches += report.switches;
            if report.switches > 0 {
                info!(time = self.time, switches = report.switches, "phase state changed");
            }

            dt = if report.iterations <= opts.newton.target_iterations {
                (attempt * opts.grow_factor).min(opts.max_dt)
            } else {
                attempt
            };

            if steps % opts.record_every == 0 {
                record.t.push(self.time);
                record.x.push(self.solution.clone());
            }
        }

        if steps % opts.record_every != 0 {
            record.t.push(self.time);
            record.x.push(self.solution.clone());
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, fixtures};
    use bx_box::{Isothermal, PhaseState};

    fn water_column(cells: usize) -> Simulator<Column, Isothermal, 1, 2> {
        let mut column = Column::new(1.0, cells, fixtures::materials()).unwrap();
        for v in 0..=cells {
            column.set_initial_state(v, PhaseState::WettingOnly).unwrap();
        }
        let grid = column.cells().unwrap();
        let initial = vec![[1e5, 0.0]; cells + 1];
        Simulator::new(column, Isothermal::default(), BoxConfig::default(), grid, initial).unwrap()
    }

    #[test]
    fn equilibrium_converges_at_once() {
        let mut sim = water_column(4);
        sim.set_dirichlet(4, [1e5, 0.0]).unwrap();
        let report = sim.step(10.0, &NewtonOptions::default()).unwrap();
        assert_eq!(report.iterations, 1);
        assert_eq!(report.switches, 0);
        assert_eq!(sim.time(), 10.0);
        for x in sim.solution() {
            assert!((x[0] - 1e5).abs() < 1e-6);
        }
    }

    #[test]
    fn failed_step_leaves_state_untouched() {
        let mut sim = water_column(3);
        sim.set_dirichlet(0, [2e5, 0.0]).unwrap();
        sim.set_dirichlet(3, [1e5, 0.0]).unwrap();
        let before = sim.solution().to_vec();

        let opts = NewtonOptions {
            max_iterations: 1,
            tolerance: 1e-30,
            ..NewtonOptions::default()
        };
        let err = sim.step(1.0, &opts).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(sim.solution(), before.as_slice());
        assert_eq!(sim.time(), 0.0);
        assert!(!sim.phase_states().switched());
    }

    #[test]
    fn failed_step_rolls_back_phase_switch() {
        let mut sim = water_column(1);
        sim.set_dirichlet(0, [1e5, 0.0]).unwrap();
        // supersaturated dissolved air at vertex 1 triggers gas appearance
        sim.solution[1] = [1e5, 2.0 * fixtures::X_AW];
        let before_sol = sim.solution().to_vec();
        let before_states = sim.phase_states().clone();

        // the first iteration switches, so one iteration can never converge
        let opts = NewtonOptions {
            max_iterations: 1,
            ..NewtonOptions::default()
        };
        let err = sim.step(1.0, &opts).unwrap_err();
        assert!(matches!(err, SimError::ConvergenceFailed { .. }));
        assert_eq!(sim.phase_states(), &before_states);
        assert_eq!(sim.phase_states().current(1), PhaseState::WettingOnly);
        assert!(!sim.phase_states().switched());
        assert_eq!(sim.solution(), before_sol.as_slice());
        assert_eq!(sim.time(), 0.0);

        let report = sim.step(1.0, &NewtonOptions::default()).unwrap();
        assert!(report.switches >= 1);
        assert_eq!(sim.phase_states().current(1), PhaseState::BothPhases);
        assert_eq!(sim.phase_states().previous(1), PhaseState::BothPhases);
        assert!(sim.solution()[1][1] > 0.0);
    }

    #[test]
    fn dirichlet_out_of_range() {
        let mut sim = water_column(2);
        assert!(sim.set_dirichlet(3, [1e5, 0.0]).is_err());
    }
}
