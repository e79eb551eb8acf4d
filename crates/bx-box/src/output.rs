//! Per-vertex diagnostic fields.

use crate::energy::EnergyModel;
use crate::error::{BoxError, BoxResult};
use crate::indices::{N_COMP, N_PHASE, W_COMP, W_PHASE};
use crate::node_vars::{NodeVars, update_node_vars};
use crate::phase_store::PhaseStateStore;
use crate::problem::BoxProblem;
use rayon::prelude::*;
use serde::Serialize;
use std::io::{self, Write};

/// Secondary variables of every vertex, evaluated from a global solution
/// and the current phase state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VertexFields {
    #[serde(rename = "pW")]
    pub p_w: Vec<f64>,
    #[serde(rename = "pN")]
    pub p_n: Vec<f64>,
    #[serde(rename = "pC")]
    pub p_c: Vec<f64>,
    #[serde(rename = "Sw")]
    pub sat_w: Vec<f64>,
    #[serde(rename = "Sn")]
    pub sat_n: Vec<f64>,
    #[serde(rename = "mobW")]
    pub mob_w: Vec<f64>,
    #[serde(rename = "mobN")]
    pub mob_n: Vec<f64>,
    /// Air in the wetting phase.
    #[serde(rename = "Xaw")]
    pub x_aw: Vec<f64>,
    /// Air in the nonwetting phase.
    #[serde(rename = "Xaa")]
    pub x_aa: Vec<f64>,
    /// Water in the wetting phase.
    #[serde(rename = "Xww")]
    pub x_ww: Vec<f64>,
    /// Water in the nonwetting phase.
    #[serde(rename = "Xwa")]
    pub x_wa: Vec<f64>,
    #[serde(rename = "T")]
    pub temperature: Vec<f64>,
    pub phase_state: Vec<i32>,
}

impl VertexFields {
    pub fn collect<P, E, const D: usize, const N: usize>(
        problem: &P,
        energy: &E,
        store: &PhaseStateStore,
        solution: &[[f64; N]],
    ) -> BoxResult<Self>
    where
        P: BoxProblem<D>,
        E: EnergyModel<D, N>,
    {
        if solution.len() != store.len() {
            return Err(BoxError::InvalidArg {
                what: "solution length does not match the phase state store",
            });
        }
        let vars = solution
            .par_iter()
            .enumerate()
            .map(|(v, sol)| {
                let pos = problem.vertex_position(v);
                update_node_vars(
                    sol,
                    store.current(v),
                    pos.as_slice(),
                    &problem.materials(),
                    energy.temperature(sol),
                )
            })
            .collect::<BoxResult<Vec<NodeVars>>>()?;

        let field = |f: fn(&NodeVars) -> f64| vars.iter().map(f).collect::<Vec<_>>();
        Ok(Self {
            p_w: field(|d| d.p_w),
            p_n: field(|d| d.p_n),
            p_c: field(|d| d.p_c),
            sat_w: field(|d| d.sat_w),
            sat_n: field(|d| d.sat_n),
            mob_w: field(|d| d.mobility[W_PHASE]),
            mob_n: field(|d| d.mobility[N_PHASE]),
            x_aw: field(|d| d.mass_frac[N_COMP][W_PHASE]),
            x_aa: field(|d| d.mass_frac[N_COMP][N_PHASE]),
            x_ww: field(|d| d.mass_frac[W_COMP][W_PHASE]),
            x_wa: field(|d| d.mass_frac[W_COMP][N_PHASE]),
            temperature: field(|d| d.temperature),
            phase_state: vars.iter().map(|d| d.phase_state.tag()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.p_w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p_w.is_empty()
    }

    /// Named real-valued columns in output order.
    pub fn columns(&self) -> [(&'static str, &[f64]); 12] {
        [
            ("pW", self.p_w.as_slice()),
            ("pN", self.p_n.as_slice()),
            ("pC", self.p_c.as_slice()),
            ("Sw", self.sat_w.as_slice()),
            ("Sn", self.sat_n.as_slice()),
            ("mobW", self.mob_w.as_slice()),
            ("mobN", self.mob_n.as_slice()),
            ("Xaw", self.x_aw.as_slice()),
            ("Xaa", self.x_aa.as_slice()),
            ("Xww", self.x_ww.as_slice()),
            ("Xwa", self.x_wa.as_slice()),
            ("T", self.temperature.as_slice()),
        ]
    }

    /// Write one row per vertex, with a header line.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        let columns = self.columns();
        let header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        writeln!(out, "vertex,{},phase_state", header.join(","))?;
        for v in 0..self.len() {
            let row: Vec<String> = columns.iter().map(|(_, c)| c[v].to_string()).collect();
            writeln!(out, "{},{},{}", v, row.join(","), self.phase_state[v])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::Isothermal;
    use crate::indices::PhaseState;
    use crate::testing::{TestProblem, X_AW};

    #[test]
    fn fields_follow_phase_state() {
        let mut problem = TestProblem::line(2);
        problem.states = vec![PhaseState::BothPhases, PhaseState::WettingOnly];
        let store = PhaseStateStore::from_problem(&problem);
        let solution = [[1e5, 0.25], [1.1e5, 3e-6]];

        let fields = VertexFields::collect(&problem, &Isothermal::default(), &store, &solution).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.sat_n, vec![0.25, 0.0]);
        assert_eq!(fields.p_c[0], 250.0);
        assert_eq!(fields.x_aw, vec![X_AW, 3e-6]);
        assert_eq!(fields.temperature, vec![283.15, 283.15]);
        assert_eq!(fields.phase_state, vec![2, 1]);

        let json = serde_json::to_value(&fields).unwrap();
        assert!(json.get("Xwa").is_some());
        assert_eq!(json["phase_state"][1], 1);
    }

    #[test]
    fn csv_has_one_row_per_vertex() {
        let problem = TestProblem::line(3);
        let store = PhaseStateStore::from_problem(&problem);
        let solution = [[1e5, 0.5]; 3];
        let fields = VertexFields::collect(&problem, &Isothermal::default(), &store, &solution).unwrap();

        let mut buf = Vec::new();
        fields.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("vertex,pW,pN,pC,Sw,Sn"));
        assert!(lines[0].ends_with(",T,phase_state"));
        assert!(lines[2].starts_with("1,100000,"));
        assert!(lines[3].ends_with(",2"));
    }

    #[test]
    fn mismatched_solution_is_rejected() {
        let problem = TestProblem::line(2);
        let store = PhaseStateStore::from_problem(&problem);
        let solution = [[1e5, 0.5]; 3];
        assert!(VertexFields::collect(&problem, &Isothermal::default(), &store, &solution).is_err());
    }
}
