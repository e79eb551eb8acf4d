//! YAML description of a column simulation.
//!
//! ```yaml
//! name: drainage
//! column: { length: 1.0, cells: 20, permeability: 1.0e-12, porosity: 0.3, gravity: -9.81 }
//! materials:
//!   law: { kind: brooks_corey, entry_pressure: 1000.0, lambda: 2.0 }
//!   solubility: { kind: henry }
//!   wetting: { kind: incompressible, density: 1000.0, viscosity: 1.0e-3 }
//!   nonwetting: { kind: air }
//! initial:
//!   - { from: 0.0, to: 1.0, state: wetting_only, pw: 1.0e5, x: 0.0, hydrostatic: true }
//! boundary:
//!   - { at: top, state: both_phases, pw: 1.0e5, x: 0.8 }
//! sim: { dt: 10.0, t_end: 3600.0 }
//! ```
//!
//! `energy` defaults to `{ kind: isothermal, temperature_k: 283.15 }`. With
//! `kind: non_isothermal` temperature becomes a third primary variable;
//! regions and boundaries then take an optional `t` in kelvin.

use crate::column::{Column, ColumnMaterials};
use crate::error::{SimError, SimResult};
use crate::options::SimOptions;
use crate::simulator::{SimRecord, Simulator};
use bx_box::{BoxConfig, BoxProblem, Isothermal, NonIsothermal, PhaseState, VertexFields};
use bx_core::units::{kgpm3, pa, pas};
use bx_material::{
    BrooksCorey, ConstantSolubility, HenrySolubility, IdealGas, IncompressibleFluid, LinearLaw,
    MaterialLaw, PhaseFluid, Solubility,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    pub column: ColumnSpec,
    pub materials: MaterialSpec,
    #[serde(default)]
    pub energy: EnergySpec,
    pub initial: Vec<RegionSpec>,
    #[serde(default)]
    pub boundary: Vec<BoundarySpec>,
    #[serde(default, rename = "box")]
    pub box_config: BoxConfig,
    #[serde(default)]
    pub sim: SimOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    pub length: f64,
    pub cells: usize,
    #[serde(default = "default_area")]
    pub area: f64,
    pub porosity: f64,
    pub permeability: f64,
    /// Along the column axis; negative points to the bottom.
    #[serde(default)]
    pub gravity: f64,
}

fn default_area() -> f64 {
    1.0
}

fn default_temperature() -> f64 {
    Isothermal::default().temperature_k
}

/// Energy model of the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnergySpec {
    Isothermal {
        #[serde(default = "default_temperature")]
        temperature_k: f64,
    },
    NonIsothermal {
        /// Temperature of vertices without an explicit `t`.
        #[serde(default = "default_temperature")]
        temperature_k: f64,
        #[serde(default)]
        medium: NonIsothermal,
    },
}

impl Default for EnergySpec {
    fn default() -> Self {
        EnergySpec::Isothermal {
            temperature_k: default_temperature(),
        }
    }
}

impl EnergySpec {
    pub fn temperature_k(&self) -> f64 {
        match *self {
            EnergySpec::Isothermal { temperature_k }
            | EnergySpec::NonIsothermal { temperature_k, .. } => temperature_k,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialSpec {
    pub law: LawSpec,
    pub solubility: SolubilitySpec,
    pub wetting: FluidSpec,
    pub nonwetting: FluidSpec,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LawSpec {
    Linear {
        entry_pressure: f64,
    },
    BrooksCorey {
        entry_pressure: f64,
        lambda: f64,
        #[serde(default)]
        swr: f64,
        #[serde(default)]
        snr: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolubilitySpec {
    Constant { x_aw: f64, x_wn: f64 },
    Henry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FluidSpec {
    Incompressible { density: f64, viscosity: f64 },
    IdealGas { molar_mass: f64, viscosity: f64 },
    Air,
}

/// Initial state of all vertices with `from <= x <= to`. Later regions
/// override earlier ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionSpec {
    pub from: f64,
    pub to: f64,
    pub state: PhaseState,
    /// Wetting pressure; with `hydrostatic` the value at `to`.
    pub pw: f64,
    pub x: f64,
    /// Temperature; only for non-isothermal runs.
    #[serde(default)]
    pub t: Option<f64>,
    #[serde(default)]
    pub hydrostatic: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnEnd {
    Bottom,
    Top,
}

/// Fixed state at one end of the column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundarySpec {
    pub at: ColumnEnd,
    pub state: PhaseState,
    pub pw: f64,
    pub x: f64,
    #[serde(default)]
    pub t: Option<f64>,
}

/// Simulator built from a scenario, one variant per energy model.
pub enum ColumnSim {
    Isothermal(Simulator<Column, Isothermal, 1, 2>),
    NonIsothermal(Simulator<Column, NonIsothermal, 1, 3>),
}

/// `SimRecord` with snapshot rows of either width.
#[derive(Clone, Debug)]
pub struct ColumnRecord {
    pub t: Vec<f64>,
    /// `x[snapshot][vertex][var]`
    pub x: Vec<Vec<Vec<f64>>>,
    pub cutback_retries: usize,
    pub newton_iterations: usize,
    pub switches: usize,
}

impl<const N: usize> From<SimRecord<N>> for ColumnRecord {
    fn from(record: SimRecord<N>) -> Self {
        Self {
            t: record.t,
            x: record
                .x
                .into_iter()
                .map(|snap| snap.iter().map(|row| row.to_vec()).collect())
                .collect(),
            cutback_retries: record.cutback_retries,
            newton_iterations: record.newton_iterations,
            switches: record.switches,
        }
    }
}

impl ColumnSim {
    pub fn num_vertices(&self) -> usize {
        match self {
            ColumnSim::Isothermal(sim) => sim.solution().len(),
            ColumnSim::NonIsothermal(sim) => sim.solution().len(),
        }
    }

    /// 2, or 3 with temperature.
    pub fn num_primary_vars(&self) -> usize {
        match self {
            ColumnSim::Isothermal(_) => 2,
            ColumnSim::NonIsothermal(_) => 3,
        }
    }

    pub fn time(&self) -> f64 {
        match self {
            ColumnSim::Isothermal(sim) => sim.time(),
            ColumnSim::NonIsothermal(sim) => sim.time(),
        }
    }

    pub fn fields(&self) -> SimResult<VertexFields> {
        match self {
            ColumnSim::Isothermal(sim) => sim.fields(),
            ColumnSim::NonIsothermal(sim) => sim.fields(),
        }
    }

    pub fn run(&mut self, opts: &SimOptions) -> SimResult<ColumnRecord> {
        Ok(match self {
            ColumnSim::Isothermal(sim) => sim.run(opts)?.into(),
            ColumnSim::NonIsothermal(sim) => sim.run(opts)?.into(),
        })
    }
}

/// Column with its initial `[pw, x, T]` per vertex and the fixed vertices.
struct Layout {
    column: Column,
    initial: Vec<[f64; 3]>,
    fixed: Vec<(usize, [f64; 3])>,
}

impl LawSpec {
    fn build(&self) -> SimResult<Box<dyn MaterialLaw>> {
        let law: Box<dyn MaterialLaw> = match *self {
            LawSpec::Linear { entry_pressure } => Box::new(LinearLaw::new(pa(entry_pressure))),
            LawSpec::BrooksCorey {
                entry_pressure,
                lambda,
                swr,
                snr,
            } => Box::new(BrooksCorey::new(pa(entry_pressure), lambda, swr, snr)?),
        };
        Ok(law)
    }
}

impl SolubilitySpec {
    fn build(&self) -> Box<dyn Solubility> {
        match *self {
            SolubilitySpec::Constant { x_aw, x_wn } => {
                Box::new(ConstantSolubility::new(x_aw, x_wn)) as Box<dyn Solubility>
            }
            SolubilitySpec::Henry => Box::new(HenrySolubility),
        }
    }
}

impl FluidSpec {
    fn build(&self) -> SimResult<Box<dyn PhaseFluid>> {
        let fluid: Box<dyn PhaseFluid> = match *self {
            FluidSpec::Incompressible { density, viscosity } => {
                if !(density > 0.0 && viscosity > 0.0) {
                    return Err(SimError::InvalidArg {
                        what: "fluid density and viscosity must be positive",
                    });
                }
                Box::new(IncompressibleFluid::new(kgpm3(density), pas(viscosity)))
            }
            FluidSpec::IdealGas {
                molar_mass,
                viscosity,
            } => Box::new(IdealGas::new(molar_mass, pas(viscosity))?),
            FluidSpec::Air => Box::new(IdealGas::air()),
        };
        Ok(fluid)
    }
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> SimResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Check everything that can be checked without running.
    pub fn validate(&self) -> SimResult<()> {
        let c = &self.column;
        if !(c.area > 0.0 && c.permeability > 0.0) {
            return Err(SimError::InvalidArg {
                what: "column area and permeability must be positive",
            });
        }
        if !(c.porosity > 0.0 && c.porosity < 1.0) {
            return Err(SimError::InvalidArg {
                what: "porosity must be in (0, 1)",
            });
        }
        if self.initial.iter().any(|r| r.from > r.to) {
            return Err(SimError::InvalidArg {
                what: "initial region with from > to",
            });
        }
        self.box_config.validate()?;
        self.sim.validate()?;
        self.build().map(|_| ())
    }

    /// Set up the column and a simulator holding the initial solution.
    pub fn build(&self) -> SimResult<ColumnSim> {
        let Layout {
            column,
            initial,
            fixed,
        } = self.layout()?;
        let cells = column.cells()?;
        let config = self.box_config.clone();
        match self.energy {
            EnergySpec::Isothermal { temperature_k } => {
                let solution = initial.iter().map(|&[pw, x, _]| [pw, x]).collect();
                let energy = Isothermal { temperature_k };
                let mut sim = Simulator::new(column, energy, config, cells, solution)?;
                for (v, [pw, x, _]) in fixed {
                    sim.set_dirichlet(v, [pw, x])?;
                }
                Ok(ColumnSim::Isothermal(sim))
            }
            EnergySpec::NonIsothermal { medium, .. } => {
                let mut sim = Simulator::new(column, medium, config, cells, initial)?;
                for (v, values) in fixed {
                    sim.set_dirichlet(v, values)?;
                }
                Ok(ColumnSim::NonIsothermal(sim))
            }
        }
    }

    fn layout(&self) -> SimResult<Layout> {
        let isothermal = matches!(self.energy, EnergySpec::Isothermal { .. });
        let has_t = self.initial.iter().any(|r| r.t.is_some())
            || self.boundary.iter().any(|b| b.t.is_some());
        if isothermal && has_t {
            return Err(SimError::InvalidArg {
                what: "temperatures given for an isothermal scenario",
            });
        }
        let reference_t = self.energy.temperature_k();

        let dims = &self.column;
        let materials = ColumnMaterials {
            law: self.materials.law.build()?,
            solubility: self.materials.solubility.build(),
            wetting: self.materials.wetting.build()?,
            nonwetting: self.materials.nonwetting.build()?,
        };
        let mut column = Column::new(dims.length, dims.cells, materials)?;
        column.area = dims.area;
        column.porosity = dims.porosity;
        column.permeability = dims.permeability;
        column.gravity = dims.gravity;

        let mut slots = vec![None; column.num_vertices()];
        let tol = 1e-9 * column.dx();
        for region in &self.initial {
            let t = region.t.unwrap_or(reference_t);
            let rho_w = column.materials().wetting.density(t, region.pw, 0.0)?;
            for (v, slot) in slots.iter_mut().enumerate() {
                let x = column.vertex_position(v)[0];
                if x < region.from - tol || x > region.to + tol {
                    continue;
                }
                let pw = if region.hydrostatic {
                    region.pw + rho_w * dims.gravity * (x - region.to)
                } else {
                    region.pw
                };
                *slot = Some((region.state, [pw, region.x, t]));
            }
        }

        let mut initial = Vec::with_capacity(slots.len());
        for (v, slot) in slots.into_iter().enumerate() {
            let (state, values) = slot.ok_or(SimError::InvalidArg {
                what: "initial regions do not cover every vertex",
            })?;
            column.set_initial_state(v, state)?;
            initial.push(values);
        }

        let mut fixed = Vec::with_capacity(self.boundary.len());
        for b in &self.boundary {
            let v = match b.at {
                ColumnEnd::Bottom => 0,
                ColumnEnd::Top => column.num_cells(),
            };
            column.set_initial_state(v, b.state)?;
            fixed.push((v, [b.pw, b.x, b.t.unwrap_or(reference_t)]));
        }

        Ok(Layout {
            column,
            initial,
            fixed,
        })
    }
}
