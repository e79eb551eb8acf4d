//! Bundle of constitutive laws used by the box discretization.

use crate::error::MaterialResult;
use crate::fluid::PhaseFluid;
use crate::law::MaterialLaw;
use crate::solubility::Solubility;

/// Borrowed set of constitutive laws for one problem.
#[derive(Clone, Copy)]
pub struct MaterialSet<'a> {
    pub law: &'a dyn MaterialLaw,
    pub solubility: &'a dyn Solubility,
    pub wetting: &'a dyn PhaseFluid,
    pub nonwetting: &'a dyn PhaseFluid,
}

impl<'a> MaterialSet<'a> {
    pub fn new(
        law: &'a dyn MaterialLaw,
        solubility: &'a dyn Solubility,
        wetting: &'a dyn PhaseFluid,
        nonwetting: &'a dyn PhaseFluid,
    ) -> Self {
        Self {
            law,
            solubility,
            wetting,
            nonwetting,
        }
    }

    /// Wetting phase mobility krw/μw [1/(Pa·s)].
    pub fn mob_w(&self, sw: f64, pos: &[f64], t: f64, pw: f64) -> MaterialResult<f64> {
        let kr = self.law.krw(sw, pos)?;
        Ok(kr / self.wetting.viscosity(t, pw)?)
    }

    /// Nonwetting phase mobility krn/μn [1/(Pa·s)].
    pub fn mob_n(&self, sn: f64, pos: &[f64], t: f64, pn: f64) -> MaterialResult<f64> {
        let kr = self.law.krn(sn, pos)?;
        Ok(kr / self.nonwetting.viscosity(t, pn)?)
    }
}

impl std::fmt::Debug for MaterialSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialSet")
            .field("law", &self.law.name())
            .field("solubility", &self.solubility.name())
            .field("wetting", &self.wetting.name())
            .field("nonwetting", &self.nonwetting.name())
            .finish()
    }
}
