//! Gas composition of an atmosphere and the per-species values it implies at a
//! sampled point.
//!
//! Fractions are mole fractions. Partial pressures follow Dalton's law and
//! mass densities are weighted by molar mass, so both sum to the sampled
//! totals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{KernelError, Result};
use crate::field::FieldSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    N2,
    O2,
    Ar,
    CO2,
    H2O,
    Ne,
    He,
    CH4,
    H2,
}

impl Species {
    /// kg/mol
    pub fn molar_mass(self) -> f64 {
        match self {
            Species::N2 => 0.028_014,
            Species::O2 => 0.031_998,
            Species::Ar => 0.039_948,
            Species::CO2 => 0.044_009,
            Species::H2O => 0.018_015,
            Species::Ne => 0.020_180,
            Species::He => 0.004_003,
            Species::CH4 => 0.016_043,
            Species::H2 => 0.002_016,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Mole fraction per species.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GasComposition {
    pub fractions: BTreeMap<Species, f64>,
}

impl GasComposition {
    pub fn new(fractions: impl IntoIterator<Item = (Species, f64)>) -> Self {
        Self {
            fractions: fractions.into_iter().collect(),
        }
    }

    /// Dry air at sea level.
    pub fn earth_like() -> Self {
        Self::new([
            (Species::N2, 0.780_84),
            (Species::O2, 0.209_46),
            (Species::Ar, 0.009_34),
            (Species::CO2, 0.000_42),
        ])
    }

    pub fn total(&self) -> f64 {
        self.fractions.values().sum()
    }

    /// Molar mass of the mixture (kg/mol), normalized by the total fraction.
    pub fn mean_molar_mass(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        self.fractions
            .iter()
            .map(|(s, x)| x * s.molar_mass())
            .sum::<f64>()
            / total
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (species, fraction) in &self.fractions {
            if !fraction.is_finite() || *fraction < 0.0 {
                return Err(KernelError::invalid(
                    "atmosphere.composition",
                    format!("{species} fraction must be finite and non-negative, got {fraction}"),
                ));
            }
        }
        if self.total() <= 0.0 {
            return Err(KernelError::invalid(
                "atmosphere.composition",
                "needs at least one species with a positive fraction",
            ));
        }
        Ok(())
    }
}

/// Per-species values at one sampled point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChemistrySample {
    pub partial_pressure_pa: BTreeMap<Species, f64>,
    pub mass_density_kg_m3: BTreeMap<Species, f64>,
}

/// Splits a sampled pressure and density across a gas composition.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphereChemistry {
    pub composition: GasComposition,
}

impl AtmosphereChemistry {
    pub fn new(composition: GasComposition) -> Self {
        Self { composition }
    }

    pub fn earth_like() -> Self {
        Self::new(GasComposition::earth_like())
    }

    pub fn sample(&self, env: &FieldSample) -> ChemistrySample {
        let total = self.composition.total();
        let mean_mass = self.composition.mean_molar_mass();
        if total <= 0.0 || mean_mass <= 0.0 {
            return ChemistrySample::default();
        }

        let mut out = ChemistrySample::default();
        for (&species, &fraction) in &self.composition.fractions {
            let x = fraction / total;
            out.partial_pressure_pa.insert(species, x * env.pressure);
            out.mass_density_kg_m3
                .insert(species, x * species.molar_mass() / mean_mass * env.density);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sea_level() -> FieldSample {
        FieldSample {
            density: 1.225,
            pressure: 101_325.0,
            ..Default::default()
        }
    }

    #[test]
    fn earth_air_mean_molar_mass() {
        let m = GasComposition::earth_like().mean_molar_mass();
        assert!((m - 0.028_96).abs() < 1e-4, "got {m}");
    }

    #[test]
    fn partial_pressures_sum_to_total() {
        let chem = AtmosphereChemistry::earth_like().sample(&sea_level());
        let p: f64 = chem.partial_pressure_pa.values().sum();
        let rho: f64 = chem.mass_density_kg_m3.values().sum();
        assert!((p - 101_325.0).abs() < 1e-6);
        assert!((rho - 1.225).abs() < 1e-12);

        let o2 = chem.partial_pressure_pa[&Species::O2];
        assert!((o2 - 21_223.0).abs() < 5.0, "got {o2}");
    }

    #[test]
    fn heavier_species_carry_more_mass_per_mole() {
        let chem = AtmosphereChemistry::new(GasComposition::new([
            (Species::He, 0.5),
            (Species::Ar, 0.5),
        ]))
        .sample(&sea_level());
        assert_eq!(
            chem.partial_pressure_pa[&Species::He],
            chem.partial_pressure_pa[&Species::Ar]
        );
        assert!(chem.mass_density_kg_m3[&Species::Ar] > 9.0 * chem.mass_density_kg_m3[&Species::He]);
    }

    #[test]
    fn vacuum_sample_is_all_zero() {
        let chem = AtmosphereChemistry::earth_like().sample(&FieldSample::default());
        assert!(chem.partial_pressure_pa.values().all(|p| *p == 0.0));
        assert_eq!(chem.partial_pressure_pa.len(), 4);
    }

    #[test]
    fn rejects_bad_fractions() {
        assert!(GasComposition::new([(Species::N2, -0.1)]).validate().is_err());
        assert!(GasComposition::new([(Species::N2, f64::NAN)]).validate().is_err());
        assert!(GasComposition::default().validate().is_err());
        GasComposition::earth_like().validate().unwrap();
    }

    #[test]
    fn serializes_as_species_map() {
        let json = serde_json::to_string(&GasComposition::new([(Species::CO2, 0.95)])).unwrap();
        assert_eq!(json, r#"{"CO2":0.95}"#);
    }
}
