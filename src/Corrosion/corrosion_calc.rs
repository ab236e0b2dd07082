//! Corrosion rate of a carbon-steel pipe wall from the acids that drop out of a
//! CO2 stream.
//!
//! Unit pipeline for one acid:
//! MT/Y CO2 -> t/h CO2 -> mg acid per kg CO2 -> g/h acid -> mol/h acid
//! -> cm³/h iron (1:1 Fe:acid) -> mm/year over the wetted surface.
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

use crate::Kinetics::molecules::{ConcentrationVector, Molecule};

// given in g/mol
pub const FE_MOL_WEIGHT: f64 = 56.0;
pub const CO2_MOL_WEIGHT: f64 = 44.0;
pub const H2SO4_MOL_WEIGHT: f64 = 98.0;
pub const HNO3_MOL_WEIGHT: f64 = 63.01;
// given in g/cm3
pub const FE_DENSITY_S: f64 = 7.87;

const CM_PER_INCH: f64 = 2.54;
const CM_PER_M: f64 = 100.0;
const HOURS_PER_YEAR: f64 = 24.0 * 365.0;
const MM_PER_CM: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrosionError {
    #[error("degenerate pipe geometry: wetted surface area is {surface_area_cm2} cm²")]
    DegenerateGeometry { surface_area_cm2: f64 },
    #[error("invalid input: {name} = {value}")]
    InvalidInput { name: &'static str, value: f64 },
}

fn check_input(name: &'static str, value: f64) -> Result<f64, CorrosionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CorrosionError::InvalidInput { name, value })
    }
}

fn check_area(surface_area_cm2: f64) -> Result<f64, CorrosionError> {
    if surface_area_cm2.is_finite() && surface_area_cm2 > 0.0 {
        Ok(surface_area_cm2)
    } else {
        Err(CorrosionError::DegenerateGeometry { surface_area_cm2 })
    }
}

/// acids the model knows how to turn into iron loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acid {
    H2SO4,
    HNO3,
}

impl Acid {
    pub fn molar_weight(self) -> f64 {
        match self {
            Acid::H2SO4 => H2SO4_MOL_WEIGHT,
            Acid::HNO3 => HNO3_MOL_WEIGHT,
        }
    }
    /// empirical correction applied to the final rate; nitric acid attack is
    /// counted at one sixth
    pub fn rate_divisor(self) -> f64 {
        match self {
            Acid::H2SO4 => 1.0,
            Acid::HNO3 => 6.0,
        }
    }
    pub fn molecule(self) -> Molecule {
        match self {
            Acid::H2SO4 => Molecule::H2SO4,
            Acid::HNO3 => Molecule::HNO3,
        }
    }
}

/// wetted section of the pipe where acid drops out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeGeometry {
    pub inner_diameter_inch: f64,
    pub drop_out_length_m: f64,
}

impl PipeGeometry {
    pub fn new(inner_diameter_inch: f64, drop_out_length_m: f64) -> Self {
        Self {
            inner_diameter_inch,
            drop_out_length_m,
        }
    }
    pub fn surface_area_cm2(&self) -> f64 {
        surface_area(self.inner_diameter_inch, self.drop_out_length_m)
    }
}

/// pipe and flow inputs as they appear in task and settings files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeInputs {
    /// inch
    #[serde(alias = "innerDiameter")]
    pub inner_diameter: f64,
    /// m
    #[serde(alias = "dropOutLength")]
    pub drop_out_length: f64,
    /// CO2, million tonnes per year
    pub flowrate: f64,
}

impl PipeInputs {
    pub fn geometry(&self) -> PipeGeometry {
        PipeGeometry::new(self.inner_diameter, self.drop_out_length)
    }
}

impl Default for PipeInputs {
    fn default() -> Self {
        Self {
            inner_diameter: 30.0,
            drop_out_length: 1000.0,
            flowrate: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrosionRates {
    pub h2so4_mm_yr: f64,
    pub hno3_mm_yr: f64,
    pub total_mm_yr: f64,
}

/// Lateral area of the drop-out section in cm². Inner diameter in inch,
/// drop-out length in m. Uses the diameter, not the radius, by convention of
/// the model.
pub fn surface_area(inner_diameter_inch: f64, drop_out_length_m: f64) -> f64 {
    PI * inner_diameter_inch * CM_PER_INCH * drop_out_length_m * CM_PER_M
}

/// CO2 mass flow, MT/Y -> tonnes/hour
pub fn co2_mass_flow_rate(flowrate_mt_per_year: f64) -> f64 {
    flowrate_mt_per_year * 1e6 / HOURS_PER_YEAR
}

/// mg acid per kg CO2
pub fn acid_concentration(acid: Acid, molar_rate: f64) -> f64 {
    acid.molar_weight() / CO2_MOL_WEIGHT * molar_rate
}

/// g/hour of acid carried by the stream
pub fn acid_flow_rate(concentration: f64, mass_flow_rate: f64) -> f64 {
    concentration * mass_flow_rate
}

/// mol/hour of acid
pub fn acid_molar_rate(acid: Acid, acid_flow_rate: f64) -> f64 {
    acid_flow_rate / acid.molar_weight()
}

/// mol/hour -> cm³/hour of iron
pub fn convert_iron_rate(mol_rate: f64) -> f64 {
    mol_rate * FE_MOL_WEIGHT / FE_DENSITY_S
}

/// cm³/hour of iron over `surface_area_cm2` -> mm/year
pub fn corrosion_rate(iron_rate: f64, surface_area_cm2: f64) -> Result<f64, CorrosionError> {
    let area = check_area(surface_area_cm2)?;
    Ok(iron_rate * HOURS_PER_YEAR * MM_PER_CM / area)
}

/// corrosion rate (mm/year) caused by one acid
pub fn corrosion_rate_for_acid(
    acid: Acid,
    surface_area_cm2: f64,
    flowrate_mt_per_year: f64,
    molar_rate: f64,
) -> Result<f64, CorrosionError> {
    check_area(surface_area_cm2)?;
    let flowrate = check_input("flowrate", flowrate_mt_per_year)?;
    let molar_rate = check_input("molar rate", molar_rate)?;

    let mass_flow = co2_mass_flow_rate(flowrate);
    let concentration = acid_concentration(acid, molar_rate);
    let flow = acid_flow_rate(concentration, mass_flow);
    let iron_rate = convert_iron_rate(acid_molar_rate(acid, flow));
    Ok(corrosion_rate(iron_rate, surface_area_cm2)? / acid.rate_divisor())
}

pub fn corrosion_rate_h2so4(
    surface_area_cm2: f64,
    flowrate_mt_per_year: f64,
    molar_rate_h2so4: f64,
) -> Result<f64, CorrosionError> {
    corrosion_rate_for_acid(Acid::H2SO4, surface_area_cm2, flowrate_mt_per_year, molar_rate_h2so4)
}

pub fn corrosion_rate_hno3(
    surface_area_cm2: f64,
    flowrate_mt_per_year: f64,
    molar_rate_hno3: f64,
) -> Result<f64, CorrosionError> {
    corrosion_rate_for_acid(Acid::HNO3, surface_area_cm2, flowrate_mt_per_year, molar_rate_hno3)
}

/// per-acid and combined corrosion rates for a wetted area
pub fn corrosion_rates(
    surface_area_cm2: f64,
    flowrate_mt_per_year: f64,
    molar_rate_h2so4: f64,
    molar_rate_hno3: f64,
) -> Result<CorrosionRates, CorrosionError> {
    let h2so4_mm_yr = corrosion_rate_h2so4(surface_area_cm2, flowrate_mt_per_year, molar_rate_h2so4)?;
    let hno3_mm_yr = corrosion_rate_hno3(surface_area_cm2, flowrate_mt_per_year, molar_rate_hno3)?;
    Ok(CorrosionRates {
        h2so4_mm_yr,
        hno3_mm_yr,
        total_mm_yr: h2so4_mm_yr + hno3_mm_yr,
    })
}

/// same as [`corrosion_rates`], geometry given as diameter and drop-out length
pub fn corrosion_rates_for_pipe(
    geometry: &PipeGeometry,
    flowrate_mt_per_year: f64,
    molar_rate_h2so4: f64,
    molar_rate_hno3: f64,
) -> Result<CorrosionRates, CorrosionError> {
    corrosion_rates(
        geometry.surface_area_cm2(),
        flowrate_mt_per_year,
        molar_rate_h2so4,
        molar_rate_hno3,
    )
}

/// rates from the acid content of a (final) concentration vector
pub fn corrosion_rates_from_concentrations(
    geometry: &PipeGeometry,
    flowrate_mt_per_year: f64,
    concentrations: &ConcentrationVector,
) -> Result<CorrosionRates, CorrosionError> {
    corrosion_rates_for_pipe(
        geometry,
        flowrate_mt_per_year,
        concentrations.get(Acid::H2SO4.molecule()),
        concentrations.get(Acid::HNO3.molecule()),
    )
}
