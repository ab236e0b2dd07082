/// Corrosion rate of carbon steel (mm/year) caused by the strong acids (H₂SO₄, HNO₃)
/// that drop out of the CO₂ stream in a pipe section.
pub mod corrosion_calc;
