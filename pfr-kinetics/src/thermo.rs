//! NASA 7-coefficient polynomials for ideal gas heat capacities,
//! enthalpies and entropies.
//!
//! All functions are generic over [DualNum] so that derivatives with respect
//! to temperature are available through automatic differentiation.
use crate::parameter::{Nasa7Record, ParameterError};
use num_dual::DualNum;

/// Compiled NASA 7-coefficient polynomial of a single species.
#[derive(Clone, Debug, PartialEq)]
pub struct Nasa7 {
    t_min: f64,
    t_mid: f64,
    t_max: f64,
    low: [f64; 7],
    high: [f64; 7],
}

impl Nasa7 {
    pub fn new(t_min: f64, t_mid: f64, t_max: f64, low: [f64; 7], high: [f64; 7]) -> Self {
        Self {
            t_min,
            t_mid,
            t_max,
            low,
            high,
        }
    }

    pub fn from_record(record: &Nasa7Record, name: &str) -> Result<Self, ParameterError> {
        record.validate(name)?;
        let t = &record.temperature_ranges;
        Ok(match record.data.len() {
            1 => Self::new(t[0], t[1], t[1], record.data[0], record.data[0]),
            _ => Self::new(t[0], t[1], t[2], record.data[0], record.data[1]),
        })
    }

    /// Temperature range in which the polynomials are valid.
    pub fn temperature_range(&self) -> (f64, f64) {
        (self.t_min, self.t_max)
    }

    // Outside of the tabulated range the nearest polynomial is extrapolated.
    fn coefficients(&self, temperature: f64) -> &[f64; 7] {
        if temperature <= self.t_mid {
            &self.low
        } else {
            &self.high
        }
    }

    /// Dimensionless heat capacity `cp / R`.
    pub fn cp_r<D: DualNum<f64> + Copy>(&self, temperature: D) -> D {
        let a = self.coefficients(temperature.re());
        let t = temperature;
        (((t * a[4] + a[3]) * t + a[2]) * t + a[1]) * t + a[0]
    }

    /// Dimensionless enthalpy `h / RT`.
    pub fn h_rt<D: DualNum<f64> + Copy>(&self, temperature: D) -> D {
        let a = self.coefficients(temperature.re());
        let t = temperature;
        (((t * (a[4] / 5.0) + a[3] / 4.0) * t + a[2] / 3.0) * t + a[1] / 2.0) * t
            + a[0]
            + t.recip() * a[5]
    }

    /// Dimensionless entropy `s / R` at the reference pressure.
    pub fn s_r<D: DualNum<f64> + Copy>(&self, temperature: D) -> D {
        let a = self.coefficients(temperature.re());
        let t = temperature;
        t.ln() * a[0] + (((t * (a[4] / 4.0) + a[3] / 3.0) * t + a[2] / 2.0) * t + a[1]) * t + a[6]
    }

    /// Dimensionless internal energy `u / RT` of the ideal gas.
    pub fn u_rt<D: DualNum<f64> + Copy>(&self, temperature: D) -> D {
        self.h_rt(temperature) - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RGAS;
    use approx::assert_relative_eq;
    use num_dual::Dual64;

    fn water() -> Nasa7 {
        Nasa7::new(
            200.0,
            1000.0,
            3500.0,
            [
                4.19864056,
                -2.0364341e-3,
                6.52040211e-6,
                -5.48797062e-9,
                1.77197817e-12,
                -30293.7267,
                -0.849032208,
            ],
            [
                3.03399249,
                2.17691804e-3,
                -1.64072518e-7,
                -9.7041987e-11,
                1.68200992e-14,
                -30004.2971,
                4.9667701,
            ],
        )
    }

    #[test]
    fn formation_enthalpy_and_entropy() {
        let h2o = water();
        let t = 298.15;
        assert_relative_eq!(h2o.h_rt(t) * RGAS * t, -241.826e3, max_relative = 1e-4);
        assert_relative_eq!(h2o.s_r(t) * RGAS, 188.83, max_relative = 1e-3);
        assert_relative_eq!(h2o.cp_r(t) * RGAS, 33.59, max_relative = 1e-3);
    }

    #[test]
    fn continuity_at_midpoint() {
        let h2o = water();
        let (lo, hi) = (1000.0 - 1e-9, 1000.0 + 1e-9);
        assert_relative_eq!(h2o.cp_r(lo), h2o.cp_r(hi), max_relative = 1e-6);
        assert_relative_eq!(h2o.h_rt(lo), h2o.h_rt(hi), max_relative = 1e-6);
        assert_relative_eq!(h2o.s_r(lo), h2o.s_r(hi), max_relative = 1e-6);
    }

    #[test]
    fn heat_capacity_is_enthalpy_derivative() {
        let h2o = water();
        for t in [400.0, 1200.0, 2500.0] {
            let td = Dual64::from(t).derivative();
            let h_r = h2o.h_rt(td) * td;
            assert_relative_eq!(h_r.eps, h2o.cp_r(t), max_relative = 1e-12);
            let s = h2o.s_r(td);
            assert_relative_eq!(s.eps * t, h2o.cp_r(t), max_relative = 1e-12);
        }
    }
}
