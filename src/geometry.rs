use crate::config::{ReactorConfig, Units};
use crate::errors::{CascadeError, CascadeResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;
use std::f64::consts::PI;
use std::fmt;

/// Geometry of the catalytic bed that is subject to optimization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignParameters {
    /// Catalytic area per volume in 1/cm.
    pub cat_area_per_vol: f64,
    /// Reactor diameter in cm.
    pub diameter: f64,
    /// Void fraction of the bed.
    pub porosity: f64,
}

impl DesignParameters {
    pub fn new(cat_area_per_vol: f64, diameter: f64, porosity: f64) -> Self {
        Self {
            cat_area_per_vol,
            diameter,
            porosity,
        }
    }

    /// Check that the parameters describe a physical bed.
    pub fn validate(&self) -> CascadeResult<()> {
        if !(self.cat_area_per_vol.is_finite() && self.cat_area_per_vol > 0.0) {
            return Err(CascadeError::InvalidDesign(format!(
                "catalytic area per volume must be positive, got {}",
                self.cat_area_per_vol
            )));
        }
        if !(self.diameter.is_finite() && self.diameter > 0.0) {
            return Err(CascadeError::InvalidDesign(format!(
                "diameter must be positive, got {}",
                self.diameter
            )));
        }
        if !(self.porosity > 0.0 && self.porosity < 1.0) {
            return Err(CascadeError::InvalidDesign(format!(
                "porosity must be in (0, 1), got {}",
                self.porosity
            )));
        }
        Ok(())
    }

    /// Cross sectional area of the reactor in m².
    pub fn cross_section(&self, units: Units) -> f64 {
        FRAC_PI_4 * (self.diameter * units.centimeter).powi(2)
    }

    /// Volume occupied by the catalyst, `(1 - porosity) A_cs L`, in m³.
    ///
    /// Depends on the geometry only and is available for every design point.
    pub fn catalyst_volume(&self, length: f64, units: Units) -> f64 {
        (1.0 - self.porosity) * self.cross_section(units) * length
    }
}

impl From<[f64; 3]> for DesignParameters {
    fn from(x: [f64; 3]) -> Self {
        Self::new(x[0], x[1], x[2])
    }
}

impl From<DesignParameters> for [f64; 3] {
    fn from(p: DesignParameters) -> Self {
        [p.cat_area_per_vol, p.diameter, p.porosity]
    }
}

impl fmt::Display for DesignParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DesignParameters(A/V={} 1/cm, d={} cm, porosity={})",
            self.cat_area_per_vol, self.diameter, self.porosity
        )
    }
}

/// Volumes and areas of a single stage of the cascade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageGeometry {
    /// Cross sectional area in m².
    pub cross_section: f64,
    /// Volume of the bed in m³.
    pub bed_volume: f64,
    /// Gas volume of the bed in m³.
    pub gas_volume: f64,
    /// Gas volume of a stage in m³.
    pub volume: f64,
    /// Catalytic surface area of a stage in m².
    pub area: f64,
    /// Volume of the catalyst in m³.
    pub catalyst_volume: f64,
    /// Outer wall area of a stage in m².
    pub wall_area: f64,
}

impl StageGeometry {
    pub fn new(config: &ReactorConfig, params: DesignParameters) -> CascadeResult<Self> {
        params.validate()?;
        let units = config.units();
        let length = config.length();
        let stages = config.stages() as f64;

        let cross_section = params.cross_section(units);
        let bed_volume = cross_section * length;
        let gas_volume = params.porosity * bed_volume;
        let volume = gas_volume / stages;
        // area per gas volume of the bed
        let area = params.cat_area_per_vol / units.centimeter * params.porosity * volume;
        let geometry = Self {
            cross_section,
            bed_volume,
            gas_volume,
            volume,
            area,
            catalyst_volume: (1.0 - params.porosity) * bed_volume,
            wall_area: PI * params.diameter * units.centimeter * length / stages,
        };
        if !(volume.is_normal() && area.is_normal()) {
            return Err(CascadeError::InvalidDesign(format!(
                "degenerate stage with volume {volume} m³ and area {area} m²"
            )));
        }
        Ok(geometry)
    }
}
