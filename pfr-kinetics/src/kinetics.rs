//! Mean-field kinetics of homogeneous gas phase and surface reactions.
use crate::errors::{KineticsError, KineticsResult};
use crate::mechanism::{PhaseKind, RateLaw};
use crate::parameter::CoverageDependencyRecord;
use crate::phase::{IdealGas, Interface};
use crate::RGAS;
use num_dual::DualNum;
use std::f64::consts::{LN_10, PI};
use std::sync::Arc;

/// Net production rates of the species of a gas and an interface.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductionRates<D> {
    /// Production rates of gas species by homogeneous reactions in mol/(m³ s).
    pub gas: Vec<D>,
    /// Production rates of gas species by surface reactions in mol/(m² s).
    pub adsorption: Vec<D>,
    /// Production rates of surface species in mol/(m² s).
    pub surface: Vec<D>,
}

#[derive(Clone, Copy, Debug)]
enum RateConstant {
    Arrhenius { a: f64, b: f64, ea: f64 },
    // `factor` collects the site density and collision frequency terms
    Sticking { a: f64, b: f64, ea: f64, factor: f64 },
}

impl RateConstant {
    fn evaluate<D: DualNum<f64> + Copy>(&self, temperature: D) -> D {
        let (a, b, ea) = match *self {
            Self::Arrhenius { a, b, ea } => (a, b, ea),
            Self::Sticking { a, b, ea, .. } => (a, b, ea),
        };
        let mut k = (-temperature.recip() * (ea / RGAS)).exp() * a;
        if b != 0.0 {
            k *= temperature.powf(b);
        }
        if let Self::Sticking { factor, .. } = *self {
            k *= temperature.sqrt() * factor;
        }
        k
    }
}

#[derive(Clone, Debug)]
struct LocalReaction {
    reactants: Vec<(usize, f64)>,
    products: Vec<(usize, f64)>,
    orders: Vec<(usize, f64)>,
    rate: RateConstant,
    coverage_dependencies: Vec<(usize, CoverageDependencyRecord)>,
    surface: bool,
}

/// Reaction kinetics of an ideal gas and (optionally) an adjacent interface.
///
/// Species are numbered locally: gas species first, followed by the
/// species of the interface.
#[derive(Clone, Debug)]
pub struct Kinetics {
    n_gas: usize,
    n_surface: usize,
    site_density: f64,
    sites: Vec<f64>,
    reactions: Vec<LocalReaction>,
}

impl Kinetics {
    /// Collect all reactions of the mechanism that take place in the gas
    /// or on the interface.
    pub fn new(gas: &IdealGas, surface: Option<&Interface>) -> KineticsResult<Self> {
        let mechanism = gas.mechanism();
        if let Some(s) = surface {
            if !Arc::ptr_eq(mechanism, s.mechanism()) || s.gas() != gas.name() {
                return Err(KineticsError::Error(format!(
                    "The interface `{}` is not adjacent to the gas `{}`.",
                    s.name(),
                    gas.name()
                )));
            }
        }
        let n_gas = gas.n_species();
        let mut local = vec![None; mechanism.species().len()];
        for (k, &i) in gas.species().iter().enumerate() {
            local[i] = Some(k);
        }
        if let Some(s) = surface {
            for (j, &i) in s.species().iter().enumerate() {
                local[i] = Some(n_gas + j);
            }
        }
        let (n_surface, site_density, sites) = match surface {
            Some(s) => (s.n_species(), s.site_density(), s.sites().to_vec()),
            None => (0, 1.0, Vec::new()),
        };
        let (gas_phase, _) = mechanism.phase(gas.name())?;
        let surface_phase = surface.map(|s| mechanism.phase(s.name())).transpose()?.map(|(p, _)| p);

        let mut reactions = Vec::new();
        for r in mechanism.reactions() {
            let is_surface = mechanism.phases()[r.phase].kind == PhaseKind::Interface;
            let included = if is_surface {
                Some(r.phase) == surface_phase
            } else {
                r.phase == gas_phase
            };
            // all species of the reaction have to be present locally
            if !included || r.species().any(|i| local[i].is_none()) {
                continue;
            }
            let map = |v: &[(usize, f64)]| -> Vec<(usize, f64)> {
                v.iter()
                    .filter_map(|&(i, nu)| local[i].map(|l| (l, nu)))
                    .collect()
            };
            let rate = match r.rate {
                RateLaw::Arrhenius { a, b, ea } => RateConstant::Arrhenius { a, b, ea },
                RateLaw::Sticking {
                    a,
                    b,
                    ea,
                    species,
                    surface_order,
                } => {
                    let w = mechanism.species()[species].molar_mass;
                    RateConstant::Sticking {
                        a,
                        b,
                        ea,
                        factor: (RGAS / (2.0 * PI * w)).sqrt() / site_density.powf(surface_order),
                    }
                }
            };
            reactions.push(LocalReaction {
                reactants: map(&r.reactants),
                products: map(&r.products),
                orders: map(&r.orders),
                rate,
                coverage_dependencies: r
                    .coverage_dependencies
                    .iter()
                    .filter_map(|&(i, dep)| local[i].map(|l| (l - n_gas, dep)))
                    .collect(),
                surface: is_surface,
            });
        }
        Ok(Self {
            n_gas,
            n_surface,
            site_density,
            sites,
            reactions,
        })
    }

    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }

    /// Rates of progress of all reactions in mol/(m³ s) or mol/(m² s).
    pub fn rates_of_progress<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        concentrations: &[D],
        coverages: &[D],
    ) -> Vec<D> {
        let rt = temperature * RGAS;
        let c: Vec<D> = concentrations
            .iter()
            .copied()
            .chain(
                coverages
                    .iter()
                    .zip(&self.sites)
                    .map(|(&theta, &n)| theta * (self.site_density / n)),
            )
            .collect();
        self.reactions
            .iter()
            .map(|r| {
                let mut k = r.rate.evaluate(temperature);
                for &(j, dep) in &r.coverage_dependencies {
                    let theta = coverages[j];
                    if dep.a != 0.0 {
                        k *= (theta * (dep.a * LN_10)).exp();
                    }
                    if dep.m != 0.0 {
                        k *= power(theta, dep.m);
                    }
                    if dep.e != 0.0 {
                        k *= (-theta * dep.e / rt).exp();
                    }
                }
                r.orders
                    .iter()
                    .fold(k, |rate, &(i, order)| rate * power(c[i], order))
            })
            .collect()
    }

    /// Net production rates for the given temperature, gas concentrations
    /// in mol/m³ and coverages.
    pub fn production_rates<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        concentrations: &[D],
        coverages: &[D],
    ) -> ProductionRates<D> {
        let mut gas = vec![D::zero(); self.n_gas];
        let mut adsorption = vec![D::zero(); self.n_gas];
        let mut surface = vec![D::zero(); self.n_surface];
        let rop = self.rates_of_progress(temperature, concentrations, coverages);
        for (r, q) in self.reactions.iter().zip(rop) {
            let mut add = |i: usize, nu: f64| {
                let w = q * nu;
                if i >= self.n_gas {
                    surface[i - self.n_gas] += w;
                } else if r.surface {
                    adsorption[i] += w;
                } else {
                    gas[i] += w;
                }
            };
            r.reactants.iter().for_each(|&(i, nu)| add(i, -nu));
            r.products.iter().for_each(|&(i, nu)| add(i, nu));
        }
        ProductionRates {
            gas,
            adsorption,
            surface,
        }
    }

    /// Net production rates at the current states of the phases.
    pub fn net_production_rates(
        &self,
        gas: &IdealGas,
        surface: Option<&Interface>,
    ) -> ProductionRates<f64> {
        let coverages = surface.map_or_else(Vec::new, |s| s.coverages().to_vec());
        self.production_rates(
            gas.temperature(),
            &gas.concentrations().to_vec(),
            &coverages,
        )
    }
}

/// `c^order` for non-negative `c`. Negative values (that can occur during
/// Newton iterations) are treated as zero.
fn power<D: DualNum<f64> + Copy>(c: D, order: f64) -> D {
    if order == 1.0 {
        if c.re() > 0.0 {
            c
        } else {
            D::zero()
        }
    } else if order.fract() == 0.0 && order > 0.0 {
        if c.re() > 0.0 {
            c.powi(order as i32)
        } else {
            D::zero()
        }
    } else if c.re() > 0.0 {
        c.powf(order)
    } else if order == 0.0 {
        D::one()
    } else {
        D::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::Mechanism;
    use approx::assert_relative_eq;
    use num_dual::Dual64;

    fn phases() -> (IdealGas, Interface) {
        let mechanism = Arc::new(
            Mechanism::from_json(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../data/methane_pox_on_pt.json"
            ))
            .unwrap(),
        );
        let mut gas = IdealGas::new(&mechanism, "gas").unwrap();
        gas.set_tpx(1100.0, 1e5, "CH4:1, O2:0.6, AR:0.1").unwrap();
        let mut surf = Interface::new(&mechanism, "Pt_surf", &gas).unwrap();
        surf.set_coverages_by_name("PT(S):0.5, O(S):0.2, CO(S):0.1, H(S):0.1, C(S):0.1")
            .unwrap();
        (gas, surf)
    }

    #[test]
    fn surface_sites_are_conserved() {
        let (gas, surf) = phases();
        let kinetics = Kinetics::new(&gas, Some(&surf)).unwrap();
        assert_eq!(kinetics.n_reactions(), 22);
        let rates = kinetics.net_production_rates(&gas, Some(&surf));
        let scale = rates.surface.iter().map(|s| s.abs()).fold(0.0, f64::max);
        assert!(scale > 0.0);
        let sum: f64 = rates.surface.iter().sum();
        assert!(sum.abs() < 1e-10 * scale);
        // no homogeneous reactions in this mechanism
        assert!(rates.gas.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn elements_are_conserved() {
        let (gas, surf) = phases();
        let mechanism = gas.mechanism().clone();
        let kinetics = Kinetics::new(&gas, Some(&surf)).unwrap();
        let rates = kinetics.net_production_rates(&gas, Some(&surf));
        let species = gas.species().iter().chain(surf.species());
        let wdot = rates.adsorption.iter().chain(&rates.surface);
        for element in ["C", "H", "O"] {
            let (sum, scale) = species.clone().zip(wdot.clone()).fold(
                (0.0, 0.0),
                |(sum, scale): (f64, f64), (&i, &w)| {
                    let n = mechanism.species()[i]
                        .atoms(element)
                        .unwrap_or(0.0);
                    (sum + n * w, scale.max((n * w).abs()))
                },
            );
            assert!(sum.abs() < 1e-10 * scale, "{element}: {sum} {scale}");
        }
    }

    #[test]
    fn methane_sticking_rate() {
        let (gas, surf) = phases();
        let kinetics = Kinetics::new(&gas, Some(&surf)).unwrap();
        let rop = kinetics.rates_of_progress(
            gas.temperature(),
            &gas.concentrations().to_vec(),
            &surf.coverages().to_vec(),
        );
        // CH4 + 2 PT(S) => CH3(S) + H(S) with order 2.3 in PT(S)
        let gamma = 2.7063e-5;
        let w = 16.043e-3;
        let c_ch4 = gas.concentrations()[gas.species_index("CH4").unwrap()];
        let k = 0.01 / gamma.powf(2.3) * (RGAS * 1100.0 / (2.0 * PI * w)).sqrt();
        let expected = k * c_ch4 * (0.5 * gamma).powf(2.3);
        assert_relative_eq!(rop[16], expected, max_relative = 1e-10);
    }

    #[test]
    fn temperature_derivative() {
        let (gas, surf) = phases();
        let kinetics = Kinetics::new(&gas, Some(&surf)).unwrap();
        let c: Vec<_> = gas.concentrations().iter().map(|&c| Dual64::from(c)).collect();
        let theta: Vec<_> = surf.coverages().iter().map(|&t| Dual64::from(t)).collect();
        let t = 1100.0;
        let h = 1e-4;
        let dual = kinetics.rates_of_progress(Dual64::from(t).derivative(), &c, &theta);
        let c: Vec<_> = c.iter().map(|c| c.re).collect();
        let theta: Vec<_> = theta.iter().map(|t| t.re).collect();
        let fwd = kinetics.rates_of_progress(t + h, &c, &theta);
        let bwd = kinetics.rates_of_progress(t - h, &c, &theta);
        for ((d, f), b) in dual.iter().zip(&fwd).zip(&bwd) {
            assert_relative_eq!(d.eps, (f - b) / (2.0 * h), max_relative = 1e-6, epsilon = 1e-12);
        }
    }
}
