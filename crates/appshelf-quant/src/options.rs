//! Black-Scholes pricing and greeks for European options.

use serde::{Deserialize, Serialize};

use appshelf_core::{Error, Result};

/// Points in spot sweeps (delta, gamma, payoff profiles).
pub const PROFILE_POINTS: usize = 100;
/// Points in sensitivity sweeps.
pub const SENSITIVITY_POINTS: usize = 80;

const PARITY_TOLERANCE: f64 = 1e-4;

/// Standard normal CDF, Abramowitz & Stegun 7.1.26 (max error 1.5e-7).
pub fn ncdf(x: f64) -> f64 {
    let s = if x < 0.0 { -1.0 } else { 1.0 };
    let t = 1.0 / (1.0 + 0.3275911 * x.abs() / std::f64::consts::SQRT_2);
    let p = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    0.5 * (1.0 + s * (1.0 - p * (-0.5 * x * x).exp()))
}

/// Standard normal density.
pub fn npdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Moneyness {
    DeepItm,
    Itm,
    Atm,
    Otm,
    DeepOtm,
}

impl Moneyness {
    /// Classify by `spot / strike` from the call's point of view.
    pub fn classify(ratio: f64) -> Self {
        if ratio > 1.10 {
            Moneyness::DeepItm
        } else if ratio > 1.02 {
            Moneyness::Itm
        } else if ratio > 0.98 {
            Moneyness::Atm
        } else if ratio > 0.90 {
            Moneyness::Otm
        } else {
            Moneyness::DeepOtm
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Moneyness::DeepItm => "Deep In the Money",
            Moneyness::Itm => "In the Money",
            Moneyness::Atm => "At the Money",
            Moneyness::Otm => "Out of the Money",
            Moneyness::DeepOtm => "Deep Out of the Money",
        }
    }

    pub fn intuition(&self) -> &'static str {
        match self {
            Moneyness::DeepItm => "Δ → 1: moves almost 1:1 with spot. Low Γ and ν, so vol changes matter less. Mostly intrinsic. Rho matters more.",
            Moneyness::Itm => "Δ > 0.5: significant directional exposure. Mix of intrinsic and time value.",
            Moneyness::Atm => "Δ ≈ 0.5: highest Γ and ν. Maximum time value. Most sensitive to vol; ATM straddles are the purest vol trade.",
            Moneyness::Otm => "Δ < 0.5: no intrinsic value, all time value. Still meaningful Γ and ν. Higher % sensitivity to vol changes.",
            Moneyness::DeepOtm => "Δ → 0: tiny directional exposure. Almost pure time value (lottery ticket). Very small Γ and ν.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Greek {
    #[default]
    Delta,
    Gamma,
    Vega,
    Theta,
}

impl Greek {
    /// Gamma and vega are the same for calls and puts.
    pub fn same_for_both(&self) -> bool {
        matches!(self, Greek::Gamma | Greek::Vega)
    }
}

/// Pricer inputs. `rate` and `vol` are decimals, `time_years` in years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionInputs {
    pub spot: f64,
    pub strike: f64,
    pub rate: f64,
    pub vol: f64,
    pub time_years: f64,
}

impl Default for OptionInputs {
    fn default() -> Self {
        Self {
            spot: 100.0,
            strike: 100.0,
            rate: 0.05,
            vol: 0.20,
            time_years: 0.50,
        }
    }
}

impl OptionInputs {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("spot", self.spot),
            ("strike", self.strike),
            ("rate", self.rate),
            ("vol", self.vol),
            ("timeYears", self.time_years),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(Error::InvalidInput(format!("{} must be a finite number", name)));
            }
        }
        if self.strike <= 0.0 {
            return Err(Error::InvalidInput("strike must be positive".into()));
        }
        Ok(())
    }

    fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }
}

/// Prices and sensitivities. Vega and rho are per 1% move, theta per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Greeks {
    pub call: f64,
    pub put: f64,
    pub delta_call: f64,
    pub delta_put: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta_call: f64,
    pub theta_put: f64,
    pub rho_call: f64,
    pub rho_put: f64,
    pub call_intrinsic: f64,
    pub put_intrinsic: f64,
    pub call_time_value: f64,
    pub put_time_value: f64,
    pub moneyness: Moneyness,
}

impl Greeks {
    pub fn value(&self, greek: Greek, kind: OptionKind) -> f64 {
        match (greek, kind) {
            (Greek::Delta, OptionKind::Call) => self.delta_call,
            (Greek::Delta, OptionKind::Put) => self.delta_put,
            (Greek::Gamma, _) => self.gamma,
            (Greek::Vega, _) => self.vega,
            (Greek::Theta, OptionKind::Call) => self.theta_call,
            (Greek::Theta, OptionKind::Put) => self.theta_put,
        }
    }

    pub fn price(&self, kind: OptionKind) -> f64 {
        match kind {
            OptionKind::Call => self.call,
            OptionKind::Put => self.put,
        }
    }

    pub fn intrinsic(&self, kind: OptionKind) -> f64 {
        match kind {
            OptionKind::Call => self.call_intrinsic,
            OptionKind::Put => self.put_intrinsic,
        }
    }
}

/// Black-Scholes price and greeks. Expired, zero-vol, or non-positive
/// price inputs collapse to intrinsic value with step deltas.
pub fn black_scholes(inputs: &OptionInputs) -> Greeks {
    let OptionInputs { spot: s, strike: k, rate: r, vol: sigma, time_years: t } = *inputs;
    let call_intrinsic = (s - k).max(0.0);
    let put_intrinsic = (k - s).max(0.0);
    let ratio = s / k;
    let moneyness = Moneyness::classify(ratio);

    if t < 0.001 || sigma < 0.001 || s <= 0.0 || k <= 0.0 {
        let (delta_call, delta_put) = if ratio > 1.0 {
            (1.0, 0.0)
        } else if ratio < 1.0 {
            (0.0, -1.0)
        } else {
            (0.5, -0.5)
        };
        return Greeks {
            call: call_intrinsic,
            put: put_intrinsic,
            delta_call,
            delta_put,
            gamma: 0.0,
            vega: 0.0,
            theta_call: 0.0,
            theta_put: 0.0,
            rho_call: 0.0,
            rho_put: 0.0,
            call_intrinsic,
            put_intrinsic,
            call_time_value: 0.0,
            put_time_value: 0.0,
            moneyness,
        };
    }

    let sqrt_t = t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * sqrt_t);
    let d2 = d1 - sigma * sqrt_t;
    let (nd1, nd2, nm1, nm2) = (ncdf(d1), ncdf(d2), ncdf(-d1), ncdf(-d2));
    let phi = npdf(d1);
    let disc = k * (-r * t).exp();

    let call = s * nd1 - disc * nd2;
    let put = disc * nm2 - s * nm1;
    let decay = -s * phi * sigma / (2.0 * sqrt_t);

    Greeks {
        call,
        put,
        delta_call: nd1,
        delta_put: nd1 - 1.0,
        gamma: phi / (s * sigma * sqrt_t),
        vega: s * phi * sqrt_t / 100.0,
        theta_call: (decay - r * disc * nd2) / 365.0,
        theta_put: (decay + r * disc * nm2) / 365.0,
        rho_call: disc * t * nd2 / 100.0,
        rho_put: -disc * t * nm2 / 100.0,
        call_intrinsic,
        put_intrinsic,
        call_time_value: (call - call_intrinsic).max(0.0),
        put_time_value: (put - put_intrinsic).max(0.0),
        moneyness,
    }
}

/// `C - P` against `S - K e^(-rT)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParityCheck {
    pub lhs: f64,
    pub rhs: f64,
    pub holds: bool,
}

pub fn put_call_parity(greeks: &Greeks, inputs: &OptionInputs) -> ParityCheck {
    let lhs = greeks.call - greeks.put;
    let rhs = inputs.spot - inputs.strike * (-inputs.rate * inputs.time_years).exp();
    ParityCheck {
        lhs,
        rhs,
        holds: (lhs - rhs).abs() < PARITY_TOLERANCE,
    }
}

pub(crate) fn linspace(lo: f64, hi: f64, n: usize) -> impl Iterator<Item = f64> {
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n).map(move |i| lo + (hi - lo) * i as f64 / last)
}

fn spot_range(strike: f64) -> (f64, f64) {
    (strike * 0.4, strike * 1.8)
}

/// One point of a spot sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotPoint {
    pub spot: f64,
    pub delta_call: f64,
    pub delta_put: f64,
    pub gamma: f64,
    pub call: f64,
    pub put: f64,
    pub call_payoff: f64,
    pub put_payoff: f64,
}

/// Greeks and prices across spot in `[0.4K, 1.8K]`, other inputs fixed.
pub fn spot_profile(inputs: &OptionInputs) -> Vec<SpotPoint> {
    let (lo, hi) = spot_range(inputs.strike);
    linspace(lo, hi, PROFILE_POINTS)
        .map(|spot| {
            let g = black_scholes(&inputs.with_spot(spot));
            SpotPoint {
                spot,
                delta_call: g.delta_call,
                delta_put: g.delta_put,
                gamma: g.gamma,
                call: g.call,
                put: g.put,
                call_payoff: g.call_intrinsic,
                put_payoff: g.put_intrinsic,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityParam {
    /// Volatility 5% to 100%, x in percent.
    #[default]
    Vol,
    /// Time 0.01 to 2.5 years, x in months.
    Time,
    /// Spot over `[0.4K, 1.8K]`.
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPoint {
    pub x: f64,
    pub y_call: f64,
    pub y_put: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensitivity {
    pub greek: Greek,
    pub param: SensitivityParam,
    pub points: Vec<SensitivityPoint>,
    /// Current input on the same x scale.
    pub current_x: f64,
}

/// How `greek` varies as one input sweeps its range.
pub fn sensitivity(inputs: &OptionInputs, greek: Greek, param: SensitivityParam) -> Sensitivity {
    let point = |x: f64, at: OptionInputs| {
        let g = black_scholes(&at);
        SensitivityPoint {
            x,
            y_call: g.value(greek, OptionKind::Call),
            y_put: g.value(greek, OptionKind::Put),
        }
    };

    let (points, current_x) = match param {
        SensitivityParam::Vol => (
            linspace(0.05, 1.0, SENSITIVITY_POINTS)
                .map(|vol| point(vol * 100.0, OptionInputs { vol, ..*inputs }))
                .collect(),
            inputs.vol * 100.0,
        ),
        SensitivityParam::Time => (
            linspace(0.01, 2.5, SENSITIVITY_POINTS)
                .map(|time_years| point(time_years * 12.0, OptionInputs { time_years, ..*inputs }))
                .collect(),
            inputs.time_years * 12.0,
        ),
        SensitivityParam::Spot => {
            let (lo, hi) = spot_range(inputs.strike);
            (
                linspace(lo, hi, SENSITIVITY_POINTS)
                    .map(|spot| point(spot, inputs.with_spot(spot)))
                    .collect(),
                inputs.spot,
            )
        }
    };

    Sensitivity {
        greek,
        param,
        points,
        current_x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_ncdf() {
        assert!(close(ncdf(0.0), 0.5, 1e-9));
        assert!(close(ncdf(1.96), 0.9750021, 2e-7));
        assert!(close(ncdf(-1.0), 0.1586553, 2e-7));
        assert!(close(ncdf(3.0) + ncdf(-3.0), 1.0, 1e-12));
    }

    #[test]
    fn test_reference_prices() {
        let inputs = OptionInputs {
            spot: 100.0,
            strike: 100.0,
            rate: 0.05,
            vol: 0.2,
            time_years: 1.0,
        };
        let g = black_scholes(&inputs);
        assert!(close(g.call, 10.4506, 1e-3), "call {}", g.call);
        assert!(close(g.put, 5.5735, 1e-3), "put {}", g.put);
        assert!(close(g.delta_call, 0.6368, 1e-3));
        assert!(close(g.delta_put, g.delta_call - 1.0, 1e-12));
        assert!(close(g.gamma, 0.018762, 1e-4));
        assert!(close(g.vega, 0.3752, 1e-3));
        assert!(g.theta_call < 0.0);
        assert!(g.rho_call > 0.0 && g.rho_put < 0.0);
        assert_eq!(g.moneyness, Moneyness::Atm);
        assert!(put_call_parity(&g, &inputs).holds);
    }

    #[test]
    fn test_degenerate_inputs_use_intrinsic() {
        let expired = OptionInputs { spot: 110.0, time_years: 0.0, ..Default::default() };
        let g = black_scholes(&expired);
        assert_eq!(g.call, 10.0);
        assert_eq!(g.put, 0.0);
        assert_eq!((g.delta_call, g.delta_put), (1.0, 0.0));
        assert_eq!(g.gamma, 0.0);
        assert_eq!(g.call_time_value, 0.0);

        let at_strike = OptionInputs { vol: 0.0, ..Default::default() };
        let g = black_scholes(&at_strike);
        assert_eq!((g.delta_call, g.delta_put), (0.5, -0.5));

        let below = OptionInputs { spot: 80.0, time_years: 0.0, ..Default::default() };
        assert_eq!(black_scholes(&below).delta_put, -1.0);
    }

    #[test]
    fn test_moneyness() {
        assert_eq!(Moneyness::classify(1.2), Moneyness::DeepItm);
        assert_eq!(Moneyness::classify(1.05), Moneyness::Itm);
        assert_eq!(Moneyness::classify(1.0), Moneyness::Atm);
        assert_eq!(Moneyness::classify(0.95), Moneyness::Otm);
        assert_eq!(Moneyness::classify(0.5), Moneyness::DeepOtm);
        assert_eq!(serde_json::to_string(&Moneyness::DeepItm).unwrap(), "\"deep-itm\"");
    }

    #[test]
    fn test_parity_across_spots() {
        for point in spot_profile(&OptionInputs::default()) {
            let inputs = OptionInputs { spot: point.spot, ..Default::default() };
            let g = black_scholes(&inputs);
            assert!(put_call_parity(&g, &inputs).holds, "spot {}", point.spot);
        }
    }

    #[test]
    fn test_spot_profile() {
        let profile = spot_profile(&OptionInputs::default());
        assert_eq!(profile.len(), PROFILE_POINTS);
        assert!(close(profile[0].spot, 40.0, 1e-9));
        assert!(close(profile[PROFILE_POINTS - 1].spot, 180.0, 1e-9));
        assert!(profile.windows(2).all(|w| w[1].delta_call >= w[0].delta_call));
        assert!(profile.iter().all(|p| p.call >= p.call_payoff - 1e-6));
    }

    #[test]
    fn test_sensitivity_ranges() {
        let inputs = OptionInputs::default();

        let vol = sensitivity(&inputs, Greek::Vega, SensitivityParam::Vol);
        assert_eq!(vol.points.len(), SENSITIVITY_POINTS);
        assert!(close(vol.points[0].x, 5.0, 1e-9));
        assert!(close(vol.points[SENSITIVITY_POINTS - 1].x, 100.0, 1e-9));
        assert!(close(vol.current_x, 20.0, 1e-9));
        assert!(vol.points.iter().all(|p| p.y_call == p.y_put));

        let time = sensitivity(&inputs, Greek::Theta, SensitivityParam::Time);
        assert!(close(time.points[0].x, 0.12, 1e-9));
        assert!(close(time.points[SENSITIVITY_POINTS - 1].x, 30.0, 1e-9));
        assert!(close(time.current_x, 6.0, 1e-9));

        let spot = sensitivity(&inputs, Greek::Delta, SensitivityParam::Spot);
        assert!(close(spot.current_x, 100.0, 1e-9));
        assert!(spot.points.iter().all(|p| close(p.y_put, p.y_call - 1.0, 1e-12)));
    }

    #[test]
    fn test_validate() {
        assert!(OptionInputs::default().validate().is_ok());
        assert!(OptionInputs { vol: f64::NAN, ..Default::default() }.validate().is_err());
        assert!(OptionInputs { strike: 0.0, ..Default::default() }.validate().is_err());
    }
}
