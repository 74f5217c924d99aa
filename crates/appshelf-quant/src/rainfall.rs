//! Monthly wet-day rainfall as fitted Gamma distributions.
//!
//! Each month carries a shape `k` and scale `theta` (mm/day) for wet days,
//! the probability of rain on a given day, and the normal monthly total.
//! Histograms come from a seeded sampler so every render shows the same bars.

use serde::Serialize;

/// Upper end of the x axis in mm/day.
pub const X_MAX: f64 = 100.0;
/// Histogram bin width in mm/day.
pub const BIN_WIDTH: f64 = 5.0;
/// Samples drawn per month.
pub const SAMPLE_COUNT: usize = 3000;
/// Points in the analytic curve.
pub const CURVE_POINTS: usize = 601;
/// Probability floor for log and logit scales.
pub const EPS: f64 = 1e-6;
/// CDF clip for the logit axis.
pub const CLIP_P: f64 = 1.0 - 1e-4;

const SERIES_ITERATIONS: usize = 200;
const SERIES_TOLERANCE: f64 = 1e-10;
const TINY: f64 = 1e-30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthFit {
    pub name: &'static str,
    pub k: f64,
    pub theta: f64,
    pub p_rain: f64,
    pub total_mm: f64,
    pub color: &'static str,
}

pub const MONTHS: [MonthFit; 12] = [
    MonthFit { name: "Jan", k: 0.80, theta: 6.3, p_rain: 0.19, total_mm: 52.0, color: "#7eb8d4" },
    MonthFit { name: "Feb", k: 0.82, theta: 6.8, p_rain: 0.20, total_mm: 56.0, color: "#89c4e1" },
    MonthFit { name: "Mar", k: 0.85, theta: 9.0, p_rain: 0.28, total_mm: 117.0, color: "#6cbf8a" },
    MonthFit { name: "Apr", k: 0.85, theta: 9.8, p_rain: 0.31, total_mm: 124.0, color: "#85d98c" },
    MonthFit { name: "May", k: 0.82, theta: 11.0, p_rain: 0.34, total_mm: 137.0, color: "#a3e07a" },
    MonthFit { name: "Jun", k: 0.75, theta: 15.5, p_rain: 0.46, total_mm: 167.0, color: "#c8c43a" },
    MonthFit { name: "Jul", k: 0.72, theta: 16.0, p_rain: 0.40, total_mm: 156.0, color: "#e8972a" },
    MonthFit { name: "Aug", k: 0.72, theta: 15.8, p_rain: 0.41, total_mm: 154.0, color: "#e06b2a" },
    MonthFit { name: "Sep", k: 0.70, theta: 20.8, p_rain: 0.46, total_mm: 224.0, color: "#c44a3a" },
    MonthFit { name: "Oct", k: 0.72, theta: 21.2, p_rain: 0.44, total_mm: 234.0, color: "#c44a8a" },
    MonthFit { name: "Nov", k: 0.85, theta: 10.2, p_rain: 0.30, total_mm: 96.0, color: "#8a5ac4" },
    MonthFit { name: "Dec", k: 0.82, theta: 7.4, p_rain: 0.23, total_mm: 61.0, color: "#5a8ac4" },
];

/// Case-insensitive lookup by three-letter name.
pub fn find_month(name: &str) -> Option<&'static MonthFit> {
    MONTHS.iter().find(|m| m.name.eq_ignore_ascii_case(name.trim()))
}

impl MonthFit {
    /// Mean wet-day rainfall, `k * theta`.
    pub fn mean(&self) -> f64 {
        self.k * self.theta
    }

    pub fn pdf(&self, x: f64) -> f64 {
        gamma_pdf(x, self.k, self.theta)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        gamma_cdf(x, self.k, self.theta)
    }

    /// Sampler seed derived from the first two letters of the name.
    pub fn seed(&self) -> u32 {
        let mut units = self.name.encode_utf16();
        let c0 = units.next().unwrap_or(0) as u32;
        let c1 = units.next().unwrap_or(0) as u32;
        c0 * 1009 + c1 * 137 + 42
    }
}

/// ln Γ(x) by the Lanczos approximation (g = 7) with reflection below 0.5.
pub fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const C: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + G + 0.5;
    let a = C[1..]
        .iter()
        .enumerate()
        .fold(C[0], |acc, (i, c)| acc + c / (x + (i + 1) as f64));
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

pub fn gamma_pdf(x: f64, k: f64, theta: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    ((k - 1.0) * x.ln() - x / theta - k * theta.ln() - ln_gamma(k)).exp()
}

/// Regularised lower incomplete gamma P(a, x): series below `a + 1`,
/// Lentz continued fraction above.
pub fn reg_inc_gamma(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let prefactor = (-x + a * x.ln() - ln_gamma(a)).exp();

    if x < a + 1.0 {
        let mut ap = a;
        let mut del = 1.0 / a;
        let mut sum = del;
        for _ in 0..SERIES_ITERATIONS {
            ap += 1.0;
            del *= x / ap;
            sum += del;
            if del.abs() < sum.abs() * SERIES_TOLERANCE {
                break;
            }
        }
        sum * prefactor
    } else {
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / TINY;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=SERIES_ITERATIONS {
            let i = i as f64;
            let an = -i * (i - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < TINY {
                d = TINY;
            }
            c = b + an / c;
            if c.abs() < TINY {
                c = TINY;
            }
            d = 1.0 / d;
            let del = d * c;
            h *= del;
            if (del - 1.0).abs() < SERIES_TOLERANCE {
                break;
            }
        }
        1.0 - prefactor * h
    }
}

pub fn gamma_cdf(x: f64, k: f64, theta: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    reg_inc_gamma(k, x / theta)
}

/// Log-odds with `p` clamped to `[EPS, 1 - EPS]`.
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(EPS, 1.0 - EPS);
    (p / (1.0 - p)).ln()
}

/// Mulberry32: small, fast, seedable 32-bit generator.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        (t ^ (t >> 14)) as f64 / 4_294_967_296.0
    }
}

/// Marsaglia-Tsang sampling. Shapes below 1 sample `k + 1` and scale by `U^(1/k)`.
pub fn sample_gamma(k: f64, theta: f64, n: usize, rng: &mut Mulberry32) -> Vec<f64> {
    let boosted = if k < 1.0 { k + 1.0 } else { k };
    let d = boosted - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    let mut samples = Vec::with_capacity(n);

    while samples.len() < n {
        let (x, v) = loop {
            let u1 = rng.next_f64().max(1e-15);
            let u2 = rng.next_f64();
            let x = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            let v = (1.0 + c * x).powi(3);
            if v > 0.0 {
                break (x, v);
            }
        };
        let u = rng.next_f64();
        let x2 = x * x;
        if u < 1.0 - 0.0331 * x2 * x2 || u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
            let mut s = d * v * theta;
            if k < 1.0 {
                s *= rng.next_f64().max(1e-15).powf(1.0 / k);
            }
            if s > 0.0 && s.is_finite() {
                samples.push(s);
            }
        }
    }
    samples
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub x_left: f64,
    /// Count over `n * BIN_WIDTH`, comparable to the PDF.
    pub density: f64,
    /// Share of samples at or below the bin's right edge.
    pub ecdf: f64,
}

/// Bins of `BIN_WIDTH` up to `X_MAX`. Samples beyond `X_MAX` only count toward `n`.
pub fn histogram(samples: &[f64]) -> Vec<HistogramBin> {
    let n = samples.len().max(1) as f64;
    let bin_count = (X_MAX / BIN_WIDTH).ceil() as usize;
    let mut counts = vec![0usize; bin_count];
    for &s in samples {
        let bin = (s / BIN_WIDTH).floor();
        if bin >= 0.0 && (bin as usize) < bin_count {
            counts[bin as usize] += 1;
        }
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let right = (i + 1) as f64 * BIN_WIDTH;
            let at_or_below = sorted.partition_point(|&s| s <= right);
            HistogramBin {
                x_left: i as f64 * BIN_WIDTH,
                density: count as f64 / (n * BIN_WIDTH),
                ecdf: at_or_below as f64 / n,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    pub pdf: f64,
    pub cdf: f64,
}

/// PDF and CDF on `CURVE_POINTS` points from 0.05 to `X_MAX`.
pub fn analytic_curve(k: f64, theta: f64) -> Vec<CurvePoint> {
    let steps = (CURVE_POINTS - 1) as f64;
    (0..CURVE_POINTS)
        .map(|i| {
            let x = 0.05 + (X_MAX - 0.05) * (i as f64 / steps);
            CurvePoint {
                x,
                pdf: gamma_pdf(x, k, theta),
                cdf: gamma_cdf(x, k, theta),
            }
        })
        .collect()
}

/// Common PDF axis maximum so months are visually comparable.
pub fn shared_pdf_y_max() -> f64 {
    let peak = MONTHS
        .iter()
        .flat_map(|m| (1..=600).map(move |i| m.pdf(i as f64 * 0.15)))
        .fold(0.0_f64, f64::max);
    (peak * 1000.0).ceil() / 1000.0 + 0.001
}

/// Everything needed to draw one month's card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthDistribution {
    pub month: MonthFit,
    pub mean: f64,
    pub bins: Vec<HistogramBin>,
    pub curve: Vec<CurvePoint>,
}

pub fn month_distribution(month: &MonthFit) -> MonthDistribution {
    let mut rng = Mulberry32::new(month.seed());
    let samples = sample_gamma(month.k, month.theta, SAMPLE_COUNT, &mut rng);
    MonthDistribution {
        month: *month,
        mean: month.mean(),
        bins: histogram(&samples),
        curve: analytic_curve(month.k, month.theta),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_ln_gamma() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-10));
        assert!(close(ln_gamma(5.0), 24.0_f64.ln(), 1e-10));
        assert!(close(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-10));
        assert!(close(ln_gamma(0.3), 1.0957979948180756, 1e-9));
    }

    #[test]
    fn test_exponential_special_case() {
        // k = 1 is the exponential distribution
        for &x in &[0.5, 3.0, 12.0, 40.0] {
            assert!(close(gamma_pdf(x, 1.0, 5.0), (-x / 5.0).exp() / 5.0, 1e-10));
            assert!(close(gamma_cdf(x, 1.0, 5.0), 1.0 - (-x / 5.0).exp(), 1e-8));
        }
        assert_eq!(gamma_cdf(0.0, 0.8, 6.3), 0.0);
        assert_eq!(gamma_pdf(-1.0, 0.8, 6.3), 0.0);
    }

    #[test]
    fn test_cdf_branches_agree() {
        // a + 1 = 3 is where the series hands over to the continued fraction
        let below = reg_inc_gamma(2.0, 2.999_999);
        let above = reg_inc_gamma(2.0, 3.000_001);
        assert!(close(below, above, 1e-5));
        assert!(close(reg_inc_gamma(2.0, 3.0), 1.0 - 4.0 * (-3.0_f64).exp(), 1e-8));
    }

    #[test]
    fn test_mulberry_is_deterministic() {
        let mut a = Mulberry32::new(42);
        let mut b = Mulberry32::new(42);
        for _ in 0..100 {
            let x = a.next_f64();
            assert_eq!(x, b.next_f64());
            assert!((0.0..1.0).contains(&x));
        }
        assert_ne!(Mulberry32::new(1).next_f64(), Mulberry32::new(2).next_f64());
    }

    #[test]
    fn test_month_seed() {
        let jan = find_month("jan").unwrap();
        assert_eq!(jan.seed(), 'J' as u32 * 1009 + 'a' as u32 * 137 + 42);
        assert!(find_month("Foo").is_none());
    }

    #[test]
    fn test_sample_mean_matches_fit() {
        for month in [&MONTHS[0], &MONTHS[8]] {
            let mut rng = Mulberry32::new(month.seed());
            let samples = sample_gamma(month.k, month.theta, SAMPLE_COUNT, &mut rng);
            assert_eq!(samples.len(), SAMPLE_COUNT);
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            assert!(
                (mean - month.mean()).abs() < 0.12 * month.mean(),
                "{}: sample mean {} vs {}",
                month.name,
                mean,
                month.mean()
            );
        }
    }

    #[test]
    fn test_histogram_shape() {
        let dist = month_distribution(&MONTHS[5]);
        assert_eq!(dist.bins.len(), 20);
        assert_eq!(dist.bins[1].x_left, 5.0);
        assert!(dist.bins.windows(2).all(|w| w[1].ecdf >= w[0].ecdf));
        let mass: f64 = dist.bins.iter().map(|b| b.density * BIN_WIDTH).sum();
        assert!(mass <= 1.0 + 1e-12);
        assert!(close(mass, dist.bins[19].ecdf, 1e-12));

        assert_eq!(dist.curve.len(), CURVE_POINTS);
        assert!(close(dist.curve[0].x, 0.05, 1e-12));
        assert!(close(dist.curve[CURVE_POINTS - 1].x, X_MAX, 1e-9));

        assert_eq!(month_distribution(&MONTHS[5]), dist);
    }

    #[test]
    fn test_shared_y_max() {
        let y_max = shared_pdf_y_max();
        for month in &MONTHS {
            for i in 1..=600 {
                assert!(month.pdf(i as f64 * 0.15) < y_max);
            }
        }
    }

    #[test]
    fn test_logit() {
        assert_eq!(logit(0.5), 0.0);
        assert!(logit(0.0).is_finite());
        assert!(close(logit(0.0), -logit(1.0), 1e-9));
    }
}
