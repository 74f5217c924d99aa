//! Small SVG line charts for the options lab.
//!
//! Every chart uses the same 320x180 viewBox so cards line up in a grid.

use std::fmt::Write as _;

use serde::Serialize;

use crate::options::{Greek, SensitivityParam, Sensitivity, SpotPoint};

pub const WIDTH: f64 = 320.0;
pub const HEIGHT: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

pub const MARGINS: Margins = Margins {
    top: 12.0,
    right: 10.0,
    bottom: 30.0,
    left: 44.0,
};

/// Plot width inside the margins.
pub const PLOT_WIDTH: f64 = WIDTH - MARGINS.left - MARGINS.right;
/// Plot height inside the margins.
pub const PLOT_HEIGHT: f64 = HEIGHT - MARGINS.top - MARGINS.bottom;

pub const CALL_COLOR: &str = "var(--accent)";
pub const PUT_COLOR: &str = "#c878a0";
pub const GAMMA_COLOR: &str = "#e8b53a";
const STRIKE_COLOR: &str = "#e8b53a";
const GRID_COLOR: &str = "var(--border)";
const LABEL_COLOR: &str = "var(--text-muted)";

/// Data bounds mapped linearly onto the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Frame {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn to_x(&self, x: f64) -> f64 {
        MARGINS.left + (x - self.x_min) / (self.x_max - self.x_min) * PLOT_WIDTH
    }

    /// SVG y grows downward, so `y_max` maps to the top margin.
    pub fn to_y(&self, y: f64) -> f64 {
        MARGINS.top + PLOT_HEIGHT - (y - self.y_min) / (self.y_max - self.y_min) * PLOT_HEIGHT
    }

    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.x_min && x <= self.x_max
    }
}

/// `M`/`L` path through the points. Non-finite points are skipped.
pub fn svg_path(frame: &Frame, points: &[(f64, f64)]) -> String {
    points
        .iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .enumerate()
        .map(|(i, &(x, y))| {
            let cmd = if i == 0 { 'M' } else { 'L' };
            format!("{cmd}{:.1},{:.1}", frame.to_x(x), frame.to_y(y))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Closed polygon between two curves sharing x values.
pub fn area_path(frame: &Frame, upper: &[(f64, f64)], lower: &[(f64, f64)]) -> String {
    let forward = upper.iter();
    let back = lower.iter().rev();
    let body = svg_path(frame, &forward.chain(back).copied().collect::<Vec<_>>());
    if body.is_empty() {
        body
    } else {
        format!("{body} Z")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub label: String,
    pub color: String,
    pub points: Vec<(f64, f64)>,
    pub dashed: bool,
}

impl Series {
    pub fn new(label: &str, color: &str, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.to_string(),
            color: color.to_string(),
            points,
            dashed: false,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// Filled band between two curves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub color: String,
    pub upper: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
}

/// Vertical marker line with a short label, e.g. `K` for strike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub x: f64,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChart {
    pub title: String,
    #[serde(skip)]
    pub frame: Frame,
    pub series: Vec<Series>,
    pub fills: Vec<Fill>,
    /// Value and formatted label.
    pub y_ticks: Vec<(f64, String)>,
    pub x_labels: Vec<(f64, String)>,
    pub markers: Vec<Marker>,
    /// Horizontal rule at y = 0.
    pub zero_line: bool,
}

impl LineChart {
    pub fn new(title: &str, frame: Frame) -> Self {
        Self {
            title: title.to_string(),
            frame,
            series: Vec::new(),
            fills: Vec::new(),
            y_ticks: Vec::new(),
            x_labels: Vec::new(),
            markers: Vec::new(),
            zero_line: false,
        }
    }

    pub fn to_svg(&self) -> String {
        let f = &self.frame;
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="{}">"#,
            escape(&self.title)
        );

        for (v, label) in &self.y_ticks {
            let y = f.to_y(*v);
            let _ = write!(
                out,
                r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{GRID_COLOR}" stroke-width="0.5"/>"#,
                MARGINS.left,
                WIDTH - MARGINS.right
            );
            let _ = write!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="end" fill="{LABEL_COLOR}">{}</text>"#,
                MARGINS.left - 4.0,
                y + 3.0,
                escape(label)
            );
        }
        for (v, label) in &self.x_labels {
            let _ = write!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="middle" fill="{LABEL_COLOR}">{}</text>"#,
                f.to_x(*v),
                HEIGHT - MARGINS.bottom + 14.0,
                escape(label)
            );
        }
        if self.zero_line {
            let y = f.to_y(0.0);
            let _ = write!(
                out,
                r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{LABEL_COLOR}" stroke-width="0.8"/>"#,
                MARGINS.left,
                WIDTH - MARGINS.right
            );
        }
        for fill in &self.fills {
            let d = area_path(f, &fill.upper, &fill.lower);
            if !d.is_empty() {
                let _ = write!(
                    out,
                    r#"<path d="{d}" fill="{}" fill-opacity="0.15" stroke="none"/>"#,
                    fill.color
                );
            }
        }
        for s in &self.series {
            let d = svg_path(f, &s.points);
            if d.is_empty() {
                continue;
            }
            let dash = if s.dashed { r#" stroke-dasharray="4 3""# } else { "" };
            let _ = write!(
                out,
                r#"<path d="{d}" fill="none" stroke="{}" stroke-width="1.6"{dash}/>"#,
                s.color
            );
        }
        for m in self.markers.iter().filter(|m| f.contains_x(m.x)) {
            let x = f.to_x(m.x);
            let _ = write!(
                out,
                r#"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{}" stroke-width="1" stroke-dasharray="3 3"/>"#,
                MARGINS.top,
                HEIGHT - MARGINS.bottom,
                m.color
            );
            let _ = write!(
                out,
                r#"<text x="{x:.1}" y="{:.1}" font-size="9" text-anchor="middle" fill="{}">{}</text>"#,
                MARGINS.top - 2.0,
                m.color,
                escape(&m.label)
            );
        }
        out.push_str("</svg>");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn spot_labels(points: &[SpotPoint]) -> Vec<(f64, String)> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let mid = (first.spot + last.spot) / 2.0;
    [first.spot, mid, last.spot]
        .into_iter()
        .map(|x| (x, format!("{x:.0}")))
        .collect()
}

fn spot_frame(points: &[SpotPoint], y_min: f64, y_max: f64) -> Frame {
    let x_min = points.first().map_or(0.0, |p| p.spot);
    let x_max = points.last().map_or(1.0, |p| p.spot);
    Frame::new(x_min, x_max, y_min, y_max)
}

fn strike_and_spot(strike: f64, spot: f64) -> Vec<Marker> {
    vec![
        Marker {
            x: strike,
            label: "K".to_string(),
            color: STRIKE_COLOR.to_string(),
        },
        Marker {
            x: spot,
            label: "S".to_string(),
            color: CALL_COLOR.to_string(),
        },
    ]
}

/// Call and put delta over spot on a fixed `[-1, 1]` axis.
pub fn delta_chart(points: &[SpotPoint], strike: f64, spot: f64) -> LineChart {
    let mut chart = LineChart::new("Delta vs spot", spot_frame(points, -1.0, 1.0));
    chart.series.push(Series::new(
        "Call",
        CALL_COLOR,
        points.iter().map(|p| (p.spot, p.delta_call)).collect(),
    ));
    chart.series.push(Series::new(
        "Put",
        PUT_COLOR,
        points.iter().map(|p| (p.spot, p.delta_put)).collect(),
    ));
    chart.y_ticks = [-1.0, -0.5, 0.0, 0.5, 1.0]
        .into_iter()
        .map(|v| (v, trim_tick(v)))
        .collect();
    chart.x_labels = spot_labels(points);
    chart.markers = strike_and_spot(strike, spot);
    chart.zero_line = true;
    chart
}

fn trim_tick(v: f64) -> String {
    let s = format!("{v}");
    if s == "-0" {
        "0".to_string()
    } else {
        s
    }
}

fn gamma_tick(v: f64) -> String {
    if v < 0.001 {
        "0".to_string()
    } else if v < 0.01 {
        format!("{v:.4}")
    } else {
        format!("{v:.3}")
    }
}

/// Gamma over spot, axis scaled to the peak.
pub fn gamma_chart(points: &[SpotPoint], strike: f64, spot: f64) -> LineChart {
    let peak = points.iter().map(|p| p.gamma).fold(0.0_f64, f64::max);
    let y_max = peak.max(0.001) * 1.15;
    let mut chart = LineChart::new("Gamma vs spot", spot_frame(points, 0.0, y_max));
    chart.series.push(Series::new(
        "Gamma",
        GAMMA_COLOR,
        points.iter().map(|p| (p.spot, p.gamma)).collect(),
    ));
    chart.y_ticks = [0.0, y_max / 2.0, y_max]
        .into_iter()
        .map(|v| (v, gamma_tick(v)))
        .collect();
    chart.x_labels = spot_labels(points);
    chart.markers = strike_and_spot(strike, spot);
    chart
}

/// Option value against payoff at expiry, with time value shaded.
pub fn payoff_chart(points: &[SpotPoint], strike: f64, spot: f64) -> LineChart {
    let peak = points
        .iter()
        .flat_map(|p| [p.call, p.put, p.call_payoff, p.put_payoff])
        .fold(0.0_f64, f64::max);
    let y_max = peak.max(1.0) * 1.12;
    let mut chart = LineChart::new("Value vs payoff", spot_frame(points, 0.0, y_max));

    let call: Vec<_> = points.iter().map(|p| (p.spot, p.call)).collect();
    let put: Vec<_> = points.iter().map(|p| (p.spot, p.put)).collect();
    let call_payoff: Vec<_> = points.iter().map(|p| (p.spot, p.call_payoff)).collect();
    let put_payoff: Vec<_> = points.iter().map(|p| (p.spot, p.put_payoff)).collect();

    chart.fills.push(Fill {
        color: CALL_COLOR.to_string(),
        upper: call.clone(),
        lower: call_payoff.clone(),
    });
    chart.fills.push(Fill {
        color: PUT_COLOR.to_string(),
        upper: put.clone(),
        lower: put_payoff.clone(),
    });
    chart.series.push(Series::new("Call", CALL_COLOR, call));
    chart.series.push(Series::new("Put", PUT_COLOR, put));
    chart
        .series
        .push(Series::new("Call payoff", CALL_COLOR, call_payoff).dashed());
    chart
        .series
        .push(Series::new("Put payoff", PUT_COLOR, put_payoff).dashed());

    chart.y_ticks = [0.0, y_max / 2.0, y_max]
        .into_iter()
        .map(|v| (v, format!("{v:.0}")))
        .collect();
    chart.x_labels = spot_labels(points);
    chart.markers = strike_and_spot(strike, spot);
    chart
}

/// Tick label precision shrinks as magnitude grows.
pub fn sensitivity_tick(v: f64) -> String {
    let a = v.abs();
    if a < 1e-4 {
        "0".to_string()
    } else if a < 0.01 {
        format!("{v:.4}")
    } else if a < 1.0 {
        format!("{v:.3}")
    } else {
        format!("{v:.1}")
    }
}

fn param_label(param: SensitivityParam, x: f64) -> String {
    match param {
        SensitivityParam::Vol => format!("{x:.0}%"),
        SensitivityParam::Time => format!("{x:.0}m"),
        SensitivityParam::Spot => format!("{x:.0}"),
    }
}

/// One greek against the swept input. Gamma and vega draw a single line.
pub fn sensitivity_chart(sens: &Sensitivity) -> LineChart {
    let single = sens.greek.same_for_both();
    let ys = sens
        .points
        .iter()
        .flat_map(|p| if single { vec![p.y_call] } else { vec![p.y_call, p.y_put] })
        .filter(|y| y.is_finite());
    let (lo, hi) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    let (lo, hi) = if lo.is_finite() { (lo, hi) } else { (0.0, 0.0) };
    let pad = ((hi - lo) * 0.12).max(0.001);
    let (y_min, y_max) = (lo - pad, hi + pad);

    let x_min = sens.points.first().map_or(0.0, |p| p.x);
    let x_max = sens.points.last().map_or(1.0, |p| p.x);
    let title = format!("{} vs {}", greek_name(sens.greek), param_name(sens.param));
    let mut chart = LineChart::new(&title, Frame::new(x_min, x_max, y_min, y_max));

    if single {
        chart.series.push(Series::new(
            greek_name(sens.greek),
            GAMMA_COLOR,
            sens.points.iter().map(|p| (p.x, p.y_call)).collect(),
        ));
    } else {
        chart.series.push(Series::new(
            "Call",
            CALL_COLOR,
            sens.points.iter().map(|p| (p.x, p.y_call)).collect(),
        ));
        chart.series.push(Series::new(
            "Put",
            PUT_COLOR,
            sens.points.iter().map(|p| (p.x, p.y_put)).collect(),
        ));
    }

    chart.y_ticks = [y_min, (y_min + y_max) / 2.0, y_max]
        .into_iter()
        .map(|v| (v, sensitivity_tick(v)))
        .collect();
    chart.x_labels = [x_min, (x_min + x_max) / 2.0, x_max]
        .into_iter()
        .map(|x| (x, param_label(sens.param, x)))
        .collect();
    chart.markers.push(Marker {
        x: sens.current_x,
        label: "now".to_string(),
        color: CALL_COLOR.to_string(),
    });
    chart.zero_line = y_min < 0.0 && y_max > 0.0;
    chart
}

fn greek_name(greek: Greek) -> &'static str {
    match greek {
        Greek::Delta => "Delta",
        Greek::Gamma => "Gamma",
        Greek::Vega => "Vega",
        Greek::Theta => "Theta",
    }
}

fn param_name(param: SensitivityParam) -> &'static str {
    match param {
        SensitivityParam::Vol => "volatility",
        SensitivityParam::Time => "time",
        SensitivityParam::Spot => "spot",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{sensitivity, spot_profile, OptionInputs};

    #[test]
    fn test_frame_mapping() {
        let f = Frame::new(0.0, 10.0, -1.0, 1.0);
        assert_eq!(f.to_x(0.0), MARGINS.left);
        assert_eq!(f.to_x(10.0), WIDTH - MARGINS.right);
        assert_eq!(f.to_y(1.0), MARGINS.top);
        assert_eq!(f.to_y(-1.0), HEIGHT - MARGINS.bottom);
        assert_eq!(PLOT_WIDTH, 266.0);
        assert_eq!(PLOT_HEIGHT, 138.0);
    }

    #[test]
    fn test_svg_path_skips_non_finite() {
        let f = Frame::new(0.0, 266.0, 0.0, 138.0);
        let path = svg_path(&f, &[(f64::NAN, 1.0), (0.0, 0.0), (1.0, f64::INFINITY), (2.0, 138.0)]);
        assert_eq!(path, "M44.0,150.0 L46.0,12.0");
        assert_eq!(svg_path(&f, &[]), "");
    }

    #[test]
    fn test_area_path_closes() {
        let f = Frame::new(0.0, 1.0, 0.0, 1.0);
        let d = area_path(&f, &[(0.0, 1.0), (1.0, 1.0)], &[(0.0, 0.0), (1.0, 0.0)]);
        assert!(d.starts_with('M'));
        assert!(d.ends_with(" Z"));
        assert_eq!(d.matches('L').count(), 3);
    }

    #[test]
    fn test_tick_labels() {
        assert_eq!(gamma_tick(0.0005), "0");
        assert_eq!(gamma_tick(0.005), "0.0050");
        assert_eq!(gamma_tick(0.025), "0.025");
        assert_eq!(sensitivity_tick(0.00001), "0");
        assert_eq!(sensitivity_tick(-0.5), "-0.500");
        assert_eq!(sensitivity_tick(12.34), "12.3");
        assert_eq!(trim_tick(-0.5), "-0.5");
        assert_eq!(trim_tick(1.0), "1");
    }

    #[test]
    fn test_profile_charts_render() {
        let inputs = OptionInputs::default();
        let profile = spot_profile(&inputs);
        for chart in [
            delta_chart(&profile, inputs.strike, inputs.spot),
            gamma_chart(&profile, inputs.strike, inputs.spot),
            payoff_chart(&profile, inputs.strike, inputs.spot),
        ] {
            let svg = chart.to_svg();
            assert!(svg.starts_with("<svg"));
            assert!(svg.ends_with("</svg>"));
            assert!(svg.contains(">K</text>"));
        }
        let payoff = payoff_chart(&profile, inputs.strike, inputs.spot);
        assert_eq!(payoff.fills.len(), 2);
        assert!(payoff.frame.y_max >= 1.12);
    }

    #[test]
    fn test_sensitivity_chart_lines() {
        let inputs = OptionInputs::default();
        let vega = sensitivity_chart(&sensitivity(&inputs, Greek::Vega, SensitivityParam::Vol));
        assert_eq!(vega.series.len(), 1);

        let delta = sensitivity_chart(&sensitivity(&inputs, Greek::Delta, SensitivityParam::Spot));
        assert_eq!(delta.series.len(), 2);
        // put delta is negative, call delta positive
        assert!(delta.zero_line);
        assert!(delta.to_svg().contains(">now</text>"));
    }
}
