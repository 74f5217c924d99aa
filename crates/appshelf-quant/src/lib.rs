//! Numerics behind the options lab and rainfall explorer.

pub mod chart;
pub mod options;
pub mod rainfall;

pub use chart::{LineChart, WIDTH, HEIGHT};
pub use options::{
    black_scholes, put_call_parity, sensitivity, spot_profile, Greek, Greeks, Moneyness,
    OptionInputs, OptionKind, ParityCheck, Sensitivity, SensitivityParam,
};
pub use rainfall::{find_month, month_distribution, shared_pdf_y_max, MonthDistribution, MonthFit, MONTHS};
