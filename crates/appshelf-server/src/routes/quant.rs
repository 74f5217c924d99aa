//! Options lab and rainfall explorer.

use std::sync::Arc;

use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use appshelf_quant::chart::{delta_chart, gamma_chart, payoff_chart, sensitivity_chart};
use appshelf_quant::rainfall::{BIN_WIDTH, X_MAX};
use appshelf_quant::{
    black_scholes, find_month, month_distribution, put_call_parity, sensitivity,
    shared_pdf_y_max, spot_profile, Greek, OptionInputs, SensitivityParam, MONTHS,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quant/options", post(price_option))
        .route("/quant/options/profile", post(option_profile))
        .route("/quant/options/sensitivity", post(option_sensitivity))
        .route("/quant/rainfall", get(rainfall_months))
        .route("/quant/rainfall/{month}", get(rainfall_month))
}

/// POST /api/quant/options — price, greeks, moneyness and parity check.
async fn price_option(Json(inputs): Json<OptionInputs>) -> ApiResult<Json<serde_json::Value>> {
    inputs.validate()?;
    let greeks = black_scholes(&inputs);
    let parity = put_call_parity(&greeks, &inputs);
    Ok(Json(serde_json::json!({
        "inputs": inputs,
        "greeks": greeks,
        "moneyness": {
            "class": greeks.moneyness,
            "label": greeks.moneyness.label(),
            "intuition": greeks.moneyness.intuition(),
        },
        "parity": parity,
    })))
}

/// POST /api/quant/options/profile — spot sweep with rendered charts.
async fn option_profile(Json(inputs): Json<OptionInputs>) -> ApiResult<Json<serde_json::Value>> {
    inputs.validate()?;
    let points = spot_profile(&inputs);
    let (k, s) = (inputs.strike, inputs.spot);
    Ok(Json(serde_json::json!({
        "points": points,
        "charts": {
            "delta": delta_chart(&points, k, s).to_svg(),
            "gamma": gamma_chart(&points, k, s).to_svg(),
            "payoff": payoff_chart(&points, k, s).to_svg(),
        },
    })))
}

#[derive(Debug, Deserialize)]
struct SensitivityBody {
    #[serde(default)]
    inputs: OptionInputs,
    #[serde(default)]
    greek: Greek,
    #[serde(default)]
    param: SensitivityParam,
}

/// POST /api/quant/options/sensitivity — one greek against one swept input.
async fn option_sensitivity(Json(body): Json<SensitivityBody>) -> ApiResult<Json<serde_json::Value>> {
    body.inputs.validate()?;
    let sens = sensitivity(&body.inputs, body.greek, body.param);
    let svg = sensitivity_chart(&sens).to_svg();
    Ok(Json(serde_json::json!({
        "sensitivity": sens,
        "sameForBoth": body.greek.same_for_both(),
        "svg": svg,
    })))
}

/// GET /api/quant/rainfall — the monthly fits and shared axis bounds.
async fn rainfall_months() -> Json<serde_json::Value> {
    let months: Vec<_> = MONTHS
        .iter()
        .map(|m| {
            serde_json::json!({
                "fit": m,
                "mean": m.mean(),
            })
        })
        .collect();
    Json(serde_json::json!({
        "months": months,
        "pdfYMax": shared_pdf_y_max(),
        "xMax": X_MAX,
        "binWidth": BIN_WIDTH,
    }))
}

/// GET /api/quant/rainfall/{month} — histogram and analytic curve for one month.
async fn rainfall_month(Path(month): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    let fit = find_month(&month).ok_or_else(|| ApiError::not_found(format!("month {}", month)))?;
    Ok(Json(serde_json::json!(month_distribution(fit))))
}
