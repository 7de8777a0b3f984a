//! HTTP handlers for the statistics dashboard

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{BeanSelector, BeanType, DayCountMode, StatisticsSnapshot, TimeWindow};

use crate::error::{AppError, AppResult};
use crate::services::statistics::{
    ConsumptionReport, ConsumptionRequest, DepletionReport, DepletionRequest, SnapshotQuery,
    StatisticsService,
};
use crate::AppState;

/// Query string of the consumption endpoint.
///
/// At most one of `bean_id`, `bean_name` and `bean_type` selects the notes;
/// none selects everything. `window` and `mode` accept the short forms
/// (`week`, `month`, `all`, `natural`, `coffee`).
#[derive(Debug, Default, Deserialize)]
pub struct ConsumptionParams {
    pub bean_id: Option<String>,
    pub bean_name: Option<String>,
    pub bean_type: Option<BeanType>,
    pub window: Option<String>,
    pub mode: Option<String>,
}

impl ConsumptionParams {
    pub fn to_request(&self) -> AppResult<ConsumptionRequest> {
        let selector = match (&self.bean_id, &self.bean_name, self.bean_type) {
            (None, None, None) => BeanSelector::All,
            (Some(id), None, None) => BeanSelector::Id(id.clone()),
            (None, Some(name), None) => BeanSelector::Name(name.clone()),
            (None, None, Some(bean_type)) => BeanSelector::Type(bean_type),
            _ => {
                return Err(AppError::Validation {
                    field: "selector".to_string(),
                    message: "Use only one of bean_id, bean_name or bean_type".to_string(),
                    message_zh: "bean_id、bean_name 与 bean_type 只能选择一个".to_string(),
                })
            }
        };

        let window = match &self.window {
            Some(raw) => raw
                .parse::<TimeWindow>()
                .map_err(|e| invalid("window", e, "时间范围无效"))?,
            None => TimeWindow::AllTime,
        };
        let mode = match &self.mode {
            Some(raw) => Some(
                raw.parse::<DayCountMode>()
                    .map_err(|e| invalid("mode", e, "天数计算方式无效"))?,
            ),
            None => None,
        };

        Ok(ConsumptionRequest {
            selector,
            window,
            mode,
        })
    }
}

fn invalid(field: &str, message: String, message_zh: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message_zh: format!("{}: {}", message_zh, message),
        message,
    }
}

/// Dashboard snapshot
pub async fn get_statistics(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> Json<StatisticsSnapshot> {
    let service = StatisticsService::new(state.records, state.utc_offset);
    Json(service.snapshot(&query).await)
}

/// Consumption totals for a window
pub async fn get_consumption(
    State(state): State<AppState>,
    Query(params): Query<ConsumptionParams>,
) -> AppResult<Json<ConsumptionReport>> {
    let request = params.to_request()?;
    let service = StatisticsService::new(state.records, state.utc_offset);
    Ok(Json(service.consumption(&request).await))
}

/// Projected depletion date
pub async fn get_depletion(
    State(state): State<AppState>,
    Query(request): Query<DepletionRequest>,
) -> Json<DepletionReport> {
    let service = StatisticsService::new(state.records, state.utc_offset);
    Json(service.depletion(&request).await)
}
