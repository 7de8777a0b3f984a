//! HTTP handlers for the bean inventory

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{Bean, BeanFilter, BeanType, FilterMode, FilterOptions, FreshnessPhase, SortKey};

use crate::error::{AppError, AppResult};
use crate::services::beans::{
    AdjustRemainingInput, BeanListQuery, BeanService, BeanView, InventoryChange,
    QuickDecrementInput,
};
use crate::services::local_today;
use crate::AppState;

/// Query string of the bean list
///
/// `filter` names the active filter mode and `value` its selection, e.g.
/// `?filter=origin&value=Kenya&sort=name_asc`.
#[derive(Debug, Default, Deserialize)]
pub struct BeanListParams {
    pub bean_type: Option<BeanType>,
    pub include_empty: Option<bool>,
    pub filter: Option<String>,
    pub value: Option<String>,
    pub sort: Option<SortKey>,
}

impl BeanListParams {
    pub fn to_filter(&self) -> AppResult<BeanFilter> {
        let value = || {
            self.value.clone().ok_or_else(|| AppError::Validation {
                field: "value".to_string(),
                message: "A filter value is required for this filter mode".to_string(),
                message_zh: "该筛选方式需要提供筛选值".to_string(),
            })
        };

        let mode = match self.filter.as_deref() {
            None | Some("all") => FilterMode::All,
            Some("variety") => FilterMode::Variety(value()?),
            Some("origin") => FilterMode::Origin(value()?),
            Some("roaster") => FilterMode::Roaster(value()?),
            Some("phase") => {
                let raw = value()?;
                let phase = FreshnessPhase::parse(&raw).ok_or_else(|| AppError::Validation {
                    field: "value".to_string(),
                    message: format!("Unknown freshness phase '{}'", raw),
                    message_zh: format!("未知的赏味阶段 '{}'", raw),
                })?;
                FilterMode::Phase(phase)
            }
            Some(other) => {
                return Err(AppError::Validation {
                    field: "filter".to_string(),
                    message: format!("Unknown filter mode '{}'", other),
                    message_zh: format!("未知的筛选方式 '{}'", other),
                })
            }
        };

        Ok(BeanFilter {
            bean_type: self.bean_type,
            include_empty: self.include_empty.unwrap_or(true),
            mode,
        })
    }
}

/// List beans with filter and sort applied
pub async fn list_beans(
    State(state): State<AppState>,
    Query(params): Query<BeanListParams>,
) -> AppResult<Json<Vec<BeanView>>> {
    let query = BeanListQuery {
        filter: params.to_filter()?,
        sort: params.sort.unwrap_or_default(),
    };
    let service = BeanService::new(state.records);
    let beans = service.list(&query, local_today(state.utc_offset)).await;
    Ok(Json(beans))
}

/// Values available to the list filter modes
pub async fn get_filter_options(State(state): State<AppState>) -> Json<FilterOptions> {
    let service = BeanService::new(state.records);
    Json(service.filter_options(local_today(state.utc_offset)).await)
}

/// Get a single bean
pub async fn get_bean(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BeanView>> {
    let service = BeanService::new(state.records);
    let bean = service.get(&id).await?;
    Ok(Json(BeanView::new(bean, local_today(state.utc_offset))))
}

/// Create a bean
pub async fn create_bean(
    State(state): State<AppState>,
    Json(input): Json<Bean>,
) -> AppResult<(StatusCode, Json<Bean>)> {
    let service = BeanService::new(state.records);
    let bean = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(bean)))
}

/// Replace a bean
pub async fn update_bean(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<Bean>,
) -> AppResult<Json<Bean>> {
    let service = BeanService::new(state.records);
    let bean = service.update(&id, input).await?;
    Ok(Json(bean))
}

/// Delete a bean
pub async fn delete_bean(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let service = BeanService::new(state.records);
    service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Log grams used without a full brew
pub async fn quick_decrement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<QuickDecrementInput>,
) -> AppResult<Json<InventoryChange>> {
    let service = BeanService::new(state.records);
    let change = service.quick_decrement(&id, input).await?;
    Ok(Json(change))
}

/// Correct the remaining amount
pub async fn adjust_remaining(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AdjustRemainingInput>,
) -> AppResult<Json<InventoryChange>> {
    let service = BeanService::new(state.records);
    let change = service.adjust_remaining(&id, input).await?;
    Ok(Json(change))
}

/// Download the inventory as CSV
pub async fn export_beans(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = BeanService::new(state.records);
    let csv = service.export_csv(local_today(state.utc_offset)).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"coffee-beans.csv\"",
            ),
        ],
        csv,
    ))
}
