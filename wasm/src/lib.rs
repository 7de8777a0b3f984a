//! WebAssembly module for the coffee tracker
//!
//! Runs the shared derivations in the browser on the same JSON records the
//! server stores:
//! - Freshness phases and bean list sorting/filtering
//! - Consumption totals and the statistics snapshot
//! - Depletion projection
//!
//! Every entry point takes and returns JSON strings. Records that fail to
//! parse are skipped with a console warning instead of failing the call.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::{
    aggregate_consumption, calculate_freshness, compose_statistics, estimate_depletion,
    local_date, price_per_gram, sort_beans, Bean, BeanFilter, BeanSelector, BrewingNote,
    ConsumptionQuery, DayCountMode, Language, Quantity, SortKey, StatisticsOptions, TimeWindow,
};

#[cfg(target_arch = "wasm32")]
fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn console_warn(_message: &str) {}

fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

/// Minutes east of UTC as a fixed offset, falling back to UTC
fn offset(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            console_warn(&format!("UTC offset out of range: {} minutes", minutes));
            Utc.fix()
        })
}

fn parse_today(today: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", today, e))
}

/// Parse a JSON array element by element, skipping what does not fit
fn parse_records<T: DeserializeOwned>(json: &str, what: &str) -> Result<Vec<T>, String> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))?;

    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                console_warn(&format!("Skipping malformed {} record: {}", what, e));
                None
            }
        })
        .collect())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn freshness_json(bean_json: &str, today: &str) -> Result<String, String> {
    let bean: Bean =
        serde_json::from_str(bean_json).map_err(|e| format!("Invalid bean JSON: {}", e))?;
    to_json(&calculate_freshness(&bean, parse_today(today)?))
}

fn sort_json(beans_json: &str, sort_key: &str, today: &str) -> Result<String, String> {
    let beans: Vec<Bean> = parse_records(beans_json, "bean")?;
    let key: SortKey = sort_key.parse()?;
    to_json(&sort_beans(&beans, key, parse_today(today)?))
}

fn filter_list_json(beans_json: &str, filter_json: &str, today: &str) -> Result<String, String> {
    let beans: Vec<Bean> = parse_records(beans_json, "bean")?;
    let filter: BeanFilter =
        serde_json::from_str(filter_json).map_err(|e| format!("Invalid filter JSON: {}", e))?;
    to_json(&filter.apply(&beans, parse_today(today)?))
}

fn statistics_json(
    beans_json: &str,
    notes_json: &str,
    today: &str,
    utc_offset_minutes: i32,
    exclude_empty: bool,
    english: bool,
) -> Result<String, String> {
    let beans: Vec<Bean> = parse_records(beans_json, "bean")?;
    let notes: Vec<BrewingNote> = parse_records(notes_json, "note")?;
    let options = StatisticsOptions {
        today: parse_today(today)?,
        utc_offset: offset(utc_offset_minutes),
        exclude_empty,
        language: if english {
            Language::English
        } else {
            Language::Chinese
        },
    };
    to_json(&compose_statistics(&beans, &notes, &options))
}

#[derive(Serialize)]
struct ConsumptionResult {
    grams: Decimal,
    cost: Decimal,
    actual_days: i64,
    daily_average: Decimal,
    daily_cost: Decimal,
}

fn consumption_json(
    notes_json: &str,
    beans_json: &str,
    selector_json: &str,
    window: &str,
    mode: &str,
    now_ms: i64,
    utc_offset_minutes: i32,
) -> Result<String, String> {
    let notes: Vec<BrewingNote> = parse_records(notes_json, "note")?;
    let beans: Vec<Bean> = parse_records(beans_json, "bean")?;
    let selector: BeanSelector = if selector_json.trim().is_empty() {
        BeanSelector::All
    } else {
        serde_json::from_str(selector_json)
            .map_err(|e| format!("Invalid selector JSON: {}", e))?
    };
    let window: TimeWindow = window.parse()?;
    let mode: DayCountMode = mode.parse()?;

    let query = ConsumptionQuery::new(selector, window, now_ms)
        .with_offset(offset(utc_offset_minutes));
    let summary = aggregate_consumption(&notes, &beans, &query);

    to_json(&ConsumptionResult {
        grams: summary.total.grams,
        cost: summary.total.cost.round_dp(2),
        actual_days: summary.actual_days(mode),
        daily_average: summary.daily_average(mode).round_dp(2),
        daily_cost: summary.daily_cost(mode).round_dp(2),
    })
}

fn depletion_text(remaining: f64, daily_rate: f64, today: &str) -> Result<String, String> {
    let remaining = Decimal::try_from(remaining).unwrap_or(Decimal::ZERO);
    let daily_rate = Decimal::try_from(daily_rate).unwrap_or(Decimal::ZERO);
    Ok(estimate_depletion(remaining, daily_rate, parse_today(today)?).to_string())
}

fn unit_price(price: &str, capacity: &str) -> f64 {
    let mut bean = Bean::new("", "", 0);
    bean.price = Some(Quantity::parse(price));
    bean.capacity = Some(Quantity::parse(capacity));
    price_per_gram(&bean).to_f64().unwrap_or(0.0)
}

/// Freshness phase and day counts of one bean
#[wasm_bindgen]
pub fn bean_freshness(bean_json: &str, today: &str) -> Result<String, JsValue> {
    freshness_json(bean_json, today).map_err(|e| JsValue::from_str(&e))
}

/// Sorted copy of a bean list (`sort_key` as in `name_asc`, `freshness_desc`)
#[wasm_bindgen]
pub fn sort_bean_list(beans_json: &str, sort_key: &str, today: &str) -> Result<String, JsValue> {
    sort_json(beans_json, sort_key, today).map_err(|e| JsValue::from_str(&e))
}

/// Beans passing a filter, in input order
#[wasm_bindgen]
pub fn filter_bean_list(
    beans_json: &str,
    filter_json: &str,
    today: &str,
) -> Result<String, JsValue> {
    filter_list_json(beans_json, filter_json, today).map_err(|e| JsValue::from_str(&e))
}

/// Full statistics snapshot
#[wasm_bindgen]
pub fn statistics_snapshot(
    beans_json: &str,
    notes_json: &str,
    today: &str,
    utc_offset_minutes: i32,
    exclude_empty: bool,
    english: bool,
) -> Result<String, JsValue> {
    statistics_json(
        beans_json,
        notes_json,
        today,
        utc_offset_minutes,
        exclude_empty,
        english,
    )
    .map_err(|e| JsValue::from_str(&e))
}

/// Consumption totals as of now; an empty selector selects every note
#[wasm_bindgen]
pub fn consumption_summary(
    notes_json: &str,
    beans_json: &str,
    selector_json: &str,
    window: &str,
    mode: &str,
    utc_offset_minutes: i32,
) -> Result<String, JsValue> {
    consumption_json(
        notes_json,
        beans_json,
        selector_json,
        window,
        mode,
        now_ms(),
        utc_offset_minutes,
    )
    .map_err(|e| JsValue::from_str(&e))
}

/// Depletion label such as "2024-06-05 (this week)"
#[wasm_bindgen]
pub fn depletion_label(remaining: f64, daily_rate: f64, today: &str) -> Result<String, JsValue> {
    depletion_text(remaining, daily_rate, today).map_err(|e| JsValue::from_str(&e))
}

/// Price per gram from the raw price and capacity fields
#[wasm_bindgen]
pub fn price_per_gram_of(price: &str, capacity: &str) -> f64 {
    unit_price(price, capacity)
}

/// Today's date at the given offset, as `YYYY-MM-DD`
#[wasm_bindgen]
pub fn local_today(utc_offset_minutes: i32) -> String {
    local_date(now_ms(), offset(utc_offset_minutes))
        .format("%Y-%m-%d")
        .to_string()
}
