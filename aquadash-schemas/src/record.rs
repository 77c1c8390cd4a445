use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily log row for a (date, block, tank) unit.
///
/// Sensor readings are optional on purpose: an absent pH or salinity reading
/// stays absent and is excluded from classification and compliance
/// denominators downstream. Feed masses and mortality counts default to zero
/// at ingest when the cell is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub block: String,
    pub tank: String,
    pub worker: Option<String>,
    /// The water-quality crew logs separately from the feeding crew.
    pub water_worker: Option<String>,

    pub ph: Option<f64>,
    pub salinity_ppt: Option<f64>,
    pub water_temp_c: Option<f64>,
    pub room_temp_c: Option<f64>,
    pub humidity_pct: Option<f64>,

    pub scheduled_feed_g: f64,
    pub actual_feed_g: f64,

    pub initial_count: u32,
    pub live_count: u32,
    pub dead_count: u32,
    pub dead_weight_g: f64,
}

impl DailyRecord {
    /// Whether any classifiable water-quality reading is present.
    pub fn has_water_data(&self) -> bool {
        self.ph.is_some() || self.salinity_ppt.is_some() || self.water_temp_c.is_some()
    }
}

/// One average-body-weight survey row, taken per tank on sampling days.
///
/// The size-class weights (small/medium/large animals from the same dip net)
/// feed the growth-uniformity estimate; they are frequently absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSample {
    pub date: NaiveDate,
    pub block: String,
    pub tank: String,
    pub avg_weight_g: Option<f64>,
    pub small_weight_g: Option<f64>,
    pub medium_weight_g: Option<f64>,
    pub large_weight_g: Option<f64>,
}
