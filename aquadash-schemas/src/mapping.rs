use serde::{Deserialize, Serialize};

/// Canonical column names consumed by the engines. Ingest renames source
/// headers to these; everything downstream is blind to the source layout.
pub mod canonical {
    pub const DATE: &str = "Date";
    pub const WORKER: &str = "WorkerName";
    pub const WATER_WORKER: &str = "WorkerName_Water";
    pub const BLOCK: &str = "Block";
    pub const TANK: &str = "Tank";
    pub const SCHEDULED_FEED_G: &str = "ScheduledFeed_day_g";
    pub const ACTUAL_FEED_G: &str = "ActualFeed_day_g";
    pub const DEAD_COUNT: &str = "DeadCount_day";
    pub const DEAD_WEIGHT_G: &str = "DeadWeight_g";
    pub const INITIAL_COUNT: &str = "InitialCount";
    pub const LIVE_COUNT: &str = "LiveCount";
    pub const WATER_TEMP: &str = "WaterTemperature";
    pub const ROOM_TEMP: &str = "RoomTemperature";
    pub const HUMIDITY: &str = "Humidity";
    pub const SALINITY: &str = "Salinity";
    pub const PH: &str = "pH";
}

/// Source-header to canonical-name mapping for one spreadsheet layout.
///
/// The mapping is an explicit, validated structure instead of ad-hoc rename
/// dictionaries: a layout declares every column it provides, and
/// [`ColumnMapping::missing_columns`] reports the complete set of required
/// canonical columns a file fails to supply so the caller can abort with one
/// actionable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub entries: Vec<MappingEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingEntry {
    pub source: String,
    pub canonical: String,
}

impl ColumnMapping {
    /// Mapping for the consolidated tank/block daily report format.
    pub fn consolidated_report() -> Self {
        let table = [
            ("Date", canonical::DATE),
            ("Worker Name", canonical::WORKER),
            ("Worker Name_water", canonical::WATER_WORKER),
            ("Block", canonical::BLOCK),
            ("Tank No.", canonical::TANK),
            ("Scheduled Feed (g)", canonical::SCHEDULED_FEED_G),
            ("Adjusted Feed (g)", canonical::ACTUAL_FEED_G),
            ("Dead Shrimp Count", canonical::DEAD_COUNT),
            ("Dead Shrimp Weight (g)", canonical::DEAD_WEIGHT_G),
            ("InitialCount", canonical::INITIAL_COUNT),
            ("LiveCount", canonical::LIVE_COUNT),
            ("Water Temperature", canonical::WATER_TEMP),
            ("Room Temperature", canonical::ROOM_TEMP),
            ("Humidity", canonical::HUMIDITY),
            ("Salinity (ppt)", canonical::SALINITY),
            ("pH Value", canonical::PH),
        ];
        Self {
            entries: table
                .iter()
                .map(|(source, canonical)| MappingEntry {
                    source: (*source).to_string(),
                    canonical: (*canonical).to_string(),
                })
                .collect(),
        }
    }

    /// Canonical columns that must be present for the engines to run.
    /// The two worker columns and the room-climate columns are optional.
    pub fn required() -> Vec<&'static str> {
        vec![
            canonical::DATE,
            canonical::BLOCK,
            canonical::TANK,
            canonical::SCHEDULED_FEED_G,
            canonical::ACTUAL_FEED_G,
            canonical::DEAD_COUNT,
            canonical::DEAD_WEIGHT_G,
            canonical::INITIAL_COUNT,
            canonical::LIVE_COUNT,
            canonical::WATER_TEMP,
            canonical::SALINITY,
            canonical::PH,
        ]
    }

    /// Resolves a source header to its canonical name, passing through
    /// headers that are already canonical.
    pub fn canonical_for(&self, source_header: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.source == source_header || e.canonical == source_header)
            .map(|e| e.canonical.as_str())
    }

    /// Every required canonical column the given headers fail to supply,
    /// in required-column order.
    pub fn missing_columns(&self, headers: &[String]) -> Vec<String> {
        let mapped: Vec<&str> = headers
            .iter()
            .filter_map(|h| self.canonical_for(h))
            .collect();
        Self::required()
            .into_iter()
            .filter(|required| !mapped.contains(required))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn full_source_layout_has_no_missing_columns() {
        let mapping = ColumnMapping::consolidated_report();
        let all: Vec<String> = mapping.entries.iter().map(|e| e.source.clone()).collect();
        assert!(mapping.missing_columns(&all).is_empty());
    }

    #[test]
    fn reports_every_missing_column_not_just_the_first() {
        let mapping = ColumnMapping::consolidated_report();
        let partial = headers(&["Date", "Block", "Tank No.", "Scheduled Feed (g)"]);
        let missing = mapping.missing_columns(&partial);
        assert!(missing.contains(&"ActualFeed_day_g".to_string()));
        assert!(missing.contains(&"pH".to_string()));
        assert!(missing.contains(&"Salinity".to_string()));
        assert_eq!(missing.len(), 8);
    }

    #[test]
    fn canonical_headers_pass_through() {
        let mapping = ColumnMapping::consolidated_report();
        assert_eq!(mapping.canonical_for("pH"), Some("pH"));
        assert_eq!(mapping.canonical_for("pH Value"), Some("pH"));
        assert_eq!(mapping.canonical_for("Secchi Depth"), None);
    }
}
