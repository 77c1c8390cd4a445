use serde::{Deserialize, Serialize};

/// Two nested inclusive ranges for a continuous water-quality parameter.
///
/// A reading inside `[ideal_min, ideal_max]` is in the ideal band, a reading
/// inside `[accept_min, accept_max]` (which must contain the ideal band) is
/// merely acceptable, and anything beyond is out of range. Both edges of both
/// ranges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub ideal_min: f64,
    pub ideal_max: f64,
    pub accept_min: f64,
    pub accept_max: f64,
}

impl Band {
    pub fn new(ideal_min: f64, ideal_max: f64, accept_min: f64, accept_max: f64) -> Self {
        Self {
            ideal_min,
            ideal_max,
            accept_min,
            accept_max,
        }
    }

    /// Ideal band plus a symmetric warning margin on both sides.
    pub fn with_margin(ideal_min: f64, ideal_max: f64, margin: f64) -> Self {
        Self {
            ideal_min,
            ideal_max,
            accept_min: ideal_min - margin,
            accept_max: ideal_max + margin,
        }
    }

    pub fn in_ideal(&self, value: f64) -> bool {
        value >= self.ideal_min && value <= self.ideal_max
    }

    pub fn in_accept(&self, value: f64) -> bool {
        value >= self.accept_min && value <= self.accept_max
    }
}

/// One-sided band for daily dead counts. `count <= warn_above` is normal,
/// `count <= critical_above` warns, anything higher is critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountBand {
    pub warn_above: u32,
    pub critical_above: u32,
}

/// A named, versioned set of threshold bands.
///
/// The site revised its bands several times (pH ideal band moved, the
/// mortality ceiling tightened), so thresholds are configuration injected
/// into the classifier rather than constants: each revision is a policy
/// value, selectable by name and loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub name: String,
    pub ph: Band,
    pub salinity: Band,
    pub water_temp: Band,
    pub mortality: CountBand,
    /// Wider bands used for the 100/80/50 performance scores, not for
    /// risk classification.
    pub ph_scoring: Band,
    pub salinity_scoring: Band,
}

/// Name of the policy revision used when none is selected.
pub const DEFAULT_POLICY: &str = "site-2026-01";

impl RiskPolicy {
    /// First consolidated-report revision: narrow pH ideal band.
    ///
    /// pH edges are spelled out rather than derived from a margin so the
    /// documented boundaries hold exactly under f64 comparison.
    pub fn site_2025_11() -> Self {
        Self {
            name: "site-2025-11".to_string(),
            ph: Band::new(7.7, 8.0, 7.6, 8.1),
            salinity: Band::with_margin(25.0, 30.0, 1.0),
            water_temp: Band::with_margin(28.0, 30.0, 1.0),
            mortality: CountBand {
                warn_above: 4,
                critical_above: 5,
            },
            ph_scoring: Band::new(7.7, 8.0, 7.5, 8.2),
            salinity_scoring: Band::new(25.0, 30.0, 23.0, 33.0),
        }
    }

    /// Mid revision: pH ideal band raised to [8.0, 8.3], lenient mortality
    /// ceiling.
    pub fn site_2025_12() -> Self {
        Self {
            name: "site-2025-12".to_string(),
            ph: Band::new(8.0, 8.3, 7.9, 8.4),
            salinity: Band::with_margin(25.0, 30.0, 1.0),
            water_temp: Band::with_margin(28.0, 30.0, 1.0),
            mortality: CountBand {
                warn_above: 4,
                critical_above: 6,
            },
            ph_scoring: Band::new(8.0, 8.3, 7.8, 8.5),
            salinity_scoring: Band::new(25.0, 30.0, 23.0, 33.0),
        }
    }

    /// Current revision: widened pH ideal band [7.6, 8.3], mortality
    /// critical above 5 again.
    pub fn site_2026_01() -> Self {
        Self {
            name: "site-2026-01".to_string(),
            ph: Band::new(7.6, 8.3, 7.5, 8.4),
            salinity: Band::with_margin(25.0, 30.0, 1.0),
            water_temp: Band::with_margin(28.0, 30.0, 1.0),
            mortality: CountBand {
                warn_above: 4,
                critical_above: 5,
            },
            ph_scoring: Band::new(7.6, 8.3, 7.4, 8.5),
            salinity_scoring: Band::new(25.0, 30.0, 23.0, 33.0),
        }
    }

    pub fn builtin_revisions() -> Vec<RiskPolicy> {
        vec![
            Self::site_2025_11(),
            Self::site_2025_12(),
            Self::site_2026_01(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_band_extends_both_edges() {
        let band = Band::with_margin(25.0, 30.0, 1.0);
        assert_eq!(band.accept_min, 24.0);
        assert_eq!(band.accept_max, 31.0);
        assert!(band.in_ideal(25.0));
        assert!(band.in_ideal(30.0));
        assert!(!band.in_ideal(30.5));
        assert!(band.in_accept(30.5));
    }

    #[test]
    fn ph_accept_edges_are_exact() {
        let band = RiskPolicy::site_2026_01().ph;
        assert!(band.in_ideal(7.6));
        assert!(band.in_ideal(8.3));
        assert!(!band.in_ideal(8.35));
        assert!(band.in_accept(8.35));
        assert!(band.in_accept(8.4));
        assert!(!band.in_accept(8.45));
    }

    #[test]
    fn builtin_revisions_carry_distinct_ph_bands() {
        let revisions = RiskPolicy::builtin_revisions();
        assert_eq!(revisions.len(), 3);
        let ideal_bands: Vec<(f64, f64)> = revisions
            .iter()
            .map(|p| (p.ph.ideal_min, p.ph.ideal_max))
            .collect();
        assert_eq!(ideal_bands, vec![(7.7, 8.0), (8.0, 8.3), (7.6, 8.3)]);
    }

    #[test]
    fn default_policy_is_a_builtin() {
        assert!(RiskPolicy::builtin_revisions()
            .iter()
            .any(|p| p.name == DEFAULT_POLICY));
    }
}
