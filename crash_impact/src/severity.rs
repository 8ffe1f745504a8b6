//! Shared classification rules. Every view derives tiers from here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// HIC severity tier, ordered from least to most severe.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    LowRisk,
    Moderate,
    HighRisk,
    Critical,
}

impl Severity {
    pub const CRITICAL_HIC: u32 = 800;
    pub const HIGH_RISK_HIC: u32 = 500;
    pub const MODERATE_HIC: u32 = 200;

    /// Thresholds are exclusive: 800 is High Risk, 801 is Critical.
    pub fn from_hic(hic: u32) -> Self {
        if hic > Self::CRITICAL_HIC {
            Severity::Critical
        } else if hic > Self::HIGH_RISK_HIC {
            Severity::HighRisk
        } else if hic > Self::MODERATE_HIC {
            Severity::Moderate
        } else {
            Severity::LowRisk
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::HighRisk => "High Risk",
            Severity::Moderate => "Moderate",
            Severity::LowRisk => "Low Risk",
        }
    }

    pub fn recovery_time(&self) -> &'static str {
        match self {
            Severity::Critical => "4-6 weeks",
            Severity::HighRisk => "2-3 weeks",
            Severity::Moderate => "1-2 weeks",
            Severity::LowRisk => "3-5 days",
        }
    }

    /// Display colour as RGB (red, amber, yellow, green).
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Severity::Critical => (239, 68, 68),
            Severity::HighRisk => (245, 158, 11),
            Severity::Moderate => (234, 179, 8),
            Severity::LowRisk => (34, 197, 94),
        }
    }

    /// Human-readable HIC band, e.g. "HIC 500-800".
    pub fn hic_band(&self) -> &'static str {
        match self {
            Severity::Critical => "HIC > 800",
            Severity::HighRisk => "HIC 500-800",
            Severity::Moderate => "HIC 200-500",
            Severity::LowRisk => "HIC <= 200",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn recovery_time(hic: u32) -> &'static str {
    Severity::from_hic(hic).recovery_time()
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum BricRisk {
    Low,
    Medium,
    High,
}

impl BricRisk {
    pub fn from_bric(bric: u32) -> Self {
        if bric > 300 {
            BricRisk::High
        } else if bric > 150 {
            BricRisk::Medium
        } else {
            BricRisk::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BricRisk::High => "High",
            BricRisk::Medium => "Medium",
            BricRisk::Low => "Low",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImpactClass {
    Light,
    Moderate,
    Severe,
}

impl ImpactClass {
    pub fn from_acceleration(acceleration_g: f64) -> Self {
        if acceleration_g > 80.0 {
            ImpactClass::Severe
        } else if acceleration_g > 50.0 {
            ImpactClass::Moderate
        } else {
            ImpactClass::Light
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactClass::Severe => "Severe",
            ImpactClass::Moderate => "Moderate",
            ImpactClass::Light => "Light",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_boundaries() {
        assert_eq!(Severity::from_hic(801), Severity::Critical);
        assert_eq!(Severity::from_hic(800), Severity::HighRisk);
        assert_eq!(Severity::from_hic(501), Severity::HighRisk);
        assert_eq!(Severity::from_hic(500), Severity::Moderate);
        assert_eq!(Severity::from_hic(201), Severity::Moderate);
        assert_eq!(Severity::from_hic(200), Severity::LowRisk);
        assert_eq!(Severity::from_hic(0), Severity::LowRisk);
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_hic(801).to_string(), "Critical");
        assert_eq!(Severity::from_hic(800).label(), "High Risk");
        assert_eq!(Severity::from_hic(500).label(), "Moderate");
        assert_eq!(Severity::from_hic(200).label(), "Low Risk");
        assert!(Severity::Critical > Severity::HighRisk);
        assert!(Severity::Moderate > Severity::LowRisk);
    }

    #[test]
    fn test_recovery_time_steps() {
        assert_eq!(recovery_time(1200), "4-6 weeks");
        assert_eq!(recovery_time(801), "4-6 weeks");
        assert_eq!(recovery_time(800), "2-3 weeks");
        assert_eq!(recovery_time(501), "2-3 weeks");
        assert_eq!(recovery_time(500), "1-2 weeks");
        assert_eq!(recovery_time(201), "1-2 weeks");
        assert_eq!(recovery_time(200), "3-5 days");
        assert_eq!(recovery_time(100), "3-5 days");
    }

    #[test]
    fn test_bric_and_impact_classes() {
        assert_eq!(BricRisk::from_bric(301), BricRisk::High);
        assert_eq!(BricRisk::from_bric(300), BricRisk::Medium);
        assert_eq!(BricRisk::from_bric(150), BricRisk::Low);
        assert_eq!(ImpactClass::from_acceleration(80.5), ImpactClass::Severe);
        assert_eq!(ImpactClass::from_acceleration(80.0), ImpactClass::Moderate);
        assert_eq!(ImpactClass::from_acceleration(50.0).label(), "Light");
    }
}
