//! Synthetic crash-impact telemetry for professional cycling.
//!
//! Builds a fixed roster of teams and riders, simulates crash events with
//! acceleration waveforms, and exposes the read-only aggregations a dashboard
//! renders (filters, sorting, per-rider and per-team summaries, CSV reports).

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub mod generate;
pub mod query;
pub mod report;
pub mod roster;
pub mod severity;
pub mod store;
pub mod waveform;

pub use generate::{generate_dataset, GeneratorConfig};
pub use query::{
    default_race, filter_crashes, group_by_rider, rank_riders, rank_teams, races_in,
    search_riders, severity_counts, sort_crashes, team_statistics, CrashFilter, RiderSummary,
    SeverityCounts, SortDirection, SortKey, TeamStats,
};
pub use report::{report_file_name, team_report_csv, write_team_report};
pub use severity::{recovery_time, BricRisk, ImpactClass, Severity};
pub use store::DatasetStore;
pub use waveform::{realized_peak, synthesize_waveform, Phase, WaveformSample};

#[derive(Error, Debug)]
pub enum CrashError {
    #[error("failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV report was not valid UTF-8")]
    ReportEncoding,
    #[error("unknown sort key: {0}")]
    UnknownSortKey(String),
    #[error("no crash with id {0}")]
    UnknownCrash(String),
    #[error("no team named {0}")]
    UnknownTeam(String),
    #[error("no crashes recorded for rider {0}")]
    UnknownRider(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Rider {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub team: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub country: String,
    pub riders: Vec<Rider>,
}

/// One simulated impact. `rider` and `team` are copies taken at generation time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrashEvent {
    pub id: String,
    pub rider: Rider,
    pub team: String,
    pub hic: u32,
    pub bric: u32,
    /// Peak acceleration in g.
    pub acceleration: f64,
    pub location: String,
    /// Distance marker along the race route, in km.
    pub km: f64,
    pub race: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "accelerationData")]
    pub waveform: Vec<WaveformSample>,
}

impl CrashEvent {
    pub fn severity(&self) -> Severity {
        Severity::from_hic(self.hic)
    }

    pub fn recovery_time(&self) -> &'static str {
        recovery_time(self.hic)
    }

    pub fn bric_risk(&self) -> BricRisk {
        BricRisk::from_bric(self.bric)
    }

    pub fn impact_class(&self) -> ImpactClass {
        ImpactClass::from_acceleration(self.acceleration)
    }

    /// Highest sample of the recorded waveform, which only approximates `acceleration`.
    pub fn realized_peak(&self) -> Option<WaveformSample> {
        realized_peak(&self.waveform)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub teams: Vec<Team>,
    pub crashes: Vec<CrashEvent>,
}

impl Dataset {
    pub fn crash(&self, id: &str) -> Option<&CrashEvent> {
        self.crashes.iter().find(|crash| crash.id == id)
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.name == name)
    }

    pub fn rider_count(&self) -> usize {
        self.teams.iter().map(|team| team.riders.len()).sum()
    }

    /// SHA-256 over the JSON encoding; equal datasets share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, CrashError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(sha256_hex(&bytes))
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
