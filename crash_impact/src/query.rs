//! Read-only views over a dataset: filtering, sorting, per-rider and per-team
//! aggregates. All functions are total and leave their input untouched.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::severity::Severity;
use crate::{CrashError, CrashEvent, Rider, Team};

/// Race selection plus free-text search, as applied by the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrashFilter {
    pub race: Option<String>,
    pub search: String,
}

impl CrashFilter {
    pub fn for_race(race: impl Into<String>) -> Self {
        Self {
            race: Some(race.into()),
            search: String::new(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn matches(&self, crash: &CrashEvent) -> bool {
        self.matches_race(crash) && matches_text(crash, &self.search.to_lowercase())
    }

    fn matches_race(&self, crash: &CrashEvent) -> bool {
        self.race.as_deref().map_or(true, |race| crash.race == race)
    }
}

fn matches_text(crash: &CrashEvent, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [
        crash.rider.name.as_str(),
        crash.location.as_str(),
        crash.team.as_str(),
        crash.race.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

pub fn filter_crashes<'a, I>(crashes: I, filter: &CrashFilter) -> Vec<&'a CrashEvent>
where
    I: IntoIterator<Item = &'a CrashEvent>,
{
    let needle = filter.search.to_lowercase();
    crashes
        .into_iter()
        .filter(|crash| filter.matches_race(crash) && matches_text(crash, &needle))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Rider,
    Team,
    Hic,
    Bric,
    Acceleration,
    Location,
    Distance,
    Race,
    Date,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Rider => "rider",
            SortKey::Team => "team",
            SortKey::Hic => "hic",
            SortKey::Bric => "bric",
            SortKey::Acceleration => "acceleration",
            SortKey::Location => "location",
            SortKey::Distance => "distance",
            SortKey::Race => "race",
            SortKey::Date => "date",
        }
    }

    pub fn compare(&self, a: &CrashEvent, b: &CrashEvent) -> Ordering {
        match self {
            SortKey::Rider => compare_text(&a.rider.name, &b.rider.name),
            SortKey::Team => compare_text(&a.team, &b.team),
            SortKey::Hic => a.hic.cmp(&b.hic),
            SortKey::Bric => a.bric.cmp(&b.bric),
            SortKey::Acceleration => OrderedFloat(a.acceleration).cmp(&OrderedFloat(b.acceleration)),
            SortKey::Location => compare_text(&a.location, &b.location),
            SortKey::Distance => OrderedFloat(a.km).cmp(&OrderedFloat(b.km)),
            SortKey::Race => compare_text(&a.race, &b.race),
            SortKey::Date => a.date.cmp(&b.date),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = CrashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rider" | "name" | "cyclist" => Ok(SortKey::Rider),
            "team" => Ok(SortKey::Team),
            "hic" => Ok(SortKey::Hic),
            "bric" => Ok(SortKey::Bric),
            "acceleration" | "accel" => Ok(SortKey::Acceleration),
            "location" => Ok(SortKey::Location),
            "distance" | "km" => Ok(SortKey::Distance),
            "race" => Ok(SortKey::Race),
            "date" => Ok(SortKey::Date),
            other => Err(CrashError::UnknownSortKey(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Primary collation key: canonical decomposition with combining marks
/// dropped, then lowercased, so "Émile" files next to "Emile" under E.
fn collation_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Accent- and case-insensitive comparison first, raw text as the tie-breaker,
/// so "alpe" and "Alpe" sit together but still order deterministically.
fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Stable in both directions: equal keys keep their incoming order.
pub fn sort_crashes(crashes: &mut [&CrashEvent], key: SortKey, direction: SortDirection) {
    crashes.sort_by(|a, b| direction.apply(key.compare(a, b)));
}

#[derive(Clone, Debug)]
pub struct RiderSummary<'a> {
    pub rider: &'a Rider,
    pub team: &'a str,
    pub crashes: Vec<&'a CrashEvent>,
    pub max_hic: u32,
    pub max_bric: u32,
    pub max_acceleration: f64,
    pub total_crashes: usize,
}

impl<'a> RiderSummary<'a> {
    fn new(crash: &'a CrashEvent) -> Self {
        Self {
            rider: &crash.rider,
            team: &crash.team,
            crashes: Vec::new(),
            max_hic: 0,
            max_bric: 0,
            max_acceleration: 0.0,
            total_crashes: 0,
        }
    }

    fn absorb(&mut self, crash: &'a CrashEvent) {
        self.crashes.push(crash);
        self.max_hic = self.max_hic.max(crash.hic);
        self.max_bric = self.max_bric.max(crash.bric);
        self.max_acceleration = self.max_acceleration.max(crash.acceleration);
        self.total_crashes += 1;
    }

    pub fn severity(&self) -> Severity {
        Severity::from_hic(self.max_hic)
    }

    /// The crash with the highest HIC; the earliest one wins ties.
    pub fn worst_crash(&self) -> Option<&'a CrashEvent> {
        self.crashes.iter().copied().rev().max_by_key(|crash| crash.hic)
    }

    /// This rider's crashes, most severe first.
    pub fn crashes_by_hic(&self) -> Vec<&'a CrashEvent> {
        let mut crashes = self.crashes.clone();
        sort_crashes(&mut crashes, SortKey::Hic, SortDirection::Descending);
        crashes
    }
}

/// Fold crashes into per-rider aggregates, in order of each rider's first crash.
pub fn group_by_rider<'a, I>(crashes: I) -> Vec<RiderSummary<'a>>
where
    I: IntoIterator<Item = &'a CrashEvent>,
{
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut riders: Vec<RiderSummary<'a>> = Vec::new();
    for crash in crashes {
        let slot = *slots.entry(crash.rider.id.as_str()).or_insert_with(|| {
            riders.push(RiderSummary::new(crash));
            riders.len() - 1
        });
        riders[slot].absorb(crash);
    }
    riders
}

/// Most severe rider first (by max HIC); ties keep their incoming order.
pub fn rank_riders(mut riders: Vec<RiderSummary<'_>>) -> Vec<RiderSummary<'_>> {
    riders.sort_by(|a, b| b.max_hic.cmp(&a.max_hic));
    riders
}

/// Keep riders whose name or team contains `search`, ignoring case.
pub fn search_riders<'a>(riders: Vec<RiderSummary<'a>>, search: &str) -> Vec<RiderSummary<'a>> {
    let needle = search.to_lowercase();
    riders
        .into_iter()
        .filter(|summary| {
            summary.rider.name.to_lowercase().contains(&needle)
                || summary.team.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct TeamStats<'a> {
    pub team: &'a Team,
    pub crashes: Vec<&'a CrashEvent>,
    pub crash_count: usize,
    pub avg_hic: f64,
    pub max_hic: u32,
    pub critical_crashes: usize,
}

impl<'a> TeamStats<'a> {
    fn collect(team: &'a Team, all: &[&'a CrashEvent]) -> Self {
        let crashes: Vec<&CrashEvent> = all
            .iter()
            .copied()
            .filter(|crash| crash.team == team.name)
            .collect();
        let crash_count = crashes.len();
        let avg_hic = if crash_count > 0 {
            crashes.iter().map(|c| f64::from(c.hic)).sum::<f64>() / crash_count as f64
        } else {
            0.0
        };
        let max_hic = crashes.iter().map(|c| c.hic).max().unwrap_or(0);
        let critical_crashes = crashes
            .iter()
            .filter(|c| c.severity() == Severity::Critical)
            .count();
        Self {
            team,
            crashes,
            crash_count,
            avg_hic,
            max_hic,
            critical_crashes,
        }
    }
}

/// Per-team statistics in roster order. Teams without crashes report zeros.
pub fn team_statistics<'a, I>(teams: &'a [Team], crashes: I) -> Vec<TeamStats<'a>>
where
    I: IntoIterator<Item = &'a CrashEvent>,
{
    let all: Vec<&CrashEvent> = crashes.into_iter().collect();
    teams
        .iter()
        .map(|team| TeamStats::collect(team, &all))
        .collect()
}

/// Most crashes first; ties keep roster order.
pub fn rank_teams(mut stats: Vec<TeamStats<'_>>) -> Vec<TeamStats<'_>> {
    stats.sort_by(|a, b| b.crash_count.cmp(&a.crash_count));
    stats
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high_risk: usize,
    pub moderate: usize,
    pub low_risk: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.critical + self.high_risk + self.moderate + self.low_risk
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::HighRisk => self.high_risk,
            Severity::Moderate => self.moderate,
            Severity::LowRisk => self.low_risk,
        }
    }

    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::HighRisk => self.high_risk += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::LowRisk => self.low_risk += 1,
        }
    }
}

pub fn severity_counts<'a, I>(crashes: I) -> SeverityCounts
where
    I: IntoIterator<Item = &'a CrashEvent>,
{
    crashes
        .into_iter()
        .fold(SeverityCounts::default(), |mut counts, crash| {
            counts.add(crash.severity());
            counts
        })
}

/// Distinct races in order of first appearance.
pub fn races_in<'a, I>(crashes: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a CrashEvent>,
{
    let mut races: Vec<&str> = Vec::new();
    for crash in crashes {
        if !races.contains(&crash.race.as_str()) {
            races.push(&crash.race);
        }
    }
    races
}

/// The race a dashboard selects before the user picks one.
pub fn default_race<'a, I>(crashes: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a CrashEvent>,
{
    races_in(crashes).into_iter().next()
}
