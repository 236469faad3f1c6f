//! Derived, display-ready summaries over binding state.
//!
//! The console shows illustrative figures until real data arrives. Every
//! derived number is tagged with a [`DataSource`] so a caller can tell the
//! two apart; the fetch error, if any, is passed through untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::{
    ActivityPoint, AgentStatusResponse, AnalyticsSummary, HealthResponse, HourlyPoint,
    OrchestrationReport, SpeciesShare, ThreatEvent, WildlifeRecord, ZoneActivity,
};
use crate::error::FetchError;
use crate::registry::ResourceState;

pub const FALLBACK_ALERTS: usize = 3;
pub const FALLBACK_SPECIES: usize = 12;
pub const FALLBACK_RISK_SCORE: u32 = 35;
pub const ACTIVE_CAMERAS: usize = 8;
pub const AGENTS_WHEN_OPERATIONAL: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metric<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Metric<T> {
    fn live(value: T) -> Self {
        Self {
            value,
            source: DataSource::Live,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            source: DataSource::Fallback,
        }
    }

    fn from_option(value: Option<T>, fallback: T) -> Self {
        match value {
            Some(v) => Self::live(v),
            None => Self::fallback(fallback),
        }
    }
}

// ── Risk ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    High,
    Critical,
}

impl RiskLevel {
    /// Scores are clamped to 0..=100 first.
    pub fn from_score(score: u32) -> Self {
        match score.min(100) {
            70.. => RiskLevel::Critical,
            40.. => RiskLevel::High,
            _ => RiskLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Dashboard ───────────────────────────────────────────────────────────

/// The dashboard's metric cards and threat gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub active_alerts: Metric<usize>,
    pub species_detected: Metric<usize>,
    pub active_cameras: Metric<usize>,
    pub threats_identified: Metric<usize>,
    pub risk_score: Metric<u32>,
    pub risk_level: RiskLevel,
    pub agents_active: Metric<usize>,
}

impl DashboardMetrics {
    pub fn derive(
        wildlife: &ResourceState<Vec<WildlifeRecord>>,
        agent_status: &ResourceState<AgentStatusResponse>,
        orchestration: &ResourceState<OrchestrationReport>,
    ) -> Self {
        let report = orchestration.value.as_ref();
        let risk = report.and_then(|r| r.risk_assessment.as_ref());

        let risk_score =
            Metric::from_option(risk.map(|r| r.risk_score.min(100)), FALLBACK_RISK_SCORE);
        let threats_identified = Metric {
            value: if risk_score.value > 50 { 2 } else { 0 },
            source: risk_score.source,
        };
        let agents_active = match &agent_status.value {
            Some(status) if status.is_operational() => Metric::live(AGENTS_WHEN_OPERATIONAL),
            Some(_) => Metric::live(0),
            None => Metric::fallback(0),
        };

        Self {
            active_alerts: Metric::from_option(
                report.map(|r| r.movement_alerts.len()),
                FALLBACK_ALERTS,
            ),
            species_detected: Metric::from_option(
                wildlife.value.as_ref().map(Vec::len),
                FALLBACK_SPECIES,
            ),
            // No camera endpoint exists yet.
            active_cameras: Metric::fallback(ACTIVE_CAMERAS),
            threats_identified,
            risk_level: RiskLevel::from_score(risk_score.value),
            risk_score,
            agents_active,
        }
    }
}

/// Header connectivity indicator: a status was received and the last
/// health check did not fail.
pub fn is_online(health: &ResourceState<HealthResponse>) -> bool {
    health.error.is_none() && health.value.as_ref().is_some_and(|h| !h.status.is_empty())
}

// ── Analytics ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsView {
    pub summary: AnalyticsSummary,
    pub source: DataSource,
    pub error: Option<FetchError>,
}

impl AnalyticsView {
    pub fn from_state(state: &ResourceState<AnalyticsSummary>) -> Self {
        let (summary, source) = match &state.value {
            Some(summary) => (summary.clone(), DataSource::Live),
            None => (fallback_analytics(), DataSource::Fallback),
        };
        Self {
            summary,
            source,
            error: state.error.clone(),
        }
    }

    /// Export document: the summary plus provenance and export time.
    pub fn export(&self, exported_at: DateTime<Utc>) -> serde_json::Value {
        serde_json::json!({
            "activity_trends": self.summary.activity_trends,
            "hourly_pattern": self.summary.hourly_pattern,
            "species": self.summary.species,
            "threat_timeline": self.summary.threat_timeline,
            "heatmap": self.summary.heatmap,
            "source": self.source,
            "exported_at": exported_at.to_rfc3339(),
        })
    }
}

fn activity(date: &str, detections: u32, alerts: u32, threats: u32) -> ActivityPoint {
    ActivityPoint {
        date: date.into(),
        detections,
        alerts,
        threats,
    }
}

fn zone(location: &str, morning: u32, afternoon: u32, evening: u32, night: u32) -> ZoneActivity {
    ZoneActivity {
        location: location.into(),
        morning,
        afternoon,
        evening,
        night,
    }
}

fn threat(id: u32, time: &str, date: &str, kind: &str, severity: &str, location: &str, description: &str) -> ThreatEvent {
    ThreatEvent {
        id,
        time: time.into(),
        date: date.into(),
        kind: kind.into(),
        severity: severity.into(),
        location: location.into(),
        description: description.into(),
    }
}

/// Illustrative analytics shown before the backend has answered.
pub fn fallback_analytics() -> AnalyticsSummary {
    AnalyticsSummary {
        activity_trends: vec![
            activity("Mon", 12, 2, 1),
            activity("Tue", 19, 5, 2),
            activity("Wed", 15, 3, 1),
            activity("Thu", 25, 7, 3),
            activity("Fri", 22, 4, 2),
            activity("Sat", 30, 6, 4),
            activity("Sun", 28, 8, 3),
        ],
        hourly_pattern: [
            ("00", 2), ("02", 1), ("04", 3), ("06", 8), ("08", 12), ("10", 15),
            ("12", 18), ("14", 20), ("16", 22), ("18", 25), ("20", 18), ("22", 10),
        ]
        .into_iter()
        .map(|(hour, detections)| HourlyPoint {
            hour: hour.into(),
            detections,
        })
        .collect(),
        species: [("Rhino", 45), ("Elephant", 30), ("Lion", 15), ("Leopard", 10)]
            .into_iter()
            .map(|(name, value)| SpeciesShare {
                name: name.into(),
                value,
            })
            .collect(),
        threat_timeline: vec![
            threat(1, "14:30", "Today", "Movement Anomaly", "high", "Northern Ridge",
                "Sudden speed drop detected in RH001"),
            threat(2, "12:15", "Today", "Hotspot Activity", "critical", "Eastern Valley",
                "Unauthorized vehicle detected near water source"),
            threat(3, "09:45", "Yesterday", "Behavioral Change", "medium", "Central Plains",
                "Unusual clustering behavior observed"),
        ],
        heatmap: vec![
            zone("Northern Ridge", 85, 92, 78, 45),
            zone("Eastern Valley", 65, 88, 95, 72),
            zone("Central Plains", 45, 55, 48, 32),
            zone("Southern Border", 78, 85, 90, 68),
        ],
    }
}
