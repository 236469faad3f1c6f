//! Typed payloads for the WildGuard REST API.
//!
//! Fields the backend may omit are `#[serde(default)]`; unknown fields are
//! ignored so the console keeps working against newer backends.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Health
// ============================================================================

/// `GET /api/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

// ============================================================================
// Tracking data
// ============================================================================

/// One GPS fix from `GET /api/data` (the endpoint returns a list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildlifeRecord {
    pub rhino_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timestamp_utc: Option<String>,
    #[serde(default)]
    pub speed_kmh: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub status: Option<AnimalStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalStatus {
    Safe,
    Warning,
    Danger,
}

/// `GET /api/hotspots`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HotspotsResponse {
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub last_incident: Option<String>,
}

// ============================================================================
// Agents
// ============================================================================

/// `GET /api/agents/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentStatusResponse {
    pub status: String,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub setup_instructions: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl AgentStatusResponse {
    pub fn is_operational(&self) -> bool {
        self.status == "operational"
    }

    /// Dashboard status text: the agent flavour when operational, "Offline" otherwise.
    pub fn label(&self) -> &'static str {
        match (self.is_operational(), self.agent_type.as_deref()) {
            (true, Some("groq")) => "Groq AI Active",
            (true, _) => "Simulated",
            (false, _) => "Offline",
        }
    }
}

// ============================================================================
// Movement analysis & orchestration
// ============================================================================

/// Request body for `POST /api/movement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub data: Vec<WildlifeRecord>,
}

/// `POST /api/movement`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MovementReport {
    #[serde(default)]
    pub movement_alerts: Vec<MovementAlert>,
    #[serde(default)]
    pub total_alerts: usize,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementAlert {
    pub rhino_id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub observed_metric: Option<String>,
    #[serde(default)]
    pub reason: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
}

impl MovementAlert {
    /// Reasons joined for display, `sudden_speed_drop` → `sudden speed drop`.
    pub fn reason_text(&self) -> String {
        self.reason.join(", ").replace('_', " ")
    }

    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

/// `POST /api/orchestrate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OrchestrationReport {
    #[serde(default)]
    pub movement_alerts: Vec<MovementAlert>,
    #[serde(default)]
    pub vision_findings: Vec<Value>,
    #[serde(default)]
    pub risk_assessment: Option<RiskAssessment>,
    #[serde(default)]
    pub ranger_report: Option<String>,
    #[serde(default)]
    pub agent_analysis: Option<Value>,
    #[serde(default)]
    pub pipeline_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RiskAssessment {
    pub risk_score: u32,
    #[serde(default)]
    pub threat_level: Option<String>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

// ============================================================================
// Analytics
// ============================================================================

/// `GET /api/analytics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalyticsSummary {
    #[serde(default)]
    pub activity_trends: Vec<ActivityPoint>,
    #[serde(default)]
    pub hourly_pattern: Vec<HourlyPoint>,
    #[serde(default)]
    pub species: Vec<SpeciesShare>,
    #[serde(default)]
    pub threat_timeline: Vec<ThreatEvent>,
    #[serde(default)]
    pub heatmap: Vec<ZoneActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub date: String,
    pub detections: u32,
    pub alerts: u32,
    pub threats: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub hour: String,
    pub detections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesShare {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatEvent {
    pub id: u32,
    pub time: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneActivity {
    pub location: String,
    pub morning: u32,
    pub afternoon: u32,
    pub evening: u32,
    pub night: u32,
}
