//! Top-level views and the selector that maps `selected_view` onto them.
//!
//! The store holds the selected view as a free-form string so that the
//! sidebar, command palette and URL hash can all write to it. Resolution
//! to a [`View`] happens here, at read time, and never writes back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::ClientState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard = 0,
    Map = 1,
    Analytics = 2,
    Agents = 3,
    Docs = 4,
    Settings = 5,
}

/// Remote resource bindings a view may mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingName {
    HealthCheck,
    WildlifePositions,
    Hotspots,
    AgentStatus,
    MovementAnalysis,
    Orchestration,
    AnalyticsSummary,
}

impl View {
    /// Sidebar order.
    pub const ALL: [View; 6] = [
        View::Dashboard,
        View::Map,
        View::Analytics,
        View::Agents,
        View::Docs,
        View::Settings,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Map => "map",
            View::Analytics => "analytics",
            View::Agents => "agents",
            View::Docs => "docs",
            View::Settings => "settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Map => "Live Map",
            View::Analytics => "Analytics",
            View::Agents => "AI Agents",
            View::Docs => "Documentation",
            View::Settings => "Settings",
        }
    }

    /// Resolve a stored key. Unknown keys fall back to the dashboard.
    pub fn resolve(key: &str) -> View {
        key.parse().unwrap_or_default()
    }

    /// Bindings mounted while this view is active, excluding the
    /// application-wide health check.
    pub fn bindings(&self) -> &'static [BindingName] {
        match self {
            View::Dashboard => &[
                BindingName::WildlifePositions,
                BindingName::AgentStatus,
                BindingName::Orchestration,
            ],
            View::Map => &[BindingName::WildlifePositions, BindingName::Hotspots],
            View::Analytics => &[BindingName::AnalyticsSummary],
            View::Agents => &[BindingName::AgentStatus, BindingName::Orchestration],
            View::Docs | View::Settings => &[],
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for View {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL.into_iter().find(|v| v.key() == s).ok_or(())
    }
}

impl BindingName {
    /// Mounted at the application root regardless of the active view.
    pub const ROOT: [BindingName; 1] = [BindingName::HealthCheck];

    pub fn key(&self) -> &'static str {
        match self {
            BindingName::HealthCheck => "health_check",
            BindingName::WildlifePositions => "wildlife_positions",
            BindingName::Hotspots => "hotspots",
            BindingName::AgentStatus => "agent_status",
            BindingName::MovementAnalysis => "movement_analysis",
            BindingName::Orchestration => "orchestration",
            BindingName::AnalyticsSummary => "analytics_summary",
        }
    }
}

/// Static, total mapping from every [`View`] to a view implementation.
///
/// Construction takes a factory that is called once per view, so a
/// selector can never be missing an entry.
pub struct ViewSelector<V> {
    entries: [V; 6],
}

impl<V> ViewSelector<V> {
    pub fn new(mut factory: impl FnMut(View) -> V) -> Self {
        Self {
            entries: View::ALL.map(&mut factory),
        }
    }

    pub fn get(&self, view: View) -> &V {
        &self.entries[view as usize]
    }

    /// The implementation for the state's selected view.
    pub fn select(&self, state: &ClientState) -> (View, &V) {
        let view = state.active_view();
        (view, self.get(view))
    }

    pub fn iter(&self) -> impl Iterator<Item = (View, &V)> {
        View::ALL.into_iter().zip(self.entries.iter())
    }
}
