//! User-selectable console settings: colour theme and backend mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSettingError {
    #[error("Unknown theme: {0}")]
    Theme(String),

    #[error("Unknown backend mode: {0}")]
    BackendMode(String),
}

// ── Theme ───────────────────────────────────────────────────────────────

/// Colour theme preference. `System` defers to the OS at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    System,
}

/// A theme after `System` has been resolved against the OS preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl Theme {
    pub fn all() -> &'static [Self] {
        &[Self::Light, Self::Dark, Self::System]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::System => "System",
        }
    }

    /// Next theme in the header toggle cycle: light → dark → system → light.
    pub fn next(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
            Self::System => Self::Light,
        }
    }

    pub fn resolve(&self, prefers_dark: bool) -> ResolvedTheme {
        match self {
            Self::Light => ResolvedTheme::Light,
            Self::Dark => ResolvedTheme::Dark,
            Self::System if prefers_dark => ResolvedTheme::Dark,
            Self::System => ResolvedTheme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Theme {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(ParseSettingError::Theme(other.to_string())),
        }
    }
}

// ── Backend mode ────────────────────────────────────────────────────────

/// Which AI backend the console expects. `Offline` disables every
/// agent-dependent binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendMode {
    #[serde(alias = "groq")]
    FullAi,
    #[default]
    Simulated,
    #[serde(alias = "none")]
    Offline,
}

impl BackendMode {
    pub fn all() -> &'static [Self] {
        &[Self::FullAi, Self::Simulated, Self::Offline]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::FullAi => "full-ai",
            Self::Simulated => "simulated",
            Self::Offline => "offline",
        }
    }

    /// Status line shown under the sidebar logo.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullAi => "Groq AI Active",
            Self::Simulated => "Simulated Mode",
            Self::Offline => "Offline Mode",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FullAi => "Full AI agent capabilities with Groq API",
            Self::Simulated => "Mock AI responses for development and testing",
            Self::Offline => "Basic functionality without AI agents",
        }
    }

    /// Whether agent and orchestration endpoints may be called.
    pub fn agents_enabled(&self) -> bool {
        !matches!(self, Self::Offline)
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BackendMode {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full-ai" | "full_ai" | "groq" => Ok(Self::FullAi),
            "simulated" => Ok(Self::Simulated),
            "offline" | "none" => Ok(Self::Offline),
            other => Err(ParseSettingError::BackendMode(other.to_string())),
        }
    }
}
