use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// A zone counts as in view once this share of its area is visible.
pub const VISIBILITY_THRESHOLD: f64 = 0.3;

pub const DEFAULT_BACKGROUND: &str = "linear-gradient(180deg, #f5f7fa 0%, #e4e9f0 100%)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Image,
    Gradient,
}

/// Background as the provider sends it: either a bare string whose kind is
/// sniffed from its prefix, or an explicit `{kind, value}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackgroundDescriptor {
    Explicit { kind: BackgroundKind, value: String },
    Raw(String),
}

impl BackgroundDescriptor {
    /// Blank descriptors resolve to `None`.
    pub fn resolve(self) -> Option<Background> {
        match self {
            BackgroundDescriptor::Explicit { kind, value } => {
                let value = value.trim().to_string();
                (!value.is_empty()).then(|| Background::new(kind, value))
            }
            BackgroundDescriptor::Raw(raw) => {
                let value = raw.trim().to_string();
                if value.is_empty() {
                    return None;
                }
                let kind = if looks_like_url(&value) {
                    BackgroundKind::Image
                } else {
                    BackgroundKind::Gradient
                };
                Some(Background::new(kind, value))
            }
        }
    }
}

fn looks_like_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub kind: BackgroundKind,
    pub value: String,
    /// Ready-to-apply CSS `background` value.
    pub css: String,
}

impl Background {
    pub fn new(kind: BackgroundKind, value: String) -> Self {
        let css = match kind {
            BackgroundKind::Image => format!(
                "url(\"{}\") center / cover no-repeat",
                value.replace('"', "%22")
            ),
            BackgroundKind::Gradient => value.clone(),
        };
        Self { kind, value, css }
    }

    pub fn neutral() -> Self {
        Self::new(BackgroundKind::Gradient, DEFAULT_BACKGROUND.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityEntry {
    pub zone_id: String,
    #[serde(alias = "intersectionRatio")]
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Active(String),
}

/// Tracks which zone of a mounted map is in view.
///
/// One tracker is one subscription: it lives as long as the view that
/// created it and is released when dropped.
#[derive(Debug)]
pub struct ZoneTracker {
    id: String,
    backgrounds: HashMap<String, Option<Background>>,
    state: TrackerState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub subscription_id: String,
    pub state: &'static str,
    pub active_zone_id: Option<String>,
    pub active_background: Background,
}

impl ZoneTracker {
    pub fn subscribe<I>(zones: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<Background>)>,
    {
        let backgrounds: HashMap<String, Option<Background>> = zones.into_iter().collect();
        let id = Uuid::new_v4().to_string();
        debug!(subscription = %id, zones = backgrounds.len(), "viewport subscription acquired");
        Self {
            id,
            backgrounds,
            state: TrackerState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn active_zone_id(&self) -> Option<&str> {
        match &self.state {
            TrackerState::Idle => None,
            TrackerState::Active(zone_id) => Some(zone_id),
        }
    }

    /// Background of the active zone; the neutral default while idle or
    /// when the active zone has none of its own.
    pub fn active_background(&self) -> Background {
        self.active_zone_id()
            .and_then(|z| self.backgrounds.get(z).cloned().flatten())
            .unwrap_or_else(Background::neutral)
    }

    /// Applies one batch of visibility callbacks.
    ///
    /// Among known zones at or above the threshold, the highest ratio wins
    /// (earliest entry on ties). Entries below the threshold never move the
    /// active zone. Returns `true` if the active zone changed.
    pub fn observe(&mut self, entries: &[VisibilityEntry]) -> bool {
        let mut best: Option<(&str, f64)> = None;
        for e in entries {
            if !self.backgrounds.contains_key(&e.zone_id) {
                debug!(subscription = %self.id, zone = %e.zone_id, "ignoring unknown zone");
                continue;
            }
            let ratio = if e.ratio.is_finite() {
                e.ratio.clamp(0.0, 1.0)
            } else {
                0.0
            };
            if ratio < VISIBILITY_THRESHOLD {
                continue;
            }
            if best.map(|(_, r)| ratio > r).unwrap_or(true) {
                best = Some((e.zone_id.as_str(), ratio));
            }
        }

        let Some((zone_id, ratio)) = best else {
            return false;
        };
        if self.active_zone_id() == Some(zone_id) {
            return false;
        }
        debug!(subscription = %self.id, zone = %zone_id, ratio, "active zone changed");
        self.state = TrackerState::Active(zone_id.to_string());
        true
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            subscription_id: self.id.clone(),
            state: match self.state() {
                TrackerState::Idle => "idle",
                TrackerState::Active(_) => "active",
            },
            active_zone_id: self.active_zone_id().map(str::to_string),
            active_background: self.active_background(),
        }
    }
}

impl Drop for ZoneTracker {
    fn drop(&mut self) {
        debug!(subscription = %self.id, "viewport subscription released");
    }
}
