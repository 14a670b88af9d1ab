use crate::course::Course;
use crate::layout::{lane_for_index, zigzag_layout, Lane, MapGeometry, NodePosition};
use crate::path::{build_path, PathDescriptor};
use crate::progress::{resolve_player_position, zone_progress, ZoneProgress};
use crate::status::CanonicalStatus;
use crate::viewport::{Background, ZoneTracker};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const PLACEHOLDER_GLYPH: &str = "\u{1F989}";

const Z_INDEX_DEFAULT: i64 = 1;
const Z_INDEX_PLAYER: i64 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct MapError {
    pub code: &'static str,
    pub message: String,
}

impl MapError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Equipped companion from the user's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionDescriptor {
    #[serde(default)]
    pub animation_asset_url: Option<String>,
}

/// What to draw at the player position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlayerMarker {
    Animation { url: String },
    Placeholder { glyph: &'static str },
}

impl PlayerMarker {
    pub fn from_companion(companion: Option<&CompanionDescriptor>) -> Self {
        companion
            .and_then(|c| c.animation_asset_url.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|url| PlayerMarker::Animation {
                url: url.to_string(),
            })
            .unwrap_or(PlayerMarker::Placeholder {
                glyph: PLACEHOLDER_GLYPH,
            })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub lesson_id: String,
    pub title: String,
    pub canonical_status: CanonicalStatus,
    pub raw_status: Option<String>,
    pub lane: Lane,
    pub x: f64,
    pub y: f64,
    pub z_index: i64,
    pub is_player_here: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneView {
    pub id: String,
    pub title: String,
    pub order: i64,
    pub background: Option<Background>,
    pub progress: ZoneProgress,
    pub nodes: Vec<NodeView>,
    pub path: PathDescriptor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub loaded: bool,
    pub course_id: Option<String>,
    pub course_title: Option<String>,
    pub player_position_id: Option<String>,
    pub companion: PlayerMarker,
    pub active_zone_id: Option<String>,
    pub active_background: Background,
    pub geometry: MapGeometry,
    pub zones: Vec<ZoneView>,
}

impl MapView {
    /// What the UI shows before a course is loaded or after a failed load.
    pub fn empty(geometry: MapGeometry) -> Self {
        Self {
            loaded: false,
            course_id: None,
            course_title: None,
            player_position_id: None,
            companion: PlayerMarker::from_companion(None),
            active_zone_id: None,
            active_background: Background::neutral(),
            geometry,
            zones: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedLesson {
    pub id: String,
    pub title: String,
    pub zone_id: String,
    pub canonical_status: CanonicalStatus,
}

#[derive(Debug, Clone)]
pub enum SelectOutcome {
    Accepted(SelectedLesson),
    IgnoredLocked,
    RolledBack(String),
}

struct ZoneLayout {
    nodes: Vec<NodePosition>,
    path: PathDescriptor,
}

/// A loaded course map for one page view.
pub struct LessonMap {
    course: Course,
    geometry: MapGeometry,
    user_id: String,
    marker: PlayerMarker,
    layouts: Vec<ZoneLayout>,
    player_position: Option<String>,
    tracker: Option<ZoneTracker>,
}

impl LessonMap {
    pub fn new(
        course: Course,
        geometry: MapGeometry,
        user_id: impl Into<String>,
        companion: Option<&CompanionDescriptor>,
    ) -> Self {
        let layouts = course
            .zones
            .iter()
            .map(|z| {
                let nodes = zigzag_layout(z.lessons.len(), &geometry);
                let path = build_path(&nodes, &geometry);
                ZoneLayout { nodes, path }
            })
            .collect();
        let player_position = resolve_player_position(&course.zones);
        info!(
            course = course.id.as_deref().unwrap_or("-"),
            zones = course.zones.len(),
            lessons = course.lesson_count(),
            position = player_position.as_deref().unwrap_or("-"),
            "course map loaded"
        );
        Self {
            course,
            geometry,
            user_id: user_id.into(),
            marker: PlayerMarker::from_companion(companion),
            layouts,
            player_position,
            tracker: None,
        }
    }

    pub fn course_id(&self) -> Option<&str> {
        self.course.id.as_deref()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn player_position(&self) -> Option<&str> {
        self.player_position.as_deref()
    }

    /// Moves the player to `lesson_id` as an optimistic update.
    ///
    /// The position changes before `confirm` runs; if `confirm` fails, the
    /// previous position is restored. Locked lessons are ignored without
    /// touching state.
    pub fn select<F>(&mut self, lesson_id: &str, confirm: F) -> Result<SelectOutcome, MapError>
    where
        F: FnOnce(&str) -> anyhow::Result<()>,
    {
        let Some((zone, lesson)) = self.course.find_lesson(lesson_id) else {
            return Err(MapError::new(
                "not_found",
                format!("lesson not found: {}", lesson_id),
            ));
        };
        if lesson.status.is_locked() {
            info!(lesson = %lesson_id, "ignoring selection of locked lesson");
            return Ok(SelectOutcome::IgnoredLocked);
        }
        let selected = SelectedLesson {
            id: lesson.id.clone(),
            title: lesson.title.clone(),
            zone_id: zone.id.clone(),
            canonical_status: lesson.status,
        };

        let snapshot = self.player_position.replace(selected.id.clone());
        match confirm(&selected.id) {
            Ok(()) => {
                info!(lesson = %selected.id, "player position moved");
                Ok(SelectOutcome::Accepted(selected))
            }
            Err(e) => {
                warn!(lesson = %selected.id, error = %e, "position not confirmed; rolling back");
                self.player_position = snapshot;
                Ok(SelectOutcome::RolledBack(e.to_string()))
            }
        }
    }

    /// Starts tracking this map's zones, releasing any previous subscription.
    pub fn subscribe_viewport(&mut self) -> &ZoneTracker {
        let zones = self
            .course
            .zones
            .iter()
            .map(|z| (z.id.clone(), z.background.clone()));
        self.tracker.insert(ZoneTracker::subscribe(zones))
    }

    pub fn tracker_mut(&mut self, subscription_id: &str) -> Result<&mut ZoneTracker, MapError> {
        match self.tracker.as_mut() {
            Some(t) if t.id() == subscription_id => Ok(t),
            _ => Err(MapError::new(
                "no_subscription",
                format!("unknown subscription: {}", subscription_id),
            )),
        }
    }

    pub fn unsubscribe_viewport(&mut self, subscription_id: &str) -> Result<(), MapError> {
        self.tracker_mut(subscription_id)?;
        self.tracker = None;
        Ok(())
    }

    pub fn view(&self) -> MapView {
        let position = self.player_position.as_deref();
        let zones = self
            .course
            .zones
            .iter()
            .zip(&self.layouts)
            .map(|(zone, layout)| {
                let nodes = zone
                    .lessons
                    .iter()
                    .zip(&layout.nodes)
                    .enumerate()
                    .map(|(i, (lesson, pos))| {
                        let here = position == Some(lesson.id.as_str());
                        NodeView {
                            lesson_id: lesson.id.clone(),
                            title: lesson.title.clone(),
                            canonical_status: lesson.status,
                            raw_status: lesson.raw_status.clone(),
                            lane: lane_for_index(i),
                            x: pos.x,
                            y: pos.y,
                            z_index: if here { Z_INDEX_PLAYER } else { Z_INDEX_DEFAULT },
                            is_player_here: here,
                        }
                    })
                    .collect();
                ZoneView {
                    id: zone.id.clone(),
                    title: zone.title.clone(),
                    order: zone.order,
                    background: zone.background.clone(),
                    progress: zone_progress(zone),
                    nodes,
                    path: layout.path.clone(),
                }
            })
            .collect();

        MapView {
            loaded: true,
            course_id: self.course.id.clone(),
            course_title: Some(self.course.title.clone()),
            player_position_id: self.player_position.clone(),
            companion: self.marker.clone(),
            active_zone_id: self
                .tracker
                .as_ref()
                .and_then(|t| t.active_zone_id())
                .map(str::to_string),
            active_background: self
                .tracker
                .as_ref()
                .map(|t| t.active_background())
                .unwrap_or_else(Background::neutral),
            geometry: self.geometry,
            zones,
        }
    }
}
