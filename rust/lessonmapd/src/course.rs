use crate::status::{normalize_status, CanonicalStatus};
use crate::viewport::{Background, BackgroundDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Course tree as delivered by the course-data provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub zones: Vec<ZoneInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInput {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order: i64,
    #[serde(
        default,
        alias = "background",
        skip_serializing_if = "Option::is_none"
    )]
    pub background_descriptor: Option<BackgroundDescriptor>,
    #[serde(default)]
    pub lessons: Vec<LessonInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonInput {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default, alias = "status")]
    pub raw_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub order: i64,
    pub raw_status: Option<String>,
    pub status: CanonicalStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: String,
    pub title: String,
    pub order: i64,
    pub background: Option<Background>,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: Option<String>,
    pub title: String,
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseError {
    pub message: String,
}

impl std::fmt::Display for CourseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CourseError {}

fn course_error(message: impl Into<String>) -> CourseError {
    CourseError {
        message: message.into(),
    }
}

impl CourseTree {
    /// Orders zones and lessons by their ordering keys and derives canonical
    /// statuses.
    ///
    /// Sorting is stable, so equal keys keep their array order. Ids must be
    /// non-empty and unique across the tree.
    pub fn into_course(self) -> Result<Course, CourseError> {
        let mut zone_ids: HashSet<String> = HashSet::new();
        let mut lesson_ids: HashSet<String> = HashSet::new();

        let mut zones = Vec::with_capacity(self.zones.len());
        for z in self.zones {
            let zone_id = z.id.trim().to_string();
            if zone_id.is_empty() {
                return Err(course_error("zone id must not be empty"));
            }
            if !zone_ids.insert(zone_id.clone()) {
                return Err(course_error(format!("duplicate zone id: {}", zone_id)));
            }

            let mut lessons = Vec::with_capacity(z.lessons.len());
            for l in z.lessons {
                let lesson_id = l.id.trim().to_string();
                if lesson_id.is_empty() {
                    return Err(course_error(format!(
                        "lesson id must not be empty (zone {})",
                        zone_id
                    )));
                }
                if !lesson_ids.insert(lesson_id.clone()) {
                    return Err(course_error(format!("duplicate lesson id: {}", lesson_id)));
                }
                let status = normalize_status(l.raw_status.as_deref());
                lessons.push(Lesson {
                    id: lesson_id,
                    title: l.title,
                    order: l.order,
                    raw_status: l.raw_status,
                    status,
                });
            }
            lessons.sort_by_key(|l| l.order);

            zones.push(Zone {
                id: zone_id,
                title: z.title,
                order: z.order,
                background: z.background_descriptor.and_then(|d| d.resolve()),
                lessons,
            });
        }
        zones.sort_by_key(|z| z.order);

        Ok(Course {
            id: self.id.filter(|s| !s.trim().is_empty()),
            title: self.title,
            zones,
        })
    }

    pub fn lesson_count(&self) -> usize {
        self.zones.iter().map(|z| z.lessons.len()).sum()
    }

    /// Replaces one lesson's raw status. Ids match the way `into_course` sees
    /// them, trimmed. Returns `false` if the lesson is not in the tree.
    pub fn set_raw_status(&mut self, lesson_id: &str, raw_status: Option<String>) -> bool {
        for zone in self.zones.iter_mut() {
            if let Some(lesson) = zone.lessons.iter_mut().find(|l| l.id.trim() == lesson_id) {
                lesson.raw_status = raw_status;
                return true;
            }
        }
        false
    }
}

impl Course {
    pub fn lesson_count(&self) -> usize {
        self.zones.iter().map(|z| z.lessons.len()).sum()
    }

    /// Finds a lesson and the zone that owns it.
    pub fn find_lesson(&self, lesson_id: &str) -> Option<(&Zone, &Lesson)> {
        self.zones.iter().find_map(|z| {
            z.lessons
                .iter()
                .find(|l| l.id == lesson_id)
                .map(|l| (z, l))
        })
    }
}
