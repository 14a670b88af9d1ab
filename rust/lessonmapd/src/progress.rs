use crate::course::Zone;
use crate::status::CanonicalStatus;
use serde::Serialize;

/// Finds where the learner's avatar should stand.
///
/// One pass over zones, then lessons, in order. The first `Unlocked` lesson
/// wins; without one, the last `Completed` lesson; otherwise nobody.
pub fn resolve_player_position(zones: &[Zone]) -> Option<String> {
    let mut first_unlocked: Option<&str> = None;
    let mut last_completed: Option<&str> = None;

    for zone in zones {
        for lesson in &zone.lessons {
            match lesson.status {
                CanonicalStatus::Completed => last_completed = Some(lesson.id.as_str()),
                CanonicalStatus::Unlocked => {
                    if first_unlocked.is_none() {
                        first_unlocked = Some(lesson.id.as_str());
                    }
                }
                CanonicalStatus::Locked => {}
            }
        }
    }

    first_unlocked.or(last_completed).map(str::to_string)
}

/// Per-zone status counts for the unit header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneProgress {
    pub total: usize,
    pub completed: usize,
    pub unlocked: usize,
    pub locked: usize,
}

pub fn zone_progress(zone: &Zone) -> ZoneProgress {
    let mut p = ZoneProgress {
        total: zone.lessons.len(),
        ..ZoneProgress::default()
    };
    for lesson in &zone.lessons {
        match lesson.status {
            CanonicalStatus::Completed => p.completed += 1,
            CanonicalStatus::Unlocked => p.unlocked += 1,
            CanonicalStatus::Locked => p.locked += 1,
        }
    }
    p
}
