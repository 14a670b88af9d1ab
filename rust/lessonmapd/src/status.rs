use serde::Serialize;

/// Canonical lesson state, independent of the provider's status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalStatus {
    Locked,
    Unlocked,
    Completed,
}

impl CanonicalStatus {
    pub fn is_locked(self) -> bool {
        self == CanonicalStatus::Locked
    }
}

const COMPLETED_TOKENS: [&str; 3] = ["completed", "finished", "passed"];
const UNLOCKED_TOKENS: [&str; 3] = ["unlocked", "active", "in_progress"];

/// Maps a raw provider status to its canonical state.
///
/// Allow-list only: anything not recognized (including a missing status)
/// comes out as `Locked`.
pub fn normalize_status(raw: Option<&str>) -> CanonicalStatus {
    let Some(raw) = raw else {
        return CanonicalStatus::Locked;
    };
    let token = raw.trim().to_ascii_lowercase();
    if COMPLETED_TOKENS.contains(&token.as_str()) {
        CanonicalStatus::Completed
    } else if UNLOCKED_TOKENS.contains(&token.as_str()) {
        CanonicalStatus::Unlocked
    } else {
        CanonicalStatus::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_tokens_map_to_their_state() {
        for raw in ["completed", "finished", "passed"] {
            assert_eq!(normalize_status(Some(raw)), CanonicalStatus::Completed);
        }
        for raw in ["unlocked", "active", "in_progress"] {
            assert_eq!(normalize_status(Some(raw)), CanonicalStatus::Unlocked);
        }
    }

    #[test]
    fn case_and_whitespace_are_ignored() {
        assert_eq!(
            normalize_status(Some("  FiNiShEd \n")),
            CanonicalStatus::Completed
        );
        assert_eq!(normalize_status(Some("\tIn_Progress")), CanonicalStatus::Unlocked);
    }

    #[test]
    fn everything_else_is_locked() {
        let unknown = [
            "",
            "   ",
            "locked",
            "in progress",
            "in-progress",
            "done",
            "open",
            "unlocked!",
        ];
        for raw in unknown {
            assert_eq!(normalize_status(Some(raw)), CanonicalStatus::Locked, "{raw:?}");
        }
        assert_eq!(normalize_status(None), CanonicalStatus::Locked);
    }
}
