//! Stage classification from free-text phase descriptions.

use crate::fields::Stage;

/// Keyword groups checked in order; the first group with a hit decides.
pub const STAGE_KEYWORDS: [(Stage, &[&str]); 5] = [
    (Stage::Discovery, &["discovery", "intake", "new", "exploring", "initial"]),
    (Stage::BuildVsBuy, &["budget", "evaluation", "buy", "build", "compare", "vendor"]),
    (Stage::InitialDemo, &["demo", "poc", "proof", "concept", "test"]),
    (Stage::Piloting, &["pilot", "trial", "beta"]),
    (Stage::Implementation, &["implement", "rollout", "deploy", "production", "launch"]),
];

/// Map a phase or status description onto a pipeline stage.
///
/// Matching is a case-insensitive substring test. Missing, blank or
/// unrecognised text falls back to `Discovery`.
pub fn classify_stage(phase: Option<&str>) -> Stage {
    let Some(text) = phase else {
        return Stage::Discovery;
    };
    let text = text.to_lowercase();
    STAGE_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(stage, _)| *stage)
        .unwrap_or(Stage::Discovery)
}

/// Use an exact stage label when the sheet gives one, else classify the text.
pub fn resolve_stage(explicit: Option<&str>, phase: Option<&str>) -> Stage {
    explicit
        .and_then(Stage::from_label)
        .unwrap_or_else(|| classify_stage(phase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pilot_text_is_piloting() {
        let stage = classify_stage(Some("Running a 2-week pilot with finance team"));
        assert_ne!(stage, Stage::Discovery);
        assert_eq!(stage, Stage::Piloting);
    }

    #[test]
    fn test_each_group() {
        assert_eq!(classify_stage(Some("Intake form submitted")), Stage::Discovery);
        assert_eq!(classify_stage(Some("Vendor shortlist")), Stage::BuildVsBuy);
        assert_eq!(classify_stage(Some("POC scheduled")), Stage::InitialDemo);
        assert_eq!(classify_stage(Some("Beta users onboarded")), Stage::Piloting);
        assert_eq!(classify_stage(Some("Deployed org-wide")), Stage::Implementation);
    }

    #[test]
    fn test_fallback_to_discovery() {
        assert_eq!(classify_stage(None), Stage::Discovery);
        assert_eq!(classify_stage(Some("")), Stage::Discovery);
        assert_eq!(classify_stage(Some("waiting on legal")), Stage::Discovery);
    }

    #[test]
    fn test_first_group_wins() {
        // "new" (Discovery) is checked before "pilot".
        assert_eq!(classify_stage(Some("new pilot")), Stage::Discovery);
        // "budget" (Build vs Buy) before "demo".
        assert_eq!(classify_stage(Some("Demo done, awaiting budget")), Stage::BuildVsBuy);
        // "test" hides inside "latest" and still counts.
        assert_eq!(classify_stage(Some("latest rollout")), Stage::InitialDemo);
    }

    #[test]
    fn test_resolve_prefers_exact_label() {
        assert_eq!(resolve_stage(Some("Piloting"), Some("intake")), Stage::Piloting);
        assert_eq!(resolve_stage(Some("pilot-ish"), Some("rollout")), Stage::Implementation);
        assert_eq!(resolve_stage(None, None), Stage::Discovery);
    }
}
