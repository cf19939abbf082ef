//! Rule-based suggestions derived from a mood entry.
//!
//! Three independent branches (mood, energy, stress) each append to the
//! list, followed by one unconditional general tip. Categories, thresholds
//! and order are fixed; the wording is free to change.

use crate::models::mood::{Mood, Recommendation, RecommendationCategory};

pub fn generate_recommendations(
    mood: &Mood,
    energy: Option<i32>,
    stress: Option<i32>,
) -> Vec<Recommendation> {
    use RecommendationCategory::*;

    let mut out = Vec::with_capacity(6);

    match mood {
        Mood::Sad => {
            out.push(Recommendation::new(
                Wellbeing,
                "Take a short break and do something you enjoy before getting back to work.",
            ));
            out.push(Recommendation::new(
                StudyTips,
                "Split your work into small chunks and tick them off one at a time.",
            ));
            if energy.is_some_and(|e| e < 5) {
                out.push(Recommendation::new(
                    EnergyBoost,
                    "A few minutes of stretching or fresh air can lift your energy.",
                ));
            }
        }
        Mood::Stressed => {
            out.push(Recommendation::new(
                StressRelief,
                "Try five minutes of slow breathing or a short guided meditation.",
            ));
            out.push(Recommendation::new(
                StudyTips,
                "List what is due, pick the most important task and focus on just that one.",
            ));
            if stress.is_some_and(|s| s >= 8) {
                out.push(Recommendation::new(
                    Support,
                    "Consider talking to a teacher, parent or another adult you trust about how you feel.",
                ));
            }
        }
        Mood::Happy => {
            out.push(Recommendation::new(
                StudyTips,
                "You are in a good place: tackle the material you usually find hardest.",
            ));
            if energy.is_some_and(|e| e >= 7) {
                out.push(Recommendation::new(
                    StudyTips,
                    "Use active learning: teach the topic aloud or quiz yourself.",
                ));
            }
        }
        Mood::Neutral => {
            out.push(Recommendation::new(
                StudyTips,
                "Try the Pomodoro technique: 25 minutes of focus, then a 5 minute break.",
            ));
        }
        // "okay" and unrecognised moods contribute nothing here.
        Mood::Okay | Mood::Other(_) => {}
    }

    match energy {
        Some(e) if e < 4 => out.push(Recommendation::new(
            EnergyBoost,
            "Have a healthy snack, drink some water or take a quick walk.",
        )),
        Some(e) if e >= 8 => out.push(Recommendation::new(
            StudyTips,
            "Your energy is high, so use it on your most challenging work.",
        )),
        _ => {}
    }

    match stress {
        Some(s) if s >= 7 => {
            out.push(Recommendation::new(
                StressRelief,
                "Try 4-7-8 breathing: in for 4 seconds, hold for 7, out for 8.",
            ));
            out.push(Recommendation::new(
                StudyTips,
                "Break big assignments into steps and celebrate each one you finish.",
            ));
        }
        Some(s) if s <= 3 => out.push(Recommendation::new(
            StudyTips,
            "Stress is low, which makes this a good time for deep, focused study.",
        )),
        _ => {}
    }

    out.push(Recommendation::new(
        General,
        "Remember to take regular breaks to stay fresh and focused.",
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use RecommendationCategory::*;

    fn categories(mood: &str, energy: Option<i32>, stress: Option<i32>) -> Vec<RecommendationCategory> {
        generate_recommendations(&Mood::from(mood), energy, stress)
            .into_iter()
            .map(|r| r.category)
            .collect()
    }

    #[test]
    fn test_stressed_with_high_stress() {
        assert_eq!(
            categories("stressed", Some(5), Some(9)),
            vec![StressRelief, StudyTips, Support, StressRelief, StudyTips, General]
        );
    }

    #[test]
    fn test_okay_without_levels_yields_only_trailer() {
        let recs = generate_recommendations(&Mood::Okay, None, None);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, General);
    }

    #[test]
    fn test_unknown_mood_degrades_to_level_branches() {
        assert_eq!(categories("elated", Some(2), None), vec![EnergyBoost, General]);
    }

    #[test]
    fn test_sad_low_energy_hits_both_energy_rules() {
        assert_eq!(
            categories("sad", Some(3), None),
            vec![Wellbeing, StudyTips, EnergyBoost, EnergyBoost, General]
        );
    }

    #[test]
    fn test_sad_energy_four_only_mood_boost() {
        // 4 is below the sad threshold but inside the neutral energy band
        assert_eq!(
            categories("sad", Some(4), None),
            vec![Wellbeing, StudyTips, EnergyBoost, General]
        );
    }

    #[test]
    fn test_happy_high_energy_low_stress() {
        assert_eq!(
            categories("happy", Some(8), Some(2)),
            vec![StudyTips, StudyTips, StudyTips, StudyTips, General]
        );
    }

    #[test]
    fn test_happy_energy_seven_boundary() {
        assert_eq!(categories("happy", Some(7), None), vec![StudyTips, StudyTips, General]);
        assert_eq!(categories("happy", Some(6), None), vec![StudyTips, General]);
    }

    #[test]
    fn test_neutral_mid_levels() {
        assert_eq!(categories("neutral", Some(5), Some(5)), vec![StudyTips, General]);
    }

    #[test]
    fn test_stress_band_edges() {
        assert_eq!(categories("okay", None, Some(7)), vec![StressRelief, StudyTips, General]);
        assert_eq!(categories("okay", None, Some(6)), vec![General]);
        assert_eq!(categories("okay", None, Some(4)), vec![General]);
        assert_eq!(categories("okay", None, Some(3)), vec![StudyTips, General]);
    }

    #[test]
    fn test_stressed_support_threshold() {
        assert_eq!(
            categories("stressed", None, Some(7)),
            vec![StressRelief, StudyTips, StressRelief, StudyTips, General]
        );
    }

    #[test]
    fn test_deterministic() {
        let a = generate_recommendations(&Mood::Sad, Some(2), Some(8));
        let b = generate_recommendations(&Mood::Sad, Some(2), Some(8));
        assert_eq!(a, b);
    }
}
