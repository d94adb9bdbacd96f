//! Bucket a (customer signal, strategic alignment) pair into a recommendation.

use beacon_core::enums::Recommendation;

use crate::params::RecommendationThresholds;

/// Rules are evaluated in order; the first match wins.
///
/// ```text
/// signal ≥ high     ∧ alignment ≥ high     → high_priority
/// signal ≥ high     ∧ alignment < moderate → explore_lightweight
/// signal ≥ moderate ∧ alignment ≥ moderate → medium_priority
/// signal < moderate ∧ alignment < moderate → off_strategy
/// otherwise                                → needs_review
/// ```
#[must_use]
pub fn recommend(signal: u8, alignment: u8, thresholds: &RecommendationThresholds) -> Recommendation {
    let (high, moderate) = (thresholds.high, thresholds.moderate);

    if signal >= high && alignment >= high {
        Recommendation::HighPriority
    } else if signal >= high && alignment < moderate {
        Recommendation::ExploreLightweight
    } else if signal >= moderate && alignment >= moderate {
        Recommendation::MediumPriority
    } else if signal < moderate && alignment < moderate {
        Recommendation::OffStrategy
    } else {
        Recommendation::NeedsReview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(92, 95, Recommendation::HighPriority)]
    #[case(70, 70, Recommendation::HighPriority)]
    #[case(86, 30, Recommendation::ExploreLightweight)]
    #[case(86, 60, Recommendation::MediumPriority)]
    #[case(55, 90, Recommendation::MediumPriority)]
    #[case(20, 10, Recommendation::OffStrategy)]
    #[case(49, 49, Recommendation::OffStrategy)]
    #[case(30, 80, Recommendation::NeedsReview)]
    #[case(60, 40, Recommendation::NeedsReview)]
    fn default_thresholds(#[case] signal: u8, #[case] alignment: u8, #[case] expected: Recommendation) {
        assert_eq!(
            recommend(signal, alignment, &RecommendationThresholds::default()),
            expected
        );
    }

    #[test]
    fn custom_thresholds_apply() {
        let thresholds = RecommendationThresholds { high: 90, moderate: 40 };
        assert_eq!(recommend(85, 85, &thresholds), Recommendation::MediumPriority);
        assert_eq!(recommend(95, 95, &thresholds), Recommendation::HighPriority);
    }
}
