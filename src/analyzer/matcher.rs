use crate::analyzer::region::Region;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// Area ratio above which the full size score applies
const CLOSE_SIZE_RATIO: f64 = 0.6;
/// Upper bound (exclusive) of the random perturbation
const NOISE_RANGE: f64 = 20.0;

/// Placeholder region-similarity scorer.
///
/// Compares bounding-box areas only and adds up to 20 points of noise drawn
/// from the injected generator. This is not biometric matching.
#[derive(Debug, Clone)]
pub struct FaceMatcher<R = StdRng> {
    rng: R,
}

impl FaceMatcher<StdRng> {
    /// Matcher with a reproducible noise sequence
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Matcher seeded from system entropy
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> FaceMatcher<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Score 0..=100 for how well `detected` matches `target`
    pub fn match_regions(&mut self, detected: &Region, target: &Region) -> u8 {
        let detected_area = detected.area().max(0) as f64;
        let target_area = target.area().max(0) as f64;
        let larger = detected_area.max(target_area);
        if larger == 0.0 {
            return 0;
        }

        let area_ratio = detected_area.min(target_area) / larger;
        let size_match = if area_ratio > CLOSE_SIZE_RATIO {
            100.0 * area_ratio
        } else {
            50.0 * area_ratio
        };
        let noise = self.rng.gen::<f64>() * NOISE_RANGE;
        let score = (size_match + noise).min(100.0).round() as u8;

        debug!(
            "Area ratio {:.3}, size match {:.1}, noise {:.2} -> score {}",
            area_ratio, size_match, noise, score
        );
        score
    }
}

/// How convincing a match score is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStrength {
    Strong,
    Potential,
    Weak,
}

impl MatchStrength {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 75.0 {
            MatchStrength::Strong
        } else if confidence > 50.0 {
            MatchStrength::Potential
        } else {
            MatchStrength::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchStrength::Strong => "Strong Match",
            MatchStrength::Potential => "Potential Match",
            MatchStrength::Weak => "Weak Match",
        }
    }
}

/// Detection paired with its score against the target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub detected_regions: Vec<Region>,
    pub match_confidence: f64,
}

impl MatchResult {
    pub fn strength(&self) -> MatchStrength {
        MatchStrength::from_confidence(self.match_confidence)
    }
}

/// Order results by descending confidence
pub fn rank_matches(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.match_confidence
            .partial_cmp(&a.match_confidence)
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn quiet_matcher() -> FaceMatcher<StepRng> {
        FaceMatcher::with_rng(StepRng::new(0, 0))
    }

    #[test]
    fn test_identical_regions_score_full() {
        let region = Region::new(0, 0, 40, 40, 1000);
        assert_eq!(quiet_matcher().match_regions(&region, &region), 100);
    }

    #[test]
    fn test_dissimilar_sizes_use_half_weight() {
        let small = Region::new(0, 0, 10, 10, 100);
        let large = Region::new(0, 0, 20, 10, 200);
        // ratio 0.5 -> 25
        assert_eq!(quiet_matcher().match_regions(&small, &large), 25);
        assert_eq!(quiet_matcher().match_regions(&large, &small), 25);
    }

    #[test]
    fn test_similar_sizes_use_full_weight() {
        let a = Region::new(0, 0, 10, 10, 100);
        let b = Region::new(5, 5, 10, 8, 80);
        // ratio 0.8 -> 80
        assert_eq!(quiet_matcher().match_regions(&a, &b), 80);
    }

    #[test]
    fn test_noise_stays_in_range() {
        let a = Region::new(0, 0, 10, 10, 100);
        let b = Region::new(0, 0, 20, 10, 200);
        let mut matcher = FaceMatcher::seeded(7);

        for _ in 0..200 {
            let score = matcher.match_regions(&a, &b);
            assert!((25..=45).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn test_seeded_matchers_agree() {
        let a = Region::new(0, 0, 30, 30, 500);
        let b = Region::new(0, 0, 25, 30, 400);
        let mut first = FaceMatcher::seeded(42);
        let mut second = FaceMatcher::seeded(42);

        let left: Vec<u8> = (0..20).map(|_| first.match_regions(&a, &b)).collect();
        let right: Vec<u8> = (0..20).map(|_| second.match_regions(&a, &b)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_score_capped_at_100() {
        let region = Region::new(0, 0, 40, 40, 1000);
        let mut matcher = FaceMatcher::with_rng(StepRng::new(u64::MAX, 0));
        assert_eq!(matcher.match_regions(&region, &region), 100);
    }

    #[test]
    fn test_zero_area_scores_zero() {
        let empty = Region::new(0, 0, 0, 0, 0);
        assert_eq!(quiet_matcher().match_regions(&empty, &empty), 0);
    }

    #[test]
    fn test_strength_and_ranking() {
        assert_eq!(MatchStrength::from_confidence(80.0), MatchStrength::Strong);
        assert_eq!(MatchStrength::from_confidence(75.0), MatchStrength::Potential);
        assert_eq!(MatchStrength::from_confidence(50.0), MatchStrength::Weak);

        let mut results = vec![
            MatchResult {
                detected_regions: Vec::new(),
                match_confidence: 40.0,
            },
            MatchResult {
                detected_regions: Vec::new(),
                match_confidence: 90.0,
            },
            MatchResult {
                detected_regions: Vec::new(),
                match_confidence: 60.0,
            },
        ];
        rank_matches(&mut results);

        let order: Vec<f64> = results.iter().map(|r| r.match_confidence).collect();
        assert_eq!(order, vec![90.0, 60.0, 40.0]);
        assert_eq!(results[0].strength().label(), "Strong Match");
    }
}
