//! Offline keyword heuristic used when no provider is usable.
//!
//! Never performs I/O and always succeeds. The output is labelled as a
//! simulation in both the `provider` field and the analysis text.

use crate::config::SimulationConfig;
use crate::types::{clamp_unit, round_to, AnalysisResult, SIMULATION_LABEL};
use rand::Rng;

/// Confidence above which the simulated verdict reads as a likely match.
const LIKELY_MATCH_THRESHOLD: f64 = 0.7;

/// Keyword-driven confidence estimator.
#[derive(Debug, Clone)]
pub struct HeuristicSimulator {
    keywords: Vec<String>,
    base_confidence: f64,
    per_keyword: f64,
    cap: f64,
    jitter: f64,
}

impl HeuristicSimulator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
            base_confidence: config.base_confidence,
            per_keyword: config.per_keyword,
            cap: config.cap,
            jitter: config.jitter,
        }
    }

    /// Keywords contained in the description (case-insensitive substring match).
    pub fn matched_keywords(&self, challenge_description: &str) -> Vec<&str> {
        let lower = challenge_description.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| !kw.is_empty() && lower.contains(kw.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Keyword part of the score: `min(base + per_keyword * matches, cap)`.
    pub fn base_confidence(&self, matches: usize) -> f64 {
        (self.base_confidence + self.per_keyword * matches as f64).min(self.cap)
    }

    /// Simulate with the thread-local RNG.
    pub fn simulate(&self, challenge_description: &str) -> AnalysisResult {
        self.simulate_with(challenge_description, &mut rand::thread_rng())
    }

    /// Simulate with a caller-supplied RNG.
    pub fn simulate_with<R: Rng + ?Sized>(&self, challenge_description: &str, rng: &mut R) -> AnalysisResult {
        let matched = self.matched_keywords(challenge_description);
        let base = self.base_confidence(matched.len());
        let jitter = if self.jitter > 0.0 {
            rng.gen_range(0.0..self.jitter)
        } else {
            0.0
        };
        let confidence = round_to(clamp_unit(base + jitter), 2);

        let verdict = if confidence > LIKELY_MATCH_THRESHOLD {
            "likely matches"
        } else {
            "may not match"
        };
        let analysis = format!(
            "[SIMULATION] Challenge: \"{}\". Matched keywords: [{}]. The image {verdict} the challenge. Confidence: {:.1}%",
            challenge_description.trim(),
            matched.join(", "),
            confidence * 100.0,
        );

        tracing::info!(
            "Simulated analysis: {} keyword(s) matched, confidence {confidence}",
            matched.len()
        );
        AnalysisResult::success(confidence, analysis, SIMULATION_LABEL)
    }
}

impl Default for HeuristicSimulator {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_matched_keywords_case_insensitive() {
        let sim = HeuristicSimulator::default();
        let matched = sim.matched_keywords("Coletar 10 TAMPINHAS de garrafa PET");
        assert_eq!(matched, vec!["tampinha", "garrafa", "pet", "coletar"]);
    }

    #[test]
    fn test_base_confidence_scales_and_caps() {
        let sim = HeuristicSimulator::default();
        assert!((sim.base_confidence(0) - 0.3).abs() < 1e-9);
        assert!((sim.base_confidence(2) - 0.6).abs() < 1e-9);
        assert!((sim.base_confidence(6) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_simulation_is_labelled() {
        let sim = HeuristicSimulator::default();
        let result = sim.simulate_with("reciclar lixo eletronico", &mut StdRng::seed_from_u64(7));
        assert!(result.success);
        assert_eq!(result.provider, SIMULATION_LABEL);
        let analysis = result.analysis.unwrap();
        assert!(analysis.starts_with("[SIMULATION]"));
        assert!(analysis.contains("reciclar, lixo"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_confidence_within_jitter_band() {
        let sim = HeuristicSimulator::default();
        let description = "coletar tampinhas de garrafa";
        let base = sim.base_confidence(sim.matched_keywords(description).len());

        for seed in 0..50 {
            let result = sim.simulate_with(description, &mut StdRng::seed_from_u64(seed));
            let confidence = result.confidence.unwrap();
            assert!((0.0..=1.0).contains(&confidence));
            // Rounding to 2 decimals may push the upper edge up by 0.005
            assert!(confidence >= base - 1e-9 && confidence <= base + 0.1 + 0.005 + 1e-9);
        }
    }

    #[test]
    fn test_repeated_runs_stay_close() {
        let sim = HeuristicSimulator::default();
        let a = sim.simulate("separar garrafa pet").confidence.unwrap();
        let b = sim.simulate("separar garrafa pet").confidence.unwrap();
        assert!((a - b).abs() <= 0.1 + 0.01);
    }

    #[test]
    fn test_confidence_rounded_to_two_decimals() {
        let sim = HeuristicSimulator::default();
        let result = sim.simulate_with("plant a tree", &mut StdRng::seed_from_u64(42));
        let confidence = result.confidence.unwrap();
        assert!(((confidence * 100.0).round() - confidence * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let config = SimulationConfig {
            jitter: 0.0,
            ..SimulationConfig::default()
        };
        let sim = HeuristicSimulator::new(&config);
        let result = sim.simulate("coletar lixo na praia");
        assert_eq!(result.confidence, Some(0.6));
    }

    #[test]
    fn test_clamped_when_config_overshoots() {
        let config = SimulationConfig {
            base_confidence: 1.0,
            cap: 1.0,
            jitter: 0.5,
            ..SimulationConfig::default()
        };
        let sim = HeuristicSimulator::new(&config);
        let result = sim.simulate_with("coletar lixo", &mut StdRng::seed_from_u64(1));
        assert_eq!(result.confidence, Some(1.0));
    }
}
