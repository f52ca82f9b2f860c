//! Applies a calibrated threshold to batch scores; attaches explanations to
//! anomalous rows.

use super::explain::explain;
use crate::error::{PipelineError, ScoringError};
use crate::features::FeatureVector;
use crate::ingest::RawTransaction;
use crate::model::Scorer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Verdict for one input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    /// 0-based position in the submitted batch
    pub index: usize,
    pub score: f64,
    pub is_anomaly: bool,
    /// Empty unless `is_anomaly`
    pub reason: String,
}

/// Threshold holder. Never computes its own threshold, only consumes one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyClassifier {
    threshold: f64,
}

impl AnomalyClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strictly below the threshold is anomalous.
    pub fn is_anomaly(&self, score: f64) -> bool {
        score < self.threshold
    }

    pub fn classify(
        &self,
        raw_rows: &[RawTransaction],
        features: &[FeatureVector],
        scorer: &dyn Scorer,
    ) -> Result<Vec<ScoredResult>, PipelineError> {
        classify(raw_rows, features, scorer, self.threshold)
    }
}

impl Default for AnomalyClassifier {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Score the whole batch once and classify each row. Any scorer failure
/// fails the batch; there are no partial results.
pub fn classify(
    raw_rows: &[RawTransaction],
    features: &[FeatureVector],
    scorer: &dyn Scorer,
    threshold: f64,
) -> Result<Vec<ScoredResult>, PipelineError> {
    if raw_rows.len() != features.len() {
        return Err(ScoringError::ShapeMismatch {
            expected: raw_rows.len(),
            got: features.len(),
        }
        .into());
    }

    let scores = scorer.score(features)?;
    if scores.len() != features.len() {
        return Err(ScoringError::ShapeMismatch {
            expected: features.len(),
            got: scores.len(),
        }
        .into());
    }
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(ScoringError::NonFinite { index }.into());
    }

    let classifier = AnomalyClassifier::new(threshold);
    let results: Vec<ScoredResult> = scores
        .into_iter()
        .zip(raw_rows.iter().zip(features))
        .enumerate()
        .map(|(index, (score, (raw, fv)))| {
            let is_anomaly = classifier.is_anomaly(score);
            ScoredResult {
                index,
                score,
                is_anomaly,
                reason: if is_anomaly {
                    explain(raw, fv)
                } else {
                    String::new()
                },
            }
        })
        .collect();

    debug!(
        scorer = scorer.name(),
        rows = results.len(),
        flagged = results.iter().filter(|r| r.is_anomaly).count(),
        threshold,
        "batch classified"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::build_features;
    use chrono::Utc;

    /// Returns preset scores, ignoring the input.
    struct Preset(Vec<f64>);

    impl Scorer for Preset {
        fn score(&self, _features: &[FeatureVector]) -> Result<Vec<f64>, ScoringError> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &str {
            "preset"
        }
    }

    struct Failing;

    impl Scorer for Failing {
        fn score(&self, _features: &[FeatureVector]) -> Result<Vec<f64>, ScoringError> {
            Err(ScoringError::Backend("bad shape".into()))
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    fn batch(n: usize) -> (Vec<RawTransaction>, Vec<FeatureVector>) {
        let rows: Vec<RawTransaction> = (0..n)
            .map(|i| RawTransaction::new("2024-01-01", 100.0 + i as f64, "A", "X"))
            .collect();
        let fv = build_features(&rows, Utc::now());
        (rows, fv)
    }

    #[test]
    fn threshold_is_strict() {
        let (rows, fv) = batch(3);
        let out = classify(&rows, &fv, &Preset(vec![-0.1, 0.0, 0.1]), 0.0).unwrap();
        let flags: Vec<bool> = out.iter().map(|r| r.is_anomaly).collect();
        assert_eq!(flags, vec![true, false, false]);
        assert!(!out[0].reason.is_empty());
        assert!(out[1].reason.is_empty());
        assert!(out[2].reason.is_empty());
    }

    #[test]
    fn preserves_order_and_index() {
        let (rows, fv) = batch(5);
        let out = AnomalyClassifier::default()
            .classify(&rows, &fv, &Preset(vec![0.3, 0.1, 0.5, 0.2, 0.4]))
            .unwrap();
        for (i, r) in out.iter().enumerate() {
            assert_eq!(r.index, i);
        }
        assert_eq!(out[2].score, 0.5);
    }

    #[test]
    fn scorer_failure_fails_the_batch() {
        let (rows, fv) = batch(2);
        let err = classify(&rows, &fv, &Failing, 0.0).unwrap_err();
        assert!(matches!(err, PipelineError::Scoring(ScoringError::Backend(_))));
    }

    #[test]
    fn wrong_score_count_fails_the_batch() {
        let (rows, fv) = batch(3);
        let err = classify(&rows, &fv, &Preset(vec![0.1, 0.2]), 0.0).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Scoring(ScoringError::ShapeMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let (rows, fv) = batch(3);
        assert!(classify(&rows[..2], &fv, &Preset(vec![0.0; 3]), 0.0).is_err());
    }

    #[test]
    fn nan_scores_are_rejected() {
        let (rows, fv) = batch(2);
        let err = classify(&rows, &fv, &Preset(vec![0.1, f64::NAN]), 0.0).unwrap_err();
        assert!(matches!(err, PipelineError::Scoring(ScoringError::NonFinite { index: 1 })));
    }

    #[test]
    fn serializes_camel_case() {
        let r = ScoredResult {
            index: 0,
            score: -0.5,
            is_anomaly: true,
            reason: "x".into(),
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["isAnomaly"], true);
        assert_eq!(v["index"], 0);
    }
}
