//! Assessment Engine
//!
//! Decides whether a questionnaire is complete for the active
//! [`Instrument`], asks the [`Classifier`] for a verdict, and validates the
//! answer. Classification failures never propagate: they are logged and
//! reported as "no result".

pub mod classifier;
pub mod instrument;

pub use classifier::{ClassificationError, Classifier, DisabledClassifier, OpenAiClassifier};
pub use instrument::Instrument;

use leadboard_common::{Assessment, AssessmentResult, Overall, Questionnaire};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AssessmentEngine {
    instrument: Instrument,
    classifier: Arc<dyn Classifier>,
}

impl AssessmentEngine {
    pub fn new(instrument: Instrument, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            instrument,
            classifier,
        }
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn is_complete(&self, questionnaire: &Questionnaire) -> bool {
        self.instrument.is_complete(questionnaire)
    }

    /// Classify a complete questionnaire
    ///
    /// Returns `None` without any network call when fewer than the
    /// instrument's threshold of answers are present, and `None` when the
    /// classifier fails or returns something unusable.
    pub async fn score(&self, questionnaire: &Questionnaire) -> Option<AssessmentResult> {
        let answered = self.instrument.answered(questionnaire);
        let threshold = self.instrument.threshold();
        if answered < threshold {
            debug!(answered, threshold, "Questionnaire incomplete, not scoring");
            return None;
        }

        let prompt = self.instrument.render_prompt(questionnaire);
        let result = self
            .classifier
            .classify(&prompt)
            .await
            .and_then(|content| validate_response(&content));

        match result {
            Ok(result) => {
                info!(
                    instrument = %self.instrument,
                    likelihood = result.likelihood,
                    benefits = result.benefits,
                    overall = result.overall.label(),
                    "Questionnaire scored"
                );
                Some(result)
            }
            Err(e) => {
                warn!(instrument = %self.instrument, error = %e, "Classification failed");
                None
            }
        }
    }

    /// Assessment for a questionnaire: `Scored` when complete and
    /// classification succeeded, `Incomplete` otherwise
    pub async fn assess(&self, questionnaire: &Questionnaire) -> Assessment {
        match self.score(questionnaire).await {
            Some(result) => Assessment::Scored(result),
            None => Assessment::Incomplete,
        }
    }
}

/// Check the classifier's JSON content
///
/// Both sub-scores must be finite numbers in `[0, 10]` and `overall` one of
/// the three intent labels.
pub fn validate_response(content: &str) -> Result<AssessmentResult, ClassificationError> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| ClassificationError::Parse(e.to_string()))?;

    let score = |key: &str| -> Result<f64, ClassificationError> {
        let n = value
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| ClassificationError::InvalidResponse(format!("'{}' is not a number", key)))?;
        if !n.is_finite() || !(0.0..=10.0).contains(&n) {
            return Err(ClassificationError::InvalidResponse(format!(
                "'{}' = {} is outside 0-10",
                key, n
            )));
        }
        Ok(n)
    };

    let likelihood = score("likelihood")?;
    let benefits = score("benefits")?;

    let overall = value
        .get("overall")
        .and_then(Value::as_str)
        .and_then(Overall::from_label)
        .ok_or_else(|| {
            ClassificationError::InvalidResponse("'overall' is not a known intent label".to_string())
        })?;

    Ok(AssessmentResult {
        likelihood,
        benefits,
        overall,
    })
}
