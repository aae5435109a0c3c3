//! Emotion classification for journal text.
//!
//! A remote text classifier returns a score per emotion label. The
//! [`EmotionClassifier`] turns that score list into a single decision:
//! normally the top label, except that a `neutral` top label loses to the
//! runner-up when the two are within [`NEUTRAL_SWITCH_GAP`] of each other.
//! Classification never fails from the caller's point of view; provider
//! errors produce a neutral fallback flagged as `errored`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moodlog_common::{AppError, AppResult, config::ClassifierConfig};
use moodlog_db::entities::EmotionLabel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Color for a label the palette does not know.
pub const FALLBACK_COLOR: &str = "#6B7280";

/// A neutral winner is replaced by the runner-up when the score gap is
/// strictly below this value.
pub const NEUTRAL_SWITCH_GAP: f64 = 0.20;

/// Trimmed texts shorter than this many characters are not sent to the
/// classifier.
pub const MIN_TEXT_CHARS: usize = 3;

// Scores are decimal fractions; keep `0.60 - 0.40` from landing just
// below the threshold.
const GAP_TOLERANCE: f64 = 1e-9;

/// Palette color of an emotion.
pub trait EmotionColor {
    /// `#RRGGBB` color shown for this emotion.
    fn color(self) -> &'static str;
}

impl EmotionColor for EmotionLabel {
    fn color(self) -> &'static str {
        match self {
            Self::Anger => "#DC2626",
            Self::Disgust => "#65A30D",
            Self::Fear => "#7C3AED",
            Self::Joy => "#FBBF24",
            Self::Neutral => "#FFFFFF",
            Self::Sadness => "#2563EB",
            Self::Surprise => "#EC4899",
        }
    }
}

/// The full label to color table.
#[must_use]
pub fn palette() -> BTreeMap<&'static str, &'static str> {
    EmotionLabel::ALL
        .into_iter()
        .map(|label| (label.as_str(), label.color()))
        .collect()
}

/// A single label score as returned by a classification provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    /// Convenience constructor.
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Score of one emotion in a [`Classification`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionScore {
    pub emotion: String,
    pub score: f64,
}

/// Outcome of classifying one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Final emotion after neutral disambiguation.
    pub emotion: EmotionLabel,
    /// Score of the final emotion.
    pub confidence: f64,
    /// Palette color of the final emotion.
    pub color: String,
    /// Every label score, highest first. Empty when short-circuited or errored.
    pub all_scores: Vec<EmotionScore>,
    /// The provider failed and this is the fallback result.
    pub errored: bool,
}

impl Classification {
    /// Result for text too short to classify.
    #[must_use]
    pub fn short_text() -> Self {
        Self {
            emotion: EmotionLabel::Neutral,
            confidence: 1.0,
            color: EmotionLabel::Neutral.color().to_string(),
            all_scores: Vec::new(),
            errored: false,
        }
    }

    /// Result when the provider fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            emotion: EmotionLabel::Neutral,
            confidence: 0.5,
            color: EmotionLabel::Neutral.color().to_string(),
            all_scores: Vec::new(),
            errored: true,
        }
    }
}

/// Remote text classification provider.
#[async_trait]
pub trait EmotionClassificationService: Send + Sync {
    /// Score every emotion label for `text`. Order is not significant.
    async fn classify(&self, text: &str) -> AppResult<Vec<LabelScore>>;
}

/// Hugging Face Inference API text-classification provider.
#[derive(Clone)]
pub struct HuggingFaceClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HuggingFaceClassifier {
    /// Create a provider from configuration.
    pub fn new(config: &ClassifierConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build classifier client: {e}")))?;

        if config.api_key.is_none() {
            warn!("No classifier API key configured, requests will be rate limited");
        }

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }
}

#[async_trait]
impl EmotionClassificationService for HuggingFaceClassifier {
    async fn classify(&self, text: &str) -> AppResult<Vec<LabelScore>> {
        let body = serde_json::json!({
            "inputs": text,
            "parameters": { "top_k": EmotionLabel::ALL.len() },
        });

        let mut request = self.http_client.post(self.model_url()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            AppError::ExternalService(format!("Emotion classifier request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Emotion classifier API error: {status} - {body}"
            )));
        }

        // Single inputs come back either nested per input or flat.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum InferenceResponse {
            Batched(Vec<Vec<LabelScore>>),
            Flat(Vec<LabelScore>),
        }

        let parsed: InferenceResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse emotion classifier response: {e}"))
        })?;

        Ok(match parsed {
            InferenceResponse::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
            InferenceResponse::Flat(scores) => scores,
        })
    }
}

/// Provider used when classification is disabled: everything is neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpClassificationService;

#[async_trait]
impl EmotionClassificationService for NoOpClassificationService {
    async fn classify(&self, _text: &str) -> AppResult<Vec<LabelScore>> {
        Ok(vec![LabelScore::new(EmotionLabel::Neutral.as_str(), 1.0)])
    }
}

/// Decides a single emotion for a text.
#[derive(Clone)]
pub struct EmotionClassifier {
    provider: Arc<dyn EmotionClassificationService>,
}

impl EmotionClassifier {
    /// Create a classifier over a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn EmotionClassificationService>) -> Self {
        Self { provider }
    }

    /// Build the classifier described by configuration.
    pub fn from_config(config: &ClassifierConfig) -> AppResult<Self> {
        if !config.enabled {
            info!("Emotion classification disabled, entries will be neutral");
            return Ok(Self::new(Arc::new(NoOpClassificationService)));
        }

        info!(model = %config.model, "Using Hugging Face emotion classifier");
        Ok(Self::new(Arc::new(HuggingFaceClassifier::new(config)?)))
    }

    /// Classify `text`. Never fails.
    pub async fn classify(&self, text: &str) -> Classification {
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            debug!("Text too short to classify, using neutral");
            return Classification::short_text();
        }

        match self.provider.classify(text).await {
            Ok(scores) => decide(scores).unwrap_or_else(|| {
                warn!("Emotion classifier returned no scores, using neutral fallback");
                Classification::fallback()
            }),
            Err(e) => {
                warn!(error = %e, "Emotion classification failed, using neutral fallback");
                Classification::fallback()
            }
        }
    }
}

/// Pick the final emotion from a provider score list.
///
/// Returns `None` for an empty list.
#[must_use]
pub fn decide(mut scores: Vec<LabelScore>) -> Option<Classification> {
    // Providers usually sort already; a stable sort keeps their order on ties.
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    let all_scores: Vec<EmotionScore> = scores
        .iter()
        .map(|s| EmotionScore {
            emotion: s.label.trim().to_lowercase(),
            score: s.score,
        })
        .collect();

    let top = all_scores.first()?;
    debug!(scores = ?all_scores, "Emotion scores");

    let mut chosen = top;
    if EmotionLabel::from_label(&top.emotion) == Some(EmotionLabel::Neutral)
        && let Some(second) = all_scores.get(1)
    {
        let gap = top.score - second.score;
        if gap < NEUTRAL_SWITCH_GAP - GAP_TOLERANCE {
            info!(
                second = %second.emotion,
                gap,
                "Neutral lead too small, using runner-up emotion"
            );
            chosen = second;
        }
    }

    let (emotion, color) = match EmotionLabel::from_label(&chosen.emotion) {
        Some(label) => (label, label.color()),
        None => {
            warn!(label = %chosen.emotion, "Unknown emotion label from classifier");
            (EmotionLabel::Neutral, FALLBACK_COLOR)
        }
    };
    let confidence = chosen.score;

    Some(Classification {
        emotion,
        confidence,
        color: color.to_string(),
        all_scores,
        errored: false,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        scores: Vec<LabelScore>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(scores: Vec<LabelScore>) -> Arc<Self> {
            Arc::new(Self {
                scores,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EmotionClassificationService for StubProvider {
        async fn classify(&self, _text: &str) -> AppResult<Vec<LabelScore>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.scores.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmotionClassificationService for FailingProvider {
        async fn classify(&self, _text: &str) -> AppResult<Vec<LabelScore>> {
            Err(AppError::ExternalService("model loading".to_string()))
        }
    }

    #[test]
    fn test_palette_colors() {
        assert_eq!(EmotionLabel::Anger.color(), "#DC2626");
        assert_eq!(EmotionLabel::Joy.color(), "#FBBF24");
        assert_eq!(EmotionLabel::Neutral.color(), "#FFFFFF");
        assert_eq!(palette().len(), 7);
        assert_eq!(palette()["sadness"], "#2563EB");
    }

    #[tokio::test]
    async fn test_clear_winner() {
        let provider = StubProvider::new(vec![
            LabelScore::new("sadness", 0.1),
            LabelScore::new("joy", 0.8),
            LabelScore::new("neutral", 0.1),
        ]);
        let result = EmotionClassifier::new(provider).classify("What a lovely day").await;

        assert_eq!(result.emotion, EmotionLabel::Joy);
        assert!((result.confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(result.color, "#FBBF24");
        assert_eq!(result.all_scores[0].emotion, "joy");
        assert!(!result.errored);
    }

    #[tokio::test]
    async fn test_narrow_neutral_lead_switches_to_runner_up() {
        let provider = StubProvider::new(vec![
            LabelScore::new("neutral", 0.50),
            LabelScore::new("sadness", 0.31),
            LabelScore::new("joy", 0.19),
        ]);
        let result = EmotionClassifier::new(provider).classify("It rained all day").await;

        assert_eq!(result.emotion, EmotionLabel::Sadness);
        assert!((result.confidence - 0.31).abs() < f64::EPSILON);
        assert_eq!(result.color, "#2563EB");
    }

    #[tokio::test]
    async fn test_gap_of_exactly_threshold_keeps_neutral() {
        let provider = StubProvider::new(vec![
            LabelScore::new("neutral", 0.60),
            LabelScore::new("anger", 0.40),
        ]);
        let result = EmotionClassifier::new(provider).classify("Went to the shop").await;

        assert_eq!(result.emotion, EmotionLabel::Neutral);
        assert!((result.confidence - 0.60).abs() < f64::EPSILON);
        assert_eq!(result.color, "#FFFFFF");
    }

    #[tokio::test]
    async fn test_non_neutral_top_never_switches() {
        let provider = StubProvider::new(vec![
            LabelScore::new("fear", 0.41),
            LabelScore::new("neutral", 0.40),
        ]);
        let result = EmotionClassifier::new(provider).classify("Exam tomorrow").await;
        assert_eq!(result.emotion, EmotionLabel::Fear);
    }

    #[tokio::test]
    async fn test_single_neutral_score() {
        let provider = StubProvider::new(vec![LabelScore::new("neutral", 0.9)]);
        let result = EmotionClassifier::new(provider).classify("Nothing much").await;
        assert_eq!(result.emotion, EmotionLabel::Neutral);
    }

    #[tokio::test]
    async fn test_short_text_skips_provider() {
        let provider = StubProvider::new(vec![LabelScore::new("joy", 1.0)]);
        let classifier = EmotionClassifier::new(provider.clone());

        let result = classifier.classify("  ok  ").await;

        assert_eq!(result, Classification::short_text());
        assert_eq!(result.confidence, 1.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let result = EmotionClassifier::new(Arc::new(FailingProvider))
            .classify("Long enough text")
            .await;

        assert_eq!(result.emotion, EmotionLabel::Neutral);
        assert!((result.confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.color, "#FFFFFF");
        assert!(result.all_scores.is_empty());
        assert!(result.errored);
    }

    #[tokio::test]
    async fn test_empty_scores_fall_back() {
        let provider = StubProvider::new(Vec::new());
        let result = EmotionClassifier::new(provider).classify("Long enough text").await;
        assert!(result.errored);
    }

    #[test]
    fn test_unknown_winning_label_uses_gray() {
        let result = decide(vec![LabelScore::new("boredom", 0.9)]).unwrap();
        assert_eq!(result.emotion, EmotionLabel::Neutral);
        assert_eq!(result.color, FALLBACK_COLOR);
    }

    #[tokio::test]
    async fn test_disabled_classifier_is_neutral() {
        let config = ClassifierConfig {
            enabled: false,
            ..ClassifierConfig::default()
        };
        let result = EmotionClassifier::from_config(&config)
            .unwrap()
            .classify("I am thrilled")
            .await;

        assert_eq!(result.emotion, EmotionLabel::Neutral);
        assert!(!result.errored);
    }
}
