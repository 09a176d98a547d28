//! Sentiment models: text in, polarity in [-1, 1] out.

use vader_sentiment::SentimentIntensityAnalyzer;

/// A pure text → polarity function.
///
/// Implementations must never fail: any input, including the empty string,
/// maps to a polarity. Callers clamp the result into [-1, 1].
pub trait SentimentModel: Send + Sync {
    /// Human-readable name, reported with results.
    fn name(&self) -> &str;

    /// Polarity of `text`; negative is bearish, positive is bullish.
    fn polarity(&self, text: &str) -> f64;
}

impl<F> SentimentModel for F
where
    F: Fn(&str) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn polarity(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Lexicon-based scorer using VADER's compound score.
pub struct VaderModel {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderModel {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentModel for VaderModel {
    fn name(&self) -> &str {
        "vader"
    }

    fn polarity(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        scores.get("compound").copied().unwrap_or(0.0)
    }
}

/// Apply a model and force the result into [-1, 1]. Non-finite output
/// becomes neutral.
pub fn bounded_polarity(model: &dyn SentimentModel, text: &str) -> f64 {
    let p = model.polarity(text);
    if p.is_finite() {
        p.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
