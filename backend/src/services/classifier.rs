//! Language and intent classification
//!
//! Two tiers:
//! 1. Keyword matching against per-domain vocabularies in English,
//!    romanized Hindi and Devanagari
//! 2. Semantic classification through the text generator when the keyword
//!    tier is weak or ambiguous
//!
//! If neither tier produces a confident answer, the query is routed to the
//! `general` domain with a clarification request.

use serde::Deserialize;
use shared::{ClassificationSource, CropType, Domain, DomainClassification, Language};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClassifierConfig;
use crate::error::{AppError, AppResult};
use crate::external::{GenerationPrompt, TextGenerator};

/// Confidence reported when the query has to be clarified
pub const CLARIFICATION_CONFIDENCE: f64 = 0.3;

// ============================================================================
// Vocabularies
// ============================================================================

/// Per-domain keywords. Latin terms match whole words; Devanagari terms
/// match as substrings so inflected forms are still found.
const VOCABULARY: &[(Domain, &[&str])] = &[
    (
        Domain::CropSelection,
        &[
            "which crop", "what crop", "crop selection", "best crop", "sow", "sowing",
            "variety", "varieties", "seed", "seeds", "kaun si fasal", "konsi fasal",
            "kya ugaye", "beej", "buvai", "bowai", "कौन सी फसल", "बीज", "बुवाई", "किस्म",
        ],
    ),
    (
        Domain::PestManagement,
        &[
            "pest", "pests", "insect", "insects", "disease", "fungus", "fungal", "blight",
            "aphid", "aphids", "spray", "pesticide", "keet", "keeda", "keede", "kide",
            "bimari", "dawai", "rog", "कीट", "कीड़े", "कीड़ा", "बीमारी", "रोग", "स्प्रे",
            "दवाई", "इल्ली",
        ],
    ),
    (
        Domain::Irrigation,
        &[
            "water", "watering", "irrigation", "irrigate", "drip", "sprinkler", "pani",
            "paani", "sinchai", "पानी", "सिंचाई",
        ],
    ),
    (
        Domain::FinancePolicy,
        &[
            "loan", "credit", "subsidy", "insurance", "scheme", "kcc", "pm kisan", "karza",
            "karz", "bima", "yojana", "ऋण", "कर्ज़", "कर्ज", "सब्सिडी", "बीमा", "योजना",
        ],
    ),
    (
        Domain::MarketTiming,
        &[
            "sell", "selling", "market", "price", "prices", "mandi", "bhav", "rate", "msp",
            "bechna", "bechun", "daam", "बेचना", "बेचूं", "मंडी", "भाव", "दाम",
        ],
    ),
    (
        Domain::HarvestPlanning,
        &[
            "harvest", "harvesting", "maturity", "reaping", "katai", "kataai", "कटाई",
            "पकना", "पकने",
        ],
    ),
    (
        Domain::InputMaterials,
        &[
            "fertilizer", "fertiliser", "manure", "compost", "npk", "dap", "urea", "potash",
            "khad", "urvarak", "खाद", "उर्वरक", "गोबर", "यूरिया",
        ],
    ),
];

/// Function words that mark romanized Hindi
const HINDI_MARKERS: &[&str] = &[
    "hai", "hain", "kya", "kab", "kaise", "kitna", "mera", "meri", "mere", "ko", "ka", "ki",
    "ke", "mein", "karna", "karein", "kare", "chahiye", "nahi", "aur", "se", "par", "dena",
    "lagana", "kaun", "konsi", "bhai", "ji", "khet", "kheti", "fasal", "pani", "abhi",
];

/// Function words that mark English
const ENGLISH_MARKERS: &[&str] = &[
    "the", "is", "are", "what", "when", "how", "should", "my", "i", "to", "for", "which",
    "of", "in", "and", "can", "do", "does", "field", "crop", "will", "this", "best",
];

// ============================================================================
// Text normalization
// ============================================================================

/// Query text prepared for term matching
struct QueryText {
    lowered: String,
    /// Space-padded, punctuation-free tokens
    padded: String,
    tokens: Vec<String>,
}

impl QueryText {
    fn new(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let tokens: Vec<String> = lowered
            .split(|c: char| !c.is_alphanumeric() && !is_devanagari(c))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let padded = format!(" {} ", tokens.join(" "));
        Self {
            lowered,
            padded,
            tokens,
        }
    }

    fn contains(&self, term: &str) -> bool {
        if term.is_ascii() {
            self.padded.contains(&format!(" {} ", term))
        } else {
            self.lowered.contains(term)
        }
    }

    fn count_markers(&self, markers: &[&str]) -> usize {
        self.tokens
            .iter()
            .filter(|t| markers.contains(&t.as_str()))
            .count()
    }
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

/// Detect the query language from scripts and function words
pub fn detect_language(text: &str) -> Language {
    let has_devanagari = text.chars().any(is_devanagari);
    let has_latin = text.chars().any(|c| c.is_ascii_alphabetic());

    match (has_latin, has_devanagari) {
        (true, true) => Language::Mixed,
        (false, true) => Language::Hindi,
        (false, false) => Language::English,
        (true, false) => {
            let query = QueryText::new(text);
            let hindi = query.count_markers(HINDI_MARKERS);
            let english = query.count_markers(ENGLISH_MARKERS);
            if hindi == 0 {
                Language::English
            } else if english == 0 || hindi >= english * 2 {
                Language::Hindi
            } else {
                Language::Mixed
            }
        }
    }
}

/// First calibrated crop mentioned in the query
pub fn detect_crop(text: &str) -> Option<CropType> {
    let query = QueryText::new(text);
    CropType::ALL
        .into_iter()
        .find(|crop| crop.keywords().iter().any(|k| query.contains(k)))
}

// ============================================================================
// Keyword tier
// ============================================================================

/// Keyword-tier score for one domain
#[derive(Debug, Clone, PartialEq)]
pub struct DomainScore {
    pub domain: Domain,
    pub hits: u32,
    pub confidence: f64,
    pub matched: Vec<&'static str>,
}

/// Map hit counts to a confidence in [0, 1]
///
/// Strength grows with the domain's own hits; the share term rewards
/// queries that point at one domain only.
pub fn hit_confidence(hits: u32, total_hits: u32) -> f64 {
    if hits == 0 || total_hits == 0 {
        return 0.0;
    }
    let strength = (0.55 + 0.15 * (hits as f64 - 1.0)).min(1.0);
    let share = hits as f64 / total_hits as f64;
    (strength * (0.5 + 0.5 * share)).clamp(0.0, 1.0)
}

/// Score every domain with at least one hit, best first
///
/// Ordered by raw hit count, then by [`Domain::PRIORITY`].
pub fn score_domains(text: &str) -> Vec<DomainScore> {
    let query = QueryText::new(text);

    let mut scores: Vec<DomainScore> = VOCABULARY
        .iter()
        .filter_map(|(domain, terms)| {
            let matched: Vec<&'static str> =
                terms.iter().copied().filter(|t| query.contains(t)).collect();
            (!matched.is_empty()).then(|| DomainScore {
                domain: *domain,
                hits: matched.len() as u32,
                confidence: 0.0,
                matched,
            })
        })
        .collect();

    let total: u32 = scores.iter().map(|s| s.hits).sum();
    for score in &mut scores {
        score.confidence = hit_confidence(score.hits, total);
    }

    scores.sort_by(|a, b| {
        b.hits
            .cmp(&a.hits)
            .then_with(|| a.domain.priority_rank().cmp(&b.domain.priority_rank()))
    });
    scores
}

// ============================================================================
// Semantic tier
// ============================================================================

#[derive(Debug, Deserialize)]
struct SemanticAnswer {
    #[serde(default)]
    primary_domains: Vec<String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    requires_clarification: bool,
}

/// Parsed semantic classification
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticClassification {
    pub domain: Domain,
    pub confidence: f64,
    pub reasoning: String,
    pub requires_clarification: bool,
}

/// Extract the JSON object from a generator answer
///
/// Tolerates code fences and prose around the object. Unknown domain names
/// are skipped.
pub fn parse_semantic_answer(raw: &str) -> AppResult<SemanticClassification> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if e > s => &raw[s..=e],
        _ => {
            return Err(AppError::GenerationFailed(
                "classification answer has no JSON object".to_string(),
            ))
        }
    };

    let answer: SemanticAnswer = serde_json::from_str(body)
        .map_err(|e| AppError::GenerationFailed(format!("invalid classification JSON: {}", e)))?;

    let domain = answer
        .primary_domains
        .iter()
        .find_map(|d| Domain::parse(d))
        .ok_or_else(|| {
            AppError::GenerationFailed("classification named no known domain".to_string())
        })?;

    let confidence = if answer.confidence.is_finite() {
        answer.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(SemanticClassification {
        domain,
        confidence,
        reasoning: answer.reasoning,
        requires_clarification: answer.requires_clarification,
    })
}

fn semantic_prompt(text: &str) -> GenerationPrompt {
    let domains = Domain::ALL
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    GenerationPrompt {
        system: "You route questions from Indian farmers to agricultural specialists. \
                 Questions may be in English, Hindi, or a mix of both."
            .to_string(),
        user: format!(
            "Classify the farmer's question into one of: {}.\n\
             Answer with a JSON object only: \
             {{\"primary_domains\": [..], \"confidence\": 0.0-1.0, \
             \"reasoning\": \"..\", \"requires_clarification\": true|false}}\n\n\
             Question: {}",
            domains, text
        ),
        expect_json: true,
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Two-tier intent classifier
#[derive(Clone)]
pub struct IntentClassifier {
    settings: ClassifierConfig,
    semantic: Option<Arc<dyn TextGenerator>>,
    semantic_timeout: Duration,
}

impl IntentClassifier {
    pub fn new(
        settings: ClassifierConfig,
        semantic: Option<Arc<dyn TextGenerator>>,
        semantic_timeout: Duration,
    ) -> Self {
        Self {
            settings,
            semantic,
            semantic_timeout,
        }
    }

    /// Keyword tier only
    pub fn pattern_only(settings: ClassifierConfig) -> Self {
        Self::new(settings, None, Duration::from_secs(0))
    }

    /// Classify a query; never fails, ambiguity becomes a clarification request
    pub async fn classify(&self, text: &str) -> DomainClassification {
        let language = detect_language(text);
        let crop = detect_crop(text);
        let scores = score_domains(text);

        let mut classification = match self.decide(&scores, language) {
            Ok(classification) => classification,
            Err(AppError::ClassificationAmbiguous { candidates }) => {
                tracing::debug!(
                    "Keyword tier inconclusive for {:?}, trying semantic tier",
                    candidates
                );
                self.semantic_or_clarify(text, language, &scores, candidates)
                    .await
            }
            Err(other) => {
                tracing::warn!("Unexpected classifier error: {}", other);
                DomainClassification::needs_clarification(
                    language,
                    CLARIFICATION_CONFIDENCE,
                    Vec::new(),
                    other.to_string(),
                )
            }
        };

        classification.crop = crop;
        classification.keyword_hits = scores.iter().map(|s| s.hits).sum();

        tracing::debug!(
            domain = %classification.domain,
            confidence = classification.confidence,
            language = %classification.language,
            source = ?classification.source,
            "Query classified"
        );
        classification
    }

    /// Accept the keyword tier result, or report which domains compete
    fn decide(&self, scores: &[DomainScore], language: Language) -> AppResult<DomainClassification> {
        let Some(top) = scores.first() else {
            return Err(AppError::ClassificationAmbiguous {
                candidates: Vec::new(),
            });
        };

        let tied: Vec<Domain> = scores
            .iter()
            .filter(|s| top.confidence - s.confidence < self.settings.tie_epsilon)
            .map(|s| s.domain)
            .collect();

        if top.confidence < self.settings.min_confidence || tied.len() > 1 {
            let mut candidates = tied;
            if candidates.len() < 2 {
                candidates = scores.iter().take(3).map(|s| s.domain).collect();
            }
            return Err(AppError::ClassificationAmbiguous { candidates });
        }

        let reasoning = format!(
            "Matched {} keyword(s) for {}: {}",
            top.hits,
            top.domain,
            top.matched.join(", ")
        );
        Ok(DomainClassification::new(
            top.domain,
            top.confidence,
            reasoning,
            language,
            ClassificationSource::Pattern,
        ))
    }

    async fn semantic_or_clarify(
        &self,
        text: &str,
        language: Language,
        scores: &[DomainScore],
        candidates: Vec<Domain>,
    ) -> DomainClassification {
        match self.classify_semantically(text).await {
            Ok(semantic) => {
                let pattern_confidence = scores
                    .iter()
                    .find(|s| s.domain == semantic.domain)
                    .map(|s| s.confidence);
                let confidence = match pattern_confidence {
                    Some(p) => (p + semantic.confidence) / 2.0,
                    None => semantic.confidence,
                };

                if semantic.requires_clarification || confidence < self.settings.min_confidence {
                    return DomainClassification::needs_clarification(
                        language,
                        CLARIFICATION_CONFIDENCE,
                        merge_candidates(semantic.domain, candidates),
                        semantic.reasoning,
                    );
                }

                DomainClassification::new(
                    semantic.domain,
                    confidence,
                    semantic.reasoning,
                    language,
                    ClassificationSource::Semantic,
                )
            }
            Err(err) => {
                tracing::warn!("Semantic classification unavailable: {}", err);
                let reasoning = if candidates.is_empty() {
                    "No advisory keywords recognised".to_string()
                } else {
                    format!(
                        "Query matches several domains: {}",
                        candidates
                            .iter()
                            .map(|d| d.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                };
                DomainClassification::needs_clarification(
                    language,
                    CLARIFICATION_CONFIDENCE,
                    candidates,
                    reasoning,
                )
            }
        }
    }

    async fn classify_semantically(&self, text: &str) -> AppResult<SemanticClassification> {
        let generator = self.semantic.as_ref().ok_or_else(|| {
            AppError::GenerationFailed("no semantic classifier configured".to_string())
        })?;

        let prompt = semantic_prompt(text);
        let raw = tokio::time::timeout(self.semantic_timeout, generator.complete(&prompt))
            .await
            .map_err(|_| AppError::GenerationTimeout(self.semantic_timeout.as_millis() as u64))??;

        parse_semantic_answer(&raw)
    }
}

fn merge_candidates(first: Domain, rest: Vec<Domain>) -> Vec<Domain> {
    let mut merged = vec![first];
    merged.extend(rest.into_iter().filter(|d| *d != first));
    merged
}
