//! Rule-based intent matching for the chatbot.
//!
//! Cheap regex classification runs before any LLM call; only messages no
//! rule understands fall through to the model.

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Thanks,
    PriceQuery { product: String },
    StockQuery { product: String },
    HumanHandoff,
}

static GREETING_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^\s*(hi|hiya|hello|hey|good\s+(morning|afternoon|evening))\b")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static THANKS_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"\b(thanks|thank\s+you|thx|cheers)\b")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static HANDOFF_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"\b(human|real\s+person|an?\s+agent|speak\s+(to|with)\s+someone|talk\s+(to|with)\s+someone)\b")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static PRICE_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"(?:how\s+much\s+(?:is|are|for)|price\s+(?:of|for)|cost\s+of)\s+(?:the\s+|an?\s+)?(.+?)\s*\??\s*$")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static STOCK_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"(?:do\s+you\s+have|is\s+there|got|any)\s+(?:the\s+|an?\s+|any\s+)?(.+?)\s+(?:in\s+stock|left|available)\s*\??\s*$")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

/// Classifies a customer message, or `None` when no rule applies.
///
/// Order matters: a handoff request wins over everything, and the product
/// lookups win over the greeting so "hi, how much is the mug?" asks about
/// the mug.
#[must_use]
pub fn classify(text: &str) -> Option<Intent> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if HANDOFF_RE.is_match(&normalized) {
        return Some(Intent::HumanHandoff);
    }
    if let Some(caps) = PRICE_RE.captures(&normalized) {
        if let Some(product) = caps.get(1) {
            return Some(Intent::PriceQuery {
                product: product.as_str().trim().to_string(),
            });
        }
    }
    if let Some(caps) = STOCK_RE.captures(&normalized) {
        if let Some(product) = caps.get(1) {
            return Some(Intent::StockQuery {
                product: product.as_str().trim().to_string(),
            });
        }
    }
    if GREETING_RE.is_match(&normalized) {
        return Some(Intent::Greeting);
    }
    if THANKS_RE.is_match(&normalized) {
        return Some(Intent::Thanks);
    }
    None
}
