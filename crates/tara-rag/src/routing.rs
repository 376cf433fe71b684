//! Query routing between tabular analysis and narrative retrieval
//!
//! Keyword heuristics only. A question goes to analysis when tabular data is
//! loaded and it reads like a computation request; everything else is answered
//! from retrieved context. Misses are cheap (the narrative path still sees the
//! dataset descriptors), so the vocabulary stays conservative.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryRoute {
    /// Direct computation over loaded datasets
    Analysis,
    /// Retrieval-augmented conversation
    Narrative,
}

impl QueryRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryRoute::Analysis => "analysis",
            QueryRoute::Narrative => "narrative",
        }
    }
}

impl fmt::Display for QueryRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule that sent a question to analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRule {
    Keyword(&'static str),
    VerbMetric {
        verb: &'static str,
        metric: &'static str,
    },
    Cardinality(&'static str),
    Directive(&'static str),
    Superlative {
        term: &'static str,
        noun: &'static str,
    },
}

impl fmt::Display for RouteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteRule::Keyword(k) => write!(f, "keyword '{}'", k),
            RouteRule::VerbMetric { verb, metric } => write!(f, "verb-metric '{} {}'", verb, metric),
            RouteRule::Cardinality(noun) => write!(f, "cardinality 'how many {}'", noun),
            RouteRule::Directive(d) => write!(f, "directive '{}'", d),
            RouteRule::Superlative { term, noun } => write!(f, "superlative '{}' with '{}'", term, noun),
        }
    }
}

/// Calculation verbs, statistical nouns, visualization terms
const ANALYSIS_KEYWORDS: &[&str] = &[
    "calculate",
    "compute",
    "average",
    "median",
    "standard deviation",
    "std dev",
    "variance",
    "correlation",
    "regression",
    "percentile",
    "quartile",
    "statistics",
    "statistical",
    "aggregate",
    "distribution of",
    "outlier",
    "histogram",
    "scatter plot",
    "bar chart",
    "pie chart",
    "line chart",
    "box plot",
    "visualize",
    "visualise",
    "visualization",
    "visualisation",
];

const VERBS: &[&str] = &[
    "calculate",
    "compute",
    "find",
    "get",
    "show",
    "determine",
    "what is",
    "what's",
    "give me",
];

const METRICS: &[&str] = &[
    "average",
    "mean",
    "median",
    "mode",
    "sum",
    "total",
    "count",
    "maximum",
    "minimum",
    "max",
    "min",
    "range",
    "variance",
    "standard deviation",
    "percentage",
];

const CARDINALITY_NOUNS: &[&str] = &["rows", "entries", "records", "data points"];

const DIRECTIVES: &[&str] = &["group by", "filter by", "sort by"];

const SUPERLATIVES: &[&str] = &[
    "highest", "lowest", "largest", "smallest", "biggest", "most", "least", "maximum", "minimum",
];

const METRIC_NOUNS: &[&str] = &[
    "value", "price", "cost", "sales", "revenue", "profit", "score", "grade", "salary", "amount",
    "quantity", "rating", "total", "count", "number", "average",
];

/// Classify a question; `Narrative` whenever no tabular data is loaded
pub fn classify(question: &str, has_tabular_data: bool) -> QueryRoute {
    if has_tabular_data && explain(question).is_some() {
        QueryRoute::Analysis
    } else {
        QueryRoute::Narrative
    }
}

/// First analysis rule the question matches, if any.
///
/// Vocabulary entries match whole words only, so "mean" does not fire on
/// "meaning" and "sum" does not fire on "summary".
pub fn explain(question: &str) -> Option<RouteRule> {
    let words = tokenize(question);
    let has = |phrase: &str| contains_phrase(&words, phrase, false);

    if let Some(k) = ANALYSIS_KEYWORDS.iter().copied().find(|&k| has(k)) {
        return Some(RouteRule::Keyword(k));
    }

    for &verb in VERBS {
        for &metric in METRICS {
            if has(&format!("{} {}", verb, metric)) || has(&format!("{} the {}", verb, metric)) {
                return Some(RouteRule::VerbMetric { verb, metric });
            }
        }
    }

    if has("how many") {
        if let Some(noun) = CARDINALITY_NOUNS.iter().copied().find(|&n| has(n)) {
            return Some(RouteRule::Cardinality(noun));
        }
    }

    if let Some(d) = DIRECTIVES.iter().copied().find(|&d| has(d)) {
        return Some(RouteRule::Directive(d));
    }

    if let Some(term) = SUPERLATIVES.iter().copied().find(|&t| has(t)) {
        // "highest prices" counts as well as "highest price"
        if let Some(noun) = METRIC_NOUNS
            .iter()
            .copied()
            .find(|&n| contains_phrase(&words, n, true))
        {
            return Some(RouteRule::Superlative { term, noun });
        }
    }

    None
}

/// Lowercase words with surrounding punctuation removed; inner apostrophes
/// are kept so "what's" stays one word.
fn tokenize(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `phrase` appears as a run of whole words; with `plural` the last
/// word may also carry a trailing "s".
fn contains_phrase(words: &[String], phrase: &str, plural: bool) -> bool {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() || parts.len() > words.len() {
        return false;
    }

    words.windows(parts.len()).any(|window| {
        window.iter().zip(&parts).enumerate().all(|(i, (word, part))| {
            word == part
                || (plural
                    && i + 1 == parts.len()
                    && word.strip_suffix('s') == Some(*part))
        })
    })
}
