use std::collections::HashMap;
use std::fmt;
use async_trait::async_trait;
use hd_core::{Result, Summarizer, Summary};

const SUMMARY_WORDS: usize = 30;
const MAX_TAGS: usize = 3;
const MIN_TAG_LEN: usize = 4;

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "also", "been", "before", "being", "between", "both", "could",
    "does", "doing", "down", "each", "from", "further", "have", "having", "here", "into",
    "just", "more", "most", "much", "only", "other", "over", "same", "should", "some",
    "such", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "through", "under", "until", "very", "were", "what", "when", "where", "which",
    "while", "will", "with", "would", "your",
];

/// Offline summarizer for dry runs and tests. Deterministic.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

fn frequent_words(text: &str) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let words = text
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= MIN_TAG_LEN && !STOP_WORDS.contains(&w.as_str()));

    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    // Most frequent first, earliest occurrence breaks ties.
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.into_iter().take(MAX_TAGS).map(|(word, _)| word).collect()
}

#[async_trait]
impl Summarizer for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<Summary> {
        let words: Vec<&str> = content.split_whitespace().take(SUMMARY_WORDS).collect();
        let summary = if words.is_empty() {
            title.to_string()
        } else {
            words.join(" ")
        };

        Ok(Summary {
            summary,
            tags: frequent_words(&format!("{} {}", title, content)),
        })
    }
}
