//! Trending misinformation digest for a topic and area.

use serde::{Deserialize, Serialize};
use veracity_common::Result;

use crate::traits::LlmClient;

/// Items requested from the model and returned to callers.
pub const TRENDING_ITEMS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisinformationItem {
    pub misinformation: String,
    pub source: String,
}

pub fn build_trending_prompt(topic: &str, area: &str) -> String {
    format!(
        "Give top {TRENDING_ITEMS} misinformation regarding {topic} in {area}.\n\n\
         Structure your response exactly like this for each misinformation:\n\
         Misinformation: [the misinformation claim]\n\
         Source: [where it typically comes from]\n\n\
         Separate items with a blank line. Return ONLY these {TRENDING_ITEMS} items, no extra text."
    )
}

/// Blocks separated by blank lines; a block counts only when both a
/// `Misinformation:` and a `Source:` line are present and non-empty.
pub fn parse_trending(text: &str) -> Vec<MisinformationItem> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .filter_map(|block| {
            let mut misinformation = None;
            let mut source = None;
            for line in block.lines() {
                // Models like to bold the labels.
                let line = line.replace(['*', '#'], "");
                let line = line.trim().trim_start_matches(|c: char| {
                    c.is_ascii_digit() || c == '.' || c == ')' || c == '-'
                });
                let line = line.trim();
                if let Some(rest) = line.strip_prefix("Misinformation:") {
                    misinformation = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("Source:") {
                    source = Some(rest.trim().to_string());
                }
            }
            match (misinformation, source) {
                (Some(m), Some(s)) if !m.is_empty() && !s.is_empty() => Some(MisinformationItem {
                    misinformation: m,
                    source: s,
                }),
                _ => None,
            }
        })
        .take(TRENDING_ITEMS)
        .collect()
}

pub async fn trending_misinformation(
    llm: &dyn LlmClient,
    topic: &str,
    area: &str,
) -> Result<Vec<MisinformationItem>> {
    let prompt = build_trending_prompt(topic, area);
    let resp = llm.generate(&prompt, None, None, Some(0.4)).await?;
    let items = parse_trending(&resp.text);
    tracing::info!(topic, area, items = items.len(), "trending.digest.done");
    Ok(items)
}
