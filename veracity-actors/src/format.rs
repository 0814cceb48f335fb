//! Plain-text rendering for messaging transports.

use veracity_common::{AgentReply, FactCheckResult, Verdict};

/// Messaging platforms reject longer bodies.
pub const MAX_TEXT_CHARS: usize = 1500;
/// Source lines included in text replies.
pub const MAX_TEXT_SOURCES: usize = 3;

/// Render a reply for a text-only transport.
///
/// ```
/// use veracity_actors::format::render_text;
/// use veracity_common::{AgentReply, FactCheckResult, Verdict};
///
/// let reply = AgentReply::Verdict(FactCheckResult {
///     verdict: Verdict::False,
///     confidence_score: 92,
///     agent_response: "**No.** Lemon water does not cure cancer.".into(),
///     ..Default::default()
/// });
/// assert_eq!(
///     render_text(&reply),
///     "Verdict: FALSE (92% confidence)\nNo. Lemon water does not cure cancer."
/// );
/// ```
pub fn render_text(reply: &AgentReply) -> String {
    match reply {
        AgentReply::Verdict(result) => render_result(result),
        AgentReply::Message(text) => finish(text),
    }
}

pub fn render_result(result: &FactCheckResult) -> String {
    let mut lines = Vec::new();
    if result.verdict != Verdict::None {
        lines.push(format!(
            "Verdict: {} ({}% confidence)",
            result.verdict, result.confidence_score
        ));
    }
    let body = result.agent_response.trim();
    if !body.is_empty() {
        lines.push(body.to_string());
    }
    let sources: Vec<String> = result
        .sources
        .iter()
        .filter(|s| !s.link.is_empty())
        .take(MAX_TEXT_SOURCES)
        .map(|s| format!("- {}: {}", s.title.trim(), s.link))
        .collect();
    if !sources.is_empty() {
        lines.push(String::new());
        lines.push("Sources:".to_string());
        lines.extend(sources);
    }
    finish(&lines.join("\n"))
}

fn finish(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| *c != '*' && *c != '#').collect();
    let cleaned = cleaned.trim();
    if cleaned.chars().count() <= MAX_TEXT_CHARS {
        return cleaned.to_string();
    }
    let cut: String = cleaned.chars().take(MAX_TEXT_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use veracity_common::Source;

    fn source(n: usize) -> Source {
        Source {
            title: format!("Source {n}"),
            snippet: "snippet".into(),
            link: format!("https://example.com/{n}"),
        }
    }

    #[test]
    fn lists_at_most_three_sources() {
        let result = FactCheckResult {
            verdict: Verdict::True,
            confidence_score: 70,
            agent_response: "Supported by several outlets.".into(),
            sources: (1..=5).map(source).collect(),
            ..Default::default()
        };
        let text = render_result(&result);
        assert!(text.starts_with("Verdict: TRUE (70% confidence)\n"));
        assert!(text.contains("- Source 3: https://example.com/3"));
        assert!(!text.contains("Source 4"));
    }

    #[test]
    fn none_verdict_has_no_header() {
        let result = FactCheckResult {
            agent_response: "I could not parse that.".into(),
            ..Default::default()
        };
        assert_eq!(render_result(&result), "I could not parse that.");
    }

    #[test]
    fn messages_are_stripped_and_capped() {
        let long = format!("# Heads up\n{}", "x".repeat(2000));
        let text = render_text(&AgentReply::Message(long));
        assert!(!text.contains('#'));
        assert_eq!(text.chars().count(), MAX_TEXT_CHARS);
        assert!(text.ends_with("..."));
    }
}
