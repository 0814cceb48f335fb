use url::Url;

use crate::twitter::types::LookupResponse;

/// Post text resolved from a lookup, with the author when the API included it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostText {
    pub id: String,
    pub author_handle: Option<String>,
    pub text: String,
    pub status_url: Option<Url>,
}

pub fn is_twitter_host(url: &Url) -> bool {
    matches!(
        url.host_str().map(|h| h.trim_start_matches("www.").trim_start_matches("mobile.")),
        Some("twitter.com" | "x.com")
    )
}

/// `https://x.com/<user>/status/<id>` (and twitter.com, /i/web/status) → id.
pub fn tweet_id_from_url(url: &Url) -> Option<String> {
    if !is_twitter_host(url) {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.collect();
    let idx = segments.iter().position(|s| *s == "status" || *s == "statuses")?;
    let id = segments.get(idx + 1)?;
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some((*id).to_string())
    } else {
        None
    }
}

/// Resolve the readable text of a lookup. Long-form posts prefer the note text.
pub fn post_text(resp: &LookupResponse) -> Option<PostText> {
    let tweet = resp.data.as_ref()?;
    let author_handle = tweet.author_id.as_ref().and_then(|aid| {
        resp.includes
            .as_ref()
            .and_then(|inc| inc.users.as_ref())
            .and_then(|users| users.iter().find(|u| &u.id == aid))
            .map(|u| u.username.clone())
    });
    let text = tweet
        .note_tweet
        .as_ref()
        .map(|n| n.text.clone())
        .unwrap_or_else(|| tweet.text.clone());

    Some(PostText {
        id: tweet.id.clone(),
        status_url: make_status_url(author_handle.as_deref(), &tweet.id),
        author_handle,
        text,
    })
}

/// Build a canonical X status URL if we know the handle; otherwise /i/web/status/{id}.
pub fn make_status_url(handle: Option<&str>, id: &str) -> Option<Url> {
    if let Some(h) = handle {
        Url::parse(&format!("https://x.com/{}/status/{}", h, id)).ok()
    } else {
        Url::parse(&format!("https://x.com/i/web/status/{}", id)).ok()
    }
}
