use serde::Deserialize;

/// Subset of the Brave `WebSearchApiResponse` that carries web results.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebSearchApiResponse {
    #[serde(default)]
    pub query: Option<Query>,
    #[serde(default)]
    pub web: Option<Search>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Query {
    pub original: String,
    #[serde(default)]
    pub altered: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Search {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    pub url: String,
    /// May contain `<strong>` highlight markup.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
}
