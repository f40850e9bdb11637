use serde::Deserialize;

use crate::foundation::error::InkframeResult;
use crate::providers::http::HttpClient;
use crate::providers::{StockPhoto, StockPhotoProvider};

const SEARCH_URL: &str = "https://api.pexels.com/v1/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: u64,
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    landscape: Option<String>,
    large: Option<String>,
    original: Option<String>,
}

/// Search terms for a theme; unknown themes search for themselves.
pub fn theme_query(theme: &str) -> &str {
    match theme {
        "abstract" => "abstract minimal gradient",
        "geometric" => "geometric shapes minimal",
        "paper-collage" => "paper collage texture",
        "kids" | "kids-shapes" => "colorful shapes kids",
        "minimal" => "minimal texture",
        "photo" => "landscape photography",
        other => other,
    }
}

/// Pexels search API client.
#[derive(Debug, Clone)]
pub struct Pexels {
    http: HttpClient,
    api_key: String,
}

impl Pexels {
    pub fn new(http: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }
}

impl StockPhotoProvider for Pexels {
    #[tracing::instrument(skip(self))]
    fn search(&self, query: &str, page: u32, per_page: usize) -> InkframeResult<Vec<StockPhoto>> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        let value: serde_json::Value = self.http.get_json(
            SEARCH_URL,
            &[("query", query), ("page", page.as_str()), ("per_page", per_page.as_str())],
            &[("Authorization", self.api_key.as_str())],
        )?;
        parse_search(value)
    }

    fn download(&self, photo: &StockPhoto) -> InkframeResult<Vec<u8>> {
        self.http.get_bytes(&photo.url, &[])
    }
}

pub(crate) fn parse_search(value: serde_json::Value) -> InkframeResult<Vec<StockPhoto>> {
    let resp: SearchResponse = serde_json::from_value(value)?;
    Ok(resp
        .photos
        .into_iter()
        .filter_map(|p| {
            let url = p.src.landscape.or(p.src.large).or(p.src.original)?;
            Some(StockPhoto { id: p.id, url })
        })
        .collect())
}
