use serde::Deserialize;

use crate::foundation::error::{InkframeError, InkframeResult};
use crate::providers::JokeProvider;
use crate::providers::http::HttpClient;

const ENDPOINT: &str = "https://icanhazdadjoke.com/";

#[derive(Debug, Deserialize)]
struct JokeResponse {
    joke: Option<String>,
}

/// icanhazdadjoke.com client.
#[derive(Debug, Clone)]
pub struct DadJokes {
    http: HttpClient,
}

impl DadJokes {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

impl JokeProvider for DadJokes {
    fn joke(&self) -> InkframeResult<String> {
        let resp: JokeResponse = self.http.get_json(ENDPOINT, &[], &[])?;
        resp.joke
            .map(|j| j.trim().to_owned())
            .filter(|j| !j.is_empty())
            .ok_or_else(|| InkframeError::upstream("joke response has no joke"))
    }
}
