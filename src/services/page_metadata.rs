//! Best-effort page metadata: document title and favicon.
//!
//! Every failure is a [`NetworkError`]; callers fall back to the letter icon
//! or to no title. Requests are bounded by the configured timeout. Fetching
//! needs the `network` feature; title extraction is always available.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Collects the text of the first `<title>` element.
#[derive(Default)]
struct TitleSink {
    inside: bool,
    done: bool,
    text: String,
}

impl TitleSink {
    fn on_tag(&mut self, tag: &Tag) {
        if &*tag.name != "title" || self.done {
            return;
        }
        match tag.kind {
            TagKind::StartTag => self.inside = true,
            TagKind::EndTag if self.inside => {
                self.inside = false;
                self.done = true;
            }
            TagKind::EndTag => {}
        }
    }
}

impl TokenSink for TitleSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => self.on_tag(&tag),
            Token::CharacterTokens(chars) if self.inside => self.text.push_str(&chars),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Text of the page's first `<title>`, whitespace collapsed. `None` when
/// missing or blank.
pub fn extract_title(html: &str) -> Option<String> {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    let mut tokenizer = Tokenizer::new(TitleSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    let sink = std::mem::take(&mut tokenizer.sink);
    let title = sink.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Origin-relative favicon location for a page URL.
pub fn favicon_url(page_url: &str) -> Option<String> {
    let parsed = url::Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
    Some(format!("{}://{}{}/favicon.ico", parsed.scheme(), host, port))
}

#[cfg(feature = "network")]
pub use fetch::{fetch_favicon, fetch_page_title};

#[cfg(feature = "network")]
mod fetch {
    use std::time::Duration;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tracing::debug;

    use super::{extract_title, favicon_url};
    use crate::types::errors::NetworkError;

    const USER_AGENT: &str = "bookmark-tool/0.1";

    fn client(timeout_secs: u64) -> Result<reqwest::Client, NetworkError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NetworkError::RequestFailed(format!("failed to build HTTP client: {}", e)))
    }

    fn request_error(err: reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout(err.to_string())
        } else {
            NetworkError::RequestFailed(err.to_string())
        }
    }

    /// Fetches `url` and returns its `<title>` text, if any.
    pub async fn fetch_page_title(url: &str, timeout_secs: u64) -> Result<Option<String>, NetworkError> {
        url::Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        let response = client(timeout_secs)?
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.2")
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(NetworkError::BadStatus(response.status().as_u16()));
        }
        let body = response.text().await.map_err(request_error)?;
        let title = extract_title(&body);
        debug!(url, found = title.is_some(), "Fetched page title");
        Ok(title)
    }

    /// Fetches the site's `/favicon.ico` as a `data:` URI.
    ///
    /// Responses that are not `image/*` yield `Ok(None)`.
    pub async fn fetch_favicon(url: &str, timeout_secs: u64) -> Result<Option<String>, NetworkError> {
        let icon_url = favicon_url(url).ok_or_else(|| NetworkError::InvalidUrl(url.to_string()))?;
        let response = client(timeout_secs)?
            .get(&icon_url)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(NetworkError::BadStatus(response.status().as_u16()));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let Some(content_type) = content_type.filter(|ct| ct.starts_with("image/")) else {
            return Ok(None);
        };
        let bytes = response.bytes().await.map_err(request_error)?;
        debug!(url = %icon_url, size = bytes.len(), "Fetched favicon");
        Ok(Some(format!("data:{};base64,{}", content_type, STANDARD.encode(&bytes))))
    }
}
