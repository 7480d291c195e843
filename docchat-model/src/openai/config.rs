use std::fmt;
use std::time::Duration;

/// The OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The OpenRouter API base URL.
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Connection settings for an OpenAI-compatible chat backend.
#[derive(Clone)]
pub struct OpenAIConfig {
    /// Bearer token sent with every request.
    pub api_key: String,
    /// API root; `/chat/completions` is appended to it.
    pub base_url: String,
    /// Name used in logs and errors.
    pub provider: String,
    /// Per-request deadline enforced by the HTTP client.
    pub request_timeout: Option<Duration>,
    /// Optional `HTTP-Referer` attribution header (OpenRouter app rankings).
    pub referer: Option<String>,
    /// Optional `X-Title` attribution header (OpenRouter app rankings).
    pub title: Option<String>,
}

impl OpenAIConfig {
    /// Settings for the OpenAI API.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::with_provider(api_key, OPENAI_API_BASE, "OpenAI")
    }

    /// Settings for OpenRouter.
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::with_provider(api_key, OPENROUTER_API_BASE, "OpenRouter")
    }

    /// Settings for any other OpenAI-compatible endpoint.
    pub fn compatible(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_provider(api_key, base_url, "OpenAI-compatible")
    }

    fn with_provider(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        provider: &str,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            provider: provider.to_string(),
            request_timeout: None,
            referer: None,
            title: None,
        }
    }

    /// Replace the API root while keeping the provider name.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fail requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Attach OpenRouter attribution headers.
    pub fn with_attribution(
        mut self,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        self.referer = Some(referer.into());
        self.title = Some(title.into());
        self
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("provider", &self.provider)
            .field("request_timeout", &self.request_timeout)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}
