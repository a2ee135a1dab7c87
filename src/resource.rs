use std::fmt::{Debug, Formatter};

use url::Url;

/// Just a wrapper around a base URL and the bearer token to use with it
#[derive(Clone)]
pub struct Resource {
    url: Url,
    token: Option<String>,
}

impl Resource {
    pub fn new(url: Url, token: Option<String>) -> Self {
        Self { url, token }
    }

    pub fn url(&self) -> &Url { &self.url }
    pub fn token(&self) -> Option<&str> { self.token.as_deref() }

    /// Build the URL of an endpoint by appending path segments to the base URL.
    /// Segments are percent-encoded as needed.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut built = self.url.clone();
        if let Ok(mut path) = built.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        built
    }
}

impl Debug for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
