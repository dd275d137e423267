//! Upstream providers: redirect resolver, BigDataCloud reverse geocoding,
//! and Nominatim place search.

use super::language::Language;
use super::types::{LookupError, PlaceSearchResult, RawLocationData};
use crate::config::Config;
use tracing::debug;

/// The network calls the orchestrator depends on.
///
/// Each method is a single attempt; retry policy lives in the resolver.
pub trait MapsBackend {
    /// Follow redirects from `url` and return the final address.
    fn expand_url(&self, url: &str) -> Result<String, LookupError>;

    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        lang: &Language,
    ) -> Result<RawLocationData, LookupError>;

    fn search_places(&self, query: &str) -> Result<Vec<PlaceSearchResult>, LookupError>;
}

/// Type-erased backend, for callers that pick the implementation at runtime.
pub type SharedBackend = Box<dyn MapsBackend + Send + Sync>;

impl<T: MapsBackend + ?Sized> MapsBackend for Box<T> {
    fn expand_url(&self, url: &str) -> Result<String, LookupError> {
        (**self).expand_url(url)
    }

    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        lang: &Language,
    ) -> Result<RawLocationData, LookupError> {
        (**self).reverse_geocode(latitude, longitude, lang)
    }

    fn search_places(&self, query: &str) -> Result<Vec<PlaceSearchResult>, LookupError> {
        (**self).search_places(query)
    }
}

/// `ureq`-backed implementation talking to the real services.
pub struct HttpBackend {
    agent: ureq::Agent,
    reverse_geocode_url: String,
    search_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Self {
        let mut builder = ureq::AgentBuilder::new()
            .redirects(config.max_redirects)
            .user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            reverse_geocode_url: config.reverse_geocode_url.clone(),
            search_url: config.search_url.clone(),
        }
    }
}

impl MapsBackend for HttpBackend {
    fn expand_url(&self, url: &str) -> Result<String, LookupError> {
        match self.agent.head(url).call() {
            Ok(response) => Ok(response.get_url().to_string()),
            // An error status still tells us where the redirects ended.
            Err(ureq::Error::Status(code, response)) => {
                debug!(code, url = response.get_url(), "HEAD finished with error status");
                Ok(response.get_url().to_string())
            }
            Err(ureq::Error::Transport(t)) => Err(LookupError::Network(t.to_string())),
        }
    }

    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        lang: &Language,
    ) -> Result<RawLocationData, LookupError> {
        let response = self
            .agent
            .get(&self.reverse_geocode_url)
            .query("latitude", &latitude.to_string())
            .query("longitude", &longitude.to_string())
            .query("localityLanguage", lang.code())
            .call()
            .map_err(map_ureq_error)?;

        response
            .into_json()
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))
    }

    fn search_places(&self, query: &str) -> Result<Vec<PlaceSearchResult>, LookupError> {
        let response = self
            .agent
            .get(&self.search_url)
            .query("q", query)
            .query("format", "json")
            .call()
            .map_err(map_ureq_error)?;

        response
            .into_json()
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))
    }
}

fn map_ureq_error(e: ureq::Error) -> LookupError {
    match e {
        ureq::Error::Status(code, _) => LookupError::Status(code),
        ureq::Error::Transport(t) => LookupError::Network(t.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_config() {
        let config = Config {
            search_url: "http://127.0.0.1:9/search".into(),
            timeout_secs: Some(1),
            ..Config::default()
        };
        let backend = HttpBackend::new(&config);
        assert_eq!(backend.search_url, "http://127.0.0.1:9/search");
        assert_eq!(backend.reverse_geocode_url, crate::config::DEFAULT_REVERSE_GEOCODE_URL);
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let config = Config {
            search_url: "http://127.0.0.1:9/search".into(),
            timeout_secs: Some(2),
            ..Config::default()
        };
        let backend = HttpBackend::new(&config);
        let err = backend.search_places("paris").unwrap_err();
        assert!(matches!(err, LookupError::Network(_)));

        let err = backend.expand_url("http://127.0.0.1:9/short").unwrap_err();
        assert!(matches!(err, LookupError::Network(_)));
    }
}
