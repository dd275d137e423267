//! Maps link resolver — orchestrates the fallback chain.
//!
//! Expand flow:  blank check → host check → redirect → extract → reverse geocode
//! Each stage that fails degrades to the previous stage's result:
//! address → coordinates' URL string. Only blank input, a foreign host and
//! an unresolvable link are errors.
//!
//! Search flow:  Nominatim, retried with a fixed delay.

use super::language::Language;
use super::providers::{HttpBackend, MapsBackend};
use super::types::{
    reshape_address, ExpandError, Expansion, LookupError, Mode, PlaceSearchResult, SearchError,
};
use crate::config::Config;
use crate::extract::{extract, is_google_maps_url};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SEARCH_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The resolver with its fallback pipeline.
pub struct MapsResolver<B = HttpBackend> {
    backend: B,
    mode: Mode,
    search_retries: u32,
    retry_delay: Duration,
}

impl MapsResolver<HttpBackend> {
    /// Resolver backed by the real services.
    pub fn from_config(config: &Config) -> Self {
        Self::configured(HttpBackend::new(config), config)
    }
}

impl<B: MapsBackend> MapsResolver<B> {
    /// Create a resolver over any backend (used by tests with fakes).
    pub fn with_backend(backend: B, mode: Mode) -> Self {
        Self {
            backend,
            mode,
            search_retries: DEFAULT_SEARCH_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Create a resolver over `backend` with mode and retry policy from `config`.
    pub fn configured(backend: B, config: &Config) -> Self {
        Self::with_backend(backend, config.mode)
            .with_retry(config.search_retries, config.retry_delay())
    }

    pub fn with_retry(mut self, retries: u32, delay: Duration) -> Self {
        self.search_retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Expand a Maps link as far as the configured mode allows.
    pub fn expand(&self, url: &str, lang: &Language) -> Result<Expansion, ExpandError> {
        if url.trim().is_empty() {
            return Err(ExpandError::EmptyInput);
        }

        // Only the blank check trims; " https://maps.app.goo.gl/x" is not a Maps link.
        if self.mode.checks_host() && !is_google_maps_url(url) {
            debug!(url, "rejected by host allow-list");
            return Err(ExpandError::InvalidUrl(url.to_string()));
        }

        let resolved = self.backend.expand_url(url).map_err(|e| {
            warn!(url, error = %e, "could not resolve link");
            ExpandError::Unresolved(e)
        })?;
        if resolved.is_empty() {
            return Err(ExpandError::Unresolved(LookupError::InvalidResponse(
                "empty redirect target".into(),
            )));
        }
        debug!(url, resolved = %resolved, "link resolved");

        let coords = match extract(&resolved) {
            Some(c) => c,
            None => {
                debug!(resolved = %resolved, "no coordinates in resolved URL");
                return Ok(Expansion::Url(resolved));
            }
        };
        debug!(
            lat = coords.latitude,
            lon = coords.longitude,
            pattern = %coords.matched_pattern,
            "coordinates extracted"
        );

        if !self.mode.enriches() {
            return Ok(Expansion::Coordinates(coords));
        }

        match self
            .backend
            .reverse_geocode(coords.latitude, coords.longitude, lang)
        {
            Ok(data) => Ok(Expansion::Address(reshape_address(data, &resolved))),
            Err(e) => {
                warn!(error = %e, "reverse geocoding failed, returning URL only");
                Ok(Expansion::Url(resolved))
            }
        }
    }

    /// Free-text place search.
    ///
    /// An empty `Ok` means the service answered with no hits; exhausted
    /// retries are an `Err`.
    pub fn search(&self, query: &str) -> Result<Vec<PlaceSearchResult>, SearchError> {
        if !self.mode.allows_search() {
            return Err(SearchError::Unavailable);
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let attempts = self.search_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.backend.search_places(query) {
                Ok(results) => {
                    debug!(query, attempt, hits = results.len(), "search finished");
                    return Ok(results);
                }
                Err(e) if attempt < attempts => {
                    warn!(query, attempt, error = %e, "search failed, retrying");
                    if !self.retry_delay.is_zero() {
                        std::thread::sleep(self.retry_delay);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    warn!(query, attempts, error = %e, "search retries exhausted");
                    return Err(SearchError::Exhausted { attempts, last: e });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Pattern;
    use crate::maps::types::RawLocationData;
    use approx::assert_relative_eq;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::time::Instant;

    const LONG_URL: &str =
        "https://www.google.com/maps/place/Rabbani+Leadies+Tailor/@19.910945,72.994643,17z/data=!4m12";
    const NO_COORDS_URL: &str = "https://www.google.com/maps/search/coffee+near+me";
    const SHORT_URL: &str = "https://maps.app.goo.gl/c17dx6XJYHhbS3pq9";

    /// Scripted backend that counts every network call.
    #[derive(Default)]
    struct FakeBackend {
        redirect: Option<Result<String, LookupError>>,
        geocode: Option<Result<RawLocationData, LookupError>>,
        search: RefCell<VecDeque<Result<Vec<PlaceSearchResult>, LookupError>>>,
        expand_calls: Cell<u32>,
        geocode_calls: Cell<u32>,
        search_calls: Cell<u32>,
        search_times: RefCell<Vec<Instant>>,
        last_lang: RefCell<Option<Language>>,
    }

    impl FakeBackend {
        fn redirecting_to(url: &str) -> Self {
            Self {
                redirect: Some(Ok(url.to_string())),
                ..Self::default()
            }
        }

        fn network_calls(&self) -> u32 {
            self.expand_calls.get() + self.geocode_calls.get() + self.search_calls.get()
        }
    }

    impl MapsBackend for FakeBackend {
        fn expand_url(&self, _url: &str) -> Result<String, LookupError> {
            self.expand_calls.set(self.expand_calls.get() + 1);
            self.redirect
                .clone()
                .unwrap_or_else(|| Err(LookupError::Network("unscripted".into())))
        }

        fn reverse_geocode(
            &self,
            _latitude: f64,
            _longitude: f64,
            lang: &Language,
        ) -> Result<RawLocationData, LookupError> {
            self.geocode_calls.set(self.geocode_calls.get() + 1);
            *self.last_lang.borrow_mut() = Some(lang.clone());
            self.geocode
                .clone()
                .unwrap_or_else(|| Err(LookupError::Network("unscripted".into())))
        }

        fn search_places(&self, _query: &str) -> Result<Vec<PlaceSearchResult>, LookupError> {
            self.search_calls.set(self.search_calls.get() + 1);
            self.search_times.borrow_mut().push(Instant::now());
            self.search
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(LookupError::Network("unscripted".into())))
        }
    }

    fn resolver(backend: FakeBackend, mode: Mode) -> MapsResolver<FakeBackend> {
        MapsResolver::with_backend(backend, mode).with_retry(3, Duration::ZERO)
    }

    fn ward12_payload() -> RawLocationData {
        serde_json::from_value(serde_json::json!({
            "latitude": 19.910945,
            "longitude": 72.994643,
            "countryName": "India",
            "countryCode": "IN",
            "principalSubdivision": "Maharashtra",
            "principalSubdivisionCode": "IN-MH",
            "postcode": "",
            "city": "Palghar",
            "locality": "Boisar",
            "continent": "Asia",
            "continentCode": "AS",
            "localityInfo": { "administrative": [
                { "name": "Maharashtra", "order": 5 },
                { "name": "Ward12", "order": 9 }
            ]}
        }))
        .unwrap()
    }

    fn place(id: i64, name: &str) -> PlaceSearchResult {
        PlaceSearchResult {
            place_id: id,
            lat: "19.0".into(),
            lon: "72.8".into(),
            place_type: "city".into(),
            place_rank: 16,
            addresstype: "city".into(),
            name: name.into(),
            display_name: format!("{}, India", name),
        }
    }

    #[test]
    fn test_blank_input_makes_no_network_call() {
        for mode in [Mode::CoordinatesOnly, Mode::WithAddress, Mode::WithSearch] {
            let r = resolver(FakeBackend::redirecting_to(LONG_URL), mode);
            assert_eq!(r.expand("", &Language::En), Err(ExpandError::EmptyInput));
            assert_eq!(r.expand("   \t", &Language::En), Err(ExpandError::EmptyInput));
            assert_eq!(r.backend().network_calls(), 0);
        }
    }

    #[test]
    fn test_foreign_host_rejected_in_address_mode() {
        let r = resolver(FakeBackend::redirecting_to(LONG_URL), Mode::WithAddress);
        let err = r.expand("https://example.com/foo", &Language::En).unwrap_err();
        assert!(matches!(err, ExpandError::InvalidUrl(_)));
        assert_eq!(r.backend().network_calls(), 0);
    }

    #[test]
    fn test_coordinates_mode_skips_host_check() {
        let r = resolver(FakeBackend::redirecting_to(LONG_URL), Mode::CoordinatesOnly);
        let out = r.expand("https://example.com/foo", &Language::En).unwrap();
        assert_eq!(out.stage(), "coordinates");
    }

    #[test]
    fn test_resolver_failure_is_unresolved() {
        let backend = FakeBackend {
            redirect: Some(Err(LookupError::Network("dns".into()))),
            ..FakeBackend::default()
        };
        let r = resolver(backend, Mode::WithSearch);
        let err = r.expand(SHORT_URL, &Language::En).unwrap_err();
        assert_eq!(err, ExpandError::Unresolved(LookupError::Network("dns".into())));
    }

    #[test]
    fn test_empty_redirect_target_is_unresolved() {
        let r = resolver(FakeBackend::redirecting_to(""), Mode::CoordinatesOnly);
        assert!(matches!(
            r.expand(SHORT_URL, &Language::En),
            Err(ExpandError::Unresolved(_))
        ));
    }

    #[test]
    fn test_no_coordinates_returns_resolved_url() {
        let r = resolver(FakeBackend::redirecting_to(NO_COORDS_URL), Mode::WithSearch);
        let out = r.expand(SHORT_URL, &Language::En).unwrap();
        assert_eq!(out, Expansion::Url(NO_COORDS_URL.to_string()));
        assert_eq!(r.backend().geocode_calls.get(), 0);
    }

    #[test]
    fn test_coordinates_only_mode() {
        let r = resolver(FakeBackend::redirecting_to(LONG_URL), Mode::CoordinatesOnly);
        match r.expand(SHORT_URL, &Language::En).unwrap() {
            Expansion::Coordinates(c) => {
                assert_relative_eq!(c.latitude, 19.910945);
                assert_relative_eq!(c.longitude, 72.994643);
                assert_eq!(c.matched_pattern, Pattern::Pattern1);
                assert_eq!(c.source_url, LONG_URL);
            }
            other => panic!("expected coordinates, got {:?}", other),
        }
        assert_eq!(r.backend().geocode_calls.get(), 0);
    }

    #[test]
    fn test_enrichment_builds_address() {
        let backend = FakeBackend {
            geocode: Some(Ok(ward12_payload())),
            ..FakeBackend::redirecting_to(LONG_URL)
        };
        let r = resolver(backend, Mode::WithAddress);
        match r.expand(SHORT_URL, &Language::Fr).unwrap() {
            Expansion::Address(a) => {
                assert_eq!(a.address.district, "Ward12");
                assert_eq!(a.address.postcode, "");
                assert_eq!(a.address.lookup_source, "coordinates");
                assert_eq!(a.source_url, LONG_URL);
            }
            other => panic!("expected address, got {:?}", other),
        }
        assert_eq!(*r.backend().last_lang.borrow(), Some(Language::Fr));
    }

    #[test]
    fn test_enrichment_failure_degrades_to_url() {
        let backend = FakeBackend {
            geocode: Some(Err(LookupError::Status(500))),
            ..FakeBackend::redirecting_to(LONG_URL)
        };
        let r = resolver(backend, Mode::WithSearch);
        let out = r.expand(SHORT_URL, &Language::En).unwrap();
        assert_eq!(out, Expansion::Url(LONG_URL.to_string()));
        assert_eq!(r.backend().geocode_calls.get(), 1);
    }

    #[test]
    fn test_leading_whitespace_fails_host_check() {
        let r = resolver(FakeBackend::redirecting_to(LONG_URL), Mode::WithAddress);
        let err = r.expand("  https://maps.app.goo.gl/x", &Language::En).unwrap_err();
        assert!(matches!(err, ExpandError::InvalidUrl(_)));
        assert_eq!(r.backend().network_calls(), 0);
    }

    #[test]
    fn test_geocode_error_body_degrades_to_url() {
        // What HttpBackend yields when the service answers 200 with a status body
        let quota = r#"{"status":200,"description":"quota exceeded"}"#;
        let decoded = serde_json::from_str::<RawLocationData>(quota)
            .map_err(|e| LookupError::InvalidResponse(e.to_string()));
        assert!(decoded.is_err());

        let backend = FakeBackend {
            geocode: Some(decoded),
            ..FakeBackend::redirecting_to(LONG_URL)
        };
        let r = resolver(backend, Mode::WithAddress);
        let out = r.expand(SHORT_URL, &Language::En).unwrap();
        assert_eq!(out, Expansion::Url(LONG_URL.to_string()));
    }

    #[test]
    fn test_search_waits_fixed_delay_between_attempts() {
        let delay = Duration::from_millis(40);
        let backend = FakeBackend::default();
        backend
            .search
            .borrow_mut()
            .extend((0..4).map(|_| Err(LookupError::Status(503))));
        let r = MapsResolver::with_backend(backend, Mode::WithSearch).with_retry(3, delay);

        let start = Instant::now();
        assert!(matches!(r.search("x"), Err(SearchError::Exhausted { attempts: 4, .. })));
        let finished = Instant::now();

        let times = r.backend().search_times.borrow();
        assert_eq!(times.len(), 4);
        assert!(finished - start >= delay * 3);
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= delay, "gap {:?} shorter than delay", gap);
            // a doubling backoff would reach 2x by the second gap
            assert!(gap < delay * 2, "gap {:?} grew past the fixed delay", gap);
        }
        // no sleep after the final attempt
        assert!(finished - times[3] < delay);
    }

    #[test]
    fn test_huge_retry_count_does_not_overflow() {
        let backend = FakeBackend::default();
        backend.search.borrow_mut().push_back(Ok(vec![place(7, "Once")]));
        let r = MapsResolver::with_backend(backend, Mode::WithSearch).with_retry(u32::MAX, Duration::ZERO);
        let hits = r.search("x").unwrap();
        assert_eq!(hits[0].place_id, 7);
    }

    #[test]
    fn test_search_retry_then_succeed() {
        let backend = FakeBackend::default();
        backend.search.borrow_mut().extend([
            Err(LookupError::Status(503)),
            Err(LookupError::Network("reset".into())),
            Ok(vec![place(1, "Rudra"), place(2, "Rudrapur")]),
        ]);
        let r = resolver(backend, Mode::WithSearch);
        let hits = r.search("rudra").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Rudra");
        assert_eq!(hits[1].place_id, 2);
        assert_eq!(r.backend().search_calls.get(), 3);
    }

    #[test]
    fn test_search_exhausts_after_three_retries() {
        let backend = FakeBackend::default();
        backend.search.borrow_mut().extend([
            Err(LookupError::Status(503)),
            Err(LookupError::Status(503)),
            Err(LookupError::Status(503)),
            Err(LookupError::Status(429)),
            Ok(vec![place(1, "Never reached")]),
        ]);
        let r = resolver(backend, Mode::WithSearch);
        let err = r.search("rudra").unwrap_err();
        assert_eq!(
            err,
            SearchError::Exhausted {
                attempts: 4,
                last: LookupError::Status(429)
            }
        );
        assert_eq!(r.backend().search_calls.get(), 4);
    }

    #[test]
    fn test_search_zero_hits_is_ok() {
        let backend = FakeBackend::default();
        backend.search.borrow_mut().push_back(Ok(vec![]));
        let r = resolver(backend, Mode::WithSearch);
        assert_eq!(r.search("nowhere at all"), Ok(vec![]));
        assert_eq!(r.backend().search_calls.get(), 1);
    }

    #[test]
    fn test_search_guards() {
        let r = resolver(FakeBackend::default(), Mode::WithAddress);
        assert_eq!(r.search("paris"), Err(SearchError::Unavailable));

        let r = resolver(FakeBackend::default(), Mode::WithSearch);
        assert_eq!(r.search("  "), Err(SearchError::EmptyQuery));
        assert_eq!(r.backend().network_calls(), 0);
    }

    #[test]
    fn test_zero_retries_means_single_attempt() {
        let backend = FakeBackend::default();
        backend.search.borrow_mut().push_back(Err(LookupError::Status(500)));
        let r = MapsResolver::with_backend(backend, Mode::WithSearch).with_retry(0, Duration::ZERO);
        assert!(matches!(r.search("x"), Err(SearchError::Exhausted { attempts: 1, .. })));
    }
}
