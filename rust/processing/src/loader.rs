// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cache-or-fetch loading of provider depth responses.
//!
//! The raw provider JSON is cached verbatim under [`depth_cache_key`], so a
//! cache written by one version of the decoder stays usable by the next.

use crate::cache::{depth_cache_key, DepthCache};
use crate::error::{Error, Result};
use crate::panorama::PanoramaMeta;
use panodepth_core::{DepthField, SegmentConfig};
use panodepth_geometry::LatLng;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;

/// Provider of raw depth responses (typically an HTTP client)
pub trait DepthSource: Send + Sync {
    /// Raw provider JSON for a panorama
    fn fetch(&self, pano_id: &str) -> Result<Vec<u8>>;
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Cache,
    Live,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    model: Option<ProviderModel>,
    #[serde(rename = "Location")]
    location: Option<ProviderLocation>,
    #[serde(rename = "Projection")]
    projection: Option<ProviderProjection>,
}

#[derive(Debug, Deserialize)]
struct ProviderModel {
    depth_map: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderLocation {
    #[serde(rename = "panoId")]
    pano_id: Option<String>,
    lat: Option<Value>,
    lng: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ProviderProjection {
    pano_yaw_deg: Option<Value>,
}

/// Providers send coordinates either as numbers or as decimal strings
fn number(value: &Option<Value>) -> Option<f64> {
    match value.as_ref()? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode the depth field embedded in a provider response
pub fn decode_response(pano_id: &str, bytes: &[u8], config: &SegmentConfig) -> Result<DepthField> {
    let response: ProviderResponse = serde_json::from_slice(bytes)?;
    let payload = response
        .model
        .and_then(|model| model.depth_map)
        .ok_or_else(|| Error::MissingDepthMap(pano_id.to_string()))?;
    Ok(DepthField::decode_with_config(&payload, config)?)
}

/// Panorama id, heading and location from a provider response, when present
pub fn response_meta(bytes: &[u8]) -> Result<Option<PanoramaMeta>> {
    let response: ProviderResponse = serde_json::from_slice(bytes)?;
    let Some(location) = response.location else {
        return Ok(None);
    };
    let (Some(pano_id), Some(lat), Some(lng)) =
        (location.pano_id, number(&location.lat), number(&location.lng))
    else {
        return Ok(None);
    };
    let heading_degrees = response
        .projection
        .and_then(|projection| number(&projection.pano_yaw_deg))
        .unwrap_or(0.0);

    Ok(Some(PanoramaMeta {
        pano_id,
        heading_degrees,
        location: LatLng::new(lat, lng),
    }))
}

/// Loads depth fields, consulting the cache before the source
pub struct DepthLoader<C, S> {
    cache: C,
    source: S,
    config: SegmentConfig,
}

impl<C: DepthCache, S: DepthSource> DepthLoader<C, S> {
    pub fn new(cache: C, source: S) -> Self {
        Self {
            cache,
            source,
            config: SegmentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SegmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Raw provider response, from the cache when possible.
    /// Live responses are written back before returning.
    pub fn load_raw(&self, pano_id: &str) -> Result<(Vec<u8>, LoadOrigin)> {
        let key = depth_cache_key(pano_id);
        if let Some(bytes) = self.cache.get(&key)? {
            tracing::info!(pano_id = %pano_id, "Depth loaded from cache");
            return Ok((bytes, LoadOrigin::Cache));
        }

        let start = Instant::now();
        let bytes = self.source.fetch(pano_id)?;
        tracing::info!(
            pano_id = %pano_id,
            size = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Depth fetched live"
        );
        self.cache.set(&key, &bytes)?;
        Ok((bytes, LoadOrigin::Live))
    }

    /// Decoded depth field for a panorama
    pub fn load(&self, pano_id: &str) -> Result<DepthField> {
        let (bytes, _) = self.load_raw(pano_id)?;
        decode_response(pano_id, &bytes, &self.config)
    }

    /// Decoded depth field plus whatever metadata the response carries
    pub fn load_with_meta(&self, pano_id: &str) -> Result<(DepthField, Option<PanoramaMeta>)> {
        let (bytes, _) = self.load_raw(pano_id)?;
        let field = decode_response(pano_id, &bytes, &self.config)?;
        Ok((field, response_meta(&bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use panodepth_core::PayloadBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        body: Vec<u8>,
        calls: AtomicUsize,
    }

    impl DepthSource for CountingSource {
        fn fetch(&self, _pano_id: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    struct OfflineSource;

    impl DepthSource for OfflineSource {
        fn fetch(&self, pano_id: &str) -> Result<Vec<u8>> {
            Err(Error::Fetch(format!("offline: {}", pano_id)))
        }
    }

    fn response_body() -> Vec<u8> {
        let mut builder = PayloadBuilder::new(8, 4);
        let wall = builder.add_plane([1.0, 0.0, 0.0], 5.0);
        builder.fill(wall, 1..=3, 1..=2);
        let payload = builder.to_payload().unwrap();
        serde_json::to_vec(&serde_json::json!({
            "Location": { "panoId": "pano-1", "lat": "51.5007", "lng": -0.1246 },
            "Projection": { "pano_yaw_deg": "92.5" },
            "model": { "depth_map": payload },
        }))
        .unwrap()
    }

    #[test]
    fn test_fetch_then_cache() {
        let source = CountingSource {
            body: response_body(),
            calls: AtomicUsize::new(0),
        };
        let loader = DepthLoader::new(MemoryCache::new(), source);

        let (_, first) = loader.load_raw("pano-1").unwrap();
        let (_, second) = loader.load_raw("pano-1").unwrap();
        assert_eq!(first, LoadOrigin::Live);
        assert_eq!(second, LoadOrigin::Cache);
        assert_eq!(loader.source().calls.load(Ordering::SeqCst), 1);

        let cached = loader.cache().get("depth-pano-1").unwrap().unwrap();
        assert_eq!(cached, response_body());
    }

    #[test]
    fn test_load_decodes_field() {
        let loader = DepthLoader::new(
            MemoryCache::new(),
            CountingSource {
                body: response_body(),
                calls: AtomicUsize::new(0),
            },
        );
        let field = loader.load("pano-1").unwrap();
        assert_eq!((field.width, field.height), (8, 4));
        assert_eq!(field.plane_index_at(2, 1), Some(1));
    }

    #[test]
    fn test_load_with_meta() {
        let loader = DepthLoader::new(
            MemoryCache::new(),
            CountingSource {
                body: response_body(),
                calls: AtomicUsize::new(0),
            },
        );
        let (field, meta) = loader.load_with_meta("pano-1").unwrap();
        assert_eq!(field.width, 8);
        let meta = meta.unwrap();
        assert_eq!(meta.pano_id, "pano-1");
        assert_eq!(meta.heading_degrees, 92.5);

        // Second call comes from the cache and yields the same metadata
        let (_, again) = loader.load_with_meta("pano-1").unwrap();
        assert_eq!(again, Some(meta));
        assert_eq!(loader.source().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_response_needs_no_source() {
        let cache = MemoryCache::new();
        cache.set(&depth_cache_key("pano-1"), &response_body()).unwrap();
        let loader = DepthLoader::new(cache, OfflineSource);
        assert!(loader.load("pano-1").is_ok());
        assert!(matches!(loader.load("pano-2"), Err(Error::Fetch(_))));
    }

    #[test]
    fn test_missing_depth_map() {
        let body = br#"{"model":{}}"#;
        let err = decode_response("pano-9", body, &SegmentConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingDepthMap(id) if id == "pano-9"));

        let err = decode_response("pano-9", b"not json", &SegmentConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_corrupt_payload_is_core_error() {
        let body = br#"{"model":{"depth_map":"!!"}}"#;
        let err = decode_response("p", body, &SegmentConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Core(panodepth_core::Error::Decode(_))));
    }

    #[test]
    fn test_response_meta() {
        let meta = response_meta(&response_body()).unwrap().unwrap();
        assert_eq!(meta.pano_id, "pano-1");
        assert_eq!(meta.heading_degrees, 92.5);
        assert_eq!(meta.location.lat, 51.5007);
        assert_eq!(meta.location.lng, -0.1246);

        assert!(response_meta(br#"{"model":{}}"#).unwrap().is_none());
    }
}
