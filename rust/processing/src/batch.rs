// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel decoding of many panoramas.
//!
//! Each panorama id is decoded at most once per batch; later requests for an
//! id already in the batch are dropped.

use crate::cache::DepthCache;
use crate::error::Result;
use crate::loader::{DepthLoader, DepthSource};
use crate::panorama::PanoramaMeta;
use panodepth_core::{DepthField, SegmentConfig};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::time::Instant;

/// One payload to decode
#[derive(Debug, Clone)]
pub struct DecodeRequest {
    pub pano_id: String,
    /// Provider depth payload (URL-safe base64 of the compressed buffer)
    pub payload: String,
}

impl DecodeRequest {
    pub fn new(pano_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            pano_id: pano_id.into(),
            payload: payload.into(),
        }
    }
}

/// Outcome for one panorama id
#[derive(Debug)]
pub struct DecodeOutcome {
    pub pano_id: String,
    pub result: Result<DepthField>,
    /// Location and heading, for responses that carry them
    pub meta: Option<PanoramaMeta>,
}

/// First occurrence of each id, in input order
fn unique_by_id<'a, T>(items: &'a [T], id: impl Fn(&T) -> &str) -> Vec<&'a T> {
    let mut seen = FxHashSet::default();
    items.iter().filter(|item| seen.insert(id(*item).to_string())).collect()
}

/// Decode payloads in parallel, one outcome per unique id in input order
pub fn decode_batch(requests: &[DecodeRequest], config: &SegmentConfig) -> Vec<DecodeOutcome> {
    let start = Instant::now();
    let unique = unique_by_id(requests, |request| &request.pano_id);

    let outcomes: Vec<DecodeOutcome> = unique
        .into_par_iter()
        .map(|request| DecodeOutcome {
            pano_id: request.pano_id.clone(),
            result: DepthField::decode_with_config(&request.payload, config).map_err(Into::into),
            meta: None,
        })
        .collect();

    log_batch(requests.len(), &outcomes, start);
    outcomes
}

/// Load and decode panoramas in parallel through a loader
pub fn load_batch<C, S>(loader: &DepthLoader<C, S>, pano_ids: &[String]) -> Vec<DecodeOutcome>
where
    C: DepthCache,
    S: DepthSource,
{
    let start = Instant::now();
    let unique = unique_by_id(pano_ids, |id| id.as_str());

    let outcomes: Vec<DecodeOutcome> = unique
        .into_par_iter()
        .map(|pano_id| {
            let (result, meta) = match loader.load_with_meta(pano_id) {
                Ok((field, meta)) => (Ok(field), meta),
                Err(e) => (Err(e), None),
            };
            DecodeOutcome {
                pano_id: pano_id.clone(),
                result,
                meta,
            }
        })
        .collect();

    log_batch(pano_ids.len(), &outcomes, start);
    outcomes
}

fn log_batch(requested: usize, outcomes: &[DecodeOutcome], start: Instant) {
    let failed = outcomes.iter().filter(|outcome| outcome.result.is_err()).count();
    tracing::debug!(
        requested,
        decoded = outcomes.len() - failed,
        failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch decode complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::Error;
    use panodepth_core::PayloadBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn payload(width: u16) -> String {
        let mut builder = PayloadBuilder::new(width, 4);
        let wall = builder.add_plane([1.0, 0.0, 0.0], 5.0);
        builder.fill(wall, 0..=1, 1..=2);
        builder.to_payload().unwrap()
    }

    #[test]
    fn test_decode_batch_keeps_order_and_dedups() {
        let requests = vec![
            DecodeRequest::new("b", payload(8)),
            DecodeRequest::new("a", payload(16)),
            DecodeRequest::new("b", payload(32)),
            DecodeRequest::new("c", "%%%"),
        ];
        let outcomes = decode_batch(&requests, &SegmentConfig::default());

        let ids: Vec<&str> = outcomes.iter().map(|o| o.pano_id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        // The first request for "b" wins
        assert_eq!(outcomes[0].result.as_ref().unwrap().width, 8);
        assert_eq!(outcomes[1].result.as_ref().unwrap().width, 16);
        assert!(matches!(outcomes[2].result, Err(Error::Core(_))));
    }

    #[test]
    fn test_decode_batch_empty() {
        assert!(decode_batch(&[], &SegmentConfig::default()).is_empty());
    }

    struct Provider {
        calls: AtomicUsize,
    }

    impl DepthSource for Provider {
        fn fetch(&self, _pano_id: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = serde_json::json!({ "model": { "depth_map": payload(8) } });
            Ok(serde_json::to_vec(&body)?)
        }
    }

    #[test]
    fn test_load_batch_fetches_each_id_once() {
        let loader = DepthLoader::new(
            MemoryCache::new(),
            Provider {
                calls: AtomicUsize::new(0),
            },
        );
        let ids: Vec<String> = ["x", "y", "x", "z", "y"].iter().map(|s| s.to_string()).collect();
        let outcomes = load_batch(&loader, &ids);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert!(outcomes.iter().all(|o| o.meta.is_none()));
        assert_eq!(loader.source().calls.load(Ordering::SeqCst), 3);
        assert_eq!(loader.cache().len(), 3);

        // A second batch is served entirely from the cache
        let again = load_batch(&loader, &ids);
        assert!(again.iter().all(|o| o.result.is_ok()));
        assert_eq!(loader.source().calls.load(Ordering::SeqCst), 3);
    }
}
