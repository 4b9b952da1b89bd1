use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use std::sync::{PoisonError, RwLock};
use tracing::info;

use crate::store::Store;

/// Expected capacity and false-positive rate. The filter grows past the
/// capacity on its own; a false positive only costs the issuer one draw.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// In-process set of issued student tokens (false positives possible).
pub struct TokenFilter {
    inner: RwLock<CuckooFilter<u32>>,
}

impl TokenFilter {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }

    /// Check if a token might already be issued
    pub fn might_exist(&self, token: u32) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&token)
    }

    pub fn insert(&self, token: u32) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&token);
    }

    fn insert_batch(&self, tokens: &[u32]) {
        let mut filter = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for token in tokens {
            filter.add(token);
        }
    }

    /// Loads every issued token from the store, streaming in batches.
    pub async fn warmup(&self, store: &dyn Store, batch_size: usize) -> Result<usize> {
        let mut stream = store.token_stream();

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let token = row.map_err(|e| anyhow!("token fetch failed: {}", e))?;
            batch.push(token);
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        info!(tokens = total, "Token filter warmup complete");
        Ok(total)
    }
}

impl Default for TokenFilter {
    fn default() -> Self {
        Self::new()
    }
}
