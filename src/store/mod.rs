pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::quota::QuotaStore;
use disk::DiskQuotaStore;
use memory::MemoryQuotaStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens the persistent quota store under the configured data path, falling back to an
/// in-memory store when the path cannot be resolved or opened.
pub fn open_quota_store(config: &AppConfig) -> Arc<dyn QuotaStore> {
    let opened = config
        .default_data_path()
        .and_then(|path| DiskQuotaStore::open(&path.join("store")));

    match opened {
        Ok(store) => {
            debug!("Using persistent quota store");
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "Falling back to in-memory quota store");
            Arc::new(MemoryQuotaStore::new())
        }
    }
}
