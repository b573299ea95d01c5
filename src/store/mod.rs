pub mod disk;
pub mod memory;

use crate::core::cache::FundStore;
use crate::core::config::{AppConfig, StoreBackend};
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Opens the configured cache backend.
///
/// Returns `None` when caching is switched off or the store cannot be opened;
/// callers then fetch from upstream on every request.
pub fn open(config: &AppConfig) -> Option<Arc<dyn FundStore>> {
    match config.store.backend {
        StoreBackend::None => {
            info!("Caching disabled by configuration");
            None
        }
        StoreBackend::Memory => {
            info!("Using in-memory cache");
            Some(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Disk => {
            let opened = config
                .data_path()
                .and_then(|path| DiskStore::open(&path).map(|store| (path, store)));
            match opened {
                Ok((path, store)) => {
                    info!("Using disk cache at {}", path.display());
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!(error = %e, "Cache store unavailable. Caching will be disabled.");
                    None
                }
            }
        }
    }
}
