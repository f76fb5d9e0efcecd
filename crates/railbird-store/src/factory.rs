//! Config-driven store construction.

use {
    crate::{
        memory::MemoryStore,
        postgres::PostgresStore,
        traits::{ManualStakerDirectory, StakeStore},
    },
    railbird_common::{Error, Result, StoreBackend, StoreConfig},
    std::sync::Arc,
};

/// Handles to the two persistence surfaces the engine consumes. Backends
/// implement both, so the handles may point at the same instance.
pub struct StoreHandles {
    pub stakes: Arc<dyn StakeStore>,
    pub directory: Arc<dyn ManualStakerDirectory>,
}

pub async fn open_store(config: &StoreConfig) -> Result<StoreHandles> {
    match config.backend {
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            Ok(StoreHandles {
                stakes: store.clone(),
                directory: store,
            })
        }
        StoreBackend::Postgres => {
            let pg_config = config.postgres.as_ref().ok_or_else(|| {
                Error::Persistence("postgres backend selected without postgres config".to_string())
            })?;
            let store = Arc::new(PostgresStore::connect(pg_config).await?);
            Ok(StoreHandles {
                stakes: store.clone(),
                directory: store,
            })
        }
    }
}
