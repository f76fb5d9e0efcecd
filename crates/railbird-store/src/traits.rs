use {
    async_trait::async_trait,
    railbird_common::{ManualStaker, Result, Stake},
};

/// A record paired with the store revision it was read at. Mutations pass the
/// revision back so a lost update is detected instead of silently overwritten.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub revision: u64,
    pub record: T,
}

/// The persistence contract the settlement engine relies on: create/read/
/// update/delete by key plus equality queries over the party fields. Any
/// document store, relational table or key-value store can satisfy it.
#[async_trait]
pub trait StakeStore: Send + Sync + 'static {
    /// Persist a new stake. Fails if the id is already taken.
    async fn insert_stake(&self, stake: Stake) -> Result<Versioned<Stake>>;

    /// Fetch one stake by id.
    async fn get_stake(&self, id: &str) -> Result<Option<Versioned<Stake>>>;

    /// Fetch every stake where the user is either party.
    async fn stakes_for_user(&self, user_id: &str) -> Result<Vec<Versioned<Stake>>>;

    /// Compare-and-swap write: succeeds only while the stored revision still
    /// equals `expected_revision`, otherwise `ConcurrentModification`.
    async fn update_stake(&self, stake: Stake, expected_revision: u64) -> Result<Versioned<Stake>>;

    /// Hard delete, for data correction only.
    async fn delete_stake(&self, id: &str) -> Result<()>;

    /// Flush pending writes and release connections.
    async fn close(&self) -> Result<()>;
}

/// Directory of off-platform counterparties, keyed by creator + name. The
/// engine treats entries as opaque display identities.
#[async_trait]
pub trait ManualStakerDirectory: Send + Sync + 'static {
    async fn upsert_manual_staker(&self, staker: ManualStaker) -> Result<()>;

    async fn manual_stakers_for_user(&self, user_id: &str) -> Result<Vec<ManualStaker>>;

    async fn delete_manual_staker(&self, id: &str) -> Result<()>;
}
