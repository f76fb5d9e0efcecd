//! In-memory store used by tests and the demo binary.

use {
    crate::traits::{ManualStakerDirectory, StakeStore, Versioned},
    async_trait::async_trait,
    railbird_common::{Error, ManualStaker, Result, Stake},
    std::collections::HashMap,
    tokio::sync::RwLock,
};

#[derive(Default)]
pub struct MemoryStore {
    stakes: RwLock<HashMap<String, Versioned<Stake>>>,
    manual_stakers: RwLock<HashMap<String, ManualStaker>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StakeStore for MemoryStore {
    async fn insert_stake(&self, stake: Stake) -> Result<Versioned<Stake>> {
        let mut stakes = self.stakes.write().await;
        if stakes.contains_key(&stake.id) {
            return Err(Error::Persistence(format!(
                "stake {} already exists",
                stake.id
            )));
        }
        let versioned = Versioned {
            revision: 1,
            record: stake,
        };
        stakes.insert(versioned.record.id.clone(), versioned.clone());
        Ok(versioned)
    }

    async fn get_stake(&self, id: &str) -> Result<Option<Versioned<Stake>>> {
        let stakes = self.stakes.read().await;
        Ok(stakes.get(id).cloned())
    }

    async fn stakes_for_user(&self, user_id: &str) -> Result<Vec<Versioned<Stake>>> {
        let stakes = self.stakes.read().await;
        Ok(stakes
            .values()
            .filter(|v| v.record.is_party(user_id))
            .cloned()
            .collect())
    }

    async fn update_stake(&self, stake: Stake, expected_revision: u64) -> Result<Versioned<Stake>> {
        let mut stakes = self.stakes.write().await;
        let current = stakes.get_mut(&stake.id).ok_or_else(|| Error::NotFound {
            id: stake.id.clone(),
        })?;
        if current.revision != expected_revision {
            return Err(Error::ConcurrentModification { id: stake.id });
        }
        current.revision += 1;
        current.record = stake;
        Ok(current.clone())
    }

    async fn delete_stake(&self, id: &str) -> Result<()> {
        let mut stakes = self.stakes.write().await;
        stakes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ManualStakerDirectory for MemoryStore {
    async fn upsert_manual_staker(&self, staker: ManualStaker) -> Result<()> {
        let mut directory = self.manual_stakers.write().await;
        directory.insert(staker.id.clone(), staker);
        Ok(())
    }

    async fn manual_stakers_for_user(&self, user_id: &str) -> Result<Vec<ManualStaker>> {
        let directory = self.manual_stakers.read().await;
        let mut entries: Vec<ManualStaker> = directory
            .values()
            .filter(|s| s.created_by_user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.normalized_name().cmp(&b.normalized_name()));
        Ok(entries)
    }

    async fn delete_manual_staker(&self, id: &str) -> Result<()> {
        let mut directory = self.manual_stakers.write().await;
        directory
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }
}
