//! Stake ledger
//!
//! Orchestrates persistence for the settlement engine. Every mutation follows
//! the same shape: load the current record, apply a transition in memory,
//! revalidate, then write back with the revision the record was read at. A
//! revision conflict means another caller won the race; the ledger re-reads
//! once and only reports success if the requested transition is already
//! applied on the fresh record.

use {
    crate::transition::{self, Applied},
    railbird_common::{utils::time, Error, NewStake, Result, Stake},
    railbird_store::{StakeStore, Versioned},
    std::sync::Arc,
    tracing::{debug, info},
    uuid::Uuid,
};

pub struct StakeLedger {
    store: Arc<dyn StakeStore>,
}

impl StakeLedger {
    pub fn new(store: Arc<dyn StakeStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new stake, assigning its id.
    pub async fn create(&self, draft: NewStake) -> Result<Stake> {
        let stake = Stake::new(
            Uuid::new_v4().to_string(),
            draft,
            time::current_timestamp(),
        )?;
        let stored = self.store.insert_stake(stake).await?;
        info!(
            "Created stake {} ({} backing {})",
            stored.record.id, stored.record.staker_user_id, stored.record.staked_player_user_id
        );
        Ok(stored.record)
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<Stake> {
        Ok(self.load(id).await?.record)
    }

    /// All stakes where the user is either party, most recent first. Invites
    /// the user authored as staker stay hidden until the player responds.
    pub async fn fetch_for_user(&self, user_id: &str) -> Result<Vec<Stake>> {
        let mut stakes: Vec<Stake> = self
            .store
            .stakes_for_user(user_id)
            .await?
            .into_iter()
            .map(|v| v.record)
            .filter(|s| !(s.invite_pending && s.is_staker(user_id)))
            .collect();
        stakes.sort_by(|a, b| b.proposed_at.cmp(&a.proposed_at));
        Ok(stakes)
    }

    pub async fn update_session_results(
        &self,
        id: &str,
        buy_in: f64,
        cashout: f64,
    ) -> Result<Stake> {
        let updated = self
            .mutate(id, |stake| transition::update_results(stake, buy_in, cashout))
            .await?;
        debug!(
            "Updated results for stake {}: buy-in {}, cashout {}, amount {}",
            id,
            buy_in,
            cashout,
            updated.settlement_amount()
        );
        Ok(updated)
    }

    pub async fn accept_invite(&self, id: &str, user_id: &str) -> Result<Stake> {
        self.mutate(id, |stake| transition::accept_invite(stake, user_id))
            .await
    }

    pub async fn decline_invite(&self, id: &str, user_id: &str) -> Result<Stake> {
        self.mutate(id, |stake| transition::decline_invite(stake, user_id))
            .await
    }

    pub async fn mark_ready_for_settlement(&self, id: &str, user_id: &str) -> Result<Stake> {
        self.mutate(id, |stake| {
            transition::mark_ready_for_settlement(stake, user_id)
        })
        .await
    }

    pub async fn initiate_settlement(&self, id: &str, initiator_user_id: &str) -> Result<Stake> {
        let stake = self
            .mutate(id, |stake| {
                transition::initiate_settlement(stake, initiator_user_id)
            })
            .await?;
        info!(
            "Settlement initiated on stake {} by {} for {}",
            id,
            initiator_user_id,
            stake.settlement_amount()
        );
        Ok(stake)
    }

    pub async fn confirm_settlement(&self, id: &str, confirming_user_id: &str) -> Result<Stake> {
        let stake = self
            .mutate(id, |stake| {
                transition::confirm_settlement(stake, confirming_user_id)
            })
            .await?;
        info!(
            "Stake {} settled, transfer amount {}",
            id,
            stake.settlement_amount()
        );
        Ok(stake)
    }

    pub async fn settle_manual_stake(&self, id: &str, user_id: &str) -> Result<Stake> {
        let stake = self
            .mutate(id, |stake| transition::settle_manual_stake(stake, user_id))
            .await?;
        info!(
            "Manual stake {} settled, transfer amount {}",
            id,
            stake.settlement_amount()
        );
        Ok(stake)
    }

    pub async fn cancel(&self, id: &str, user_id: &str) -> Result<Stake> {
        self.mutate(id, |stake| transition::cancel(stake, user_id))
            .await
    }

    /// Hard delete for data correction; normal flow ends stakes in a terminal
    /// status instead.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete_stake(id).await?;
        info!("Deleted stake {}", id);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Versioned<Stake>> {
        self.store
            .get_stake(id)
            .await?
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    async fn mutate<F>(&self, id: &str, apply: F) -> Result<Stake>
    where
        F: Fn(&mut Stake) -> Result<Applied>,
    {
        let Versioned {
            revision,
            record: mut stake,
        } = self.load(id).await?;

        match apply(&mut stake)? {
            Applied::AlreadyApplied => Ok(stake),
            Applied::Changed => {
                stake.last_updated_at = time::current_timestamp();
                stake.validate()?;
                match self.store.update_stake(stake, revision).await {
                    Ok(stored) => Ok(stored.record),
                    Err(Error::ConcurrentModification { .. }) => {
                        // Lost the race. Succeed only if the winner left the
                        // stake in the state this call was asking for.
                        let mut fresh = self.load(id).await?.record;
                        match apply(&mut fresh) {
                            Ok(Applied::AlreadyApplied) => Ok(fresh),
                            _ => Err(Error::ConcurrentModification { id: id.to_string() }),
                        }
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}
