//! Stake entity
//!
//! This module defines the central staking-agreement record and the invariants
//! it must satisfy at every mutation. Session result fields are crate-private so
//! the settlement amount can never drift out of sync with the results that
//! produced it.

use {
    crate::errors::{Error, Result},
    crate::types::counterparty::Counterparty,
    crate::types::manual_staker::normalize_name,
    crate::types::settlement::SettlementBreakdown,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Reserved id carried by whichever party of an off-app stake has no account.
pub const OFF_APP_USER_ID: &str = "__off_app__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StakeStatus {
    PendingAcceptance,
    Active,
    AwaitingSettlement,
    AwaitingConfirmation,
    Settled,
    Declined,
    Cancelled,
}

impl StakeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StakeStatus::Settled | StakeStatus::Declined | StakeStatus::Cancelled
        )
    }
}

impl fmt::Display for StakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StakeStatus::PendingAcceptance => "pendingAcceptance",
            StakeStatus::Active => "active",
            StakeStatus::AwaitingSettlement => "awaitingSettlement",
            StakeStatus::AwaitingConfirmation => "awaitingConfirmation",
            StakeStatus::Settled => "settled",
            StakeStatus::Declined => "declined",
            StakeStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Parameters supplied by the staker when creating a stake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStake {
    pub session_id: String,
    pub session_game_name: String,
    pub session_stakes: String,
    pub session_date: DateTime<Utc>,
    pub is_tournament_session: bool,
    pub staker_user_id: String,
    pub staked_player_user_id: String,
    pub stake_percentage: f64,
    pub markup: f64,
    #[serde(default)]
    pub is_off_app_stake: bool,
    #[serde(default)]
    pub manual_staker_display_name: Option<String>,
    #[serde(default)]
    pub invite_pending: bool,
}

/// One staking agreement for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stake {
    pub id: String,
    pub session_id: String,
    pub session_game_name: String,
    pub session_stakes: String,
    pub session_date: DateTime<Utc>,
    pub staker_user_id: String,
    pub staked_player_user_id: String,
    pub stake_percentage: f64,
    pub markup: f64,
    pub(crate) total_player_buy_in_for_session: f64,
    pub(crate) player_cashout_for_session: f64,
    pub(crate) amount_transferred_at_settlement: f64,
    status: StakeStatus,
    pub proposed_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    settlement_initiator_user_id: Option<String>,
    settlement_confirmer_user_id: Option<String>,
    pub is_tournament_session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_staker_display_name: Option<String>,
    #[serde(default)]
    pub is_off_app_stake: bool,
    #[serde(default)]
    pub invite_pending: bool,
}

impl Stake {
    pub fn new(id: String, draft: NewStake, now: DateTime<Utc>) -> Result<Self> {
        let status = if draft.invite_pending {
            StakeStatus::PendingAcceptance
        } else {
            StakeStatus::Active
        };
        let stake = Stake {
            id,
            session_id: draft.session_id,
            session_game_name: draft.session_game_name,
            session_stakes: draft.session_stakes,
            session_date: draft.session_date,
            staker_user_id: draft.staker_user_id,
            staked_player_user_id: draft.staked_player_user_id,
            stake_percentage: draft.stake_percentage,
            markup: draft.markup,
            total_player_buy_in_for_session: 0.0,
            player_cashout_for_session: 0.0,
            amount_transferred_at_settlement: 0.0,
            status,
            proposed_at: now,
            last_updated_at: now,
            settlement_initiator_user_id: None,
            settlement_confirmer_user_id: None,
            is_tournament_session: draft.is_tournament_session,
            manual_staker_display_name: draft.manual_staker_display_name,
            is_off_app_stake: draft.is_off_app_stake,
            invite_pending: draft.invite_pending,
        };
        stake.validate()?;
        Ok(stake)
    }

    pub fn buy_in(&self) -> f64 {
        self.total_player_buy_in_for_session
    }

    pub fn cashout(&self) -> f64 {
        self.player_cashout_for_session
    }

    /// Signed transfer amount: positive means the staked player owes the
    /// staker, negative means the staker owes the staked player.
    pub fn settlement_amount(&self) -> f64 {
        self.amount_transferred_at_settlement
    }

    pub fn status(&self) -> StakeStatus {
        self.status
    }

    /// Raw status write that skips the transition guards. Settlement flows
    /// must go through the transition layer; this exists for store fixtures
    /// and data migrations.
    pub fn set_status_unchecked(&mut self, status: StakeStatus) {
        self.status = status;
    }

    pub fn settlement_initiator(&self) -> Option<&str> {
        self.settlement_initiator_user_id.as_deref()
    }

    pub fn settlement_confirmer(&self) -> Option<&str> {
        self.settlement_confirmer_user_id.as_deref()
    }

    pub fn record_initiator(&mut self, user_id: &str) {
        self.settlement_initiator_user_id = Some(user_id.to_string());
    }

    pub fn record_confirmer(&mut self, user_id: &str) {
        self.settlement_confirmer_user_id = Some(user_id.to_string());
    }

    /// Record session results and recompute the settlement amount. Status
    /// guards live in the transition layer; the entity only enforces that the
    /// amount can never be set independently of the results.
    pub fn set_session_results(&mut self, buy_in: f64, cashout: f64) -> Result<()> {
        if !buy_in.is_finite() || buy_in < 0.0 {
            return Err(Error::validation(
                "totalPlayerBuyInForSession",
                format!("must be a non-negative amount, got {}", buy_in),
            ));
        }
        if !cashout.is_finite() || cashout < 0.0 {
            return Err(Error::validation(
                "playerCashoutForSession",
                format!("must be a non-negative amount, got {}", cashout),
            ));
        }
        self.total_player_buy_in_for_session = buy_in;
        self.player_cashout_for_session = cashout;
        self.recompute_settlement();
        Ok(())
    }

    pub fn recompute_settlement(&mut self) {
        self.amount_transferred_at_settlement =
            SettlementBreakdown::for_stake(self).amount_transferred;
    }

    /// A zero buy-in means the session has not been entered yet; callers must
    /// not read the settlement amount as final before this returns true.
    pub fn has_final_results(&self) -> bool {
        self.total_player_buy_in_for_session > 0.0
    }

    pub fn is_party(&self, user_id: &str) -> bool {
        self.staker_user_id == user_id || self.staked_player_user_id == user_id
    }

    pub fn is_staker(&self, user_id: &str) -> bool {
        self.staker_user_id == user_id
    }

    /// The app-side party of an off-app stake, i.e. the owner of the manual
    /// counterparty relationship. `None` for app-to-app stakes.
    pub fn app_party(&self) -> Option<&str> {
        if !self.is_off_app_stake {
            return None;
        }
        if self.staker_user_id == OFF_APP_USER_ID {
            Some(&self.staked_player_user_id)
        } else {
            Some(&self.staker_user_id)
        }
    }

    /// The other side of this stake as seen by `user_id`, or `None` when the
    /// user is not a party.
    pub fn counterparty_of(&self, user_id: &str) -> Option<Counterparty> {
        if self.is_off_app_stake {
            if self.app_party() != Some(user_id) {
                return None;
            }
            let name = self.manual_staker_display_name.as_deref().unwrap_or("");
            return Some(Counterparty::Manual(normalize_name(name)));
        }
        if self.staker_user_id == user_id {
            Some(Counterparty::AppUser(self.staked_player_user_id.clone()))
        } else if self.staked_player_user_id == user_id {
            Some(Counterparty::AppUser(self.staker_user_id.clone()))
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.stake_percentage > 0.0 && self.stake_percentage <= 1.0) {
            return Err(Error::validation(
                "stakePercentage",
                format!("must be in (0, 1], got {}", self.stake_percentage),
            ));
        }
        if !(self.markup > 0.0 && self.markup.is_finite()) {
            return Err(Error::validation(
                "markup",
                format!("must be positive, got {}", self.markup),
            ));
        }
        if self.total_player_buy_in_for_session < 0.0 {
            return Err(Error::validation(
                "totalPlayerBuyInForSession",
                "must be non-negative",
            ));
        }
        if self.player_cashout_for_session < 0.0 {
            return Err(Error::validation(
                "playerCashoutForSession",
                "must be non-negative",
            ));
        }
        if self.staker_user_id.is_empty() {
            return Err(Error::validation("stakerUserId", "must not be empty"));
        }
        if self.staked_player_user_id.is_empty() {
            return Err(Error::validation("stakedPlayerUserId", "must not be empty"));
        }
        if self.staker_user_id == self.staked_player_user_id {
            return Err(Error::validation(
                "stakedPlayerUserId",
                "staker and staked player must differ",
            ));
        }
        if let (Some(initiator), Some(confirmer)) = (
            self.settlement_initiator_user_id.as_deref(),
            self.settlement_confirmer_user_id.as_deref(),
        ) {
            if initiator == confirmer {
                return Err(Error::SelfConfirmation);
            }
        }
        if self.is_off_app_stake {
            let manual_sides = [&self.staker_user_id, &self.staked_player_user_id]
                .iter()
                .filter(|id| id.as_str() == OFF_APP_USER_ID)
                .count();
            if manual_sides != 1 {
                return Err(Error::validation(
                    "isOffAppStake",
                    "exactly one party of an off-app stake must be the off-app sentinel",
                ));
            }
            match self.manual_staker_display_name.as_deref() {
                Some(name) if !name.trim().is_empty() => {}
                _ => {
                    return Err(Error::validation(
                        "manualStakerDisplayName",
                        "required for off-app stakes",
                    ));
                }
            }
            if self.invite_pending {
                return Err(Error::validation(
                    "invitePending",
                    "off-app counterparties cannot accept invites",
                ));
            }
        } else {
            if self.staker_user_id == OFF_APP_USER_ID
                || self.staked_player_user_id == OFF_APP_USER_ID
            {
                return Err(Error::validation(
                    "isOffAppStake",
                    "off-app sentinel used without isOffAppStake",
                ));
            }
            if self.manual_staker_display_name.is_some() {
                return Err(Error::validation(
                    "manualStakerDisplayName",
                    "only valid for off-app stakes",
                ));
            }
        }
        Ok(())
    }
}
