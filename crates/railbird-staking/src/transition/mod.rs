//! Settlement state machine
//!
//! Pure transition rules over a `Stake`, applied in memory and persisted by the
//! ledger. Every transition reports whether it changed anything so a client
//! retry of an already-applied call is a no-op success rather than an error.

use railbird_common::{Error, Result, Stake, StakeStatus};

/// Outcome of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// The stake was already in the target state; nothing to write.
    AlreadyApplied,
}

fn illegal(action: &'static str, status: StakeStatus) -> Error {
    Error::IllegalTransition { action, status }
}

fn ensure_party(stake: &Stake, user_id: &str) -> Result<()> {
    if stake.is_party(user_id) {
        Ok(())
    } else {
        Err(Error::validation(
            "userId",
            format!("{} is not a party to stake {}", user_id, stake.id),
        ))
    }
}

/// For off-app stakes only the app-side party can act; the manual counterparty
/// has no agent. App-to-app stakes accept either party.
fn ensure_controller(stake: &Stake, user_id: &str) -> Result<()> {
    match stake.app_party() {
        Some(owner) if owner == user_id => Ok(()),
        Some(_) => Err(Error::validation(
            "userId",
            format!(
                "{} does not own the manual counterparty on stake {}",
                user_id, stake.id
            ),
        )),
        None => ensure_party(stake, user_id),
    }
}

/// Staked player accepts an invite: `pendingAcceptance -> active`.
pub fn accept_invite(stake: &mut Stake, user_id: &str) -> Result<Applied> {
    if stake.staked_player_user_id != user_id {
        return Err(Error::validation(
            "userId",
            format!("only the staked player can accept stake {}", stake.id),
        ));
    }
    match stake.status() {
        StakeStatus::Active => Ok(Applied::AlreadyApplied),
        StakeStatus::PendingAcceptance => {
            stake.set_status_unchecked(StakeStatus::Active);
            stake.invite_pending = false;
            Ok(Applied::Changed)
        }
        status => Err(illegal("acceptInvite", status)),
    }
}

/// Staked player rejects an invite: `pendingAcceptance -> declined`.
pub fn decline_invite(stake: &mut Stake, user_id: &str) -> Result<Applied> {
    if stake.staked_player_user_id != user_id {
        return Err(Error::validation(
            "userId",
            format!("only the staked player can decline stake {}", stake.id),
        ));
    }
    match stake.status() {
        StakeStatus::Declined => Ok(Applied::AlreadyApplied),
        StakeStatus::PendingAcceptance => {
            stake.set_status_unchecked(StakeStatus::Declined);
            stake.invite_pending = false;
            Ok(Applied::Changed)
        }
        status => Err(illegal("declineInvite", status)),
    }
}

/// Record or correct session results. Permitted while `active` or
/// `awaitingSettlement`; frozen once a confirmation is in flight.
pub fn update_results(stake: &mut Stake, buy_in: f64, cashout: f64) -> Result<Applied> {
    match stake.status() {
        StakeStatus::Active | StakeStatus::AwaitingSettlement => {
            stake.set_session_results(buy_in, cashout)?;
            Ok(Applied::Changed)
        }
        StakeStatus::AwaitingConfirmation | StakeStatus::Settled => Err(Error::StaleResults),
        status => Err(illegal("updateSessionResults", status)),
    }
}

/// Flag a session's results as final: `active -> awaitingSettlement`.
pub fn mark_ready_for_settlement(stake: &mut Stake, user_id: &str) -> Result<Applied> {
    ensure_controller(stake, user_id)?;
    match stake.status() {
        StakeStatus::AwaitingSettlement => Ok(Applied::AlreadyApplied),
        StakeStatus::Active => {
            if !stake.has_final_results() {
                return Err(Error::validation(
                    "totalPlayerBuyInForSession",
                    "session results must be entered before settlement",
                ));
            }
            stake.set_status_unchecked(StakeStatus::AwaitingSettlement);
            Ok(Applied::Changed)
        }
        status => Err(illegal("markReadyForSettlement", status)),
    }
}

/// First half of the two-party protocol:
/// `awaitingSettlement -> awaitingConfirmation`, recording the initiator and
/// recomputing the transfer amount from the current results.
pub fn initiate_settlement(stake: &mut Stake, user_id: &str) -> Result<Applied> {
    if stake.is_off_app_stake {
        return Err(Error::validation(
            "isOffAppStake",
            "off-app stakes settle via settleManualStake",
        ));
    }
    ensure_party(stake, user_id)?;
    match stake.status() {
        StakeStatus::AwaitingConfirmation
            if stake.settlement_initiator() == Some(user_id) =>
        {
            Ok(Applied::AlreadyApplied)
        }
        StakeStatus::AwaitingSettlement => {
            stake.record_initiator(user_id);
            stake.recompute_settlement();
            stake.set_status_unchecked(StakeStatus::AwaitingConfirmation);
            Ok(Applied::Changed)
        }
        status => Err(illegal("initiateSettlement", status)),
    }
}

/// Second half: `awaitingConfirmation -> settled`. The initiator can never
/// confirm their own initiation.
pub fn confirm_settlement(stake: &mut Stake, user_id: &str) -> Result<Applied> {
    ensure_party(stake, user_id)?;
    match stake.status() {
        StakeStatus::Settled
            if stake.settlement_confirmer() == Some(user_id) =>
        {
            Ok(Applied::AlreadyApplied)
        }
        StakeStatus::AwaitingConfirmation => {
            if stake.settlement_initiator() == Some(user_id) {
                return Err(Error::SelfConfirmation);
            }
            stake.record_confirmer(user_id);
            stake.set_status_unchecked(StakeStatus::Settled);
            Ok(Applied::Changed)
        }
        status => Err(illegal("confirmSettlement", status)),
    }
}

/// Fast path for off-app stakes: the owner settles unilaterally since the
/// manual counterparty cannot participate electronically.
pub fn settle_manual_stake(stake: &mut Stake, user_id: &str) -> Result<Applied> {
    if !stake.is_off_app_stake {
        return Err(Error::validation(
            "isOffAppStake",
            "only off-app stakes can be settled manually",
        ));
    }
    ensure_controller(stake, user_id)?;
    match stake.status() {
        StakeStatus::Settled => Ok(Applied::AlreadyApplied),
        StakeStatus::Active | StakeStatus::AwaitingSettlement => {
            if !stake.has_final_results() {
                return Err(Error::validation(
                    "totalPlayerBuyInForSession",
                    "session results must be entered before settlement",
                ));
            }
            stake.recompute_settlement();
            stake.set_status_unchecked(StakeStatus::Settled);
            Ok(Applied::Changed)
        }
        status => Err(illegal("settleManualStake", status)),
    }
}

/// Explicit cancellation, available to either party from any non-terminal
/// state.
pub fn cancel(stake: &mut Stake, user_id: &str) -> Result<Applied> {
    ensure_controller(stake, user_id)?;
    match stake.status() {
        StakeStatus::Cancelled => Ok(Applied::AlreadyApplied),
        status if status.is_terminal() => Err(illegal("cancel", status)),
        _ => {
            stake.set_status_unchecked(StakeStatus::Cancelled);
            stake.invite_pending = false;
            Ok(Applied::Changed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use railbird_common::{NewStake, OFF_APP_USER_ID};

    fn app_stake(invite: bool) -> Stake {
        Stake::new(
            "s1".into(),
            NewStake {
                session_id: "session-1".into(),
                session_game_name: "WSOP Event 42".into(),
                session_stakes: "$1k buy-in".into(),
                session_date: Utc::now(),
                is_tournament_session: true,
                staker_user_id: "alice".into(),
                staked_player_user_id: "bob".into(),
                stake_percentage: 0.5,
                markup: 1.2,
                is_off_app_stake: false,
                manual_staker_display_name: None,
                invite_pending: invite,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn manual_stake() -> Stake {
        Stake::new(
            "s2".into(),
            NewStake {
                session_id: "session-2".into(),
                session_game_name: "Daily Deepstack".into(),
                session_stakes: "$200 buy-in".into(),
                session_date: Utc::now(),
                is_tournament_session: true,
                staker_user_id: OFF_APP_USER_ID.into(),
                staked_player_user_id: "bob".into(),
                stake_percentage: 0.25,
                markup: 1.0,
                is_off_app_stake: true,
                manual_staker_display_name: Some("Uncle Ray".into()),
                invite_pending: false,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn ready_stake() -> Stake {
        let mut stake = app_stake(false);
        update_results(&mut stake, 1000.0, 3000.0).unwrap();
        mark_ready_for_settlement(&mut stake, "alice").unwrap();
        stake
    }

    #[test]
    fn test_invite_accept_and_decline() {
        let mut stake = app_stake(true);
        assert!(matches!(
            accept_invite(&mut stake, "alice"),
            Err(Error::Validation { .. })
        ));
        assert_eq!(accept_invite(&mut stake, "bob").unwrap(), Applied::Changed);
        assert_eq!(stake.status(), StakeStatus::Active);
        assert!(!stake.invite_pending);
        assert_eq!(
            accept_invite(&mut stake, "bob").unwrap(),
            Applied::AlreadyApplied
        );

        let mut declined = app_stake(true);
        assert_eq!(
            decline_invite(&mut declined, "bob").unwrap(),
            Applied::Changed
        );
        assert_eq!(declined.status(), StakeStatus::Declined);
        assert_eq!(
            decline_invite(&mut declined, "bob").unwrap(),
            Applied::AlreadyApplied
        );
        // A declined stake is terminal.
        assert!(accept_invite(&mut declined, "bob").is_err());
    }

    #[test]
    fn test_full_two_party_settlement() {
        let mut stake = app_stake(false);
        update_results(&mut stake, 1000.0, 3000.0).unwrap();
        assert_eq!(stake.settlement_amount(), 900.0);

        mark_ready_for_settlement(&mut stake, "bob").unwrap();
        assert_eq!(stake.status(), StakeStatus::AwaitingSettlement);

        initiate_settlement(&mut stake, "alice").unwrap();
        assert_eq!(stake.status(), StakeStatus::AwaitingConfirmation);
        assert_eq!(
            stake.settlement_initiator(),
            Some("alice")
        );

        confirm_settlement(&mut stake, "bob").unwrap();
        assert_eq!(stake.status(), StakeStatus::Settled);
        assert_eq!(stake.settlement_confirmer(), Some("bob"));
        assert_eq!(stake.settlement_amount(), 900.0);
    }

    #[test]
    fn test_cannot_settle_without_confirmation_phase() {
        // No sequence reaches settled from active without passing through
        // awaitingConfirmation (app-to-app) regardless of caller.
        let mut stake = app_stake(false);
        update_results(&mut stake, 1000.0, 3000.0).unwrap();
        assert!(confirm_settlement(&mut stake, "bob").is_err());
        assert!(initiate_settlement(&mut stake, "alice").is_err());
        assert!(settle_manual_stake(&mut stake, "alice").is_err());

        mark_ready_for_settlement(&mut stake, "alice").unwrap();
        assert!(confirm_settlement(&mut stake, "bob").is_err());
        assert_eq!(stake.status(), StakeStatus::AwaitingSettlement);
    }

    #[test]
    fn test_mark_ready_requires_results() {
        let mut stake = app_stake(false);
        let err = mark_ready_for_settlement(&mut stake, "alice").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(stake.status(), StakeStatus::Active);
    }

    #[test]
    fn test_self_confirmation_rejected() {
        let mut stake = ready_stake();
        initiate_settlement(&mut stake, "alice").unwrap();

        let err = confirm_settlement(&mut stake, "alice").unwrap_err();
        assert!(matches!(err, Error::SelfConfirmation));
        assert_eq!(stake.status(), StakeStatus::AwaitingConfirmation);
    }

    #[test]
    fn test_initiate_is_idempotent_for_same_party() {
        let mut stake = ready_stake();
        assert_eq!(
            initiate_settlement(&mut stake, "bob").unwrap(),
            Applied::Changed
        );
        let snapshot = stake.clone();
        assert_eq!(
            initiate_settlement(&mut stake, "bob").unwrap(),
            Applied::AlreadyApplied
        );
        assert_eq!(stake, snapshot);

        // The other party must confirm, not re-initiate.
        assert!(initiate_settlement(&mut stake, "alice").is_err());
    }

    #[test]
    fn test_confirm_retry_after_settlement_is_noop() {
        let mut stake = ready_stake();
        initiate_settlement(&mut stake, "alice").unwrap();
        confirm_settlement(&mut stake, "bob").unwrap();
        assert_eq!(
            confirm_settlement(&mut stake, "bob").unwrap(),
            Applied::AlreadyApplied
        );
        // The initiator still cannot claim the confirmation.
        assert!(confirm_settlement(&mut stake, "alice").is_err());
    }

    #[test]
    fn test_results_frozen_once_confirmation_pending() {
        let mut stake = ready_stake();
        // Corrections are fine up to and including awaitingSettlement.
        update_results(&mut stake, 1000.0, 2500.0).unwrap();
        assert_eq!(stake.settlement_amount(), 650.0);

        initiate_settlement(&mut stake, "alice").unwrap();
        let err = update_results(&mut stake, 1000.0, 9999.0).unwrap_err();
        assert!(matches!(err, Error::StaleResults));
        assert_eq!(stake.settlement_amount(), 650.0);

        confirm_settlement(&mut stake, "bob").unwrap();
        assert!(matches!(
            update_results(&mut stake, 1.0, 1.0),
            Err(Error::StaleResults)
        ));
    }

    #[test]
    fn test_manual_fast_path() {
        let mut stake = manual_stake();
        // Results required first.
        assert!(settle_manual_stake(&mut stake, "bob").is_err());
        update_results(&mut stake, 200.0, 800.0).unwrap();

        // The two-party protocol is closed to off-app stakes.
        assert!(initiate_settlement(&mut stake, "bob").is_err());

        // Settles straight from active once results are final.
        assert_eq!(
            settle_manual_stake(&mut stake, "bob").unwrap(),
            Applied::Changed
        );
        assert_eq!(stake.status(), StakeStatus::Settled);
        assert_eq!(stake.settlement_amount(), 150.0);
        assert_eq!(
            settle_manual_stake(&mut stake, "bob").unwrap(),
            Applied::AlreadyApplied
        );
    }

    #[test]
    fn test_manual_stake_rejects_non_owner() {
        let mut stake = manual_stake();
        update_results(&mut stake, 200.0, 0.0).unwrap();
        assert!(settle_manual_stake(&mut stake, "alice").is_err());
        assert!(mark_ready_for_settlement(&mut stake, "alice").is_err());
        mark_ready_for_settlement(&mut stake, "bob").unwrap();
        settle_manual_stake(&mut stake, "bob").unwrap();
        assert_eq!(stake.settlement_amount(), -50.0);
    }

    #[test]
    fn test_cancel_from_any_non_terminal_state() {
        let builders: [fn() -> Stake; 4] = [
            || app_stake(true),
            || app_stake(false),
            ready_stake,
            || {
                let mut s = ready_stake();
                initiate_settlement(&mut s, "alice").unwrap();
                s
            },
        ];
        for build in builders {
            let mut stake = build();
            assert_eq!(cancel(&mut stake, "alice").unwrap(), Applied::Changed);
            assert_eq!(stake.status(), StakeStatus::Cancelled);
            assert_eq!(
                cancel(&mut stake, "alice").unwrap(),
                Applied::AlreadyApplied
            );
        }

        let mut settled = ready_stake();
        initiate_settlement(&mut settled, "alice").unwrap();
        confirm_settlement(&mut settled, "bob").unwrap();
        assert!(matches!(
            cancel(&mut settled, "bob"),
            Err(Error::IllegalTransition { .. })
        ));
    }

    #[test]
    fn test_outsiders_rejected_everywhere() {
        let mut stake = ready_stake();
        assert!(mark_ready_for_settlement(&mut stake, "eve").is_err());
        assert!(initiate_settlement(&mut stake, "eve").is_err());
        assert!(cancel(&mut stake, "eve").is_err());
        initiate_settlement(&mut stake, "alice").unwrap();
        assert!(confirm_settlement(&mut stake, "eve").is_err());
    }
}
