//! Pure settlement math
//!
//! Derives the signed transfer amount and per-role cost figures from a stake's
//! terms and session results. Positive means the staked player owes the staker,
//! negative means the staker owes the staked player. The calculator never
//! fails: degenerate input (an unplayed session) simply yields zeros, and
//! readiness must be judged via `Stake::has_final_results`, not the numbers.

use {crate::types::stake::Stake, serde::{Deserialize, Serialize}};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementBreakdown {
    /// Reimbursement owed to the staker, grossed up by markup.
    pub staker_cost: f64,
    /// The staker's proportional claim on winnings.
    pub staker_share_of_cashout: f64,
    /// `staker_share_of_cashout - staker_cost`, signed per the convention above.
    pub amount_transferred: f64,
    /// The share of the buy-in the player funded themselves.
    pub player_cost: f64,
}

impl SettlementBreakdown {
    pub fn compute(buy_in: f64, cashout: f64, stake_percentage: f64, markup: f64) -> Self {
        let staker_cost = buy_in * stake_percentage * markup;
        let staker_share_of_cashout = cashout * stake_percentage;
        SettlementBreakdown {
            staker_cost,
            staker_share_of_cashout,
            amount_transferred: staker_share_of_cashout - staker_cost,
            player_cost: buy_in * (1.0 - stake_percentage),
        }
    }

    pub fn for_stake(stake: &Stake) -> Self {
        Self::compute(
            stake.buy_in(),
            stake.cashout(),
            stake.stake_percentage,
            stake.markup,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_owes_staker_on_a_win() {
        let b = SettlementBreakdown::compute(1000.0, 3000.0, 0.5, 1.2);
        assert_eq!(b.staker_cost, 600.0);
        assert_eq!(b.staker_share_of_cashout, 1500.0);
        assert_eq!(b.amount_transferred, 900.0);
        assert_eq!(b.player_cost, 500.0);
    }

    #[test]
    fn test_staker_owes_player_on_a_bust() {
        let b = SettlementBreakdown::compute(1000.0, 0.0, 0.5, 1.2);
        assert_eq!(b.amount_transferred, -600.0);
    }

    #[test]
    fn test_even_settlement_at_markup_breakeven() {
        // At 1.0 markup a cashout equal to the buy-in settles even.
        let b = SettlementBreakdown::compute(500.0, 500.0, 0.25, 1.0);
        assert_eq!(b.amount_transferred, 0.0);
    }

    #[test]
    fn test_unplayed_session_yields_zeros() {
        let b = SettlementBreakdown::compute(0.0, 0.0, 0.5, 1.2);
        assert_eq!(b.staker_cost, 0.0);
        assert_eq!(b.staker_share_of_cashout, 0.0);
        assert_eq!(b.amount_transferred, 0.0);
        assert_eq!(b.player_cost, 0.0);
    }
}
