//! Incentive keeper
//!
//! Owns reward params, claims and accumulation times. Accumulation is
//! staged on a copy of the ledger and committed only if every period
//! succeeded.

use chrono::{DateTime, Utc};
use hard_core::{AccountId, Address, Bank, Coins, DecCoins, Denom};
use tracing::{debug, info, warn};

use crate::accumulator::{accumulate, Ledger, PositionSource};
use crate::claim::{deduct, payable, Claim, ClaimKey};
use crate::config::IncentiveConfig;
use crate::error::{IncentiveError, IncentiveGenesisError, IncentiveResult};
use crate::genesis::{GenesisRewardAccumulationTime, GenesisState};
use crate::params::Params;
use crate::query::RewardsFilter;
use crate::reward::RewardType;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncentiveKeeper {
    config: IncentiveConfig,
    params: Params,
    ledger: Ledger,
}

impl IncentiveKeeper {
    pub fn new(config: IncentiveConfig) -> Self {
        Self {
            config,
            params: Params::default(),
            ledger: Ledger::default(),
        }
    }

    pub fn config(&self) -> &IncentiveConfig {
        &self.config
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_params(&mut self, params: Params) -> IncentiveResult<()> {
        let problems = params.problems();
        if !problems.is_empty() {
            warn!(count = problems.len(), "rejected incentive parameter update");
            return Err(IncentiveError::InvalidParams(problems));
        }
        self.params = params;
        Ok(())
    }

    /// Accumulate rewards for every period up to `now`
    pub fn accumulate(
        &mut self,
        positions: &dyn PositionSource,
        now: DateTime<Utc>,
    ) -> IncentiveResult<()> {
        let mut staged = self.ledger.clone();
        accumulate(&mut staged, &self.params, positions, now)?;
        self.ledger = staged;
        Ok(())
    }

    /// Pending reward of one claim
    pub fn claim(
        &self,
        owner: &Address,
        collateral_type: &Denom,
        reward_type: RewardType,
    ) -> Option<Claim> {
        let key: ClaimKey = (owner.clone(), collateral_type.clone(), reward_type);
        self.ledger
            .claims
            .get(&key)
            .map(|reward| Claim::from_entry(&key, reward))
    }

    /// Pay out every claim of `owner` under `reward_type`.
    ///
    /// Sends the whole-unit total from the payout account and deducts it
    /// from the claims in key order. Fractions below one unit stay claimed.
    /// Fails with `NothingToClaim` when the payout is zero.
    pub fn claim_rewards(
        &mut self,
        bank: &mut dyn Bank,
        owner: &Address,
        reward_type: RewardType,
    ) -> IncentiveResult<Coins> {
        let keys: Vec<ClaimKey> = self
            .ledger
            .claims
            .keys()
            .filter(|(o, _, t)| o == owner && *t == reward_type)
            .cloned()
            .collect();

        let mut total = DecCoins::new();
        for key in &keys {
            if let Some(reward) = self.ledger.claims.get(key) {
                for (denom, amount) in reward.iter() {
                    total
                        .adjust(denom, amount)
                        .map_err(|_| IncentiveError::ArithmeticOverflow("claim total"))?;
                }
            }
        }

        let payout = payable(&total)?;
        if payout.is_empty() {
            warn!(%owner, %reward_type, "nothing to claim");
            return Err(IncentiveError::NothingToClaim {
                owner: owner.to_string(),
                reward_type,
            });
        }

        bank.send(
            &AccountId::module(self.config.payout_account.as_str()),
            &AccountId::from(owner),
            &payout,
        )?;
        let mut owed = DecCoins::from(&payout);
        for key in &keys {
            let Some(reward) = self.ledger.claims.get_mut(key) else {
                continue;
            };
            deduct(reward, &mut owed)?;
            if reward.is_empty() {
                self.ledger.claims.remove(key);
            }
        }
        debug!(%owner, %reward_type, %payout, "rewards claimed");
        Ok(payout)
    }

    /// Claims matching `filter`, ordered by (owner, collateral type, reward type)
    pub fn rewards(&self, filter: &RewardsFilter) -> Vec<Claim> {
        let matching = self
            .ledger
            .claims
            .iter()
            .map(|(key, reward)| Claim::from_entry(key, reward))
            .filter(|claim| filter.matches(claim));
        filter.page_of(matching)
    }

    pub fn claims(&self) -> impl Iterator<Item = Claim> + '_ {
        self.ledger
            .claims
            .iter()
            .map(|(key, reward)| Claim::from_entry(key, reward))
    }

    pub fn export_genesis(&self) -> GenesisState {
        GenesisState {
            params: self.params.clone(),
            previous_accumulation_times: self
                .ledger
                .accumulation_times
                .iter()
                .map(|((reward_type, collateral_type), time)| GenesisRewardAccumulationTime {
                    reward_type: *reward_type,
                    collateral_type: collateral_type.clone(),
                    previous_accumulation_time: *time,
                })
                .collect(),
            claims: self.claims().collect(),
        }
    }

    /// Restore from a genesis bundle; the payout account must exist
    pub fn init_genesis(
        config: IncentiveConfig,
        genesis: GenesisState,
        bank: &dyn Bank,
    ) -> Result<Self, IncentiveGenesisError> {
        genesis.validate()?;

        let mut ledger = Ledger::default();
        for t in genesis.previous_accumulation_times {
            ledger
                .accumulation_times
                .insert((t.reward_type, t.collateral_type), t.previous_accumulation_time);
        }
        for claim in genesis.claims {
            ledger.claims.insert(claim.key(), claim.reward);
        }

        let keeper = Self {
            config,
            params: genesis.params,
            ledger,
        };
        if !bank.account_exists(&keeper.config.payout_account) {
            return Err(IncentiveGenesisError::MissingModuleAccount(
                keeper.config.payout_account.clone(),
            ));
        }
        info!(
            claims = keeper.ledger.claims.len(),
            reward_periods = keeper.params.reward_periods.len(),
            "incentive genesis imported"
        );
        Ok(keeper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::tests::{alice, bnb, bob, t0, StaticPositions};
    use crate::params::RewardPeriod;
    use crate::query::RewardsRequest;
    use chrono::Duration;
    use hard_core::{Amount, Coin, InMemoryBank};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn keeper() -> IncentiveKeeper {
        let mut keeper = IncentiveKeeper::new(IncentiveConfig::default());
        keeper
            .set_params(Params::new(vec![RewardPeriod::new(
                RewardType::Hard,
                bnb(),
                t0(),
                t0() + Duration::days(365),
                "3hard".parse().unwrap(),
            )]))
            .unwrap();
        keeper
    }

    fn positions() -> StaticPositions {
        let mut p = StaticPositions::default();
        p.deposits.insert(
            bnb(),
            BTreeMap::from([
                (alice(), Amount::from_units(2)),
                (bob(), Amount::from_units(1)),
            ]),
        );
        p
    }

    fn bank() -> InMemoryBank {
        let mut bank = InMemoryBank::new().with_module("incentive");
        let funds = Coins::from("1000000hard".parse::<Coin>().unwrap());
        bank.mint_to_escrow("incentive", &funds).unwrap();
        bank
    }

    fn filter(owner: Option<&Address>, page: u64, limit: u64) -> RewardsFilter {
        RewardsFilter::parse(
            &RewardsRequest {
                owner: owner.map(|a| a.to_string()),
                reward_type: None,
                page,
                limit,
            },
            "kava",
            100,
        )
        .unwrap()
    }

    #[test]
    fn test_claim_pays_and_clears() {
        let mut keeper = keeper();
        keeper.accumulate(&positions(), t0()).unwrap();
        keeper
            .accumulate(&positions(), t0() + Duration::seconds(10))
            .unwrap();

        // 30 hard split 2:1
        let mut bank = bank();
        let paid = keeper
            .claim_rewards(&mut bank, &alice(), RewardType::Hard)
            .unwrap();
        let hard: Denom = "hard".parse().unwrap();
        assert_eq!(paid.amount_of(&hard), Amount::from_units(20));
        assert_eq!(
            bank.balance(&AccountId::from(alice()), &hard),
            Amount::from_units(20)
        );
        assert!(keeper.claim(&alice(), &bnb(), RewardType::Hard).is_none());

        let err = keeper
            .claim_rewards(&mut bank, &alice(), RewardType::Hard)
            .unwrap_err();
        assert!(matches!(err, IncentiveError::NothingToClaim { .. }));
    }

    #[test]
    fn test_claim_keeps_fractional_remainder() {
        let carol: Address = "kava1vdshymmvqqqqqqqqqqqqqqqqqqqqqqqqs0mtf5".parse().unwrap();
        let mut even = StaticPositions::default();
        even.deposits.insert(
            bnb(),
            BTreeMap::from([
                (alice(), Amount::from_units(1)),
                (bob(), Amount::from_units(1)),
                (carol, Amount::from_units(1)),
            ]),
        );
        let hard: Denom = "hard".parse().unwrap();
        let mut keeper = keeper();
        let mut bank = bank();

        // 3 hard over three equal owners: 1 each
        keeper.accumulate(&even, t0()).unwrap();
        keeper.accumulate(&even, t0() + Duration::seconds(1)).unwrap();
        let paid = keeper
            .claim_rewards(&mut bank, &alice(), RewardType::Hard)
            .unwrap();
        assert_eq!(paid.amount_of(&hard), Amount::from_units(1));
        assert!(keeper.claim(&alice(), &bnb(), RewardType::Hard).is_none());

        // a 10 hard split three ways leaves a third behind
        keeper
            .set_params(Params::new(vec![RewardPeriod::new(
                RewardType::Hard,
                bnb(),
                t0(),
                t0() + Duration::days(365),
                "10hard".parse().unwrap(),
            )]))
            .unwrap();
        keeper.accumulate(&even, t0() + Duration::seconds(2)).unwrap();
        let paid = keeper
            .claim_rewards(&mut bank, &alice(), RewardType::Hard)
            .unwrap();
        assert_eq!(paid.amount_of(&hard), Amount::from_units(3));
        let left = keeper
            .claim(&alice(), &bnb(), RewardType::Hard)
            .unwrap()
            .reward
            .amount_of(&hard);
        assert!(left > dec!(0.33) && left < dec!(0.34), "{left}");

        keeper.accumulate(&even, t0() + Duration::seconds(3)).unwrap();
        let paid = keeper
            .claim_rewards(&mut bank, &alice(), RewardType::Hard)
            .unwrap();
        assert_eq!(paid.amount_of(&hard), Amount::from_units(3));
        let left = keeper
            .claim(&alice(), &bnb(), RewardType::Hard)
            .unwrap()
            .reward
            .amount_of(&hard);
        assert!(left > dec!(0.66) && left < dec!(0.67), "{left}");
    }

    #[test]
    fn test_failed_payout_keeps_claims() {
        let mut keeper = keeper();
        keeper.accumulate(&positions(), t0()).unwrap();
        keeper
            .accumulate(&positions(), t0() + Duration::seconds(10))
            .unwrap();

        let mut empty = InMemoryBank::new().with_module("incentive");
        assert!(keeper
            .claim_rewards(&mut empty, &bob(), RewardType::Hard)
            .is_err());
        assert!(keeper.claim(&bob(), &bnb(), RewardType::Hard).is_some());
    }

    #[test]
    fn test_rewards_query_pagination() {
        let mut keeper = keeper();
        keeper.accumulate(&positions(), t0()).unwrap();
        keeper
            .accumulate(&positions(), t0() + Duration::seconds(1))
            .unwrap();

        assert_eq!(keeper.rewards(&filter(None, 1, 0)).len(), 2);
        let first = keeper.rewards(&filter(None, 1, 1));
        let second = keeper.rewards(&filter(None, 2, 1));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert!(first[0].owner < second[0].owner);
        assert!(keeper.rewards(&filter(None, 3, 1)).is_empty());
        assert!(keeper.rewards(&filter(None, 0, 1)).is_empty());

        assert_eq!(keeper.rewards(&filter(Some(&bob()), 1, 10)).len(), 1);
    }

    #[test]
    fn test_owner_without_claims_gets_empty_page() {
        let keeper = keeper();
        let carol: Address = "kava1vdshymmvqqqqqqqqqqqqqqqqqqqqqqqqs0mtf5".parse().unwrap();
        assert!(keeper.rewards(&filter(Some(&carol), 1, 10)).is_empty());
    }

    #[test]
    fn test_genesis_round_trip() {
        let mut keeper = keeper();
        keeper.accumulate(&positions(), t0()).unwrap();
        keeper
            .accumulate(&positions(), t0() + Duration::seconds(7))
            .unwrap();

        let exported = keeper.export_genesis();
        let restored =
            IncentiveKeeper::init_genesis(IncentiveConfig::default(), exported.clone(), &bank())
                .unwrap();
        assert_eq!(restored, keeper);
        assert_eq!(restored.export_genesis(), exported);

        let err = IncentiveKeeper::init_genesis(
            IncentiveConfig::default(),
            exported,
            &InMemoryBank::new(),
        )
        .unwrap_err();
        assert!(err.is_fatal());
    }
}
