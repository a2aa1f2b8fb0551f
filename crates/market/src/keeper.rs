//! Money market keeper
//!
//! Owns the committed state and exposes every operation. Mutations go
//! through `transact`, reads through `preview` when pending interest must
//! be reflected without writing it.

use chrono::{DateTime, Utc};
use hard_core::{Address, Amount, Bank, Coin, Denom, PriceFeed};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::accrual::accrue;
use crate::aggregates::Aggregates;
use crate::config::MarketConfig;
use crate::error::{GenesisError, MarketError, MarketResult};
use crate::genesis::{GenesisAccumulationTime, GenesisState};
use crate::interest::InterestFactors;
use crate::ledger::{self, LedgerEnv};
use crate::params::Params;
use crate::positions::{Borrow, Deposit};
use crate::store::{self, preview, transact, MarketStore};

/// Interest accrual and position ledger for every money market
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardKeeper {
    config: MarketConfig,
    store: MarketStore,
}

impl HardKeeper {
    pub fn new(config: MarketConfig) -> Self {
        Self {
            config,
            store: MarketStore::default(),
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn store(&self) -> &MarketStore {
        &self.store
    }

    pub fn params(&self) -> &Params {
        self.store.params()
    }

    pub fn totals(&self) -> &Aggregates {
        self.store.totals()
    }

    pub fn factors(&self, denom: &Denom) -> Option<&InterestFactors> {
        self.store.factors(denom)
    }

    /// Replace the registry; existing factors and positions are kept.
    ///
    /// Interest up to `now` accrues under the outgoing rate models first.
    pub fn set_params(&mut self, params: Params, now: DateTime<Utc>) -> MarketResult<()> {
        let problems = params.problems();
        if !problems.is_empty() {
            warn!(count = problems.len(), "rejected parameter update");
            return Err(MarketError::InvalidParams(problems));
        }
        let count = params.money_markets.len();
        let config = &self.config;
        let denoms = self.registered_denoms();
        transact(&mut self.store, |tx| {
            for denom in &denoms {
                accrue(tx, config, denom, now)?;
            }
            tx.set_params(params);
            Ok(())
        })
        .inspect_err(|e| report(e, "set_params"))?;
        info!(money_markets = count, "params updated");
        Ok(())
    }

    /// Advance one collateral type's factors to `now`
    pub fn accrue(&mut self, denom: &Denom, now: DateTime<Utc>) -> MarketResult<InterestFactors> {
        let config = &self.config;
        transact(&mut self.store, |tx| accrue(tx, config, denom, now))
            .inspect_err(|e| report(e, "accrue"))
    }

    /// Accrue every registered money market in denom order
    pub fn accrue_all(&mut self, now: DateTime<Utc>) -> MarketResult<()> {
        let config = &self.config;
        let denoms = self.registered_denoms();
        transact(&mut self.store, |tx| {
            for denom in &denoms {
                accrue(tx, config, denom, now)?;
            }
            Ok(())
        })
        .inspect_err(|e| report(e, "accrue_all"))
    }

    fn registered_denoms(&self) -> Vec<Denom> {
        let mut denoms: Vec<Denom> = self
            .store
            .params()
            .money_markets
            .iter()
            .map(|mm| mm.denom.clone())
            .collect();
        denoms.sort();
        denoms
    }

    pub fn supply(
        &mut self,
        bank: &mut dyn Bank,
        owner: &Address,
        coin: &Coin,
        now: DateTime<Utc>,
    ) -> MarketResult<()> {
        let mut env = LedgerEnv {
            config: &self.config,
            bank,
            now,
        };
        transact(&mut self.store, |tx| ledger::supply(tx, &mut env, owner, coin))
            .inspect(|_| debug!(%owner, %coin, "supplied"))
            .inspect_err(|e| report(e, "supply"))
    }

    pub fn withdraw(
        &mut self,
        bank: &mut dyn Bank,
        prices: &dyn PriceFeed,
        owner: &Address,
        coin: &Coin,
        now: DateTime<Utc>,
    ) -> MarketResult<()> {
        let mut env = LedgerEnv {
            config: &self.config,
            bank,
            now,
        };
        transact(&mut self.store, |tx| {
            ledger::withdraw(tx, &mut env, prices, owner, coin)
        })
        .inspect(|_| debug!(%owner, %coin, "withdrawn"))
        .inspect_err(|e| report(e, "withdraw"))
    }

    pub fn borrow(
        &mut self,
        bank: &mut dyn Bank,
        prices: &dyn PriceFeed,
        owner: &Address,
        coin: &Coin,
        now: DateTime<Utc>,
    ) -> MarketResult<()> {
        let mut env = LedgerEnv {
            config: &self.config,
            bank,
            now,
        };
        transact(&mut self.store, |tx| {
            ledger::borrow(tx, &mut env, prices, owner, coin)
        })
        .inspect(|_| debug!(%owner, %coin, "borrowed"))
        .inspect_err(|e| report(e, "borrow"))
    }

    pub fn repay(
        &mut self,
        bank: &mut dyn Bank,
        owner: &Address,
        coin: &Coin,
        now: DateTime<Utc>,
    ) -> MarketResult<()> {
        let mut env = LedgerEnv {
            config: &self.config,
            bank,
            now,
        };
        transact(&mut self.store, |tx| ledger::repay(tx, &mut env, owner, coin))
            .inspect(|_| debug!(%owner, %coin, "repaid"))
            .inspect_err(|e| report(e, "repay"))
    }

    /// Live deposit balance including interest pending up to `now`
    pub fn deposit_balance(
        &self,
        owner: &Address,
        denom: &Denom,
        now: DateTime<Utc>,
    ) -> MarketResult<Amount> {
        preview(&self.store, |tx| {
            let factors = accrue(tx, &self.config, denom, now)?;
            match tx.deposit(owner, denom) {
                Some(deposit) => deposit.live_balance(factors.supply_interest_factor),
                None => Ok(Amount::ZERO),
            }
        })
    }

    /// Live debt including interest pending up to `now`
    pub fn borrow_balance(
        &self,
        owner: &Address,
        denom: &Denom,
        now: DateTime<Utc>,
    ) -> MarketResult<Amount> {
        preview(&self.store, |tx| {
            let factors = accrue(tx, &self.config, denom, now)?;
            match tx.borrow(owner) {
                Some(borrow) => borrow.live_balance(denom, factors.borrow_interest_factor),
                None => Ok(Amount::ZERO),
            }
        })
    }

    /// Every owner's live deposit of `denom` at `now`
    pub fn deposit_balances(
        &self,
        denom: &Denom,
        now: DateTime<Utc>,
    ) -> MarketResult<BTreeMap<Address, Amount>> {
        preview(&self.store, |tx| {
            let factor = accrue(tx, &self.config, denom, now)?.supply_interest_factor;
            let mut out = BTreeMap::new();
            for deposit in self.store.deposits().filter(|d| d.denom() == denom) {
                out.insert(deposit.depositor.clone(), deposit.live_balance(factor)?);
            }
            Ok(out)
        })
    }

    /// Every owner's live debt of `denom` at `now`
    pub fn borrow_balances(
        &self,
        denom: &Denom,
        now: DateTime<Utc>,
    ) -> MarketResult<BTreeMap<Address, Amount>> {
        preview(&self.store, |tx| {
            let factor = accrue(tx, &self.config, denom, now)?.borrow_interest_factor;
            let mut out = BTreeMap::new();
            for borrow in self.store.borrows() {
                let owed = borrow.live_balance(denom, factor)?;
                if !owed.is_zero() {
                    out.insert(borrow.borrower.clone(), owed);
                }
            }
            Ok(out)
        })
    }

    pub fn deposits(&self) -> impl Iterator<Item = &Deposit> {
        self.store.deposits()
    }

    pub fn borrows(&self) -> impl Iterator<Item = &Borrow> {
        self.store.borrows()
    }

    /// Snapshot the whole module.
    ///
    /// Markets never accrued get identity factors at `now`.
    pub fn export_genesis(&self, now: DateTime<Utc>) -> GenesisState {
        let previous_accumulation_times = self
            .store
            .params()
            .money_markets
            .iter()
            .map(|mm| {
                let factors = self
                    .store
                    .factors(&mm.denom)
                    .cloned()
                    .unwrap_or_else(|| InterestFactors::initial(now));
                GenesisAccumulationTime::from_factors(mm.denom.clone(), &factors)
            })
            .collect();

        let totals = self.store.totals().clone();
        let state = GenesisState {
            params: self.store.params().clone(),
            previous_accumulation_times,
            deposits: self.store.deposits().cloned().collect(),
            borrows: self.store.borrows().cloned().collect(),
            total_supplied: totals.total_supplied,
            total_borrowed: totals.total_borrowed,
            total_reserves: totals.total_reserves,
        };
        info!(
            deposits = state.deposits.len(),
            borrows = state.borrows.len(),
            "money market genesis exported"
        );
        state
    }

    /// Restore a keeper from a genesis bundle.
    ///
    /// The bundle is validated before anything is written; the custody and
    /// liquidator module accounts must exist in `bank`.
    pub fn init_genesis(
        config: MarketConfig,
        genesis: GenesisState,
        bank: &dyn Bank,
    ) -> Result<Self, GenesisError> {
        genesis.validate()?;
        let mut keeper = Self::new(config);
        keeper.write_genesis(genesis);

        for account in keeper.config.required_module_accounts() {
            if !bank.account_exists(account) {
                error!(account, "required module account missing");
                return Err(GenesisError::MissingModuleAccount(account.to_string()));
            }
        }
        info!(
            money_markets = keeper.params().money_markets.len(),
            "money market genesis imported"
        );
        Ok(keeper)
    }

    fn write_genesis(&mut self, genesis: GenesisState) {
        let mut next = MarketStore {
            params: genesis.params,
            totals: Aggregates {
                total_supplied: genesis.total_supplied,
                total_borrowed: genesis.total_borrowed,
                total_reserves: genesis.total_reserves,
            },
            ..MarketStore::default()
        };
        for gat in &genesis.previous_accumulation_times {
            next.factors.insert(gat.collateral_type.clone(), gat.factors());
        }
        for deposit in genesis.deposits {
            next.deposits
                .entry(deposit.depositor.clone())
                .or_default()
                .insert(deposit.denom().clone(), deposit);
        }
        for borrow in genesis.borrows {
            next.borrows.insert(borrow.borrower.clone(), borrow);
        }
        store::replace(&mut self.store, next);
    }
}

fn report(err: &MarketError, op: &'static str) {
    if err.is_fatal() {
        error!(op, error = %err, "invariant violated");
    } else {
        warn!(op, error = %err, "operation rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BorrowLimit, InterestRateModel, MoneyMarket};
    use chrono::{Duration, TimeZone};
    use hard_core::{AccountId, Coins, FixedPriceFeed, InMemoryBank};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn alice() -> Address {
        "kava1v9kxjcm9qqqqqqqqqqqqqqqqqqqqqqqqcl7xyk".parse().unwrap()
    }

    fn bob() -> Address {
        "kava1vfhkyqqqqqqqqqqqqqqqqqqqqqqqqqqq2v622y".parse().unwrap()
    }

    fn denom(s: &str) -> Denom {
        s.parse().unwrap()
    }

    fn coin(s: &str) -> Coin {
        s.parse().unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
    }

    fn market(d: &str, price_key: &str, max_borrow: u64) -> MoneyMarket {
        MoneyMarket::new(
            denom(d),
            BorrowLimit::new(true, dec!(0.5), dec!(0.6)),
            price_key,
            Amount::from_units(1),
            Amount::from_units(max_borrow),
            InterestRateModel::new(dec!(0.05), dec!(2), dec!(0.8), dec!(10)),
            dec!(0.05),
            dec!(0.02),
        )
    }

    struct Harness {
        keeper: HardKeeper,
        bank: InMemoryBank,
        prices: FixedPriceFeed,
    }

    fn harness() -> Harness {
        let mut keeper = HardKeeper::new(MarketConfig::default());
        keeper
            .set_params(
                Params::new(vec![
                    market("bnb", "bnb:usd", 0),
                    market("usdx", "usdx:usd", 300),
                ]),
                t0(),
            )
            .unwrap();

        let mut bank = InMemoryBank::new()
            .with_module("hard")
            .with_module("hard_liquidator");
        for owner in [alice(), bob()] {
            let mut funds = Coins::new();
            funds.add(&coin("1000bnb")).unwrap();
            funds.add(&coin("1000usdx")).unwrap();
            bank.fund(&AccountId::from(owner), &funds).unwrap();
        }

        let prices = FixedPriceFeed::new()
            .with_price("bnb:usd", dec!(10))
            .with_price("usdx:usd", dec!(1));

        Harness {
            keeper,
            bank,
            prices,
        }
    }

    #[test]
    fn test_first_supply_creates_deposit() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("100bnb"), t0())
            .unwrap();

        let deposit = h.keeper.store().deposit(&alice(), &denom("bnb")).unwrap();
        assert_eq!(deposit.amount, coin("100bnb"));
        assert_eq!(deposit.index, Decimal::ONE);
        assert_eq!(h.keeper.totals().supplied(&denom("bnb")), dec!(100));
        assert_eq!(
            h.bank.balance(&AccountId::module("hard"), &denom("bnb")),
            Amount::from_units(100)
        );
    }

    #[test]
    fn test_withdraw_all_deletes_deposit() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("100bnb"), t0())
            .unwrap();
        h.keeper
            .withdraw(&mut h.bank, &h.prices, &alice(), &coin("100bnb"), t0())
            .unwrap();

        assert!(h.keeper.store().deposit(&alice(), &denom("bnb")).is_none());
        assert_eq!(h.keeper.deposits().count(), 0);
    }

    #[test]
    fn test_over_withdrawal_rejected_without_effect() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("100bnb"), t0())
            .unwrap();
        let before = h.keeper.clone();
        let bank_before = h.bank.clone();

        let err = h
            .keeper
            .withdraw(&mut h.bank, &h.prices, &alice(), &coin("101bnb"), t0())
            .unwrap_err();
        assert!(matches!(err, MarketError::ExcessWithdrawal { .. }));
        assert_eq!(h.keeper, before);
        assert_eq!(h.bank, bank_before);

        let err = h
            .keeper
            .withdraw(&mut h.bank, &h.prices, &bob(), &coin("1bnb"), t0())
            .unwrap_err();
        assert!(matches!(err, MarketError::DepositNotFound { .. }));
    }

    #[test]
    fn test_borrow_limit_enforced() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &bob(), &coin("1000usdx"), t0())
            .unwrap();
        // 100 bnb at $10 with LTV 0.5 supports $500 of debt
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("100bnb"), t0())
            .unwrap();
        h.keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("250usdx"), t0())
            .unwrap();
        assert_eq!(h.keeper.totals().borrowed(&denom("usdx")), dec!(250));

        // $250 + 26 bnb * $10 = $510
        let before = h.keeper.clone();
        let err = h
            .keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("26bnb"), t0())
            .unwrap_err();
        assert!(matches!(err, MarketError::BorrowLimitExceeded { .. }));
        assert_eq!(h.keeper, before);

        // 40 bnb left would only support $200
        let err = h
            .keeper
            .withdraw(&mut h.bank, &h.prices, &alice(), &coin("60bnb"), t0())
            .unwrap_err();
        assert!(matches!(err, MarketError::BorrowLimitExceeded { .. }));

        h.keeper
            .withdraw(&mut h.bank, &h.prices, &alice(), &coin("50bnb"), t0())
            .unwrap();
    }

    #[test]
    fn test_max_borrow_limit() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &bob(), &coin("1000usdx"), t0())
            .unwrap();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("1000bnb"), t0())
            .unwrap();

        let err = h
            .keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("301usdx"), t0())
            .unwrap_err();
        assert!(matches!(err, MarketError::MaxBorrowLimitExceeded { .. }));
        assert!(h.keeper.borrows().next().is_none());
    }

    #[test]
    fn test_insufficient_liquidity() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("100bnb"), t0())
            .unwrap();
        let err = h
            .keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("10usdx"), t0())
            .unwrap_err();
        assert!(matches!(err, MarketError::InsufficientLiquidity { .. }));
    }

    #[test]
    fn test_repay_with_interest() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &bob(), &coin("1000bnb"), t0())
            .unwrap();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("1000usdx"), t0())
            .unwrap();
        h.keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("40bnb"), t0())
            .unwrap();

        // 4% utilization borrows at 13% a year
        let later = t0() + Duration::days(365);
        let owed = h
            .keeper
            .borrow_balance(&alice(), &denom("bnb"), later)
            .unwrap();
        assert_eq!(owed, Amount::from_units(45));

        let err = h
            .keeper
            .repay(
                &mut h.bank,
                &alice(),
                &Coin::new(denom("bnb"), owed.checked_add(&Amount::from_units(1)).unwrap()),
                later,
            )
            .unwrap_err();
        assert!(matches!(err, MarketError::ExcessRepayment { .. }));

        h.keeper
            .repay(&mut h.bank, &alice(), &Coin::new(denom("bnb"), owed), later)
            .unwrap();
        assert!(h.keeper.borrows().next().is_none());
        assert!(h.keeper.totals().borrowed(&denom("bnb")) >= Decimal::ZERO);

        let err = h
            .keeper
            .repay(&mut h.bank, &alice(), &coin("1bnb"), later)
            .unwrap_err();
        assert!(matches!(err, MarketError::BorrowNotFound(_)));
    }

    #[test]
    fn test_supply_conservation_across_accruals() {
        let mut h = harness();
        h.prices.set_price("bnb:usd", dec!(1));
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("600bnb"), t0())
            .unwrap();
        h.keeper
            .supply(&mut h.bank, &bob(), &coin("400bnb"), t0())
            .unwrap();
        h.keeper
            .supply(&mut h.bank, &bob(), &coin("1000usdx"), t0())
            .unwrap();
        h.keeper
            .borrow(&mut h.bank, &h.prices, &bob(), &coin("450bnb"), t0())
            .unwrap();

        let mut now = t0();
        for _ in 0..12 {
            now += Duration::days(30);
            h.keeper.accrue_all(now).unwrap();
        }

        let bnb = denom("bnb");
        let live: Decimal = h
            .keeper
            .deposit_balances(&bnb, now)
            .unwrap()
            .values()
            .map(|a| a.value())
            .sum();
        let total = h.keeper.totals().supplied(&bnb);
        assert!(total >= live);
        assert!(total - live < dec!(2), "rounding dust only: {total} vs {live}");

        let debt: Decimal = h
            .keeper
            .borrow_balances(&bnb, now)
            .unwrap()
            .values()
            .map(|a| a.value())
            .sum();
        let borrowed = h.keeper.totals().borrowed(&bnb);
        assert!(borrowed >= debt);
        assert!(borrowed - debt < dec!(1));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut h = harness();
        let mut bad = market("bnb", "bnb:usd", 0);
        bad.reserve_factor = dec!(2);
        let err = h.keeper.set_params(Params::new(vec![bad]), t0()).unwrap_err();
        assert!(matches!(err, MarketError::InvalidParams(_)));
        assert_eq!(h.keeper.params().money_markets.len(), 2);
    }

    #[test]
    fn test_params_update_accrues_under_old_model() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("1000bnb"), t0())
            .unwrap();
        h.keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("400bnb"), t0())
            .unwrap();

        let later = t0() + Duration::days(90);
        let mut untouched = h.keeper.clone();
        untouched.accrue_all(later).unwrap();

        let mut steeper = market("bnb", "bnb:usd", 0);
        steeper.interest_rate_model = InterestRateModel::new(dec!(1), dec!(5), dec!(0.8), dec!(20));
        h.keeper
            .set_params(
                Params::new(vec![steeper, market("usdx", "usdx:usd", 300)]),
                later,
            )
            .unwrap();

        let bnb = denom("bnb");
        assert_eq!(h.keeper.factors(&bnb), untouched.factors(&bnb));
        assert_eq!(h.keeper.totals(), untouched.totals());
        assert_eq!(
            h.keeper.params().money_market(&bnb).unwrap().interest_rate_model.base_rate,
            dec!(1)
        );
    }

    #[test]
    fn test_overflowing_rate_model_is_fatal_error() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("1000bnb"), t0())
            .unwrap();
        h.keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("400bnb"), t0())
            .unwrap();

        let huge = dec!(70000000000000000000000000000);
        let mut runaway = market("bnb", "bnb:usd", 0);
        runaway.interest_rate_model = InterestRateModel::new(huge, huge, dec!(0.8), dec!(10));
        h.keeper
            .set_params(
                Params::new(vec![runaway, market("usdx", "usdx:usd", 300)]),
                t0(),
            )
            .unwrap();
        let before = h.keeper.clone();

        let err = h.keeper.accrue_all(t0() + Duration::hours(1)).unwrap_err();
        assert_eq!(err, MarketError::ArithmeticOverflow("borrow rate"));
        assert!(err.is_fatal());
        assert_eq!(h.keeper, before);
    }

    #[test]
    fn test_interleaved_operations_conserve() {
        let mut h = harness();
        let bnb = denom("bnb");
        let one = coin("1bnb");
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("1000bnb"), t0())
            .unwrap();
        h.keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("400bnb"), t0())
            .unwrap();
        h.keeper
            .supply(&mut h.bank, &bob(), &coin("500bnb"), t0())
            .unwrap();

        // hourly interest stays below one unit, so every touch carries a fraction
        let mut now = t0();
        for _ in 0..300 {
            now += Duration::hours(1);
            h.keeper.supply(&mut h.bank, &alice(), &one, now).unwrap();
            h.keeper
                .borrow(&mut h.bank, &h.prices, &alice(), &one, now)
                .unwrap();
            h.keeper.repay(&mut h.bank, &alice(), &one, now).unwrap();
        }
        h.keeper.accrue_all(now).unwrap();

        // about 26% utilization for 300 hours on 400 bnb
        let owed = h.keeper.borrow_balance(&alice(), &bnb, now).unwrap();
        assert!(owed >= Amount::from_units(405), "interest realized: {owed}");

        let live: Decimal = h
            .keeper
            .deposit_balances(&bnb, now)
            .unwrap()
            .values()
            .map(|a| a.value())
            .sum();
        let supplied = h.keeper.totals().supplied(&bnb);
        assert!(supplied >= live, "{supplied} vs {live}");
        assert!(supplied - live < dec!(2), "{supplied} vs {live}");

        let debt: Decimal = h
            .keeper
            .borrow_balances(&bnb, now)
            .unwrap()
            .values()
            .map(|a| a.value())
            .sum();
        let borrowed = h.keeper.totals().borrowed(&bnb);
        assert!(borrowed >= debt, "{borrowed} vs {debt}");
        assert!(borrowed - debt < dec!(1), "{borrowed} vs {debt}");
    }

    #[test]
    fn test_closing_position_releases_dust() {
        let mut h = harness();
        let bnb = denom("bnb");
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("1000bnb"), t0())
            .unwrap();
        h.keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("400bnb"), t0())
            .unwrap();

        h.bank
            .fund(&AccountId::from(alice()), &Coins::from(coin("100bnb")))
            .unwrap();

        let later = t0() + Duration::days(30);
        let owed = h.keeper.borrow_balance(&alice(), &bnb, later).unwrap();
        h.keeper
            .repay(&mut h.bank, &alice(), &Coin::new(bnb.clone(), owed), later)
            .unwrap();
        assert!(h.keeper.borrows().next().is_none());
        assert_eq!(h.keeper.totals().borrowed(&bnb), Decimal::ZERO);

        let held = h.keeper.deposit_balance(&alice(), &bnb, later).unwrap();
        h.keeper
            .withdraw(&mut h.bank, &h.prices, &alice(), &Coin::new(bnb.clone(), held), later)
            .unwrap();
        assert_eq!(h.keeper.deposits().count(), 0);
        // only factor rounding remains
        let left = h.keeper.totals().supplied(&bnb);
        assert!(left >= Decimal::ZERO && left < dec!(0.000001), "{left}");
    }

    #[test]
    fn test_genesis_round_trip() {
        let mut h = harness();
        h.keeper
            .supply(&mut h.bank, &alice(), &coin("100bnb"), t0())
            .unwrap();
        h.keeper
            .supply(&mut h.bank, &bob(), &coin("500usdx"), t0())
            .unwrap();
        h.keeper
            .borrow(&mut h.bank, &h.prices, &alice(), &coin("50usdx"), t0())
            .unwrap();
        let now = t0() + Duration::days(10);
        h.keeper.accrue_all(now).unwrap();

        let exported = h.keeper.export_genesis(now);
        let restored =
            HardKeeper::init_genesis(MarketConfig::default(), exported.clone(), &h.bank).unwrap();
        assert_eq!(restored, h.keeper);
        assert_eq!(restored.export_genesis(now), exported);
    }

    #[test]
    fn test_empty_export_synthesizes_times() {
        let h = harness();
        let now = t0() + Duration::days(1);
        let exported = h.keeper.export_genesis(now);

        assert_eq!(exported.previous_accumulation_times.len(), 2);
        for gat in &exported.previous_accumulation_times {
            assert_eq!(gat.previous_accumulation_time, now);
            assert_eq!(gat.supply_interest_factor, Decimal::ONE);
            assert_eq!(gat.borrow_interest_factor, Decimal::ONE);
        }
        assert!(exported.deposits.is_empty());
        assert!(exported.total_supplied.is_empty());

        let restored =
            HardKeeper::init_genesis(MarketConfig::default(), exported.clone(), &h.bank).unwrap();
        assert_eq!(restored.export_genesis(now), exported);
    }

    #[test]
    fn test_missing_module_account_is_fatal() {
        let h = harness();
        let bank = InMemoryBank::new().with_module("hard");
        let err = HardKeeper::init_genesis(
            MarketConfig::default(),
            h.keeper.export_genesis(t0()),
            &bank,
        )
        .unwrap_err();
        assert_eq!(err, GenesisError::MissingModuleAccount("hard_liquidator".into()));
        assert!(err.is_fatal());
    }
}
