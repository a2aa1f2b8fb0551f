//! Application context - wires the money market and incentive keepers
//! to a bank and a price feed

use chrono::{DateTime, Utc};
use hard_core::{AccountId, Address, Amount, Bank, Coin, Coins, Denom, FixedPriceFeed, InMemoryBank};
use hard_incentive::{IncentiveKeeper, RewardType};
use hard_market::HardKeeper;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::genesis::AppGenesis;

/// Host state: both keepers plus their collaborators
#[derive(Debug, Clone)]
pub struct AppContext {
    config: AppConfig,
    genesis_time: DateTime<Utc>,
    pub hard: HardKeeper,
    pub incentive: IncentiveKeeper,
    pub bank: InMemoryBank,
    pub prices: FixedPriceFeed,
}

/// A bank with every module account `config` names already registered
pub fn module_bank(config: &AppConfig) -> InMemoryBank {
    let mut bank = InMemoryBank::new();
    for account in config.module_accounts() {
        bank.register_module(account);
    }
    bank
}

impl AppContext {
    /// Validate the whole bundle, then hand each half to its keeper.
    ///
    /// Nothing is built unless both halves are valid; the module accounts
    /// are checked against `bank` afterwards.
    pub fn import_genesis(
        config: AppConfig,
        genesis: AppGenesis,
        bank: InMemoryBank,
        prices: FixedPriceFeed,
    ) -> AppResult<Self> {
        genesis.validate()?;

        let hard = HardKeeper::init_genesis(config.market.clone(), genesis.hard, &bank)
            .inspect_err(|e| error!(error = %e, "money market genesis rejected"))?;
        let incentive =
            IncentiveKeeper::init_genesis(config.incentive.clone(), genesis.incentive, &bank)
                .inspect_err(|e| error!(error = %e, "incentive genesis rejected"))?;

        info!(genesis_time = %genesis.genesis_time, "application genesis imported");
        Ok(Self {
            config,
            genesis_time: genesis.genesis_time,
            hard,
            incentive,
            bank,
            prices,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn genesis_time(&self) -> DateTime<Utc> {
        self.genesis_time
    }

    /// Once-per-block driver: accrue interest, then rewards.
    ///
    /// Both steps run on copies; neither keeper changes unless both succeed.
    pub fn begin_block(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        let mut hard = self.hard.clone();
        let mut incentive = self.incentive.clone();
        hard.accrue_all(now)?;
        incentive
            .accumulate(&hard, now)
            .inspect_err(|e| error!(%now, error = %e, "reward accumulation failed"))?;

        self.hard = hard;
        self.incentive = incentive;
        debug!(%now, "block started");
        Ok(())
    }

    pub fn export_genesis(&self, now: DateTime<Utc>) -> AppGenesis {
        AppGenesis {
            genesis_time: self.genesis_time,
            hard: self.hard.export_genesis(now),
            incentive: self.incentive.export_genesis(),
        }
    }

    /// Hex SHA-256 of the canonical JSON export at `now`
    pub fn state_hash(&self, now: DateTime<Utc>) -> AppResult<String> {
        let bytes = canonical_json(&self.export_genesis(now))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn supply(&mut self, owner: &Address, coin: &Coin, now: DateTime<Utc>) -> AppResult<()> {
        Ok(self.hard.supply(&mut self.bank, owner, coin, now)?)
    }

    pub fn withdraw(&mut self, owner: &Address, coin: &Coin, now: DateTime<Utc>) -> AppResult<()> {
        Ok(self
            .hard
            .withdraw(&mut self.bank, &self.prices, owner, coin, now)?)
    }

    pub fn borrow(&mut self, owner: &Address, coin: &Coin, now: DateTime<Utc>) -> AppResult<()> {
        Ok(self
            .hard
            .borrow(&mut self.bank, &self.prices, owner, coin, now)?)
    }

    pub fn repay(&mut self, owner: &Address, coin: &Coin, now: DateTime<Utc>) -> AppResult<()> {
        Ok(self.hard.repay(&mut self.bank, owner, coin, now)?)
    }

    pub fn claim_rewards(&mut self, owner: &Address, reward_type: RewardType) -> AppResult<Coins> {
        Ok(self
            .incentive
            .claim_rewards(&mut self.bank, owner, reward_type)?)
    }

    /// Collateral currently held by the custody account
    pub fn custody_balance(&self, denom: &Denom) -> Amount {
        self.bank.balance(
            &AccountId::module(self.config.market.custody_account.as_str()),
            denom,
        )
    }
}

/// Serialize into the byte form used for hashing
pub fn canonical_json(genesis: &AppGenesis) -> AppResult<Vec<u8>> {
    serde_json::to_vec(genesis).map_err(|e| AppError::Encoding(e.to_string()))
}
