//! Read-only query surface
//!
//! Responses are plain serde structs; `to_json` gives their stable text form.

use hard_incentive::{Claim, RewardsFilter, RewardsRequest};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsResponse {
    pub hard: hard_market::Params,
    pub incentive: hard_incentive::Params,
}

pub fn get_params(ctx: &AppContext) -> ParamsResponse {
    ParamsResponse {
        hard: ctx.hard.params().clone(),
        incentive: ctx.incentive.params().clone(),
    }
}

/// Claims matching `request`; an owner without claims yields an empty page
pub fn get_rewards(ctx: &AppContext, request: &RewardsRequest) -> AppResult<Vec<Claim>> {
    let filter = RewardsFilter::parse(
        request,
        &ctx.config().address_prefix,
        ctx.incentive.config().default_query_limit,
    )?;
    Ok(ctx.incentive.rewards(&filter))
}

pub fn to_json<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Encoding(e.to_string()))
}
