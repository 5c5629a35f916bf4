//! Weighted-sum arithmetic and validation shared by the registry, liquidity and swap engines
//!
//! All intermediate products are widened to `u128` and checked. Every division
//! truncates toward zero, which always rounds in the pool's favor: seeds and
//! minted shares are rounded down for the depositor, payouts and swap outputs are
//! rounded down for the recipient.

use crate::shared::errors::PoolError;
use crate::shared::types::Fee;

pub fn validate_weight(weight: u64) -> Result<(), PoolError> {
    if weight == 0 {
        return Err(PoolError::InvalidWeight);
    }
    Ok(())
}

/// Denominator must be nonzero and the fee may not exceed 100%
pub fn validate_fee(fee: Fee) -> Result<(), PoolError> {
    if fee.denominator == 0 {
        return Err(PoolError::DivisionByZero);
    }
    if fee.numerator > fee.denominator {
        return Err(PoolError::InvalidFee {
            numerator: fee.numerator,
            denominator: fee.denominator,
        });
    }
    Ok(())
}

fn to_u64(value: u128) -> Result<u64, PoolError> {
    u64::try_from(value).map_err(|_| PoolError::MathOverflow)
}

fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, PoolError> {
    if denominator == 0 {
        return Err(PoolError::DivisionByZero);
    }
    a.checked_mul(b)
        .ok_or(PoolError::MathOverflow)?
        .checked_div(denominator)
        .ok_or(PoolError::DivisionByZero)
}

/// `Σ balance_i × weight_i`
pub fn weighted_sum<I>(terms: I) -> Result<u128, PoolError>
where
    I: IntoIterator<Item = (u64, u64)>,
{
    terms.into_iter().try_fold(0u128, |acc, (balance, weight)| {
        (balance as u128)
            .checked_mul(weight as u128)
            .and_then(|term| acc.checked_add(term))
            .ok_or(PoolError::MathOverflow)
    })
}

/// Seed a newly registered member must bring so that its weighted reserve
/// matches the existing weighted sum: `floor(base / weight)`
pub fn seed_amount(base: u128, weight: u64) -> Result<u64, PoolError> {
    validate_weight(weight)?;
    to_u64(base / weight as u128)
}

/// Shares minted for a deposit worth `contributed` in weighted units.
///
/// The first liquidity event mints one share per weighted unit; later deposits
/// mint `floor(lp_supply × contributed / s_pre)`.
pub fn shares_for_deposit(lp_supply: u64, contributed: u128, s_pre: u128) -> Result<u64, PoolError> {
    if lp_supply == 0 {
        return to_u64(contributed);
    }
    to_u64(mul_div(lp_supply as u128, contributed, s_pre)?)
}

/// Reserve paid out of one vault for burning `burn_amount` of `lp_supply_pre` shares
pub fn payout(vault_balance: u64, burn_amount: u64, lp_supply_pre: u64) -> Result<u64, PoolError> {
    to_u64(mul_div(
        vault_balance as u128,
        burn_amount as u128,
        lp_supply_pre as u128,
    )?)
}

/// Split `amount_in` into `(fee, effective_in)`
pub fn apply_fee(amount_in: u64, fee: Fee) -> Result<(u64, u64), PoolError> {
    let fee_amount = to_u64(mul_div(
        amount_in as u128,
        fee.numerator as u128,
        fee.denominator as u128,
    )?)?;
    let effective_in = amount_in
        .checked_sub(fee_amount)
        .ok_or(PoolError::MathOverflow)?;
    Ok((fee_amount, effective_in))
}

/// Output of a swap: `floor(effective_in × weight_in / weight_out)`.
///
/// Weights price one unit of each member, so the weighted value entering the
/// pool (`effective_in × weight_in`) is at least the weighted value leaving it.
pub fn swap_output(effective_in: u64, weight_in: u64, weight_out: u64) -> Result<u64, PoolError> {
    validate_weight(weight_in)?;
    validate_weight(weight_out)?;
    to_u64(mul_div(
        effective_in as u128,
        weight_in as u128,
        weight_out as u128,
    )?)
}

/// `amount_out × weight_out ≤ effective_in × weight_in`
pub fn check_swap_invariant(
    effective_in: u64,
    weight_in: u64,
    amount_out: u64,
    weight_out: u64,
) -> Result<(), PoolError> {
    let delta_in = (effective_in as u128)
        .checked_mul(weight_in as u128)
        .ok_or(PoolError::MathOverflow)?;
    let delta_out = (amount_out as u128)
        .checked_mul(weight_out as u128)
        .ok_or(PoolError::MathOverflow)?;
    if delta_out > delta_in {
        return Err(PoolError::InvariantViolation);
    }
    Ok(())
}

/// Whether `amounts` keeps every reserve ratio unchanged.
///
/// Ratios are compared by cross-multiplication against the first funded vault.
/// Members with an empty vault must receive nothing. With no funded vault at all
/// any deposit is proportional.
pub fn is_proportional(amounts: &[u64], balances: &[u64]) -> bool {
    let Some(anchor) = balances.iter().position(|b| *b > 0) else {
        return true;
    };
    let anchor_amount = amounts[anchor] as u128;
    let anchor_balance = balances[anchor] as u128;

    amounts.iter().zip(balances).all(|(amount, balance)| {
        if *balance == 0 {
            return *amount == 0;
        }
        (*amount as u128) * anchor_balance == anchor_amount * (*balance as u128)
    })
}
