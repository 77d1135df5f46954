#![no_std]

//! Fixed-point helpers shared by the UP contracts.
//!
//! All ratios use truncating integer division (round toward zero) so that
//! results are bit-reproducible; callers must tolerate sub-unit rounding
//! loss on round trips. Wide intermediates go through the host `U256`.

use soroban_sdk::{Env, U256};

/// 18-decimal fixed-point unit.
pub const SCALE: i128 = 1_000_000_000_000_000_000;

/// Constant-product swap fee: 0.3% (997/1000).
pub const FEE_NUM: i128 = 997;
pub const FEE_DEN: i128 = 1000;

fn to_u256(env: &Env, n: i128) -> U256 {
    assert!(n >= 0, "negative amount");
    U256::from_u128(env, n as u128)
}

fn to_i128_saturating(n: &U256) -> i128 {
    match n.to_u128() {
        Some(v) if v <= i128::MAX as u128 => v as i128,
        _ => i128::MAX,
    }
}

/// Full-precision a * b / denom, truncating toward zero.
/// Saturates at i128::MAX if the quotient does not fit.
pub fn mul_div(env: &Env, a: i128, b: i128, denom: i128) -> i128 {
    assert!(denom > 0, "division by zero");
    let product = to_u256(env, a).mul(&to_u256(env, b));
    to_i128_saturating(&product.div(&to_u256(env, denom)))
}

/// Integer square root via Newton's method.
pub fn isqrt(n: i128) -> i128 {
    if n <= 0 {
        return 0;
    }
    if n == 1 {
        return 1;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Integer square root over the host U256.
pub fn sqrt_u256(env: &Env, n: &U256) -> U256 {
    let zero = U256::from_u32(env, 0);
    let one = U256::from_u32(env, 1);
    let two = U256::from_u32(env, 2);
    if *n == zero || *n == one {
        return n.clone();
    }
    let mut x = n.clone();
    let mut y = x.add(&one).div(&two);
    while y < x {
        x = y;
        y = x.add(&n.div(&x)).div(&two);
    }
    x
}

/// Fee-aware constant-product output quote.
pub fn get_amount_out(env: &Env, amount_in: i128, reserve_in: i128, reserve_out: i128) -> i128 {
    assert!(amount_in > 0, "zero input");
    assert!(reserve_in > 0 && reserve_out > 0, "empty reserves");
    let amount_in_with_fee = to_u256(env, amount_in).mul(&to_u256(env, FEE_NUM));
    let numerator = to_u256(env, reserve_out).mul(&amount_in_with_fee);
    let denominator = to_u256(env, reserve_in)
        .mul(&to_u256(env, FEE_DEN))
        .add(&amount_in_with_fee);
    to_i128_saturating(&numerator.div(&denominator))
}

/// Direction and input size of the trade that moves a constant-product
/// pool's price onto `virtual_price` (native per synthetic, SCALE-based).
///
/// Returns `(sell_synth, amount_in)`:
/// - `(true, n)`  — sell `n` synthetic into the pool (pool overprices it),
/// - `(false, n)` — sell `n` native into the pool (pool underprices it),
/// - `(false, 0)` — already aligned within fee rounding, or degenerate
///   inputs (empty reserves, undefined price).
///
/// Derivation: at the target the input-side reserve is
/// `sqrt(k * num / den)`; adjusting both sides for the 0.3% fee gives
/// `left = sqrt(k * 1000 * num / (den * 997))` against
/// `right = reserve_side * 1000 / 997`, with `amount_in = left - right`.
pub fn compute_align_trade(
    env: &Env,
    reserve_synth: i128,
    reserve_native: i128,
    virtual_price: i128,
) -> (bool, i128) {
    if reserve_synth <= 0 || reserve_native <= 0 || virtual_price <= 0 {
        return (false, 0);
    }

    let pool_price = mul_div(env, reserve_native, SCALE, reserve_synth);
    let sell_synth = pool_price > virtual_price;

    let (num, den, side) = if sell_synth {
        (SCALE, virtual_price, reserve_synth)
    } else {
        (virtual_price, SCALE, reserve_native)
    };

    let k = to_u256(env, reserve_synth).mul(&to_u256(env, reserve_native));
    let left_sq = k
        .mul(&to_u256(env, FEE_DEN))
        .mul(&to_u256(env, num))
        .div(&to_u256(env, den).mul(&to_u256(env, FEE_NUM)));
    let left = to_i128_saturating(&sqrt_u256(env, &left_sq));
    let right = mul_div(env, side, FEE_DEN, FEE_NUM);

    if left <= right {
        return (false, 0);
    }
    (sell_synth, left - right)
}
