#![no_std]

//! Allocation rebalancer for the UP controller's backing.
//!
//! Periodically redistributes the controller's total backing across three
//! buckets: a liquidity-pool position, the redeemable reserve left on the
//! controller, and an optional yield strategy. The LP and strategy legs are
//! funded through the controller's borrow primitives and settled back
//! through `repay`, so the controller's debt counters always describe
//! exactly what this contract has taken out.

use soroban_sdk::{
    auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation},
    contract, contracterror, contractimpl, contracttype, symbol_short, token::TokenClient,
    Address, Env, IntoVal, Symbol, TryFromVal, Val, Vec,
};
use stellar_access::access_control::{self as access_control, AccessControl};
use swap_math::{compute_align_trade, mul_div, SCALE};

// TTL constants: extend instance storage proactively to prevent archival
const TTL_THRESHOLD: u32 = 17_280; // ~1 day at 5s/ledger
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

/// May trigger `rebalance`.
pub const REBALANCE_ROLE: Symbol = symbol_short!("rebalance");

/// Reward history capacity; oldest entries are overwritten beyond this.
const MAX_REWARDS: u32 = 10;

// ─── Storage Keys ────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    Controller,
    UpToken,
    NativeToken,
    Pool,
    Router,
    Strategy,
    AllocationLp,
    AllocationRedeem,
    SlippageTolerance,
    Rewards,
    RewardCursor,
    Initialized,
    ReentrancyLock,
}

// ─── Errors ──────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RebalancerError {
    OnlyAdmin = 1,
    OnlyRebalancer = 2,
    AlreadyRebalanced = 3,
    SlippageToleranceGt100 = 4,
    AllocationGt100 = 5,
    NoBacking = 6,
    ReentrancyLocked = 7,
}

// ─── Types ───────────────────────────────────────────────────────

/// One strategy accrual snapshot, recorded after each successful rebalance.
#[contracttype]
#[derive(Clone, Debug)]
pub struct Reward {
    pub deposited_amount: i128,
    pub rewards_amount: i128,
    pub timestamp: u64,
}

/// Shape of the strategy's `check_rewards` return value.
#[contracttype]
#[derive(Clone, Debug)]
pub struct StrategyInfo {
    pub deposited_amount: i128,
    pub rewards_amount: i128,
}

// ─── Contract ────────────────────────────────────────────────────

#[contract]
pub struct Rebalancer;

// ─── Helpers ─────────────────────────────────────────────────────

fn require_admin(env: &Env, caller: &Address) -> Result<(), RebalancerError> {
    caller.require_auth();
    if access_control::get_admin(env) != Some(caller.clone()) {
        return Err(RebalancerError::OnlyAdmin);
    }
    Ok(())
}

fn get_address(env: &Env, key: DataKey) -> Address {
    env.storage().instance().get(&key).expect("address not set")
}

fn strategy(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::Strategy)
}

fn native_client(env: &Env) -> TokenClient<'_> {
    let native = get_address(env, DataKey::NativeToken);
    TokenClient::new(env, &native)
}

fn up_client(env: &Env) -> TokenClient<'_> {
    let up = get_address(env, DataKey::UpToken);
    TokenClient::new(env, &up)
}

fn allocation_lp(env: &Env) -> u32 {
    env.storage().instance().get(&DataKey::AllocationLp).unwrap_or(0)
}

fn allocation_redeem(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::AllocationRedeem)
        .unwrap_or(0)
}

fn slippage_tolerance(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::SlippageTolerance)
        .unwrap_or(0)
}

fn acquire_lock(env: &Env) -> Result<(), RebalancerError> {
    let locked: bool = env
        .storage()
        .instance()
        .get(&DataKey::ReentrancyLock)
        .unwrap_or(false);
    if locked {
        return Err(RebalancerError::ReentrancyLocked);
    }
    env.storage().instance().set(&DataKey::ReentrancyLock, &true);
    Ok(())
}

fn release_lock(env: &Env) {
    env.storage().instance().set(&DataKey::ReentrancyLock, &false);
}

/// Pool reserves read as the pool's token balances. Returns (up, native).
fn get_pool_reserves(env: &Env) -> (i128, i128) {
    let pool = get_address(env, DataKey::Pool);
    (
        up_client(env).balance(&pool),
        native_client(env).balance(&pool),
    )
}

fn pool_total_shares(env: &Env) -> i128 {
    env.invoke_contract(
        &get_address(env, DataKey::Pool),
        &Symbol::new(env, "total_shares"),
        Vec::new(env),
    )
}

fn lp_shares(env: &Env) -> i128 {
    let pool = get_address(env, DataKey::Pool);
    TokenClient::new(env, &pool).balance(&env.current_contract_address())
}

/// Native the controller can actually lend right now (excludes what is
/// already out on loan).
fn controller_held_native(env: &Env) -> i128 {
    let controller = get_address(env, DataKey::Controller);
    native_client(env).balance(&controller)
}

// ─── Controller calls ───────────────────────────────────────────

fn controller_invoke<T: TryFromVal<Env, Val>>(env: &Env, func: &str, args: Vec<Val>) -> T {
    env.invoke_contract(
        &get_address(env, DataKey::Controller),
        &Symbol::new(env, func),
        args,
    )
}

fn controller_native_balance(env: &Env) -> i128 {
    controller_invoke(env, "get_native_balance", Vec::new(env))
}

fn controller_virtual_price(env: &Env) -> i128 {
    controller_invoke(env, "get_virtual_price", Vec::new(env))
}

fn controller_borrowed(env: &Env) -> (i128, i128) {
    let native: i128 = controller_invoke(env, "native_borrowed", Vec::new(env));
    let up: i128 = controller_invoke(env, "up_borrowed", Vec::new(env));
    (native, up)
}

fn borrow_native(env: &Env, amount: i128) {
    let self_addr = env.current_contract_address();
    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(self_addr.clone().into_val(env));
    args.push_back(amount.into_val(env));
    args.push_back(self_addr.into_val(env));
    controller_invoke::<Val>(env, "borrow_native", args);
}

fn borrow_up(env: &Env, amount: i128) {
    let self_addr = env.current_contract_address();
    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(self_addr.clone().into_val(env));
    args.push_back(amount.into_val(env));
    args.push_back(self_addr.into_val(env));
    controller_invoke::<Val>(env, "borrow_up", args);
}

/// Pre-authorizes a native pull the controller performs on our behalf.
fn authorize_controller_pull(env: &Env, amount: i128) {
    let native = get_address(env, DataKey::NativeToken);
    let controller = get_address(env, DataKey::Controller);
    let self_addr = env.current_contract_address();
    env.authorize_as_current_contract(soroban_sdk::vec![
        env,
        InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: native,
                fn_name: Symbol::new(env, "transfer"),
                args: soroban_sdk::vec![
                    env,
                    self_addr.into_val(env),
                    controller.into_val(env),
                    amount.into_val(env),
                ],
            },
            sub_invocations: soroban_sdk::vec![env],
        })
    ]);
}

/// Settles debt back to the controller, bounded by the outstanding
/// counters. Native beyond the debt goes back as a plain deposit; UP
/// beyond the debt stays here for the next round.
fn repay_capped(env: &Env, up_amount: i128, native_amount: i128) {
    let controller = get_address(env, DataKey::Controller);
    let self_addr = env.current_contract_address();
    let (native_borrowed, up_borrowed) = controller_borrowed(env);

    let up_repay = up_amount.min(up_borrowed);
    let native_repay = native_amount.min(native_borrowed);

    if up_repay > 0 || native_repay > 0 {
        if up_repay > 0 {
            let expiry = env.ledger().sequence() + 1000;
            up_client(env).approve(&self_addr, &controller, &up_repay, &expiry);
        }
        if native_repay > 0 {
            authorize_controller_pull(env, native_repay);
        }
        let mut args: Vec<Val> = Vec::new(env);
        args.push_back(self_addr.clone().into_val(env));
        args.push_back(up_repay.into_val(env));
        args.push_back(native_repay.into_val(env));
        controller_invoke::<Val>(env, "repay", args);
    }

    let native_surplus = native_amount - native_repay;
    if native_surplus > 0 {
        authorize_controller_pull(env, native_surplus);
        let mut args: Vec<Val> = Vec::new(env);
        args.push_back(self_addr.into_val(env));
        args.push_back(native_surplus.into_val(env));
        controller_invoke::<Val>(env, "deposit", args);
    }
}

// ─── Strategy calls ─────────────────────────────────────────────

fn strategy_info(env: &Env, strategy: &Address) -> StrategyInfo {
    env.invoke_contract(strategy, &Symbol::new(env, "check_rewards"), Vec::new(env))
}

fn strategy_deposit(env: &Env, strategy: &Address, amount: i128) {
    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(env.current_contract_address().into_val(env));
    args.push_back(amount.into_val(env));
    env.invoke_contract::<Val>(strategy, &Symbol::new(env, "deposit"), args);
}

fn strategy_withdraw(env: &Env, strategy: &Address, amount: i128) -> i128 {
    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(amount.into_val(env));
    args.push_back(env.current_contract_address().into_val(env));
    env.invoke_contract(strategy, &Symbol::new(env, "withdraw"), args)
}

// ─── Router calls ───────────────────────────────────────────────

/// Pre-authorizes the token pulls the router performs on our behalf.
fn authorize_router_pulls(env: &Env, pulls: &[(Address, i128)]) {
    let pool = get_address(env, DataKey::Pool);
    let self_addr = env.current_contract_address();
    let mut entries = soroban_sdk::vec![env];
    for (token, amount) in pulls.iter() {
        entries.push_back(InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: token.clone(),
                fn_name: Symbol::new(env, "transfer"),
                args: soroban_sdk::vec![
                    env,
                    self_addr.clone().into_val(env),
                    pool.clone().into_val(env),
                    (*amount).into_val(env),
                ],
            },
            sub_invocations: soroban_sdk::vec![env],
        }));
    }
    env.authorize_as_current_contract(entries);
}

fn router_swap(env: &Env, token_in: &Address, token_out: &Address, amount_in: i128) -> i128 {
    authorize_router_pulls(env, &[(token_in.clone(), amount_in)]);
    let self_addr = env.current_contract_address();
    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(self_addr.clone().into_val(env));
    args.push_back(token_in.clone().into_val(env));
    args.push_back(token_out.clone().into_val(env));
    args.push_back(amount_in.into_val(env));
    args.push_back(0i128.into_val(env));
    args.push_back(self_addr.into_val(env));
    env.invoke_contract(
        &get_address(env, DataKey::Router),
        &Symbol::new(env, "swap"),
        args,
    )
}

fn router_add_liquidity(env: &Env, amount_up: i128, amount_native: i128) -> (i128, i128, i128) {
    let up = get_address(env, DataKey::UpToken);
    let native = get_address(env, DataKey::NativeToken);
    authorize_router_pulls(env, &[(up.clone(), amount_up), (native.clone(), amount_native)]);
    let self_addr = env.current_contract_address();
    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(self_addr.clone().into_val(env));
    args.push_back(up.into_val(env));
    args.push_back(native.into_val(env));
    args.push_back(amount_up.into_val(env));
    args.push_back(amount_native.into_val(env));
    args.push_back(self_addr.into_val(env));
    env.invoke_contract(
        &get_address(env, DataKey::Router),
        &Symbol::new(env, "add_liquidity"),
        args,
    )
}

fn router_remove_liquidity(env: &Env, shares: i128) -> (i128, i128) {
    let up = get_address(env, DataKey::UpToken);
    let native = get_address(env, DataKey::NativeToken);
    let self_addr = env.current_contract_address();
    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(self_addr.clone().into_val(env));
    args.push_back(up.into_val(env));
    args.push_back(native.into_val(env));
    args.push_back(shares.into_val(env));
    args.push_back(self_addr.into_val(env));
    env.invoke_contract(
        &get_address(env, DataKey::Router),
        &Symbol::new(env, "remove_liquidity"),
        args,
    )
}

// ─── Reward history ─────────────────────────────────────────────

fn push_reward(env: &Env, reward: Reward) {
    let mut rewards: Vec<Reward> = env
        .storage()
        .instance()
        .get(&DataKey::Rewards)
        .unwrap_or_else(|| Vec::new(env));
    if rewards.len() < MAX_REWARDS {
        rewards.push_back(reward);
    } else {
        let cursor: u32 = env
            .storage()
            .instance()
            .get(&DataKey::RewardCursor)
            .unwrap_or(0);
        rewards.set(cursor, reward);
        env.storage()
            .instance()
            .set(&DataKey::RewardCursor, &((cursor + 1) % MAX_REWARDS));
    }
    env.storage().instance().set(&DataKey::Rewards, &rewards);
}

// ─── Implementation ──────────────────────────────────────────────

#[contractimpl]
impl Rebalancer {
    pub fn initialize(
        env: Env,
        admin: Address,
        controller: Address,
        up_token: Address,
        native_token: Address,
        pool: Address,
        router: Address,
        strategy: Option<Address>,
        allocation_lp: u32,
        allocation_redeem: u32,
        slippage_tolerance: u32,
    ) {
        let already: bool = env
            .storage()
            .instance()
            .get(&DataKey::Initialized)
            .unwrap_or(false);
        assert!(!already, "Already initialized");
        assert!(allocation_lp + allocation_redeem <= 100, "Invalid allocations");
        assert!(slippage_tolerance < 100, "Invalid slippage tolerance");

        access_control::set_admin(&env, &admin);
        env.storage().instance().set(&DataKey::Controller, &controller);
        env.storage().instance().set(&DataKey::UpToken, &up_token);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage().instance().set(&DataKey::Pool, &pool);
        env.storage().instance().set(&DataKey::Router, &router);
        if let Some(strategy) = strategy {
            env.storage().instance().set(&DataKey::Strategy, &strategy);
        }
        env.storage()
            .instance()
            .set(&DataKey::AllocationLp, &allocation_lp);
        env.storage()
            .instance()
            .set(&DataKey::AllocationRedeem, &allocation_redeem);
        env.storage()
            .instance()
            .set(&DataKey::SlippageTolerance, &slippage_tolerance);
        env.storage().instance().set(&DataKey::RewardCursor, &0u32);
        env.storage().instance().set(&DataKey::Initialized, &true);
    }

    // ─── Reads ──────────────────────────────────────────────────

    pub fn allocation_lp(env: Env) -> u32 {
        allocation_lp(&env)
    }

    pub fn allocation_redeem(env: Env) -> u32 {
        allocation_redeem(&env)
    }

    pub fn slippage_tolerance(env: Env) -> u32 {
        slippage_tolerance(&env)
    }

    pub fn strategy(env: Env) -> Option<Address> {
        strategy(&env)
    }

    /// This contract's share of the pool reserves, from its LP shares.
    pub fn get_liquidity_pool_balance(
        env: Env,
        reserve_up: i128,
        reserve_native: i128,
    ) -> (i128, i128) {
        let shares = lp_shares(&env);
        if shares == 0 {
            return (0, 0);
        }
        let total = pool_total_shares(&env);
        if total == 0 {
            return (0, 0);
        }
        (
            mul_div(&env, reserve_up, shares, total),
            mul_div(&env, reserve_native, shares, total),
        )
    }

    pub fn get_reward(env: Env, index: u32) -> Reward {
        let rewards: Vec<Reward> = env
            .storage()
            .instance()
            .get(&DataKey::Rewards)
            .unwrap_or_else(|| Vec::new(&env));
        rewards.get(index).expect("no reward at index")
    }

    pub fn get_rewards_length(env: Env) -> u32 {
        let rewards: Vec<Reward> = env
            .storage()
            .instance()
            .get(&DataKey::Rewards)
            .unwrap_or_else(|| Vec::new(&env));
        rewards.len()
    }

    // ─── Rebalance ──────────────────────────────────────────────

    /// Redistributes the controller's backing toward the target
    /// allocations. Hard-fails with `AlreadyRebalanced` when every leg is
    /// already within the slippage tolerance, so keepers can tell a no-op
    /// invocation from real work.
    pub fn rebalance(env: Env, caller: Address) -> Result<(), RebalancerError> {
        caller.require_auth();
        if access_control::has_role(&env, &caller, &REBALANCE_ROLE).is_none() {
            return Err(RebalancerError::OnlyRebalancer);
        }
        acquire_lock(&env)?;
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        let total = controller_native_balance(&env);
        if total == 0 {
            release_lock(&env);
            return Err(RebalancerError::NoBacking);
        }
        let tolerance = mul_div(&env, total, slippage_tolerance(&env) as i128, 100);
        let mut changed = false;

        if Self::adjust_strategy(&env, total, tolerance) {
            changed = true;
        }
        if Self::align_pool_price(&env) {
            changed = true;
        }
        if Self::adjust_liquidity(&env, total, tolerance) {
            changed = true;
        }

        if !changed {
            release_lock(&env);
            return Err(RebalancerError::AlreadyRebalanced);
        }

        let info = match strategy(&env) {
            Some(strategy) => strategy_info(&env, &strategy),
            None => StrategyInfo {
                deposited_amount: 0,
                rewards_amount: 0,
            },
        };
        push_reward(
            &env,
            Reward {
                deposited_amount: info.deposited_amount,
                rewards_amount: info.rewards_amount,
                timestamp: env.ledger().timestamp(),
            },
        );

        env.events().publish(
            (Symbol::new(&env, "rebalanced"),),
            (total, info.deposited_amount, info.rewards_amount),
        );
        release_lock(&env);
        Ok(())
    }

    /// Strategy leg: deposit the shortfall or withdraw the excess when the
    /// drift exceeds the tolerance band.
    fn adjust_strategy(env: &Env, total: i128, tolerance: i128) -> bool {
        let strategy = match strategy(env) {
            Some(s) => s,
            None => return false,
        };
        let share = 100 - allocation_lp(env) as i128 - allocation_redeem(env) as i128;
        let target = mul_div(env, total, share, 100);
        let current = strategy_info(env, &strategy).deposited_amount;

        if current > target && current - target > tolerance {
            let withdrawn = strategy_withdraw(env, &strategy, current - target);
            repay_capped(env, 0, withdrawn);
            env.events().publish(
                (Symbol::new(env, "strategy_withdrawn"),),
                (withdrawn, target),
            );
            true
        } else if target > current && target - current > tolerance {
            // Lend no more than the controller holds; the remainder waits
            // for a later round.
            let delta = (target - current).min(controller_held_native(env));
            if delta <= 0 {
                return false;
            }
            borrow_native(env, delta);
            strategy_deposit(env, &strategy, delta);
            env.events()
                .publish((Symbol::new(env, "strategy_deposited"),), (delta, target));
            true
        } else {
            false
        }
    }

    /// Price leg: when the pool price has drifted from the virtual price
    /// beyond the tolerance, runs the aligning trade with borrowed funds
    /// and settles the proceeds back to the controller.
    fn align_pool_price(env: &Env) -> bool {
        let (reserve_up, reserve_native) = get_pool_reserves(env);
        let price = controller_virtual_price(env);
        if price == 0 || reserve_up == 0 || reserve_native == 0 {
            return false;
        }
        let pool_price = mul_div(env, reserve_native, SCALE, reserve_up);
        let drift = (pool_price - price).abs();
        let band = mul_div(env, price, slippage_tolerance(env) as i128, 100);
        if drift <= band {
            return false;
        }

        let (sell_up, amount_in) = compute_align_trade(env, reserve_up, reserve_native, price);
        if amount_in == 0 {
            return false;
        }

        let up = get_address(env, DataKey::UpToken);
        let native = get_address(env, DataKey::NativeToken);
        if sell_up {
            // Mint-and-sell: the synthetic debt stays backed by the
            // proceeds deposited right back into the controller.
            borrow_up(env, amount_in);
            let native_out = router_swap(env, &up, &native, amount_in);
            repay_capped(env, 0, native_out);
        } else {
            let amount_in = amount_in.min(controller_held_native(env));
            if amount_in <= 0 {
                return false;
            }
            let held = native_client(env).balance(&env.current_contract_address());
            borrow_native(env, amount_in);
            let up_out = router_swap(env, &native, &up, amount_in);
            // Burn what we can against the synthetic debt; native debt is
            // settled from whatever balance is left over.
            let spare = native_client(env).balance(&env.current_contract_address()) - held;
            repay_capped(env, up_out, spare.max(0));
        }
        env.events().publish(
            (Symbol::new(env, "pool_aligned"),),
            (sell_up, amount_in, price),
        );
        true
    }

    /// LP leg: grow or shrink the position until its native side matches
    /// the target allocation.
    fn adjust_liquidity(env: &Env, total: i128, tolerance: i128) -> bool {
        let (reserve_up, reserve_native) = get_pool_reserves(env);
        if reserve_up == 0 || reserve_native == 0 {
            return false;
        }
        let (_, our_native) =
            Self::get_liquidity_pool_balance(env.clone(), reserve_up, reserve_native);
        let target = mul_div(env, total, allocation_lp(env) as i128, 100);

        if target > our_native && target - our_native > tolerance {
            let delta_native = (target - our_native).min(controller_held_native(env));
            let delta_up = mul_div(env, delta_native, reserve_up, reserve_native);
            if delta_native <= 0 || delta_up == 0 {
                return false;
            }
            borrow_native(env, delta_native);
            borrow_up(env, delta_up);
            let (used_up, used_native, _shares) =
                router_add_liquidity(env, delta_up, delta_native);
            repay_capped(env, delta_up - used_up, delta_native - used_native);
            env.events().publish(
                (Symbol::new(env, "liquidity_added"),),
                (used_up, used_native),
            );
            true
        } else if our_native > target && our_native - target > tolerance {
            let excess = our_native - target;
            let shares = mul_div(env, lp_shares(env), excess, our_native);
            if shares == 0 {
                return false;
            }
            let (up_back, native_back) = router_remove_liquidity(env, shares);
            repay_capped(env, up_back, native_back);
            env.events().publish(
                (Symbol::new(env, "liquidity_removed"),),
                (up_back, native_back),
            );
            true
        } else {
            false
        }
    }

    // ─── Config ─────────────────────────────────────────────────

    pub fn set_controller(env: Env, caller: Address, controller: Address) -> Result<(), RebalancerError> {
        require_admin(&env, &caller)?;
        env.storage().instance().set(&DataKey::Controller, &controller);
        env.events()
            .publish((Symbol::new(&env, "controller_updated"),), controller);
        Ok(())
    }

    pub fn set_strategy(env: Env, caller: Address, strategy: Address) -> Result<(), RebalancerError> {
        require_admin(&env, &caller)?;
        env.storage().instance().set(&DataKey::Strategy, &strategy);
        env.events()
            .publish((Symbol::new(&env, "strategy_updated"),), strategy);
        Ok(())
    }

    pub fn clear_strategy(env: Env, caller: Address) -> Result<(), RebalancerError> {
        require_admin(&env, &caller)?;
        env.storage().instance().remove(&DataKey::Strategy);
        env.events()
            .publish((Symbol::new(&env, "strategy_cleared"),), ());
        Ok(())
    }

    pub fn set_allocation_lp(env: Env, caller: Address, allocation: u32) -> Result<(), RebalancerError> {
        require_admin(&env, &caller)?;
        if allocation + allocation_redeem(&env) > 100 {
            return Err(RebalancerError::AllocationGt100);
        }
        env.storage()
            .instance()
            .set(&DataKey::AllocationLp, &allocation);
        env.events()
            .publish((Symbol::new(&env, "allocation_lp_updated"),), allocation);
        Ok(())
    }

    pub fn set_allocation_redeem(env: Env, caller: Address, allocation: u32) -> Result<(), RebalancerError> {
        require_admin(&env, &caller)?;
        if allocation + allocation_lp(&env) > 100 {
            return Err(RebalancerError::AllocationGt100);
        }
        env.storage()
            .instance()
            .set(&DataKey::AllocationRedeem, &allocation);
        env.events()
            .publish((Symbol::new(&env, "allocation_redeem_updated"),), allocation);
        Ok(())
    }

    pub fn set_slippage_tolerance(env: Env, caller: Address, tolerance: u32) -> Result<(), RebalancerError> {
        require_admin(&env, &caller)?;
        if tolerance >= 100 {
            return Err(RebalancerError::SlippageToleranceGt100);
        }
        env.storage()
            .instance()
            .set(&DataKey::SlippageTolerance, &tolerance);
        env.events()
            .publish((Symbol::new(&env, "slippage_updated"),), tolerance);
        Ok(())
    }
}

#[contractimpl]
impl AccessControl for Rebalancer {}
