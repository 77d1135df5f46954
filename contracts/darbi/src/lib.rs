#![no_std]

//! Arbitrage engine for the UP pool.
//!
//! Compares the pool-implied price against the controller's virtual price
//! and trades whichever direction converges the two: minting and selling
//! UP when the pool overprices it, buying and redeeming UP when the pool
//! underprices it. Profit above the ring-fenced operating float flows back
//! to the controller as fresh backing on every run.
//!
//! Imbalances at or below the arbitrage threshold are not worth the
//! transaction cost and complete as silent no-ops; router and controller
//! failures abort the whole operation.

use soroban_sdk::{
    auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation},
    contract, contracterror, contractimpl, contracttype, panic_with_error, symbol_short,
    token::TokenClient, Address, Env, IntoVal, Symbol, Val, Vec,
};
use stellar_access::access_control::{self as access_control, AccessControl};
use stellar_contract_utils::pausable::{self, Pausable};
use stellar_macros::when_not_paused;
use swap_math::{compute_align_trade, mul_div, SCALE};

// TTL constants: extend instance storage proactively to prevent archival
const TTL_THRESHOLD: u32 = 17_280; // ~1 day at 5s/ledger
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

/// May trigger `arbitrage`.
pub const MONITOR_ROLE: Symbol = symbol_short!("monitor");
/// May adjust the ring-fenced operating float.
pub const REBALANCER_ROLE: Symbol = symbol_short!("rebalance");

// ─── Storage Keys ────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    UpToken,
    NativeToken,
    Controller,
    Minter,
    Pool,
    Router,
    ArbitrageThreshold,
    GasRefund,
    DarbiFunds,
    Initialized,
    ReentrancyLock,
}

// ─── Errors ──────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum DarbiError {
    OnlyAdmin = 1,
    OnlyMonitor = 2,
    OnlyRebalancer = 3,
    InvalidAmount = 4,
    ReentrancyLocked = 5,
}

// ─── Contract ────────────────────────────────────────────────────

#[contract]
pub struct Darbi;

// ─── Helpers ─────────────────────────────────────────────────────

fn require_admin(env: &Env, caller: &Address) -> Result<(), DarbiError> {
    caller.require_auth();
    if access_control::get_admin(env) != Some(caller.clone()) {
        return Err(DarbiError::OnlyAdmin);
    }
    Ok(())
}

fn get_address(env: &Env, key: DataKey) -> Address {
    env.storage().instance().get(&key).expect("address not set")
}

fn native_client(env: &Env) -> TokenClient<'_> {
    let native = get_address(env, DataKey::NativeToken);
    TokenClient::new(env, &native)
}

fn darbi_funds(env: &Env) -> i128 {
    env.storage().instance().get(&DataKey::DarbiFunds).unwrap_or(0)
}

fn acquire_lock(env: &Env) -> Result<(), DarbiError> {
    let locked: bool = env
        .storage()
        .instance()
        .get(&DataKey::ReentrancyLock)
        .unwrap_or(false);
    if locked {
        return Err(DarbiError::ReentrancyLocked);
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
    let up = get_address(env, DataKey::UpToken);
    let reserve_up = TokenClient::new(env, &up).balance(&pool);
    let reserve_native = native_client(env).balance(&pool);
    (reserve_up, reserve_native)
}

fn get_virtual_price(env: &Env) -> i128 {
    env.invoke_contract(
        &get_address(env, DataKey::Controller),
        &Symbol::new(env, "get_virtual_price"),
        Vec::new(env),
    )
}

/// Swap through the router. Pre-authorizes the token pull the router
/// performs on this contract's behalf.
fn router_swap(env: &Env, token_in: &Address, token_out: &Address, amount_in: i128) -> i128 {
    let router = get_address(env, DataKey::Router);
    let pool = get_address(env, DataKey::Pool);
    let self_addr = env.current_contract_address();

    env.authorize_as_current_contract(soroban_sdk::vec![
        env,
        InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: token_in.clone(),
                fn_name: Symbol::new(env, "transfer"),
                args: soroban_sdk::vec![
                    env,
                    self_addr.clone().into_val(env),
                    pool.into_val(env),
                    amount_in.into_val(env),
                ],
            },
            sub_invocations: soroban_sdk::vec![env],
        })
    ]);

    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(self_addr.clone().into_val(env));
    args.push_back(token_in.clone().into_val(env));
    args.push_back(token_out.clone().into_val(env));
    args.push_back(amount_in.into_val(env));
    args.push_back(0i128.into_val(env)); // min_out: slippage surfaced post-hoc
    args.push_back(self_addr.into_val(env));
    env.invoke_contract(&router, &Symbol::new(env, "swap"), args)
}

fn mint_through_minter(env: &Env, value: i128) -> i128 {
    let minter = get_address(env, DataKey::Minter);
    let native = get_address(env, DataKey::NativeToken);
    let controller = get_address(env, DataKey::Controller);
    let self_addr = env.current_contract_address();

    // The minter pulls the native payment from us into the controller.
    env.authorize_as_current_contract(soroban_sdk::vec![
        env,
        InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: native,
                fn_name: Symbol::new(env, "transfer"),
                args: soroban_sdk::vec![
                    env,
                    self_addr.clone().into_val(env),
                    controller.into_val(env),
                    value.into_val(env),
                ],
            },
            sub_invocations: soroban_sdk::vec![env],
        })
    ]);

    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(self_addr.into_val(env));
    args.push_back(value.into_val(env));
    env.invoke_contract(&minter, &Symbol::new(env, "mint_up"), args)
}

fn redeem_at_controller(env: &Env, up_amount: i128) -> i128 {
    let controller = get_address(env, DataKey::Controller);
    let up = get_address(env, DataKey::UpToken);
    let self_addr = env.current_contract_address();

    // Redeem burns from us; the controller needs a live allowance.
    let expiry = env.ledger().sequence() + 1000;
    TokenClient::new(env, &up).approve(&self_addr, &controller, &up_amount, &expiry);

    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(self_addr.into_val(env));
    args.push_back(up_amount.into_val(env));
    env.invoke_contract(&controller, &Symbol::new(env, "redeem"), args)
}

fn do_refund(env: &Env, caller: &Address) {
    let native = native_client(env);
    let self_addr = env.current_contract_address();
    let balance = native.balance(&self_addr);
    let baseline = darbi_funds(env);
    if balance <= baseline {
        return;
    }

    let mut surplus = balance - baseline;
    let gas_refund = env
        .storage()
        .instance()
        .get(&DataKey::GasRefund)
        .unwrap_or(0i128);
    let rebate = gas_refund.min(surplus);
    if rebate > 0 {
        native.transfer(&self_addr, caller, &rebate);
        surplus -= rebate;
    }
    if surplus > 0 {
        let controller = get_address(env, DataKey::Controller);
        native.transfer(&self_addr, &controller, &surplus);
    }

    env.events()
        .publish((Symbol::new(env, "refund"),), (surplus, rebate));
}

// ─── Implementation ──────────────────────────────────────────────

#[contractimpl]
impl Darbi {
    pub fn initialize(
        env: Env,
        admin: Address,
        up_token: Address,
        native_token: Address,
        controller: Address,
        minter: Address,
        pool: Address,
        router: Address,
        arbitrage_threshold: i128,
        gas_refund: i128,
    ) {
        let already: bool = env
            .storage()
            .instance()
            .get(&DataKey::Initialized)
            .unwrap_or(false);
        assert!(!already, "Already initialized");
        assert!(arbitrage_threshold > 0, "Threshold must be positive");

        access_control::set_admin(&env, &admin);
        env.storage().instance().set(&DataKey::UpToken, &up_token);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage()
            .instance()
            .set(&DataKey::Controller, &controller);
        env.storage().instance().set(&DataKey::Minter, &minter);
        env.storage().instance().set(&DataKey::Pool, &pool);
        env.storage().instance().set(&DataKey::Router, &router);
        env.storage()
            .instance()
            .set(&DataKey::ArbitrageThreshold, &arbitrage_threshold);
        env.storage().instance().set(&DataKey::GasRefund, &gas_refund);
        env.storage().instance().set(&DataKey::DarbiFunds, &0i128);
        env.storage().instance().set(&DataKey::Initialized, &true);
    }

    // ─── Reads ──────────────────────────────────────────────────

    pub fn arbitrage_threshold(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::ArbitrageThreshold)
            .unwrap_or(0)
    }

    pub fn gas_refund(env: Env) -> i128 {
        env.storage().instance().get(&DataKey::GasRefund).unwrap_or(0)
    }

    pub fn darbi_funds(env: Env) -> i128 {
        darbi_funds(&env)
    }

    pub fn minter(env: Env) -> Address {
        get_address(&env, DataKey::Minter)
    }

    /// Direction and size of the trade that would align the pool price to
    /// the virtual price. `(true, n)` sells n UP, `(false, n)` spends n
    /// native, `(false, 0)` means the pool is already aligned.
    pub fn move_market_buy_amount(env: Env) -> (bool, i128) {
        let (reserve_up, reserve_native) = get_pool_reserves(&env);
        let price = get_virtual_price(&env);
        compute_align_trade(&env, reserve_up, reserve_native, price)
    }

    // ─── Arbitrage ──────────────────────────────────────────────

    #[when_not_paused]
    pub fn arbitrage(env: Env, caller: Address) -> Result<(), DarbiError> {
        caller.require_auth();
        if access_control::has_role(&env, &caller, &MONITOR_ROLE).is_none() {
            return Err(DarbiError::OnlyMonitor);
        }
        acquire_lock(&env)?;
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        let (sell_up, amount_in) = Self::move_market_buy_amount(env.clone());
        let threshold = Self::arbitrage_threshold(env.clone());
        let self_addr = env.current_contract_address();
        let available = native_client(&env).balance(&self_addr) - darbi_funds(&env);

        if amount_in <= threshold || available <= 0 {
            // Not worth doing, distinct from broken
            env.events()
                .publish((Symbol::new(&env, "arbitrage_skipped"),), amount_in);
            release_lock(&env);
            return Ok(());
        }

        let price = get_virtual_price(&env);
        let up = get_address(&env, DataKey::UpToken);
        let native = get_address(&env, DataKey::NativeToken);

        if sell_up {
            // Pool overprices UP: mint at the virtual price, sell high.
            // The native spend may never dip into the ring-fenced float.
            let mut native_cost = mul_div(&env, amount_in, price, SCALE);
            if native_cost > available {
                native_cost = available;
            }
            if native_cost == 0 {
                env.events()
                    .publish((Symbol::new(&env, "arbitrage_skipped"),), amount_in);
                release_lock(&env);
                return Ok(());
            }
            let minted = mint_through_minter(&env, native_cost);
            let native_out = router_swap(&env, &up, &native, minted);

            // Thin pool: warn, do not revert
            let min_out = mul_div(&env, native_cost, 80, 100);
            if native_out < min_out {
                env.events().publish(
                    (Symbol::new(&env, "slippage_warning"),),
                    (native_out, native_cost, min_out),
                );
            }
            env.events().publish(
                (Symbol::new(&env, "arbitrage"),),
                (true, minted, native_out),
            );
        } else {
            // Pool underprices UP: buy cheap, redeem at the virtual price.
            let spend = amount_in.min(available);
            let up_out = router_swap(&env, &native, &up, spend);
            let redeemed = redeem_at_controller(&env, up_out);

            let min_back = mul_div(&env, spend, 80, 100);
            if redeemed < min_back {
                env.events().publish(
                    (Symbol::new(&env, "slippage_warning"),),
                    (redeemed, spend, min_back),
                );
            }
            env.events()
                .publish((Symbol::new(&env, "arbitrage"),), (false, spend, redeemed));
        }

        do_refund(&env, &caller);
        release_lock(&env);
        Ok(())
    }

    /// Sweeps any native above the ring-fenced float to the controller,
    /// rebating `gas_refund` to the caller first. No surplus, no effect.
    pub fn refund(env: Env, caller: Address) {
        caller.require_auth();
        do_refund(&env, &caller);
    }

    /// Ungated native top-up for the operating float.
    pub fn fund(env: Env, from: Address, amount: i128) {
        from.require_auth();
        assert!(amount > 0, "Amount must be positive");
        native_client(&env).transfer(&from, &env.current_contract_address(), &amount);
        env.events()
            .publish((Symbol::new(&env, "funded"),), (from, amount));
    }

    // ─── Config ─────────────────────────────────────────────────

    pub fn set_arbitrage_threshold(env: Env, caller: Address, threshold: i128) -> Result<(), DarbiError> {
        require_admin(&env, &caller)?;
        if threshold <= 0 {
            return Err(DarbiError::InvalidAmount);
        }
        env.storage()
            .instance()
            .set(&DataKey::ArbitrageThreshold, &threshold);
        env.events()
            .publish((Symbol::new(&env, "threshold_updated"),), threshold);
        Ok(())
    }

    pub fn set_gas_refund(env: Env, caller: Address, gas_refund: i128) -> Result<(), DarbiError> {
        require_admin(&env, &caller)?;
        if gas_refund <= 0 {
            return Err(DarbiError::InvalidAmount);
        }
        env.storage().instance().set(&DataKey::GasRefund, &gas_refund);
        env.events()
            .publish((Symbol::new(&env, "gas_refund_updated"),), gas_refund);
        Ok(())
    }

    /// Rebalancer-adjustable floor below which arbitrage never spends.
    pub fn set_darbi_funds(env: Env, caller: Address, amount: i128) -> Result<(), DarbiError> {
        caller.require_auth();
        let is_admin = access_control::get_admin(&env) == Some(caller.clone());
        if !is_admin && access_control::has_role(&env, &caller, &REBALANCER_ROLE).is_none() {
            return Err(DarbiError::OnlyRebalancer);
        }
        if amount < 0 {
            return Err(DarbiError::InvalidAmount);
        }
        env.storage().instance().set(&DataKey::DarbiFunds, &amount);
        env.events()
            .publish((Symbol::new(&env, "darbi_funds_updated"),), amount);
        Ok(())
    }

    pub fn set_minter(env: Env, caller: Address, minter: Address) -> Result<(), DarbiError> {
        require_admin(&env, &caller)?;
        env.storage().instance().set(&DataKey::Minter, &minter);
        env.events()
            .publish((Symbol::new(&env, "minter_updated"),), minter);
        Ok(())
    }

    pub fn set_controller(env: Env, caller: Address, controller: Address) -> Result<(), DarbiError> {
        require_admin(&env, &caller)?;
        env.storage()
            .instance()
            .set(&DataKey::Controller, &controller);
        env.events()
            .publish((Symbol::new(&env, "controller_updated"),), controller);
        Ok(())
    }

    pub fn set_pool(env: Env, caller: Address, pool: Address, router: Address) -> Result<(), DarbiError> {
        require_admin(&env, &caller)?;
        env.storage().instance().set(&DataKey::Pool, &pool);
        env.storage().instance().set(&DataKey::Router, &router);
        env.events()
            .publish((Symbol::new(&env, "pool_updated"),), (pool, router));
        Ok(())
    }

    /// Admin drains the whole native balance, float included.
    pub fn withdraw_funds(env: Env, caller: Address, to: Address) -> Result<i128, DarbiError> {
        require_admin(&env, &caller)?;
        let native = native_client(&env);
        let balance = native.balance(&env.current_contract_address());
        if balance > 0 {
            native.transfer(&env.current_contract_address(), &to, &balance);
        }
        env.events()
            .publish((Symbol::new(&env, "funds_withdrawn"),), (to, balance));
        Ok(balance)
    }
}

// Pausable (admin-only)
#[contractimpl]
impl Pausable for Darbi {
    fn pause(e: &Env, caller: Address) {
        caller.require_auth();
        if access_control::get_admin(e) != Some(caller) {
            panic_with_error!(e, DarbiError::OnlyAdmin);
        }
        pausable::pause(e);
    }

    fn unpause(e: &Env, caller: Address) {
        caller.require_auth();
        if access_control::get_admin(e) != Some(caller) {
            panic_with_error!(e, DarbiError::OnlyAdmin);
        }
        pausable::unpause(e);
    }
}

#[contractimpl]
impl AccessControl for Darbi {}
