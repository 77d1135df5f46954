#![no_std]

//! Collateral controller for the UP token.
//!
//! Owns the native-asset backing, tracks synthetic and native debt, and
//! derives the redemption ("virtual") price from the two. Every unit of UP
//! counted by `actual_total_supply` is backed by the native balance plus
//! outstanding native debt; the debt counters can only shrink through
//! `repay`, never below zero.

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, token::TokenClient,
    Address, Env, IntoVal, Symbol, Val, Vec,
};
use stellar_access::access_control::{self as access_control, AccessControl};
use swap_math::{mul_div, SCALE};

// TTL constants: extend instance storage proactively to prevent archival
const TTL_THRESHOLD: u32 = 17_280; // ~1 day at 5s/ledger
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

/// May call borrow_native / borrow_up / repay.
pub const REBALANCER_ROLE: Symbol = symbol_short!("rebalance");
/// May burn UP for native through `redeem`.
pub const REDEEMER_ROLE: Symbol = symbol_short!("redeemer");

const DEFAULT_MINT_RATE: u32 = 5;

// ─── Storage Keys ────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    UpToken,
    NativeToken,
    NativeBorrowed,
    UpBorrowed,
    MintRate,
    Initialized,
}

// ─── Errors ──────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ControllerError {
    OnlyAdmin = 1,
    OnlyRebalancer = 2,
    OnlyRedeemer = 3,
    NotEnoughBalance = 4,
    UpAmountGtBorrowed = 5,
    NativeAmountGtBorrowed = 6,
    AmountEq0 = 7,
    NonUpContract = 8,
    InvalidPayableAmount = 9,
    MintRateGt100 = 10,
    MintRateEq0 = 11,
}

// ─── Contract ────────────────────────────────────────────────────

#[contract]
pub struct UpController;

// ─── Helpers ─────────────────────────────────────────────────────

fn require_admin(env: &Env, caller: &Address) -> Result<(), ControllerError> {
    caller.require_auth();
    if access_control::get_admin(env) != Some(caller.clone()) {
        return Err(ControllerError::OnlyAdmin);
    }
    Ok(())
}

fn check_role(env: &Env, caller: &Address, role: &Symbol) -> bool {
    caller.require_auth();
    access_control::has_role(env, caller, role).is_some()
}

fn up_token(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::UpToken)
        .expect("UP token not set")
}

fn native_client(env: &Env) -> TokenClient<'_> {
    let native: Address = env
        .storage()
        .instance()
        .get(&DataKey::NativeToken)
        .expect("Native token not set");
    TokenClient::new(env, &native)
}

fn native_borrowed(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::NativeBorrowed)
        .unwrap_or(0)
}

fn up_borrowed(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::UpBorrowed)
        .unwrap_or(0)
}

fn held_native(env: &Env) -> i128 {
    native_client(env).balance(&env.current_contract_address())
}

fn up_total_supply(env: &Env) -> i128 {
    env.invoke_contract(
        &up_token(env),
        &Symbol::new(env, "total_supply"),
        Vec::new(env),
    )
}

/// Supply actually backed by collateral: total supply minus synthetic debt.
fn actual_supply(env: &Env) -> i128 {
    let supply = up_total_supply(env) - up_borrowed(env);
    supply.max(0)
}

/// Backing per UP, SCALE-based. `exclude` subtracts native that arrived as
/// part of the current operation so the price is as-of-call-start.
fn virtual_price_excluding(env: &Env, exclude: i128) -> i128 {
    let supply = actual_supply(env);
    if supply == 0 {
        return 0;
    }
    let backing = held_native(env) - exclude + native_borrowed(env);
    mul_div(env, backing, SCALE, supply)
}

fn mint_up_tokens(env: &Env, to: &Address, amount: i128) {
    let mut args: Vec<Val> = Vec::new(env);
    args.push_back(env.current_contract_address().into_val(env));
    args.push_back(to.clone().into_val(env));
    args.push_back(amount.into_val(env));
    args.push_back(0i128.into_val(env));
    env.invoke_contract::<Val>(&up_token(env), &Symbol::new(env, "mint"), args);
}

// ─── Implementation ──────────────────────────────────────────────

#[contractimpl]
impl UpController {
    pub fn initialize(env: Env, admin: Address, up_token: Address, native_token: Address) {
        let already: bool = env
            .storage()
            .instance()
            .get(&DataKey::Initialized)
            .unwrap_or(false);
        assert!(!already, "Already initialized");

        access_control::set_admin(&env, &admin);
        env.storage().instance().set(&DataKey::UpToken, &up_token);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage().instance().set(&DataKey::NativeBorrowed, &0i128);
        env.storage().instance().set(&DataKey::UpBorrowed, &0i128);
        env.storage()
            .instance()
            .set(&DataKey::MintRate, &DEFAULT_MINT_RATE);
        env.storage().instance().set(&DataKey::Initialized, &true);
    }

    // ─── Reads ──────────────────────────────────────────────────

    pub fn up_token(env: Env) -> Address {
        up_token(&env)
    }

    pub fn native_borrowed(env: Env) -> i128 {
        native_borrowed(&env)
    }

    pub fn up_borrowed(env: Env) -> i128 {
        up_borrowed(&env)
    }

    pub fn mint_rate(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::MintRate)
            .unwrap_or(DEFAULT_MINT_RATE)
    }

    /// Total backing: native held plus native lent out.
    pub fn get_native_balance(env: Env) -> i128 {
        held_native(&env) + native_borrowed(&env)
    }

    pub fn actual_total_supply(env: Env) -> i128 {
        actual_supply(&env)
    }

    /// Native backing per UP (18-decimal). Zero when no backed supply
    /// exists; callers must treat zero as "undefined", never as "free".
    pub fn get_virtual_price(env: Env) -> i128 {
        virtual_price_excluding(&env, 0)
    }

    // ─── Collateral in ──────────────────────────────────────────

    /// Ungated collateral top-up. Raises the virtual price for everyone.
    pub fn deposit(env: Env, from: Address, amount: i128) -> Result<(), ControllerError> {
        from.require_auth();
        if amount <= 0 {
            return Err(ControllerError::AmountEq0);
        }
        native_client(&env).transfer(&from, &env.current_contract_address(), &amount);
        env.events()
            .publish((Symbol::new(&env, "deposit"),), (from, amount));
        Ok(())
    }

    // ─── Borrow / repay ─────────────────────────────────────────

    pub fn borrow_native(
        env: Env,
        caller: Address,
        amount: i128,
        to: Address,
    ) -> Result<(), ControllerError> {
        if !check_role(&env, &caller, &REBALANCER_ROLE) {
            return Err(ControllerError::OnlyRebalancer);
        }
        if amount <= 0 {
            return Err(ControllerError::AmountEq0);
        }
        if amount > held_native(&env) {
            return Err(ControllerError::NotEnoughBalance);
        }
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        let total = native_borrowed(&env) + amount;
        env.storage()
            .instance()
            .set(&DataKey::NativeBorrowed, &total);
        native_client(&env).transfer(&env.current_contract_address(), &to, &amount);

        env.events()
            .publish((Symbol::new(&env, "borrow_native"),), (to, amount, total));
        Ok(())
    }

    pub fn borrow_up(
        env: Env,
        caller: Address,
        amount: i128,
        to: Address,
    ) -> Result<(), ControllerError> {
        if !check_role(&env, &caller, &REBALANCER_ROLE) {
            return Err(ControllerError::OnlyRebalancer);
        }
        if amount <= 0 {
            return Err(ControllerError::AmountEq0);
        }
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        let total = up_borrowed(&env) + amount;
        env.storage().instance().set(&DataKey::UpBorrowed, &total);
        mint_up_tokens(&env, &to, amount);

        env.events()
            .publish((Symbol::new(&env, "synthetic_mint"),), (to, amount, total));
        Ok(())
    }

    /// Settles debt: burns `up_amount` UP from the caller (allowance
    /// required) and pulls `native_amount` native from the caller. Either
    /// side may be zero.
    pub fn repay(
        env: Env,
        caller: Address,
        up_amount: i128,
        native_amount: i128,
    ) -> Result<(), ControllerError> {
        if !check_role(&env, &caller, &REBALANCER_ROLE) {
            return Err(ControllerError::OnlyRebalancer);
        }
        if up_amount < 0 || native_amount < 0 {
            return Err(ControllerError::AmountEq0);
        }
        if up_amount > up_borrowed(&env) {
            return Err(ControllerError::UpAmountGtBorrowed);
        }
        if native_amount > native_borrowed(&env) {
            return Err(ControllerError::NativeAmountGtBorrowed);
        }
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        if up_amount > 0 {
            env.storage()
                .instance()
                .set(&DataKey::UpBorrowed, &(up_borrowed(&env) - up_amount));
            TokenClient::new(&env, &up_token(&env)).burn_from(
                &env.current_contract_address(),
                &caller,
                &up_amount,
            );
        }
        if native_amount > 0 {
            env.storage()
                .instance()
                .set(&DataKey::NativeBorrowed, &(native_borrowed(&env) - native_amount));
            native_client(&env).transfer(&caller, &env.current_contract_address(), &native_amount);
        }

        env.events()
            .publish((Symbol::new(&env, "repay"),), (native_amount, up_amount));
        Ok(())
    }

    // ─── Redeem ─────────────────────────────────────────────────

    /// Burns UP from the caller and pays out native at the virtual price.
    pub fn redeem(env: Env, caller: Address, up_amount: i128) -> Result<i128, ControllerError> {
        if !check_role(&env, &caller, &REDEEMER_ROLE) {
            return Err(ControllerError::OnlyRedeemer);
        }
        if up_amount <= 0 {
            return Err(ControllerError::AmountEq0);
        }
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        let price = virtual_price_excluding(&env, 0);
        let payout = mul_div(&env, up_amount, price, SCALE);

        TokenClient::new(&env, &up_token(&env)).burn_from(
            &env.current_contract_address(),
            &caller,
            &up_amount,
        );
        if payout > 0 {
            native_client(&env).transfer(&env.current_contract_address(), &caller, &payout);
        }

        env.events()
            .publish((Symbol::new(&env, "redeem"),), (up_amount, payout));
        Ok(payout)
    }

    // ─── Premium mint variant ───────────────────────────────────

    /// Prices a premium mint for the UP token contract, which has already
    /// forwarded `value` native here and mints the returned amount itself.
    /// A zero virtual price mints nothing (bootstrap case) and succeeds.
    pub fn mint_up(
        env: Env,
        caller: Address,
        to: Address,
        value: i128,
    ) -> Result<i128, ControllerError> {
        caller.require_auth();
        if caller != up_token(&env) {
            return Err(ControllerError::NonUpContract);
        }
        if value <= 0 {
            return Err(ControllerError::InvalidPayableAmount);
        }
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        // Price as of call start: the forwarded value is not yet backing.
        let price = virtual_price_excluding(&env, value);
        if price == 0 {
            return Ok(0);
        }

        let rate = Self::mint_rate(env.clone()) as i128;
        let discounted = value - mul_div(&env, value, rate * 100, 10_000);
        let minted = mul_div(&env, discounted, SCALE, price);

        env.events().publish(
            (Symbol::new(&env, "premium_mint"),),
            (to, minted, price, value),
        );
        Ok(minted)
    }

    pub fn set_mint_rate(env: Env, caller: Address, rate: u32) -> Result<(), ControllerError> {
        require_admin(&env, &caller)?;
        if rate > 100 {
            return Err(ControllerError::MintRateGt100);
        }
        if rate == 0 {
            return Err(ControllerError::MintRateEq0);
        }
        env.storage().instance().set(&DataKey::MintRate, &rate);
        env.events()
            .publish((Symbol::new(&env, "mint_rate_updated"),), rate);
        Ok(())
    }

    // ─── Admin sweeps ───────────────────────────────────────────

    pub fn withdraw_funds(env: Env, caller: Address, to: Address) -> Result<i128, ControllerError> {
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

    pub fn withdraw_funds_token(
        env: Env,
        caller: Address,
        to: Address,
        token: Address,
    ) -> Result<i128, ControllerError> {
        require_admin(&env, &caller)?;
        let client = TokenClient::new(&env, &token);
        let balance = client.balance(&env.current_contract_address());
        if balance > 0 {
            client.transfer(&env.current_contract_address(), &to, &balance);
        }
        env.events()
            .publish((Symbol::new(&env, "funds_withdrawn"),), (to, balance));
        Ok(balance)
    }
}

#[contractimpl]
impl AccessControl for UpController {}
