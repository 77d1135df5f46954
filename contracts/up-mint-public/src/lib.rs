#![no_std]

//! Public premium mint for UP.
//!
//! Anyone may pay native into the controller's backing and receive UP at a
//! discount to the live virtual price. The discount applies to the paid-in
//! value: paying V mints (V - V*rate%) / virtualPrice. Pausable, with the
//! rate bounded to [1, 100] percent.

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, token::TokenClient,
    Address, Env, IntoVal, Symbol, Val, Vec,
};
use stellar_access::access_control::{self as access_control, AccessControl};
use stellar_contract_utils::pausable::{self, Pausable};
use stellar_macros::when_not_paused;
use swap_math::{mul_div, SCALE};

// TTL constants: extend instance storage proactively to prevent archival
const TTL_THRESHOLD: u32 = 17_280; // ~1 day at 5s/ledger
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

// ─── Storage Keys ────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    UpToken,
    Controller,
    NativeToken,
    MintRate,
    Initialized,
}

// ─── Errors ──────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum MintPublicError {
    OnlyAdmin = 1,
    InvalidPayableAmount = 2,
    UpPrice0 = 3,
    MintRateGt100 = 4,
    MintRateEq0 = 5,
}

// ─── Contract ────────────────────────────────────────────────────

#[contract]
pub struct UpMintPublic;

// ─── Helpers ─────────────────────────────────────────────────────

fn require_admin(env: &Env, caller: &Address) -> Result<(), MintPublicError> {
    caller.require_auth();
    if access_control::get_admin(env) != Some(caller.clone()) {
        return Err(MintPublicError::OnlyAdmin);
    }
    Ok(())
}

fn controller(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Controller)
        .expect("Controller not set")
}

fn get_virtual_price(env: &Env) -> i128 {
    env.invoke_contract(
        &controller(env),
        &Symbol::new(env, "get_virtual_price"),
        Vec::new(env),
    )
}

// ─── Implementation ──────────────────────────────────────────────

#[contractimpl]
impl UpMintPublic {
    pub fn initialize(
        env: Env,
        admin: Address,
        up_token: Address,
        controller: Address,
        native_token: Address,
        mint_rate: u32,
    ) {
        let already: bool = env
            .storage()
            .instance()
            .get(&DataKey::Initialized)
            .unwrap_or(false);
        assert!(!already, "Already initialized");
        assert!(mint_rate >= 1 && mint_rate <= 100, "Invalid mint rate");

        access_control::set_admin(&env, &admin);
        env.storage().instance().set(&DataKey::UpToken, &up_token);
        env.storage()
            .instance()
            .set(&DataKey::Controller, &controller);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage().instance().set(&DataKey::MintRate, &mint_rate);
        env.storage().instance().set(&DataKey::Initialized, &true);
    }

    pub fn mint_rate(env: Env) -> u32 {
        env.storage().instance().get(&DataKey::MintRate).unwrap_or(0)
    }

    pub fn controller(env: Env) -> Address {
        controller(&env)
    }

    /// Pays `value` native into the controller and mints the discounted
    /// amount of UP to `to`. Rejects a zero payment and an unpriced system
    /// (virtual price zero means there is no backing to mint against yet).
    #[when_not_paused]
    pub fn mint_up(
        env: Env,
        from: Address,
        to: Address,
        value: i128,
    ) -> Result<i128, MintPublicError> {
        from.require_auth();
        if value <= 0 {
            return Err(MintPublicError::InvalidPayableAmount);
        }
        let price = get_virtual_price(&env);
        if price == 0 {
            return Err(MintPublicError::UpPrice0);
        }
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        // Backing rises first, then supply.
        let native: Address = env
            .storage()
            .instance()
            .get(&DataKey::NativeToken)
            .expect("Native token not set");
        TokenClient::new(&env, &native).transfer(&from, &controller(&env), &value);

        let rate = Self::mint_rate(env.clone()) as i128;
        let discounted = value - mul_div(&env, value, rate * 100, 10_000);
        let minted = mul_div(&env, discounted, SCALE, price);

        let up: Address = env
            .storage()
            .instance()
            .get(&DataKey::UpToken)
            .expect("UP token not set");
        let mut args: Vec<Val> = Vec::new(&env);
        args.push_back(env.current_contract_address().into_val(&env));
        args.push_back(to.clone().into_val(&env));
        args.push_back(minted.into_val(&env));
        args.push_back(0i128.into_val(&env));
        env.invoke_contract::<Val>(&up, &Symbol::new(&env, "mint"), args);

        env.events().publish(
            (Symbol::new(&env, "premium_mint"),),
            (to, minted, price, value),
        );
        Ok(minted)
    }

    pub fn set_mint_rate(env: Env, caller: Address, rate: u32) -> Result<(), MintPublicError> {
        require_admin(&env, &caller)?;
        if rate > 100 {
            return Err(MintPublicError::MintRateGt100);
        }
        if rate == 0 {
            return Err(MintPublicError::MintRateEq0);
        }
        env.storage().instance().set(&DataKey::MintRate, &rate);
        env.events()
            .publish((Symbol::new(&env, "mint_rate_updated"),), rate);
        Ok(())
    }

    pub fn update_controller(env: Env, caller: Address, controller: Address) -> Result<(), MintPublicError> {
        require_admin(&env, &caller)?;
        env.storage()
            .instance()
            .set(&DataKey::Controller, &controller);
        env.events()
            .publish((Symbol::new(&env, "controller_updated"),), controller);
        Ok(())
    }
}

// Pausable (admin-only)
#[contractimpl]
impl Pausable for UpMintPublic {
    fn pause(e: &Env, caller: Address) {
        caller.require_auth();
        if access_control::get_admin(e) != Some(caller) {
            panic_with_error!(e, MintPublicError::OnlyAdmin);
        }
        pausable::pause(e);
    }

    fn unpause(e: &Env, caller: Address) {
        caller.require_auth();
        if access_control::get_admin(e) != Some(caller) {
            panic_with_error!(e, MintPublicError::OnlyAdmin);
        }
        pausable::unpause(e);
    }
}

#[contractimpl]
impl AccessControl for UpMintPublic {}
