#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, token::TokenClient,
    token::TokenInterface, Address, Env, IntoVal, MuxedAddress, String, Symbol, Val, Vec,
};
use stellar_access::access_control::{self as access_control, AccessControl};
use stellar_tokens::fungible::Base;

#[cfg(test)]
mod test;

// TTL constants: extend instance storage proactively to prevent archival
const TTL_THRESHOLD: u32 = 17_280; // ~1 day at 5s/ledger
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

/// Accounts holding this role may call `mint`.
pub const MINT_ROLE: Symbol = symbol_short!("minter");

// ─── Storage Keys ────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    NativeToken,
    Controller,
    TotalBurnt,
    Initialized,
}

// ─── Errors ──────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum UpTokenError {
    OnlyMint = 1,
    OnlyAdmin = 2,
    NoControllerSet = 3,
    InvalidAmount = 4,
}

// ─── Contract ────────────────────────────────────────────────────

#[contract]
pub struct UpToken;

// ─── Helpers ─────────────────────────────────────────────────────

fn has_role(env: &Env, account: &Address, role: &Symbol) -> bool {
    access_control::has_role(env, account, role).is_some()
}

fn controller(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::Controller)
}

fn native_client(env: &Env) -> TokenClient<'_> {
    let native: Address = env
        .storage()
        .instance()
        .get(&DataKey::NativeToken)
        .expect("Native token not set");
    TokenClient::new(env, &native)
}

fn add_burnt(env: &Env, amount: i128) {
    let total: i128 = env
        .storage()
        .instance()
        .get(&DataKey::TotalBurnt)
        .unwrap_or(0);
    env.storage()
        .instance()
        .set(&DataKey::TotalBurnt, &(total + amount));
}

// ─── SEP-41 Token Interface ──────────────────────────────────────

#[contractimpl]
impl TokenInterface for UpToken {
    fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        Base::allowance(&env, &from, &spender)
    }

    fn approve(env: Env, from: Address, spender: Address, amount: i128, expiration_ledger: u32) {
        Base::approve(&env, &from, &spender, amount, expiration_ledger);
    }

    fn balance(env: Env, id: Address) -> i128 {
        Base::balance(&env, &id)
    }

    fn transfer(env: Env, from: Address, to: MuxedAddress, amount: i128) {
        Base::transfer(&env, &from, &to, amount);
    }

    fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        Base::transfer_from(&env, &spender, &from, &to, amount);
    }

    fn burn(env: Env, from: Address, amount: i128) {
        Base::burn(&env, &from, amount);
        add_burnt(&env, amount);
    }

    fn burn_from(env: Env, spender: Address, from: Address, amount: i128) {
        Base::burn_from(&env, &spender, &from, amount);
        add_burnt(&env, amount);
    }

    fn decimals(env: Env) -> u32 {
        Base::decimals(&env)
    }

    fn name(env: Env) -> String {
        Base::name(&env)
    }

    fn symbol(env: Env) -> String {
        Base::symbol(&env)
    }
}

// Role surface: grant/revoke restricted to the admin. A role holder
// without admin cannot grant or revoke anything, itself included.
#[contractimpl]
impl AccessControl for UpToken {}

// ─── UP-Specific Functions ───────────────────────────────────────

#[contractimpl]
impl UpToken {
    pub fn initialize(env: Env, admin: Address, native_token: Address) {
        let already: bool = env
            .storage()
            .instance()
            .get(&DataKey::Initialized)
            .unwrap_or(false);
        assert!(!already, "Already initialized");

        access_control::set_admin(&env, &admin);
        Base::set_metadata(&env, 18, String::from_str(&env, "UP"), String::from_str(&env, "UP"));

        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage().instance().set(&DataKey::TotalBurnt, &0i128);
        env.storage().instance().set(&DataKey::Initialized, &true);
    }

    /// Total token supply (not part of TokenInterface but commonly expected).
    pub fn total_supply(env: Env) -> i128 {
        Base::total_supply(&env)
    }

    /// Cumulative amount destroyed through burn/burn_from.
    pub fn total_burnt(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalBurnt)
            .unwrap_or(0)
    }

    /// Mint role holders create new supply. Any attached native payment is
    /// forwarded to the controller when one is set; without a controller the
    /// payment stays on this contract until `withdraw_funds`.
    pub fn mint(
        env: Env,
        caller: Address,
        to: Address,
        amount: i128,
        payable_value: i128,
    ) -> Result<(), UpTokenError> {
        caller.require_auth();
        if !has_role(&env, &caller, &MINT_ROLE) {
            return Err(UpTokenError::OnlyMint);
        }
        if amount < 0 || payable_value < 0 || (amount == 0 && payable_value == 0) {
            return Err(UpTokenError::InvalidAmount);
        }
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        if amount > 0 {
            Base::update(&env, None, Some(&to), amount);
        }

        if payable_value > 0 {
            let native = native_client(&env);
            match controller(&env) {
                Some(ctrl) => native.transfer(&caller, &ctrl, &payable_value),
                None => native.transfer(&caller, &env.current_contract_address(), &payable_value),
            }
        }

        env.events()
            .publish((Symbol::new(&env, "mint"),), (to, amount, payable_value));
        Ok(())
    }

    /// Premium mint path: pays `value` native into the controller's backing
    /// and mints whatever the controller prices it at (its mint rate applied
    /// to the live virtual price).
    pub fn mint_backed(
        env: Env,
        from: Address,
        to: Address,
        value: i128,
    ) -> Result<i128, UpTokenError> {
        from.require_auth();
        if value <= 0 {
            return Err(UpTokenError::InvalidAmount);
        }
        let ctrl = controller(&env).ok_or(UpTokenError::NoControllerSet)?;
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        native_client(&env).transfer(&from, &ctrl, &value);

        // The controller prices the payment; the supply change happens here.
        let mut args: Vec<Val> = Vec::new(&env);
        args.push_back(env.current_contract_address().into_val(&env));
        args.push_back(to.clone().into_val(&env));
        args.push_back(value.into_val(&env));
        let minted: i128 = env.invoke_contract(&ctrl, &Symbol::new(&env, "mint_up"), args);

        if minted > 0 {
            Base::update(&env, None, Some(&to), minted);
        }

        env.events()
            .publish((Symbol::new(&env, "mint"),), (to, minted, value));
        Ok(minted)
    }

    pub fn set_controller(env: Env, caller: Address, controller: Address) -> Result<(), UpTokenError> {
        caller.require_auth();
        if access_control::get_admin(&env) != Some(caller) {
            return Err(UpTokenError::OnlyAdmin);
        }
        env.storage()
            .instance()
            .set(&DataKey::Controller, &controller);
        env.events()
            .publish((Symbol::new(&env, "controller_updated"),), controller);
        Ok(())
    }

    pub fn controller(env: Env) -> Option<Address> {
        controller(&env)
    }

    /// Forwards any native balance sitting on this contract to the controller.
    pub fn withdraw_funds(env: Env) -> Result<i128, UpTokenError> {
        let ctrl = controller(&env).ok_or(UpTokenError::NoControllerSet)?;
        let native = native_client(&env);
        let balance = native.balance(&env.current_contract_address());
        if balance > 0 {
            native.transfer(&env.current_contract_address(), &ctrl, &balance);
        }
        env.events()
            .publish((Symbol::new(&env, "funds_withdrawn"),), (ctrl, balance));
        Ok(balance)
    }
}
