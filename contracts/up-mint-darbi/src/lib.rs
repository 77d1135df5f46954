#![no_std]

//! Mint module for the arbitrage engine: UP at the exact virtual price, no
//! discount, gated to the darbi role. The native payment lands in the
//! controller's backing, so minting here leaves the virtual price intact
//! up to truncation dust.

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, token::TokenClient,
    Address, Env, IntoVal, Symbol, Val, Vec,
};
use stellar_access::access_control::{self as access_control, AccessControl};
use swap_math::{mul_div, SCALE};

const TTL_THRESHOLD: u32 = 17_280;
const TTL_EXTEND_TO: u32 = 518_400;

/// Accounts allowed to mint through this module.
pub const DARBI_ROLE: Symbol = symbol_short!("darbi");

// ─── Storage Keys ────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    UpToken,
    Controller,
    NativeToken,
    Initialized,
}

// ─── Errors ──────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum MintDarbiError {
    OnlyAdmin = 1,
    OnlyDarbi = 2,
    InvalidPayableAmount = 3,
    UpPrice0 = 4,
}

// ─── Contract ────────────────────────────────────────────────────

#[contract]
pub struct UpMintDarbi;

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

#[contractimpl]
impl UpMintDarbi {
    pub fn initialize(env: Env, admin: Address, up_token: Address, controller: Address, native_token: Address) {
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
            .set(&DataKey::Controller, &controller);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage().instance().set(&DataKey::Initialized, &true);
    }

    pub fn controller(env: Env) -> Address {
        controller(&env)
    }

    /// Pays `value` native into the controller and mints UP to the caller
    /// at the current virtual price, one for one in value terms.
    pub fn mint_up(env: Env, caller: Address, value: i128) -> Result<i128, MintDarbiError> {
        caller.require_auth();
        if access_control::has_role(&env, &caller, &DARBI_ROLE).is_none() {
            return Err(MintDarbiError::OnlyDarbi);
        }
        if value <= 0 {
            return Err(MintDarbiError::InvalidPayableAmount);
        }
        let price = get_virtual_price(&env);
        if price == 0 {
            return Err(MintDarbiError::UpPrice0);
        }
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        let native: Address = env
            .storage()
            .instance()
            .get(&DataKey::NativeToken)
            .expect("Native token not set");
        TokenClient::new(&env, &native).transfer(&caller, &controller(&env), &value);

        let minted = mul_div(&env, value, SCALE, price);

        let up: Address = env
            .storage()
            .instance()
            .get(&DataKey::UpToken)
            .expect("UP token not set");
        let mut args: Vec<Val> = Vec::new(&env);
        args.push_back(env.current_contract_address().into_val(&env));
        args.push_back(caller.clone().into_val(&env));
        args.push_back(minted.into_val(&env));
        args.push_back(0i128.into_val(&env));
        env.invoke_contract::<Val>(&up, &Symbol::new(&env, "mint"), args);

        env.events().publish(
            (Symbol::new(&env, "darbi_mint"),),
            (caller, minted, price, value),
        );
        Ok(minted)
    }

    pub fn update_controller(env: Env, caller: Address, controller: Address) -> Result<(), MintDarbiError> {
        caller.require_auth();
        if access_control::get_admin(&env) != Some(caller) {
            return Err(MintDarbiError::OnlyAdmin);
        }
        env.storage()
            .instance()
            .set(&DataKey::Controller, &controller);
        env.events()
            .publish((Symbol::new(&env, "controller_updated"),), controller);
        Ok(())
    }
}

#[contractimpl]
impl AccessControl for UpMintDarbi {}

// tests
#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{contractimpl, map, testutils::Address as _, Map};

    const ONE: i128 = 1_000_000_000_000_000_000;

    #[contracttype]
    #[derive(Clone)]
    enum MockControllerKey {
        Price,
    }

    #[contract]
    pub struct MockController;

    #[contractimpl]
    impl MockController {
        pub fn init(env: Env, price: i128) {
            env.storage().instance().set(&MockControllerKey::Price, &price);
        }

        pub fn get_virtual_price(env: Env) -> i128 {
            env.storage().instance().get(&MockControllerKey::Price).unwrap_or(0)
        }
    }

    #[contracttype]
    #[derive(Clone)]
    enum MockTokenKey {
        Balances,
    }

    #[contract]
    pub struct MockToken;

    #[contractimpl]
    impl MockToken {
        pub fn init(env: Env) {
            let balances: Map<Address, i128> = map![&env];
            env.storage().instance().set(&MockTokenKey::Balances, &balances);
        }

        pub fn mint(env: Env, _caller: Address, to: Address, amount: i128, _payable_value: i128) {
            Self::credit(env, to, amount);
        }

        pub fn credit(env: Env, to: Address, amount: i128) {
            let mut balances: Map<Address, i128> =
                env.storage().instance().get(&MockTokenKey::Balances).unwrap();
            let prev = balances.get(to.clone()).unwrap_or(0);
            balances.set(to, prev + amount);
            env.storage().instance().set(&MockTokenKey::Balances, &balances);
        }

        pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
            // No require_auth in mock
            let mut balances: Map<Address, i128> =
                env.storage().instance().get(&MockTokenKey::Balances).unwrap();
            let from_bal = balances.get(from.clone()).unwrap_or(0);
            assert!(from_bal >= amount, "insufficient balance");
            balances.set(from, from_bal - amount);
            let to_bal = balances.get(to.clone()).unwrap_or(0);
            balances.set(to, to_bal + amount);
            env.storage().instance().set(&MockTokenKey::Balances, &balances);
        }

        pub fn balance(env: Env, id: Address) -> i128 {
            let balances: Map<Address, i128> =
                env.storage().instance().get(&MockTokenKey::Balances).unwrap();
            balances.get(id).unwrap_or(0)
        }
    }

    #[allow(dead_code)]
    struct TestEnv {
        env: Env,
        minter: UpMintDarbiClient<'static>,
        controller_id: Address,
        up: MockTokenClient<'static>,
        native: MockTokenClient<'static>,
        admin: Address,
        darbi: Address,
    }

    fn setup(price: i128) -> TestEnv {
        let env = Env::default();
        env.mock_all_auths();

        let controller_id = env.register(MockController, ());
        MockControllerClient::new(&env, &controller_id).init(&price);

        let up_id = env.register(MockToken, ());
        let up = MockTokenClient::new(&env, &up_id);
        up.init();

        let native_id = env.register(MockToken, ());
        let native = MockTokenClient::new(&env, &native_id);
        native.init();

        let minter_id = env.register(UpMintDarbi, ());
        let minter = UpMintDarbiClient::new(&env, &minter_id);

        let admin = Address::generate(&env);
        let darbi = Address::generate(&env);

        minter.initialize(&admin, &up_id, &controller_id, &native_id);
        minter.grant_role(&admin, &darbi, &DARBI_ROLE);

        TestEnv {
            env,
            minter,
            controller_id,
            up,
            native,
            admin,
            darbi,
        }
    }

    #[test]
    fn test_mint_at_virtual_price() {
        let t = setup(2_500_000_000_000_000_000);
        t.native.credit(&t.darbi, &(5 * ONE));

        let minted = t.minter.mint_up(&t.darbi, &(5 * ONE));

        // 5 native at 2.5 per UP = 2 UP
        assert_eq!(minted, 2 * ONE);
        assert_eq!(t.up.balance(&t.darbi), 2 * ONE);
        assert_eq!(t.native.balance(&t.controller_id), 5 * ONE);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #2)")]
    fn test_mint_requires_darbi_role() {
        let t = setup(2_500_000_000_000_000_000);
        let outsider = Address::generate(&t.env);
        t.minter.mint_up(&outsider, &ONE);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #3)")]
    fn test_mint_zero_value() {
        let t = setup(2_500_000_000_000_000_000);
        t.minter.mint_up(&t.darbi, &0);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #4)")]
    fn test_mint_undefined_price() {
        let t = setup(0);
        t.native.credit(&t.darbi, &ONE);
        t.minter.mint_up(&t.darbi, &ONE);
    }

    #[test]
    fn test_grant_and_revoke_darbi_role() {
        let t = setup(ONE);
        let other = Address::generate(&t.env);
        assert!(t.minter.has_role(&other, &DARBI_ROLE).is_none());
        t.minter.grant_role(&t.admin, &other, &DARBI_ROLE);
        assert!(t.minter.has_role(&other, &DARBI_ROLE).is_some());
        t.minter.revoke_role(&t.admin, &other, &DARBI_ROLE);
        assert!(t.minter.has_role(&other, &DARBI_ROLE).is_none());
    }

    #[test]
    fn test_update_controller() {
        let t = setup(ONE);
        let other = Address::generate(&t.env);
        t.minter.update_controller(&t.admin, &other);
        assert_eq!(t.minter.controller(), other);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1)")]
    fn test_update_controller_requires_admin() {
        let t = setup(ONE);
        let other = Address::generate(&t.env);
        t.minter.update_controller(&t.darbi, &other);
    }
}
