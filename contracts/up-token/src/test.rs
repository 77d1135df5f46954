#![cfg(test)]

use soroban_sdk::{
    contract, contractimpl, contracttype, map, testutils::Address as _, Address, Env, Map, String,
};

use crate::{UpTokenClient, MINT_ROLE};

const ONE: i128 = 1_000_000_000_000_000_000;

// ─── Mock Native Token (auth-free) ──────────────────────────────

#[contracttype]
#[derive(Clone)]
enum MockNativeKey {
    Balances,
}

#[contract]
pub struct MockNativeToken;

#[contractimpl]
impl MockNativeToken {
    pub fn init(env: Env) {
        let balances: Map<Address, i128> = map![&env];
        env.storage().instance().set(&MockNativeKey::Balances, &balances);
    }

    pub fn mint(env: Env, to: Address, amount: i128) {
        let mut balances: Map<Address, i128> =
            env.storage().instance().get(&MockNativeKey::Balances).unwrap();
        let prev = balances.get(to.clone()).unwrap_or(0);
        balances.set(to, prev + amount);
        env.storage().instance().set(&MockNativeKey::Balances, &balances);
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        // No require_auth in mock
        let mut balances: Map<Address, i128> =
            env.storage().instance().get(&MockNativeKey::Balances).unwrap();
        let from_bal = balances.get(from.clone()).unwrap_or(0);
        assert!(from_bal >= amount, "insufficient native balance");
        balances.set(from, from_bal - amount);
        let to_bal = balances.get(to.clone()).unwrap_or(0);
        balances.set(to, to_bal + amount);
        env.storage().instance().set(&MockNativeKey::Balances, &balances);
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        let balances: Map<Address, i128> =
            env.storage().instance().get(&MockNativeKey::Balances).unwrap();
        balances.get(id).unwrap_or(0)
    }
}

// ─── Mock Controller (prices premium mints) ─────────────────────

#[contracttype]
#[derive(Clone)]
enum MockControllerKey {
    Rate,
    Price,
}

#[contract]
pub struct MockController;

#[contractimpl]
impl MockController {
    pub fn init(env: Env, rate: u32, virtual_price: i128) {
        env.storage().instance().set(&MockControllerKey::Rate, &rate);
        env.storage().instance().set(&MockControllerKey::Price, &virtual_price);
    }

    pub fn mint_up(env: Env, caller: Address, _to: Address, value: i128) -> i128 {
        caller.require_auth();
        let price: i128 = env.storage().instance().get(&MockControllerKey::Price).unwrap();
        if price == 0 {
            return 0;
        }
        let rate: u32 = env.storage().instance().get(&MockControllerKey::Rate).unwrap();
        let discounted = value - value * (rate as i128 * 100) / 10_000;
        discounted * ONE / price
    }
}

// ─── Test Helpers ───────────────────────────────────────────────

#[allow(dead_code)]
struct TestEnv {
    env: Env,
    token: UpTokenClient<'static>,
    native: MockNativeTokenClient<'static>,
    admin: Address,
    minter: Address,
    holder: Address,
}

fn setup() -> TestEnv {
    let env = Env::default();
    env.mock_all_auths();

    let native_id = env.register(MockNativeToken, ());
    let native = MockNativeTokenClient::new(&env, &native_id);
    native.init();

    let token_id = env.register(crate::UpToken, ());
    let token = UpTokenClient::new(&env, &token_id);

    let admin = Address::generate(&env);
    let minter = Address::generate(&env);
    let holder = Address::generate(&env);

    token.initialize(&admin, &native_id);
    token.grant_role(&admin, &minter, &MINT_ROLE);

    TestEnv {
        env,
        token,
        native,
        admin,
        minter,
        holder,
    }
}

// ─── Basic Token Tests ──────────────────────────────────────────

#[test]
fn test_initialize_and_metadata() {
    let t = setup();
    assert_eq!(t.token.decimals(), 18);
    assert_eq!(t.token.name(), String::from_str(&t.env, "UP"));
    assert_eq!(t.token.symbol(), String::from_str(&t.env, "UP"));
    assert_eq!(t.token.total_supply(), 0);
    assert_eq!(t.token.total_burnt(), 0);
}

#[test]
#[should_panic(expected = "Already initialized")]
fn test_initialize_twice() {
    let t = setup();
    let other = Address::generate(&t.env);
    t.token.initialize(&other, &other);
}

#[test]
fn test_mint_and_balance() {
    let t = setup();
    t.token.mint(&t.minter, &t.holder, &ONE, &0);
    assert_eq!(t.token.balance(&t.holder), ONE);
    assert_eq!(t.token.total_supply(), ONE);
}

#[test]
#[should_panic(expected = "Error(Contract, #1)")]
fn test_mint_without_role() {
    let t = setup();
    t.token.mint(&t.holder, &t.holder, &ONE, &0);
}

#[test]
#[should_panic(expected = "Error(Contract, #4)")]
fn test_mint_nothing() {
    let t = setup();
    t.token.mint(&t.minter, &t.holder, &0, &0);
}

#[test]
fn test_transfer() {
    let t = setup();
    let recipient = Address::generate(&t.env);
    t.token.mint(&t.minter, &t.holder, &ONE, &0);
    t.token.transfer(&t.holder, &recipient, &ONE);
    assert_eq!(t.token.balance(&recipient), ONE);
    assert_eq!(t.token.balance(&t.holder), 0);
    assert_eq!(t.token.total_supply(), ONE);
}

#[test]
fn test_burn_tracks_total_burnt() {
    let t = setup();
    t.token.mint(&t.minter, &t.holder, &ONE, &0);
    t.token.burn(&t.holder, &ONE);
    assert_eq!(t.token.total_supply(), 0);
    assert_eq!(t.token.total_burnt(), ONE);
    assert_eq!(t.token.balance(&t.holder), 0);
}

#[test]
fn test_burn_from_consumes_allowance() {
    let t = setup();
    let spender = Address::generate(&t.env);
    t.token.mint(&t.minter, &t.holder, &ONE, &0);
    t.token.approve(&t.holder, &spender, &ONE, &200);
    t.token.burn_from(&spender, &t.holder, &ONE);
    assert_eq!(t.token.total_supply(), 0);
    assert_eq!(t.token.total_burnt(), ONE);
    assert_eq!(t.token.allowance(&t.holder, &spender), 0);
}

// ─── Access Control Tests ───────────────────────────────────────

#[test]
fn test_grant_and_check_role() {
    let t = setup();
    let other = Address::generate(&t.env);
    assert!(t.token.has_role(&other, &MINT_ROLE).is_none());
    t.token.grant_role(&t.admin, &other, &MINT_ROLE);
    assert!(t.token.has_role(&other, &MINT_ROLE).is_some());
    t.token.revoke_role(&t.admin, &other, &MINT_ROLE);
    assert!(t.token.has_role(&other, &MINT_ROLE).is_none());
}

#[test]
#[should_panic]
fn test_role_holder_cannot_grant_roles() {
    let t = setup();
    let other = Address::generate(&t.env);
    // minter holds a role but is not the admin
    t.token.grant_role(&t.minter, &other, &MINT_ROLE);
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")]
fn test_set_controller_requires_admin() {
    let t = setup();
    let ctrl = Address::generate(&t.env);
    t.token.set_controller(&t.holder, &ctrl);
}

// ─── Native Forwarding Tests ────────────────────────────────────

#[test]
fn test_mint_forwards_payment_to_controller() {
    let t = setup();
    let ctrl = Address::generate(&t.env);
    t.token.set_controller(&t.admin, &ctrl);
    t.native.mint(&t.minter, &(5 * ONE));

    t.token.mint(&t.minter, &t.holder, &ONE, &(5 * ONE));

    assert_eq!(t.native.balance(&ctrl), 5 * ONE);
    assert_eq!(t.native.balance(&t.minter), 0);
    assert_eq!(t.token.balance(&t.holder), ONE);
}

#[test]
fn test_mint_payment_held_without_controller() {
    let t = setup();
    t.native.mint(&t.minter, &(5 * ONE));

    t.token.mint(&t.minter, &t.holder, &ONE, &(5 * ONE));
    assert_eq!(t.native.balance(&t.token.address), 5 * ONE);

    // Once a controller appears, withdraw_funds forwards the held balance.
    let ctrl = Address::generate(&t.env);
    t.token.set_controller(&t.admin, &ctrl);
    assert_eq!(t.token.withdraw_funds(), 5 * ONE);
    assert_eq!(t.native.balance(&ctrl), 5 * ONE);
    assert_eq!(t.native.balance(&t.token.address), 0);
}

#[test]
#[should_panic(expected = "Error(Contract, #3)")]
fn test_withdraw_funds_requires_controller() {
    let t = setup();
    t.token.withdraw_funds();
}

// ─── Premium Mint Path ──────────────────────────────────────────

#[test]
fn test_mint_backed_prices_through_controller() {
    let t = setup();
    let ctrl_id = t.env.register(MockController, ());
    let ctrl = MockControllerClient::new(&t.env, &ctrl_id);
    // 5% rate, virtual price 2.5
    ctrl.init(&5, &2_500_000_000_000_000_000);
    t.token.set_controller(&t.admin, &ctrl_id);

    t.native.mint(&t.holder, &(100 * ONE));
    let minted = t.token.mint_backed(&t.holder, &t.holder, &(100 * ONE));

    // (100 - 5%) / 2.5 = 38
    assert_eq!(minted, 38 * ONE);
    assert_eq!(t.token.balance(&t.holder), 38 * ONE);
    assert_eq!(t.token.total_supply(), 38 * ONE);
    assert_eq!(t.native.balance(&ctrl_id), 100 * ONE);
}

#[test]
fn test_mint_backed_zero_price_mints_nothing() {
    let t = setup();
    let ctrl_id = t.env.register(MockController, ());
    let ctrl = MockControllerClient::new(&t.env, &ctrl_id);
    ctrl.init(&5, &0);
    t.token.set_controller(&t.admin, &ctrl_id);

    t.native.mint(&t.holder, &ONE);
    let minted = t.token.mint_backed(&t.holder, &t.holder, &ONE);
    assert_eq!(minted, 0);
    assert_eq!(t.token.total_supply(), 0);
}

#[test]
#[should_panic(expected = "Error(Contract, #3)")]
fn test_mint_backed_requires_controller() {
    let t = setup();
    t.native.mint(&t.holder, &ONE);
    t.token.mint_backed(&t.holder, &t.holder, &ONE);
}
