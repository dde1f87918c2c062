#![no_std]

use soroban_sdk::{contract, contractimpl, symbol_short, Address, Env, String, Symbol};

/// Storage keys
const ADMIN: Symbol = symbol_short!("ADMIN");
const STAKE_MGR: Symbol = symbol_short!("STK_MGR");
const INITIALIZED: Symbol = symbol_short!("INIT");
const SUPPLY: Symbol = symbol_short!("SUPPLY");

const BAL: Symbol = symbol_short!("BAL");
const BAL_TTL_THRESHOLD: u32 = 1_036_800;
const BAL_TTL_EXTEND_TO: u32 = 2_073_600;

const DECIMALS: u32 = 7;

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum TokenError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidAmount = 4,
    InsufficientBalance = 5,
}

fn read_balance(env: &Env, addr: &Address) -> i128 {
    let key = (BAL, addr.clone());
    env.storage().persistent().get(&key).unwrap_or(0)
}

fn write_balance(env: &Env, addr: &Address, amount: i128) {
    let key = (BAL, addr.clone());
    env.storage().persistent().set(&key, &amount);
    env.storage()
        .persistent()
        .extend_ttl(&key, BAL_TTL_THRESHOLD, BAL_TTL_EXTEND_TO);
}

fn read_supply(env: &Env) -> i128 {
    env.storage().instance().get(&SUPPLY).unwrap_or(0)
}

/// Liquid-staking receipt token.
///
/// A deliberately small fungible ledger: minting and burning are reserved for
/// the stake manager contract, holders can transfer, and the total supply is
/// queryable (the stake manager's exchange rate depends on it). Allowances
/// are not part of this ledger; the stake manager escrows via a direct
/// holder-authorized transfer.
#[contract]
pub struct StakeToken;

#[contractimpl]
impl StakeToken {
    /// Initialize the token with an administrator.
    pub fn initialize(env: Env, admin: Address) -> Result<(), TokenError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(TokenError::AlreadyInitialized);
        }

        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&INITIALIZED, &true);

        Ok(())
    }

    /// Point the token at the stake manager allowed to mint and burn.
    pub fn set_stake_manager(
        env: Env,
        caller: Address,
        stake_manager: Address,
    ) -> Result<(), TokenError> {
        caller.require_auth();
        let admin: Address = env
            .storage()
            .instance()
            .get(&ADMIN)
            .ok_or(TokenError::NotInitialized)?;
        if caller != admin {
            return Err(TokenError::Unauthorized);
        }

        env.storage().instance().set(&STAKE_MGR, &stake_manager);

        env.events()
            .publish((symbol_short!("SET_MGR"), stake_manager), ());

        Ok(())
    }

    /// Mint new tokens to `to`. Stake-manager only.
    pub fn mint(env: Env, to: Address, amount: i128) -> Result<(), TokenError> {
        let stake_manager: Address = env
            .storage()
            .instance()
            .get(&STAKE_MGR)
            .ok_or(TokenError::NotInitialized)?;
        stake_manager.require_auth();

        if amount <= 0 {
            return Err(TokenError::InvalidAmount);
        }

        write_balance(&env, &to, read_balance(&env, &to) + amount);
        env.storage()
            .instance()
            .set(&SUPPLY, &(read_supply(&env) + amount));

        env.events().publish((symbol_short!("MINT"), to), amount);

        Ok(())
    }

    /// Burn tokens held by `from`. Stake-manager only.
    pub fn burn(env: Env, from: Address, amount: i128) -> Result<(), TokenError> {
        let stake_manager: Address = env
            .storage()
            .instance()
            .get(&STAKE_MGR)
            .ok_or(TokenError::NotInitialized)?;
        stake_manager.require_auth();

        if amount <= 0 {
            return Err(TokenError::InvalidAmount);
        }
        let balance = read_balance(&env, &from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance);
        }

        write_balance(&env, &from, balance - amount);
        env.storage()
            .instance()
            .set(&SUPPLY, &(read_supply(&env) - amount));

        env.events().publish((symbol_short!("BURN"), from), amount);

        Ok(())
    }

    /// Move tokens between holders. Requires `from`'s authorization.
    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), TokenError> {
        from.require_auth();

        if amount <= 0 {
            return Err(TokenError::InvalidAmount);
        }
        let from_balance = read_balance(&env, &from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance);
        }

        write_balance(&env, &from, from_balance - amount);
        write_balance(&env, &to, read_balance(&env, &to) + amount);

        env.events()
            .publish((symbol_short!("TRANSFER"), from, to), amount);

        Ok(())
    }

    pub fn balance(env: Env, addr: Address) -> i128 {
        read_balance(&env, &addr)
    }

    pub fn total_supply(env: Env) -> i128 {
        read_supply(&env)
    }

    pub fn decimals() -> u32 {
        DECIMALS
    }

    pub fn name(env: Env) -> String {
        String::from_str(&env, "Staked Lumen")
    }

    pub fn symbol(env: Env) -> String {
        String::from_str(&env, "stXLM")
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;
    use soroban_sdk::testutils::Address as _;

    fn setup(env: &Env) -> (StakeTokenClient<'_>, Address, Address) {
        let contract_id = env.register(StakeToken, ());
        let client = StakeTokenClient::new(env, &contract_id);

        let admin = Address::generate(env);
        let stake_manager = Address::generate(env);
        client.initialize(&admin);
        client.set_stake_manager(&admin, &stake_manager);

        (client, admin, stake_manager)
    }

    #[test]
    fn initialize_only_once() {
        let env = Env::default();
        env.mock_all_auths();

        let (client, admin, _) = setup(&env);
        assert_eq!(
            client.try_initialize(&admin),
            Err(Ok(TokenError::AlreadyInitialized))
        );
    }

    #[test]
    fn mint_transfer_burn_roundtrip() {
        let env = Env::default();
        env.mock_all_auths();

        let (client, _, _) = setup(&env);
        let alice = Address::generate(&env);
        let bob = Address::generate(&env);

        client.mint(&alice, &1_000);
        assert_eq!(client.balance(&alice), 1_000);
        assert_eq!(client.total_supply(), 1_000);

        client.transfer(&alice, &bob, &400);
        assert_eq!(client.balance(&alice), 600);
        assert_eq!(client.balance(&bob), 400);
        assert_eq!(client.total_supply(), 1_000);

        client.burn(&bob, &400);
        assert_eq!(client.balance(&bob), 0);
        assert_eq!(client.total_supply(), 600);
    }

    #[test]
    fn transfer_rejects_overdraw_and_zero() {
        let env = Env::default();
        env.mock_all_auths();

        let (client, _, _) = setup(&env);
        let alice = Address::generate(&env);
        let bob = Address::generate(&env);

        client.mint(&alice, &100);
        assert_eq!(
            client.try_transfer(&alice, &bob, &0),
            Err(Ok(TokenError::InvalidAmount))
        );
        assert_eq!(
            client.try_transfer(&alice, &bob, &101),
            Err(Ok(TokenError::InsufficientBalance))
        );
    }

    #[test]
    fn set_stake_manager_is_admin_gated() {
        let env = Env::default();
        env.mock_all_auths();

        let (client, _, _) = setup(&env);
        let mallory = Address::generate(&env);
        assert_eq!(
            client.try_set_stake_manager(&mallory, &mallory),
            Err(Ok(TokenError::Unauthorized))
        );
    }
}
