//! Role storage and checks.
//!
//! Three fixed roles guard the ledger: `admin` administers roles and nothing
//! else, `manager` owns recovery paths and can hand itself over in two
//! phases, `bot` drives the delegation and undelegation lifecycles. Every
//! gated entry point calls [`require_role`] before touching any state.

use soroban_sdk::{symbol_short, Address, Env, Symbol};

use crate::types::StakeError;

const ADMIN: Symbol = symbol_short!("ADMIN");
const MANAGER: Symbol = symbol_short!("MANAGER");
const BOT: Symbol = symbol_short!("BOT");
const PROP_MGR: Symbol = symbol_short!("PROP_MGR");

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Admin,
    Manager,
    Bot,
}

fn key(role: Role) -> Symbol {
    match role {
        Role::Admin => ADMIN,
        Role::Manager => MANAGER,
        Role::Bot => BOT,
    }
}

pub fn set_role(env: &Env, role: Role, addr: &Address) {
    env.storage().instance().set(&key(role), addr);
}

pub fn get_role(env: &Env, role: Role) -> Result<Address, StakeError> {
    env.storage()
        .instance()
        .get(&key(role))
        .ok_or(StakeError::NotInitialized)
}

/// Authenticate `caller` and check it holds `role`.
pub fn require_role(env: &Env, caller: &Address, role: Role) -> Result<(), StakeError> {
    caller.require_auth();
    if *caller != get_role(env, role)? {
        return Err(StakeError::Unauthorized);
    }
    Ok(())
}

pub fn set_proposed_manager(env: &Env, addr: &Address) {
    env.storage().instance().set(&PROP_MGR, addr);
}

pub fn get_proposed_manager(env: &Env) -> Option<Address> {
    env.storage().instance().get(&PROP_MGR)
}

pub fn clear_proposed_manager(env: &Env) {
    env.storage().instance().remove(&PROP_MGR);
}
