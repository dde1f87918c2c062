//! Event payloads and publish helpers.
//!
//! Off-chain watchers consume these with at-least-once semantics: the
//! monitoring side keys alerts on the event kind (first topic) and the
//! operator bot correlates lifecycle steps by uuid. Payload structs are
//! `#[contracttype]` so tests and consumers can decode them with
//! `try_into_val`.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub manager: Address,
    pub bot: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositEvent {
    pub user: Address,
    pub amount: i128,
    pub amount_in_stake_token: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardsAddedEvent {
    pub reward_id: u64,
    pub amount: i128,
}

/// Funds left toward the validator chain (initial attempt or manager retry).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferOutEvent {
    pub uuid: u64,
    pub amount: i128,
}

/// Delegation confirmed staked on the validator chain.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DelegateEvent {
    pub uuid: u64,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestWithdrawEvent {
    pub user: Address,
    pub amount_in_stake_token: i128,
}

/// Undelegation batch created: escrow burned, base amount owed fixed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StartUndelegationEvent {
    pub uuid: u64,
    pub amount: i128,
    pub amount_in_stake_token: i128,
}

/// Bot confirmed the unstake was initiated on the validator chain.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UndelegationStartedEvent {
    pub uuid: u64,
}

/// Undelegation completed: exact funds arrived, requests now claimable.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UndelegateEvent {
    pub uuid: u64,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimWithdrawalEvent {
    pub user: Address,
    pub index: u32,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposeManagerEvent {
    pub candidate: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetManagerEvent {
    pub manager: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetBotEvent {
    pub bot: Address,
}

pub fn publish_initialized(env: &Env, admin: Address, manager: Address, bot: Address) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            admin,
            manager,
            bot,
        },
    );
}

pub fn publish_deposit(env: &Env, user: Address, amount: i128, amount_in_stake_token: i128) {
    env.events().publish(
        (symbol_short!("DEPOSIT"), user.clone()),
        DepositEvent {
            user,
            amount,
            amount_in_stake_token,
        },
    );
}

pub fn publish_rewards_added(env: &Env, reward_id: u64, amount: i128) {
    env.events().publish(
        (symbol_short!("REWARDS"),),
        RewardsAddedEvent { reward_id, amount },
    );
}

pub fn publish_transfer_out(env: &Env, uuid: u64, amount: i128) {
    env.events().publish(
        (symbol_short!("XFER_OUT"),),
        TransferOutEvent { uuid, amount },
    );
}

pub fn publish_delegate(env: &Env, uuid: u64, amount: i128) {
    env.events()
        .publish((symbol_short!("DELEGATE"),), DelegateEvent { uuid, amount });
}

pub fn publish_request_withdraw(env: &Env, user: Address, amount_in_stake_token: i128) {
    env.events().publish(
        (symbol_short!("REQ_WD"), user.clone()),
        RequestWithdrawEvent {
            user,
            amount_in_stake_token,
        },
    );
}

pub fn publish_start_undelegation(env: &Env, uuid: u64, amount: i128, amount_in_stake_token: i128) {
    env.events().publish(
        (symbol_short!("UNDEL_ST"),),
        StartUndelegationEvent {
            uuid,
            amount,
            amount_in_stake_token,
        },
    );
}

pub fn publish_undelegation_started(env: &Env, uuid: u64) {
    env.events().publish(
        (symbol_short!("UNDEL_CF"),),
        UndelegationStartedEvent { uuid },
    );
}

pub fn publish_undelegate(env: &Env, uuid: u64, amount: i128) {
    env.events().publish(
        (symbol_short!("UNDELEG"),),
        UndelegateEvent { uuid, amount },
    );
}

pub fn publish_claim_withdrawal(env: &Env, user: Address, index: u32, amount: i128) {
    env.events().publish(
        (symbol_short!("CLAIM"), user.clone()),
        ClaimWithdrawalEvent {
            user,
            index,
            amount,
        },
    );
}

pub fn publish_propose_manager(env: &Env, candidate: Address) {
    env.events().publish(
        (symbol_short!("PROP_MGR"), candidate.clone()),
        ProposeManagerEvent { candidate },
    );
}

pub fn publish_set_manager(env: &Env, manager: Address) {
    env.events().publish(
        (symbol_short!("SET_MGR"), manager.clone()),
        SetManagerEvent { manager },
    );
}

pub fn publish_set_bot(env: &Env, bot: Address) {
    env.events()
        .publish((symbol_short!("SET_BOT"), bot.clone()), SetBotEvent { bot });
}
