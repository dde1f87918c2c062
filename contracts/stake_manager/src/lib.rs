#![no_std]

pub mod events;
pub mod rate;
pub mod types;

mod access;

use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env, Symbol, Vec};

use access::Role;
use types::{BotDelegateRequest, BotUndelegateRequest, StakeError, WithdrawalRequest, WithdrawalStatus};

/// Instance-storage keys
const INITIALIZED: Symbol = symbol_short!("INIT");
const BASE_TOKEN: Symbol = symbol_short!("BASE_TOK");
const STAKE_TOKEN: Symbol = symbol_short!("STK_TOK");
const DEPOSIT_WALLET: Symbol = symbol_short!("DEP_WALL");
const MIN_RELAY_FEE: Symbol = symbol_short!("RELAY_FEE");

/// Ledger-wide counters. The first three partition every unit of base value
/// the pool is responsible for: still pooled on this chain, in flight over
/// the bridge, or confirmed staked on the validator chain.
const DEPOSITS_POOLED: Symbol = symbol_short!("DEP_POOL");
const DEPOSITS_BRIDGING: Symbol = symbol_short!("DEP_BRDG");
const DEPOSITS_DELEGATED: Symbol = symbol_short!("DEP_DELEG");
const TOKENS_TO_BURN: Symbol = symbol_short!("TO_BURN");
const NEXT_DELEGATE: Symbol = symbol_short!("NXT_DEL");
const NEXT_UNDELEGATE: Symbol = symbol_short!("NXT_UND");

/// Persistent-storage key prefixes
const DELEGATE_REQ: Symbol = symbol_short!("DEL_REQ");
const UNDELEGATE_REQ: Symbol = symbol_short!("UND_REQ");
const USER_WITHDRAWALS: Symbol = symbol_short!("USR_WD");
const REWARD_ID: Symbol = symbol_short!("RWD_ID");

const TTL_THRESHOLD: u32 = 1_036_800;
const TTL_EXTEND_TO: u32 = 2_073_600;

fn extend_ttl<K>(env: &Env, key: &K)
where
    K: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

fn read_amount(env: &Env, key: Symbol) -> i128 {
    env.storage().instance().get(&key).unwrap_or(0)
}

fn write_amount(env: &Env, key: Symbol, amount: i128) {
    env.storage().instance().set(&key, &amount);
}

fn read_counter(env: &Env, key: Symbol) -> u64 {
    env.storage().instance().get(&key).unwrap_or(0)
}

fn get_address(env: &Env, key: Symbol) -> Result<Address, StakeError> {
    env.storage()
        .instance()
        .get(&key)
        .ok_or(StakeError::NotInitialized)
}

fn read_delegate_request(env: &Env, uuid: u64) -> Option<BotDelegateRequest> {
    env.storage().persistent().get(&(DELEGATE_REQ, uuid))
}

fn write_delegate_request(env: &Env, uuid: u64, req: &BotDelegateRequest) {
    let key = (DELEGATE_REQ, uuid);
    env.storage().persistent().set(&key, req);
    extend_ttl(env, &key);
}

fn read_undelegate_request(env: &Env, uuid: u64) -> Option<BotUndelegateRequest> {
    env.storage().persistent().get(&(UNDELEGATE_REQ, uuid))
}

fn write_undelegate_request(env: &Env, uuid: u64, req: &BotUndelegateRequest) {
    let key = (UNDELEGATE_REQ, uuid);
    env.storage().persistent().set(&key, req);
    extend_ttl(env, &key);
}

fn read_user_withdrawals(env: &Env, user: &Address) -> Vec<WithdrawalRequest> {
    env.storage()
        .persistent()
        .get(&(USER_WITHDRAWALS, user.clone()))
        .unwrap_or(Vec::new(env))
}

fn write_user_withdrawals(env: &Env, user: &Address, queue: &Vec<WithdrawalRequest>) {
    let key = (USER_WITHDRAWALS, user.clone());
    env.storage().persistent().set(&key, queue);
    extend_ttl(env, &key);
}

/// The last-created delegation request, if it has not completed yet. At most
/// one request can be in this state; new ones are refused while it exists.
fn pending_delegation(env: &Env) -> Option<(u64, BotDelegateRequest)> {
    let next = read_counter(env, NEXT_DELEGATE);
    if next == 0 {
        return None;
    }
    let uuid = next - 1;
    match read_delegate_request(env, uuid) {
        Some(req) if req.end_time == 0 => Some((uuid, req)),
        _ => None,
    }
}

fn base_client(env: &Env) -> Result<token::Client<'_>, StakeError> {
    Ok(token::Client::new(env, &get_address(env, BASE_TOKEN)?))
}

fn stake_token_client(env: &Env) -> Result<stake_token::StakeTokenClient<'_>, StakeError> {
    Ok(stake_token::StakeTokenClient::new(
        env,
        &get_address(env, STAKE_TOKEN)?,
    ))
}

/// Liquid-staking stake ledger.
///
/// Tracks a pool of deposited base-asset value, mints and burns a
/// proportional stake token, and coordinates the asynchronous
/// bridge-and-delegate lifecycle driven by a trusted off-chain bot. Every
/// entry point is an atomic transaction: it either commits a full
/// invariant-preserving transition or aborts with a typed error and no
/// state change.
#[contract]
pub struct StakeManager;

#[contractimpl]
impl StakeManager {
    /// Initialize roles, collaborating token addresses, the bridge deposit
    /// wallet and the minimum relay fee.
    pub fn initialize(
        env: Env,
        admin: Address,
        manager: Address,
        bot: Address,
        base_token: Address,
        stake_token: Address,
        deposit_wallet: Address,
        min_relay_fee: i128,
    ) -> Result<(), StakeError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(StakeError::AlreadyInitialized);
        }
        if min_relay_fee < 0 {
            return Err(StakeError::InvalidAmount);
        }

        access::set_role(&env, Role::Admin, &admin);
        access::set_role(&env, Role::Manager, &manager);
        access::set_role(&env, Role::Bot, &bot);
        env.storage().instance().set(&BASE_TOKEN, &base_token);
        env.storage().instance().set(&STAKE_TOKEN, &stake_token);
        env.storage()
            .instance()
            .set(&DEPOSIT_WALLET, &deposit_wallet);
        env.storage().instance().set(&MIN_RELAY_FEE, &min_relay_fee);
        env.storage().instance().set(&INITIALIZED, &true);

        events::publish_initialized(&env, admin, manager, bot);

        Ok(())
    }

    // Deposit & exchange rate

    /// Deposit base-asset value into the pool and receive stake tokens at
    /// the current rate. Open to any caller.
    pub fn deposit(env: Env, user: Address, amount: i128) -> Result<i128, StakeError> {
        user.require_auth();

        if amount <= 0 {
            return Err(StakeError::InvalidAmount);
        }

        let stake_token = stake_token_client(&env)?;
        let minted = rate::base_to_stake_token(
            amount,
            stake_token.total_supply(),
            read_amount(&env, DEPOSITS_DELEGATED),
        );
        // a deposit too small to mint a single token unit is refused
        if minted <= 0 {
            return Err(StakeError::InvalidAmount);
        }

        base_client(&env)?.transfer(&user, &env.current_contract_address(), &amount);
        write_amount(&env, DEPOSITS_POOLED, read_amount(&env, DEPOSITS_POOLED) + amount);
        stake_token.mint(&user, &minted);

        events::publish_deposit(&env, user, amount, minted);

        Ok(minted)
    }

    /// Credit restaking rewards accrued on the validator chain. Bot-only;
    /// each `reward_id` is accepted exactly once. Raises the exchange rate.
    pub fn add_restaking_rewards(
        env: Env,
        caller: Address,
        reward_id: u64,
        amount: i128,
    ) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Bot)?;

        if amount <= 0 {
            return Err(StakeError::InvalidAmount);
        }
        let delegated = read_amount(&env, DEPOSITS_DELEGATED);
        if delegated == 0 {
            return Err(StakeError::NoFundsDelegated);
        }
        let key = (REWARD_ID, reward_id);
        if env.storage().persistent().has(&key) {
            return Err(StakeError::RewardIdUsed);
        }

        env.storage().persistent().set(&key, &true);
        extend_ttl(&env, &key);
        write_amount(&env, DEPOSITS_DELEGATED, delegated + amount);

        events::publish_rewards_added(&env, reward_id, amount);

        Ok(())
    }

    // Delegation state machine

    /// Move the bridgeable part of the pooled deposits toward the validator
    /// chain and open a delegation request. Bot-only; the caller fronts a
    /// relay fee of at least the configured minimum. Returns the request
    /// uuid.
    pub fn start_delegation(env: Env, caller: Address, relay_fee: i128) -> Result<u64, StakeError> {
        access::require_role(&env, &caller, Role::Bot)?;

        if relay_fee < read_amount(&env, MIN_RELAY_FEE) {
            return Err(StakeError::InsufficientRelayFee);
        }
        let pooled = read_amount(&env, DEPOSITS_POOLED);
        if pooled < rate::ONE {
            return Err(StakeError::InsufficientDepositAmount);
        }
        if pending_delegation(&env).is_some() {
            return Err(StakeError::DelegationPending);
        }

        // Sub-step dust stays pooled until a later delegation picks it up.
        let amount = rate::bridgeable(pooled);

        let base = base_client(&env)?;
        let wallet = get_address(&env, DEPOSIT_WALLET)?;
        base.transfer(&caller, &wallet, &relay_fee);
        base.transfer(&env.current_contract_address(), &wallet, &amount);

        let uuid = read_counter(&env, NEXT_DELEGATE);
        env.storage().instance().set(&NEXT_DELEGATE, &(uuid + 1));
        write_delegate_request(
            &env,
            uuid,
            &BotDelegateRequest {
                start_time: env.ledger().timestamp(),
                end_time: 0,
                amount,
            },
        );

        write_amount(&env, DEPOSITS_POOLED, pooled - amount);
        write_amount(
            &env,
            DEPOSITS_BRIDGING,
            read_amount(&env, DEPOSITS_BRIDGING) + amount,
        );

        events::publish_transfer_out(&env, uuid, amount);

        Ok(uuid)
    }

    /// Confirm that the delegation identified by `uuid` landed on the
    /// validator chain. Bot-only.
    pub fn complete_delegation(env: Env, caller: Address, uuid: u64) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Bot)?;

        let mut req = match read_delegate_request(&env, uuid) {
            Some(req) if req.end_time == 0 => req,
            _ => return Err(StakeError::InvalidUuid),
        };

        req.end_time = env.ledger().timestamp();
        write_delegate_request(&env, uuid, &req);

        write_amount(
            &env,
            DEPOSITS_BRIDGING,
            read_amount(&env, DEPOSITS_BRIDGING) - req.amount,
        );
        write_amount(
            &env,
            DEPOSITS_DELEGATED,
            read_amount(&env, DEPOSITS_DELEGATED) + req.amount,
        );

        events::publish_delegate(&env, uuid, req.amount);

        Ok(())
    }

    /// Re-send a bridge transfer that silently failed and was refunded to
    /// the contract. Manager-only recovery; reuses the original uuid. The
    /// refunded funds must actually be sitting on the contract.
    pub fn retry_transfer_out(
        env: Env,
        caller: Address,
        uuid: u64,
        relay_fee: i128,
    ) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Manager)?;

        if relay_fee < read_amount(&env, MIN_RELAY_FEE) {
            return Err(StakeError::InsufficientRelayFee);
        }
        let req = match read_delegate_request(&env, uuid) {
            Some(req) if req.end_time == 0 => req,
            _ => return Err(StakeError::InvalidUuid),
        };
        if req.amount != read_amount(&env, DEPOSITS_BRIDGING) {
            return Err(StakeError::InvalidBridgingOut);
        }

        let base = base_client(&env)?;
        let contract = env.current_contract_address();
        if base.balance(&contract) < read_amount(&env, DEPOSITS_POOLED) + req.amount {
            return Err(StakeError::InvalidBridgingOut);
        }

        let wallet = get_address(&env, DEPOSIT_WALLET)?;
        base.transfer(&caller, &wallet, &relay_fee);
        base.transfer(&contract, &wallet, &req.amount);

        events::publish_transfer_out(&env, uuid, req.amount);

        Ok(())
    }

    // Withdrawal queue & undelegation state machine

    /// Queue a withdrawal of `amount_in_stake_token`, escrowing the tokens
    /// on the contract. Only delegated funds back withdrawals; the request
    /// rides on the next undelegation batch.
    pub fn request_withdraw(
        env: Env,
        user: Address,
        amount_in_stake_token: i128,
    ) -> Result<(), StakeError> {
        user.require_auth();

        if amount_in_stake_token <= 0 {
            return Err(StakeError::InvalidAmount);
        }

        let stake_token = stake_token_client(&env)?;
        let supply = stake_token.total_supply();
        let delegated = read_amount(&env, DEPOSITS_DELEGATED);
        let to_burn = read_amount(&env, TOKENS_TO_BURN);

        let limit = rate::base_to_stake_token(delegated, supply, delegated) - to_burn;
        if amount_in_stake_token > limit {
            return Err(StakeError::WithdrawLimitExceeded);
        }

        stake_token.transfer(
            &user,
            &env.current_contract_address(),
            &amount_in_stake_token,
        );

        let mut queue = read_user_withdrawals(&env, &user);
        queue.push_back(WithdrawalRequest {
            // The id the next `start_undelegation` call is guaranteed to
            // take; this request becomes claimable once that batch ends.
            undelegate_uuid: read_counter(&env, NEXT_UNDELEGATE),
            amount_in_stake_token,
            amount_in_base: rate::stake_token_to_base(amount_in_stake_token, supply, delegated),
        });
        write_user_withdrawals(&env, &user, &queue);

        write_amount(&env, TOKENS_TO_BURN, to_burn + amount_in_stake_token);

        events::publish_request_withdraw(&env, user, amount_in_stake_token);

        Ok(())
    }

    /// Fold all escrowed withdrawals into one undelegation batch: burn the
    /// escrow, fix the owed base amount at the current rate and record the
    /// batch. Bot-only. Returns the batch uuid.
    ///
    /// The owed amount is rounded down to a bridge step; the remainder is
    /// absorbed into the exchange rate rather than refunded.
    pub fn start_undelegation(env: Env, caller: Address) -> Result<u64, StakeError> {
        access::require_role(&env, &caller, Role::Bot)?;

        let to_burn = read_amount(&env, TOKENS_TO_BURN);
        if to_burn == 0 {
            return Err(StakeError::InsufficientWithdrawAmount);
        }

        let stake_token = stake_token_client(&env)?;
        let supply = stake_token.total_supply();
        let delegated = read_amount(&env, DEPOSITS_DELEGATED);
        let amount = rate::bridgeable(rate::stake_token_to_base(to_burn, supply, delegated));

        let uuid = read_counter(&env, NEXT_UNDELEGATE);
        env.storage().instance().set(&NEXT_UNDELEGATE, &(uuid + 1));
        write_undelegate_request(
            &env,
            uuid,
            &BotUndelegateRequest {
                amount,
                amount_in_stake_token: to_burn,
                start_time: 0,
                end_time: 0,
            },
        );

        write_amount(&env, DEPOSITS_DELEGATED, delegated - amount);
        stake_token.burn(&env.current_contract_address(), &to_burn);
        write_amount(&env, TOKENS_TO_BURN, 0);

        events::publish_start_undelegation(&env, uuid, amount, to_burn);

        Ok(uuid)
    }

    /// Confirm the unstake for batch `uuid` was initiated on the validator
    /// chain. Bot-only; valid exactly once per batch.
    pub fn undelegation_started(env: Env, caller: Address, uuid: u64) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Bot)?;

        let mut req = match read_undelegate_request(&env, uuid) {
            Some(req) if req.start_time == 0 => req,
            _ => return Err(StakeError::InvalidUuid),
        };

        req.start_time = env.ledger().timestamp();
        write_undelegate_request(&env, uuid, &req);

        events::publish_undelegation_started(&env, uuid);

        Ok(())
    }

    /// Deliver the unstaked funds for batch `uuid`. Bot-only; `value` must
    /// equal the batch amount exactly and is pulled from the caller. All
    /// withdrawal requests riding on the batch become claimable.
    pub fn complete_undelegation(
        env: Env,
        caller: Address,
        uuid: u64,
        value: i128,
    ) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Bot)?;

        let mut req = match read_undelegate_request(&env, uuid) {
            Some(req) if req.start_time != 0 && req.end_time == 0 => req,
            _ => return Err(StakeError::InvalidUuid),
        };
        if value != req.amount {
            return Err(StakeError::ExactAmountRequired);
        }

        base_client(&env)?.transfer(&caller, &env.current_contract_address(), &value);

        req.end_time = env.ledger().timestamp();
        write_undelegate_request(&env, uuid, &req);

        events::publish_undelegate(&env, uuid, req.amount);

        Ok(())
    }

    /// Claim a completed withdrawal by index into the caller's own queue.
    /// Pays the caller's pro-rata share of the base the batch actually
    /// delivered and removes the entry.
    pub fn claim_withdraw(env: Env, user: Address, index: u32) -> Result<i128, StakeError> {
        user.require_auth();

        let mut queue = read_user_withdrawals(&env, &user);
        let req = queue.get(index).ok_or(StakeError::InvalidIndex)?;

        let batch = match read_undelegate_request(&env, req.undelegate_uuid) {
            Some(batch) if batch.end_time != 0 => batch,
            _ => return Err(StakeError::NotClaimableYet),
        };

        // Settle against the delivered batch amount, not the request-time
        // estimate: the owed amount was rounded down to a bridge step, so
        // the estimates can sum to more base than the batch holds. Flooring
        // each share keeps the sum of all claims within the batch amount.
        let amount = batch.amount * req.amount_in_stake_token / batch.amount_in_stake_token;

        queue.remove(index);
        write_user_withdrawals(&env, &user, &queue);

        base_client(&env)?.transfer(&env.current_contract_address(), &user, &amount);

        events::publish_claim_withdrawal(&env, user, index, amount);

        Ok(amount)
    }

    // Authority gate

    /// First phase of the manager handover: record a candidate. Manager-only.
    pub fn propose_new_manager(
        env: Env,
        caller: Address,
        candidate: Address,
    ) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Manager)?;

        access::set_proposed_manager(&env, &candidate);
        events::publish_propose_manager(&env, candidate);

        Ok(())
    }

    /// Second phase: only the proposed candidate may take over. Swaps the
    /// active manager and clears the proposal.
    pub fn accept_new_manager(env: Env, caller: Address) -> Result<(), StakeError> {
        caller.require_auth();

        match access::get_proposed_manager(&env) {
            Some(candidate) if candidate == caller => {}
            _ => return Err(StakeError::Unauthorized),
        }

        access::set_role(&env, Role::Manager, &caller);
        access::clear_proposed_manager(&env);
        events::publish_set_manager(&env, caller);

        Ok(())
    }

    /// Rotate the bot credential. Admin-only.
    pub fn set_bot(env: Env, caller: Address, bot: Address) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Admin)?;

        access::set_role(&env, Role::Bot, &bot);
        events::publish_set_bot(&env, bot);

        Ok(())
    }

    /// Repoint the bridge deposit wallet. Manager-only.
    pub fn set_deposit_wallet(env: Env, caller: Address, wallet: Address) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Manager)?;

        env.storage().instance().set(&DEPOSIT_WALLET, &wallet);

        Ok(())
    }

    /// Adjust the minimum relay fee. Manager-only.
    pub fn set_min_relay_fee(env: Env, caller: Address, fee: i128) -> Result<(), StakeError> {
        access::require_role(&env, &caller, Role::Manager)?;

        if fee < 0 {
            return Err(StakeError::InvalidAmount);
        }
        env.storage().instance().set(&MIN_RELAY_FEE, &fee);

        Ok(())
    }

    // Read accessors

    pub fn convert_base_to_stake_token(env: Env, amount: i128) -> Result<i128, StakeError> {
        Ok(rate::base_to_stake_token(
            amount,
            stake_token_client(&env)?.total_supply(),
            read_amount(&env, DEPOSITS_DELEGATED),
        ))
    }

    pub fn convert_stake_token_to_base(env: Env, amount: i128) -> Result<i128, StakeError> {
        Ok(rate::stake_token_to_base(
            amount,
            stake_token_client(&env)?.total_supply(),
            read_amount(&env, DEPOSITS_DELEGATED),
        ))
    }

    /// Base value of one whole stake token, scaled by [`rate::ONE`].
    pub fn get_exchange_rate(env: Env) -> Result<i128, StakeError> {
        Self::convert_stake_token_to_base(env, rate::ONE)
    }

    /// Stake tokens still withdrawable against currently delegated funds.
    pub fn get_stake_token_withdraw_limit(env: Env) -> Result<i128, StakeError> {
        let delegated = read_amount(&env, DEPOSITS_DELEGATED);
        let limit = rate::base_to_stake_token(
            delegated,
            stake_token_client(&env)?.total_supply(),
            delegated,
        ) - read_amount(&env, TOKENS_TO_BURN);
        Ok(limit.max(0))
    }

    pub fn deposits_in_contract(env: Env) -> i128 {
        read_amount(&env, DEPOSITS_POOLED)
    }

    pub fn deposits_bridging_out(env: Env) -> i128 {
        read_amount(&env, DEPOSITS_BRIDGING)
    }

    pub fn deposits_delegated(env: Env) -> i128 {
        read_amount(&env, DEPOSITS_DELEGATED)
    }

    pub fn total_stake_token_to_burn(env: Env) -> i128 {
        read_amount(&env, TOKENS_TO_BURN)
    }

    pub fn get_bot_delegate_request(env: Env, uuid: u64) -> Option<BotDelegateRequest> {
        read_delegate_request(&env, uuid)
    }

    pub fn get_bot_undelegate_request(env: Env, uuid: u64) -> Option<BotUndelegateRequest> {
        read_undelegate_request(&env, uuid)
    }

    pub fn get_user_withdrawal_requests(env: Env, user: Address) -> Vec<WithdrawalRequest> {
        read_user_withdrawals(&env, &user)
    }

    /// Claim-readiness of one queued withdrawal.
    pub fn get_user_request_status(
        env: Env,
        user: Address,
        index: u32,
    ) -> Result<WithdrawalStatus, StakeError> {
        let req = read_user_withdrawals(&env, &user)
            .get(index)
            .ok_or(StakeError::InvalidIndex)?;
        let (is_claimable, amount_in_base) =
            match read_undelegate_request(&env, req.undelegate_uuid) {
                Some(batch) if batch.end_time != 0 => (
                    true,
                    batch.amount * req.amount_in_stake_token / batch.amount_in_stake_token,
                ),
                _ => (false, req.amount_in_base),
            };
        Ok(WithdrawalStatus {
            is_claimable,
            amount_in_base,
        })
    }

    pub fn get_admin(env: Env) -> Result<Address, StakeError> {
        access::get_role(&env, Role::Admin)
    }

    pub fn get_manager(env: Env) -> Result<Address, StakeError> {
        access::get_role(&env, Role::Manager)
    }

    pub fn get_bot(env: Env) -> Result<Address, StakeError> {
        access::get_role(&env, Role::Bot)
    }

    pub fn get_proposed_manager(env: Env) -> Option<Address> {
        access::get_proposed_manager(&env)
    }

    pub fn get_min_relay_fee(env: Env) -> i128 {
        read_amount(&env, MIN_RELAY_FEE)
    }

    pub fn get_deposit_wallet(env: Env) -> Result<Address, StakeError> {
        get_address(&env, DEPOSIT_WALLET)
    }
}
