#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{token, Address, Env};
use stake_manager::{rate::ONE, StakeManager, StakeManagerClient};
use stake_token::{StakeToken, StakeTokenClient};

const RELAY_FEE: i128 = ONE / 100;

#[derive(Arbitrary, Debug)]
enum Op {
    Deposit { amount: u32 },
    AddRewards { reward_id: u8, amount: u32 },
    StartDelegation,
    CompleteDelegation { uuid: u8 },
    RequestWithdraw { amount: u32 },
    StartUndelegation,
    UndelegationStarted { uuid: u8 },
    CompleteUndelegation { uuid: u8 },
    ClaimWithdraw { index: u8 },
}

// Drive arbitrary operation sequences and check after every step that
// pooled + bridging + delegated always equals deposits plus rewards minus
// the base value handed to undelegation batches. Errors are fine; an
// invariant violation or panic is a finding.
fuzz_target!(|ops: Vec<Op>| {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|li| li.timestamp = 1_700_000_000);

    let admin = Address::generate(&env);
    let manager = Address::generate(&env);
    let bot = Address::generate(&env);
    let user = Address::generate(&env);
    let wallet = Address::generate(&env);

    let base_contract = env.register_stellar_asset_contract_v2(Address::generate(&env));
    let base_mint = token::StellarAssetClient::new(&env, &base_contract.address());

    let token_id = env.register(StakeToken, ());
    let stake_token = StakeTokenClient::new(&env, &token_id);
    stake_token.initialize(&admin);

    let contract_id = env.register(StakeManager, ());
    let client = StakeManagerClient::new(&env, &contract_id);
    stake_token.set_stake_manager(&admin, &contract_id);
    client.initialize(
        &admin,
        &manager,
        &bot,
        &base_contract.address(),
        &token_id,
        &wallet,
        &RELAY_FEE,
    );

    let mut net_in: i128 = 0;

    for op in ops.iter().take(32) {
        match op {
            Op::Deposit { amount } => {
                let amount = *amount as i128;
                if amount > 0 {
                    base_mint.mint(&user, &amount);
                }
                if client.try_deposit(&user, &amount).is_ok() {
                    net_in += amount;
                }
            }
            Op::AddRewards { reward_id, amount } => {
                if client
                    .try_add_restaking_rewards(&bot, &(*reward_id as u64), &(*amount as i128))
                    .is_ok()
                {
                    net_in += *amount as i128;
                }
            }
            Op::StartDelegation => {
                base_mint.mint(&bot, &RELAY_FEE);
                let _ = client.try_start_delegation(&bot, &RELAY_FEE);
            }
            Op::CompleteDelegation { uuid } => {
                let _ = client.try_complete_delegation(&bot, &(*uuid as u64));
            }
            Op::RequestWithdraw { amount } => {
                let _ = client.try_request_withdraw(&user, &(*amount as i128));
            }
            Op::StartUndelegation => {
                if let Ok(Ok(uuid)) = client.try_start_undelegation(&bot) {
                    let batch = client.get_bot_undelegate_request(&uuid).unwrap();
                    net_in -= batch.amount;
                }
            }
            Op::UndelegationStarted { uuid } => {
                let _ = client.try_undelegation_started(&bot, &(*uuid as u64));
            }
            Op::CompleteUndelegation { uuid } => {
                let uuid = *uuid as u64;
                if let Some(batch) = client.get_bot_undelegate_request(&uuid) {
                    base_mint.mint(&bot, &batch.amount);
                    let _ = client.try_complete_undelegation(&bot, &uuid, &batch.amount);
                }
            }
            Op::ClaimWithdraw { index } => {
                let _ = client.try_claim_withdraw(&user, &(*index as u32));
            }
        }

        let total = client.deposits_in_contract()
            + client.deposits_bridging_out()
            + client.deposits_delegated();
        assert_eq!(total, net_in, "conservation invariant violated by {op:?}");
    }
});
