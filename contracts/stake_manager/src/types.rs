use soroban_sdk::contracttype;

/// One bot-driven transfer of pooled funds toward the validator chain.
///
/// `start_time` is stamped when the bridge transfer is initiated and
/// `end_time` when the bot confirms the stake landed. A request with
/// `end_time == 0` is still in flight; at most one such request exists.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BotDelegateRequest {
    pub start_time: u64,
    pub end_time: u64,
    pub amount: i128,
}

/// One bot-driven unstake batch moving funds back from the validator chain.
///
/// `amount` is the base-asset value owed (rounded down to a bridge step);
/// `amount_in_stake_token` is the full escrowed amount that was burned. The
/// two differ by the dust the rate absorbs. Created with both timestamps
/// zero; `start_time` set when the unstake is confirmed initiated on the
/// validator chain, `end_time` when the funds arrive back.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BotUndelegateRequest {
    pub amount: i128,
    pub amount_in_stake_token: i128,
    pub start_time: u64,
    pub end_time: u64,
}

/// A single user's pending withdrawal.
///
/// `undelegate_uuid` names the unstake batch this request rides on: the id
/// the next `start_undelegation` call takes at the time the request is
/// raised. The request becomes claimable once that batch completes.
/// `amount_in_base` is the rate-at-request estimate; the actual payout is
/// the request's pro-rata share of what the batch delivers.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalRequest {
    pub undelegate_uuid: u64,
    pub amount_in_stake_token: i128,
    pub amount_in_base: i128,
}

/// Claim-readiness of one queued withdrawal, for off-chain consumers.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalStatus {
    pub is_claimable: bool,
    pub amount_in_base: i128,
}

/// Contract errors
#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum StakeError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    /// Caller lacks the role the entry point requires.
    Unauthorized = 3,
    /// Zero or negative amount supplied.
    InvalidAmount = 4,
    /// Relay fee below the configured minimum.
    InsufficientRelayFee = 5,
    /// Pooled deposits below the minimum delegateable amount.
    InsufficientDepositAmount = 6,
    /// A previous delegation request has not completed yet.
    DelegationPending = 7,
    /// Unknown, stale, or not-yet-reachable request id.
    InvalidUuid = 8,
    /// Withdrawal exceeds the delegated-funds-backed limit.
    WithdrawLimitExceeded = 9,
    /// No escrowed withdrawals to undelegate.
    InsufficientWithdrawAmount = 10,
    /// Rewards id was already consumed.
    RewardIdUsed = 11,
    /// Rewards cannot accrue before any funds are delegated.
    NoFundsDelegated = 12,
    /// Completion must supply exactly the owed amount.
    ExactAmountRequired = 13,
    /// Index outside the caller's withdrawal queue.
    InvalidIndex = 14,
    /// The owning unstake batch has not completed.
    NotClaimableYet = 15,
    /// Bridging-out counter or contract balance does not match the request.
    InvalidBridgingOut = 16,
}
