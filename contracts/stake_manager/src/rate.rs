//! Exchange-rate arithmetic between the base asset and the stake token.
//!
//! All amounts are `i128` with 7 decimal places. The rate is the plain ratio
//! `deposits_delegated / stake_token_supply`: only *delegated* funds back the
//! token, so the rate stays 1:1 through deposits and bridging and rises only
//! when restaking rewards are added. There is no stored rate; every
//! conversion recomputes the ratio from the two live quantities.

/// One whole unit of the base asset (7 decimals).
pub const ONE: i128 = 10_000_000;

/// Granularity of a cross-chain transfer. Amounts bridged in either
/// direction must be multiples of this; the sub-step remainder ("dust")
/// stays behind.
pub const BRIDGE_STEP: i128 = 10_000;

/// Convert a base-asset amount into stake tokens at the current rate.
///
/// ```text
/// tokens = amount × supply / delegated
/// ```
///
/// Bootstrap rule: while nothing is delegated (or no tokens exist) the rate
/// is 1:1. The supply guard also covers a fully unwound pool, where the
/// supply was burned to zero but a delegated dust remainder survives.
pub fn base_to_stake_token(amount: i128, supply: i128, delegated: i128) -> i128 {
    if supply <= 0 || delegated <= 0 {
        return amount;
    }
    amount * supply / delegated
}

/// Convert a stake-token amount into the base asset at the current rate.
///
/// Inverse ratio of [`base_to_stake_token`], same bootstrap rule.
pub fn stake_token_to_base(amount: i128, supply: i128, delegated: i128) -> i128 {
    if supply <= 0 || delegated <= 0 {
        return amount;
    }
    amount * delegated / supply
}

/// Round `amount` down to the largest bridgeable multiple of
/// [`BRIDGE_STEP`]. The difference is the dust left behind.
pub fn bridgeable(amount: i128) -> i128 {
    amount - amount % BRIDGE_STEP
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bootstrap_is_one_to_one() {
        assert_eq!(base_to_stake_token(700, 0, 0), 700);
        assert_eq!(stake_token_to_base(700, 0, 0), 700);
        // deposits exist but nothing is delegated yet
        assert_eq!(base_to_stake_token(300, 1_400, 0), 300);
        // unwound pool: zero supply, delegated dust left over
        assert_eq!(base_to_stake_token(ONE, 0, 37), ONE);
    }

    #[test]
    fn rewards_raise_the_rate() {
        let supply = 2 * ONE;
        let delegated = 2 * ONE + ONE / 10; // 5% rewards accrued

        // one token now redeems for more than one base unit
        assert!(stake_token_to_base(ONE, supply, delegated) > ONE);
        // and a base unit mints fewer tokens
        assert!(base_to_stake_token(ONE, supply, delegated) < ONE);
    }

    #[test]
    fn bridgeable_strips_sub_step_dust() {
        assert_eq!(bridgeable(ONE + 300), ONE);
        assert_eq!(bridgeable(ONE), ONE);
        assert_eq!(bridgeable(BRIDGE_STEP - 1), 0);
        assert_eq!(bridgeable(3 * ONE + BRIDGE_STEP + 17), 3 * ONE + BRIDGE_STEP);
    }

    proptest! {
        // Round-tripping through both conversions returns the input exactly
        // whenever the ratio divides cleanly, and otherwise only ever rounds
        // down (the documented dust absorption).
        #[test]
        fn roundtrip_never_inflates(
            amount in 0i128..1_000_000_000_000,
            supply in 1i128..1_000_000_000_000,
            delegated in 1i128..1_000_000_000_000,
        ) {
            let tokens = base_to_stake_token(amount, supply, delegated);
            let back = stake_token_to_base(tokens, supply, delegated);
            prop_assert!(back <= amount);
            if amount * supply % delegated == 0 && tokens * delegated % supply == 0 {
                prop_assert_eq!(back, amount);
            }
        }

        #[test]
        fn bridgeable_is_largest_step_multiple(amount in 0i128..1_000_000_000_000) {
            let b = bridgeable(amount);
            prop_assert_eq!(b % BRIDGE_STEP, 0);
            prop_assert!(b <= amount);
            prop_assert!(amount - b < BRIDGE_STEP);
        }
    }
}
