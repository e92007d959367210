//! Property-based tests for LedgerService.
//!
//! - Conservation: a transfer moves value without creating or destroying it
//! - Non-negativity: no sequence of legs drives a balance below zero
//! - Lock order: independent of which account is the source

use corebank_shared::types::{AccountId, Amount, CurrencyCode, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{AccountSnapshot, AccountStatus, Principal};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate non-negative balances (0.00 to 100,000.00).
fn balance() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn snapshot(id: u128, owner: UserId) -> AccountSnapshot {
    AccountSnapshot {
        id: AccountId::from_uuid(Uuid::from_u128(id)),
        owner_id: owner,
        number: format!("{id:010}"),
        currency: CurrencyCode::parse("USD").unwrap(),
        status: AccountStatus::Active,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A successful transfer leaves the pair's total unchanged and moves exactly `amount`.
    #[test]
    fn prop_transfer_conserves_value(
        source_balance in balance(),
        dest_balance in balance(),
        amount in positive_amount(),
        source_id in 1u128..1_000,
        dest_offset in 1u128..1_000,
    ) {
        let owner = UserId::new();
        let source = snapshot(source_id, owner);
        let destination = snapshot(source_id + dest_offset, UserId::new());
        let plan = LedgerService::plan_transfer(
            &Principal::new(owner),
            &source,
            &destination,
            Amount::new(amount).unwrap(),
        ).unwrap();

        let mut after_source = source_balance;
        let mut after_dest = dest_balance;
        let mut outcome = Ok(());
        for leg in plan.legs() {
            let current = if leg.account_id == source.id { after_source } else { after_dest };
            match LedgerService::apply_leg(current, leg) {
                Ok(next) if leg.account_id == source.id => after_source = next,
                Ok(next) => after_dest = next,
                Err(err) => { outcome = Err(err); break; }
            }
        }

        if amount <= source_balance {
            prop_assert!(outcome.is_ok());
            prop_assert_eq!(after_source, source_balance - amount);
            prop_assert_eq!(after_dest, dest_balance + amount);
            prop_assert_eq!(after_source + after_dest, source_balance + dest_balance);
        } else {
            prop_assert_eq!(outcome, Err(LedgerError::InsufficientFunds(source.id)));
        }
    }

    /// Applying any sequence of debits and credits never yields a negative balance;
    /// rejected legs leave the balance untouched.
    #[test]
    fn prop_balance_never_negative(
        start in balance(),
        deltas in prop::collection::vec((positive_amount(), any::<bool>()), 1..50),
    ) {
        let account = snapshot(7, UserId::new());
        let mut current = start;
        for (amount, is_credit) in deltas {
            let amount = Amount::new(amount).unwrap();
            let plan = if is_credit {
                LedgerService::plan_deposit(&account, amount).unwrap()
            } else {
                LedgerService::plan_fee(&account, amount).unwrap()
            };
            let before = current;
            match LedgerService::apply_leg(current, &plan.legs()[0]) {
                Ok(next) => current = next,
                Err(err) => {
                    prop_assert_eq!(err, LedgerError::InsufficientFunds(account.id));
                    prop_assert_eq!(current, before);
                }
            }
            prop_assert!(current >= Decimal::ZERO);
        }
    }

    /// Lock order is ascending by id and identical for A->B and B->A.
    #[test]
    fn prop_lock_order_is_canonical(a in 1u128..u128::from(u64::MAX), b in 1u128..u128::from(u64::MAX)) {
        prop_assume!(a != b);
        let owner = UserId::new();
        let principal = Principal::new(owner);
        let first = snapshot(a, owner);
        let second = snapshot(b, owner);
        let amount = Amount::new(Decimal::ONE).unwrap();

        let forward: Vec<_> = LedgerService::plan_transfer(&principal, &first, &second, amount)
            .unwrap().lock_order().collect();
        let backward: Vec<_> = LedgerService::plan_transfer(&principal, &second, &first, amount)
            .unwrap().lock_order().collect();

        prop_assert_eq!(&forward, &backward);
        prop_assert!(forward[0] < forward[1]);
    }
}
