//! Ledger service: turns validated requests into balance-leg plans.
//!
//! This module provides the pure business logic the engine runs before and inside its
//! atomic unit of work. It has no database dependencies: the caller supplies account
//! snapshots and, under lock, the current balance of each leg.

use corebank_shared::types::{AccountId, Amount, CurrencyCode};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{AccountSnapshot, Principal, TransactionType};
use super::validation::{ensure_active, ensure_distinct, ensure_owner, ensure_same_currency};

/// Largest balance the account store can hold (`NUMERIC(19,4)`): 999,999,999,999,999.9999.
pub const MAX_BALANCE: Decimal = Decimal::from_parts(2_313_682_943, 2_328_306_436, 0, false, 4);

/// One balance change inside a movement. Debits are negative, credits positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceLeg {
    /// Account whose balance changes.
    pub account_id: AccountId,
    /// Signed change applied to the balance.
    pub delta: Decimal,
}

impl BalanceLeg {
    /// Returns true if this leg lowers the balance.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.delta.is_sign_negative()
    }
}

/// A fully validated money movement, ready to be applied under lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementPlan {
    /// Ledger transaction type.
    pub transaction_type: TransactionType,
    /// Amount moved.
    pub amount: Amount,
    /// Debited account, if any.
    pub source: Option<AccountId>,
    /// Credited account, if any.
    pub destination: Option<AccountId>,
    /// Currency shared by every touched account.
    pub currency: CurrencyCode,
    legs: Vec<BalanceLeg>,
}

impl MovementPlan {
    fn new(
        transaction_type: TransactionType,
        amount: Amount,
        source: Option<AccountId>,
        destination: Option<AccountId>,
        currency: CurrencyCode,
    ) -> Self {
        debug_assert_eq!(source.is_some(), transaction_type.has_source());
        debug_assert_eq!(destination.is_some(), transaction_type.has_destination());

        let mut legs = Vec::with_capacity(2);
        if let Some(account_id) = source {
            legs.push(BalanceLeg {
                account_id,
                delta: -amount.value(),
            });
        }
        if let Some(account_id) = destination {
            legs.push(BalanceLeg {
                account_id,
                delta: amount.value(),
            });
        }
        // Lock order is ascending account id regardless of role, so opposing transfers
        // between the same pair always contend on the same row first.
        legs.sort_by_key(|leg| leg.account_id);
        debug_assert_eq!(
            legs.iter().filter(|leg| leg.is_debit()).count(),
            usize::from(source.is_some())
        );

        let plan = Self {
            transaction_type,
            amount,
            source,
            destination,
            currency,
            legs,
        };
        debug_assert!(
            plan.transaction_type != TransactionType::Transfer || plan.net_delta().is_zero()
        );
        plan
    }

    /// Balance legs in canonical lock order (ascending account id).
    #[must_use]
    pub fn legs(&self) -> &[BalanceLeg] {
        &self.legs
    }

    /// Account ids in the order their row locks must be acquired.
    pub fn lock_order(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.legs.iter().map(|leg| leg.account_id)
    }

    /// Sum of all leg deltas: zero for transfers, `±amount` for single-account postings.
    #[must_use]
    pub fn net_delta(&self) -> Decimal {
        self.legs.iter().map(|leg| leg.delta).sum()
    }
}

/// Ledger service for request validation and balance arithmetic.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validates a transfer and builds its plan.
    ///
    /// Checks, in order: the principal owns the source, source and destination differ,
    /// both accounts are active, and their currencies match exactly.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn plan_transfer(
        principal: &Principal,
        source: &AccountSnapshot,
        destination: &AccountSnapshot,
        amount: Amount,
    ) -> Result<MovementPlan, LedgerError> {
        ensure_owner(principal, source)?;
        ensure_distinct(source.id, destination.id)?;
        ensure_active(source)?;
        ensure_active(destination)?;
        ensure_same_currency(source, destination)?;

        Ok(MovementPlan::new(
            TransactionType::Transfer,
            amount,
            Some(source.id),
            Some(destination.id),
            source.currency,
        ))
    }

    /// Validates a deposit into `destination`. Anyone may deposit into an active account.
    ///
    /// # Errors
    ///
    /// Returns `AccountUnavailable` if the account is not active.
    pub fn plan_deposit(
        destination: &AccountSnapshot,
        amount: Amount,
    ) -> Result<MovementPlan, LedgerError> {
        Self::plan_credit(TransactionType::Deposit, destination, amount)
    }

    /// Validates a withdrawal from an account the principal owns.
    ///
    /// # Errors
    ///
    /// Returns `NotAccountOwner` or `AccountUnavailable`.
    pub fn plan_withdrawal(
        principal: &Principal,
        source: &AccountSnapshot,
        amount: Amount,
    ) -> Result<MovementPlan, LedgerError> {
        ensure_owner(principal, source)?;
        Self::plan_debit(TransactionType::Withdrawal, source, amount)
    }

    /// Validates a system interest credit.
    ///
    /// # Errors
    ///
    /// Returns `AccountUnavailable` if the account is not active.
    pub fn plan_interest(
        destination: &AccountSnapshot,
        amount: Amount,
    ) -> Result<MovementPlan, LedgerError> {
        Self::plan_credit(TransactionType::Interest, destination, amount)
    }

    /// Validates a system fee debit. Ownership is not checked: fees are bank-initiated.
    ///
    /// # Errors
    ///
    /// Returns `AccountUnavailable` if the account is not active.
    pub fn plan_fee(source: &AccountSnapshot, amount: Amount) -> Result<MovementPlan, LedgerError> {
        Self::plan_debit(TransactionType::Fee, source, amount)
    }

    fn plan_credit(
        transaction_type: TransactionType,
        destination: &AccountSnapshot,
        amount: Amount,
    ) -> Result<MovementPlan, LedgerError> {
        ensure_active(destination)?;
        Ok(MovementPlan::new(
            transaction_type,
            amount,
            None,
            Some(destination.id),
            destination.currency,
        ))
    }

    fn plan_debit(
        transaction_type: TransactionType,
        source: &AccountSnapshot,
        amount: Amount,
    ) -> Result<MovementPlan, LedgerError> {
        ensure_active(source)?;
        Ok(MovementPlan::new(
            transaction_type,
            amount,
            Some(source.id),
            None,
            source.currency,
        ))
    }

    /// Applies one leg to a balance read under lock and returns the new balance.
    ///
    /// This is the authoritative sufficiency check: it is only meaningful on a balance
    /// that is locked for the rest of the unit of work.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if the result would be negative, or `BalanceOverflow`
    /// if it exceeds [`MAX_BALANCE`].
    pub fn apply_leg(locked_balance: Decimal, leg: &BalanceLeg) -> Result<Decimal, LedgerError> {
        let next = locked_balance
            .checked_add(leg.delta)
            .ok_or(LedgerError::BalanceOverflow(leg.account_id))?;

        if next < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds(leg.account_id));
        }
        if next > MAX_BALANCE {
            return Err(LedgerError::BalanceOverflow(leg.account_id));
        }

        Ok(next)
    }
}
