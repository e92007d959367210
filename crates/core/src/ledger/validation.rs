//! Pre-flight checks that run before any lock is taken.
//!
//! Everything here is pure and works on balance-free snapshots. The only check that needs
//! the locked balance lives in [`super::service::LedgerService::apply_leg`].

use corebank_shared::types::AccountId;
use uuid::Uuid;

use super::error::LedgerError;
use super::types::{AccountRef, AccountSnapshot, Principal};

/// Maximum idempotency key length.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Account number length bounds (IBAN-sized upper bound).
pub const ACCOUNT_NUMBER_LEN: std::ops::RangeInclusive<usize> = 6..=34;

/// Parses a caller-supplied account reference.
///
/// A UUID is taken as an account id; otherwise the input must be a well-formed account number.
///
/// # Errors
///
/// Returns `InvalidReference` for anything else.
pub fn parse_account_ref(raw: &str) -> Result<AccountRef, LedgerError> {
    let trimmed = raw.trim();
    if let Ok(uuid) = Uuid::parse_str(trimmed) {
        return Ok(AccountRef::Id(AccountId::from_uuid(uuid)));
    }
    if ACCOUNT_NUMBER_LEN.contains(&trimmed.len())
        && trimmed.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Ok(AccountRef::Number(trimmed.to_ascii_uppercase()));
    }
    Err(LedgerError::InvalidReference(raw.to_string()))
}

/// Validates an idempotency key: 1-128 printable ASCII characters without whitespace.
///
/// # Errors
///
/// Returns `InvalidIdempotencyKey` describing the first problem found.
pub fn validate_idempotency_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        return Err(LedgerError::InvalidIdempotencyKey("must not be empty"));
    }
    if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(LedgerError::InvalidIdempotencyKey(
            "must be at most 128 characters",
        ));
    }
    if !key.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(LedgerError::InvalidIdempotencyKey(
            "must be printable ASCII without whitespace",
        ));
    }
    Ok(())
}

/// Validates a free-text description.
///
/// # Errors
///
/// Returns `DescriptionTooLong` if it exceeds [`MAX_DESCRIPTION_LEN`] characters.
pub fn validate_description(description: &str) -> Result<(), LedgerError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

/// Requires the principal to own the account.
///
/// # Errors
///
/// Returns `NotAccountOwner` otherwise.
pub fn ensure_owner(principal: &Principal, account: &AccountSnapshot) -> Result<(), LedgerError> {
    if account.owner_id != principal.user_id {
        return Err(LedgerError::NotAccountOwner(account.id));
    }
    Ok(())
}

/// Requires the account to be active at read time.
///
/// # Errors
///
/// Returns `AccountUnavailable` for frozen or closed accounts.
pub fn ensure_active(account: &AccountSnapshot) -> Result<(), LedgerError> {
    if !account.status.is_active() {
        return Err(LedgerError::AccountUnavailable(account.id));
    }
    Ok(())
}

/// Rejects transfers whose source and destination are the same account.
///
/// # Errors
///
/// Returns `SelfTransfer` when the ids match.
pub fn ensure_distinct(source: AccountId, destination: AccountId) -> Result<(), LedgerError> {
    if source == destination {
        return Err(LedgerError::SelfTransfer);
    }
    Ok(())
}

/// Rejects cross-currency transfers; the ledger never converts.
///
/// # Errors
///
/// Returns `CurrencyMismatch` when codes differ.
pub fn ensure_same_currency(
    source: &AccountSnapshot,
    destination: &AccountSnapshot,
) -> Result<(), LedgerError> {
    if source.currency != destination.currency {
        return Err(LedgerError::CurrencyMismatch {
            source_currency: source.currency,
            destination_currency: destination.currency,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::AccountStatus;
    use corebank_shared::types::{CurrencyCode, UserId};
    use rstest::rstest;

    fn snapshot(owner: UserId, currency: &str, status: AccountStatus) -> AccountSnapshot {
        AccountSnapshot {
            id: AccountId::new(),
            owner_id: owner,
            number: "0012345678".to_string(),
            currency: CurrencyCode::parse(currency).unwrap(),
            status,
        }
    }

    #[test]
    fn test_parse_uuid_reference() {
        let id = AccountId::new();
        assert_eq!(
            parse_account_ref(&id.to_string()).unwrap(),
            AccountRef::Id(id)
        );
    }

    #[rstest]
    #[case("0012345678", "0012345678")]
    #[case("  gb29nwbk60161331926819 ", "GB29NWBK60161331926819")]
    fn test_parse_number_reference(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(
            parse_account_ref(raw).unwrap(),
            AccountRef::Number(expected.to_string())
        );
    }

    #[rstest]
    #[case("")]
    #[case("12345")]
    #[case("0012-345678")]
    #[case("0012345678901234567890123456789012345")]
    #[case("DROP TABLE accounts")]
    fn test_parse_rejects_bad_reference(#[case] raw: &str) {
        assert!(matches!(
            parse_account_ref(raw),
            Err(LedgerError::InvalidReference(_))
        ));
    }

    #[rstest]
    #[case("t1", true)]
    #[case("7f1c2a9e-0b4d-4f0e-9a51-3c2d1e0f9a8b", true)]
    #[case("", false)]
    #[case("has space", false)]
    #[case("tab\tkey", false)]
    #[case("ключ", false)]
    fn test_idempotency_key(#[case] key: &str, #[case] ok: bool) {
        assert_eq!(validate_idempotency_key(key).is_ok(), ok);
    }

    #[test]
    fn test_idempotency_key_length_limit() {
        assert!(validate_idempotency_key(&"k".repeat(MAX_IDEMPOTENCY_KEY_LEN)).is_ok());
        assert!(validate_idempotency_key(&"k".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn test_description_limit_counts_chars() {
        assert!(validate_description(&"é".repeat(MAX_DESCRIPTION_LEN)).is_ok());
        assert_eq!(
            validate_description(&"x".repeat(MAX_DESCRIPTION_LEN + 1)),
            Err(LedgerError::DescriptionTooLong {
                max: MAX_DESCRIPTION_LEN
            })
        );
    }

    #[test]
    fn test_ownership() {
        let owner = UserId::new();
        let account = snapshot(owner, "USD", AccountStatus::Active);
        assert!(ensure_owner(&Principal::new(owner), &account).is_ok());
        assert_eq!(
            ensure_owner(&Principal::new(UserId::new()), &account),
            Err(LedgerError::NotAccountOwner(account.id))
        );
    }

    #[rstest]
    #[case(AccountStatus::Active, true)]
    #[case(AccountStatus::Frozen, false)]
    #[case(AccountStatus::Closed, false)]
    fn test_active(#[case] status: AccountStatus, #[case] ok: bool) {
        let account = snapshot(UserId::new(), "USD", status);
        assert_eq!(ensure_active(&account).is_ok(), ok);
    }

    #[test]
    fn test_distinct() {
        let id = AccountId::new();
        assert_eq!(ensure_distinct(id, id), Err(LedgerError::SelfTransfer));
        assert!(ensure_distinct(id, AccountId::new()).is_ok());
    }

    #[test]
    fn test_currency_guard() {
        let owner = UserId::new();
        let usd = snapshot(owner, "USD", AccountStatus::Active);
        let usd2 = snapshot(owner, "usd", AccountStatus::Active);
        let eur = snapshot(owner, "EUR", AccountStatus::Active);
        assert!(ensure_same_currency(&usd, &usd2).is_ok());
        assert!(matches!(
            ensure_same_currency(&usd, &eur),
            Err(LedgerError::CurrencyMismatch { .. })
        ));
    }
}
