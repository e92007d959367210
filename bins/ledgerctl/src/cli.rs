//! Command-line arguments.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use corebank_core::ledger::{
    AccountRef, HistoryFilter, IdempotencyKey, LedgerError, Metadata, PostingRequest,
    TransactionType, TransferRequest, validation::parse_account_ref,
};
use corebank_shared::types::{Amount, PageRequest, TransactionId, UserId};
use uuid::Uuid;

/// Drive the Corebank ledger engine from the command line
#[derive(Parser, Debug)]
#[command(name = "ledgerctl", version)]
#[command(about = "Drive the Corebank ledger engine from the command line", long_about = None)]
pub struct Cli {
    /// User id the command runs as
    #[arg(long, env = "LEDGERCTL_PRINCIPAL", value_name = "USER_ID")]
    pub principal: UserId,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Move money between two accounts of the same currency
    Transfer {
        /// Account to debit (id or number); must belong to the principal
        #[arg(value_parser = account_ref)]
        source: AccountRef,
        /// Account to credit (id or number)
        #[arg(value_parser = account_ref)]
        destination: AccountRef,
        /// Positive amount, at most 4 decimal places
        amount: Amount,
        #[command(flatten)]
        submission: SubmissionArgs,
    },
    /// Credit an account from outside the ledger
    Deposit(PostingArgs),
    /// Debit an account the principal owns
    Withdraw(PostingArgs),
    /// Credit interest to an account
    Interest(PostingArgs),
    /// Debit a fee from an account
    Fee(PostingArgs),
    /// List an account's transactions, newest first
    History {
        /// Account (id or number); must belong to the principal
        #[arg(value_parser = account_ref)]
        account: AccountRef,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size (capped at 100)
        #[arg(long, default_value_t = 20)]
        per_page: u32,
        /// Only transactions of this type
        #[arg(long = "type", value_enum)]
        transaction_type: Option<TypeArg>,
        /// Inclusive lower bound (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Exclusive upper bound (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
    /// Show one transaction
    Show {
        /// Transaction id
        id: TransactionId,
    },
}

/// Arguments shared by the single-account postings.
#[derive(Args, Debug)]
pub struct PostingArgs {
    /// Account (id or number)
    #[arg(value_parser = account_ref)]
    pub account: AccountRef,
    /// Positive amount, at most 4 decimal places
    pub amount: Amount,
    #[command(flatten)]
    pub submission: SubmissionArgs,
}

/// Description, idempotency key and metadata of a money movement.
#[derive(Args, Debug)]
pub struct SubmissionArgs {
    /// Free-text description
    #[arg(long, short, default_value = "")]
    pub description: String,
    /// Idempotency key; resend the same key to retry safely (generated when omitted)
    #[arg(long, value_parser = idempotency_key)]
    pub key: Option<IdempotencyKey>,
    /// Metadata entry as KEY=VALUE; VALUE is parsed as JSON when possible
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = metadata_entry)]
    pub metadata: Vec<(String, serde_json::Value)>,
}

/// Transaction type filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    Transfer,
    Deposit,
    Withdrawal,
    Interest,
    Fee,
}

impl From<TypeArg> for TransactionType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Transfer => Self::Transfer,
            TypeArg::Deposit => Self::Deposit,
            TypeArg::Withdrawal => Self::Withdrawal,
            TypeArg::Interest => Self::Interest,
            TypeArg::Fee => Self::Fee,
        }
    }
}

impl SubmissionArgs {
    fn into_parts(self) -> Result<(String, IdempotencyKey, Metadata), LedgerError> {
        let key = match self.key {
            Some(key) => key,
            None => IdempotencyKey::parse(format!("ledgerctl-{}", Uuid::now_v7()))?,
        };
        Ok((self.description, key, self.metadata.into_iter().collect()))
    }
}

impl PostingArgs {
    /// Builds the engine request, generating an idempotency key if none was given.
    pub fn into_request(self) -> Result<PostingRequest, LedgerError> {
        let (description, idempotency_key, metadata) = self.submission.into_parts()?;
        Ok(PostingRequest {
            account: self.account,
            amount: self.amount,
            description,
            idempotency_key,
            metadata,
        })
    }
}

/// Builds a transfer request, generating an idempotency key if none was given.
pub fn transfer_request(
    source: AccountRef,
    destination: AccountRef,
    amount: Amount,
    submission: SubmissionArgs,
) -> Result<TransferRequest, LedgerError> {
    let (description, idempotency_key, metadata) = submission.into_parts()?;
    Ok(TransferRequest {
        source,
        destination,
        amount,
        description,
        idempotency_key,
        metadata,
    })
}

/// Builds the history filter and page from the `history` flags.
pub fn history_query(
    page: u32,
    per_page: u32,
    transaction_type: Option<TypeArg>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> (HistoryFilter, PageRequest) {
    let filter = HistoryFilter {
        from,
        to,
        transaction_type: transaction_type.map(Into::into),
    };
    (filter, PageRequest::new(page, per_page))
}

fn account_ref(raw: &str) -> Result<AccountRef, String> {
    parse_account_ref(raw).map_err(|e| e.to_string())
}

fn idempotency_key(raw: &str) -> Result<IdempotencyKey, String> {
    IdempotencyKey::parse(raw).map_err(|e| e.to_string())
}

fn metadata_entry(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err("metadata key must not be empty".to_string());
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALICE: &str = "01890a5d-ac96-774b-bcce-b302099a8057";

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["ledgerctl", "--principal", ALICE];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_transfer_by_number_with_key() {
        let cli = parse(&["transfer", "ACC12345", "acc67890", "12.50", "--key", "t-1", "-d", "rent"]);
        assert_eq!(cli.principal, ALICE.parse().unwrap());

        let Command::Transfer { source, destination, amount, submission } = cli.command else {
            panic!("expected transfer");
        };
        let request = transfer_request(source, destination, amount, submission).unwrap();
        assert_eq!(request.source, AccountRef::Number("ACC12345".into()));
        assert_eq!(request.destination, AccountRef::Number("ACC67890".into()));
        assert_eq!(request.amount.to_string(), "12.5");
        assert_eq!(request.idempotency_key.as_str(), "t-1");
        assert_eq!(request.description, "rent");
    }

    #[test]
    fn test_missing_key_is_generated() {
        let Command::Deposit(args) = parse(&["deposit", "ACC12345", "5"]).command else {
            panic!("expected deposit");
        };
        let request = args.into_request().unwrap();
        assert!(request.idempotency_key.as_str().starts_with("ledgerctl-"));
    }

    #[test]
    fn test_metadata_values() {
        let Command::Fee(args) = parse(&[
            "fee", "ACC12345", "1", "--meta", "batch=7", "--meta", "reason=monthly",
        ])
        .command
        else {
            panic!("expected fee");
        };
        let request = args.into_request().unwrap();
        assert_eq!(request.metadata["batch"], 7);
        assert_eq!(request.metadata["reason"], "monthly");
    }

    #[test]
    fn test_history_flags() {
        let Command::History { account, page, per_page, transaction_type, from, to } = parse(&[
            "history", ALICE, "--page", "2", "--per-page", "500", "--type", "withdrawal",
            "--from", "2026-10-01T00:00:00Z",
        ])
        .command
        else {
            panic!("expected history");
        };
        assert!(matches!(account, AccountRef::Id(_)));

        let (filter, page) = history_query(page, per_page, transaction_type, from, to);
        assert_eq!(filter.transaction_type, Some(TransactionType::Withdrawal));
        assert!(filter.from.is_some());
        assert!(filter.to.is_none());
        assert_eq!(page.page, 2);
        assert_eq!(page.per_page, 100);
    }

    #[rstest]
    #[case::bad_reference(&["deposit", "no!", "5"])]
    #[case::zero_amount(&["deposit", "ACC12345", "0"])]
    #[case::non_numeric_amount(&["deposit", "ACC12345", "ten"])]
    #[case::too_precise(&["deposit", "ACC12345", "0.00001"])]
    #[case::key_with_space(&["withdraw", "ACC12345", "5", "--key", "a b"])]
    #[case::bad_metadata(&["interest", "ACC12345", "5", "--meta", "novalue"])]
    #[case::bad_transaction_id(&["show", "not-a-uuid"])]
    fn test_rejected_arguments(#[case] args: &[&str]) {
        let mut full = vec!["ledgerctl", "--principal", ALICE];
        full.extend_from_slice(args);
        assert!(Cli::try_parse_from(full).is_err());
    }

    #[test]
    fn test_principal_is_required() {
        temp_env::with_var_unset("LEDGERCTL_PRINCIPAL", || {
            assert!(Cli::try_parse_from(["ledgerctl", "show", ALICE]).is_err());
        });
    }

    #[test]
    fn test_principal_from_environment() {
        temp_env::with_var("LEDGERCTL_PRINCIPAL", Some(ALICE), || {
            let cli = Cli::try_parse_from(["ledgerctl", "show", ALICE]).unwrap();
            assert_eq!(cli.principal, ALICE.parse().unwrap());
        });
    }
}
