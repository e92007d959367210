//! Demo data seeder for Corebank development and testing.
//!
//! Seeds one demo principal owning two USD accounts: `DEMOA00001` with 1000.00 and
//! `DEMOB00001` empty. Re-running is a no-op for accounts that already exist.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use corebank_db::entities::sea_orm_active_enums::AccountType;
use corebank_db::{AccountRepository, CreateAccountInput};
use corebank_shared::types::{CurrencyCode, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Demo principal id (stable across runs so `ledgerctl --principal` can be scripted).
const DEMO_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

const DEMO_ACCOUNTS: [(&str, AccountType, Decimal); 2] = [
    ("DEMOA00001", AccountType::Checking, dec!(1000)),
    ("DEMOB00001", AccountType::Savings, dec!(0)),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    println!("Connecting to database...");
    let db = corebank_db::connect(&database_url)
        .await
        .context("failed to connect to database")?;

    println!("Seeding demo accounts for principal {DEMO_USER_ID}...");
    seed_demo_accounts(&db).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_demo_accounts(db: &DatabaseConnection) -> anyhow::Result<()> {
    let accounts = AccountRepository::new(db.clone());
    let owner = UserId::from_uuid(DEMO_USER_ID);
    let usd = CurrencyCode::parse("USD")?;

    for (number, account_type, opening_balance) in DEMO_ACCOUNTS {
        if let Some(existing) = accounts.find_by_number(number).await? {
            println!("  {number} already exists ({}), skipping...", existing.id);
            continue;
        }

        let account = accounts
            .create_account(
                CreateAccountInput::new(owner, number, usd)
                    .with_type(account_type)
                    .with_opening_balance(opening_balance),
            )
            .await
            .with_context(|| format!("failed to create {number}"))?;

        println!("  Created {number} ({}) with {opening_balance} USD", account.id);
    }

    Ok(())
}
