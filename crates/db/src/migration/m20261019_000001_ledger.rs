//! Initial database migration.
//!
//! Creates the account store, the ledger store and the audit log, plus the triggers
//! that keep ledger rows append-mostly.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ACCOUNT STORE
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: LEDGER STORE
        // ============================================================
        db.execute_unprepared(LEDGER_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: AUDIT LOG
        // ============================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Account lifecycle
CREATE TYPE account_status AS ENUM ('active', 'frozen', 'closed');

-- Account product type
CREATE TYPE account_type AS ENUM ('checking', 'savings');

-- Ledger transaction type
CREATE TYPE ledger_transaction_type AS ENUM (
    'transfer',
    'deposit',
    'withdrawal',
    'interest',
    'fee'
);

-- Ledger transaction status
CREATE TYPE ledger_transaction_status AS ENUM (
    'pending',
    'completed',
    'failed',
    'reversed'
);

-- Audit outcome
CREATE TYPE audit_outcome AS ENUM ('success', 'failure');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    number VARCHAR(34) NOT NULL UNIQUE,
    account_type account_type NOT NULL DEFAULT 'checking',
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    currency CHAR(3) NOT NULL,
    status account_status NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_accounts_balance_non_negative CHECK (balance >= 0),
    CONSTRAINT chk_accounts_currency_format CHECK (currency ~ '^[A-Z]{3}$')
);

CREATE INDEX idx_accounts_owner ON accounts(owner_id);
";

const LEDGER_TRANSACTIONS_SQL: &str = r"
CREATE TABLE ledger_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    idempotency_key VARCHAR(128) NOT NULL,
    transaction_type ledger_transaction_type NOT NULL,
    status ledger_transaction_status NOT NULL DEFAULT 'pending',
    amount NUMERIC(19, 4) NOT NULL,
    currency CHAR(3) NOT NULL,
    from_account_id UUID REFERENCES accounts(id),
    to_account_id UUID REFERENCES accounts(id),
    description VARCHAR(500) NOT NULL DEFAULT '',
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    initiated_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    completed_at TIMESTAMPTZ,
    CONSTRAINT uq_ledger_transactions_idempotency_key UNIQUE (idempotency_key),
    CONSTRAINT chk_ledger_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_ledger_distinct_accounts CHECK (from_account_id <> to_account_id),
    CONSTRAINT chk_ledger_type_shape CHECK (
        (transaction_type = 'transfer'
            AND from_account_id IS NOT NULL AND to_account_id IS NOT NULL)
        OR (transaction_type IN ('deposit', 'interest')
            AND from_account_id IS NULL AND to_account_id IS NOT NULL)
        OR (transaction_type IN ('withdrawal', 'fee')
            AND from_account_id IS NOT NULL AND to_account_id IS NULL)
    ),
    CONSTRAINT chk_ledger_completed_at CHECK (
        status <> 'completed' OR completed_at IS NOT NULL
    )
);

CREATE INDEX idx_ledger_from_account ON ledger_transactions(from_account_id, created_at DESC)
    WHERE from_account_id IS NOT NULL;
CREATE INDEX idx_ledger_to_account ON ledger_transactions(to_account_id, created_at DESC)
    WHERE to_account_id IS NOT NULL;
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    transaction_id UUID,
    actor_id UUID NOT NULL,
    action VARCHAR(64) NOT NULL,
    outcome audit_outcome NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    occurred_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_logs_transaction ON audit_logs(transaction_id)
    WHERE transaction_id IS NOT NULL;
CREATE INDEX idx_audit_logs_actor ON audit_logs(actor_id, created_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: stamp_ledger_completion
-- completed_at comes from the store clock, same instant as created_at
-- ============================================================
CREATE OR REPLACE FUNCTION stamp_ledger_completion()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.status = 'completed' AND NEW.completed_at IS NULL THEN
        NEW.completed_at := now();
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_stamp_ledger_completion
BEFORE INSERT ON ledger_transactions
FOR EACH ROW
EXECUTE FUNCTION stamp_ledger_completion();

-- ============================================================
-- FUNCTION: prevent_ledger_mutation
-- Ledger rows are immutable except completed -> reversed
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_mutation()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'DELETE' THEN
        RAISE EXCEPTION 'Ledger transactions cannot be deleted';
    END IF;

    IF NEW.id <> OLD.id
        OR NEW.idempotency_key <> OLD.idempotency_key
        OR NEW.transaction_type <> OLD.transaction_type
        OR NEW.amount <> OLD.amount
        OR NEW.currency <> OLD.currency
        OR NEW.from_account_id IS DISTINCT FROM OLD.from_account_id
        OR NEW.to_account_id IS DISTINCT FROM OLD.to_account_id
        OR NEW.created_at <> OLD.created_at THEN
        RAISE EXCEPTION 'Ledger transaction % is immutable', OLD.id;
    END IF;

    IF NEW.status <> OLD.status
        AND NOT (OLD.status = 'completed' AND NEW.status = 'reversed') THEN
        RAISE EXCEPTION 'Invalid ledger status transition % -> %', OLD.status, NEW.status;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_ledger_mutation
BEFORE UPDATE OR DELETE ON ledger_transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_mutation();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_prevent_ledger_mutation ON ledger_transactions;
DROP TRIGGER IF EXISTS trg_stamp_ledger_completion ON ledger_transactions;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_ledger_mutation();
DROP FUNCTION IF EXISTS stamp_ledger_completion();

-- Drop tables
DROP TABLE IF EXISTS audit_logs;
DROP TABLE IF EXISTS ledger_transactions;
DROP TABLE IF EXISTS accounts;

-- Drop enums
DROP TYPE IF EXISTS audit_outcome;
DROP TYPE IF EXISTS ledger_transaction_status;
DROP TYPE IF EXISTS ledger_transaction_type;
DROP TYPE IF EXISTS account_type;
DROP TYPE IF EXISTS account_status;
";
