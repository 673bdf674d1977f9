//! Initial ledger schema.
//!
//! Creates the accounts, items and movements tables. Running balances and
//! item quantities are plain columns written by the ledger engine; the
//! database only enforces shape and uniqueness.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(ITEMS_SQL).await?;
        db.execute_unprepared(MOVEMENTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS movements CASCADE;
             DROP TABLE IF EXISTS items CASCADE;
             DROP TABLE IF EXISTS accounts CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    balance NUMERIC NOT NULL DEFAULT 0,
    enabled BOOLEAN NOT NULL DEFAULT TRUE,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_account_name_not_blank CHECK (length(trim(name)) > 0)
);
";

const ITEMS_SQL: &str = r"
CREATE TABLE items (
    code VARCHAR(64) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    quantity BIGINT NOT NULL DEFAULT 0,
    selling_price NUMERIC NOT NULL,
    last_cost_price NUMERIC,
    margin_percent NUMERIC,
    version BIGINT NOT NULL DEFAULT 0,
    CONSTRAINT chk_selling_price_non_negative CHECK (selling_price >= 0)
);
";

const MOVEMENTS_SQL: &str = r"
CREATE TABLE movements (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id),
    kind VARCHAR(16) NOT NULL,
    amount NUMERIC NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    occurred_at TIMESTAMPTZ NOT NULL,
    sequence BIGSERIAL NOT NULL,
    balance_after NUMERIC NOT NULL DEFAULT 0,
    actor_id UUID NOT NULL,
    actor_name VARCHAR(255) NOT NULL,
    direction VARCHAR(16),
    line_items JSONB,
    state VARCHAR(16) NOT NULL DEFAULT 'active',
    cancel_reason TEXT,
    cancelled_at TIMESTAMPTZ,
    cancelled_by_id UUID,
    cancelled_by_name VARCHAR(255),
    modify_reason TEXT,
    modified_at TIMESTAMPTZ,
    modified_by_id UUID,
    modified_by_name VARCHAR(255),
    prior_snapshot JSONB,
    replaces UUID REFERENCES movements(id),
    replaced_by UUID REFERENCES movements(id),
    idempotency_key VARCHAR(255),
    version BIGINT NOT NULL DEFAULT 0,
    CONSTRAINT chk_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_kind CHECK (kind IN ('outflow', 'inflow')),
    CONSTRAINT chk_state CHECK (state IN ('active', 'cancelled', 'restored', 'modified')),
    CONSTRAINT chk_lines_have_direction CHECK ((direction IS NULL) = (line_items IS NULL))
);

-- Replay order
CREATE INDEX idx_movements_account_order ON movements(account_id, occurred_at, sequence);

-- Time range listing
CREATE INDEX idx_movements_occurred_at ON movements(occurred_at, sequence);

-- Create retries are deduplicated per account
CREATE UNIQUE INDEX idx_movements_idempotency
    ON movements(account_id, idempotency_key)
    WHERE idempotency_key IS NOT NULL;
";
