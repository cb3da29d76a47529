use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::payment::{PaymentRecord, PaymentStatus, PaymentType};

#[derive(Debug, Clone)]
pub struct TransitionUpdate {
    pub next: PaymentStatus,
    pub attempt: i32,
    pub failure_reason: Option<String>,
}

/// Durable keyed storage for payment records. `apply_transition` is the
/// compare-and-set primitive: it succeeds only while the record is still in
/// the expected status, so racing reconciliations serialize per record.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn save(&self, record: &PaymentRecord) -> Result<()>;

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentRecord>>;

    async fn find_by_external_intent_id(
        &self,
        external_intent_id: &str,
    ) -> Result<Option<PaymentRecord>>;

    async fn apply_transition(
        &self,
        payment_id: Uuid,
        expected: PaymentStatus,
        update: &TransitionUpdate,
    ) -> Result<bool>;
}

#[derive(Clone)]
pub struct PaymentsRepo {
    pub pool: PgPool,
}

impl PaymentsRepo {
    pub async fn list_stale_nonterminal(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT payment_id, subscription_id, user_id, user_email, external_intent_id,
                   client_secret, amount_minor, currency, status, payment_type,
                   attempt, failure_reason, created_at, updated_at
            FROM payments
            WHERE status IN ('INITIATED', 'PROCESSING', 'PENDING') AND updated_at < $1
            ORDER BY updated_at ASC
            LIMIT $2
            "#,
        )
        .bind(older_than)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }
}

#[async_trait]
impl PaymentStore for PaymentsRepo {
    async fn save(&self, record: &PaymentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, subscription_id, user_id, user_email, external_intent_id,
                client_secret, amount_minor, currency, status, payment_type,
                attempt, failure_reason, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10,
                $11, $12, $13, $14
            )
            ON CONFLICT (payment_id) DO UPDATE SET
                status = EXCLUDED.status,
                attempt = EXCLUDED.attempt,
                failure_reason = EXCLUDED.failure_reason,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.payment_id)
        .bind(&record.subscription_id)
        .bind(&record.user_id)
        .bind(&record.user_email)
        .bind(&record.external_intent_id)
        .bind(&record.client_secret)
        .bind(record.amount_minor)
        .bind(&record.currency)
        .bind(record.status.as_str())
        .bind(record.payment_type.as_str())
        .bind(record.attempt)
        .bind(&record.failure_reason)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT payment_id, subscription_id, user_id, user_email, external_intent_id,
                   client_secret, amount_minor, currency, status, payment_type,
                   attempt, failure_reason, created_at, updated_at
            FROM payments
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_record).transpose()
    }

    async fn find_by_external_intent_id(
        &self,
        external_intent_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT payment_id, subscription_id, user_id, user_email, external_intent_id,
                   client_secret, amount_minor, currency, status, payment_type,
                   attempt, failure_reason, created_at, updated_at
            FROM payments
            WHERE external_intent_id = $1
            "#,
        )
        .bind(external_intent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_record).transpose()
    }

    async fn apply_transition(
        &self,
        payment_id: Uuid,
        expected: PaymentStatus,
        update: &TransitionUpdate,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $3,
                attempt = $4,
                failure_reason = COALESCE($5, failure_reason),
                updated_at = now()
            WHERE payment_id = $1 AND status = $2
            "#,
        )
        .bind(payment_id)
        .bind(expected.as_str())
        .bind(update.next.as_str())
        .bind(update.attempt)
        .bind(&update.failure_reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn row_to_record(r: sqlx::postgres::PgRow) -> Result<PaymentRecord> {
    let status_raw: String = r.get("status");
    let type_raw: String = r.get("payment_type");

    Ok(PaymentRecord {
        payment_id: r.get("payment_id"),
        subscription_id: r.get("subscription_id"),
        user_id: r.get("user_id"),
        user_email: r.get("user_email"),
        external_intent_id: r.get("external_intent_id"),
        client_secret: r.get("client_secret"),
        amount_minor: r.get("amount_minor"),
        currency: r.get("currency"),
        status: PaymentStatus::parse(&status_raw)
            .ok_or_else(|| anyhow::anyhow!("unknown stored status: {status_raw}"))?,
        payment_type: PaymentType::parse(&type_raw)
            .ok_or_else(|| anyhow::anyhow!("unknown stored payment type: {type_raw}"))?,
        attempt: r.get("attempt"),
        failure_reason: r.get("failure_reason"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}
