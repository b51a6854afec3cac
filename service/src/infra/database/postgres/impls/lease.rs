//! [`Lease`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Insert, Lock, Select, Update},
    DateTime, Money,
};
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        lease::{self, Months, Payment, PaymentMethod, Termination},
        user, Lease,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::lease::DueToExpire,
};

/// Columns of the `leases` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, property_id, landlord_id, tenant_id, rental_request_id, \
    body, starts_at, ends_at, \
    landlord_signed, tenant_signed, status, \
    payment_method, payment_amount, payment_currency, \
    payment_months, payment_confirmed, \
    termination_requested_at, grace_ends_at, \
    refund_amount, refund_currency, \
    created_at, expired_at";

/// Selects [`Lease`]s matching the provided SQL `condition`.
async fn select<C: Connection>(
    conn: &C,
    condition: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<Vec<Lease>, Traced<database::Error>> {
    let sql = format!("SELECT {COLUMNS} FROM leases WHERE {condition}");
    Ok(conn
        .query(sql.as_str(), params)
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .map(from_row)
        .collect())
}

/// Reads a [`Lease`] out of the provided [`Row`].
fn from_row(row: &Row) -> Lease {
    let payment = match (
        row.get::<_, Option<PaymentMethod>>("payment_method"),
        row.get::<_, Option<Decimal>>("payment_amount"),
        row.get::<_, Option<Currency>>("payment_currency"),
        row.get::<_, Option<Months>>("payment_months"),
        row.get::<_, Option<bool>>("payment_confirmed"),
    ) {
        (
            Some(method),
            Some(amount),
            Some(currency),
            Some(months),
            Some(confirmed),
        ) => Some(Payment {
            method,
            amount: Money { amount, currency },
            months,
            confirmed,
        }),
        _ => None,
    };

    let termination = row
        .get::<_, Option<lease::TerminationDateTime>>("termination_requested_at")
        .map(|requested_at| Termination {
            requested_at,
            grace_ends_at: row.get("grace_ends_at"),
            refund: row
                .get::<_, Option<Decimal>>("refund_amount")
                .zip(row.get::<_, Option<Currency>>("refund_currency"))
                .map(|(amount, currency)| Money { amount, currency }),
        });

    Lease {
        id: row.get("id"),
        property_id: row.get("property_id"),
        landlord_id: row.get("landlord_id"),
        tenant_id: row.get("tenant_id"),
        rental_request_id: row.get("rental_request_id"),
        body: row.get("body"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        landlord_signed: row.get("landlord_signed"),
        tenant_signed: row.get("tenant_signed"),
        status: row.get("status"),
        payment,
        termination,
        created_at: row.get("created_at"),
        expired_at: row.get("expired_at"),
    }
}

impl<C> Database<Select<By<Option<Lease>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        Ok(select(&**self, "id = $1::UUID LIMIT 1", &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Database<Select<By<Vec<Lease>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Lease>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();

        select(
            &**self,
            "landlord_id = $1::UUID OR tenant_id = $1::UUID \
             ORDER BY created_at DESC, id",
            &[&user_id],
        )
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<DueToExpire>, DateTime>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<DueToExpire>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<DueToExpire>, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner();

        Ok(select(
            &**self,
            "(status = $1::INT2 AND grace_ends_at <= $3::TIMESTAMPTZ) \
             OR (status = $2::INT2 AND ends_at <= $3::TIMESTAMPTZ) \
             ORDER BY created_at, id",
            &[&lease::Status::Terminating, &lease::Status::Active, &now],
        )
        .await
        .map_err(tracerr::wrap!())?
        .into_iter()
        .map(DueToExpire)
        .collect())
    }
}

impl<C> Database<Insert<Lease>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Lease>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lease): Insert<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(lease)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Lease>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(lease): Update<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        let Lease {
            id,
            property_id,
            landlord_id,
            tenant_id,
            rental_request_id,
            body,
            starts_at,
            ends_at,
            landlord_signed,
            tenant_signed,
            status,
            payment,
            termination,
            created_at,
            expired_at,
        } = lease;

        let payment_method = payment.map(|p| p.method);
        let payment_amount = payment.map(|p| p.amount.amount);
        let payment_currency = payment.map(|p| p.amount.currency);
        let payment_months = payment.map(|p| p.months);
        let payment_confirmed = payment.map(|p| p.confirmed);
        let termination_requested_at = termination.map(|t| t.requested_at);
        let grace_ends_at = termination.and_then(|t| t.grace_ends_at);
        let refund = termination.and_then(|t| t.refund);
        let refund_amount = refund.map(|r| r.amount);
        let refund_currency = refund.map(|r| r.currency);

        const SQL: &str = "\
            INSERT INTO leases (\
                id, property_id, landlord_id, tenant_id, rental_request_id, \
                body, starts_at, ends_at, \
                landlord_signed, tenant_signed, status, \
                payment_method, payment_amount, payment_currency, \
                payment_months, payment_confirmed, \
                termination_requested_at, grace_ends_at, \
                refund_amount, refund_currency, \
                created_at, expired_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::UUID, \
                $6::TEXT, $7::TIMESTAMPTZ, $8::TIMESTAMPTZ, \
                $9::BOOL, $10::BOOL, $11::INT2, \
                $12::INT2, $13::NUMERIC, $14::INT2, \
                $15::INT2, $16::BOOL, \
                $17::TIMESTAMPTZ, $18::TIMESTAMPTZ, \
                $19::NUMERIC, $20::INT2, \
                $21::TIMESTAMPTZ, $22::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET body = EXCLUDED.body, \
                landlord_signed = EXCLUDED.landlord_signed, \
                tenant_signed = EXCLUDED.tenant_signed, \
                status = EXCLUDED.status, \
                payment_method = EXCLUDED.payment_method, \
                payment_amount = EXCLUDED.payment_amount, \
                payment_currency = EXCLUDED.payment_currency, \
                payment_months = EXCLUDED.payment_months, \
                payment_confirmed = EXCLUDED.payment_confirmed, \
                termination_requested_at = \
                    EXCLUDED.termination_requested_at, \
                grace_ends_at = EXCLUDED.grace_ends_at, \
                refund_amount = EXCLUDED.refund_amount, \
                refund_currency = EXCLUDED.refund_currency, \
                expired_at = EXCLUDED.expired_at";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &landlord_id,
                &tenant_id,
                &rental_request_id,
                &body,
                &starts_at,
                &ends_at,
                &landlord_signed,
                &tenant_signed,
                &status,
                &payment_method,
                &payment_amount,
                &payment_currency,
                &payment_months,
                &payment_confirmed,
                &termination_requested_at,
                &grace_ends_at,
                &refund_amount,
                &refund_currency,
                &created_at,
                &expired_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Lease, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: lease::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM leases \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
