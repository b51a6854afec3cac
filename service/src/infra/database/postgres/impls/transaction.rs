//! [`Transaction`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Insert, Select},
    Money,
};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{lease, Transaction},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Vec<Transaction>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Transaction>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, lease_id, property_id, tenant_id, \
                   amount, currency, kind, status, \
                   months_covered, paid_at, reference \
            FROM transactions \
            WHERE lease_id = $1::UUID \
            ORDER BY paid_at, id";
        Ok(self
            .query(SQL, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Transaction {
                id: row.get("id"),
                lease_id: row.get("lease_id"),
                property_id: row.get("property_id"),
                tenant_id: row.get("tenant_id"),
                amount: Money {
                    amount: row.get::<_, Decimal>("amount"),
                    currency: row.get::<_, Currency>("currency"),
                },
                kind: row.get("kind"),
                status: row.get("status"),
                months_covered: row.get("months_covered"),
                paid_at: row.get("paid_at"),
                reference: row.get("reference"),
            })
            .collect())
    }
}

impl<C> Database<Insert<Transaction>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(tx): Insert<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        let Transaction {
            id,
            lease_id,
            property_id,
            tenant_id,
            amount,
            kind,
            status,
            months_covered,
            paid_at,
            reference,
        } = tx;

        // `Transaction`s are immutable, so an existing one is never touched.
        const SQL: &str = "\
            INSERT INTO transactions (\
                id, lease_id, property_id, tenant_id, \
                amount, currency, kind, status, \
                months_covered, paid_at, reference\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::NUMERIC, $6::INT2, $7::INT2, $8::INT2, \
                $9::INT2, $10::TIMESTAMPTZ, $11::VARCHAR\
            ) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(
            SQL,
            &[
                &id,
                &lease_id,
                &property_id,
                &tenant_id,
                &amount.amount,
                &amount.currency,
                &kind,
                &status,
                &months_covered,
                &paid_at,
                &reference,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
