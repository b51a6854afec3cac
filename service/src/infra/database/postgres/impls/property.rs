//! [`Property`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, landlord_id, name, \
                   price_amount, price_currency, payout_account, \
                   occupancy, current_tenant_id, \
                   created_at \
            FROM properties \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Property {
                id: row.get("id"),
                landlord_id: row.get("landlord_id"),
                name: row.get("name"),
                price: Money {
                    amount: row.get::<_, Decimal>("price_amount"),
                    currency: row.get::<_, Currency>("price_currency"),
                },
                payout_account: row.get("payout_account"),
                occupancy: row.get("occupancy"),
                current_tenant_id: row.get("current_tenant_id"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<Property>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Property>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let Property {
            id,
            landlord_id,
            name,
            price,
            payout_account,
            occupancy,
            current_tenant_id,
            created_at,
        } = property;

        const SQL: &str = "\
            INSERT INTO properties (\
                id, landlord_id, name, \
                price_amount, price_currency, payout_account, \
                occupancy, current_tenant_id, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, \
                $4::NUMERIC, $5::INT2, $6::VARCHAR, \
                $7::INT2, $8::UUID, \
                $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                price_amount = EXCLUDED.price_amount, \
                price_currency = EXCLUDED.price_currency, \
                payout_account = EXCLUDED.payout_account, \
                occupancy = EXCLUDED.occupancy, \
                current_tenant_id = EXCLUDED.current_tenant_id";
        self.exec(
            SQL,
            &[
                &id,
                &landlord_id,
                &name,
                &price.amount,
                &price.currency,
                &payout_account,
                &occupancy,
                &current_tenant_id,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM properties \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
