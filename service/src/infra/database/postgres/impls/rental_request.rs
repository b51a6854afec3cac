//! [`RentalRequest`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{rental_request, RentalRequest},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<RentalRequest>, rental_request::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<RentalRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<RentalRequest>, rental_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, property_id, landlord_id, tenant_id, \
                   message, status, created_at \
            FROM rental_requests \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| RentalRequest {
                id: row.get("id"),
                property_id: row.get("property_id"),
                landlord_id: row.get("landlord_id"),
                tenant_id: row.get("tenant_id"),
                message: row.get("message"),
                status: row.get("status"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<RentalRequest>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<RentalRequest>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(request): Insert<RentalRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(request)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<RentalRequest>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(request): Update<RentalRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let RentalRequest {
            id,
            property_id,
            landlord_id,
            tenant_id,
            message,
            status,
            created_at,
        } = request;

        const SQL: &str = "\
            INSERT INTO rental_requests (\
                id, property_id, landlord_id, tenant_id, \
                message, status, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::TEXT, $6::INT2, $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &landlord_id,
                &tenant_id,
                &message,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
