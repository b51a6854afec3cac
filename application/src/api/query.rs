//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{domain, query, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns all the `Lease`s the authenticated user is a party of, most
    /// recent first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myLeases",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_leases(ctx: &Context) -> Result<Vec<api::Lease>, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let mut leases = ctx
            .service()
            .execute(query::lease::ByUser::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        leases.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(leases.into_iter().map(Into::into).collect())
    }

    /// Returns the `Lease` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` with the specified ID does not
    ///                        exist, or the authenticated user is not its
    ///                        party.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "lease",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn lease(
        id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = domain::user::Id::from(ctx.current_session().await?.user_id);

        ctx.service()
            .execute(query::lease::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .filter(|lease| lease.party_of(my_id).is_some())
            .ok_or_else(|| LeaseError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Property` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "property",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn property(
        id: api::property::Id,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        ctx.service()
            .execute(query::property::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| PropertyError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `RentalRequest` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_REQUEST_NOT_EXISTS` - the `RentalRequest` with the specified
    ///                                 ID does not exist, or the
    ///                                 authenticated user is neither its
    ///                                 tenant nor its landlord.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "rentalRequest",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rental_request(
        id: api::rental_request::Id,
        ctx: &Context,
    ) -> Result<api::RentalRequest, Error> {
        let my_id = domain::user::Id::from(ctx.current_session().await?.user_id);

        ctx.service()
            .execute(query::rental_request::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .filter(|req| req.tenant_id == my_id || req.landlord_id == my_id)
            .ok_or_else(|| RentalRequestError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum LeaseError {
        #[code = "LEASE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Lease` does not exist"]
        NotExists,
    }
}

define_error! {
    enum PropertyError {
        #[code = "PROPERTY_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Property` does not exist"]
        NotExists,

        #[code = "PROPERTY_NOT_AVAILABLE"]
        #[status = CONFLICT]
        #[message = "`Property` is occupied"]
        NotAvailable,
    }
}

define_error! {
    enum RentalRequestError {
        #[code = "RENTAL_REQUEST_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`RentalRequest` does not exist"]
        NotExists,
    }
}
