//! [`Property`]-related definitions.

use std::future;

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A property let by a landlord.
#[derive(Clone, Debug, From)]
pub struct Property {
    /// ID of this [`Property`].
    id: Id,

    /// Underlying [`domain::Property`].
    property: OnceCell<domain::Property>,
}

impl From<domain::Property> for Property {
    fn from(property: domain::Property) -> Self {
        Self {
            id: property.id.into(),
            property: OnceCell::new_with(Some(property)),
        }
    }
}

impl Property {
    /// Creates a new [`Property`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Property`] with the provided ID exists,
    /// otherwise accessing this [`Property`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            property: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Property`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Property`] doesn't exist.
    async fn property(&self, ctx: &Context) -> Result<&domain::Property, Error> {
        let id = self.id.into();
        self.property
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::property::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|p| {
                        future::ready(p.ok_or_else(|| {
                            api::query::PropertyError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A property let by a landlord.
#[graphql_object(context = Context)]
impl Property {
    /// Unique identifier of this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// ID of the landlord owning this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.landlordId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn landlord_id(
        &self,
        ctx: &Context,
    ) -> Result<api::user::Id, Error> {
        Ok(self.property(ctx).await?.landlord_id.into())
    }

    /// Name of this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.property(ctx).await?.name.clone().into())
    }

    /// Monthly rent price of this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.price",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn price(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.property(ctx).await?.price)
    }

    /// Occupancy of this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.occupancy",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn occupancy(&self, ctx: &Context) -> Result<Occupancy, Error> {
        Ok(self.property(ctx).await?.occupancy.into())
    }

    /// ID of the tenant currently living in this `Property`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.currentTenantId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn current_tenant_id(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::user::Id>, Error> {
        Ok(self.property(ctx).await?.current_tenant_id.map(Into::into))
    }

    /// `DateTime` when this `Property` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.property(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Property`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::property::Id)]
#[into(domain::property::Id)]
#[graphql(name = "PropertyId", transparent)]
pub struct Id(Uuid);

/// Name of a `Property`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyName",
    with = scalar::Via::<domain::property::Name>,
)]
pub struct Name(domain::property::Name);

/// Account of a landlord at the payment gateway, receiving card payments.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyPayoutAccount",
    with = scalar::Via::<domain::property::PayoutAccount>,
)]
pub struct PayoutAccount(domain::property::PayoutAccount);

/// Occupancy of a `Property`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PropertyOccupancy")]
pub enum Occupancy {
    /// Free to be let.
    Available,

    /// Let to a tenant.
    Occupied,
}

impl From<domain::property::Occupancy> for Occupancy {
    fn from(occupancy: domain::property::Occupancy) -> Self {
        use domain::property::Occupancy as O;
        match occupancy {
            O::Available => Self::Available,
            O::Occupied => Self::Occupied,
        }
    }
}
