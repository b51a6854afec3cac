//! GraphQL [`Mutation`]s definitions.

use common::{DateTime, Money};
use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Lists a new `Property` let by the authenticated landlord.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NON_POSITIVE_PRICE` - the provided monthly price is not positive.
    /// - `PRICE_TOO_HIGH` - the provided monthly price exceeds the maximum.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createProperty",
            name = %name,
            otel.name = Self::SPAN_NAME,
            price = %price,
        ),
    )]
    pub async fn create_property(
        name: api::property::Name,
        price: Money,
        payout_account: Option<api::property::PayoutAccount>,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateProperty {
                landlord_id: my_id.into(),
                name: name.into(),
                price,
                payout_account: payout_account.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Requests to rent the `Property` with the provided ID on behalf of the
    /// authenticated tenant.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` does not exist;
    /// - `PROPERTY_NOT_AVAILABLE` - the `Property` is occupied;
    /// - `OWN_PROPERTY` - the `Property` belongs to the authenticated user.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createRentalRequest",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
        ),
    )]
    pub async fn create_rental_request(
        property_id: api::property::Id,
        message: Option<api::rental_request::Message>,
        ctx: &Context,
    ) -> Result<api::RentalRequest, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateRentalRequest {
                property_id: property_id.into(),
                tenant_id: my_id.into(),
                message: message.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Accepts the `RentalRequest` with the provided ID, generating a
    /// `PENDING` `Lease` for the provided term.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_REQUEST_NOT_EXISTS` - the `RentalRequest` does not exist, or
    ///                                 is addressed to another landlord;
    /// - `RENTAL_REQUEST_ALREADY_DECIDED` - the `RentalRequest` has been
    ///                                      decided already;
    /// - `PROPERTY_NOT_AVAILABLE` - the `Property` is occupied;
    /// - `INVALID_LEASE_TERM` - `startsAt` is not before `endsAt`.
    #[tracing::instrument(
        skip_all,
        fields(
            ends_at = ?ends_at,
            gql.name = "acceptRentalRequest",
            otel.name = Self::SPAN_NAME,
            request_id = %request_id,
            starts_at = ?starts_at,
        ),
    )]
    pub async fn accept_rental_request(
        request_id: api::rental_request::Id,
        starts_at: DateTime,
        ends_at: DateTime,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::AcceptRentalRequest {
                request_id: request_id.into(),
                landlord_id: my_id.into(),
                starts_at: starts_at.coerce(),
                ends_at: ends_at.coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Rejects the `RentalRequest` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_REQUEST_NOT_EXISTS` - the `RentalRequest` does not exist, or
    ///                                 is addressed to another landlord;
    /// - `RENTAL_REQUEST_ALREADY_DECIDED` - the `RentalRequest` has been
    ///                                      decided already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rejectRentalRequest",
            otel.name = Self::SPAN_NAME,
            request_id = %request_id,
        ),
    )]
    pub async fn reject_rental_request(
        request_id: api::rental_request::Id,
        ctx: &Context,
    ) -> Result<api::RentalRequest, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::RejectRentalRequest {
                request_id: request_id.into(),
                landlord_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Signs the `Lease` with the provided ID on behalf of the authenticated
    /// party.
    ///
    /// Signing never activates the `Lease`: it becomes `ACTIVE` only once the
    /// first payment is received.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist;
    /// - `NOT_LEASE_PARTY` - the authenticated user is not a party of the
    ///                       `Lease`;
    /// - `LEASE_NOT_PENDING` - the `Lease` is not `PENDING`;
    /// - `LEASE_ALREADY_SIGNED` - the party has signed the `Lease` already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "signLease",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn sign_lease(
        lease_id: api::lease::Id,
        signature: api::lease::Signature,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::SignLease {
                lease_id: lease_id.into(),
                signer_id: my_id.into(),
                signature: signature.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Declines the `PENDING` `Lease` with the provided ID on behalf of the
    /// authenticated party, expiring it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist;
    /// - `NOT_LEASE_PARTY` - the authenticated user is not a party of the
    ///                       `Lease`;
    /// - `LEASE_NOT_PENDING` - the `Lease` is not `PENDING`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "declineLease",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn decline_lease(
        lease_id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeclineLease {
                lease_id: lease_id.into(),
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Claims, on behalf of the authenticated tenant, to have paid the rent
    /// of the `Lease` with the provided ID outside the platform.
    ///
    /// The amount is `months` times the monthly price of the `Property`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist, or the
    ///                        authenticated user is not its tenant;
    /// - `INVALID_MONTHS` - `months` is not within `1..=24`;
    /// - `LEASE_EXPIRED` - the `Lease` is expired;
    /// - `LEASE_NOT_SIGNED_BY_TENANT` - the tenant hasn't signed the `Lease`;
    /// - `PAYMENT_AWAITING_CONFIRMATION` - another offline payment awaits
    ///                                     confirmation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "claimOfflinePayment",
            lease_id = %lease_id,
            months = ?months,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn claim_offline_payment(
        lease_id: api::lease::Id,
        months: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let months = api::lease::parse_months(months).map_err(ctx.error())?;
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ClaimOfflinePayment {
                lease_id: lease_id.into(),
                tenant_id: my_id.into(),
                months,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Confirms, on behalf of the authenticated landlord, the receipt of the
    /// offline payment claimed for the `Lease` with the provided ID.
    ///
    /// Activates the `Lease` if it's `PENDING`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist, or the
    ///                        authenticated user is not its landlord;
    /// - `LEASE_EXPIRED` - the `Lease` is expired;
    /// - `NO_PAYMENT_TO_CONFIRM` - no offline payment awaits confirmation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "confirmOfflinePayment",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn confirm_offline_payment(
        lease_id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ConfirmOfflinePayment {
                lease_id: lease_id.into(),
                landlord_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Rejects, on behalf of the authenticated landlord, the offline payment
    /// claimed for the `Lease` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist, or the
    ///                        authenticated user is not its landlord;
    /// - `LEASE_EXPIRED` - the `Lease` is expired;
    /// - `NO_PAYMENT_TO_CONFIRM` - no offline payment awaits confirmation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rejectOfflinePayment",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reject_offline_payment(
        lease_id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::RejectOfflinePayment {
                lease_id: lease_id.into(),
                landlord_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a `CardPayment` of the rent of the `Lease` with the provided
    /// ID on behalf of the authenticated tenant.
    ///
    /// The amount is `months` times the monthly price of the `Property`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist, or the
    ///                        authenticated user is not its tenant;
    /// - `INVALID_MONTHS` - `months` is not within `1..=24`;
    /// - `LEASE_EXPIRED` - the `Lease` is expired;
    /// - `LEASE_NOT_SIGNED_BY_TENANT` - the tenant hasn't signed the `Lease`;
    /// - `PAYMENT_AWAITING_CONFIRMATION` - an offline payment awaits
    ///                                     confirmation;
    /// - `PAYMENT_GATEWAY_FAILED` - the payment gateway failed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createCardPayment",
            lease_id = %lease_id,
            months = ?months,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_card_payment(
        lease_id: api::lease::Id,
        months: Option<i32>,
        ctx: &Context,
    ) -> Result<api::payment::CardPayment, Error> {
        let months = api::lease::parse_months(months).map_err(ctx.error())?;
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateCardPayment {
                lease_id: lease_id.into(),
                tenant_id: my_id.into(),
                months,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Settles the `CardPayment` with the provided intent ID, once the client
    /// has confirmed it.
    ///
    /// Activates the `Lease` if it's `PENDING`. Settling the same
    /// `CardPayment` again has no effect.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist, or the
    ///                        authenticated user is not its tenant;
    /// - `PAYMENT_INTENT_NOT_EXISTS` - the `CardPayment` does not exist or
    ///                                 was made for another `Lease`;
    /// - `PAYMENT_NOT_SETTLED` - the `CardPayment` is still processing;
    /// - `PAYMENT_FAILED` - the `CardPayment` has been declined;
    /// - `LEASE_EXPIRED` - the `Lease` is expired;
    /// - `PAYMENT_GATEWAY_FAILED` - the payment gateway failed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "settleCardPayment",
            intent_id = %intent_id,
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn settle_card_payment(
        lease_id: api::lease::Id,
        intent_id: api::payment::IntentId,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::SettleCardPayment {
                lease_id: lease_id.into(),
                tenant_id: my_id.into(),
                intent_id: intent_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Terminates the `ACTIVE` `Lease` with the provided ID early, on behalf
    /// of the authenticated landlord.
    ///
    /// If the rent is paid up, the unused days are owed back to the tenant
    /// and the `Lease` stays `TERMINATING` for the grace period. Otherwise,
    /// it expires immediately.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist, or the
    ///                        authenticated user is not its landlord;
    /// - `LEASE_NOT_ACTIVE` - the `Lease` is not `ACTIVE`;
    /// - `LEASE_EXPIRED` - the `Lease` is expired.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "terminateLease",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn terminate_lease(
        lease_id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::TerminateLease {
                lease_id: lease_id.into(),
                landlord_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Confirms, on behalf of the authenticated tenant, the early termination
    /// of the `TERMINATING` `Lease` with the provided ID, expiring it before
    /// its grace period is over.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` does not exist, or the
    ///                        authenticated user is not its tenant;
    /// - `LEASE_NOT_TERMINATING` - the `Lease` is not `TERMINATING`;
    /// - `LEASE_EXPIRED` - the `Lease` is expired.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "confirmTermination",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn confirm_termination(
        lease_id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ConfirmTermination {
                lease_id: lease_id.into(),
                tenant_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum PartyError {
        #[code = "NOT_LEASE_PARTY"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not a party of the `Lease`"]
        NotParty,
    }
}

impl AsError for command::create_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NON_POSITIVE_PRICE"]
                #[status = BAD_REQUEST]
                #[message = "Monthly price must be positive"]
                NonPositivePrice,

                #[code = "PRICE_TOO_HIGH"]
                #[status = BAD_REQUEST]
                #[message = "Monthly price exceeds the maximum"]
                PriceTooHigh,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NonPositivePrice(_) => Some(Error::NonPositivePrice.into()),
            Self::PriceTooHigh(_) => Some(Error::PriceTooHigh.into()),
        }
    }
}

impl AsError for command::create_rental_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "OWN_PROPERTY"]
                #[status = CONFLICT]
                #[message = "`Property` belongs to the authenticated user"]
                OwnProperty,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::OwnProperty(_) => Error::OwnProperty.into(),
            Self::PropertyNotAvailable(_) => {
                api::query::PropertyError::NotAvailable.into()
            }
            Self::PropertyNotExists(_) => {
                api::query::PropertyError::NotExists.into()
            }
        })
    }
}

impl AsError for command::accept_rental_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_LEASE_TERM"]
                #[status = BAD_REQUEST]
                #[message = "`Lease` must start before it ends"]
                InvalidTerm,
            }
        }

        Some(match self {
            Self::AlreadyDecided(e) => return e.try_as_error(),
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTerm => Error::InvalidTerm.into(),
            Self::PropertyNotAvailable(_) => {
                api::query::PropertyError::NotAvailable.into()
            }
            Self::PropertyNotExists(_) => return None,
            Self::RequestNotExists(_) => {
                api::query::RentalRequestError::NotExists.into()
            }
        })
    }
}

impl AsError for command::reject_rental_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyDecided(e) => e.try_as_error(),
            Self::Db(e) => e.try_as_error(),
            Self::RequestNotExists(_) => {
                Some(api::query::RentalRequestError::NotExists.into())
            }
        }
    }
}

impl AsError for command::sign_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::LeaseNotExists(_) => api::query::LeaseError::NotExists.into(),
            Self::NotParty(_) => PartyError::NotParty.into(),
            Self::PropertyNotExists(_) => return None,
            Self::Transition(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::decline_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::LeaseNotExists(_) => api::query::LeaseError::NotExists.into(),
            Self::NotParty(_) => PartyError::NotParty.into(),
            Self::PropertyNotExists(_) => return None,
            Self::Transition(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::claim_offline_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::PropertyNotExists(_) | Self::AmountOverflow(_) => None,
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::confirm_offline_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::PropertyNotExists(_) => None,
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::reject_offline_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::PropertyNotExists(_) => None,
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::create_card_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Gateway(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::PropertyNotExists(_) | Self::AmountOverflow(_) => None,
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::settle_card_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PAYMENT_INTENT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`CardPayment` does not exist"]
                IntentNotExists,

                #[code = "PAYMENT_NOT_SETTLED"]
                #[status = CONFLICT]
                #[message = "`CardPayment` is still processing"]
                NotSettled,

                #[code = "PAYMENT_FAILED"]
                #[status = PAYMENT_REQUIRED]
                #[message = "`CardPayment` has been declined"]
                PaymentFailed,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Gateway(e) => return e.try_as_error(),
            Self::IntentNotExists(_) => Error::IntentNotExists.into(),
            Self::LeaseNotExists(_) => api::query::LeaseError::NotExists.into(),
            Self::NotSettled(_) => Error::NotSettled.into(),
            Self::PaymentFailed(_) => Error::PaymentFailed.into(),
            Self::PropertyNotExists(_) => return None,
            Self::Transition(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::terminate_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::PropertyNotExists(_) | Self::AmountOverflow(_) => None,
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::confirm_termination::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::PropertyNotExists(_) => None,
            Self::Transition(e) => e.try_as_error(),
        }
    }
}
