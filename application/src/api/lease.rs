//! [`Lease`]-related definitions.

use common::{DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{api, api::scalar, define_error, AsError, Context, Error};

/// A tenancy contract between a landlord and a tenant.
#[derive(Clone, Debug, From, Into)]
pub struct Lease(domain::Lease);

/// A tenancy contract between a landlord and a tenant for a `Property`.
#[graphql_object(context = Context)]
impl Lease {
    /// Unique identifier of this `Lease`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Let `Property`.
    #[expect(unsafe_code, reason = "properties are never deleted")]
    #[must_use]
    pub fn property(&self) -> api::Property {
        unsafe { api::Property::new_unchecked(self.0.property_id) }
    }

    /// ID of the landlord letting the `Property`.
    #[must_use]
    pub fn landlord_id(&self) -> api::user::Id {
        self.0.landlord_id.into()
    }

    /// ID of the tenant renting the `Property`.
    #[must_use]
    pub fn tenant_id(&self) -> api::user::Id {
        self.0.tenant_id.into()
    }

    /// ID of the `RentalRequest` this `Lease` was generated for, if any.
    #[must_use]
    pub fn rental_request_id(&self) -> Option<api::rental_request::Id> {
        self.0.rental_request_id.map(Into::into)
    }

    /// Text of this `Lease`, including the signature lines.
    #[must_use]
    pub fn body(&self) -> &str {
        self.0.body.as_ref()
    }

    /// Digest of the current text of this `Lease`.
    #[must_use]
    pub fn body_digest(&self) -> String {
        self.0.body.digest().to_string()
    }

    /// `DateTime` when the tenancy starts.
    #[must_use]
    pub fn starts_at(&self) -> DateTime {
        self.0.starts_at.coerce()
    }

    /// `DateTime` when the tenancy naturally ends.
    #[must_use]
    pub fn ends_at(&self) -> DateTime {
        self.0.ends_at.coerce()
    }

    /// Indicator whether the landlord has signed this `Lease`.
    #[must_use]
    pub fn landlord_signed(&self) -> bool {
        self.0.landlord_signed
    }

    /// Indicator whether the tenant has signed this `Lease`.
    #[must_use]
    pub fn tenant_signed(&self) -> bool {
        self.0.tenant_signed
    }

    /// Status of this `Lease`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Latest payment made for this `Lease`, if any.
    #[must_use]
    pub fn payment(&self) -> Option<Payment> {
        self.0.payment.map(Payment)
    }

    /// Early termination of this `Lease`, if requested.
    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        self.0.termination.map(Termination)
    }

    /// `DateTime` when this `Lease` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Lease` expired, if it did.
    #[must_use]
    pub fn expired_at(&self) -> Option<DateTime> {
        self.0.expired_at.map(DateTimeOf::coerce)
    }

    /// Evaluates whether the rent of this `Lease` is due now.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.rentStatus",
            lease_id = %self.0.id,
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn rent_status(
        &self,
        ctx: &Context,
    ) -> Result<RentEvaluation, Error> {
        ctx.service()
            .execute(query::RentStatus { lease_id: self.0.id })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(RentEvaluation)
    }

    /// Quotes the refund owed to the tenant if this `Lease` was terminated
    /// now.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.refundQuote",
            lease_id = %self.0.id,
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn refund_quote(
        &self,
        ctx: &Context,
    ) -> Result<RefundQuote, Error> {
        ctx.service()
            .execute(query::RefundQuote { lease_id: self.0.id })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(RefundQuote)
    }

    /// Money movements recorded for this `Lease`, most recent first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.transactions",
            lease_id = %self.0.id,
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn transactions(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Transaction>, Error> {
        let mut transactions = ctx
            .service()
            .execute(query::transaction::ByLease::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        transactions.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));

        Ok(transactions.into_iter().map(Into::into).collect())
    }
}

/// A payment made for a `Lease`.
#[derive(Clone, Copy, Debug)]
pub struct Payment(domain::lease::Payment);

/// A payment made for a `Lease`.
#[graphql_object(name = "LeasePayment", context = Context)]
impl Payment {
    /// Method of this `LeasePayment`.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.0.method.into()
    }

    /// Paid amount.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Number of months this `LeasePayment` covers.
    #[must_use]
    pub fn months(&self) -> i32 {
        i32::from(self.0.months.get())
    }

    /// Indicator whether this `LeasePayment` has been received.
    ///
    /// Offline payments stay unconfirmed until the landlord confirms them.
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.0.confirmed
    }
}

/// An early termination of a `Lease`.
#[derive(Clone, Copy, Debug)]
pub struct Termination(domain::lease::Termination);

/// An early termination of a `Lease`.
#[graphql_object(name = "LeaseTermination", context = Context)]
impl Termination {
    /// `DateTime` when the landlord requested this `LeaseTermination`.
    #[must_use]
    pub fn requested_at(&self) -> DateTime {
        self.0.requested_at.coerce()
    }

    /// `DateTime` when the grace period ends, if there is one.
    #[must_use]
    pub fn grace_ends_at(&self) -> Option<DateTime> {
        self.0.grace_ends_at.map(DateTimeOf::coerce)
    }

    /// Amount owed back to the tenant, if any.
    #[must_use]
    pub fn refund(&self) -> Option<Money> {
        self.0.refund
    }
}

/// Result of evaluating the rent owed for a `Lease`.
#[derive(Clone, Copy, Debug)]
pub struct RentEvaluation(domain::lease::rent::Evaluation);

/// Result of evaluating the rent owed for a `Lease`.
#[graphql_object(context = Context)]
impl RentEvaluation {
    /// Status of the rent.
    #[must_use]
    pub fn status(&self) -> RentStatus {
        self.0.status.into()
    }

    /// `DateTime` when the next rent payment is due, if the `Lease` is
    /// running.
    #[must_use]
    pub fn next_due_at(&self) -> Option<DateTime> {
        self.0.next_due_at.map(DateTimeOf::coerce)
    }

    /// Human-readable date when the next rent payment is due, if the
    /// `Lease` is running.
    #[must_use]
    pub fn next_due_date(&self) -> Option<String> {
        self.0.next_due_date()
    }
}

/// Quote of the refund owed to the tenant on an early termination.
#[derive(Clone, Copy, Debug)]
pub struct RefundQuote(query::rent::Quote);

/// Quote of the refund owed to the tenant on an early termination.
#[graphql_object(context = Context)]
impl RefundQuote {
    /// Rent evaluation the refund is based on.
    #[must_use]
    pub fn evaluation(&self) -> RentEvaluation {
        RentEvaluation(self.0.evaluation)
    }

    /// Amount owed back to the tenant.
    #[must_use]
    pub fn refund(&self) -> Money {
        self.0.refund
    }
}

/// Unique identifier of a `Lease`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::lease::Id)]
#[into(domain::lease::Id)]
#[graphql(name = "LeaseId", transparent)]
pub struct Id(Uuid);

/// Signature typed by a party signing a `Lease`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "LeaseSignature",
    with = scalar::Via::<domain::lease::Signature>,
)]
pub struct Signature(domain::lease::Signature);

/// Status of a `Lease`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "LeaseStatus")]
pub enum Status {
    /// Awaiting signatures and the first payment.
    Pending,

    /// Tenancy is running.
    Active,

    /// Terminated early, the grace period is running.
    Terminating,

    /// Ended, never changes anymore.
    Expired,
}

impl From<domain::lease::Status> for Status {
    fn from(status: domain::lease::Status) -> Self {
        use domain::lease::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Active => Self::Active,
            S::Terminating => Self::Terminating,
            S::Expired => Self::Expired,
        }
    }
}

/// Method of a `LeasePayment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "LeasePaymentMethod")]
pub enum PaymentMethod {
    /// Paid outside the platform, confirmed by the landlord.
    Offline,

    /// Paid by card through the payment gateway.
    Card,
}

impl From<domain::lease::PaymentMethod> for PaymentMethod {
    fn from(method: domain::lease::PaymentMethod) -> Self {
        use domain::lease::PaymentMethod as M;
        match method {
            M::Offline => Self::Offline,
            M::Card => Self::Card,
        }
    }
}

/// Status of the rent owed for a `Lease`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
pub enum RentStatus {
    /// Rent is paid up until the next due date.
    Paid,

    /// Next due date has passed without a payment.
    Due,

    /// `Lease` is not running, so no rent is owed.
    Inactive,
}

impl From<domain::lease::rent::Status> for RentStatus {
    fn from(status: domain::lease::rent::Status) -> Self {
        use domain::lease::rent::Status as S;
        match status {
            S::Paid => Self::Paid,
            S::Due => Self::Due,
            S::Inactive => Self::Inactive,
        }
    }
}

define_error! {
    enum MonthsError {
        #[code = "INVALID_MONTHS"]
        #[status = BAD_REQUEST]
        #[message = "Number of months must be between 1 and 24"]
        OutOfRange,
    }
}

/// Parses the number of [`domain::lease::Months`] paid at once, defaulting
/// to a single month.
///
/// # Errors
///
/// If the number is out of range.
pub(crate) fn parse_months(
    months: Option<i32>,
) -> Result<domain::lease::Months, Error> {
    months
        .map_or(Some(domain::lease::Months::ONE), |m| {
            u8::try_from(m).ok().and_then(domain::lease::Months::new)
        })
        .ok_or_else(|| MonthsError::OutOfRange.into())
}

impl AsError for domain::lease::TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LEASE_ALREADY_SIGNED"]
                #[status = CONFLICT]
                #[message = "`Lease` is already signed by this party"]
                AlreadySigned,

                #[code = "LEASE_EXPIRED"]
                #[status = CONFLICT]
                #[message = "`Lease` is expired"]
                Expired,

                #[code = "NO_PAYMENT_TO_CONFIRM"]
                #[status = CONFLICT]
                #[message = "`Lease` has no offline payment awaiting \
                             confirmation"]
                NoPaymentToConfirm,

                #[code = "LEASE_NOT_ACTIVE"]
                #[status = CONFLICT]
                #[message = "`Lease` must be `ACTIVE`"]
                NotActive,

                #[code = "LEASE_NOT_PENDING"]
                #[status = CONFLICT]
                #[message = "`Lease` must be `PENDING`"]
                NotPending,

                #[code = "LEASE_NOT_SIGNED_BY_TENANT"]
                #[status = CONFLICT]
                #[message = "`Lease` must be signed by the tenant first"]
                NotSignedByTenant,

                #[code = "LEASE_NOT_TERMINATING"]
                #[status = CONFLICT]
                #[message = "`Lease` must be `TERMINATING`"]
                NotTerminating,

                #[code = "PAYMENT_AWAITING_CONFIRMATION"]
                #[status = CONFLICT]
                #[message = "`Lease` has an offline payment awaiting \
                             confirmation"]
                PaymentAwaitingConfirmation,
            }
        }

        use domain::lease::TransitionError as E;
        Some(
            match self {
                E::AlreadySigned(_) => Error::AlreadySigned,
                E::Expired => Error::Expired,
                E::NoPaymentToConfirm => Error::NoPaymentToConfirm,
                E::NotActive(_) => Error::NotActive,
                E::NotPending(_) => Error::NotPending,
                E::NotSignedByTenant => Error::NotSignedByTenant,
                E::NotTerminating(_) => Error::NotTerminating,
                E::PaymentAwaitingConfirmation => {
                    Error::PaymentAwaitingConfirmation
                }
            }
            .into(),
        )
    }
}

impl AsError for query::rent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::PropertyNotExists(_) | Self::AmountOverflow(_) => None,
        }
    }
}

#[cfg(test)]
mod spec {
    use service::domain::lease::{Months, TransitionError};

    use crate::AsError as _;

    use super::parse_months;

    #[test]
    fn parses_months() {
        assert_eq!(parse_months(None).unwrap(), Months::ONE);
        assert_eq!(parse_months(Some(3)).unwrap(), Months::new(3).unwrap());
        assert_eq!(parse_months(Some(24)).unwrap(), Months::MAX);

        for invalid in [0, 25, -1, 300] {
            let err = parse_months(Some(invalid)).unwrap_err();
            assert_eq!(err.code, "INVALID_MONTHS", "accepted `{invalid}`");
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn maps_transition_errors_to_conflicts() {
        let err = TransitionError::NotSignedByTenant.as_error();

        assert_eq!(err.code, "LEASE_NOT_SIGNED_BY_TENANT");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }
}
