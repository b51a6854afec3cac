//! [`Lease`] definitions.

pub mod refund;
pub mod rent;

use std::time::Duration;

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xxhash_rust::xxh3;

#[cfg(doc)]
use crate::domain::RentalRequest;
use crate::domain::{property, rental_request, user, Property};

/// Period after an early termination during which the refund is expected to
/// be settled, before the [`Lease`] expires.
pub const GRACE_PERIOD: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Tenancy contract between one landlord and one tenant for one
/// [`Property`].
#[derive(Clone, Debug)]
pub struct Lease {
    /// ID of this [`Lease`].
    pub id: Id,

    /// ID of the let [`Property`].
    pub property_id: property::Id,

    /// ID of the landlord letting the [`Property`].
    pub landlord_id: user::Id,

    /// ID of the tenant renting the [`Property`].
    pub tenant_id: user::Id,

    /// ID of the [`RentalRequest`] this [`Lease`] was generated for, if any.
    pub rental_request_id: Option<rental_request::Id>,

    /// [`Body`] text of this [`Lease`].
    pub body: Body,

    /// [`DateTime`] when the tenancy starts.
    pub starts_at: StartDateTime,

    /// [`DateTime`] when the tenancy naturally ends.
    pub ends_at: EndDateTime,

    /// Indicator whether the landlord has signed this [`Lease`].
    pub landlord_signed: bool,

    /// Indicator whether the tenant has signed this [`Lease`].
    pub tenant_signed: bool,

    /// [`Status`] of this [`Lease`].
    pub status: Status,

    /// Latest [`Payment`] made for this [`Lease`], if any.
    pub payment: Option<Payment>,

    /// [`Termination`] requested for this [`Lease`], if any.
    pub termination: Option<Termination>,

    /// [`DateTime`] when this [`Lease`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Lease`] expired, if it did.
    pub expired_at: Option<ExpirationDateTime>,
}

impl Lease {
    /// Indicates whether the tenancy of this [`Lease`] is running, so rent is
    /// owed for it.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.status, Status::Active | Status::Terminating)
    }

    /// Returns the [`Party`] the provided user takes in this [`Lease`], if
    /// any.
    #[must_use]
    pub fn party_of(&self, user_id: user::Id) -> Option<Party> {
        if user_id == self.landlord_id {
            Some(Party::Landlord)
        } else if user_id == self.tenant_id {
            Some(Party::Tenant)
        } else {
            None
        }
    }

    /// Returns ID of the user taking the provided [`Party`] in this
    /// [`Lease`].
    #[must_use]
    pub fn party_id(&self, party: Party) -> user::Id {
        match party {
            Party::Landlord => self.landlord_id,
            Party::Tenant => self.tenant_id,
        }
    }

    /// Indicates whether this [`Lease`] should be expired at the provided
    /// [`DateTime`], either because its grace period is over or because it
    /// reached its natural end.
    #[must_use]
    pub fn is_due_to_expire(&self, now: DateTime) -> bool {
        match self.status {
            Status::Terminating => self
                .termination
                .and_then(|t| t.grace_ends_at)
                .is_some_and(|at| at <= now.coerce()),
            Status::Active => self.ends_at <= now.coerce(),
            Status::Pending | Status::Expired => false,
        }
    }

    /// Signs this [`Lease`] on behalf of the provided [`Party`], appending a
    /// signature line to its [`Body`].
    ///
    /// Never changes the [`Status`].
    ///
    /// # Errors
    ///
    /// - If this [`Lease`] is not [`Status::Pending`].
    /// - If the [`Party`] has signed it already.
    pub fn sign(
        &mut self,
        party: Party,
        signature: &Signature,
        at: DateTime,
    ) -> Result<(), TransitionError> {
        self.ensure_status(Status::Pending)?;

        let signed = match party {
            Party::Landlord => &mut self.landlord_signed,
            Party::Tenant => &mut self.tenant_signed,
        };
        if *signed {
            return Err(TransitionError::AlreadySigned(party));
        }
        *signed = true;

        let digest = self.body.digest();
        self.body.append_line(&format!(
            "Signed by {party}: {signature} on {} (document {digest})",
            at.to_human_date(),
        ));
        Ok(())
    }

    /// Checks whether a new [`Payment`] can be made for this [`Lease`].
    ///
    /// # Errors
    ///
    /// - If this [`Lease`] is [`Status::Expired`].
    /// - If the tenant hasn't signed it yet.
    /// - If an offline [`Payment`] is awaiting the landlord's confirmation.
    pub fn ensure_payable(&self) -> Result<(), TransitionError> {
        if self.status == Status::Expired {
            return Err(TransitionError::Expired);
        }
        if !self.tenant_signed {
            return Err(TransitionError::NotSignedByTenant);
        }
        if self.payment.is_some_and(|p| !p.confirmed) {
            return Err(TransitionError::PaymentAwaitingConfirmation);
        }
        Ok(())
    }

    /// Records the tenant's claim of having paid the provided `amount`
    /// covering the provided [`Months`] outside the platform.
    ///
    /// The [`Status`] stays unchanged until the landlord confirms the claim.
    ///
    /// # Errors
    ///
    /// See [`Lease::ensure_payable()`].
    pub fn claim_offline_payment(
        &mut self,
        amount: Money,
        months: Months,
    ) -> Result<(), TransitionError> {
        self.ensure_payable()?;

        self.payment = Some(Payment {
            method: PaymentMethod::Offline,
            amount,
            months,
            confirmed: false,
        });
        Ok(())
    }

    /// Confirms the pending offline [`Payment`] of this [`Lease`], activating
    /// it if it's [`Status::Pending`].
    ///
    /// # Errors
    ///
    /// - If this [`Lease`] is [`Status::Expired`].
    /// - If there is no offline [`Payment`] awaiting confirmation.
    pub fn confirm_offline_payment(
        &mut self,
    ) -> Result<Settlement, TransitionError> {
        if self.status == Status::Expired {
            return Err(TransitionError::Expired);
        }
        let payment = self
            .payment
            .as_mut()
            .filter(|p| p.method == PaymentMethod::Offline && !p.confirmed)
            .ok_or(TransitionError::NoPaymentToConfirm)?;
        payment.confirmed = true;
        let payment = *payment;

        Ok(Settlement {
            payment,
            activated: self.activate(),
        })
    }

    /// Rejects the pending offline [`Payment`] of this [`Lease`], returning
    /// the tenant to the payment selection.
    ///
    /// # Errors
    ///
    /// - If this [`Lease`] is [`Status::Expired`].
    /// - If there is no offline [`Payment`] awaiting confirmation.
    pub fn reject_offline_payment(
        &mut self,
    ) -> Result<Payment, TransitionError> {
        if self.status == Status::Expired {
            return Err(TransitionError::Expired);
        }
        if !self
            .payment
            .is_some_and(|p| p.method == PaymentMethod::Offline && !p.confirmed)
        {
            return Err(TransitionError::NoPaymentToConfirm);
        }
        self.payment.take().ok_or(TransitionError::NoPaymentToConfirm)
    }

    /// Records a settled card payment of the provided `amount` covering the
    /// provided [`Months`], activating this [`Lease`] if it's
    /// [`Status::Pending`].
    ///
    /// # Errors
    ///
    /// See [`Lease::ensure_payable()`].
    pub fn settle_card_payment(
        &mut self,
        amount: Money,
        months: Months,
    ) -> Result<Settlement, TransitionError> {
        self.ensure_payable()?;

        let payment = Payment {
            method: PaymentMethod::Card,
            amount,
            months,
            confirmed: true,
        };
        self.payment = Some(payment);

        Ok(Settlement {
            payment,
            activated: self.activate(),
        })
    }

    /// Terminates this [`Lease`] early on behalf of the landlord.
    ///
    /// With a `refund` owed, the [`Lease`] becomes [`Status::Terminating`]
    /// until the [`GRACE_PERIOD`] is over. Without it, the [`Lease`] expires
    /// immediately.
    ///
    /// # Errors
    ///
    /// If this [`Lease`] is not [`Status::Active`].
    pub fn terminate(
        &mut self,
        refund: Option<Money>,
        now: DateTime,
    ) -> Result<(), TransitionError> {
        self.ensure_status(Status::Active)?;

        self.termination = Some(Termination {
            requested_at: now.coerce(),
            grace_ends_at: refund.map(|_| (now + GRACE_PERIOD).coerce()),
            refund,
        });
        if refund.is_some() {
            self.status = Status::Terminating;
        } else {
            self.mark_expired(now);
        }
        Ok(())
    }

    /// Confirms the early termination of this [`Lease`] on behalf of the
    /// tenant, expiring it before its grace period is over.
    ///
    /// # Errors
    ///
    /// If this [`Lease`] is not [`Status::Terminating`].
    pub fn confirm_termination(
        &mut self,
        now: DateTime,
    ) -> Result<(), TransitionError> {
        self.ensure_status(Status::Terminating)?;
        self.mark_expired(now);
        Ok(())
    }

    /// Declines this not yet active [`Lease`], expiring it.
    ///
    /// # Errors
    ///
    /// If this [`Lease`] is not [`Status::Pending`].
    pub fn decline(&mut self, now: DateTime) -> Result<(), TransitionError> {
        self.ensure_status(Status::Pending)?;
        self.mark_expired(now);
        Ok(())
    }

    /// Expires this [`Lease`].
    ///
    /// # Errors
    ///
    /// If this [`Lease`] is [`Status::Expired`] already.
    pub fn expire(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status == Status::Expired {
            return Err(TransitionError::Expired);
        }
        self.mark_expired(now);
        Ok(())
    }

    /// Moves this [`Lease`] from [`Status::Pending`] to [`Status::Active`].
    ///
    /// Returns `false` if it wasn't [`Status::Pending`].
    fn activate(&mut self) -> bool {
        if self.status != Status::Pending {
            return false;
        }
        self.status = Status::Active;
        true
    }

    /// Moves this [`Lease`] to [`Status::Expired`].
    fn mark_expired(&mut self, now: DateTime) {
        self.status = Status::Expired;
        self.expired_at = Some(now.coerce());
    }

    /// Checks this [`Lease`] to have the `expected` [`Status`].
    fn ensure_status(&self, expected: Status) -> Result<(), TransitionError> {
        use TransitionError as E;

        match (self.status, expected) {
            (actual, expected) if actual == expected => Ok(()),
            (Status::Expired, _) => Err(E::Expired),
            (actual, Status::Pending) => Err(E::NotPending(actual)),
            (actual, Status::Active) => Err(E::NotActive(actual)),
            (actual, Status::Terminating | Status::Expired) => {
                Err(E::NotTerminating(actual))
            }
        }
    }
}

/// Error of an illegal [`Lease`] state transition.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum TransitionError {
    /// [`Party`] has signed the [`Lease`] already.
    #[display("`Lease` is already signed by the {_0}")]
    AlreadySigned(#[error(not(source))] Party),

    /// [`Lease`] is expired and cannot be changed anymore.
    #[display("`Lease` is expired")]
    Expired,

    /// There is no offline [`Payment`] awaiting confirmation.
    #[display("`Lease` has no offline payment awaiting confirmation")]
    NoPaymentToConfirm,

    /// [`Lease`] is not [`Status::Active`].
    #[display("`Lease` is `{_0}`, but `ACTIVE` is required")]
    NotActive(#[error(not(source))] Status),

    /// [`Lease`] is not [`Status::Pending`].
    #[display("`Lease` is `{_0}`, but `PENDING` is required")]
    NotPending(#[error(not(source))] Status),

    /// Tenant hasn't signed the [`Lease`] yet.
    #[display("`Lease` is not signed by the tenant")]
    NotSignedByTenant,

    /// [`Lease`] is not [`Status::Terminating`].
    #[display("`Lease` is `{_0}`, but `TERMINATING` is required")]
    NotTerminating(#[error(not(source))] Status),

    /// An offline [`Payment`] is awaiting the landlord's confirmation.
    #[display("`Lease` has an offline payment awaiting confirmation")]
    PaymentAwaitingConfirmation,
}

/// Side of a [`Lease`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Party {
    /// Landlord letting the [`Property`].
    #[display("landlord")]
    Landlord,

    /// Tenant renting the [`Property`].
    #[display("tenant")]
    Tenant,
}

impl Party {
    /// Returns the other side of a [`Lease`].
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Landlord => Self::Tenant,
            Self::Tenant => Self::Landlord,
        }
    }
}

/// Payment made for a [`Lease`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Payment {
    /// [`PaymentMethod`] of this [`Payment`].
    pub method: PaymentMethod,

    /// Paid amount.
    pub amount: Money,

    /// Number of [`Months`] this [`Payment`] covers.
    pub months: Months,

    /// Indicator whether this [`Payment`] has been received.
    ///
    /// Card payments are confirmed once settled, offline ones once the
    /// landlord acknowledges them.
    pub confirmed: bool,
}

/// Outcome of a confirmed [`Payment`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settlement {
    /// Confirmed [`Payment`].
    pub payment: Payment,

    /// Indicator whether the [`Lease`] has been activated by the
    /// [`Payment`].
    pub activated: bool,
}

define_kind! {
    #[doc = "Method of a [`Payment`]."]
    enum PaymentMethod {
        #[doc = "Paid outside the platform, confirmed by the landlord."]
        Offline = 1,

        #[doc = "Paid by card through the payment gateway."]
        Card = 2,
    }
}

/// Early termination of a [`Lease`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Termination {
    /// [`DateTime`] when the landlord requested the termination.
    pub requested_at: TerminationDateTime,

    /// [`DateTime`] when the grace period ends, if there is one.
    pub grace_ends_at: Option<GraceDateTime>,

    /// Amount owed back to the tenant, if any.
    pub refund: Option<Money>,
}

define_kind! {
    #[doc = "Status of a [`Lease`]."]
    enum Status {
        #[doc = "Awaiting signatures and the first payment."]
        Pending = 1,

        #[doc = "Tenancy is running."]
        Active = 2,

        #[doc = "Terminated early, the grace period is running."]
        Terminating = 3,

        #[doc = "Ended, never changes anymore."]
        Expired = 4,
    }
}

/// ID of a [`Lease`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Number of months a [`Payment`] covers.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
pub struct Months(u8);

impl Months {
    /// A single month.
    pub const ONE: Self = Self(1);

    /// Maximum number of months paid at once.
    pub const MAX: Self = Self(24);

    /// Creates new [`Months`] if the given number is within
    /// `1..=`[`Months::MAX`].
    #[must_use]
    pub fn new(months: u8) -> Option<Self> {
        (Self::ONE.0..=Self::MAX.0)
            .contains(&months)
            .then_some(Self(months))
    }

    /// Returns the number of these [`Months`].
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the price of these [`Months`] at the provided monthly price,
    /// or [`None`] if it overflows.
    #[must_use]
    pub fn price(self, monthly: Money) -> Option<Money> {
        Some(Money {
            amount: monthly.amount.checked_mul(Decimal::from(self.0))?,
            currency: monthly.currency,
        })
    }
}

impl From<Months> for u32 {
    fn from(months: Months) -> Self {
        Self::from(months.0)
    }
}

impl FromStr for Months {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Months`")
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    //! Module providing [`Months`] persistence as `INT2`.

    use std::error::Error;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };

    use super::Months;

    impl<'a> FromSql<'a> for Months {
        accepts!(INT2);

        fn from_sql(
            ty: &Type,
            raw: &'a [u8],
        ) -> Result<Self, Box<dyn Error + Sync + Send>> {
            let months = i16::from_sql(ty, raw)?;
            u8::try_from(months)
                .ok()
                .and_then(Self::new)
                .ok_or_else(|| format!("invalid `Months` value: {months}").into())
        }
    }

    impl ToSql for Months {
        accepts!(INT2);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
            i16::from(self.0).to_sql(ty, w)
        }
    }
}

/// Text of a [`Lease`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Body(String);

impl Body {
    /// Maximum length of a [`Body`] in bytes, when created.
    pub const MAX_LEN: usize = 64 * 1024;

    /// Creates a new [`Body`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `body` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    /// Creates a new [`Body`] if the given `body` is valid.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Option<Self> {
        let body = body.into();
        Self::check(&body).then_some(Self(body))
    }

    /// Generates the standard [`Body`] of a [`Lease`] for the provided
    /// [`Property`].
    #[must_use]
    pub fn generate(
        property: &Property,
        tenant_id: user::Id,
        starts_at: StartDateTime,
        ends_at: EndDateTime,
    ) -> Self {
        let Property {
            name,
            landlord_id,
            price,
            ..
        } = property;
        let grace_days = GRACE_PERIOD.as_secs() / (24 * 60 * 60);

        Self(format!(
            "RESIDENTIAL TENANCY AGREEMENT\n\
             \n\
             Property: {name}\n\
             Landlord: {landlord_id}\n\
             Tenant: {tenant_id}\n\
             Term: {} to {}\n\
             Monthly rent: {price}\n\
             \n\
             1. The tenant pays the rent monthly in advance, either by card \
             through the platform or offline, in which case the landlord \
             confirms the receipt.\n\
             2. The tenancy begins once the tenant has signed this agreement \
             and the first payment has been received.\n\
             3. The landlord may end the tenancy early. If the rent is paid \
             up, the unused part of it is refunded within {grace_days} days, \
             after which the tenancy ends. Otherwise, the tenancy ends \
             immediately.",
            starts_at.to_human_date(),
            ends_at.to_human_date(),
        ))
    }

    /// Returns the [`Digest`] of this [`Body`].
    #[must_use]
    pub fn digest(&self) -> Digest {
        Digest(xxh3::xxh3_128(self.0.as_bytes()))
    }

    /// Appends the provided `line` as a separate paragraph.
    fn append_line(&mut self, line: &str) {
        self.0.push_str("\n\n");
        self.0.push_str(line);
    }

    /// Checks whether the given `body` is a valid [`Body`].
    fn check(body: impl AsRef<str>) -> bool {
        let body = body.as_ref();
        !body.trim().is_empty() && body.len() <= Self::MAX_LEN
    }
}

impl FromStr for Body {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Body`")
    }
}

/// Digest of a [`Body`], binding a signature to the exact text signed.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("{_0:032x}")]
pub struct Digest(u128);

/// Signature typed by a [`Party`] when signing a [`Lease`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(forward)]
pub struct Signature(String);

impl Signature {
    /// Creates a new [`Signature`] if the given `signature` is valid.
    #[must_use]
    pub fn new(signature: impl Into<String>) -> Option<Self> {
        let signature = signature.into();
        Self::check(&signature).then_some(Self(signature))
    }

    /// Checks whether the given `signature` is a valid [`Signature`].
    fn check(signature: impl AsRef<str>) -> bool {
        let signature = signature.as_ref();
        signature.trim() == signature
            && !signature.is_empty()
            && signature.len() <= 128
            && !signature.chars().any(char::is_control)
    }
}

impl FromStr for Signature {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Signature`")
    }
}

/// Marker type describing the beginning of a tenancy.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing the natural end of a tenancy.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Marker type describing the end of a grace period.
#[derive(Clone, Copy, Debug)]
pub struct Grace;

/// [`DateTime`] when a [`Lease`] starts.
pub type StartDateTime = DateTimeOf<(Lease, Start)>;

/// [`DateTime`] when a [`Lease`] naturally ends.
pub type EndDateTime = DateTimeOf<(Lease, End)>;

/// [`DateTime`] when a [`Lease`] was created.
pub type CreationDateTime = DateTimeOf<(Lease, unit::Creation)>;

/// [`DateTime`] when a [`Lease`] expired.
pub type ExpirationDateTime = DateTimeOf<(Lease, unit::Expiration)>;

/// [`DateTime`] when a [`Lease`] termination was requested.
pub type TerminationDateTime = DateTimeOf<(Lease, Termination)>;

/// [`DateTime`] when a [`Lease`] grace period ends.
pub type GraceDateTime = DateTimeOf<(Lease, Grace)>;

#[cfg(test)]
pub(crate) mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money};

    use crate::domain::{property, user};

    use super::{
        Body, Id, Lease, Months, Party, PaymentMethod, Signature, Status,
        TransitionError, GRACE_PERIOD,
    };

    pub(crate) fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    pub(crate) fn gbp(amount: &str) -> Money {
        Money::from_str(&format!("{amount}GBP")).unwrap()
    }

    pub(crate) fn lease() -> Lease {
        Lease {
            id: Id::new(),
            property_id: property::Id::new(),
            landlord_id: user::Id::new(),
            tenant_id: user::Id::new(),
            rental_request_id: None,
            body: Body::new("Terms.").unwrap(),
            starts_at: at("2026-09-01T00:00:00Z").coerce(),
            ends_at: at("2027-06-30T00:00:00Z").coerce(),
            landlord_signed: false,
            tenant_signed: false,
            status: Status::Pending,
            payment: None,
            termination: None,
            created_at: at("2026-08-20T10:00:00Z").coerce(),
            expired_at: None,
        }
    }

    fn signed_lease() -> Lease {
        let mut lease = lease();
        lease
            .sign(
                Party::Tenant,
                &Signature::new("Jane Doe").unwrap(),
                at("2026-08-21T12:00:00Z"),
            )
            .unwrap();
        lease
    }

    fn active_lease() -> Lease {
        let mut lease = signed_lease();
        _ = lease
            .settle_card_payment(gbp("1200"), Months::ONE)
            .unwrap();
        lease
    }

    #[test]
    fn signing_appends_line_and_keeps_status() {
        let mut lease = lease();
        let digest = lease.body.digest();

        lease
            .sign(
                Party::Tenant,
                &Signature::new("Jane Doe").unwrap(),
                at("2026-08-21T12:00:00Z"),
            )
            .unwrap();

        assert_eq!(lease.status, Status::Pending);
        assert!(lease.tenant_signed);
        assert!(!lease.landlord_signed);
        assert_eq!(
            lease.body.as_ref(),
            format!(
                "Terms.\n\nSigned by tenant: Jane Doe on August 21, 2026 \
                 (document {digest})",
            ),
        );
    }

    #[test]
    fn cannot_sign_twice() {
        let mut lease = signed_lease();
        let body = lease.body.clone();

        let res = lease.sign(
            Party::Tenant,
            &Signature::new("Jane Doe").unwrap(),
            at("2026-08-22T12:00:00Z"),
        );

        assert!(matches!(
            res,
            Err(TransitionError::AlreadySigned(Party::Tenant)),
        ));
        assert_eq!(lease.body, body);
    }

    #[test]
    fn both_parties_sign_independently() {
        let mut lease = signed_lease();

        lease
            .sign(
                Party::Landlord,
                &Signature::new("John Smith").unwrap(),
                at("2026-08-22T12:00:00Z"),
            )
            .unwrap();

        assert!(lease.tenant_signed);
        assert!(lease.landlord_signed);
        assert_eq!(lease.status, Status::Pending);
    }

    #[test]
    fn cannot_pay_before_tenant_signs() {
        let mut lease = lease();

        assert!(matches!(
            lease.claim_offline_payment(gbp("1200"), Months::ONE),
            Err(TransitionError::NotSignedByTenant),
        ));
        assert!(matches!(
            lease.settle_card_payment(gbp("1200"), Months::ONE),
            Err(TransitionError::NotSignedByTenant),
        ));
        assert_eq!(lease.status, Status::Pending);
        assert_eq!(lease.payment, None);
    }

    #[test]
    fn settled_card_payment_activates() {
        let mut lease = signed_lease();

        let settlement = lease
            .settle_card_payment(gbp("2400"), Months::new(2).unwrap())
            .unwrap();

        assert!(settlement.activated);
        assert_eq!(settlement.payment.method, PaymentMethod::Card);
        assert!(settlement.payment.confirmed);
        assert_eq!(lease.status, Status::Active);
    }

    #[test]
    fn offline_payment_activates_only_once_confirmed() {
        let mut lease = signed_lease();

        lease
            .claim_offline_payment(gbp("1200"), Months::ONE)
            .unwrap();
        assert_eq!(lease.status, Status::Pending);
        assert!(lease.payment.is_some_and(|p| !p.confirmed));

        assert!(matches!(
            lease.claim_offline_payment(gbp("1200"), Months::ONE),
            Err(TransitionError::PaymentAwaitingConfirmation),
        ));
        assert!(matches!(
            lease.settle_card_payment(gbp("1200"), Months::ONE),
            Err(TransitionError::PaymentAwaitingConfirmation),
        ));

        let settlement = lease.confirm_offline_payment().unwrap();
        assert!(settlement.activated);
        assert_eq!(settlement.payment.amount, gbp("1200"));
        assert_eq!(lease.status, Status::Active);
    }

    #[test]
    fn rejected_offline_payment_returns_to_selection() {
        let mut lease = signed_lease();
        lease
            .claim_offline_payment(gbp("1200"), Months::ONE)
            .unwrap();

        let rejected = lease.reject_offline_payment().unwrap();

        assert_eq!(rejected.method, PaymentMethod::Offline);
        assert_eq!(lease.payment, None);
        assert_eq!(lease.status, Status::Pending);
        assert!(matches!(
            lease.confirm_offline_payment(),
            Err(TransitionError::NoPaymentToConfirm),
        ));
        lease
            .claim_offline_payment(gbp("1200"), Months::ONE)
            .unwrap();
    }

    #[test]
    fn further_payments_keep_lease_active() {
        let mut lease = active_lease();

        lease
            .claim_offline_payment(gbp("1200"), Months::ONE)
            .unwrap();
        let settlement = lease.confirm_offline_payment().unwrap();

        assert!(!settlement.activated);
        assert_eq!(lease.status, Status::Active);
    }

    #[test]
    fn termination_with_refund_starts_grace_period() {
        let mut lease = active_lease();
        let now = at("2026-10-01T09:00:00Z");

        lease.terminate(Some(gbp("500")), now).unwrap();

        assert_eq!(lease.status, Status::Terminating);
        let termination = lease.termination.unwrap();
        assert_eq!(termination.refund, Some(gbp("500")));
        assert_eq!(
            termination.grace_ends_at,
            Some((now + GRACE_PERIOD).coerce()),
        );
        assert!(!lease.is_due_to_expire(at("2026-10-04T08:59:59Z")));
        assert!(lease.is_due_to_expire(at("2026-10-04T09:00:00Z")));
    }

    #[test]
    fn termination_without_refund_expires_immediately() {
        let mut lease = active_lease();
        let now = at("2026-10-01T09:00:00Z");

        lease.terminate(None, now).unwrap();

        assert_eq!(lease.status, Status::Expired);
        assert_eq!(lease.expired_at, Some(now.coerce()));
        assert_eq!(lease.termination.and_then(|t| t.grace_ends_at), None);
    }

    #[test]
    fn only_active_lease_terminates() {
        let mut lease = signed_lease();

        assert!(matches!(
            lease.terminate(None, at("2026-10-01T09:00:00Z")),
            Err(TransitionError::NotActive(Status::Pending)),
        ));
    }

    #[test]
    fn tenant_confirms_termination() {
        let mut lease = active_lease();
        lease
            .terminate(Some(gbp("500")), at("2026-10-01T09:00:00Z"))
            .unwrap();

        lease
            .confirm_termination(at("2026-10-02T09:00:00Z"))
            .unwrap();

        assert_eq!(lease.status, Status::Expired);
    }

    #[test]
    fn expired_lease_is_immutable() {
        let mut lease = active_lease();
        lease.terminate(None, at("2026-10-01T09:00:00Z")).unwrap();
        let now = at("2026-10-02T09:00:00Z");

        assert!(matches!(
            lease.sign(Party::Landlord, &Signature::new("J").unwrap(), now),
            Err(TransitionError::Expired),
        ));
        assert!(matches!(
            lease.claim_offline_payment(gbp("1200"), Months::ONE),
            Err(TransitionError::Expired),
        ));
        assert!(matches!(
            lease.settle_card_payment(gbp("1200"), Months::ONE),
            Err(TransitionError::Expired),
        ));
        assert!(matches!(
            lease.terminate(None, now),
            Err(TransitionError::Expired),
        ));
        assert!(matches!(lease.decline(now), Err(TransitionError::Expired)));
        assert!(matches!(lease.expire(now), Err(TransitionError::Expired)));
        assert!(matches!(
            lease.confirm_termination(now),
            Err(TransitionError::Expired),
        ));
    }

    #[test]
    fn declines_only_pending_lease() {
        let mut pending = lease();
        pending.decline(at("2026-08-22T00:00:00Z")).unwrap();
        assert_eq!(pending.status, Status::Expired);

        let mut active = active_lease();
        assert!(matches!(
            active.decline(at("2026-08-22T00:00:00Z")),
            Err(TransitionError::NotPending(Status::Active)),
        ));
    }

    #[test]
    fn active_lease_expires_at_its_end() {
        let lease = active_lease();

        assert!(!lease.is_due_to_expire(at("2027-06-29T23:59:59Z")));
        assert!(lease.is_due_to_expire(at("2027-06-30T00:00:00Z")));
    }

    #[test]
    fn months_are_bounded() {
        assert_eq!(Months::new(0), None);
        assert_eq!(Months::new(24), Some(Months::MAX));
        assert_eq!(Months::new(25), None);
        assert_eq!(
            Months::new(3).unwrap().price(gbp("450.50")),
            Some(gbp("1351.5")),
        );
    }

    #[test]
    fn months_price_overflows_without_panicking() {
        let price = gbp("4000000000000000000000000000");

        assert_eq!(Months::MAX.price(price), None);
        assert_eq!(Months::ONE.price(price), Some(price));
    }

    #[test]
    fn body_is_bounded() {
        assert!(Body::new("  ").is_none());
        assert!(Body::new("a".repeat(Body::MAX_LEN)).is_some());
        assert!(Body::new("a".repeat(Body::MAX_LEN + 1)).is_none());
    }

    #[test]
    fn party_is_resolved() {
        let lease = lease();

        assert_eq!(lease.party_of(lease.landlord_id), Some(Party::Landlord));
        assert_eq!(lease.party_of(lease.tenant_id), Some(Party::Tenant));
        assert_eq!(lease.party_of(user::Id::new()), None);
        assert_eq!(Party::Tenant.counterpart(), Party::Landlord);
    }

    #[test]
    fn generates_body_mentioning_terms() {
        let property = property::Property {
            id: property::Id::new(),
            landlord_id: user::Id::new(),
            name: property::Name::new("Flat 4, Rose Court").unwrap(),
            price: gbp("1200"),
            payout_account: None,
            occupancy: property::Occupancy::Available,
            current_tenant_id: None,
            created_at: DateTime::now().coerce(),
        };

        let body = Body::generate(
            &property,
            user::Id::new(),
            at("2026-09-01T00:00:00Z").coerce(),
            at("2027-06-30T00:00:00Z").coerce(),
        );

        assert!(AsRef::<str>::as_ref(&body).contains("Property: Flat 4, Rose Court"));
        assert!(AsRef::<str>::as_ref(&body).contains("Term: September 1, 2026 to June 30, 2027"));
        assert!(AsRef::<str>::as_ref(&body).contains("Monthly rent: 1200GBP"));
        assert!(AsRef::<str>::as_ref(&body).contains("within 3 days"));
    }
}
