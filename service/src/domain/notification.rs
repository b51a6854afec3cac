//! [`Notification`] definitions.

use common::define_kind;

use crate::domain::{lease, user, Lease, Property};

/// One-way message informing a user about an event of their tenancy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    /// ID of the user to be notified.
    pub recipient_id: user::Id,

    /// [`Kind`] of the event.
    pub kind: Kind,

    /// [`Context`] of the event.
    pub context: Context,
}

impl Notification {
    /// Creates a new [`Notification`] about the provided [`Lease`] of the
    /// provided [`Property`].
    #[must_use]
    pub fn about_lease(
        recipient_id: user::Id,
        kind: Kind,
        lease: &Lease,
        property: &Property,
    ) -> Self {
        Self {
            recipient_id,
            kind,
            context: Context {
                property_name: Some(property.name.to_string()),
                link: Some(Context::lease_link(lease.id)),
                message: None,
            },
        }
    }

    /// Attaches the provided custom `message` to this [`Notification`].
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.context.message = Some(message.into());
        self
    }
}

/// Free-form context of a [`Notification`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Context {
    /// Name of the property the event relates to.
    pub property_name: Option<String>,

    /// Relative link to the page of the event.
    pub link: Option<String>,

    /// Custom message.
    pub message: Option<String>,
}

impl Context {
    /// Returns the relative link to the page of the provided [`Lease`].
    #[must_use]
    pub fn lease_link(id: lease::Id) -> String {
        format!("/leases/{id}")
    }
}

define_kind! {
    #[doc = "Kind of a [`Notification`]."]
    enum Kind {
        #[doc = "Rental request has been accepted by the landlord."]
        RequestAccepted = 1,

        #[doc = "Rental request has been rejected by the landlord."]
        RequestRejected = 2,

        #[doc = "Lease has been generated and awaits signing."]
        LeaseGenerated = 3,

        #[doc = "Lease has been signed by the other party."]
        LeaseSigned = 4,

        #[doc = "Lease has been declined by the other party."]
        LeaseDeclined = 5,

        #[doc = "Tenant claims to have paid offline."]
        OfflinePaymentPending = 6,

        #[doc = "Landlord has confirmed an offline payment."]
        OfflinePaymentApproved = 7,

        #[doc = "Landlord has rejected an offline payment."]
        OfflinePaymentRejected = 8,

        #[doc = "Card payment has been received."]
        CardPaymentReceived = 9,

        #[doc = "Landlord has terminated the tenancy early."]
        TenancyTerminating = 10,

        #[doc = "Tenancy has ended."]
        TenancyEnded = 11,

        #[doc = "New chat message has been received."]
        NewMessage = 12,
    }
}

#[cfg(test)]
mod spec {
    use super::Kind;

    #[test]
    fn kind_is_tagged_in_screaming_snake_case() {
        assert_eq!(Kind::OfflinePaymentPending.to_string(), "OFFLINE_PAYMENT_PENDING");
        assert_eq!(Kind::TenancyTerminating.to_string(), "TENANCY_TERMINATING");
        assert_eq!("NEW_MESSAGE".parse::<Kind>().unwrap(), Kind::NewMessage);
    }
}
