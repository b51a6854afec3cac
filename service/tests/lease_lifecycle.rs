//! Workflows of a [`Lease`] from its generation to its end.
//!
//! [`Lease`]: service::domain::Lease

mod support;

use common::Handler as _;
use service::{
    command::{
        ClaimOfflinePayment, ConfirmOfflinePayment, ConfirmTermination,
        CreateProperty, CreateRentalRequest, DeclineLease,
        RejectOfflinePayment, SignLease, TerminateLease,
    },
    domain::{
        lease::{self, rent},
        notification::Kind,
        property, user,
    },
    query::{self, RefundQuote, RentStatus},
};

use self::support::{gbp, Harness};

#[tokio::test]
async fn accepting_request_generates_pending_lease() {
    let h = Harness::new();

    let lease = h.accepted_lease("850").await;

    assert_eq!(lease.status, lease::Status::Pending);
    assert!(!lease.landlord_signed && !lease.tenant_signed);
    assert!(lease.body.to_string().contains("Monthly rent: 850GBP"));
    assert_eq!(
        h.notifications.kinds_for(lease.tenant_id),
        [Kind::RequestAccepted, Kind::LeaseGenerated],
    );
}

#[tokio::test]
async fn property_price_is_bounded() {
    let h = Harness::new();
    let create = |price| CreateProperty {
        landlord_id: user::Id::new(),
        name: property::Name::new("Room 4, 12 Mill Road").unwrap(),
        price: gbp(price),
        payout_account: None,
    };

    let err = h
        .service
        .execute(create("4000000000000000000000000000"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        service::command::create_property::ExecutionError::PriceTooHigh(_),
    ));

    let property = h.service.execute(create("1000000")).await.unwrap();
    assert_eq!(property.price, gbp("1000000"));
}

#[tokio::test]
async fn signing_never_activates_lease() {
    let h = Harness::new();
    let lease = h.accepted_lease("850").await;

    for signer_id in [lease.tenant_id, lease.landlord_id] {
        let signed = h
            .service
            .execute(SignLease {
                lease_id: lease.id,
                signer_id,
                signature: lease::Signature::new("Signed").unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(signed.status, lease::Status::Pending);
    }

    let lease = h.lease(lease.id).await;
    assert!(lease.landlord_signed && lease.tenant_signed);
    assert_eq!(lease.body.to_string().matches("Signed by").count(), 2);
    assert_eq!(
        h.notifications.kinds_for(lease.landlord_id),
        [Kind::LeaseSigned],
    );
}

#[tokio::test]
async fn confirmed_offline_payment_activates_lease() {
    let h = Harness::new();
    let lease = h.signed_lease("850").await;
    let months = lease::Months::new(2).unwrap();

    let claimed = h
        .service
        .execute(ClaimOfflinePayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            months,
        })
        .await
        .unwrap();
    assert_eq!(claimed.status, lease::Status::Pending);
    assert_eq!(claimed.payment.map(|p| p.amount), Some(gbp("1700")));
    assert_eq!(
        h.notifications.kinds_for(lease.landlord_id),
        [Kind::LeaseSigned, Kind::OfflinePaymentPending],
    );

    let confirmed = h
        .service
        .execute(ConfirmOfflinePayment {
            lease_id: lease.id,
            landlord_id: lease.landlord_id,
        })
        .await
        .unwrap();
    assert_eq!(confirmed.status, lease::Status::Active);

    let property = h.property(lease.property_id).await;
    assert_eq!(property.occupancy, property::Occupancy::Occupied);
    assert_eq!(property.current_tenant_id, Some(lease.tenant_id));

    let transactions = h
        .service
        .execute(query::transaction::ByLease::by(lease.id))
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert!(transactions[0].is_completed_rent());
    assert_eq!(transactions[0].months_covered(), months);

    let status = h
        .service
        .execute(RentStatus { lease_id: lease.id })
        .await
        .unwrap();
    assert_eq!(status.status, rent::Status::Paid);
}

#[tokio::test]
async fn rejected_offline_payment_can_be_claimed_again() {
    let h = Harness::new();
    let lease = h.signed_lease("850").await;
    let claim = ClaimOfflinePayment {
        lease_id: lease.id,
        tenant_id: lease.tenant_id,
        months: lease::Months::ONE,
    };

    _ = h.service.execute(claim).await.unwrap();
    let twice = h.service.execute(claim).await.unwrap_err();
    assert!(matches!(
        twice.as_ref(),
        service::command::claim_offline_payment::ExecutionError::Transition(
            lease::TransitionError::PaymentAwaitingConfirmation,
        ),
    ));

    let rejected = h
        .service
        .execute(RejectOfflinePayment {
            lease_id: lease.id,
            landlord_id: lease.landlord_id,
        })
        .await
        .unwrap();
    assert_eq!(rejected.payment, None);
    assert_eq!(rejected.status, lease::Status::Pending);
    assert_eq!(
        h.notifications.last_for(lease.tenant_id).map(|n| n.kind),
        Some(Kind::OfflinePaymentRejected),
    );

    _ = h.service.execute(claim).await.unwrap();
}

#[tokio::test]
async fn payment_requires_tenant_signature() {
    let h = Harness::new();
    let lease = h.accepted_lease("850").await;

    let err = h
        .service
        .execute(ClaimOfflinePayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            months: lease::Months::ONE,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        service::command::claim_offline_payment::ExecutionError::Transition(
            lease::TransitionError::NotSignedByTenant,
        ),
    ));
}

#[tokio::test]
async fn declined_lease_expires() {
    let h = Harness::new();
    let lease = h.accepted_lease("850").await;

    let declined = h
        .service
        .execute(DeclineLease {
            lease_id: lease.id,
            user_id: lease.tenant_id,
        })
        .await
        .unwrap();

    assert_eq!(declined.status, lease::Status::Expired);
    assert!(declined.expired_at.is_some());
    assert_eq!(
        h.notifications.last_for(lease.landlord_id).map(|n| n.kind),
        Some(Kind::LeaseDeclined),
    );
}

#[tokio::test]
async fn occupied_property_cannot_be_let_twice() {
    let h = Harness::new();
    let lease = h.signed_lease("850").await;
    _ = h
        .service
        .execute(ClaimOfflinePayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            months: lease::Months::ONE,
        })
        .await
        .unwrap();
    _ = h
        .service
        .execute(ConfirmOfflinePayment {
            lease_id: lease.id,
            landlord_id: lease.landlord_id,
        })
        .await
        .unwrap();

    let err = h
        .service
        .execute(CreateRentalRequest {
            property_id: lease.property_id,
            tenant_id: user::Id::new(),
            message: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        service::command::create_rental_request::ExecutionError::PropertyNotAvailable(_),
    ));
}

#[tokio::test]
async fn paid_up_termination_owes_refund_until_confirmed() {
    let h = Harness::new();
    let lease = h.signed_lease("900").await;
    _ = h
        .service
        .execute(ClaimOfflinePayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            months: lease::Months::ONE,
        })
        .await
        .unwrap();
    _ = h
        .service
        .execute(ConfirmOfflinePayment {
            lease_id: lease.id,
            landlord_id: lease.landlord_id,
        })
        .await
        .unwrap();

    let quote = h
        .service
        .execute(RefundQuote { lease_id: lease.id })
        .await
        .unwrap();
    assert!(quote.evaluation.is_paid());
    assert!(quote.refund.is_positive());

    let terminating = h
        .service
        .execute(TerminateLease {
            lease_id: lease.id,
            landlord_id: lease.landlord_id,
        })
        .await
        .unwrap();
    assert_eq!(terminating.status, lease::Status::Terminating);
    let termination = terminating.termination.unwrap();
    assert_eq!(termination.refund, Some(quote.refund));
    assert!(termination.grace_ends_at.is_some());

    let notified = h.notifications.last_for(lease.tenant_id).unwrap();
    assert_eq!(notified.kind, Kind::TenancyTerminating);
    assert!(notified
        .context
        .message
        .unwrap()
        .starts_with(&format!("Refund of {}", quote.refund)));
    assert_eq!(
        h.property(lease.property_id).await.occupancy,
        property::Occupancy::Occupied,
    );

    let ended = h
        .service
        .execute(ConfirmTermination {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
        })
        .await
        .unwrap();
    assert_eq!(ended.status, lease::Status::Expired);
    assert!(h.property(lease.property_id).await.is_available());
    assert_eq!(
        h.notifications.last_for(lease.landlord_id).map(|n| n.kind),
        Some(Kind::TenancyEnded),
    );
}

#[tokio::test]
async fn termination_with_rent_due_ends_tenancy_at_once() {
    let h = Harness::new();
    let lease = h.overdue_lease("900", 45).await;

    let status = h
        .service
        .execute(RentStatus { lease_id: lease.id })
        .await
        .unwrap();
    assert_eq!(status.status, rent::Status::Due);

    let ended = h
        .service
        .execute(TerminateLease {
            lease_id: lease.id,
            landlord_id: lease.landlord_id,
        })
        .await
        .unwrap();
    assert_eq!(ended.status, lease::Status::Expired);
    assert!(ended.expired_at.is_some());
    let termination = ended.termination.unwrap();
    assert_eq!(termination.refund, None);
    assert_eq!(termination.grace_ends_at, None);

    let property = h.property(lease.property_id).await;
    assert_eq!(property.occupancy, property::Occupancy::Available);
    assert_eq!(property.current_tenant_id, None);
    assert_eq!(
        h.notifications.last_for(lease.tenant_id).map(|n| n.kind),
        Some(Kind::TenancyEnded),
    );
}

#[tokio::test]
async fn only_active_lease_can_be_terminated() {
    let h = Harness::new();
    let lease = h.signed_lease("900").await;

    let err = h
        .service
        .execute(TerminateLease {
            lease_id: lease.id,
            landlord_id: lease.landlord_id,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        service::command::terminate_lease::ExecutionError::Transition(
            lease::TransitionError::NotActive(lease::Status::Pending),
        ),
    ));
    assert_eq!(h.lease(lease.id).await.status, lease::Status::Pending);
}

#[tokio::test]
async fn strangers_cannot_terminate() {
    let h = Harness::new();
    let lease = h.signed_lease("900").await;

    let err = h
        .service
        .execute(TerminateLease {
            lease_id: lease.id,
            landlord_id: lease.tenant_id,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        service::command::terminate_lease::ExecutionError::LeaseNotExists(_),
    ));
}
