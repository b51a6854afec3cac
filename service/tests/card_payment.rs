//! Card payment workflows of a [`Lease`].
//!
//! [`Lease`]: service::domain::Lease

mod support;

use common::Handler as _;
use service::{
    command::{
        settle_card_payment::ExecutionError, CreateCardPayment,
        SettleCardPayment,
    },
    domain::{lease, notification::Kind, property, transaction},
    infra::payment::intent,
    query,
};

use self::support::{gbp, Harness};

#[tokio::test]
async fn settled_card_payment_activates_lease_once() {
    let h = Harness::new();
    let lease = h.signed_lease("1200").await;

    let intent = h
        .service
        .execute(CreateCardPayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            months: lease::Months::new(3).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(intent.amount, gbp("3600"));
    assert_eq!(intent.status, intent::Status::Pending);
    assert!(intent.client_secret.is_some());

    h.gateway.resolve(&intent.id, intent::Status::Succeeded);
    let settle = || SettleCardPayment {
        lease_id: lease.id,
        tenant_id: lease.tenant_id,
        intent_id: intent.id.clone(),
    };

    let active = h.service.execute(settle()).await.unwrap();
    assert_eq!(active.status, lease::Status::Active);
    assert_eq!(
        active.payment.map(|p| (p.method, p.months)),
        Some((lease::PaymentMethod::Card, lease::Months::new(3).unwrap())),
    );
    assert_eq!(
        h.property(lease.property_id).await.occupancy,
        property::Occupancy::Occupied,
    );

    // Settling the same intent again changes nothing.
    let again = h.service.execute(settle()).await.unwrap();
    assert_eq!(again.status, lease::Status::Active);

    let transactions = h
        .service
        .execute(query::transaction::ByLease::by(lease.id))
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, transaction::Status::Completed);
    assert_eq!(
        transactions[0].reference.as_ref().map(ToString::to_string),
        Some(intent.id.to_string()),
    );
    assert_eq!(
        h.notifications
            .kinds_for(lease.landlord_id)
            .into_iter()
            .filter(|k| *k == Kind::CardPaymentReceived)
            .count(),
        1,
    );
}

#[tokio::test]
async fn pending_intent_is_not_settled() {
    let h = Harness::new();
    let lease = h.signed_lease("1200").await;
    let intent = h
        .service
        .execute(CreateCardPayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            months: lease::Months::ONE,
        })
        .await
        .unwrap();

    let err = h
        .service
        .execute(SettleCardPayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            intent_id: intent.id,
        })
        .await
        .unwrap_err();

    assert!(matches!(err.as_ref(), ExecutionError::NotSettled(_)));
    assert_eq!(h.lease(lease.id).await.status, lease::Status::Pending);
}

#[tokio::test]
async fn failed_intent_is_recorded_and_reported() {
    let h = Harness::new();
    let lease = h.signed_lease("1200").await;
    let intent = h
        .service
        .execute(CreateCardPayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            months: lease::Months::ONE,
        })
        .await
        .unwrap();
    h.gateway.resolve(&intent.id, intent::Status::Failed);

    for _ in 0..2 {
        let err = h
            .service
            .execute(SettleCardPayment {
                lease_id: lease.id,
                tenant_id: lease.tenant_id,
                intent_id: intent.id.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::PaymentFailed(_)));
    }

    let transactions = h
        .service
        .execute(query::transaction::ByLease::by(lease.id))
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, transaction::Status::Failed);
    assert_eq!(h.lease(lease.id).await.status, lease::Status::Pending);
    assert!(h.property(lease.property_id).await.is_available());
}

#[tokio::test]
async fn intent_of_another_lease_is_refused() {
    let h = Harness::new();
    let lease = h.signed_lease("1200").await;
    let other = h.signed_lease("700").await;
    let intent = h
        .service
        .execute(CreateCardPayment {
            lease_id: other.id,
            tenant_id: other.tenant_id,
            months: lease::Months::ONE,
        })
        .await
        .unwrap();
    h.gateway.resolve(&intent.id, intent::Status::Succeeded);

    let err = h
        .service
        .execute(SettleCardPayment {
            lease_id: lease.id,
            tenant_id: lease.tenant_id,
            intent_id: intent.id,
        })
        .await
        .unwrap_err();

    assert!(matches!(err.as_ref(), ExecutionError::IntentNotExists(_)));
}
