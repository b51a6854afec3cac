//! Test environment of the [`Service`].

#![allow(dead_code, reason = "not every test uses every helper")]

use std::{
    collections::HashMap,
    convert::Infallible,
    str::FromStr as _,
    sync::{Arc, Mutex},
    time::Duration,
};

use common::{
    operations::{By, Dispatch, Insert, Select, Update},
    DateTime, Handler, Money,
};
use jsonwebtoken::DecodingKey;
use service::{
    command::{
        AcceptRentalRequest, CreateProperty, CreateRentalRequest, SignLease,
    },
    domain::{
        lease, notification, property, transaction, user, Lease, Notification,
        Transaction,
    },
    infra::{
        payment::{self, intent, Intent, IntentRequest},
        Memory,
    },
    task, Config, Service,
};
use tracerr::Traced;

/// [`Service`] under test.
pub type TestService = Service<Memory, ScriptedGateway, Recorder>;

/// One day.
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// [`Service`] along with handles to its infrastructure.
pub struct Harness {
    pub service: TestService,
    pub database: Memory,
    pub gateway: ScriptedGateway,
    pub notifications: Recorder,
}

impl Harness {
    pub fn new() -> Self {
        let database = Memory::new();
        let gateway = ScriptedGateway::default();
        let notifications = Recorder::default();

        let (service, _background) = Service::new(
            Config {
                jwt_decoding_key: DecodingKey::from_secret(b"test-secret"),
                expire_leases: task::expire_leases::Config::default(),
            },
            database.clone(),
            gateway.clone(),
            notifications.clone(),
        );

        Self {
            service,
            database,
            gateway,
            notifications,
        }
    }

    /// Creates a property of a new landlord, which a new tenant requests and
    /// the landlord accepts, starting the tenancy today.
    pub async fn accepted_lease(&self, monthly_price: &str) -> Lease {
        let landlord_id = user::Id::new();
        let tenant_id = user::Id::new();

        let property = self
            .service
            .execute(CreateProperty {
                landlord_id,
                name: property::Name::new("Flat 2, 7 College Lane").unwrap(),
                price: gbp(monthly_price),
                payout_account: property::PayoutAccount::new("acct_1Nv0"),
            })
            .await
            .unwrap();
        let request = self
            .service
            .execute(CreateRentalRequest {
                property_id: property.id,
                tenant_id,
                message: None,
            })
            .await
            .unwrap();

        let now = DateTime::now();
        self.service
            .execute(AcceptRentalRequest {
                request_id: request.id,
                landlord_id,
                starts_at: now.coerce(),
                ends_at: (now + DAY * 300).coerce(),
            })
            .await
            .unwrap()
    }

    /// Same as [`Harness::accepted_lease()`], but signed by the tenant.
    pub async fn signed_lease(&self, monthly_price: &str) -> Lease {
        let lease = self.accepted_lease(monthly_price).await;
        self.service
            .execute(SignLease {
                lease_id: lease.id,
                signer_id: lease.tenant_id,
                signature: lease::Signature::new("Alex Tenant").unwrap(),
            })
            .await
            .unwrap()
    }

    /// Same as [`Harness::signed_lease()`], but activated `days_ago` with a
    /// single month paid offline back then, so its rent is due by now.
    pub async fn overdue_lease(
        &self,
        monthly_price: &str,
        days_ago: u32,
    ) -> Lease {
        let mut lease = self.signed_lease(monthly_price).await;
        let paid_at = DateTime::now() - DAY * days_ago;
        let payment = lease::Payment {
            method: lease::PaymentMethod::Offline,
            amount: gbp(monthly_price),
            months: lease::Months::ONE,
            confirmed: true,
        };

        lease.starts_at = paid_at.coerce();
        lease.status = lease::Status::Active;
        lease.payment = Some(payment);
        self.database.execute(Update(lease.clone())).await.unwrap();
        self.database
            .execute(Insert(Transaction::rent(
                &lease,
                payment,
                transaction::Status::Completed,
                None,
                paid_at,
            )))
            .await
            .unwrap();

        let mut property = self.property(lease.property_id).await;
        property.occupy(lease.tenant_id);
        self.database.execute(Update(property)).await.unwrap();

        lease
    }

    pub async fn lease(&self, id: lease::Id) -> Lease {
        self.database
            .execute(Select(By::<Option<Lease>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn property(&self, id: property::Id) -> property::Property {
        self.database
            .execute(Select(By::<Option<property::Property>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
    }
}

pub fn gbp(amount: &str) -> Money {
    Money::from_str(&format!("{amount}GBP")).unwrap()
}

/// [`Notifier`] recording every dispatched [`Notification`].
///
/// [`Notifier`]: service::infra::Notifier
#[derive(Clone, Debug, Default)]
pub struct Recorder(Arc<Mutex<Vec<Notification>>>);

impl Recorder {
    /// Returns [`notification::Kind`]s sent to the provided user so far, in
    /// the order of dispatching.
    pub fn kinds_for(&self, user_id: user::Id) -> Vec<notification::Kind> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient_id == user_id)
            .map(|n| n.kind)
            .collect()
    }

    /// Returns the last [`Notification`] sent to the provided user.
    pub fn last_for(&self, user_id: user::Id) -> Option<Notification> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|n| n.recipient_id == user_id)
            .cloned()
    }
}

impl Handler<Dispatch<Notification>> for Recorder {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Dispatch(notification): Dispatch<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Payment [`Gateway`] whose [`Intent`] outcomes are decided by the test.
///
/// [`Gateway`]: service::infra::Gateway
#[derive(Clone, Debug, Default)]
pub struct ScriptedGateway(Arc<Mutex<HashMap<intent::Id, Intent>>>);

impl ScriptedGateway {
    /// Sets the [`intent::Status`] of the [`Intent`] with the provided ID.
    pub fn resolve(&self, id: &intent::Id, status: intent::Status) {
        self.0.lock().unwrap().get_mut(id).unwrap().status = status;
    }
}

impl Handler<Insert<IntentRequest>> for ScriptedGateway {
    type Ok = Intent;
    type Err = Traced<payment::Error>;

    async fn execute(
        &self,
        Insert(req): Insert<IntentRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut intents = self.0.lock().unwrap();
        let id = intent::Id::from(format!("pi_{}", intents.len() + 1));
        let intent = Intent {
            client_secret: Some(format!("{id}_secret").into()),
            id: id.clone(),
            amount: req.amount,
            status: intent::Status::Pending,
            lease_id: Some(req.lease_id),
            months: Some(req.months),
        };
        _ = intents.insert(id, intent.clone());
        Ok(intent)
    }
}

impl Handler<Select<By<Option<Intent>, intent::Id>>> for ScriptedGateway {
    type Ok = Option<Intent>;
    type Err = Traced<payment::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Intent>, intent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.lock().unwrap().get(&by.into_inner()).cloned())
    }
}
