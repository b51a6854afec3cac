//! [`ExpireLeases`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{
        By, Commit, Dispatch, Lock, Perform, Select, Start, Transact,
        Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error as StdError, From};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{lease, notification, property, Lease, Notification, Property},
    infra::{database, Database, Notifier},
    read::lease::DueToExpire,
    Service,
};

use super::Task;

/// Configuration for [`ExpireLeases`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between checks of [`Lease`]s to be expired.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] expiring [`Lease`]s whose grace period is over or whose natural
/// end has passed, and vacating their [`Property`]s.
#[derive(Clone, Copy, Debug)]
pub struct ExpireLeases<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Gw, Nt> Task<Start<By<ExpireLeases<Self>, Config>>>
    for Service<Db, Gw, Nt>
where
    ExpireLeases<Self>: Task<Perform<()>, Ok = usize, Err: Error>,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireLeases<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireLeases {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::info!("`task::ExpireLeases` expired {n} leases"),
                Err(e) => log::error!("`task::ExpireLeases` failed: {e}"),
            }
        }
    }
}

impl<Db, Gw, Nt> Task<Perform<()>> for ExpireLeases<Service<Db, Gw, Nt>>
where
    Db: Database<
            Select<By<Vec<DueToExpire>, DateTime>>,
            Ok = Vec<DueToExpire>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Lease, lease::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    /// Number of expired [`Lease`]s.
    type Ok = usize;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let now = DateTime::now();
        let due = self
            .service
            .database()
            .execute(Select(By::<Vec<DueToExpire>, _>::new(now)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let mut expired = 0;
        for DueToExpire(lease) in due {
            let lease_id = lease.id;
            match self.expire(lease, now).await {
                Ok(true) => expired += 1,
                Ok(false) => log::debug!(
                    "`Lease(id: {lease_id})` is not due to expire anymore",
                ),
                Err(e) => {
                    log::error!("failed to expire `Lease(id: {lease_id})`: {e}");
                }
            }
        }
        Ok(expired)
    }
}

impl<Db, Gw, Nt> ExpireLeases<Service<Db, Gw, Nt>>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Lease, lease::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    /// Expires the provided [`Lease`] if it's still due to expire at the
    /// provided [`DateTime`], vacating its [`Property`].
    ///
    /// Returns `false` if the [`Lease`] has changed since being selected and
    /// is not due to expire anymore.
    async fn expire(
        &self,
        lease: Lease,
        now: DateTime,
    ) -> Result<bool, Traced<ExecutionError>> {
        use ExecutionError as E;

        let Lease {
            id: lease_id,
            property_id,
            ..
        } = lease;

        let tx = self
            .service
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Lock(By::<Lease, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let Some(mut lease) = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| l.is_due_to_expire(now))
        else {
            return Ok(false);
        };
        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        lease.expire(now).map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        if property.vacate(lease.tenant_id) {
            tx.execute(Update(property.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.service
            .notify([Notification::about_lease(
                lease.tenant_id,
                notification::Kind::TenancyEnded,
                &lease,
                &property,
            )])
            .await;

        Ok(true)
    }
}

/// Error of [`ExpireLeases`] execution.
#[derive(Debug, Display, From, StdError)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Lease`] cannot be expired.
    #[display("Cannot expire `Lease`: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Insert, Perform, Select},
        DateTime, Handler as _,
    };

    use crate::{
        domain::{
            lease::{self, spec::gbp},
            property, Lease, Property,
        },
        infra::{notifier::Silent, Memory},
        Config, Service,
    };

    use super::ExpireLeases;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn task(db: Memory) -> ExpireLeases<Service<Memory, (), Silent>> {
        ExpireLeases {
            config: super::Config::default(),
            service: Service {
                config: Config {
                    jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                        b"s",
                    ),
                    expire_leases: super::Config::default(),
                },
                database: db,
                gateway: (),
                notifier: Silent,
            },
        }
    }

    async fn occupied(db: &Memory, lease: &mut Lease) -> property::Id {
        let mut property = Property {
            id: property::Id::new(),
            landlord_id: lease.landlord_id,
            name: property::Name::new("Flat 1, 2 Station Road").unwrap(),
            price: gbp("750"),
            payout_account: None,
            occupancy: property::Occupancy::Available,
            current_tenant_id: None,
            created_at: DateTime::now().coerce(),
        };
        property.occupy(lease.tenant_id);
        lease.property_id = property.id;
        db.execute(Insert(property.clone())).await.unwrap();
        property.id
    }

    #[tokio::test]
    async fn expires_overdue_leases_only() {
        let db = Memory::new();
        let now = DateTime::now();

        let mut ended = lease::spec::lease();
        ended.status = lease::Status::Active;
        ended.ends_at = (now - DAY).coerce();
        let ended_property = occupied(&db, &mut ended).await;
        db.execute(Insert(ended.clone())).await.unwrap();

        let mut running = lease::spec::lease();
        running.status = lease::Status::Active;
        running.ends_at = (now + DAY * 30).coerce();
        _ = occupied(&db, &mut running).await;
        db.execute(Insert(running.clone())).await.unwrap();

        let expired = task(db.clone()).execute(Perform(())).await.unwrap();
        assert_eq!(expired, 1);

        let ended = db
            .execute(Select(By::<Option<Lease>, _>::new(ended.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ended.status, lease::Status::Expired);
        assert!(ended.expired_at.is_some());
        let property = db
            .execute(Select(By::<Option<Property>, _>::new(ended_property)))
            .await
            .unwrap()
            .unwrap();
        assert!(property.is_available());
        assert_eq!(property.current_tenant_id, None);

        let running = db
            .execute(Select(By::<Option<Lease>, _>::new(running.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(running.status, lease::Status::Active);
    }

    #[tokio::test]
    async fn expires_terminating_lease_after_grace_period() {
        let db = Memory::new();
        let now = DateTime::now();

        let mut lease = lease::spec::lease();
        lease.status = lease::Status::Active;
        lease.ends_at = (now + DAY * 90).coerce();
        _ = occupied(&db, &mut lease).await;
        lease.terminate(Some(gbp("100")), now - DAY * 4).unwrap();
        db.execute(Insert(lease.clone())).await.unwrap();

        let expired = task(db.clone()).execute(Perform(())).await.unwrap();

        assert_eq!(expired, 1);
        let lease = db
            .execute(Select(By::<Option<Lease>, _>::new(lease.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lease.status, lease::Status::Expired);
        assert_eq!(lease.termination.and_then(|t| t.refund), Some(gbp("100")));
    }

    #[test]
    fn checks_hourly_by_default() {
        assert_eq!(super::Config::default().interval, DAY / 24);
    }
}
