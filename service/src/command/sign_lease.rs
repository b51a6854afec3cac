//! [`Command`] for signing a [`Lease`].

use std::convert::Infallible;

use common::{
    operations::{
        By, Commit, Dispatch, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        lease, notification, property, user, Lease, Notification, Property,
    },
    infra::{database, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for signing a [`Lease`] by one of its parties.
#[derive(Clone, Debug)]
pub struct SignLease {
    /// ID of the [`Lease`] to sign.
    pub lease_id: lease::Id,

    /// ID of the user signing the [`Lease`].
    pub signer_id: user::Id,

    /// [`lease::Signature`] of the signer.
    pub signature: lease::Signature,
}

impl<Db, Gw, Nt> Command<SignLease> for Service<Db, Gw, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Lease, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SignLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignLease {
            lease_id,
            signer_id,
            signature,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent transitions of the same `Lease`.
        tx.execute(Lock(By::<Lease, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        let party = lease
            .party_of(signer_id)
            .ok_or(E::NotParty(signer_id))
            .map_err(tracerr::wrap!())?;

        lease
            .sign(party, &signature, DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(lease.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(lease.property_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.notify([Notification::about_lease(
            lease.party_id(party.counterpart()),
            notification::Kind::LeaseSigned,
            &lease,
            &property,
        )])
        .await;

        Ok(lease)
    }
}

/// Error of [`SignLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// User is not a party of the [`Lease`].
    #[display("`User(id: {_0})` is not a party of the `Lease`")]
    NotParty(#[error(not(source))] user::Id),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Lease`] cannot be signed.
    #[display("Cannot sign `Lease`: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}

#[cfg(test)]
mod spec {
    use common::{operations::Insert, Handler as _};

    use crate::{
        domain::{lease, user},
        infra::{notifier::Silent, Memory},
        task, Config, Service,
    };

    use super::{ExecutionError, SignLease};

    fn service(db: Memory) -> Service<Memory, (), Silent> {
        Service {
            config: Config {
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(b"s"),
                expire_leases: task::expire_leases::Config::default(),
            },
            database: db,
            gateway: (),
            notifier: Silent,
        }
    }

    #[tokio::test]
    async fn rejects_strangers() {
        let db = Memory::new();
        let lease = lease::spec::lease();
        db.execute(Insert(lease.clone())).await.unwrap();

        let stranger = user::Id::new();
        let err = service(db)
            .execute(SignLease {
                lease_id: lease.id,
                signer_id: stranger,
                signature: lease::Signature::new("Jane Doe").unwrap(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::NotParty(id) if *id == stranger),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn reports_missing_lease() {
        let err = service(Memory::new())
            .execute(SignLease {
                lease_id: lease::Id::new(),
                signer_id: user::Id::new(),
                signature: lease::Signature::new("Jane Doe").unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LeaseNotExists(_)));
    }
}
