//! In-memory [`Database`] implementation.

use std::{collections::HashMap, sync::Arc};

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Update},
    DateTime,
};
use tokio::sync::Mutex;
use tracerr::Traced;

use crate::{
    domain::{
        lease, property, rental_request, user, Lease, Property, RentalRequest,
        Transaction,
    },
    infra::{database, Database},
    read::lease::DueToExpire,
};

/// In-memory [`Database`], for tests and local runs.
///
/// [`Transact`]ion works on a snapshot of the whole state: its writes are
/// visible to itself only, until [`Commit`]ted. [`Lock`]s are no-op.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed [`State`].
    state: Arc<Mutex<State>>,

    /// [`Staged`] writes, if this is a transaction.
    tx: Option<Arc<Mutex<Staged>>>,
}

/// Stored entities.
#[derive(Clone, Debug, Default)]
struct State {
    /// Stored [`Property`]s.
    properties: HashMap<property::Id, Property>,

    /// Stored [`RentalRequest`]s.
    rental_requests: HashMap<rental_request::Id, RentalRequest>,

    /// Stored [`Lease`]s.
    leases: HashMap<lease::Id, Lease>,

    /// Stored [`Transaction`]s, in insertion order.
    transactions: Vec<Transaction>,
}

impl State {
    /// Applies the provided [`Write`] to this [`State`].
    fn apply(&mut self, write: Write) {
        match write {
            Write::Property(p) => drop(self.properties.insert(p.id, p)),
            Write::RentalRequest(r) => {
                drop(self.rental_requests.insert(r.id, r));
            }
            Write::Lease(l) => drop(self.leases.insert(l.id, l)),
            Write::Transaction(tx) => {
                if !self.transactions.iter().any(|t| t.id == tx.id) {
                    self.transactions.push(tx);
                }
            }
        }
    }
}

/// Single write operation.
#[derive(Clone, Debug)]
enum Write {
    /// Upsert of a [`Property`].
    Property(Property),

    /// Upsert of a [`RentalRequest`].
    RentalRequest(RentalRequest),

    /// Upsert of a [`Lease`].
    Lease(Lease),

    /// Insertion of a [`Transaction`].
    Transaction(Transaction),
}

/// Not yet committed transaction.
#[derive(Debug)]
struct Staged {
    /// Snapshot of the [`State`] with the [`Staged::writes`] applied.
    snapshot: State,

    /// [`Write`]s to apply on commit.
    writes: Vec<Write>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the visible [`State`] with the provided function.
    async fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        if let Some(tx) = &self.tx {
            f(&tx.lock().await.snapshot)
        } else {
            f(&*self.state.lock().await)
        }
    }

    /// Performs the provided [`Write`], staging it if this is a transaction.
    async fn write(&self, write: Write) {
        if let Some(tx) = &self.tx {
            let mut tx = tx.lock().await;
            tx.snapshot.apply(write.clone());
            tx.writes.push(write);
        } else {
            self.state.lock().await.apply(write);
        }
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.tx.is_some() {
            return Ok(self.clone());
        }
        let snapshot = self.state.lock().await.clone();
        Ok(Self {
            state: Arc::clone(&self.state),
            tx: Some(Arc::new(Mutex::new(Staged {
                snapshot,
                writes: Vec::new(),
            }))),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Some(tx) = &self.tx else {
            return Ok(());
        };
        let writes = std::mem::take(&mut tx.lock().await.writes);
        let mut state = self.state.lock().await;
        for write in writes {
            state.apply(write);
        }
        Ok(())
    }
}

impl Database<Select<By<Option<Property>, property::Id>>> for Memory {
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.properties.get(&id).cloned()).await)
    }
}

impl Database<Insert<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::Property(property)).await;
        Ok(())
    }
}

impl Database<Update<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::Property(property)).await;
        Ok(())
    }
}

impl Database<Lock<By<Property, property::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<RentalRequest>, rental_request::Id>>>
    for Memory
{
    type Ok = Option<RentalRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<RentalRequest>, rental_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.rental_requests.get(&id).cloned()).await)
    }
}

impl Database<Insert<RentalRequest>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(request): Insert<RentalRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::RentalRequest(request)).await;
        Ok(())
    }
}

impl Database<Update<RentalRequest>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(request): Update<RentalRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::RentalRequest(request)).await;
        Ok(())
    }
}

impl Database<Select<By<Option<Lease>, lease::Id>>> for Memory {
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.leases.get(&id).cloned()).await)
    }
}

impl Database<Select<By<Vec<Lease>, user::Id>>> for Memory {
    type Ok = Vec<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Lease>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        let mut leases = self
            .read(|s| {
                s.leases
                    .values()
                    .filter(|l| l.party_of(user_id).is_some())
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        leases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leases)
    }
}

impl Database<Select<By<Vec<DueToExpire>, DateTime>>> for Memory {
    type Ok = Vec<DueToExpire>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<DueToExpire>, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner();
        let mut leases = self
            .read(|s| {
                s.leases
                    .values()
                    .filter(|l| l.is_due_to_expire(now))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        leases.sort_by_key(|l| l.created_at);
        Ok(leases.into_iter().map(DueToExpire).collect())
    }
}

impl Database<Insert<Lease>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lease): Insert<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::Lease(lease)).await;
        Ok(())
    }
}

impl Database<Update<Lease>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(lease): Update<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::Lease(lease)).await;
        Ok(())
    }
}

impl Database<Lock<By<Lease, lease::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Vec<Transaction>, lease::Id>>> for Memory {
    type Ok = Vec<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Transaction>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        let mut txs = self
            .read(|s| {
                s.transactions
                    .iter()
                    .filter(|tx| tx.lease_id == lease_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        txs.sort_by_key(|tx| tx.paid_at);
        Ok(txs)
    }
}

impl Database<Insert<Transaction>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(tx): Insert<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::Transaction(tx)).await;
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::{By, Commit, Insert, Select, Transact};

    use crate::{
        domain::{
            lease::{
                self,
                spec::{at, gbp, lease},
            },
            property, user, Lease, Property,
        },
        infra::Database as _,
        read::lease::DueToExpire,
    };

    use super::Memory;

    fn property() -> Property {
        Property {
            id: property::Id::new(),
            landlord_id: user::Id::new(),
            name: property::Name::new("Flat 3, 12 Mill Road").unwrap(),
            price: gbp("900"),
            payout_account: None,
            occupancy: property::Occupancy::Available,
            current_tenant_id: None,
            created_at: at("2026-09-01T00:00:00Z").coerce(),
        }
    }

    #[tokio::test]
    async fn hides_uncommitted_writes() {
        let db = Memory::new();
        let property = property();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(property.clone())).await.unwrap();

        let seen_by_tx = tx
            .execute(Select(By::<Option<Property>, _>::new(property.id)))
            .await
            .unwrap();
        assert!(seen_by_tx.is_some());

        let seen_outside = db
            .execute(Select(By::<Option<Property>, _>::new(property.id)))
            .await
            .unwrap();
        assert!(seen_outside.is_none());

        tx.execute(Commit).await.unwrap();

        let committed = db
            .execute(Select(By::<Option<Property>, _>::new(property.id)))
            .await
            .unwrap();
        assert_eq!(committed.map(|p| p.price), Some(gbp("900")));
    }

    #[tokio::test]
    async fn drops_abandoned_transaction() {
        let db = Memory::new();
        let property = property();

        {
            let tx = db.execute(Transact).await.unwrap();
            tx.execute(Insert(property.clone())).await.unwrap();
        }

        let selected = db
            .execute(Select(By::<Option<Property>, _>::new(property.id)))
            .await
            .unwrap();
        assert!(selected.is_none());
    }

    #[tokio::test]
    async fn selects_leases_of_both_parties() {
        let db = Memory::new();
        let older = lease();
        let mut newer = lease();
        newer.created_at = older.created_at + Duration::from_secs(60);
        let stranger = user::Id::new();

        db.execute(Insert(older.clone())).await.unwrap();
        db.execute(Insert(newer.clone())).await.unwrap();

        let of_tenant = db
            .execute(Select(By::<Vec<Lease>, _>::new(newer.tenant_id)))
            .await
            .unwrap();
        assert_eq!(of_tenant.len(), 1);
        assert_eq!(of_tenant[0].id, newer.id);

        let of_landlord = db
            .execute(Select(By::<Vec<Lease>, _>::new(older.landlord_id)))
            .await
            .unwrap();
        assert_eq!(
            of_landlord.iter().map(|l| l.id).collect::<Vec<_>>(),
            [older.id],
        );

        let of_stranger = db
            .execute(Select(By::<Vec<Lease>, _>::new(stranger)))
            .await
            .unwrap();
        assert!(of_stranger.is_empty());
    }

    #[tokio::test]
    async fn selects_leases_due_to_expire() {
        let db = Memory::new();
        let now = at("2027-07-01T00:00:00Z");

        let mut ended = lease();
        ended.status = lease::Status::Active;
        let mut running = lease();
        running.status = lease::Status::Active;
        running.ends_at = at("2027-08-31T00:00:00Z").coerce();
        let pending = lease();

        for l in [&ended, &running, &pending] {
            db.execute(Insert(l.clone())).await.unwrap();
        }

        let due = db
            .execute(Select(By::<Vec<DueToExpire>, _>::new(now)))
            .await
            .unwrap();
        assert_eq!(due.iter().map(|l| l.id).collect::<Vec<_>>(), [ended.id]);
    }
}
