//! [`Query`]s evaluating the rent of a [`Lease`].

use common::{
    operations::{By, Select},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        lease::{self, refund, rent},
        property, Lease, Property, Transaction,
    },
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] evaluating whether the rent of a [`Lease`] is due now.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RentStatus {
    /// ID of the [`Lease`] to evaluate.
    pub lease_id: lease::Id,
}

impl<Db, Gw, Nt> Query<RentStatus> for Service<Db, Gw, Nt>
where
    Db: Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Transaction>, lease::Id>>,
            Ok = Vec<Transaction>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = rent::Evaluation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        RentStatus { lease_id }: RentStatus,
    ) -> Result<Self::Ok, Self::Err> {
        let (lease, transactions) = self.lease_with_transactions(lease_id).await?;

        Ok(rent::evaluate(&lease, &transactions, DateTime::now()))
    }
}

/// [`Query`] quoting the refund owed to the tenant if a [`Lease`] was
/// terminated now, without terminating it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RefundQuote {
    /// ID of the [`Lease`] to quote the refund for.
    pub lease_id: lease::Id,
}

/// Output of the [`RefundQuote`] [`Query`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Quote {
    /// Rent [`rent::Evaluation`] the refund is based on.
    pub evaluation: rent::Evaluation,

    /// Amount owed back to the tenant.
    pub refund: Money,
}

impl<Db, Gw, Nt> Query<RefundQuote> for Service<Db, Gw, Nt>
where
    Db: Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Transaction>, lease::Id>>,
            Ok = Vec<Transaction>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Quote;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        RefundQuote { lease_id }: RefundQuote,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let (lease, transactions) = self.lease_with_transactions(lease_id).await?;
        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(lease.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(lease.property_id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let evaluation = rent::evaluate(&lease, &transactions, now);
        let refund = refund::calculate(property.price, &evaluation, now)
            .ok_or(E::AmountOverflow(property.id))
            .map_err(tracerr::wrap!())?;
        Ok(Quote { evaluation, refund })
    }
}

impl<Db, Gw, Nt> Service<Db, Gw, Nt>
where
    Db: Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Transaction>, lease::Id>>,
            Ok = Vec<Transaction>,
            Err = Traced<database::Error>,
        >,
{
    /// Selects the [`Lease`] with the provided ID along with all its
    /// [`Transaction`]s.
    async fn lease_with_transactions(
        &self,
        lease_id: lease::Id,
    ) -> Result<(Lease, Vec<Transaction>), Traced<ExecutionError>> {
        use ExecutionError as E;

        let lease = self
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        let transactions = self
            .database()
            .execute(Select(By::<Vec<Transaction>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok((lease, transactions))
    }
}

/// Error of [`RentStatus`] and [`RefundQuote`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// Amount computed from the [`Property`] price overflows.
    #[display("Amount overflows for `Property(id: {_0})` price")]
    AmountOverflow(#[error(not(source))] property::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Insert, DateTime, Handler as _};
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            lease::{self, rent, spec::gbp},
            property, transaction, user, Property, Transaction,
        },
        infra::{notifier::Silent, Memory},
        task, Config, Service,
    };

    use super::{ExecutionError, RefundQuote, RentStatus};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

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

    /// Stores an active [`Lease`] started 40 days ago, whose single month of
    /// rent was paid `paid_days_ago`.
    async fn active_lease(db: &Memory, paid_days_ago: u32) -> lease::Id {
        let now = DateTime::now();
        let property = Property {
            id: property::Id::new(),
            landlord_id: user::Id::new(),
            name: property::Name::new("Room 4, Elm House").unwrap(),
            price: gbp("900"),
            payout_account: None,
            occupancy: property::Occupancy::Occupied,
            current_tenant_id: None,
            created_at: (now - DAY * 60).coerce(),
        };
        let mut lease = lease::spec::lease();
        lease.property_id = property.id;
        lease.landlord_id = property.landlord_id;
        lease.starts_at = (now - DAY * 40).coerce();
        lease.ends_at = (now + DAY * 300).coerce();
        lease.tenant_signed = true;
        let settlement = lease
            .settle_card_payment(gbp("900"), lease::Months::ONE)
            .unwrap();
        let transaction = Transaction::rent(
            &lease,
            settlement.payment,
            transaction::Status::Completed,
            None,
            now - DAY * paid_days_ago,
        );

        db.execute(Insert(property)).await.unwrap();
        db.execute(Insert(lease.clone())).await.unwrap();
        db.execute(Insert(transaction)).await.unwrap();
        lease.id
    }

    #[tokio::test]
    async fn evaluates_stored_lease() {
        let db = Memory::new();
        let paid = active_lease(&db, 10).await;
        let overdue = active_lease(&db, 35).await;
        let svc = service(db);

        let eval = svc.execute(RentStatus { lease_id: paid }).await.unwrap();
        assert_eq!(eval.status, rent::Status::Paid);

        let eval = svc.execute(RentStatus { lease_id: overdue }).await.unwrap();
        assert_eq!(eval.status, rent::Status::Due);
    }

    #[tokio::test]
    async fn quotes_refund_of_unused_days() {
        let db = Memory::new();
        let lease_id = active_lease(&db, 10).await;

        let quote = service(db)
            .execute(RefundQuote { lease_id })
            .await
            .unwrap();

        // Next due date is a calendar month after the payment, so 18 to 21
        // whole days of 30 are left.
        assert!(quote.evaluation.is_paid());
        assert!(
            (Decimal::from(540)..=Decimal::from(630))
                .contains(&quote.refund.amount),
            "unexpected refund: {}",
            quote.refund,
        );
        assert!(
            (quote.refund.amount % Decimal::from(30)).is_zero(),
            "refund is not a whole number of days: {}",
            quote.refund,
        );
    }

    #[tokio::test]
    async fn quotes_nothing_when_rent_is_due() {
        let db = Memory::new();
        let lease_id = active_lease(&db, 45).await;

        let quote = service(db)
            .execute(RefundQuote { lease_id })
            .await
            .unwrap();

        assert_eq!(quote.evaluation.status, rent::Status::Due);
        assert_eq!(quote.refund, gbp("0"));
    }

    #[tokio::test]
    async fn reports_missing_lease() {
        let err = service(Memory::new())
            .execute(RentStatus {
                lease_id: lease::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LeaseNotExists(_)));
    }
}
