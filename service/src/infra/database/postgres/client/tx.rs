//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// The transaction begins lazily, on the first operation, so starting a
/// [`Tx`] client which is never used costs nothing.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client to check the [`connection::Tx`] out of.
    non_tx: NonTx,

    /// Lazily begun [`connection::Tx`], taken out once committed.
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            non_tx: client,
            tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the underlying [`connection::Tx`] of this [`Tx`] client,
    /// beginning it if necessary.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let mut tx = self.tx.write().await;
        if tx.is_none() {
            let conn =
                self.non_tx.connection().await.map_err(tracerr::wrap!())?;
            *tx = Some(
                connection::Tx::begin(conn)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }

        Ok(RwLockReadGuard::map(tx.downgrade(), |tx| {
            tx.as_ref()
                .expect("transaction cannot be taken while guard is alive")
        }))
    }

    /// Commits this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            // Nothing has been done in this transaction.
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
