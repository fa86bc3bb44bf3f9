// db/db.rs
use async_trait::async_trait;
use sqlx::{Pool, Postgres};

/// Unit-of-work seam. Multi-row mutations open a transaction here, compose
/// the `*_tx` operations, and commit once; dropping an uncommitted
/// transaction rolls back.
#[async_trait]
pub trait TxProvider: Send + Sync {
    type Tx: Send;

    async fn begin_tx(&self) -> Result<Self::Tx, sqlx::Error>;

    async fn commit_tx(&self, tx: Self::Tx) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

#[async_trait]
impl TxProvider for DBClient {
    type Tx = sqlx::Transaction<'static, Postgres>;

    async fn begin_tx(&self) -> Result<Self::Tx, sqlx::Error> {
        self.pool.begin().await
    }

    async fn commit_tx(&self, tx: Self::Tx) -> Result<(), sqlx::Error> {
        tx.commit().await
    }
}
