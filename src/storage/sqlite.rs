//! SQLite implementation of the repository interface.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};

use super::helpers::{apply_list_options, matches};
use super::schema::{Entities, CREATE_ENTITIES_TABLE};
use crate::interfaces::repository::{Repository, Result, StorageError};
use crate::model::{Entity, FilterOptions, Index, ListOptions};

/// SQLite repository for one entity kind.
///
/// Documents are stored as JSON; queries decode every row of the kind and
/// evaluate filters in process, so results match the in-memory backend.
pub struct SqliteRepository<T: Entity> {
    pool: SqlitePool,
    _kind: PhantomData<T>,
}

impl<T: Entity> SqliteRepository<T> {
    /// Create a new SQLite repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_ENTITIES_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    fn not_found(key: &str) -> StorageError {
        StorageError::NotFound {
            kind: T::KIND,
            key: key.to_string(),
        }
    }

    /// Every row of this kind in insertion order. Callers filter in memory.
    async fn load_all(&self) -> Result<Vec<T>> {
        let query = Query::select()
            .column(Entities::Document)
            .from(Entities::Table)
            .and_where(Expr::col(Entities::Kind).eq(T::KIND))
            .order_by(Entities::Seq, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            let document: String = row.get("document");
            entities.push(serde_json::from_str(&document)?);
        }
        Ok(entities)
    }
}

fn is_unset(time: &DateTime<Utc>) -> bool {
    *time == DateTime::<Utc>::default()
}

#[async_trait]
impl<T: Entity> Repository<T> for SqliteRepository<T> {
    async fn get(&self, key: &str) -> Result<T> {
        let query = Query::select()
            .column(Entities::Document)
            .from(Entities::Table)
            .and_where(Expr::col(Entities::Kind).eq(T::KIND))
            .and_where(Expr::col(Entities::PrimaryKey).eq(key))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Self::not_found(key))?;

        let document: String = row.get("document");
        Ok(serde_json::from_str(&document)?)
    }

    async fn add(&self, entity: &mut T) -> Result<()> {
        let now = Utc::now();
        let base = entity.base_mut();
        if is_unset(&base.create_time) {
            base.create_time = now;
        }
        base.update_time = now;

        let key = entity.primary_key();
        let document = serde_json::to_string(entity)?;
        let query = Query::insert()
            .into_table(Entities::Table)
            .columns([
                Entities::Kind,
                Entities::PrimaryKey,
                Entities::Document,
                Entities::CreatedAt,
            ])
            .values_panic([
                T::KIND.into(),
                key.clone().into(),
                document.into(),
                entity.base().create_time.to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::AlreadyExists { kind: T::KIND, key })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, entity: &mut T) -> Result<()> {
        let key = entity.primary_key();
        if is_unset(&entity.base().create_time) {
            let stored = self.get(&key).await?;
            entity.base_mut().create_time = stored.base().create_time;
        }
        entity.base_mut().update_time = Utc::now();

        let document = serde_json::to_string(entity)?;
        let query = Query::update()
            .table(Entities::Table)
            .value(Entities::Document, document)
            .and_where(Expr::col(Entities::Kind).eq(T::KIND))
            .and_where(Expr::col(Entities::PrimaryKey).eq(key.as_str()))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found(&key));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let query = Query::delete()
            .from_table(Entities::Table)
            .and_where(Expr::col(Entities::Kind).eq(T::KIND))
            .and_where(Expr::col(Entities::PrimaryKey).eq(key))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found(key));
        }
        Ok(())
    }

    async fn list(&self, filter: &Index, options: &ListOptions) -> Result<Vec<T>> {
        Ok(apply_list_options(self.load_all().await?, filter, options))
    }

    async fn count(&self, filter: &Index, options: Option<&FilterOptions>) -> Result<u64> {
        let entities = self.load_all().await?;
        Ok(entities
            .iter()
            .filter(|entity| matches(*entity, filter, options))
            .count() as u64)
    }
}
