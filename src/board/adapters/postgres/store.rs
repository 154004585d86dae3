//! `PostgreSQL` list store.
//!
//! Every mutation runs in one `REPEATABLE READ` transaction that locks the
//! touched scope rows in ascending id order, checks the planned snapshots,
//! applies the writes, and verifies the dense-rank policy before commit.
//! Locking a scope also bumps its revision, so a transaction whose snapshot
//! predates a concurrent writer's commit fails with a serialization error
//! instead of reading stale ranks. Lock and statement timeouts keep
//! transactions bounded.

use super::{
    models::{ItemRow, NewItemRow, ScopeRow},
    schema::{items, scopes},
};
use crate::board::{
    domain::{
        Item, ItemDraft, ItemId, ItemPayload, PersistedItemData, Rank, RankedList, Scope, ScopeId,
        verify_dense,
    },
    ports::{ChangeSet, ConflictKind, ListStore, ListStoreError, ListStoreResult, RankWrite},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Array, Integer, Uuid as SqlUuid};
use std::collections::BTreeMap;
use std::time::Duration;

/// `PostgreSQL` connection pool type used by the list store.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(5);

/// `PostgreSQL`-backed [`ListStore`].
#[derive(Debug, Clone)]
pub struct PostgresListStore {
    pool: BoardPgPool,
    transaction_timeout: Duration,
}

impl PostgresListStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self {
            pool,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    /// Sets the lock and statement timeout applied to each transaction.
    #[must_use]
    pub const fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &BoardPgPool {
        &self.pool
    }

    async fn run_blocking<F, T>(&self, f: F) -> ListStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ListStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ListStoreError::unavailable)?;
            f(&mut connection)
        })
        .await
        .map_err(ListStoreError::persistence)?
    }

    async fn run_transaction<F, T>(&self, f: F) -> ListStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ListStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let timeout = self.transaction_timeout;
        self.run_blocking(move |connection| {
            connection
                .build_transaction()
                .repeatable_read()
                .run(|tx| {
                    set_local_timeouts(tx, timeout)?;
                    f(tx)
                })
        })
        .await
    }
}

impl From<DieselError> for ListStoreError {
    fn from(err: DieselError) -> Self {
        if let Some(kind) = conflict_kind(&err) {
            return Self::Conflict(kind);
        }
        if is_connection_error(&err) {
            return Self::unavailable(err);
        }
        Self::persistence(err)
    }
}

fn conflict_kind(err: &DieselError) -> Option<ConflictKind> {
    let DieselError::DatabaseError(kind, info) = err else {
        return None;
    };
    if matches!(kind, DatabaseErrorKind::SerializationFailure) {
        return Some(ConflictKind::Serialization);
    }
    let message = info.message();
    if message.contains("deadlock detected") {
        return Some(ConflictKind::Serialization);
    }
    (message.contains("lock timeout") || message.contains("statement timeout"))
        .then_some(ConflictKind::Timeout)
}

const fn is_connection_error(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::UnableToSendCommand,
            _
        )
    )
}

fn is_constraint_violation(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

/// Converts a timeout to whole milliseconds for `SET LOCAL`, rounding up.
///
/// `PostgreSQL` reads `0` as "no timeout", so the result is at least one.
fn timeout_setting_ms(timeout: Duration) -> u128 {
    timeout.as_micros().div_ceil(1_000).max(1)
}

fn set_local_timeouts(connection: &mut PgConnection, timeout: Duration) -> ListStoreResult<()> {
    let millis = timeout_setting_ms(timeout);
    diesel::sql_query(format!("SET LOCAL lock_timeout = '{millis}ms'")).execute(connection)?;
    diesel::sql_query(format!("SET LOCAL statement_timeout = '{millis}ms'"))
        .execute(connection)?;
    Ok(())
}

/// Locks the given scope rows in ascending id order and bumps their
/// revisions.
fn lock_scopes(connection: &mut PgConnection, ids: &[ScopeId]) -> ListStoreResult<()> {
    let wanted: Vec<uuid::Uuid> = ids.iter().map(|id| id.into_inner()).collect();
    let locked: Vec<uuid::Uuid> = scopes::table
        .filter(scopes::id.eq_any(wanted))
        .order(scopes::id.asc())
        .select(scopes::id)
        .for_update()
        .load(connection)?;

    if let Some(missing) = ids.iter().find(|id| !locked.contains(&id.into_inner())) {
        return Err(ListStoreError::ScopeNotFound(*missing));
    }
    diesel::update(scopes::table.filter(scopes::id.eq_any(locked)))
        .set(scopes::revision.eq(scopes::revision + 1_i64))
        .execute(connection)?;
    Ok(())
}

fn load_snapshot(connection: &mut PgConnection, scope: ScopeId) -> ListStoreResult<RankedList> {
    let rows: Vec<(uuid::Uuid, i32)> = items::table
        .filter(items::scope_id.eq(scope.into_inner()))
        .select((items::id, items::sort_rank))
        .load(connection)?;
    let entries = rows
        .into_iter()
        .map(|(id, rank)| Ok((ItemId::from_uuid(id), rank_from_sql(rank)?)))
        .collect::<ListStoreResult<Vec<_>>>()?;
    Ok(RankedList::from_entries(entries))
}

fn verify_scope_dense(connection: &mut PgConnection, scope: ScopeId) -> ListStoreResult<()> {
    let snapshot = load_snapshot(connection, scope)?;
    verify_dense(scope, snapshot.entries().iter().map(|(_, rank)| *rank))?;
    Ok(())
}

fn apply_write(connection: &mut PgConnection, write: &RankWrite) -> ListStoreResult<()> {
    match write {
        RankWrite::Create(item) => insert_item(connection, item),
        RankWrite::Delete(item_id) => {
            let deleted = diesel::delete(items::table.filter(items::id.eq(item_id.into_inner())))
                .execute(connection)?;
            if deleted == 0 {
                return Err(ListStoreError::ItemNotFound(*item_id));
            }
            Ok(())
        }
        RankWrite::SetOrder(batch) => set_order(connection, batch),
        RankWrite::MoveScope { item, scope, rank } => {
            let updated = diesel::update(items::table.filter(items::id.eq(item.into_inner())))
                .set((
                    items::scope_id.eq(scope.into_inner()),
                    items::sort_rank.eq(rank_to_sql(*rank)?),
                ))
                .execute(connection)?;
            if updated == 0 {
                return Err(ListStoreError::ItemNotFound(*item));
            }
            Ok(())
        }
    }
}

fn insert_item(connection: &mut PgConnection, item: &Item) -> ListStoreResult<()> {
    let row = to_new_row(item)?;
    diesel::insert_into(items::table)
        .values(&row)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if is_constraint_violation(info.as_ref(), "items_pkey") =>
            {
                ListStoreError::DuplicateItem(item.id())
            }
            _ => ListStoreError::from(err),
        })?;
    Ok(())
}

/// Rewrites many ranks with a single statement.
fn set_order(
    connection: &mut PgConnection,
    batch: &BTreeMap<ItemId, Rank>,
) -> ListStoreResult<()> {
    let ids: Vec<uuid::Uuid> = batch.keys().map(|id| id.into_inner()).collect();
    let ranks = batch
        .values()
        .map(|rank| rank_to_sql(*rank))
        .collect::<ListStoreResult<Vec<i32>>>()?;

    let updated = diesel::sql_query(concat!(
        "UPDATE items SET sort_rank = batch.sort_rank ",
        "FROM unnest($1::uuid[], $2::int4[]) AS batch(id, sort_rank) ",
        "WHERE items.id = batch.id",
    ))
    .bind::<Array<SqlUuid>, _>(ids.clone())
    .bind::<Array<Integer>, _>(ranks)
    .execute(connection)?;

    if updated == ids.len() {
        return Ok(());
    }
    let present: Vec<uuid::Uuid> = items::table
        .filter(items::id.eq_any(ids))
        .select(items::id)
        .load(connection)?;
    let missing = batch
        .keys()
        .find(|id| !present.contains(&id.into_inner()))
        .copied();
    Err(missing.map_or_else(
        || {
            ListStoreError::persistence(std::io::Error::other(
                "rank batch updated an unexpected number of rows",
            ))
        },
        ListStoreError::ItemNotFound,
    ))
}

fn rank_to_sql(rank: Rank) -> ListStoreResult<i32> {
    i32::try_from(rank.value()).map_err(ListStoreError::persistence)
}

fn rank_from_sql(value: i32) -> ListStoreResult<Rank> {
    usize::try_from(value)
        .map(Rank::new)
        .map_err(ListStoreError::persistence)
}

fn to_new_row(item: &Item) -> ListStoreResult<NewItemRow> {
    Ok(NewItemRow {
        id: item.id().into_inner(),
        scope_id: item.scope_id().into_inner(),
        sort_rank: rank_to_sql(item.rank())?,
        payload: item.payload().as_value().clone(),
        created_at: item.created_at(),
    })
}

fn row_to_item(row: ItemRow) -> ListStoreResult<Item> {
    let ItemRow {
        id,
        scope_id,
        sort_rank,
        payload,
        created_at,
    } = row;
    Ok(Item::from_persisted(PersistedItemData {
        id: ItemId::from_uuid(id),
        scope_id: ScopeId::from_uuid(scope_id),
        rank: rank_from_sql(sort_rank)?,
        payload: ItemPayload::new(payload),
        created_at,
    }))
}

fn row_to_scope(row: ScopeRow) -> Scope {
    Scope::from_persisted(ScopeId::from_uuid(row.id), row.created_at)
}

#[async_trait]
impl ListStore for PostgresListStore {
    async fn create_scope(&self, scope: &Scope) -> ListStoreResult<()> {
        let scope_id = scope.id();
        let row = ScopeRow {
            id: scope_id.into_inner(),
            created_at: scope.created_at(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(scopes::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ListStoreError::DuplicateScope(scope_id)
                    }
                    _ => ListStoreError::from(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn delete_scope(&self, id: ScopeId) -> ListStoreResult<()> {
        self.run_transaction(move |tx| {
            lock_scopes(tx, &[id])?;
            diesel::delete(scopes::table.filter(scopes::id.eq(id.into_inner()))).execute(tx)?;
            Ok(())
        })
        .await
    }

    async fn find_scope(&self, id: ScopeId) -> ListStoreResult<Option<Scope>> {
        self.run_blocking(move |connection| {
            let row = scopes::table
                .filter(scopes::id.eq(id.into_inner()))
                .select(ScopeRow::as_select())
                .first::<ScopeRow>(connection)
                .optional()?;
            Ok(row.map(row_to_scope))
        })
        .await
    }

    async fn list_scopes(&self) -> ListStoreResult<Vec<Scope>> {
        self.run_blocking(|connection| {
            let rows = scopes::table
                .order((scopes::created_at.asc(), scopes::id.asc()))
                .select(ScopeRow::as_select())
                .load::<ScopeRow>(connection)?;
            Ok(rows.into_iter().map(row_to_scope).collect())
        })
        .await
    }

    async fn find_item(&self, id: ItemId) -> ListStoreResult<Option<Item>> {
        self.run_blocking(move |connection| {
            let row = items::table
                .filter(items::id.eq(id.into_inner()))
                .select(ItemRow::as_select())
                .first::<ItemRow>(connection)
                .optional()?;
            row.map(row_to_item).transpose()
        })
        .await
    }

    async fn list_by_scope(&self, scope: ScopeId) -> ListStoreResult<Vec<Item>> {
        self.run_blocking(move |connection| {
            connection
                .build_transaction()
                .repeatable_read()
                .read_only()
                .run(|tx| {
                    let exists = scopes::table
                        .filter(scopes::id.eq(scope.into_inner()))
                        .select(scopes::id)
                        .first::<uuid::Uuid>(tx)
                        .optional()?;
                    if exists.is_none() {
                        return Err(ListStoreError::ScopeNotFound(scope));
                    }
                    let rows = items::table
                        .filter(items::scope_id.eq(scope.into_inner()))
                        .order((items::sort_rank.asc(), items::id.asc()))
                        .select(ItemRow::as_select())
                        .load::<ItemRow>(tx)?;
                    rows.into_iter().map(row_to_item).collect()
                })
        })
        .await
    }

    async fn create(&self, draft: ItemDraft) -> ListStoreResult<Item> {
        let scope = draft.scope_id();
        let item = self
            .run_transaction(move |tx| {
                lock_scopes(tx, &[scope])?;
                let snapshot = load_snapshot(tx, scope)?;
                verify_dense(scope, snapshot.entries().iter().map(|(_, rank)| *rank))?;
                let placed = draft.place(Rank::new(snapshot.len()));
                insert_item(tx, &placed)?;
                Ok(placed)
            })
            .await?;
        tracing::debug!(item = %item.id(), %scope, rank = %item.rank(), "appended item");
        Ok(item)
    }

    async fn commit(&self, changes: ChangeSet) -> ListStoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        changes.check_declared()?;

        let scope_count = changes.expectations().len();
        let write_count = changes.writes().len();
        self.run_transaction(move |tx| {
            let declared: Vec<ScopeId> = changes.scopes().collect();
            lock_scopes(tx, &declared)?;

            for (scope, expected) in changes.expectations() {
                if &load_snapshot(tx, *scope)? != expected {
                    return Err(ListStoreError::Conflict(ConflictKind::StaleSnapshot(*scope)));
                }
            }
            for write in changes.writes() {
                apply_write(tx, write)?;
            }
            for scope in &declared {
                verify_scope_dense(tx, *scope)?;
            }
            Ok(())
        })
        .await?;

        tracing::debug!(
            scopes = scope_count,
            writes = write_count,
            "committed change set"
        );
        Ok(())
    }
}
