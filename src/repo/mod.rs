//! Generic repository over SQLite plus the session that batches writes.
//!
//! Reads run immediately. Writes (`insert`, `update`, `delete`) are staged on
//! the [`Session`] and only reach the database when
//! [`Session::save_changes`] applies them, in staging order, inside a single
//! transaction.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

use crate::error::{Error, Result};

mod employee;
mod publication;
mod query;

pub use employee::{EmployeeNav, EmployeeRepository};
pub use publication::{PublicationNav, PublicationRepository};
pub use query::{CompareOp, Filter, Order, Query};

/// A record type stored in one table with an integer `id` key.
pub trait Entity: Clone + Sized + 'static {
    /// Human-readable name used in errors and logs.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Non-key columns, in the order `values` encodes them and `from_row`
    /// reads them after `id`.
    const COLUMNS: &'static [&'static str];

    /// Related collections that can be included on read.
    type Navigation: Copy + fmt::Debug;

    fn id(&self) -> Option<i64>;

    /// Decode a row selected as `id, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> Result<Self>;

    /// Encode the non-key columns, matching `COLUMNS`.
    fn values(&self) -> Vec<Value>;

    /// Persist rows owned by this entity in other tables, after its own row
    /// has been inserted or updated under `id`.
    fn save_relations(&self, _conn: &Connection, _id: i64) -> Result<()> {
        Ok(())
    }

    /// Populate `navigation` on every item.
    fn include(conn: &Connection, items: &mut [Self], navigation: Self::Navigation) -> Result<()>;
}

/// An entity whose rows form a type hierarchy told apart by one column.
pub trait Polymorphic: Entity {
    type Kind: Copy + fmt::Debug;
    const DISCRIMINATOR: &'static str;

    fn discriminator_value(kind: Self::Kind) -> Value;
}

/// `SELECT id, c1, c2, ... FROM table`
pub(crate) fn select_sql<E: Entity>() -> String {
    format!("SELECT id, {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

/// Run `sql` and decode every row as `E`.
pub(crate) fn query_rows<E: Entity>(
    conn: &Connection,
    sql: &str,
    params: &[Value],
) -> Result<Vec<E>> {
    debug!(sql, params = params.len(), "query");
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(E::from_row(row)?);
    }
    Ok(items)
}

/// Owner keys bound per link query; SQLite caps bound variables at 32766.
const LINK_CHUNK: usize = 500;

/// Load `T` rows reached through a link table, grouped by owner key.
///
/// `from` must alias the target table as `t`; `owner_column` is selected
/// after `T`'s own columns so `T::from_row` can decode the row unchanged.
pub(crate) fn load_linked<T: Entity>(
    conn: &Connection,
    from: &str,
    owner_column: &str,
    order: &str,
    owner_ids: &[i64],
) -> Result<HashMap<i64, Vec<T>>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    if owner_ids.is_empty() {
        return Ok(grouped);
    }

    let columns = std::iter::once("id")
        .chain(T::COLUMNS.iter().copied())
        .map(|c| format!("t.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    // Each owner lands in exactly one chunk, so per-owner order survives.
    for chunk in owner_ids.chunks(LINK_CHUNK) {
        let sql = format!(
            "SELECT {columns}, {owner_column} FROM {from} WHERE {owner_column} IN ({}) ORDER BY {order}",
            query::placeholders(chunk.len())
        );
        debug!(sql, owners = chunk.len(), "load linked");

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            let item = T::from_row(row)?;
            let owner: i64 = row.get(T::COLUMNS.len() + 1)?;
            grouped.entry(owner).or_default().push(item);
        }
    }
    Ok(grouped)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidData(format!("timestamp {value:?}: {e}")))
}

type RelationWriter = Box<dyn FnOnce(&Connection, i64) -> Result<()>>;

enum Change {
    Insert {
        entity: &'static str,
        sql: String,
        values: Vec<Value>,
        relations: RelationWriter,
    },
    Update {
        entity: &'static str,
        id: i64,
        sql: String,
        values: Vec<Value>,
        relations: RelationWriter,
    },
    Delete {
        entity: &'static str,
        id: i64,
        sql: String,
    },
}

/// Outcome of a successful [`Session::save_changes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Keys assigned to inserted rows, in staging order.
    pub inserted_ids: Vec<i64>,
    pub updated: usize,
    pub deleted: usize,
}

/// Unit of work over one connection.
pub struct Session<'c> {
    conn: &'c Connection,
    pending: RefCell<Vec<Change>>,
}

impl<'c> Session<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Session {
            conn,
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    fn stage(&self, change: Change) {
        self.pending.borrow_mut().push(change);
    }

    /// Apply every staged change in one transaction.
    ///
    /// An update or delete that matches no row fails with `NotFound` and
    /// rolls back the whole batch. The staged list is emptied either way.
    pub fn save_changes(&self) -> Result<SaveSummary> {
        let changes = std::mem::take(&mut *self.pending.borrow_mut());
        let mut summary = SaveSummary::default();
        if changes.is_empty() {
            return Ok(summary);
        }

        let count = changes.len();
        let tx = self.conn.unchecked_transaction()?;
        for change in changes {
            match change {
                Change::Insert {
                    entity,
                    sql,
                    values,
                    relations,
                } => {
                    tx.execute(&sql, params_from_iter(values.iter()))?;
                    let id = tx.last_insert_rowid();
                    relations(&*tx, id)?;
                    debug!(entity, id, "inserted");
                    summary.inserted_ids.push(id);
                }
                Change::Update {
                    entity,
                    id,
                    sql,
                    values,
                    relations,
                } => {
                    let rows = tx.execute(&sql, params_from_iter(values.iter()))?;
                    if rows == 0 {
                        return Err(Error::not_found(entity, id));
                    }
                    relations(&*tx, id)?;
                    debug!(entity, id, "updated");
                    summary.updated += 1;
                }
                Change::Delete { entity, id, sql } => {
                    let rows = tx.execute(&sql, [id])?;
                    if rows == 0 {
                        return Err(Error::not_found(entity, id));
                    }
                    debug!(entity, id, "deleted");
                    summary.deleted += 1;
                }
            }
        }
        tx.commit()?;
        debug!(changes = count, "saved changes");
        Ok(summary)
    }
}

/// Data-access facade for one entity type.
pub struct Repository<'s, E: Entity> {
    session: &'s Session<'s>,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, E: Entity> Repository<'s, E> {
    pub fn new(session: &'s Session<'s>) -> Self {
        Repository {
            session,
            _entity: PhantomData,
        }
    }

    fn conn(&self) -> &Connection {
        self.session.connection()
    }

    /// Rows matching `query`, ordered by its terms (or by key when it has
    /// none), with the requested navigations loaded.
    pub fn get(&self, query: &Query<E>) -> Result<Vec<E>> {
        self.fetch(query.filter.as_ref(), query)
    }

    /// Look up one row by key. Navigations are not loaded.
    pub fn get_by_id(&self, id: i64) -> Result<Option<E>> {
        let sql = format!("{} WHERE id = ?", select_sql::<E>());
        Ok(query_rows::<E>(self.conn(), &sql, &[Value::Integer(id)])?
            .into_iter()
            .next())
    }

    /// Load `navigation` on an entity that was fetched without it.
    pub fn load(&self, entity: &mut E, navigation: E::Navigation) -> Result<()> {
        E::include(self.conn(), std::slice::from_mut(entity), navigation)
    }

    /// Load `navigation` on every item of `items`.
    pub fn load_all(&self, items: &mut [E], navigation: E::Navigation) -> Result<()> {
        E::include(self.conn(), items, navigation)
    }

    /// Stage an insert. Any id already on `entity` is ignored; the database
    /// assigns one when the session is saved.
    pub fn insert(&self, entity: &E) {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            E::COLUMNS.join(", "),
            query::placeholders(E::COLUMNS.len())
        );
        let owned = entity.clone();
        self.session.stage(Change::Insert {
            entity: E::NAME,
            sql,
            values: entity.values(),
            relations: Box::new(move |conn: &Connection, id: i64| owned.save_relations(conn, id)),
        });
    }

    /// Stage a full-row update keyed by the entity's id.
    pub fn update(&self, entity: &E) -> Result<()> {
        let id = entity.id().ok_or(Error::MissingKey(E::NAME))?;
        let sets = E::COLUMNS
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {sets} WHERE id = ?", E::TABLE);
        let mut values = entity.values();
        values.push(Value::Integer(id));
        let owned = entity.clone();
        self.session.stage(Change::Update {
            entity: E::NAME,
            id,
            sql,
            values,
            relations: Box::new(move |conn: &Connection, id: i64| owned.save_relations(conn, id)),
        });
        Ok(())
    }

    /// Stage a delete of the entity's row.
    pub fn delete(&self, entity: &E) -> Result<()> {
        let id = entity.id().ok_or(Error::MissingKey(E::NAME))?;
        self.stage_delete(id);
        Ok(())
    }

    /// Stage a delete by key, failing with `NotFound` if no such row exists.
    pub fn delete_by_id(&self, id: i64) -> Result<()> {
        let entity = self
            .get_by_id(id)?
            .ok_or_else(|| Error::not_found(E::NAME, id))?;
        self.delete(&entity)
    }

    fn stage_delete(&self, id: i64) {
        self.session.stage(Change::Delete {
            entity: E::NAME,
            id,
            sql: format!("DELETE FROM {} WHERE id = ?", E::TABLE),
        });
    }

    fn fetch(&self, filter: Option<&Filter>, query: &Query<E>) -> Result<Vec<E>> {
        let mut sql = select_sql::<E>();
        let mut params = Vec::new();
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.to_sql::<E>(&mut params)?);
        }
        if query.order.is_empty() {
            sql.push_str(" ORDER BY id ASC");
        } else {
            let terms = query
                .order
                .iter()
                .map(|o| o.to_sql::<E>())
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(&format!(" ORDER BY {}, id ASC", terms.join(", ")));
        }

        let mut items = query_rows::<E>(self.conn(), &sql, &params)?;
        for navigation in &query.include {
            E::include(self.conn(), &mut items, *navigation)?;
        }
        Ok(items)
    }
}

impl<'s, E: Polymorphic> Repository<'s, E> {
    /// Like [`Repository::get`], restricted to rows of one `kind`.
    pub fn get_of_type(&self, kind: E::Kind, query: &Query<E>) -> Result<Vec<E>> {
        let by_kind = Filter::eq(E::DISCRIMINATOR, E::discriminator_value(kind));
        let filter = match &query.filter {
            Some(existing) => by_kind.and(existing.clone()),
            None => by_kind,
        };
        self.fetch(Some(&filter), query)
    }
}
