use rusqlite::types::Value;
use rusqlite::{Connection, Row, params};

use super::{Entity, Polymorphic, Repository, load_linked, parse_timestamp};
use crate::error::{Error, Result};
use crate::models::{Employee, Publication, PublicationKind};

pub type PublicationRepository<'s> = Repository<'s, Publication>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationNav {
    /// Linked employees in author order. Also fills `author_ids`.
    Authors,
}

impl Entity for Publication {
    const NAME: &'static str = "publication";
    const TABLE: &'static str = "publications";
    const COLUMNS: &'static [&'static str] = &[
        "kind",
        "title",
        "year",
        "publisher",
        "journal",
        "isbn",
        "doi",
        "pages",
        "created_at",
    ];

    type Navigation = PublicationNav;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let kind: String = row.get(1)?;
        let created_at: String = row.get(9)?;
        Ok(Publication {
            id: Some(row.get(0)?),
            kind: kind.parse().map_err(Error::InvalidData)?,
            title: row.get(2)?,
            year: row.get(3)?,
            publisher: row.get(4)?,
            journal: row.get(5)?,
            isbn: row.get(6)?,
            doi: row.get(7)?,
            pages: row.get(8)?,
            created_at: parse_timestamp(&created_at)?,
            author_ids: None,
            authors: Vec::new(),
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.kind.as_str().to_string()),
            Value::from(self.title.clone()),
            Value::from(self.year),
            Value::from(self.publisher.clone()),
            Value::from(self.journal.clone()),
            Value::from(self.isbn.clone()),
            Value::from(self.doi.clone()),
            Value::from(self.pages),
            Value::from(self.created_at.to_rfc3339()),
        ]
    }

    /// Rewrite the author links when `author_ids` is set.
    fn save_relations(&self, conn: &Connection, id: i64) -> Result<()> {
        let Some(author_ids) = &self.author_ids else {
            return Ok(());
        };

        conn.execute(
            "DELETE FROM publication_authors WHERE publication_id = ?1",
            params![id],
        )?;
        for (position, employee_id) in author_ids.iter().enumerate() {
            let exists: bool = conn.query_row(
                "SELECT COUNT(*) FROM employees WHERE id = ?1",
                params![employee_id],
                |row| row.get::<_, i64>(0).map(|n| n > 0),
            )?;
            if !exists {
                return Err(Error::Validation(format!(
                    "unknown author: no employee with id {employee_id}"
                )));
            }
            conn.execute(
                "INSERT INTO publication_authors (publication_id, employee_id, position)
                 VALUES (?1, ?2, ?3)",
                params![id, employee_id, position as i64],
            )?;
        }
        Ok(())
    }

    fn include(conn: &Connection, items: &mut [Self], navigation: PublicationNav) -> Result<()> {
        match navigation {
            PublicationNav::Authors => {
                let ids: Vec<i64> = items.iter().filter_map(|p| p.id).collect();
                let mut grouped = load_linked::<Employee>(
                    conn,
                    "publication_authors l JOIN employees t ON t.id = l.employee_id",
                    "l.publication_id",
                    "l.publication_id, l.position",
                    &ids,
                )?;
                for publication in items.iter_mut() {
                    let authors = publication
                        .id
                        .and_then(|id| grouped.remove(&id))
                        .unwrap_or_default();
                    publication.author_ids = Some(authors.iter().filter_map(|a| a.id).collect());
                    publication.authors = authors;
                }
                Ok(())
            }
        }
    }
}

impl Polymorphic for Publication {
    type Kind = PublicationKind;
    const DISCRIMINATOR: &'static str = "kind";

    fn discriminator_value(kind: PublicationKind) -> Value {
        Value::from(kind.as_str().to_string())
    }
}
