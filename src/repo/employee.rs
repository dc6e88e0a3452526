use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{Entity, Repository, load_linked, parse_timestamp};
use crate::error::Result;
use crate::models::{Employee, Publication};

pub type EmployeeRepository<'s> = Repository<'s, Employee>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeNav {
    /// Publications the employee is an author of, oldest row first.
    Publications,
}

impl Entity for Employee {
    const NAME: &'static str = "employee";
    const TABLE: &'static str = "employees";
    const COLUMNS: &'static [&'static str] =
        &["first_name", "last_name", "email", "position", "created_at"];

    type Navigation = EmployeeNav;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let created_at: String = row.get(5)?;
        Ok(Employee {
            id: Some(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            position: row.get(4)?,
            created_at: parse_timestamp(&created_at)?,
            publications: Vec::new(),
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.first_name.clone()),
            Value::from(self.last_name.clone()),
            Value::from(self.email.clone()),
            Value::from(self.position.clone()),
            Value::from(self.created_at.to_rfc3339()),
        ]
    }

    fn include(conn: &Connection, items: &mut [Self], navigation: EmployeeNav) -> Result<()> {
        match navigation {
            EmployeeNav::Publications => {
                let ids: Vec<i64> = items.iter().filter_map(|e| e.id).collect();
                let mut grouped = load_linked::<Publication>(
                    conn,
                    "publication_authors l JOIN publications t ON t.id = l.publication_id",
                    "l.employee_id",
                    "l.employee_id, t.id",
                    &ids,
                )?;
                for employee in items.iter_mut() {
                    employee.publications = employee
                        .id
                        .and_then(|id| grouped.remove(&id))
                        .unwrap_or_default();
                }
                Ok(())
            }
        }
    }
}
