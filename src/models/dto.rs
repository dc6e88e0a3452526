use serde::{Deserialize, Serialize};

use super::{Employee, Publication, PublicationKind};
use crate::error::{Error, Result};

/// Publication as returned by the API and the XML export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationDto {
    pub id: i64,
    pub kind: PublicationKind,
    pub title: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default)]
    pub authors: Vec<AuthorDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorDto {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

// Mapping only ever sees entities read back from the database, so a missing
// id falls back to 0 rather than failing the whole response.
impl From<&Publication> for PublicationDto {
    fn from(p: &Publication) -> Self {
        PublicationDto {
            id: p.id.unwrap_or_default(),
            kind: p.kind,
            title: p.title.clone(),
            year: p.year,
            publisher: p.publisher.clone(),
            journal: p.journal.clone(),
            isbn: p.isbn.clone(),
            doi: p.doi.clone(),
            pages: p.pages,
            authors: p.authors.iter().map(AuthorDto::from).collect(),
        }
    }
}

impl From<&Employee> for AuthorDto {
    fn from(e: &Employee) -> Self {
        AuthorDto {
            id: e.id.unwrap_or_default(),
            name: e.full_name(),
        }
    }
}

impl From<&Employee> for EmployeeDto {
    fn from(e: &Employee) -> Self {
        EmployeeDto {
            id: e.id.unwrap_or_default(),
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            email: e.email.clone(),
            position: e.position.clone(),
        }
    }
}

/// Request body for creating or replacing a publication.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPublication {
    pub kind: PublicationKind,
    pub title: String,
    pub year: i32,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub author_ids: Vec<i64>,
}

impl NewPublication {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }
        if !(1000..=9999).contains(&self.year) {
            return Err(Error::Validation(format!(
                "year must have four digits, got {}",
                self.year
            )));
        }
        Ok(())
    }

    /// Validate and build a fresh, unsaved entity.
    pub fn into_entity(self) -> Result<Publication> {
        let mut publication = Publication::new(self.kind, "", self.year);
        self.apply_to(&mut publication)?;
        Ok(publication)
    }

    /// Validate and overwrite every writable field of `publication`.
    pub fn apply_to(self, publication: &mut Publication) -> Result<()> {
        self.validate()?;
        let mut author_ids = self.author_ids;
        // Duplicate links would violate the primary key of publication_authors.
        let mut seen = std::collections::HashSet::new();
        author_ids.retain(|id| seen.insert(*id));

        publication.kind = self.kind;
        publication.title = self.title.trim().to_string();
        publication.year = self.year;
        publication.publisher = non_empty(self.publisher);
        publication.journal = non_empty(self.journal);
        publication.isbn = non_empty(self.isbn);
        publication.doi = non_empty(self.doi);
        publication.pages = self.pages;
        publication.author_ids = Some(author_ids);
        publication.authors.clear();
        Ok(())
    }
}

/// Request body for creating an employee.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl NewEmployee {
    pub fn into_entity(self) -> Result<Employee> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(Error::Validation(
                "first_name and last_name must not be empty".to_string(),
            ));
        }
        let mut employee = Employee::new(self.first_name.trim(), self.last_name.trim());
        employee.email = non_empty(self.email);
        employee.position = non_empty(self.position);
        Ok(employee)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
