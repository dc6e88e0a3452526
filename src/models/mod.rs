use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Transport shapes and the entity → DTO mapping.
pub mod dto;

pub use dto::{AuthorDto, EmployeeDto, NewEmployee, NewPublication, PublicationDto};

/// Discriminator of the publication hierarchy, stored in `publications.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationKind {
    Article,
    Book,
    Chapter,
    ConferencePaper,
    Thesis,
    Other,
}

impl PublicationKind {
    pub const ALL: [PublicationKind; 6] = [
        PublicationKind::Article,
        PublicationKind::Book,
        PublicationKind::Chapter,
        PublicationKind::ConferencePaper,
        PublicationKind::Thesis,
        PublicationKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationKind::Article => "article",
            PublicationKind::Book => "book",
            PublicationKind::Chapter => "chapter",
            PublicationKind::ConferencePaper => "conference_paper",
            PublicationKind::Thesis => "thesis",
            PublicationKind::Other => "other",
        }
    }
}

impl FromStr for PublicationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "article" => Ok(PublicationKind::Article),
            "book" => Ok(PublicationKind::Book),
            "chapter" => Ok(PublicationKind::Chapter),
            "conference_paper" | "conference-paper" | "conference" => {
                Ok(PublicationKind::ConferencePaper)
            }
            "thesis" => Ok(PublicationKind::Thesis),
            "other" => Ok(PublicationKind::Other),
            _ => Err(format!("unknown publication kind: {s}")),
        }
    }
}

// Serialized as plain text so JSON and XML carry the same value.
impl Serialize for PublicationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for PublicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Navigation: empty until included or loaded.
    pub publications: Vec<Publication>,
}

impl Employee {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Employee {
            id: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: None,
            position: None,
            created_at: Utc::now(),
            publications: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub id: Option<i64>,
    pub kind: PublicationKind,
    pub title: String,
    pub year: i32,
    pub publisher: Option<String>,
    pub journal: Option<String>,
    pub isbn: Option<String>,
    pub doi: Option<String>,
    pub pages: Option<u32>,
    pub created_at: DateTime<Utc>,
    /// Employee ids linked through `publication_authors`, in author order.
    /// `None` leaves the stored links untouched when the row is updated.
    pub author_ids: Option<Vec<i64>>,
    /// Navigation: empty until included or loaded.
    pub authors: Vec<Employee>,
}

impl Publication {
    pub fn new(kind: PublicationKind, title: &str, year: i32) -> Self {
        Publication {
            id: None,
            kind,
            title: title.to_string(),
            year,
            publisher: None,
            journal: None,
            isbn: None,
            doi: None,
            pages: None,
            created_at: Utc::now(),
            author_ids: None,
            authors: Vec::new(),
        }
    }
}
