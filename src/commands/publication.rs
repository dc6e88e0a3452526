use std::path::Path;

use pubtrack::models::{NewPublication, Publication, PublicationDto, PublicationKind};
use pubtrack::repo::{
    EmployeeNav, EmployeeRepository, Filter, Order, PublicationNav, PublicationRepository, Query,
};
use pubtrack::{Error, Result};

use super::{format_kind, open_db, print_json, print_publications};

pub struct AddArgs {
    pub title: String,
    pub kind: String,
    pub year: i32,
    pub journal: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub doi: Option<String>,
    pub pages: Option<u32>,
    pub authors: Vec<i64>,
}

fn parse_kind(kind: &str) -> Result<PublicationKind> {
    kind.parse().map_err(Error::Validation)
}

pub fn add(db_path: &Path, args: AddArgs, json: bool) -> Result<()> {
    let publication = NewPublication {
        kind: parse_kind(&args.kind)?,
        title: args.title,
        year: args.year,
        publisher: args.publisher,
        journal: args.journal,
        isbn: args.isbn,
        doi: args.doi,
        pages: args.pages,
        author_ids: args.authors,
    }
    .into_entity()?;

    let db = open_db(db_path)?;
    let session = db.session();
    let repo = PublicationRepository::new(&session);
    repo.insert(&publication);
    let id = session
        .save_changes()?
        .inserted_ids
        .first()
        .copied()
        .ok_or_else(|| Error::InvalidData("insert returned no id".to_string()))?;

    let saved = load_with_authors(&repo, id)?;
    if json {
        return print_json(&PublicationDto::from(&saved));
    }
    println!("Added publication {id}: {}", saved.title);
    Ok(())
}

pub fn list(
    db_path: &Path,
    kind: Option<&str>,
    year: Option<i32>,
    employee: Option<i64>,
    sort: Option<&str>,
    json: bool,
) -> Result<()> {
    let db = open_db(db_path)?;
    let session = db.session();
    let repo = PublicationRepository::new(&session);

    let mut query = Query::new().include(PublicationNav::Authors);
    if let Some(year) = year {
        query = query.filter(Filter::eq("year", year));
    }
    if let Some(employee_id) = employee {
        let employees = EmployeeRepository::new(&session);
        let mut found = employees
            .get_by_id(employee_id)?
            .ok_or_else(|| Error::not_found("employee", employee_id))?;
        employees.load(&mut found, EmployeeNav::Publications)?;
        let ids: Vec<i64> = found.publications.iter().filter_map(|p| p.id).collect();
        query = query.filter(Filter::is_in("id", ids));
    }
    for key in sort.into_iter().flat_map(|s| s.split(',')) {
        let key = key.trim();
        if !key.is_empty() {
            query = query.order_by(Order::parse(key));
        }
    }

    let publications = match kind {
        Some(kind) => repo.get_of_type(parse_kind(kind)?, &query)?,
        None => repo.get(&query)?,
    };
    let dtos: Vec<PublicationDto> = publications.iter().map(PublicationDto::from).collect();
    print_publications(&dtos, json)
}

pub fn show(db_path: &Path, id: i64, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let session = db.session();
    let publication = load_with_authors(&PublicationRepository::new(&session), id)?;

    if json {
        return print_json(&PublicationDto::from(&publication));
    }

    println!("ID:        {id}");
    println!("Title:     {}", publication.title);
    println!("Kind:      {}", format_kind(publication.kind));
    println!("Year:      {}", publication.year);
    if let Some(ref journal) = publication.journal {
        println!("Journal:   {journal}");
    }
    if let Some(ref publisher) = publication.publisher {
        println!("Publisher: {publisher}");
    }
    if let Some(ref isbn) = publication.isbn {
        println!("ISBN:      {isbn}");
    }
    if let Some(ref doi) = publication.doi {
        println!("DOI:       {doi}");
    }
    if let Some(pages) = publication.pages {
        println!("Pages:     {pages}");
    }
    println!("Added:     {}", publication.created_at.format("%Y-%m-%d %H:%M"));

    if !publication.authors.is_empty() {
        println!("\nAuthors:");
        for author in &publication.authors {
            println!("  - {} {}", author.id.unwrap_or_default(), author.full_name());
        }
    }
    Ok(())
}

pub fn delete(db_path: &Path, id: i64, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let session = db.session();
    PublicationRepository::new(&session).delete_by_id(id)?;
    session.save_changes()?;

    if json {
        return print_json(&serde_json::json!({ "deleted": id }));
    }
    println!("Deleted publication {id}");
    Ok(())
}

fn load_with_authors(repo: &PublicationRepository<'_>, id: i64) -> Result<Publication> {
    let mut publication = repo
        .get_by_id(id)?
        .ok_or_else(|| Error::not_found("publication", id))?;
    repo.load(&mut publication, PublicationNav::Authors)?;
    Ok(publication)
}
