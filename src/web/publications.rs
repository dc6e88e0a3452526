use axum::Json;
use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Local;
use serde::Deserialize;
use tracing::info;

use super::AppState;
use super::errors::AppError;
use crate::export;
use crate::models::{NewPublication, Publication, PublicationDto, PublicationKind};
use crate::repo::{
    EmployeeNav, EmployeeRepository, Filter, Order, PublicationNav, PublicationRepository, Query,
    Session,
};

fn to_dtos(publications: &[Publication]) -> Vec<PublicationDto> {
    publications.iter().map(PublicationDto::from).collect()
}

fn all_with_authors(session: &Session<'_>) -> Result<Vec<Publication>, AppError> {
    let repo = PublicationRepository::new(session);
    Ok(repo.get(&Query::new().include(PublicationNav::Authors))?)
}

fn find_with_authors(session: &Session<'_>, id: i64) -> Result<Publication, AppError> {
    let repo = PublicationRepository::new(session);
    let mut publication = repo
        .get_by_id(id)?
        .ok_or_else(|| AppError::NotFound(format!("publication not found: {id}")))?;
    repo.load(&mut publication, PublicationNav::Authors)?;
    Ok(publication)
}

/// GET /api/publications/all
pub async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<PublicationDto>>, AppError> {
    let db = state.db()?;
    let session = db.session();
    Ok(Json(to_dtos(&all_with_authors(&session)?)))
}

/// GET /api/publications/all/{publication_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(publication_id): Path<i64>,
) -> Result<Json<PublicationDto>, AppError> {
    let db = state.db()?;
    let session = db.session();
    let publication = find_with_authors(&session, publication_id)?;
    Ok(Json(PublicationDto::from(&publication)))
}

/// GET /api/employees/{employee_id}/publications
pub async fn of_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
) -> Result<Json<Vec<PublicationDto>>, AppError> {
    let db = state.db()?;
    let session = db.session();
    let employees = EmployeeRepository::new(&session);
    let mut employee = employees
        .get_by_id(employee_id)?
        .ok_or_else(|| AppError::NotFound(format!("Not found employee with id:{employee_id}")))?;
    employees.load(&mut employee, EmployeeNav::Publications)?;
    PublicationRepository::new(&session)
        .load_all(&mut employee.publications, PublicationNav::Authors)?;
    Ok(Json(to_dtos(&employee.publications)))
}

/// GET /GetAllAsXml
pub async fn export_xml(State(state): State<AppState>) -> Result<Response, AppError> {
    let db = state.db()?;
    let session = db.session();
    let xml = export::publications_to_xml(&to_dtos(&all_with_authors(&session)?))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::dump_file_name(Local::now())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/xml".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        xml,
    )
        .into_response())
}

/// DELETE /api/publications/{publication_id}
pub async fn delete(
    State(state): State<AppState>,
    Path(publication_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db()?;
    let session = db.session();
    PublicationRepository::new(&session).delete_by_id(publication_id)?;
    session.save_changes()?;
    info!(publication_id, "deleted publication");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub kind: Option<String>,
    pub year: Option<i32>,
    /// Comma-separated sort keys; a leading `-` sorts descending.
    pub sort: Option<String>,
}

/// GET /api/publications?kind=&year=&sort=
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<PublicationDto>>, AppError> {
    let kind = params
        .kind
        .as_deref()
        .map(str::parse::<PublicationKind>)
        .transpose()
        .map_err(AppError::Validation)?;

    let mut query = Query::new().include(PublicationNav::Authors);
    if let Some(year) = params.year {
        query = query.filter(Filter::eq("year", year));
    }
    for key in params.sort.iter().flat_map(|s| s.split(',')) {
        let key = key.trim();
        if !key.is_empty() {
            query = query.order_by(Order::parse(key));
        }
    }

    let db = state.db()?;
    let session = db.session();
    let repo = PublicationRepository::new(&session);
    let publications = match kind {
        Some(kind) => repo.get_of_type(kind, &query)?,
        None => repo.get(&query)?,
    };
    Ok(Json(to_dtos(&publications)))
}

/// POST /api/publications
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewPublication>,
) -> Result<(StatusCode, Json<PublicationDto>), AppError> {
    let publication = body.into_entity()?;

    let db = state.db()?;
    let session = db.session();
    PublicationRepository::new(&session).insert(&publication);
    let saved = session.save_changes()?;
    let id = saved
        .inserted_ids
        .first()
        .copied()
        .ok_or_else(|| AppError::Internal("insert returned no id".to_string()))?;
    info!(publication_id = id, "created publication");

    let created = find_with_authors(&session, id)?;
    Ok((StatusCode::CREATED, Json(PublicationDto::from(&created))))
}

/// PUT /api/publications/{publication_id}
pub async fn update(
    State(state): State<AppState>,
    Path(publication_id): Path<i64>,
    Json(body): Json<NewPublication>,
) -> Result<Json<PublicationDto>, AppError> {
    let db = state.db()?;
    let session = db.session();
    let repo = PublicationRepository::new(&session);
    let mut publication = repo
        .get_by_id(publication_id)?
        .ok_or_else(|| AppError::NotFound(format!("publication not found: {publication_id}")))?;
    body.apply_to(&mut publication)?;
    repo.update(&publication)?;
    session.save_changes()?;

    let updated = find_with_authors(&session, publication_id)?;
    Ok(Json(PublicationDto::from(&updated)))
}
