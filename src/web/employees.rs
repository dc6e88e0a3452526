use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use super::AppState;
use super::errors::AppError;
use crate::models::{EmployeeDto, NewEmployee};
use crate::repo::{EmployeeRepository, Order, Query};

/// GET /api/employees
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<EmployeeDto>>, AppError> {
    let db = state.db()?;
    let session = db.session();
    let employees = EmployeeRepository::new(&session).get(
        &Query::new()
            .order_by(Order::asc("last_name"))
            .order_by(Order::asc("first_name")),
    )?;
    Ok(Json(employees.iter().map(EmployeeDto::from).collect()))
}

/// GET /api/employees/{employee_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
) -> Result<Json<EmployeeDto>, AppError> {
    let db = state.db()?;
    let session = db.session();
    let employee = EmployeeRepository::new(&session)
        .get_by_id(employee_id)?
        .ok_or_else(|| AppError::NotFound(format!("Not found employee with id:{employee_id}")))?;
    Ok(Json(EmployeeDto::from(&employee)))
}

/// POST /api/employees
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewEmployee>,
) -> Result<(StatusCode, Json<EmployeeDto>), AppError> {
    let mut employee = body.into_entity()?;

    let db = state.db()?;
    let session = db.session();
    EmployeeRepository::new(&session).insert(&employee);
    let saved = session.save_changes()?;
    employee.id = saved.inserted_ids.first().copied();
    info!(employee_id = employee.id, "created employee");
    Ok((StatusCode::CREATED, Json(EmployeeDto::from(&employee))))
}

/// DELETE /api/employees/{employee_id}
pub async fn delete(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db()?;
    let session = db.session();
    EmployeeRepository::new(&session).delete_by_id(employee_id)?;
    session.save_changes()?;
    info!(employee_id, "deleted employee");
    Ok(StatusCode::NO_CONTENT)
}
