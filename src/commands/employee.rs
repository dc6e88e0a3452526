use std::path::Path;

use pubtrack::Result;
use pubtrack::models::{EmployeeDto, NewEmployee};
use pubtrack::repo::{EmployeeRepository, Order, Query};

use super::{open_db, print_employees, print_json};

pub fn add(
    db_path: &Path,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
    position: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut employee = NewEmployee {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.map(String::from),
        position: position.map(String::from),
    }
    .into_entity()?;

    let db = open_db(db_path)?;
    let session = db.session();
    EmployeeRepository::new(&session).insert(&employee);
    employee.id = session.save_changes()?.inserted_ids.first().copied();

    let dto = EmployeeDto::from(&employee);
    if json {
        return print_json(&dto);
    }
    println!("Added employee {}: {}", dto.id, employee.full_name());
    Ok(())
}

pub fn list(db_path: &Path, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let session = db.session();
    let employees = EmployeeRepository::new(&session).get(
        &Query::new()
            .order_by(Order::asc("last_name"))
            .order_by(Order::asc("first_name")),
    )?;
    let dtos: Vec<EmployeeDto> = employees.iter().map(EmployeeDto::from).collect();
    print_employees(&dtos, json)
}
