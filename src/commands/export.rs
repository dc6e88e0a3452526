use std::path::Path;

use pubtrack::Result;
use pubtrack::export::publications_to_xml;
use pubtrack::models::PublicationDto;
use pubtrack::repo::{PublicationNav, PublicationRepository, Query};

use super::open_db;

pub fn run(db_path: &Path, out: Option<&Path>) -> Result<()> {
    let db = open_db(db_path)?;
    let session = db.session();
    let publications =
        PublicationRepository::new(&session).get(&Query::new().include(PublicationNav::Authors))?;
    let dtos: Vec<PublicationDto> = publications.iter().map(PublicationDto::from).collect();
    let xml = publications_to_xml(&dtos)?;

    match out {
        Some(path) => {
            std::fs::write(path, xml)?;
            eprintln!("Exported {} publications to {}", dtos.len(), path.display());
        }
        None => println!("{xml}"),
    }
    Ok(())
}
