use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use serde::Serialize;

use crate::error::Result;
use crate::models::PublicationDto;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[derive(Serialize)]
#[serde(rename = "ArrayOfPublication")]
struct PublicationArray<'a> {
    #[serde(rename = "Publication")]
    items: &'a [PublicationDto],
}

/// Render publications as an `ArrayOfPublication` XML document.
pub fn publications_to_xml(publications: &[PublicationDto]) -> Result<String> {
    let body = quick_xml::se::to_string(&PublicationArray {
        items: publications,
    })?;
    Ok(format!("{XML_DECLARATION}\n{body}"))
}

/// File name offered for a full dump taken at `at`, in `at`'s own offset.
pub fn dump_file_name<Tz: TimeZone>(at: DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("DumpAll_{}.xml", at.format("%Y%m%d%H%M%S"))
}
