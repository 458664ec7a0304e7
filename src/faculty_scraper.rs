use log::warn;
use regex::Regex;
use scraper::{Html, Selector};

use crate::errors::Result;
use crate::scraping_context::ScrapingContext;
use crate::text_manipulators::{extract_entity_id, extract_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faculty {
    pub id: String,
    pub name: String,
}

#[derive(Debug)]
pub struct FacultyScraper;

impl FacultyScraper {
    /// The bare GET on the endpoint is the faculties page.
    pub async fn scrape(&self, ctx: &ScrapingContext) -> Result<Vec<Faculty>> {
        let response = ctx.dispatcher.send_request("GET", None).await?;
        let html = response.text()?;
        Ok(parse_faculties(&html))
    }
}

fn parse_faculties(html: &str) -> Vec<Faculty> {
    let document = Html::parse_document(html);
    // Faculties have class 'fc'
    let faculty_selector = Selector::parse(".fc").unwrap();
    let digits = Regex::new(r"\d+").unwrap();

    let mut faculties = vec![];
    for node in document.select(&faculty_selector) {
        let name = extract_text(node).trim().to_string();
        let Some(id) = extract_entity_id(node, &digits) else {
            warn!("skipping faculty tag without an id (name: {name:?})");
            continue;
        };
        if name.is_empty() {
            warn!("skipping faculty {id} with an empty name");
            continue;
        }
        faculties.push(Faculty { id, name });
    }
    faculties
}
