use log::warn;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;

use crate::errors::Result;
use crate::scraping_context::ScrapingContext;
use crate::text_manipulators::{extract_entity_id, extract_text};

/// A group is only meaningful under the faculty it was listed for; the site
/// does not promise globally unique group ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

#[derive(Debug)]
pub struct GroupScraper {
    pub faculty_id: String,
}

impl GroupScraper {
    pub async fn scrape(&self, ctx: &ScrapingContext) -> Result<Vec<Group>> {
        let data = HashMap::from([("facultyid".to_string(), self.faculty_id.clone())]);
        let response = ctx.dispatcher.send_request("POST", Some(&data)).await?;
        let html = response.text()?;
        Ok(parse_groups(&html))
    }
}

fn parse_groups(html: &str) -> Vec<Group> {
    let document = Html::parse_document(html);
    // Groups have class 'grp'
    let group_selector = Selector::parse(".grp").unwrap();
    let digits = Regex::new(r"\d+").unwrap();

    let mut groups = vec![];
    for node in document.select(&group_selector) {
        let name = extract_text(node).trim().to_string();
        let Some(id) = extract_entity_id(node, &digits) else {
            warn!("skipping group tag without an id (name: {name:?})");
            continue;
        };
        if name.is_empty() {
            warn!("skipping group {id} with an empty name");
            continue;
        }
        groups.push(Group { id, name });
    }
    groups
}
