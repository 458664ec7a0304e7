use chrono::NaiveDate;
use log::warn;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use crate::errors::{Result, ScraperError};
use crate::scraping_context::ScrapingContext;
use crate::text_manipulators::extract_text;

const DATE_FORMAT: &str = "%d.%m.%Y";

/// A short label paired with its spelled-out form. The site abbreviates
/// teacher and subject names in the grid and keeps the full version in the
/// `title` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    pub full: String,
    pub short: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub date: NaiveDate,
    pub teacher: Names,
    pub subject: Names,
    /// Room / card / meeting info, free text.
    pub info: String,
}

/// One numbered time slot of a day. Present even when nothing is scheduled,
/// with an empty lesson list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub number: u32,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDay {
    pub day: String,
    pub pairs: Vec<Pair>,
}

/// A week of pairs, day order as published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub days: Vec<ScheduleDay>,
}

impl Schedule {
    pub fn day(&self, name: &str) -> Option<&ScheduleDay> {
        self.days.iter().find(|day| day.day == name)
    }
}

#[derive(Debug)]
pub struct ScheduleScraper {
    pub group_id: String,
    /// `false` fetches the current week, `true` the whole term.
    pub full_term: bool,
}

impl ScheduleScraper {
    pub async fn scrape(&self, ctx: &ScrapingContext) -> Result<Schedule> {
        let mut data = HashMap::from([("groupid".to_string(), self.group_id.clone())]);
        if self.full_term {
            data.insert("show_all".to_string(), "1".to_string());
        }
        let response = ctx.dispatcher.send_request("POST", Some(&data)).await?;
        let html = response.text()?;
        parse_schedule(&html)
    }
}

struct GridSelectors {
    row: Selector,
    header: Selector,
    cell: Selector,
    lesson: Selector,
    date: Selector,
    teacher: Selector,
    subject: Selector,
    info: Selector,
}

impl GridSelectors {
    fn new() -> Self {
        Self {
            row: Selector::parse("tr").unwrap(),
            header: Selector::parse("th").unwrap(),
            cell: Selector::parse("td").unwrap(),
            lesson: Selector::parse(".lesson").unwrap(),
            date: Selector::parse(".lesson-date").unwrap(),
            teacher: Selector::parse(".teacher").unwrap(),
            subject: Selector::parse(".subject").unwrap(),
            info: Selector::parse(".info").unwrap(),
        }
    }
}

fn parse_schedule(html: &str) -> Result<Schedule> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse(".table").unwrap();
    let Some(table) = document.select(&table_selector).next() else {
        return Err(ScraperError::MissingScheduleTable);
    };

    let selectors = GridSelectors::new();
    let mut rows = table.select(&selectors.row);

    // First row names the days; the empty corner cell above the pair-number
    // column is dropped by the emptiness filter.
    let Some(header) = rows.next() else {
        return Ok(Schedule { days: vec![] });
    };
    let mut days: Vec<ScheduleDay> = header
        .select(&selectors.header)
        .map(|cell| extract_text(cell).trim().to_string())
        .filter(|name| !name.is_empty())
        .map(|day| ScheduleDay { day, pairs: vec![] })
        .collect();

    // Each remaining row is one pair: number first, then one cell per day in
    // header order. A missing or empty cell still yields a Pair, just with
    // no lessons.
    for (row_no, row) in rows.enumerate() {
        let cells: Vec<ElementRef> = row.select(&selectors.cell).collect();
        if cells.is_empty() {
            continue;
        }
        let number = extract_text(cells[0])
            .trim()
            .parse()
            .unwrap_or(row_no as u32 + 1);
        for (day_index, day) in days.iter_mut().enumerate() {
            let lessons = cells
                .get(day_index + 1)
                .map(|cell| parse_lessons(*cell, &selectors))
                .unwrap_or_default();
            day.pairs.push(Pair { number, lessons });
        }
    }

    Ok(Schedule { days })
}

fn parse_lessons(cell: ElementRef, selectors: &GridSelectors) -> Vec<Lesson> {
    cell.select(&selectors.lesson)
        .filter_map(|node| parse_lesson(node, selectors))
        .collect()
}

/// One lesson block. Anything without a parseable date, teacher, and subject
/// is dropped with a warning so a single broken block cannot take the rest
/// of the grid down with it.
fn parse_lesson(node: ElementRef, selectors: &GridSelectors) -> Option<Lesson> {
    let date_text = node
        .select(&selectors.date)
        .next()
        .map(|el| extract_text(el).trim().to_string())?;
    let date = match NaiveDate::parse_from_str(&date_text, DATE_FORMAT) {
        Ok(date) => date,
        Err(err) => {
            warn!("skipping lesson with unparseable date {date_text:?}: {err}");
            return None;
        }
    };

    let Some(teacher) = node.select(&selectors.teacher).next().map(names_of) else {
        warn!("skipping lesson on {date_text} without a teacher tag");
        return None;
    };
    let Some(subject) = node.select(&selectors.subject).next().map(names_of) else {
        warn!("skipping lesson on {date_text} without a subject tag");
        return None;
    };
    let info = node
        .select(&selectors.info)
        .next()
        .map(|el| extract_text(el).trim().to_string())
        .unwrap_or_default();

    Some(Lesson {
        date,
        teacher,
        subject,
        info,
    })
}

fn names_of(node: ElementRef) -> Names {
    let short = extract_text(node).trim().to_string();
    let full = node
        .value()
        .attr("title")
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| short.clone());
    Names { full, short }
}
