use async_trait::async_trait;
use gc_fetcher::Fetcher;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::cache::parse_us_date;
use crate::ns;
use crate::parser::{ParseArgs, Parser};
use crate::record::{FoundLog, MyFinds, Record};

lazy_static! {
    static ref ROW: Selector = Selector::parse("tr").unwrap();
    static ref NESTED_TABLE: Selector = Selector::parse("table").unwrap();
    static ref CELL: Selector = Selector::parse("td").unwrap();
    static ref ICON: Selector = Selector::parse("td img[alt]").unwrap();
    static ref CACHE_LINK: Selector =
        Selector::parse(r#"a[href*="cache_details.aspx?guid="]"#).unwrap();
    static ref LOG_LINK: Selector = Selector::parse(r#"a[href*="log.aspx?LUID="]"#).unwrap();
    static ref STRIKE: Selector = Selector::parse("strike").unwrap();
    static ref RED: Selector = Selector::parse(r#"font[color="red"]"#).unwrap();
    static ref FIND_TYPE_RE: Regex =
        Regex::new(r"(?i)^\s*(Found it|Webcam Photo Taken|Attended)\s*$").unwrap();
    static ref DATE_CELL_RE: Regex = Regex::new(r"^\s*\d+/\d+/\d+\s*$").unwrap();
    static ref GUID_RE: Regex = Regex::new(r"guid=([a-z0-9-]+)").unwrap();
    static ref LUID_RE: Regex = Regex::new(r"LUID=([a-z0-9-]+)").unwrap();
}

/// Parses "My Profile > My Logs", keeping logs that count as a find.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyFindsParser;

#[async_trait]
impl Parser for MyFindsParser {
    async fn parse(&self, fetcher: &Fetcher, _args: &ParseArgs) -> anyhow::Result<Record> {
        Ok(Record::Finds(fetch_my_finds(fetcher).await?))
    }
}

pub async fn fetch_my_finds(fetcher: &Fetcher) -> anyhow::Result<MyFinds> {
    let page = fetcher.get_authenticated(ns::urls::MY_LOGS).await?;
    Ok(parse_my_finds(&page))
}

pub fn parse_my_finds(page: &str) -> MyFinds {
    let html = Html::parse_document(page);

    let rows: Vec<ElementRef> = html
        .select(&ROW)
        .filter(|row| row.select(&NESTED_TABLE).next().is_none())
        .filter(|row| is_find_row(*row))
        .collect();
    let count = rows.len();

    let mut logs = Vec::with_capacity(count);
    for (index, row) in rows.into_iter().enumerate() {
        let sequence = count - index;
        log::debug!("NEW cache record");
        log::trace!("sequence = {sequence}");

        let Some(log_id) = row
            .select(&LOG_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| LUID_RE.captures(href))
            .map(|caps| caps[1].to_string())
        else {
            log::warn!("Find #{sequence} has no log link, skipping.");
            continue;
        };

        let date = row
            .select(&CELL)
            .map(|td| td.text().collect::<String>())
            .find(|text| DATE_CELL_RE.is_match(text))
            .and_then(|text| parse_us_date(&text));

        let mut found = FoundLog {
            sequence,
            date,
            log_id,
            ..Default::default()
        };

        if let Some(link) = row.select(&CACHE_LINK).next() {
            if let Some(caps) = link.value().attr("href").and_then(|h| GUID_RE.captures(h)) {
                found.guid = caps[1].to_string();
            }
            found.name = link.text().collect::<String>().trim().to_string();
            found.disabled = link.select(&STRIKE).next().is_some();
            found.archived = link.select(&RED).next().is_some();
        }
        log::trace!(
            "date = {:?}, guid = {}, name = {}, disabled = {}, archived = {}, log = {}",
            found.date,
            found.guid,
            found.name,
            found.disabled,
            found.archived,
            found.log_id
        );
        log::debug!("END of cache record '{}'", found.name);

        logs.push(found);
    }

    MyFinds { count, logs }
}

fn is_find_row(row: ElementRef) -> bool {
    row.select(&ICON).any(|img| {
        img.value()
            .attr("alt")
            .map(|alt| FIND_TYPE_RE.is_match(alt))
            .unwrap_or(false)
    })
}
