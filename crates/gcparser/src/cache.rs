use async_trait::async_trait;
use chrono::NaiveDate;
use gc_fetcher::Fetcher;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::Error;
use crate::ns;
use crate::parser::{ParseArgs, Parser};
use crate::record::{CacheDetails, CacheId, LogCount, Record, Trackable};
use crate::text::{clean_html, rot13, unescape};

lazy_static! {
    static ref ERROR_TEXT: Selector = Selector::parse("span#ErrorText").unwrap();
    static ref CACHE_NAME: Selector = Selector::parse("span#CacheName").unwrap();
    static ref DATE_HIDDEN: Selector = Selector::parse("span#DateHidden").unwrap();
    static ref CACHE_OWNER: Selector = Selector::parse("span#CacheOwner").unwrap();
    static ref OWNER_LINK: Selector = Selector::parse(r#"a[href*="profile/"]"#).unwrap();
    static ref CONTAINER: Selector =
        Selector::parse(r#"img[src*="/icons/container/"]"#).unwrap();
    static ref DIFFICULTY: Selector = Selector::parse("span#Difficulty img[alt]").unwrap();
    static ref TERRAIN: Selector = Selector::parse("span#Terrain img[alt]").unwrap();
    static ref LAT_LON: Selector = Selector::parse("span#LatLon").unwrap();
    static ref LOCATION: Selector = Selector::parse("span#Location").unwrap();
    static ref HINTS: Selector = Selector::parse("span#Hints").unwrap();
    static ref TRACKABLE: Selector =
        Selector::parse(r#"a[href*="track/details.aspx?guid="]"#).unwrap();
    static ref FIND_COUNT: Selector = Selector::parse("span#lblFindCounts img[alt]").unwrap();
    static ref WAYPOINT_RE: Regex = Regex::new(r"GC[A-Z0-9]+").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"(\d+)/(\d+)/(\d+)").unwrap();
    static ref OWNER_HREF_RE: Regex =
        Regex::new(r"guid=([a-z0-9-]+)&(?:amp;)?wid=([a-z0-9-]+)").unwrap();
    static ref STARS_RE: Regex = Regex::new(r"([0-9.]+) out of 5").unwrap();
    static ref LAT_LON_RE: Regex =
        Regex::new(r"([NS]) (\d+)° ([0-9.]+) ([WE]) (\d+)° ([0-9.]+)").unwrap();
    static ref LOCATION_RE: Regex = Regex::new(r"^In (?:([^,]+), )?(.+)$").unwrap();
    static ref GUID_RE: Regex = Regex::new(r"guid=([a-z0-9-]+)").unwrap();
    static ref ATTRIBUTES_RE: Regex =
        Regex::new(r"(?is)<b>Attributes</b>\s*<br\s*/?>\s*<table.*?</table>([^<]+)").unwrap();
    static ref INVENTORY_RE: Regex = Regex::new(
        r#"(?is)<img[^>]*src=['"][^'"]*tb_coin\.gif['"][^>]*>[^<]*<b>Inventory</b>.*?<table[^>]*>(.*?)(?:<tr>[^<]*<td[^>]*>[^<]*<a[^>]*>See the history</a>|</table>)"#
    )
    .unwrap();
    static ref SHORT_DESC_RE: Regex =
        Regex::new(r#"(?i)<span\s+id=['"]ShortDescription['"][^>]*>"#).unwrap();
    static ref LONG_DESC_RE: Regex =
        Regex::new(r#"(?i)<span\s+id=['"]LongDescription['"][^>]*>"#).unwrap();
    static ref SPAN_TAG_RE: Regex = Regex::new(r"(?i)<(/?)span\b[^>]*>").unwrap();
    static ref BR_RE: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
}

/// Parses cache listing pages, by guid or by waypoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheParser;

#[async_trait]
impl Parser for CacheParser {
    async fn parse(&self, fetcher: &Fetcher, args: &ParseArgs) -> anyhow::Result<Record> {
        let id = match (args.get(ns::args::GUID), args.get(ns::args::WAYPOINT)) {
            (Some(guid), _) => CacheId::Guid(guid.to_string()),
            (None, Some(wp)) => CacheId::Waypoint(wp.to_string()),
            (None, None) => {
                log::error!("No guid or waypoint given - don't know what to parse.");
                return Err(Error::InvalidArgs(format!(
                    "requires {:?} or {:?}",
                    ns::args::GUID,
                    ns::args::WAYPOINT
                ))
                .into());
            }
        };
        let details = fetch_cache(fetcher, &id, args.flag(ns::args::LOGS)).await?;
        Ok(Record::Cache(details))
    }
}

pub fn cache_url(id: &CacheId, logs: bool) -> String {
    let logs = if logs { "y" } else { "" };
    format!("{}&{}&log={logs}", ns::urls::CACHE_DETAILS, id.query())
}

pub async fn fetch_cache(
    fetcher: &Fetcher,
    id: &CacheId,
    logs: bool,
) -> anyhow::Result<CacheDetails> {
    let page = fetcher.get_authenticated(&cache_url(id, logs)).await?;
    Ok(parse_cache_details(&page, id))
}

/// Extracts the listing details from a cache page.
///
/// Missing fields are left empty and logged, the page layout changes often.
pub fn parse_cache_details(page: &str, id: &CacheId) -> CacheDetails {
    let html = Html::parse_document(page);
    let mut details = CacheDetails::default();

    let error_text = html
        .select(&ERROR_TEXT)
        .next()
        .map(|e| e.text().collect::<String>().to_lowercase())
        .unwrap_or_default();

    if error_text.contains("viewable to subscribers only") {
        log::info!("Subscribers only cache: {id}.");
        match id {
            CacheId::Guid(guid) => details.guid = guid.clone(),
            CacheId::Waypoint(wp) => details.waypoint = wp.clone(),
        }
        if details.waypoint.is_empty() {
            if let Some(wp) = WAYPOINT_RE.find(page) {
                details.waypoint = wp.as_str().to_string();
            }
        }
        details.subscribers_only = true;
        return details;
    }

    if error_text.contains("has been archived") {
        details.archived = true;
        details.disabled = true;
    } else if error_text.contains("is temporarily unavailable") {
        details.disabled = true;
    }
    log::trace!("disabled = {}, archived = {}", details.disabled, details.archived);

    match WAYPOINT_RE.find(page) {
        Some(wp) => details.waypoint = wp.as_str().to_string(),
        None => log::error!("Waypoint not found."),
    }
    log::trace!("waypoint = {}", details.waypoint);

    match text_of(&html, &CACHE_NAME) {
        Some(name) => details.name = name,
        None => log::error!("Name not found."),
    }
    log::trace!("name = {}", details.name);

    details.hidden = text_of(&html, &DATE_HIDDEN).and_then(|d| parse_us_date(&d));
    if details.hidden.is_none() {
        log::error!("Hidden date not found.");
    }
    log::trace!("hidden = {:?}", details.hidden);

    parse_owner(&html, &mut details);

    match first_alt(&html, &CONTAINER) {
        Some(alt) => details.size = alt.trim_start_matches("Size:").trim().to_string(),
        None => log::error!("Size not found."),
    }
    log::trace!("size = {}", details.size);

    match first_alt(&html, &DIFFICULTY).and_then(|alt| parse_stars(&alt)) {
        Some(d) => details.difficulty = d,
        None => log::error!("Difficulty not found."),
    }
    match first_alt(&html, &TERRAIN).and_then(|alt| parse_stars(&alt)) {
        Some(t) => details.terrain = t,
        None => log::error!("Terrain not found."),
    }
    log::trace!("difficulty = {:.1}, terrain = {:.1}", details.difficulty, details.terrain);

    match text_of(&html, &LAT_LON).and_then(|c| parse_coordinates(&c)) {
        Some((lat, lon)) => {
            details.lat = lat;
            details.lon = lon;
        }
        None => log::error!("Lat, lon not found."),
    }
    log::trace!("lat = {:.5}, lon = {:.5}", details.lat, details.lon);

    match text_of(&html, &LOCATION).and_then(|l| parse_location(&l)) {
        Some((province, country)) => {
            details.province = province.unwrap_or_default();
            details.country = country;
        }
        None => log::error!("Country not found."),
    }
    log::trace!("province = {}, country = {}", details.province, details.country);

    if let Some(desc) = span_source(page, &SHORT_DESC_RE) {
        details.short_desc_html = desc.to_string();
        details.short_desc = clean_html(desc);
    }
    if let Some(desc) = span_source(page, &LONG_DESC_RE) {
        details.long_desc_html = desc.to_string();
        details.long_desc = clean_html(desc);
    }
    log::trace!("shortDesc = {}...", preview(&details.short_desc));
    log::trace!("longDesc = {}...", preview(&details.long_desc));

    if let Some(hint) = html.select(&HINTS).next() {
        let hint = BR_RE.replace_all(&hint.inner_html(), "\n").into_owned();
        details.hint = rot13(unescape(&hint).trim());
    }
    log::trace!("hint = {}...", preview(&details.hint));

    if let Some(caps) = ATTRIBUTES_RE.captures(page) {
        details.attributes = unescape(&caps[1]).trim().to_string();
    }
    log::trace!("attributes = {}", details.attributes);

    if let Some(caps) = INVENTORY_RE.captures(page) {
        details.inventory = parse_inventory(&caps[1]);
    }
    log::trace!("inventory = {:?}", details.inventory);

    details.visits = html.select(&FIND_COUNT).filter_map(log_count).collect();
    log::trace!("visits = {:?}", details.visits);

    details
}

fn parse_owner(html: &Html, details: &mut CacheDetails) {
    let Some(span) = html.select(&CACHE_OWNER).next() else {
        log::error!("Type, guid, owner, owner_id not found.");
        return;
    };

    details.cache_type = span
        .text()
        .next()
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    let link = span.select(&OWNER_LINK).next();
    let ids = link
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| OWNER_HREF_RE.captures(href));
    match (link, ids) {
        (Some(link), Some(ids)) => {
            details.owner_id = ids[1].to_string();
            details.guid = ids[2].to_string();
            details.owner = link.text().collect::<String>().trim().to_string();
        }
        _ => log::error!("Guid, owner, owner_id not found."),
    }
    log::trace!(
        "type = {}, guid = {}, owner = {}, owner_id = {}",
        details.cache_type,
        details.guid,
        details.owner,
        details.owner_id
    );
}

/// Source markup inside the span opened by `start`, nested spans included.
fn span_source<'a>(page: &'a str, start: &Regex) -> Option<&'a str> {
    let open = start.find(page)?;
    let mut depth = 1;
    for tag in SPAN_TAG_RE.captures_iter(&page[open.end()..]) {
        if tag[1].is_empty() {
            depth += 1;
        } else {
            depth -= 1;
        }
        if depth == 0 {
            let end = open.end() + tag.get(0)?.start();
            return Some(&page[open.end()..end]);
        }
    }
    log::warn!("Unclosed description span.");
    None
}

/// Reads the trackables of the inventory table rows, once per guid.
fn parse_inventory(rows: &str) -> Vec<Trackable> {
    let fragment = Html::parse_fragment(rows);
    let mut inventory: Vec<Trackable> = vec![];
    for link in fragment.select(&TRACKABLE) {
        let Some(caps) = link.value().attr("href").and_then(|h| GUID_RE.captures(h)) else {
            continue;
        };
        let guid = caps[1].to_string();
        let name = link.text().collect::<String>().trim().to_string();
        match inventory.iter_mut().find(|t| t.guid == guid) {
            Some(known) => known.name = name,
            None => inventory.push(Trackable { guid, name }),
        }
    }
    inventory
}

fn log_count(img: ElementRef) -> Option<LogCount> {
    let log_type = img.value().attr("alt")?.trim().to_string();
    let sibling = img.next_sibling()?;
    let text = sibling.value().as_text()?;
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let count = digits.parse().ok()?;
    Some(LogCount { log_type, count })
}

fn text_of(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn first_alt(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector)
        .next()
        .and_then(|e| e.value().attr("alt"))
        .map(str::to_string)
}

/// Parses the site's `month/day/year` dates.
pub fn parse_us_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    NaiveDate::from_ymd_opt(caps[3].parse().ok()?, caps[1].parse().ok()?, caps[2].parse().ok()?)
}

fn parse_stars(alt: &str) -> Option<f32> {
    STARS_RE.captures(alt)?[1].parse().ok()
}

/// Converts `N 50° 05.040 E 014° 26.040` to signed decimal degrees.
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let caps = LAT_LON_RE.captures(text)?;
    let mut lat = caps[2].parse::<f64>().ok()? + caps[3].parse::<f64>().ok()? / 60.0;
    if &caps[1] == "S" {
        lat = -lat;
    }
    let mut lon = caps[5].parse::<f64>().ok()? + caps[6].parse::<f64>().ok()? / 60.0;
    if &caps[4] == "W" {
        lon = -lon;
    }
    Some((lat, lon))
}

fn parse_location(text: &str) -> Option<(Option<String>, String)> {
    let caps = LOCATION_RE.captures(text)?;
    let province = caps.get(1).map(|p| p.as_str().trim().to_string());
    Some((province, caps[2].trim().to_string()))
}

fn preview(text: &str) -> String {
    text.replace('\n', " ").chars().take(50).collect()
}
