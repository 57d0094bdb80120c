use chrono::NaiveDate;
use gcparser::{parse_cache_details, parse_my_finds, CacheId, LogCount, Trackable};

const CACHE_DETAILS: &str = include_str!("fixtures/cache_details.html");
const SUBSCRIBERS_ONLY: &str = include_str!("fixtures/subscribers_only.html");
const ARCHIVED: &str = include_str!("fixtures/archived.html");
const MY_LOGS: &str = include_str!("fixtures/my_logs.html");
const NO_FINDS: &str = include_str!("fixtures/no_finds.html");
const INVENTORY_LINKS: &str = include_str!("fixtures/inventory_links.html");

#[test]
fn cache_details_listing() {
    let id = CacheId::Guid("f83032d7-d60f-4f0d-bb1b-670287824e33".into());
    let cache = parse_cache_details(CACHE_DETAILS, &id);

    assert_eq!(cache.waypoint, "GC1A2B3");
    assert_eq!(cache.name, "Pardubice & okoli");
    assert_eq!(cache.guid, "f83032d7-d60f-4f0d-bb1b-670287824e33");
    assert_eq!(cache.cache_type, "Traditional Cache");
    assert_eq!(cache.owner, "Petr M");
    assert_eq!(cache.owner_id, "0a1b2c3d-owner");
    assert_eq!(cache.size, "Regular");
    assert_eq!(cache.difficulty, 1.5);
    assert_eq!(cache.terrain, 2.0);
    assert_eq!(cache.hidden, NaiveDate::from_ymd_opt(2009, 9, 2));
    assert!((cache.lat - 50.03805).abs() < 1e-9);
    assert!((cache.lon - (15.0 + 46.767 / 60.0)).abs() < 1e-9);
    assert_eq!(cache.province, "Pardubicky kraj");
    assert_eq!(cache.country, "Czech Republic");

    assert!(cache.disabled);
    assert!(!cache.archived);
    assert!(!cache.subscribers_only);
}

#[test]
fn cache_details_texts() {
    let id = CacheId::Waypoint("GC1A2B3".into());
    let cache = parse_cache_details(CACHE_DETAILS, &id);

    assert_eq!(cache.short_desc_html, "Short <b>intro</b>");
    assert_eq!(cache.short_desc, "Short intro");
    assert_eq!(cache.long_desc, "** Go to the park.\n- Bring a pen");
    assert_eq!(cache.hint, "Under a \nstone");
    assert_eq!(cache.attributes, "dogs allowed, kid friendly");
}

#[test]
fn cache_details_inventory_and_visits() {
    let id = CacheId::Waypoint("GC1A2B3".into());
    let cache = parse_cache_details(CACHE_DETAILS, &id);

    assert_eq!(
        cache.inventory,
        vec![
            Trackable {
                guid: "aaaa-1111".into(),
                name: "Blue Frog".into()
            },
            Trackable {
                guid: "bbbb-2222".into(),
                name: "Geocoin \"CZ\"".into()
            },
        ]
    );
    assert_eq!(
        cache.visits,
        vec![
            LogCount {
                log_type: "Found it".into(),
                count: 12
            },
            LogCount {
                log_type: "Didn't find it".into(),
                count: 3
            },
        ]
    );
}

#[test]
fn inventory_reads_only_the_inventory_table() {
    let cache = parse_cache_details(INVENTORY_LINKS, &CacheId::Waypoint("GC4INV1".into()));
    assert_eq!(
        cache.inventory,
        vec![Trackable {
            guid: "aaaa-1111".into(),
            name: "Blue Frog (retrieved)".into()
        }]
    );
}

#[test]
fn descriptions_keep_source_markup() {
    let cache = parse_cache_details(INVENTORY_LINKS, &CacheId::Waypoint("GC4INV1".into()));
    assert_eq!(
        cache.short_desc_html,
        "Line one<BR>line <span class=note>two</span>"
    );
    assert_eq!(cache.short_desc, "Line one\nline two");
    assert!(cache.long_desc_html.contains("guid=dead-beef"));
}

#[test]
fn subscribers_only_listing_keeps_identifiers() {
    let cache = parse_cache_details(SUBSCRIBERS_ONLY, &CacheId::Guid("abc-123".into()));
    assert!(cache.subscribers_only);
    assert_eq!(cache.guid, "abc-123");
    assert_eq!(cache.waypoint, "GC2XYZ9");
    assert!(cache.name.is_empty());

    let cache = parse_cache_details(SUBSCRIBERS_ONLY, &CacheId::Waypoint("GC77".into()));
    assert_eq!(cache.waypoint, "GC77");
    assert!(cache.guid.is_empty());
}

#[test]
fn archived_listing_is_also_disabled() {
    let cache = parse_cache_details(ARCHIVED, &CacheId::Guid("old".into()));
    assert!(cache.archived);
    assert!(cache.disabled);
    assert_eq!(cache.name, "Old Mill");
    assert_eq!(cache.hidden, NaiveDate::from_ymd_opt(2003, 12, 31));

    // Missing fields keep their defaults
    assert_eq!(cache.waypoint, "");
    assert_eq!(cache.lat, 0.0);
    assert!(cache.inventory.is_empty());
}

#[test]
fn my_finds_counts_find_logs_only() {
    let finds = parse_my_finds(MY_LOGS);
    assert_eq!(finds.count, 3);
    assert_eq!(finds.logs.len(), 2);

    let first = &finds.logs[0];
    assert_eq!(first.sequence, 3);
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2009, 9, 2));
    assert_eq!(first.guid, "f83032d7-d60f-4f0d-bb1b-670287824e33");
    assert_eq!(first.name, "Pardubice-mesto sportu c.8");
    assert_eq!(first.log_id, "f315d6e1-127f-4173-860c-8aebda55521f");
    assert!(!first.disabled);
    assert!(!first.archived);

    let event = &finds.logs[1];
    assert_eq!(event.sequence, 2);
    assert_eq!(event.date, NaiveDate::from_ymd_opt(2009, 8, 15));
    assert_eq!(event.name, "Summer event");
    assert_eq!(event.log_id, "bbbb-2222");
    assert!(event.disabled);
    assert!(event.archived);
}

#[test]
fn my_finds_without_results() {
    let finds = parse_my_finds(NO_FINDS);
    assert_eq!(finds.count, 0);
    assert!(finds.logs.is_empty());
}
