use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The two identifier schemes the site uses for a cache listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheId {
    Guid(String),
    Waypoint(String),
}

impl CacheId {
    pub fn query(&self) -> String {
        match self {
            Self::Guid(guid) => format!("guid={guid}"),
            Self::Waypoint(wp) => format!("wp={wp}"),
        }
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guid(guid) => write!(f, "guid {guid}"),
            Self::Waypoint(wp) => write!(f, "waypoint {wp}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDetails {
    pub guid: String,
    pub waypoint: String,
    pub name: String,
    pub cache_type: String,
    pub owner: String,
    pub owner_id: String,
    pub size: String,
    pub difficulty: f32,
    pub terrain: f32,
    pub lat: f64,
    pub lon: f64,
    pub province: String,
    pub country: String,
    pub hidden: Option<NaiveDate>,
    pub short_desc_html: String,
    pub short_desc: String,
    pub long_desc_html: String,
    pub long_desc: String,
    pub hint: String,
    pub attributes: String,
    pub inventory: Vec<Trackable>,
    pub visits: Vec<LogCount>,
    pub disabled: bool,
    pub archived: bool,
    /// Listing restricted to premium members, only identifiers are known.
    pub subscribers_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trackable {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCount {
    pub log_type: String,
    pub count: u32,
}

/// One "Found it", "Attended" or "Webcam Photo Taken" entry of the user's logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundLog {
    /// Find number, the most recent find has the highest one.
    pub sequence: usize,
    pub date: Option<NaiveDate>,
    pub guid: String,
    pub name: String,
    pub disabled: bool,
    pub archived: bool,
    pub log_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyFinds {
    pub count: usize,
    pub logs: Vec<FoundLog>,
}

/// What a parser hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Record {
    Cache(CacheDetails),
    Finds(MyFinds),
    ProfileSaved,
    Custom(serde_json::Value),
}
