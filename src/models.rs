use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::coerce;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityRecord {
    #[serde(deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(deserialize_with = "coerce::time")]
    pub from: NaiveTime,
    #[serde(deserialize_with = "coerce::time")]
    pub to: NaiveTime,
    #[serde(default, deserialize_with = "coerce::optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::dates")]
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionCourse {
    #[serde(default)]
    pub course: Option<Course>,
    #[serde(default)]
    pub section: Option<Section>,
    #[serde(default)]
    pub classroom: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassScheduleRecord {
    #[serde(deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(deserialize_with = "coerce::time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "coerce::time")]
    pub end_time: NaiveTime,
    #[serde(default, deserialize_with = "coerce::optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::dates")]
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub section_course: Option<SectionCourse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Unavailability,
    Class,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Unavailability => "unavailability",
            EventKind::Class => "class",
        }
    }
}

/// Wall-clock bounds of a template, independent of any date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl TimeRange {
    pub fn new(from: NaiveTime, to: NaiveTime) -> Self {
        Self { from, to }
    }

    pub fn is_overnight(&self) -> bool {
        self.to < self.from
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    pub id: String,
    pub kind: EventKind,
    pub title: String,
    pub time_range: TimeRange,
    pub occurrence_dates: Vec<NaiveDate>,
    pub color: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub template_id: String,
    pub kind: EventKind,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdCollision {
    pub id: String,
    pub kept: EventKind,
    pub dropped: EventKind,
}
