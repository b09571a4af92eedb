use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use serde::Serialize;

use crate::models::{
    ClassScheduleRecord, EventTemplate, IdCollision, Occurrence, UnavailabilityRecord,
};
use crate::normalize::normalize_records;

/// How to place the end of a range whose `to` is earlier than its `from`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OvernightPolicy {
    /// End lands on the following calendar day.
    #[default]
    NextDay,
    /// End stays on the occurrence date, so it precedes the start.
    SameDay,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Deduplicated {
    pub templates: Vec<EventTemplate>,
    pub collisions: Vec<IdCollision>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Schedule {
    pub templates: Vec<EventTemplate>,
    pub occurrences: Vec<Occurrence>,
    pub collisions: Vec<IdCollision>,
}

impl Schedule {
    /// Fails listing every id that two event kinds share.
    pub fn ensure_no_collisions(&self) -> anyhow::Result<()> {
        if self.collisions.is_empty() {
            return Ok(());
        }
        let ids: Vec<&str> = self.collisions.iter().map(|c| c.id.as_str()).collect();
        anyhow::bail!("conflicting schedule ids: {}", ids.join(", "))
    }
}

/// One template per id. A later template replaces an earlier one but keeps
/// the slot where the id was first seen. Replacements across event kinds are
/// reported in `collisions`.
pub fn deduplicate(templates: Vec<EventTemplate>) -> Deduplicated {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<EventTemplate> = Vec::with_capacity(templates.len());
    let mut collisions = Vec::new();

    for template in templates {
        match slots.get(&template.id) {
            Some(&slot) => {
                let previous = &unique[slot];
                if previous.kind != template.kind {
                    collisions.push(IdCollision {
                        id: template.id.clone(),
                        kept: template.kind,
                        dropped: previous.kind,
                    });
                }
                unique[slot] = template;
            }
            None => {
                slots.insert(template.id.clone(), unique.len());
                unique.push(template);
            }
        }
    }

    Deduplicated {
        templates: unique,
        collisions,
    }
}

/// Calendar part from `date`, clock part from `time`.
pub fn combine(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

pub fn expand_template(template: &EventTemplate, policy: OvernightPolicy) -> Vec<Occurrence> {
    let range = template.time_range;
    let end_offset = match policy {
        OvernightPolicy::NextDay if range.is_overnight() => Duration::days(1),
        _ => Duration::zero(),
    };

    template
        .occurrence_dates
        .iter()
        .map(|date| Occurrence {
            template_id: template.id.clone(),
            kind: template.kind,
            title: template.title.clone(),
            start: combine(*date, range.from),
            end: combine(*date, range.to) + end_offset,
        })
        .collect()
}

pub fn expand(templates: &[EventTemplate], policy: OvernightPolicy) -> Vec<Occurrence> {
    templates
        .iter()
        .flat_map(|template| expand_template(template, policy))
        .collect()
}

pub fn materialize(
    unavailability: &[UnavailabilityRecord],
    classes: &[ClassScheduleRecord],
    policy: OvernightPolicy,
) -> Schedule {
    let normalized = normalize_records(unavailability, classes);
    let normalized_count = normalized.len();
    let Deduplicated {
        templates,
        collisions,
    } = deduplicate(normalized);
    let occurrences = expand(&templates, policy);

    tracing::debug!(
        normalized = normalized_count,
        unique = templates.len(),
        occurrences = occurrences.len(),
        "schedule materialized"
    );

    Schedule {
        templates,
        occurrences,
        collisions,
    }
}
