use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{Datelike, NaiveDate};

use crate::models::{EventKind, Occurrence};
use crate::rubric::RubricScore;
use crate::schedule::Schedule;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KindSummary {
    pub templates: usize,
    pub occurrences: usize,
}

pub fn summarize_by_kind(schedule: &Schedule) -> BTreeMap<&'static str, KindSummary> {
    let mut map: BTreeMap<&'static str, KindSummary> = BTreeMap::new();

    for template in &schedule.templates {
        map.entry(template.kind.label()).or_default().templates += 1;
    }
    for occurrence in &schedule.occurrences {
        map.entry(occurrence.kind.label()).or_default().occurrences += 1;
    }

    map
}

/// Occurrences grouped by the Monday of their week, sorted by start.
pub fn group_by_week(occurrences: &[Occurrence]) -> BTreeMap<NaiveDate, Vec<&Occurrence>> {
    let mut weeks: BTreeMap<NaiveDate, Vec<&Occurrence>> = BTreeMap::new();
    for occurrence in occurrences {
        let date = occurrence.start.date();
        let monday = date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64);
        weeks.entry(monday).or_default().push(occurrence);
    }
    for entries in weeks.values_mut() {
        entries.sort_by_key(|o| o.start);
    }
    weeks
}

pub fn build_schedule_report(schedule: &Schedule) -> String {
    let summaries = summarize_by_kind(schedule);
    let mut output = String::new();

    let _ = writeln!(output, "# Teacher Schedule");
    let _ = writeln!(
        output,
        "{} templates, {} occurrences",
        schedule.templates.len(),
        schedule.occurrences.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Event Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No schedule entries.");
    } else {
        for (kind, summary) in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} templates, {} occurrences",
                kind, summary.templates, summary.occurrences
            );
        }
    }

    if !schedule.collisions.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Id Collisions");
        for collision in schedule.collisions.iter() {
            let _ = writeln!(
                output,
                "- id {}: kept {}, dropped {}",
                collision.id,
                collision.kept.label(),
                collision.dropped.label()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Calendar");

    let weeks = group_by_week(&schedule.occurrences);
    if weeks.is_empty() {
        let _ = writeln!(output, "No occurrences to show.");
    }
    for (monday, entries) in weeks.iter() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Week of {}", monday);
        for occurrence in entries {
            let marker = match occurrence.kind {
                EventKind::Unavailability => "unavailable",
                EventKind::Class => "class",
            };
            let _ = writeln!(
                output,
                "- {} {}-{} {} ({})",
                occurrence.start.format("%a %Y-%m-%d"),
                occurrence.start.format("%H:%M"),
                occurrence.end.format("%H:%M"),
                occurrence.title,
                marker
            );
        }
    }

    output
}

pub fn write_occurrences_csv<W: std::io::Write>(
    writer: W,
    occurrences: &[Occurrence],
) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["template_id", "kind", "title", "start", "end"])?;
    for occurrence in occurrences {
        let start = occurrence.start.format("%Y-%m-%dT%H:%M:%S").to_string();
        let end = occurrence.end.format("%Y-%m-%dT%H:%M:%S").to_string();
        csv.write_record([
            occurrence.template_id.as_str(),
            occurrence.kind.label(),
            occurrence.title.as_str(),
            start.as_str(),
            end.as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn build_rubric_report(score: &RubricScore) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", score.title);
    let _ = writeln!(
        output,
        "Total {:.2}% | grade {:.2} / 20 | {}",
        score.total,
        score.grade,
        score.classification.label()
    );
    if score.pending > 0 {
        let _ = writeln!(output, "{} aspects still without a selection.", score.pending);
    }

    for category in score.categories.iter() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "## {} ({:.2} of {:.2})",
            category.name, category.obtained, category.weight
        );
        for indicator in category.indicators.iter() {
            let _ = writeln!(output, "- {}: {:.2}", indicator.name, indicator.obtained);
            for aspect in indicator.aspects.iter() {
                let level = aspect
                    .scale
                    .map(|s| s.index().to_string())
                    .unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    output,
                    "  - {} [{}] {:.2}",
                    aspect.description, level, aspect.pesp
                );
            }
        }
    }

    output
}
