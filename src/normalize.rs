use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{
    ClassScheduleRecord, EventKind, EventTemplate, TimeRange, UnavailabilityRecord,
};

pub const UNAVAILABLE_TITLE: &str = "No disponible";
pub const UNAVAILABLE_COLOR: &str = "#ef4444";
pub const UNAVAILABLE_DESCRIPTION: &str = "Horario no disponible";
pub const CLASS_TITLE: &str = "Clase";
pub const CLASS_COLOR: &str = "#3b82f6";
pub const CLASS_DESCRIPTION: &str = "Horario de clase";

/// Unavailability templates first, then class templates, each in input order.
pub fn normalize_records(
    unavailability: &[UnavailabilityRecord],
    classes: &[ClassScheduleRecord],
) -> Vec<EventTemplate> {
    unavailability
        .iter()
        .map(unavailability_template)
        .chain(classes.iter().map(class_template))
        .collect()
}

pub fn unavailability_template(record: &UnavailabilityRecord) -> EventTemplate {
    let mut metadata = BTreeMap::new();
    metadata.insert(
        "description".to_string(),
        record
            .description
            .clone()
            .unwrap_or_else(|| UNAVAILABLE_DESCRIPTION.to_string()),
    );
    insert_range(&mut metadata, record.start_date, record.end_date);

    EventTemplate {
        id: record.id.clone(),
        kind: EventKind::Unavailability,
        title: UNAVAILABLE_TITLE.to_string(),
        time_range: TimeRange::new(record.from, record.to),
        occurrence_dates: record.dates.clone(),
        color: UNAVAILABLE_COLOR.to_string(),
        metadata,
    }
}

pub fn class_template(record: &ClassScheduleRecord) -> EventTemplate {
    let mut metadata = BTreeMap::new();
    metadata.insert("description".to_string(), CLASS_DESCRIPTION.to_string());

    let section_course = record.section_course.clone().unwrap_or_default();
    let course = section_course.course.map(|course| course.name);
    let section = section_course.section.map(|section| section.name);

    let title = match (&course, &section) {
        (Some(course), Some(section)) => format!("{course} - {section}"),
        (Some(course), None) => course.clone(),
        _ => CLASS_TITLE.to_string(),
    };

    if let Some(course) = course {
        metadata.insert("course".to_string(), course);
    }
    if let Some(section) = section {
        metadata.insert("section".to_string(), section);
    }
    if let Some(classroom) = section_course.classroom {
        metadata.insert("classroom".to_string(), classroom);
    }
    insert_range(&mut metadata, record.start_date, record.end_date);

    EventTemplate {
        id: record.id.clone(),
        kind: EventKind::Class,
        title,
        time_range: TimeRange::new(record.start_time, record.end_time),
        occurrence_dates: record.dates.clone(),
        color: CLASS_COLOR.to_string(),
        metadata,
    }
}

fn insert_range(
    metadata: &mut BTreeMap<String, String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) {
    if let Some(start) = start {
        metadata.insert("startDate".to_string(), start.to_string());
    }
    if let Some(end) = end {
        metadata.insert("endDate".to_string(), end.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Section, SectionCourse};
    use chrono::NaiveTime;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn unavailable(id: &str) -> UnavailabilityRecord {
        UnavailabilityRecord {
            id: id.to_string(),
            from: time(8, 0),
            to: time(10, 0),
            start_date: Some(day(1)),
            end_date: Some(day(31)),
            dates: vec![day(4), day(11)],
            description: None,
        }
    }

    fn class(id: &str, section_course: Option<SectionCourse>) -> ClassScheduleRecord {
        ClassScheduleRecord {
            id: id.to_string(),
            start_time: time(14, 30),
            end_time: time(16, 0),
            start_date: None,
            end_date: None,
            dates: vec![day(5)],
            section_course,
        }
    }

    #[test]
    fn unavailability_gets_defaults() {
        let template = unavailability_template(&unavailable("u1"));
        assert_eq!(template.kind, EventKind::Unavailability);
        assert_eq!(template.title, UNAVAILABLE_TITLE);
        assert_eq!(template.color, UNAVAILABLE_COLOR);
        assert_eq!(template.metadata["description"], UNAVAILABLE_DESCRIPTION);
        assert_eq!(template.metadata["startDate"], "2024-03-01");
        assert_eq!(template.occurrence_dates, vec![day(4), day(11)]);
        assert_eq!(template.time_range, TimeRange::new(time(8, 0), time(10, 0)));
    }

    #[test]
    fn class_title_comes_from_course_and_section() {
        let section_course = SectionCourse {
            course: Some(Course {
                name: "Algebra".to_string(),
            }),
            section: Some(Section {
                name: "A".to_string(),
            }),
            classroom: Some("B-204".to_string()),
        };
        let template = class_template(&class("c1", Some(section_course)));
        assert_eq!(template.title, "Algebra - A");
        assert_eq!(template.metadata["classroom"], "B-204");
        assert_eq!(template.metadata["description"], CLASS_DESCRIPTION);
        assert!(!template.metadata.contains_key("startDate"));
    }

    #[test]
    fn class_without_course_falls_back() {
        let template = class_template(&class("c2", None));
        assert_eq!(template.title, CLASS_TITLE);
        assert_eq!(template.color, CLASS_COLOR);
    }

    #[test]
    fn output_keeps_source_order() {
        let templates = normalize_records(
            &[unavailable("u1"), unavailable("u2")],
            &[class("c1", None)],
        );
        let ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2", "c1"]);
    }

    #[test]
    fn missing_dates_yield_empty_template_dates() {
        let mut record = unavailable("u3");
        record.dates.clear();
        assert!(unavailability_template(&record).occurrence_dates.is_empty());
    }
}
