use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::models::{ClassScheduleRecord, UnavailabilityRecord};
use crate::rubric::{Rubric, ScaleLevel, Selections};

async fn read_json_list<T: DeserializeOwned>(path: Option<&Path>) -> anyhow::Result<Vec<T>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Both exports are read concurrently; the result is only available once
/// both have loaded.
pub async fn load_schedule_sources(
    unavailability: Option<&Path>,
    classes: Option<&Path>,
) -> anyhow::Result<(Vec<UnavailabilityRecord>, Vec<ClassScheduleRecord>)> {
    let (unavailability, classes) = tokio::try_join!(
        read_json_list::<UnavailabilityRecord>(unavailability),
        read_json_list::<ClassScheduleRecord>(classes),
    )?;

    tracing::info!(
        unavailability = unavailability.len(),
        classes = classes.len(),
        "schedule sources loaded"
    );
    Ok((unavailability, classes))
}

pub async fn load_rubric(path: &Path) -> anyhow::Result<Rubric> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read rubric {}", path.display()))?;
    let rubric: Rubric = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse rubric {}", path.display()))?;
    rubric
        .aspect_ids()
        .with_context(|| format!("invalid rubric {}", path.display()))?;
    Ok(rubric)
}

pub fn load_selections(csv_path: &Path) -> anyhow::Result<Selections> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        aspect_id: String,
        scale: u8,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut selections = Selections::new();

    // Line 1 is the header.
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid selection on line {}", index + 2))?;
        let level = ScaleLevel::try_from(row.scale)
            .with_context(|| format!("invalid scale for aspect {}", row.aspect_id))?;
        if selections.insert(row.aspect_id.clone(), level).is_some() {
            tracing::warn!(aspect = %row.aspect_id, "aspect selected more than once, keeping last");
        }
    }

    Ok(selections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_both_sources() {
        let unavailability = write_temp(
            r#"[{"id": "u1", "from": "08:00", "to": "10:00", "dates": ["2024-03-04"]}]"#,
        );
        let classes = write_temp(
            r#"[{"id": 9, "startTime": "14:30", "endTime": "16:00", "dates": ["2024-03-05"]}]"#,
        );

        let (u, c) = load_schedule_sources(Some(unavailability.path()), Some(classes.path()))
            .await
            .unwrap();
        assert_eq!(u.len(), 1);
        assert_eq!(c[0].id, "9");
    }

    #[tokio::test]
    async fn missing_source_means_empty_collection() {
        let (u, c) = load_schedule_sources(None, None).await.unwrap();
        assert!(u.is_empty());
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn unreadable_source_fails_with_path() {
        let err = load_schedule_sources(Some(Path::new("/nonexistent/u.json")), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/u.json"));
    }

    #[tokio::test]
    async fn loads_rubric_definition() {
        let file = write_temp(
            r#"{"title": "Ficha", "categories": [
                {"id": "c1", "name": "Planificación", "weight": 100, "indicators": [
                    {"id": "i1", "name": "Sesión", "aspects": [{"id": "a1", "description": "Propósito"}]}
                ]}
            ]}"#,
        );
        let rubric = load_rubric(file.path()).await.unwrap();
        assert_eq!(rubric.categories[0].indicators[0].aspects[0].id, "a1");
        assert!(rubric.check_weights().is_ok());
    }

    #[test]
    fn reads_selection_csv() {
        let file = write_temp("aspect_id,scale\na1,4\na2,2\na1,3\n");
        let selections = load_selections(file.path()).unwrap();
        assert_eq!(selections.len(), 2);
        assert_eq!(selections["a1"], ScaleLevel::Logrado);
        assert_eq!(selections["a2"], ScaleLevel::Proceso);
    }

    #[tokio::test]
    async fn rejects_rubric_with_repeated_aspect() {
        let file = write_temp(
            r#"{"title": "Ficha", "categories": [
                {"id": "c1", "name": "Planificación", "weight": 50, "indicators": [
                    {"id": "i1", "name": "Sesión", "aspects": [{"id": "a1", "description": "Propósito"}]},
                    {"id": "i2", "name": "Cierre", "aspects": [{"id": "a1", "description": "Metacognición"}]}
                ]}
            ]}"#,
        );
        let err = load_rubric(file.path()).await.unwrap_err();
        assert!(err.to_string().starts_with("invalid rubric"));
        assert!(format!("{err:#}").contains("`a1` appears more than once"));
    }

    #[test]
    fn malformed_row_reports_file_line() {
        let file = write_temp("aspect_id,scale\na1,4\na2,high\n");
        let err = load_selections(file.path()).unwrap_err();
        assert_eq!(err.to_string(), "invalid selection on line 3");
    }

    #[test]
    fn rejects_out_of_range_scale() {
        let file = write_temp("aspect_id,scale\na1,7\n");
        let err = load_selections(file.path()).unwrap_err();
        assert!(err.to_string().contains("a1"));
    }
}
