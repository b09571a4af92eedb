use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SCALE_LEVEL_COUNT: u8 = 4;
pub const WEIGHT_TOTAL: f64 = 100.0;
pub const MAX_GRADE: f64 = 20.0;
const WEIGHT_TOLERANCE: f64 = 0.01;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RubricError {
    #[error("scale level must be between 1 and 4, got {0}")]
    InvalidScale(u8),
    #[error("selection refers to unknown aspect `{0}`")]
    UnknownAspect(String),
    #[error("full marks add up to {0:.2}, expected 100")]
    UnbalancedWeights(f64),
    #[error("aspect id `{0}` appears more than once")]
    DuplicateAspect(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ScaleLevel {
    Inicio = 1,
    Proceso = 2,
    Logrado = 3,
    Destacado = 4,
}

impl ScaleLevel {
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl From<ScaleLevel> for u8 {
    fn from(level: ScaleLevel) -> Self {
        level.index()
    }
}

impl TryFrom<u8> for ScaleLevel {
    type Error = RubricError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ScaleLevel::Inicio),
            2 => Ok(ScaleLevel::Proceso),
            3 => Ok(ScaleLevel::Logrado),
            4 => Ok(ScaleLevel::Destacado),
            other => Err(RubricError::InvalidScale(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    #[serde(rename = "Destacado")]
    Destacado,
    #[serde(rename = "Logrado")]
    Logrado,
    #[serde(rename = "Proceso")]
    Proceso,
    #[serde(rename = "No logrado")]
    NoLogrado,
}

impl Classification {
    pub fn from_grade(grade: f64) -> Self {
        if grade >= 17.0 {
            Classification::Destacado
        } else if grade >= 14.0 {
            Classification::Logrado
        } else if grade >= 10.0 {
            Classification::Proceso
        } else {
            Classification::NoLogrado
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Destacado => "Destacado",
            Classification::Logrado => "Logrado",
            Classification::Proceso => "Proceso",
            Classification::NoLogrado => "No logrado",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rubric {
    pub title: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub weight: f64,
    pub indicators: Vec<Indicator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicator {
    pub id: String,
    pub name: String,
    pub aspects: Vec<Aspect>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Aspect {
    pub id: String,
    pub description: String,
}

pub type Selections = HashMap<String, ScaleLevel>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAspect {
    pub id: String,
    pub description: String,
    pub scale: Option<ScaleLevel>,
    pub pesp: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredIndicator {
    pub id: String,
    pub name: String,
    pub obtained: f64,
    pub aspects: Vec<ScoredAspect>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCategory {
    pub id: String,
    pub name: String,
    pub weight: f64,
    pub obtained: f64,
    pub indicators: Vec<ScoredIndicator>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricScore {
    pub title: String,
    pub categories: Vec<ScoredCategory>,
    pub total: f64,
    pub grade: f64,
    pub classification: Classification,
    pub pending: usize,
}

/// Points earned by one aspect: a share of its category weight proportional
/// to the selected level.
pub fn pesp(scale: ScaleLevel, category_weight: f64) -> f64 {
    (scale.index() as f64 * category_weight) / SCALE_LEVEL_COUNT as f64
}

pub fn grade_from_total(total: f64) -> f64 {
    (total / WEIGHT_TOTAL) * MAX_GRADE
}

impl Rubric {
    /// Total when every aspect sits at the top level. Each aspect can earn
    /// its whole category weight, so this scales with the aspect count.
    pub fn max_total(&self) -> f64 {
        self.categories
            .iter()
            .map(|c| {
                let aspects: usize = c.indicators.iter().map(|i| i.aspects.len()).sum();
                c.weight * aspects as f64
            })
            .sum()
    }

    pub fn check_weights(&self) -> Result<(), RubricError> {
        let max = self.max_total();
        if (max - WEIGHT_TOTAL).abs() > WEIGHT_TOLERANCE {
            return Err(RubricError::UnbalancedWeights(max));
        }
        Ok(())
    }

    /// Selections are keyed by aspect id, so ids must be unique rubric-wide.
    pub fn aspect_ids(&self) -> Result<HashSet<&str>, RubricError> {
        let mut ids = HashSet::new();
        for aspect in self
            .categories
            .iter()
            .flat_map(|c| c.indicators.iter())
            .flat_map(|i| i.aspects.iter())
        {
            if !ids.insert(aspect.id.as_str()) {
                return Err(RubricError::DuplicateAspect(aspect.id.clone()));
            }
        }
        Ok(ids)
    }

    /// Scores the rubric for the given selections. Totals are not clamped, so
    /// an unbalanced rubric can report a grade above 20.
    pub fn score(&self, selections: &Selections) -> Result<RubricScore, RubricError> {
        let known = self.aspect_ids()?;
        if let Some(unknown) = selections.keys().find(|id| !known.contains(id.as_str())) {
            return Err(RubricError::UnknownAspect(unknown.clone()));
        }

        let mut pending = 0usize;
        let categories: Vec<ScoredCategory> = self
            .categories
            .iter()
            .map(|category| {
                let indicators: Vec<ScoredIndicator> = category
                    .indicators
                    .iter()
                    .map(|indicator| {
                        let aspects: Vec<ScoredAspect> = indicator
                            .aspects
                            .iter()
                            .map(|aspect| {
                                let scale = selections.get(&aspect.id).copied();
                                if scale.is_none() {
                                    pending += 1;
                                }
                                ScoredAspect {
                                    id: aspect.id.clone(),
                                    description: aspect.description.clone(),
                                    scale,
                                    pesp: scale.map_or(0.0, |s| pesp(s, category.weight)),
                                }
                            })
                            .collect();
                        ScoredIndicator {
                            id: indicator.id.clone(),
                            name: indicator.name.clone(),
                            obtained: aspects.iter().map(|a| a.pesp).sum(),
                            aspects,
                        }
                    })
                    .collect();
                ScoredCategory {
                    id: category.id.clone(),
                    name: category.name.clone(),
                    weight: category.weight,
                    obtained: indicators.iter().map(|i| i.obtained).sum(),
                    indicators,
                }
            })
            .collect();

        let total: f64 = categories.iter().map(|c| c.obtained).sum();
        let grade = grade_from_total(total);

        Ok(RubricScore {
            title: self.title.clone(),
            categories,
            total,
            grade,
            classification: Classification::from_grade(grade),
            pending,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEntry {
    pub category_id: String,
    pub indicator_id: String,
    pub aspect_id: String,
    pub scale: ScaleLevel,
    pub pesp: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricSubmission {
    pub id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub total: f64,
    pub grade: f64,
    pub classification: Classification,
    pub selections: Vec<SelectionEntry>,
}

impl RubricSubmission {
    pub fn from_score(score: &RubricScore, evaluated_at: DateTime<Utc>) -> Self {
        let selections = score
            .categories
            .iter()
            .flat_map(|category| {
                category.indicators.iter().flat_map(move |indicator| {
                    indicator.aspects.iter().filter_map(move |aspect| {
                        aspect.scale.map(|scale| SelectionEntry {
                            category_id: category.id.clone(),
                            indicator_id: indicator.id.clone(),
                            aspect_id: aspect.id.clone(),
                            scale,
                            pesp: aspect.pesp,
                        })
                    })
                })
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            evaluated_at,
            total: score.total,
            grade: score.grade,
            classification: score.classification,
            selections,
        }
    }
}

pub const CHECK_POINTS: f64 = 50.0;
pub const PASS_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Pass,
    Fail,
}

impl Check {
    pub fn obtained(self) -> f64 {
        match self {
            Check::Pass => CHECK_POINTS,
            Check::Fail => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryClassification {
    Aprobado,
    Desaprobado,
}

impl BinaryClassification {
    pub fn from_total(total: f64) -> Self {
        if total >= PASS_THRESHOLD {
            BinaryClassification::Aprobado
        } else {
            BinaryClassification::Desaprobado
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BinaryClassification::Aprobado => "Aprobado",
            BinaryClassification::Desaprobado => "Desaprobado",
        }
    }
}

/// Two-aspect pass/fail checklist recorded on an instructor's first evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstEvaluation {
    pub a: Check,
    pub b: Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstEvaluationScore {
    pub a_obtained: f64,
    pub b_obtained: f64,
    pub total: f64,
    pub classification: BinaryClassification,
}

impl FirstEvaluation {
    pub fn score(&self) -> FirstEvaluationScore {
        let a_obtained = self.a.obtained();
        let b_obtained = self.b.obtained();
        let total = a_obtained + b_obtained;
        FirstEvaluationScore {
            a_obtained,
            b_obtained,
            total,
            classification: BinaryClassification::from_total(total),
        }
    }
}
