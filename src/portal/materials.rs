use serde::{Deserialize, Serialize};

use crate::backend::{Backend, Collection, Query, Records};
use crate::portal::decode_all;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub course_name: String,
}

/// Learning material attached to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    pub course_id: String,
}

pub async fn courses(backend: &dyn Backend) -> Result<Vec<Course>> {
    let records = backend
        .select(Collection::COURSES, &Query::new().order("course_name", true))
        .await?;
    decode_all(records)
}

pub async fn list(backend: &dyn Backend) -> Result<Vec<Material>> {
    let records = backend
        .select(Collection::MATERIALS, &Query::new().order("title", true))
        .await?;
    decode_all(records)
}

/// Keep materials of `course` (all courses when `None`) whose title or
/// description contains `term`, ignoring case. A blank term keeps everything.
pub fn filter<'a>(materials: &'a [Material], course: Option<&str>, term: &str) -> Vec<&'a Material> {
    let term = term.trim().to_lowercase();
    materials
        .iter()
        .filter(|material| course.map_or(true, |id| material.course_id == id))
        .filter(|material| {
            term.is_empty()
                || material.title.to_lowercase().contains(&term)
                || material
                    .description
                    .as_deref()
                    .map_or(false, |description| description.to_lowercase().contains(&term))
        })
        .collect()
}
