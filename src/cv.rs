//! CV content: the data object the rendering layer (and the print/PDF
//! export) consumes, one JSON document per locale under the content
//! directory.

use crate::i18n::{Locale, LocaleCatalog};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Frontend,
    Backend,
    Devops,
    Tools,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Proficiency from 1 to 5
    pub level: u8,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub start_date: String,
    /// A date or the literal "Present"
    pub end_date: String,
    pub location: String,
    pub remote: bool,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvData {
    pub name: String,
    pub title: String,
    pub summary: String,
    pub contact: ContactInfo,
    pub skills: Vec<Skill>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub languages: Vec<LanguageSkill>,
    pub soft_skills: Vec<String>,
}

/// In-memory CV content, one document per supported locale, loaded once at
/// startup. Content edits require a restart, which is fine for a
/// single-operator site.
#[derive(Debug)]
pub struct CvStore {
    entries: HashMap<Locale, Arc<CvData>>,
}

impl CvStore {
    /// Load `cv.{locale}.json` for every supported locale from `dir`.
    /// Every locale must have a document; a missing one is a startup error,
    /// not something to discover on the first request.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut entries = HashMap::new();

        for locale in LocaleCatalog::get().locales() {
            let path = dir.join(format!("cv.{}.json", locale.code()));
            let raw = std::fs::read_to_string(&path)
                .context(format!("Failed to read CV content at {}", path.display()))?;
            let data: CvData = serde_json::from_str(&raw)
                .context(format!("Invalid CV content at {}", path.display()))?;
            entries.insert(locale, Arc::new(data));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, locale: Locale) -> Arc<CvData> {
        Arc::clone(
            self.entries
                .get(&locale)
                .expect("store holds every catalog locale"),
        )
    }
}
