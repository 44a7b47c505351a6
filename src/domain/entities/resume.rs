use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::errors::{DocumentError, DomainError};

/// Identity of a list entry. Unique within one document and never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub linkedin: String,
    pub github: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperience {
    pub id: EntryId,
    pub company: String,
    pub role: String,
    #[serde(alias = "dates")]
    pub date_range: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: EntryId,
    pub institution: String,
    pub degree: String,
    #[serde(alias = "dates")]
    pub date_range: String,
    pub details: String,
}

/// Grouped skills entry, e.g. "Languages" / "**Rust**, Go, Python".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillCategory {
    pub id: EntryId,
    pub category_name: String,
    pub skills_text: String,
}

/// The canonical document edited by the user.
///
/// All four sections are always present; an unset scalar is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeDocument {
    pub personal_info: PersonalInfo,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub skills: Vec<SkillCategory>,
}

impl ResumeDocument {
    /// Parses a serialized document, substituting typed empty defaults for
    /// anything missing or malformed. Never fails: an unparsable payload
    /// yields an empty document.
    pub fn hydrate(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "unparsable document payload, using empty document");
                return Self::default();
            }
        };

        let Value::Object(mut fields) = value else {
            tracing::warn!("document payload is not an object, using empty document");
            return Self::default();
        };

        let mut doc = Self {
            personal_info: take_record(&mut fields, "personalInfo"),
            work_experience: take_list(&mut fields, "workExperience"),
            education: take_list(&mut fields, "education"),
            skills: take_list(&mut fields, "skills"),
        };
        doc.repair_entry_ids();
        doc
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| DomainError::internal(e.to_string()))
    }

    /// Gives every entry with an empty or duplicated id a fresh one.
    fn repair_entry_ids(&mut self) {
        let mut seen = HashSet::new();
        let ids = self
            .work_experience
            .iter_mut()
            .map(|e| &mut e.id)
            .chain(self.education.iter_mut().map(|e| &mut e.id))
            .chain(self.skills.iter_mut().map(|e| &mut e.id));

        for id in ids {
            if id.is_empty() || !seen.insert(id.clone()) {
                *id = EntryId::generate();
                seen.insert(id.clone());
            }
        }
    }

    pub fn contains_id(&self, id: &EntryId) -> bool {
        self.work_experience.iter().any(|e| &e.id == id)
            || self.education.iter().any(|e| &e.id == id)
            || self.skills.iter().any(|e| &e.id == id)
    }

    pub fn entry_count(&self, list: ListName) -> usize {
        match list {
            ListName::WorkExperience => self.work_experience.len(),
            ListName::Education => self.education.len(),
            ListName::Skills => self.skills.len(),
        }
    }

    /// Resolves a field path to the string slot it names.
    pub fn field_mut(&mut self, path: &FieldPath) -> Result<&mut String, DocumentError> {
        match path {
            FieldPath::PersonalInfo(field) => Ok(self.personal_info.field_mut(*field)),
            FieldPath::WorkExperience(id, field) => {
                find_entry(&mut self.work_experience, id).map(|e| e.field_mut(*field))
            }
            FieldPath::Education(id, field) => {
                find_entry(&mut self.education, id).map(|e| e.field_mut(*field))
            }
            FieldPath::Skills(id, field) => {
                find_entry(&mut self.skills, id).map(|e| e.field_mut(*field))
            }
        }
    }

    /// Removes the entry with `id` from `list`. Returns whether one was removed.
    pub fn remove_entry(&mut self, list: ListName, id: &EntryId) -> bool {
        match list {
            ListName::WorkExperience => remove_by_id(&mut self.work_experience, id),
            ListName::Education => remove_by_id(&mut self.education, id),
            ListName::Skills => remove_by_id(&mut self.skills, id),
        }
    }
}

fn find_entry<'a, E: ListEntry>(
    entries: &'a mut [E],
    id: &EntryId,
) -> Result<&'a mut E, DocumentError> {
    entries
        .iter_mut()
        .find(|e| e.id() == id)
        .ok_or_else(|| DocumentError::UnknownEntry {
            list: E::LIST.as_str(),
            id: id.to_string(),
        })
}

fn remove_by_id<E: ListEntry>(entries: &mut Vec<E>, id: &EntryId) -> bool {
    let before = entries.len();
    entries.retain(|e| e.id() != id);
    entries.len() != before
}

fn take_record<T: DeserializeOwned + Default>(fields: &mut Map<String, Value>, key: &str) -> T {
    match fields.remove(key) {
        Some(Value::Object(record)) => record_from_object(record).unwrap_or_default(),
        Some(other) => {
            tracing::debug!(field = key, kind = %kind_of(&other), "malformed field, defaulting");
            T::default()
        }
        None => T::default(),
    }
}

fn take_list<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Vec<T> {
    match fields.remove(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => record_from_object(record),
                other => {
                    tracing::debug!(field = key, kind = %kind_of(&other), "skipping malformed entry");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::debug!(field = key, kind = %kind_of(&other), "malformed list, defaulting");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Records are flat maps of strings. Nulls and nested values are dropped so
/// the field falls back to its default; numbers and booleans are kept as text.
fn record_from_object<T: DeserializeOwned>(mut record: Map<String, Value>) -> Option<T> {
    // The legacy key loses to the current one when both are present.
    if record.contains_key("dateRange") {
        record.remove("dates");
    }
    let normalized: Map<String, Value> = record
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(_) => Some((key, value)),
            Value::Number(n) => Some((key, Value::String(n.to_string()))),
            Value::Bool(b) => Some((key, Value::String(b.to_string()))),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        })
        .collect();

    serde_json::from_value(Value::Object(normalized)).ok()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The three list-valued sections of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListName {
    WorkExperience,
    Education,
    Skills,
}

impl ListName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkExperience => "workExperience",
            Self::Education => "education",
            Self::Skills => "skills",
        }
    }
}

impl FromStr for ListName {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workExperience" => Ok(Self::WorkExperience),
            "education" => Ok(Self::Education),
            "skills" => Ok(Self::Skills),
            other => Err(DocumentError::InvalidPath(other.to_string())),
        }
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry type stored in one of the document's lists.
pub trait ListEntry: Clone + Default + Send + 'static {
    const LIST: ListName;

    fn id(&self) -> &EntryId;
    fn set_id(&mut self, id: EntryId);
    fn entries_mut(doc: &mut ResumeDocument) -> &mut Vec<Self>;
}

impl ListEntry for WorkExperience {
    const LIST: ListName = ListName::WorkExperience;

    fn id(&self) -> &EntryId {
        &self.id
    }

    fn set_id(&mut self, id: EntryId) {
        self.id = id;
    }

    fn entries_mut(doc: &mut ResumeDocument) -> &mut Vec<Self> {
        &mut doc.work_experience
    }
}

impl ListEntry for Education {
    const LIST: ListName = ListName::Education;

    fn id(&self) -> &EntryId {
        &self.id
    }

    fn set_id(&mut self, id: EntryId) {
        self.id = id;
    }

    fn entries_mut(doc: &mut ResumeDocument) -> &mut Vec<Self> {
        &mut doc.education
    }
}

impl ListEntry for SkillCategory {
    const LIST: ListName = ListName::Skills;

    fn id(&self) -> &EntryId {
        &self.id
    }

    fn set_id(&mut self, id: EntryId) {
        self.id = id;
    }

    fn entries_mut(doc: &mut ResumeDocument) -> &mut Vec<Self> {
        &mut doc.skills
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalField {
    Name,
    Email,
    Phone,
    Website,
    Linkedin,
    Github,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkField {
    Company,
    Role,
    DateRange,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EducationField {
    Institution,
    Degree,
    DateRange,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillField {
    CategoryName,
    SkillsText,
}

impl PersonalInfo {
    pub fn field_mut(&mut self, field: PersonalField) -> &mut String {
        match field {
            PersonalField::Name => &mut self.name,
            PersonalField::Email => &mut self.email,
            PersonalField::Phone => &mut self.phone,
            PersonalField::Website => &mut self.website,
            PersonalField::Linkedin => &mut self.linkedin,
            PersonalField::Github => &mut self.github,
            PersonalField::Summary => &mut self.summary,
        }
    }
}

impl WorkExperience {
    pub fn field_mut(&mut self, field: WorkField) -> &mut String {
        match field {
            WorkField::Company => &mut self.company,
            WorkField::Role => &mut self.role,
            WorkField::DateRange => &mut self.date_range,
            WorkField::Description => &mut self.description,
        }
    }
}

impl Education {
    pub fn field_mut(&mut self, field: EducationField) -> &mut String {
        match field {
            EducationField::Institution => &mut self.institution,
            EducationField::Degree => &mut self.degree,
            EducationField::DateRange => &mut self.date_range,
            EducationField::Details => &mut self.details,
        }
    }
}

impl SkillCategory {
    pub fn field_mut(&mut self, field: SkillField) -> &mut String {
        match field {
            SkillField::CategoryName => &mut self.category_name,
            SkillField::SkillsText => &mut self.skills_text,
        }
    }
}

impl FromStr for PersonalField {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "website" => Ok(Self::Website),
            "linkedin" => Ok(Self::Linkedin),
            "github" => Ok(Self::Github),
            "summary" => Ok(Self::Summary),
            other => Err(DocumentError::InvalidPath(other.to_string())),
        }
    }
}

impl FromStr for WorkField {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(Self::Company),
            "role" => Ok(Self::Role),
            "dateRange" => Ok(Self::DateRange),
            "description" => Ok(Self::Description),
            other => Err(DocumentError::InvalidPath(other.to_string())),
        }
    }
}

impl FromStr for EducationField {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "institution" => Ok(Self::Institution),
            "degree" => Ok(Self::Degree),
            "dateRange" => Ok(Self::DateRange),
            "details" => Ok(Self::Details),
            other => Err(DocumentError::InvalidPath(other.to_string())),
        }
    }
}

impl FromStr for SkillField {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "categoryName" => Ok(Self::CategoryName),
            "skillsText" => Ok(Self::SkillsText),
            other => Err(DocumentError::InvalidPath(other.to_string())),
        }
    }
}

/// Address of one scalar field: a personal-info field, or a field of the
/// list entry identified by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    PersonalInfo(PersonalField),
    WorkExperience(EntryId, WorkField),
    Education(EntryId, EducationField),
    Skills(EntryId, SkillField),
}

impl FromStr for FieldPath {
    type Err = DocumentError;

    /// Accepts `personalInfo.<field>` or `<list>.<id>.<field>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DocumentError::InvalidPath(s.to_string());
        let parts: Vec<&str> = s.split('.').collect();

        match parts.as_slice() {
            ["personalInfo", field] => Ok(Self::PersonalInfo(field.parse()?)),
            [list, id, field] if !id.is_empty() => {
                let id = EntryId::from(*id);
                match list.parse::<ListName>().map_err(|_| invalid())? {
                    ListName::WorkExperience => Ok(Self::WorkExperience(id, field.parse()?)),
                    ListName::Education => Ok(Self::Education(id, field.parse()?)),
                    ListName::Skills => Ok(Self::Skills(id, field.parse()?)),
                }
            }
            _ => Err(invalid()),
        }
    }
}
