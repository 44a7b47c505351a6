mod preview;
mod resume;
mod version;

pub use preview::{PreviewArtifact, PreviewStatus, RenderRequest, RenderTicket, PDF_MIME_TYPE};
pub use resume::{
    Education, EducationField, EntryId, FieldPath, ListEntry, ListName, PersonalField,
    PersonalInfo, ResumeDocument, SkillCategory, SkillField, WorkExperience, WorkField,
};
pub use version::{
    sort_newest_first, validate_version_name, VersionId, VersionInfo, VersionSnapshot,
};
