/// Why a course cannot be published yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishBlocker {
    NoSections,
    NoLessons,
}

impl PublishBlocker {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoSections => "Cannot publish course without sections",
            Self::NoLessons => "Cannot publish course without lessons",
        }
    }
}

/// A course needs at least one section and one lesson across its sections.
pub fn check_publishable(section_count: i64, lesson_count: i64) -> Result<(), PublishBlocker> {
    if section_count <= 0 {
        return Err(PublishBlocker::NoSections);
    }
    if lesson_count <= 0 {
        return Err(PublishBlocker::NoLessons);
    }
    Ok(())
}
