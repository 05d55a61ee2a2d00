use uuid::Uuid;

use crate::models::course::Course;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessLevel {
    Owner,
    Enrolled,
    Preview,
}

impl AccessLevel {
    pub fn resolve(user_id: Uuid, course: &Course, enrolled: bool) -> Self {
        if course.creator_id == user_id {
            AccessLevel::Owner
        } else if enrolled {
            AccessLevel::Enrolled
        } else {
            AccessLevel::Preview
        }
    }

    pub fn has_full_access(self) -> bool {
        matches!(self, AccessLevel::Owner | AccessLevel::Enrolled)
    }

    /// Sub-lectures follow their lecture's preview flag.
    pub fn lecture_unlocked(self, is_preview_free: bool) -> bool {
        self.has_full_access() || is_preview_free
    }

    pub fn tutorial_unlocked(self) -> bool {
        self.has_full_access()
    }
}
