//! Course progress bookkeeping.
//!
//! A course is made of completion units: every sub-lecture is a unit, and a
//! lecture without sub-lectures is a unit of its own. Viewing a lecture
//! covers all of its sub-lectures; viewing the last unviewed sub-lecture of a
//! lecture marks the lecture viewed too.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::{errors::AppError, models::lecture::{Lecture, SubLecture}};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureOutline {
    pub lecture_id: Uuid,
    pub sub_lecture_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseOutline {
    pub lectures: Vec<LectureOutline>,
}

impl CourseOutline {
    /// `lectures` in display order; sub-lectures of other courses are ignored.
    pub fn new(lectures: &[Lecture], sub_lectures: &[SubLecture]) -> Self {
        let lectures = lectures
            .iter()
            .map(|lecture| LectureOutline {
                lecture_id: lecture.id,
                sub_lecture_ids: sub_lectures
                    .iter()
                    .filter(|sub| sub.lecture_id == lecture.id)
                    .map(|sub| sub.id)
                    .collect(),
            })
            .collect();
        Self { lectures }
    }

    fn lecture(&self, lecture_id: Uuid) -> Option<&LectureOutline> {
        self.lectures.iter().find(|lecture| lecture.lecture_id == lecture_id)
    }

    fn lecture_of_sub(&self, sub_lecture_id: Uuid) -> Option<&LectureOutline> {
        self.lectures
            .iter()
            .find(|lecture| lecture.sub_lecture_ids.contains(&sub_lecture_id))
    }

    pub fn total_units(&self) -> usize {
        self.lectures
            .iter()
            .map(|lecture| lecture.sub_lecture_ids.len().max(1))
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub viewed_lectures: BTreeSet<Uuid>,
    pub viewed_sub_lectures: BTreeSet<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub viewed_units: usize,
    pub total_units: usize,
    pub percent: u8,
    pub completed: bool,
}

impl ProgressState {
    pub fn new(viewed_lectures: impl IntoIterator<Item = Uuid>, viewed_sub_lectures: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            viewed_lectures: viewed_lectures.into_iter().collect(),
            viewed_sub_lectures: viewed_sub_lectures.into_iter().collect(),
        }
    }

    pub fn view_lecture(&mut self, outline: &CourseOutline, lecture_id: Uuid) -> Result<(), AppError> {
        let lecture = outline
            .lecture(lecture_id)
            .ok_or(AppError::NotFound("Lecture not found in this course"))?;

        self.viewed_lectures.insert(lecture.lecture_id);
        self.viewed_sub_lectures.extend(lecture.sub_lecture_ids.iter().copied());
        Ok(())
    }

    pub fn view_sub_lecture(&mut self, outline: &CourseOutline, sub_lecture_id: Uuid) -> Result<(), AppError> {
        let lecture = outline
            .lecture_of_sub(sub_lecture_id)
            .ok_or(AppError::NotFound("Sub-lecture not found in this course"))?;

        self.viewed_sub_lectures.insert(sub_lecture_id);
        if lecture
            .sub_lecture_ids
            .iter()
            .all(|sub_id| self.viewed_sub_lectures.contains(sub_id))
        {
            self.viewed_lectures.insert(lecture.lecture_id);
        }
        Ok(())
    }

    pub fn complete_all(&mut self, outline: &CourseOutline) {
        for lecture in &outline.lectures {
            self.viewed_lectures.insert(lecture.lecture_id);
            self.viewed_sub_lectures.extend(lecture.sub_lecture_ids.iter().copied());
        }
    }

    /// Forgets a deleted sub-lecture. `remaining` is its lecture after the delete;
    /// the lecture counts as viewed once everything left in it was viewed.
    /// Returns whether anything changed.
    pub fn remove_sub_lecture(&mut self, remaining: &LectureOutline, sub_lecture_id: Uuid) -> bool {
        let was_viewed = self.viewed_sub_lectures.remove(&sub_lecture_id);

        let rest_viewed = remaining
            .sub_lecture_ids
            .iter()
            .all(|sub_id| self.viewed_sub_lectures.contains(sub_id));
        let covered = if remaining.sub_lecture_ids.is_empty() { was_viewed } else { rest_viewed };

        let marked = covered && self.viewed_lectures.insert(remaining.lecture_id);
        was_viewed || marked
    }

    pub fn reset(&mut self) {
        self.viewed_lectures.clear();
        self.viewed_sub_lectures.clear();
    }

    /// Ids that no longer belong to the course don't count.
    pub fn summary(&self, outline: &CourseOutline) -> ProgressSummary {
        let viewed_units: usize = outline
            .lectures
            .iter()
            .map(|lecture| {
                if lecture.sub_lecture_ids.is_empty() {
                    usize::from(self.viewed_lectures.contains(&lecture.lecture_id))
                } else {
                    lecture
                        .sub_lecture_ids
                        .iter()
                        .filter(|sub_id| self.viewed_sub_lectures.contains(sub_id))
                        .count()
                }
            })
            .sum();
        let total_units = outline.total_units();

        let percent = if total_units == 0 {
            0
        } else {
            ((200 * viewed_units + total_units) / (2 * total_units)) as u8
        };

        ProgressSummary {
            viewed_units,
            total_units,
            percent,
            completed: total_units > 0 && viewed_units == total_units,
        }
    }
}
