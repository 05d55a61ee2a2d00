use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::progress::{ProgressState, ProgressSummary},
    schema::{course::CourseResponse, lecture::LectureResponse},
};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressIds{
    pub viewed_lecture_ids: Vec<Uuid>,
    pub viewed_sub_lecture_ids: Vec<Uuid>,
}

impl From<&ProgressState> for ProgressIds {
    fn from(state: &ProgressState) -> Self {
        Self {
            viewed_lecture_ids: state.viewed_lectures.iter().copied().collect(),
            viewed_sub_lecture_ids: state.viewed_sub_lectures.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails{
    #[serde(flatten)]
    pub course: CourseResponse,
    pub lectures: Vec<LectureResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse{
    pub success: bool,
    pub course_details: CourseDetails,
    pub progress: ProgressIds,
    pub completed: bool,
    pub percent: u8,
    pub viewed_units: usize,
    pub total_units: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdateResponse{
    pub success: bool,
    pub message: String,
    pub progress: ProgressIds,
    pub completed: bool,
    pub percent: u8,
}

impl ProgressUpdateResponse {
    pub fn new(message: &str, state: &ProgressState, summary: ProgressSummary) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            progress: ProgressIds::from(state),
            completed: summary.completed,
            percent: summary.percent,
        }
    }
}
