use actix_multipart::form::{text::Text, MultipartForm};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::AppError,
    models::{lecture::{Lecture, SubLecture}, tutorial::Tutorial},
    schema::form::{parse_field, text_field, FromMultipart},
};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLecture{
    #[validate(length(min = 1, max = 200))]
    pub lecture_title: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo{
    #[validate(url)]
    pub video_url: String,
    pub public_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditLecture{
    #[validate(length(min = 1, max = 200))]
    pub lecture_title: Option<String>,
    #[validate(nested)]
    pub video_info: Option<VideoInfo>,
    #[serde(alias = "isFree")]
    pub is_preview_free: Option<bool>,
    #[validate(range(min = 0))]
    pub duration_seconds: Option<i32>,
}

/// The lecture editor form. The video itself is uploaded to the media host first.
#[derive(MultipartForm)]
pub struct EditLectureForm{
    #[multipart(rename = "lectureTitle")]
    pub lecture_title: Option<Text<String>>,
    #[multipart(rename = "videoUrl")]
    pub video_url: Option<Text<String>>,
    #[multipart(rename = "publicId")]
    pub public_id: Option<Text<String>>,
    #[multipart(rename = "isFree")]
    pub is_free: Option<Text<String>>,
    #[multipart(rename = "isPreviewFree")]
    pub is_preview_free: Option<Text<String>>,
    #[multipart(rename = "durationSeconds")]
    pub duration_seconds: Option<Text<String>>,
}

impl FromMultipart for EditLecture {
    type Form = EditLectureForm;

    fn from_form(form: EditLectureForm) -> Result<Self, AppError> {
        let public_id = text_field(form.public_id);
        let video_info = text_field(form.video_url).map(|video_url| VideoInfo{video_url, public_id});

        let is_preview_free = match parse_field(form.is_preview_free, "isPreviewFree")? {
            Some(flag) => Some(flag),
            None => parse_field(form.is_free, "isFree")?,
        };

        Ok(Self {
            lecture_title: text_field(form.lecture_title),
            video_info,
            is_preview_free,
            duration_seconds: parse_field(form.duration_seconds, "durationSeconds")?,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubLecture{
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditSubLecture{
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTutorial{
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(url)]
    pub video_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditTutorial{
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubLectureResponse{
    pub id: Uuid,
    pub lecture_id: Uuid,
    pub title: String,
    pub video_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub position: i32,
    pub locked: bool,
}

impl SubLectureResponse {
    pub fn new(sub: SubLecture, unlocked: bool) -> Self {
        Self {
            id: sub.id,
            lecture_id: sub.lecture_id,
            title: sub.title,
            video_url: sub.video_url.filter(|_| unlocked),
            duration_seconds: sub.duration_seconds,
            position: sub.position,
            locked: !unlocked,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureResponse{
    pub id: Uuid,
    pub course_id: Uuid,
    pub lecture_title: String,
    pub video_url: Option<String>,
    pub public_id: Option<String>,
    pub is_preview_free: bool,
    pub duration_seconds: Option<i32>,
    pub position: i32,
    pub locked: bool,
    pub sub_lectures: Vec<SubLectureResponse>,
}

impl LectureResponse {
    /// Locked lectures keep their outline but lose every video reference.
    pub fn new(lecture: Lecture, sub_lectures: Vec<SubLecture>, unlocked: bool) -> Self {
        Self {
            id: lecture.id,
            course_id: lecture.course_id,
            lecture_title: lecture.lecture_title,
            video_url: lecture.video_url.filter(|_| unlocked),
            public_id: lecture.public_id.filter(|_| unlocked),
            is_preview_free: lecture.is_preview_free,
            duration_seconds: lecture.duration_seconds,
            position: lecture.position,
            locked: !unlocked,
            sub_lectures: sub_lectures
                .into_iter()
                .map(|sub| SubLectureResponse::new(sub, unlocked))
                .collect(),
        }
    }

    /// Pairs each lecture with its own sub-lectures, keeping the given order.
    pub fn with_sub_lectures(
        lectures: Vec<Lecture>,
        sub_lectures: Vec<SubLecture>,
        unlocked: impl Fn(&Lecture) -> bool,
    ) -> Vec<Self> {
        lectures
            .into_iter()
            .map(|lecture| {
                let subs = sub_lectures
                    .iter()
                    .filter(|sub| sub.lecture_id == lecture.id)
                    .cloned()
                    .collect();
                let open = unlocked(&lecture);
                LectureResponse::new(lecture, subs, open)
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialResponse{
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub position: i32,
    pub locked: bool,
}

impl TutorialResponse {
    pub fn new(tutorial: Tutorial, unlocked: bool) -> Self {
        Self {
            id: tutorial.id,
            course_id: tutorial.course_id,
            title: tutorial.title,
            content: Some(tutorial.content).filter(|_| unlocked),
            video_url: tutorial.video_url.filter(|_| unlocked),
            position: tutorial.position,
            locked: !unlocked,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LectureEnvelope{
    pub success: bool,
    pub message: String,
    pub lecture: LectureResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LectureListResponse{
    pub success: bool,
    pub lectures: Vec<LectureResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubLectureEnvelope{
    pub success: bool,
    pub message: String,
    pub sub_lecture: SubLectureResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorialEnvelope{
    pub success: bool,
    pub message: String,
    pub tutorial: TutorialResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TutorialListResponse{
    pub success: bool,
    pub tutorials: Vec<TutorialResponse>,
}
