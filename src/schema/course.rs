use actix_multipart::form::{bytes::Bytes, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::AppError,
    models::course::{Course, CourseLevel, CourseWithCreator},
    schema::form::{parse_field, text_field, url_field, FromMultipart},
};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourse {
    #[validate(length(min = 1, max = 200))]
    pub course_title: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourse {
    #[validate(length(min = 1, max = 200))]
    pub course_title: Option<String>,
    #[validate(length(max = 300))]
    pub sub_title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub course_level: Option<CourseLevel>,
    #[validate(range(min = 0))]
    pub course_price: Option<i32>,
    #[validate(url)]
    pub course_thumbnail: Option<String>,
}

/// The course settings form as the dashboard posts it.
#[derive(MultipartForm)]
pub struct UpdateCourseForm {
    #[multipart(rename = "courseTitle")]
    pub course_title: Option<Text<String>>,
    #[multipart(rename = "subTitle")]
    pub sub_title: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub category: Option<Text<String>>,
    #[multipart(rename = "courseLevel")]
    pub course_level: Option<Text<String>>,
    #[multipart(rename = "coursePrice")]
    pub course_price: Option<Text<String>>,
    #[multipart(rename = "courseThumbnail")]
    pub course_thumbnail: Option<Bytes>,
}

impl FromMultipart for UpdateCourse {
    type Form = UpdateCourseForm;

    fn from_form(form: UpdateCourseForm) -> Result<Self, AppError> {
        let course_level = text_field(form.course_level)
            .map(|level| {
                serde_json::from_value::<CourseLevel>(serde_json::Value::String(level))
                    .map_err(|_| AppError::BadRequest("Invalid value for courseLevel".to_string()))
            })
            .transpose()?;

        Ok(Self {
            course_title: text_field(form.course_title),
            sub_title: text_field(form.sub_title),
            description: text_field(form.description),
            category: text_field(form.category),
            course_level,
            course_price: parse_field(form.course_price, "coursePrice")?,
            course_thumbnail: url_field(form.course_thumbnail, "courseThumbnail")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PublishQuery {
    pub publish: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: Option<String>,
    pub categories: Option<String>,
    pub sort_by_price: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorResponse {
    pub id: Uuid,
    pub name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse{
    pub id: Uuid,
    pub course_title: String,
    pub sub_title: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub course_level: Option<CourseLevel>,
    pub course_price: Option<i32>,
    pub course_thumbnail: Option<String>,
    pub is_published: bool,
    pub is_free: bool,
    pub creator_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<CreatorResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            is_free: course.is_free(),
            course_title: course.course_title,
            sub_title: course.sub_title,
            description: course.description,
            category: course.category,
            course_level: course.course_level,
            course_price: course.course_price,
            course_thumbnail: course.course_thumbnail,
            is_published: course.is_published,
            creator_id: course.creator_id,
            creator: None,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

impl From<CourseWithCreator> for CourseResponse {
    fn from(row: CourseWithCreator) -> Self {
        let creator = CreatorResponse {
            id: row.course.creator_id,
            name: row.creator_name,
            photo_url: row.creator_photo_url,
        };
        Self {
            creator: Some(creator),
            ..CourseResponse::from(row.course)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseEnvelope{
    pub success: bool,
    pub message: String,
    pub course: CourseResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseListResponse{
    pub success: bool,
    pub courses: Vec<CourseResponse>,
}

impl CourseListResponse {
    pub fn new<T: Into<CourseResponse>>(courses: Vec<T>) -> Self {
        Self {
            success: true,
            courses: courses.into_iter().map(Into::into).collect(),
        }
    }
}
