use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::purchase::{PaymentStatus, PurchaseWithCourse},
    schema::{course::CourseResponse, lecture::{LectureResponse, TutorialResponse}},
};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest{
    #[validate(length(min = 1))]
    pub course_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse{
    pub success: bool,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseDetailWithStatus{
    pub course: CourseResponse,
    pub lectures: Vec<LectureResponse>,
    pub tutorials: Vec<TutorialResponse>,
    pub purchased: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse{
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub course_thumbnail: Option<String>,
    pub amount: i32,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<PurchaseWithCourse> for PurchaseResponse {
    fn from(row: PurchaseWithCourse) -> Self {
        Self {
            id: row.purchase.id,
            course_id: row.purchase.course_id,
            course_title: row.course_title,
            course_thumbnail: row.course_thumbnail,
            amount: row.purchase.amount,
            status: row.purchase.status,
            created_at: row.purchase.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseListResponse{
    pub success: bool,
    pub purchases: Vec<PurchaseResponse>,
}
