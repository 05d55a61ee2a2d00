use actix_web::{get, post, web, HttpResponse};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    domain::progress::{CourseOutline, ProgressState},
    errors::AppError,
    middlewares::auth::AuthUser,
    models::{course::{self, Course}, lecture::{self, Lecture, SubLecture}, progress, purchase::is_enrolled},
    schema::{
        course::CourseResponse,
        lecture::LectureResponse,
        progress::{CourseDetails, ProgressIds, ProgressResponse, ProgressUpdateResponse},
    },
    utils::parse_id,
    GlobalState,
};

/// The creator and enrolled students may track progress.
async fn require_course_access(pool:&Pool<Postgres>, course_id:Uuid, user:&AuthUser) -> Result<Course, AppError>{
    let course = course::get_course_by_id(pool, course_id)
        .await?
        .ok_or(AppError::NotFound("Course not found"))?;

    if course.creator_id != user.id && !is_enrolled(pool, user.id, course_id).await? {
        return Err(AppError::Forbidden("Purchase the course to track progress"));
    }

    Ok(course)
}

struct CourseContent{
    lectures: Vec<Lecture>,
    sub_lectures: Vec<SubLecture>,
    outline: CourseOutline,
}

async fn load_content(pool:&Pool<Postgres>, course_id:Uuid) -> Result<CourseContent, AppError>{
    let lectures = lecture::get_course_lectures(pool, course_id).await?;
    let sub_lectures = lecture::get_course_sub_lectures(pool, course_id).await?;
    let outline = CourseOutline::new(&lectures, &sub_lectures);

    Ok(CourseContent{lectures, sub_lectures, outline})
}

async fn load_state(pool:&Pool<Postgres>, user_id:Uuid, course_id:Uuid) -> Result<ProgressState, AppError>{
    Ok(progress::get_progress(pool, user_id, course_id)
        .await?
        .map(|record| record.state())
        .unwrap_or_default())
}

/// Applies `change` to the caller's progress and stores the result.
async fn update_progress(
    data:&GlobalState,
    user:&AuthUser,
    course_id:&str,
    message:&str,
    change:impl FnOnce(&mut ProgressState, &CourseOutline) -> Result<(), AppError>,
) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(course_id, "course")?;

    require_course_access(&data.pool, course_id, user).await?;
    let content = load_content(&data.pool, course_id).await?;

    let mut state = load_state(&data.pool, user.id, course_id).await?;
    change(&mut state, &content.outline)?;

    let summary = state.summary(&content.outline);
    progress::save_progress(&data.pool, user.id, course_id, &state, summary.completed).await?;

    Ok(HttpResponse::Ok().json(ProgressUpdateResponse::new(message, &state, summary)))
}

#[get("/{course_id}")]
async fn get_course_progress(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    let course_id = parse_id(&path, "course")?;

    let course = require_course_access(&data.pool, course_id, &user).await?;
    let content = load_content(&data.pool, course_id).await?;
    let state = load_state(&data.pool, user.id, course_id).await?;
    let summary = state.summary(&content.outline);

    Ok(HttpResponse::Ok().json(ProgressResponse{
        success: true,
        course_details: CourseDetails{
            course: CourseResponse::from(course),
            lectures: LectureResponse::with_sub_lectures(content.lectures, content.sub_lectures, |_| true),
        },
        progress: ProgressIds::from(&state),
        completed: summary.completed,
        percent: summary.percent,
        viewed_units: summary.viewed_units,
        total_units: summary.total_units,
    }))
}

#[post("/{course_id}/lecture/{lecture_id}/view")]
async fn view_lecture(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<(String, String)>) -> Result<HttpResponse, AppError>{
    let (course_id, lecture_id) = path.into_inner();
    let lecture_id = parse_id(&lecture_id, "lecture")?;

    update_progress(&data, &user, &course_id, "Lecture progress has been updated.", |state, outline| {
        state.view_lecture(outline, lecture_id)
    }).await
}

#[post("/{course_id}/sub-lecture/{sub_lecture_id}/view")]
async fn view_sub_lecture(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<(String, String)>) -> Result<HttpResponse, AppError>{
    let (course_id, sub_lecture_id) = path.into_inner();
    let sub_lecture_id = parse_id(&sub_lecture_id, "sub-lecture")?;

    update_progress(&data, &user, &course_id, "Sub-lecture progress has been updated.", |state, outline| {
        state.view_sub_lecture(outline, sub_lecture_id)
    }).await
}

#[post("/{course_id}/complete")]
async fn mark_as_completed(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    update_progress(&data, &user, &path, "Course marked as completed.", |state, outline| {
        state.complete_all(outline);
        Ok(())
    }).await
}

#[post("/{course_id}/incomplete")]
async fn mark_as_incompleted(data:web::Data<GlobalState>, user:AuthUser, path:web::Path<String>) -> Result<HttpResponse, AppError>{
    update_progress(&data, &user, &path, "Course marked as incompleted.", |state, _| {
        state.reset();
        Ok(())
    }).await
}
