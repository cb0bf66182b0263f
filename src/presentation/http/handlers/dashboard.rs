//! Dashboard handlers for the three roles

use axum::extract::State;

use super::ApiResult;
use crate::application::dto::response::{
    AdminDashboardDto, InstructorDashboardDto, StudentDashboardDto,
};
use crate::application::services::DashboardService;
use crate::presentation::middleware::AuthUser;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

pub async fn student_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<StudentDashboardDto> {
    let dashboard = state.dashboard_service().student(user.user_id).await?;
    Ok(ServiceResult::success(dashboard))
}

pub async fn instructor_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<InstructorDashboardDto> {
    let dashboard = state.dashboard_service().instructor(user.user_id).await?;
    Ok(ServiceResult::success(dashboard))
}

/// Site-wide statistics, cached briefly
pub async fn admin_dashboard(State(state): State<AppState>) -> ApiResult<AdminDashboardDto> {
    let dashboard = state.dashboard_service().admin().await?;
    Ok(ServiceResult::success(dashboard))
}
