//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints. Every JSON endpoint answers with
//! the [`ServiceResult`] envelope; failures render through [`AppError`].

use crate::shared::error::AppError;
use crate::shared::response::ServiceResult;

pub mod admin;
pub mod auth;
pub mod category;
pub mod course;
pub mod dashboard;
pub mod enrollment;
pub mod health;
pub mod instructor;
pub mod notification;
pub mod review;
pub mod skill;
pub mod user;

pub type ApiResult<T> = Result<ServiceResult<T>, AppError>;
