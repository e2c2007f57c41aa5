// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Routes for the authenticated user: profile read and onboarding.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::AuthContext;
use crate::models::{profile, Gender, HealthProfile, PublicUser};
use crate::response::ApiResponse;
use crate::AppState;

/// Readable before email verification (the frontend shows the account
/// screen with a "verify your email" banner).
pub fn relaxed_routes() -> Router<Arc<AppState>> {
    Router::new().route("/user/me", get(get_me))
}

/// Requires a verified account.
pub fn verified_routes() -> Router<Arc<AppState>> {
    Router::new().route("/user/onboarding", post(complete_onboarding))
}

/// Current user, as attached by the request gate.
async fn get_me(Extension(context): Extension<AuthContext>) -> ApiResponse<PublicUser> {
    ApiResponse::ok("OK", context.user)
}

#[derive(Debug, Deserialize, Validate)]
pub struct OnboardingRequest {
    #[validate(range(min = 13, max = 120, message = "age must be between 13 and 120"))]
    pub age: u8,
    #[validate(range(min = 50.0, max = 280.0, message = "height must be 50-280 cm"))]
    pub height_cm: f64,
    #[validate(range(min = 20.0, max = 500.0, message = "weight must be 20-500 kg"))]
    pub weight_kg: f64,
    pub gender: Gender,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
}

/// Store the onboarding wizard's answers plus the derived BMI/BMR and mark
/// onboarding complete. Idempotent: resubmitting overwrites the profile.
async fn complete_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    request: std::result::Result<Json<OnboardingRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = request.map_err(|e| AppError::Validation(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut user = state
        .store
        .get_user(&context.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    user.profile = Some(HealthProfile {
        age: request.age,
        height_cm: request.height_cm,
        weight_kg: request.weight_kg,
        gender: request.gender,
        medical_conditions: request.medical_conditions,
        dietary_preferences: request.dietary_preferences,
        goals: request.goals,
        bmi: profile::bmi(request.weight_kg, request.height_cm),
        bmr: profile::bmr(
            request.age,
            request.height_cm,
            request.weight_kg,
            request.gender,
        ),
    });
    user.onboarding_complete = true;
    user.touch();

    match state.store.update_user(&user).await {
        Ok(()) => {}
        Err(AppError::Database(cause)) => return Err(AppError::Onboarding(cause)),
        Err(e) => return Err(e),
    }

    tracing::info!(user_id = %user.id, "Onboarding completed");
    Ok(ApiResponse::ok("Onboarding complete", PublicUser::from(user)))
}
