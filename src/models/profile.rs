// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Health profile captured during onboarding.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Body metrics plus the derived values the dashboard renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct HealthProfile {
    pub age: u8,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: Gender,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    /// Body mass index, kg/m^2
    pub bmi: f64,
    /// Basal metabolic rate, kcal/day (Mifflin-St Jeor)
    pub bmr: f64,
}

/// BMI = weight / height^2, with height in meters. Rounded to one decimal.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round1(weight_kg / (height_m * height_m))
}

/// Mifflin-St Jeor estimate. The gender offset is +5 for men, -161 for
/// women, and -78 (the midpoint) when neither applies.
pub fn bmr(age: u8, height_cm: f64, weight_kg: f64, gender: Gender) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    let offset = match gender {
        Gender::Male => 5.0,
        Gender::Female => -161.0,
        Gender::Other => -78.0,
    };
    round1(base + offset)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
