//! Energy balance calculators.
//!
//! - BMR via the Mifflin-St Jeor equation
//! - Linear projection of body-mass change from net calories

use crate::Gender;

/// Net energy balance (kcal) that corresponds to one kg of body-mass change.
///
/// The common rule of thumb of ~7700 kcal per kg of body fat.
pub const KCAL_PER_KG_BODY_MASS: f64 = 7700.0;

/// Compute basal metabolic rate in kcal/day (Mifflin-St Jeor)
///
/// `base = 10*weight + 6.25*height - 5*age`, then `+5` for men and `-161`
/// for women, rounded half away from zero. Inputs are not validated.
pub fn compute_bmr(weight_kg: f64, height_cm: f64, age_years: u32, gender: Gender) -> i64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years);
    let bmr = match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    };
    bmr.round() as i64
}

/// Projected body-mass change in kg for a total net calorie balance.
///
/// Positive for a surplus, negative for a deficit. Not rounded.
pub fn projected_weight_change_kg(total_net_calories: f64) -> f64 {
    total_net_calories / KCAL_PER_KG_BODY_MASS
}
