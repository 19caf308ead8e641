//! Biased matrix factorization.
//!
//! See: <https://sifter.org/~simon/journal/20061211.html>.

use crate::math::vector::{dot, Vector};
use crate::trainer::model::Model;
use crate::trainer::noise::UniformSource;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Initial factors are drawn from `[-INITIAL_FACTOR_MAGNITUDE, +INITIAL_FACTOR_MAGNITUDE]`.
pub const INITIAL_FACTOR_MAGNITUDE: f64 = 0.01;

pub fn initialize_factors(length: usize, noise: &mut impl UniformSource) -> Vector {
    (0..length)
        .map(|_| noise.next_in_range(-INITIAL_FACTOR_MAGNITUDE, INITIAL_FACTOR_MAGNITUDE))
        .collect()
}

/// `NaN` collapses to the lower bound.
#[must_use]
pub fn predict_rating(
    global_average: f64,
    user_bias: f64,
    item_bias: f64,
    user_factors: &[f64],
    item_factors: &[f64],
) -> f64 {
    let prediction = global_average + user_bias + item_bias + dot(user_factors, item_factors);
    prediction.max(MIN_RATING).min(MAX_RATING)
}

pub fn adjust_bias(bias: &mut f64, residual_error: f64, learning_rate: f64, regularization: f64) {
    *bias += learning_rate * (residual_error - regularization * *bias);
}

/// Adjusts both factor vectors simultaneously:
/// the item update sees the user factors from before this step.
pub fn adjust_factors(
    user_factors: &mut [f64],
    item_factors: &mut [f64],
    residual_error: f64,
    learning_rate: f64,
    regularization: f64,
) {
    debug_assert_eq!(user_factors.len(), item_factors.len());

    for (user_factor, item_factor) in user_factors.iter_mut().zip(item_factors.iter_mut()) {
        let old_user_factor = *user_factor;
        *user_factor += learning_rate * (residual_error * *item_factor - regularization * *user_factor);
        *item_factor +=
            learning_rate * (residual_error * old_user_factor - regularization * *item_factor);
    }
}

/// Performs a single gradient step on the in-range `(user, item)` pair.
/// Returns the residual error of the prediction made before the step.
pub fn sgd_step(
    model: &mut Model,
    user: usize,
    item: usize,
    rating: f64,
    learning_rate: f64,
    regularization: f64,
) -> f64 {
    debug_assert!(learning_rate >= 0.0);
    debug_assert!(regularization >= 0.0);

    let residual_error = rating - model.predict_indexed(user, item);
    adjust_bias(&mut model.user_biases[user], residual_error, learning_rate, regularization);
    adjust_bias(&mut model.item_biases[item], residual_error, learning_rate, regularization);
    adjust_factors(
        &mut model.user_factors[user],
        &mut model.item_factors[item],
        residual_error,
        learning_rate,
        regularization,
    );
    residual_error
}
