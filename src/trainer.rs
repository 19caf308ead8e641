//! Trains the user and item biases and factors on the observed ratings.
//! Implements a stochastic gradient descent for biased matrix factorization.
//!
//! https://blog.insightdatascience.com/explicit-matrix-factorization-als-sgd-and-all-that-jazz-b00e4d9b21ea

use crate::helpers::tracing::format_elapsed;
use crate::prelude::*;
use crate::trainer::loss::Loss;
use crate::trainer::math::sgd_step;
use crate::trainer::model::Model;
use crate::trainer::noise::UniformSource;
use crate::trainer::store::RatingStore;

pub mod loss;
pub mod math;
pub mod model;
pub mod noise;
pub mod store;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hyperparameters {
    pub n_factors: usize,
    pub n_iterations: usize,
    pub learning_rate: f64,
    pub regularization: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_factors: 9,
            n_iterations: 50,
            learning_rate: 0.015,
            regularization: 0.1,
        }
    }
}

/// Untrained model: the ratings and the hyperparameters.
/// Fitting consumes it, so a model is never trained twice.
pub struct Trainer {
    store: RatingStore,
    hyperparameters: Hyperparameters,
}

impl Trainer {
    pub const fn new(store: RatingStore, hyperparameters: Hyperparameters) -> Self {
        Self {
            store,
            hyperparameters,
        }
    }

    /// Runs exactly `n_iterations` epochs, every epoch visits each rating once.
    #[instrument(
        skip_all,
        fields(
            n_ratings = self.store.len(),
            n_users = self.store.n_users(),
            n_items = self.store.n_items(),
        ),
    )]
    pub fn fit(self, noise: &mut impl UniformSource) -> Result<Model> {
        let Hyperparameters {
            n_factors,
            n_iterations,
            learning_rate,
            regularization,
        } = self.hyperparameters;
        let start_instant = Instant::now();
        if self.store.is_empty() {
            warn!("no training ratings, the model will predict zeroes");
        }

        let mut model = Model::initialize(
            self.store.n_users(),
            self.store.n_items(),
            n_factors,
            self.store.mean_rating(),
            noise,
        );
        info!(global_average = model.global_average, n_factors, "initialized");

        let sample = self
            .store
            .iter()
            .map(|rating| (rating.user_id as usize, rating.item_id as usize, rating.rating))
            .collect_vec();

        for epoch in 1..=n_iterations {
            let mut loss = Loss::default();
            for &(user, item, rating) in &sample {
                loss.push(sgd_step(&mut model, user, item, rating, learning_rate, regularization));
            }
            if !model.is_finite() {
                bail!(
                    "training diverged on epoch #{} (learning rate {}, regularization {})",
                    epoch,
                    learning_rate,
                    regularization,
                );
            }
            debug!(epoch, rmse = loss.rmse(), "epoch finished");
        }

        info!(
            n_iterations,
            rmse = model.evaluate(&self.store).rmse(),
            elapsed = format_elapsed(start_instant).as_str(),
            "trained",
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::trainer::math::{MAX_RATING, MIN_RATING};

    fn store(ratings: &[(u32, u32, f64)]) -> RatingStore {
        let mut store = RatingStore::default();
        for (user_id, item_id, rating) in ratings {
            store.put(*user_id, *item_id, *rating);
        }
        store
    }

    fn sample_store() -> RatingStore {
        store(&[
            (0, 0, 5.0),
            (0, 1, 3.0),
            (0, 3, 1.0),
            (1, 0, 4.0),
            (1, 2, 1.0),
            (2, 1, 2.0),
            (2, 2, 5.0),
            (2, 3, 4.0),
            (3, 0, 1.0),
            (3, 3, 5.0),
        ])
    }

    fn fit(store: RatingStore, n_iterations: usize, seed: u64) -> Model {
        let hyperparameters = Hyperparameters {
            n_iterations,
            ..Default::default()
        };
        Trainer::new(store, hyperparameters)
            .fit(&mut StdRng::seed_from_u64(seed))
            .unwrap()
    }

    #[test]
    fn default_hyperparameters_ok() {
        let hyperparameters = Hyperparameters::default();
        assert_eq!(hyperparameters.n_factors, 9);
        assert_eq!(hyperparameters.n_iterations, 50);
        assert!((hyperparameters.learning_rate - 0.015).abs() < f64::EPSILON);
        assert!((hyperparameters.regularization - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_store_ok() {
        let model = fit(RatingStore::default(), 50, 42);
        assert_eq!(model.global_average, 0.0);
        assert_eq!(model.n_users(), 0);
        assert_eq!(model.n_items(), 0);
        assert_eq!(model.predict(0, 0), 0.0);
        assert_eq!(model.predict(5, 3), 0.0);
    }

    #[test]
    fn shapes_ok() {
        let model = fit(sample_store(), 1, 42);
        assert_eq!(model.n_users(), 4);
        assert_eq!(model.n_items(), 4);
        assert_eq!(model.user_biases.len(), 4);
        assert_eq!(model.item_biases.len(), 4);
        assert!(model
            .user_factors
            .iter()
            .chain(&model.item_factors)
            .all(|factors| factors.len() == 9));
        assert!((model.global_average - 3.1).abs() < 1e-12);
    }

    #[test]
    fn seeded_training_is_deterministic() {
        let model_1 = fit(sample_store(), 50, 42);
        let model_2 = fit(sample_store(), 50, 42);

        let bits = |model: &Model| {
            model
                .user_biases
                .iter()
                .chain(&model.item_biases)
                .chain(model.user_factors.iter().flatten())
                .chain(model.item_factors.iter().flatten())
                .map(|value| value.to_bits())
                .collect_vec()
        };
        assert_eq!(bits(&model_1), bits(&model_2));
        for user_id in 0..4 {
            for item_id in 0..4 {
                assert_eq!(
                    model_1.predict(user_id, item_id).to_bits(),
                    model_2.predict(user_id, item_id).to_bits(),
                );
            }
        }
    }

    #[test]
    fn training_improves_fit() {
        let untrained = fit(sample_store(), 0, 42).evaluate(&sample_store()).mse();
        let trained = fit(sample_store(), 50, 42).evaluate(&sample_store()).mse();
        assert!(trained < untrained, "{} >= {}", trained, untrained);
    }

    #[test]
    fn zero_iterations_keep_initial_parameters() {
        let model = fit(sample_store(), 0, 42);
        assert!(model.user_biases.iter().all(|bias| *bias == 0.0));
        assert!(model.item_biases.iter().all(|bias| *bias == 0.0));
    }

    #[test]
    fn predictions_are_clamped() {
        let model = fit(sample_store(), 50, 7);
        for user_id in 0..4 {
            for item_id in 0..4 {
                let prediction = model.predict(user_id, item_id);
                assert!((MIN_RATING..=MAX_RATING).contains(&prediction), "{}", prediction);
            }
        }
    }

    #[test]
    fn cold_start_falls_back_to_global_average() {
        let model = fit(store(&[(0, 0, 5.0), (1, 1, 2.0)]), 50, 42);
        assert_eq!(model.predict(99, 99), 3.5);
        assert_eq!(model.predict(0, 99), 3.5);
        assert_eq!(model.predict(-1, 0), 3.5);
    }

    #[test]
    fn divergence_is_an_error() {
        let hyperparameters = Hyperparameters {
            learning_rate: 1e10,
            ..Default::default()
        };
        let result = Trainer::new(sample_store(), hyperparameters)
            .fit(&mut StdRng::seed_from_u64(42));
        let error = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(error.contains("diverged on epoch #"), "{}", error);
    }
}
