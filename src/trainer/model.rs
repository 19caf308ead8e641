use crate::math::vector::Vector;
use crate::prelude::*;
use crate::trainer::loss::Loss;
use crate::trainer::math::{initialize_factors, predict_rating};
use crate::trainer::noise::UniformSource;
use crate::trainer::store::RatingStore;

/// Model parameters: global average, biases and latent factors.
///
/// Rows are indexed by user and item IDs.
#[derive(Debug, Clone)]
pub struct Model {
    pub global_average: f64,
    pub user_biases: Vec<f64>,
    pub item_biases: Vec<f64>,
    pub user_factors: Vec<Vector>,
    pub item_factors: Vec<Vector>,
}

impl Model {
    /// Zero biases and small random factors.
    pub fn initialize(
        n_users: usize,
        n_items: usize,
        n_factors: usize,
        global_average: f64,
        noise: &mut impl UniformSource,
    ) -> Self {
        let user_factors = (0..n_users)
            .map(|_| initialize_factors(n_factors, noise))
            .collect();
        let item_factors = (0..n_items)
            .map(|_| initialize_factors(n_factors, noise))
            .collect();
        Self {
            global_average,
            user_biases: vec![0.0; n_users],
            item_biases: vec![0.0; n_items],
            user_factors,
            item_factors,
        }
    }

    pub fn n_users(&self) -> usize {
        self.user_factors.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_factors.len()
    }

    /// Predicts the rating, falling back to the global average for unknown users and items.
    #[must_use]
    pub fn predict(&self, user_id: i64, item_id: i64) -> f64 {
        match (to_index(user_id, self.n_users()), to_index(item_id, self.n_items())) {
            (Some(user), Some(item)) => self.predict_indexed(user, item),
            _ => self.global_average,
        }
    }

    #[instrument(skip_all, fields(n_queries = queries.len()))]
    pub fn predict_all(&self, queries: &[(i64, i64)]) -> Vec<f64> {
        queries
            .iter()
            .map(|(user_id, item_id)| self.predict(*user_id, *item_id))
            .collect()
    }

    pub(crate) fn predict_indexed(&self, user: usize, item: usize) -> f64 {
        predict_rating(
            self.global_average,
            self.user_biases[user],
            self.item_biases[item],
            &self.user_factors[user],
            &self.item_factors[item],
        )
    }

    /// Squared-error loss over the stored ratings.
    pub fn evaluate(&self, store: &RatingStore) -> Loss {
        let mut loss = Loss::default();
        for rating in store.iter() {
            loss.push(rating.rating - self.predict(rating.user_id.into(), rating.item_id.into()));
        }
        loss
    }

    pub fn is_finite(&self) -> bool {
        self.global_average.is_finite()
            && self.user_biases.iter().all(|bias| bias.is_finite())
            && self.item_biases.iter().all(|bias| bias.is_finite())
            && self.user_factors.iter().flatten().all(|factor| factor.is_finite())
            && self.item_factors.iter().flatten().all(|factor| factor.is_finite())
    }
}

fn to_index(id: i64, length: usize) -> Option<usize> {
    usize::try_from(id).ok().filter(|index| *index < length)
}
