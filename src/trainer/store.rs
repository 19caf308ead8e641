use crate::helpers::average::Average;
use crate::prelude::*;

pub type UserId = u32;
pub type ItemId = u32;

/// Single observed rating.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f64,
}

/// Sparse user-item rating matrix.
#[derive(Debug, Default, Clone)]
pub struct RatingStore {
    ratings: AHashMap<UserId, AHashMap<ItemId, f64>>,
    n_users: usize,
    n_items: usize,
}

impl RatingStore {
    /// Stores the rating, replacing any previous rating of the same pair.
    pub fn put(&mut self, user_id: UserId, item_id: ItemId, rating: f64) {
        self.ratings.entry(user_id).or_default().insert(item_id, rating);
        self.n_users = self.n_users.max(user_id as usize + 1);
        self.n_items = self.n_items.max(item_id as usize + 1);
    }

    /// Iterates over the stored ratings ordered by user and item.
    ///
    /// The hash maps iterate in a per-instance random order,
    /// hence the sorting: a seeded training run must not depend on it.
    pub fn iter(&self) -> impl Iterator<Item = Rating> + '_ {
        self.ratings
            .iter()
            .sorted_by_key(|(user_id, _)| **user_id)
            .flat_map(|(&user_id, items)| {
                items
                    .iter()
                    .sorted_by_key(|(item_id, _)| **item_id)
                    .map(move |(&item_id, &rating)| Rating {
                        user_id,
                        item_id,
                        rating,
                    })
            })
    }

    /// One past the largest user ID seen.
    pub const fn n_users(&self) -> usize {
        self.n_users
    }

    /// One past the largest item ID seen.
    pub const fn n_items(&self) -> usize {
        self.n_items
    }

    pub fn len(&self) -> usize {
        self.ratings.values().map(|items| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    #[must_use]
    pub fn mean_rating(&self) -> f64 {
        let mut average = Average::default();
        for rating in self.iter() {
            average.push(rating.rating);
        }
        average.average()
    }
}

impl FromIterator<Rating> for RatingStore {
    fn from_iter<I: IntoIterator<Item = Rating>>(iter: I) -> Self {
        let mut store = Self::default();
        for rating in iter {
            store.put(rating.user_id, rating.item_id, rating.rating);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_ok() {
        let store = RatingStore::default();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.n_users(), 0);
        assert_eq!(store.n_items(), 0);
        assert_eq!(store.mean_rating(), 0.0);
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn dimensions_ok() {
        let mut store = RatingStore::default();
        store.put(3, 0, 4.0);
        store.put(0, 7, 2.0);
        assert_eq!(store.n_users(), 4);
        assert_eq!(store.n_items(), 8);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn last_write_wins() {
        let mut store = RatingStore::default();
        store.put(1, 2, 1.0);
        store.put(1, 2, 5.0);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.iter().collect_vec(),
            vec![Rating {
                user_id: 1,
                item_id: 2,
                rating: 5.0,
            }],
        );
        assert!((store.mean_rating() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mean_rating_ok() {
        let mut store = RatingStore::default();
        store.put(0, 0, 5.0);
        store.put(0, 1, 3.0);
        store.put(1, 0, 4.0);
        assert!((store.mean_rating() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn iter_is_ordered() {
        let store: RatingStore = [(2, 1, 1.0), (0, 5, 2.0), (2, 0, 3.0), (0, 1, 4.0)]
            .into_iter()
            .map(|(user_id, item_id, rating)| Rating {
                user_id,
                item_id,
                rating,
            })
            .collect();
        let pairs = store
            .iter()
            .map(|rating| (rating.user_id, rating.item_id))
            .collect_vec();
        assert_eq!(pairs, vec![(0, 1), (0, 5), (2, 0), (2, 1)]);
    }
}
