use rand::Rng;

/// Source of uniformly distributed reals.
pub trait UniformSource {
    /// Returns the next value from `[low, high]`.
    fn next_in_range(&mut self, low: f64, high: f64) -> f64;
}

impl<R: Rng + ?Sized> UniformSource for R {
    fn next_in_range(&mut self, low: f64, high: f64) -> f64 {
        self.gen_range(low..=high)
    }
}
