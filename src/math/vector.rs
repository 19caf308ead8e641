pub type Vector = Vec<f64>;

#[must_use]
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).fold(0.0, |dot, (xi, yi)| dot + xi * yi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_ok() {
        let vector_1 = [1.0, 2.0, 3.0];
        let vector_2 = [3.0, 5.0, -7.0];
        assert!((dot(&vector_1, &vector_2) + 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dot_empty_ok() {
        assert_eq!(dot(&[], &[]), 0.0);
    }
}
