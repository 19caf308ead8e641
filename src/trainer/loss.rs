/// Squared-error loss.
#[derive(Default, Copy, Clone)]
pub struct Loss {
    squared_error: f64,
    count: usize,
}

impl Loss {
    pub fn push(&mut self, residual_error: f64) {
        self.squared_error += residual_error * residual_error;
        self.count += 1;
    }

    #[must_use]
    pub fn mse(&self) -> f64 {
        self.squared_error / self.count.max(1) as f64
    }

    #[must_use]
    pub fn rmse(&self) -> f64 {
        self.mse().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_loss_ok() {
        assert_eq!(Loss::default().mse(), 0.0);
        assert_eq!(Loss::default().rmse(), 0.0);
    }

    #[test]
    fn loss_ok() {
        let mut loss = Loss::default();
        loss.push(1.0);
        loss.push(-3.0);
        assert!((loss.mse() - 5.0).abs() < f64::EPSILON);
        assert!((loss.rmse() - 5.0_f64.sqrt()).abs() < f64::EPSILON);
    }
}
