#[derive(Default, Copy, Clone)]
pub struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    /// Zero for an empty sample.
    pub fn average(&self) -> f64 {
        if self.count != 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_average_ok() {
        assert_eq!(Average::default().average(), 0.0);
    }

    #[test]
    fn average_ok() {
        let mut average = Average::default();
        average.push(5.0);
        average.push(3.0);
        average.push(4.0);
        assert!((average.average() - 4.0).abs() < f64::EPSILON);
    }
}
