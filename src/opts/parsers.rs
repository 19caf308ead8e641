use std::str::FromStr;

use crate::prelude::*;

pub fn non_zero_usize(value: &str) -> Result<usize> {
    match FromStr::from_str(value)? {
        value if value >= 1 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}

pub fn non_zero_u32(value: &str) -> Result<u32> {
    match FromStr::from_str(value)? {
        value if value >= 1 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}

pub fn learning_rate(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value.is_finite() && value > 0.0 => Ok(value),
        value => Err(anyhow!("{} is an invalid learning rate", value)),
    }
}

pub fn regularization(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value.is_finite() && value >= 0.0 => Ok(value),
        value => Err(anyhow!("{} is an invalid regularization parameter", value)),
    }
}
