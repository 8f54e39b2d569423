use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Nominal value paired with a one-sigma standard uncertainty.
///
/// Arithmetic propagates uncertainty with first-order (linear) rules and
/// treats every operand as uncorrelated with every other operand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertainValue {
    nominal: f64,
    std_dev: f64,
}

impl UncertainValue {
    pub fn new(nominal: f64, std_dev: f64) -> Self {
        Self {
            nominal,
            std_dev: std_dev.abs(),
        }
    }

    /// A value known without uncertainty.
    pub fn exact(nominal: f64) -> Self {
        Self::new(nominal, 0.0)
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// `std_dev / |nominal|`, or infinity for a zero nominal value.
    pub fn relative(&self) -> f64 {
        if self.nominal == 0.0 {
            f64::INFINITY
        } else {
            self.std_dev / self.nominal.abs()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.nominal.is_finite() && self.std_dev.is_finite()
    }
}

impl fmt::Display for UncertainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(precision) => write!(
                f,
                "{:.*} +/- {:.*}",
                precision, self.nominal, precision, self.std_dev
            ),
            None => write!(f, "{} +/- {}", self.nominal, self.std_dev),
        }
    }
}

impl Add for UncertainValue {
    type Output = UncertainValue;

    fn add(self, rhs: UncertainValue) -> UncertainValue {
        UncertainValue::new(
            self.nominal + rhs.nominal,
            self.std_dev.hypot(rhs.std_dev),
        )
    }
}

impl Sub for UncertainValue {
    type Output = UncertainValue;

    fn sub(self, rhs: UncertainValue) -> UncertainValue {
        UncertainValue::new(
            self.nominal - rhs.nominal,
            self.std_dev.hypot(rhs.std_dev),
        )
    }
}

impl Mul for UncertainValue {
    type Output = UncertainValue;

    fn mul(self, rhs: UncertainValue) -> UncertainValue {
        // Absolute form keeps zero nominals well defined.
        let from_lhs = rhs.nominal * self.std_dev;
        let from_rhs = self.nominal * rhs.std_dev;
        UncertainValue::new(self.nominal * rhs.nominal, from_lhs.hypot(from_rhs))
    }
}

impl Div for UncertainValue {
    type Output = UncertainValue;

    fn div(self, rhs: UncertainValue) -> UncertainValue {
        let from_lhs = self.std_dev / rhs.nominal;
        let from_rhs = self.nominal * rhs.std_dev / (rhs.nominal * rhs.nominal);
        UncertainValue::new(self.nominal / rhs.nominal, from_lhs.hypot(from_rhs))
    }
}

impl Neg for UncertainValue {
    type Output = UncertainValue;

    fn neg(self) -> UncertainValue {
        UncertainValue::new(-self.nominal, self.std_dev)
    }
}

impl Add<f64> for UncertainValue {
    type Output = UncertainValue;

    fn add(self, rhs: f64) -> UncertainValue {
        UncertainValue::new(self.nominal + rhs, self.std_dev)
    }
}

impl Add<UncertainValue> for f64 {
    type Output = UncertainValue;

    fn add(self, rhs: UncertainValue) -> UncertainValue {
        rhs + self
    }
}

impl Sub<f64> for UncertainValue {
    type Output = UncertainValue;

    fn sub(self, rhs: f64) -> UncertainValue {
        UncertainValue::new(self.nominal - rhs, self.std_dev)
    }
}

impl Sub<UncertainValue> for f64 {
    type Output = UncertainValue;

    fn sub(self, rhs: UncertainValue) -> UncertainValue {
        UncertainValue::new(self - rhs.nominal, rhs.std_dev)
    }
}

impl Mul<f64> for UncertainValue {
    type Output = UncertainValue;

    fn mul(self, rhs: f64) -> UncertainValue {
        UncertainValue::new(self.nominal * rhs, self.std_dev * rhs)
    }
}

impl Mul<UncertainValue> for f64 {
    type Output = UncertainValue;

    fn mul(self, rhs: UncertainValue) -> UncertainValue {
        rhs * self
    }
}

impl Div<f64> for UncertainValue {
    type Output = UncertainValue;

    fn div(self, rhs: f64) -> UncertainValue {
        UncertainValue::new(self.nominal / rhs, self.std_dev / rhs)
    }
}

impl Div<UncertainValue> for f64 {
    type Output = UncertainValue;

    fn div(self, rhs: UncertainValue) -> UncertainValue {
        UncertainValue::exact(self) / rhs
    }
}
