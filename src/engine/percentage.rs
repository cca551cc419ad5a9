use std::{fmt::Display, ops::Deref, str::FromStr};

use anyhow::anyhow;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. {
            None
        } else {
            Some(Percentage(value))
        }
    }

    pub fn zero() -> Percentage {
        Percentage(0.)
    }
}

impl FromStr for Percentage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // This means that 100%% also works, but I think I'm fine with that
        let s = s.trim_end_matches("%");
        let v = s.parse::<f64>()?;
        Percentage::new_opt(v).ok_or_else(|| anyhow!("Can't parse {s} into percentage"))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Performance of a single record: target over actual, so finishing faster than the
/// target yields more than 100%. An actual duration of zero is a defined zero-result
/// case rather than an error, and callers treat 0% as a valid value.
pub fn performance_percentage(target_minutes: f64, actual_minutes: f64) -> Percentage {
    if actual_minutes > 0. {
        Percentage::new_opt(target_minutes / actual_minutes * 100.)
            .expect("Percentage should always be at least 0")
    } else {
        Percentage::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::{performance_percentage, Percentage};

    #[test]
    fn formula_is_target_over_actual() {
        assert_eq!(*performance_percentage(60., 45.), 60. / 45. * 100.);
        assert_eq!(*performance_percentage(60., 90.), 60. / 90. * 100.);
        assert_eq!(*performance_percentage(30., 30.), 100.);
    }

    #[test]
    fn faster_than_target_exceeds_hundred() {
        let value = *performance_percentage(60., 45.);
        assert!((value - 133.33).abs() < 0.01);

        let value = *performance_percentage(60., 90.);
        assert!((value - 66.67).abs() < 0.01);
    }

    #[test]
    fn zero_actual_is_zero_not_error() {
        assert_eq!(*performance_percentage(60., 0.), 0.);
        assert_eq!(*performance_percentage(0.5, 0.), 0.);
    }

    #[test]
    fn parses_with_and_without_suffix() {
        assert_eq!("85%".parse::<Percentage>().unwrap(), Percentage(85.));
        assert_eq!("133.5".parse::<Percentage>().unwrap(), Percentage(133.5));
        assert!("-5".parse::<Percentage>().is_err());
    }
}
