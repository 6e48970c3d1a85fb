use chrono::NaiveDate;
use thiserror::Error;

/// Fatal errors raised while generating a dataset.
///
/// None of these are retried: a run that fails is expected to be fixed
/// at the configuration level and started again from scratch.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// A child tier was requested before any parent record existed.
    #[error("cannot build {entity}: no {parent} records exist")]
    EmptyParentPopulation {
        entity: &'static str,
        parent: &'static str,
    },

    /// A record references a parent id that is not in the parent collection.
    #[error("{entity} references missing {parent} id {id}")]
    UnresolvedForeignKey {
        entity: &'static str,
        parent: &'static str,
        id: u64,
    },

    #[error("invalid date range for {context}: {end} is before {start}")]
    InvalidDateRange {
        context: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sink error: {0}")]
    Sink(#[from] anyhow::Error),
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// Checks that `end` does not precede `start`.
pub fn check_date_range(context: &str, start: NaiveDate, end: NaiveDate) -> GenerationResult<()> {
    if end < start {
        return Err(GenerationError::InvalidDateRange {
            context: context.to_string(),
            start,
            end,
        });
    }
    Ok(())
}

/// Checks that a uniform range is well formed (`min <= max`, both finite).
pub fn check_range(name: &str, (min, max): (f64, f64)) -> GenerationResult<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(GenerationError::InvalidConfig(format!(
            "{} range ({}, {}) is not a valid interval",
            name, min, max
        )));
    }
    Ok(())
}

/// Checks that a daily event probability lies in [0, 1].
pub fn check_probability(name: &str, p: f64) -> GenerationResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(GenerationError::InvalidConfig(format!(
            "{} probability {} is outside [0, 1]",
            name, p
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_date_range_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        let err = check_date_range("horizon", start, end).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidDateRange { .. }));
        assert!(err.to_string().contains("horizon"));
    }

    #[test]
    fn single_day_range_is_valid() {
        let day = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        assert!(check_date_range("horizon", day, day).is_ok());
    }

    #[test]
    fn probability_bounds() {
        assert!(check_probability("outage", 0.0).is_ok());
        assert!(check_probability("outage", 1.0).is_ok());
        assert!(check_probability("outage", 1.5).is_err());
        assert!(check_probability("outage", f64::NAN).is_err());
    }

    #[test]
    fn inverted_uniform_range_is_rejected() {
        assert!(check_range("tariff", (0.2, 0.1)).is_err());
        assert!(check_range("tariff", (0.1, 0.1)).is_ok());
    }
}
