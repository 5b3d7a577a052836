use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Field-keyed validation failures, serialized as the body of a 422 response.
pub type ValidationErrors = BTreeMap<String, String>;

/// Collects rule failures for a decoded request so that a single response can
/// report every violation at once.
///
/// The first message recorded for a field wins; later failures for the same
/// field are ignored.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when no failures have been recorded.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `message` for `key` unless the field already has a failure.
    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(key.into()).or_insert_with(|| message.into());
    }

    /// Records a failure when `ok` is false.
    pub fn check(&mut self, ok: bool, key: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.add_error(key, message);
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Consumes the validator, yielding `Ok(())` when valid or the collected failures.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Returns `true` if `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: T, permitted: impl IntoIterator<Item = T>) -> bool {
    permitted.into_iter().any(|p| p == value)
}

/// Returns `true` if no value appears more than once.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|value| seen.insert(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "name", "must be provided");
        v.check(false, "name", "must not be more than 100 bytes long");
        v.check(true, "description", "must be provided");

        assert!(!v.valid());
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["name"], "must be provided");
    }

    #[test]
    fn accumulates_every_field() {
        let mut v = Validator::new();
        v.check(false, "sets", "must be greater than zero");
        v.check(false, "reps", "must be greater than zero");
        v.add_error("weight", "must not be negative");

        let errors = v.finish().unwrap_err();
        assert_eq!(errors.keys().collect::<Vec<_>>(), ["reps", "sets", "weight"]);
    }

    #[test]
    fn empty_validator_is_valid() {
        assert!(Validator::new().finish().is_ok());
    }

    #[test]
    fn permitted_and_unique_helpers() {
        assert!(permitted_value("date", ["id", "date"]));
        assert!(!permitted_value("Date", ["id", "date"]));
        assert!(unique(&[1, 2, 3]));
        assert!(!unique(&["squat", "row", "squat"]));
        assert!(unique::<i64>(&[]));
    }
}
