use crate::engine::Orderable;
use crate::error::RestError;

pub const SINGLE_SORTING_PARAMETER: &str =
    "Only a single sorting parameter specified. sortBy and sortOrder required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Closed table of `sortBy` keys for one resource, each mapped to the
/// ordering call it triggers. Built once and only read afterwards.
pub struct SortSpec<Q: ?Sized> {
    entries: Vec<(&'static str, fn(&mut Q))>,
}

impl<Q: ?Sized> Default for SortSpec<Q> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<Q: ?Sized> SortSpec<Q> {
    pub(crate) fn register(&mut self, key: &'static str, ordering: fn(&mut Q)) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = ordering,
            None => self.entries.push((key, ordering)),
        }
    }

    pub fn resolve(&self, key: &str) -> Option<fn(&mut Q)> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, ordering)| *ordering)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<Q: Orderable + ?Sized> SortSpec<Q> {
    /// Validate `sortBy`/`sortOrder` and apply them: the resolved ordering
    /// call first, then the direction. Nothing is invoked when validation
    /// fails or both are absent.
    pub fn apply(
        &self,
        query: &mut Q,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> Result<(), RestError> {
        let (key, order) = match (sort_by, sort_order) {
            (None, None) => return Ok(()),
            (Some(key), Some(order)) => (key, order),
            _ => return Err(RestError::invalid_request(SINGLE_SORTING_PARAMETER)),
        };

        let ordering = self.resolve(key).ok_or_else(|| {
            RestError::invalid_request(format!("sortBy parameter has invalid value: {}", key))
        })?;
        let direction = SortOrder::parse(order).ok_or_else(|| {
            RestError::invalid_request(format!("sortOrder parameter has invalid value: {}", order))
        })?;

        tracing::debug!(sort_by = key, sort_order = order, "applying sort");
        ordering(query);
        match direction {
            SortOrder::Asc => query.asc(),
            SortOrder::Desc => query.desc(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Calls(Vec<&'static str>);

    impl Orderable for Calls {
        fn asc(&mut self) {
            self.0.push("asc");
        }
        fn desc(&mut self) {
            self.0.push("desc");
        }
    }

    fn spec() -> SortSpec<Calls> {
        let mut spec = SortSpec::default();
        spec.register("name", |c: &mut Calls| c.0.push("orderByName"));
        spec.register("time", |c: &mut Calls| c.0.push("orderByTime"));
        spec
    }

    #[test]
    fn ordering_precedes_direction() {
        let mut calls = Calls::default();
        spec().apply(&mut calls, Some("time"), Some("desc")).unwrap();
        assert_eq!(calls.0, vec!["orderByTime", "desc"]);
    }

    #[test]
    fn absent_sorting_makes_no_calls() {
        let mut calls = Calls::default();
        spec().apply(&mut calls, None, None).unwrap();
        assert!(calls.0.is_empty());
    }

    #[test]
    fn single_parameter_is_rejected() {
        for (by, order) in [(Some("name"), None), (None, Some("asc"))] {
            let mut calls = Calls::default();
            let err = spec().apply(&mut calls, by, order).unwrap_err();
            assert_eq!(err.to_string(), SINGLE_SORTING_PARAMETER);
            assert_eq!(err.http_status(), 400);
            assert!(calls.0.is_empty());
        }
    }

    #[test]
    fn unknown_key_and_order_are_rejected_without_calls() {
        let mut calls = Calls::default();
        let err = spec().apply(&mut calls, Some("foo"), Some("asc")).unwrap_err();
        assert_eq!(err.to_string(), "sortBy parameter has invalid value: foo");

        let err = spec().apply(&mut calls, Some("name"), Some("up")).unwrap_err();
        assert_eq!(err.to_string(), "sortOrder parameter has invalid value: up");
        assert!(calls.0.is_empty());
    }

    #[test]
    fn keys_keep_registration_order() {
        assert_eq!(spec().keys().collect::<Vec<_>>(), vec!["name", "time"]);
    }
}
