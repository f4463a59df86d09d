//! Generic request-to-query binding.
//!
//! A [`QuerySpec`] is the per-resource table of filters and sort keys. It
//! binds [`QueryParameters`] onto an engine query object in a fixed order:
//! declared filters, then sorting, then exactly one execution call.

mod filter;
mod params;
mod sort;

pub use filter::FilterSetter;
pub use params::{conversion_error, QueryParameters, RawParam};
pub use sort::{SortOrder, SortSpec, SINGLE_SORTING_PARAMETER};

use crate::engine::Query;
use crate::error::RestError;
use chrono::NaiveDateTime;
use filter::FilterBinding;
use tracing::{debug, warn};

pub struct QuerySpec<Q: ?Sized> {
    resource: &'static str,
    filters: Vec<FilterBinding<Q>>,
    sorting: SortSpec<Q>,
}

impl<Q: ?Sized> QuerySpec<Q> {
    pub fn builder(resource: &'static str) -> QuerySpecBuilder<Q> {
        QuerySpecBuilder {
            spec: QuerySpec {
                resource,
                filters: Vec::new(),
                sorting: SortSpec::default(),
            },
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn sorting(&self) -> &SortSpec<Q> {
        &self.sorting
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.iter().map(|f| f.name)
    }
}

impl<Q: Query + ?Sized> QuerySpec<Q> {
    /// Bind filters in declaration order, then validate and apply sorting.
    pub fn apply(&self, query: &mut Q, params: &QueryParameters) -> Result<(), RestError> {
        let mut bound = 0usize;
        for filter in &self.filters {
            if filter.bind(query, params)? {
                bound += 1;
            }
        }
        debug!(resource = self.resource, filters = bound, "bound query filters");

        self.sorting
            .apply(query, params.sort_by.as_deref(), params.sort_order.as_deref())
    }

    /// Apply `params` and list. Unpaged when neither `firstResult` nor
    /// `maxResults` is given; otherwise paged with missing bounds defaulted
    /// to `0` and `i32::MAX`.
    pub async fn list(
        &self,
        query: &mut Q,
        params: &QueryParameters,
    ) -> Result<Vec<Q::Item>, RestError> {
        self.apply(query, params)?;

        let result = if params.is_paged() {
            let first = params.first_result.unwrap_or(0);
            let max = params.max_results.unwrap_or(i32::MAX);
            debug!(resource = self.resource, first, max, "executing paged query");
            query.list_page(first, max).await
        } else {
            debug!(resource = self.resource, "executing unpaged query");
            query.list().await
        };

        result.map_err(|e| {
            warn!(resource = self.resource, error = %e, "engine query failed");
            RestError::from(e)
        })
    }

    pub async fn count(&self, query: &mut Q, params: &QueryParameters) -> Result<u64, RestError> {
        self.apply(query, params)?;
        query.count().await.map_err(|e| {
            warn!(resource = self.resource, error = %e, "engine count failed");
            RestError::from(e)
        })
    }
}

/// Declares a [`QuerySpec`]. Filters bind in the order they are declared.
pub struct QuerySpecBuilder<Q: ?Sized> {
    spec: QuerySpec<Q>,
}

impl<Q: ?Sized> QuerySpecBuilder<Q> {
    fn filter(mut self, name: &'static str, setter: FilterSetter<Q>) -> Self {
        self.spec.filters.push(FilterBinding { name, setter });
        self
    }

    pub fn text(self, name: &'static str, set: fn(&mut Q, &str)) -> Self {
        self.filter(name, FilterSetter::Text(set))
    }

    pub fn list(self, name: &'static str, set: fn(&mut Q, &[String])) -> Self {
        self.filter(name, FilterSetter::List(set))
    }

    pub fn flag(self, name: &'static str, set: fn(&mut Q)) -> Self {
        self.filter(name, FilterSetter::Flag(set))
    }

    pub fn date(self, name: &'static str, set: fn(&mut Q, NaiveDateTime)) -> Self {
        self.filter(name, FilterSetter::Date(set))
    }

    /// A filter only valid together with `partner`; `apply` receives the
    /// partner's value first.
    pub fn paired(
        self,
        name: &'static str,
        partner: &'static str,
        message: &'static str,
        apply: fn(&mut Q, &str, &str),
    ) -> Self {
        self.filter(
            name,
            FilterSetter::Paired {
                partner,
                message,
                apply,
            },
        )
    }

    pub fn sort(mut self, key: &'static str, ordering: fn(&mut Q)) -> Self {
        self.spec.sorting.register(key, ordering);
        self
    }

    pub fn build(self) -> QuerySpec<Q> {
        self.spec
    }
}
