use crate::error::RestError;
use crate::value::parse_date;
use chrono::NaiveDateTime;
use serde_json::Value as Json;
use std::collections::BTreeMap;

pub const FIRST_RESULT: &str = "firstResult";
pub const MAX_RESULTS: &str = "maxResults";
pub const SORT_BY: &str = "sortBy";
pub const SORT_ORDER: &str = "sortOrder";

/// One inbound parameter as it arrived: text from a query string, or a JSON
/// value from a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RawParam {
    Text(String),
    Json(Json),
}

impl RawParam {
    /// Scalar text form. Arrays and objects have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawParam::Text(s) => Some(s.clone()),
            RawParam::Json(Json::String(s)) => Some(s.clone()),
            RawParam::Json(Json::Number(n)) => Some(n.to_string()),
            RawParam::Json(Json::Bool(b)) => Some(b.to_string()),
            RawParam::Json(_) => None,
        }
    }

    /// Comma-delimited text and JSON arrays produce the same ordered list.
    /// Order and duplicates are preserved; empty items are dropped in both forms.
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            RawParam::Json(Json::Array(items)) => items
                .iter()
                .map(|item| RawParam::Json(item.clone()).as_text())
                .filter(|item| item.as_deref() != Some(""))
                .collect(),
            other => other.as_text().map(|s| split_list(&s)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawParam::Json(Json::Bool(b)) => Some(*b),
            other => match other.as_text()?.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            RawParam::Json(Json::Number(n)) => n.as_i64().and_then(|i| i32::try_from(i).ok()),
            other => other.as_text()?.parse().ok(),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        parse_date(&self.as_text()?)
    }

    fn display(&self) -> String {
        match self {
            RawParam::Text(s) | RawParam::Json(Json::String(s)) => s.clone(),
            RawParam::Json(other) => other.to_string(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The error reported when a parameter cannot be converted to the type its
/// filter expects.
pub fn conversion_error(name: &str, raw: &RawParam) -> RestError {
    RestError::invalid_request(format!(
        "Cannot set query parameter '{}' to value '{}'",
        name,
        raw.display()
    ))
}

/// Request-scoped query inputs: declared filters plus paging and sorting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParameters {
    filters: BTreeMap<String, RawParam>,
    pub first_result: Option<i32>,
    pub max_results: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl QueryParameters {
    /// From decoded query-string pairs. When a key repeats, the first value
    /// wins.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self, RestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::default();
        let mut seen: BTreeMap<String, RawParam> = BTreeMap::new();
        for (key, value) in pairs {
            seen.entry(key.into())
                .or_insert_with(|| RawParam::Text(value.into()));
        }
        for (key, raw) in seen {
            params.insert(key, raw)?;
        }
        Ok(params)
    }

    /// From a JSON request body. `null` members count as absent; a `null` or
    /// empty body yields no parameters.
    pub fn from_json_body(body: Json) -> Result<Self, RestError> {
        let members = match body {
            Json::Null => return Ok(Self::default()),
            Json::Object(members) => members,
            other => {
                return Err(RestError::invalid_request(format!(
                    "Expected a JSON object as query body, found: {}",
                    other
                )))
            }
        };
        let mut params = Self::default();
        for (key, value) in members {
            if !value.is_null() {
                params.insert(key, RawParam::Json(value))?;
            }
        }
        Ok(params)
    }

    /// Paging present in `other` overrides this instance's paging.
    pub fn with_paging_from(mut self, other: &QueryParameters) -> Self {
        if other.first_result.is_some() {
            self.first_result = other.first_result;
        }
        if other.max_results.is_some() {
            self.max_results = other.max_results;
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawParam> {
        self.filters.get(name)
    }

    /// A boolean switch outside the filter table, `default` when absent.
    pub fn bool_param(&self, name: &str, default: bool) -> Result<bool, RestError> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw.as_bool().ok_or_else(|| conversion_error(name, raw)),
        }
    }

    pub fn is_paged(&self) -> bool {
        self.first_result.is_some() || self.max_results.is_some()
    }

    fn insert(&mut self, key: String, raw: RawParam) -> Result<(), RestError> {
        match key.as_str() {
            FIRST_RESULT => self.first_result = Some(parse_int(FIRST_RESULT, &raw)?),
            MAX_RESULTS => self.max_results = Some(parse_int(MAX_RESULTS, &raw)?),
            SORT_BY => self.sort_by = Some(parse_text(SORT_BY, &raw)?),
            SORT_ORDER => self.sort_order = Some(parse_text(SORT_ORDER, &raw)?),
            _ => {
                self.filters.insert(key, raw);
            }
        }
        Ok(())
    }
}

fn parse_int(name: &str, raw: &RawParam) -> Result<i32, RestError> {
    raw.as_int().ok_or_else(|| conversion_error(name, raw))
}

fn parse_text(name: &str, raw: &RawParam) -> Result<String, RestError> {
    raw.as_text().ok_or_else(|| conversion_error(name, raw))
}
