use super::params::{conversion_error, QueryParameters, RawParam};
use crate::error::RestError;
use chrono::NaiveDateTime;

/// How one declared parameter is converted and handed to the query object.
pub enum FilterSetter<Q: ?Sized> {
    Text(fn(&mut Q, &str)),
    /// Skipped when the list is empty.
    List(fn(&mut Q, &[String])),
    /// Invoked only when the parameter is `true`.
    Flag(fn(&mut Q)),
    Date(fn(&mut Q, NaiveDateTime)),
    /// Needs a second parameter; `message` is reported when it is missing.
    Paired {
        partner: &'static str,
        message: &'static str,
        apply: fn(&mut Q, &str, &str),
    },
}

pub(crate) struct FilterBinding<Q: ?Sized> {
    pub name: &'static str,
    pub setter: FilterSetter<Q>,
}

impl<Q: ?Sized> FilterBinding<Q> {
    /// Apply this filter if its parameter is present.
    pub fn bind(&self, query: &mut Q, params: &QueryParameters) -> Result<bool, RestError> {
        let Some(raw) = params.get(self.name) else {
            return Ok(false);
        };
        let name = self.name;

        match &self.setter {
            FilterSetter::Text(set) => set(query, &text(name, raw)?),
            FilterSetter::List(set) => {
                let values = raw.as_list().ok_or_else(|| conversion_error(name, raw))?;
                if values.is_empty() {
                    return Ok(false);
                }
                set(query, &values);
            }
            FilterSetter::Flag(set) => {
                if !raw.as_bool().ok_or_else(|| conversion_error(name, raw))? {
                    return Ok(false);
                }
                set(query);
            }
            FilterSetter::Date(set) => {
                let date = raw.as_date().ok_or_else(|| conversion_error(name, raw))?;
                set(query, date);
            }
            FilterSetter::Paired {
                partner,
                message,
                apply,
            } => {
                let other = params
                    .get(partner)
                    .ok_or_else(|| RestError::invalid_request(*message))?;
                apply(query, &text(partner, other)?, &text(name, raw)?);
            }
        }
        Ok(true)
    }
}

fn text(name: &str, raw: &RawParam) -> Result<String, RestError> {
    raw.as_text().ok_or_else(|| conversion_error(name, raw))
}
