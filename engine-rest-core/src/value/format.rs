use std::collections::BTreeSet;

pub const JSON_FORMAT: &str = "application/json";
pub const XML_FORMAT: &str = "application/xml";
pub const JAVA_SERIALIZED_FORMAT: &str = "application/x-java-serialized-object";
pub const TEXT_FORMAT: &str = "text/plain";

/// The serialization data formats accepted for custom object variables.
///
/// Built once at startup from static configuration and only read afterwards.
/// The first registered format is the default for objects that do not declare
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFormatRegistry {
    default_format: String,
    formats: BTreeSet<String>,
}

impl DataFormatRegistry {
    /// Registry from configured names. Empty entries are skipped; an empty
    /// list falls back to the built-in formats.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| normalize(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();

        match names.first() {
            Some(first) => Self {
                default_format: first.clone(),
                formats: names.iter().cloned().collect(),
            },
            None => Self::default(),
        }
    }

    /// Parse a comma-separated list of format names.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_supported(&self, format: &str) -> bool {
        self.formats.contains(&normalize(format))
    }

    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.formats.iter().map(String::as_str)
    }

    /// Canonical name for a supported format, `None` otherwise. Media type
    /// parameters such as `; charset=UTF-8` are ignored.
    pub fn resolve(&self, format: &str) -> Option<String> {
        let name = normalize(format);
        self.formats.contains(&name).then_some(name)
    }
}

impl Default for DataFormatRegistry {
    fn default() -> Self {
        Self {
            default_format: JSON_FORMAT.to_string(),
            formats: [JSON_FORMAT, XML_FORMAT, JAVA_SERIALIZED_FORMAT, TEXT_FORMAT]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

fn normalize(format: &str) -> String {
    format
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_builtin_formats() {
        let registry = DataFormatRegistry::default();
        assert!(registry.is_supported(JSON_FORMAT));
        assert!(registry.is_supported(JAVA_SERIALIZED_FORMAT));
        assert!(!registry.is_supported("unsupported"));
        assert_eq!(registry.default_format(), JSON_FORMAT);
    }

    #[test]
    fn media_type_parameters_are_ignored() {
        let registry = DataFormatRegistry::default();
        assert_eq!(
            registry.resolve("Application/JSON; charset=UTF-8").as_deref(),
            Some(JSON_FORMAT)
        );
    }

    #[test]
    fn configured_list_replaces_builtins() {
        let registry = DataFormatRegistry::from_list("application/xml, text/plain");
        assert_eq!(registry.default_format(), XML_FORMAT);
        assert!(registry.is_supported(TEXT_FORMAT));
        assert!(!registry.is_supported(JSON_FORMAT));
    }

    #[test]
    fn empty_list_falls_back_to_builtins() {
        assert_eq!(
            DataFormatRegistry::from_list(" , "),
            DataFormatRegistry::default()
        );
    }
}
