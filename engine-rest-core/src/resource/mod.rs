//! Filter and sort tables for each queryable resource.

pub mod cleanable_report;
pub mod historic_variable_instance;
pub mod identity_link_log;
pub mod variable_instance;

use crate::engine::{
    CleanableHistoricProcessInstanceReport, HistoricIdentityLinkLogQuery,
    HistoricVariableInstanceQuery, VariableInstanceQuery,
};
use crate::query::QuerySpec;

/// Every resource table, built once before requests are served and shared
/// read-only afterwards.
pub struct ResourceSpecs {
    pub variable_instances: QuerySpec<dyn VariableInstanceQuery>,
    pub historic_variable_instances: QuerySpec<dyn HistoricVariableInstanceQuery>,
    pub identity_link_logs: QuerySpec<dyn HistoricIdentityLinkLogQuery>,
    pub cleanable_reports: QuerySpec<dyn CleanableHistoricProcessInstanceReport>,
}

impl ResourceSpecs {
    pub fn new() -> Self {
        Self {
            variable_instances: variable_instance::spec(),
            historic_variable_instances: historic_variable_instance::spec(),
            identity_link_logs: identity_link_log::spec(),
            cleanable_reports: cleanable_report::spec(),
        }
    }
}

impl Default for ResourceSpecs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ProcessEngine;
    use crate::query::QueryParameters;
    use crate::test_utils::RecordingEngine;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> QueryParameters {
        QueryParameters::from_query_pairs(pairs.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn report_binds_only_given_filters_then_lists() {
        let engine = RecordingEngine::new();
        let specs = ResourceSpecs::new();
        let mut report = engine.create_cleanable_historic_process_instance_report();

        specs
            .cleanable_reports
            .list(
                report.as_mut(),
                &params(&[
                    ("processDefinitionIdIn", "a,b"),
                    ("processDefinitionKeyIn", "c,d"),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(
            engine.journal().calls(),
            vec![
                "processDefinitionIdIn(a,b)",
                "processDefinitionKeyIn(c,d)",
                "list()"
            ]
        );
    }

    #[tokio::test]
    async fn report_flags_and_count() {
        let engine = RecordingEngine::new();
        let specs = ResourceSpecs::new();
        let mut report = engine.create_cleanable_historic_process_instance_report();

        let body = QueryParameters::from_json_body(json!({
            "withoutTenantId": true,
            "compact": false,
            "tenantIdIn": ["t1", "t2"]
        }))
        .unwrap();
        specs
            .cleanable_reports
            .count(report.as_mut(), &body)
            .await
            .unwrap();

        assert_eq!(
            engine.journal().calls(),
            vec!["tenantIdIn(t1,t2)", "withoutTenantId()", "count()"]
        );
    }

    #[tokio::test]
    async fn report_has_no_sort_keys() {
        let engine = RecordingEngine::new();
        let specs = ResourceSpecs::new();
        assert!(specs.cleanable_reports.sorting().is_empty());

        let mut report = engine.create_cleanable_historic_process_instance_report();
        let err = specs
            .cleanable_reports
            .list(
                report.as_mut(),
                &params(&[("sortBy", "finished"), ("sortOrder", "asc")]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "sortBy parameter has invalid value: finished");
        assert!(engine.journal().calls().is_empty());
    }

    #[tokio::test]
    async fn variable_instance_sorting() {
        let engine = RecordingEngine::new();
        let specs = ResourceSpecs::new();
        let mut query = engine.create_variable_instance_query();

        specs
            .variable_instances
            .list(
                query.as_mut(),
                &params(&[
                    ("variableName", "foo"),
                    ("sortBy", "variableName"),
                    ("sortOrder", "asc"),
                    ("maxResults", "10"),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(
            engine.journal().calls(),
            vec![
                "variableName(foo)",
                "orderByVariableName()",
                "asc()",
                "listPage(0,10)"
            ]
        );
    }

    #[tokio::test]
    async fn every_variable_instance_sort_key_resolves() {
        let specs = ResourceSpecs::new();
        let keys: Vec<_> = specs.variable_instances.sorting().keys().collect();
        assert_eq!(
            keys,
            vec!["variableName", "variableType", "activityInstanceId", "tenantId"]
        );

        for (key, expected) in [
            ("variableType", "orderByVariableType()"),
            ("activityInstanceId", "orderByActivityInstanceId()"),
            ("tenantId", "orderByTenantId()"),
        ] {
            let engine = RecordingEngine::new();
            let mut query = engine.create_variable_instance_query();
            specs
                .variable_instances
                .apply(query.as_mut(), &params(&[("sortBy", key), ("sortOrder", "desc")]))
                .unwrap();
            assert_eq!(engine.journal().calls(), vec![expected, "desc()"]);
        }
    }

    #[tokio::test]
    async fn historic_variable_value_needs_name() {
        let engine = RecordingEngine::new();
        let specs = ResourceSpecs::new();
        let mut query = engine.create_historic_variable_instance_query();

        let err = specs
            .historic_variable_instances
            .list(query.as_mut(), &params(&[("variableValue", "42")]))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            historic_variable_instance::VALUE_WITHOUT_NAME
        );
        assert_eq!(err.http_status(), 400);

        let mut query = engine.create_historic_variable_instance_query();
        specs
            .historic_variable_instances
            .list(
                query.as_mut(),
                &params(&[("variableValue", "42"), ("variableName", "amount")]),
            )
            .await
            .unwrap();
        assert_eq!(
            engine.journal().calls(),
            vec![
                "variableName(amount)",
                "variableValueEquals(amount,42)",
                "list()"
            ]
        );
    }

    #[tokio::test]
    async fn identity_link_dates_are_parsed() {
        let engine = RecordingEngine::new();
        let specs = ResourceSpecs::new();
        let mut query = engine.create_historic_identity_link_log_query();

        specs
            .identity_link_logs
            .list(
                query.as_mut(),
                &params(&[
                    ("type", "assignee"),
                    ("dateBefore", "2014-04-28T10:00:00"),
                    ("sortBy", "time"),
                    ("sortOrder", "desc"),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(
            engine.journal().calls(),
            vec![
                "type(assignee)",
                "dateBefore(2014-04-28T10:00:00)",
                "orderByTime()",
                "desc()",
                "list()"
            ]
        );
    }

    #[test]
    fn identity_link_declares_every_filter() {
        let specs = ResourceSpecs::new();
        let names: Vec<_> = specs.identity_link_logs.filter_names().collect();
        assert_eq!(names.len(), 11);
        assert_eq!(specs.identity_link_logs.sorting().keys().count(), 10);
    }
}
