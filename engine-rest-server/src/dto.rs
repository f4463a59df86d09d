//! Request and response bodies.
//!
//! Response DTOs are built from engine records; variable values are encoded
//! by the shared codec and flattened into the record so they appear as
//! top-level `value`, `type` and `valueInfo` fields.

use std::collections::BTreeMap;

use engine_rest_core::engine::{
    CleanableProcessInstanceReportResult, HistoricIdentityLinkLog, HistoricVariableInstance,
    VariableInstance,
};
use engine_rest_core::value::{format_date, EncodeOptions, ValueCodec, VariableValueDto};
use serde::{Deserialize, Serialize};

// ── Requests ─────────────────────────────────────────────────

/// Body of `POST /case-execution/{id}/variables`. A missing or `null`
/// `deletions` is distinct from an empty list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchVariablesDto {
    #[serde(default)]
    pub modifications: Option<BTreeMap<String, VariableValueDto>>,
    #[serde(default)]
    pub deletions: Option<Vec<String>>,
}

/// Body of the case execution lifecycle endpoints. Entries flagged `local`
/// apply to the execution itself rather than the visible scope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseExecutionTriggerDto {
    #[serde(default)]
    pub variables: Option<BTreeMap<String, TriggerVariableValueDto>>,
    #[serde(default)]
    pub deletions: Option<Vec<VariableNameDto>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerVariableValueDto {
    #[serde(flatten)]
    pub value: VariableValueDto,
    #[serde(default)]
    pub local: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableNameDto {
    pub name: String,
    #[serde(default)]
    pub local: bool,
}

// ── Responses ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CountResultDto {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableInstanceDto {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub value: VariableValueDto,
    pub process_instance_id: Option<String>,
    pub execution_id: Option<String>,
    pub case_instance_id: Option<String>,
    pub case_execution_id: Option<String>,
    pub task_id: Option<String>,
    pub activity_instance_id: Option<String>,
    pub tenant_id: Option<String>,
    pub error_message: Option<String>,
}

impl VariableInstanceDto {
    pub fn from_instance(
        instance: &VariableInstance,
        codec: &ValueCodec,
        options: EncodeOptions,
    ) -> Self {
        Self {
            id: instance.id.clone(),
            name: instance.name.clone(),
            value: codec.encode(&instance.value, options),
            process_instance_id: instance.process_instance_id.clone(),
            execution_id: instance.execution_id.clone(),
            case_instance_id: instance.case_instance_id.clone(),
            case_execution_id: instance.case_execution_id.clone(),
            task_id: instance.task_id.clone(),
            activity_instance_id: instance.activity_instance_id.clone(),
            tenant_id: instance.tenant_id.clone(),
            error_message: instance.error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricVariableInstanceDto {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub value: VariableValueDto,
    pub process_definition_key: Option<String>,
    pub process_definition_id: Option<String>,
    pub process_instance_id: Option<String>,
    pub execution_id: Option<String>,
    pub activity_instance_id: Option<String>,
    pub case_definition_key: Option<String>,
    pub case_definition_id: Option<String>,
    pub case_instance_id: Option<String>,
    pub case_execution_id: Option<String>,
    pub task_id: Option<String>,
    pub tenant_id: Option<String>,
    pub error_message: Option<String>,
    pub state: String,
    pub create_time: Option<String>,
}

impl HistoricVariableInstanceDto {
    pub fn from_instance(
        instance: &HistoricVariableInstance,
        codec: &ValueCodec,
        options: EncodeOptions,
    ) -> Self {
        Self {
            id: instance.id.clone(),
            name: instance.name.clone(),
            value: codec.encode(&instance.value, options),
            process_definition_key: instance.process_definition_key.clone(),
            process_definition_id: instance.process_definition_id.clone(),
            process_instance_id: instance.process_instance_id.clone(),
            execution_id: instance.execution_id.clone(),
            activity_instance_id: instance.activity_instance_id.clone(),
            case_definition_key: instance.case_definition_key.clone(),
            case_definition_id: instance.case_definition_id.clone(),
            case_instance_id: instance.case_instance_id.clone(),
            case_execution_id: instance.case_execution_id.clone(),
            task_id: instance.task_id.clone(),
            tenant_id: instance.tenant_id.clone(),
            error_message: instance.error_message.clone(),
            state: instance.state.clone(),
            create_time: instance.create_time.as_ref().map(format_date),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricIdentityLinkLogDto {
    pub id: String,
    pub time: String,
    #[serde(rename = "type")]
    pub link_type: Option<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub task_id: Option<String>,
    pub process_definition_id: Option<String>,
    pub process_definition_key: Option<String>,
    pub operation_type: Option<String>,
    pub assigner_id: Option<String>,
    pub tenant_id: Option<String>,
}

impl From<&HistoricIdentityLinkLog> for HistoricIdentityLinkLogDto {
    fn from(log: &HistoricIdentityLinkLog) -> Self {
        Self {
            id: log.id.clone(),
            time: format_date(&log.time),
            link_type: log.link_type.clone(),
            user_id: log.user_id.clone(),
            group_id: log.group_id.clone(),
            task_id: log.task_id.clone(),
            process_definition_id: log.process_definition_id.clone(),
            process_definition_key: log.process_definition_key.clone(),
            operation_type: log.operation_type.clone(),
            assigner_id: log.assigner_id.clone(),
            tenant_id: log.tenant_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanableProcessInstanceReportResultDto {
    pub process_definition_id: String,
    pub process_definition_key: String,
    pub process_definition_name: Option<String>,
    pub process_definition_version: i32,
    pub history_time_to_live: Option<i32>,
    pub finished_process_instance_count: i64,
    pub cleanable_process_instance_count: i64,
    pub tenant_id: Option<String>,
}

impl From<&CleanableProcessInstanceReportResult> for CleanableProcessInstanceReportResultDto {
    fn from(row: &CleanableProcessInstanceReportResult) -> Self {
        Self {
            process_definition_id: row.process_definition_id.clone(),
            process_definition_key: row.process_definition_key.clone(),
            process_definition_name: row.process_definition_name.clone(),
            process_definition_version: row.process_definition_version,
            history_time_to_live: row.history_time_to_live,
            finished_process_instance_count: row.finished_process_instance_count,
            cleanable_process_instance_count: row.cleanable_process_instance_count,
            tenant_id: row.tenant_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_rest_core::value::TypedValue;
    use serde_json::json;

    #[test]
    fn variable_value_is_flattened() {
        let mut instance = VariableInstance::new("v1", "amount", TypedValue::integer(5));
        instance.process_instance_id = Some("pi".into());
        let dto = VariableInstanceDto::from_instance(
            &instance,
            &ValueCodec::default(),
            EncodeOptions::default(),
        );

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["id"], "v1");
        assert_eq!(json["value"], 5);
        assert_eq!(json["type"], "Integer");
        assert_eq!(json["processInstanceId"], "pi");
        assert_eq!(json["tenantId"], json!(null));
    }

    #[test]
    fn patch_distinguishes_null_from_empty_deletions() {
        let absent: PatchVariablesDto = serde_json::from_value(json!({})).unwrap();
        assert!(absent.deletions.is_none());
        let null: PatchVariablesDto = serde_json::from_value(json!({"deletions": null})).unwrap();
        assert!(null.deletions.is_none());
        let empty: PatchVariablesDto = serde_json::from_value(json!({"deletions": []})).unwrap();
        assert_eq!(empty.deletions, Some(vec![]));
    }

    #[test]
    fn trigger_body_carries_local_flags() {
        let dto: CaseExecutionTriggerDto = serde_json::from_value(json!({
            "variables": {
                "aKey": {"value": 123, "type": "Integer"},
                "anotherKey": {"value": "abc", "type": "String", "local": true}
            },
            "deletions": [{"name": "gone"}, {"name": "mine", "local": true}]
        }))
        .unwrap();

        let variables = dto.variables.unwrap();
        assert!(!variables["aKey"].local);
        assert_eq!(variables["aKey"].value.type_name.as_deref(), Some("Integer"));
        assert!(variables["anotherKey"].local);
        assert_eq!(variables["anotherKey"].value.value, json!("abc"));

        let deletions = dto.deletions.unwrap();
        assert_eq!(deletions[0].name, "gone");
        assert!(!deletions[0].local);
        assert!(deletions[1].local);
    }

    #[test]
    fn identity_link_uses_wire_names() {
        let log = HistoricIdentityLinkLog {
            id: "l1".into(),
            time: engine_rest_core::value::parse_date("2014-04-28T10:00:00").unwrap(),
            link_type: Some("assignee".into()),
            user_id: Some("demo".into()),
            group_id: None,
            task_id: None,
            process_definition_id: None,
            process_definition_key: None,
            operation_type: Some("add".into()),
            assigner_id: None,
            tenant_id: None,
        };
        let json = serde_json::to_value(HistoricIdentityLinkLogDto::from(&log)).unwrap();
        assert_eq!(json["type"], "assignee");
        assert_eq!(json["time"], "2014-04-28T10:00:00");
        assert_eq!(json["operationType"], "add");
    }
}
