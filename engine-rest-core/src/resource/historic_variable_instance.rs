use crate::engine::HistoricVariableInstanceQuery;
use crate::query::QuerySpec;

type Q = dyn HistoricVariableInstanceQuery;

pub const VALUE_WITHOUT_NAME: &str = "Only a single variable value parameter specified: variable name and value are required to be able to query after a specific variable value.";

/// `/history/variable-instance` filters and sort keys.
pub fn spec() -> QuerySpec<Q> {
    QuerySpec::<Q>::builder("history/variable-instance")
        .text("processInstanceId", |q, v| q.process_instance_id(v))
        .text("processDefinitionId", |q, v| q.process_definition_id(v))
        .list("executionIdIn", |q, ids| q.execution_id_in(ids))
        .list("taskIdIn", |q, ids| q.task_id_in(ids))
        .list("activityInstanceIdIn", |q, ids| q.activity_instance_id_in(ids))
        .text("caseInstanceId", |q, v| q.case_instance_id(v))
        .text("variableName", |q, v| q.variable_name(v))
        .text("variableNameLike", |q, v| q.variable_name_like(v))
        .paired(
            "variableValue",
            "variableName",
            VALUE_WITHOUT_NAME,
            |q, name, value| q.variable_value_equals(name, value),
        )
        .list("tenantIdIn", |q, ids| q.tenant_id_in(ids))
        .sort("instanceId", |q| q.order_by_process_instance_id())
        .sort("variableName", |q| q.order_by_variable_name())
        .sort("tenantId", |q| q.order_by_tenant_id())
        .build()
}
