use crate::engine::VariableInstanceQuery;
use crate::query::QuerySpec;

type Q = dyn VariableInstanceQuery;

/// `/variable-instance` filters and sort keys.
pub fn spec() -> QuerySpec<Q> {
    QuerySpec::<Q>::builder("variable-instance")
        .text("variableName", |q, v| q.variable_name(v))
        .text("variableNameLike", |q, v| q.variable_name_like(v))
        .list("processInstanceIdIn", |q, ids| q.process_instance_id_in(ids))
        .list("executionIdIn", |q, ids| q.execution_id_in(ids))
        .list("caseInstanceIdIn", |q, ids| q.case_instance_id_in(ids))
        .list("caseExecutionIdIn", |q, ids| q.case_execution_id_in(ids))
        .list("taskIdIn", |q, ids| q.task_id_in(ids))
        .list("activityInstanceIdIn", |q, ids| q.activity_instance_id_in(ids))
        .list("tenantIdIn", |q, ids| q.tenant_id_in(ids))
        .sort("variableName", |q| q.order_by_variable_name())
        .sort("variableType", |q| q.order_by_variable_type())
        .sort("activityInstanceId", |q| q.order_by_activity_instance_id())
        .sort("tenantId", |q| q.order_by_tenant_id())
        .build()
}
