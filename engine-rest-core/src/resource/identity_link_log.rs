use crate::engine::HistoricIdentityLinkLogQuery;
use crate::query::QuerySpec;

type Q = dyn HistoricIdentityLinkLogQuery;

/// `/history/identity-link-log` filters and sort keys.
pub fn spec() -> QuerySpec<Q> {
    QuerySpec::<Q>::builder("history/identity-link-log")
        .text("type", |q, v| q.link_type(v))
        .text("userId", |q, v| q.user_id(v))
        .text("groupId", |q, v| q.group_id(v))
        .date("dateBefore", |q, d| q.date_before(d))
        .date("dateAfter", |q, d| q.date_after(d))
        .text("assignerId", |q, v| q.assigner_id(v))
        .text("taskId", |q, v| q.task_id(v))
        .text("processDefinitionId", |q, v| q.process_definition_id(v))
        .text("processDefinitionKey", |q, v| q.process_definition_key(v))
        .text("operationType", |q, v| q.operation_type(v))
        .list("tenantIdIn", |q, ids| q.tenant_id_in(ids))
        .sort("time", |q| q.order_by_time())
        .sort("type", |q| q.order_by_type())
        .sort("userId", |q| q.order_by_user_id())
        .sort("groupId", |q| q.order_by_group_id())
        .sort("assignerId", |q| q.order_by_assigner_id())
        .sort("taskId", |q| q.order_by_task_id())
        .sort("processDefinitionId", |q| q.order_by_process_definition_id())
        .sort("processDefinitionKey", |q| q.order_by_process_definition_key())
        .sort("operationType", |q| q.order_by_operation_type())
        .sort("tenantId", |q| q.order_by_tenant_id())
        .build()
}
