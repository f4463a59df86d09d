use crate::engine::CleanableHistoricProcessInstanceReport;
use crate::query::QuerySpec;

type Q = dyn CleanableHistoricProcessInstanceReport;

/// `/history/process-definition/cleanable-process-instance-report`. The
/// report has no sort keys.
pub fn spec() -> QuerySpec<Q> {
    QuerySpec::<Q>::builder("cleanable-process-instance-report")
        .list("processDefinitionIdIn", |q, ids| q.process_definition_id_in(ids))
        .list("processDefinitionKeyIn", |q, keys| q.process_definition_key_in(keys))
        .list("tenantIdIn", |q, ids| q.tenant_id_in(ids))
        .flag("withoutTenantId", |q| q.without_tenant_id())
        .flag("compact", |q| q.compact())
        .build()
}
