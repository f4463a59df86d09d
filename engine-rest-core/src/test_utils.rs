//! Call-recording engine doubles.
//!
//! Available behind the `test-utils` feature flag. Every interaction with a
//! query object or command builder is appended to a shared [`Journal`] as
//! text such as `processDefinitionIdIn(a,b)`, `orderByVariableName()`,
//! `asc()` or `listPage(0,10)`, so tests can assert exact call sequences.

use crate::engine::*;
use crate::error::EngineError;
use crate::value::TypedValue;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Shared, ordered record of engine interactions.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, call: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

fn joined(values: &[String]) -> String {
    values.join(",")
}

fn scope_suffix(scope: VariableScope) -> &'static str {
    match scope {
        VariableScope::Global => "",
        VariableScope::Local => "Local",
    }
}

// ─── Query double ─────────────────────────────────────────────

pub struct RecordingQuery<T> {
    journal: Journal,
    rows: Vec<T>,
    failure: Option<EngineError>,
}

impl<T> RecordingQuery<T> {
    fn call(&self, call: impl Into<String>) {
        self.journal.record(call);
    }

    fn outcome(&self) -> Result<(), EngineError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl<T> Orderable for RecordingQuery<T> {
    fn asc(&mut self) {
        self.call("asc()");
    }

    fn desc(&mut self) {
        self.call("desc()");
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> Query for RecordingQuery<T> {
    type Item = T;

    async fn list(&self) -> Result<Vec<T>, EngineError> {
        self.call("list()");
        self.outcome()?;
        Ok(self.rows.clone())
    }

    async fn list_page(&self, first_result: i32, max_results: i32) -> Result<Vec<T>, EngineError> {
        self.call(format!("listPage({},{})", first_result, max_results));
        self.outcome()?;
        Ok(self.rows.clone())
    }

    async fn count(&self) -> Result<u64, EngineError> {
        self.call("count()");
        self.outcome()?;
        Ok(self.rows.len() as u64)
    }

    async fn single_result(&self) -> Result<Option<T>, EngineError> {
        self.call("singleResult()");
        self.outcome()?;
        Ok(self.rows.first().cloned())
    }
}

impl VariableInstanceQuery for RecordingQuery<VariableInstance> {
    fn variable_id(&mut self, id: &str) {
        self.call(format!("variableId({})", id));
    }
    fn variable_name(&mut self, name: &str) {
        self.call(format!("variableName({})", name));
    }
    fn variable_name_like(&mut self, pattern: &str) {
        self.call(format!("variableNameLike({})", pattern));
    }
    fn process_instance_id_in(&mut self, ids: &[String]) {
        self.call(format!("processInstanceIdIn({})", joined(ids)));
    }
    fn execution_id_in(&mut self, ids: &[String]) {
        self.call(format!("executionIdIn({})", joined(ids)));
    }
    fn case_instance_id_in(&mut self, ids: &[String]) {
        self.call(format!("caseInstanceIdIn({})", joined(ids)));
    }
    fn case_execution_id_in(&mut self, ids: &[String]) {
        self.call(format!("caseExecutionIdIn({})", joined(ids)));
    }
    fn task_id_in(&mut self, ids: &[String]) {
        self.call(format!("taskIdIn({})", joined(ids)));
    }
    fn activity_instance_id_in(&mut self, ids: &[String]) {
        self.call(format!("activityInstanceIdIn({})", joined(ids)));
    }
    fn tenant_id_in(&mut self, ids: &[String]) {
        self.call(format!("tenantIdIn({})", joined(ids)));
    }
    fn disable_binary_fetching(&mut self) {
        self.call("disableBinaryFetching()");
    }
    fn disable_custom_object_deserialization(&mut self) {
        self.call("disableCustomObjectDeserialization()");
    }
    fn order_by_variable_name(&mut self) {
        self.call("orderByVariableName()");
    }
    fn order_by_variable_type(&mut self) {
        self.call("orderByVariableType()");
    }
    fn order_by_activity_instance_id(&mut self) {
        self.call("orderByActivityInstanceId()");
    }
    fn order_by_tenant_id(&mut self) {
        self.call("orderByTenantId()");
    }
}

impl HistoricVariableInstanceQuery for RecordingQuery<HistoricVariableInstance> {
    fn variable_id(&mut self, id: &str) {
        self.call(format!("variableId({})", id));
    }
    fn process_instance_id(&mut self, id: &str) {
        self.call(format!("processInstanceId({})", id));
    }
    fn process_definition_id(&mut self, id: &str) {
        self.call(format!("processDefinitionId({})", id));
    }
    fn execution_id_in(&mut self, ids: &[String]) {
        self.call(format!("executionIdIn({})", joined(ids)));
    }
    fn task_id_in(&mut self, ids: &[String]) {
        self.call(format!("taskIdIn({})", joined(ids)));
    }
    fn activity_instance_id_in(&mut self, ids: &[String]) {
        self.call(format!("activityInstanceIdIn({})", joined(ids)));
    }
    fn case_instance_id(&mut self, id: &str) {
        self.call(format!("caseInstanceId({})", id));
    }
    fn variable_name(&mut self, name: &str) {
        self.call(format!("variableName({})", name));
    }
    fn variable_name_like(&mut self, pattern: &str) {
        self.call(format!("variableNameLike({})", pattern));
    }
    fn variable_value_equals(&mut self, name: &str, value: &str) {
        self.call(format!("variableValueEquals({},{})", name, value));
    }
    fn tenant_id_in(&mut self, ids: &[String]) {
        self.call(format!("tenantIdIn({})", joined(ids)));
    }
    fn disable_binary_fetching(&mut self) {
        self.call("disableBinaryFetching()");
    }
    fn disable_custom_object_deserialization(&mut self) {
        self.call("disableCustomObjectDeserialization()");
    }
    fn order_by_process_instance_id(&mut self) {
        self.call("orderByProcessInstanceId()");
    }
    fn order_by_variable_name(&mut self) {
        self.call("orderByVariableName()");
    }
    fn order_by_tenant_id(&mut self) {
        self.call("orderByTenantId()");
    }
}

impl HistoricIdentityLinkLogQuery for RecordingQuery<HistoricIdentityLinkLog> {
    fn link_type(&mut self, link_type: &str) {
        self.call(format!("type({})", link_type));
    }
    fn user_id(&mut self, id: &str) {
        self.call(format!("userId({})", id));
    }
    fn group_id(&mut self, id: &str) {
        self.call(format!("groupId({})", id));
    }
    fn date_before(&mut self, date: NaiveDateTime) {
        self.call(format!("dateBefore({})", crate::value::format_date(&date)));
    }
    fn date_after(&mut self, date: NaiveDateTime) {
        self.call(format!("dateAfter({})", crate::value::format_date(&date)));
    }
    fn assigner_id(&mut self, id: &str) {
        self.call(format!("assignerId({})", id));
    }
    fn task_id(&mut self, id: &str) {
        self.call(format!("taskId({})", id));
    }
    fn process_definition_id(&mut self, id: &str) {
        self.call(format!("processDefinitionId({})", id));
    }
    fn process_definition_key(&mut self, key: &str) {
        self.call(format!("processDefinitionKey({})", key));
    }
    fn operation_type(&mut self, operation: &str) {
        self.call(format!("operationType({})", operation));
    }
    fn tenant_id_in(&mut self, ids: &[String]) {
        self.call(format!("tenantIdIn({})", joined(ids)));
    }
    fn order_by_time(&mut self) {
        self.call("orderByTime()");
    }
    fn order_by_type(&mut self) {
        self.call("orderByType()");
    }
    fn order_by_user_id(&mut self) {
        self.call("orderByUserId()");
    }
    fn order_by_group_id(&mut self) {
        self.call("orderByGroupId()");
    }
    fn order_by_assigner_id(&mut self) {
        self.call("orderByAssignerId()");
    }
    fn order_by_task_id(&mut self) {
        self.call("orderByTaskId()");
    }
    fn order_by_process_definition_id(&mut self) {
        self.call("orderByProcessDefinitionId()");
    }
    fn order_by_process_definition_key(&mut self) {
        self.call("orderByProcessDefinitionKey()");
    }
    fn order_by_operation_type(&mut self) {
        self.call("orderByOperationType()");
    }
    fn order_by_tenant_id(&mut self) {
        self.call("orderByTenantId()");
    }
}

impl CleanableHistoricProcessInstanceReport for RecordingQuery<CleanableProcessInstanceReportResult> {
    fn process_definition_id_in(&mut self, ids: &[String]) {
        self.call(format!("processDefinitionIdIn({})", joined(ids)));
    }
    fn process_definition_key_in(&mut self, keys: &[String]) {
        self.call(format!("processDefinitionKeyIn({})", joined(keys)));
    }
    fn tenant_id_in(&mut self, ids: &[String]) {
        self.call(format!("tenantIdIn({})", joined(ids)));
    }
    fn without_tenant_id(&mut self) {
        self.call("withoutTenantId()");
    }
    fn compact(&mut self) {
        self.call("compact()");
    }
}

// ─── Command double ───────────────────────────────────────────

pub struct RecordingCommandBuilder {
    journal: Journal,
    failure: Option<EngineError>,
}

#[async_trait]
impl CaseExecutionCommandBuilder for RecordingCommandBuilder {
    fn set_variable(&mut self, name: &str, value: TypedValue, scope: VariableScope) {
        self.journal.record(format!(
            "setVariable{}({},{})",
            scope_suffix(scope),
            name,
            value.value_type()
        ));
    }

    fn set_variables(&mut self, variables: BTreeMap<String, TypedValue>, scope: VariableScope) {
        let names: Vec<String> = variables.into_keys().collect();
        self.journal
            .record(format!("setVariables{}({})", scope_suffix(scope), joined(&names)));
    }

    fn remove_variable(&mut self, name: &str, scope: VariableScope) {
        self.journal
            .record(format!("removeVariable{}({})", scope_suffix(scope), name));
    }

    fn remove_variables(&mut self, names: &[String], scope: VariableScope) {
        self.journal
            .record(format!("removeVariables{}({})", scope_suffix(scope), joined(names)));
    }

    async fn execute(self: Box<Self>) -> Result<(), EngineError> {
        self.finish("execute()")
    }

    async fn execute_async(self: Box<Self>) -> Result<Batch, EngineError> {
        self.finish("executeAsync()")?;
        Ok(Batch {
            id: "aBatchId".to_string(),
            batch_type: "case-execution-variables".to_string(),
            total_jobs: 1,
        })
    }

    async fn trigger(self: Box<Self>, transition: CaseTransition) -> Result<(), EngineError> {
        self.finish(format!("{}()", transition.name()))
    }
}

impl RecordingCommandBuilder {
    fn finish(self, call: impl Into<String>) -> Result<(), EngineError> {
        self.journal.record(call);
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ─── Engine double ────────────────────────────────────────────

/// Engine whose queries return canned rows and whose every call is journaled.
/// A configured failure is returned by every executing call.
#[derive(Default)]
pub struct RecordingEngine {
    journal: Journal,
    variables: Vec<VariableInstance>,
    historic_variables: Vec<HistoricVariableInstance>,
    identity_links: Vec<HistoricIdentityLinkLog>,
    cleanable_reports: Vec<CleanableProcessInstanceReportResult>,
    case_variables: BTreeMap<String, TypedValue>,
    failure: Option<EngineError>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn with_variable_instances(mut self, rows: Vec<VariableInstance>) -> Self {
        self.variables = rows;
        self
    }

    pub fn with_historic_variable_instances(mut self, rows: Vec<HistoricVariableInstance>) -> Self {
        self.historic_variables = rows;
        self
    }

    pub fn with_identity_link_logs(mut self, rows: Vec<HistoricIdentityLinkLog>) -> Self {
        self.identity_links = rows;
        self
    }

    pub fn with_cleanable_reports(
        mut self,
        rows: Vec<CleanableProcessInstanceReportResult>,
    ) -> Self {
        self.cleanable_reports = rows;
        self
    }

    pub fn with_case_variable(mut self, name: &str, value: TypedValue) -> Self {
        self.case_variables.insert(name.to_string(), value);
        self
    }

    pub fn with_failure(mut self, failure: EngineError) -> Self {
        self.failure = Some(failure);
        self
    }

    fn query<T>(&self, rows: &[T]) -> RecordingQuery<T>
    where
        T: Clone,
    {
        RecordingQuery {
            journal: self.journal.clone(),
            rows: rows.to_vec(),
            failure: self.failure.clone(),
        }
    }

    fn outcome(&self) -> Result<(), EngineError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProcessEngine for RecordingEngine {
    fn create_variable_instance_query(&self) -> Box<dyn VariableInstanceQuery> {
        Box::new(self.query(&self.variables))
    }

    fn create_historic_variable_instance_query(&self) -> Box<dyn HistoricVariableInstanceQuery> {
        Box::new(self.query(&self.historic_variables))
    }

    fn create_historic_identity_link_log_query(&self) -> Box<dyn HistoricIdentityLinkLogQuery> {
        Box::new(self.query(&self.identity_links))
    }

    fn create_cleanable_historic_process_instance_report(
        &self,
    ) -> Box<dyn CleanableHistoricProcessInstanceReport> {
        Box::new(self.query(&self.cleanable_reports))
    }

    fn with_case_execution(&self, case_execution_id: &str) -> Box<dyn CaseExecutionCommandBuilder> {
        self.journal
            .record(format!("withCaseExecution({})", case_execution_id));
        Box::new(RecordingCommandBuilder {
            journal: self.journal.clone(),
            failure: self.failure.clone(),
        })
    }

    async fn case_execution_variables(
        &self,
        case_execution_id: &str,
        scope: VariableScope,
    ) -> Result<BTreeMap<String, TypedValue>, EngineError> {
        self.journal.record(format!(
            "getVariables{}({})",
            scope_suffix(scope),
            case_execution_id
        ));
        self.outcome()?;
        Ok(self.case_variables.clone())
    }

    async fn case_execution_variable(
        &self,
        case_execution_id: &str,
        name: &str,
        scope: VariableScope,
    ) -> Result<Option<TypedValue>, EngineError> {
        self.journal.record(format!(
            "getVariable{}({},{})",
            scope_suffix(scope),
            case_execution_id,
            name
        ));
        self.outcome()?;
        Ok(self.case_variables.get(name).cloned())
    }
}
