//! Contracts of the wrapped process engine.
//!
//! The REST layer talks to the engine exclusively through these traits:
//! query objects configured by setter calls and executed once, and a command
//! builder for case execution variables. [`MemoryEngine`] is the in-process
//! implementation.

mod memory;

pub use memory::MemoryEngine;

use crate::error::EngineError;
use crate::value::TypedValue;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

// ─── Records ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct VariableInstance {
    pub id: String,
    pub name: String,
    pub value: TypedValue,
    pub process_instance_id: Option<String>,
    pub execution_id: Option<String>,
    pub case_instance_id: Option<String>,
    pub case_execution_id: Option<String>,
    pub task_id: Option<String>,
    pub activity_instance_id: Option<String>,
    pub tenant_id: Option<String>,
    pub error_message: Option<String>,
}

impl VariableInstance {
    pub fn new(id: impl Into<String>, name: impl Into<String>, value: TypedValue) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value,
            process_instance_id: None,
            execution_id: None,
            case_instance_id: None,
            case_execution_id: None,
            task_id: None,
            activity_instance_id: None,
            tenant_id: None,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricVariableInstance {
    pub id: String,
    pub name: String,
    pub value: TypedValue,
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
    pub create_time: Option<NaiveDateTime>,
}

impl HistoricVariableInstance {
    pub fn new(id: impl Into<String>, name: impl Into<String>, value: TypedValue) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value,
            process_definition_key: None,
            process_definition_id: None,
            process_instance_id: None,
            execution_id: None,
            activity_instance_id: None,
            case_definition_key: None,
            case_definition_id: None,
            case_instance_id: None,
            case_execution_id: None,
            task_id: None,
            tenant_id: None,
            error_message: None,
            state: "CREATED".to_string(),
            create_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricIdentityLinkLog {
    pub id: String,
    pub time: NaiveDateTime,
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanableProcessInstanceReportResult {
    pub process_definition_id: String,
    pub process_definition_key: String,
    pub process_definition_name: Option<String>,
    pub process_definition_version: i32,
    pub history_time_to_live: Option<i32>,
    pub finished_process_instance_count: i64,
    pub cleanable_process_instance_count: i64,
    pub tenant_id: Option<String>,
}

// ─── Queries ──────────────────────────────────────────────────

/// Direction calls. They apply to the ordering call made just before.
pub trait Orderable {
    fn asc(&mut self);
    fn desc(&mut self);
}

/// A configured engine query, executed by exactly one of the methods below.
#[async_trait]
pub trait Query: Orderable + Send + Sync {
    type Item: Send;

    async fn list(&self) -> Result<Vec<Self::Item>, EngineError>;
    async fn list_page(&self, first_result: i32, max_results: i32)
        -> Result<Vec<Self::Item>, EngineError>;
    async fn count(&self) -> Result<u64, EngineError>;
    async fn single_result(&self) -> Result<Option<Self::Item>, EngineError>;
}

pub trait VariableInstanceQuery: Query<Item = VariableInstance> {
    fn variable_id(&mut self, id: &str);
    fn variable_name(&mut self, name: &str);
    fn variable_name_like(&mut self, pattern: &str);
    fn process_instance_id_in(&mut self, ids: &[String]);
    fn execution_id_in(&mut self, ids: &[String]);
    fn case_instance_id_in(&mut self, ids: &[String]);
    fn case_execution_id_in(&mut self, ids: &[String]);
    fn task_id_in(&mut self, ids: &[String]);
    fn activity_instance_id_in(&mut self, ids: &[String]);
    fn tenant_id_in(&mut self, ids: &[String]);

    fn disable_binary_fetching(&mut self);
    fn disable_custom_object_deserialization(&mut self);

    fn order_by_variable_name(&mut self);
    fn order_by_variable_type(&mut self);
    fn order_by_activity_instance_id(&mut self);
    fn order_by_tenant_id(&mut self);
}

pub trait HistoricVariableInstanceQuery: Query<Item = HistoricVariableInstance> {
    fn variable_id(&mut self, id: &str);
    fn process_instance_id(&mut self, id: &str);
    fn process_definition_id(&mut self, id: &str);
    fn execution_id_in(&mut self, ids: &[String]);
    fn task_id_in(&mut self, ids: &[String]);
    fn activity_instance_id_in(&mut self, ids: &[String]);
    fn case_instance_id(&mut self, id: &str);
    fn variable_name(&mut self, name: &str);
    fn variable_name_like(&mut self, pattern: &str);
    /// Variables named `name` whose value renders as `value`.
    fn variable_value_equals(&mut self, name: &str, value: &str);
    fn tenant_id_in(&mut self, ids: &[String]);

    fn disable_binary_fetching(&mut self);
    fn disable_custom_object_deserialization(&mut self);

    fn order_by_process_instance_id(&mut self);
    fn order_by_variable_name(&mut self);
    fn order_by_tenant_id(&mut self);
}

pub trait HistoricIdentityLinkLogQuery: Query<Item = HistoricIdentityLinkLog> {
    fn link_type(&mut self, link_type: &str);
    fn user_id(&mut self, id: &str);
    fn group_id(&mut self, id: &str);
    fn date_before(&mut self, date: NaiveDateTime);
    fn date_after(&mut self, date: NaiveDateTime);
    fn assigner_id(&mut self, id: &str);
    fn task_id(&mut self, id: &str);
    fn process_definition_id(&mut self, id: &str);
    fn process_definition_key(&mut self, key: &str);
    fn operation_type(&mut self, operation: &str);
    fn tenant_id_in(&mut self, ids: &[String]);

    fn order_by_time(&mut self);
    fn order_by_type(&mut self);
    fn order_by_user_id(&mut self);
    fn order_by_group_id(&mut self);
    fn order_by_assigner_id(&mut self);
    fn order_by_task_id(&mut self);
    fn order_by_process_definition_id(&mut self);
    fn order_by_process_definition_key(&mut self);
    fn order_by_operation_type(&mut self);
    fn order_by_tenant_id(&mut self);
}

pub trait CleanableHistoricProcessInstanceReport:
    Query<Item = CleanableProcessInstanceReportResult>
{
    fn process_definition_id_in(&mut self, ids: &[String]);
    fn process_definition_key_in(&mut self, keys: &[String]);
    fn tenant_id_in(&mut self, ids: &[String]);
    fn without_tenant_id(&mut self);
    /// Only definitions that have finished instances.
    fn compact(&mut self);
}

// ─── Commands ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableScope {
    /// Visible from the execution; writes land on the case instance unless
    /// the variable already exists locally.
    Global,
    /// Only the execution itself.
    Local,
}

/// Lifecycle transitions a case execution command can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseTransition {
    /// Enabled → Active.
    ManualStart,
    /// Enabled → Disabled.
    Disable,
    /// Disabled → Enabled.
    Reenable,
    /// Active → Completed.
    Complete,
}

impl CaseTransition {
    pub fn name(&self) -> &'static str {
        match self {
            CaseTransition::ManualStart => "manualStart",
            CaseTransition::Disable => "disable",
            CaseTransition::Reenable => "reenable",
            CaseTransition::Complete => "complete",
        }
    }
}

/// Handle to changes submitted with
/// [`execute_async`](CaseExecutionCommandBuilder::execute_async).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: String,
    pub batch_type: String,
    pub total_jobs: u32,
}

/// Collects variable changes for one case execution and applies them in call
/// order when the command is executed or triggers a transition.
#[async_trait]
pub trait CaseExecutionCommandBuilder: Send {
    fn set_variable(&mut self, name: &str, value: TypedValue, scope: VariableScope);
    fn set_variables(&mut self, variables: BTreeMap<String, TypedValue>, scope: VariableScope);
    fn remove_variable(&mut self, name: &str, scope: VariableScope);
    fn remove_variables(&mut self, names: &[String], scope: VariableScope);
    async fn execute(self: Box<Self>) -> Result<(), EngineError>;
    /// Submit the changes as a batch and return its handle.
    async fn execute_async(self: Box<Self>) -> Result<Batch, EngineError>;
    /// Apply the changes, then move the execution through `transition`.
    /// Nothing is applied when the transition is not allowed.
    async fn trigger(self: Box<Self>, transition: CaseTransition) -> Result<(), EngineError>;
}

// ─── Engine ───────────────────────────────────────────────────

#[async_trait]
pub trait ProcessEngine: Send + Sync {
    fn create_variable_instance_query(&self) -> Box<dyn VariableInstanceQuery>;
    fn create_historic_variable_instance_query(&self) -> Box<dyn HistoricVariableInstanceQuery>;
    fn create_historic_identity_link_log_query(&self) -> Box<dyn HistoricIdentityLinkLogQuery>;
    fn create_cleanable_historic_process_instance_report(
        &self,
    ) -> Box<dyn CleanableHistoricProcessInstanceReport>;

    fn with_case_execution(&self, case_execution_id: &str) -> Box<dyn CaseExecutionCommandBuilder>;

    async fn case_execution_variables(
        &self,
        case_execution_id: &str,
        scope: VariableScope,
    ) -> Result<BTreeMap<String, TypedValue>, EngineError>;

    async fn case_execution_variable(
        &self,
        case_execution_id: &str,
        name: &str,
        scope: VariableScope,
    ) -> Result<Option<TypedValue>, EngineError>;
}
