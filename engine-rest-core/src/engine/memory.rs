use super::*;
use crate::value::format_date;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

const DIRECTION_WITHOUT_ORDERING: &str =
    "Invalid query: You should call any of the orderBy methods first before specifying a direction";
const ORDERING_WITHOUT_DIRECTION: &str =
    "Invalid query: call asc() or desc() after using orderByXX()";

#[derive(Default)]
struct State {
    variables: Vec<VariableInstance>,
    historic_variables: Vec<HistoricVariableInstance>,
    identity_links: Vec<HistoricIdentityLinkLog>,
    cleanable_reports: Vec<CleanableProcessInstanceReportResult>,
    /// Keyed by case execution id. The case instance is itself an execution
    /// mapped to its own id.
    case_executions: BTreeMap<String, CaseExecution>,
}

struct CaseExecution {
    case_instance_id: String,
    lifecycle: Lifecycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Enabled,
    Disabled,
    Active,
    Completed,
}

impl Lifecycle {
    fn after(self, transition: CaseTransition) -> Option<Lifecycle> {
        match (self, transition) {
            (Lifecycle::Enabled, CaseTransition::ManualStart) => Some(Lifecycle::Active),
            (Lifecycle::Enabled, CaseTransition::Disable) => Some(Lifecycle::Disabled),
            (Lifecycle::Disabled, CaseTransition::Reenable) => Some(Lifecycle::Enabled),
            (Lifecycle::Active, CaseTransition::Complete) => Some(Lifecycle::Completed),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Lifecycle::Enabled => "enabled",
            Lifecycle::Disabled => "disabled",
            Lifecycle::Active => "active",
            Lifecycle::Completed => "completed",
        }
    }
}

/// In-memory engine. Queries filter and order real rows; case execution
/// variables are ordinary variable instances scoped by case execution id.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    state: Arc<RwLock<State>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_variable_instance(
        &self,
        mut variable: VariableInstance,
    ) -> Result<(), EngineError> {
        variable.value = variable.value.normalized();
        write(&self.state)?.variables.push(variable);
        Ok(())
    }

    pub fn insert_historic_variable_instance(
        &self,
        mut variable: HistoricVariableInstance,
    ) -> Result<(), EngineError> {
        variable.value = variable.value.normalized();
        write(&self.state)?.historic_variables.push(variable);
        Ok(())
    }

    pub fn insert_identity_link_log(&self, log: HistoricIdentityLinkLog) -> Result<(), EngineError> {
        write(&self.state)?.identity_links.push(log);
        Ok(())
    }

    pub fn insert_cleanable_report(
        &self,
        result: CleanableProcessInstanceReportResult,
    ) -> Result<(), EngineError> {
        write(&self.state)?.cleanable_reports.push(result);
        Ok(())
    }

    /// Make a case execution addressable, in the enabled state. The case
    /// instance is registered alongside as an active execution holding the
    /// root scope for global variables.
    pub fn register_case_execution(
        &self,
        case_execution_id: &str,
        case_instance_id: &str,
    ) -> Result<(), EngineError> {
        let mut state = write(&self.state)?;
        state
            .case_executions
            .entry(case_instance_id.to_string())
            .or_insert_with(|| CaseExecution {
                case_instance_id: case_instance_id.to_string(),
                lifecycle: Lifecycle::Active,
            });
        if case_execution_id != case_instance_id {
            state.case_executions.insert(
                case_execution_id.to_string(),
                CaseExecution {
                    case_instance_id: case_instance_id.to_string(),
                    lifecycle: Lifecycle::Enabled,
                },
            );
        }
        Ok(())
    }
}

fn read(state: &RwLock<State>) -> Result<RwLockReadGuard<'_, State>, EngineError> {
    state
        .read()
        .map_err(|e| EngineError::internal(format!("Lock: {}", e)))
}

fn write(state: &RwLock<State>) -> Result<RwLockWriteGuard<'_, State>, EngineError> {
    state
        .write()
        .map_err(|e| EngineError::internal(format!("Lock: {}", e)))
}

fn case_execution_not_found(id: &str) -> EngineError {
    EngineError::not_found(format!("Case execution with id '{}' does not exist", id))
}

// ─── Generic query ────────────────────────────────────────────

trait Record: Clone + Send + Sync + 'static {
    /// Drop byte payloads when binary fetching is disabled.
    fn strip_binary(&mut self) {}
}

impl Record for VariableInstance {
    fn strip_binary(&mut self) {
        if let TypedValue::Bytes(bytes) = &mut self.value {
            *bytes = None;
        }
    }
}

impl Record for HistoricVariableInstance {
    fn strip_binary(&mut self) {
        if let TypedValue::Bytes(bytes) = &mut self.value {
            *bytes = None;
        }
    }
}

impl Record for HistoricIdentityLinkLog {}
impl Record for CleanableProcessInstanceReportResult {}

struct MemoryQuery<T> {
    state: Arc<RwLock<State>>,
    rows: fn(&State) -> &[T],
    predicates: Vec<Predicate<T>>,
    orderings: Vec<Comparator<T>>,
    pending: Option<Comparator<T>>,
    misuse: Option<&'static str>,
    binary_fetching: bool,
}

impl<T: Record> MemoryQuery<T> {
    fn new(state: Arc<RwLock<State>>, rows: fn(&State) -> &[T]) -> Self {
        Self {
            state,
            rows,
            predicates: Vec::new(),
            orderings: Vec::new(),
            pending: None,
            misuse: None,
            binary_fetching: true,
        }
    }

    fn filter(&mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) {
        self.predicates.push(Box::new(predicate));
    }

    fn field_eq(&mut self, field: fn(&T) -> Option<&str>, value: &str) {
        let value = value.to_string();
        self.filter(move |row| field(row) == Some(value.as_str()));
    }

    fn field_in(&mut self, field: fn(&T) -> Option<&str>, values: &[String]) {
        let values = values.to_vec();
        self.filter(move |row| field(row).is_some_and(|v| values.iter().any(|x| x == v)));
    }

    fn field_like(&mut self, field: fn(&T) -> Option<&str>, pattern: &str) {
        let pattern = pattern.to_string();
        self.filter(move |row| field(row).is_some_and(|v| like(&pattern, v)));
    }

    fn order_by<K: Ord + 'static>(&mut self, key: fn(&T) -> K) {
        if self.pending.is_some() {
            self.misuse = Some(ORDERING_WITHOUT_DIRECTION);
        }
        self.pending = Some(Box::new(move |a, b| key(a).cmp(&key(b))));
    }

    fn run(&self) -> Result<Vec<T>, EngineError> {
        if let Some(message) = self.misuse {
            return Err(EngineError::bad_request(message));
        }
        if self.pending.is_some() {
            return Err(EngineError::bad_request(ORDERING_WITHOUT_DIRECTION));
        }

        let mut rows: Vec<T> = {
            let state = read(&self.state)?;
            (self.rows)(&*state)
                .iter()
                .filter(|row| self.predicates.iter().all(|p| p(*row)))
                .cloned()
                .collect()
        };

        if !self.orderings.is_empty() {
            rows.sort_by(|a, b| {
                self.orderings
                    .iter()
                    .map(|cmp| cmp(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }
        if !self.binary_fetching {
            rows.iter_mut().for_each(T::strip_binary);
        }
        Ok(rows)
    }
}

impl<T: Record> Orderable for MemoryQuery<T> {
    fn asc(&mut self) {
        match self.pending.take() {
            Some(cmp) => self.orderings.push(cmp),
            None => self.misuse = Some(DIRECTION_WITHOUT_ORDERING),
        }
    }

    fn desc(&mut self) {
        match self.pending.take() {
            Some(cmp) => self.orderings.push(Box::new(move |a, b| cmp(a, b).reverse())),
            None => self.misuse = Some(DIRECTION_WITHOUT_ORDERING),
        }
    }
}

#[async_trait]
impl<T: Record> Query for MemoryQuery<T> {
    type Item = T;

    async fn list(&self) -> Result<Vec<T>, EngineError> {
        self.run()
    }

    async fn list_page(&self, first_result: i32, max_results: i32) -> Result<Vec<T>, EngineError> {
        let first = usize::try_from(first_result).unwrap_or(0);
        let max = usize::try_from(max_results).unwrap_or(0);
        Ok(self.run()?.into_iter().skip(first).take(max).collect())
    }

    async fn count(&self) -> Result<u64, EngineError> {
        Ok(self.run()?.len() as u64)
    }

    async fn single_result(&self) -> Result<Option<T>, EngineError> {
        let mut rows = self.run()?;
        if rows.len() > 1 {
            return Err(EngineError::bad_request(format!(
                "Query return {} results instead of max 1",
                rows.len()
            )));
        }
        Ok(rows.pop())
    }
}

/// SQL `LIKE` with `%` (any run) and `_` (one character).
fn like(pattern: &str, value: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();
    // matches[j]: p[..i] matches v[..j]
    let mut matches = vec![false; v.len() + 1];
    matches[0] = true;
    for pc in &p {
        let mut next = vec![false; v.len() + 1];
        if *pc == '%' {
            next[0] = matches[0];
            for j in 1..=v.len() {
                next[j] = next[j - 1] || matches[j];
            }
        } else {
            for j in 1..=v.len() {
                next[j] = matches[j - 1] && (*pc == '_' || *pc == v[j - 1]);
            }
        }
        matches = next;
    }
    matches[v.len()]
}

fn renders_as(value: &TypedValue, raw: &str) -> bool {
    match value {
        TypedValue::String(Some(s)) => s == raw,
        TypedValue::Boolean(Some(b)) => b.to_string() == raw,
        TypedValue::Short(Some(n)) => n.to_string() == raw,
        TypedValue::Integer(Some(n)) => n.to_string() == raw,
        TypedValue::Long(Some(n)) => n.to_string() == raw,
        TypedValue::Double(Some(d)) => raw.parse::<f64>() == Ok(*d),
        TypedValue::Date(Some(d)) => format_date(d) == raw,
        _ => false,
    }
}

// ─── Resource queries ─────────────────────────────────────────

fn variable_rows(state: &State) -> &[VariableInstance] {
    &state.variables
}

fn historic_variable_rows(state: &State) -> &[HistoricVariableInstance] {
    &state.historic_variables
}

fn identity_link_rows(state: &State) -> &[HistoricIdentityLinkLog] {
    &state.identity_links
}

fn cleanable_report_rows(state: &State) -> &[CleanableProcessInstanceReportResult] {
    &state.cleanable_reports
}

impl VariableInstanceQuery for MemoryQuery<VariableInstance> {
    fn variable_id(&mut self, id: &str) {
        self.field_eq(|v| Some(v.id.as_str()), id);
    }

    fn variable_name(&mut self, name: &str) {
        self.field_eq(|v| Some(v.name.as_str()), name);
    }

    fn variable_name_like(&mut self, pattern: &str) {
        self.field_like(|v| Some(v.name.as_str()), pattern);
    }

    fn process_instance_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.process_instance_id.as_deref(), ids);
    }

    fn execution_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.execution_id.as_deref(), ids);
    }

    fn case_instance_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.case_instance_id.as_deref(), ids);
    }

    fn case_execution_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.case_execution_id.as_deref(), ids);
    }

    fn task_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.task_id.as_deref(), ids);
    }

    fn activity_instance_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.activity_instance_id.as_deref(), ids);
    }

    fn tenant_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.tenant_id.as_deref(), ids);
    }

    fn disable_binary_fetching(&mut self) {
        self.binary_fetching = false;
    }

    // Objects are held serialized; there is nothing to skip.
    fn disable_custom_object_deserialization(&mut self) {}

    fn order_by_variable_name(&mut self) {
        self.order_by(|v| v.name.clone());
    }

    fn order_by_variable_type(&mut self) {
        self.order_by(|v| v.value.value_type().tag());
    }

    fn order_by_activity_instance_id(&mut self) {
        self.order_by(|v| v.activity_instance_id.clone());
    }

    fn order_by_tenant_id(&mut self) {
        self.order_by(|v| v.tenant_id.clone());
    }
}

impl HistoricVariableInstanceQuery for MemoryQuery<HistoricVariableInstance> {
    fn variable_id(&mut self, id: &str) {
        self.field_eq(|v| Some(v.id.as_str()), id);
    }

    fn process_instance_id(&mut self, id: &str) {
        self.field_eq(|v| v.process_instance_id.as_deref(), id);
    }

    fn process_definition_id(&mut self, id: &str) {
        self.field_eq(|v| v.process_definition_id.as_deref(), id);
    }

    fn execution_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.execution_id.as_deref(), ids);
    }

    fn task_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.task_id.as_deref(), ids);
    }

    fn activity_instance_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.activity_instance_id.as_deref(), ids);
    }

    fn case_instance_id(&mut self, id: &str) {
        self.field_eq(|v| v.case_instance_id.as_deref(), id);
    }

    fn variable_name(&mut self, name: &str) {
        self.field_eq(|v| Some(v.name.as_str()), name);
    }

    fn variable_name_like(&mut self, pattern: &str) {
        self.field_like(|v| Some(v.name.as_str()), pattern);
    }

    fn variable_value_equals(&mut self, name: &str, value: &str) {
        let (name, value) = (name.to_string(), value.to_string());
        self.filter(move |v| v.name == name && renders_as(&v.value, &value));
    }

    fn tenant_id_in(&mut self, ids: &[String]) {
        self.field_in(|v| v.tenant_id.as_deref(), ids);
    }

    fn disable_binary_fetching(&mut self) {
        self.binary_fetching = false;
    }

    fn disable_custom_object_deserialization(&mut self) {}

    fn order_by_process_instance_id(&mut self) {
        self.order_by(|v| v.process_instance_id.clone());
    }

    fn order_by_variable_name(&mut self) {
        self.order_by(|v| v.name.clone());
    }

    fn order_by_tenant_id(&mut self) {
        self.order_by(|v| v.tenant_id.clone());
    }
}

impl HistoricIdentityLinkLogQuery for MemoryQuery<HistoricIdentityLinkLog> {
    fn link_type(&mut self, link_type: &str) {
        self.field_eq(|l| l.link_type.as_deref(), link_type);
    }

    fn user_id(&mut self, id: &str) {
        self.field_eq(|l| l.user_id.as_deref(), id);
    }

    fn group_id(&mut self, id: &str) {
        self.field_eq(|l| l.group_id.as_deref(), id);
    }

    fn date_before(&mut self, date: NaiveDateTime) {
        self.filter(move |l| l.time <= date);
    }

    fn date_after(&mut self, date: NaiveDateTime) {
        self.filter(move |l| l.time >= date);
    }

    fn assigner_id(&mut self, id: &str) {
        self.field_eq(|l| l.assigner_id.as_deref(), id);
    }

    fn task_id(&mut self, id: &str) {
        self.field_eq(|l| l.task_id.as_deref(), id);
    }

    fn process_definition_id(&mut self, id: &str) {
        self.field_eq(|l| l.process_definition_id.as_deref(), id);
    }

    fn process_definition_key(&mut self, key: &str) {
        self.field_eq(|l| l.process_definition_key.as_deref(), key);
    }

    fn operation_type(&mut self, operation: &str) {
        self.field_eq(|l| l.operation_type.as_deref(), operation);
    }

    fn tenant_id_in(&mut self, ids: &[String]) {
        self.field_in(|l| l.tenant_id.as_deref(), ids);
    }

    fn order_by_time(&mut self) {
        self.order_by(|l| l.time);
    }

    fn order_by_type(&mut self) {
        self.order_by(|l| l.link_type.clone());
    }

    fn order_by_user_id(&mut self) {
        self.order_by(|l| l.user_id.clone());
    }

    fn order_by_group_id(&mut self) {
        self.order_by(|l| l.group_id.clone());
    }

    fn order_by_assigner_id(&mut self) {
        self.order_by(|l| l.assigner_id.clone());
    }

    fn order_by_task_id(&mut self) {
        self.order_by(|l| l.task_id.clone());
    }

    fn order_by_process_definition_id(&mut self) {
        self.order_by(|l| l.process_definition_id.clone());
    }

    fn order_by_process_definition_key(&mut self) {
        self.order_by(|l| l.process_definition_key.clone());
    }

    fn order_by_operation_type(&mut self) {
        self.order_by(|l| l.operation_type.clone());
    }

    fn order_by_tenant_id(&mut self) {
        self.order_by(|l| l.tenant_id.clone());
    }
}

impl CleanableHistoricProcessInstanceReport for MemoryQuery<CleanableProcessInstanceReportResult> {
    fn process_definition_id_in(&mut self, ids: &[String]) {
        self.field_in(|r| Some(r.process_definition_id.as_str()), ids);
    }

    fn process_definition_key_in(&mut self, keys: &[String]) {
        self.field_in(|r| Some(r.process_definition_key.as_str()), keys);
    }

    fn tenant_id_in(&mut self, ids: &[String]) {
        self.field_in(|r| r.tenant_id.as_deref(), ids);
    }

    fn without_tenant_id(&mut self) {
        self.filter(|r| r.tenant_id.is_none());
    }

    fn compact(&mut self) {
        self.filter(|r| r.finished_process_instance_count > 0);
    }
}

// ─── Case execution commands ──────────────────────────────────

enum VariableOp {
    Set(String, TypedValue, VariableScope),
    Remove(String, VariableScope),
}

struct MemoryCommandBuilder {
    state: Arc<RwLock<State>>,
    case_execution_id: String,
    ops: Vec<VariableOp>,
}

#[async_trait]
impl CaseExecutionCommandBuilder for MemoryCommandBuilder {
    fn set_variable(&mut self, name: &str, value: TypedValue, scope: VariableScope) {
        self.ops
            .push(VariableOp::Set(name.to_string(), value.normalized(), scope));
    }

    fn set_variables(&mut self, variables: BTreeMap<String, TypedValue>, scope: VariableScope) {
        self.ops.extend(
            variables
                .into_iter()
                .map(|(name, value)| VariableOp::Set(name, value.normalized(), scope)),
        );
    }

    fn remove_variable(&mut self, name: &str, scope: VariableScope) {
        self.ops.push(VariableOp::Remove(name.to_string(), scope));
    }

    fn remove_variables(&mut self, names: &[String], scope: VariableScope) {
        self.ops.extend(
            names
                .iter()
                .map(|name| VariableOp::Remove(name.clone(), scope)),
        );
    }

    async fn execute(self: Box<Self>) -> Result<(), EngineError> {
        let MemoryCommandBuilder {
            state,
            case_execution_id,
            ops,
        } = *self;
        let mut state = write(&state)?;
        let case_instance_id = case_instance_of(&state, &case_execution_id)?;
        apply(&mut state, &case_execution_id, &case_instance_id, ops);
        Ok(())
    }

    /// There is no job executor in memory: the batch is applied before its
    /// handle is returned.
    async fn execute_async(self: Box<Self>) -> Result<Batch, EngineError> {
        let MemoryCommandBuilder {
            state,
            case_execution_id,
            ops,
        } = *self;
        let mut state = write(&state)?;
        let case_instance_id = case_instance_of(&state, &case_execution_id)?;
        let total_jobs = u32::try_from(ops.len()).unwrap_or(u32::MAX);
        apply(&mut state, &case_execution_id, &case_instance_id, ops);
        Ok(Batch {
            id: Uuid::now_v7().to_string(),
            batch_type: CASE_VARIABLES_BATCH.to_string(),
            total_jobs,
        })
    }

    async fn trigger(self: Box<Self>, transition: CaseTransition) -> Result<(), EngineError> {
        let MemoryCommandBuilder {
            state,
            case_execution_id,
            ops,
        } = *self;
        let mut state = write(&state)?;
        let (case_instance_id, current) = state
            .case_executions
            .get(&case_execution_id)
            .map(|e| (e.case_instance_id.clone(), e.lifecycle))
            .ok_or_else(|| case_execution_not_found(&case_execution_id))?;
        let next = current.after(transition).ok_or_else(|| {
            EngineError::bad_request(format!(
                "Cannot {} case execution '{}': it is {}",
                transition.name(),
                case_execution_id,
                current.name()
            ))
        })?;

        apply(&mut state, &case_execution_id, &case_instance_id, ops);
        if let Some(execution) = state.case_executions.get_mut(&case_execution_id) {
            execution.lifecycle = next;
        }
        tracing::debug!(
            case_execution_id = %case_execution_id,
            transition = transition.name(),
            state = next.name(),
            "case execution transitioned"
        );
        Ok(())
    }
}

const CASE_VARIABLES_BATCH: &str = "case-execution-variables";

fn case_instance_of(state: &State, case_execution_id: &str) -> Result<String, EngineError> {
    state
        .case_executions
        .get(case_execution_id)
        .map(|e| e.case_instance_id.clone())
        .ok_or_else(|| case_execution_not_found(case_execution_id))
}

fn apply(
    state: &mut State,
    case_execution_id: &str,
    case_instance_id: &str,
    ops: Vec<VariableOp>,
) {
    tracing::debug!(
        case_execution_id = %case_execution_id,
        ops = ops.len(),
        "applying case execution variable changes"
    );
    for op in ops {
        match op {
            VariableOp::Set(name, value, scope) => {
                let target = match scope {
                    VariableScope::Local => case_execution_id,
                    VariableScope::Global if find(state, case_execution_id, &name).is_some() => {
                        case_execution_id
                    }
                    VariableScope::Global => case_instance_id,
                };
                match find(state, target, &name) {
                    Some(index) => state.variables[index].value = value,
                    None => {
                        let mut row =
                            VariableInstance::new(Uuid::now_v7().to_string(), name, value);
                        row.case_instance_id = Some(case_instance_id.to_string());
                        row.case_execution_id = Some(target.to_string());
                        state.variables.push(row);
                    }
                }
            }
            VariableOp::Remove(name, scope) => {
                let index = match scope {
                    VariableScope::Local => find(state, case_execution_id, &name),
                    VariableScope::Global => find(state, case_execution_id, &name)
                        .or_else(|| find(state, case_instance_id, &name)),
                };
                if let Some(index) = index {
                    state.variables.remove(index);
                }
            }
        }
    }
}

fn find(state: &State, case_execution_id: &str, name: &str) -> Option<usize> {
    state.variables.iter().position(|v| {
        v.name == name && v.case_execution_id.as_deref() == Some(case_execution_id)
    })
}

/// Variables visible from `case_execution_id` in `scope`, local values
/// shadowing the case instance's.
fn scoped_variables(
    state: &State,
    case_execution_id: &str,
    scope: VariableScope,
) -> Result<BTreeMap<String, TypedValue>, EngineError> {
    let case_instance_id = case_instance_of(state, case_execution_id)?;

    let mut visible = BTreeMap::new();
    let mut collect = |execution: &str| {
        for v in &state.variables {
            if v.case_execution_id.as_deref() == Some(execution) {
                visible.insert(v.name.clone(), v.value.clone());
            }
        }
    };
    if scope == VariableScope::Global && case_instance_id != case_execution_id {
        collect(case_instance_id.as_str());
    }
    collect(case_execution_id);
    Ok(visible)
}

// ─── Engine ───────────────────────────────────────────────────

#[async_trait]
impl ProcessEngine for MemoryEngine {
    fn create_variable_instance_query(&self) -> Box<dyn VariableInstanceQuery> {
        Box::new(MemoryQuery::new(self.state.clone(), variable_rows))
    }

    fn create_historic_variable_instance_query(&self) -> Box<dyn HistoricVariableInstanceQuery> {
        Box::new(MemoryQuery::new(self.state.clone(), historic_variable_rows))
    }

    fn create_historic_identity_link_log_query(&self) -> Box<dyn HistoricIdentityLinkLogQuery> {
        Box::new(MemoryQuery::new(self.state.clone(), identity_link_rows))
    }

    fn create_cleanable_historic_process_instance_report(
        &self,
    ) -> Box<dyn CleanableHistoricProcessInstanceReport> {
        Box::new(MemoryQuery::new(self.state.clone(), cleanable_report_rows))
    }

    fn with_case_execution(&self, case_execution_id: &str) -> Box<dyn CaseExecutionCommandBuilder> {
        Box::new(MemoryCommandBuilder {
            state: self.state.clone(),
            case_execution_id: case_execution_id.to_string(),
            ops: Vec::new(),
        })
    }

    async fn case_execution_variables(
        &self,
        case_execution_id: &str,
        scope: VariableScope,
    ) -> Result<BTreeMap<String, TypedValue>, EngineError> {
        let state = read(&self.state)?;
        scoped_variables(&state, case_execution_id, scope)
    }

    async fn case_execution_variable(
        &self,
        case_execution_id: &str,
        name: &str,
        scope: VariableScope,
    ) -> Result<Option<TypedValue>, EngineError> {
        let state = read(&self.state)?;
        Ok(scoped_variables(&state, case_execution_id, scope)?.remove(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;

    fn variable(id: &str, name: &str, value: TypedValue) -> VariableInstance {
        VariableInstance::new(id, name, value)
    }

    fn engine_with_variables() -> MemoryEngine {
        let engine = MemoryEngine::new();
        let mut a = variable("1", "beta", TypedValue::integer(1));
        a.process_instance_id = Some("pi-1".into());
        a.tenant_id = Some("tenant2".into());
        let mut b = variable("2", "alpha", TypedValue::string("x"));
        b.process_instance_id = Some("pi-2".into());
        b.tenant_id = Some("tenant1".into());
        let mut c = variable("3", "gamma", TypedValue::bytes(b"bin".to_vec()));
        c.process_instance_id = Some("pi-1".into());
        for v in [a, b, c] {
            engine.insert_variable_instance(v).unwrap();
        }
        engine
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let engine = engine_with_variables();
        let mut query = engine.create_variable_instance_query();
        query.process_instance_id_in(&["pi-1".to_string()]);
        query.variable_name_like("%a");
        let rows = query.list().await.unwrap();
        let names: Vec<_> = rows.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "gamma"]);
    }

    #[tokio::test]
    async fn ordering_and_paging() {
        let engine = engine_with_variables();
        let mut query = engine.create_variable_instance_query();
        query.order_by_variable_name();
        query.desc();
        let page = query.list_page(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "beta");
        assert_eq!(query.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn direction_without_ordering_is_rejected() {
        let engine = engine_with_variables();
        let mut query = engine.create_variable_instance_query();
        query.asc();
        let err = query.list().await.unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::BadUserRequest);
    }

    #[tokio::test]
    async fn binary_fetching_can_be_disabled() {
        let engine = engine_with_variables();
        let mut query = engine.create_variable_instance_query();
        query.variable_id("3");
        query.disable_binary_fetching();
        let row = query.single_result().await.unwrap().unwrap();
        assert_eq!(row.value, TypedValue::Bytes(None));

        let mut query = engine.create_variable_instance_query();
        query.variable_id("3");
        let row = query.single_result().await.unwrap().unwrap();
        assert_eq!(row.value, TypedValue::bytes(b"bin".to_vec()));
    }

    #[tokio::test]
    async fn single_result_rejects_multiple_rows() {
        let engine = engine_with_variables();
        let query = engine.create_variable_instance_query();
        assert!(query.single_result().await.is_err());
    }

    #[test]
    fn like_patterns() {
        assert!(like("a%", "abc"));
        assert!(like("%b%", "abc"));
        assert!(like("a_c", "abc"));
        assert!(!like("a_c", "abbc"));
        assert!(like("%", ""));
        assert!(!like("b%", "abc"));
    }

    #[tokio::test]
    async fn historic_value_filter_matches_rendered_value() {
        let engine = MemoryEngine::new();
        engine
            .insert_historic_variable_instance(HistoricVariableInstance::new(
                "h1",
                "amount",
                TypedValue::integer(42),
            ))
            .unwrap();
        engine
            .insert_historic_variable_instance(HistoricVariableInstance::new(
                "h2",
                "amount",
                TypedValue::integer(7),
            ))
            .unwrap();

        let mut query = engine.create_historic_variable_instance_query();
        query.variable_value_equals("amount", "42");
        let rows = query.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "h1");
    }

    #[tokio::test]
    async fn cleanable_report_compact_and_tenant_filters() {
        let engine = MemoryEngine::new();
        for (id, finished, tenant) in [("a", 0, None), ("b", 3, None), ("c", 2, Some("t1"))] {
            engine
                .insert_cleanable_report(CleanableProcessInstanceReportResult {
                    process_definition_id: id.into(),
                    process_definition_key: format!("key-{}", id),
                    process_definition_name: None,
                    process_definition_version: 1,
                    history_time_to_live: Some(5),
                    finished_process_instance_count: finished,
                    cleanable_process_instance_count: finished,
                    tenant_id: tenant.map(str::to_string),
                })
                .unwrap();
        }

        let mut report = engine.create_cleanable_historic_process_instance_report();
        report.compact();
        report.without_tenant_id();
        let rows = report.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].process_definition_id, "b");
    }

    #[tokio::test]
    async fn case_variables_respect_scope() {
        let engine = MemoryEngine::new();
        engine.register_case_execution("exec", "case").unwrap();

        let mut cmd = engine.with_case_execution("exec");
        cmd.set_variable("shared", TypedValue::integer(1), VariableScope::Global);
        cmd.set_variable("own", TypedValue::integer(2), VariableScope::Local);
        cmd.execute().await.unwrap();

        let global = engine
            .case_execution_variables("exec", VariableScope::Global)
            .await
            .unwrap();
        assert_eq!(global.len(), 2);

        let local = engine
            .case_execution_variables("exec", VariableScope::Local)
            .await
            .unwrap();
        assert_eq!(local.keys().collect::<Vec<_>>(), vec!["own"]);

        let root = engine
            .case_execution_variables("case", VariableScope::Local)
            .await
            .unwrap();
        assert_eq!(root.get("shared"), Some(&TypedValue::integer(1)));
    }

    #[tokio::test]
    async fn commands_apply_in_call_order() {
        let engine = MemoryEngine::new();
        engine.register_case_execution("exec", "case").unwrap();

        let mut cmd = engine.with_case_execution("exec");
        cmd.set_variable("v", TypedValue::integer(1), VariableScope::Local);
        cmd.remove_variables(&["v".to_string()], VariableScope::Local);
        cmd.set_variable("w", TypedValue::integer(2), VariableScope::Local);
        cmd.execute().await.unwrap();

        let value = engine
            .case_execution_variable("exec", "v", VariableScope::Local)
            .await
            .unwrap();
        assert!(value.is_none());
        let value = engine
            .case_execution_variable("exec", "w", VariableScope::Local)
            .await
            .unwrap();
        assert_eq!(value, Some(TypedValue::integer(2)));
    }

    #[tokio::test]
    async fn unknown_case_execution_is_not_found() {
        let engine = MemoryEngine::new();
        let err = engine
            .case_execution_variables("nope", VariableScope::Global)
            .await
            .unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::NotFound);

        let err = engine.with_case_execution("nope").execute().await.unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::NotFound);
    }

    #[tokio::test]
    async fn lifecycle_follows_allowed_transitions() {
        let engine = MemoryEngine::new();
        engine.register_case_execution("exec", "case").unwrap();

        let err = engine
            .with_case_execution("exec")
            .trigger(CaseTransition::Complete)
            .await
            .unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::BadUserRequest);
        assert_eq!(err.message, "Cannot complete case execution 'exec': it is enabled");

        for transition in [
            CaseTransition::Disable,
            CaseTransition::Reenable,
            CaseTransition::ManualStart,
            CaseTransition::Complete,
        ] {
            engine
                .with_case_execution("exec")
                .trigger(transition)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn rejected_transition_applies_no_variables() {
        let engine = MemoryEngine::new();
        engine.register_case_execution("exec", "case").unwrap();

        let mut cmd = engine.with_case_execution("exec");
        cmd.set_variable("v", TypedValue::integer(1), VariableScope::Local);
        assert!(cmd.trigger(CaseTransition::Reenable).await.is_err());
        let value = engine
            .case_execution_variable("exec", "v", VariableScope::Local)
            .await
            .unwrap();
        assert!(value.is_none());

        let mut cmd = engine.with_case_execution("exec");
        cmd.set_variable("v", TypedValue::integer(1), VariableScope::Local);
        cmd.trigger(CaseTransition::ManualStart).await.unwrap();
        let value = engine
            .case_execution_variable("exec", "v", VariableScope::Local)
            .await
            .unwrap();
        assert_eq!(value, Some(TypedValue::integer(1)));
    }

    #[tokio::test]
    async fn execute_async_returns_batch_of_applied_changes() {
        let engine = MemoryEngine::new();
        engine.register_case_execution("exec", "case").unwrap();

        let mut cmd = engine.with_case_execution("exec");
        cmd.set_variable("a", TypedValue::integer(1), VariableScope::Global);
        cmd.remove_variable("b", VariableScope::Global);
        let batch = cmd.execute_async().await.unwrap();
        assert_eq!(batch.batch_type, "case-execution-variables");
        assert_eq!(batch.total_jobs, 2);
        assert!(!batch.id.is_empty());

        let value = engine
            .case_execution_variable("exec", "a", VariableScope::Global)
            .await
            .unwrap();
        assert_eq!(value, Some(TypedValue::integer(1)));

        let err = engine
            .with_case_execution("nope")
            .execute_async()
            .await
            .unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::NotFound);
    }

    #[tokio::test]
    async fn stored_dates_keep_whole_seconds() {
        let engine = MemoryEngine::new();
        let precise = chrono::NaiveDate::from_ymd_opt(2014, 2, 3)
            .and_then(|d| d.and_hms_milli_opt(10, 11, 12, 345))
            .unwrap();
        engine
            .insert_variable_instance(variable("d", "due", TypedValue::Date(Some(precise))))
            .unwrap();

        let mut query = engine.create_variable_instance_query();
        query.variable_id("d");
        let row = query.single_result().await.unwrap().unwrap();
        assert_eq!(row.value, TypedValue::date(precise));
        assert_ne!(row.value, TypedValue::Date(Some(precise)));
    }
}
