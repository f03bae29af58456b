//! In-process reference engine
//!
//! [`MemoryBridge`] implements the [`Bridge`] contract against tables held in
//! memory. It follows the engine's observable rules: models can only be
//! registered on a configured alias, `update` and `delete` misses succeed with
//! a zero count, and results are returned as tagged values.

use crate::bridge::Bridge;
use crate::condition::{Condition, FindQuery, LogicalOperator, QueryOperator, SortDirection};
use crate::config::{DatabaseConfig, IdStrategy};
use crate::response::BridgeResponse;
use parking_lot::Mutex;
use quickdb_codec::{decode, encode, FieldDefinition, ModelMeta};
use quickdb_common::Result;
use serde_json::{json, Map, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

type Row = Map<String, JsonValue>;

/// Custom epoch for snowflake ids (2010-11-04T01:42:54.657Z)
const SNOWFLAKE_EPOCH_MS: i64 = 1_288_834_974_657;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
    sequence: i64,
}

#[derive(Debug)]
struct Database {
    id_strategy: IdStrategy,
    models: BTreeMap<String, ModelMeta>,
    tables: BTreeMap<String, Table>,
}

/// Engine state keyed by database alias
#[derive(Debug, Default)]
pub struct MemoryBridge {
    databases: Mutex<BTreeMap<String, Database>>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in `table`
    pub fn row_count(&self, table: &str, alias: &str) -> usize {
        self.databases
            .lock()
            .get(alias)
            .and_then(|db| db.tables.get(table))
            .map_or(0, |t| t.rows.len())
    }

    /// Collection names registered on `alias`, sorted
    pub fn registered_models(&self, alias: &str) -> Vec<String> {
        self.databases
            .lock()
            .get(alias)
            .map(|db| db.models.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Run `op` against a configured database, or answer with a failure
    fn with_database<F>(&self, alias: &str, op: F) -> Result<String>
    where
        F: FnOnce(&mut Database) -> BridgeResponse,
    {
        let mut databases = self.databases.lock();
        let response = match databases.get_mut(alias) {
            Some(db) => op(db),
            None => BridgeResponse::failure(format!("database alias '{}' is not configured", alias)),
        };
        response.to_json_string()
    }
}

impl Bridge for MemoryBridge {
    fn create(&self, table: &str, data_json: &str, alias: &str) -> Result<String> {
        self.with_database(alias, |db| {
            let row = match parse_row(data_json) {
                Ok(row) => row,
                Err(response) => return response,
            };
            db.insert(table, row)
        })
    }

    fn find(&self, table: &str, query_json: &str, alias: &str) -> Result<String> {
        self.with_database(alias, |db| {
            let query: FindQuery = match serde_json::from_str(query_json) {
                Ok(query) => query,
                Err(e) => return BridgeResponse::failure(format!("invalid query: {}", e)),
            };
            let mut rows = match db.select(table, &query.conditions) {
                Ok(rows) => rows,
                Err(response) => return response,
            };
            for sort in query.sort.iter().rev() {
                rows.sort_by(|a, b| {
                    let ordering = compare_values(field_of(a, &sort.field), field_of(b, &sort.field));
                    match sort.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                });
            }
            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map_or(usize::MAX, |l| l as usize);
            let data: Vec<JsonValue> = rows
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|row| db.tag_row(table, &row))
                .collect();
            BridgeResponse::ok(JsonValue::Array(data))
        })
    }

    fn find_by_id(&self, table: &str, id: &str, alias: &str) -> Result<String> {
        self.with_database(alias, |db| {
            let found = db
                .tables
                .get(table)
                .and_then(|t| t.rows.iter().find(|row| id_matches(row, id)))
                .cloned();
            match found {
                Some(row) => BridgeResponse::ok(db.tag_row(table, &row)),
                None => BridgeResponse::ok(JsonValue::Null),
            }
        })
    }

    fn update(
        &self,
        table: &str,
        conditions_json: &str,
        updates_json: &str,
        alias: &str,
    ) -> Result<String> {
        self.with_database(alias, |db| {
            let conditions = match parse_conditions(conditions_json) {
                Ok(conditions) => conditions,
                Err(response) => return response,
            };
            let updates = match parse_row(updates_json) {
                Ok(updates) => updates,
                Err(response) => return response,
            };
            let Some(rows) = db.tables.get_mut(table).map(|t| &mut t.rows) else {
                return BridgeResponse::ok(json!(0));
            };
            let mut hits = Vec::with_capacity(rows.len());
            for row in rows.iter() {
                match matches_all(row, &conditions) {
                    Ok(hit) => hits.push(hit),
                    Err(response) => return response,
                }
            }
            let mut updated = 0;
            for (row, hit) in rows.iter_mut().zip(hits) {
                if hit {
                    for (key, value) in &updates {
                        row.insert(key.clone(), value.clone());
                    }
                    updated += 1;
                }
            }
            BridgeResponse::ok(json!(updated))
        })
    }

    fn delete(&self, table: &str, conditions_json: &str, alias: &str) -> Result<String> {
        self.with_database(alias, |db| {
            let conditions = match parse_conditions(conditions_json) {
                Ok(conditions) => conditions,
                Err(response) => return response,
            };
            let Some(t) = db.tables.get_mut(table) else {
                return BridgeResponse::ok(json!(0));
            };
            // Evaluate every row first so a bad condition deletes nothing
            let mut doomed = Vec::with_capacity(t.rows.len());
            for row in &t.rows {
                match matches_all(row, &conditions) {
                    Ok(hit) => doomed.push(hit),
                    Err(response) => return response,
                }
            }
            let before = t.rows.len();
            let mut flags = doomed.into_iter();
            t.rows.retain(|_| !flags.next().unwrap_or(false));
            let deleted = before - t.rows.len();
            BridgeResponse::ok(json!(deleted))
        })
    }

    fn count(&self, table: &str, conditions_json: &str, alias: &str) -> Result<String> {
        self.with_database(alias, |db| {
            let conditions = match parse_conditions(conditions_json) {
                Ok(conditions) => conditions,
                Err(response) => return response,
            };
            match db.select(table, &conditions) {
                Ok(rows) => BridgeResponse::ok(json!(rows.len())),
                Err(response) => response,
            }
        })
    }

    fn add_database(&self, config: &DatabaseConfig) -> Result<String> {
        let mut databases = self.databases.lock();
        let response = if databases.contains_key(&config.alias) {
            BridgeResponse::failure(format!("database alias '{}' is already configured", config.alias))
        } else {
            debug!(alias = %config.alias, backend = config.backend.as_str(), "memory database added");
            databases.insert(
                config.alias.clone(),
                Database {
                    id_strategy: config.id_strategy.clone(),
                    models: BTreeMap::new(),
                    tables: BTreeMap::new(),
                },
            );
            BridgeResponse::ok_message(format!("database '{}' added", config.alias))
        };
        response.to_json_string()
    }

    fn register_model(&self, model_meta_json: &str) -> Result<String> {
        let meta = match ModelMeta::from_json(model_meta_json) {
            Ok(meta) => meta,
            Err(e) => return BridgeResponse::failure(e.to_string()).to_json_string(),
        };
        let alias = meta.database_alias.clone();
        self.with_database(&alias, |db| {
            let message = format!("model '{}' registered", meta.collection_name);
            db.tables.entry(meta.collection_name.clone()).or_default();
            db.models.insert(meta.collection_name.clone(), meta);
            BridgeResponse::ok_message(message)
        })
    }

    fn drop_table(&self, table: &str, alias: &str) -> Result<String> {
        self.with_database(alias, |db| {
            db.tables.remove(table);
            BridgeResponse::ok_message(format!("table '{}' dropped", table))
        })
    }
}

// ============================================================================
// Table Operations
// ============================================================================

impl Database {
    fn insert(&mut self, table: &str, mut row: Row) -> BridgeResponse {
        let id_strategy = self.id_strategy.clone();
        let meta = self.models.get(table);

        if let Some(meta) = meta {
            let existing = self.tables.get(table).map(|t| t.rows.as_slice()).unwrap_or(&[]);
            for (name, _) in meta.fields.iter().filter(|(_, f)| f.unique) {
                let Some(value) = row.get(name).filter(|v| !v.is_null()) else {
                    continue;
                };
                if existing.iter().any(|other| other.get(name) == Some(value)) {
                    return BridgeResponse::failure(format!(
                        "unique constraint violated on '{}.{}'",
                        table, name
                    ));
                }
            }
        }

        let t = self.tables.entry(table.to_string()).or_default();
        let needs_id = match row.get("id") {
            None | Some(JsonValue::Null) => true,
            Some(JsonValue::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if needs_id {
            row.insert("id".to_string(), generate_id(&id_strategy, t));
        } else if let Some(n) = row.get("id").and_then(JsonValue::as_i64) {
            t.next_id = t.next_id.max(n);
        }
        t.rows.push(row.clone());
        BridgeResponse::ok(self.tag_row(table, &row))
    }

    fn select(&self, table: &str, conditions: &[Condition]) -> std::result::Result<Vec<Row>, BridgeResponse> {
        let Some(t) = self.tables.get(table) else {
            return Ok(Vec::new());
        };
        let mut rows = Vec::new();
        for row in &t.rows {
            if matches_all(row, conditions)? {
                rows.push(row.clone());
            }
        }
        Ok(rows)
    }

    /// Tag a stored row, using declared field metadata where available
    fn tag_row(&self, table: &str, row: &Row) -> JsonValue {
        let meta = self.models.get(table);
        let json_field = FieldDefinition::json();
        let mut tagged = Map::with_capacity(row.len());
        for (name, value) in row {
            let declared = meta.and_then(|m| m.field(name));
            let encoded = declared
                .and_then(|field| encode(value, name, field).ok())
                .or_else(|| encode(value, name, &json_field).ok())
                .map(|v| v.to_json())
                .unwrap_or(JsonValue::Null);
            tagged.insert(name.clone(), encoded);
        }
        json!({ "Object": tagged })
    }
}

fn generate_id(strategy: &IdStrategy, table: &mut Table) -> JsonValue {
    match strategy {
        IdStrategy::AutoIncrement => {
            table.next_id += 1;
            json!(table.next_id)
        }
        IdStrategy::Uuid => json!(uuid::Uuid::new_v4().to_string()),
        IdStrategy::ObjectId => {
            let seconds = chrono::Utc::now().timestamp() as u32;
            let random = uuid::Uuid::new_v4().simple().to_string();
            json!(format!("{:08x}{}", seconds, &random[..16]))
        }
        IdStrategy::Snowflake {
            machine_id,
            datacenter_id,
        } => {
            table.sequence = (table.sequence + 1) & 0xfff;
            let elapsed = chrono::Utc::now().timestamp_millis() - SNOWFLAKE_EPOCH_MS;
            let id = (elapsed << 22)
                | ((*datacenter_id as i64 & 0x1f) << 17)
                | ((*machine_id as i64 & 0x1f) << 12)
                | table.sequence;
            json!(id.to_string())
        }
        IdStrategy::Custom(name) => {
            table.next_id += 1;
            json!(format!("{}-{}", name, table.next_id))
        }
    }
}

fn id_matches(row: &Row, id: &str) -> bool {
    match row.get("id") {
        Some(JsonValue::String(s)) => s == id,
        Some(JsonValue::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

// ============================================================================
// Input Parsing
// ============================================================================

/// Parse a tagged record into host values
fn parse_row(text: &str) -> std::result::Result<Row, BridgeResponse> {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(JsonValue::Object(map)) => Ok(map.iter().map(|(k, v)| (k.clone(), decode(v))).collect()),
        Ok(other) => Err(BridgeResponse::failure(format!(
            "record must be a JSON object, got {}",
            other
        ))),
        Err(e) => Err(BridgeResponse::failure(format!("invalid record: {}", e))),
    }
}

fn parse_conditions(text: &str) -> std::result::Result<Vec<Condition>, BridgeResponse> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text)
        .map_err(|e| BridgeResponse::failure(format!("invalid conditions: {}", e)))
}

// ============================================================================
// Condition Evaluation
// ============================================================================

fn field_of<'a>(row: &'a Row, field: &str) -> &'a JsonValue {
    row.get(field).unwrap_or(&JsonValue::Null)
}

fn matches_all(row: &Row, conditions: &[Condition]) -> std::result::Result<bool, BridgeResponse> {
    for condition in conditions {
        if !matches(row, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches(row: &Row, condition: &Condition) -> std::result::Result<bool, BridgeResponse> {
    match condition {
        Condition::Exact(map) => Ok(map
            .iter()
            .all(|(field, expected)| values_equal(field_of(row, field), &decode(expected)))),
        Condition::Operator {
            field,
            operator,
            value,
            case_insensitive,
        } => {
            let actual = field_of(row, field);
            let expected = decode(value);
            let present = row.contains_key(field);
            // Regex patterns are not folded; the matcher ignores case instead
            if *case_insensitive && *operator != QueryOperator::Regex {
                evaluate(*operator, present, &fold_case(actual), &fold_case(&expected), true)
            } else {
                evaluate(*operator, present, actual, &expected, *case_insensitive)
            }
        }
        Condition::Group {
            operator: LogicalOperator::And,
            conditions,
        } => matches_all(row, conditions),
        Condition::Group {
            operator: LogicalOperator::Or,
            conditions,
        } => {
            for condition in conditions {
                if matches(row, condition)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Lowercase strings, including those directly inside an array
fn fold_case(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) => JsonValue::String(s.to_lowercase()),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(fold_case).collect()),
        other => other.clone(),
    }
}

fn evaluate(
    operator: QueryOperator,
    present: bool,
    actual: &JsonValue,
    expected: &JsonValue,
    ignore_case: bool,
) -> std::result::Result<bool, BridgeResponse> {
    let result = match operator {
        QueryOperator::Eq => values_equal(actual, expected),
        QueryOperator::Ne => !values_equal(actual, expected),
        QueryOperator::Gt => ordered(actual, expected) == Some(Ordering::Greater),
        QueryOperator::Gte => matches!(ordered(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
        QueryOperator::Lt => ordered(actual, expected) == Some(Ordering::Less),
        QueryOperator::Lte => matches!(ordered(actual, expected), Some(Ordering::Less | Ordering::Equal)),
        QueryOperator::Contains => match (actual, expected) {
            (JsonValue::String(s), JsonValue::String(needle)) => s.contains(needle.as_str()),
            (JsonValue::Array(items), needle) => items.iter().any(|i| values_equal(i, needle)),
            _ => false,
        },
        QueryOperator::JsonContains => json_contains(actual, expected),
        QueryOperator::StartsWith => match (actual, expected) {
            (JsonValue::String(s), JsonValue::String(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        },
        QueryOperator::EndsWith => match (actual, expected) {
            (JsonValue::String(s), JsonValue::String(suffix)) => s.ends_with(suffix.as_str()),
            _ => false,
        },
        QueryOperator::In => match expected {
            JsonValue::Array(options) => options.iter().any(|o| values_equal(actual, o)),
            _ => false,
        },
        QueryOperator::NotIn => match expected {
            JsonValue::Array(options) => !options.iter().any(|o| values_equal(actual, o)),
            _ => true,
        },
        QueryOperator::Regex => {
            let (JsonValue::String(s), JsonValue::String(pattern)) = (actual, expected) else {
                return Ok(false);
            };
            let re = regex::RegexBuilder::new(pattern)
                .case_insensitive(ignore_case)
                .build()
                .map_err(|e| BridgeResponse::failure(format!("invalid regex '{}': {}", pattern, e)))?;
            re.is_match(s)
        }
        QueryOperator::Exists => present == expected.as_bool().unwrap_or(true),
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
    };
    Ok(result)
}

/// Equality with integers and floats compared numerically
fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn ordered(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (JsonValue::String(x), JsonValue::String(y)) => Some(x.cmp(y)),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order for sorting: null < bool < number < string < everything else
fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    fn rank(v: &JsonValue) -> u8 {
        match v {
            JsonValue::Null => 0,
            JsonValue::Bool(_) => 1,
            JsonValue::Number(_) => 2,
            JsonValue::String(_) => 3,
            JsonValue::Array(_) => 4,
            JsonValue::Object(_) => 5,
        }
    }
    ordered(a, b).unwrap_or_else(|| rank(a).cmp(&rank(b)))
}

fn json_contains(actual: &JsonValue, expected: &JsonValue) -> bool {
    match (actual, expected) {
        (JsonValue::Object(haystack), JsonValue::Object(needle)) => needle.iter().all(|(k, v)| {
            haystack
                .get(k)
                .map_or(false, |candidate| json_contains(candidate, v))
        }),
        (JsonValue::Array(haystack), JsonValue::Array(needle)) => needle
            .iter()
            .all(|n| haystack.iter().any(|h| json_contains(h, n))),
        (JsonValue::Array(haystack), needle) => haystack.iter().any(|h| values_equal(h, needle)),
        _ => values_equal(actual, expected),
    }
}
