//! Query conditions, sorting and the find query builder

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Comparison operators understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    JsonContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Regex,
    Exists,
    IsNull,
    IsNotNull,
}

/// How the members of a condition group combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

/// One entry of a condition list
///
/// Either `{"field": .., "operator": .., "value": ..}`, a group
/// `{"operator": "And" | "Or", "conditions": [..]}`, or an exact-match
/// mapping `{field: value, ...}`. Entries of a list are combined with AND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Operator {
        field: String,
        operator: QueryOperator,
        #[serde(default)]
        value: JsonValue,
        /// Compare strings without regard to case
        #[serde(default, skip_serializing_if = "is_false")]
        case_insensitive: bool,
    },
    Group {
        operator: LogicalOperator,
        conditions: Vec<Condition>,
    },
    Exact(Map<String, JsonValue>),
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl Condition {
    /// Exact match on one field
    pub fn exact(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        let mut map = Map::new();
        map.insert(field.into(), value.into());
        Self::Exact(map)
    }

    pub fn new(field: impl Into<String>, operator: QueryOperator, value: impl Into<JsonValue>) -> Self {
        Self::Operator {
            field: field.into(),
            operator,
            value: value.into(),
            case_insensitive: false,
        }
    }

    /// Operator that takes no value (`IsNull`, `IsNotNull`)
    pub fn unary(field: impl Into<String>, operator: QueryOperator) -> Self {
        Self::new(field, operator, JsonValue::Null)
    }

    /// Matches when every member matches
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            conditions,
        }
    }

    /// Matches when any member matches
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            conditions,
        }
    }

    /// Make an operator condition ignore case; other forms are returned as is
    pub fn ignore_case(mut self) -> Self {
        if let Self::Operator {
            case_insensitive, ..
        } = &mut self
        {
            *case_insensitive = true;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Query document for `find`: `{conditions?, sort?, limit?, offset?}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FindQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl FindQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition; conditions are combined with AND
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortConfig {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}
