//! Facade behaviour against the in-process engine

use parking_lot::Mutex;
use quickdb::*;
use quickdb_codec::{FieldDefinition, FieldType, IndexDefinition, ModelMeta};
use serde_json::{json, Map, Value as JsonValue};

// ============================================================================
// Fixtures
// ============================================================================

/// Memory engine that records every registration payload it receives
#[derive(Default)]
struct RecordingBridge {
    inner: MemoryBridge,
    registrations: Mutex<Vec<String>>,
    unreachable: bool,
}

impl RecordingBridge {
    fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    fn registered_names(&self) -> Vec<String> {
        self.registrations
            .lock()
            .iter()
            .map(|payload| ModelMeta::from_json(payload).unwrap().collection_name)
            .collect()
    }

    fn transport(&self) -> Result<()> {
        if self.unreachable {
            return Err(QuickDbError::Engine("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Bridge for RecordingBridge {
    fn create(&self, table: &str, data_json: &str, alias: &str) -> Result<String> {
        self.transport()?;
        self.inner.create(table, data_json, alias)
    }

    fn find(&self, table: &str, query_json: &str, alias: &str) -> Result<String> {
        self.transport()?;
        self.inner.find(table, query_json, alias)
    }

    fn find_by_id(&self, table: &str, id: &str, alias: &str) -> Result<String> {
        self.transport()?;
        self.inner.find_by_id(table, id, alias)
    }

    fn update(&self, table: &str, conditions_json: &str, updates_json: &str, alias: &str) -> Result<String> {
        self.transport()?;
        self.inner.update(table, conditions_json, updates_json, alias)
    }

    fn delete(&self, table: &str, conditions_json: &str, alias: &str) -> Result<String> {
        self.transport()?;
        self.inner.delete(table, conditions_json, alias)
    }

    fn count(&self, table: &str, conditions_json: &str, alias: &str) -> Result<String> {
        self.transport()?;
        self.inner.count(table, conditions_json, alias)
    }

    fn add_database(&self, config: &DatabaseConfig) -> Result<String> {
        self.inner.add_database(config)
    }

    fn register_model(&self, model_meta_json: &str) -> Result<String> {
        self.registrations.lock().push(model_meta_json.to_string());
        self.inner.register_model(model_meta_json)
    }

    fn drop_table(&self, table: &str, alias: &str) -> Result<String> {
        self.transport()?;
        self.inner.drop_table(table, alias)
    }
}

fn user_model() -> ModelMeta {
    ModelBuilder::new("User")
        .field("id", FieldDefinition::uuid())
        .field("name", FieldDefinition::bounded_string(Some(1), Some(20)).required())
        .field("email", FieldDefinition::string().unique())
        .field("age", FieldDefinition::integer())
        .field("created_at", FieldDefinition::datetime())
        .field("tags", FieldDefinition::array(FieldType::string()))
        .index(IndexDefinition::new(["email"], true))
        .build()
        .unwrap()
}

fn simple_model(name: &str) -> ModelMeta {
    ModelBuilder::new(name)
        .field("title", FieldDefinition::string())
        .build()
        .unwrap()
}

fn object(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

fn ready_db() -> QuickDb<MemoryBridge> {
    let mut db = QuickDb::new(MemoryBridge::new());
    db.add_database(DatabaseConfig::sqlite("default", ":memory:").with_id_strategy(IdStrategy::Uuid))
        .unwrap();
    db.register_model(user_model()).unwrap();
    db
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_deferred_registrations_flush_once_in_order() {
    let mut db = QuickDb::new(RecordingBridge::default());
    for name in ["Alpha", "Beta", "Gamma", "Delta"] {
        db.model(simple_model(name));
    }
    assert!(db.bridge().registered_names().is_empty());
    assert_eq!(db.pending_models(), vec!["alpha", "beta", "gamma", "delta"]);

    db.add_database(DatabaseConfig::sqlite("default", ":memory:")).unwrap();
    assert_eq!(
        db.bridge().registered_names(),
        vec!["alpha", "beta", "gamma", "delta"]
    );
    assert!(db.pending_models().is_empty());

    // A second configuration event has nothing left to submit
    db.add_database(DatabaseConfig::sqlite("archive", ":memory:")).unwrap();
    assert_eq!(db.bridge().registered_names().len(), 4);
}

#[test]
fn test_registration_without_database_is_fatal() {
    let mut db = QuickDb::new(MemoryBridge::new());
    let err = db.register_model(simple_model("Orphan")).unwrap_err();
    assert!(err.is_fatal());
    match err {
        QuickDbError::FatalRegistration { model, alias, reason } => {
            assert_eq!(model, "orphan");
            assert_eq!(alias, "default");
            assert!(reason.contains("not configured"), "{}", reason);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_flush_onto_unconfigured_alias_is_fatal() {
    let mut db = QuickDb::new(MemoryBridge::new());
    db.model(
        ModelBuilder::new("Event")
            .database_alias("logs")
            .field("kind", FieldDefinition::string())
            .build()
            .unwrap(),
    );
    let err = db.add_database(DatabaseConfig::sqlite("default", ":memory:")).unwrap_err();
    assert!(matches!(err, QuickDbError::FatalRegistration { ref alias, .. } if alias == "logs"));
}

#[test]
fn test_failed_flush_keeps_later_models_queued() {
    let mut db = QuickDb::new(RecordingBridge::default());
    db.model(simple_model("Alpha"));
    db.model(
        ModelBuilder::new("Event")
            .database_alias("logs")
            .field("kind", FieldDefinition::string())
            .build()
            .unwrap(),
    );
    db.model(simple_model("Gamma"));

    let err = db.add_database(DatabaseConfig::sqlite("default", ":memory:")).unwrap_err();
    assert!(matches!(err, QuickDbError::FatalRegistration { ref model, .. } if model == "event"));
    assert_eq!(db.pending_models(), vec!["gamma"]);

    db.add_database(DatabaseConfig::sqlite("logs", ":memory:")).unwrap();
    assert!(db.pending_models().is_empty());
    assert_eq!(db.bridge().registered_names(), vec!["alpha", "event", "gamma"]);
    assert!(db.handle("gamma").is_ok());
    assert!(db.handle("event").is_err());
}

#[test]
fn test_models_on_default_alias_use_configured_default() {
    let config = AppConfig::from_yaml_str(
        "default_alias: main\ndatabases:\n  - alias: main\n    backend:\n      type: sqlite\n      path: app.db\n",
    )
    .unwrap();
    let mut db = QuickDb::with_config(MemoryBridge::new(), &config);
    db.model(simple_model("Note"));
    db.model(
        ModelBuilder::new("Audit")
            .database_alias("main")
            .field("action", FieldDefinition::string())
            .build()
            .unwrap(),
    );

    for database in config.databases.iter().cloned() {
        db.add_database(database).unwrap();
    }
    assert_eq!(db.bridge().registered_models("main"), vec!["audit", "note"]);
    assert_eq!(db.handle("note").unwrap().alias(), "main");

    db.register_model(simple_model("Memo")).unwrap();
    assert_eq!(db.handle("memo").unwrap().alias(), "main");
}

#[test]
fn test_failed_database_configuration_is_fatal() {
    let mut db = QuickDb::new(MemoryBridge::new());
    db.add_database(DatabaseConfig::sqlite("default", ":memory:")).unwrap();

    let err = db.add_database(DatabaseConfig::sqlite("default", ":memory:")).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.kind(), ErrorKind::Fatal);

    let bad_pool = PoolConfig {
        min_connections: 5,
        max_connections: 1,
        ..Default::default()
    };
    let err = db
        .add_database(DatabaseConfig::sqlite("other", ":memory:").with_pool(bad_pool))
        .unwrap_err();
    assert!(matches!(err, QuickDbError::FatalConfiguration { ref alias, .. } if alias == "other"));
    assert!(!db.is_configured("other"));
}

#[test]
fn test_handle_requires_registration() {
    let db = QuickDb::new(MemoryBridge::new());
    assert!(db.handle("user").is_err());
}

// ============================================================================
// CRUD
// ============================================================================

#[test]
fn test_create_generates_uuid_and_decodes_result() {
    let db = ready_db();
    let users = db.handle("user").unwrap();

    let response = users
        .create(&object(json!({
            "id": "",
            "name": "alice",
            "age": 30,
            "created_at": "2025-10-22T08:30:00Z",
            "tags": ["a", "b"]
        })))
        .unwrap();
    assert!(response.success, "{:?}", response.error);

    let data = response.data.unwrap();
    let id = data["id"].as_str().unwrap();
    assert!(quickdb_codec::formats::validate_uuid(id));
    assert_eq!(data["created_at"], json!("2025-10-22T08:30:00Z"));
    assert_eq!(data["tags"], json!(["a", "b"]));

    let found = users.find_by_id(id).unwrap();
    assert_eq!(found.data.unwrap()["name"], json!("alice"));
}

#[test]
fn test_codec_errors_are_returned_not_submitted() {
    let db = ready_db();
    let users = db.handle("user").unwrap();

    let err = users.create(&object(json!({"name": "bob", "age": "old"}))).unwrap_err();
    assert!(matches!(err, QuickDbError::TypeMismatch { ref field, .. } if field == "age"));

    let err = users.create(&object(json!({"name": "bob", "nickname": "b"}))).unwrap_err();
    assert!(matches!(err, QuickDbError::Metadata { .. }));

    assert_eq!(db.bridge().row_count("user", "default"), 0);
}

#[test]
fn test_find_with_conditions_sort_and_paging() {
    let db = ready_db();
    let users = db.handle("user").unwrap();
    for (name, age) in [("alice", 30), ("bob", 25), ("carol", 35), ("dave", 40)] {
        users
            .create(&object(json!({"name": name, "age": age})))
            .unwrap();
    }

    let query = FindQuery::new()
        .filter(Condition::new("age", QueryOperator::Gte, 30))
        .sort("age", SortDirection::Desc)
        .limit(2);
    let response = users.find(&query).unwrap();
    let names: Vec<&str> = response
        .data
        .as_ref()
        .and_then(JsonValue::as_array)
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["dave", "carol"]);

    let query = FindQuery::new().sort("name", SortDirection::Asc).offset(1).limit(1);
    let response = users.find(&query).unwrap();
    assert_eq!(response.data.unwrap()[0]["name"], json!("bob"));

    let count = users
        .count(&[Condition::new("name", QueryOperator::StartsWith, "c")])
        .unwrap();
    assert_eq!(count.affected(), Some(1));
}

#[test]
fn test_find_with_or_group_and_ignore_case() {
    let db = ready_db();
    let users = db.handle("user").unwrap();
    for (name, age) in [("Alice", 30), ("bob", 15), ("carol", 35), ("dave", 12)] {
        users
            .create(&object(json!({"name": name, "age": age})))
            .unwrap();
    }

    let query = FindQuery::new()
        .filter(Condition::or(vec![
            Condition::new("age", QueryOperator::Lt, 13),
            Condition::new("name", QueryOperator::Contains, "ALI").ignore_case(),
        ]))
        .sort("name", SortDirection::Asc);
    let response = users.find(&query).unwrap();
    assert!(response.success, "{:?}", response.error);
    let names: Vec<&str> = response
        .data
        .as_ref()
        .and_then(JsonValue::as_array)
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alice", "dave"]);

    let count = users
        .count(&[Condition::and(vec![
            Condition::new("age", QueryOperator::Gte, 13),
            Condition::new("name", QueryOperator::EndsWith, "OL").ignore_case(),
        ])])
        .unwrap();
    assert_eq!(count.affected(), Some(1));
}

#[test]
fn test_update_and_delete_miss_succeed_with_zero() {
    let db = ready_db();
    let users = db.handle("user").unwrap();
    users.create(&object(json!({"name": "alice"}))).unwrap();

    let deleted = users.delete(&[Condition::exact("id", "absent")]).unwrap();
    assert!(deleted.success);
    assert_eq!(deleted.affected(), Some(0));

    let updated = users
        .update(&[Condition::exact("id", "absent")], &object(json!({"age": 1})))
        .unwrap();
    assert!(updated.success);
    assert_eq!(updated.affected(), Some(0));

    assert_eq!(db.bridge().row_count("user", "default"), 1);
}

#[test]
fn test_update_then_delete_hit() {
    let db = ready_db();
    let users = db.handle("user").unwrap();
    users.create(&object(json!({"name": "alice", "age": 30}))).unwrap();
    users.create(&object(json!({"name": "bob", "age": 30}))).unwrap();

    let updated = users
        .update(&[Condition::exact("age", 30)], &object(json!({"age": 31})))
        .unwrap();
    assert_eq!(updated.affected(), Some(2));
    assert_eq!(
        users.count(&[Condition::exact("age", 31)]).unwrap().affected(),
        Some(2)
    );

    let deleted = users.delete(&[Condition::exact("name", "bob")]).unwrap();
    assert_eq!(deleted.affected(), Some(1));
    assert_eq!(users.count(&[]).unwrap().affected(), Some(1));
}

#[test]
fn test_unique_field_violation_is_failure_response() {
    let db = ready_db();
    let users = db.handle("user").unwrap();
    let data = object(json!({"name": "alice", "email": "a@example.com"}));
    assert!(users.create(&data).unwrap().success);

    let response = users.create(&data).unwrap();
    assert!(!response.success);
    assert!(response.error_message().contains("unique"));
}

#[test]
fn test_transport_failure_becomes_failure_response() {
    let mut db = QuickDb::new(RecordingBridge::unreachable());
    db.add_database(DatabaseConfig::sqlite("default", ":memory:")).unwrap();
    db.register_model(simple_model("Note")).unwrap();
    let notes = db.handle("note").unwrap();

    let response = notes.find(&FindQuery::new()).unwrap();
    assert!(!response.success);
    assert_eq!(response.data, Some(json!([])));
    assert_eq!(response.error_message(), "Engine error: connection refused");

    let response = notes.count(&[]).unwrap();
    assert_eq!(response.data, Some(json!(0)));

    assert!(!db.drop_table("note", "default").success);
}

#[test]
fn test_validate_before_submit() {
    let config = AppConfig {
        validate_before_submit: true,
        ..Default::default()
    };
    let mut db = QuickDb::with_config(MemoryBridge::new(), &config);
    db.add_database(DatabaseConfig::sqlite("default", ":memory:")).unwrap();
    db.register_model(user_model()).unwrap();
    let users = db.handle("user").unwrap();

    let err = users.create(&object(json!({"age": 3}))).unwrap_err();
    assert_eq!(err, QuickDbError::validation("name", "Field required"));

    let err = users
        .create(&object(json!({"name": "a-name-that-is-far-too-long-to-fit"})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_drop_table() {
    let db = ready_db();
    let users = db.handle("user").unwrap();
    users.create(&object(json!({"name": "alice"}))).unwrap();

    assert!(db.drop_table("user", "default").success);
    assert_eq!(db.bridge().row_count("user", "default"), 0);
    assert!(!db.drop_table("user", "missing").success);
}
