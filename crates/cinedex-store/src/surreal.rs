//! SurrealDB implementation of the document store
//!
//! Each collection is a schemaless table. Documents are keyed by their
//! record id (`table:key`) and read back with the id field omitted, so what
//! comes out is exactly the JSON object that went in. Table scans return
//! records in key order; with time-ordered keys that is insertion order.

use async_trait::async_trait;
use cinedex_core::{CinedexError, DatabaseConfig, Result};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::{Map, Value};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

use crate::filter::Condition;
use crate::{DocumentStore, Filter};

/// SurrealDB document store
pub struct SurrealDocumentStore {
    client: Surreal<Client>,
}

impl SurrealDocumentStore {
    /// Create a new SurrealDB connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // Remove ws:// or wss:// prefix if present (surrealdb crate adds it automatically)
        let url = config
            .surrealdb_url
            .strip_prefix("ws://")
            .or_else(|| config.surrealdb_url.strip_prefix("wss://"))
            .unwrap_or(&config.surrealdb_url);

        let client = Surreal::new::<Ws>(url)
            .await
            .map_err(|e| CinedexError::DatabaseError(format!("SurrealDB connection failed: {e}")))?;

        // Authenticate
        client
            .signin(Root {
                username: &config.surrealdb_user,
                password: &config.surrealdb_pass,
            })
            .await
            .map_err(|e| CinedexError::DatabaseError(format!("SurrealDB auth failed: {e}")))?;

        // Select namespace and database
        client
            .use_ns(&config.surrealdb_namespace)
            .use_db(&config.surrealdb_database)
            .await
            .map_err(|e| CinedexError::DatabaseError(format!("SurrealDB namespace error: {e}")))?;

        tracing::info!(
            url = %config.surrealdb_url,
            namespace = %config.surrealdb_namespace,
            database = %config.surrealdb_database,
            "Connected to SurrealDB"
        );

        Ok(Self { client })
    }

    /// Initialize schema (run once on setup, safe to repeat)
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
                REMOVE INDEX IF EXISTS idx_user_email ON user;
                REMOVE INDEX IF EXISTS idx_user_username ON user;
                DEFINE FIELD IF NOT EXISTS email_key ON user VALUE string::lowercase(email ?? '');
                DEFINE FIELD IF NOT EXISTS username_key ON user VALUE string::lowercase(username ?? '');
                DEFINE INDEX IF NOT EXISTS idx_user_email_key ON user FIELDS email_key UNIQUE;
                DEFINE INDEX IF NOT EXISTS idx_user_username_key ON user FIELDS username_key UNIQUE;
                DEFINE TABLE IF NOT EXISTS genre SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS idx_genre_name ON genre FIELDS name;
                DEFINE TABLE IF NOT EXISTS movie SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS idx_movie_genre ON movie FIELDS genre_id;
                DEFINE TABLE IF NOT EXISTS review SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS idx_review_movie ON review FIELDS movie_id;
                DEFINE INDEX IF NOT EXISTS idx_review_reviewer ON review FIELDS reviewer_id;
            "#,
            )
            .await
            .and_then(|response| response.check())
            .map_err(|e| CinedexError::DatabaseError(format!("Schema init failed: {e}")))?;

        Ok(())
    }

    /// Run a `SELECT ... FROM type::table($table) [WHERE ...]` query
    async fn select(
        &self,
        projection: &str,
        collection: &str,
        filter: &Filter,
        suffix: &str,
    ) -> Result<surrealdb::Response> {
        filter.validate()?;
        let (clause, mut params) = where_clause(filter);
        params.insert("table".to_string(), Value::String(collection.to_string()));

        let query = format!("SELECT {projection} FROM type::table($table){clause}{suffix}");
        self.client
            .query(query)
            .bind(Value::Object(params))
            .await
            .map_err(|e| CinedexError::DatabaseError(format!("Query failed: {e}")))
    }
}

/// Compile a filter into a `WHERE` clause and its bound parameters.
///
/// Values are always passed as parameters; only validated field names are
/// spliced into the query text.
fn where_clause(filter: &Filter) -> (String, Map<String, Value>) {
    let mut params = Map::new();
    let mut terms = Vec::with_capacity(filter.conditions().len());

    for (i, condition) in filter.conditions().iter().enumerate() {
        let param = format!("p{i}");
        let term = match condition {
            Condition::Equals { field, value } => {
                params.insert(param.clone(), value.clone());
                format!("{field} = ${param}")
            }
            Condition::NotEquals { field, value } => {
                params.insert(param.clone(), value.clone());
                format!("{field} != ${param}")
            }
            Condition::EqualsIgnoreCase { field, value } => {
                params.insert(param.clone(), Value::String(value.to_lowercase()));
                format!("string::lowercase({field} ?? '') = ${param}")
            }
            Condition::ContainsIgnoreCase { field, value } => {
                params.insert(param.clone(), Value::String(value.to_lowercase()));
                format!("string::contains(string::lowercase({field} ?? ''), ${param})")
            }
        };
        terms.push(term);
    }

    if terms.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", terms.join(" AND ")), params)
    }
}

fn record_params(collection: &str, key: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("table".to_string(), Value::String(collection.to_string()));
    params.insert("key".to_string(), Value::String(key.to_string()));
    params
}

fn db_error(action: &str) -> impl Fn(surrealdb::Error) -> CinedexError + '_ {
    move |e| CinedexError::DatabaseError(format!("{action} failed: {e}"))
}

// Unique indexes over lowercased copies of a field, and the field they guard
const UNIQUE_INDEXES: [(&str, &str); 2] = [
    ("idx_user_email_key", "email"),
    ("idx_user_username_key", "username"),
];

/// Map a rejected `CREATE` to a duplicate: either the record id is taken or
/// a unique index already holds the value.
fn insert_conflict(collection: &str, key: &str, message: &str) -> Option<CinedexError> {
    if message.contains("already exists") {
        return Some(CinedexError::Duplicate(format!("{collection}:{key}")));
    }
    if !message.contains("already contains") {
        return None;
    }

    let field = UNIQUE_INDEXES
        .iter()
        .find(|(index, _)| message.contains(index))
        .map(|(_, field)| *field)
        .unwrap_or("record");
    Some(CinedexError::Duplicate(format!("this {field} already exists")))
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

#[async_trait]
impl DocumentStore for SurrealDocumentStore {
    async fn insert(&self, collection: &str, key: &str, document: Value) -> Result<()> {
        let mut params = record_params(collection, key);
        params.insert("doc".to_string(), document);

        let result = self
            .client
            .query("CREATE type::thing($table, $key) CONTENT $doc RETURN NONE")
            .bind(Value::Object(params))
            .await
            .and_then(|response| response.check());

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(insert_conflict(collection, key, &e.to_string())
                .unwrap_or_else(|| db_error("Insert")(e))),
        }
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let mut response = self
            .client
            .query("SELECT * OMIT id FROM type::thing($table, $key)")
            .bind(Value::Object(record_params(collection, key)))
            .await
            .map_err(db_error("Get"))?;

        let records: Vec<Value> = response.take(0).map_err(db_error("Result extraction"))?;
        Ok(records.into_iter().next())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        let mut response = self.select("* OMIT id", collection, filter, " LIMIT 1").await?;
        let records: Vec<Value> = response.take(0).map_err(db_error("Result extraction"))?;
        Ok(records.into_iter().next())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let mut response = self.select("* OMIT id", collection, filter, "").await?;
        response.take(0).map_err(db_error("Result extraction"))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut response = self
            .select("count() AS total", collection, filter, " GROUP ALL")
            .await?;
        let row: Option<CountRow> = response.take(0).map_err(db_error("Result extraction"))?;
        Ok(row.map(|r| r.total).unwrap_or(0))
    }

    async fn update(&self, collection: &str, key: &str, patch: Value) -> Result<Option<Value>> {
        let mut params = record_params(collection, key);
        params.insert("patch".to_string(), patch);

        // UPDATE never creates a missing record
        let mut response = self
            .client
            .query("UPDATE type::thing($table, $key) MERGE $patch RETURN NONE")
            .query("SELECT * OMIT id FROM type::thing($table, $key)")
            .bind(Value::Object(params))
            .await
            .map_err(db_error("Update"))?;

        let records: Vec<Value> = response.take(1).map_err(db_error("Result extraction"))?;
        Ok(records.into_iter().next())
    }

    async fn upsert(&self, collection: &str, key: &str, patch: Value) -> Result<Value> {
        let mut params = record_params(collection, key);
        params.insert("patch".to_string(), patch);

        let mut response = self
            .client
            .query("UPSERT type::thing($table, $key) MERGE $patch RETURN NONE")
            .query("SELECT * OMIT id FROM type::thing($table, $key)")
            .bind(Value::Object(params))
            .await
            .map_err(db_error("Upsert"))?;

        let records: Vec<Value> = response.take(1).map_err(db_error("Result extraction"))?;
        records.into_iter().next().ok_or_else(|| {
            CinedexError::DatabaseError(format!("Upsert of {collection}:{key} returned nothing"))
        })
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let mut response = self
            .client
            .query("DELETE type::thing($table, $key) RETURN BEFORE")
            .bind(Value::Object(record_params(collection, key)))
            .await
            .map_err(db_error("Delete"))?;

        let removed: Vec<IgnoredAny> = response.take(0).map_err(db_error("Result extraction"))?;
        Ok(!removed.is_empty())
    }

    async fn ping(&self) -> Result<()> {
        self.client.health().await.map_err(db_error("Health check"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_filter_has_no_where_clause() {
        let (clause, params) = where_clause(&Filter::all());
        assert!(clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_where_clause_binds_values() {
        let filter = Filter::all()
            .eq("genre_id", "g-1")
            .contains_ignore_case("name", "Star");
        let (clause, params) = where_clause(&filter);

        assert_eq!(
            clause,
            " WHERE genre_id = $p0 AND string::contains(string::lowercase(name ?? ''), $p1)"
        );
        assert_eq!(params["p0"], json!("g-1"));
        assert_eq!(params["p1"], json!("star"));
    }

    #[test]
    fn test_case_insensitive_equality_lowercases_value() {
        let filter = Filter::all()
            .eq_ignore_case("email", "Ada@Example.com")
            .ne("user_id", "u-1");
        let (clause, params) = where_clause(&filter);

        assert_eq!(
            clause,
            " WHERE string::lowercase(email ?? '') = $p0 AND user_id != $p1"
        );
        assert_eq!(params["p0"], json!("ada@example.com"));
    }

    #[test]
    fn test_index_violation_is_duplicate() {
        let err = insert_conflict(
            "user",
            "u-2",
            "Database index `idx_user_email_key` already contains 'ada@example.com', with record `user:u-1`",
        );
        assert!(
            matches!(err, Some(CinedexError::Duplicate(ref msg)) if msg == "this email already exists")
        );

        let err = insert_conflict("user", "u-1", "Database record `user:u-1` already exists");
        assert!(matches!(err, Some(CinedexError::Duplicate(ref msg)) if msg == "user:u-1"));

        assert!(insert_conflict("user", "u-1", "connection reset").is_none());
    }
}
