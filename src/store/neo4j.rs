//! Neo4j-backed semantic store
//!
//! Facts live in the graph as
//! `(:DataItem {key})-[:PROPERTY {key, seq}]->(:DataItem {key})`, where a
//! data item's `key` is its canonical serialization (see
//! [`DataItem::serialization`]) and `seq` increases with every assertion.
//! Writing facts is left to the ingestion pipeline; this adapter only reads.

use crate::config::Neo4jSettings;
use crate::error::{LookupError, Result};
use crate::query::{Comparator, Description, Query, QueryResult, ResultField, ResultRow, SortOrder};
use crate::schema::types::{DataItem, Property, WikiPage};
use crate::store::SemanticStore;
use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph};
use tracing::{debug, info, warn};

/// Semantic store over a Neo4j graph
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Connect using the given settings
    ///
    /// # Example
    /// ```no_run
    /// use interlang_kg::{config::Neo4jSettings, store::Neo4jStore};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let store = Neo4jStore::connect(&Neo4jSettings::from_env()).await?;
    ///     println!("Database healthy: {}", store.health_check().await?);
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(settings: &Neo4jSettings) -> Result<Self> {
        info!(
            "Connecting to Neo4j at {} (database: {})",
            settings.uri, settings.database
        );

        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str())
            .db(settings.database.as_str())
            .fetch_size(settings.fetch_size)
            .max_connections(settings.max_connections)
            .build()
            .map_err(|e| LookupError::ConfigError(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| LookupError::ConnectionError(e.to_string()))?;

        info!("Successfully connected to Neo4j");

        Ok(Self { graph })
    }

    /// Wrap an existing connection
    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }

    /// Get a reference to the underlying Neo4j Graph instance
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Simple health check using RETURN 1
    pub async fn health_check(&self) -> Result<bool> {
        debug!("Executing simple health check (RETURN 1)");

        self.graph
            .run(query("RETURN 1"))
            .await
            .map_err(|e| LookupError::ConnectionError(e.to_string()))?;

        Ok(true)
    }

    fn parse_items(keys: Vec<String>) -> Vec<DataItem> {
        keys.into_iter()
            .filter_map(|key| {
                let item = DataItem::from_serialization(&key);
                if item.is_none() {
                    debug!("Skipping unrecognized data item key: {}", key);
                }
                item
            })
            .collect()
    }
}

/// Cypher text plus its string parameters
#[derive(Debug, Default)]
struct CypherQuery {
    text: String,
    params: Vec<(String, String)>,
    limit: Option<i64>,
}

/// Translates query descriptions into Cypher
#[derive(Debug, Default)]
struct CypherBuilder {
    params: Vec<(String, String)>,
    vars: usize,
}

impl CypherBuilder {
    fn param(&mut self, value: String) -> String {
        let name = format!("p{}", self.params.len());
        self.params.push((name.clone(), value));
        name
    }

    fn var(&mut self) -> String {
        self.vars += 1;
        format!("v{}", self.vars)
    }

    fn condition(&mut self, description: &Description, var: &str) -> String {
        match description {
            Description::Thing => "true".to_string(),
            Description::Value { item, comparator } => {
                let name = self.param(item.serialization());
                let op = match comparator {
                    Comparator::Equal => "=",
                    Comparator::NotEqual => "<>",
                };
                format!("{}.key {} ${}", var, op, name)
            }
            Description::SomeProperty {
                property,
                description,
            } => {
                let name = self.param(property.key().to_string());
                let inner_var = self.var();
                let inner = self.condition(description, &inner_var);
                format!(
                    "EXISTS {{ MATCH ({})-[:PROPERTY {{key: ${}}}]->({}:DataItem) WHERE {} }}",
                    var, name, inner_var, inner
                )
            }
            Description::Conjunction(parts) if parts.is_empty() => "true".to_string(),
            Description::Conjunction(parts) => parts
                .iter()
                .map(|part| format!("({})", self.condition(part, var)))
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }

    fn collect_values(&mut self, property: &Property, alias: &str) -> String {
        let name = self.param(property.key().to_string());
        format!(
            "COLLECT {{ MATCH (s)-[r:PROPERTY {{key: ${}}}]->(o:DataItem) RETURN o.key ORDER BY r.seq }} AS {}",
            name, alias
        )
    }

    fn build(mut self, query: &Query) -> CypherQuery {
        let condition = self.condition(query.description(), "s");

        let mut columns: Vec<String> = query
            .print_requests()
            .iter()
            .enumerate()
            .map(|(i, request)| self.collect_values(request.target(), &format!("col{}", i)))
            .collect();

        // Without an explicit sort, rows follow first assertion of the subject
        let order = match query.sort() {
            Some((property, order)) => {
                columns.push(self.collect_values(property, "sort_values"));
                match order {
                    SortOrder::Ascending => "ORDER BY head(sort_values) ASC",
                    SortOrder::Descending => "ORDER BY head(sort_values) DESC",
                }
            }
            None => {
                columns.push(
                    "head(COLLECT { MATCH (s)-[r:PROPERTY]->(:DataItem) RETURN r.seq ORDER BY r.seq LIMIT 1 }) AS first_seq"
                        .to_string(),
                );
                "ORDER BY first_seq ASC"
            }
        };

        let mut text = format!(
            "MATCH (s:DataItem) WHERE s.key STARTS WITH 'page:' AND {}\nWITH s",
            condition
        );
        for column in &columns {
            text.push_str(", ");
            text.push_str(column);
        }
        text.push_str("\nRETURN s.key AS subject");
        for i in 0..query.print_requests().len() {
            text.push_str(&format!(", col{}", i));
        }
        text.push('\n');
        text.push_str(order);

        // One extra row tells us whether the cap cut anything off
        let limit = query.limit().map(|limit| limit as i64 + 1);
        if limit.is_some() {
            text.push_str("\nLIMIT $limit");
        }

        CypherQuery {
            text,
            params: self.params,
            limit,
        }
    }
}

#[async_trait]
impl SemanticStore for Neo4jStore {
    async fn get_property_values(
        &self,
        subject: &WikiPage,
        property: &Property,
    ) -> Result<Vec<DataItem>> {
        let cypher = query(
            "MATCH (s:DataItem {key: $subject})-[r:PROPERTY {key: $property}]->(o:DataItem)
             RETURN o.key AS value
             ORDER BY r.seq ASC",
        )
        .param("subject", DataItem::WikiPage(subject.clone()).serialization())
        .param("property", property.key().to_string());

        let mut result = self.graph.execute(cypher).await.map_err(|e| {
            LookupError::QueryError(format!("Failed to read property values: {}", e))
        })?;

        let mut keys = Vec::new();
        while let Some(row) = result.next().await? {
            let key: String = row.get("value").map_err(|e| {
                LookupError::QueryError(format!("Failed to extract property value: {}", e))
            })?;
            keys.push(key);
        }

        Ok(Self::parse_items(keys))
    }

    async fn get_query_result(&self, semantic_query: &Query) -> Result<QueryResult> {
        let cypher_query = CypherBuilder::default().build(semantic_query);
        debug!("Executing Cypher query: {}", cypher_query.text);

        let mut cypher = query(&cypher_query.text);
        for (name, value) in &cypher_query.params {
            cypher = cypher.param(name, value.clone());
        }
        if let Some(limit) = cypher_query.limit {
            cypher = cypher.param("limit", limit);
        }

        let mut result = self
            .graph
            .execute(cypher)
            .await
            .map_err(|e| LookupError::QueryError(format!("Failed to execute query: {}", e)))?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            let subject_key: String = row.get("subject").map_err(|e| {
                LookupError::QueryError(format!("Failed to extract result subject: {}", e))
            })?;

            let subject = match DataItem::from_serialization(&subject_key) {
                Some(DataItem::WikiPage(page)) => page,
                _ => {
                    warn!("Skipping result row with non-page subject: {}", subject_key);
                    continue;
                }
            };

            let mut fields = Vec::with_capacity(semantic_query.print_requests().len());
            for (i, request) in semantic_query.print_requests().iter().enumerate() {
                let keys: Vec<String> = row.get(&format!("col{}", i)).unwrap_or_default();
                fields.push(ResultField::new(
                    subject.clone(),
                    request.clone(),
                    Self::parse_items(keys),
                ));
            }

            rows.push(ResultRow::new(subject, fields));
        }

        let further_results = match semantic_query.limit() {
            Some(limit) if rows.len() > limit => {
                rows.truncate(limit);
                true
            }
            _ => false,
        };

        Ok(QueryResult::new(rows, further_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PrintRequest;
    use crate::schema::properties::PropertyRegistry;
    use crate::schema::types::Title;

    fn reference_query() -> Query {
        Query::new(Description::conjunction(vec![Description::some_property(
            PropertyRegistry::reference(),
            Description::value(DataItem::WikiPage(WikiPage::new(Title::new("Topic")))),
        )]))
        .with_print_request(PrintRequest::property(PropertyRegistry::language()))
    }

    #[test]
    fn test_cypher_for_reference_query() {
        let cypher = CypherBuilder::default().build(&reference_query().with_limit(Some(10)));

        assert!(cypher.text.contains("EXISTS { MATCH (s)-[:PROPERTY {key: $p0}]->(v1:DataItem) WHERE v1.key = $p1 }"));
        assert!(cypher.text.contains("AS col0"));
        assert!(cypher.text.contains("RETURN s.key AS subject, col0"));
        assert!(cypher.text.contains("ORDER BY first_seq ASC"));
        assert!(cypher.text.ends_with("LIMIT $limit"));
        assert_eq!(cypher.limit, Some(11));

        assert_eq!(
            cypher.params,
            vec![
                ("p0".to_string(), PropertyRegistry::SIL_REF.to_string()),
                ("p1".to_string(), "page:Topic".to_string()),
                ("p2".to_string(), PropertyRegistry::SIL_LANG.to_string()),
            ]
        );
    }

    #[test]
    fn test_cypher_sorting_and_unbounded() {
        let query = reference_query().sorted_by(PropertyRegistry::language(), SortOrder::Descending);
        let cypher = CypherBuilder::default().build(&query);

        assert!(cypher.text.contains("AS sort_values"));
        assert!(cypher.text.contains("ORDER BY head(sort_values) DESC"));
        assert!(!cypher.text.contains("LIMIT"));
        assert_eq!(cypher.limit, None);
    }

    #[test]
    fn test_cypher_empty_conjunction() {
        let cypher = CypherBuilder::default().build(&Query::new(Description::conjunction(Vec::new())));
        assert!(cypher.text.contains("STARTS WITH 'page:' AND true"));
        assert!(cypher.params.is_empty());
    }

    #[test]
    fn test_parse_items_skips_unknown_keys() {
        let items = Neo4jStore::parse_items(vec![
            "blob:en".to_string(),
            "bogus".to_string(),
            "page:Foo#c1".to_string(),
        ]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], DataItem::Blob("en".to_string()));
    }
}
