//! In-process triple store
//!
//! Keeps facts in assertion order and evaluates [`Query`] descriptions
//! directly against them. Used by embedders without a graph database and by
//! the test suites, which also use its counters and failure switch.

use crate::error::{LookupError, Result};
use crate::query::{Description, Query, QueryResult, ResultField, ResultRow, SortOrder};
use crate::schema::link::InterlanguageLink;
use crate::schema::properties::PropertyRegistry;
use crate::schema::types::{DataItem, Property, Title, WikiPage};
use crate::store::SemanticStore;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct Fact {
    subject: WikiPage,
    property: Property,
    value: DataItem,
}

#[derive(Debug, Default)]
struct StoreState {
    /// Facts in assertion order
    facts: Vec<Fact>,

    /// When set, every read fails with this message
    failure: Option<String>,
}

/// Triple store held in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
    queries: AtomicU64,
    property_reads: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert a single fact
    pub async fn add_property_value(&self, subject: WikiPage, property: Property, value: DataItem) {
        let mut state = self.state.write().await;
        state.facts.push(Fact {
            subject,
            property,
            value,
        });
    }

    /// Record `link` as a container subobject on `target`
    ///
    /// Writes the container's reference and language values and the
    /// `SIL_CONTAINER` edge from the target page. Returns the container.
    pub async fn add_interlanguage_link(&self, link: &InterlanguageLink, target: &Title) -> WikiPage {
        let container = WikiPage::with_subobject(target.clone(), link.container_id());

        let mut state = self.state.write().await;
        state.facts.push(Fact {
            subject: container.clone(),
            property: PropertyRegistry::reference(),
            value: link.link_reference_data_value().data_item().clone(),
        });
        state.facts.push(Fact {
            subject: container.clone(),
            property: PropertyRegistry::language(),
            value: link.language_data_value().data_item().clone(),
        });
        state.facts.push(Fact {
            subject: WikiPage::from_title(target),
            property: PropertyRegistry::container(),
            value: DataItem::WikiPage(container.clone()),
        });

        debug!("Recorded interlanguage container {} on {}", container, target);
        container
    }

    /// Drop every fact about `subject` and every fact pointing at it
    ///
    /// Returns the number of facts removed.
    pub async fn remove_subject(&self, subject: &WikiPage) -> usize {
        let mut state = self.state.write().await;
        let before = state.facts.len();
        state.facts.retain(|fact| {
            &fact.subject != subject && fact.value.as_wiki_page() != Some(subject)
        });
        before - state.facts.len()
    }

    /// Make every subsequent read fail, or recover with `None`
    pub async fn fail_with(&self, message: Option<String>) {
        self.state.write().await.failure = message;
    }

    /// Number of structured queries executed so far
    pub fn query_count(&self) -> u64 {
        self.queries.load(AtomicOrdering::SeqCst)
    }

    /// Number of property value reads so far
    pub fn property_read_count(&self) -> u64 {
        self.property_reads.load(AtomicOrdering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.facts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.facts.is_empty()
    }

    fn values_of(facts: &[Fact], subject: &WikiPage, property: &Property) -> Vec<DataItem> {
        facts
            .iter()
            .filter(|fact| &fact.subject == subject && &fact.property == property)
            .map(|fact| fact.value.clone())
            .collect()
    }

    fn item_matches(facts: &[Fact], item: &DataItem, description: &Description) -> bool {
        match description {
            Description::Thing | Description::Value { .. } => description.matches_item(item),
            Description::SomeProperty {
                property,
                description,
            } => match item.as_wiki_page() {
                Some(subject) => facts.iter().any(|fact| {
                    &fact.subject == subject
                        && &fact.property == property
                        && Self::item_matches(facts, &fact.value, description)
                }),
                None => false,
            },
            Description::Conjunction(parts) => parts
                .iter()
                .all(|part| Self::item_matches(facts, item, part)),
        }
    }

    /// Distinct subjects in order of first assertion
    fn subjects(facts: &[Fact]) -> Vec<WikiPage> {
        let mut subjects: Vec<WikiPage> = Vec::new();
        for fact in facts {
            if !subjects.contains(&fact.subject) {
                subjects.push(fact.subject.clone());
            }
        }
        subjects
    }

    fn ensure_available(state: &StoreState) -> Result<()> {
        match &state.failure {
            Some(message) => Err(LookupError::StoreError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SemanticStore for InMemoryStore {
    async fn get_property_values(
        &self,
        subject: &WikiPage,
        property: &Property,
    ) -> Result<Vec<DataItem>> {
        self.property_reads.fetch_add(1, AtomicOrdering::SeqCst);

        let state = self.state.read().await;
        Self::ensure_available(&state)?;

        Ok(Self::values_of(&state.facts, subject, property))
    }

    async fn get_query_result(&self, query: &Query) -> Result<QueryResult> {
        self.queries.fetch_add(1, AtomicOrdering::SeqCst);

        let state = self.state.read().await;
        Self::ensure_available(&state)?;

        let facts = &state.facts;
        let mut subjects: Vec<WikiPage> = Self::subjects(facts)
            .into_iter()
            .filter(|subject| {
                Self::item_matches(
                    facts,
                    &DataItem::WikiPage(subject.clone()),
                    query.description(),
                )
            })
            .collect();

        if let Some((property, order)) = query.sort() {
            let sort_key = |subject: &WikiPage| {
                Self::values_of(facts, subject, property)
                    .first()
                    .map(|item| item.serialization())
            };
            subjects.sort_by(|a, b| {
                // Subjects without a sort value go last either way
                match (sort_key(a), sort_key(b)) {
                    (Some(a), Some(b)) => match order {
                        SortOrder::Ascending => a.cmp(&b),
                        SortOrder::Descending => b.cmp(&a),
                    },
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            });
        }

        let mut further_results = false;
        if let Some(limit) = query.limit() {
            if subjects.len() > limit {
                subjects.truncate(limit);
                further_results = true;
            }
        }

        let rows = subjects
            .into_iter()
            .map(|subject| {
                let fields = query
                    .print_requests()
                    .iter()
                    .map(|request| {
                        ResultField::new(
                            subject.clone(),
                            request.clone(),
                            Self::values_of(facts, &subject, request.target()),
                        )
                    })
                    .collect();
                ResultRow::new(subject, fields)
            })
            .collect::<Vec<_>>();

        debug!(
            "In-memory query matched {} rows (further results: {})",
            rows.len(),
            further_results
        );

        Ok(QueryResult::new(rows, further_results))
    }
}
