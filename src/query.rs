//! Structured queries against a semantic store
//!
//! A [`Query`] is a [`Description`] of the subjects to select plus a list of
//! [`PrintRequest`]s naming the property values to project alongside each
//! subject. Stores answer with a [`QueryResult`], a sequence of rows with one
//! [`ResultField`] per print request.

use crate::schema::types::{DataItem, DataValue, Property, WikiPage};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Comparison applied by a value description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Equal,
    NotEqual,
}

/// Condition a subject must satisfy to be selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Description {
    /// Matches anything
    Thing,

    /// Matches a value compared against a fixed item
    Value {
        item: DataItem,
        comparator: Comparator,
    },

    /// Subject has some value of `property` matching `description`
    SomeProperty {
        property: Property,
        description: Box<Description>,
    },

    /// All inner descriptions must hold
    Conjunction(Vec<Description>),
}

impl Description {
    /// Value equal to `item`
    pub fn value(item: DataItem) -> Self {
        Description::Value {
            item,
            comparator: Comparator::Equal,
        }
    }

    pub fn some_property(property: Property, description: Description) -> Self {
        Description::SomeProperty {
            property,
            description: Box::new(description),
        }
    }

    pub fn conjunction(descriptions: Vec<Description>) -> Self {
        Description::Conjunction(descriptions)
    }

    /// Check a value-level description against a single item
    ///
    /// Property-level descriptions cannot be decided from one item and
    /// never match here; stores resolve them against their own facts.
    pub fn matches_item(&self, item: &DataItem) -> bool {
        match self {
            Description::Thing => true,
            Description::Value {
                item: expected,
                comparator,
            } => {
                let equal = expected.serialization() == item.serialization();
                match comparator {
                    Comparator::Equal => equal,
                    Comparator::NotEqual => !equal,
                }
            }
            Description::Conjunction(parts) => parts.iter().all(|d| d.matches_item(item)),
            Description::SomeProperty { .. } => false,
        }
    }
}

/// A property value to project for every selected subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintRequest {
    property: Property,
    label: Option<String>,
}

impl PrintRequest {
    pub fn property(property: Property) -> Self {
        Self {
            property,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn target(&self) -> &Property {
        &self.property
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.property.key())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A complete query: selection, projections, cap and optional ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    description: Description,
    print_requests: Vec<PrintRequest>,
    limit: Option<usize>,
    sort: Option<(Property, SortOrder)>,
}

impl Query {
    pub fn new(description: Description) -> Self {
        Self {
            description,
            print_requests: Vec::new(),
            limit: None,
            sort: None,
        }
    }

    pub fn with_print_request(mut self, request: PrintRequest) -> Self {
        self.print_requests.push(request);
        self
    }

    /// Cap the number of result rows; `None` leaves the query unbounded
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Order rows by the first value of `property`
    pub fn sorted_by(mut self, property: Property, order: SortOrder) -> Self {
        self.sort = Some((property, order));
        self
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn print_requests(&self) -> &[PrintRequest] {
        &self.print_requests
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn sort(&self) -> Option<&(Property, SortOrder)> {
        self.sort.as_ref()
    }
}

/// Values of one print request for one result subject
#[derive(Debug, Clone, PartialEq)]
pub struct ResultField {
    subject: WikiPage,
    print_request: PrintRequest,
    values: VecDeque<DataValue>,
}

impl ResultField {
    pub fn new(subject: WikiPage, print_request: PrintRequest, items: Vec<DataItem>) -> Self {
        let property = print_request.target().clone();
        let values = items
            .into_iter()
            .map(|item| DataValue::new(property.clone(), item))
            .collect();

        Self {
            subject,
            print_request,
            values,
        }
    }

    /// Take the next value of this field, `None` once exhausted
    pub fn next_data_value(&mut self) -> Option<DataValue> {
        self.values.pop_front()
    }

    /// Subject the field belongs to
    pub fn result_subject(&self) -> &WikiPage {
        &self.subject
    }

    pub fn print_request(&self) -> &PrintRequest {
        &self.print_request
    }
}

/// One selected subject with its projected fields
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    subject: WikiPage,
    fields: Vec<ResultField>,
}

impl ResultRow {
    pub fn new(subject: WikiPage, fields: Vec<ResultField>) -> Self {
        Self { subject, fields }
    }

    pub fn subject(&self) -> &WikiPage {
        &self.subject
    }

    pub fn fields(&self) -> &[ResultField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<ResultField> {
        self.fields
    }
}

/// Rows returned by a store, consumed front to back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    rows: VecDeque<ResultRow>,
    further_results: bool,
}

impl QueryResult {
    pub fn new(rows: Vec<ResultRow>, further_results: bool) -> Self {
        Self {
            rows: rows.into(),
            further_results,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Take the next row, `None` at the end of results
    pub fn next_row(&mut self) -> Option<ResultRow> {
        self.rows.pop_front()
    }

    /// True when the store dropped rows past the query limit
    pub fn has_further_results(&self) -> bool {
        self.further_results
    }

    /// Rows not yet consumed
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Iterator for QueryResult {
    type Item = ResultRow;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }
}
