//! Item queries

use crate::item::Item;
use serde::{Deserialize, Serialize};

/// How a query clause must occur in matching items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occurrence {
    #[default]
    Should,
    Must,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAttribute {
    pub name: String,
    pub value: String,
    pub occurrence: Occurrence,
}

/// Item search criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Object type qualifier.
    pub type_name: String,
    pub attrs: Vec<QueryAttribute>,
    pub folder_path: String,
    /// Only objects modified after this timestamp (millis); zero disables it.
    pub modify_date: i64,
    /// Result cap; zero or negative means unlimited.
    pub max_rows: i64,
}

impl Query {
    /// Evaluates the attribute clauses against an item.
    ///
    /// Every MUST clause has to match. When SHOULD clauses exist and no MUST
    /// clause does, at least one SHOULD clause has to match.
    pub fn matches(&self, item: &Item) -> bool {
        let clause_matches = |attr: &QueryAttribute| {
            item.value_of(&attr.name)
                .and_then(|v| v.as_text())
                .is_some_and(|text| text.eq_ignore_ascii_case(&attr.value))
        };

        let (must, should): (Vec<_>, Vec<_>) = self
            .attrs
            .iter()
            .partition(|a| a.occurrence == Occurrence::Must);

        if !must.iter().all(|&a| clause_matches(a)) {
            return false;
        }
        !must.is_empty() || should.is_empty() || should.iter().any(|&a| clause_matches(a))
    }

    pub fn row_limit(&self) -> Option<usize> {
        usize::try_from(self.max_rows).ok().filter(|n| *n > 0)
    }
}
