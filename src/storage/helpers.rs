//! Shared query evaluation.
//!
//! Filtering, sorting and pagination over decoded entities, used by every
//! backend so list/count semantics are identical across them.

use std::cmp::Ordering;

use crate::model::entity::{SORT_CREATE_TIME, SORT_UPDATE_TIME};
use crate::model::{Entity, FilterOptions, Index, ListOptions, SortOption, SortOrder};

/// Whether `entity` satisfies the exact-match `filter` and `options`.
pub fn matches<T: Entity>(entity: &T, filter: &Index, options: Option<&FilterOptions>) -> bool {
    let index = entity.index();

    let exact = filter
        .iter()
        .all(|(key, value)| index.get(key).is_some_and(|v| v == value));
    if !exact {
        return false;
    }

    let Some(options) = options else {
        return true;
    };

    let fuzzy = options.queries.iter().all(|q| {
        index
            .get(q.key.as_str())
            .is_some_and(|v| v.contains(&q.query))
    });
    let within = options.in_filters.iter().all(|q| {
        index
            .get(q.key.as_str())
            .is_some_and(|v| q.values.iter().any(|candidate| candidate == v))
    });
    let absent = options
        .is_not_exist
        .iter()
        .all(|key| !index.contains_key(key.as_str()));

    fuzzy && within && absent
}

fn compare_by<T: Entity>(a: &T, b: &T, sort: &SortOption) -> Ordering {
    let ordering = match sort.key.as_str() {
        SORT_CREATE_TIME => a.base().create_time.cmp(&b.base().create_time),
        SORT_UPDATE_TIME => a.base().update_time.cmp(&b.base().update_time),
        key => {
            let a_index = a.index();
            let b_index = b.index();
            a_index.get(key).cmp(&b_index.get(key))
        }
    };
    match sort.order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

/// Sort entities by each criterion in turn. Stable, so ties keep input order.
pub fn sort_entities<T: Entity>(entities: &mut [T], sort_by: &[SortOption]) {
    if sort_by.is_empty() {
        return;
    }
    entities.sort_by(|a, b| {
        sort_by
            .iter()
            .map(|sort| compare_by(a, b, sort))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Slice one 1-based page. Zero page or page size returns everything.
pub fn paginate<T>(entities: Vec<T>, page: usize, page_size: usize) -> Vec<T> {
    if page == 0 || page_size == 0 {
        return entities;
    }
    entities
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect()
}

/// Apply filter, sort and pagination in that order.
pub fn apply_list_options<T: Entity>(
    entities: impl IntoIterator<Item = T>,
    filter: &Index,
    options: &ListOptions,
) -> Vec<T> {
    let filter_options = (!options.filter.is_empty()).then_some(&options.filter);
    let mut selected: Vec<T> = entities
        .into_iter()
        .filter(|entity| matches(entity, filter, filter_options))
        .collect();
    sort_entities(&mut selected, &options.sort_by);
    paginate(selected, options.page, options.page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{INDEX_FINISHED, INDEX_NAME, INDEX_STATUS};
    use crate::model::{FinishedFlag, FuzzyQuery, InQuery, RecordStatus, WorkflowRecord};
    use chrono::{TimeZone, Utc};

    fn record(name: &str, finished: FinishedFlag, created_secs: i64) -> WorkflowRecord {
        let mut record = WorkflowRecord {
            app_primary_key: "shop".to_string(),
            workflow_name: "deploy".to_string(),
            name: name.to_string(),
            finished,
            status: RecordStatus::Running,
            ..Default::default()
        };
        record.base.create_time = Utc.timestamp_opt(created_secs, 0).unwrap();
        record
    }

    #[test]
    fn test_exact_filter_on_string_sentinel() {
        let records = vec![
            record("a", FinishedFlag::False, 1),
            record("b", FinishedFlag::True, 2),
            record("c", FinishedFlag::Unset, 3),
        ];
        let mut filter = Index::new();
        filter.insert(INDEX_FINISHED, "false".to_string());

        let selected = apply_list_options(records, &filter, &ListOptions::default());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "a");
    }

    #[test]
    fn test_is_not_exist_selects_unset_only() {
        let records = vec![
            record("a", FinishedFlag::False, 1),
            record("c", FinishedFlag::Unset, 3),
        ];
        let options = ListOptions {
            filter: FilterOptions {
                is_not_exist: vec![INDEX_FINISHED.to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let selected = apply_list_options(records, &Index::new(), &options);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "c");
    }

    #[test]
    fn test_fuzzy_and_in_filters() {
        let records = vec![
            record("deploy-001", FinishedFlag::False, 1),
            record("deploy-002", FinishedFlag::False, 2),
            record("hotfix-001", FinishedFlag::False, 3),
        ];
        let options = ListOptions {
            filter: FilterOptions {
                queries: vec![FuzzyQuery {
                    key: INDEX_NAME.to_string(),
                    query: "deploy".to_string(),
                }],
                in_filters: vec![InQuery {
                    key: INDEX_STATUS.to_string(),
                    values: vec!["running".to_string(), "complete".to_string()],
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        let selected = apply_list_options(records, &Index::new(), &options);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_sort_descending_then_paginate() {
        let records = vec![
            record("old", FinishedFlag::False, 1),
            record("new", FinishedFlag::False, 3),
            record("mid", FinishedFlag::False, 2),
        ];
        let options = ListOptions::paged(1, 2).sorted_by(SortOption::descending(SORT_CREATE_TIME));
        let selected = apply_list_options(records.clone(), &Index::new(), &options);
        let names: Vec<_> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["new", "mid"]);

        let second = ListOptions::paged(2, 2).sorted_by(SortOption::descending(SORT_CREATE_TIME));
        let selected = apply_list_options(records, &Index::new(), &second);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "old");
    }

    #[test]
    fn test_sort_ascending_by_index_key() {
        let records = vec![
            record("b", FinishedFlag::False, 1),
            record("c", FinishedFlag::False, 2),
            record("a", FinishedFlag::False, 3),
        ];
        let options = ListOptions::default().sorted_by(SortOption::ascending(INDEX_NAME));
        let selected = apply_list_options(records, &Index::new(), &options);
        let names: Vec<_> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let records = vec![record("a", FinishedFlag::False, 1)];
        let selected = apply_list_options(records, &Index::new(), &ListOptions::paged(5, 10));
        assert!(selected.is_empty());
    }
}
