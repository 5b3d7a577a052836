//! Paging and ordering parameters shared by every list query.
//!
//! A [`Filters`] value can only name a sort column that appears in the
//! entity's [`SortSafelist`], so the column and direction it yields are safe to
//! splice into SQL. Everything else (page size, offset) is bound as a
//! parameter by the caller.

use std::collections::HashMap;

use serde::Serialize;

use crate::validator::{permitted_value, ValidationErrors, Validator};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

/// The sortable columns of one entity.
#[derive(Debug, Clone, Copy)]
pub struct SortSafelist {
    /// `(query key, SQL column)` pairs. Keys are what clients send in `sort`.
    pub columns: &'static [(&'static str, &'static str)],
    /// Primary key column, appended as an ascending tiebreaker.
    pub id_column: &'static str,
    /// Sort applied when the client does not send one.
    pub default_sort: &'static str,
}

impl SortSafelist {
    fn column_for(&self, key: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, column)| *column)
    }
}

pub const EXERCISE_SORT: SortSafelist = SortSafelist {
    columns: &[
        ("id", "id"),
        ("name", "name"),
        ("category", "category"),
        ("muscle_group", "muscle_group"),
        ("created_at", "created_at"),
    ],
    id_column: "id",
    default_sort: "name",
};

pub const WORKOUT_SORT: SortSafelist = SortSafelist {
    columns: &[
        ("id", "id"),
        ("name", "name"),
        ("schedule", "schedule"),
        ("created_at", "created_at"),
        ("updated_at", "updated_at"),
    ],
    id_column: "id",
    default_sort: "created_at",
};

pub const WORKOUT_LOG_SORT: SortSafelist = SortSafelist {
    columns: &[
        ("id", "wl.id"),
        ("date", "wl.date"),
        ("duration", "wl.duration"),
        ("created_at", "wl.created_at"),
    ],
    id_column: "wl.id",
    default_sort: "-date",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated page, page size and ordering for a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    page: i64,
    page_size: i64,
    sort_column: &'static str,
    direction: SortDirection,
    id_column: &'static str,
}

impl Filters {
    /// Builds filters from already-typed values, reporting every violation.
    pub fn new(
        page: i64,
        page_size: i64,
        sort: &str,
        safelist: &SortSafelist,
    ) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new();
        let filters = Self::validated(page, page_size, sort, safelist, &mut v);
        v.finish().map(|()| filters)
    }

    /// Reads `page`, `page_size` and `sort` from a query string map, recording
    /// failures into `v`. The returned value is only meaningful when `v` is valid.
    pub fn from_query(
        query: &HashMap<String, String>,
        safelist: &SortSafelist,
        v: &mut Validator,
    ) -> Self {
        let page = read_int(query, "page", DEFAULT_PAGE, v);
        let page_size = read_int(query, "page_size", DEFAULT_PAGE_SIZE, v);
        let sort = query
            .get("sort")
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(safelist.default_sort);
        Self::validated(page, page_size, sort, safelist, v)
    }

    fn validated(
        page: i64,
        page_size: i64,
        sort: &str,
        safelist: &SortSafelist,
        v: &mut Validator,
    ) -> Self {
        v.check(page > 0, "page", "must be greater than zero");
        v.check(page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        v.check(page_size > 0, "page_size", "must be greater than zero");
        v.check(page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");

        let (key, direction) = match sort.strip_prefix('-') {
            Some(key) => (key, SortDirection::Desc),
            None => (sort, SortDirection::Asc),
        };

        let permitted = permitted_value(key, safelist.columns.iter().map(|(k, _)| *k));
        v.check(permitted, "sort", "invalid sort value");

        let (sort_column, direction) = match safelist.column_for(key) {
            Some(column) if permitted => (column, direction),
            _ => (safelist.id_column, SortDirection::Asc),
        };

        Self {
            page,
            page_size,
            sort_column,
            direction,
            id_column: safelist.id_column,
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// Renders the compound ordering: requested column first, primary key
    /// ascending second so that pages stay stable across duplicate sort values.
    pub fn order_by(&self) -> String {
        format!(
            "{} {}, {} ASC",
            self.sort_column,
            self.direction.as_sql(),
            self.id_column
        )
    }

    /// Returns the same ordering positioned at another page.
    pub fn with_page(self, page: i64) -> Self {
        Self { page, ..self }
    }
}

fn read_int(query: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    match query.get(key).map(String::as_str) {
        None | Some("") => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
    }
}

/// Summary of one page of a list result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    /// Derives page metadata from the window count returned alongside a page.
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 {
            return Self::default();
        }
        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }

    /// Total number of pages, the same as `last_page`.
    pub fn total_pages(&self) -> i64 {
        self.last_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_query_is_empty() {
        let mut v = Validator::new();
        let filters = Filters::from_query(&HashMap::new(), &WORKOUT_LOG_SORT, &mut v);

        assert!(v.valid());
        assert_eq!(filters.page(), 1);
        assert_eq!(filters.limit(), 20);
        assert_eq!(filters.offset(), 0);
        assert_eq!(filters.order_by(), "wl.date DESC, wl.id ASC");
    }

    #[test]
    fn descending_prefix_and_offset() {
        let filters = Filters::new(3, 25, "-name", &EXERCISE_SORT).unwrap();
        assert_eq!(filters.offset(), 50);
        assert_eq!(filters.order_by(), "name DESC, id ASC");
    }

    #[test]
    fn unknown_sort_keys_are_rejected() {
        for sort in ["password", "name; DROP TABLE users", "-", "--name", "wl.date", "NAME"] {
            let errors = Filters::new(1, 20, sort, &EXERCISE_SORT).unwrap_err();
            assert_eq!(errors["sort"], "invalid sort value", "sort = {sort:?}");
        }
    }

    #[test]
    fn out_of_range_values_are_reported_together() {
        let mut v = Validator::new();
        Filters::from_query(
            &query(&[("page", "0"), ("page_size", "101"), ("sort", "bogus")]),
            &WORKOUT_SORT,
            &mut v,
        );
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["page"], "must be greater than zero");
        assert_eq!(errors["page_size"], "must be a maximum of 100");
        assert_eq!(errors["sort"], "invalid sort value");
    }

    #[test]
    fn non_integer_paging_is_a_validation_failure() {
        let mut v = Validator::new();
        Filters::from_query(&query(&[("page", "two")]), &WORKOUT_SORT, &mut v);
        assert_eq!(v.errors()["page"], "must be an integer value");
    }

    #[test]
    fn metadata_from_window_count() {
        let meta = Metadata::calculate(45, 2, 20);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.total_pages(), 3);
        assert_eq!(meta.total_records, 45);
        assert_eq!(Metadata::calculate(0, 4, 20), Metadata::default());
    }

    /// Applies the ordering and window the database would apply to an in-memory set.
    fn page_of(rows: &[(i64, &'static str)], filters: &Filters) -> Vec<(i64, &'static str)> {
        let mut sorted = rows.to_vec();
        sorted.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)));
        sorted
            .into_iter()
            .skip(filters.offset() as usize)
            .take(filters.limit() as usize)
            .collect()
    }

    #[test]
    fn consecutive_pages_partition_the_ordered_result() {
        // Duplicate names force the tiebreaker to matter.
        let rows: Vec<(i64, &'static str)> = (1..=23)
            .map(|id| (id, ["squat", "bench", "row"][(id % 3) as usize]))
            .collect();

        for page_size in 1..=MAX_PAGE_SIZE.min(25) {
            let first = Filters::new(1, page_size, "name", &EXERCISE_SORT).unwrap();
            let full = page_of(&rows, &Filters::new(1, MAX_PAGE_SIZE, "name", &EXERCISE_SORT).unwrap());
            let pages = Metadata::calculate(rows.len() as i64, 1, page_size).total_pages();

            let mut reassembled = Vec::new();
            for page in 1..=pages {
                let chunk = page_of(&rows, &first.with_page(page));
                assert!(chunk.iter().all(|r| !reassembled.contains(r)));
                reassembled.extend(chunk);
            }
            assert_eq!(reassembled, full, "page_size = {page_size}");
        }
    }
}
