// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pagination and sort parameters for list endpoints.

use serde::Serialize;

use crate::validator::Validator;

/// Largest page number a client may request.
pub const MAX_PAGE: i64 = 10_000_000;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sort direction derived from a leading `-` on the sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Client-supplied paging window plus a server-declared sort allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    /// Bare column names the client may sort by.
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    /// Records page, page_size and sort errors into `v`.
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(
            self.page <= MAX_PAGE,
            "page",
            "must be a maximum of 10 million",
        );
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(
            self.page_size <= MAX_PAGE_SIZE,
            "page_size",
            "must be a maximum of 100",
        );
        v.check(self.safe_column().is_some(), "sort", "invalid sort value");
    }

    fn safe_column(&self) -> Option<&'static str> {
        let bare = self.sort.strip_prefix('-').unwrap_or(&self.sort);
        self.sort_safelist.iter().copied().find(|c| *c == bare)
    }

    /// The column to order by, taken from the safelist rather than the input.
    ///
    /// # Panics
    ///
    /// Panics if the sort key is not in the safelist. Call [`Filters::validate`]
    /// first; reaching this with an unvalidated key is a bug.
    pub fn sort_column(&self) -> &'static str {
        match self.safe_column() {
            Some(column) => column,
            None => panic!("unsafe sort parameter: {}", self.sort),
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Paging summary returned alongside list results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

impl Metadata {
    /// Builds the summary for one page. All fields are zero when nothing matched.
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 || page_size <= 0 {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFELIST: &[&str] = &["id", "title", "year", "runtime"];

    fn filters(page: i64, page_size: i64, sort: &str) -> Filters {
        Filters {
            page,
            page_size,
            sort: sort.to_string(),
            sort_safelist: SAFELIST,
        }
    }

    #[test]
    fn valid_filters_pass() {
        let mut v = Validator::new();
        filters(1, 10, "-year").validate(&mut v);
        assert!(v.is_valid());
    }

    #[test]
    fn bounds_are_checked() {
        let mut v = Validator::new();
        filters(0, 101, "id").validate(&mut v);
        assert_eq!(v.errors()["page"], "must be greater than zero");
        assert_eq!(v.errors()["page_size"], "must be a maximum of 100");

        let mut v = Validator::new();
        filters(MAX_PAGE + 1, 0, "id").validate(&mut v);
        assert_eq!(v.errors()["page"], "must be a maximum of 10 million");
        assert_eq!(v.errors()["page_size"], "must be greater than zero");
    }

    #[test]
    fn unknown_sort_is_rejected() {
        for bad in ["rating", "--id", "id; DROP TABLE movies", ""] {
            let mut v = Validator::new();
            filters(1, 10, bad).validate(&mut v);
            assert_eq!(v.errors()["sort"], "invalid sort value", "{bad:?}");
        }
    }

    #[test]
    fn sort_column_and_direction() {
        let f = filters(1, 10, "-runtime");
        assert_eq!(f.sort_column(), "runtime");
        assert_eq!(f.sort_direction(), SortDirection::Descending);

        let f = filters(1, 10, "title");
        assert_eq!(f.sort_column(), "title");
        assert_eq!(f.sort_direction(), SortDirection::Ascending);
        assert_eq!(f.sort_direction().as_sql(), "ASC");
    }

    #[test]
    #[should_panic(expected = "unsafe sort parameter")]
    fn sort_column_panics_on_unvalidated_input() {
        filters(1, 10, "rating").sort_column();
    }

    #[test]
    fn limit_and_offset() {
        let f = filters(3, 20, "id");
        assert_eq!(f.limit(), 20);
        assert_eq!(f.offset(), 40);
        assert_eq!(filters(1, 5, "id").offset(), 0);
    }

    #[test]
    fn metadata_is_zero_when_empty() {
        let m = Metadata::calculate(0, 3, 10);
        assert_eq!(m, Metadata::default());
        assert_eq!(serde_json::to_string(&m).unwrap(), "{}");
    }

    #[test]
    fn metadata_rounds_last_page_up() {
        let m = Metadata::calculate(95, 2, 10);
        assert_eq!(
            m,
            Metadata {
                current_page: 2,
                page_size: 10,
                first_page: 1,
                last_page: 10,
                total_records: 95,
            }
        );
        assert_eq!(Metadata::calculate(100, 1, 10).last_page, 10);
        assert_eq!(Metadata::calculate(1, 1, 100).last_page, 1);
    }
}
