//! Query filters for user lookups
//!
//! Top-level conditions are ANDed together. `or` holds alternatives that
//! must match at least once, `not` excludes rows matching its filter.

use serde::Deserialize;

/// Text column conditions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StringFilter {
    pub equals: Option<String>,
    pub contains: Option<String>,
    pub starts_with: Option<String>,
    pub ends_with: Option<String>,
}

impl StringFilter {
    pub fn is_empty(&self) -> bool {
        self.equals.is_none()
            && self.contains.is_none()
            && self.starts_with.is_none()
            && self.ends_with.is_none()
    }
}

/// Integer column conditions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntFilter {
    pub equals: Option<i32>,
    pub lt: Option<i32>,
    pub lte: Option<i32>,
    pub gt: Option<i32>,
    pub gte: Option<i32>,
}

impl IntFilter {
    pub fn is_empty(&self) -> bool {
        self.equals.is_none()
            && self.lt.is_none()
            && self.lte.is_none()
            && self.gt.is_none()
            && self.gte.is_none()
    }
}

/// Filter over the `users` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserFilter {
    pub id: Option<i32>,
    pub head_id: Option<i32>,
    pub name: Option<StringFilter>,
    pub age: Option<IntFilter>,
    pub or: Vec<UserFilter>,
    pub not: Option<Box<UserFilter>>,
}

impl UserFilter {
    /// Match every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: i32) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn name_equals(name: impl Into<String>) -> Self {
        Self {
            name: Some(StringFilter {
                equals: Some(name.into()),
                ..StringFilter::default()
            }),
            ..Self::default()
        }
    }

    pub fn name_contains(fragment: impl Into<String>) -> Self {
        Self {
            name: Some(StringFilter {
                contains: Some(fragment.into()),
                ..StringFilter::default()
            }),
            ..Self::default()
        }
    }

    /// True when the filter places no condition at all.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.head_id.is_none()
            && self.name.as_ref().map_or(true, StringFilter::is_empty)
            && self.age.as_ref().map_or(true, IntFilter::is_empty)
            && self.or.is_empty()
            && self.not.is_none()
    }
}

/// Sort order for user listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserOrder {
    #[default]
    CreatedDesc,
    CreatedAsc,
    IdAsc,
}

impl UserOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::CreatedDesc => "created_time DESC, id DESC",
            Self::CreatedAsc => "created_time ASC, id ASC",
            Self::IdAsc => "id ASC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_nested_filter() {
        let filter: UserFilter = serde_json::from_value(serde_json::json!({
            "id": 10,
            "head_id": 20,
            "or": [{ "id": 1 }, { "name": { "equals": "哈哈" } }],
            "not": { "id": 2 },
            "age": { "lt": 20, "gte": 10 },
            "name": { "contains": "包含", "starts_with": "包", "ends_with": "含" }
        }))
        .unwrap();

        assert_eq!(filter.id, Some(10));
        assert_eq!(filter.or.len(), 2);
        assert_eq!(filter.not.as_ref().and_then(|n| n.id), Some(2));
        assert_eq!(filter.age.as_ref().and_then(|a| a.lt), Some(20));
        assert!(!filter.is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<UserFilter, _> =
            serde_json::from_value(serde_json::json!({ "email": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn empty_sub_filters_count_as_empty() {
        let filter = UserFilter {
            name: Some(StringFilter::default()),
            age: Some(IntFilter::default()),
            ..UserFilter::default()
        };
        assert!(filter.is_empty());
        assert!(!UserFilter::name_contains("李").is_empty());
    }

    #[test]
    fn order_parses_snake_case() {
        let order: UserOrder = serde_json::from_str("\"created_asc\"").unwrap();
        assert_eq!(order, UserOrder::CreatedAsc);
        assert_eq!(UserOrder::default().as_sql(), "created_time DESC, id DESC");
    }
}
