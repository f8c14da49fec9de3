use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub restaurant_id: String,
    pub name: String,
    pub cuisine: String,
    pub borough: String,
    pub address: Address,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub building: String,
    pub street: String,
    pub zipcode: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Name,
    #[default]
    AverageRating,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::AverageRating => "average_rating",
        }
    }

    /// Human readable label used by front ends.
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name (A-Z)",
            Self::AverageRating => "Rating (High to Low)",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "average_rating" => Ok(Self::AverageRating),
            _ => Err(ParseOptionError::new("sort key", s, "name, average_rating")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ParseOptionError::new("order", s, "asc, desc")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} `{value}`, expected one of: {expected}")]
pub struct ParseOptionError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl ParseOptionError {
    fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

/// Page sizes a front end may pick from.
pub const LIMIT_OPTIONS: [u32; 5] = [5, 10, 15, 20, 25];

/// A page size restricted to [`LIMIT_OPTIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(u32);

impl Limit {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(15)
    }
}

impl TryFrom<u32> for Limit {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if LIMIT_OPTIONS.contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("limit must be one of {LIMIT_OPTIONS:?}, got {value}"))
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The sort/filter/limit combination a restaurants request is made with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub sort_by: SortBy,
    pub order: Order,
    pub limit: Limit,
    /// Empty means no filter.
    pub filter_cuisine: String,
    /// Empty means no filter.
    pub filter_borough: String,
}

impl Selection {
    /// Query string pairs for `GET /api/restaurants`. Empty filters are
    /// still sent so the server sees every parameter.
    pub fn query_pairs(&self) -> [(&'static str, String); 5] {
        [
            ("sort_by", self.sort_by.to_string()),
            ("order", self.order.to_string()),
            ("limit", self.limit.to_string()),
            ("filter_cuisine", self.filter_cuisine.clone()),
            ("filter_borough", self.filter_borough.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_matches_first_page_load() {
        let selection = Selection::default();
        assert_eq!(selection.sort_by, SortBy::AverageRating);
        assert_eq!(selection.order, Order::Desc);
        assert_eq!(selection.limit.get(), 15);
        assert!(selection.filter_cuisine.is_empty());
        assert!(selection.filter_borough.is_empty());
    }

    #[test]
    fn query_pairs_carry_every_parameter() {
        let selection = Selection {
            sort_by: SortBy::Name,
            order: Order::Asc,
            limit: Limit::try_from(5).unwrap(),
            filter_cuisine: "Italian".to_string(),
            filter_borough: String::new(),
        };

        let pairs = selection.query_pairs();
        assert_eq!(
            pairs,
            [
                ("sort_by", "name".to_string()),
                ("order", "asc".to_string()),
                ("limit", "5".to_string()),
                ("filter_cuisine", "Italian".to_string()),
                ("filter_borough", String::new()),
            ]
        );
    }

    #[test]
    fn limit_rejects_values_outside_options() {
        assert!(Limit::try_from(20).is_ok());
        assert!(Limit::try_from(0).is_err());
        assert!(Limit::try_from(16).is_err());
    }

    #[test]
    fn sort_and_order_parse_wire_names() {
        assert_eq!("average_rating".parse::<SortBy>().unwrap(), SortBy::AverageRating);
        assert_eq!("desc".parse::<Order>().unwrap(), Order::Desc);

        let err = "rating".parse::<SortBy>().unwrap_err();
        assert!(err.to_string().contains("`rating`"));
    }

    #[test]
    fn restaurant_json_shape() {
        let json = serde_json::json!({
            "restaurant_id": "40356018",
            "name": "Riviera Caterer",
            "cuisine": "American",
            "borough": "Brooklyn",
            "address": {"building": "2780", "street": "Stillwell Avenue", "zipcode": "11224"},
            "average_rating": 4.5
        });

        let restaurant: Restaurant = serde_json::from_value(json).unwrap();
        assert_eq!(restaurant.address.street, "Stillwell Avenue");
        assert_eq!(restaurant.average_rating, 4.5);
    }
}
