//! Listing order for the entry browser

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field a query can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One field plus direction, as understood by the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: SortField, direction: Direction) -> Self {
        OrderBy { field, direction }
    }
}

/// User-facing sort choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
}

impl SortOption {
    pub fn order_by(self) -> OrderBy {
        match self {
            SortOption::Newest => OrderBy::new(SortField::CreatedAt, Direction::Desc),
            SortOption::Oldest => OrderBy::new(SortField::CreatedAt, Direction::Asc),
            SortOption::Highest => OrderBy::new(SortField::Rating, Direction::Desc),
            SortOption::Lowest => OrderBy::new(SortField::Rating, Direction::Asc),
        }
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(SortOption::Newest),
            "oldest" => Ok(SortOption::Oldest),
            "highest" => Ok(SortOption::Highest),
            "lowest" => Ok(SortOption::Lowest),
            _ => Err(format!(
                "Invalid sort option: '{}'. Valid options are: newest, oldest, highest, lowest",
                s
            )),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOption::Newest => "newest",
            SortOption::Oldest => "oldest",
            SortOption::Highest => "highest",
            SortOption::Lowest => "lowest",
        };
        f.write_str(name)
    }
}
