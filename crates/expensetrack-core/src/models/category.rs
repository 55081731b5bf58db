//! Expense/income categories.
//!
//! The server speaks MongoDB extended JSON: ids arrive as `{"$oid": ".."}`
//! and timestamps as `{"$date": ..}`. `RawCategory` mirrors that wire shape
//! and `Category` is the validated domain type screens work with.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    #[default]
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(CategoryKind::Expense),
            "income" => Ok(CategoryKind::Income),
            other => Err(format!("Unknown category type '{}' (expected expense or income)", other)),
        }
    }
}

/// A validated category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Category {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub kind: CategoryKind,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /category/add`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryForm {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

impl CategoryForm {
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self { name: name.into(), kind }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Oid {
        #[serde(rename = "$oid")]
        oid: String,
    },
    Plain(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Oid { oid } => oid,
            WireId::Plain(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireDateValue {
    Iso(String),
    Millis(i64),
    NumberLong {
        #[serde(rename = "$numberLong")]
        number_long: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireDate {
    Wrapped {
        #[serde(rename = "$date")]
        date: WireDateValue,
    },
    Plain(WireDateValue),
}

impl WireDate {
    fn to_datetime(&self) -> Result<DateTime<Utc>, String> {
        let value = match self {
            WireDate::Wrapped { date } => date,
            WireDate::Plain(date) => date,
        };
        let millis = match value {
            WireDateValue::Iso(s) => {
                return DateTime::parse_from_rfc3339(s)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|e| format!("invalid date '{}': {}", s, e));
            }
            WireDateValue::Millis(ms) => *ms,
            WireDateValue::NumberLong { number_long } => number_long
                .parse::<i64>()
                .map_err(|e| format!("invalid $numberLong '{}': {}", number_long, e))?,
        };
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| format!("timestamp out of range: {}", millis))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategory {
    #[serde(rename = "_id")]
    id: WireId,
    #[serde(default)]
    user: Option<WireId>,
    name: String,
    #[serde(rename = "type")]
    kind: CategoryKind,
    #[serde(default)]
    created_at: Option<WireDate>,
    #[serde(default)]
    updated_at: Option<WireDate>,
}

impl TryFrom<RawCategory> for Category {
    type Error = String;

    fn try_from(raw: RawCategory) -> Result<Self, Self::Error> {
        let id = raw.id.into_string();
        if id.is_empty() {
            return Err("category is missing its id".to_string());
        }
        let created_at = raw.created_at.as_ref().map(WireDate::to_datetime).transpose()?;
        let updated_at = raw.updated_at.as_ref().map(WireDate::to_datetime).transpose()?;
        Ok(Category {
            id,
            user_id: raw.user.map(WireId::into_string),
            name: raw.name,
            kind: raw.kind,
            created_at,
            updated_at,
        })
    }
}

/// Validate a `/category/lists` body into domain categories.
pub fn parse_categories(body: &Value) -> Result<Vec<Category>, String> {
    let items = body
        .as_array()
        .ok_or_else(|| "Invalid response format from server".to_string())?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let raw = RawCategory::deserialize(item)
                .map_err(|e| format!("Malformed category at index {}: {}", i, e))?;
            Category::try_from(raw).map_err(|e| format!("Malformed category at index {}: {}", i, e))
        })
        .collect()
}
