//! Goal model - a recurring target with a cadence.

use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::error::CoreError;
use crate::id::GoalId;
use crate::Time;

/// Default target for a goal when none is given.
pub const DEFAULT_TARGET_VALUE: i64 = 1;

/// A goal is something the user wants to hit once per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: GoalId,

    /// Goal title
    pub title: String,

    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,

    /// How often the goal recurs
    pub cadence: Cadence,

    /// Amount to log per period. Stored as given; the aggregator treats
    /// anything below 1 as 1.
    #[serde(default = "default_target_value")]
    pub target_value: i64,

    /// When created
    pub created_at: Time,
}

fn default_target_value() -> i64 {
    DEFAULT_TARGET_VALUE
}

impl Goal {
    /// Create a new goal.
    ///
    /// The title is trimmed and must not be empty.
    pub fn new(title: impl Into<String>, cadence: Cadence) -> Result<Self, CoreError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(CoreError::EmptyTitle);
        }

        Ok(Self {
            id: GoalId::new(),
            title,
            description: None,
            cadence,
            target_value: DEFAULT_TARGET_VALUE,
            created_at: chrono::Utc::now(),
        })
    }

    /// Set the description. Blank text clears it.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    /// Set the per-period target.
    pub fn with_target_value(mut self, target_value: i64) -> Self {
        self.target_value = target_value;
        self
    }
}

/// Recurrence unit of a goal.
///
/// Deserialization is lenient: any label other than `daily` or `weekly`
/// loads as [`Cadence::Monthly`]. Use [`str::parse`] for strict input
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Cadence {
    /// One calendar day
    #[default]
    Daily,
    /// Monday through Sunday
    Weekly,
    /// One calendar month
    Monthly,
}

impl Cadence {
    /// All cadences, in display order.
    pub const ALL: [Cadence; 3] = [Cadence::Daily, Cadence::Weekly, Cadence::Monthly];

    /// Lowercase label used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
        }
    }

    /// Whether `label` names a known cadence.
    pub fn is_known(label: &str) -> bool {
        label.parse::<Cadence>().is_ok()
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Cadence {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(CoreError::InvalidCadence(other.to_string())),
        }
    }
}

impl From<&str> for Cadence {
    /// Unknown labels fall through to monthly.
    fn from(label: &str) -> Self {
        match label.parse() {
            Ok(cadence) => cadence,
            Err(_) => {
                warn!("Unknown cadence `{}`; treating as monthly", label.trim());
                Cadence::Monthly
            }
        }
    }
}

impl From<String> for Cadence {
    fn from(label: String) -> Self {
        Cadence::from(label.as_str())
    }
}
