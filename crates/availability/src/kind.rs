//! Availability types and the registry that maps type codes to policies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use shelfkit_core::{AvailabilityId, DomainError, ValueObject};

use crate::availability::Availability;
use crate::boolean::BooleanAvailability;
use crate::countdown::CountdownAvailability;
use crate::date_range::DateRangeAvailability;
use crate::error::{AvailabilityError, AvailabilityResult};
use crate::policy::AvailabilityPolicy;

/// The closed set of policy variants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityKind {
    Boolean,
    Countdown,
    DateRange,
}

impl AvailabilityKind {
    pub const ALL: [AvailabilityKind; 3] = [
        AvailabilityKind::Boolean,
        AvailabilityKind::Countdown,
        AvailabilityKind::DateRange,
    ];

    /// Built-in type code for this variant.
    pub fn code(self) -> &'static str {
        match self {
            AvailabilityKind::Boolean => "boolean",
            AvailabilityKind::Countdown => "countdown",
            AvailabilityKind::DateRange => "date_range",
        }
    }

    /// Human-readable type name for this variant.
    pub fn display_name(self) -> &'static str {
        match self {
            AvailabilityKind::Boolean => "In stock / out of stock",
            AvailabilityKind::Countdown => "Limited quantity",
            AvailabilityKind::DateRange => "Date window",
        }
    }

    /// Look up a built-in code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// The policy a freshly created availability of this kind starts with.
    pub fn default_policy(self) -> AvailabilityPolicy {
        match self {
            AvailabilityKind::Boolean => BooleanAvailability::default().into(),
            AvailabilityKind::Countdown => CountdownAvailability::default().into(),
            AvailabilityKind::DateRange => DateRangeAvailability::unbounded().into(),
        }
    }
}

impl core::fmt::Display for AvailabilityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// A named, coded type of availability (immutable reference data).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvailabilityType {
    pub name: String,
    pub code: String,
}

impl AvailabilityType {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

impl ValueObject for AvailabilityType {}

impl core::fmt::Display for AvailabilityType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// One registry entry: the type and the policy variant backing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredType {
    availability_type: AvailabilityType,
    kind: AvailabilityKind,
}

impl RegisteredType {
    pub fn availability_type(&self) -> &AvailabilityType {
        &self.availability_type
    }

    pub fn kind(&self) -> AvailabilityKind {
        self.kind
    }

    pub fn code(&self) -> &str {
        &self.availability_type.code
    }
}

/// Lookup table from type code to policy variant.
///
/// Several codes may share a variant (e.g. "preorder" and "seasonal" both
/// backed by a date window); each code appears once.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityTypeRegistry {
    entries: BTreeMap<String, RegisteredType>,
}

impl AvailabilityTypeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three built-in codes.
    pub fn standard() -> Self {
        Self::with_kinds(AvailabilityKind::ALL)
    }

    /// Registry with the built-in codes of `kinds` only.
    pub fn with_kinds(kinds: impl IntoIterator<Item = AvailabilityKind>) -> Self {
        let mut registry = Self::new();
        for kind in kinds {
            let entry = RegisteredType {
                availability_type: AvailabilityType::new(kind.display_name(), kind.code()),
                kind,
            };
            registry.entries.insert(kind.code().to_string(), entry);
        }
        registry
    }

    /// Register `availability_type` as backed by `kind`.
    pub fn register(
        &mut self,
        availability_type: AvailabilityType,
        kind: AvailabilityKind,
    ) -> Result<&RegisteredType, DomainError> {
        if availability_type.code.trim().is_empty() {
            return Err(DomainError::validation("availability type code cannot be empty"));
        }
        if availability_type.name.trim().is_empty() {
            return Err(DomainError::validation("availability type name cannot be empty"));
        }
        if self.entries.contains_key(&availability_type.code) {
            return Err(DomainError::conflict(format!(
                "availability type code '{}' is already registered",
                availability_type.code
            )));
        }

        let code = availability_type.code.clone();
        let entry = self.entries.entry(code).or_insert(RegisteredType {
            availability_type,
            kind,
        });
        Ok(&*entry)
    }

    /// Resolve a code to its entry.
    pub fn resolve(&self, code: &str) -> AvailabilityResult<&RegisteredType> {
        self.entries
            .get(code)
            .ok_or_else(|| AvailabilityError::UnknownTypeCode(code.to_string()))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// All entries, ordered by code.
    pub fn types(&self) -> impl Iterator<Item = &RegisteredType> {
        self.entries.values()
    }

    /// Create an availability of type `code` starting from the variant's
    /// default policy.
    pub fn create(&self, id: AvailabilityId, code: &str) -> AvailabilityResult<Availability> {
        let entry = self.resolve(code)?;
        Availability::new(id, entry, entry.kind().default_policy())
    }

    /// Create an availability of type `code` with an explicit policy.
    ///
    /// Fails with `PolicyMismatch` when the policy is not the variant the code
    /// is registered for.
    pub fn create_with(
        &self,
        id: AvailabilityId,
        code: &str,
        policy: impl Into<AvailabilityPolicy>,
    ) -> AvailabilityResult<Availability> {
        let entry = self.resolve(code)?;
        Availability::new(id, entry, policy.into())
    }
}
