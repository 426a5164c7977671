//! Reported waste items.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// Maximum length of a residue type descriptor.
pub const RESIDUE_TYPE_MAX: usize = 50;
/// Maximum length of the free-text notes left for the collector.
pub const RESIDUE_NOTES_MAX: usize = 500;
/// Largest unit count a residue may report; the storage column is a signed
/// 32-bit integer.
pub const RESIDUE_UNITS_MAX: u32 = 2_147_483_647;

/// Validation failures for residue input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResidueValidationError {
    #[error("residue type must not be empty")]
    EmptyType,
    #[error("residue type must be at most {max} characters")]
    TypeTooLong { max: usize },
    #[error("either weight or units must be supplied")]
    MissingQuantity,
    #[error("weight must be a finite number greater than zero, got {value}")]
    InvalidWeight { value: f64 },
    #[error("units must be greater than zero")]
    InvalidUnits,
    #[error("units must be at most {max}, got {value}")]
    TooManyUnits { value: u32, max: u32 },
    #[error("notes must be at most {max} characters")]
    NotesTooLong { max: usize },
    #[error("residue is {status} and can no longer change")]
    Immutable { status: ResidueStatus },
    #[error("unknown residue status: {0}")]
    UnknownStatus(String),
}

/// Residue identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidueId(Uuid);

impl ResidueId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID loaded from storage.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a residue from the citizen's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResidueStatus {
    /// Registered, no pickup requested yet.
    Reported,
    /// A collection request exists for it.
    PickupRequested,
    /// Its collection was processed; the residue is frozen.
    Finalized,
}

impl ResidueStatus {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::PickupRequested => "pickup_requested",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for ResidueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResidueStatus {
    type Err = ResidueValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "reported" => Ok(Self::Reported),
            "pickup_requested" => Ok(Self::PickupRequested),
            "finalized" => Ok(Self::Finalized),
            other => Err(ResidueValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// How much material was reported. At least one measure is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    weight_kg: Option<f64>,
    units: Option<u32>,
}

impl Quantity {
    /// Validate a weight/unit pair.
    pub fn new(weight_kg: Option<f64>, units: Option<u32>) -> Result<Self, ResidueValidationError> {
        if weight_kg.is_none() && units.is_none() {
            return Err(ResidueValidationError::MissingQuantity);
        }
        if let Some(value) = weight_kg
            && !(value.is_finite() && value > 0.0)
        {
            return Err(ResidueValidationError::InvalidWeight { value });
        }
        match units {
            Some(0) => return Err(ResidueValidationError::InvalidUnits),
            Some(value) if value > RESIDUE_UNITS_MAX => {
                return Err(ResidueValidationError::TooManyUnits {
                    value,
                    max: RESIDUE_UNITS_MAX,
                });
            }
            _ => {}
        }
        Ok(Self { weight_kg, units })
    }

    /// Weight in kilograms.
    #[must_use]
    pub const fn weight_kg(&self) -> Option<f64> {
        self.weight_kg
    }

    /// Unit count.
    #[must_use]
    pub const fn units(&self) -> Option<u32> {
        self.units
    }
}

/// Citizen input describing a residue.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueDraft {
    pub residue_type: String,
    pub weight_kg: Option<f64>,
    pub units: Option<u32>,
    pub notes: Option<String>,
}

/// A waste item owned by the citizen who reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    id: ResidueId,
    citizen_id: UserId,
    residue_type: String,
    quantity: Quantity,
    notes: Option<String>,
    status: ResidueStatus,
    created_at: DateTime<Utc>,
}

/// Stored residue fields, used by adapters to rebuild a [`Residue`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueRecord {
    pub id: ResidueId,
    pub citizen_id: UserId,
    pub residue_type: String,
    pub weight_kg: Option<f64>,
    pub units: Option<u32>,
    pub notes: Option<String>,
    pub status: ResidueStatus,
    pub created_at: DateTime<Utc>,
}

impl Residue {
    /// Validate citizen input and register a new residue in `Reported`.
    pub fn report(
        citizen_id: UserId,
        draft: ResidueDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ResidueValidationError> {
        Self::try_from(ResidueRecord {
            id: ResidueId::random(),
            citizen_id,
            residue_type: draft.residue_type,
            weight_kg: draft.weight_kg,
            units: draft.units,
            notes: draft.notes,
            status: ResidueStatus::Reported,
            created_at: now,
        })
    }

    /// Mark the residue as awaiting pickup.
    pub fn request_pickup(self) -> Result<Self, ResidueValidationError> {
        match self.status {
            ResidueStatus::Finalized => Err(ResidueValidationError::Immutable {
                status: self.status,
            }),
            ResidueStatus::Reported | ResidueStatus::PickupRequested => Ok(Self {
                status: ResidueStatus::PickupRequested,
                ..self
            }),
        }
    }

    /// Freeze the residue once its collection has been processed.
    #[must_use]
    pub fn finalize(self) -> Self {
        Self {
            status: ResidueStatus::Finalized,
            ..self
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> ResidueId {
        self.id
    }

    /// Owning citizen.
    #[must_use]
    pub const fn citizen_id(&self) -> UserId {
        self.citizen_id
    }

    /// Type descriptor, for example "PET bottles".
    #[must_use]
    pub fn residue_type(&self) -> &str {
        self.residue_type.as_str()
    }

    /// Reported quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Notes for the collector.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> ResidueStatus {
        self.status
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl TryFrom<ResidueRecord> for Residue {
    type Error = ResidueValidationError;

    fn try_from(record: ResidueRecord) -> Result<Self, Self::Error> {
        let residue_type = record.residue_type.trim().to_owned();
        if residue_type.is_empty() {
            return Err(ResidueValidationError::EmptyType);
        }
        if residue_type.chars().count() > RESIDUE_TYPE_MAX {
            return Err(ResidueValidationError::TypeTooLong {
                max: RESIDUE_TYPE_MAX,
            });
        }
        let quantity = Quantity::new(record.weight_kg, record.units)?;
        let notes = record
            .notes
            .map(|raw| raw.trim().to_owned())
            .filter(|text| !text.is_empty());
        if notes
            .as_ref()
            .is_some_and(|text| text.chars().count() > RESIDUE_NOTES_MAX)
        {
            return Err(ResidueValidationError::NotesTooLong {
                max: RESIDUE_NOTES_MAX,
            });
        }

        Ok(Self {
            id: record.id,
            citizen_id: record.citizen_id,
            residue_type,
            quantity,
            notes,
            status: record.status,
            created_at: record.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn draft() -> ResidueDraft {
        ResidueDraft {
            residue_type: "Garrafa PET".to_owned(),
            weight_kg: None,
            units: Some(10),
            notes: Some("  portão azul ".to_owned()),
        }
    }

    #[rstest]
    fn report_starts_in_reported(draft: ResidueDraft) {
        let residue = Residue::report(UserId::random(), draft, Utc::now()).expect("valid");
        assert_eq!(residue.status(), ResidueStatus::Reported);
        assert_eq!(residue.quantity().units(), Some(10));
        assert_eq!(residue.notes(), Some("portão azul"));
    }

    #[rstest]
    fn request_pickup_moves_to_pickup_requested(draft: ResidueDraft) {
        let residue = Residue::report(UserId::random(), draft, Utc::now())
            .and_then(Residue::request_pickup)
            .expect("valid");
        assert_eq!(residue.status(), ResidueStatus::PickupRequested);
    }

    #[rstest]
    fn finalized_residue_refuses_new_pickup(draft: ResidueDraft) {
        let residue = Residue::report(UserId::random(), draft, Utc::now())
            .expect("valid")
            .finalize();
        assert_eq!(
            residue.request_pickup(),
            Err(ResidueValidationError::Immutable {
                status: ResidueStatus::Finalized
            })
        );
    }

    #[rstest]
    #[case(None, None, ResidueValidationError::MissingQuantity)]
    #[case(Some(0.0), None, ResidueValidationError::InvalidWeight { value: 0.0 })]
    #[case(Some(-2.5), Some(3), ResidueValidationError::InvalidWeight { value: -2.5 })]
    #[case(None, Some(0), ResidueValidationError::InvalidUnits)]
    #[case(
        None,
        Some(3_000_000_000),
        ResidueValidationError::TooManyUnits { value: 3_000_000_000, max: RESIDUE_UNITS_MAX }
    )]
    fn quantity_rules(
        #[case] weight_kg: Option<f64>,
        #[case] units: Option<u32>,
        #[case] expected: ResidueValidationError,
    ) {
        assert_eq!(Quantity::new(weight_kg, units), Err(expected));
    }

    #[rstest]
    fn unit_ceiling_matches_the_storage_column() {
        assert_eq!(i32::try_from(RESIDUE_UNITS_MAX).ok(), Some(i32::MAX));
        let quantity = Quantity::new(None, Some(RESIDUE_UNITS_MAX)).expect("ceiling is accepted");
        assert_eq!(quantity.units(), Some(RESIDUE_UNITS_MAX));
    }

    #[rstest]
    fn weight_alone_is_enough() {
        let quantity = Quantity::new(Some(1.5), None).expect("valid");
        assert_eq!(quantity.weight_kg(), Some(1.5));
    }

    #[rstest]
    fn rejects_blank_and_overlong_types(mut draft: ResidueDraft) {
        draft.residue_type = "   ".to_owned();
        assert_eq!(
            Residue::report(UserId::random(), draft.clone(), Utc::now()),
            Err(ResidueValidationError::EmptyType)
        );
        draft.residue_type = "x".repeat(RESIDUE_TYPE_MAX + 1);
        assert_eq!(
            Residue::report(UserId::random(), draft, Utc::now()),
            Err(ResidueValidationError::TypeTooLong {
                max: RESIDUE_TYPE_MAX
            })
        );
    }

    #[rstest]
    fn status_labels_round_trip() {
        for status in [
            ResidueStatus::Reported,
            ResidueStatus::PickupRequested,
            ResidueStatus::Finalized,
        ] {
            assert_eq!(status.as_str().parse::<ResidueStatus>(), Ok(status));
        }
        assert!("COLETA_SOLICITADA".parse::<ResidueStatus>().is_err());
    }
}
