//! Domain primitives, rules and services.
//!
//! Purpose: model the collection lifecycle, the points ledger and dispatch
//! ranking as plain types and pure rules. Services orchestrate them over the
//! driven ports in [`ports`]; inbound adapters reach services only through
//! the driving ports.
//!
//! Public surface:
//! - [`Account`], [`Profile`], [`Actor`]: users, their role and balance.
//! - [`Residue`], [`Collection`]: reported waste and its pickup task.
//! - [`LifecycleEngine`]: the status transition table.
//! - [`PointsLedger`]: credit, debit and redemption rules.
//! - [`DispatchRanker`]: ordering of open pickups.
//! - [`Error`], [`ErrorCode`]: transport-agnostic failures.

pub mod account_service;
pub mod collection;
pub mod collection_service;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod ledger;
pub mod lifecycle;
pub mod ports;
pub mod residue;
pub mod rewards_service;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::collection::{
    Collection, CollectionDetails, CollectionId, CollectionRecord, CollectionStatus,
    StatusChange, UnknownCollectionStatus,
};
pub use self::collection_service::{CollectionService, PointsAward};
pub use self::dispatch::{
    CollectorLocation, DispatchRanker, RankedCollection, Ranking, RankingWarning,
};
pub use self::error::{Error, ErrorCode};
pub use self::geo::{Coordinate, CoordinateError, EARTH_RADIUS_KM, distance_km};
pub use self::ledger::{
    LedgerError, PointsLedger, PointsStatement, PointsTransaction, Redemption, Reward, RewardId,
    TransactionId, UserReward,
};
pub use self::lifecycle::{ActorRequirement, LifecycleEngine, TransitionError, TransitionPlan};
pub use self::residue::{
    Quantity, Residue, ResidueDraft, ResidueId, ResidueRecord, ResidueStatus,
    ResidueValidationError,
};
pub use self::rewards_service::RewardsService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Account, Actor, ContactDetails, Profile, RegistrationDraft, Role, User, UserId,
    UserValidationError, Username,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use reciclai::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
