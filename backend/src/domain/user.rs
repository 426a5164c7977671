//! Accounts: users, their profiles and the acting identity.
//!
//! A [`User`] never exists without its [`Profile`]. Both are built together by
//! [`Account::register`] and persisted together by the account repository, so
//! there is no window in which a user lacks a role or a balance.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 32;
/// Maximum length of a CPF/CNPJ document number, formatted.
pub const DOCUMENT_MAX: usize = 18;
/// Maximum length of a phone number.
pub const PHONE_MAX: usize = 15;

/// Validation errors raised while building account values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserValidationError {
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be between {min} and {max} characters")]
    UsernameLength { min: usize, max: usize },
    #[error("username may only contain letters, digits, '.', '-' or '_'")]
    UsernameCharacters,
    #[error("{field} must be at most {max} characters")]
    ContactTooLong { field: &'static str, max: usize },
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its textual UUID form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap a UUID loaded from storage.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login handle chosen at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a username.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let length = raw.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
            return Err(UserValidationError::UsernameLength {
                min: USERNAME_MIN,
                max: USERNAME_MAX,
            });
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
        if !raw.chars().all(allowed) {
            return Err(UserValidationError::UsernameCharacters);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// What an account is allowed to do in the collection workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Reports residues and requests pickups.
    Citizen,
    /// Claims and transports pickups.
    Collector,
    /// Receives deliveries and processes them.
    Recycler,
}

impl Role {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Collector => "collector",
            Self::Recycler => "recycler",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "citizen" => Ok(Self::Citizen),
            "collector" => Ok(Self::Collector),
            "recycler" => Ok(Self::Recycler),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Optional contact fields kept on the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    document: Option<String>,
    phone: Option<String>,
}

impl ContactDetails {
    /// Validate contact fields; blank values are stored as absent.
    pub fn new(
        document: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self {
            document: normalise_contact(document, "document", DOCUMENT_MAX)?,
            phone: normalise_contact(phone, "phone", PHONE_MAX)?,
        })
    }

    /// CPF/CNPJ document number.
    #[must_use]
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Phone number.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

fn normalise_contact(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, UserValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(UserValidationError::ContactTooLong { field, max });
    }
    Ok(Some(trimmed.to_owned()))
}

/// Registered user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    created_at: DateTime<Utc>,
}

impl User {
    /// Rebuild a user loaded from storage.
    #[must_use]
    pub const fn from_parts(id: UserId, username: Username, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            username,
            created_at,
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Username.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Registration timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Per-user role, contact details and point balance.
///
/// The balance only changes through ledger postings; nothing in this type
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    user_id: UserId,
    role: Role,
    points: u64,
    contact: ContactDetails,
}

impl Profile {
    /// Rebuild a profile loaded from storage.
    #[must_use]
    pub const fn from_parts(
        user_id: UserId,
        role: Role,
        points: u64,
        contact: ContactDetails,
    ) -> Self {
        Self {
            user_id,
            role,
            points,
            contact,
        }
    }

    /// Owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Current point balance.
    #[must_use]
    pub const fn points(&self) -> u64 {
        self.points
    }

    /// Contact fields.
    #[must_use]
    pub const fn contact(&self) -> &ContactDetails {
        &self.contact
    }

    /// The acting identity for operations performed by this profile's user.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

/// Input accepted by [`Account::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub username: String,
    pub role: Role,
    pub document: Option<String>,
    pub phone: Option<String>,
}

/// A user together with its profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    user: User,
    profile: Profile,
}

impl Account {
    /// Build a brand-new user and its zero-balance profile.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use reciclai::domain::{Account, RegistrationDraft, Role};
    ///
    /// let account = Account::register(
    ///     RegistrationDraft {
    ///         username: "maria.silva".to_owned(),
    ///         role: Role::Citizen,
    ///         document: None,
    ///         phone: Some("86 99999-0000".to_owned()),
    ///     },
    ///     Utc::now(),
    /// )
    /// .expect("valid registration");
    /// assert_eq!(account.profile().points(), 0);
    /// assert_eq!(account.profile().user_id(), account.user().id());
    /// ```
    pub fn register(
        draft: RegistrationDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, UserValidationError> {
        let username = Username::new(draft.username)?;
        let contact = ContactDetails::new(draft.document, draft.phone)?;
        let id = UserId::random();
        Ok(Self {
            user: User::from_parts(id, username, now),
            profile: Profile::from_parts(id, draft.role, 0, contact),
        })
    }

    /// Rebuild an account from stored parts.
    #[must_use]
    pub const fn from_parts(user: User, profile: Profile) -> Self {
        Self { user, profile }
    }

    /// User half.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Profile half.
    #[must_use]
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }
}

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    user_id: UserId,
    role: Role,
}

impl Actor {
    /// Pair a user with the role they act under.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Acting user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Acting role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}
