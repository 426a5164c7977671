//! Account registration and lookup.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{AccountCommand, AccountQuery, AccountRepository, AccountRepositoryError};
use crate::domain::{Account, Error, RegistrationDraft, UserId};

fn map_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account repository unavailable: {message}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::internal(format!("account repository error: {message}"))
        }
        AccountRepositoryError::UsernameTaken { username } => {
            Error::conflict(format!("username {username} is already registered"))
        }
        AccountRepositoryError::DocumentTaken => {
            Error::invalid_request("invalid registration: document is already registered")
        }
    }
}

/// Domain service implementing [`AccountCommand`] and [`AccountQuery`].
#[derive(Clone)]
pub struct AccountService<R> {
    account_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> AccountService<R> {
    /// Create the service over an account repository.
    pub fn new(account_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            account_repo,
            clock,
        }
    }
}

#[async_trait]
impl<R> AccountCommand for AccountService<R>
where
    R: AccountRepository,
{
    async fn register(&self, draft: RegistrationDraft) -> Result<Account, Error> {
        let account = Account::register(draft, self.clock.utc())
            .map_err(|err| Error::invalid_request(format!("invalid registration: {err}")))?;
        self.account_repo
            .register(&account)
            .await
            .map_err(map_repository_error)?;
        info!(
            user_id = %account.user().id(),
            role = %account.profile().role(),
            "account registered"
        );
        Ok(account)
    }
}

#[async_trait]
impl<R> AccountQuery for AccountService<R>
where
    R: AccountRepository,
{
    async fn account(&self, user_id: &UserId) -> Result<Account, Error> {
        self.account_repo
            .find_by_id(user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::MockAccountRepository;
    use crate::domain::{ErrorCode, Role};
    use crate::test_support::{fixture_clock, fixture_timestamp};

    #[fixture]
    fn draft() -> RegistrationDraft {
        RegistrationDraft {
            username: "ana.recicla".to_owned(),
            role: Role::Citizen,
            document: None,
            phone: Some("86 98888-1234".to_owned()),
        }
    }

    fn service(repo: MockAccountRepository) -> AccountService<MockAccountRepository> {
        AccountService::new(Arc::new(repo), fixture_clock())
    }

    #[rstest]
    #[tokio::test]
    async fn register_persists_user_with_profile(draft: RegistrationDraft) {
        let mut repo = MockAccountRepository::new();
        repo.expect_register()
            .times(1)
            .withf(|account| {
                account.user().id() == account.profile().user_id()
                    && account.profile().points() == 0
            })
            .return_once(|_| Ok(()));

        let account = service(repo).register(draft).await.expect("registered");

        assert_eq!(account.user().created_at(), fixture_timestamp());
        assert_eq!(account.profile().role(), Role::Citizen);
    }

    #[rstest]
    #[tokio::test]
    async fn taken_username_is_a_conflict(draft: RegistrationDraft) {
        let mut repo = MockAccountRepository::new();
        repo.expect_register()
            .times(1)
            .return_once(|_| Err(AccountRepositoryError::username_taken("ana.recicla")));

        let error = service(repo).register(draft).await.expect_err("taken");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn reused_document_is_a_validation_error(draft: RegistrationDraft) {
        let mut repo = MockAccountRepository::new();
        repo.expect_register()
            .times(1)
            .return_once(|_| Err(AccountRepositoryError::document_taken()));

        let error = service(repo).register(draft).await.expect_err("taken");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_username_never_reaches_storage(mut draft: RegistrationDraft) {
        draft.username = "a b".to_owned();
        let mut repo = MockAccountRepository::new();
        repo.expect_register().times(0);

        let error = service(repo).register(draft).await.expect_err("invalid");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_account_is_not_found() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id().times(1).return_once(|_| Ok(None));

        let error = service(repo)
            .account(&UserId::random())
            .await
            .expect_err("missing");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}
