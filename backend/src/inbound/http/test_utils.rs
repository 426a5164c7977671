//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::{App, HttpResponse, test, web};

use crate::domain::ports::{
    MockAccountCommand, MockAccountQuery, MockCollectionCommand, MockCollectionQuery,
    MockRewardsCommand, MockRewardsQuery,
};
use crate::domain::{
    Account, Actor, ContactDetails, Error, Profile, User, UserId, Username,
};
use crate::test_support::fixture_timestamp;

use super::session::SessionContext;
use super::state::{HttpState, HttpStatePorts};

const SIGN_IN_PATH: &str = "/__test/sign-in/{id}";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The session cookie set on `res`.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// An account whose profile resolves to `actor`.
pub fn account_for(actor: Actor) -> Account {
    let user_id = actor.user_id();
    Account::from_parts(
        User::from_parts(
            user_id,
            Username::new(format!("{}.fixture", actor.role())).expect("valid username"),
            fixture_timestamp(),
        ),
        Profile::from_parts(user_id, actor.role(), 0, ContactDetails::default()),
    )
}

/// Port mocks for one handler test; unused ports panic if called.
#[derive(Default)]
pub struct TestPorts {
    pub accounts: MockAccountCommand,
    pub accounts_query: MockAccountQuery,
    pub collections: MockCollectionCommand,
    pub collections_query: MockCollectionQuery,
    pub rewards: MockRewardsCommand,
    pub rewards_query: MockRewardsQuery,
}

impl TestPorts {
    /// Mocks where the session user resolves to `actor`.
    pub fn signed_in(actor: Actor) -> Self {
        let mut ports = Self::default();
        ports
            .accounts_query
            .expect_account()
            .returning(move |_| Ok(account_for(actor)));
        ports
    }

    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(HttpStatePorts {
            accounts: Arc::new(self.accounts),
            accounts_query: Arc::new(self.accounts_query),
            collections: Arc::new(self.collections),
            collections_query: Arc::new(self.collections_query),
            rewards: Arc::new(self.rewards),
            rewards_query: Arc::new(self.rewards_query),
        }))
    }
}

async fn sign_in(session: SessionContext, id: web::Path<String>) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(id.as_str()).map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Send `req` to an app built from `configure`, signed in as `user` when
/// given.
pub async fn call_as(
    state: web::Data<HttpState>,
    configure: fn(&mut web::ServiceConfig),
    user: Option<UserId>,
    req: test::TestRequest,
) -> ServiceResponse<impl MessageBody> {
    let app = test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .app_data(state)
            .route(SIGN_IN_PATH, web::post().to(sign_in))
            .configure(configure),
    )
    .await;
    let req = match user {
        Some(user_id) => {
            let signed = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri(&format!("/__test/sign-in/{user_id}"))
                    .to_request(),
            )
            .await;
            req.cookie(session_cookie(&signed))
        }
        None => req,
    };
    test::call_service(&app, req.to_request()).await
}

/// Decode a JSON response body.
pub async fn json_body<B: MessageBody>(res: ServiceResponse<B>) -> serde_json::Value {
    test::read_body_json(res).await
}
