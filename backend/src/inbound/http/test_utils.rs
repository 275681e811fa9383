//! Session helpers shared by the HTTP adapter tests.

use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::{App, HttpResponse, test, web};
use serde_json::{Value, json};

use crate::domain::UserId;
use crate::inbound::http::session::{IS_ADMIN_KEY, USER_ID_KEY};

const TEST_KEY_MATERIAL: [u8; 64] = [7; 64];

/// Cookie session middleware over a fixed key, with `Secure` off, so a
/// cookie minted by one test app is accepted by another.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(
        CookieSessionStore::default(),
        Key::derive_from(&TEST_KEY_MATERIAL),
    )
    .cookie_name("session".to_owned())
    .cookie_secure(false)
    .build()
}

/// Session cookie as the storefront would issue it after login.
pub async fn session_cookie(user_id: &UserId, admin: bool) -> Cookie<'static> {
    cookie_with(json!({ USER_ID_KEY: user_id.to_string(), IS_ADMIN_KEY: admin })).await
}

/// Session cookie holding exactly the given top-level entries.
pub async fn cookie_with(entries: Value) -> Cookie<'static> {
    let app = test::init_service(App::new().wrap(test_session_middleware()).route(
        "/mint",
        web::get().to(move |session: Session| {
            let entries = entries.clone();
            async move {
                if let Value::Object(map) = entries {
                    for (key, value) in map {
                        session.insert(key, value)?;
                    }
                }
                Ok::<_, actix_web::Error>(HttpResponse::Ok().finish())
            }
        }),
    ))
    .await;

    let response = test::call_service(&app, test::TestRequest::get().uri("/mint").to_request()).await;
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}
