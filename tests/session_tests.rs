// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::db::{MemoryStorage, Storage};
use fintrack::models::{Role, Session, User};
use fintrack::remote::{RateLimitNotice, check_status};
use fintrack::store::SessionStore;
use fintrack::{AppContext, Error, cli, commands::auth};
use reqwest::StatusCode;
use std::rc::Rc;

fn session(role: Role) -> Session {
    Session {
        user: User {
            id: "u-1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        },
        token: "tok-123".into(),
        role,
    }
}

fn setup() -> (Rc<MemoryStorage>, SessionStore) {
    let storage = Rc::new(MemoryStorage::new());
    let store = SessionStore::open(storage.clone());
    (storage, store)
}

#[test]
fn login_writes_three_keys() {
    let (storage, mut store) = setup();
    assert!(!store.is_authenticated());
    store.login(session(Role::Admin)).unwrap();

    assert_eq!(storage.len(), 3);
    assert_eq!(storage.load("token").unwrap().as_deref(), Some("tok-123"));
    assert_eq!(storage.load("role").unwrap().as_deref(), Some("admin"));
    let user: User = serde_json::from_str(&storage.load("user").unwrap().unwrap()).unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert!(store.is_admin());
    assert_eq!(store.token(), Some("tok-123"));

    let reopened = SessionStore::open(storage);
    assert_eq!(reopened.current(), Some(&session(Role::Admin)));
}

#[test]
fn empty_token_rejected() {
    let (storage, mut store) = setup();
    let mut s = session(Role::User);
    s.token = "  ".into();
    assert!(matches!(store.login(s), Err(Error::Validation(_))));
    assert!(storage.is_empty());
    assert!(!store.is_authenticated());
}

#[test]
fn logout_clears_memory_and_storage() {
    let (storage, mut store) = setup();
    store.login(session(Role::User)).unwrap();
    store.logout().unwrap();
    assert!(store.current().is_none());
    assert!(storage.is_empty());
    store.logout().unwrap();
}

#[test]
fn partial_or_malformed_keys_mean_signed_out() {
    let storage = Rc::new(MemoryStorage::new());
    storage.save("token", "tok").unwrap();
    storage.save("role", "user").unwrap();
    assert!(SessionStore::open(storage.clone()).current().is_none());

    storage.save("user", "{broken").unwrap();
    assert!(SessionStore::open(storage.clone()).current().is_none());

    storage
        .save("user", r#"{"id":"1","name":"B","email":"b@example.com"}"#)
        .unwrap();
    storage.save("role", "superuser").unwrap();
    assert!(SessionStore::open(storage.clone()).current().is_none());

    storage.save("role", "user").unwrap();
    let store = SessionStore::open(storage);
    assert!(store.is_authenticated());
    assert!(!store.is_admin());
}

#[test]
fn unauthorized_response_signs_out() {
    let (storage, mut store) = setup();
    store.login(session(Role::User)).unwrap();
    let err = check_status(StatusCode::UNAUTHORIZED, &mut store).unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert!(!store.is_authenticated());
    assert!(storage.is_empty());
}

#[test]
fn status_mapping() {
    let (_, mut store) = setup();
    store.login(session(Role::User)).unwrap();
    assert!(check_status(StatusCode::OK, &mut store).is_ok());
    assert!(matches!(
        check_status(StatusCode::TOO_MANY_REQUESTS, &mut store),
        Err(Error::RateLimited)
    ));
    assert!(matches!(
        check_status(StatusCode::INTERNAL_SERVER_ERROR, &mut store),
        Err(Error::Network(_))
    ));
    assert!(store.is_authenticated());
}

#[test]
fn rate_limit_notice_shows_once_until_reset() {
    let notice = RateLimitNotice::default();
    assert!(notice.should_show());
    assert!(!notice.should_show());
    assert!(!notice.should_show());
    notice.reset();
    assert!(notice.should_show());
}

#[test]
fn login_command_validates_email() {
    let mut ctx = AppContext::in_memory();
    let bad = cli::build_cli().get_matches_from([
        "fintrack", "auth", "login", "--user-id", "7", "--name", "Kim", "--email", "kim-at-home",
        "--token", "abc",
    ]);
    let (_, sub) = bad.subcommand().unwrap();
    assert!(auth::handle(&mut ctx, sub).is_err());
    assert!(!ctx.session.is_authenticated());

    let good = cli::build_cli().get_matches_from([
        "fintrack", "auth", "login", "--user-id", "7", "--name", "Kim", "--email",
        "kim@example.org", "--token", "abc", "--role", "admin",
    ]);
    let (_, sub) = good.subcommand().unwrap();
    auth::handle(&mut ctx, sub).unwrap();
    assert!(ctx.session.is_admin());
    assert_eq!(ctx.session.current().unwrap().user.name, "Kim");
}
