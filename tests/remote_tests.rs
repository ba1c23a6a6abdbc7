// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::models::{Period, Role, Session, TransactionType, User};
use fintrack::remote::RemoteClient;
use fintrack::{AppContext, Error, cli, commands::sync};
use rust_decimal_macros::dec;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const TX_JSON: &str = r#"{"id":"t1","type":"expense","amount":"12.5","category":"food",
    "date":"2024-01-02T00:00:00.000Z","createdAt":"2024-01-02T09:30:00Z"}"#;
const BUDGET_JSON: &str = r#"{"id":"b1","category":"food","amount":"300","period":"monthly",
    "startDate":"2024-01-01","createdAt":"2024-01-01T00:00:00Z"}"#;

/// Serves each canned `(status, body)` to one connection in turn and hands
/// back the request heads it saw.
fn serve(responses: Vec<(&'static str, String)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
            seen.push(head);
        }
        seen
    });
    (format!("http://{}/api", addr), handle)
}

fn client(base: &str) -> RemoteClient {
    RemoteClient::new(base, Duration::from_secs(5)).unwrap()
}

fn signed_in() -> AppContext {
    let mut ctx = AppContext::in_memory();
    ctx.session
        .login(Session {
            user: User {
                id: "u1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
            token: "tok-123".into(),
            role: Role::User,
        })
        .unwrap();
    ctx
}

fn run_sync(ctx: &mut AppContext, client: &RemoteClient, what: &str) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(["fintrack", "sync", what]);
    if let Some(("sync", sync_m)) = matches.subcommand() {
        sync::handle(ctx, client, sync_m)
    } else {
        panic!("no sync subcommand");
    }
}

#[test]
fn bare_array_decodes_and_sends_bearer_token() {
    let (base, server) = serve(vec![("200 OK", format!("[{}]", TX_JSON))]);
    let mut ctx = signed_in();

    let list = client(&base).fetch_transactions(&mut ctx.session).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "t1");
    assert_eq!(list[0].kind, TransactionType::Expense);
    assert_eq!(list[0].amount, dec!(12.5));
    assert_eq!(list[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

    let heads = server.join().unwrap();
    assert!(heads[0].starts_with("GET /api/transactions HTTP/1.1"));
    assert!(
        heads[0]
            .to_ascii_lowercase()
            .contains("authorization: bearer tok-123")
    );
}

#[test]
fn wrapped_payload_with_extra_keys_decodes() {
    let body = format!(r#"{{"success":true,"count":1,"data":[{}]}}"#, BUDGET_JSON);
    let (base, server) = serve(vec![("200 OK", body)]);
    let mut ctx = signed_in();

    let list = client(&base).fetch_budgets(&mut ctx.session).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].period, Period::Monthly);
    assert_eq!(list[0].amount, dec!(300));
    assert!(list[0].enable_alerts);
    assert!(
        server.join().unwrap()[0].starts_with("GET /api/budgets HTTP/1.1")
    );
}

#[test]
fn empty_array_decodes_to_no_records() {
    let (base, server) = serve(vec![
        ("200 OK", "[]".to_string()),
        ("200 OK", r#"{"data":[]}"#.to_string()),
    ]);
    let mut ctx = signed_in();
    let remote = client(&base);

    assert!(remote.fetch_transactions(&mut ctx.session).unwrap().is_empty());
    assert!(remote.fetch_budgets(&mut ctx.session).unwrap().is_empty());
    server.join().unwrap();
}

#[test]
fn malformed_body_is_a_network_error() {
    let (base, server) = serve(vec![("200 OK", r#"{"items":[]}"#.to_string())]);
    let mut ctx = signed_in();

    let err = client(&base)
        .fetch_transactions(&mut ctx.session)
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)));
    assert!(ctx.session.is_authenticated());
    server.join().unwrap();
}

#[test]
fn unauthorized_response_signs_out() {
    let (base, server) = serve(vec![("401 Unauthorized", r#"{"message":"expired"}"#.to_string())]);
    let mut ctx = signed_in();
    assert!(ctx.session.is_authenticated());

    let err = client(&base)
        .fetch_transactions(&mut ctx.session)
        .unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert!(!ctx.session.is_authenticated());
    assert_eq!(ctx.session.token(), None);
    server.join().unwrap();
}

#[test]
fn sync_loads_remote_records_into_the_store() {
    let (base, server) = serve(vec![("200 OK", format!(r#"{{"data":[{}]}}"#, TX_JSON))]);
    let mut ctx = signed_in();

    run_sync(&mut ctx, &client(&base), "transactions").unwrap();
    assert_eq!(ctx.transactions.transactions().len(), 1);
    assert_eq!(ctx.transactions.total_expense(), dec!(12.5));
    server.join().unwrap();
}

#[test]
fn sync_reports_failure_after_unauthorized() {
    let (base, server) = serve(vec![("401 Unauthorized", "{}".to_string())]);
    let mut ctx = signed_in();

    let err = run_sync(&mut ctx, &client(&base), "budgets").unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Auth(_))));
    assert!(!ctx.session.is_authenticated());
    assert!(ctx.budgets.budgets().is_empty());
    server.join().unwrap();
}

#[test]
fn sync_reports_rate_limit_and_shows_notice_once() {
    let (base, server) = serve(vec![
        ("429 Too Many Requests", "{}".to_string()),
        ("429 Too Many Requests", "{}".to_string()),
        ("200 OK", "[]".to_string()),
    ]);
    let mut ctx = signed_in();
    let remote = client(&base);

    let err = run_sync(&mut ctx, &remote, "transactions").unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::RateLimited)));
    assert!(run_sync(&mut ctx, &remote, "transactions").is_err());
    assert!(!remote.notice().should_show());
    assert!(ctx.session.is_authenticated());

    run_sync(&mut ctx, &remote, "transactions").unwrap();
    assert!(remote.notice().should_show());
    server.join().unwrap();
}
