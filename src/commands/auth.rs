// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::context::AppContext;
use crate::models::{Role, Session, User};
use crate::utils::validate_email;
use anyhow::{Result, bail};

pub fn handle(ctx: &mut AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("login", sub)) => login(ctx, sub)?,
        Some(("logout", _)) => {
            ctx.session.logout()?;
            println!("Signed out");
        }
        Some(("status", _)) => match ctx.session.current() {
            Some(s) => println!(
                "Signed in as {} <{}> ({})",
                s.user.name,
                s.user.email,
                s.role.as_str()
            ),
            None => println!("Not signed in"),
        },
        _ => {}
    }
    Ok(())
}

fn login(ctx: &mut AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let email = required(sub, "email")?;
    if !validate_email(email) {
        bail!("Invalid email address '{}'", email);
    }
    let session = Session {
        user: User {
            id: required(sub, "user_id")?.to_string(),
            name: required(sub, "name")?.to_string(),
            email: email.to_string(),
        },
        token: required(sub, "token")?.to_string(),
        role: required(sub, "role")?.parse::<Role>()?,
    };
    ctx.session.login(session)?;
    println!("Signed in as {}", email);
    Ok(())
}
