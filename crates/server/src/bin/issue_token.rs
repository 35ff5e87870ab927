//! Mint a signed token for local development.
//!
//! Usage: cargo run --bin issue-token -- <username> [hours]
//!
//! Uses JWT_SECRET_KEY / JWT_EXPIRE_HOURS from the environment (or .env), so
//! the token is accepted by a match server started with the same settings.

use std::env;

use anyhow::{bail, Context};
use match_server::auth::jwt;
use match_server::config::Config;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let username = args.next().context("usage: issue-token <username> [hours]")?;
    if username.trim().is_empty() {
        bail!("username must not be empty");
    }

    let config = Config::from_env();
    let hours = match args.next() {
        Some(h) => h.parse().with_context(|| format!("invalid hours {h:?}"))?,
        None => config.jwt_expire_hours,
    };

    let token = jwt::create_token(&username, &config.jwt_secret, hours)?;
    println!("{token}");
    Ok(())
}
