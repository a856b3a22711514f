//! Shared fixtures for unit and HTTP tests

use platform::password::{ClearTextPassword, PasswordHashParams};

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::value_object::{
    account_status::AccountStatus, authorities::Authorities, email::Email, role::Role,
};

pub const FAST: PasswordHashParams = PasswordHashParams::new(8, 1, 1);

pub const FULL_ARTICLE_AUTHORITIES: &str =
    "article:create,article:read,article:update,article:delete";

pub fn test_config() -> AuthConfig {
    let mut config = AuthConfig::development().unwrap();
    config.password_params = FAST;
    config
}

pub fn account(email: &str, password: &str, status: AccountStatus) -> Account {
    let hash = ClearTextPassword::new(password.to_string())
        .hash(FAST, None)
        .unwrap();

    Account::new(
        Email::new(email).unwrap(),
        hash,
        Role::User,
        Authorities::parse(FULL_ARTICLE_AUTHORITIES),
    )
    .with_status(status)
}
