//! Login, registration and logout.
//!
//! The role a user acts as is the one the remote reports for the account.
//! A front end may say which role it expects (the login screen has a
//! customer/technician toggle); a mismatch is an error rather than an
//! override, so a customer account cannot sign into the technician view.

use herool_core::{Email, User, UserRole};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use crate::error::{ClientError, ValidationError};
use crate::gateway::Gateway;
use crate::session::SessionStore;

/// Minimum registration password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validated login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    email: Email,
    password: SecretString,
}

impl Credentials {
    /// Build credentials from raw form input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingCredentials`] if either field is
    /// empty, or [`ValidationError::InvalidEmail`] for a malformed address.
    pub fn new(email: &str, password: &str) -> Result<Self, ValidationError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(Self {
            email: Email::parse(email)?,
            password: SecretString::from(password.to_owned()),
        })
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Raw registration form input.
#[derive(Debug)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
    pub role: UserRole,
}

impl RegistrationForm {
    /// Check the form and produce a [`Registration`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a field is empty, the passwords
    /// differ, the password is shorter than [`MIN_PASSWORD_LENGTH`], or the
    /// email is malformed.
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let password = self.password.expose_secret();
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.phone.trim().is_empty()
            || password.is_empty()
        {
            return Err(ValidationError::MissingFields);
        }

        if password != self.password_confirmation.expose_secret() {
            return Err(ValidationError::PasswordMismatch);
        }

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        Ok(Registration {
            name: self.name.trim().to_owned(),
            email: Email::parse(&self.email)?,
            phone: self.phone.trim().to_owned(),
            password: self.password,
            role: self.role,
        })
    }
}

/// A validated registration, ready to submit.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub password: SecretString,
    pub role: UserRole,
}

/// Sign in and store the account in the session.
///
/// # Errors
///
/// Returns [`ClientError::RoleMismatch`] if `expected_role` is given and the
/// account has a different role (the session is left untouched), or the
/// gateway/session failure.
#[instrument(skip(gateway, session, credentials), fields(email = %credentials.email()))]
pub async fn login<G: Gateway + ?Sized>(
    gateway: &G,
    session: &SessionStore,
    credentials: &Credentials,
    expected_role: Option<UserRole>,
) -> Result<User, ClientError> {
    let user = gateway.login(credentials).await?;

    if let Some(expected) = expected_role {
        if expected != user.role {
            warn!(user_id = %user.id, %expected, actual = %user.role, "Login role mismatch");
            return Err(ClientError::RoleMismatch {
                expected,
                actual: user.role,
            });
        }
    }

    session.set(user.clone())?;
    info!(user_id = %user.id, role = %user.role, "Signed in");
    Ok(user)
}

/// Create an account. The caller signs in separately afterwards.
///
/// # Errors
///
/// Returns the validation or gateway failure.
#[instrument(skip(gateway, form), fields(role = %form.role))]
pub async fn register<G: Gateway + ?Sized>(
    gateway: &G,
    form: RegistrationForm,
) -> Result<User, ClientError> {
    let registration = form.validate()?;
    let user = gateway.register(&registration).await?;
    info!(user_id = %user.id, "Registered");
    Ok(user)
}

/// Clear the session; bound controllers deactivate in response.
///
/// # Errors
///
/// Returns an error if the persisted session cannot be removed.
pub fn logout(session: &SessionStore) -> Result<(), ClientError> {
    session.clear()?;
    info!("Signed out");
    Ok(())
}
