//! Sign-in, registration and profile commands.
//!
//! # Usage
//!
//! ```bash
//! herool login -e ana@example.com -p secreto --as customer
//! herool register -n "Ana" -e ana@example.com --phone 5550100 -p secreto --confirm secreto -r customer
//! herool whoami
//! herool logout
//! ```

use herool_client::{ClientError, Gateway};
use herool_client::auth::{self, Credentials, RegistrationForm};
use herool_core::{User, UserId, UserRole};
use secrecy::SecretString;

use super::{CliError, Context};

pub async fn login(
    ctx: &Context,
    email: &str,
    password: &str,
    role: Option<UserRole>,
) -> Result<(), CliError> {
    let credentials = Credentials::new(email, password).map_err(ClientError::from)?;
    let user = auth::login(ctx.gateway.as_ref(), &ctx.session, &credentials, role).await?;
    tracing::info!("Signed in as {} ({}) with id {}", user.name, user.role, user.id);
    Ok(())
}

pub async fn register(
    ctx: &Context,
    name: String,
    email: String,
    phone: String,
    password: String,
    confirmation: String,
    role: UserRole,
) -> Result<(), CliError> {
    let form = RegistrationForm {
        name,
        email,
        phone,
        password: SecretString::from(password),
        password_confirmation: SecretString::from(confirmation),
        role,
    };
    let user = auth::register(ctx.gateway.as_ref(), form).await?;
    tracing::info!(
        "Registered {} as {} with id {}. Run `herool login` to sign in.",
        user.email,
        user.role,
        user.id
    );
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<(), CliError> {
    auth::logout(&ctx.session)?;
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<(), CliError> {
    match ctx.session.current() {
        Some(user) => log_user(&user),
        None => tracing::info!("Not signed in"),
    }
    Ok(())
}

/// Look up any user by id.
pub async fn show_user(ctx: &Context, id: UserId) -> Result<(), CliError> {
    let user = ctx.gateway.as_ref().get_user(id).await?;
    log_user(&user);
    Ok(())
}

fn log_user(user: &User) {
    tracing::info!(
        "#{} {} <{}> {} phone={} rating={}",
        user.id,
        user.name,
        user.email,
        user.role,
        if user.phone.is_empty() { "-" } else { &user.phone },
        user.rating.map_or_else(|| "-".to_owned(), |r| format!("{r:.1}")),
    );
    if let Some(bio) = &user.bio {
        tracing::info!("  {bio}");
    }
}
