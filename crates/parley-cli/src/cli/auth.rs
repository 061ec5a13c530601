//! Interactive sign-in for CLI commands.
//!
//! Flags pick the mode when given; otherwise the user is asked. Passwords
//! are always prompted, never taken from arguments.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, Password, Select};
use parley_core::auth::controller::AuthController;
use parley_core::auth::gateway::AuthGateway;
use parley_types::identity::Identity;
use secrecy::SecretString;

use super::IdentityArgs;

/// How the user wants to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    Guest,
    SignIn(String),
    SignUp(String),
}

/// The mode implied by command-line flags, if any.
pub fn mode_from_flags(who: &IdentityArgs, signup: bool) -> Option<AuthMode> {
    if who.guest {
        return Some(AuthMode::Guest);
    }
    who.email.as_ref().map(|email| {
        if signup {
            AuthMode::SignUp(email.clone())
        } else {
            AuthMode::SignIn(email.clone())
        }
    })
}

/// Ask how to authenticate.
pub fn prompt_mode() -> Result<AuthMode> {
    let choice = Select::new()
        .with_prompt("How would you like to continue?")
        .items(&["Sign in", "Create account", "Continue as guest"])
        .default(0)
        .interact()?;

    if choice == 2 {
        return Ok(AuthMode::Guest);
    }

    let email: String = Input::new().with_prompt("Email").interact_text()?;
    Ok(if choice == 0 {
        AuthMode::SignIn(email)
    } else {
        AuthMode::SignUp(email)
    })
}

fn prompt_password(confirm: bool) -> Result<SecretString> {
    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords don't match");
    }
    Ok(SecretString::from(prompt.interact()?))
}

/// Authenticate through `controller`.
///
/// On an auth error the corrective message is printed. With
/// `offer_guest`, the user may then continue as guest; otherwise the
/// command fails.
pub async fn authenticate<A: AuthGateway>(
    controller: &mut AuthController<A>,
    mode: AuthMode,
    offer_guest: bool,
) -> Result<Identity> {
    let result = match &mode {
        AuthMode::Guest => return Ok(controller.continue_as_guest().await),
        AuthMode::SignIn(email) => {
            let password = prompt_password(false)?;
            controller.sign_in(email, &password).await
        }
        AuthMode::SignUp(email) => {
            let password = prompt_password(true)?;
            controller.sign_up(email, &password).await
        }
    };

    match result {
        Ok(identity) => Ok(identity),
        Err(e) => {
            tracing::debug!(error = %e, "Authentication failed");
            eprintln!();
            eprintln!("  {} {}", style("!").red().bold(), e.user_message());

            let fallback = offer_guest
                && Confirm::new()
                    .with_prompt("Continue as guest instead?")
                    .default(true)
                    .interact()?;

            if fallback {
                Ok(controller.continue_as_guest().await)
            } else {
                anyhow::bail!("{}", e.user_message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flags() {
        let guest = IdentityArgs {
            guest: true,
            email: None,
        };
        assert_eq!(mode_from_flags(&guest, false), Some(AuthMode::Guest));

        let email = IdentityArgs {
            guest: false,
            email: Some("ada@example.com".to_string()),
        };
        assert_eq!(
            mode_from_flags(&email, false),
            Some(AuthMode::SignIn("ada@example.com".to_string()))
        );
        assert_eq!(
            mode_from_flags(&email, true),
            Some(AuthMode::SignUp("ada@example.com".to_string()))
        );

        assert_eq!(mode_from_flags(&IdentityArgs::default(), false), None);
    }

    #[tokio::test]
    async fn test_guest_mode_never_prompts() {
        use parley_core::auth::gateway::OfflineAuthGateway;

        let mut controller = AuthController::new(OfflineAuthGateway::new("offline"));
        let identity = authenticate(&mut controller, AuthMode::Guest, false).await.unwrap();

        assert_eq!(identity, Identity::Guest);
        assert_eq!(controller.identity(), Some(&Identity::Guest));
    }
}
