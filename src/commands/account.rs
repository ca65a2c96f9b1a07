//! Account commands: sign-in, registration, sign-out and the profile.

use owo_colors::OwoColorize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{App, print_json};
use crate::error::{ReelError, Result};
use crate::profile::Profiles;
use crate::session::SignUpForm;
use crate::types::ProfileUpdate;

/// Line reader over stdin for values not given on the command line
struct Prompter {
    stdin: BufReader<tokio::io::Stdin>,
}

impl Prompter {
    fn new() -> Self {
        Self {
            stdin: BufReader::new(tokio::io::stdin()),
        }
    }

    async fn value_or_prompt(&mut self, value: Option<String>, prompt: &str) -> Result<String> {
        if let Some(value) = value {
            return Ok(value);
        }
        eprint!("{prompt}: ");
        let mut line = String::new();
        self.stdin.read_line(&mut line).await?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

pub async fn cmd_login(email: &str, password: Option<String>, output_json: bool) -> Result<()> {
    let password = Prompter::new().value_or_prompt(password, "Password").await?;
    let app = App::load()?;
    let identity = app.session()?.login(email, &password).await?;
    let user_id = identity.require_user()?;

    if output_json {
        return print_json(&json!({ "action": "login", "user_id": user_id }));
    }
    println!("{} as {}", "Signed in".green(), email.cyan());
    Ok(())
}

pub async fn cmd_signup(
    name: &str,
    email: &str,
    password: Option<String>,
    confirm_password: Option<String>,
    output_json: bool,
) -> Result<()> {
    let mut prompter = Prompter::new();
    let password = prompter.value_or_prompt(password, "Password").await?;
    let confirm_password = prompter
        .value_or_prompt(confirm_password, "Confirm password")
        .await?;
    let form = SignUpForm {
        name: name.to_string(),
        email: email.to_string(),
        password,
        confirm_password,
    };
    form.validate()?;

    let app = App::load()?;
    let user_id = app.session()?.sign_up(&form).await?;

    if output_json {
        return print_json(&json!({ "action": "signup", "user_id": user_id }));
    }
    println!(
        "{} Sign in with `reelsync login {}`",
        "Registration successful.".green(),
        email
    );
    Ok(())
}

pub async fn cmd_logout(output_json: bool) -> Result<()> {
    let app = App::load()?;
    app.session()?.logout().await?;

    if output_json {
        return print_json(&json!({ "action": "logout", "success": true }));
    }
    println!("Signed out");
    Ok(())
}

pub async fn cmd_whoami(output_json: bool) -> Result<()> {
    let app = App::load()?;
    let identity = app.identity().await?;

    if output_json {
        return print_json(&json!({ "user_id": identity.user() }));
    }
    match identity.user() {
        Some(user_id) => println!("{user_id}"),
        None => println!("{}", "not signed in".dimmed()),
    }
    Ok(())
}

pub async fn cmd_profile_show(output_json: bool) -> Result<()> {
    let app = App::load()?;
    let identity = app.identity().await?;
    let user_id = identity.require_user()?;
    let summary = Profiles::new(app.data()?).summary(user_id).await?;
    let profile = &summary.profile;

    if output_json {
        return print_json(&json!({
            "profile": serde_json::to_value(profile)?,
            "saved_count": summary.saved_count,
        }));
    }

    let field = |value: &Option<String>| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "not set".dimmed().to_string())
    };
    println!("{}", profile.name.cyan().bold());
    println!("  email: {}", field(&profile.email));
    println!("  phone: {}", field(&profile.phone));
    println!("  bio: {}", field(&profile.bio));
    println!("  saved movies: {}", summary.saved_count);
    Ok(())
}

/// Update profile fields; fields not given keep their current value
pub async fn cmd_profile_set(
    name: Option<String>,
    phone: Option<String>,
    bio: Option<String>,
    output_json: bool,
) -> Result<()> {
    if name.is_none() && phone.is_none() && bio.is_none() {
        return Err(ReelError::Validation(
            "nothing to update, pass --name, --phone or --bio".to_string(),
        ));
    }

    let app = App::load()?;
    let identity = app.identity().await?;
    let user_id = identity.require_user()?;
    let profiles = Profiles::new(app.data()?);
    let current = profiles.profile(user_id).await?;

    let update = ProfileUpdate {
        name: name.unwrap_or(current.name),
        phone: phone.or(current.phone).unwrap_or_default(),
        bio: bio.or(current.bio).unwrap_or_default(),
    };
    profiles.update_profile(user_id, &update).await?;

    if output_json {
        return print_json(&json!({
            "action": "profile_update",
            "profile": serde_json::to_value(&update)?,
        }));
    }
    println!("Profile updated");
    Ok(())
}
