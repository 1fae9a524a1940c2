//! Verification email content.

use gatehouse_database::Role;

pub const VERIFICATION_SUBJECT: &str = "Verify your email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Escape text for interpolation into HTML.
pub fn html_escape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(c),
        }
    }
    output
}

pub fn verification_link(frontend_url: &str, token: &str) -> String {
    format!("{}/verify-email?token={}", frontend_url.trim_end_matches('/'), token)
}

fn greeting(role: Role) -> &'static str {
    match role {
        Role::User => "Welcome! Please confirm your email address to activate your account.",
        Role::Admin => {
            "Welcome! Please confirm your email address to activate your administrator account and your department."
        }
        // not sent today; staff are approved by their administrator
        Role::Staff => "Welcome! Please confirm your email address.",
    }
}

pub fn render_verification(
    frontend_url: &str,
    email: &str,
    role: Role,
    token: &str,
) -> RenderedEmail {
    let link = verification_link(frontend_url, token);
    let greeting = greeting(role);

    let text = format!(
        "{greeting}\n\nOpen the following link to verify {email}:\n{link}\n\nThe link expires in 24 hours. If you did not register, ignore this message.\n"
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif;">
    <p>{greeting}</p>
    <p>Click the button below to verify <strong>{email}</strong>.</p>
    <p><a href="{link}" style="display: inline-block; padding: 10px 16px; background: #2563eb; color: #ffffff; text-decoration: none; border-radius: 4px;">Verify email</a></p>
    <p>The link expires in 24 hours. If you did not register, ignore this message.</p>
  </body>
</html>
"#,
        greeting = html_escape(greeting),
        email = html_escape(email),
        link = html_escape(&link),
    );

    RenderedEmail {
        subject: VERIFICATION_SUBJECT.to_string(),
        html,
        text,
    }
}
