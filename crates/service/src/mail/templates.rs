use super::EmailMessage;

/// `base_url` must end with `/`.
pub fn verification_email(to: &str, username: &str, base_url: &str, token: &str) -> EmailMessage {
    let link = format!("{base_url}api/v1/auth/confirmed_email/{token}");
    EmailMessage {
        to: to.to_string(),
        subject: "Confirm your email".into(),
        html_body: format!(
            "<p>Hi {username},</p>\
             <p>Please confirm your email address by following this link:</p>\
             <p><a href=\"{link}\">{link}</a></p>"
        ),
    }
}

pub fn password_reset_email(to: &str, username: &str, base_url: &str, token: &str) -> EmailMessage {
    let link = format!("{base_url}api/v1/auth/reset_password/{token}");
    EmailMessage {
        to: to.to_string(),
        subject: "Password reset request".into(),
        html_body: format!(
            "<p>Hi {username},</p>\
             <p>Use this token to set a new password. It expires shortly.</p>\
             <p><code>{token}</code></p>\
             <p>POST the new password to <a href=\"{link}\">{link}</a>.</p>\
             <p>If you did not request a reset, ignore this message.</p>"
        ),
    }
}
