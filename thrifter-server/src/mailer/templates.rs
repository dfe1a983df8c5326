//! Plain-text email bodies.

use super::OutboundEmail;

pub fn verification_otp(to: &str, name: &str, code: &str, ttl_minutes: i64) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Verify your email".to_string(),
        body: format!(
            "Hi {name},\n\n\
             Your verification code is: {code}\n\n\
             The code expires in {ttl_minutes} minutes. If you did not create \
             an account, you can ignore this email.\n\n\
             The Thrifter Team"
        ),
    }
}

pub fn password_reset(to: &str, name: &str, frontend_url: &str, token: &str) -> OutboundEmail {
    let link = format!("{}/reset-password?token={}", frontend_url.trim_end_matches('/'), token);
    OutboundEmail {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        body: format!(
            "Hi {name},\n\n\
             We received a request to reset your password. Use the link below \
             to choose a new one:\n\n\
             {link}\n\n\
             The link expires in 15 minutes and can only be used once. If you \
             did not request a reset, no action is needed.\n\n\
             The Thrifter Team"
        ),
    }
}

/// Sent when an administrator creates an account on someone's behalf.
pub fn admin_created_account(to: &str, name: &str, password: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Your account has been created".to_string(),
        body: format!(
            "Hi {name},\n\n\
             An account has been created for you. Sign in with:\n\n\
             Email: {to}\n\
             Password: {password}\n\n\
             Please change your password after your first login.\n\n\
             The Thrifter Team"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_handles_trailing_slash() {
        let email = password_reset("a@b.com", "Ada", "https://app.example.com/", "tok123");
        assert!(
            email
                .body
                .contains("https://app.example.com/reset-password?token=tok123")
        );
    }

    #[test]
    fn otp_body_contains_code_and_ttl() {
        let email = verification_otp("a@b.com", "Ada", "482913", 10);
        assert!(email.body.contains("482913"));
        assert!(email.body.contains("10 minutes"));
    }
}
