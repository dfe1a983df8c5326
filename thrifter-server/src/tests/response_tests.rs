use chrono::Utc;
use uuid::Uuid;

use thrifter_core::domain::users::{Role, UserProfile};

use crate::users::auth::handlers::{AuthTokens, RegistrationResponse};

fn profile() -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        email: "alice@example.com".into(),
        name: "Alice".into(),
        location: "Lahore".into(),
        phone_number: "+923001234567".into(),
        role: Role::User,
        is_active: true,
        is_verified: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn gated_registration_flags_otp_and_omits_tokens() {
    let body = serde_json::to_value(RegistrationResponse {
        user: profile(),
        tokens: None,
        otp_required: true,
    })
    .unwrap();

    assert_eq!(body["otp_required"], true);
    assert!(body.get("tokens").is_none());
}

#[test]
fn verified_registration_carries_bearer_tokens() {
    let body = serde_json::to_value(RegistrationResponse {
        user: profile(),
        tokens: Some(AuthTokens {
            access_token: "header.payload.sig".into(),
            refresh_token: "opaque".into(),
            token_type: "Bearer",
            expires_in: 3600,
        }),
        otp_required: false,
    })
    .unwrap();

    assert_eq!(body["otp_required"], false);
    assert_eq!(body["tokens"]["token_type"], "Bearer");
    assert_eq!(body["tokens"]["expires_in"], 3600);
}
