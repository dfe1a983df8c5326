use chrono::Utc;
use uuid::Uuid;

use thrifter_core::domain::users::{Role, User};

use crate::users::auth::jwt::Jwt;

const JWT_SECRET: &str = "test_secret_key_for_testing_only";
const ISSUER: &str = "thrifter-api";
const AUDIENCE: &str = "thrifter-app";

fn test_user() -> User {
    User {
        id: Uuid::new_v4(),
        email: "alice@example.com".into(),
        password_hash: "hash".into(),
        name: "Alice".into(),
        location: "Lahore".into(),
        phone_number: "+923001234567".into(),
        role: Role::User,
        is_active: true,
        is_verified: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

fn jwt(ttl_secs: i64) -> Jwt {
    Jwt::new(JWT_SECRET, ISSUER, AUDIENCE, ttl_secs)
}

#[test]
fn signs_a_three_part_token() {
    let token = jwt(3600).sign(&test_user()).unwrap();
    assert_eq!(token.split('.').count(), 3);
}

#[test]
fn round_trips_claims() {
    let user = test_user();
    let jwt = jwt(3600);

    let token = jwt.sign(&user).unwrap();
    let claims = jwt.decode(&token).unwrap();

    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.email, user.email);
    assert_eq!(claims.role, "USER");
    assert_eq!(claims.iss, ISSUER);
    assert_eq!(claims.aud, AUDIENCE);
    assert!(claims.exp > claims.iat);
}

#[test]
fn rejects_expired_tokens() {
    // jsonwebtoken applies 60s of default leeway; go well past it.
    let token = jwt(-120).sign(&test_user()).unwrap();
    assert!(jwt(3600).decode(&token).is_err());
}

#[test]
fn rejects_wrong_secret() {
    let token = jwt(3600).sign(&test_user()).unwrap();
    let other = Jwt::new("a_different_secret_entirely", ISSUER, AUDIENCE, 3600);
    assert!(other.decode(&token).is_err());
}

#[test]
fn rejects_wrong_issuer_or_audience() {
    let token = jwt(3600).sign(&test_user()).unwrap();

    let wrong_issuer = Jwt::new(JWT_SECRET, "someone-else", AUDIENCE, 3600);
    assert!(wrong_issuer.decode(&token).is_err());

    let wrong_audience = Jwt::new(JWT_SECRET, ISSUER, "another-app", 3600);
    assert!(wrong_audience.decode(&token).is_err());
}

#[test]
fn rejects_garbage_tokens() {
    let jwt = jwt(3600);
    assert!(jwt.decode("not-a-token").is_err());
    assert!(jwt.decode("").is_err());
}

#[test]
fn each_token_gets_a_unique_jti() {
    let user = test_user();
    let jwt = jwt(3600);

    let a = jwt.decode(&jwt.sign(&user).unwrap()).unwrap();
    let b = jwt.decode(&jwt.sign(&user).unwrap()).unwrap();
    assert_ne!(a.jti, b.jti);
}
