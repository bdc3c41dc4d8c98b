use chrono::{DateTime, NaiveDate, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;
use crate::models::shared::validate_text;

/// Request body for account creation (student self-registration, or a teacher
/// account created by an admin).
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// E-mail address used as the login name (3-120 chars).
    #[schema(example = "nimal@school.lk")]
    pub username: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Must equal `password`.
    #[schema(example = "s3cure_P@ss!")]
    pub confirm_password: String,
    #[schema(example = "Nimal")]
    pub first_name: String,
    #[schema(example = "Perera")]
    pub last_name: String,
    /// `YYYY-MM-DD`.
    #[schema(example = "2008-04-17")]
    pub date_of_birth: NaiveDate,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    let len = username.chars().count();
    if !(3..=120).contains(&len) {
        return Err(AppError::Validation(
            "Username must be 3-120 characters".into(),
        ));
    }
    if !username.contains('@') || username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Username must be a valid e-mail address".into(),
        ));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    if payload.password != payload.confirm_password {
        return Err(AppError::Validation("Passwords do not match".into()));
    }
    validate_text("First name", &payload.first_name, 100)?;
    validate_text("Last name", &payload.last_name, 100)?;
    if payload.date_of_birth > Utc::now().date_naive() {
        return Err(AppError::Validation(
            "Date of birth cannot be in the future".into(),
        ));
    }
    Ok(())
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "nimal@school.lk")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Public view of an account.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "nimal@school.lk")]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "Nimal Perera")]
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub role: Role,
    /// Only meaningful for students.
    pub has_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            date_of_birth: user.date_of_birth,
            role: user.role,
            has_paid: user.has_paid,
            created_at: user.created_at,
        }
    }
}

/// Successful login response. The same token is also set as the session cookie.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// Simulated card payment. Nothing is charged or stored.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct PaymentRequest {
    #[schema(example = "4111 1111 1111 1111")]
    pub card_number: String,
    #[schema(example = "N PERERA")]
    pub card_holder: String,
    #[schema(example = "12/27")]
    pub expiry: String,
    #[schema(example = "123")]
    pub cvv: String,
}

pub fn validate_payment_request(payload: &PaymentRequest) -> Result<(), AppError> {
    let fields = [
        ("Card number", &payload.card_number),
        ("Card holder", &payload.card_holder),
        ("Expiry", &payload.expiry),
        ("CVV", &payload.cvv),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{name} is required")));
        }
    }
    Ok(())
}
