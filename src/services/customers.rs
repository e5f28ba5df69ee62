use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::validate_not_blank;
use crate::{
    auth::password,
    db::DbPool,
    entities::customer::{self, normalize_email, Entity as Customer, Role},
    errors::ServiceError,
};

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterCustomer {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    #[schema(example = "Ada")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[validate(email, length(max = 255))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(custom = "validate_password")]
    #[schema(example = "correct-horse-battery")]
    pub password: String,
}

fn validate_password(value: &str) -> Result<(), ValidationError> {
    password::check_policy(value).map_err(|msg| {
        let mut err = ValidationError::new("password_policy");
        err.message = Some(msg.into());
        err
    })
}

/// Public view of a customer account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerProfile {
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[schema(value_type = String, format = Date)]
    pub created_at: NaiveDate,
    pub role: Role,
}

impl From<customer::Model> for CustomerProfile {
    fn from(model: customer::Model) -> Self {
        Self {
            customer_id: model.customer_id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            created_at: model.created_at,
            role: model.role,
        }
    }
}

/// Service for customer accounts and credentials
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Registers a customer account with the given role
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register_with_role(
        &self,
        mut input: RegisterCustomer,
        role: Role,
    ) -> Result<customer::Model, ServiceError> {
        input.email = normalize_email(&input.email);
        input.validate()?;
        let email = input.email;

        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_blocking(input.password).await?;

        let created = customer::ActiveModel {
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(role),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_db_with_conflict(e, "Email already registered"))?;

        info!(customer_id = created.customer_id, role = role.as_str(), "Customer registered");
        Ok(created)
    }

    /// Registers a regular customer
    pub async fn register(&self, input: RegisterCustomer) -> Result<customer::Model, ServiceError> {
        self.register_with_role(input, Role::Customer).await
    }

    /// Checks credentials and returns the matching customer
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<customer::Model, ServiceError> {
        let invalid = || ServiceError::Unauthorized("Incorrect email or password".to_string());

        let Some(customer) = self.find_by_email(&normalize_email(email)).await? else {
            // Same Argon2 cost as a known account
            verify_blocking(password, password::DUMMY_PASSWORD_HASH).await?;
            warn!("Login attempt for unknown email");
            return Err(invalid());
        };

        if !verify_blocking(password, &customer.password_hash).await? {
            warn!(customer_id = customer.customer_id, "Login attempt with wrong password");
            return Err(invalid());
        }
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: i32) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<customer::Model>, ServiceError> {
        Ok(Customer::find()
            .filter(customer::Column::Email.eq(normalize_email(email)))
            .one(&*self.db_pool)
            .await?)
    }

    /// Replaces the password of an existing account
    #[instrument(skip(self, new_password))]
    pub async fn set_password(
        &self,
        customer_id: i32,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        password::check_policy(new_password).map_err(ServiceError::ValidationError)?;
        let existing = self.get_customer(customer_id).await?;
        let password_hash = hash_blocking(new_password.to_string()).await?;

        let mut active: customer::ActiveModel = existing.into();
        active.password_hash = Set(password_hash);
        active.update(&*self.db_pool).await?;
        Ok(())
    }
}

async fn hash_blocking(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ServiceError::InternalError(format!("Password hashing task failed: {e}")))?
        .map_err(ServiceError::from)
}

async fn verify_blocking(candidate: &str, stored: &str) -> Result<bool, ServiceError> {
    let candidate = candidate.to_string();
    let stored = stored.to_string();
    tokio::task::spawn_blocking(move || password::verify_password(&candidate, &stored))
        .await
        .map_err(|e| ServiceError::InternalError(format!("Password verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, run_migrations};
    use assert_matches::assert_matches;

    async fn service() -> CustomerService {
        let db = connect_in_memory().await.unwrap();
        run_migrations(&db).await.unwrap();
        CustomerService::new(Arc::new(db))
    }

    fn registration() -> RegisterCustomer {
        RegisterCustomer {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            password: "cobol-forever".into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn short_password_is_rejected() {
        let mut input = registration();
        input.password = "short".into();
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut input = registration();
        input.email = "not-an-email".into();
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn profile_drops_password_hash() {
        let profile = CustomerProfile::from(customer::Model {
            customer_id: 1,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            created_at: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Customer,
        });
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"customer\""));
    }

    #[tokio::test]
    async fn padded_mixed_case_email_is_normalized_before_validation() {
        let customers = service().await;

        let mut input = registration();
        input.email = "  GRACE@Example.com ".into();
        let created = customers.register(input).await.unwrap();
        assert_eq!(created.email, "grace@example.com");

        assert_matches!(
            customers.register(registration()).await,
            Err(ServiceError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_fail_alike() {
        let customers = service().await;
        customers.register(registration()).await.unwrap();

        let unknown = customers
            .authenticate("nobody@example.com", "cobol-forever")
            .await;
        let wrong = customers
            .authenticate("grace@example.com", "fortran-forever")
            .await;
        assert_matches!(unknown, Err(ServiceError::Unauthorized(ref msg)) if msg == "Incorrect email or password");
        assert_matches!(wrong, Err(ServiceError::Unauthorized(ref msg)) if msg == "Incorrect email or password");
    }
}
