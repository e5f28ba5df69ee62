use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::category::{self, Entity as Category},
    errors::ServiceError,
};

const MAX_CATEGORY_NAME: usize = 100;

/// Body for creating or renaming a category. `name` is optional so a missing
/// field reports the same error as a blank one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CategoryInput {
    #[schema(example = "Outerwear")]
    pub name: Option<String>,
}

/// Service for managing catalog categories
#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists every category ordered by id
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        let categories = Category::find()
            .order_by_asc(category::Column::CategoryId)
            .all(&*self.db_pool)
            .await?;
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, category_id: i32) -> Result<category::Model, ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CategoryInput,
    ) -> Result<category::Model, ServiceError> {
        let name = clean_name(input.name)?;
        self.ensure_name_free(&name, None).await?;

        let created = category::ActiveModel {
            name: Set(name),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_db_with_conflict(e, "Category already exists"))?;

        info!(category_id = created.category_id, "Category created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        category_id: i32,
        input: CategoryInput,
    ) -> Result<category::Model, ServiceError> {
        let name = clean_name(input.name)?;
        let existing = self.get_category(category_id).await?;
        self.ensure_name_free(&name, Some(category_id)).await?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(name);
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_db_with_conflict(e, "Category already exists"))?;

        Ok(updated)
    }

    /// Deletes a category. Its products stay in the catalog without a category.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: i32) -> Result<(), ServiceError> {
        let result = Category::delete_by_id(category_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Category not found".to_string()));
        }
        info!(category_id, "Category deleted");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i32>) -> Result<(), ServiceError> {
        let mut query = Category::find().filter(category::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(category::Column::CategoryId.ne(id));
        }
        if query.one(&*self.db_pool).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category '{name}' already exists"
            )));
        }
        Ok(())
    }
}

fn clean_name(name: Option<String>) -> Result<String, ServiceError> {
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServiceError::BadRequest("Missing 'name'".to_string()))?;
    if name.chars().count() > MAX_CATEGORY_NAME {
        return Err(ServiceError::ValidationError(format!(
            "name: must be at most {MAX_CATEGORY_NAME} characters"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn missing_and_blank_names_are_rejected() {
        assert_matches!(clean_name(None), Err(ServiceError::BadRequest(msg)) if msg == "Missing 'name'");
        assert_matches!(clean_name(Some("   ".into())), Err(ServiceError::BadRequest(_)));
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(clean_name(Some("  Shoes ".into())).unwrap(), "Shoes");
        assert_matches!(
            clean_name(Some("x".repeat(MAX_CATEGORY_NAME + 1))),
            Err(ServiceError::ValidationError(_))
        );
    }
}
