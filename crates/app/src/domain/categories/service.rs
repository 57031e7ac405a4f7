//! Categories service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::categories::{
        data::NewCategory, errors::CategoriesServiceError, records::CategoryRecord,
        repository::PgCategoriesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCategoriesService {
    db: Db,
    repository: PgCategoriesRepository,
}

impl PgCategoriesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCategoriesRepository::new(),
        }
    }
}

#[async_trait]
impl CategoriesService for PgCategoriesService {
    #[tracing::instrument(
        name = "categories.service.create_category",
        skip(self, category),
        fields(category_uuid = %category.uuid),
        err
    )]
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CategoryRecord, CategoriesServiceError> {
        if category.name.trim().is_empty() {
            return Err(CategoriesServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_category(&mut tx, &category).await?;

        tx.commit().await?;

        info!(category_uuid = %created.uuid, "created category");

        Ok(created)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, CategoriesServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let categories = self.repository.list_categories(&mut tx).await?;

        tx.commit().await?;

        Ok(categories)
    }
}

#[automock]
#[async_trait]
pub trait CategoriesService: Send + Sync {
    /// Creates a new category.
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CategoryRecord, CategoriesServiceError>;

    /// Retrieves all categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, CategoriesServiceError>;
}

#[cfg(all(test, feature = "integration-tests"))]
mod tests {
    use testresult::TestResult;

    use crate::{domain::categories::records::CategoryUuid, test::TestContext};

    use super::*;

    #[tokio::test]
    async fn created_categories_are_listed_by_name() -> TestResult {
        let ctx = TestContext::new().await;

        for name in ["Shirts", "Hoodies"] {
            ctx.categories
                .create_category(NewCategory {
                    uuid: CategoryUuid::new(),
                    name: name.to_string(),
                    description: String::new(),
                })
                .await?;
        }

        let names: Vec<String> = ctx
            .categories
            .list_categories()
            .await?
            .into_iter()
            .map(|category| category.name)
            .collect();

        assert_eq!(names, vec!["Hoodies".to_string(), "Shirts".to_string()]);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_name_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        let new_category = |uuid| NewCategory {
            uuid,
            name: "Shirts".to_string(),
            description: String::new(),
        };

        ctx.categories
            .create_category(new_category(CategoryUuid::new()))
            .await?;

        let result = ctx
            .categories
            .create_category(new_category(CategoryUuid::new()))
            .await;

        assert!(
            matches!(result, Err(CategoriesServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }
}
