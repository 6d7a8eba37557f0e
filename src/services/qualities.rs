use super::{not_blank, publish, substring_pattern, trimmed, unique_violation};
use crate::{
    db::{db_failure, DbPool},
    entities::{quality, report, report_item},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

pub const DUPLICATE_QUALITY: &str = "A quality with this name already exists";
pub const QUALITY_IN_USE: &str = "Cannot delete quality because it is used in one or more reports";

/// Body accepted when creating or replacing a quality
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QualityInput {
    #[validate(
        length(min = 1, max = 50, message = "Quality name must be 1 to 50 characters"),
        custom = "not_blank"
    )]
    #[schema(example = "Rct 277")]
    pub name: String,

    #[validate(range(min = 1, message = "Denier must be at least 1"))]
    #[schema(example = 200)]
    pub denier: i32,

    #[validate(
        length(min = 1, max = 50, message = "Blend must be 1 to 50 characters"),
        custom = "not_blank"
    )]
    #[schema(example = "2000")]
    pub blend: String,

    #[serde(default)]
    #[validate(length(max = 50, message = "Shade number must be at most 50 characters"))]
    #[schema(example = "S001")]
    pub shade_number: Option<String>,
}

impl QualityInput {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            denier: self.denier,
            blend: self.blend.trim().to_string(),
            shade_number: trimmed(self.shade_number),
        }
    }
}

/// Yarn quality registry
#[derive(Clone)]
pub struct QualityService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl QualityService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_qualities(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<quality::Model>, ServiceError> {
        let mut query = quality::Entity::find();
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Expr::col((quality::Entity, quality::Column::Name)).like(substring_pattern(term)),
            );
        }

        query
            .order_by_asc(quality::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(db_failure("list_qualities"))
    }

    #[instrument(skip(self))]
    pub async fn get_quality(&self, id: i32) -> Result<quality::Model, ServiceError> {
        quality::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(db_failure("get_quality"))?
            .ok_or_else(|| ServiceError::NotFound("Quality not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<quality::Model>, ServiceError> {
        quality::Entity::find()
            .filter(quality::Column::Name.eq(name))
            .one(&*self.db_pool)
            .await
            .map_err(db_failure("find_quality_by_name"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_quality(
        &self,
        input: QualityInput,
    ) -> Result<quality::Model, ServiceError> {
        input.validate()?;
        let input = input.normalized();

        if self.find_by_name(&input.name).await?.is_some() {
            return Err(ServiceError::ValidationError(DUPLICATE_QUALITY.to_string()));
        }

        let created = quality::ActiveModel {
            name: Set(input.name),
            denier: Set(input.denier),
            blend: Set(input.blend),
            shade_number: Set(input.shade_number),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(unique_violation(DUPLICATE_QUALITY))?;

        info!(quality_id = created.id, "Quality created");
        publish(&self.event_sender, Event::QualityCreated(created.id)).await;
        Ok(created)
    }

    /// Replaces a quality's fields. Reports keep the quality values they were written with.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn update_quality(
        &self,
        id: i32,
        input: QualityInput,
    ) -> Result<quality::Model, ServiceError> {
        input.validate()?;
        let input = input.normalized();
        let existing = self.get_quality(id).await?;

        if let Some(other) = self.find_by_name(&input.name).await? {
            if other.id != id {
                return Err(ServiceError::ValidationError(DUPLICATE_QUALITY.to_string()));
            }
        }

        let mut active: quality::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.denier = Set(input.denier);
        active.blend = Set(input.blend);
        active.shade_number = Set(input.shade_number);
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(unique_violation(DUPLICATE_QUALITY))?;

        info!(quality_id = id, "Quality updated");
        publish(&self.event_sender, Event::QualityUpdated(id)).await;
        Ok(updated)
    }

    /// Deletes a quality whose name no report header or report item carries.
    #[instrument(skip(self))]
    pub async fn delete_quality(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get_quality(id).await?;

        let header_refs = report::Entity::find()
            .filter(report::Column::QualityName.eq(existing.name.as_str()))
            .count(db)
            .await
            .map_err(db_failure("count_quality_reports"))?;
        let item_refs = report_item::Entity::find()
            .filter(report_item::Column::QualityName.eq(existing.name.as_str()))
            .count(db)
            .await
            .map_err(db_failure("count_quality_items"))?;
        if header_refs + item_refs > 0 {
            return Err(ServiceError::InvalidOperation(QUALITY_IN_USE.to_string()));
        }

        quality::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(db_failure("delete_quality"))?;

        info!(quality_id = id, "Quality deleted");
        publish(&self.event_sender, Event::QualityDeleted(id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn input(name: &str, denier: i32, blend: &str) -> QualityInput {
        QualityInput {
            name: name.into(),
            denier,
            blend: blend.into(),
            shade_number: None,
        }
    }

    #[rstest]
    #[case(input("", 200, "2000"), "name")]
    #[case(input("Rct 277", 0, "2000"), "denier")]
    #[case(input("Rct 277", -5, "2000"), "denier")]
    #[case(input("Rct 277", 200, " "), "blend")]
    #[case(input(&"Q".repeat(51), 200, "2000"), "name")]
    fn invalid_quality_fields(#[case] input: QualityInput, #[case] field: &str) {
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key(field));
    }

    #[test]
    fn blank_shade_number_becomes_none() {
        let mut q = input(" Plt 193 ", 150, "1500");
        q.shade_number = Some("   ".into());
        let q = q.normalized();
        assert_eq!(q.name, "Plt 193");
        assert_eq!(q.shade_number, None);
    }
}
