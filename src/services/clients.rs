use super::{not_blank, publish, substring_pattern, unique_violation};
use crate::{
    db::{db_failure, DbPool},
    entities::{client, report},
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

pub const DUPLICATE_CLIENT: &str = "A client with this name already exists";
pub const CLIENT_IN_USE: &str = "Cannot delete client because it is used in one or more reports";

/// Body accepted when creating or replacing a client
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientInput {
    #[validate(
        length(min = 1, max = 100, message = "Client name must be 1 to 100 characters"),
        custom = "not_blank"
    )]
    #[schema(example = "FAZE THREE LTD")]
    pub name: String,

    #[validate(custom = "not_blank")]
    #[schema(example = "29 Textile Park, Surat - 395003, Gujarat, India")]
    pub address: String,
}

impl ClientInput {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

/// Client registry
#[derive(Clone)]
pub struct ClientService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ClientService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists clients by name, optionally keeping only names containing `search`.
    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<client::Model>, ServiceError> {
        let mut query = client::Entity::find();
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Expr::col((client::Entity, client::Column::Name)).like(substring_pattern(term)),
            );
        }

        query
            .order_by_asc(client::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(db_failure("list_clients"))
    }

    #[instrument(skip(self))]
    pub async fn get_client(&self, id: i32) -> Result<client::Model, ServiceError> {
        client::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(db_failure("get_client"))?
            .ok_or_else(|| ServiceError::NotFound("Client not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<client::Model>, ServiceError> {
        client::Entity::find()
            .filter(client::Column::Name.eq(name))
            .one(&*self.db_pool)
            .await
            .map_err(db_failure("find_client_by_name"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_client(&self, input: ClientInput) -> Result<client::Model, ServiceError> {
        input.validate()?;
        let input = input.normalized();

        if self.find_by_name(&input.name).await?.is_some() {
            return Err(ServiceError::ValidationError(DUPLICATE_CLIENT.to_string()));
        }

        let created = client::ActiveModel {
            name: Set(input.name),
            address: Set(input.address),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(unique_violation(DUPLICATE_CLIENT))?;

        info!(client_id = created.id, "Client created");
        publish(&self.event_sender, Event::ClientCreated(created.id)).await;
        Ok(created)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn update_client(
        &self,
        id: i32,
        input: ClientInput,
    ) -> Result<client::Model, ServiceError> {
        input.validate()?;
        let input = input.normalized();
        let existing = self.get_client(id).await?;

        if let Some(other) = self.find_by_name(&input.name).await? {
            if other.id != id {
                return Err(ServiceError::ValidationError(DUPLICATE_CLIENT.to_string()));
            }
        }

        let mut active: client::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.address = Set(input.address);
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(unique_violation(DUPLICATE_CLIENT))?;

        info!(client_id = id, "Client updated");
        publish(&self.event_sender, Event::ClientUpdated(id)).await;
        Ok(updated)
    }

    /// Deletes a client that no report refers to.
    #[instrument(skip(self))]
    pub async fn delete_client(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get_client(id).await?;

        let references = report::Entity::find()
            .filter(report::Column::ClientId.eq(id))
            .count(db)
            .await
            .map_err(db_failure("count_client_reports"))?;
        if references > 0 {
            return Err(ServiceError::InvalidOperation(CLIENT_IN_USE.to_string()));
        }

        client::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(db_failure("delete_client"))?;

        info!(client_id = id, "Client deleted");
        publish(&self.event_sender, Event::ClientDeleted(id)).await;
        Ok(())
    }
}
