use super::records::Records;
use crate::domain::record::{Collection, Direction, Filter, RecordId, Sort};
use crate::domain::service::{NewService, Service};
use crate::error::{MarketError, Result};
use chrono::Utc;
use tracing::info;

/// Plain CRUD over bookable services.
#[derive(Clone)]
pub struct Catalog {
    records: Records,
}

impl Catalog {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    pub async fn create_service(&self, fields: NewService, created_by: &str) -> Result<Service> {
        let service = fields.into_service(created_by, Utc::now())?;
        self.records.insert(Collection::Services, &service).await?;
        info!(service = %service.id, name = %service.name, "Service created");
        Ok(service)
    }

    pub async fn get_service(&self, service_id: RecordId) -> Result<Service> {
        self.records.get(Collection::Services, service_id).await
    }

    pub async fn list_services(&self, category: Option<&str>) -> Result<Vec<Service>> {
        self.records
            .find_many(
                Collection::Services,
                &Filter::all().with_opt("service_category", category),
                Some(&Sort::by("createdAt", Direction::Descending)),
            )
            .await
    }

    pub async fn delete_service(&self, service_id: RecordId) -> Result<()> {
        let deleted = self
            .records
            .delete(Collection::Services, &Filter::by_id(service_id))
            .await?;
        if deleted == 0 {
            return Err(MarketError::NotFound(format!("service {service_id}")));
        }
        info!(service = %service_id, "Service deleted");
        Ok(())
    }
}
