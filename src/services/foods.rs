use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{error, info, instrument};

use crate::{
    db::DbPool,
    entities::food_item::{self, Column as FoodItemColumn, Entity as FoodItem},
    errors::ServiceError,
    events::{Event, EventSender},
    freshness,
    models::{Category, QuantityUnit, StorageLocation},
};

/// Input for creating a food record.
#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub category: Category,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub location: StorageLocation,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub memo: Option<String>,
}

/// Partial update for a food record; only supplied fields are applied.
/// `memo` uses a double option so callers can distinguish "leave unchanged"
/// from "clear".
#[derive(Debug, Clone, Default)]
pub struct FoodPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub purchase_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub location: Option<StorageLocation>,
    pub quantity: Option<f64>,
    pub unit: Option<QuantityUnit>,
    pub memo: Option<Option<String>>,
}

/// Service owning the durable food inventory. Every stored record satisfies
/// `expiry_date >= purchase_date`; mutations that would break that are
/// rejected before anything is written.
#[derive(Clone)]
pub struct FoodService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl FoodService {
    /// Creates a new food service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn check_name(name: &str) -> Result<(), ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "food name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn check_dates(purchase_date: NaiveDate, expiry_date: NaiveDate) -> Result<(), ServiceError> {
        if expiry_date < purchase_date {
            return Err(ServiceError::ValidationError(format!(
                "expiry date {} precedes purchase date {}",
                expiry_date, purchase_date
            )));
        }
        Ok(())
    }

    fn check_quantity(quantity: f64) -> Result<(), ServiceError> {
        if quantity <= 0.0 {
            return Err(ServiceError::ValidationError(format!(
                "quantity must be positive, got {}",
                quantity
            )));
        }
        Ok(())
    }

    /// Create a food record
    #[instrument(skip(self))]
    pub async fn add(&self, input: NewFood) -> Result<food_item::Model, ServiceError> {
        Self::check_name(&input.name)?;
        Self::check_dates(input.purchase_date, input.expiry_date)?;
        Self::check_quantity(input.quantity)?;

        let db = &*self.db_pool;
        let now = Utc::now().naive_utc();

        let item = food_item::ActiveModel {
            name: Set(input.name.trim().to_string()),
            category: Set(input.category),
            purchase_date: Set(input.purchase_date),
            expiry_date: Set(input.expiry_date),
            location: Set(input.location),
            quantity: Set(input.quantity),
            unit: Set(input.unit),
            memo: Set(input.memo),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let record = item.insert(db).await.map_err(|e| {
            error!(error = %e, "Database error when creating food record");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send(Event::FoodAdded {
                id: record.id,
                name: record.name.clone(),
                expiry_date: record.expiry_date,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(food_id = %record.id, name = %record.name, "food record created");

        Ok(record)
    }

    /// Get a food record by id
    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Option<food_item::Model>, ServiceError> {
        let db = &*self.db_pool;

        let record = FoodItem::find_by_id(id).one(db).await.map_err(|e| {
            error!(food_id = %id, error = %e, "Database error when fetching food record");
            ServiceError::DatabaseError(e)
        })?;

        Ok(record)
    }

    /// All records, ascending by expiry date (ties broken by id)
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<food_item::Model>, ServiceError> {
        let db = &*self.db_pool;

        let records = FoodItem::find()
            .order_by_asc(FoodItemColumn::ExpiryDate)
            .order_by_asc(FoodItemColumn::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error when listing food records");
                ServiceError::DatabaseError(e)
            })?;

        Ok(records)
    }

    /// Apply a partial update. Returns `Ok(None)` when the id does not
    /// exist. Rejected updates leave the stored record untouched.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        patch: FoodPatch,
    ) -> Result<Option<food_item::Model>, ServiceError> {
        let db = &*self.db_pool;

        let Some(existing) = FoodItem::find_by_id(id).one(db).await.map_err(|e| {
            error!(food_id = %id, error = %e, "Database error when finding food record");
            ServiceError::DatabaseError(e)
        })?
        else {
            return Ok(None);
        };

        // Validate against the dates the record would hold after the patch;
        // either side of the invariant may be moving.
        let purchase_date = patch.purchase_date.unwrap_or(existing.purchase_date);
        let expiry_date = patch.expiry_date.unwrap_or(existing.expiry_date);
        Self::check_dates(purchase_date, expiry_date)?;

        if let Some(name) = &patch.name {
            Self::check_name(name)?;
        }
        if let Some(quantity) = patch.quantity {
            Self::check_quantity(quantity)?;
        }

        let mut item: food_item::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            item.name = Set(name.trim().to_string());
        }
        if let Some(category) = patch.category {
            item.category = Set(category);
        }
        if let Some(purchase_date) = patch.purchase_date {
            item.purchase_date = Set(purchase_date);
        }
        if let Some(expiry_date) = patch.expiry_date {
            item.expiry_date = Set(expiry_date);
        }
        if let Some(location) = patch.location {
            item.location = Set(location);
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = Set(quantity);
        }
        if let Some(unit) = patch.unit {
            item.unit = Set(unit);
        }
        if let Some(memo) = patch.memo {
            item.memo = Set(memo);
        }

        item.updated_at = Set(Utc::now().naive_utc());

        let updated = item.update(db).await.map_err(|e| {
            error!(food_id = %id, error = %e, "Database error when updating food record");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send(Event::FoodUpdated { id: updated.id })
            .await
            .map_err(ServiceError::EventError)?;

        info!(food_id = %updated.id, "food record updated");

        Ok(Some(updated))
    }

    /// Hard-delete a record. Returns whether a record was removed; deleting
    /// a missing id is not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let Some(existing) = FoodItem::find_by_id(id).one(db).await.map_err(|e| {
            error!(food_id = %id, error = %e, "Database error when finding food record");
            ServiceError::DatabaseError(e)
        })?
        else {
            return Ok(false);
        };

        existing.delete(db).await.map_err(|e| {
            error!(food_id = %id, error = %e, "Database error when deleting food record");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send(Event::FoodDeleted { id })
            .await
            .map_err(ServiceError::EventError)?;

        info!(food_id = %id, "food record deleted");

        Ok(true)
    }

    /// Records with `today <= expiry_date <= today + days`, ascending by
    /// expiry date. `days = 0` returns only items expiring today.
    #[instrument(skip(self))]
    pub async fn expiring_within(&self, days: u32) -> Result<Vec<food_item::Model>, ServiceError> {
        let db = &*self.db_pool;
        let today = freshness::today();
        let horizon = today + Days::new(u64::from(days));

        let records = FoodItem::find()
            .filter(FoodItemColumn::ExpiryDate.gte(today))
            .filter(FoodItemColumn::ExpiryDate.lte(horizon))
            .order_by_asc(FoodItemColumn::ExpiryDate)
            .order_by_asc(FoodItemColumn::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(days = %days, error = %e, "Database error when listing expiring food");
                ServiceError::DatabaseError(e)
            })?;

        Ok(records)
    }

    /// Records past their expiry date, descending by expiry date (most
    /// recently expired first).
    #[instrument(skip(self))]
    pub async fn expired(&self) -> Result<Vec<food_item::Model>, ServiceError> {
        let db = &*self.db_pool;
        let today = freshness::today();

        let records = FoodItem::find()
            .filter(FoodItemColumn::ExpiryDate.lt(today))
            .order_by_desc(FoodItemColumn::ExpiryDate)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error when listing expired food");
                ServiceError::DatabaseError(e)
            })?;

        Ok(records)
    }
}
