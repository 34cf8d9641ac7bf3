//! Shop Store
//!
//! In-memory plants and orders for development.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use plant_core::{
    ChartDataPoint, InventoryUpdate, OrderRecord, Plant, PlantId, Result, ShopError, StockChange,
    StoredOrder,
};

/// Plants and orders behind async locks
#[derive(Default)]
pub struct ShopStore {
    plants: RwLock<HashMap<PlantId, Plant>>,
    orders: RwLock<Vec<StoredOrder>>,
}

impl ShopStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with a few listings
    pub async fn with_demo_plants() -> Self {
        use rust_decimal_macros::dec;

        let store = Self::new();
        for plant in [
            Plant::new("monstera", "Monstera Deliciosa", dec!(40), 12),
            Plant::new("pothos", "Golden Pothos", dec!(15.50), 30),
            Plant::new("snake-plant", "Snake Plant", dec!(22), 8),
        ] {
            store.add_plant(plant).await;
        }
        store
    }

    pub async fn add_plant(&self, plant: Plant) {
        self.plants.write().await.insert(plant.id.clone(), plant);
    }

    pub async fn plants(&self) -> Vec<Plant> {
        let mut plants: Vec<Plant> = self.plants.read().await.values().cloned().collect();
        plants.sort_by(|a, b| a.name.cmp(&b.name));
        plants
    }

    pub async fn plant(&self, id: &PlantId) -> Result<Plant> {
        self.plants
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ShopError::PlantNotFound(id.to_string()))
    }

    /// Charge in cents for `quantity` units, checked against stock
    pub async fn quote(&self, id: &PlantId, quantity: u32) -> Result<i64> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }

        let plant = self.plant(id).await?;
        if quantity > plant.quantity {
            return Err(ShopError::InsufficientStock {
                requested: quantity,
                available: plant.quantity,
            });
        }

        plant
            .amount_cents(quantity)
            .ok_or(ShopError::InvalidQuantity(quantity))
    }

    /// Persist an order for a listed plant
    pub async fn insert_order(&self, record: OrderRecord) -> Result<StoredOrder> {
        let quantity = record.purchase.quantity;
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        self.plant(&record.purchase.plant_id).await?;

        let order = StoredOrder::new(record);
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    /// Orders placed by `email`, newest first; all orders when `None`
    pub async fn orders(&self, email: Option<&str>) -> Vec<StoredOrder> {
        let mut orders: Vec<StoredOrder> = self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| email.is_none_or(|e| o.record.purchase.customer.email == e))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Apply a stock change and return the new quantity
    pub async fn adjust_quantity(&self, id: &PlantId, update: &InventoryUpdate) -> Result<u32> {
        let mut plants = self.plants.write().await;
        let plant = plants
            .get_mut(id)
            .ok_or_else(|| ShopError::PlantNotFound(id.to_string()))?;

        plant.quantity = match update.status {
            StockChange::Increase => plant.quantity.saturating_add(update.quantity_to_update),
            StockChange::Decrease => plant
                .quantity
                .checked_sub(update.quantity_to_update)
                .ok_or(ShopError::InsufficientStock {
                    requested: update.quantity_to_update,
                    available: plant.quantity,
                })?,
        };

        tracing::info!(
            plant_id = %id,
            change = ?update.status,
            by = update.quantity_to_update,
            remaining = plant.quantity,
            "Adjusted inventory"
        );
        Ok(plant.quantity)
    }

    /// Orders aggregated per calendar day, oldest first.
    ///
    /// Sums saturate instead of overflowing.
    pub async fn chart_data(&self) -> Vec<ChartDataPoint> {
        let mut days: BTreeMap<NaiveDate, (u32, Decimal, u32)> = BTreeMap::new();

        for order in self.orders.read().await.iter() {
            let purchase = &order.record.purchase;
            let entry = days
                .entry(order.created_at.date_naive())
                .or_insert((0, Decimal::ZERO, 0));
            entry.0 = entry.0.saturating_add(1);
            entry.1 = entry.1.checked_add(purchase.price).unwrap_or(Decimal::MAX);
            entry.2 = entry.2.saturating_add(purchase.quantity);
        }

        days.into_iter()
            .map(|(day, (orders, price, quantity))| ChartDataPoint {
                date: day.format("%m/%d/%Y").to_string(),
                orders: Some(f64::from(orders)),
                price: price.to_f64(),
                quantity: Some(f64::from(quantity)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_core::{Customer, PurchaseInfo};
    use rust_decimal_macros::dec;

    fn order(email: &str, quantity: u32, price: Decimal) -> OrderRecord {
        OrderRecord::new(
            PurchaseInfo::new("monstera", quantity, price, Customer::new("A", email)),
            "txn",
        )
    }

    #[tokio::test]
    async fn test_quote_checks_stock() {
        let store = ShopStore::with_demo_plants().await;
        let id = PlantId::new("monstera");

        assert_eq!(store.quote(&id, 2).await.unwrap(), 8000);
        assert!(matches!(
            store.quote(&id, 13).await,
            Err(ShopError::InsufficientStock { available: 12, .. })
        ));
        assert!(matches!(store.quote(&id, 0).await, Err(ShopError::InvalidQuantity(0))));
        assert!(matches!(
            store.quote(&PlantId::new("cactus"), 1).await,
            Err(ShopError::PlantNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_decrease_never_goes_negative() {
        let store = ShopStore::with_demo_plants().await;
        let id = PlantId::new("snake-plant");

        assert_eq!(store.adjust_quantity(&id, &InventoryUpdate::decrease(3)).await.unwrap(), 5);
        assert!(store.adjust_quantity(&id, &InventoryUpdate::decrease(6)).await.is_err());
        assert_eq!(store.plant(&id).await.unwrap().quantity, 5);
        assert_eq!(store.adjust_quantity(&id, &InventoryUpdate::increase(2)).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_orders_filtered_by_email() {
        let store = ShopStore::with_demo_plants().await;
        store.insert_order(order("a@x.com", 1, dec!(40))).await.unwrap();
        store.insert_order(order("b@x.com", 1, dec!(40))).await.unwrap();

        assert_eq!(store.orders(Some("a@x.com")).await.len(), 1);
        assert_eq!(store.orders(None).await.len(), 2);
    }

    #[tokio::test]
    async fn test_chart_data_aggregates_per_day() {
        let store = ShopStore::with_demo_plants().await;
        store.insert_order(order("a@x.com", 2, dec!(80))).await.unwrap();
        store.insert_order(order("b@x.com", 1, dec!(15.5))).await.unwrap();

        let data = store.chart_data().await;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].orders, Some(2.0));
        assert_eq!(data[0].price, Some(95.5));
        assert_eq!(data[0].quantity, Some(3.0));
    }

    #[tokio::test]
    async fn test_order_requires_listed_plant_and_quantity() {
        let store = ShopStore::with_demo_plants().await;

        let mut unknown = order("a@x.com", 1, dec!(10));
        unknown.purchase.plant_id = PlantId::new("cactus");
        assert!(matches!(
            store.insert_order(unknown).await,
            Err(ShopError::PlantNotFound(_))
        ));
        assert!(matches!(
            store.insert_order(order("a@x.com", 0, dec!(10))).await,
            Err(ShopError::InvalidQuantity(0))
        ));
        assert!(store.orders(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_chart_data_saturates_on_huge_orders() {
        let store = ShopStore::with_demo_plants().await;
        store
            .insert_order(order("a@x.com", 3_000_000_000, Decimal::MAX))
            .await
            .unwrap();
        store
            .insert_order(order("b@x.com", 3_000_000_000, Decimal::MAX))
            .await
            .unwrap();

        let data = store.chart_data().await;
        assert_eq!(data[0].orders, Some(2.0));
        assert_eq!(data[0].quantity, Some(f64::from(u32::MAX)));
        assert_eq!(data[0].price, Decimal::MAX.to_f64());
    }
}
