use crate::api_client::{ApiClient, ApiError};
use crate::model::{Booking, Car, CarSearch, Customer};
use crate::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

const NO_CONTENT: u16 = 204;

/// バックエンドのRESTエンドポイントを型付きメソッドに対応付けるファサード
pub struct CarRentalService {
    api: ApiClient,
}

impl CarRentalService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            api: ApiClient::new(base_url, timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url().as_str()
    }

    fn fetch<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let body = self.api.get(self.api.endpoint(segments)?)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn submit<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        payload: &B,
    ) -> Result<T, ApiError> {
        let json = serde_json::to_string(payload)?;
        let body = self.api.post(self.api.endpoint(segments)?, json)?;
        Ok(serde_json::from_str(&body)?)
    }

    // 204 No Content のときだけ成功とみなす
    fn replace<B: Serialize>(&self, segments: &[&str], payload: &B) -> Result<bool, ApiError> {
        let json = serde_json::to_string(payload)?;
        let code = self.api.put(self.api.endpoint(segments)?, json)?;
        Ok(code == NO_CONTENT)
    }

    fn remove(&self, segments: &[&str]) -> Result<bool, ApiError> {
        let code = self.api.delete(self.api.endpoint(segments)?)?;
        Ok(code == NO_CONTENT)
    }
}

// 車両
impl CarRentalService {
    pub fn get_all_cars(&self) -> Result<Vec<Car>, ApiError> {
        self.fetch(&["api", "cars"])
    }

    pub fn get_car_by_id(&self, id: &str) -> Result<Car, ApiError> {
        self.fetch(&["api", "cars", id])
    }

    pub fn search_cars(&self, criteria: &CarSearch) -> Result<Vec<Car>, ApiError> {
        self.submit(&["api", "cars", "search"], criteria)
    }

    pub fn create_car(&self, car: &Car) -> Result<Car, ApiError> {
        let created: Car = self.submit(&["api", "cars"], car)?;
        info!(id = ?created.id, "car created");
        Ok(created)
    }

    pub fn update_car(&self, id: &str, car: &Car) -> Result<bool, ApiError> {
        let updated = self.replace(&["api", "cars", id], car)?;
        info!(id, updated, "car update");
        Ok(updated)
    }

    pub fn delete_car(&self, id: &str) -> Result<bool, ApiError> {
        let deleted = self.remove(&["api", "cars", id])?;
        info!(id, deleted, "car delete");
        Ok(deleted)
    }

    /// 応答本文が "true" (大文字小文字無視) のときだけ空きありとする
    pub fn is_car_available(
        &self,
        car_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<bool, ApiError> {
        let mut url = self.api.endpoint(&["api", "cars", car_id, "availability"])?;
        url.query_pairs_mut()
            .append_pair("from", &from.format("%Y-%m-%d").to_string())
            .append_pair("to", &to.format("%Y-%m-%d").to_string());
        let body = self.api.get(url)?;
        Ok(body.trim().eq_ignore_ascii_case("true"))
    }
}

// 顧客
impl CarRentalService {
    pub fn get_all_customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.fetch(&["api", "customers"])
    }

    pub fn get_customer_by_id(&self, id: &str) -> Result<Customer, ApiError> {
        self.fetch(&["api", "customers", id])
    }

    pub fn get_customer_by_email(&self, email: &str) -> Result<Customer, ApiError> {
        self.fetch(&["api", "customers", "email", email])
    }

    pub fn create_customer(&self, customer: &Customer) -> Result<Customer, ApiError> {
        let created: Customer = self.submit(&["api", "customers"], customer)?;
        info!(id = ?created.id, "customer created");
        Ok(created)
    }

    pub fn update_customer(&self, id: &str, customer: &Customer) -> Result<bool, ApiError> {
        let updated = self.replace(&["api", "customers", id], customer)?;
        info!(id, updated, "customer update");
        Ok(updated)
    }

    pub fn delete_customer(&self, id: &str) -> Result<bool, ApiError> {
        let deleted = self.remove(&["api", "customers", id])?;
        info!(id, deleted, "customer delete");
        Ok(deleted)
    }
}

// 予約
impl CarRentalService {
    pub fn get_all_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.fetch(&["api", "bookings"])
    }

    pub fn get_booking_by_id(&self, id: &str) -> Result<Booking, ApiError> {
        self.fetch(&["api", "bookings", id])
    }

    pub fn get_bookings_by_customer(&self, customer_id: &str) -> Result<Vec<Booking>, ApiError> {
        self.fetch(&["api", "bookings", "customer", customer_id])
    }

    pub fn get_bookings_by_car(&self, car_id: &str) -> Result<Vec<Booking>, ApiError> {
        self.fetch(&["api", "bookings", "car", car_id])
    }

    pub fn create_booking(&self, booking: &Booking) -> Result<Booking, ApiError> {
        let created: Booking = self.submit(&["api", "bookings"], booking)?;
        info!(id = ?created.id, "booking created");
        Ok(created)
    }

    pub fn update_booking(&self, id: &str, booking: &Booking) -> Result<bool, ApiError> {
        let updated = self.replace(&["api", "bookings", id], booking)?;
        info!(id, updated, "booking update");
        Ok(updated)
    }

    /// 本文は空文字列で送る
    pub fn cancel_booking(&self, id: &str) -> Result<bool, ApiError> {
        let url = self.api.endpoint(&["api", "bookings", id, "cancel"])?;
        let cancelled = self.api.put(url, String::new())? == NO_CONTENT;
        info!(id, cancelled, "booking cancel");
        Ok(cancelled)
    }

    pub fn delete_booking(&self, id: &str) -> Result<bool, ApiError> {
        let deleted = self.remove(&["api", "bookings", id])?;
        info!(id, deleted, "booking delete");
        Ok(deleted)
    }
}
