use crate::prelude::*;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tui::widgets::TableState;

/// バックエンドの日付はISO形式(日時付きの場合あり)。日付部分だけを保持する
mod iso_date {
    use super::*;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => {
                let date_part = s.get(..10).unwrap_or(s);
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map(Some)
                    .map_err(de::Error::custom)
            }
        }
    }
}

fn format_date(date: &Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Car {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub license_plate: String,
    pub daily_rate: f64,
    pub is_available: bool,
    pub fuel_type: String,
    pub transmission: String,
    pub seats: i32,
    pub image_url: Option<String>,
    pub description: Option<String>,
}
impl Default for Car {
    fn default() -> Self {
        Self {
            id: None,
            make: String::new(),
            model: String::new(),
            year: 0,
            color: String::new(),
            license_plate: String::new(),
            daily_rate: 0.0,
            is_available: true,
            fuel_type: String::new(),
            transmission: String::new(),
            seats: 0,
            image_url: None,
            description: None,
        }
    }
}
impl Display for Car {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} - ${}/day",
            self.year, self.make, self.model, self.daily_rate
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    #[serde(with = "iso_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub drivers_license: String,
    #[serde(with = "iso_date", skip_serializing)]
    pub created_at: Option<NaiveDate>,
}
impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
impl Display for Customer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.email)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}
impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Active,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.to_string().eq_ignore_ascii_case(name.trim()))
    }
}
impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "Pending"),
            BookingStatus::Confirmed => write!(f, "Confirmed"),
            BookingStatus::Active => write!(f, "Active"),
            BookingStatus::Completed => write!(f, "Completed"),
            BookingStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}
// バックエンドは列挙型を数値で受け付ける
impl Serialize for BookingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index())
    }
}
impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Index(u64),
            Name(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Index(i) => BookingStatus::from_index(i)
                .ok_or_else(|| de::Error::custom(format!("unknown booking status {}", i))),
            Repr::Name(name) => BookingStatus::from_name(&name)
                .ok_or_else(|| de::Error::custom(format!("unknown booking status {}", name))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Booking {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub customer_id: String,
    pub car_id: String,
    #[serde(with = "iso_date")]
    pub pickup_date: Option<NaiveDate>,
    #[serde(with = "iso_date")]
    pub return_date: Option<NaiveDate>,
    pub total_days: i32,
    pub daily_rate: f64,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub pickup_location: String,
    pub return_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "iso_date", skip_serializing)]
    pub created_at: Option<NaiveDate>,
    #[serde(with = "iso_date", skip_serializing)]
    pub updated_at: Option<NaiveDate>,
    // 表示用
    #[serde(skip_serializing)]
    pub customer_name: Option<String>,
    #[serde(skip_serializing)]
    pub car_info: Option<String>,
}
impl Booking {
    // 参照先が見つからないとき、バックエンドは空文字列を返す
    pub fn customer_label(&self) -> &str {
        non_blank(&self.customer_name).unwrap_or(&self.customer_id)
    }
    pub fn car_label(&self) -> &str {
        non_blank(&self.car_info).unwrap_or(&self.car_id)
    }
}
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
impl Display for Booking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Booking: {} - {} to {} ({})",
            self.car_label(),
            format_date(&self.pickup_date),
            format_date(&self.return_date),
            self.status
        )
    }
}

/// 車両検索条件。未指定の項目は送信しない
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_daily_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_seats: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub available_from: Option<NaiveDate>,
    #[serde(with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub available_to: Option<NaiveDate>,
}

/// テーブル表示・CSV出力できる行
pub trait TableRow {
    const HEADER: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl TableRow for Car {
    const HEADER: &'static [&'static str] = &[
        "ID",
        "Make",
        "Model",
        "Year",
        "Color",
        "License",
        "Daily Rate",
        "Available",
        "Fuel",
        "Transmission",
        "Seats",
    ];
    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone().unwrap_or_default(),
            self.make.clone(),
            self.model.clone(),
            self.year.to_string(),
            self.color.clone(),
            self.license_plate.clone(),
            format!("{:.2}", self.daily_rate),
            if self.is_available { "Yes" } else { "No" }.to_string(),
            self.fuel_type.clone(),
            self.transmission.clone(),
            self.seats.to_string(),
        ]
    }
}

impl TableRow for Customer {
    const HEADER: &'static [&'static str] = &[
        "ID",
        "First Name",
        "Last Name",
        "Email",
        "Phone",
        "City",
        "State",
        "DOB",
        "License",
    ];
    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone().unwrap_or_default(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.address.city.clone(),
            self.address.state.clone(),
            format_date(&self.date_of_birth),
            self.drivers_license.clone(),
        ]
    }
}

impl TableRow for Booking {
    const HEADER: &'static [&'static str] = &[
        "ID",
        "Customer",
        "Car",
        "Pickup Date",
        "Return Date",
        "Total Days",
        "Total Amount",
        "Status",
        "Pickup Location",
        "Return Location",
    ];
    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone().unwrap_or_default(),
            self.customer_label().to_string(),
            self.car_label().to_string(),
            format_date(&self.pickup_date),
            format_date(&self.return_date),
            self.total_days.to_string(),
            format!("{:.2}", self.total_amount),
            self.status.to_string(),
            self.pickup_location.clone(),
            self.return_location.clone(),
        ]
    }
}

/// 選択行を持つテーブル。選択は1行のみ
#[derive(Debug)]
pub struct StatefulTable<T> {
    pub state: TableState,
    pub items: Vec<T>,
}
impl<T> Default for StatefulTable<T> {
    fn default() -> Self {
        Self {
            state: TableState::default(),
            items: Vec::new(),
        }
    }
}
impl<T> StatefulTable<T> {
    /// 行を入れ替える。選択位置は範囲内に収める
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        let selected = match (self.state.selected(), self.items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.state.select(selected);
    }
    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i + 1 >= self.items.len() {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
    pub fn selected(&self) -> Option<&T> {
        self.state.selected().and_then(|i| self.items.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table<T>(items: Vec<T>) -> StatefulTable<T> {
        let mut table = StatefulTable::default();
        table.set_items(items);
        table
    }

    #[test]
    fn car_maps_backend_json() {
        let json = r#"{
            "id": "64f1",
            "make": "Toyota",
            "model": "Corolla",
            "year": 2022,
            "color": "White",
            "licensePlate": "ABC-123",
            "dailyRate": 45.5,
            "isAvailable": false,
            "fuelType": "Petrol",
            "transmission": "Automatic",
            "seats": 5,
            "imageUrl": null,
            "description": "Compact",
            "createdAt": "2024-01-02T10:00:00Z"
        }"#;
        let car: Car = serde_json::from_str(json).unwrap();
        assert_eq!(car.id.as_deref(), Some("64f1"));
        assert_eq!(car.license_plate, "ABC-123");
        assert!(!car.is_available);
        assert_eq!(car.image_url, None);
        assert_eq!(car.to_string(), "2022 Toyota Corolla - $45.5/day");
    }

    #[test]
    fn new_car_serializes_without_id() {
        let car = Car {
            make: "Ford".into(),
            ..Car::default()
        };
        let value = serde_json::to_value(&car).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["make"], "Ford");
        assert_eq!(value["isAvailable"], true);
        assert_eq!(value["licensePlate"], "");
    }

    #[test]
    fn customer_dates_keep_only_the_day() {
        let json = r#"{
            "id": "c1",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "address": { "city": "London", "zipCode": "N1" },
            "dateOfBirth": "1990-12-10T00:00:00",
            "createdAt": null
        }"#;
        let customer: Customer = serde_json::from_str(json).unwrap();
        assert_eq!(
            customer.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 12, 10)
        );
        assert_eq!(customer.address.zip_code, "N1");
        assert_eq!(customer.created_at, None);
        assert_eq!(customer.to_string(), "Ada Lovelace (ada@example.com)");

        let value = serde_json::to_value(&customer).unwrap();
        assert_eq!(value["dateOfBirth"], "1990-12-10");
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn booking_status_accepts_index_and_name() {
        let by_index: Booking = serde_json::from_str(r#"{"status": 4}"#).unwrap();
        assert_eq!(by_index.status, BookingStatus::Cancelled);
        let by_name: Booking = serde_json::from_str(r#"{"status": "confirmed"}"#).unwrap();
        assert_eq!(by_name.status, BookingStatus::Confirmed);
        assert!(serde_json::from_str::<Booking>(r#"{"status": 9}"#).is_err());

        let value = serde_json::to_value(BookingStatus::Active).unwrap();
        assert_eq!(value, 2);
    }

    #[test]
    fn booking_row_falls_back_to_ids() {
        let booking = Booking {
            id: Some("b1".into()),
            customer_id: "c1".into(),
            car_id: "car9".into(),
            pickup_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            total_amount: 120.0,
            ..Booking::default()
        };
        let cells = booking.cells();
        assert_eq!(cells.len(), Booking::HEADER.len());
        assert_eq!(cells[1], "c1");
        assert_eq!(cells[2], "car9");
        assert_eq!(cells[3], "2024-05-01");
        assert_eq!(cells[4], "");
        assert_eq!(cells[6], "120.00");
        assert_eq!(cells[7], "Pending");
    }

    #[test]
    fn blank_lookup_names_fall_back_to_ids() {
        let json = r#"{"id":"b2","customerId":"c4","carId":"k7",
            "customerName":"","carInfo":"  ","status":"Active"}"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.customer_name.as_deref(), Some(""));
        let cells = booking.cells();
        assert_eq!(cells[1], "c4");
        assert_eq!(cells[2], "k7");
        assert!(booking.to_string().starts_with("Booking: k7 - "));

        let named = Booking {
            customer_name: Some("Ada Lovelace".into()),
            ..booking
        };
        assert_eq!(named.cells()[1], "Ada Lovelace");
    }

    #[test]
    fn car_search_omits_empty_criteria() {
        let search = CarSearch {
            make: Some("BMW".into()),
            available_from: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..CarSearch::default()
        };
        let value = serde_json::to_value(&search).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["availableFrom"], "2024-06-01");
    }

    #[test]
    fn table_navigation_wraps() {
        let mut table = table(vec!["a", "b", "c"]);
        assert_eq!(table.selected(), Some(&"a"));
        table.previous();
        assert_eq!(table.selected(), Some(&"c"));
        table.next();
        assert_eq!(table.selected(), Some(&"a"));
    }

    #[test]
    fn table_selection_is_clamped_on_reload() {
        let mut table = table(vec![1, 2, 3]);
        table.next();
        table.next();
        table.set_items(vec![1]);
        assert_eq!(table.state.selected(), Some(0));
        table.set_items(Vec::new());
        assert_eq!(table.selected(), None);
        table.next();
        assert_eq!(table.state.selected(), None);
    }
}
