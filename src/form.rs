use crate::model::{Booking, BookingStatus, Car, CarSearch, Customer};
use crate::prelude::*;
use crossterm::event::{KeyCode, KeyEvent};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tui::style::{Modifier, Style};
use tui_textarea::{Input, TextArea};

/// 入力値の変換エラー。どの項目かを示す
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field}: '{value}' is not a valid {expected}")]
    Invalid {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Please select both customer and car.")]
    MissingSelection,

    #[error("Return date must not be before pickup date")]
    DateOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormKind {
    NewCar,
    EditCar(Box<Car>),
    SearchCars,
    NewCustomer,
    EditCustomer(Box<Customer>),
    FindCustomer,
    NewBooking,
    EditBooking(Box<Booking>),
}
impl FormKind {
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::NewCar => "Add Car",
            FormKind::EditCar(_) => "Update Car",
            FormKind::SearchCars => "Search Cars",
            FormKind::NewCustomer => "Add Customer",
            FormKind::EditCustomer(_) => "Update Customer",
            FormKind::FindCustomer => "Find Customer by Email",
            FormKind::NewBooking => "Create Booking",
            FormKind::EditBooking(_) => "Update Booking",
        }
    }
}

/// 選択式の入力 (id, 表示名)
pub struct Choice {
    pub options: Vec<(String, String)>,
    pub selected: Option<usize>,
}
impl Choice {
    pub fn new(options: Vec<(String, String)>) -> Self {
        let selected = if options.is_empty() { None } else { Some(0) };
        Self { options, selected }
    }
    pub fn next(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1) % self.options.len(),
            None => 0,
        });
    }
    pub fn previous(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => self.options.len() - 1,
            Some(i) => i - 1,
        });
    }
    pub fn select_id(&mut self, id: &str) {
        self.selected = self.options.iter().position(|(k, _)| k == id);
    }
    pub fn selected_id(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(|(id, _)| id.as_str())
    }
    pub fn label(&self) -> &str {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(|(_, label)| label.as_str())
            .unwrap_or("")
    }
}

pub enum FieldInput {
    Text {
        area: TextArea<'static>,
        multiline: bool,
    },
    Choice(Choice),
}

pub struct Field {
    pub label: &'static str,
    pub input: FieldInput,
}
impl Field {
    fn text(label: &'static str, value: &str) -> Self {
        Self {
            label,
            input: FieldInput::Text {
                area: text_area(value),
                multiline: false,
            },
        }
    }
    fn multiline(label: &'static str, value: &str) -> Self {
        Self {
            label,
            input: FieldInput::Text {
                area: text_area(value),
                multiline: true,
            },
        }
    }
    fn choice(label: &'static str, choice: Choice) -> Self {
        Self {
            label,
            input: FieldInput::Choice(choice),
        }
    }
    /// 一行入力は前後の空白を除く
    pub fn value(&self) -> String {
        match &self.input {
            FieldInput::Text {
                area,
                multiline: false,
            } => area.lines().join("").trim().to_string(),
            FieldInput::Text {
                area,
                multiline: true,
            } => area.lines().join("\n"),
            FieldInput::Choice(choice) => choice.label().to_string(),
        }
    }
    /// 表示行数
    pub fn height(&self) -> u16 {
        match &self.input {
            FieldInput::Text {
                multiline: true, ..
            } => 4,
            _ => 1,
        }
    }
}

fn text_area(value: &str) -> TextArea<'static> {
    if value.is_empty() {
        TextArea::default()
    } else {
        TextArea::from(value.lines())
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// 入力欄のアクティブ・非アクティブ
fn activate(area: &mut TextArea<'_>) {
    area.set_cursor_line_style(Style::default());
    area.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
}
fn inactivate(area: &mut TextArea<'_>) {
    area.set_cursor_line_style(Style::default());
    area.set_cursor_style(Style::default());
}

pub const CAR_FIELDS: [&str; 11] = [
    "Make:",
    "Model:",
    "Year:",
    "Color:",
    "License:",
    "Daily Rate:",
    "Fuel Type:",
    "Transmission:",
    "Seats:",
    "Image URL:",
    "Description:",
];

pub const CUSTOMER_FIELDS: [&str; 11] = [
    "First Name:",
    "Last Name:",
    "Email:",
    "Phone:",
    "Street:",
    "City:",
    "State:",
    "ZIP:",
    "Country:",
    "DOB (YYYY-MM-DD):",
    "Driver's License:",
];

const SEARCH_FIELDS: [&str; 8] = [
    "Make:",
    "Model:",
    "Min Year:",
    "Max Year:",
    "Max Daily Rate:",
    "Fuel Type:",
    "Transmission:",
    "Min Seats:",
];

/// 入力フォーム。項目の並びはフォーム種別ごとに固定
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<Field>,
    focus: usize,
}

// 生成
impl Form {
    fn new(kind: FormKind, fields: Vec<Field>) -> Self {
        let mut form = Self {
            kind,
            fields,
            focus: 0,
        };
        form.refresh_styles();
        form
    }

    fn car_form(kind: FormKind, values: [String; 11]) -> Self {
        let fields = CAR_FIELDS
            .into_iter()
            .zip(values)
            .map(|(label, value)| Field::text(label, &value))
            .collect();
        Self::new(kind, fields)
    }

    pub fn new_car() -> Self {
        Self::car_form(FormKind::NewCar, Default::default())
    }

    pub fn edit_car(car: &Car) -> Self {
        let values = [
            car.make.clone(),
            car.model.clone(),
            car.year.to_string(),
            car.color.clone(),
            car.license_plate.clone(),
            car.daily_rate.to_string(),
            car.fuel_type.clone(),
            car.transmission.clone(),
            car.seats.to_string(),
            car.image_url.clone().unwrap_or_default(),
            car.description.clone().unwrap_or_default(),
        ];
        Self::car_form(FormKind::EditCar(Box::new(car.clone())), values)
    }

    pub fn search_cars() -> Self {
        let mut fields: Vec<Field> = SEARCH_FIELDS.into_iter().map(|l| Field::text(l, "")).collect();
        fields.push(Field::choice(
            "Available:",
            Choice::new(vec![
                (String::new(), "Any".into()),
                ("true".into(), "Yes".into()),
                ("false".into(), "No".into()),
            ]),
        ));
        fields.push(Field::text("Available From:", ""));
        fields.push(Field::text("Available To:", ""));
        Self::new(FormKind::SearchCars, fields)
    }

    fn customer_form(kind: FormKind, values: [String; 11]) -> Self {
        let fields = CUSTOMER_FIELDS
            .into_iter()
            .zip(values)
            .map(|(label, value)| Field::text(label, &value))
            .collect();
        Self::new(kind, fields)
    }

    pub fn new_customer() -> Self {
        Self::customer_form(FormKind::NewCustomer, Default::default())
    }

    pub fn edit_customer(customer: &Customer) -> Self {
        let a = &customer.address;
        let values = [
            customer.first_name.clone(),
            customer.last_name.clone(),
            customer.email.clone(),
            customer.phone.clone(),
            a.street.clone(),
            a.city.clone(),
            a.state.clone(),
            a.zip_code.clone(),
            a.country.clone(),
            format_date(customer.date_of_birth),
            customer.drivers_license.clone(),
        ];
        Self::customer_form(FormKind::EditCustomer(Box::new(customer.clone())), values)
    }

    pub fn find_customer() -> Self {
        Self::new(FormKind::FindCustomer, vec![Field::text("Email:", "")])
    }

    /// 顧客・車両の選択肢は読み込み済みの一覧から作る
    pub fn new_booking(customers: &[Customer], cars: &[Car]) -> Self {
        let customer_options = customers
            .iter()
            .filter_map(|c| c.id.clone().map(|id| (id, c.to_string())))
            .collect();
        let car_options = cars
            .iter()
            .filter_map(|c| c.id.clone().map(|id| (id, c.to_string())))
            .collect();
        let fields = vec![
            Field::choice("Customer:", Choice::new(customer_options)),
            Field::choice("Car:", Choice::new(car_options)),
            Field::text("Pickup Date (YYYY-MM-DD):", ""),
            Field::text("Return Date (YYYY-MM-DD):", ""),
            Field::text("Pickup Location:", ""),
            Field::text("Return Location:", ""),
            Field::multiline("Notes:", ""),
        ];
        Self::new(FormKind::NewBooking, fields)
    }

    pub fn edit_booking(booking: &Booking) -> Self {
        let mut status = Choice::new(
            BookingStatus::ALL
                .iter()
                .map(|s| (s.index().to_string(), s.to_string()))
                .collect(),
        );
        status.select_id(&booking.status.index().to_string());
        let fields = vec![
            Field::text("Pickup Date (YYYY-MM-DD):", &format_date(booking.pickup_date)),
            Field::text("Return Date (YYYY-MM-DD):", &format_date(booking.return_date)),
            Field::choice("Status:", status),
            Field::text("Pickup Location:", &booking.pickup_location),
            Field::text("Return Location:", &booking.return_location),
            Field::multiline("Notes:", booking.notes.as_deref().unwrap_or("")),
        ];
        Self::new(FormKind::EditBooking(Box::new(booking.clone())), fields)
    }
}

// 入力操作
impl Form {
    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
            self.refresh_styles();
        }
    }

    pub fn focus_previous(&mut self) {
        if !self.fields.is_empty() {
            self.focus = if self.focus == 0 {
                self.fields.len() - 1
            } else {
                self.focus - 1
            };
            self.refresh_styles();
        }
    }

    fn refresh_styles(&mut self) {
        let focus = self.focus;
        for (i, field) in self.fields.iter_mut().enumerate() {
            if let FieldInput::Text { area, .. } = &mut field.input {
                if i == focus {
                    activate(area);
                } else {
                    inactivate(area);
                }
            }
        }
    }

    fn focused_multiline(&self) -> bool {
        matches!(
            self.fields.get(self.focus).map(|f| &f.input),
            Some(FieldInput::Text {
                multiline: true,
                ..
            })
        )
    }

    /// 保存・中断以外のキー入力を処理する
    pub fn handle_key(&mut self, key: KeyEvent) {
        let multiline = self.focused_multiline();
        match key.code {
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_previous(),
            KeyCode::Enter | KeyCode::Down if !multiline => self.focus_next(),
            KeyCode::Up if !multiline => self.focus_previous(),
            _ => {
                let Some(field) = self.fields.get_mut(self.focus) else {
                    return;
                };
                match &mut field.input {
                    FieldInput::Choice(choice) => match key.code {
                        KeyCode::Left => choice.previous(),
                        KeyCode::Right | KeyCode::Char(' ') => choice.next(),
                        _ => {}
                    },
                    FieldInput::Text { area, .. } => {
                        area.input(Input::from(key));
                    }
                }
            }
        }
    }

    pub fn value(&self, index: usize) -> String {
        self.fields.get(index).map(Field::value).unwrap_or_default()
    }

    pub fn set_value(&mut self, index: usize, value: &str) {
        if let Some(Field {
            input: FieldInput::Text { area, .. },
            ..
        }) = self.fields.get_mut(index)
        {
            *area = text_area(value);
        }
        self.refresh_styles();
    }

    fn values<const N: usize>(&self) -> [String; N] {
        std::array::from_fn(|i| self.value(i))
    }

    fn choice_id(&self, index: usize) -> Option<String> {
        match self.fields.get(index).map(|f| &f.input) {
            Some(FieldInput::Choice(choice)) => choice.selected_id().map(String::from),
            _ => None,
        }
    }
}

// 値の変換
fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<i32, FormError> {
    if value.is_empty() {
        return Err(FormError::Required(field));
    }
    value.parse().map_err(|_| FormError::Invalid {
        field,
        value: value.to_string(),
        expected: "integer",
    })
}

fn parse_amount(field: &'static str, value: &str) -> Result<f64, FormError> {
    if value.is_empty() {
        return Err(FormError::Required(field));
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FormError::Invalid {
            field,
            value: value.to_string(),
            expected: "number",
        }),
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, FormError> {
    if value.is_empty() {
        return Err(FormError::Required(field));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| FormError::Invalid {
        field,
        value: value.to_string(),
        expected: "date (YYYY-MM-DD)",
    })
}

// 空欄は未指定
fn optional<T>(
    field: &'static str,
    value: &str,
    parse: fn(&'static str, &str) -> Result<T, FormError>,
) -> Result<Option<T>, FormError> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse(field, value).map(Some)
    }
}

fn check_email(value: &str) -> Result<(), FormError> {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    });
    if value.is_empty() || re.is_match(value) {
        Ok(())
    } else {
        Err(FormError::Invalid {
            field: "Email",
            value: value.to_string(),
            expected: "email address",
        })
    }
}

fn check_order(pickup: NaiveDate, ret: NaiveDate) -> Result<(), FormError> {
    if ret < pickup {
        Err(FormError::DateOrder)
    } else {
        Ok(())
    }
}

impl Form {
    /// 編集時は元の車両を土台にして、フォームにない項目を保持する
    pub fn to_car(&self) -> Result<Car, FormError> {
        let [make, model, year, color, license, rate, fuel, transmission, seats, image, description] =
            self.values::<11>();
        let mut car = match &self.kind {
            FormKind::EditCar(base) => (**base).clone(),
            _ => Car::default(),
        };
        car.year = parse_int("Year", &year)?;
        car.daily_rate = parse_amount("Daily Rate", &rate)?;
        car.seats = parse_int("Seats", &seats)?;
        car.make = make;
        car.model = model;
        car.color = color;
        car.license_plate = license;
        car.fuel_type = fuel;
        car.transmission = transmission;
        car.image_url = non_empty(image);
        car.description = non_empty(description);
        Ok(car)
    }

    pub fn to_customer(&self) -> Result<Customer, FormError> {
        let [first, last, email, phone, street, city, state, zip, country, dob, license] =
            self.values::<11>();
        check_email(&email)?;
        let mut customer = match &self.kind {
            FormKind::EditCustomer(base) => (**base).clone(),
            _ => Customer::default(),
        };
        customer.date_of_birth = Some(parse_date("DOB", &dob)?);
        customer.first_name = first;
        customer.last_name = last;
        customer.email = email;
        customer.phone = phone;
        customer.address.street = street;
        customer.address.city = city;
        customer.address.state = state;
        customer.address.zip_code = zip;
        customer.address.country = country;
        customer.drivers_license = license;
        Ok(customer)
    }

    pub fn to_car_search(&self) -> Result<CarSearch, FormError> {
        let [make, model, min_year, max_year, max_rate, fuel, transmission, min_seats, _, from, to] =
            self.values::<11>();
        let available_from = optional("Available From", &from, parse_date)?;
        let available_to = optional("Available To", &to, parse_date)?;
        if let (Some(f), Some(t)) = (available_from, available_to) {
            check_order(f, t)?;
        }
        Ok(CarSearch {
            make: non_empty(make),
            model: non_empty(model),
            min_year: optional("Min Year", &min_year, parse_int)?,
            max_year: optional("Max Year", &max_year, parse_int)?,
            max_daily_rate: optional("Max Daily Rate", &max_rate, parse_amount)?,
            fuel_type: non_empty(fuel),
            transmission: non_empty(transmission),
            min_seats: optional("Min Seats", &min_seats, parse_int)?,
            is_available: self.choice_id(8).and_then(|id| id.parse().ok()),
            available_from,
            available_to,
        })
    }

    pub fn email(&self) -> Result<String, FormError> {
        let email = self.value(0);
        if email.is_empty() {
            return Err(FormError::Required("Email"));
        }
        check_email(&email)?;
        Ok(email)
    }

    pub fn to_booking(&self) -> Result<Booking, FormError> {
        let (Some(customer_id), Some(car_id)) = (self.choice_id(0), self.choice_id(1)) else {
            return Err(FormError::MissingSelection);
        };
        let [_, _, pickup, ret, pickup_location, return_location, notes] = self.values::<7>();
        let pickup_date = parse_date("Pickup Date", &pickup)?;
        let return_date = parse_date("Return Date", &ret)?;
        check_order(pickup_date, return_date)?;
        Ok(Booking {
            customer_id,
            car_id,
            pickup_date: Some(pickup_date),
            return_date: Some(return_date),
            pickup_location,
            return_location,
            notes: non_empty(notes),
            ..Booking::default()
        })
    }

    /// 空き確認用の (車両id, 受取日, 返却日)
    pub fn availability_query(&self) -> Result<(String, NaiveDate, NaiveDate), FormError> {
        let car_id = self.choice_id(1).ok_or(FormError::Required("Car"))?;
        let pickup_date = parse_date("Pickup Date", &self.value(2))?;
        let return_date = parse_date("Return Date", &self.value(3))?;
        check_order(pickup_date, return_date)?;
        Ok((car_id, pickup_date, return_date))
    }

    pub fn to_booking_update(&self) -> Result<Booking, FormError> {
        let [pickup, ret, _, pickup_location, return_location, notes] = self.values::<6>();
        let mut booking = match &self.kind {
            FormKind::EditBooking(base) => (**base).clone(),
            _ => Booking::default(),
        };
        let pickup_date = parse_date("Pickup Date", &pickup)?;
        let return_date = parse_date("Return Date", &ret)?;
        check_order(pickup_date, return_date)?;
        booking.pickup_date = Some(pickup_date);
        booking.return_date = Some(return_date);
        if let Some(status) = self
            .choice_id(2)
            .and_then(|id| id.parse().ok())
            .and_then(BookingStatus::from_index)
        {
            booking.status = status;
        }
        booking.pickup_location = pickup_location;
        booking.return_location = return_location;
        booking.notes = non_empty(notes);
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn fill(form: &mut Form, values: &[&str]) {
        for (i, v) in values.iter().enumerate() {
            form.set_value(i, v);
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn car_form_maps_every_field() {
        let mut form = Form::new_car();
        fill(
            &mut form,
            &[
                "Toyota", "Corolla", "2021", "Blue", "XYZ-1", "49.90", "Hybrid", "Automatic", "5",
                "", " compact ",
            ],
        );
        let car = form.to_car().unwrap();
        assert_eq!(car.make, "Toyota");
        assert_eq!(car.year, 2021);
        assert_eq!(car.daily_rate, 49.90);
        assert_eq!(car.seats, 5);
        assert_eq!(car.image_url, None);
        assert_eq!(car.description.as_deref(), Some("compact"));
        assert!(car.is_available);
        assert_eq!(car.id, None);
    }

    #[test]
    fn car_form_reports_bad_numbers() {
        let mut form = Form::new_car();
        fill(&mut form, &["A", "B", "twenty", "", "", "10", "", "", "4"]);
        assert_eq!(
            form.to_car().unwrap_err(),
            FormError::Invalid {
                field: "Year",
                value: "twenty".into(),
                expected: "integer"
            }
        );
        form.set_value(2, "2020");
        form.set_value(5, "");
        assert_eq!(form.to_car().unwrap_err(), FormError::Required("Daily Rate"));
    }

    #[test]
    fn edit_car_keeps_id_and_availability() {
        let original = Car {
            id: Some("c1".into()),
            make: "Fiat".into(),
            year: 2019,
            daily_rate: 20.0,
            seats: 4,
            is_available: false,
            ..Car::default()
        };
        let mut form = Form::edit_car(&original);
        assert_eq!(form.value(0), "Fiat");
        assert_eq!(form.value(2), "2019");
        form.set_value(1, "Panda");
        let car = form.to_car().unwrap();
        assert_eq!(car.id.as_deref(), Some("c1"));
        assert_eq!(car.model, "Panda");
        assert!(!car.is_available);
    }

    #[test]
    fn customer_form_requires_valid_dob_and_email() {
        let mut form = Form::new_customer();
        fill(
            &mut form,
            &[
                "Ada", "Lovelace", "ada@example.com", "555", "1 Road", "London", "LDN", "N1",
                "UK", "1990-12-10", "DL-1",
            ],
        );
        let customer = form.to_customer().unwrap();
        assert_eq!(customer.address.zip_code, "N1");
        assert_eq!(customer.date_of_birth, Some(date(1990, 12, 10)));

        form.set_value(9, "10/12/1990");
        assert!(matches!(
            form.to_customer(),
            Err(FormError::Invalid { field: "DOB", .. })
        ));
        form.set_value(9, "1990-12-10");
        form.set_value(2, "not-an-email");
        assert!(matches!(
            form.to_customer(),
            Err(FormError::Invalid { field: "Email", .. })
        ));
    }

    #[test]
    fn booking_needs_customer_and_car() {
        let form = Form::new_booking(&[], &[]);
        assert_eq!(form.to_booking().unwrap_err(), FormError::MissingSelection);
    }

    #[test]
    fn booking_form_uses_selected_ids() {
        let customers = vec![
            Customer {
                id: Some("u1".into()),
                first_name: "Ada".into(),
                ..Customer::default()
            },
            Customer {
                id: Some("u2".into()),
                first_name: "Alan".into(),
                ..Customer::default()
            },
        ];
        let cars = vec![Car {
            id: Some("k1".into()),
            ..Car::default()
        }];
        let mut form = Form::new_booking(&customers, &cars);
        form.handle_key(press(KeyCode::Right));
        form.set_value(2, "2024-05-01");
        form.set_value(3, "2024-05-04");
        form.set_value(4, "Airport");
        let booking = form.to_booking().unwrap();
        assert_eq!(booking.customer_id, "u2");
        assert_eq!(booking.car_id, "k1");
        assert_eq!(booking.pickup_location, "Airport");
        assert_eq!(booking.notes, None);

        assert_eq!(
            form.availability_query().unwrap(),
            ("k1".to_string(), date(2024, 5, 1), date(2024, 5, 4))
        );

        form.set_value(3, "2024-04-30");
        assert_eq!(form.to_booking().unwrap_err(), FormError::DateOrder);
    }

    #[test]
    fn edit_booking_changes_status() {
        let original = Booking {
            id: Some("b1".into()),
            customer_id: "u1".into(),
            car_id: "k1".into(),
            pickup_date: Some(date(2024, 5, 1)),
            return_date: Some(date(2024, 5, 2)),
            notes: Some("first line\nsecond".into()),
            ..Booking::default()
        };
        let mut form = Form::edit_booking(&original);
        assert_eq!(form.value(2), "Pending");
        assert_eq!(form.value(5), "first line\nsecond");
        form.focus_next();
        form.focus_next();
        form.handle_key(press(KeyCode::Right));
        form.handle_key(press(KeyCode::Right));
        let booking = form.to_booking_update().unwrap();
        assert_eq!(booking.status, BookingStatus::Active);
        assert_eq!(booking.customer_id, "u1");
        assert_eq!(booking.id.as_deref(), Some("b1"));
    }

    #[test]
    fn search_form_omits_blank_fields() {
        let mut form = Form::search_cars();
        form.set_value(5, "Diesel");
        form.set_value(7, "7");
        let search = form.to_car_search().unwrap();
        assert_eq!(search.fuel_type.as_deref(), Some("Diesel"));
        assert_eq!(search.min_seats, Some(7));
        assert_eq!(search.make, None);
        assert_eq!(search.is_available, None);

        for _ in 0..8 {
            form.focus_next();
        }
        form.handle_key(press(KeyCode::Right));
        assert_eq!(form.to_car_search().unwrap().is_available, Some(true));
    }

    #[test]
    fn typing_goes_to_the_focused_field() {
        let mut form = Form::find_customer();
        for c in "bob@x.io".chars() {
            form.handle_key(press(KeyCode::Char(c)));
        }
        assert_eq!(form.email().unwrap(), "bob@x.io");
        form.set_value(0, "");
        assert_eq!(form.email().unwrap_err(), FormError::Required("Email"));
    }

    #[test]
    fn focus_wraps_and_enter_moves_on_single_line() {
        let mut form = Form::new_car();
        form.focus_previous();
        assert_eq!(form.focus(), CAR_FIELDS.len() - 1);
        form.handle_key(press(KeyCode::Enter));
        assert_eq!(form.focus(), 0);

        let mut booking = Form::new_booking(&[], &[]);
        for _ in 0..6 {
            booking.focus_next();
        }
        booking.handle_key(press(KeyCode::Char('a')));
        booking.handle_key(press(KeyCode::Enter));
        booking.handle_key(press(KeyCode::Char('b')));
        assert_eq!(booking.focus(), 6);
        assert_eq!(booking.value(6), "a\nb");
    }
}
