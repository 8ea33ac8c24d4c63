use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api_client::ApiError;
use crate::config::Config;
use crate::export::export_table;
use crate::form::{Form, FormError, FormKind};
use crate::model::{Booking, Car, Customer, StatefulTable};
use crate::prelude::*;
use crate::service::CarRentalService;
use crate::ui::Ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    Browse,
    EditForm,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Cars,
    Customers,
    Bookings,
}
impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Cars, Tab::Customers, Tab::Bookings];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Cars => "Cars",
            Tab::Customers => "Customers",
            Tab::Bookings => "Bookings",
        }
    }
    pub fn index(self) -> usize {
        self as usize
    }
    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }
    pub fn previous(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
    fn file_stem(self) -> &'static str {
        match self {
            Tab::Cars => "cars",
            Tab::Customers => "customers",
            Tab::Bookings => "bookings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// 確認ダイアログで「はい」を選んだときに実行する処理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteCar(String),
    DeleteCustomer(String),
    CancelBooking(String),
    DeleteBooking(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Message {
        level: Level,
        text: String,
    },
    Confirm {
        title: &'static str,
        text: String,
        action: PendingAction,
    },
}

#[derive(Debug, Clone, Copy)]
enum Entity {
    Car,
    Customer,
    Booking,
}
impl Entity {
    fn name(self) -> &'static str {
        match self {
            Entity::Car => "car",
            Entity::Customer => "customer",
            Entity::Booking => "booking",
        }
    }
    fn title(self) -> &'static str {
        match self {
            Entity::Car => "Car",
            Entity::Customer => "Customer",
            Entity::Booking => "Booking",
        }
    }
    fn tab(self) -> Tab {
        match self {
            Entity::Car => Tab::Cars,
            Entity::Customer => Tab::Customers,
            Entity::Booking => Tab::Bookings,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Create,
    Update,
    Delete,
    Cancel,
}
impl Op {
    fn verb(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Create => "create",
            Op::Update => "update",
            Op::Delete => "delete",
            Op::Cancel => "cancel",
        }
    }
    fn past(self) -> &'static str {
        match self {
            Op::Add => "added",
            Op::Create => "created",
            Op::Update => "updated",
            Op::Delete => "deleted",
            Op::Cancel => "cancelled",
        }
    }
    fn gerund(self) -> &'static str {
        match self {
            Op::Add => "adding",
            Op::Create => "creating",
            Op::Update => "updating",
            Op::Delete => "deleting",
            Op::Cancel => "cancelling",
        }
    }
}

#[derive(Error, Debug)]
enum ActionError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("the selected record has no id")]
    NoId,
}

/// 画面の状態と、キー操作に対応するバックエンド呼び出し
pub struct App {
    service: CarRentalService,
    export_dir: PathBuf,
    pub state: ConsoleState,
    pub tab: Tab,
    pub cars: StatefulTable<Car>,
    pub customers: StatefulTable<Customer>,
    pub bookings: StatefulTable<Booking>,
    // 絞り込み表示中の説明
    pub car_view: Option<String>,
    pub customer_view: Option<String>,
    pub booking_view: Option<String>,
    pub form: Option<Form>,
    pub dialogs: VecDeque<Dialog>,
}

impl App {
    pub fn new(service: CarRentalService, export_dir: PathBuf) -> Self {
        Self {
            service,
            export_dir,
            state: ConsoleState::Browse,
            tab: Tab::Cars,
            cars: StatefulTable::default(),
            customers: StatefulTable::default(),
            bookings: StatefulTable::default(),
            car_view: None,
            customer_view: None,
            booking_view: None,
            form: None,
            dialogs: VecDeque::new(),
        }
    }

    pub fn table_title(&self, tab: Tab) -> String {
        let view = match tab {
            Tab::Cars => &self.car_view,
            Tab::Customers => &self.customer_view,
            Tab::Bookings => &self.booking_view,
        };
        match view {
            Some(v) => format!("{} ({})", tab.title(), v),
            None => tab.title().to_string(),
        }
    }

    fn notify(&mut self, level: Level, text: impl Into<String>) {
        let text = text.into();
        match level {
            Level::Info => info!(%text, "notify"),
            Level::Warning => warn!(%text, "notify"),
            Level::Error => error!(%text, "notify"),
        }
        self.dialogs.push_back(Dialog::Message { level, text });
    }

    fn confirm(&mut self, title: &'static str, text: &str, action: PendingAction) {
        self.dialogs.push_back(Dialog::Confirm {
            title,
            text: text.to_string(),
            action,
        });
    }
}

// 読み込み
impl App {
    pub fn load_all(&mut self) {
        self.load_cars();
        self.load_customers();
        self.load_bookings();
    }

    pub fn load_cars(&mut self) {
        match self.service.get_all_cars() {
            Ok(cars) => {
                self.cars.set_items(cars);
                self.car_view = None;
            }
            Err(e) => self.notify(Level::Error, format!("Error loading cars: {}", e)),
        }
    }

    pub fn load_customers(&mut self) {
        match self.service.get_all_customers() {
            Ok(customers) => {
                self.customers.set_items(customers);
                self.customer_view = None;
            }
            Err(e) => self.notify(Level::Error, format!("Error loading customers: {}", e)),
        }
    }

    pub fn load_bookings(&mut self) {
        match self.service.get_all_bookings() {
            Ok(bookings) => {
                self.bookings.set_items(bookings);
                self.booking_view = None;
            }
            Err(e) => self.notify(Level::Error, format!("Error loading bookings: {}", e)),
        }
    }

    fn reload(&mut self, tab: Tab) {
        match tab {
            Tab::Cars => self.load_cars(),
            Tab::Customers => self.load_customers(),
            Tab::Bookings => self.load_bookings(),
        }
    }

    fn selected_car_id(&self) -> Option<String> {
        self.cars.selected().and_then(|c| c.id.clone())
    }
    fn selected_customer_id(&self) -> Option<String> {
        self.customers.selected().and_then(|c| c.id.clone())
    }
    fn selected_booking_id(&self) -> Option<String> {
        self.bookings.selected().and_then(|b| b.id.clone())
    }
}

// キー操作
impl App {
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.state = ConsoleState::Quit;
            return;
        }
        // ダイアログ表示中はダイアログが優先
        if !self.dialogs.is_empty() {
            self.handle_dialog_key(key);
            return;
        }
        match self.state {
            ConsoleState::Browse => self.handle_browse_key(key),
            ConsoleState::EditForm => self.handle_form_key(key),
            ConsoleState::Quit => {}
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let confirming = matches!(self.dialogs.front(), Some(Dialog::Confirm { .. }));
        if !confirming {
            if matches!(
                key.code,
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')
            ) {
                self.dialogs.pop_front();
            }
            return;
        }
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(Dialog::Confirm { action, .. }) = self.dialogs.pop_front() {
                    self.execute(action);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.dialogs.pop_front();
            }
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.state = ConsoleState::Quit,
            // タブ切り替え
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
            KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.previous(),
            KeyCode::Char('1') => self.tab = Tab::Cars,
            KeyCode::Char('2') => self.tab = Tab::Customers,
            KeyCode::Char('3') => self.tab = Tab::Bookings,
            // 移動
            KeyCode::Down | KeyCode::Char('j') => match self.tab {
                Tab::Cars => self.cars.next(),
                Tab::Customers => self.customers.next(),
                Tab::Bookings => self.bookings.next(),
            },
            KeyCode::Up | KeyCode::Char('k') => match self.tab {
                Tab::Cars => self.cars.previous(),
                Tab::Customers => self.customers.previous(),
                Tab::Bookings => self.bookings.previous(),
            },
            KeyCode::Char('r') => self.reload(self.tab),
            KeyCode::Char('a') => self.open_new_form(),
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit_form(),
            KeyCode::Char('d') | KeyCode::Delete => self.confirm_delete(),
            KeyCode::Char('x') => self.export_current(),
            KeyCode::Char('s') if self.tab == Tab::Cars => self.open_form(Form::search_cars()),
            KeyCode::Char('f') if self.tab == Tab::Customers => {
                self.open_form(Form::find_customer())
            }
            KeyCode::Char('b') if self.tab != Tab::Bookings => self.show_related_bookings(),
            KeyCode::Char('c') if self.tab == Tab::Bookings => self.confirm_cancel(),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.close_form(),
            KeyCode::Char('s') if ctrl => self.submit_form(),
            // 予約作成フォーム以外ではCtrl-aは入力欄に渡す (行頭へ移動)
            KeyCode::Char('a') if ctrl && self.editing(&FormKind::NewBooking) => {
                self.check_availability()
            }
            _ => {
                if let Some(form) = self.form.as_mut() {
                    form.handle_key(key);
                }
            }
        }
    }
}

// フォーム
impl App {
    fn editing(&self, kind: &FormKind) -> bool {
        self.form.as_ref().is_some_and(|form| &form.kind == kind)
    }

    fn open_form(&mut self, form: Form) {
        self.form = Some(form);
        self.state = ConsoleState::EditForm;
    }

    fn close_form(&mut self) {
        self.form = None;
        self.state = ConsoleState::Browse;
    }

    fn open_new_form(&mut self) {
        let form = match self.tab {
            Tab::Cars => Form::new_car(),
            Tab::Customers => Form::new_customer(),
            Tab::Bookings => Form::new_booking(&self.customers.items, &self.cars.items),
        };
        self.open_form(form);
    }

    /// 編集前に選択行の最新の内容を取り直す
    fn open_edit_form(&mut self) {
        let entity = self.entity_of_tab();
        let fetched = match self.tab {
            Tab::Cars => self.selected_car_id().map(|id| {
                self.service
                    .get_car_by_id(&id)
                    .map(|car| Form::edit_car(&car))
            }),
            Tab::Customers => self.selected_customer_id().map(|id| {
                self.service
                    .get_customer_by_id(&id)
                    .map(|customer| Form::edit_customer(&customer))
            }),
            Tab::Bookings => self.selected_booking_id().map(|id| {
                self.service
                    .get_booking_by_id(&id)
                    .map(|booking| Form::edit_booking(&booking))
            }),
        };
        match fetched {
            Some(Ok(form)) => self.open_form(form),
            Some(Err(e)) => self.notify(
                Level::Error,
                format!("Error loading {}: {}", entity.name(), e),
            ),
            None => self.notify(
                Level::Warning,
                format!("Please select a {} to update.", entity.name()),
            ),
        }
    }

    fn entity_of_tab(&self) -> Entity {
        match self.tab {
            Tab::Cars => Entity::Car,
            Tab::Customers => Entity::Customer,
            Tab::Bookings => Entity::Booking,
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.take() else {
            return;
        };
        match form.kind {
            FormKind::SearchCars => self.search_cars(form),
            FormKind::FindCustomer => self.find_customer(form),
            _ => self.save_form(form),
        }
    }

    fn save_form(&mut self, form: Form) {
        let (entity, op, outcome) = match &form.kind {
            FormKind::NewCar => (Entity::Car, Op::Add, self.add_car(&form)),
            FormKind::EditCar(car) => (Entity::Car, Op::Update, self.update_car(car, &form)),
            FormKind::NewCustomer => (Entity::Customer, Op::Add, self.add_customer(&form)),
            FormKind::EditCustomer(customer) => (
                Entity::Customer,
                Op::Update,
                self.update_customer(customer, &form),
            ),
            FormKind::NewBooking => (Entity::Booking, Op::Create, self.add_booking(&form)),
            FormKind::EditBooking(booking) => (
                Entity::Booking,
                Op::Update,
                self.update_booking(booking, &form),
            ),
            FormKind::SearchCars | FormKind::FindCustomer => return,
        };
        self.finish(entity, op, outcome, Some(form));
    }

    fn add_car(&self, form: &Form) -> Result<bool, ActionError> {
        self.service.create_car(&form.to_car()?)?;
        Ok(true)
    }

    fn update_car(&self, car: &Car, form: &Form) -> Result<bool, ActionError> {
        let id = car.id.as_deref().ok_or(ActionError::NoId)?;
        Ok(self.service.update_car(id, &form.to_car()?)?)
    }

    fn add_customer(&self, form: &Form) -> Result<bool, ActionError> {
        self.service.create_customer(&form.to_customer()?)?;
        Ok(true)
    }

    fn update_customer(&self, customer: &Customer, form: &Form) -> Result<bool, ActionError> {
        let id = customer.id.as_deref().ok_or(ActionError::NoId)?;
        Ok(self.service.update_customer(id, &form.to_customer()?)?)
    }

    fn add_booking(&self, form: &Form) -> Result<bool, ActionError> {
        self.service.create_booking(&form.to_booking()?)?;
        Ok(true)
    }

    fn update_booking(&self, booking: &Booking, form: &Form) -> Result<bool, ActionError> {
        let id = booking.id.as_deref().ok_or(ActionError::NoId)?;
        Ok(self.service.update_booking(id, &form.to_booking_update()?)?)
    }

    /// 成功したらフォームを閉じて一覧を読み直す。失敗時はフォームを残す
    fn finish(
        &mut self,
        entity: Entity,
        op: Op,
        outcome: Result<bool, ActionError>,
        form: Option<Form>,
    ) {
        match outcome {
            Ok(true) => {
                self.close_form();
                self.reload(entity.tab());
                self.notify(
                    Level::Info,
                    format!("{} {} successfully!", entity.title(), op.past()),
                );
            }
            Ok(false) => {
                self.restore_form(form);
                self.notify(
                    Level::Error,
                    format!("Failed to {} {}.", op.verb(), entity.name()),
                );
            }
            Err(ActionError::Form(FormError::MissingSelection)) => {
                self.restore_form(form);
                self.notify(Level::Warning, FormError::MissingSelection.to_string());
            }
            Err(e) => {
                self.restore_form(form);
                self.notify(
                    Level::Error,
                    format!("Error {} {}: {}", op.gerund(), entity.name(), e),
                );
            }
        }
    }

    fn restore_form(&mut self, form: Option<Form>) {
        if let Some(form) = form {
            self.open_form(form);
        }
    }

    fn search_cars(&mut self, form: Form) {
        match self.run_search(&form) {
            Ok(cars) => {
                let found = cars.len();
                self.cars.set_items(cars);
                self.car_view = Some(format!("search results: {}", found));
                self.close_form();
            }
            Err(e) => {
                self.open_form(form);
                self.notify(Level::Error, format!("Error searching cars: {}", e));
            }
        }
    }

    fn run_search(&self, form: &Form) -> Result<Vec<Car>, ActionError> {
        Ok(self.service.search_cars(&form.to_car_search()?)?)
    }

    fn find_customer(&mut self, form: Form) {
        match self.run_find(&form) {
            Ok(customer) => {
                self.customer_view = Some(format!("email: {}", customer.email));
                self.customers.set_items(vec![customer]);
                self.close_form();
            }
            Err(e) => {
                self.open_form(form);
                self.notify(Level::Error, format!("Error finding customer: {}", e));
            }
        }
    }

    fn run_find(&self, form: &Form) -> Result<Customer, ActionError> {
        Ok(self.service.get_customer_by_email(&form.email()?)?)
    }

    fn check_availability(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        match self.run_availability(form) {
            Ok(true) => self.notify(Level::Info, "Car is available for the selected dates."),
            Ok(false) => self.notify(
                Level::Warning,
                "Car is not available for the selected dates.",
            ),
            Err(e) => self.notify(Level::Error, format!("Error checking availability: {}", e)),
        }
    }

    fn run_availability(&self, form: &Form) -> Result<bool, ActionError> {
        let (car_id, from, to) = form.availability_query()?;
        Ok(self.service.is_car_available(&car_id, from, to)?)
    }
}

// 削除・キャンセル・関連表示・出力
impl App {
    fn confirm_delete(&mut self) {
        let entity = self.entity_of_tab();
        let action = match self.tab {
            Tab::Cars => self.selected_car_id().map(PendingAction::DeleteCar),
            Tab::Customers => self.selected_customer_id().map(PendingAction::DeleteCustomer),
            Tab::Bookings => self.selected_booking_id().map(PendingAction::DeleteBooking),
        };
        match action {
            Some(action) => self.confirm(
                "Confirm Delete",
                &format!("Are you sure you want to delete this {}?", entity.name()),
                action,
            ),
            None => self.notify(
                Level::Warning,
                format!("Please select a {} to delete.", entity.name()),
            ),
        }
    }

    fn confirm_cancel(&mut self) {
        match self.selected_booking_id() {
            Some(id) => self.confirm(
                "Confirm Cancel",
                "Are you sure you want to cancel this booking?",
                PendingAction::CancelBooking(id),
            ),
            None => self.notify(Level::Warning, "Please select a booking to cancel."),
        }
    }

    fn execute(&mut self, action: PendingAction) {
        let (entity, op, outcome) = match &action {
            PendingAction::DeleteCar(id) => (Entity::Car, Op::Delete, self.service.delete_car(id)),
            PendingAction::DeleteCustomer(id) => (
                Entity::Customer,
                Op::Delete,
                self.service.delete_customer(id),
            ),
            PendingAction::CancelBooking(id) => (
                Entity::Booking,
                Op::Cancel,
                self.service.cancel_booking(id),
            ),
            PendingAction::DeleteBooking(id) => (
                Entity::Booking,
                Op::Delete,
                self.service.delete_booking(id),
            ),
        };
        self.finish(entity, op, outcome.map_err(ActionError::from), None);
    }

    fn show_related_bookings(&mut self) {
        let related = match self.tab {
            Tab::Cars => self.cars.selected().and_then(|car| {
                let id = car.id.clone()?;
                Some((self.service.get_bookings_by_car(&id), format!("car: {}", car)))
            }),
            Tab::Customers => self.customers.selected().and_then(|customer| {
                let id = customer.id.clone()?;
                Some((
                    self.service.get_bookings_by_customer(&id),
                    format!("customer: {}", customer.full_name()),
                ))
            }),
            Tab::Bookings => None,
        };
        match related {
            Some((Ok(bookings), view)) => {
                self.bookings.set_items(bookings);
                self.booking_view = Some(view);
                self.tab = Tab::Bookings;
            }
            Some((Err(e), _)) => {
                self.notify(Level::Error, format!("Error loading bookings: {}", e))
            }
            None => {
                let text = format!(
                    "Please select a {} to show its bookings.",
                    self.entity_of_tab().name()
                );
                self.notify(Level::Warning, text);
            }
        }
    }

    fn export_current(&mut self) {
        let stem = self.tab.file_stem();
        let result = match self.tab {
            Tab::Cars => export_table(&self.export_dir, stem, &self.cars.items),
            Tab::Customers => export_table(&self.export_dir, stem, &self.customers.items),
            Tab::Bookings => export_table(&self.export_dir, stem, &self.bookings.items),
        };
        match result {
            Ok(path) => self.notify(Level::Info, format!("Exported to {}", path.display())),
            Err(e) => self.notify(
                Level::Error,
                format!("Error exporting {}: {}", stem, e),
            ),
        }
    }
}

/// 端末とアプリ状態をまとめたイベントループ
pub struct System {
    ui: Ui,
    app: App,
}

impl System {
    pub fn new(config: &Config) -> Result<Self> {
        let service = CarRentalService::new(&config.api.base_url, config.api.timeout())?;
        info!(base_url = service.base_url(), "backend configured");
        let app = App::new(service, config.export.directory.clone());
        let ui = Ui::new()?;
        Ok(Self { ui, app })
    }

    pub fn run(&mut self) -> Result<()> {
        // 空の画面を先に出してから読み込む
        self.ui.draw(&mut self.app)?;
        self.app.load_all();

        while self.app.state != ConsoleState::Quit {
            self.ui.draw(&mut self.app)?;
            if let Event::Key(key) = event::read()? {
                self.app.handle_key(key);
            }
        }
        Ok(())
    }
}
