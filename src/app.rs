//! Interactive terminal front end over the converter and login stub.

use std::sync::Arc;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::features::auth::{HttpTransport, LoginClient, MockBackend, ReqwestTransport};
use crate::features::currency::{
    Collaborators, ConverterController, ConverterForm, ConverterSession, FormField,
    HttpRateProvider, StaticSymbolTable, TimeInterval,
};
use crate::shared::error::{AppError, AppResult};
use crate::shared::notify::{LogNotifier, Notifier};
use crate::shared::settings::AppSettings;
use crate::shared::storage::open_default_storage;

const HELP: &str = "\
commands:
  amount N               set the amount
  from CODE | to CODE    pick a currency
  type from|to TEXT      type into a currency field (auto-fills at 3 letters)
  suggest from|to        autocomplete options for a field
  convert                convert and record in history
  swap                   exchange from and to
  history [interval]     list history (day, week, month, all)
  average [interval]     average rate over history
  symbol CODE            currency symbol
  login USER PASS        log in through the login endpoint
  quit";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Amount(Option<f64>),
    Select(FormField, String),
    Type(FormField, String),
    Suggest(FormField),
    Convert,
    Swap,
    History(Option<TimeInterval>),
    Average(Option<TimeInterval>),
    Symbol(String),
    Login(String, String),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> AppResult<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let interval = |arg: Option<&&str>| -> AppResult<Option<TimeInterval>> {
            arg.map(|s| s.parse::<TimeInterval>()).transpose()
        };

        match parts.as_slice() {
            ["amount"] => Ok(Command::Amount(None)),
            ["amount", n] => n
                .parse::<f64>()
                .map(|v| Command::Amount(Some(v)))
                .map_err(|_| AppError::Validation(format!("Not a number: {}", n))),
            ["from", code] => Ok(Command::Select(FormField::From, code.to_string())),
            ["to", code] => Ok(Command::Select(FormField::To, code.to_string())),
            ["type", field, text] => Ok(Command::Type(currency_field(field)?, text.to_string())),
            ["suggest", field] => Ok(Command::Suggest(currency_field(field)?)),
            ["convert"] => Ok(Command::Convert),
            ["swap"] => Ok(Command::Swap),
            ["history", rest @ ..] if rest.len() <= 1 => Ok(Command::History(interval(rest.first())?)),
            ["average", rest @ ..] if rest.len() <= 1 => Ok(Command::Average(interval(rest.first())?)),
            ["symbol", code] => Ok(Command::Symbol(code.to_string())),
            ["login", user, pass] => Ok(Command::Login(user.to_string(), pass.to_string())),
            ["help"] | [] => Ok(Command::Help),
            ["quit"] | ["exit"] => Ok(Command::Quit),
            _ => Err(AppError::Validation(format!("Unknown command: {}", line.trim()))),
        }
    }
}

fn currency_field(name: &str) -> AppResult<FormField> {
    match name.parse::<FormField>()? {
        FormField::Amount => Err(AppError::Validation("Expected 'from' or 'to'".to_string())),
        field => Ok(field),
    }
}

/// Wire up collaborators from settings and run the command loop on stdin.
pub async fn run() -> AppResult<()> {
    let settings = AppSettings::load().await.unwrap_or_else(|e| {
        log::error!("Failed to load settings: {}", e);
        AppSettings::default()
    });

    let storage = open_default_storage();
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let collaborators = Collaborators {
        provider: Arc::new(HttpRateProvider::new(settings.api.rates_url.clone())?),
        notifier: notifier.clone(),
        symbols: Arc::new(StaticSymbolTable),
    };

    let prefs = &settings.preferences;
    let form = ConverterForm::new(
        prefs.default_amount,
        prefs.default_currency_from.clone(),
        prefs.default_currency_to.clone(),
    );
    let session = ConverterSession::new(form, storage);
    let mut controller = ConverterController::new(session, collaborators, settings.api.base_currency.clone());

    let transport: Arc<dyn HttpTransport> = if settings.mock_backend.enabled {
        log::info!("[App] Login requests are answered by the mock backend");
        Arc::new(MockBackend::from_settings(ReqwestTransport::new()?, &settings.mock_backend))
    } else {
        Arc::new(ReqwestTransport::new()?)
    };
    let login = LoginClient::new(transport, settings.api.auth_url.clone());

    controller.load_rates().await;

    let mut out = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    out.write_all(format!("{}\n> ", HELP).as_bytes()).await?;
    out.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let reply = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&mut controller, &login, notifier.as_ref(), command).await,
            Err(e) => e.to_string(),
        };
        out.write_all(format!("{}\n> ", reply).as_bytes()).await?;
        out.flush().await?;
    }

    log::info!("[App] Session ended with {} history records", controller.history().len());
    Ok(())
}

async fn execute(
    controller: &mut ConverterController,
    login: &LoginClient,
    notifier: &dyn Notifier,
    command: Command,
) -> String {
    let today = Local::now().date_naive();

    match command {
        Command::Amount(amount) => {
            controller.set_amount(amount);
            status_line(controller)
        }
        Command::Select(field, code) => {
            if !controller.inputs_enabled() {
                return "Currency inputs are disabled until rates load".to_string();
            }
            controller.select_currency(field, &code);
            status_line(controller)
        }
        Command::Type(field, text) => {
            if !controller.inputs_enabled() {
                return "Currency inputs are disabled until rates load".to_string();
            }
            controller.type_currency(field, &text);
            controller.validate_typed_currency(field, &text);
            status_line(controller)
        }
        Command::Suggest(field) => {
            let options = match field {
                FormField::From => controller.from_suggestions(),
                _ => controller.to_suggestions(),
            };
            options.join(" ")
        }
        Command::Convert => {
            if !controller.is_form_valid() {
                return "Form is not valid".to_string();
            }
            match controller.convert() {
                Ok(state) => {
                    let symbol = controller.currency_symbol(&state.to_currency).unwrap_or_default();
                    format!(
                        "{} {} = {}{} {}",
                        state.amount, state.from_currency, symbol, state.result, state.to_currency
                    )
                }
                Err(e) => e.to_string(),
            }
        }
        Command::Swap => {
            controller.swap_currencies();
            status_line(controller)
        }
        Command::History(interval) => {
            let interval = interval.unwrap_or_else(|| controller.selected_interval());
            if let Err(e) = controller.select_interval(interval) {
                log::warn!("[App] Failed to remember interval: {}", e);
            }
            let records = controller.history_for(interval, today);
            if records.is_empty() {
                return "No conversions yet".to_string();
            }
            records
                .iter()
                .map(|r| {
                    format!(
                        "#{} {} {} {} -> {} @ {}",
                        r.id,
                        r.creation_date,
                        r.time,
                        r.from_currency,
                        r.to_currency,
                        r.pure_exchange_rate
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Average(interval) => {
            let interval = interval.unwrap_or_else(|| controller.selected_interval());
            match controller.average_for(interval, today) {
                Ok(avg) => format!("{:.5}", avg),
                Err(e) => e.to_string(),
            }
        }
        Command::Symbol(code) => controller
            .currency_symbol(&code)
            .unwrap_or_else(|| format!("No symbol for {}", code)),
        Command::Login(user, pass) => match login.login(&user, &pass).await {
            Ok(resp) => format!("Welcome, {} ({})", resp.user.full_name, resp.user.username),
            Err(e) => {
                notifier.report_error(&e.to_string());
                e.to_string()
            }
        },
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    }
}

fn status_line(controller: &ConverterController) -> String {
    let form = controller.form();
    format!(
        "amount={} from={} to={} valid={}",
        form.amount.map(|a| a.to_string()).unwrap_or_default(),
        form.from,
        form.to,
        controller.is_valid()
    )
}
