use chrono::Utc;
use clap::Parser;
use dotenvy::dotenv;

use distributor_crm::alerts::{Alert, AlertLevel};
use distributor_crm::cli::{
    CalculatorCommand, Cli, Command, CustomerCommand, ExpenseCommand, ProductCommand, ReportArgs,
    SaleCommand, SupplierCommand,
};
use distributor_crm::config::Config;
use distributor_crm::error::AppError;
use distributor_crm::format::date::today;
use distributor_crm::logging::init_logging;
use distributor_crm::models::ReportRequest;
use distributor_crm::pages::{
    CalculatorPage, CustomersPage, DashboardPage, ExpensesPage, ProductsPage, ReportsPage, SalesPage,
    SuppliersPage,
};
use distributor_crm::scheduler;
use distributor_crm::services::resource::{CustomerQuery, ExpenseQuery, SaleQuery};
use distributor_crm::services::{CrmClient, Sales};
use distributor_crm::store::HistoryFile;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let config = Config::from_env()
        .and_then(|c| c.with_overrides(cli.base_url.as_deref(), cli.timeout))
        .map_err(AppError::Config)
        .unwrap_or_else(|err| {
            tracing::error!("{}", err);
            std::process::exit(1);
        });

    tracing::debug!("Config loaded: {:?}", config);

    let client = CrmClient::from_config(&config).unwrap_or_else(|err| {
        tracing::error!("{}", err);
        std::process::exit(1);
    });

    let ok = match cli.command {
        Command::Customers(cmd) => customers(&client, cmd).await,
        Command::Suppliers(cmd) => suppliers(&client, cmd).await,
        Command::Products(cmd) => products(&client, cmd).await,
        Command::Sales(cmd) => sales(&client, cmd).await,
        Command::Expenses(cmd) => expenses(&client, cmd).await,
        Command::Dashboard { watch, interval } => {
            let interval = interval.unwrap_or(config.dashboard_refresh_seconds);
            dashboard(&client, watch, interval).await
        }
        Command::Report(args) => report(&client, args).await,
        Command::Calculator(cmd) => calculator(&client, &config, cmd).await,
        Command::Backup => show(match client.backup().await {
            Ok(()) => Alert::success("Backup realizado com sucesso!"),
            Err(err) => Alert::from_error(&err, "Erro ao realizar backup."),
        }),
    };

    if !ok {
        std::process::exit(1);
    }
}

/// Print an alert; false for anything short of success or info.
fn show(alert: Alert) -> bool {
    println!("{}", alert);
    matches!(alert.level, AlertLevel::Success | AlertLevel::Info)
}

/// Print a load failure, if any. True when the rows are there.
fn loaded(alert: Option<Alert>) -> bool {
    match alert {
        Some(alert) => show(alert),
        None => true,
    }
}

async fn customers(client: &CrmClient, cmd: CustomerCommand) -> bool {
    let mut page = CustomersPage::new();
    match cmd {
        CustomerCommand::List { term, phone, group, csv } => {
            page.set_query(CustomerQuery {
                term: term.clone(),
                group,
            });
            if !loaded(page.load(client).await) {
                return false;
            }
            if let Some(term) = term {
                page.set_term(&term);
            }
            if let Some(phone) = phone {
                page.set_phone(&phone);
            }
            print!("{}", page.table());
            println!("{}", page.count_label());
            match csv {
                Some(path) => show(page.export_csv(&path).await),
                None => true,
            }
        }
        CustomerCommand::Create(fields) => show(page.save(client, None, &fields.into()).await),
        CustomerCommand::Update { id, fields } => show(page.save(client, Some(id), &fields.into()).await),
        CustomerCommand::Delete { id } => show(page.delete(client, id).await),
    }
}

async fn suppliers(client: &CrmClient, cmd: SupplierCommand) -> bool {
    let mut page = SuppliersPage::new();
    match cmd {
        SupplierCommand::List { term, csv } => {
            if !loaded(page.load(client).await) {
                return false;
            }
            if let Some(term) = term {
                page.set_term(&term);
            }
            print!("{}", page.table());
            match csv {
                Some(path) => show(page.export_csv(&path).await),
                None => true,
            }
        }
        SupplierCommand::Create(fields) => show(page.save(client, None, &fields.into()).await),
        SupplierCommand::Update { id, fields } => show(page.save(client, Some(id), &fields.into()).await),
        SupplierCommand::Delete { id } => show(page.delete(client, id).await),
    }
}

async fn products(client: &CrmClient, cmd: ProductCommand) -> bool {
    let mut page = ProductsPage::new();
    match cmd {
        ProductCommand::List { term, supplier_id, sort } => {
            if !loaded(page.load(client).await) {
                return false;
            }
            if let Some(term) = term {
                page.set_term(&term);
            }
            page.set_supplier(supplier_id);
            if let Some(sort) = sort {
                page.sort_by(sort);
            }
            print!("{}", page.table());
            true
        }
        ProductCommand::Create(fields) => {
            let form = fields.into();
            let (margin, band) = ProductsPage::margin_preview(&form);
            tracing::debug!("Margin preview {:.2}% ({:?})", margin, band);
            show(page.save(client, None, &form).await)
        }
        ProductCommand::Update { id, fields } => show(page.save(client, Some(id), &fields.into()).await),
        ProductCommand::Delete { id } => show(page.delete(client, id).await),
    }
}

async fn sales(client: &CrmClient, cmd: SaleCommand) -> bool {
    let mut page = SalesPage::new();
    let today = today();
    match cmd {
        SaleCommand::List { filter, csv } => {
            page.set_query(SaleQuery::from(&filter));
            if !loaded(page.load(client).await) {
                return false;
            }
            print!("{}", page.table());
            println!("{}", page.totals());
            match csv {
                Some(dir) => show(page.export_csv(&dir, today).await),
                None => true,
            }
        }
        SaleCommand::Create(fields) => {
            // The suggested invoice number needs the current listing.
            if fields.invoice_number.is_none() && !loaded(page.load(client).await) {
                return false;
            }
            let form = fields.into_form(page.next_invoice_number(), today);
            show(page.save(client, None, &form, today).await)
        }
        SaleCommand::Update { id, fields } => {
            let fallback = if fields.invoice_number.is_none() {
                match client.get::<Sales>(id).await {
                    Ok(sale) => sale.invoice_number,
                    Err(err) => return show(Alert::from_error(&err, "Venda não encontrada.")),
                }
            } else {
                String::new()
            };
            let form = fields.into_form(fallback, today);
            show(page.save(client, Some(id), &form, today).await)
        }
        SaleCommand::Status { id, status } => show(page.set_status(client, id, status).await),
        SaleCommand::Delete { id } => show(page.delete(client, id).await),
        SaleCommand::NextInvoice => {
            if !loaded(page.load(client).await) {
                return false;
            }
            println!("{}", page.next_invoice_number());
            true
        }
        SaleCommand::Import { file } => show(page.import(client, &file).await),
        SaleCommand::Export { year, dir } => show(page.export_spreadsheet(client, year, &dir).await),
        SaleCommand::Template { dir } => show(page.download_template(client, &dir).await),
    }
}

async fn expenses(client: &CrmClient, cmd: ExpenseCommand) -> bool {
    let mut page = ExpensesPage::new();
    let today = today();
    match cmd {
        ExpenseCommand::List { filter, csv } => {
            page.set_query(ExpenseQuery::from(&filter));
            if !loaded(page.load(client).await) {
                return false;
            }
            print!("{}", page.table());
            println!("{}", page.totals());
            match csv {
                Some(path) => show(page.export_csv(&path).await),
                None => true,
            }
        }
        ExpenseCommand::Create(fields) => show(page.save(client, None, fields.into_form(today), today).await),
        ExpenseCommand::Update { id, fields } => {
            show(page.save(client, Some(id), fields.into_form(today), today).await)
        }
        ExpenseCommand::Status { id, status } => show(page.set_status(client, id, status).await),
        ExpenseCommand::Delete { id } => show(page.delete(client, id).await),
        ExpenseCommand::Import { file } => show(page.import(client, &file).await),
        ExpenseCommand::Export { year, dir } => show(page.export_year(client, year, &dir).await),
        ExpenseCommand::Categories => {
            if !loaded(page.load(client).await) {
                return false;
            }
            for category in page.categories() {
                println!("{}", category);
            }
            true
        }
    }
}

async fn dashboard(client: &CrmClient, watch: bool, interval_seconds: u64) -> bool {
    let mut page = DashboardPage::new();
    if watch {
        scheduler::run_dashboard_refresh(client, &mut page, interval_seconds, |d| print!("{}", d)).await;
        return true;
    }
    if !loaded(page.load(client, today()).await) {
        return false;
    }
    if let Some(dashboard) = page.current() {
        print!("{}", dashboard);
    }
    true
}

async fn report(client: &CrmClient, args: ReportArgs) -> bool {
    let today = today();
    let mut request = ReportRequest::month_to_date(args.kind, today);
    if args.start.is_some() {
        request.start = args.start;
    }
    if args.end.is_some() {
        request.end = args.end;
    }

    let mut page = ReportsPage::new();
    if !show(page.generate(client, &request).await) {
        return false;
    }
    if let Some(summary) = page.summary() {
        print!("{}", summary);
    }
    match args.csv {
        Some(dir) => show(page.export_csv(&dir, Utc::now()).await),
        None => true,
    }
}

async fn calculator(client: &CrmClient, config: &Config, cmd: CalculatorCommand) -> bool {
    let mut page = match CalculatorPage::open(HistoryFile::new(config.history_path.clone())).await {
        Ok(page) => page,
        Err(err) => return show(Alert::from_error(&err, "Erro ao carregar histórico")),
    };

    match cmd {
        CalculatorCommand::Margin { cost, sale, quantity, server } => {
            // A thin margin still warns; only a rejected input fails.
            show(page.calculate(cost, sale).await);
            let ok = page.last().is_some();
            print_result(&page);
            if let Some(sim) = quantity.and_then(|q| page.simulate(q)) {
                println!("{}", sim);
            }
            if ok && server {
                return show(page.check_on_server(client).await);
            }
            ok
        }
        CalculatorCommand::Reverse { cost, margin } => {
            show(page.reverse(cost, margin).await);
            print_result(&page);
            page.last().is_some()
        }
        CalculatorCommand::History => {
            print!("{}", page.history_table());
            true
        }
        CalculatorCommand::Clear => show(page.clear_history().await),
    }
}

fn print_result(page: &CalculatorPage) {
    if let Some(text) = page.result_text() {
        println!("{}", text);
    }
}
