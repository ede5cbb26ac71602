//! OpenSASE Order Desk - operator CLI for order verification and fulfillment

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use opensase_orderdesk::domain::aggregates::{Billing, BillingSummary, ItemGroups, Order};
use opensase_orderdesk::{DeskConfig, HttpOrderApi, OrderDesk, OrderQuery, OrderStatus, OrderStore, Session, SortKey};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "opensase-orderdesk", about = "Verify payments and move orders through fulfillment")]
struct Cli {
    /// Backend base URL (overrides ORDERDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Admin token (overrides ORDERDESK_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List orders
    List {
        #[arg(long, default_value = "all")]
        filter: String,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "newest")]
        sort: String,
    },
    /// Badge counts per filter
    Counts,
    /// Billing breakdown and items of one order
    Show { order_id: String },
    /// Move an order to another status
    Status { order_id: String, status: String },
    /// Approve a submitted online payment
    Approve { order_id: String },
    /// Reject a submitted online payment
    Reject {
        order_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Totals across all orders
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let cli = Cli::parse();
    let mut config = DeskConfig::from_env()?;
    if let Some(url) = cli.api_url { config = config.with_api_url(url); }
    if let Some(token) = cli.token { config = config.with_token(token); }

    let api = HttpOrderApi::new(&config)?;
    tracing::info!("📦 OpenSASE Order Desk using {}", api.base_url());
    let mut desk = OrderDesk::new(api, Session::new(config.token.clone(), config.login_path.clone()));

    let outcome = run(&mut desk, cli.command).await;
    for notice in desk.take_notices() {
        println!("[{:?}] {}", notice.level, notice.message);
    }
    if let Some(login) = desk.session().redirect() {
        println!("Session ended. Log in again at {}{}", config.api_url.trim_end_matches('/'), login);
    }
    outcome
}

async fn run(desk: &mut OrderDesk<HttpOrderApi>, command: Command) -> Result<()> {
    desk.refresh().await?;
    match command {
        Command::List { filter, search, sort } => {
            let query = OrderQuery::new(filter.parse()?).search(search).sort(sort.parse::<SortKey>()?);
            let ids: Vec<String> = desk.view(&query).into_iter().map(|o| o.id.clone()).collect();
            for id in &ids {
                print_order(desk.store(), id, false);
            }
        }
        Command::Counts => {
            for (filter, count) in desk.filter_counts() {
                println!("{:<22} {:>5}", filter.label(), count);
            }
        }
        Command::Show { order_id } => {
            if !print_order(desk.store(), &order_id, true) { bail!("order {order_id} not found"); }
        }
        Command::Status { order_id, status } => {
            desk.update_status(&order_id, OrderStatus::from(status)).await?;
        }
        Command::Approve { order_id } => {
            desk.approve_payment(&order_id).await?;
            print_order(desk.store(), &order_id, false);
        }
        Command::Reject { order_id, reason } => {
            desk.reject_payment(&order_id, &reason).await?;
            print_order(desk.store(), &order_id, false);
        }
        Command::Summary => {
            let summary = BillingSummary::over(desk.store().iter());
            println!("orders                 {}", summary.orders);
            println!("gross                  {}", summary.gross_total);
            println!("prepaid                {}", summary.prepaid_total);
            println!("outstanding            {}", summary.outstanding_total);
            println!("fully paid             {}", summary.fully_paid);
            println!("awaiting verification  {}", summary.awaiting_verification);
        }
    }
    Ok(())
}

/// Prints one stored order with its memoized billing; false when the id is unknown.
fn print_order(store: &OrderStore, order_id: &str, detail: bool) -> bool {
    let (Some(order), Some(billing)) = (store.get(order_id), store.billing(order_id)) else { return false };
    print_row(order, billing);
    if detail { print_detail(order, billing); }
    true
}

fn print_row(order: &Order, billing: &Billing) {
    let date = order.date.map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_else(|| "-".into());
    println!(
        "{}  {:<16} {:<18} {:<9} total {:>10} due {:>10}  {}  {}",
        order.id,
        order.status,
        order.display_payment_method().display_name(),
        payment_label(order),
        billing.total,
        billing.remaining_amount,
        date,
        order.customer_name().unwrap_or("-"),
    );
}

fn payment_label(order: &Order) -> String {
    if order.is_cod() { return "auto".into(); }
    order.payment_status.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "-".into())
}

fn print_detail(order: &Order, billing: &Billing) {
    println!("  [{}] {}", order.status.icon(), order.status);
    let groups = ItemGroups::from_items(&order.items);
    for deal in &groups.deals {
        println!("  deal {} x{} = {}", deal.name, deal.total_quantity, deal.total_price);
        if let Some(description) = &deal.description { println!("       {description}"); }
        for item in &deal.items {
            println!("       - {} x{} @ {}", item.name, item.quantity, item.price);
        }
    }
    for item in &groups.regular {
        println!("  {} x{} @ {} = {}", item.name, item.quantity, item.price, item.line_total());
    }
    println!("  subtotal {}  delivery {}  total {}", billing.subtotal, billing.delivery_charges, billing.total);
    println!("  prepaid {}  remaining {}{}", billing.prepaid_amount, billing.remaining_amount, if billing.is_fully_paid { "  (paid)" } else { "" });
    if let Some(shot) = order.screenshot() { println!("  payment proof: {shot}"); }
    if let Some(at) = order.verified_payment.as_ref().and_then(|v| v.verified_at) { println!("  verified at {at}"); }
    if order.can_update_status() {
        let targets: Vec<String> = OrderStatus::OPERATOR_TARGETS.iter().map(|s| s.label().to_string()).collect();
        println!("  status can move to: {}", targets.join(", "));
    } else if order.needs_verification() {
        println!("  awaiting payment verification (approve / reject)");
    }
}
