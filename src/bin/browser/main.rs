use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use restaurant_browse::{
    client::ApiClient,
    config::ClientConfig,
    data::{Limit, Order, Selection, SortBy},
    table,
    view::{BrowsingView, Resource, ResourceStatus},
};

/// Browse restaurants served by the restaurant API.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Sort key: name or average_rating
    #[arg(long, default_value_t = SortBy::AverageRating)]
    sort_by: SortBy,

    /// Sort direction: asc or desc
    #[arg(long, default_value_t = Order::Desc)]
    order: Order,

    /// Number of restaurants to show (5, 10, 15, 20 or 25)
    #[arg(long, default_value_t = 15)]
    limit: u32,

    /// Only show cuisines containing this text
    #[arg(long, default_value = "")]
    cuisine: String,

    /// Only show this borough
    #[arg(long, default_value = "")]
    borough: String,

    /// Print the featured listing instead of a filtered query
    #[arg(long)]
    featured: bool,

    /// Also print the available cuisine and borough filters
    #[arg(long)]
    list_filters: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")?;

    let args = Args::parse();
    let config = ClientConfig::from_env()?;
    let client = ApiClient::new(&config).context("fail to create HTTP client")?;

    if args.featured {
        let restaurants = client.featured().await.with_context(|| {
            format!("fail to fetch featured restaurants from {}", config.api_url)
        })?;
        print!("{}", table::render(&restaurants));
        return Ok(());
    }

    let selection = Selection {
        sort_by: args.sort_by,
        order: args.order,
        limit: Limit::try_from(args.limit).map_err(|e| anyhow!(e))?,
        filter_cuisine: args.cuisine,
        filter_borough: args.borough,
    };

    let mut view = BrowsingView::with_selection(Arc::new(client), selection);
    view.mount();
    view.settle().await;

    if args.list_filters {
        println!("Cuisines: {}", view.cuisines().join(", "));
        println!("Boroughs: {}", view.boroughs().join(", "));
        println!();
    }

    if let ResourceStatus::Failed(reason) = view.status(Resource::Restaurants) {
        return Err(anyhow!("fail to fetch restaurants: {reason}"));
    }

    let selection = view.selection();
    println!(
        "{}, {}, {} restaurants",
        selection.sort_by.label(),
        selection.order,
        selection.limit
    );
    print!("{}", view.render());
    Ok(())
}
