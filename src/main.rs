//! Bond Desk - terminal client for the sovereign bond marketplace
//!
//! One-shot commands print a single view; `dashboard` runs the interactive session.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use bond_desk::adapters::cli::{
    run_dashboard, BondCmd, CliApp, Command, DashboardCmd, TradeCmd,
};
use bond_desk::adapters::terminal::{render, Palette, TerminalNotifier};
use bond_desk::adapters::MarketplaceClient;
use bond_desk::application::{RefreshOutcome, TradeOutcome, ViewController};
use bond_desk::config::{load_or_default, Config};
use bond_desk::domain::TradeDirection;
use bond_desk::ports::{ApiError, BondMarketPort};

type Desk = ViewController<MarketplaceClient, TerminalNotifier>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (BOND_API_URL, BOND_USER_ADDRESS)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config = load_or_default(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    let client = build_client(&config, app.api_url.as_deref())?;
    let user = config
        .session
        .get_user_address()
        .context("Invalid session settings")?;

    match app.command {
        Command::Bonds => bonds_command(client, user).await,
        Command::Bond(cmd) => bond_command(client, cmd).await,
        Command::Portfolio(cmd) => portfolio_command(client, cmd.user.unwrap_or(user)).await,
        Command::Stats => stats_command(client, user).await,
        Command::Trade(cmd) => {
            let user = cmd.user.clone().unwrap_or(user);
            trade_command(client, user, cmd).await
        }
        Command::Health => health_command(client).await,
        Command::Dashboard(cmd) => dashboard_command(client, user, &config, cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
    };

    // stderr keeps stdout for rendered views
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    Ok(())
}

fn build_client(config: &Config, api_url: Option<&str>) -> Result<MarketplaceClient> {
    let market = config.marketplace(api_url).context("Invalid marketplace settings")?;
    tracing::debug!("Marketplace API at {}", market.base_url);
    MarketplaceClient::new(market).context("Failed to create marketplace client")
}

fn desk(client: MarketplaceClient, user: String, palette: Palette) -> Desk {
    ViewController::new(client, TerminalNotifier::new(palette), user)
}

async fn bonds_command(client: MarketplaceClient, user: String) -> Result<()> {
    let base = client.base_url().to_string();
    let desk = desk(client, user, Palette::ansi());

    let (bonds, _) = tokio::join!(desk.refresh_bonds(), desk.refresh_portfolio());
    if bonds == RefreshOutcome::Failed {
        bail!("Failed to load bonds from {}", base);
    }

    let state = desk.snapshot().await;
    print!("{}", render::render_market(&state.bonds, state.portfolio.as_ref(), Palette::ansi()));
    Ok(())
}

async fn bond_command(client: MarketplaceClient, cmd: BondCmd) -> Result<()> {
    let bond = client
        .get_bond(&cmd.id)
        .await
        .map_err(|e| bond_lookup_error(&cmd.id, e))?;

    let quote = match client.get_bond_yield(&cmd.id).await {
        Ok(quote) => Some(quote),
        Err(e) => {
            tracing::warn!("No yield quote for {}: {}", cmd.id, e);
            None
        }
    };

    let today = chrono::Utc::now().date_naive();
    print!("{}", render::render_bond_detail(&bond, quote.as_ref(), today, Palette::ansi()));
    Ok(())
}

fn bond_lookup_error(id: &str, error: ApiError) -> anyhow::Error {
    if error.is_not_found() {
        return anyhow!("No bond with id '{}'. Run `bond-desk bonds` to list ids.", id);
    }
    anyhow::Error::new(error).context(format!("Failed to load bond {}", id))
}

async fn portfolio_command(client: MarketplaceClient, user: String) -> Result<()> {
    let portfolio = client
        .get_portfolio(&user)
        .await
        .with_context(|| format!("Failed to load portfolio for {}", user))?;

    println!("Portfolio {}", user);
    print!("{}", render::render_portfolio(Some(&portfolio), Palette::ansi()));
    Ok(())
}

async fn stats_command(client: MarketplaceClient, user: String) -> Result<()> {
    let desk = desk(client, user, Palette::ansi());

    let (stats, _) = tokio::join!(desk.refresh_market_stats(), desk.refresh_bonds());
    if stats == RefreshOutcome::Failed {
        bail!("Failed to load market statistics");
    }

    let state = desk.snapshot().await;
    print!(
        "{}",
        render::render_analytics(state.market_stats.as_ref(), &state.bonds, Palette::ansi())
    );
    Ok(())
}

async fn trade_command(client: MarketplaceClient, user: String, cmd: TradeCmd) -> Result<()> {
    let desk = desk(client, user, Palette::ansi());
    if desk.refresh_bonds().await == RefreshOutcome::Failed {
        bail!("Failed to load bonds; trade not sent");
    }

    let direction = if cmd.sell { TradeDirection::Sell } else { TradeDirection::Buy };
    let outcome = desk
        .quick_trade(&cmd.bond_id, &cmd.quantity, direction)
        .await
        .with_context(|| format!("Cannot trade {}", cmd.bond_id))?;

    match outcome {
        TradeOutcome::Executed(receipt) => {
            if let Some(total) = receipt.total_amount {
                println!("Total {}", bond_desk::domain::format_usd(total));
            }
            if let Some(value) = receipt.new_portfolio_value {
                println!("Portfolio value {}", bond_desk::domain::format_usd(value));
            }
            Ok(())
        }
        TradeOutcome::Rejected(_) | TradeOutcome::InvalidQuantity(_) => {
            bail!("Trade was not executed")
        }
    }
}

async fn health_command(client: MarketplaceClient) -> Result<()> {
    let message = client
        .health()
        .await
        .with_context(|| format!("Marketplace API at {} is not reachable", client.base_url()))?;
    println!("{} ({})", message, client.base_url());
    Ok(())
}

async fn dashboard_command(
    client: MarketplaceClient,
    user: String,
    config: &Config,
    cmd: DashboardCmd,
) -> Result<()> {
    let interval = cmd
        .interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.session.poll_interval());
    if interval.is_zero() {
        bail!("--interval must be > 0");
    }

    let palette = if cmd.no_color { Palette::plain() } else { Palette::ansi() };
    run_dashboard(desk(client, user, palette), interval, palette).await
}
