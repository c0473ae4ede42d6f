//! Dashboard watch loop.
//!
//! Refreshes the dashboard on a fixed interval until Ctrl+C. A failed
//! refresh is logged and the loop carries on with the last good dashboard.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::time;

use crate::format::date::today;
use crate::pages::dashboard::{Dashboard, DashboardPage};
use crate::services::DashboardSource;

/// Run until `Ctrl+C` (SIGINT), calling `render` after every successful
/// refresh.
pub async fn run_dashboard_refresh<S, R>(
    source: &S,
    page: &mut DashboardPage,
    interval_seconds: u64,
    render: R,
) where
    S: DashboardSource + Sync + ?Sized,
    R: FnMut(&Dashboard),
{
    run_until(source, page, interval_seconds, render, async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Could not listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    })
    .await;
}

/// The loop itself, stopping when `shutdown` completes.
pub async fn run_until<S, R, F>(
    source: &S,
    page: &mut DashboardPage,
    interval_seconds: u64,
    mut render: R,
    shutdown: F,
) where
    S: DashboardSource + Sync + ?Sized,
    R: FnMut(&Dashboard),
    F: Future,
{
    let mut interval = time::interval(Duration::from_secs(interval_seconds.max(1)));
    tokio::pin!(shutdown);

    tracing::info!(
        "Dashboard refresh started (source: {}, interval: {}s)",
        source.source_name(),
        interval_seconds
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(dashboard) = refresh_once(source, page).await {
                    render(dashboard);
                }
            }

            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received. Stopping dashboard refresh.");
                break;
            }
        }
    }

    tracing::info!("Dashboard refresh stopped cleanly");
}

/// One refresh cycle. `None` when the source failed.
pub async fn refresh_once<'a, S>(source: &S, page: &'a mut DashboardPage) -> Option<&'a Dashboard>
where
    S: DashboardSource + Sync + ?Sized,
{
    match page.refresh(source, today()).await {
        Ok(dashboard) => {
            tracing::info!(
                "Dashboard refreshed: month sales {:.2}, month expenses {:.2}, {} overdue",
                dashboard.sales_month_total,
                dashboard.expenses_month_total,
                dashboard.overdue_count,
            );
            Some(dashboard)
        }
        Err(err) => {
            tracing::error!("Dashboard refresh error, skipping tick: {}", err);
            None
        }
    }
}
