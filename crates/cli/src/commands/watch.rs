//! Long-running views: poll on schedule and log every change until Ctrl-C.

use herool_client::controllers::{
    CustomerController, CustomerTab, CustomerView, RequestDetailController, RequestDetailView,
    TechnicianController, TechnicianTab, TechnicianView, bind_session,
};
use herool_core::RequestId;
use tokio::sync::watch;

use super::{CliError, Context};

pub async fn customer(ctx: &Context) -> Result<(), CliError> {
    ctx.user()?;
    let controller = CustomerController::new(ctx.gateway(), ctx.config.polling);
    let views = controller.subscribe();
    let binding = bind_session(controller.clone(), &ctx.session);

    // The requests tab is the one that polls.
    controller.select_tab(CustomerTab::Requests).await;
    follow(views, log_customer).await;
    binding.abort();
    Ok(())
}

pub async fn technician(ctx: &Context, tab: TechnicianTab) -> Result<(), CliError> {
    ctx.user()?;
    let controller = TechnicianController::new(ctx.gateway(), ctx.config.polling);
    let views = controller.subscribe();
    let binding = bind_session(controller.clone(), &ctx.session);

    controller.select_tab(tab).await;
    follow(views, log_technician).await;
    binding.abort();
    Ok(())
}

pub async fn request(ctx: &Context, request_id: RequestId) -> Result<(), CliError> {
    let controller = RequestDetailController::new(ctx.gateway(), ctx.config.polling);
    let views = controller.subscribe();
    ctx.activate(&controller).await?;
    controller.open(request_id).await?;

    follow(views, log_detail).await;
    controller.close();
    Ok(())
}

/// Log each view update until Ctrl-C or the controller goes away.
async fn follow<T>(mut views: watch::Receiver<T>, log: fn(&T)) {
    tracing::info!("Watching; press Ctrl-C to stop");
    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                log(&views.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

fn log_customer(view: &CustomerView) {
    tracing::info!(
        phase = ?view.phase,
        tab = ?view.tab,
        requests = view.requests.len(),
        total_offers = view.total_offers,
        "Customer view"
    );
    for request in &view.requests {
        let offers = view.offers_by_request.get(&request.id).map_or(0, Vec::len);
        tracing::info!("  #{} {} ({offers} offers)", request.id, request.description);
    }
    if let Some(error) = &view.error {
        tracing::warn!("{error}");
    }
}

fn log_technician(view: &TechnicianView) {
    tracing::info!(
        phase = ?view.phase,
        tab = ?view.tab,
        open_requests = view.open_requests.len(),
        offers = view.offers.len(),
        "Technician view"
    );
    if view.tab == TechnicianTab::Requests {
        for request in &view.open_requests {
            tracing::info!(
                "  #{} {}: {}",
                request.id,
                request.service_name.as_deref().unwrap_or("-"),
                request.description
            );
        }
    }
    if let Some(error) = &view.error {
        tracing::warn!("{error}");
    }
}

fn log_detail(view: &RequestDetailView) {
    tracing::info!(
        phase = ?view.phase,
        offers = view.offers.len(),
        accepted = ?view.accepted_offer,
        "Request view"
    );
    for offer in &view.offers {
        tracing::info!(
            "  offer #{} {} by technician #{}",
            offer.id,
            offer.price,
            offer.technician_id
        );
    }
    if let Some(error) = &view.error {
        tracing::warn!("{error}");
    }
}
