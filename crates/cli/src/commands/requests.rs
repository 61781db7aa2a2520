//! Service catalog and request commands.

use herool_client::Gateway;
use herool_client::controllers::{CustomerController, RequestDetailController, RequestDraft};
use herool_core::{Request, RequestId, ServiceCatalogEntry, ServiceId, service_name};

use super::{CliError, Context};

pub async fn services(ctx: &Context) -> Result<(), CliError> {
    let services = ctx.gateway.list_services().await?;
    for service in &services {
        tracing::info!("#{} {} - {}", service.id, service.name, service.description);
    }
    tracing::info!("{} services", services.len());
    Ok(())
}

/// Post a request as the signed-in customer.
pub async fn create(ctx: &Context, draft: RequestDraft) -> Result<(), CliError> {
    let controller = CustomerController::new(ctx.gateway(), ctx.config.polling);
    ctx.activate(&controller).await?;

    let created = controller.create_request(draft).await?;
    tracing::info!(
        "Created request #{} for {}",
        created.id,
        controller.service_name(created.service_id)
    );
    Ok(())
}

/// The signed-in customer's requests.
pub async fn mine(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.user()?;
    let (services, requests) = tokio::try_join!(
        ctx.gateway.list_services(),
        ctx.gateway.list_requests_by_customer(user.id),
    )?;
    log_requests(&services, &requests);
    Ok(())
}

/// Every open request.
pub async fn open(ctx: &Context) -> Result<(), CliError> {
    let (services, requests) = tokio::try_join!(
        ctx.gateway.list_services(),
        ctx.gateway.list_open_requests(),
    )?;
    log_requests(&services, &requests);
    Ok(())
}

/// Open requests for one service.
pub async fn by_service(ctx: &Context, service_id: ServiceId) -> Result<(), CliError> {
    let (services, requests) = tokio::try_join!(
        ctx.gateway.list_services(),
        ctx.gateway.list_requests_by_service(service_id),
    )?;
    log_requests(&services, &requests);
    Ok(())
}

/// One request and its offers.
pub async fn show(ctx: &Context, request_id: RequestId) -> Result<(), CliError> {
    let controller = RequestDetailController::new(ctx.gateway(), ctx.config.polling);
    ctx.activate(&controller).await?;
    controller.open(request_id).await?;

    let view = controller.snapshot();
    controller.close();
    if let Some(request) = &view.request {
        log_request(request, request.service_name.as_deref().unwrap_or("-"));
    }
    for offer in &view.offers {
        tracing::info!(
            "  offer #{} {} by {} [{}] {}",
            offer.id,
            offer.price,
            offer.technician_name.as_deref().unwrap_or("-"),
            offer
                .status
                .as_ref()
                .map_or_else(|| "-".to_owned(), ToString::to_string),
            offer.description.as_deref().unwrap_or(""),
        );
    }
    if let Some(error) = &view.error {
        tracing::warn!("{error}");
    }
    Ok(())
}

fn log_requests(services: &[ServiceCatalogEntry], requests: &[Request]) {
    for request in requests {
        let service = request
            .service_name
            .as_deref()
            .or_else(|| service_name(services, request.service_id))
            .unwrap_or("Unknown");
        log_request(request, service);
    }
    tracing::info!("{} requests", requests.len());
}

fn log_request(request: &Request, service: &str) {
    tracing::info!(
        "#{} [{}] {} at {}: {}{}",
        request.id,
        request
            .status
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string),
        service,
        request.location,
        request.description,
        request
            .created_at
            .map(|at| format!(" ({})", at.format("%Y-%m-%d %H:%M")))
            .unwrap_or_default(),
    );
}
