//! Offer commands.

use herool_client::Gateway;
use herool_client::controllers::{
    CustomerController, OfferDraft, RequestDetailController, TechnicianController,
};
use herool_core::{Offer, OfferId, Price, RequestId};

use super::{CliError, Context};

/// Bid on an open request as the signed-in technician.
pub async fn create(
    ctx: &Context,
    request_id: RequestId,
    price: Price,
    description: String,
) -> Result<(), CliError> {
    let controller = TechnicianController::new(ctx.gateway(), ctx.config.polling);
    ctx.activate(&controller).await?;

    controller.select_request(request_id)?;
    let offer = controller
        .submit_offer(OfferDraft {
            price: Some(price),
            description,
        })
        .await?;
    tracing::info!(
        "Submitted offer #{} of {} on request #{}",
        offer.id,
        offer.price,
        offer.request_id
    );
    Ok(())
}

/// Offers on one request, or the signed-in technician's own offers.
pub async fn list(ctx: &Context, request_id: Option<RequestId>) -> Result<(), CliError> {
    let offers = match request_id {
        Some(request_id) => ctx.gateway.list_offers_for_request(request_id).await?,
        None => {
            let user = ctx.user()?;
            ctx.gateway.list_offers_for_technician(user.id).await?
        }
    };

    for offer in &offers {
        log_offer(offer);
    }
    tracing::info!("{} offers", offers.len());
    Ok(())
}

/// Accept an offer on one of the signed-in customer's requests.
pub async fn accept(ctx: &Context, offer_id: OfferId) -> Result<(), CliError> {
    let controller = CustomerController::new(ctx.gateway(), ctx.config.polling);
    ctx.activate(&controller).await?;

    controller.accept_offer(offer_id).await?;
    let view = controller.snapshot();
    tracing::info!(
        "Accepted offer #{offer_id}; {} requests, {} offers in total",
        view.requests.len(),
        view.total_offers
    );
    Ok(())
}

pub async fn reject(ctx: &Context, offer_id: OfferId) -> Result<(), CliError> {
    let controller = RequestDetailController::new(ctx.gateway(), ctx.config.polling);
    ctx.activate(&controller).await?;

    controller.reject_offer(offer_id).await?;
    tracing::info!("Rejected offer #{offer_id}");
    Ok(())
}

fn log_offer(offer: &Offer) {
    tracing::info!(
        "#{} on request #{}: {} [{}] {}{}",
        offer.id,
        offer.request_id,
        offer.price,
        offer
            .status
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string),
        offer.request_description.as_deref().unwrap_or(""),
        offer
            .technician_name
            .as_deref()
            .map(|name| format!(" by {name}"))
            .unwrap_or_default(),
    );
}
