//! Checkout-initiation surface for the host integration layer.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::AppError;
use crate::ports::InitiationError;
use crate::AppState;

/// Create a processor payment order for the given order and hand back
/// the redirect the buyer should be sent to.
pub async fn initiate_payment(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.get_order(order_id).await?;

    if !state.payments.is_available(&order) {
        return Err(AppError::BadRequest(
            "payment gateway is not available for this order".to_string(),
        ));
    }

    match state.payments.create_payment(order_id).await {
        Ok(redirect) => Ok(Json(json!({
            "result": "success",
            "redirect": redirect.redirect_url,
        }))),
        Err(InitiationError::Declined(message)) => Err(AppError::PaymentDeclined(message)),
        Err(InitiationError::Gateway(err)) => Err(err.into()),
        Err(err) => {
            // Upstream detail stays in the logs; the buyer sees a generic
            // payment error.
            error!(order_id, error = %err, "payment initiation failed");
            Err(AppError::PaymentFailed)
        }
    }
}

/// Processor checkout view for an order whose transaction id is bound.
pub async fn transaction_url(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.get_order(order_id).await?;

    let url = state.payments.transaction_url(&order).ok_or_else(|| {
        AppError::NotFound(format!("Order {} has no processor transaction", order_id))
    })?;

    Ok(Json(json!({ "transaction_url": url })))
}
