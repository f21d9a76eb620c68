//! Checkout saga and order settlement.
//!
//! An order is written as `awaiting_session` together with its items before
//! the payment provider is called. Afterwards it either moves to `pending`
//! with the session attached, or to `failed` with the reason. Orders stuck in
//! `awaiting_session` (process died mid-checkout) are failed by
//! [`reconcile_stale_orders`]. Webhooks move `pending` orders to `paid` or
//! `expired`.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, TransactionTrait, UpdateMany, sea_query::Expr,
};
use shutterlink::{Money, PricedOrder, PricingError, price_order};
use shutterlink_types::create_id;

use crate::{
    entity::{gallery, image, order, order_item, sea_orm_active_enums::OrderStatus},
    error::{ApiError, FieldError},
    gallery_access::GalleryAccessError,
    payment::{CheckoutSessionRequest, SessionLineItem},
    state::State,
};

/// Stored on orders the sweep gives up on.
pub const STALE_FAILURE_REASON: &str = "no payment session was attached in time";

#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub gallery_id: String,
    pub client_email: String,
    pub client_name: Option<String>,
    /// `(image_id, quantity)` as requested; prices are looked up here
    pub items: Vec<(String, u32)>,
}

#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: String,
    pub session_id: String,
    pub url: String,
    pub total: Money,
}

/// Result of applying a payment provider notification to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    /// The order exists but was not in a state the notification applies to
    Skipped(OrderStatus),
    UnknownOrder,
}

fn pricing_error(err: PricingError) -> ApiError {
    match err {
        PricingError::Empty => ApiError::validation(vec![FieldError::new(
            "items",
            "select at least one image",
        )]),
        PricingError::UnknownImage(id) => ApiError::validation(vec![FieldError::new(
            "items",
            format!("image {id} is not part of this gallery"),
        )]),
        PricingError::ZeroQuantity(id) => ApiError::validation(vec![FieldError::new(
            "items",
            format!("quantity for image {id} must be at least 1"),
        )]),
        PricingError::Overflow => ApiError::bad_request("Order total is too large"),
    }
}

/// Prices the requested items against the gallery's stored prices.
pub async fn price_checkout<C: ConnectionTrait>(
    db: &C,
    gallery_id: &str,
    items: &[(String, u32)],
) -> Result<(PricedOrder, HashMap<String, image::Model>), ApiError> {
    if items.is_empty() {
        return Err(pricing_error(PricingError::Empty));
    }

    let ids: Vec<String> = items
        .iter()
        .map(|(id, _)| id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let images: HashMap<String, image::Model> = image::Entity::find()
        .filter(image::Column::GalleryId.eq(gallery_id))
        .filter(image::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|image| (image.id.clone(), image))
        .collect();

    let mut catalog = HashMap::with_capacity(images.len());
    for (id, image) in &images {
        let price = Money::from_minor(image.price)
            .map_err(|e| ApiError::internal(format!("image {id} has a corrupt price: {e}")))?;
        catalog.insert(id.clone(), price);
    }

    let priced = price_order(
        items.iter().map(|(id, quantity)| (id.as_str(), *quantity)),
        &catalog,
    )
    .map_err(pricing_error)?;

    Ok((priced, images))
}

/// Runs the whole checkout for one client request.
pub async fn start_checkout(
    state: &State,
    checkout: NewCheckout,
    now: NaiveDateTime,
) -> Result<CheckoutOutcome, ApiError> {
    let gateway = state
        .payments
        .clone()
        .ok_or_else(|| ApiError::service_unavailable("No payment provider configured"))?;

    let gallery = gallery::Entity::find_by_id(&checkout.gallery_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Gallery not found"))?;
    shutterlink::check_access(gallery.is_active, gallery.expires_at, now)
        .map_err(|denied| ApiError::from(GalleryAccessError::Denied(denied)))?;

    let (priced, images) = price_checkout(&state.db, &gallery.id, &checkout.items).await?;
    if priced.total.is_zero() {
        return Err(ApiError::bad_request("Nothing to pay for"));
    }

    let order_id = create_id();
    let client_name = checkout
        .client_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| gallery.client_name.clone());

    let record = order::ActiveModel {
        id: Set(order_id.clone()),
        gallery_id: Set(gallery.id.clone()),
        client_email: Set(checkout.client_email.clone()),
        client_name: Set(client_name),
        total: Set(priced.total.minor()),
        currency: Set(state.config.currency.to_ascii_uppercase()),
        status: Set(OrderStatus::AwaitingSession),
        stripe_session_id: Set(None),
        failure_reason: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        paid_at: Set(None),
    };
    let items: Vec<order_item::ActiveModel> = priced
        .lines
        .iter()
        .map(|line| order_item::ActiveModel {
            id: Set(create_id()),
            order_id: Set(order_id.clone()),
            image_id: Set(line.image_id.clone()),
            price: Set(line.unit_price.minor()),
            quantity: Set(line.quantity as i32),
        })
        .collect();

    state
        .db
        .transaction::<_, (), ApiError>(|txn| {
            Box::pin(async move {
                record.insert(txn).await?;
                order_item::Entity::insert_many(items)
                    .exec_without_returning(txn)
                    .await?;
                Ok(())
            })
        })
        .await?;

    tracing::info!(
        order_id = %order_id,
        gallery_id = %gallery.id,
        total = %priced.total,
        "Order awaiting payment session"
    );

    let description = format!("High-resolution photo from {}", gallery.name);
    let request = CheckoutSessionRequest {
        order_id: order_id.clone(),
        gallery_id: gallery.id.clone(),
        customer_email: checkout.client_email.clone(),
        currency: state.config.currency.to_ascii_lowercase(),
        success_url: state.config.checkout_success_url(&gallery.access_code),
        cancel_url: state.config.checkout_cancel_url(&gallery.access_code),
        line_items: priced
            .lines
            .iter()
            .map(|line| SessionLineItem {
                name: images
                    .get(&line.image_id)
                    .map(|image| image.filename.clone())
                    .unwrap_or_else(|| line.image_id.clone()),
                description: description.clone(),
                unit_amount: line.unit_price.minor(),
                quantity: u64::from(line.quantity),
            })
            .collect(),
    };

    let session = match gateway.create_checkout_session(request).await {
        Ok(session) => session,
        Err(err) => {
            let reason = err.to_string();
            if let Err(db_err) = mark_failed(&state.db, &order_id, &reason, now).await {
                // the sweep will pick the order up later
                tracing::error!(order_id = %order_id, error = %db_err, "Could not mark order failed");
            }
            metrics::counter!("checkout_orders_total", "outcome" => "failed").increment(1);
            return Err(ApiError::internal(format!(
                "Payment session for order {order_id} failed: {reason}"
            )));
        }
    };

    if !attach_session(&state.db, &order_id, &session.id, now).await? {
        metrics::counter!("checkout_orders_total", "outcome" => "failed").increment(1);
        return Err(ApiError::internal(format!(
            "Order {order_id} left awaiting_session before session {} was attached",
            session.id
        )));
    }

    metrics::counter!("checkout_orders_total", "outcome" => "pending").increment(1);
    tracing::info!(order_id = %order_id, session_id = %session.id, "Order pending payment");

    Ok(CheckoutOutcome {
        order_id,
        session_id: session.id,
        url: session.url,
        total: priced.total,
    })
}

/// Moves an order to `to` only if its current status allows it. Returns
/// whether the row changed.
async fn transition<C, F>(
    db: &C,
    filter: F,
    to: OrderStatus,
    now: NaiveDateTime,
    extra: impl FnOnce(UpdateMany<order::Entity>) -> UpdateMany<order::Entity>,
) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
    F: FnOnce(UpdateMany<order::Entity>) -> UpdateMany<order::Entity>,
{
    let update = order::Entity::update_many()
        .col_expr(order::Column::Status, Expr::value(to))
        .col_expr(order::Column::UpdatedAt, Expr::value(now))
        .filter(order::Column::Status.is_in(OrderStatus::sources_of(to)));
    let result = extra(filter(update)).exec(db).await?;
    Ok(result.rows_affected)
}

pub async fn attach_session<C: ConnectionTrait>(
    db: &C,
    order_id: &str,
    session_id: &str,
    now: NaiveDateTime,
) -> Result<bool, DbErr> {
    let changed = transition(
        db,
        |update| update.filter(order::Column::Id.eq(order_id)),
        OrderStatus::Pending,
        now,
        |update| {
            update.col_expr(
                order::Column::StripeSessionId,
                Expr::value(Some(session_id.to_string())),
            )
        },
    )
    .await?;
    Ok(changed > 0)
}

pub async fn mark_failed<C: ConnectionTrait>(
    db: &C,
    order_id: &str,
    reason: &str,
    now: NaiveDateTime,
) -> Result<bool, DbErr> {
    let changed = transition(
        db,
        |update| update.filter(order::Column::Id.eq(order_id)),
        OrderStatus::Failed,
        now,
        |update| {
            update.col_expr(
                order::Column::FailureReason,
                Expr::value(Some(reason.to_string())),
            )
        },
    )
    .await?;
    if changed > 0 {
        tracing::warn!(order_id, reason, "Order failed");
    }
    Ok(changed > 0)
}

/// Fails every order that has been waiting for a payment session longer
/// than `stale_after`. Returns how many orders were failed.
pub async fn reconcile_stale_orders<C: ConnectionTrait>(
    db: &C,
    stale_after: chrono::Duration,
    now: NaiveDateTime,
) -> Result<u64, DbErr> {
    let Some(cutoff) = now.checked_sub_signed(stale_after) else {
        tracing::warn!(
            ?stale_after,
            "Stale order threshold reaches before the earliest date, skipping sweep"
        );
        return Ok(0);
    };
    let failed = transition(
        db,
        |update| update.filter(order::Column::CreatedAt.lt(cutoff)),
        OrderStatus::Failed,
        now,
        |update| {
            update.col_expr(
                order::Column::FailureReason,
                Expr::value(Some(STALE_FAILURE_REASON.to_string())),
            )
        },
    )
    .await?;

    if failed > 0 {
        metrics::counter!("checkout_orders_total", "outcome" => "reconciled").increment(failed);
        tracing::warn!(failed, %cutoff, "Failed stale orders without a payment session");
    }
    Ok(failed)
}

async fn find_for_session<C: ConnectionTrait>(
    db: &C,
    session_id: &str,
    order_ref: Option<&str>,
) -> Result<Option<order::Model>, DbErr> {
    if let Some(order) = order::Entity::find()
        .filter(order::Column::StripeSessionId.eq(session_id))
        .one(db)
        .await?
    {
        return Ok(Some(order));
    }
    match order_ref {
        Some(id) => order::Entity::find_by_id(id).one(db).await,
        None => Ok(None),
    }
}

async fn settle<C: ConnectionTrait>(
    db: &C,
    session_id: &str,
    order_ref: Option<&str>,
    to: OrderStatus,
    now: NaiveDateTime,
) -> Result<Settlement, DbErr> {
    let Some(order) = find_for_session(db, session_id, order_ref).await? else {
        tracing::warn!(session_id, ?order_ref, "No order for checkout session");
        return Ok(Settlement::UnknownOrder);
    };

    let order_id = order.id.clone();
    let paid_at = (to == OrderStatus::Paid).then_some(now);
    let changed = transition(
        db,
        |update| update.filter(order::Column::Id.eq(order_id.as_str())),
        to,
        now,
        |update| match paid_at {
            Some(paid_at) => update.col_expr(order::Column::PaidAt, Expr::value(Some(paid_at))),
            None => update,
        },
    )
    .await?;

    if changed == 0 {
        tracing::info!(order_id = %order.id, status = ?order.status, target = ?to, "Order not settled");
        return Ok(Settlement::Skipped(order.status));
    }

    tracing::info!(order_id = %order.id, status = ?to, "Order settled");
    Ok(Settlement::Applied)
}

/// Payment went through for the session.
pub async fn complete_session<C: ConnectionTrait>(
    db: &C,
    session_id: &str,
    order_ref: Option<&str>,
    now: NaiveDateTime,
) -> Result<Settlement, DbErr> {
    let settlement = settle(db, session_id, order_ref, OrderStatus::Paid, now).await?;
    if settlement == Settlement::Applied {
        metrics::counter!("checkout_orders_total", "outcome" => "paid").increment(1);
    }
    Ok(settlement)
}

/// The hosted session lapsed without payment.
pub async fn expire_session<C: ConnectionTrait>(
    db: &C,
    session_id: &str,
    order_ref: Option<&str>,
    now: NaiveDateTime,
) -> Result<Settlement, DbErr> {
    let settlement = settle(db, session_id, order_ref, OrderStatus::Expired, now).await?;
    if settlement == Settlement::Applied {
        metrics::counter!("checkout_orders_total", "outcome" => "expired").increment(1);
    }
    Ok(settlement)
}
