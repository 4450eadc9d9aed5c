//! Saving a draft order: the party is reconciled first, then the order is
//! written against the party id the server returned.

use metrics::counter;
use thiserror::Error;
use validator::Validate;

use crate::api::{ApiError, CrudApi, Entity, Resource};
use crate::draft::DraftOrder;
use crate::forms::{classify, FieldErrors, FormFeedback};
use crate::models::{OrderKind, OrderRecord, PartyRecord};

/// Field a duplicate vendor or customer is reported against.
pub const PARTY_CONFLICT_FIELD: &str = "name";
/// Field a duplicate order is reported against.
pub const ORDER_CONFLICT_FIELD: &str = "invoiceNumber";

/// Which sub-form a submission failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Party,
    Order,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Order has no line items")]
    EmptyOrder,

    #[error("Party details are invalid")]
    InvalidParty(FieldErrors),

    #[error("Saving the party failed: {0}")]
    Party(ApiError),

    #[error("Saving the order failed: {0}")]
    Order(ApiError),
}

impl SubmitError {
    pub fn target(&self) -> FormTarget {
        match self {
            SubmitError::InvalidParty(_) | SubmitError::Party(_) => FormTarget::Party,
            SubmitError::EmptyOrder | SubmitError::Order(_) => FormTarget::Order,
        }
    }

    pub fn feedback(&self) -> FormFeedback {
        match self {
            SubmitError::EmptyOrder => {
                let mut fields = FieldErrors::new();
                fields.insert("products", "Add at least one product");
                FormFeedback::Fields(fields)
            }
            SubmitError::InvalidParty(fields) => FormFeedback::Fields(fields.clone()),
            SubmitError::Party(error) => classify(error, PARTY_CONFLICT_FIELD),
            SubmitError::Order(error) => classify(error, ORDER_CONFLICT_FIELD),
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Submitted<K: OrderKind> {
    pub order: K::Order,
    pub party: Option<K::Party>,
    /// Permanent page route of the saved order, e.g. `/sales-orders/abc`.
    pub route: String,
}

/// Persist `draft` through `api`.
///
/// A party failure returns before any order call and leaves the draft as it
/// was. An edited order with no party attached keeps its current party. Once the party is saved its id is written back to the draft, so a
/// retry after an order failure updates the party instead of duplicating it.
#[tracing::instrument(skip_all, fields(kind = K::NAME, draft_id = ?draft.id()))]
pub async fn submit<K, A>(draft: &mut DraftOrder<K>, api: &A) -> Result<Submitted<K>, SubmitError>
where
    K: OrderKind,
    A: CrudApi<K::Party> + CrudApi<K::Order>,
{
    if draft.is_empty() {
        return Err(SubmitError::EmptyOrder);
    }

    let party = match draft.party() {
        Some(pending) => {
            pending
                .contact
                .validate()
                .map_err(|e| SubmitError::InvalidParty(FieldErrors::from(&e)))?;

            let record = K::Party::from_draft(pending);
            let saved = match pending.id.as_deref() {
                Some(id) => <A as CrudApi<K::Party>>::update(api, id, &record).await,
                None => <A as CrudApi<K::Party>>::create(api, &record).await,
            }
            .map_err(|e| {
                tracing::warn!(error = %e, "Party reconciliation failed");
                SubmitError::Party(e)
            })?;

            let id = saved
                .id()
                .map(str::to_string)
                .ok_or(SubmitError::Party(ApiError::MissingId(K::Party::PATH)))?;
            Some((id, saved))
        }
        None => None,
    };

    let party_id = match &party {
        Some((id, _)) => {
            draft.set_party_id(id.clone());
            Some(id.clone())
        }
        None => draft.party_id().map(str::to_string),
    };

    let existing = draft.id().map(str::to_string);
    let order = K::Order::from_parts(existing.clone(), party_id, draft.body());
    let saved = match existing.as_deref() {
        Some(id) => <A as CrudApi<K::Order>>::update(api, id, &order).await,
        None => <A as CrudApi<K::Order>>::create(api, &order).await,
    }
    .map_err(|e| {
        tracing::warn!(error = %e, "Order submission failed");
        SubmitError::Order(e)
    })?;

    let id = saved
        .id()
        .map(str::to_string)
        .ok_or(SubmitError::Order(ApiError::MissingId(K::Order::PATH)))?;
    draft.set_id(id.clone());
    draft.commit_stock();

    let action = if existing.is_some() { "updated" } else { "created" };
    counter!("inventory_orders_submitted_total", "kind" => K::NAME, "action" => action)
        .increment(1);
    tracing::info!(order_id = %id, action, "Order saved");

    Ok(Submitted {
        route: format!("{}/{}", K::ROUTE, id),
        order: saved,
        party: party.map(|(_, saved)| saved),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorBody;

    #[test]
    fn test_party_failures_target_party_form() {
        let error = SubmitError::Party(ApiError::Rejected {
            status: 409,
            body: ErrorBody::new("Vendor already exists"),
        });

        assert_eq!(error.target(), FormTarget::Party);
        assert_eq!(
            error.feedback(),
            FormFeedback::Conflict {
                field: "name".to_string(),
                message: "Vendor already exists".to_string(),
            }
        );
    }

    #[test]
    fn test_order_conflict_pins_invoice_number() {
        let error = SubmitError::Order(ApiError::Rejected {
            status: 409,
            body: ErrorBody::new("Duplicate invoice"),
        });

        assert_eq!(error.target(), FormTarget::Order);
        let FormFeedback::Conflict { field, .. } = error.feedback() else {
            panic!("expected conflict");
        };
        assert_eq!(field, "invoiceNumber");
    }

    #[test]
    fn test_empty_order_points_at_products() {
        let FormFeedback::Fields(fields) = SubmitError::EmptyOrder.feedback() else {
            panic!("expected field errors");
        };
        assert_eq!(fields.get("products"), Some("Add at least one product"));
    }

    #[test]
    fn test_transport_failure_is_transient() {
        let error = SubmitError::Order(ApiError::Transport("reset".to_string()));
        assert!(matches!(error.feedback(), FormFeedback::Transient(_)));
    }
}
