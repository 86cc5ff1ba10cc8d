//! Offers service. Sellers answer order requests with offers, the customer
//! accepts one offer per seller and gets an order for it.

use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{total_price, NewNotification, NewOfferPayload, NewOrder, Offer, OfferWithProducts, Order, OrderRequest};
use repos::{OffersRepo, OrderRequestsRepo, ReposFactory, RepoResult};
use services::types::ServiceFuture;
use services::{current_user, forbidden, found, invalid, validation_failed, Service};
use types::{OfferId, OfferStatus, OrderRequestId, OrderRequestStatus, RequestProductId, UserId};

pub trait OffersService {
    /// Creates offer of a seller organization and notifies the customer
    fn create_offer(&self, payload: NewOfferPayload) -> ServiceFuture<OfferWithProducts>;
    fn get_offer(&self, id: OfferId) -> ServiceFuture<Option<OfferWithProducts>>;
    fn list_request_offers(&self, order_request_id: OrderRequestId) -> ServiceFuture<Vec<OfferWithProducts>>;
    /// Accepts pending offer and creates an order from it
    fn accept_offer(&self, id: OfferId) -> ServiceFuture<Order>;
    fn reject_offer(&self, id: OfferId) -> ServiceFuture<Offer>;
}

/// Request of the offer, checked to belong to the customer
fn customer_request(order_requests_repo: &OrderRequestsRepo, offer: &Offer, customer_id: UserId) -> Result<OrderRequest, FailureError> {
    let request = found(
        order_requests_repo.find(offer.order_request_id)?,
        "Order request",
        offer.order_request_id,
    )?;
    if request.customer_id != customer_id {
        return Err(forbidden(format!(
            "User {} is not the customer of order request {}.",
            customer_id, request.id
        )));
    }
    Ok(request)
}

fn check_pending(offer: &Offer) -> Result<(), FailureError> {
    if offer.status != OfferStatus::Pending {
        return Err(invalid("status", "Offer is not pending", format!("Offer {} is {}.", offer.id, offer.status)));
    }
    Ok(())
}

/// Pending offer moved on by another request in the meantime
fn no_longer_pending(id: OfferId) -> FailureError {
    invalid("status", "Offer is not pending", format!("Offer {} is no longer pending.", id))
}

fn offer_with_products(offers_repo: &OffersRepo, offer: Offer) -> RepoResult<OfferWithProducts> {
    let products = offers_repo.list_products(offer.id)?;
    Ok(OfferWithProducts::new(offer, products))
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > OffersService for Service<T, M, F>
{
    fn create_offer(&self, payload: NewOfferPayload) -> ServiceFuture<OfferWithProducts> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let ttl = Duration::from_secs(self.static_context.config.marketplace.offer_ttl_sec);

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            let notifications_repo = repo_factory.create_notifications_repo_with_sys_acl(&*conn);
            conn.transaction::<OfferWithProducts, FailureError, _>(move || {
                let seller_id = current_user(user_id)?;
                payload.validate_all().map_err(validation_failed)?;

                let organization = found(
                    organizations_repo.find(payload.organization_id)?,
                    "Organization",
                    payload.organization_id,
                )?;
                if organization.user_id != seller_id {
                    return Err(forbidden(format!(
                        "User {} does not own organization {}.",
                        seller_id, organization.id
                    )));
                }
                let request = found(
                    order_requests_repo.find(payload.order_request_id)?,
                    "Order request",
                    payload.order_request_id,
                )?;
                if !request.status.accepts_offers() {
                    return Err(invalid(
                        "order_request_id",
                        "Order request does not accept offers",
                        format!("Order request {} is {}.", request.id, request.status),
                    ));
                }
                if !request.is_matched_with(organization.id) {
                    return Err(forbidden(format!(
                        "Organization {} is not matched with order request {}.",
                        organization.id, request.id
                    )));
                }
                if offers_repo.find_pending(request.id, organization.id)?.is_some() {
                    return Err(invalid(
                        "order_request_id",
                        "Organization already has a pending offer",
                        format!("Organization {} already has a pending offer on order request {}.", organization.id, request.id),
                    ));
                }
                let requested = order_requests_repo
                    .list_products(request.id)?
                    .into_iter()
                    .map(|product| product.id)
                    .collect::<HashSet<RequestProductId>>();
                if let Some(item) = payload.items.iter().find(|item| !requested.contains(&item.request_product_id)) {
                    return Err(invalid(
                        "items",
                        "Item does not belong to the order request",
                        format!("Requested item {} is not in order request {}.", item.request_product_id, request.id),
                    ));
                }

                let offer = offers_repo.create(payload.new_offer(seller_id, SystemTime::now(), ttl))?;
                let products = offers_repo.create_products(offer.id, payload.items.into_iter().map(|item| item.into_new(offer.id)).collect())?;
                notifications_repo.create(NewNotification::new_offer(request.customer_id, &offer))?;
                info!("Offer {} of organization {} created on order request {}.", offer.id, organization.id, request.id);
                Ok(OfferWithProducts::new(offer, products))
            }).map_err(|e| e.context("Service Offers, create endpoint error occurred.").into())
        })
    }

    fn get_offer(&self, id: OfferId) -> ServiceFuture<Option<OfferWithProducts>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            offers_repo
                .find(id)
                .and_then(|offer| match offer {
                    Some(offer) => offer_with_products(&*offers_repo, offer).map(Some),
                    None => Ok(None),
                }).map_err(|e| e.context("Service Offers, get endpoint error occurred.").into())
        })
    }

    fn list_request_offers(&self, order_request_id: OrderRequestId) -> ServiceFuture<Vec<OfferWithProducts>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            order_requests_repo
                .find(order_request_id)
                .and_then(|request| found(request, "Order request", order_request_id))
                .and_then(|request| offers_repo.list_for_request(request.id))
                .and_then(|offers| {
                    offers
                        .into_iter()
                        .map(|offer| offer_with_products(&*offers_repo, offer))
                        .collect::<RepoResult<Vec<_>>>()
                }).map_err(|e: FailureError| e.context("Service Offers, list_for_request endpoint error occurred.").into())
        })
    }

    fn accept_offer(&self, id: OfferId) -> ServiceFuture<Order> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            let orders_repo = repo_factory.create_orders_repo(&*conn, user_id);
            let notifications_repo = repo_factory.create_notifications_repo_with_sys_acl(&*conn);
            conn.transaction::<Order, FailureError, _>(move || {
                let customer_id = current_user(user_id)?;
                let offer = found(offers_repo.find(id)?, "Offer", id)?;
                let request = customer_request(&*order_requests_repo, &offer, customer_id)?;
                check_pending(&offer)?;
                if offer.is_expired_at(SystemTime::now()) {
                    return Err(invalid("status", "Offer is expired", format!("Offer {} is expired.", offer.id)));
                }
                if !request.status.accepts_offers() {
                    return Err(invalid(
                        "order_request_id",
                        "Order request does not accept offers",
                        format!("Order request {} is {}.", request.id, request.status),
                    ));
                }

                let products = offers_repo.list_products(offer.id)?;
                let offer = offers_repo
                    .set_status(offer.id, OfferStatus::Pending, OfferStatus::Accepted)?
                    .ok_or_else(|| no_longer_pending(id))?;
                if request.status == OrderRequestStatus::Open
                    && order_requests_repo
                        .set_status(request.id, OrderRequestStatus::Open, OrderRequestStatus::Processed)?
                        .is_none()
                {
                    let current = found(order_requests_repo.find(request.id)?, "Order request", request.id)?;
                    if !current.status.accepts_offers() {
                        return Err(invalid(
                            "order_request_id",
                            "Order request does not accept offers",
                            format!("Order request {} is {}.", current.id, current.status),
                        ));
                    }
                }
                let order = orders_repo.create(NewOrder::from_offer(&offer, customer_id, total_price(&products)))?;
                notifications_repo.create(NewNotification::offer_accepted(&offer, &order))?;
                info!("Offer {} accepted, order {} created.", offer.id, order.id);
                Ok(order)
            }).map_err(|e| e.context("Service Offers, accept endpoint error occurred.").into())
        })
    }

    fn reject_offer(&self, id: OfferId) -> ServiceFuture<Offer> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            let notifications_repo = repo_factory.create_notifications_repo_with_sys_acl(&*conn);
            conn.transaction::<Offer, FailureError, _>(move || {
                let customer_id = current_user(user_id)?;
                let offer = found(offers_repo.find(id)?, "Offer", id)?;
                customer_request(&*order_requests_repo, &offer, customer_id)?;
                check_pending(&offer)?;
                let offer = offers_repo
                    .set_status(offer.id, OfferStatus::Pending, OfferStatus::Rejected)?
                    .ok_or_else(|| no_longer_pending(id))?;
                notifications_repo.create(NewNotification::offer_rejected(&offer))?;
                Ok(offer)
            }).map_err(|e| e.context("Service Offers, reject endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::offers::OffersService;
    use types::*;

    fn payload(organization_id: OrganizationId, request_product_ids: Vec<i32>) -> NewOfferPayload {
        NewOfferPayload {
            order_request_id: OrderRequestId(1),
            organization_id,
            delivery_days: 2,
            comment: None,
            items: request_product_ids
                .into_iter()
                .map(|id| NewOfferItem {
                    request_product_id: RequestProductId(id),
                    price: ProductPrice(12.0),
                    quantity: 2,
                }).collect(),
        }
    }

    #[test]
    fn test_create_offer() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.create_offer(payload(OrganizationId(1), vec![1, 2]))).unwrap();
        assert_eq!(result.offer.status, OfferStatus::Pending);
        assert_eq!(result.offer.seller_id, MOCK_USER_ID);
        assert_eq!(result.products.len(), 2);
        assert_eq!(result.total_price, ProductPrice(48.0));
    }

    #[test]
    fn test_create_offer_checks_organization_and_items() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core.run(service.create_offer(payload(MOCK_FOREIGN_ORGANIZATION_ID, vec![1]))).unwrap_err();
        assert!(is_forbidden(&err));
        let err = core.run(service.create_offer(payload(OrganizationId(1), vec![7]))).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_unmatched_organization_can_not_offer() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_OTHER_USER_ID), handle);
        let err = core.run(service.create_offer(payload(MOCK_FOREIGN_ORGANIZATION_ID, vec![1]))).unwrap_err();
        assert!(is_forbidden(&err));
    }

    #[test]
    fn test_accept_offer_creates_order() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let order = core.run(service.accept_offer(OfferId(1))).unwrap();
        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.customer_id, MOCK_USER_ID);
        assert_eq!(order.offer_id, OfferId(1));
        assert_eq!(order.total_price, ProductPrice(25.25));
    }

    #[test]
    fn test_expired_offer_can_not_be_accepted() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core.run(service.accept_offer(MOCK_EXPIRED_OFFER_ID)).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_offer_decided_concurrently_is_refused() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core.run(service.accept_offer(MOCK_RACED_OFFER_ID)).unwrap_err();
        assert!(is_validation_error(&err));
        let err = core.run(service.reject_offer(MOCK_RACED_OFFER_ID)).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_only_customer_decides_on_offer() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_OTHER_USER_ID), handle);
        let err = core.run(service.accept_offer(OfferId(1))).unwrap_err();
        assert!(is_forbidden(&err));
        let err = core.run(service.reject_offer(OfferId(1))).unwrap_err();
        assert!(is_forbidden(&err));
    }

    #[test]
    fn test_reject_offer() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let offer = core.run(service.reject_offer(OfferId(1))).unwrap();
        assert_eq!(offer.status, OfferStatus::Rejected);
    }

    #[test]
    fn test_list_request_offers() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let offers = core.run(service.list_request_offers(OrderRequestId(1))).unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].total_price, ProductPrice(25.25));
        let err = core.run(service.list_request_offers(OrderRequestId(MOCK_MISSING_ID))).unwrap_err();
        assert!(is_not_found(&err));
    }
}
