//! Order requests service. A request is shown to every seller organization
//! whose product categories match at least one of its items.

use std::collections::{BTreeSet, HashMap};

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{
    match_organizations, FromCartPayload, ItemDimensions, NewNotification, NewOrderRequest, NewOrderRequestPayload, NewRequestItem,
    OrderRequest, OrderRequestWithProducts, Organization, Pagination, RequestProduct, TransformOrdersReport,
};
use repos::{NotificationsRepo, OffersRepo, OrderRequestsRepo, OrganizationsRepo, ProductsRepo, ReposFactory, RepoResult};
use services::types::ServiceFuture;
use services::{current_user, found, invalid, validation_failed, Service};
use types::{IdList, OrderRequestId, OrderRequestStatus, OrganizationId, ProductId, UserId};

/// Requests that sellers may still answer
pub const MATCHABLE_STATUSES: &[OrderRequestStatus] = &[OrderRequestStatus::Open, OrderRequestStatus::Processed];

pub trait OrderRequestsService {
    /// Creates request, matches it with sellers and notifies them
    fn create_order_request(&self, payload: NewOrderRequestPayload) -> ServiceFuture<OrderRequestWithProducts>;
    /// Turns the cart of the current user into a request and clears the cart
    fn create_order_request_from_cart(&self, payload: FromCartPayload) -> ServiceFuture<OrderRequestWithProducts>;
    fn get_order_request(&self, id: OrderRequestId) -> ServiceFuture<Option<OrderRequestWithProducts>>;
    fn list_customer_order_requests(&self, pagination: Pagination) -> ServiceFuture<Vec<OrderRequest>>;
    /// Requests matched with the organization
    fn list_seller_order_requests(&self, organization_id: OrganizationId, pagination: Pagination) -> ServiceFuture<Vec<OrderRequest>>;
    fn cancel_order_request(&self, id: OrderRequestId) -> ServiceFuture<OrderRequest>;
    /// Recomputes the sellers of every open request
    fn transform_orders(&self) -> ServiceFuture<TransformOrdersReport>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > OrderRequestsService for Service<T, M, F>
{
    fn create_order_request(&self, payload: NewOrderRequestPayload) -> ServiceFuture<OrderRequestWithProducts> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            let notifications_repo = repo_factory.create_notifications_repo_with_sys_acl(&*conn);
            conn.transaction::<OrderRequestWithProducts, FailureError, _>(move || {
                let customer_id = current_user(user_id)?;
                place_order_request(
                    &*products_repo,
                    &*organizations_repo,
                    &*order_requests_repo,
                    &*notifications_repo,
                    customer_id,
                    payload,
                )
            }).map_err(|e| e.context("Service OrderRequests, create endpoint error occurred.").into())
        })
    }

    fn create_order_request_from_cart(&self, payload: FromCartPayload) -> ServiceFuture<OrderRequestWithProducts> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let cart_repo = repo_factory.create_cart_products_repo(&*conn, user_id);
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            let notifications_repo = repo_factory.create_notifications_repo_with_sys_acl(&*conn);
            conn.transaction::<OrderRequestWithProducts, FailureError, _>(move || {
                let customer_id = current_user(user_id)?;
                let cart = cart_repo.list_for_user(customer_id)?;
                if cart.is_empty() {
                    return Err(invalid("cart", "Cart is empty", format!("Cart of user {} is empty.", customer_id)));
                }
                let request_payload = NewOrderRequestPayload {
                    comment: payload.comment,
                    delivery_address: payload.delivery_address,
                    items: cart.iter().map(NewRequestItem::from).collect(),
                };
                let request = place_order_request(
                    &*products_repo,
                    &*organizations_repo,
                    &*order_requests_repo,
                    &*notifications_repo,
                    customer_id,
                    request_payload,
                )?;
                cart_repo.clear(customer_id)?;
                Ok(request)
            }).map_err(|e| e.context("Service OrderRequests, create_from_cart endpoint error occurred.").into())
        })
    }

    fn get_order_request(&self, id: OrderRequestId) -> ServiceFuture<Option<OrderRequestWithProducts>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            order_requests_repo
                .find(id)
                .and_then(|request| match request {
                    Some(order_request) => order_requests_repo
                        .list_products(order_request.id)
                        .map(|products| Some(OrderRequestWithProducts { order_request, products })),
                    None => Ok(None),
                }).map_err(|e| e.context("Service OrderRequests, get endpoint error occurred.").into())
        })
    }

    fn list_customer_order_requests(&self, pagination: Pagination) -> ServiceFuture<Vec<OrderRequest>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            current_user(user_id)
                .and_then(|customer_id| order_requests_repo.list_for_customer(customer_id, pagination))
                .map_err(|e: FailureError| e.context("Service OrderRequests, list_for_customer endpoint error occurred.").into())
        })
    }

    fn list_seller_order_requests(&self, organization_id: OrganizationId, pagination: Pagination) -> ServiceFuture<Vec<OrderRequest>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            organizations_repo
                .find(organization_id)
                .and_then(|organization| found(organization, "Organization", organization_id))
                .and_then(|organization| order_requests_repo.list_for_organization(organization.id, pagination))
                .map_err(|e: FailureError| e.context("Service OrderRequests, list_for_seller endpoint error occurred.").into())
        })
    }

    fn cancel_order_request(&self, id: OrderRequestId) -> ServiceFuture<OrderRequest> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            conn.transaction::<OrderRequest, FailureError, _>(move || {
                let request = found(order_requests_repo.find(id)?, "Order request", id)?;
                if !request.status.can_transition_to(OrderRequestStatus::Canceled) {
                    return Err(invalid(
                        "status",
                        "Order request can not be canceled",
                        format!("Order request {} is {}.", id, request.status),
                    ));
                }
                order_requests_repo
                    .set_status(id, request.status, OrderRequestStatus::Canceled)?
                    .ok_or_else(|| {
                        invalid(
                            "status",
                            "Order request can not be canceled",
                            format!("Order request {} changed its status concurrently.", id),
                        )
                    })
            }).map_err(|e| e.context("Service OrderRequests, cancel endpoint error occurred.").into())
        })
    }

    fn transform_orders(&self) -> ServiceFuture<TransformOrdersReport> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            let notifications_repo = repo_factory.create_notifications_repo_with_sys_acl(&*conn);
            conn.transaction::<TransformOrdersReport, FailureError, _>(move || {
                let organizations = organizations_repo.list_active()?;
                let mut report = TransformOrdersReport::default();
                for request in order_requests_repo.list_by_statuses(&[OrderRequestStatus::Open])? {
                    report.requests_scanned += 1;
                    let products = order_requests_repo.list_products(request.id)?;
                    let items = item_dimensions(&*products_repo, &products)?;
                    let sellers = rematch_sellers(&*offers_repo, &request, &organizations, &items)?;
                    if sellers == request.seller_ids.normalized() {
                        continue;
                    }

                    let added = sellers
                        .ids::<OrganizationId>()
                        .into_iter()
                        .filter(|id| !request.is_matched_with(*id))
                        .collect::<Vec<_>>();
                    let request = order_requests_repo.set_seller_ids(request.id, sellers)?;
                    notify_sellers(&*notifications_repo, &organizations, &added, &request)?;
                    report.requests_changed += 1;
                }
                info!(
                    "Order requests transformed, {} scanned, {} changed.",
                    report.requests_scanned, report.requests_changed
                );
                Ok(report)
            }).map_err(|e| e.context("Service OrderRequests, transform_orders endpoint error occurred.").into())
        })
    }
}

/// Matching dimensions of the request items
pub fn item_dimensions(products_repo: &ProductsRepo, items: &[RequestProduct]) -> RepoResult<Vec<ItemDimensions>> {
    let product_ids = items.iter().filter_map(|item| item.product_id).collect::<Vec<ProductId>>();
    let products = products_repo
        .find_many(&product_ids)?
        .into_iter()
        .map(|product| (product.id, product))
        .collect::<HashMap<_, _>>();
    Ok(items
        .iter()
        .map(|item| ItemDimensions::of_request_product(item, item.product_id.and_then(|id| products.get(&id))))
        .collect())
}

/// Matching dimensions of the items of a stored request
pub fn request_items(
    order_requests_repo: &OrderRequestsRepo,
    products_repo: &ProductsRepo,
    order_request_id: OrderRequestId,
) -> RepoResult<Vec<ItemDimensions>> {
    let products = order_requests_repo.list_products(order_request_id)?;
    item_dimensions(products_repo, &products)
}

/// Matching organizations plus those that already made an offer
fn rematch_sellers(
    offers_repo: &OffersRepo,
    request: &OrderRequest,
    organizations: &[Organization],
    items: &[ItemDimensions],
) -> RepoResult<IdList> {
    let mut sellers = match_organizations(organizations, items);
    for organization_id in request.seller_ids.ids::<OrganizationId>() {
        if !sellers.contains(organization_id) && offers_repo.exists_for_organization(request.id, organization_id)? {
            sellers.add(organization_id);
        }
    }
    Ok(sellers.normalized())
}

fn notify_sellers(
    notifications_repo: &NotificationsRepo,
    organizations: &[Organization],
    seller_ids: &[OrganizationId],
    request: &OrderRequest,
) -> RepoResult<()> {
    let owners = organizations
        .iter()
        .filter(|organization| seller_ids.contains(&organization.id))
        .map(|organization| organization.user_id)
        .filter(|owner| *owner != request.customer_id)
        .collect::<BTreeSet<UserId>>();
    if owners.is_empty() {
        return Ok(());
    }
    notifications_repo.create_many(
        owners
            .into_iter()
            .map(|owner| NewNotification::new_order_request(owner, request))
            .collect(),
    )?;
    Ok(())
}

fn place_order_request(
    products_repo: &ProductsRepo,
    organizations_repo: &OrganizationsRepo,
    order_requests_repo: &OrderRequestsRepo,
    notifications_repo: &NotificationsRepo,
    customer_id: UserId,
    payload: NewOrderRequestPayload,
) -> Result<OrderRequestWithProducts, FailureError> {
    payload.validate_all().map_err(validation_failed)?;

    let product_ids = payload.items.iter().filter_map(|item| item.product_id).collect::<Vec<ProductId>>();
    let products = products_repo
        .find_many(&product_ids)?
        .into_iter()
        .map(|product| (product.id, product))
        .collect::<HashMap<_, _>>();
    for product_id in &product_ids {
        let product = found(products.get(product_id), "Product", product_id)?;
        if !product.is_active {
            return Err(invalid(
                "product_id",
                "Product is not available",
                format!("Product {} is deactivated.", product_id),
            ));
        }
    }

    let items = payload
        .items
        .iter()
        .map(|item| {
            let product = item.product_id.and_then(|id| products.get(&id));
            ItemDimensions::new(item.auto_type_id, item.auto_brand_id, item.group_id, product)
        }).collect::<Vec<_>>();
    let organizations = organizations_repo.list_active()?;
    let seller_ids = match_organizations(&organizations, &items);

    let order_request = order_requests_repo.create(NewOrderRequest {
        customer_id,
        status: OrderRequestStatus::Open,
        comment: payload.comment,
        delivery_address: payload.delivery_address,
        seller_ids: seller_ids.clone(),
    })?;
    let new_products = payload
        .items
        .into_iter()
        .map(|item| {
            let product = item.product_id.and_then(|id| products.get(&id));
            item.into_new(order_request.id, product)
        }).collect();
    let products = order_requests_repo.create_products(order_request.id, new_products)?;

    notify_sellers(notifications_repo, &organizations, &seller_ids.ids::<OrganizationId>(), &order_request)?;
    info!(
        "Order request {} of user {} matched with sellers {:?}.",
        order_request.id,
        customer_id,
        seller_ids.as_slice()
    );
    Ok(OrderRequestWithProducts { order_request, products })
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::order_requests::OrderRequestsService;
    use types::*;

    fn item(product_id: i32, quantity: i32) -> NewRequestItem {
        NewRequestItem {
            product_id: Some(ProductId(product_id)),
            name: None,
            article: None,
            quantity,
            auto_type_id: None,
            auto_brand_id: None,
            group_id: None,
        }
    }

    fn payload(items: Vec<NewRequestItem>) -> NewOrderRequestPayload {
        NewOrderRequestPayload {
            comment: Some("Need it this week".to_string()),
            delivery_address: None,
            items,
        }
    }

    #[test]
    fn test_create_order_request_matches_sellers() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.create_order_request(payload(vec![item(1, 2)]))).unwrap();
        assert_eq!(result.order_request.customer_id, MOCK_USER_ID);
        assert_eq!(result.order_request.status, OrderRequestStatus::Open);
        assert_eq!(result.order_request.seller_ids.as_slice(), &[1]);
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].name, "Product 1");
    }

    #[test]
    fn test_free_form_item_matches_every_seller() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let free_form = NewRequestItem {
            product_id: None,
            name: Some("Timing belt".to_string()),
            ..item(1, 1)
        };
        let result = core.run(service.create_order_request(payload(vec![free_form]))).unwrap();
        assert_eq!(result.order_request.seller_ids.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_create_order_request_validation() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core.run(service.create_order_request(payload(vec![]))).unwrap_err();
        assert!(is_validation_error(&err));
        let err = core
            .run(service.create_order_request(payload(vec![item(MOCK_INACTIVE_PRODUCT_ID.0, 1)])))
            .unwrap_err();
        assert!(is_validation_error(&err));
        let err = core.run(service.create_order_request(payload(vec![item(MOCK_MISSING_ID, 1)]))).unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_create_order_request_from_cart() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.create_order_request_from_cart(FromCartPayload::default())).unwrap();
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].product_id, Some(ProductId(1)));
    }

    #[test]
    fn test_cancel_order_request() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.cancel_order_request(OrderRequestId(1))).unwrap();
        assert_eq!(result.status, OrderRequestStatus::Canceled);

        let err = core.run(service.cancel_order_request(MOCK_CLOSED_ORDER_REQUEST_ID)).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_transform_orders_adds_matching_sellers() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let report = core.run(service.transform_orders()).unwrap();
        assert_eq!(
            report,
            TransformOrdersReport {
                requests_scanned: 1,
                requests_changed: 1,
            }
        );
    }

    #[test]
    fn test_get_order_request() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.get_order_request(OrderRequestId(1))).unwrap().unwrap();
        assert_eq!(result.products.len(), 2);
        let missing = core.run(service.get_order_request(OrderRequestId(MOCK_MISSING_ID))).unwrap();
        assert!(missing.is_none());
    }
}
