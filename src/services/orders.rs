//! Orders service

use std::time::SystemTime;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{NewNotification, Order, OrderWithProducts, Pagination, SetOrderStatusPayload, UpdateOrderStatus};
use repos::{OrderRequestsRepo, OrdersRepo, ReposFactory, RepoResult};
use services::types::ServiceFuture;
use services::{current_user, found, invalid, Service};
use types::{OrderId, OrderRequestId, OrderRequestStatus, OrderStatus, OrganizationId};

pub trait OrdersService {
    fn get_order(&self, id: OrderId) -> ServiceFuture<Option<OrderWithProducts>>;
    fn list_customer_orders(&self, pagination: Pagination) -> ServiceFuture<Vec<Order>>;
    fn list_seller_orders(&self, organization_id: OrganizationId, pagination: Pagination) -> ServiceFuture<Vec<Order>>;
    /// Moves the order along its status machine and notifies the other party
    fn set_order_status(&self, id: OrderId, payload: SetOrderStatusPayload) -> ServiceFuture<Order>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > OrdersService for Service<T, M, F>
{
    fn get_order(&self, id: OrderId) -> ServiceFuture<Option<OrderWithProducts>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            orders_repo
                .find(id)
                .and_then(|order| match order {
                    Some(order) => offers_repo
                        .list_products(order.offer_id)
                        .map(|products| Some(OrderWithProducts { order, products })),
                    None => Ok(None),
                }).map_err(|e| e.context("Service Orders, get endpoint error occurred.").into())
        })
    }

    fn list_customer_orders(&self, pagination: Pagination) -> ServiceFuture<Vec<Order>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, user_id);
            current_user(user_id)
                .and_then(|customer_id| orders_repo.list_for_customer(customer_id, pagination))
                .map_err(|e: FailureError| e.context("Service Orders, list_for_customer endpoint error occurred.").into())
        })
    }

    fn list_seller_orders(&self, organization_id: OrganizationId, pagination: Pagination) -> ServiceFuture<Vec<Order>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            let orders_repo = repo_factory.create_orders_repo(&*conn, user_id);
            organizations_repo
                .find(organization_id)
                .and_then(|organization| found(organization, "Organization", organization_id))
                .and_then(|organization| orders_repo.list_for_organization(organization.id, pagination))
                .map_err(|e: FailureError| e.context("Service Orders, list_for_seller endpoint error occurred.").into())
        })
    }

    fn set_order_status(&self, id: OrderId, payload: SetOrderStatusPayload) -> ServiceFuture<Order> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, user_id);
            let all_orders_repo = repo_factory.create_orders_repo_with_sys_acl(&*conn);
            let order_requests_repo = repo_factory.create_order_requests_repo_with_sys_acl(&*conn);
            let notifications_repo = repo_factory.create_notifications_repo_with_sys_acl(&*conn);
            conn.transaction::<Order, FailureError, _>(move || {
                let current = current_user(user_id)?;
                let order = found(orders_repo.find(id)?, "Order", id)?;
                if !order.status.can_transition_to(payload.status) {
                    return Err(invalid(
                        "status",
                        "Order status can not be changed this way",
                        format!("Order {} can not go from {} to {}.", id, order.status, payload.status),
                    ));
                }

                let completed_at = if payload.status == OrderStatus::Completed {
                    Some(SystemTime::now())
                } else {
                    order.completed_at
                };
                let order = orders_repo.set_status(
                    id,
                    UpdateOrderStatus {
                        status: payload.status,
                        completed_at,
                    },
                )?;
                if order.status.is_final() {
                    complete_request(&*all_orders_repo, &*order_requests_repo, order.order_request_id)?;
                }

                let other_party = if current == order.customer_id {
                    order.seller_id
                } else {
                    order.customer_id
                };
                notifications_repo.create(NewNotification::order_status_changed(other_party, &order))?;
                info!("Order {} is {} now.", order.id, order.status);
                Ok(order)
            }).map_err(|e| e.context("Service Orders, set_status endpoint error occurred.").into())
        })
    }
}

/// Processed request is completed once all its orders are completed or canceled
fn complete_request(orders_repo: &OrdersRepo, order_requests_repo: &OrderRequestsRepo, order_request_id: OrderRequestId) -> RepoResult<()> {
    let orders = orders_repo.list_for_request(order_request_id)?;
    if !orders.iter().all(|order| order.status.is_final()) {
        return Ok(());
    }
    match order_requests_repo.find(order_request_id)? {
        Some(ref request) if request.status == OrderRequestStatus::Processed => {
            if order_requests_repo
                .set_status(request.id, OrderRequestStatus::Processed, OrderRequestStatus::Completed)?
                .is_some()
            {
                info!("Order request {} completed.", request.id);
            }
        }
        _ => (),
    }
    Ok(())
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::orders::OrdersService;
    use types::*;

    fn status(status: OrderStatus) -> SetOrderStatusPayload {
        SetOrderStatusPayload { status }
    }

    #[test]
    fn test_get_order_with_products() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.get_order(OrderId(1))).unwrap().unwrap();
        assert_eq!(result.order.id, OrderId(1));
        assert_eq!(result.products.len(), 2);
    }

    #[test]
    fn test_confirm_order() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_OTHER_USER_ID), handle);
        let order = core.run(service.set_order_status(OrderId(1), status(OrderStatus::Confirmed))).unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(order.completed_at.is_none());
    }

    #[test]
    fn test_order_status_machine_is_enforced() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_OTHER_USER_ID), handle);
        let err = core
            .run(service.set_order_status(OrderId(1), status(OrderStatus::Completed)))
            .unwrap_err();
        assert!(is_validation_error(&err));
        let err = core
            .run(service.set_order_status(MOCK_COMPLETED_ORDER_ID, status(OrderStatus::Canceled)))
            .unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_cancel_order() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let order = core.run(service.set_order_status(OrderId(1), status(OrderStatus::Canceled))).unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
    }

    #[test]
    fn test_missing_order() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core
            .run(service.set_order_status(OrderId(MOCK_MISSING_ID), status(OrderStatus::Confirmed)))
            .unwrap_err();
        assert!(is_not_found(&err));
    }
}
