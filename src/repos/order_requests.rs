//! Order requests repo. Also manages the requested items.
use std::time::SystemTime;

use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::{exists, sql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::select;
use diesel::sql_types::Bool;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{
    NewOrderRequest, NewRequestProduct, OrderRequest, Pagination, RequestProduct, UpdateOrderRequestSellers, UpdateOrderRequestStatus,
};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::offers::dsl as Offers;
use schema::order_request_products::dsl as RequestProducts;
use schema::order_requests::dsl as OrderRequests;
use schema::organizations::dsl as Organizations;
use types::{IdList, OrderRequestId, OrderRequestStatus, OrganizationId, UserId};

pub struct OrderRequestsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<OrderRequest>>,
}

pub trait OrderRequestsRepo {
    fn find(&self, id: OrderRequestId) -> RepoResult<Option<OrderRequest>>;

    fn list_for_customer(&self, customer_id: UserId, pagination: Pagination) -> RepoResult<Vec<OrderRequest>>;

    /// Requests accepting offers whose sellers include the organization
    fn list_for_organization(&self, organization_id: OrganizationId, pagination: Pagination) -> RepoResult<Vec<OrderRequest>>;

    fn list_by_statuses(&self, statuses: &[OrderRequestStatus]) -> RepoResult<Vec<OrderRequest>>;

    /// Open requests created at or before `created_before`
    fn list_open_created_before(&self, created_before: SystemTime) -> RepoResult<Vec<OrderRequest>>;

    fn create(&self, payload: NewOrderRequest) -> RepoResult<OrderRequest>;

    /// Moves the request from `from` to `to`. Returns `None` when the request
    /// is no longer in `from`.
    fn set_status(&self, id: OrderRequestId, from: OrderRequestStatus, to: OrderRequestStatus) -> RepoResult<Option<OrderRequest>>;

    fn set_seller_ids(&self, id: OrderRequestId, seller_ids: IdList) -> RepoResult<OrderRequest>;

    fn create_products(&self, order_request_id: OrderRequestId, payload: Vec<NewRequestProduct>) -> RepoResult<Vec<RequestProduct>>;

    fn list_products(&self, order_request_id: OrderRequestId) -> RepoResult<Vec<RequestProduct>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrderRequestsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<OrderRequest>>) -> Self {
        Self { db_conn, acl }
    }

    fn find_checked(&self, id_arg: OrderRequestId, action: Action) -> RepoResult<OrderRequest> {
        let value = OrderRequests::order_requests
            .find(id_arg)
            .get_result::<OrderRequest>(self.db_conn)?;
        acl::check(&*self.acl, Resource::OrderRequests, action, self, Some(&value))?;
        Ok(value)
    }

    fn check_all(&self, values: Vec<OrderRequest>) -> RepoResult<Vec<OrderRequest>> {
        for value in &values {
            acl::check(&*self.acl, Resource::OrderRequests, Action::Read, self, Some(value))?;
        }
        Ok(values)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrderRequestsRepo
    for OrderRequestsRepoImpl<'a, T>
{
    fn find(&self, id_arg: OrderRequestId) -> RepoResult<Option<OrderRequest>> {
        debug!("Find in order requests with id {}.", id_arg);
        OrderRequests::order_requests
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<OrderRequest>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::OrderRequests, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find order request by id: {} error occurred", id_arg)).into())
    }

    fn list_for_customer(&self, customer_id_arg: UserId, pagination: Pagination) -> RepoResult<Vec<OrderRequest>> {
        debug!("List order requests of customer {} with {:?}.", customer_id_arg, pagination);
        OrderRequests::order_requests
            .filter(OrderRequests::customer_id.eq(customer_id_arg))
            .filter(OrderRequests::id.gt(pagination.offset_id()))
            .order(OrderRequests::id)
            .limit(pagination.limit())
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| {
                e.context(format!("List order requests of customer {} error occurred", customer_id_arg))
                    .into()
            })
    }

    fn list_for_organization(&self, organization_id_arg: OrganizationId, pagination: Pagination) -> RepoResult<Vec<OrderRequest>> {
        debug!("List order requests of organization {} with {:?}.", organization_id_arg, pagination);
        let accepting = OrderRequestStatus::variants()
            .into_iter()
            .filter(|status| status.accepts_offers())
            .collect::<Vec<_>>();
        OrderRequests::order_requests
            .filter(OrderRequests::status.eq_any(accepting))
            .filter(sql::<Bool>(&format!("seller_ids @> '[{}]'", organization_id_arg.0)))
            .filter(OrderRequests::id.gt(pagination.offset_id()))
            .order(OrderRequests::id)
            .limit(pagination.limit())
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| {
                e.context(format!("List order requests of organization {} error occurred", organization_id_arg))
                    .into()
            })
    }

    fn list_by_statuses(&self, statuses: &[OrderRequestStatus]) -> RepoResult<Vec<OrderRequest>> {
        debug!("List order requests with statuses {:?}.", statuses);
        OrderRequests::order_requests
            .filter(OrderRequests::status.eq_any(statuses))
            .order(OrderRequests::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| e.context(format!("List order requests with statuses {:?} error occurred", statuses)).into())
    }

    fn list_open_created_before(&self, created_before: SystemTime) -> RepoResult<Vec<OrderRequest>> {
        debug!("List open order requests created before {:?}.", created_before);
        OrderRequests::order_requests
            .filter(OrderRequests::status.eq(OrderRequestStatus::Open))
            .filter(OrderRequests::created_at.le(created_before))
            .order(OrderRequests::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| e.context("List outdated open order requests error occurred").into())
    }

    fn create(&self, payload: NewOrderRequest) -> RepoResult<OrderRequest> {
        debug!("Create order request {:?}.", payload);
        diesel::insert_into(OrderRequests::order_requests)
            .values(&payload)
            .get_result::<OrderRequest>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::OrderRequests, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create order request {:?} error occurred", payload)).into())
    }

    fn set_status(&self, id_arg: OrderRequestId, from: OrderRequestStatus, to: OrderRequestStatus) -> RepoResult<Option<OrderRequest>> {
        debug!("Set status of order request {} from {} to {}.", id_arg, from, to);
        self.find_checked(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = OrderRequests::order_requests
                    .filter(OrderRequests::id.eq(id_arg))
                    .filter(OrderRequests::status.eq(from));
                diesel::update(filtered)
                    .set(&UpdateOrderRequestStatus { status: to })
                    .get_result::<OrderRequest>(self.db_conn)
                    .optional()
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Set status {} of order request {} error occurred", to, id_arg)).into())
    }

    fn set_seller_ids(&self, id_arg: OrderRequestId, seller_ids_arg: IdList) -> RepoResult<OrderRequest> {
        debug!("Set sellers {:?} of order request {}.", seller_ids_arg, id_arg);
        self.find_checked(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = OrderRequests::order_requests.filter(OrderRequests::id.eq(id_arg));
                diesel::update(filtered)
                    .set(&UpdateOrderRequestSellers {
                        seller_ids: seller_ids_arg.clone(),
                    }).get_result::<OrderRequest>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Set sellers of order request {} error occurred", id_arg)).into())
    }

    fn create_products(&self, order_request_id_arg: OrderRequestId, payload: Vec<NewRequestProduct>) -> RepoResult<Vec<RequestProduct>> {
        debug!("Create products {:?} of order request {}.", payload, order_request_id_arg);
        self.find_checked(order_request_id_arg, Action::Create)
            .and_then(|_| {
                diesel::insert_into(RequestProducts::order_request_products)
                    .values(&payload)
                    .get_results::<RequestProduct>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Create products of order request {} error occurred", order_request_id_arg))
                    .into()
            })
    }

    fn list_products(&self, order_request_id_arg: OrderRequestId) -> RepoResult<Vec<RequestProduct>> {
        debug!("List products of order request {}.", order_request_id_arg);
        self.find_checked(order_request_id_arg, Action::Read)
            .and_then(|_| {
                RequestProducts::order_request_products
                    .filter(RequestProducts::order_request_id.eq(order_request_id_arg))
                    .order(RequestProducts::id)
                    .get_results(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("List products of order request {} error occurred", order_request_id_arg))
                    .into()
            })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, OrderRequest>
    for OrderRequestsRepoImpl<'a, T>
{
    /// A request belongs to its customer, to the owners of the matched
    /// organizations and to sellers who already made an offer on it
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&OrderRequest>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                let request = match obj {
                    Some(request) => request,
                    None => return false,
                };
                if request.customer_id == user_id {
                    return true;
                }

                let matched_ids = request.seller_ids.ids::<OrganizationId>();
                let owns_matched = select(exists(
                    Organizations::organizations
                        .filter(Organizations::user_id.eq(user_id))
                        .filter(Organizations::id.eq_any(matched_ids)),
                )).get_result::<bool>(self.db_conn)
                .unwrap_or(false);

                owns_matched || select(exists(
                    Offers::offers
                        .filter(Offers::order_request_id.eq(request.id))
                        .filter(Offers::seller_id.eq(user_id)),
                )).get_result::<bool>(self.db_conn)
                .unwrap_or(false)
            }
        }
    }
}
