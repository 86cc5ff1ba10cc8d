//! Orders repo
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{NewOrder, Order, OrderReward, Pagination, UpdateOrderStatus};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::orders::dsl as Orders;
use types::{OrderId, OrderRequestId, OrderStatus, OrganizationId, UserId};

pub struct OrdersRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Order>>,
}

pub trait OrdersRepo {
    fn find(&self, id: OrderId) -> RepoResult<Option<Order>>;

    fn list_for_customer(&self, customer_id: UserId, pagination: Pagination) -> RepoResult<Vec<Order>>;

    fn list_for_organization(&self, organization_id: OrganizationId, pagination: Pagination) -> RepoResult<Vec<Order>>;

    fn list_for_request(&self, order_request_id: OrderRequestId) -> RepoResult<Vec<Order>>;

    /// Completed orders whose reward payout is not scheduled yet
    fn list_completed_without_reward(&self) -> RepoResult<Vec<Order>>;

    fn create(&self, payload: NewOrder) -> RepoResult<Order>;

    fn set_status(&self, id: OrderId, payload: UpdateOrderStatus) -> RepoResult<Order>;

    fn set_reward(&self, id: OrderId, payload: OrderReward) -> RepoResult<Order>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrdersRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Order>>) -> Self {
        Self { db_conn, acl }
    }

    fn find_checked(&self, id_arg: OrderId, action: Action) -> RepoResult<Order> {
        let value = Orders::orders.find(id_arg).get_result::<Order>(self.db_conn)?;
        acl::check(&*self.acl, Resource::Orders, action, self, Some(&value))?;
        Ok(value)
    }

    fn check_all(&self, values: Vec<Order>) -> RepoResult<Vec<Order>> {
        for value in &values {
            acl::check(&*self.acl, Resource::Orders, Action::Read, self, Some(value))?;
        }
        Ok(values)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrdersRepo for OrdersRepoImpl<'a, T> {
    fn find(&self, id_arg: OrderId) -> RepoResult<Option<Order>> {
        debug!("Find in orders with id {}.", id_arg);
        Orders::orders
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Order>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Orders, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find order by id: {} error occurred", id_arg)).into())
    }

    fn list_for_customer(&self, customer_id_arg: UserId, pagination: Pagination) -> RepoResult<Vec<Order>> {
        debug!("List orders of customer {} with {:?}.", customer_id_arg, pagination);
        Orders::orders
            .filter(Orders::customer_id.eq(customer_id_arg))
            .filter(Orders::id.gt(pagination.offset_id()))
            .order(Orders::id)
            .limit(pagination.limit())
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| e.context(format!("List orders of customer {} error occurred", customer_id_arg)).into())
    }

    fn list_for_organization(&self, organization_id_arg: OrganizationId, pagination: Pagination) -> RepoResult<Vec<Order>> {
        debug!("List orders of organization {} with {:?}.", organization_id_arg, pagination);
        Orders::orders
            .filter(Orders::organization_id.eq(organization_id_arg))
            .filter(Orders::id.gt(pagination.offset_id()))
            .order(Orders::id)
            .limit(pagination.limit())
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| {
                e.context(format!("List orders of organization {} error occurred", organization_id_arg))
                    .into()
            })
    }

    fn list_for_request(&self, order_request_id_arg: OrderRequestId) -> RepoResult<Vec<Order>> {
        debug!("List orders of order request {}.", order_request_id_arg);
        Orders::orders
            .filter(Orders::order_request_id.eq(order_request_id_arg))
            .order(Orders::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| {
                e.context(format!("List orders of order request {} error occurred", order_request_id_arg))
                    .into()
            })
    }

    fn list_completed_without_reward(&self) -> RepoResult<Vec<Order>> {
        debug!("List completed orders without reward.");
        Orders::orders
            .filter(Orders::status.eq(OrderStatus::Completed))
            .filter(Orders::reward_payout_at.is_null())
            .order(Orders::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| e.context("List completed orders without reward error occurred").into())
    }

    fn create(&self, payload: NewOrder) -> RepoResult<Order> {
        debug!("Create order {:?}.", payload);
        diesel::insert_into(Orders::orders)
            .values(&payload)
            .get_result::<Order>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::Orders, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create order {:?} error occurred", payload)).into())
    }

    fn set_status(&self, id_arg: OrderId, payload: UpdateOrderStatus) -> RepoResult<Order> {
        debug!("Set status of order {} with {:?}.", id_arg, payload);
        self.find_checked(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = Orders::orders.filter(Orders::id.eq(id_arg));
                diesel::update(filtered)
                    .set(&payload)
                    .get_result::<Order>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Set status of order {} error occurred", id_arg)).into())
    }

    fn set_reward(&self, id_arg: OrderId, payload: OrderReward) -> RepoResult<Order> {
        debug!("Set reward of order {} with {:?}.", id_arg, payload);
        self.find_checked(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = Orders::orders.filter(Orders::id.eq(id_arg));
                diesel::update(filtered)
                    .set(&payload)
                    .get_result::<Order>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Set reward of order {} error occurred", id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Order>
    for OrdersRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&Order>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj
                .map(|order| order.customer_id == user_id || order.seller_id == user_id)
                .unwrap_or(false),
        }
    }
}
