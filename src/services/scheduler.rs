//! Periodic marketplace tasks run by the scheduler binary

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{reward_amount, reward_payout_date, NewNotification, Offer, Order, OrderRequest, OrderReward};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;
use types::{OfferStatus, OrderRequestStatus};

pub trait SchedulerService {
    /// Pending offers past `expires_at` become expired, sellers are notified
    fn expire_offers(&self, now: SystemTime) -> ServiceFuture<Vec<Offer>>;
    /// Open requests older than the request lifetime and without accepted offers become expired
    fn expire_order_requests(&self, now: SystemTime) -> ServiceFuture<Vec<OrderRequest>>;
    /// Schedules the customer reward of completed orders
    fn compute_reward_payouts(&self) -> ServiceFuture<Vec<Order>>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > SchedulerService for Service<T, M, F>
{
    fn expire_offers(&self, now: SystemTime) -> ServiceFuture<Vec<Offer>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            let notifications_repo = repo_factory.create_notifications_repo_with_sys_acl(&*conn);
            conn.transaction::<Vec<Offer>, FailureError, _>(move || {
                let mut expired = vec![];
                for offer in offers_repo.list_pending_expired(now)? {
                    // accepted or rejected since it was listed
                    let offer = match offers_repo.set_status(offer.id, OfferStatus::Pending, OfferStatus::Expired)? {
                        Some(offer) => offer,
                        None => continue,
                    };
                    notifications_repo.create(NewNotification::offer_expired(&offer))?;
                    expired.push(offer);
                }
                Ok(expired)
            }).map_err(|e| e.context("Service Scheduler, expire_offers error occurred.").into())
        })
    }

    fn expire_order_requests(&self, now: SystemTime) -> ServiceFuture<Vec<OrderRequest>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let ttl = Duration::from_secs(self.static_context.config.marketplace.order_request_ttl_sec);

        self.spawn_on_pool(move |conn| {
            let order_requests_repo = repo_factory.create_order_requests_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            conn.transaction::<Vec<OrderRequest>, FailureError, _>(move || {
                let created_before = now.checked_sub(ttl).unwrap_or(UNIX_EPOCH);
                let mut expired = vec![];
                for request in order_requests_repo.list_open_created_before(created_before)? {
                    if offers_repo.has_accepted(request.id)? {
                        continue;
                    }
                    if let Some(request) =
                        order_requests_repo.set_status(request.id, OrderRequestStatus::Open, OrderRequestStatus::Expired)?
                    {
                        expired.push(request);
                    }
                }
                Ok(expired)
            }).map_err(|e| e.context("Service Scheduler, expire_order_requests error occurred.").into())
        })
    }

    fn compute_reward_payouts(&self) -> ServiceFuture<Vec<Order>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let percent = self.static_context.config.marketplace.reward_percent;
        let payout_day = self.static_context.config.marketplace.reward_payout_day;

        self.spawn_on_pool(move |conn| {
            let orders_repo = repo_factory.create_orders_repo(&*conn, user_id);
            conn.transaction::<Vec<Order>, FailureError, _>(move || {
                let mut rewarded = vec![];
                for order in orders_repo.list_completed_without_reward()? {
                    let payout_at = match order.completed_at.and_then(|completed_at| reward_payout_date(completed_at, payout_day)) {
                        Some(payout_at) => payout_at,
                        None => {
                            error!("Order {} is completed without completion time, reward skipped.", order.id);
                            continue;
                        }
                    };
                    let reward = OrderReward {
                        reward_amount: Some(reward_amount(order.total_price, percent)),
                        reward_payout_at: Some(payout_at),
                    };
                    rewarded.push(orders_repo.set_reward(order.id, reward)?);
                }
                Ok(rewarded)
            }).map_err(|e| e.context("Service Scheduler, compute_reward_payouts error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;
    use std::time::SystemTime;

    use tokio_core::reactor::Core;

    use repos::repo_factory::tests::*;
    use services::scheduler::SchedulerService;
    use types::*;

    #[test]
    fn test_expire_offers() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let expired = core.run(service.expire_offers(SystemTime::now())).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, MOCK_EXPIRED_OFFER_ID);
        assert_eq!(expired[0].status, OfferStatus::Expired);
    }

    #[test]
    fn test_offer_accepted_meanwhile_is_not_expired() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let expired = core.run(service.expire_offers(SystemTime::now())).unwrap();
        assert!(expired.iter().all(|offer| offer.id != MOCK_RACED_OFFER_ID));
    }

    #[test]
    fn test_expire_order_requests_without_accepted_offers() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let expired = core.run(service.expire_order_requests(SystemTime::now())).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].status, OrderRequestStatus::Expired);
    }

    #[test]
    fn test_reward_payouts() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let rewarded = core.run(service.compute_reward_payouts()).unwrap();
        assert_eq!(rewarded.len(), 1);
        assert_eq!(rewarded[0].reward_amount, Some(ProductPrice(0.76)));
        assert!(rewarded[0].reward_payout_at.unwrap() > SystemTime::now());
    }
}
