//! Notifications of the current user

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{Notification, Pagination, UnreadCount};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::{current_user, Service};
use types::NotificationId;

pub trait NotificationsService {
    /// Newest first
    fn list_notifications(&self, pagination: Pagination) -> ServiceFuture<Vec<Notification>>;
    fn count_unread_notifications(&self) -> ServiceFuture<UnreadCount>;
    fn mark_notification_read(&self, id: NotificationId) -> ServiceFuture<Notification>;
    /// Returns the number of notifications marked
    fn mark_all_notifications_read(&self) -> ServiceFuture<usize>;
    fn delete_notification(&self, id: NotificationId) -> ServiceFuture<Notification>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > NotificationsService for Service<T, M, F>
{
    fn list_notifications(&self, pagination: Pagination) -> ServiceFuture<Vec<Notification>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let notifications_repo = repo_factory.create_notifications_repo(&*conn, user_id);
            current_user(user_id)
                .and_then(|owner| notifications_repo.list_for_user(owner, pagination))
                .map_err(|e: FailureError| e.context("Service Notifications, list endpoint error occurred.").into())
        })
    }

    fn count_unread_notifications(&self) -> ServiceFuture<UnreadCount> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let notifications_repo = repo_factory.create_notifications_repo(&*conn, user_id);
            current_user(user_id)
                .and_then(|owner| notifications_repo.count_unread(owner))
                .map(|count| UnreadCount { count })
                .map_err(|e: FailureError| e.context("Service Notifications, count_unread endpoint error occurred.").into())
        })
    }

    fn mark_notification_read(&self, id: NotificationId) -> ServiceFuture<Notification> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let notifications_repo = repo_factory.create_notifications_repo(&*conn, user_id);
            notifications_repo
                .mark_read(id)
                .map_err(|e: FailureError| e.context("Service Notifications, mark_read endpoint error occurred.").into())
        })
    }

    fn mark_all_notifications_read(&self) -> ServiceFuture<usize> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let notifications_repo = repo_factory.create_notifications_repo(&*conn, user_id);
            current_user(user_id)
                .and_then(|owner| notifications_repo.mark_all_read(owner))
                .map_err(|e: FailureError| e.context("Service Notifications, mark_all_read endpoint error occurred.").into())
        })
    }

    fn delete_notification(&self, id: NotificationId) -> ServiceFuture<Notification> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let notifications_repo = repo_factory.create_notifications_repo(&*conn, user_id);
            notifications_repo
                .delete(id)
                .map_err(|e: FailureError| e.context("Service Notifications, delete endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::notifications::NotificationsService;
    use types::*;

    #[test]
    fn test_list_notifications() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.list_notifications(Pagination::default())).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|n| n.user_id == MOCK_USER_ID));
    }

    #[test]
    fn test_unread_count_and_mark_read() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let count = core.run(service.count_unread_notifications()).unwrap();
        assert_eq!(count, UnreadCount { count: MOCK_UNREAD_COUNT });
        let marked = core.run(service.mark_all_notifications_read()).unwrap();
        assert_eq!(marked, MOCK_UNREAD_COUNT as usize);
        let notification = core.run(service.mark_notification_read(NotificationId(1))).unwrap();
        assert!(notification.is_read);
    }

    #[test]
    fn test_anonymous_user_has_no_notifications() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(None, handle);
        let err = core.run(service.count_unread_notifications()).unwrap_err();
        assert!(is_forbidden(&err));
    }
}
