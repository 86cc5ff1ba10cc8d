//! Notifications repo
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{NewNotification, Notification, Pagination};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::notifications::dsl as Notifications;
use types::{NotificationId, UserId};

pub struct NotificationsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Notification>>,
}

pub trait NotificationsRepo {
    /// Newest first. `from` is the id to continue below.
    fn list_for_user(&self, user_id: UserId, pagination: Pagination) -> RepoResult<Vec<Notification>>;

    fn count_unread(&self, user_id: UserId) -> RepoResult<i64>;

    fn create(&self, payload: NewNotification) -> RepoResult<Notification>;

    fn create_many(&self, payload: Vec<NewNotification>) -> RepoResult<Vec<Notification>>;

    fn mark_read(&self, id: NotificationId) -> RepoResult<Notification>;

    /// Returns the number of notifications changed
    fn mark_all_read(&self, user_id: UserId) -> RepoResult<usize>;

    fn delete(&self, id: NotificationId) -> RepoResult<Notification>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> NotificationsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Notification>>) -> Self {
        Self { db_conn, acl }
    }

    fn find_checked(&self, id_arg: NotificationId, action: Action) -> RepoResult<Notification> {
        let value = Notifications::notifications
            .find(id_arg)
            .get_result::<Notification>(self.db_conn)?;
        acl::check(&*self.acl, Resource::Notifications, action, self, Some(&value))?;
        Ok(value)
    }

    /// Stand-in object to check per-user queries that return no rows
    fn owned_by(user_id: UserId) -> Notification {
        Notification {
            id: NotificationId::default(),
            user_id,
            kind: ::types::NotificationKind::NewOffer,
            title: String::new(),
            body: String::new(),
            data: None,
            is_read: false,
            created_at: ::std::time::SystemTime::now(),
        }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> NotificationsRepo
    for NotificationsRepoImpl<'a, T>
{
    fn list_for_user(&self, user_id_arg: UserId, pagination: Pagination) -> RepoResult<Vec<Notification>> {
        debug!("List notifications of user {} with {:?}.", user_id_arg, pagination);
        acl::check(&*self.acl, Resource::Notifications, Action::Read, self, Some(&Self::owned_by(user_id_arg)))?;
        let query = Notifications::notifications
            .filter(Notifications::user_id.eq(user_id_arg))
            .into_boxed();
        let query = match pagination.from {
            Some(from) => query.filter(Notifications::id.lt(NotificationId(from))),
            None => query,
        };
        query
            .order(Notifications::id.desc())
            .limit(pagination.limit())
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("List notifications of user {} error occurred", user_id_arg)).into())
    }

    fn count_unread(&self, user_id_arg: UserId) -> RepoResult<i64> {
        debug!("Count unread notifications of user {}.", user_id_arg);
        acl::check(&*self.acl, Resource::Notifications, Action::Read, self, Some(&Self::owned_by(user_id_arg)))?;
        Notifications::notifications
            .filter(Notifications::user_id.eq(user_id_arg))
            .filter(Notifications::is_read.eq(false))
            .select(count_star())
            .get_result(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Count unread notifications of user {} error occurred", user_id_arg))
                    .into()
            })
    }

    fn create(&self, payload: NewNotification) -> RepoResult<Notification> {
        debug!("Create notification {:?}.", payload);
        diesel::insert_into(Notifications::notifications)
            .values(&payload)
            .get_result::<Notification>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::Notifications, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create notification {:?} error occurred", payload)).into())
    }

    fn create_many(&self, payload: Vec<NewNotification>) -> RepoResult<Vec<Notification>> {
        debug!("Create notifications {:?}.", payload);
        if payload.is_empty() {
            return Ok(vec![]);
        }
        diesel::insert_into(Notifications::notifications)
            .values(&payload)
            .get_results::<Notification>(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Notification>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Notifications, Action::Create, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| e.context("Create notifications error occurred").into())
    }

    fn mark_read(&self, id_arg: NotificationId) -> RepoResult<Notification> {
        debug!("Mark notification {} read.", id_arg);
        self.find_checked(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = Notifications::notifications.filter(Notifications::id.eq(id_arg));
                diesel::update(filtered)
                    .set(Notifications::is_read.eq(true))
                    .get_result::<Notification>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Mark notification {} read error occurred", id_arg)).into())
    }

    fn mark_all_read(&self, user_id_arg: UserId) -> RepoResult<usize> {
        debug!("Mark all notifications of user {} read.", user_id_arg);
        acl::check(&*self.acl, Resource::Notifications, Action::Update, self, Some(&Self::owned_by(user_id_arg)))?;
        let filtered = Notifications::notifications
            .filter(Notifications::user_id.eq(user_id_arg))
            .filter(Notifications::is_read.eq(false));
        diesel::update(filtered)
            .set(Notifications::is_read.eq(true))
            .execute(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Mark all notifications of user {} read error occurred", user_id_arg))
                    .into()
            })
    }

    fn delete(&self, id_arg: NotificationId) -> RepoResult<Notification> {
        debug!("Delete notification {}.", id_arg);
        self.find_checked(id_arg, Action::Delete)
            .and_then(|_| {
                let filtered = Notifications::notifications.filter(Notifications::id.eq(id_arg));
                diesel::delete(filtered)
                    .get_result::<Notification>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete notification {} error occurred", id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Notification>
    for NotificationsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&Notification>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|notification| notification.user_id == user_id).unwrap_or(false),
        }
    }
}
