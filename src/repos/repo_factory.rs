use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;

use models::*;
use repos::acl::{Acl, ApplicationAcl, RolesCacheImpl, SystemACL, UnauthorizedAcl};
use repos::*;
use types::{MarketRole, UserId};

pub trait ReposFactory<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>: Clone + Send + 'static {
    fn create_auto_types_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<AutoTypesRepo + 'a>;
    fn create_auto_brands_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<AutoBrandsRepo + 'a>;
    fn create_auto_type_brand_relations_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<AutoTypeBrandRelationsRepo + 'a>;
    fn create_auto_models_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<AutoModelsRepo + 'a>;
    fn create_product_groups_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<ProductGroupsRepo + 'a>;
    fn create_products_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<ProductsRepo + 'a>;
    fn create_product_branches_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<ProductBranchesRepo + 'a>;
    fn create_organizations_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<OrganizationsRepo + 'a>;
    fn create_cart_products_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<CartProductsRepo + 'a>;
    fn create_order_requests_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<OrderRequestsRepo + 'a>;
    fn create_order_requests_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<OrderRequestsRepo + 'a>;
    fn create_offers_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<OffersRepo + 'a>;
    fn create_orders_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<OrdersRepo + 'a>;
    fn create_orders_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<OrdersRepo + 'a>;
    fn create_notifications_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<NotificationsRepo + 'a>;
    fn create_notifications_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<NotificationsRepo + 'a>;
    fn create_user_roles_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<UserRolesRepo + 'a>;
    fn create_user_roles_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<UserRolesRepo + 'a>;
    fn product_groups_cache(&self) -> ProductGroupsCacheImpl;
}

#[derive(Clone)]
pub struct ReposFactoryImpl {
    roles_cache: RolesCacheImpl,
    product_groups_cache: ProductGroupsCacheImpl,
    system: bool,
}

impl ReposFactoryImpl {
    pub fn new(roles_cache: RolesCacheImpl, product_groups_cache: ProductGroupsCacheImpl) -> Self {
        Self {
            roles_cache,
            product_groups_cache,
            system: false,
        }
    }

    /// Factory for background jobs: every repo it builds allows everything
    pub fn with_system_acl(self) -> Self {
        Self { system: true, ..self }
    }

    pub fn get_roles<'a, C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>(
        &self,
        id: UserId,
        db_conn: &'a C,
    ) -> Vec<MarketRole> {
        self.create_user_roles_repo_with_sys_acl(db_conn)
            .list_for_user(id)
            .ok()
            .unwrap_or_default()
    }

    fn get_acl<'a, T, C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>(
        &self,
        db_conn: &'a C,
        user_id: Option<UserId>,
    ) -> Box<RepoAcl<T>> {
        if self.system {
            return Box::new(SystemACL::default()) as Box<RepoAcl<T>>;
        }
        user_id.map_or(Box::new(UnauthorizedAcl::default()) as Box<RepoAcl<T>>, |id| {
            let roles = self.get_roles(id, db_conn);
            (Box::new(ApplicationAcl::new(roles, id)) as Box<RepoAcl<T>>)
        })
    }
}

impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C> for ReposFactoryImpl {
    fn create_auto_types_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<AutoTypesRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(AutoTypesRepoImpl::new(db_conn, acl)) as Box<AutoTypesRepo>
    }
    fn create_auto_brands_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<AutoBrandsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(AutoBrandsRepoImpl::new(db_conn, acl)) as Box<AutoBrandsRepo>
    }
    fn create_auto_type_brand_relations_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<AutoTypeBrandRelationsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(AutoTypeBrandRelationsRepoImpl::new(db_conn, acl)) as Box<AutoTypeBrandRelationsRepo>
    }
    fn create_auto_models_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<AutoModelsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(AutoModelsRepoImpl::new(db_conn, acl)) as Box<AutoModelsRepo>
    }
    fn create_product_groups_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<ProductGroupsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(ProductGroupsRepoImpl::new(db_conn, acl)) as Box<ProductGroupsRepo>
    }
    fn create_products_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<ProductsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(ProductsRepoImpl::new(db_conn, acl)) as Box<ProductsRepo>
    }
    fn create_product_branches_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<ProductBranchesRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(ProductBranchesRepoImpl::new(db_conn, acl)) as Box<ProductBranchesRepo>
    }
    fn create_organizations_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<OrganizationsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(OrganizationsRepoImpl::new(db_conn, acl)) as Box<OrganizationsRepo>
    }
    fn create_cart_products_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<CartProductsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(CartProductsRepoImpl::new(db_conn, acl)) as Box<CartProductsRepo>
    }
    fn create_order_requests_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<OrderRequestsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(OrderRequestsRepoImpl::new(db_conn, acl)) as Box<OrderRequestsRepo>
    }
    fn create_order_requests_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<OrderRequestsRepo + 'a> {
        Box::new(OrderRequestsRepoImpl::new(
            db_conn,
            Box::new(SystemACL::default()) as Box<Acl<Resource, Action, Scope, FailureError, OrderRequest>>,
        )) as Box<OrderRequestsRepo>
    }
    fn create_offers_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<OffersRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(OffersRepoImpl::new(db_conn, acl)) as Box<OffersRepo>
    }
    fn create_orders_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<OrdersRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(OrdersRepoImpl::new(db_conn, acl)) as Box<OrdersRepo>
    }
    fn create_orders_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<OrdersRepo + 'a> {
        Box::new(OrdersRepoImpl::new(
            db_conn,
            Box::new(SystemACL::default()) as Box<Acl<Resource, Action, Scope, FailureError, Order>>,
        )) as Box<OrdersRepo>
    }
    fn create_notifications_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<NotificationsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(NotificationsRepoImpl::new(db_conn, acl)) as Box<NotificationsRepo>
    }
    fn create_notifications_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<NotificationsRepo + 'a> {
        Box::new(NotificationsRepoImpl::new(
            db_conn,
            Box::new(SystemACL::default()) as Box<Acl<Resource, Action, Scope, FailureError, Notification>>,
        )) as Box<NotificationsRepo>
    }
    fn create_user_roles_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<UserRolesRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(UserRolesRepoImpl::new(db_conn, acl, self.roles_cache.clone())) as Box<UserRolesRepo>
    }
    fn create_user_roles_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<UserRolesRepo + 'a> {
        Box::new(UserRolesRepoImpl::new(
            db_conn,
            Box::new(SystemACL::default()) as Box<Acl<Resource, Action, Scope, FailureError, UserRole>>,
            self.roles_cache.clone(),
        )) as Box<UserRolesRepo>
    }
    fn product_groups_cache(&self) -> ProductGroupsCacheImpl {
        self.product_groups_cache.clone()
    }
}
