use std::str::FromStr;

use http::RouteParser;
use types::*;

/// List of all routes with params for the app
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Route {
    Healthcheck,
    Roles,
    RolesByUserId(UserId),
    RoleById(RoleId),
    DefaultRole(UserId),
    AutoTypes,
    AutoType(AutoTypeId),
    AutoBrands,
    AutoBrand(AutoBrandId),
    AutoBrandAutoType(AutoBrandId, AutoTypeId),
    AutoModels,
    AutoModel(AutoModelId),
    ProductGroups,
    ProductGroup(ProductGroupId),
    Products,
    Product(ProductId),
    ProductBranches(ProductId),
    ProductBranch(ProductBranchId),
    ProductBranchesTransform,
    Organizations,
    Organization(OrganizationId),
    OrganizationsByUser(UserId),
    OrganizationProductCategories(OrganizationId),
    Cart,
    CartProducts,
    CartProduct(CartProductId),
    OrderRequests,
    OrderRequestsFromCart,
    OrderRequestsTransform,
    OrderRequestsForSeller(OrganizationId),
    OrderRequest(OrderRequestId),
    OrderRequestOffers(OrderRequestId),
    Offers,
    Offer(OfferId),
    OfferAccept(OfferId),
    OfferReject(OfferId),
    Orders,
    OrdersForSeller(OrganizationId),
    Order(OrderId),
    OrderStatusChange(OrderId),
    Notifications,
    NotificationsUnreadCount,
    NotificationsReadAll,
    Notification(NotificationId),
    NotificationRead(NotificationId),
}

fn param<I: FromStr>(params: &[&str], index: usize) -> Option<I> {
    params.get(index).and_then(|string_id| string_id.parse::<I>().ok())
}

pub fn create_route_parser() -> RouteParser<Route> {
    let mut router = RouteParser::default();

    // Healthcheck
    router.add_route(r"^/healthcheck$", || Route::Healthcheck);

    // User roles
    router.add_route(r"^/roles$", || Route::Roles);
    router.add_route_with_params(r"^/roles/by-user-id/(\d+)$", |params| param(&params, 0).map(Route::RolesByUserId));
    router.add_route_with_params(r"^/roles/default/(\d+)$", |params| param(&params, 0).map(Route::DefaultRole));
    router.add_route_with_params(r"^/roles/(\d+)$", |params| param(&params, 0).map(Route::RoleById));

    // Vehicle catalog
    router.add_route(r"^/auto_types$", || Route::AutoTypes);
    router.add_route_with_params(r"^/auto_types/(\d+)$", |params| param(&params, 0).map(Route::AutoType));
    router.add_route(r"^/auto_brands$", || Route::AutoBrands);
    router.add_route_with_params(r"^/auto_brands/(\d+)$", |params| param(&params, 0).map(Route::AutoBrand));
    router.add_route_with_params(r"^/auto_brands/(\d+)/auto_types/(\d+)$", |params| {
        match (param(&params, 0), param(&params, 1)) {
            (Some(auto_brand_id), Some(auto_type_id)) => Some(Route::AutoBrandAutoType(auto_brand_id, auto_type_id)),
            _ => None,
        }
    });
    router.add_route(r"^/auto_models$", || Route::AutoModels);
    router.add_route_with_params(r"^/auto_models/(\d+)$", |params| param(&params, 0).map(Route::AutoModel));

    // Product groups
    router.add_route(r"^/product_groups$", || Route::ProductGroups);
    router.add_route_with_params(r"^/product_groups/(\d+)$", |params| param(&params, 0).map(Route::ProductGroup));

    // Products and branches
    router.add_route(r"^/products$", || Route::Products);
    router.add_route_with_params(r"^/products/(\d+)$", |params| param(&params, 0).map(Route::Product));
    router.add_route_with_params(r"^/products/(\d+)/branches$", |params| param(&params, 0).map(Route::ProductBranches));
    router.add_route(r"^/product_branches/transform$", || Route::ProductBranchesTransform);
    router.add_route_with_params(r"^/product_branches/(\d+)$", |params| param(&params, 0).map(Route::ProductBranch));

    // Organizations
    router.add_route(r"^/organizations$", || Route::Organizations);
    router.add_route_with_params(r"^/organizations/(\d+)$", |params| param(&params, 0).map(Route::Organization));
    router.add_route_with_params(r"^/organizations/by_user/(\d+)$", |params| {
        param(&params, 0).map(Route::OrganizationsByUser)
    });
    router.add_route_with_params(r"^/organizations/(\d+)/product_categories$", |params| {
        param(&params, 0).map(Route::OrganizationProductCategories)
    });

    // Cart
    router.add_route(r"^/cart$", || Route::Cart);
    router.add_route(r"^/cart/products$", || Route::CartProducts);
    router.add_route_with_params(r"^/cart/products/(\d+)$", |params| param(&params, 0).map(Route::CartProduct));

    // Order requests
    router.add_route(r"^/order_requests$", || Route::OrderRequests);
    router.add_route(r"^/order_requests/from_cart$", || Route::OrderRequestsFromCart);
    router.add_route(r"^/order_requests/transform$", || Route::OrderRequestsTransform);
    router.add_route_with_params(r"^/order_requests/for_seller/(\d+)$", |params| {
        param(&params, 0).map(Route::OrderRequestsForSeller)
    });
    router.add_route_with_params(r"^/order_requests/(\d+)$", |params| param(&params, 0).map(Route::OrderRequest));
    router.add_route_with_params(r"^/order_requests/(\d+)/offers$", |params| {
        param(&params, 0).map(Route::OrderRequestOffers)
    });

    // Offers
    router.add_route(r"^/offers$", || Route::Offers);
    router.add_route_with_params(r"^/offers/(\d+)$", |params| param(&params, 0).map(Route::Offer));
    router.add_route_with_params(r"^/offers/(\d+)/accept$", |params| param(&params, 0).map(Route::OfferAccept));
    router.add_route_with_params(r"^/offers/(\d+)/reject$", |params| param(&params, 0).map(Route::OfferReject));

    // Orders
    router.add_route(r"^/orders$", || Route::Orders);
    router.add_route_with_params(r"^/orders/for_seller/(\d+)$", |params| param(&params, 0).map(Route::OrdersForSeller));
    router.add_route_with_params(r"^/orders/(\d+)$", |params| param(&params, 0).map(Route::Order));
    router.add_route_with_params(r"^/orders/(\d+)/status$", |params| param(&params, 0).map(Route::OrderStatusChange));

    // Notifications
    router.add_route(r"^/notifications$", || Route::Notifications);
    router.add_route(r"^/notifications/unread/count$", || Route::NotificationsUnreadCount);
    router.add_route(r"^/notifications/read_all$", || Route::NotificationsReadAll);
    router.add_route_with_params(r"^/notifications/(\d+)$", |params| param(&params, 0).map(Route::Notification));
    router.add_route_with_params(r"^/notifications/(\d+)/read$", |params| param(&params, 0).map(Route::NotificationRead));

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_routes() {
        let router = create_route_parser();
        assert_eq!(router.test("/healthcheck"), Some(Route::Healthcheck));
        assert_eq!(router.test("/auto_types/3"), Some(Route::AutoType(AutoTypeId(3))));
        assert_eq!(
            router.test("/auto_brands/4/auto_types/7"),
            Some(Route::AutoBrandAutoType(AutoBrandId(4), AutoTypeId(7)))
        );
        assert_eq!(router.test("/products/5/branches"), Some(Route::ProductBranches(ProductId(5))));
        assert_eq!(router.test("/roles/by-user-id/9"), Some(Route::RolesByUserId(UserId(9))));
        assert_eq!(router.test("/roles/default/9"), Some(Route::DefaultRole(UserId(9))));
    }

    #[test]
    fn test_named_subroutes_are_not_taken_for_ids() {
        let router = create_route_parser();
        assert_eq!(router.test("/order_requests/from_cart"), Some(Route::OrderRequestsFromCart));
        assert_eq!(router.test("/order_requests/transform"), Some(Route::OrderRequestsTransform));
        assert_eq!(
            router.test("/order_requests/for_seller/2"),
            Some(Route::OrderRequestsForSeller(OrganizationId(2)))
        );
        assert_eq!(router.test("/product_branches/transform"), Some(Route::ProductBranchesTransform));
        assert_eq!(router.test("/notifications/unread/count"), Some(Route::NotificationsUnreadCount));
        assert_eq!(router.test("/orders/for_seller/1"), Some(Route::OrdersForSeller(OrganizationId(1))));
    }

    #[test]
    fn test_marketplace_routes() {
        let router = create_route_parser();
        assert_eq!(router.test("/offers/8/accept"), Some(Route::OfferAccept(OfferId(8))));
        assert_eq!(router.test("/offers/8/reject"), Some(Route::OfferReject(OfferId(8))));
        assert_eq!(router.test("/orders/6/status"), Some(Route::OrderStatusChange(OrderId(6))));
        assert_eq!(router.test("/notifications/11/read"), Some(Route::NotificationRead(NotificationId(11))));
        assert_eq!(router.test("/cart/products/12"), Some(Route::CartProduct(CartProductId(12))));
    }

    #[test]
    fn test_unknown_routes() {
        let router = create_route_parser();
        assert_eq!(router.test("/stores"), None);
        assert_eq!(router.test("/products/abc"), None);
        assert_eq!(router.test("/offers/1/cancel"), None);
        assert_eq!(router.test("/products/99999999999"), None);
    }
}
