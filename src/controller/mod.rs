//! `Controller` is a top layer that handles all http-related
//! stuff like reading bodies, parsing params, forming a response.
//! Basically it provides inputs to `Service` layer and converts outputs
//! of `Service` layer to http responses

pub mod context;
pub mod routes;

use std::sync::Arc;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future::{self, IntoFuture};
use futures::Future;
use hyper;
use hyper::server::Request;
use hyper::{Delete, Get, Post, Put};
use r2d2::ManageConnection;
use serde::de::DeserializeOwned;
use validator::Validate;

use self::context::{DynamicContext, StaticContext};
use self::routes::{create_route_parser, Route};
use errors::Error;
use http::request_util::{get_user_id, parse_body, parse_query, serialize_future};
use http::{Controller, ControllerFuture, RouteParser};
use models::*;
use repos::repo_factory::*;
use services::*;

/// Controller handles route parsing and calling `Service` layer
pub struct ControllerImpl<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    pub static_context: StaticContext<T, M, F>,
    pub route_parser: Arc<RouteParser<Route>>,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ControllerImpl<T, M, F>
{
    /// Create a new controller based on services
    pub fn new(static_context: StaticContext<T, M, F>) -> Self {
        let route_parser = Arc::new(create_route_parser());
        Self {
            route_parser,
            static_context,
        }
    }
}

/// Reads the body and checks the payload rules
fn parse_validated_body<P>(body: hyper::Body) -> Box<Future<Item = P, Error = FailureError>>
where
    P: DeserializeOwned + Validate + 'static,
{
    Box::new(parse_body::<P>(body).and_then(|payload| payload.validate().map(|_| payload).map_err(validation_failed)))
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Controller for ControllerImpl<T, M, F>
{
    /// Handle a request and get future response
    fn call(&self, req: Request) -> ControllerFuture {
        let user_id = get_user_id(req.headers());
        let dynamic_context = DynamicContext::new(user_id);
        let service = Service::new(self.static_context.clone(), dynamic_context);

        let method = req.method().clone();
        let path = req.path().to_string();
        let query = req.query().map(|query| query.to_string());
        let query = query.as_ref().map(|query| query.as_str());
        let body = req.body();

        match (&method, self.route_parser.test(&path)) {
            // GET /healthcheck
            (&Get, Some(Route::Healthcheck)) => serialize_future(future::ok::<_, FailureError>("Ok")),

            // GET /roles/by-user-id/<user_id>
            (&Get, Some(Route::RolesByUserId(user_id_arg))) => serialize_future(service.get_roles(user_id_arg)),

            // POST /roles
            (&Post, Some(Route::Roles)) => serialize_future(
                parse_body::<NewUserRole>(body).and_then(move |new_role| service.create_user_role(new_role)),
            ),

            // DELETE /roles
            (&Delete, Some(Route::Roles)) => serialize_future(
                parse_body::<RemoveUserRole>(body).and_then(move |old_role| service.delete_user_role(old_role)),
            ),

            // DELETE /roles/<role_id>
            (&Delete, Some(Route::RoleById(role_id))) => serialize_future(service.delete_user_role_by_id(role_id)),

            // POST /roles/default/<user_id>
            (&Post, Some(Route::DefaultRole(user_id_arg))) => serialize_future(service.create_default_role(user_id_arg)),

            // GET /auto_types
            (&Get, Some(Route::AutoTypes)) => serialize_future(service.list_auto_types()),

            // POST /auto_types
            (&Post, Some(Route::AutoTypes)) => serialize_future(
                parse_validated_body::<NewAutoType>(body).and_then(move |payload| service.create_auto_type(payload)),
            ),

            // GET /auto_types/<auto_type_id>
            (&Get, Some(Route::AutoType(auto_type_id))) => serialize_future(service.get_auto_type(auto_type_id)),

            // PUT /auto_types/<auto_type_id>
            (&Put, Some(Route::AutoType(auto_type_id))) => serialize_future(
                parse_validated_body::<UpdateAutoType>(body).and_then(move |payload| service.update_auto_type(auto_type_id, payload)),
            ),

            // GET /auto_brands?auto_type_id=<auto_type_id>
            (&Get, Some(Route::AutoBrands)) => serialize_future(
                parse_query::<AutoBrandsQuery>(query)
                    .into_future()
                    .and_then(move |brands_query| service.list_auto_brands(brands_query)),
            ),

            // POST /auto_brands
            (&Post, Some(Route::AutoBrands)) => serialize_future(
                parse_validated_body::<NewAutoBrandPayload>(body).and_then(move |payload| service.create_auto_brand(payload)),
            ),

            // GET /auto_brands/<auto_brand_id>
            (&Get, Some(Route::AutoBrand(auto_brand_id))) => serialize_future(service.get_auto_brand(auto_brand_id)),

            // PUT /auto_brands/<auto_brand_id>
            (&Put, Some(Route::AutoBrand(auto_brand_id))) => serialize_future(
                parse_validated_body::<UpdateAutoBrand>(body).and_then(move |payload| service.update_auto_brand(auto_brand_id, payload)),
            ),

            // POST /auto_brands/<auto_brand_id>/auto_types/<auto_type_id>
            (&Post, Some(Route::AutoBrandAutoType(auto_brand_id, auto_type_id))) => {
                serialize_future(service.link_auto_type(auto_brand_id, auto_type_id))
            }

            // DELETE /auto_brands/<auto_brand_id>/auto_types/<auto_type_id>
            (&Delete, Some(Route::AutoBrandAutoType(auto_brand_id, auto_type_id))) => {
                serialize_future(service.unlink_auto_type(auto_brand_id, auto_type_id))
            }

            // GET /auto_models?auto_brand_id=<auto_brand_id>&auto_type_id=<auto_type_id>
            (&Get, Some(Route::AutoModels)) => serialize_future(
                parse_query::<AutoModelsQuery>(query)
                    .into_future()
                    .and_then(move |models_query| service.list_auto_models(models_query)),
            ),

            // POST /auto_models
            (&Post, Some(Route::AutoModels)) => serialize_future(
                parse_validated_body::<NewAutoModel>(body).and_then(move |payload| service.create_auto_model(payload)),
            ),

            // GET /auto_models/<auto_model_id>
            (&Get, Some(Route::AutoModel(auto_model_id))) => serialize_future(service.get_auto_model(auto_model_id)),

            // PUT /auto_models/<auto_model_id>
            (&Put, Some(Route::AutoModel(auto_model_id))) => serialize_future(
                parse_validated_body::<UpdateAutoModel>(body).and_then(move |payload| service.update_auto_model(auto_model_id, payload)),
            ),

            // GET /product_groups
            (&Get, Some(Route::ProductGroups)) => serialize_future(service.get_product_groups_tree()),

            // POST /product_groups
            (&Post, Some(Route::ProductGroups)) => serialize_future(
                parse_validated_body::<NewProductGroup>(body).and_then(move |payload| service.create_product_group(payload)),
            ),

            // GET /product_groups/<product_group_id>
            (&Get, Some(Route::ProductGroup(product_group_id))) => serialize_future(service.get_product_group(product_group_id)),

            // PUT /product_groups/<product_group_id>
            (&Put, Some(Route::ProductGroup(product_group_id))) => serialize_future(
                parse_validated_body::<UpdateProductGroup>(body)
                    .and_then(move |payload| service.update_product_group(product_group_id, payload)),
            ),

            // GET /products?from=<from>&count=<count>
            (&Get, Some(Route::Products)) => serialize_future(
                parse_query::<Pagination>(query)
                    .into_future()
                    .and_then(move |pagination| service.list_products(pagination)),
            ),

            // POST /products
            (&Post, Some(Route::Products)) => serialize_future(
                parse_validated_body::<NewProductPayload>(body).and_then(move |payload| service.create_product(payload)),
            ),

            // GET /products/<product_id>
            (&Get, Some(Route::Product(product_id))) => serialize_future(service.get_product(product_id)),

            // PUT /products/<product_id>
            (&Put, Some(Route::Product(product_id))) => serialize_future(
                parse_validated_body::<UpdateProduct>(body).and_then(move |payload| service.update_product(product_id, payload)),
            ),

            // DELETE /products/<product_id>
            (&Delete, Some(Route::Product(product_id))) => serialize_future(service.deactivate_product(product_id)),

            // GET /products/<product_id>/branches
            (&Get, Some(Route::ProductBranches(product_id))) => serialize_future(service.list_product_branches(product_id)),

            // POST /products/<product_id>/branches
            (&Post, Some(Route::ProductBranches(product_id))) => serialize_future(
                parse_body::<NewBranchPayload>(body).and_then(move |payload| service.create_product_branch(product_id, payload)),
            ),

            // PUT /product_branches/<product_branch_id>
            (&Put, Some(Route::ProductBranch(product_branch_id))) => serialize_future(
                parse_body::<UpdateBranchPayload>(body)
                    .and_then(move |payload| service.update_product_branch(product_branch_id, payload)),
            ),

            // DELETE /product_branches/<product_branch_id>
            (&Delete, Some(Route::ProductBranch(product_branch_id))) => {
                serialize_future(service.delete_product_branch(product_branch_id))
            }

            // POST /product_branches/transform
            (&Post, Some(Route::ProductBranchesTransform)) => serialize_future(service.transform_products_branches()),

            // GET /organizations?from=<from>&count=<count>
            (&Get, Some(Route::Organizations)) => serialize_future(
                parse_query::<Pagination>(query)
                    .into_future()
                    .and_then(move |pagination| service.list_organizations(pagination)),
            ),

            // POST /organizations
            (&Post, Some(Route::Organizations)) => serialize_future(
                parse_validated_body::<NewOrganizationPayload>(body).and_then(move |payload| service.create_organization(payload)),
            ),

            // GET /organizations/<organization_id>
            (&Get, Some(Route::Organization(organization_id))) => serialize_future(service.get_organization(organization_id)),

            // PUT /organizations/<organization_id>
            (&Put, Some(Route::Organization(organization_id))) => serialize_future(
                parse_validated_body::<UpdateOrganization>(body)
                    .and_then(move |payload| service.update_organization(organization_id, payload)),
            ),

            // GET /organizations/by_user/<user_id>
            (&Get, Some(Route::OrganizationsByUser(owner_id))) => serialize_future(service.get_organizations_by_user(owner_id)),

            // PUT /organizations/<organization_id>/product_categories
            (&Put, Some(Route::OrganizationProductCategories(organization_id))) => serialize_future(
                parse_body::<SellerProductCategories>(body)
                    .and_then(move |payload| service.update_seller_product_categories(organization_id, payload)),
            ),

            // GET /cart
            (&Get, Some(Route::Cart)) => serialize_future(service.get_cart()),

            // DELETE /cart
            (&Delete, Some(Route::Cart)) => serialize_future(service.clear_cart()),

            // POST /cart/products
            (&Post, Some(Route::CartProducts)) => serialize_future(
                parse_validated_body::<NewCartProductPayload>(body).and_then(move |payload| service.add_cart_product(payload)),
            ),

            // PUT /cart/products/<cart_product_id>
            (&Put, Some(Route::CartProduct(cart_product_id))) => serialize_future(
                parse_validated_body::<SetQuantityPayload>(body)
                    .and_then(move |payload| service.set_cart_product_quantity(cart_product_id, payload.quantity)),
            ),

            // DELETE /cart/products/<cart_product_id>
            (&Delete, Some(Route::CartProduct(cart_product_id))) => serialize_future(service.delete_cart_product(cart_product_id)),

            // GET /order_requests?from=<from>&count=<count>
            (&Get, Some(Route::OrderRequests)) => serialize_future(
                parse_query::<Pagination>(query)
                    .into_future()
                    .and_then(move |pagination| service.list_customer_order_requests(pagination)),
            ),

            // POST /order_requests
            (&Post, Some(Route::OrderRequests)) => serialize_future(
                parse_body::<NewOrderRequestPayload>(body).and_then(move |payload| service.create_order_request(payload)),
            ),

            // POST /order_requests/from_cart
            (&Post, Some(Route::OrderRequestsFromCart)) => serialize_future(
                parse_validated_body::<FromCartPayload>(body).and_then(move |payload| service.create_order_request_from_cart(payload)),
            ),

            // POST /order_requests/transform
            (&Post, Some(Route::OrderRequestsTransform)) => serialize_future(service.transform_orders()),

            // GET /order_requests/for_seller/<organization_id>?from=<from>&count=<count>
            (&Get, Some(Route::OrderRequestsForSeller(organization_id))) => serialize_future(
                parse_query::<Pagination>(query)
                    .into_future()
                    .and_then(move |pagination| service.list_seller_order_requests(organization_id, pagination)),
            ),

            // GET /order_requests/<order_request_id>
            (&Get, Some(Route::OrderRequest(order_request_id))) => serialize_future(service.get_order_request(order_request_id)),

            // DELETE /order_requests/<order_request_id>
            (&Delete, Some(Route::OrderRequest(order_request_id))) => {
                serialize_future(service.cancel_order_request(order_request_id))
            }

            // GET /order_requests/<order_request_id>/offers
            (&Get, Some(Route::OrderRequestOffers(order_request_id))) => {
                serialize_future(service.list_request_offers(order_request_id))
            }

            // POST /offers
            (&Post, Some(Route::Offers)) => {
                serialize_future(parse_body::<NewOfferPayload>(body).and_then(move |payload| service.create_offer(payload)))
            }

            // GET /offers/<offer_id>
            (&Get, Some(Route::Offer(offer_id))) => serialize_future(service.get_offer(offer_id)),

            // POST /offers/<offer_id>/accept
            (&Post, Some(Route::OfferAccept(offer_id))) => serialize_future(service.accept_offer(offer_id)),

            // POST /offers/<offer_id>/reject
            (&Post, Some(Route::OfferReject(offer_id))) => serialize_future(service.reject_offer(offer_id)),

            // GET /orders?from=<from>&count=<count>
            (&Get, Some(Route::Orders)) => serialize_future(
                parse_query::<Pagination>(query)
                    .into_future()
                    .and_then(move |pagination| service.list_customer_orders(pagination)),
            ),

            // GET /orders/for_seller/<organization_id>?from=<from>&count=<count>
            (&Get, Some(Route::OrdersForSeller(organization_id))) => serialize_future(
                parse_query::<Pagination>(query)
                    .into_future()
                    .and_then(move |pagination| service.list_seller_orders(organization_id, pagination)),
            ),

            // GET /orders/<order_id>
            (&Get, Some(Route::Order(order_id))) => serialize_future(service.get_order(order_id)),

            // PUT /orders/<order_id>/status
            (&Put, Some(Route::OrderStatusChange(order_id))) => serialize_future(
                parse_body::<SetOrderStatusPayload>(body).and_then(move |payload| service.set_order_status(order_id, payload)),
            ),

            // GET /notifications?from=<from>&count=<count>
            (&Get, Some(Route::Notifications)) => serialize_future(
                parse_query::<Pagination>(query)
                    .into_future()
                    .and_then(move |pagination| service.list_notifications(pagination)),
            ),

            // GET /notifications/unread/count
            (&Get, Some(Route::NotificationsUnreadCount)) => serialize_future(service.count_unread_notifications()),

            // POST /notifications/read_all
            (&Post, Some(Route::NotificationsReadAll)) => serialize_future(service.mark_all_notifications_read()),

            // POST /notifications/<notification_id>/read
            (&Post, Some(Route::NotificationRead(notification_id))) => {
                serialize_future(service.mark_notification_read(notification_id))
            }

            // DELETE /notifications/<notification_id>
            (&Delete, Some(Route::Notification(notification_id))) => serialize_future(service.delete_notification(notification_id)),

            // Fallback
            (m, _) => Box::new(future::err(
                format_err!("Request to non existing endpoint in autoparts microservice! {:?} {:?}", m, path)
                    .context(Error::NotFound)
                    .into(),
            )),
        }
    }
}
