//! Offers repo. Offer products are read and written through the parent offer.
use std::collections::HashMap;
use std::time::SystemTime;

use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::select;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{NewOffer, NewOfferProduct, Offer, OfferProduct, UpdateOfferStatus};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::offer_products::dsl as OfferProducts;
use schema::offers::dsl as Offers;
use schema::order_requests::dsl as OrderRequests;
use types::{OfferId, OfferProductId, OfferStatus, OrderRequestId, OrganizationId, UserId};

pub struct OffersRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Offer>>,
}

pub trait OffersRepo {
    fn find(&self, id: OfferId) -> RepoResult<Option<Offer>>;

    fn list_for_request(&self, order_request_id: OrderRequestId) -> RepoResult<Vec<Offer>>;

    /// Pending offer of the organization on the request, if any
    fn find_pending(&self, order_request_id: OrderRequestId, organization_id: OrganizationId) -> RepoResult<Option<Offer>>;

    /// Whether some organization already answered the request
    fn exists_for_organization(&self, order_request_id: OrderRequestId, organization_id: OrganizationId) -> RepoResult<bool>;

    fn has_accepted(&self, order_request_id: OrderRequestId) -> RepoResult<bool>;

    /// Pending offers with `expires_at <= now`
    fn list_pending_expired(&self, now: SystemTime) -> RepoResult<Vec<Offer>>;

    fn create(&self, payload: NewOffer) -> RepoResult<Offer>;

    /// Moves the offer from `from` to `to`. Returns `None` when the offer
    /// is no longer in `from`.
    fn set_status(&self, id: OfferId, from: OfferStatus, to: OfferStatus) -> RepoResult<Option<Offer>>;

    fn create_products(&self, offer_id: OfferId, payload: Vec<NewOfferProduct>) -> RepoResult<Vec<OfferProduct>>;

    fn list_products(&self, offer_id: OfferId) -> RepoResult<Vec<OfferProduct>>;

    fn find_products(&self, ids: &[OfferProductId]) -> RepoResult<Vec<OfferProduct>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OffersRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Offer>>) -> Self {
        Self { db_conn, acl }
    }

    fn find_checked(&self, id_arg: OfferId, action: Action) -> RepoResult<Offer> {
        let value = Offers::offers.find(id_arg).get_result::<Offer>(self.db_conn)?;
        acl::check(&*self.acl, Resource::Offers, action, self, Some(&value))?;
        Ok(value)
    }

    fn check_all(&self, values: Vec<Offer>) -> RepoResult<Vec<Offer>> {
        for value in &values {
            acl::check(&*self.acl, Resource::Offers, Action::Read, self, Some(value))?;
        }
        Ok(values)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OffersRepo for OffersRepoImpl<'a, T> {
    fn find(&self, id_arg: OfferId) -> RepoResult<Option<Offer>> {
        debug!("Find in offers with id {}.", id_arg);
        Offers::offers
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Offer>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Offers, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find offer by id: {} error occurred", id_arg)).into())
    }

    fn list_for_request(&self, order_request_id_arg: OrderRequestId) -> RepoResult<Vec<Offer>> {
        debug!("List offers on order request {}.", order_request_id_arg);
        Offers::offers
            .filter(Offers::order_request_id.eq(order_request_id_arg))
            .order(Offers::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| {
                e.context(format!("List offers on order request {} error occurred", order_request_id_arg))
                    .into()
            })
    }

    fn find_pending(&self, order_request_id_arg: OrderRequestId, organization_id_arg: OrganizationId) -> RepoResult<Option<Offer>> {
        debug!(
            "Find pending offer of organization {} on order request {}.",
            organization_id_arg, order_request_id_arg
        );
        Offers::offers
            .filter(Offers::order_request_id.eq(order_request_id_arg))
            .filter(Offers::organization_id.eq(organization_id_arg))
            .filter(Offers::status.eq(OfferStatus::Pending))
            .first(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Offer>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Offers, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| {
                e.context(format!(
                    "Find pending offer of organization {} on order request {} error occurred",
                    organization_id_arg, order_request_id_arg
                )).into()
            })
    }

    fn exists_for_organization(&self, order_request_id_arg: OrderRequestId, organization_id_arg: OrganizationId) -> RepoResult<bool> {
        debug!(
            "Check offers of organization {} on order request {}.",
            organization_id_arg, order_request_id_arg
        );
        select(exists(
            Offers::offers
                .filter(Offers::order_request_id.eq(order_request_id_arg))
                .filter(Offers::organization_id.eq(organization_id_arg)),
        )).get_result::<bool>(self.db_conn)
        .map_err(From::from)
        .map_err(|e: FailureError| {
            e.context(format!(
                "Check offers of organization {} on order request {} error occurred",
                organization_id_arg, order_request_id_arg
            )).into()
        })
    }

    fn has_accepted(&self, order_request_id_arg: OrderRequestId) -> RepoResult<bool> {
        debug!("Check accepted offers on order request {}.", order_request_id_arg);
        select(exists(
            Offers::offers
                .filter(Offers::order_request_id.eq(order_request_id_arg))
                .filter(Offers::status.eq(OfferStatus::Accepted)),
        )).get_result::<bool>(self.db_conn)
        .map_err(From::from)
        .map_err(|e: FailureError| {
            e.context(format!("Check accepted offers on order request {} error occurred", order_request_id_arg))
                .into()
        })
    }

    fn list_pending_expired(&self, now: SystemTime) -> RepoResult<Vec<Offer>> {
        debug!("List pending offers expired at {:?}.", now);
        Offers::offers
            .filter(Offers::status.eq(OfferStatus::Pending))
            .filter(Offers::expires_at.le(now))
            .order(Offers::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values| self.check_all(values))
            .map_err(|e: FailureError| e.context("List expired pending offers error occurred").into())
    }

    fn create(&self, payload: NewOffer) -> RepoResult<Offer> {
        debug!("Create offer {:?}.", payload);
        diesel::insert_into(Offers::offers)
            .values(&payload)
            .get_result::<Offer>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::Offers, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create offer {:?} error occurred", payload)).into())
    }

    fn set_status(&self, id_arg: OfferId, from: OfferStatus, to: OfferStatus) -> RepoResult<Option<Offer>> {
        debug!("Set status of offer {} from {} to {}.", id_arg, from, to);
        self.find_checked(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = Offers::offers.filter(Offers::id.eq(id_arg)).filter(Offers::status.eq(from));
                diesel::update(filtered)
                    .set(&UpdateOfferStatus { status: to })
                    .get_result::<Offer>(self.db_conn)
                    .optional()
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Set status {} of offer {} error occurred", to, id_arg)).into())
    }

    fn create_products(&self, offer_id_arg: OfferId, payload: Vec<NewOfferProduct>) -> RepoResult<Vec<OfferProduct>> {
        debug!("Create products {:?} of offer {}.", payload, offer_id_arg);
        self.find_checked(offer_id_arg, Action::Create)
            .and_then(|_| {
                diesel::insert_into(OfferProducts::offer_products)
                    .values(&payload)
                    .get_results::<OfferProduct>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Create products of offer {} error occurred", offer_id_arg)).into())
    }

    fn list_products(&self, offer_id_arg: OfferId) -> RepoResult<Vec<OfferProduct>> {
        debug!("List products of offer {}.", offer_id_arg);
        self.find_checked(offer_id_arg, Action::Read)
            .and_then(|_| {
                OfferProducts::offer_products
                    .filter(OfferProducts::offer_id.eq(offer_id_arg))
                    .order(OfferProducts::id)
                    .get_results(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("List products of offer {} error occurred", offer_id_arg)).into())
    }

    fn find_products(&self, ids: &[OfferProductId]) -> RepoResult<Vec<OfferProduct>> {
        debug!("Find offer products with ids {:?}.", ids);
        if ids.is_empty() {
            return Ok(vec![]);
        }
        OfferProducts::offer_products
            .filter(OfferProducts::id.eq_any(ids))
            .order(OfferProducts::id)
            .get_results::<OfferProduct>(self.db_conn)
            .map_err(From::from)
            .and_then(|products| {
                let offer_ids = products.iter().map(|product| product.offer_id).collect::<Vec<_>>();
                let offers = Offers::offers
                    .filter(Offers::id.eq_any(offer_ids))
                    .get_results::<Offer>(self.db_conn)?
                    .into_iter()
                    .map(|offer| (offer.id, offer))
                    .collect::<HashMap<_, _>>();
                for product in &products {
                    acl::check(&*self.acl, Resource::Offers, Action::Read, self, offers.get(&product.offer_id))?;
                }
                Ok(products)
            }).map_err(|e: FailureError| e.context(format!("Find offer products by ids: {:?} error occurred", ids)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Offer>
    for OffersRepoImpl<'a, T>
{
    /// An offer belongs to its seller and to the customer of the request
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&Offer>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => match obj {
                Some(offer) if offer.seller_id == user_id => true,
                Some(offer) => select(exists(
                    OrderRequests::order_requests
                        .filter(OrderRequests::id.eq(offer.order_request_id))
                        .filter(OrderRequests::customer_id.eq(user_id)),
                )).get_result::<bool>(self.db_conn)
                .unwrap_or(false),
                None => false,
            },
        }
    }
}
