table! {
    auto_brands (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        active_auto_type_ids -> Jsonb,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    auto_models (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        auto_type_id -> Int4,
        auto_brand_id -> Int4,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    auto_type_brand_relations (id) {
        id -> Int4,
        auto_type_id -> Int4,
        auto_brand_id -> Int4,
        created_at -> Timestamp,
    }
}

table! {
    auto_types (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        position -> Int4,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    cart_products (id) {
        id -> Int4,
        user_id -> Int4,
        product_id -> Int4,
        offer_product_id -> Nullable<Int4>,
        quantity -> Int4,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    notifications (id) {
        id -> Int4,
        user_id -> Int4,
        kind -> Varchar,
        title -> Varchar,
        body -> Varchar,
        data -> Nullable<Jsonb>,
        is_read -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    offer_products (id) {
        id -> Int4,
        offer_id -> Int4,
        request_product_id -> Int4,
        price -> Double,
        quantity -> Int4,
        created_at -> Timestamp,
    }
}

table! {
    offers (id) {
        id -> Int4,
        order_request_id -> Int4,
        organization_id -> Int4,
        seller_id -> Int4,
        status -> Varchar,
        delivery_days -> Int4,
        comment -> Nullable<Varchar>,
        expires_at -> Timestamp,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    order_request_products (id) {
        id -> Int4,
        order_request_id -> Int4,
        product_id -> Nullable<Int4>,
        name -> Varchar,
        article -> Nullable<Varchar>,
        quantity -> Int4,
        auto_type_id -> Nullable<Int4>,
        auto_brand_id -> Nullable<Int4>,
        group_id -> Nullable<Int4>,
        created_at -> Timestamp,
    }
}

table! {
    order_requests (id) {
        id -> Int4,
        customer_id -> Int4,
        status -> Varchar,
        comment -> Nullable<Varchar>,
        delivery_address -> Nullable<Varchar>,
        seller_ids -> Jsonb,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    orders (id) {
        id -> Int4,
        order_request_id -> Int4,
        offer_id -> Int4,
        customer_id -> Int4,
        organization_id -> Int4,
        seller_id -> Int4,
        status -> Varchar,
        total_price -> Double,
        reward_amount -> Nullable<Double>,
        reward_payout_at -> Nullable<Timestamp>,
        completed_at -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    organizations (id) {
        id -> Int4,
        user_id -> Int4,
        name -> Varchar,
        inn -> Varchar,
        phone -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        address -> Nullable<Varchar>,
        is_active -> Bool,
        auto_type_ids -> Jsonb,
        auto_brand_ids -> Jsonb,
        product_group_ids -> Jsonb,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    product_branches (id) {
        id -> Int4,
        product_id -> Int4,
        auto_type_id -> Nullable<Int4>,
        auto_brand_id -> Nullable<Int4>,
        auto_model_id -> Nullable<Int4>,
        group_id -> Nullable<Int4>,
        subgroup_id -> Nullable<Int4>,
        created_at -> Timestamp,
    }
}

table! {
    product_groups (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        parent_id -> Nullable<Int4>,
        auto_type_ids -> Jsonb,
        auto_brand_ids -> Jsonb,
        position -> Int4,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        article -> Varchar,
        manufacturer -> Nullable<Varchar>,
        description -> Nullable<Varchar>,
        auto_type_ids -> Jsonb,
        auto_brand_ids -> Jsonb,
        auto_model_ids -> Jsonb,
        group_ids -> Jsonb,
        subgroup_ids -> Jsonb,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    user_roles (id) {
        id -> Int4,
        user_id -> Int4,
        name -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

joinable!(auto_models -> auto_brands (auto_brand_id));
joinable!(auto_models -> auto_types (auto_type_id));
joinable!(auto_type_brand_relations -> auto_brands (auto_brand_id));
joinable!(auto_type_brand_relations -> auto_types (auto_type_id));
joinable!(cart_products -> products (product_id));
joinable!(offer_products -> offers (offer_id));
joinable!(offer_products -> order_request_products (request_product_id));
joinable!(offers -> order_requests (order_request_id));
joinable!(offers -> organizations (organization_id));
joinable!(order_request_products -> order_requests (order_request_id));
joinable!(orders -> offers (offer_id));
joinable!(product_branches -> products (product_id));

allow_tables_to_appear_in_same_query!(
    auto_brands,
    auto_models,
    auto_type_brand_relations,
    auto_types,
    cart_products,
    notifications,
    offer_products,
    offers,
    order_request_products,
    order_requests,
    orders,
    organizations,
    product_branches,
    product_groups,
    products,
    user_roles,
);
