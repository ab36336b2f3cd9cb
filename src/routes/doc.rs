use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::{CartLineItem, CartSummary},
    dto::{
        admin::Dashboard,
        auth::{LoginRequest, SessionInfo},
        cart::{AddToCartRequest, CartView, SetQuantityRequest},
        commands::{CheckoutRequest, CommandList, UpdateStatusRequest},
        contact::{ContactRequest, MessageList},
        products::{
            CreateProductRequest, ImportLineError, ImportReport, ProductList,
            UpdateProductRequest, UploadedImage,
        },
        reservations::{CreateReservationRequest, ReservationList, SlotAvailability, SlotStatus},
    },
    models::{Command, CommandItem, ContactMessage, Customer, Product, Reservation},
    response::{ApiResponse, Meta},
    routes::{admin, cart, checkout, contact, health, params, products, reservations, site},
    sessions::SESSION_COOKIE,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        site::site_info,
        products::list_products,
        products::get_product,
        cart::view_cart,
        cart::cart_summary,
        cart::add_to_cart,
        cart::set_quantity,
        cart::remove_item,
        cart::clear_cart,
        checkout::checkout,
        reservations::slot_availability,
        reservations::book_reservation,
        contact::send_message,
        admin::login,
        admin::logout,
        admin::session_info,
        admin::dashboard,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::import_products,
        admin::upload_product_image,
        admin::list_commands,
        admin::stream_commands,
        admin::get_command,
        admin::update_command_status,
        admin::delete_command,
        admin::list_reservations,
        admin::get_reservation,
        admin::update_reservation_status,
        admin::delete_reservation,
        admin::list_messages,
        admin::get_message,
        admin::delete_message,
    ),
    components(
        schemas(
            Product,
            Command,
            CommandItem,
            Customer,
            Reservation,
            ContactMessage,
            CartLineItem,
            CartSummary,
            CartView,
            AddToCartRequest,
            SetQuantityRequest,
            CheckoutRequest,
            CommandList,
            UpdateStatusRequest,
            CreateReservationRequest,
            ReservationList,
            SlotAvailability,
            SlotStatus,
            ContactRequest,
            MessageList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ImportReport,
            ImportLineError,
            UploadedImage,
            LoginRequest,
            SessionInfo,
            Dashboard,
            site::SiteInfo,
            site::ServiceOffering,
            params::Pagination,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<CartSummary>,
            ApiResponse<Command>,
            ApiResponse<CommandList>,
            ApiResponse<Dashboard>,
        )
    ),
    security(
        ("session_cookie" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Site", description = "Static business content"),
        (name = "Products", description = "Public catalog"),
        (name = "Cart", description = "Session cart"),
        (name = "Checkout", description = "Cart to command"),
        (name = "Reservations", description = "Slot availability and booking"),
        (name = "Contact", description = "Contact messages"),
        (name = "Admin", description = "Session-gated admin surface"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
