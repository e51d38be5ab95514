//! Checkout view.
//!
//! Joins the cart to the catalog, loads the customer's delivery addresses,
//! and submits the order either as cash on delivery or through the hosted
//! payment widget. Every failure lands on the context as an error toast and is
//! also returned as a [`CheckoutError`]; nothing is retried.
//!
//! ```text
//! COD:    place_cod_order ──> clear cart, go to MyOrders
//! Online: create_provider_order ──> widget ──Completed──> record_payment ──> clear cart, go to MyOrders
//!                                          └─Dismissed──> (nothing)
//! ```

use greencart_core::{
    Address, AddressId, LineItem, PaymentMethod, Product, checkout_total,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiError, PlaceOrder, RecordPayment, StorefrontApi};
use crate::context::{AppContext, Route};
use crate::widget::{PAYMENT_DESCRIPTION, PaymentWidget, STORE_NAME, WidgetOptions, WidgetOutcome};

/// Shown under the address picker when the customer has no addresses.
pub const NO_ADDRESS_PROMPT: &str = "Please add an address in your profile first.";

/// Toast shown when the server fails to record a completed payment.
pub const PAYMENT_RECORDING_FAILED: &str = "Payment recording failed";

/// Why a submission did not go through.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please select an address")]
    NoAddress,

    #[error("Please login first")]
    NotSignedIn,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// The payment went through but the server did not record the order.
    #[error("Payment recording failed")]
    PaymentRecording(#[source] ApiError),
}

/// What a successful submission did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// COD order accepted; carries the server's message.
    Placed(String),
    /// Online payment recorded.
    Paid,
    /// The customer closed the payment widget; nothing changed.
    Dismissed,
}

/// A cart entry joined to its catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product: Product,
    pub quantity: u32,
}

impl CheckoutLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.line_total(self.quantity)
    }
}

/// State of the checkout page.
#[derive(Debug, Clone, Default)]
pub struct CheckoutView {
    lines: Vec<CheckoutLine>,
    addresses: Vec<Address>,
    selected_address: Option<AddressId>,
    payment_method: PaymentMethod,
}

impl CheckoutView {
    /// Build the view from the current cart and catalog.
    #[must_use]
    pub fn mount(ctx: &AppContext) -> Self {
        let mut view = Self::default();
        view.refresh_lines(ctx);
        view
    }

    /// Re-derive the display lines. Cart entries whose product is no longer in
    /// the catalog are dropped; quantities are copied as-is.
    pub fn refresh_lines(&mut self, ctx: &AppContext) {
        self.lines = ctx
            .cart()
            .iter()
            .filter_map(|(id, quantity)| {
                ctx.product(id).map(|product| CheckoutLine {
                    product: product.clone(),
                    quantity,
                })
            })
            .collect();
    }

    #[must_use]
    pub fn lines(&self) -> &[CheckoutLine] {
        &self.lines
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Fetch the signed-in user's addresses and select the first one.
    ///
    /// Does nothing without a user session. A failed fetch leaves the current
    /// list in place and raises an error toast.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Api` if the request fails.
    #[instrument(skip_all)]
    pub async fn load_addresses<A: StorefrontApi>(
        &mut self,
        ctx: &mut AppContext,
        api: &A,
    ) -> Result<(), CheckoutError> {
        let Some(user_id) = ctx.user().map(|u| u.id) else {
            return Ok(());
        };

        match api.fetch_addresses(user_id).await {
            Ok(addresses) => {
                self.selected_address = addresses.first().map(|a| a.id);
                self.addresses = addresses;
                Ok(())
            }
            Err(e) => {
                ctx.toast_error(e.user_message());
                Err(e.into())
            }
        }
    }

    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Select an address by ID. Unknown IDs leave the selection unchanged.
    pub fn select_address(&mut self, id: AddressId) -> bool {
        if self.addresses.iter().any(|a| a.id == id) {
            self.selected_address = Some(id);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn selected_address(&self) -> Option<&Address> {
        let id = self.selected_address?;
        self.addresses.iter().find(|a| a.id == id)
    }

    /// Prompt to show when there is nothing to pick from.
    #[must_use]
    pub fn address_prompt(&self) -> Option<&'static str> {
        self.addresses.is_empty().then_some(NO_ADDRESS_PROMPT)
    }

    // =========================================================================
    // Payment method and totals
    // =========================================================================

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Label for the submit button.
    #[must_use]
    pub const fn action_label(&self) -> &'static str {
        self.payment_method.action_label()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CheckoutLine::line_total).sum()
    }

    /// Amount the customer pays: subtotal plus surcharge, two decimals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        checkout_total(self.subtotal())
    }

    /// Total formatted in the store currency.
    #[must_use]
    pub fn display_total(&self, ctx: &AppContext) -> String {
        ctx.format_amount(self.total())
    }

    /// Whether the submit button is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.selected_address().is_some() && !self.lines.is_empty()
    }

    fn line_items(&self) -> Vec<LineItem> {
        self.lines
            .iter()
            .map(|line| LineItem::new(line.product.id, line.quantity))
            .collect()
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit the order with the selected payment method.
    ///
    /// No request is made unless an address is selected, a user is signed in,
    /// and the cart has at least one line.
    ///
    /// # Errors
    ///
    /// Returns a `CheckoutError` for a failed precondition or request. The
    /// same message is pushed to the context as an error toast.
    #[instrument(skip_all, fields(method = %self.payment_method))]
    pub async fn submit<A, W>(
        &mut self,
        ctx: &mut AppContext,
        api: &A,
        widget: &mut W,
    ) -> Result<SubmitOutcome, CheckoutError>
    where
        A: StorefrontApi,
        W: PaymentWidget,
    {
        let result = self.try_submit(ctx, api, widget).await;
        if let Err(e) = &result {
            ctx.toast_error(e.to_string());
        }
        result
    }

    async fn try_submit<A, W>(
        &mut self,
        ctx: &mut AppContext,
        api: &A,
        widget: &mut W,
    ) -> Result<SubmitOutcome, CheckoutError>
    where
        A: StorefrontApi,
        W: PaymentWidget,
    {
        let address = self
            .selected_address()
            .map(|a| a.id)
            .ok_or(CheckoutError::NoAddress)?;
        let user_id = ctx.user().map(|u| u.id).ok_or(CheckoutError::NotSignedIn)?;
        if self.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items = self.line_items();

        match self.payment_method {
            PaymentMethod::CashOnDelivery => {
                let message = api
                    .place_cod_order(&PlaceOrder {
                        user_id,
                        items,
                        address,
                    })
                    .await?;

                ctx.toast_success(message.clone());
                self.finish(ctx);
                Ok(SubmitOutcome::Placed(message))
            }
            PaymentMethod::Online => {
                let checkout = api.create_provider_order(self.total()).await?;

                let outcome = widget
                    .open(WidgetOptions {
                        key: checkout.key,
                        amount: checkout.order.amount,
                        currency: checkout.order.currency,
                        name: STORE_NAME.to_string(),
                        description: PAYMENT_DESCRIPTION.to_string(),
                        order_id: checkout.order.id,
                    })
                    .await;

                let WidgetOutcome::Completed(payment) = outcome else {
                    tracing::debug!("Payment widget dismissed");
                    return Ok(SubmitOutcome::Dismissed);
                };

                api.record_payment(&RecordPayment {
                    user_id,
                    items,
                    address,
                    payment_id: payment.payment_id,
                    order_id: payment.order_id,
                    signature: payment.signature,
                })
                .await
                .map_err(CheckoutError::PaymentRecording)?;

                self.finish(ctx);
                Ok(SubmitOutcome::Paid)
            }
        }
    }

    fn finish(&mut self, ctx: &mut AppContext) {
        ctx.clear_cart();
        self.refresh_lines(ctx);
        ctx.navigate(Route::MyOrders);
    }
}
