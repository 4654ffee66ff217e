//! Checkout handoff to the messaging service
//!
//! Builds the pre-filled click-to-chat message for a new order and, when a
//! webhook is configured, posts a signed order summary to it

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::config::MessagingConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderItem};
use shared::types::format_money;
use shared::validation::phone_digits;

/// Header carrying the webhook body signature
pub const SIGNATURE_HEADER: &str = "X-Store-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Message text a customer sends to the store after checkout
pub fn compose_order_message(order: &Order, items: &[OrderItem], currency: &str) -> String {
    let mut lines = vec![
        format!("Hello! I'd like to confirm order {}.", order.order_number),
        String::new(),
    ];

    for item in items {
        lines.push(format!(
            "{}x {} - {}",
            item.quantity,
            item.product_name,
            format_money(currency, item.subtotal())
        ));
    }

    lines.push(String::new());
    lines.push(format!("Total: {}", format_money(currency, order.total)));
    lines.push(String::new());
    lines.push(format!("Name: {}", order.customer_name));
    lines.push(format!("Phone: {}", order.phone));
    lines.push(format!("Delivery address: {}", order.delivery_address));
    if let Some(notes) = order.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(format!("Notes: {}", notes.trim()));
    }

    lines.join("\n")
}

/// Click-to-chat URL for the store phone with `text` pre-filled
pub fn click_to_chat_link(link_base: &str, phone_number: &str, text: &str) -> AppResult<String> {
    let digits = phone_digits(phone_number);
    if digits.is_empty() {
        return Err(AppError::Internal(
            "messaging.phone_number is not configured".to_string(),
        ));
    }

    let base = format!("{}/", link_base.trim_end_matches('/'));
    let mut url = Url::parse(&base)
        .and_then(|base| base.join(&digits))
        .map_err(|e| AppError::Internal(format!("Invalid messaging link base: {}", e)))?;
    url.query_pairs_mut().append_pair("text", text);

    Ok(url.into())
}

/// Base64 HMAC-SHA256 of a webhook body
pub fn sign_payload(secret: &str, body: &[u8]) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Failed to create HMAC: {}", e)))?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Order summary posted to the checkout webhook
#[derive(Debug, Clone, Serialize)]
pub struct OrderWebhookPayload {
    pub event: &'static str,
    pub order_id: Uuid,
    pub order_number: String,
    pub total: Decimal,
    pub customer_name: String,
    pub phone: String,
    pub delivery_address: String,
    pub items: Vec<WebhookItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookItem {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderWebhookPayload {
    pub fn order_created(order: &Order, items: &[OrderItem]) -> Self {
        Self {
            event: "order.created",
            order_id: order.id,
            order_number: order.order_number.clone(),
            total: order.total,
            customer_name: order.customer_name.clone(),
            phone: order.phone.clone(),
            delivery_address: order.delivery_address.clone(),
            items: items
                .iter()
                .map(|i| WebhookItem {
                    product_name: i.product_name.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
        }
    }
}

/// Client for the optional checkout webhook
#[derive(Clone)]
pub struct CheckoutNotifier {
    client: Client,
    url: String,
    secret: Option<String>,
}

impl CheckoutNotifier {
    pub fn new(url: String, secret: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
            secret,
        }
    }

    /// Notifier for the configured webhook, if any
    pub fn from_config(config: &MessagingConfig) -> Option<Self> {
        config
            .webhook_url
            .as_ref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Self::new(url.clone(), config.webhook_secret.clone()))
    }

    /// Post the payload; failures are reported but never retried
    pub async fn notify(&self, payload: &OrderWebhookPayload) -> AppResult<()> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| AppError::Internal(format!("Webhook serialization failed: {}", e)))?;

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign_payload(secret, &body)?);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Checkout webhook failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Checkout webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Fire-and-forget notification from a request handler
    pub fn spawn_notify(self, payload: OrderWebhookPayload) {
        tokio::spawn(async move {
            match self.notify(&payload).await {
                Ok(()) => tracing::debug!(order = %payload.order_number, "Checkout webhook delivered"),
                Err(e) => tracing::warn!(order = %payload.order_number, "Checkout webhook error: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use chrono::Utc;

    fn order(notes: Option<&str>) -> (Order, Vec<OrderItem>) {
        let order_id = Uuid::new_v4();
        let order = Order {
            id: order_id,
            order_number: "ORD-20261018-000001".to_string(),
            customer_id: None,
            status: OrderStatus::Pending,
            total: Decimal::new(2500, 2),
            customer_name: "Ana".to_string(),
            phone: "(11) 98765-4321".to_string(),
            delivery_address: "Rua A, 10".to_string(),
            notes: notes.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let items = vec![
            OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: Some(Uuid::new_v4()),
                product_name: "Brownie".to_string(),
                unit_price: Decimal::new(1000, 2),
                unit_cost: Decimal::new(400, 2),
                quantity: 2,
            },
            OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: Some(Uuid::new_v4()),
                product_name: "Cookie".to_string(),
                unit_price: Decimal::new(500, 2),
                unit_cost: Decimal::new(200, 2),
                quantity: 1,
            },
        ];
        (order, items)
    }

    #[test]
    fn test_message_lists_lines_total_and_address() {
        let (order, items) = order(None);
        let message = compose_order_message(&order, &items, "R$");
        assert!(message.contains("ORD-20261018-000001"));
        assert!(message.contains("2x Brownie - R$ 20.00"));
        assert!(message.contains("1x Cookie - R$ 5.00"));
        assert!(message.contains("Total: R$ 25.00"));
        assert!(message.contains("Delivery address: Rua A, 10"));
        assert!(!message.contains("Notes:"));
    }

    #[test]
    fn test_message_includes_notes() {
        let (order, items) = order(Some("  ring the bell "));
        let message = compose_order_message(&order, &items, "R$");
        assert!(message.ends_with("Notes: ring the bell"));
    }

    #[test]
    fn test_click_to_chat_link_encodes_text() {
        let link = click_to_chat_link("https://wa.me", "+55 (11) 99999-9999", "Total: R$ 25.00\nok")
            .unwrap();
        assert!(link.starts_with("https://wa.me/5511999999999?text="));
        assert!(!link.contains('\n'));
        assert!(!link.contains(' '));
    }

    #[test]
    fn test_click_to_chat_link_requires_phone() {
        assert!(click_to_chat_link("https://wa.me", "", "hi").is_err());
    }

    #[test]
    fn test_sign_payload_matches_known_vector() {
        // RFC 4231 test case 2
        let signature = sign_payload("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn test_webhook_payload_shape() {
        let (order, items) = order(None);
        let payload = OrderWebhookPayload::order_created(&order, &items);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["event"], "order.created");
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_notifier_only_when_configured() {
        let mut config = MessagingConfig {
            phone_number: "5511999999999".to_string(),
            link_base: "https://wa.me".to_string(),
            webhook_url: None,
            webhook_secret: None,
        };
        assert!(CheckoutNotifier::from_config(&config).is_none());
        config.webhook_url = Some("http://localhost:9/hook".to_string());
        assert!(CheckoutNotifier::from_config(&config).is_some());
    }

    #[test]
    fn test_notify_unreachable_endpoint_errors() {
        let notifier = CheckoutNotifier::new("http://127.0.0.1:9/hook".to_string(), None);
        let (order, items) = order(None);
        let payload = OrderWebhookPayload::order_created(&order, &items);
        let result = tokio_test::block_on(notifier.notify(&payload));
        assert!(result.is_err());
    }
}
