//! Shopping cart service for signed-in users and anonymous sessions

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{merged_quantity, CartError, CartLine, CartOwner, CartView, QuantityChange};

/// Cart service
#[derive(Clone)]
pub struct CartService {
    db: PgPool,
}

/// Input for adding a product to the cart
#[derive(Debug, Deserialize, Validate)]
pub struct AddCartItemInput {
    pub product_id: Uuid,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

/// Input for setting a line quantity; zero or less removes the line
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemInput {
    #[validate(range(max = 10000))]
    pub quantity: i32,
}

#[derive(Debug, FromRow)]
struct CartLineRow {
    id: Uuid,
    product_id: Uuid,
    product_name: String,
    image_path: Option<String>,
    unit_price: Decimal,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine::new(
            row.id,
            row.product_id,
            row.product_name,
            row.image_path,
            row.unit_price,
            row.quantity,
        )
    }
}

/// Find the cart of `owner` on an existing connection
pub async fn find_cart_id(conn: &mut PgConnection, owner: &CartOwner) -> AppResult<Option<Uuid>> {
    let id = match owner {
        CartOwner::User(user_id) => {
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM carts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?
        }
        CartOwner::Session(key) => {
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM carts WHERE session_key = $1")
                .bind(key)
                .fetch_optional(&mut *conn)
                .await?
        }
    };
    Ok(id)
}

/// Cart lines with their frozen prices, oldest first
pub async fn load_lines(conn: &mut PgConnection, cart_id: Uuid) -> AppResult<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ci.id, ci.product_id, p.name AS product_name, p.image_path,
               ci.unit_price, ci.quantity
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at, ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}

impl CartService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current cart contents; an owner without a cart sees an empty one
    pub async fn view(&self, owner: &CartOwner) -> AppResult<CartView> {
        let mut conn = self.db.acquire().await?;
        match find_cart_id(&mut conn, owner).await? {
            Some(cart_id) => {
                let lines = load_lines(&mut conn, cart_id).await?;
                Ok(CartView::from_lines(Some(cart_id), lines))
            }
            None => Ok(CartView::from_lines(None, Vec::new())),
        }
    }

    /// Add units of a product. A new line freezes the current price; an
    /// existing line keeps the price it was added at.
    pub async fn add_item(&self, owner: &CartOwner, input: &AddCartItemInput) -> AppResult<CartView> {
        if input.quantity < 1 {
            return Err(CartError::InvalidQuantity.into());
        }

        let mut tx = self.db.begin().await?;

        let (name, price, is_active) = sqlx::query_as::<_, (String, Decimal, bool)>(
            "SELECT name, price, is_active FROM products WHERE id = $1",
        )
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if !is_active {
            return Err(AppError::ProductUnavailable(name));
        }

        let cart_id = self.get_or_create_cart(&mut tx, owner).await?;

        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2 FOR UPDATE",
        )
        .bind(cart_id)
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let quantity = merged_quantity(existing, input.quantity)?;

        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, unit_price, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(cart_id)
        .bind(input.product_id)
        .bind(price)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        touch_cart(&mut tx, cart_id).await?;
        let lines = load_lines(&mut tx, cart_id).await?;
        tx.commit().await?;

        Ok(CartView::from_lines(Some(cart_id), lines))
    }

    /// Set the quantity of a line, removing it when the quantity is not positive
    pub async fn update_item(
        &self,
        owner: &CartOwner,
        item_id: Uuid,
        quantity: i32,
    ) -> AppResult<CartView> {
        let mut tx = self.db.begin().await?;
        let cart_id = find_cart_id(&mut tx, owner)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item".to_string()))?;

        let affected = match QuantityChange::from_requested(quantity) {
            QuantityChange::Set(quantity) => {
                sqlx::query("UPDATE cart_items SET quantity = $3 WHERE id = $1 AND cart_id = $2")
                    .bind(item_id)
                    .bind(cart_id)
                    .bind(quantity)
                    .execute(&mut *tx)
                    .await?
            }
            QuantityChange::Remove => {
                sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
                    .bind(item_id)
                    .bind(cart_id)
                    .execute(&mut *tx)
                    .await?
            }
        };

        if affected.rows_affected() == 0 {
            return Err(AppError::NotFound("Cart item".to_string()));
        }

        touch_cart(&mut tx, cart_id).await?;
        let lines = load_lines(&mut tx, cart_id).await?;
        tx.commit().await?;

        Ok(CartView::from_lines(Some(cart_id), lines))
    }

    pub async fn remove_item(&self, owner: &CartOwner, item_id: Uuid) -> AppResult<CartView> {
        self.update_item(owner, item_id, 0).await
    }

    /// Remove every line from the cart
    pub async fn clear(&self, owner: &CartOwner) -> AppResult<CartView> {
        let mut conn = self.db.acquire().await?;
        if let Some(cart_id) = find_cart_id(&mut conn, owner).await? {
            clear_cart(&mut conn, cart_id).await?;
            return Ok(CartView::from_lines(Some(cart_id), Vec::new()));
        }
        Ok(CartView::from_lines(None, Vec::new()))
    }

    /// Move an anonymous session cart into the user's cart after sign-in.
    ///
    /// Quantities of products present in both carts are added; the user's
    /// frozen price wins.
    pub async fn merge_session_cart(&self, session_key: &str, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let session_owner = CartOwner::Session(session_key.to_string());
        let Some(session_cart) = find_cart_id(&mut tx, &session_owner).await? else {
            return Ok(());
        };

        let user_cart = self
            .get_or_create_cart(&mut tx, &CartOwner::User(user_id))
            .await?;

        let merged = sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, unit_price, quantity, created_at)
            SELECT $2, product_id, unit_price, quantity, created_at
            FROM cart_items WHERE cart_id = $1
            ON CONFLICT (cart_id, product_id)
                DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            "#,
        )
        .bind(session_cart)
        .bind(user_cart)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(session_cart)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(
            user_id = %user_id,
            lines = merged.rows_affected(),
            "Merged anonymous cart into user cart"
        );
        Ok(())
    }

    async fn get_or_create_cart(&self, conn: &mut PgConnection, owner: &CartOwner) -> AppResult<Uuid> {
        let id = match owner {
            CartOwner::User(user_id) => {
                sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO carts (user_id) VALUES ($1)
                    ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
                    RETURNING id
                    "#,
                )
                .bind(user_id)
                .fetch_one(&mut *conn)
                .await?
            }
            CartOwner::Session(key) => {
                sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO carts (session_key) VALUES ($1)
                    ON CONFLICT (session_key) DO UPDATE SET updated_at = NOW()
                    RETURNING id
                    "#,
                )
                .bind(key)
                .fetch_one(&mut *conn)
                .await?
            }
        };
        Ok(id)
    }
}

/// Remove every line from a cart on an existing connection
pub async fn clear_cart(conn: &mut PgConnection, cart_id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    touch_cart(conn, cart_id).await
}

async fn touch_cart(conn: &mut PgConnection, cart_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_defaults_to_one_unit() {
        let input: AddCartItemInput =
            serde_json::from_str(r#"{"product_id": "00000000-0000-0000-0000-000000000000"}"#)
                .unwrap();
        assert_eq!(input.quantity, 1);
    }

    #[test]
    fn test_item_quantities_are_bounded() {
        let add = |quantity: i32| AddCartItemInput {
            product_id: Uuid::nil(),
            quantity,
        };
        assert!(add(10_000).validate().is_ok());
        assert!(add(10_001).validate().is_err());
        assert!(add(0).validate().is_err());

        assert!(UpdateCartItemInput { quantity: 0 }.validate().is_ok());
        assert!(UpdateCartItemInput { quantity: -2 }.validate().is_ok());
        assert!(UpdateCartItemInput { quantity: i32::MAX }.validate().is_err());
    }
}
