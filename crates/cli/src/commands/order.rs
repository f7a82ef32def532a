//! Order code commands.
//!
//! # Environment Variables
//!
//! - `KONVY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `KONVY_ADMIN_USERNAME` - owner account the order is issued by (default `Konvy`)

use konvy_core::OrderCode;
use konvy_storefront::config::admin_username;
use konvy_storefront::db::{UserRepository, create_pool};
use konvy_storefront::services::OrderService;

use super::{CommandError, database_url};

/// Issue an order code as the owner account.
///
/// # Errors
///
/// Returns `CommandError::OwnerNotFound` if the owner has never logged in,
/// or `CommandError::Order` if the code is taken.
pub async fn create(product: &str, code: Option<&str>) -> Result<(), CommandError> {
    let pool = create_pool(&database_url()?).await?;

    let owner_name = admin_username();

    let owner = UserRepository::new(&pool)
        .get_by_username(&owner_name)
        .await?
        .filter(|u| u.role.is_owner())
        .ok_or_else(|| CommandError::OwnerNotFound(owner_name.clone()))?;

    let code = code.map_or_else(|| OrderCode::generate().into_inner(), str::to_string);

    let order = OrderService::new(&pool)
        .create(owner.id, product, &code)
        .await?;

    tracing::info!(order_id = %order.id, "Order issued");

    #[allow(clippy::print_stdout)]
    {
        println!("{}", order.order_code);
    }
    Ok(())
}

/// Print a random order code without storing it.
pub fn generate_code() {
    #[allow(clippy::print_stdout)]
    {
        println!("{}", OrderCode::generate());
    }
}
