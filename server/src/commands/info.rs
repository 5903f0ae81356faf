use db::{cooking::Recipe, users::User};

use crate::Result;

pub(crate) async fn print_info() -> Result<()> {
    let pool = db::setup_db_pool().await?;

    let users = User::count(&pool).await?;
    let recipes = Recipe::count(&pool).await?;

    println!("forked {}", env!("CARGO_PKG_VERSION"));
    println!("Users: {users}");
    println!("Recipes: {recipes}");

    Ok(())
}
