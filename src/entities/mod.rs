// Entity stores. Each store borrows the shared connection from
// `db::Store` and exposes the operations for one table family.

pub mod author;
pub mod category;
pub mod favorites;
pub mod quote;
pub mod user;

pub use author::{Author, AuthorStore};
pub use category::{Category, CategoryStore};
pub use favorites::{FavoriteKind, FavoritesStore};
pub use quote::{NewQuote, Quote, QuoteStore, SearchQuery};
pub use user::{User, UserStore};
