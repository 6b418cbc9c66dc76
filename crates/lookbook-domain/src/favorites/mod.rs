mod favorite_set;


pub use favorite_set::{FavoriteAction, FavoriteSet, FavoriteToggle};
